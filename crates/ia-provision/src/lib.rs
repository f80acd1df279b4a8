//! Provisioning capabilities for identified templates.
//!
//! Each [`Provisioner`] turns a validated variable map into a provisioning
//! plan for one template. Two are built in (`gcs-bucket`,
//! `compute-instance`); [`MockProvisioner`] is a scriptable double.

pub mod compute;
pub mod error;
pub mod gcs;
pub mod mock;
pub mod types;

pub use compute::ComputeInstanceProvisioner;
pub use error::{ProvisionError, ProvisionResult};
pub use gcs::GcsBucketProvisioner;
pub use mock::MockProvisioner;
pub use types::Provisioner;
