pub mod intent;
pub mod outcome;

pub use intent::*;
pub use outcome::*;
