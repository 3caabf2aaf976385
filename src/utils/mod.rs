pub mod error;

pub use error::{InvalidIdentifier, QidError};
