use crate::error::Error;

/// Result type alias used throughout tabmerge.
pub type Result<T> = std::result::Result<T, Error>;
