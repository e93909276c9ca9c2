pub mod codec;
pub mod error;
pub mod protocol;
pub mod qos;
pub mod raw;

/// A specialized `Result` type for mqpp operations
///
/// This is defined as a convenience
pub type Result<T> = std::result::Result<T, crate::error::Error>;
