pub mod error;
pub mod time_value;
pub mod types;
pub mod underwriting;

pub use error::QuicklookError;
pub use types::*;

/// Standard result type for all quicklook operations
pub type QuicklookResult<T> = Result<T, QuicklookError>;
