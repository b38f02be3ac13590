pub mod accrual;
pub mod allocation;
pub mod engine;
pub mod error;
pub mod late_interest;
pub mod rates;
pub mod types;

pub use error::LateInterestError;
pub use types::*;

/// Standard result type for all late-interest operations
pub type LateInterestResult<T> = Result<T, LateInterestError>;
