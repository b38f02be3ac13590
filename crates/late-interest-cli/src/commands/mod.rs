pub mod accrual;
pub mod engine;
