//! Application-wide constants.

/// Number of decimal places kept on monetary amounts.
pub const DECIMAL_PRECISION: u32 = 2;

/// Currency assigned to portfolios when none is specified.
pub const DEFAULT_CURRENCY: &str = "USD";
