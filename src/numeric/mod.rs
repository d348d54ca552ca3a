// ============================================================================
// Numeric Module
// Fixed-point arithmetic for deterministic financial calculations
// ============================================================================
//
// This module provides:
// - FixedDecimal<D>: Fixed-point decimal with compile-time precision
// - NumericError: Error types for arithmetic operations
// - Price/Amount type aliases for currency values
//
// Design principles:
// - No floating-point operations on money
// - All arithmetic returns Result (no panics)
// - Compile-time configurable precision via const generics
// - Share quantities stay plain integers; only prices and amounts are scaled

mod errors;
mod fixed_decimal;

pub use errors::{NumericError, NumericResult};
pub use fixed_decimal::{Amount, FixedDecimal, Price};
