//! # quotebook Core
//!
//! Core types shared by the quotebook crates.
//!
//! This crate provides:
//! - Fixed-precision price keys derived from text or floating-point input
//! - Instrument precision, including derivation from a quote increment
//! - Exact quantities and book side definitions
//! - Error types for input conversion

pub mod error;
pub mod price;
pub mod types;

pub use error::{Error, Result};
pub use price::{DecimalInput, Precision, PriceKey, RawDecimal, parse_quantity};
pub use types::{Quantity, Side};
