//! Core Kernel - Foundational types for the bank ledger
//!
//! This crate provides the building blocks used by every other crate:
//! - Money with exact two-digit decimal arithmetic and a configurable rounding rule
//! - UTC day windows, date ranges and the clock abstraction
//! - Strongly typed identifiers

pub mod money;
pub mod temporal;
pub mod identifiers;

pub use money::{Money, MoneyError, RoundingMode};
pub use temporal::{Clock, DateRange, DayWindow, FixedClock, SystemClock, TemporalError};
pub use identifiers::{AccountId, CustomerId, MovementId};
