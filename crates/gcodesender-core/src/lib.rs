//! # GCodeSender Core
//!
//! Core types shared by the G-code interpreter, the command dispatcher and the
//! settings layer: geometry, unit handling, error types and the user-facing
//! warning log.

pub mod data;
pub mod error;
pub mod units;
pub mod warnings;

pub use data::Point3;
pub use error::{ConnectionError, Error, ProgramError, Result};
pub use units::{format_duration_minutes, Units, MM_PER_INCH};
pub use warnings::{Warning, WarningGroup, WarningLog};
