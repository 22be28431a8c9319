//! G-code tokenizer, command splitter and modal interpreter
//!
//! This module provides:
//! - Program tokenizing (comment stripping, whitespace collapsing)
//! - Command splitting into tag and parameters
//! - The modal interpreter shared by every consumer of a program

pub mod command;
pub mod interpreter;
pub mod tokenizer;

pub use command::*;
pub use interpreter::*;
pub use tokenizer::*;
