//! Utility modules

pub mod file_io;

pub use file_io::{load_program, FileEncoding, Program, PROGRAM_EXTENSIONS};
