//! Program file loading
//!
//! Reads a G-code file from disk and tokenizes it. Files that are not valid
//! UTF-8 are decoded lossily rather than rejected.

use std::fs;
use std::path::Path;

use gcodesender_core::{ProgramError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::gcode::{tokenize, Command};

/// Accepted program file extensions, compared case-insensitively
pub const PROGRAM_EXTENSIONS: &[&str] = &["gcode", "nc"];

/// Encoding a program file was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEncoding {
    /// Valid UTF-8 (ASCII included)
    Utf8,
    /// Invalid sequences were replaced with U+FFFD
    Lossy,
}

impl FileEncoding {
    /// Detect encoding from file bytes
    pub fn detect(data: &[u8]) -> Self {
        if std::str::from_utf8(data).is_ok() {
            FileEncoding::Utf8
        } else {
            FileEncoding::Lossy
        }
    }
}

/// A tokenized program ready to analyze, render or send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// File name without directories
    pub name: String,
    pub commands: Vec<Command>,
    pub encoding: FileEncoding,
}

impl Program {
    /// Tokenize program text that did not come from a file
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            commands: tokenize(text),
            encoding: FileEncoding::Utf8,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Load and tokenize a `.gcode` or `.nc` file
pub fn load_program(path: impl AsRef<Path>) -> Result<Program> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ProgramError::NotAFile {
            path: path.display().to_string(),
        }
        .into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !PROGRAM_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ProgramError::UnsupportedExtension { extension }.into());
    }

    let bytes = fs::read(path)?;
    let encoding = FileEncoding::detect(&bytes);
    if encoding == FileEncoding::Lossy {
        warn!("{} is not valid UTF-8, decoding lossily", path.display());
    }
    let text = String::from_utf8_lossy(&bytes);
    debug!("read {} bytes from {}", bytes.len(), path.display());

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let commands = tokenize(&text);
    info!("loaded program {} with {} commands", name, commands.len());

    Ok(Program {
        name,
        commands,
        encoding,
    })
}
