//! LS-8 program image format.
//!
//! A plain text file, one byte per line written in binary:
//! - `#` starts a comment that runs to the end of the line
//! - Lines with nothing before the `#` are skipped and take no address
//! - Bytes load at sequential addresses starting from 0

use crate::cpu::memory::MEMORY_SIZE;
use std::path::Path;
use thiserror::Error;

/// A parsed program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    /// The program bytes, address 0 first.
    pub bytes: Vec<u8>,
    /// Original source line for each byte (for debugging).
    pub source_lines: Vec<String>,
}

impl ProgramImage {
    /// Create a new empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a byte.
    pub fn push(&mut self, byte: u8, source: &str) {
        self.bytes.push(byte);
        self.source_lines.push(source.to_string());
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Parse an image from text.
pub fn parse_image(source: &str) -> Result<ProgramImage, LoadError> {
    let mut image = ProgramImage::new();

    for (line_num, line) in source.lines().enumerate() {
        let code = line.split('#').next().unwrap_or_default().trim();
        if code.is_empty() {
            continue;
        }

        if let Some(bad) = code.chars().find(|c| !matches!(c, '0' | '1')) {
            return Err(LoadError::ParseError {
                line: line_num + 1,
                message: format!("unexpected character {:?}, expected binary digits", bad),
            });
        }

        let byte = u8::from_str_radix(code, 2).map_err(|_| LoadError::ParseError {
            line: line_num + 1,
            message: format!("{} does not fit in 8 bits", code),
        })?;

        if image.len() == MEMORY_SIZE {
            return Err(LoadError::TooLarge { line: line_num + 1 });
        }
        image.push(byte, line.trim());
    }

    Ok(image)
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ProgramImage, LoadError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| LoadError::IoError(e.to_string()))?;
    let image = parse_image(&source)?;
    log::info!("loaded {} bytes from {}", image.len(), path.as_ref().display());
    Ok(image)
}

/// Errors that can occur while loading a program image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("program exceeds 256 bytes at line {line}")]
    TooLarge { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let source = "\
# Print the number 8

10000010 # LDI R0,8
00000000
00001000
   # indented comment
01000111 # PRN R0
00000000
00000001 # HLT
";
        let image = parse_image(source).unwrap();

        assert_eq!(image.bytes, vec![0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);
        assert_eq!(image.source_lines[0], "10000010 # LDI R0,8");
        assert_eq!(image.len(), 6);
    }

    #[test]
    fn test_parse_short_values() {
        let image = parse_image("1\n101\n").unwrap();
        assert_eq!(image.bytes, vec![1, 5]);
    }

    #[test]
    fn test_parse_rejects_non_binary() {
        let err = parse_image("10000010\n1000002x\n").unwrap_err();
        assert!(matches!(err, LoadError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_wide_values() {
        let err = parse_image("111111111\n").unwrap_err();
        assert!(matches!(err, LoadError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_oversized_image() {
        let source = "00000000\n".repeat(MEMORY_SIZE + 1);
        assert_eq!(
            parse_image(&source),
            Err(LoadError::TooLarge { line: MEMORY_SIZE + 1 })
        );
        assert_eq!(parse_image(&"1\n".repeat(MEMORY_SIZE)).unwrap().len(), MEMORY_SIZE);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image("/nonexistent/program.ls8").unwrap_err();
        assert!(matches!(err, LoadError::IoError(_)));
    }
}
