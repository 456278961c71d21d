//! Program image text format.
//!
//! A simple line-based format:
//! - One word per line, as `0x` hex, `0b` binary or decimal
//! - `@<addr>` moves the load origin (decimal or `0x` hex)
//! - `;` starts a comment; blank lines are ignored
//!
//! ```text
//! ; count down from 5
//! 0x1005      ; MOV R0, #5
//! @0x100
//! 0b0111000000000000
//! ```

use crate::cpu::{Cpu, MemoryError, MEMORY_SIZE};
use crate::debugger::parse_address;
use std::path::Path;
use thiserror::Error;

/// A contiguous run of words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub origin: usize,
    pub words: Vec<u16>,
}

/// A parsed program image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramImage {
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    /// An image with a single segment at address 0.
    pub fn from_words(words: Vec<u16>) -> Self {
        Self {
            segments: vec![Segment { origin: 0, words }],
        }
    }

    /// Total number of words.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every segment into the CPU's memory.
    pub fn load_into(&self, cpu: &mut Cpu) -> Result<(), MemoryError> {
        for segment in &self.segments {
            cpu.load_program(segment.origin, &segment.words)?;
        }
        Ok(())
    }
}

/// Parse image text.
pub fn parse_image(source: &str) -> Result<ProgramImage, ImageError> {
    let mut image = ProgramImage::default();
    let mut current = Segment { origin: 0, words: Vec::new() };

    for (line_num, line) in source.lines().enumerate() {
        let line_num = line_num + 1;
        let text = line.split(';').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        if let Some(addr) = text.strip_prefix('@') {
            let origin = parse_address(addr).map_err(|e| ImageError::ParseError {
                line: line_num,
                message: e.to_string(),
            })?;
            if !current.words.is_empty() {
                image.segments.push(current);
            }
            current = Segment { origin: origin as usize, words: Vec::new() };
            continue;
        }

        let word = parse_word(text).ok_or_else(|| ImageError::ParseError {
            line: line_num,
            message: format!("expected a 16-bit word, found {:?}", text),
        })?;
        if current.origin + current.words.len() >= MEMORY_SIZE {
            return Err(ImageError::ParseError {
                line: line_num,
                message: format!("word runs past the end of memory ({} words)", MEMORY_SIZE),
            });
        }
        current.words.push(word);
    }

    if !current.words.is_empty() {
        image.segments.push(current);
    }
    Ok(image)
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<ProgramImage, ImageError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    parse_image(&source)
}

fn parse_word(text: &str) -> Option<u16> {
    let text = text.replace('_', "");
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u16::from_str_radix(bin, 2).ok()
    } else {
        text.parse().ok()
    }
}

/// Errors that can occur while reading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}
