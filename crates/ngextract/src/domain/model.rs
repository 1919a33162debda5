//! Domain models for selections, derived names, and synthesized artifacts.

use std::ops::Range;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::errors::ExtractError;

/// Text selected in the host buffer together with its byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSpan {
    pub text: String,
    pub range: (usize, usize),
}

impl SelectionSpan {
    pub fn new(text: impl Into<String>, range: (usize, usize)) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    /// Build a span by slicing `buffer`, rejecting ranges that fall outside it or split a
    /// UTF-8 sequence.
    pub fn from_buffer(buffer: &str, range: (usize, usize)) -> Result<Self, ExtractError> {
        let (start, end) = range;
        let text = buffer
            .get(start..end)
            .ok_or(ExtractError::InvalidSelection {
                start,
                end,
                len: buffer.len(),
            })?;
        Ok(Self::new(text, range))
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.range.0..self.range.1
    }

    /// Confirm that the span still describes `buffer`.
    pub fn validate_against(&self, buffer: &str) -> Result<(), ExtractError> {
        let (start, end) = self.range;
        match buffer.get(self.byte_range()) {
            Some(slice) if slice == self.text => Ok(()),
            _ => Err(ExtractError::InvalidSelection {
                start,
                end,
                len: buffer.len(),
            }),
        }
    }
}

/// User supplied hyphenated component name, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Accept any input that is not blank. No further validation happens on purpose: odd
    /// names such as `--x` or `123` still derive a (possibly odd) symbolic name.
    pub fn parse(raw: &str) -> Result<Self, ExtractError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::EmptyIdentifier);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every name derived from an [`Identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentNames {
    pub identifier: Identifier,
    /// PascalCase type name including the configured suffix, e.g. `FooBarComponent`.
    pub symbolic_name: String,
    /// File stem without extension, e.g. `foo-bar.component`.
    pub file_base_name: String,
    /// Element selector, e.g. `app-foo-bar`.
    pub selector: String,
    /// Markup substituted for the selection, e.g. `<app-foo-bar></app-foo-bar>`.
    pub reference_tag: String,
}

/// A new file ready to be handed to the host's write primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesizedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Replacement of a byte range in a host buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub range: (usize, usize),
    pub replacement: String,
}

impl TextEdit {
    /// Apply the edit to `text`, returning the new string.
    pub fn apply_to(&self, text: &str) -> String {
        let (start, end) = self.range;
        let mut out = String::with_capacity(text.len() - (end - start) + self.replacement.len());
        out.push_str(&text[..start]);
        out.push_str(&self.replacement);
        out.push_str(&text[end..]);
        out
    }
}

/// Location of a component configuration block inside a source text.
///
/// `start..end` covers the marker through the closing `)`; `open_brace` and `close_brace` are
/// the offsets of the configuration object's delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeclarationBlock {
    pub start: usize,
    pub end: usize,
    pub open_brace: usize,
    pub close_brace: usize,
}

impl DeclarationBlock {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// An `imports: [...]` property. Offsets are absolute in the scanned source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListProperty {
    /// Whole property from the key through the closing `]`.
    pub start: usize,
    pub end: usize,
    /// Bytes between the brackets.
    pub contents: Range<usize>,
}

impl ListProperty {
    /// Comma separated entries, trimmed, empty entries dropped.
    pub fn entries<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text[self.contents.clone()]
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect()
    }
}
