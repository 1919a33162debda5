//! Locating the `@Component({...})` configuration block and its `imports` list.
//!
//! Two strategies are available. [`BlockScan::FirstClose`] is the plain text heuristic:
//! the block ends at the first literal `})` after the marker, so a `})` inside a nested
//! expression (an arrow function in `providers`, for example) truncates the block.
//! [`BlockScan::Balanced`] walks the source with a small state machine that counts
//! `()[]{}` nesting and skips strings and comments.

use std::ops::Range;
use std::str::FromStr;

use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::model::{DeclarationBlock, ListProperty};

const MARKER: &str = "@Component(";
const LIST_KEY: &str = "imports";

static COMPONENT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@Component\(\s*\{").expect("valid marker regex"));
static IMPORTS_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"imports\s*:\s*\[([^\]]*)\]").expect("valid imports regex"));

/// Strategy used to find the declaration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum BlockScan {
    /// End the block at the first `})` after the marker.
    #[default]
    FirstClose,
    /// Track bracket depth to find the brace that really closes the block.
    Balanced,
}

impl BlockScan {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockScan::FirstClose => "first-close",
            BlockScan::Balanced => "balanced",
        }
    }

    /// Find the first declaration block in `source` and, if present, its `imports` list.
    /// All offsets are absolute positions in `source`.
    pub fn scan(&self, source: &str) -> Option<ScanResult> {
        match self {
            BlockScan::FirstClose => scan_first_close(source),
            BlockScan::Balanced => scan_balanced(source),
        }
    }
}

impl FromStr for BlockScan {
    type Err = BlockScanParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first-close" | "first_close" | "heuristic" => Ok(BlockScan::FirstClose),
            "balanced" | "depth" => Ok(BlockScan::Balanced),
            other => Err(BlockScanParseError::UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BlockScanParseError {
    #[error("unknown block scan strategy '{0}'")]
    UnknownStrategy(String),
}

/// A located block and the `imports` property inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub block: DeclarationBlock,
    pub list: Option<ListProperty>,
}

fn scan_first_close(source: &str) -> Option<ScanResult> {
    let marker = COMPONENT_MARKER.find(source)?;
    let start = marker.start();
    let close = start + source[start..].find("})")?;
    let block = DeclarationBlock {
        start,
        end: close + 2,
        open_brace: marker.end() - 1,
        close_brace: close,
    };

    let list = IMPORTS_LIST
        .captures(&source[block.range()])
        .and_then(|caps| {
            let whole = caps.get(0)?;
            let contents = caps.get(1)?;
            Some(ListProperty {
                start: start + whole.start(),
                end: start + whole.end(),
                contents: start + contents.start()..start + contents.end(),
            })
        });

    Some(ScanResult { block, list })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingBlockStart,
    InBlock {
        start: usize,
        open_brace: usize,
        depth: usize,
    },
    InList {
        key_start: usize,
        open_bracket: usize,
        depth: usize,
    },
}

fn scan_balanced(source: &str) -> Option<ScanResult> {
    let bytes = source.as_bytes();
    let mut cursor = CodeBytes::new(bytes, 0);
    let mut state = ScanState::SeekingBlockStart;
    // Block coordinates survive the excursion into the list.
    let mut block_start = 0;
    let mut block_open = 0;
    let mut list = None;

    while let Some((index, byte)) = cursor.next() {
        state = match state {
            ScanState::SeekingBlockStart => {
                if byte == b'@' && source[index..].starts_with(MARKER) {
                    let after_paren = index + MARKER.len();
                    let brace = skip_whitespace(bytes, after_paren);
                    if bytes.get(brace) == Some(&b'{') {
                        block_start = index;
                        block_open = brace;
                        cursor.seek(brace + 1);
                        ScanState::InBlock {
                            start: index,
                            open_brace: brace,
                            depth: 1,
                        }
                    } else {
                        ScanState::SeekingBlockStart
                    }
                } else {
                    ScanState::SeekingBlockStart
                }
            }
            ScanState::InBlock {
                start,
                open_brace,
                depth,
            } => match byte {
                b'{' | b'(' | b'[' => ScanState::InBlock {
                    start,
                    open_brace,
                    depth: depth + 1,
                },
                b'}' | b')' | b']' if depth == 1 => {
                    if byte != b'}' {
                        // Mismatched closer at the top level: give up.
                        return None;
                    }
                    let paren = skip_whitespace(bytes, index + 1);
                    let end = if bytes.get(paren) == Some(&b')') {
                        paren + 1
                    } else {
                        index + 1
                    };
                    return Some(ScanResult {
                        block: DeclarationBlock {
                            start,
                            end,
                            open_brace,
                            close_brace: index,
                        },
                        list,
                    });
                }
                b'}' | b')' | b']' => ScanState::InBlock {
                    start,
                    open_brace,
                    depth: depth - 1,
                },
                b'i' if depth == 1 && list.is_none() => match list_opening(bytes, index) {
                    Some(open_bracket) => {
                        cursor.seek(open_bracket + 1);
                        ScanState::InList {
                            key_start: index,
                            open_bracket,
                            depth: 1,
                        }
                    }
                    None => ScanState::InBlock {
                        start,
                        open_brace,
                        depth,
                    },
                },
                _ => ScanState::InBlock {
                    start,
                    open_brace,
                    depth,
                },
            },
            ScanState::InList {
                key_start,
                open_bracket,
                depth,
            } => match byte {
                b'[' => ScanState::InList {
                    key_start,
                    open_bracket,
                    depth: depth + 1,
                },
                b']' if depth == 1 => {
                    list = Some(ListProperty {
                        start: key_start,
                        end: index + 1,
                        contents: open_bracket + 1..index,
                    });
                    ScanState::InBlock {
                        start: block_start,
                        open_brace: block_open,
                        depth: 1,
                    }
                }
                b']' => ScanState::InList {
                    key_start,
                    open_bracket,
                    depth: depth - 1,
                },
                _ => ScanState::InList {
                    key_start,
                    open_bracket,
                    depth,
                },
            },
        };
    }

    None
}

/// Where a new property goes inside a block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PropertyAnchor {
    /// Just past the last byte of code; a separating comma goes here.
    pub after_code: usize,
    pub last_code_byte: u8,
    /// End of the comments trailing that code on its line; the new line starts here.
    pub line_end: usize,
}

/// Find the last code in `body` (string literals count, comments do not), plus any comments
/// that follow it on the same line. `None` when the body holds only whitespace and comments.
pub(crate) fn property_anchor(source: &str, body: Range<usize>) -> Option<PropertyAnchor> {
    let bytes = &source.as_bytes()[..body.end];
    let mut cursor = CodeBytes::new(bytes, body.start);
    let mut last = None;

    while cursor.pos < bytes.len() {
        let byte = bytes[cursor.pos];
        let next = match (byte, bytes.get(cursor.pos + 1).copied()) {
            (b'\'' | b'"' | b'`', _) => {
                let end = cursor.skip_string(byte);
                last = Some((end, byte));
                end
            }
            (b'/', Some(b'/')) => cursor.skip_line_comment(),
            (b'/', Some(b'*')) => cursor.skip_block_comment(),
            _ if byte.is_ascii_whitespace() => cursor.pos + 1,
            _ => {
                last = Some((cursor.pos + 1, byte));
                cursor.pos + 1
            }
        };
        cursor.seek(next);
    }

    let (after_code, last_code_byte) = last?;
    let mut pos = after_code;
    let mut line_end = after_code;
    loop {
        while matches!(bytes.get(pos).copied(), Some(b' ' | b'\t')) {
            pos += 1;
        }
        match (bytes.get(pos).copied(), bytes.get(pos + 1).copied()) {
            (Some(b'/'), Some(b'/')) => {
                cursor.seek(pos);
                line_end = cursor.skip_line_comment();
                if bytes[line_end - 1] == b'\r' {
                    line_end -= 1;
                }
                break;
            }
            (Some(b'/'), Some(b'*')) => {
                cursor.seek(pos);
                pos = cursor.skip_block_comment();
                line_end = pos;
            }
            _ => break,
        }
    }

    Some(PropertyAnchor {
        after_code,
        last_code_byte,
        line_end,
    })
}

/// If an `imports:` key followed by `[` starts at `index`, return the bracket offset.
fn list_opening(bytes: &[u8], index: usize) -> Option<usize> {
    if index > 0 && is_ident_byte(bytes[index - 1]) {
        return None;
    }
    let key_end = index + LIST_KEY.len();
    if bytes.get(index..key_end)? != LIST_KEY.as_bytes() {
        return None;
    }
    if bytes.get(key_end).is_some_and(|b| is_ident_byte(*b)) {
        return None;
    }
    let colon = skip_whitespace(bytes, key_end);
    if bytes.get(colon) != Some(&b':') {
        return None;
    }
    let bracket = skip_whitespace(bytes, colon + 1);
    (bytes.get(bracket) == Some(&b'[')).then_some(bracket)
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

fn skip_whitespace(bytes: &[u8], mut index: usize) -> usize {
    while bytes.get(index).is_some_and(u8::is_ascii_whitespace) {
        index += 1;
    }
    index
}

/// Iterates over the bytes of `source` that are code, skipping string literals (single,
/// double, and backtick quoted) and comments. All delimiters are ASCII, so stepping byte by
/// byte never lands inside a multi-byte character that matters.
struct CodeBytes<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> CodeBytes<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn skip_string(&self, quote: u8) -> usize {
        let mut index = self.pos + 1;
        while index < self.bytes.len() {
            match self.bytes[index] {
                b'\\' => index += 2,
                b if b == quote => return index + 1,
                _ => index += 1,
            }
        }
        self.bytes.len()
    }

    fn skip_line_comment(&self) -> usize {
        self.bytes[self.pos..]
            .iter()
            .position(|b| *b == b'\n')
            .map_or(self.bytes.len(), |offset| self.pos + offset)
    }

    fn skip_block_comment(&self) -> usize {
        self.bytes[self.pos + 2..]
            .windows(2)
            .position(|pair| pair == b"*/")
            .map_or(self.bytes.len(), |offset| self.pos + 2 + offset + 2)
    }
}

impl Iterator for CodeBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            let next = self.bytes.get(self.pos + 1).copied();
            self.pos = match (byte, next) {
                (b'\'' | b'"' | b'`', _) => self.skip_string(byte),
                (b'/', Some(b'/')) => self.skip_line_comment(),
                (b'/', Some(b'*')) => self.skip_block_comment(),
                _ => {
                    self.pos += 1;
                    return Some((self.pos - 1, byte));
                }
            };
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "@Component({\n  selector: 'x'\n})\nexport class X {}";

    #[test]
    fn property_anchor_skips_trailing_comments() {
        let source = "{ a: 1 /* x */ // z\n}";
        let anchor = property_anchor(source, 1..source.len() - 1).unwrap();
        assert_eq!(&source[..anchor.after_code], "{ a: 1");
        assert_eq!(anchor.last_code_byte, b'1');
        assert_eq!(&source[anchor.line_end..], "\n}");
    }

    #[test]
    fn property_anchor_ignores_comment_only_bodies() {
        let source = "{ /* nothing */ // here\n}";
        assert_eq!(property_anchor(source, 1..source.len() - 1), None);
    }

    #[test]
    fn both_strategies_agree_on_simple_block() {
        let first = BlockScan::FirstClose.scan(SIMPLE).unwrap();
        let balanced = BlockScan::Balanced.scan(SIMPLE).unwrap();
        assert_eq!(first, balanced);
        assert_eq!(first.block.start, 0);
        assert_eq!(&SIMPLE[first.block.range()], "@Component({\n  selector: 'x'\n})");
        assert_eq!(&SIMPLE[first.block.open_brace..=first.block.open_brace], "{");
        assert_eq!(&SIMPLE[first.block.close_brace..first.block.end], "})");
        assert!(first.list.is_none());
    }

    #[test]
    fn missing_marker_is_not_found() {
        assert!(BlockScan::FirstClose.scan("export class X {}").is_none());
        assert!(BlockScan::Balanced.scan("export class X {}").is_none());
    }

    #[test]
    fn unterminated_block_is_not_found() {
        let source = "@Component({ selector: 'x'";
        assert!(BlockScan::FirstClose.scan(source).is_none());
        assert!(BlockScan::Balanced.scan(source).is_none());
    }

    #[test]
    fn marker_tolerates_whitespace_before_brace() {
        let source = "@Component(\n  {\n  selector: 'x' })";
        let result = BlockScan::FirstClose.scan(source).unwrap();
        assert_eq!(&source[result.block.open_brace..=result.block.open_brace], "{");
        assert_eq!(BlockScan::Balanced.scan(source), Some(result));
    }

    #[test]
    fn first_close_truncates_on_nested_close_sequence() {
        let source = "@Component({\n  providers: [provide(() => {})],\n  selector: 'x'\n})";
        let first = BlockScan::FirstClose.scan(source).unwrap();
        assert!(first.block.end < source.len());
        assert!(source[first.block.range()].ends_with("=> {})"));

        let balanced = BlockScan::Balanced.scan(source).unwrap();
        assert_eq!(balanced.block.end, source.len());
    }

    #[test]
    fn finds_imports_list_contents() {
        let source = "@Component({\n  imports: [A, B],\n  selector: 'x'\n})";
        for scan in [BlockScan::FirstClose, BlockScan::Balanced] {
            let list = scan.scan(source).unwrap().list.unwrap();
            assert_eq!(&source[list.start..list.end], "imports: [A, B]");
            assert_eq!(&source[list.contents.clone()], "A, B");
        }
    }

    #[test]
    fn balanced_handles_nested_brackets_in_list() {
        let source = "@Component({ imports: [forwardRef(() => A), [B, C]] })";
        let list = BlockScan::Balanced.scan(source).unwrap().list.unwrap();
        assert_eq!(&source[list.contents.clone()], "forwardRef(() => A), [B, C]");

        let truncated = BlockScan::FirstClose.scan(source).unwrap().list.unwrap();
        assert_eq!(&source[truncated.contents.clone()], "forwardRef(() => A), [B, C");
    }

    #[test]
    fn balanced_ignores_nested_imports_keys() {
        let source = "@Component({ host: { imports: [] }, selector: 'x' })";
        let result = BlockScan::Balanced.scan(source).unwrap();
        assert!(result.list.is_none());
        assert_eq!(result.block.end, source.len());

        assert!(BlockScan::FirstClose.scan(source).unwrap().list.is_some());
    }

    #[test]
    fn balanced_skips_strings_and_comments() {
        let source = "// @Component({ fake })\n@Component({\n  template: `<p>})</p>`,\n  /* }) */ styles: ['a { }'],\n})";
        let result = BlockScan::Balanced.scan(source).unwrap();
        assert_eq!(result.block.start, source.find("\n@").unwrap() + 1);
        assert_eq!(result.block.end, source.len());
    }

    #[test]
    fn balanced_ignores_identifiers_containing_key() {
        let source = "@Component({ reimports: [A], imports2: [B] })";
        assert!(BlockScan::Balanced.scan(source).unwrap().list.is_none());
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("balanced".parse::<BlockScan>(), Ok(BlockScan::Balanced));
        assert_eq!("First-Close".parse::<BlockScan>(), Ok(BlockScan::FirstClose));
        assert!("ast".parse::<BlockScan>().is_err());
    }
}
