//! Rewiring the enclosing component to import the extracted one.

use serde::Serialize;

use crate::app::scanner::{self, BlockScan, ScanResult};
use crate::domain::model::DeclarationBlock;

const DEFAULT_INDENT: &str = "  ";

/// Result of [`rewrite`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RewriteOutcome {
    /// The import line was prepended and the block now lists the new component.
    Rewritten {
        source: String,
        block: DeclarationBlock,
        edit: ListEdit,
    },
    /// No configuration block was found. `source_with_import` is the input with only the
    /// import line prepended; whether to keep that partial edit is up to the caller.
    BlockNotFound { source_with_import: String },
}

/// How the `imports` list was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListEdit {
    /// The name was prepended to an existing list holding this many entries.
    Prepended { existing_entries: usize },
    /// A new `imports` property was added after the last property.
    Inserted,
}

/// `import { Name } from './module';` terminated by `line_ending`.
pub fn import_statement(symbolic_name: &str, module_path: &str, line_ending: &str) -> String {
    format!("import {{ {symbolic_name} }} from '{module_path}';{line_ending}")
}

/// `\r\n` when the source already uses it, `\n` otherwise.
fn line_ending(source: &str) -> &'static str {
    if source.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Prepend an import for `symbolic_name` and list it in the first `@Component` block.
///
/// Only the first block is touched, and every byte outside it is preserved. An entry that is
/// already listed is added again: repeated extraction under one name yields duplicates.
pub fn rewrite(
    source: &str,
    symbolic_name: &str,
    module_path: &str,
    scan: BlockScan,
) -> RewriteOutcome {
    let eol = line_ending(source);
    let import_line = import_statement(symbolic_name, module_path, eol);

    let Some(ScanResult { block, list }) = scan.scan(source) else {
        tracing::debug!(strategy = scan.as_str(), "declaration block not found");
        return RewriteOutcome::BlockNotFound {
            source_with_import: import_line + source,
        };
    };

    let (new_block, edit) = match list {
        Some(list) => {
            let existing = source[list.contents.clone()].trim();
            let property = if existing.is_empty() {
                format!("imports: [{symbolic_name}]")
            } else {
                format!("imports: [{symbolic_name},{existing}]")
            };
            let edit = ListEdit::Prepended {
                existing_entries: list.entries(source).len(),
            };
            let rebuilt = [
                &source[block.start..list.start],
                property.as_str(),
                &source[list.end..block.end],
            ]
            .concat();
            (rebuilt, edit)
        }
        None => (
            insert_property(source, &block, symbolic_name, eol),
            ListEdit::Inserted,
        ),
    };

    tracing::debug!(
        strategy = scan.as_str(),
        block_start = block.start,
        block_end = block.end,
        ?edit,
        "rewrote declaration block"
    );

    let mut rewritten =
        String::with_capacity(import_line.len() + source.len() + new_block.len());
    rewritten.push_str(&import_line);
    rewritten.push_str(&source[..block.start]);
    rewritten.push_str(&new_block);
    rewritten.push_str(&source[block.end..]);

    RewriteOutcome::Rewritten {
        source: rewritten,
        block,
        edit,
    }
}

/// Rebuild the block text with an `imports` property on a new line after the last property.
///
/// The separating comma goes right after the last code, and the new line starts after any
/// comment trailing it, so neither can end up inside a comment.
fn insert_property(
    source: &str,
    block: &DeclarationBlock,
    symbolic_name: &str,
    eol: &str,
) -> String {
    let property = format!("imports: [{symbolic_name}]");

    let Some(anchor) = scanner::property_anchor(source, block.open_brace + 1..block.close_brace)
    else {
        return [
            &source[block.start..block.close_brace],
            property.as_str(),
            &source[block.close_brace..block.end],
        ]
        .concat();
    };

    let separator = if anchor.last_code_byte == b',' { "" } else { "," };
    let indent = property_indent(source, block, anchor.after_code);

    [
        &source[block.start..anchor.after_code],
        separator,
        &source[anchor.after_code..anchor.line_end],
        eol,
        indent,
        property.as_str(),
        &source[anchor.line_end..block.end],
    ]
    .concat()
}

/// Leading whitespace of the line holding `anchor`, unless that line is the marker line.
fn property_indent<'a>(source: &'a str, block: &DeclarationBlock, anchor: usize) -> &'a str {
    let line_start = source[..anchor].rfind('\n').map_or(0, |idx| idx + 1);
    if line_start <= block.open_brace {
        return DEFAULT_INDENT;
    }
    let line = &source[line_start..anchor];
    let trimmed = line.trim_start_matches([' ', '\t']);
    let indent = &line[..line.len() - trimmed.len()];
    if indent.is_empty() {
        DEFAULT_INDENT
    } else {
        indent
    }
}
