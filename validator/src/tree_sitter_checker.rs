//! In-process static parsing with tree-sitter.
//!
//! tree-sitter recovers from errors instead of stopping at the first one, so
//! a failed parse shows up as `ERROR` or `MISSING` nodes somewhere in the
//! tree. The checker reports the first such node in document order, narrowed
//! to the offending token.

use tree_sitter::{Language, Node, Parser};

use crate::checker::{SyntaxChecker, SyntaxIssue};
use crate::error::CheckerError;

/// Longest excerpt quoted in an "invalid syntax" message.
const EXCERPT_CHARS: usize = 24;

pub struct TreeSitterChecker {
    name: &'static str,
    language: Language,
}

impl TreeSitterChecker {
    pub fn python() -> Self {
        TreeSitterChecker {
            name: "python",
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn parser(&self) -> Result<Parser, CheckerError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|source| CheckerError::Grammar {
                language: self.name,
                source,
            })?;
        Ok(parser)
    }
}

impl SyntaxChecker for TreeSitterChecker {
    fn name(&self) -> &str {
        self.name
    }

    fn check(&self, source: &str) -> Result<Option<SyntaxIssue>, CheckerError> {
        let mut parser = self.parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or(CheckerError::ParseCancelled {
                language: self.name,
            })?;

        let root = tree.root_node();
        if !root.has_error() {
            return Ok(None);
        }
        Ok(first_error(root).map(|node| issue_for(culprit(node), source)))
    }
}

/// Pre-order search for the first ERROR or MISSING node, skipping subtrees
/// that contain none.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Narrow an ERROR node to the token that broke the parse: a MISSING or
/// nested ERROR node inside it if there is one, otherwise its last leaf.
fn culprit(node: Node<'_>) -> Node<'_> {
    if !node.is_error() {
        return node;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    if let Some(inner) = children.iter().copied().find_map(first_error) {
        return culprit(inner);
    }
    last_leaf(node)
}

fn last_leaf(mut node: Node<'_>) -> Node<'_> {
    loop {
        let mut cursor = node.walk();
        let last = node.children(&mut cursor).last();
        match last {
            Some(child) => node = child,
            None => return node,
        }
    }
}

fn issue_for(node: Node<'_>, source: &str) -> SyntaxIssue {
    let point = node.start_position();
    let message = if node.is_missing() {
        format!("expected `{}`", node.kind())
    } else {
        match excerpt(source, node.byte_range()) {
            Some(text) => format!("invalid syntax near `{}`", text),
            None => "invalid syntax".to_string(),
        }
    };
    SyntaxIssue {
        line: point.row + 1,
        column: char_column(source, point.row, point.column),
        message,
    }
}

/// First line of the node's text, shortened for display.
fn excerpt(source: &str, range: std::ops::Range<usize>) -> Option<String> {
    let text = source.get(range)?;
    let first = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    let mut short: String = first.chars().take(EXCERPT_CHARS).collect();
    if first.chars().count() > EXCERPT_CHARS {
        short.push_str("...");
    }
    Some(short)
}

/// tree-sitter columns count bytes; report characters, 1-based.
fn char_column(source: &str, row: usize, byte_column: usize) -> usize {
    let line = source.split('\n').nth(row).unwrap_or_default();
    let prefix = line.get(..byte_column.min(line.len())).unwrap_or(line);
    prefix.chars().count() + 1
}
