//! tree-sitter parsing and small node helpers

use tree_sitter::{Language, Node, Parser, Tree};

use super::SourceDialect;
use crate::errors::Diagnostic;

const SNIPPET_LIMIT: usize = 40;

fn language(dialect: SourceDialect) -> Language {
    match dialect {
        SourceDialect::TypeScript => tree_sitter_typescript::language_typescript(),
        // JavaScript has no type arguments, so `a < b > (c)` stays a comparison
        SourceDialect::JavaScript => tree_sitter_javascript::language(),
    }
}

/// Parse source with the grammar of its dialect
pub(crate) fn parse(source: &str, dialect: SourceDialect) -> Result<Tree, Diagnostic> {
    let mut parser = Parser::new();
    parser
        .set_language(&language(dialect))
        .map_err(|e| Diagnostic::new(format!("Failed to set language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Diagnostic::new("Failed to parse content"))?;

    if tree.root_node().has_error() {
        return Err(first_syntax_error(tree.root_node(), source));
    }
    Ok(tree)
}

fn first_syntax_error(root: Node, source: &str) -> Diagnostic {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            let pos = node.start_position();
            return Diagnostic::at(
                format!("Missing `{}`", node.kind()),
                pos.row + 1,
                pos.column + 1,
            );
        }
        if node.is_error() {
            let pos = node.start_position();
            return Diagnostic::at(
                format!("Unexpected `{}`", snippet(text(node, source))),
                pos.row + 1,
                pos.column + 1,
            );
        }

        // Reverse push keeps document order
        let mut cursor = node.walk();
        let children: Vec<Node> = node
            .children(&mut cursor)
            .filter(|child| child.has_error())
            .collect();
        stack.extend(children.into_iter().rev());
    }

    let pos = root.start_position();
    Diagnostic::at("Syntax error", pos.row + 1, pos.column + 1)
}

fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > SNIPPET_LIMIT {
        let cut: String = line.chars().take(SNIPPET_LIMIT).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

pub(crate) fn text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

/// First direct anonymous child with the given token text
pub(crate) fn token_child<'t>(node: Node<'t>, token: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|child| !child.is_named() && child.kind() == token);
    found
}

pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let nodes = node.named_children(&mut cursor).collect();
    nodes
}

pub(crate) fn position(node: Node) -> (usize, usize) {
    let pos = node.start_position();
    (pos.row + 1, pos.column + 1)
}

pub(crate) fn diagnostic_at(node: Node, message: impl Into<String>) -> Diagnostic {
    let (line, column) = position(node);
    Diagnostic::at(message, line, column)
}
