//! JSX lowering to `React.createElement` calls (classic runtime)

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tree_sitter::Node;

use super::syntax::{diagnostic_at, named_children, text};
use crate::errors::Diagnostic;

const PRAGMA: &str = "React.createElement";
const FRAGMENT: &str = "React.Fragment";

lazy_static! {
    static ref ENTITY: Regex =
        Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid regex");
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid regex");
}

pub(crate) fn is_jsx_root(node: Node) -> bool {
    matches!(
        node.kind(),
        "jsx_element" | "jsx_self_closing_element" | "jsx_fragment"
    )
}

/// Lower one element or fragment, nested JSX included
pub(crate) fn lower_jsx(node: Node, source: &str) -> Result<String, Diagnostic> {
    match node.kind() {
        "jsx_self_closing_element" => {
            let tag = tag_name(node.child_by_field_name("name"), source);
            let props = props(node, source)?;
            Ok(create_element(&tag, &props, &[]))
        }
        "jsx_element" => {
            let open = node
                .child_by_field_name("open_tag")
                .ok_or_else(|| diagnostic_at(node, "JSX element without an opening tag"))?;
            let close_start = node
                .child_by_field_name("close_tag")
                .map(|c| c.start_byte())
                .unwrap_or_else(|| node.end_byte());
            let tag = tag_name(open.child_by_field_name("name"), source);
            let props = props(open, source)?;
            let children = children(node, open.end_byte(), close_start, source)?;
            Ok(create_element(&tag, &props, &children))
        }
        "jsx_fragment" => {
            let mut cursor = node.walk();
            let tokens: Vec<Node> = node
                .children(&mut cursor)
                .filter(|c| !c.is_named())
                .collect();
            let open_end = tokens
                .iter()
                .find(|t| t.kind() == ">")
                .map(|t| t.end_byte())
                .unwrap_or_else(|| node.start_byte());
            let close_start = tokens
                .iter()
                .rev()
                .find(|t| t.kind().starts_with('<'))
                .map(|t| t.start_byte())
                .unwrap_or_else(|| node.end_byte());
            let children = children(node, open_end, close_start, source)?;
            Ok(create_element(FRAGMENT, "null", &children))
        }
        other => Err(diagnostic_at(node, format!("Not a JSX element ({})", other))),
    }
}

/// Source text of `node` with every JSX element inside it lowered
fn render(node: Node, source: &str) -> Result<String, Diagnostic> {
    if is_jsx_root(node) {
        return lower_jsx(node, source);
    }

    let mut nested = Vec::new();
    collect_nested(node, &mut nested);

    let mut out = String::new();
    let mut cursor = node.start_byte();
    for element in nested {
        out.push_str(&source[cursor..element.start_byte()]);
        out.push_str(&lower_jsx(element, source)?);
        cursor = element.end_byte();
    }
    out.push_str(&source[cursor..node.end_byte()]);
    Ok(out)
}

fn collect_nested<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    for child in named_children(node) {
        if is_jsx_root(child) {
            out.push(child);
        } else {
            collect_nested(child, out);
        }
    }
}

fn create_element(tag: &str, props: &str, children: &[String]) -> String {
    let mut args = vec![tag.to_string(), props.to_string()];
    args.extend(children.iter().cloned());
    format!("{}({})", PRAGMA, args.join(", "))
}

/// Lowercase and dashed names are host elements, anything else a component
fn tag_name(name: Option<Node>, source: &str) -> String {
    let Some(name) = name else {
        return FRAGMENT.to_string();
    };
    let raw = text(name, source);
    let host = match name.kind() {
        "identifier" => {
            raw.starts_with(|c: char| c.is_ascii_lowercase()) || raw.contains('-')
        }
        "jsx_namespace_name" => true,
        _ => false,
    };
    if host {
        quote(raw)
    } else {
        raw.to_string()
    }
}

fn props(tag: Node, source: &str) -> Result<String, Diagnostic> {
    let mut cursor = tag.walk();
    let attributes: Vec<Node> = tag.children_by_field_name("attribute", &mut cursor).collect();
    if attributes.is_empty() {
        return Ok("null".to_string());
    }

    let mut entries = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        match attribute.kind() {
            "jsx_attribute" => entries.push(attribute_entry(attribute, source)?),
            "jsx_expression" => {
                let spread = expression_child(attribute)
                    .filter(|e| e.kind() == "spread_element")
                    .and_then(|e| e.named_child(0))
                    .ok_or_else(|| diagnostic_at(attribute, "Expected `{...props}`"))?;
                entries.push(format!("...{}", render(spread, source)?));
            }
            _ => {}
        }
    }
    Ok(format!("{{ {} }}", entries.join(", ")))
}

fn attribute_entry(attribute: Node, source: &str) -> Result<String, Diagnostic> {
    let parts = named_children(attribute);
    let name = parts
        .first()
        .ok_or_else(|| diagnostic_at(attribute, "JSX attribute without a name"))?;
    let raw_name = text(*name, source);
    let key = if IDENTIFIER.is_match(raw_name) {
        raw_name.to_string()
    } else {
        quote(raw_name)
    };

    let value = match parts.get(1) {
        None => "true".to_string(),
        Some(value) => match value.kind() {
            "string" => {
                let raw = text(*value, source);
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                quote(&decode_entities(inner))
            }
            "jsx_expression" => {
                let expression = expression_child(*value)
                    .ok_or_else(|| diagnostic_at(*value, "Empty JSX attribute expression"))?;
                render(expression, source)?
            }
            _ => render(*value, source)?,
        },
    };
    Ok(format!("{}: {}", key, value))
}

/// Children between the opening and closing tags, text included
fn children(
    element: Node,
    start: usize,
    end: usize,
    source: &str,
) -> Result<Vec<String>, Diagnostic> {
    let mut out = Vec::new();
    let mut cursor = start;

    for child in named_children(element) {
        if child.start_byte() < start || child.end_byte() > end {
            continue;
        }
        let lowered = match child.kind() {
            "jsx_text" | "html_character_reference" | "comment" => continue,
            "jsx_expression" => match expression_child(child) {
                Some(e) if e.kind() == "spread_element" => match e.named_child(0) {
                    Some(inner) => Some(format!("...{}", render(inner, source)?)),
                    None => None,
                },
                Some(e) => Some(render(e, source)?),
                None => None,
            },
            _ => Some(render(child, source)?),
        };

        push_text(&source[cursor..child.start_byte()], &mut out);
        if let Some(lowered) = lowered {
            out.push(lowered);
        }
        cursor = child.end_byte();
    }
    push_text(&source[cursor.min(end)..end], &mut out);
    Ok(out)
}

fn expression_child(container: Node) -> Option<Node> {
    named_children(container)
        .into_iter()
        .find(|c| c.kind() != "comment")
}

fn push_text(raw: &str, out: &mut Vec<String>) {
    let cleaned = clean_text(raw);
    if !cleaned.is_empty() {
        out.push(quote(&decode_entities(&cleaned)));
    }
}

/// Whitespace rules of JSX text: lines are trimmed where they meet a line
/// break, blank lines vanish and the rest are joined with one space.
fn clean_text(raw: &str) -> String {
    let lines: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'));

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if i != lines.len() - 1 {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if !trimmed.is_empty() {
            out.push_str(&trimmed);
            if Some(i) != last_non_empty {
                out.push(' ');
            }
        }
    }
    out
}

fn decode_entities(raw: &str) -> String {
    ENTITY
        .replace_all(raw, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "times" => '\u{d7}',
        _ => return None,
    };
    Some(c)
}

/// JavaScript string literal
fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
