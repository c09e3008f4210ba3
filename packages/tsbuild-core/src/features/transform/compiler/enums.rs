//! `enum` lowering to the runtime object form

use tree_sitter::Node;

use super::syntax::{diagnostic_at, named_children, text, token_child};
use crate::errors::Diagnostic;

enum MemberValue {
    Auto,
    Numeric(i64),
    Text,
    Computed,
}

/// Members declared so far, with their value when it is a known constant
#[derive(Default)]
struct Members {
    order: Vec<(String, Option<i64>)>,
}

impl Members {
    fn get(&self, name: &str) -> Option<Option<i64>> {
        self.order
            .iter()
            .rev()
            .find(|(member, _)| member == name)
            .map(|(_, value)| *value)
    }

    fn declare(&mut self, name: String, value: Option<i64>) {
        self.order.push((name, value));
    }
}

/// Lower an `enum_declaration` node.
///
/// Numeric members get a reverse mapping, string members do not. An
/// auto-numbered member must follow a numeric one. Initializers that only
/// combine literals and earlier constant members are folded; any other
/// reference to an earlier member is qualified with the enum name.
pub(crate) fn lower_enum(node: Node, source: &str) -> Result<String, Diagnostic> {
    let name = node
        .child_by_field_name("name")
        .map(|n| text(n, source))
        .ok_or_else(|| diagnostic_at(node, "Enum declaration without a name"))?;
    let body = node
        .child_by_field_name("body")
        .ok_or_else(|| diagnostic_at(node, "Enum declaration without a body"))?;

    let mut lines = Vec::new();
    let mut members = Members::default();
    let mut next: Option<i64> = Some(0);

    for member in named_children(body) {
        let (key_node, value_node) = match member.kind() {
            "comment" => continue,
            "enum_assignment" => (
                member
                    .child_by_field_name("name")
                    .ok_or_else(|| diagnostic_at(member, "Enum member without a name"))?,
                member.child_by_field_name("value"),
            ),
            _ => (member, None),
        };

        let (key, member_name) = member_key(key_node, source)?;
        let value = match value_node {
            None => MemberValue::Auto,
            Some(v) => classify(v, source, name, &members),
        };

        let (line, constant) = match value {
            MemberValue::Auto => {
                let n = next.ok_or_else(|| {
                    diagnostic_at(member, format!("Enum member {} must have an initializer", key))
                })?;
                next = n.checked_add(1);
                (format!("{name}[{name}[{key}] = {n}] = {key};"), Some(n))
            }
            MemberValue::Numeric(n) => {
                next = n.checked_add(1);
                // Plain literals keep their spelling
                let rendered = match value_node {
                    Some(v) if is_literal(v) => text(v, source).to_string(),
                    _ => n.to_string(),
                };
                (format!("{name}[{name}[{key}] = {rendered}] = {key};"), Some(n))
            }
            MemberValue::Text => {
                next = None;
                let raw = render_initializer(value_node, source, name, &members);
                (format!("{name}[{key}] = {raw};"), None)
            }
            MemberValue::Computed => {
                next = None;
                let raw = render_initializer(value_node, source, name, &members);
                (format!("{name}[{name}[{key}] = {raw}] = {key};"), None)
            }
        };
        members.declare(member_name, constant);
        lines.push(format!("    {}", line));
    }

    let mut out = format!("var {name};\n(function ({name}) {{\n");
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!("}})({name} || ({name} = {{}}));"));
    Ok(out)
}

/// Quoted key for the emitted object plus the bare member name
fn member_key(node: Node, source: &str) -> Result<(String, String), Diagnostic> {
    match node.kind() {
        "property_identifier" | "identifier" => {
            let bare = text(node, source);
            Ok((format!("\"{}\"", bare), bare.to_string()))
        }
        "string" => {
            let raw = text(node, source);
            let bare = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
            Ok((raw.to_string(), bare.to_string()))
        }
        other => Err(diagnostic_at(
            node,
            format!("Unsupported enum member name ({})", other),
        )),
    }
}

fn is_literal(value: Node) -> bool {
    match value.kind() {
        "number" => true,
        "unary_expression" => {
            let negated = token_child(value, "-").is_some();
            negated
                && value
                    .child_by_field_name("argument")
                    .is_some_and(|arg| arg.kind() == "number")
        }
        _ => false,
    }
}

fn classify(value: Node, source: &str, enum_name: &str, members: &Members) -> MemberValue {
    match value.kind() {
        "string" | "template_string" => MemberValue::Text,
        _ => evaluate(value, source, enum_name, members)
            .map(MemberValue::Numeric)
            .unwrap_or(MemberValue::Computed),
    }
}

/// Constant value of an initializer, following JavaScript integer semantics.
///
/// Bitwise operators work on 32-bit integers. Results that are not integers
/// are left to the runtime.
fn evaluate(node: Node, source: &str, enum_name: &str, members: &Members) -> Option<i64> {
    let eval = |n: Node| evaluate(n, source, enum_name, members);
    match node.kind() {
        "number" => parse_integer(text(node, source)),
        "parenthesized_expression" => node.named_child(0).and_then(eval),
        "identifier" => members.get(text(node, source)).flatten(),
        "member_expression" => {
            let object = node.child_by_field_name("object")?;
            let property = node.child_by_field_name("property")?;
            if text(object, source) != enum_name {
                return None;
            }
            members.get(text(property, source)).flatten()
        }
        "unary_expression" => {
            let operator = node.child_by_field_name("operator").map(|o| text(o, source))?;
            let argument = eval(node.child_by_field_name("argument")?)?;
            match operator {
                "-" => argument.checked_neg(),
                "+" => Some(argument),
                "~" => Some(!(argument as i32) as i64),
                _ => None,
            }
        }
        "binary_expression" => {
            let operator = node.child_by_field_name("operator").map(|o| text(o, source))?;
            let left = eval(node.child_by_field_name("left")?)?;
            let right = eval(node.child_by_field_name("right")?)?;
            let shift = (right as u32) & 31;
            match operator {
                "+" => left.checked_add(right),
                "-" => left.checked_sub(right),
                "*" => left.checked_mul(right),
                "/" if right != 0 && left % right == 0 => left.checked_div(right),
                "%" if right != 0 => left.checked_rem(right),
                "**" => u32::try_from(right).ok().and_then(|e| left.checked_pow(e)),
                "<<" => Some(((left as i32).wrapping_shl(shift)) as i64),
                ">>" => Some(((left as i32).wrapping_shr(shift)) as i64),
                ">>>" => Some(((left as i32 as u32).wrapping_shr(shift)) as i64),
                "|" => Some(((left as i32) | (right as i32)) as i64),
                "&" => Some(((left as i32) & (right as i32)) as i64),
                "^" => Some(((left as i32) ^ (right as i32)) as i64),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Initializer text with bare references to earlier members qualified
fn render_initializer(
    value: Option<Node>,
    source: &str,
    enum_name: &str,
    members: &Members,
) -> String {
    let Some(value) = value else {
        return String::new();
    };

    let mut references = Vec::new();
    collect_member_references(value, source, members, &mut references);

    let mut out = String::new();
    let mut cursor = value.start_byte();
    for reference in references {
        out.push_str(&source[cursor..reference.start_byte()]);
        out.push_str(&format!("{}.{}", enum_name, text(reference, source)));
        cursor = reference.end_byte();
    }
    out.push_str(&source[cursor..value.end_byte()]);
    out
}

fn collect_member_references<'t>(
    node: Node<'t>,
    source: &str,
    members: &Members,
    out: &mut Vec<Node<'t>>,
) {
    if node.kind() == "identifier" {
        if members.get(text(node, source)).is_some() {
            out.push(node);
        }
        return;
    }
    for child in named_children(node) {
        collect_member_references(child, source, members, out);
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else {
        lower.parse::<i64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::transform::compiler::syntax::parse;
    use crate::features::transform::compiler::SourceDialect;
    use pretty_assertions::assert_eq;

    fn lower_first_enum(source: &str) -> Result<String, Diagnostic> {
        let tree = parse(source, SourceDialect::TypeScript).unwrap();
        let root = tree.root_node();
        let node = named_children(root)
            .into_iter()
            .find(|n| n.kind() == "enum_declaration")
            .expect("enum in test source");
        lower_enum(node, source)
    }

    #[test]
    fn test_auto_numbered_enum() {
        let out = lower_first_enum("enum Color { Red, Green, Blue }").unwrap();
        assert_eq!(
            out,
            "var Color;\n(function (Color) {\n    Color[Color[\"Red\"] = 0] = \"Red\";\n    Color[Color[\"Green\"] = 1] = \"Green\";\n    Color[Color[\"Blue\"] = 2] = \"Blue\";\n})(Color || (Color = {}));"
        );
    }

    #[test]
    fn test_initializers_continue_numbering() {
        let out = lower_first_enum("enum Level { Low = 0x10, Mid, High = -1, Top }").unwrap();
        assert!(out.contains("Level[Level[\"Low\"] = 0x10] = \"Low\";"));
        assert!(out.contains("Level[Level[\"Mid\"] = 17] = \"Mid\";"));
        assert!(out.contains("Level[Level[\"High\"] = -1] = \"High\";"));
        assert!(out.contains("Level[Level[\"Top\"] = 0] = \"Top\";"));
    }

    #[test]
    fn test_string_members_have_no_reverse_mapping() {
        let out = lower_first_enum("enum Dir { Up = \"UP\", 'down-key' = \"DOWN\" }").unwrap();
        assert!(out.contains("Dir[\"Up\"] = \"UP\";"));
        assert!(out.contains("Dir['down-key'] = \"DOWN\";"));
    }

    #[test]
    fn test_auto_member_after_string_is_error() {
        let err = lower_first_enum("enum Bad { A = \"a\", B }").unwrap_err();
        assert!(err.message.contains("must have an initializer"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_constant_expressions_are_folded() {
        let out = lower_first_enum("enum Flags { A = 1 << 0, B = 1 << 1, C = ~0, D = 2 ** 3 }").unwrap();
        assert!(out.contains("Flags[Flags[\"A\"] = 1] = \"A\";"));
        assert!(out.contains("Flags[Flags[\"B\"] = 2] = \"B\";"));
        assert!(out.contains("Flags[Flags[\"C\"] = -1] = \"C\";"));
        assert!(out.contains("Flags[Flags[\"D\"] = 8] = \"D\";"));
    }

    #[test]
    fn test_references_to_earlier_members_are_folded() {
        let out = lower_first_enum("enum Flags { A = 1, B = A << 1, C = A | B, D }").unwrap();
        assert_eq!(
            out,
            "var Flags;\n(function (Flags) {\n    Flags[Flags[\"A\"] = 1] = \"A\";\n    Flags[Flags[\"B\"] = 2] = \"B\";\n    Flags[Flags[\"C\"] = 3] = \"C\";\n    Flags[Flags[\"D\"] = 4] = \"D\";\n})(Flags || (Flags = {}));"
        );
    }

    #[test]
    fn test_qualified_self_reference_is_folded() {
        let out = lower_first_enum("enum Mode { Read = 1, Write = 2, All = Mode.Read | Mode.Write }").unwrap();
        assert!(out.contains("Mode[Mode[\"All\"] = 3] = \"All\";"));
    }

    #[test]
    fn test_runtime_references_are_qualified() {
        let out = lower_first_enum("enum Size { Base = \"abc\".length, Double = Base * 2, Label = `${Base}px` }").unwrap();
        assert!(out.contains("Size[Size[\"Base\"] = \"abc\".length] = \"Base\";"));
        assert!(out.contains("Size[Size[\"Double\"] = Size.Base * 2] = \"Double\";"));
        assert!(out.contains("Size[\"Label\"] = `${Size.Base}px`;"));
    }

    #[test]
    fn test_unknown_identifiers_are_left_alone() {
        let out = lower_first_enum("enum Limits { Max = LIMIT + 1 }").unwrap();
        assert!(out.contains("Limits[Limits[\"Max\"] = LIMIT + 1] = \"Max\";"));
    }

    #[test]
    fn test_auto_member_after_runtime_value_is_error() {
        let err = lower_first_enum("enum Bad { A = compute(), B }").unwrap_err();
        assert!(err.message.contains("B"));
    }

    #[test]
    fn test_parse_integer_forms() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("1_000"), Some(1000));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("0o17"), Some(15));
        assert_eq!(parse_integer("1.5"), None);
    }
}
