//! Syntax-tree walk that erases TypeScript-only syntax and rewrites modules

use std::collections::HashSet;

use tree_sitter::{Node, Tree};

use super::edits::EditList;
use super::enums::lower_enum;
use super::jsx::{is_jsx_root, lower_jsx};
use super::modules::{
    commonjs_prelude, export_specifiers, import_replacement, local_export_replacement, member,
    reexport_replacement, Helpers, ImportDecl, LocalExportList,
};
use super::syntax::{diagnostic_at, named_children, text, token_child};
use super::SourceDialect;
use crate::errors::Diagnostic;
use crate::features::transform::ports::ModuleFormat;

/// Rewrite a parsed module.
///
/// Type-level syntax is erased from TypeScript only, and only TypeScript
/// drops import bindings never referenced as values. JSX is lowered and
/// module syntax rewritten for both dialects.
pub(crate) fn strip(
    source: &str,
    tree: &Tree,
    dialect: SourceDialect,
    format: ModuleFormat,
) -> Result<String, Diagnostic> {
    let mut stripper = Stripper::new(source, dialect, format);
    stripper.visit(tree.root_node())?;
    Ok(stripper.finish())
}

struct Stripper<'s> {
    source: &'s str,
    dialect: SourceDialect,
    format: ModuleFormat,
    edits: EditList,
    /// Interfaces and type aliases declared in this module
    type_names: HashSet<String>,
    type_only_imports: HashSet<String>,
    /// Identifiers referenced outside type positions
    used: HashSet<String>,
    imports: Vec<ImportDecl>,
    local_exports: Vec<LocalExportList>,
    helpers: Helpers,
    has_module_syntax: bool,
    hash_bang_end: Option<usize>,
}

impl<'s> Stripper<'s> {
    fn new(source: &'s str, dialect: SourceDialect, format: ModuleFormat) -> Self {
        Self {
            source,
            dialect,
            format,
            edits: EditList::new(),
            type_names: HashSet::new(),
            type_only_imports: HashSet::new(),
            used: HashSet::new(),
            imports: Vec::new(),
            local_exports: Vec::new(),
            helpers: Helpers::default(),
            has_module_syntax: false,
            hash_bang_end: None,
        }
    }

    fn commonjs(&self) -> bool {
        self.format == ModuleFormat::CommonJs
    }

    fn visit(&mut self, node: Node) -> Result<(), Diagnostic> {
        match node.kind() {
            "hash_bang_line" => {
                self.hash_bang_end = Some(node.end_byte());
                Ok(())
            }
            "import_statement" => self.visit_import(node),
            "export_statement" => self.visit_export(node),
            _ if is_jsx_root(node) => self.visit_jsx(node),
            "identifier" | "shorthand_property_identifier" => {
                self.used.insert(text(node, self.source).to_string());
                Ok(())
            }
            _ if self.dialect == SourceDialect::TypeScript => self.visit_typescript(node),
            _ => self.visit_children(node),
        }
    }

    /// Type-level syntax erasure
    fn visit_typescript(&mut self, node: Node) -> Result<(), Diagnostic> {
        match node.kind() {
            "type_annotation"
            | "type_parameters"
            | "type_arguments"
            | "asserts_annotation"
            | "type_predicate_annotation"
            | "ambient_declaration"
            | "function_signature"
            | "method_signature"
            | "abstract_method_signature"
            | "index_signature"
            | "implements_clause" => {
                self.remove(node);
                Ok(())
            }
            "accessibility_modifier" | "override_modifier" => {
                self.remove_with_space(node);
                Ok(())
            }
            "interface_declaration" | "type_alias_declaration" => {
                self.record_type_name(node);
                self.remove(node);
                Ok(())
            }
            "enum_declaration" => self.visit_enum(node),
            "internal_module" | "module" => {
                Err(diagnostic_at(node, "Namespaces are not supported"))
            }
            "import_alias" => Err(diagnostic_at(
                node,
                "`import X = Y.Z` aliases are not supported",
            )),
            "as_expression" | "satisfies_expression" | "non_null_expression" => {
                self.visit_expression_suffix(node)
            }
            "required_parameter" | "optional_parameter" => self.visit_parameter(node),
            "public_field_definition" => self.visit_field(node),
            "method_definition" => self.visit_method(node),
            "abstract_class_declaration" => {
                self.remove_token_with_space(node, "abstract");
                self.visit_children(node)
            }
            "variable_declarator" => {
                self.remove_token(node, "!");
                self.visit_children(node)
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) -> Result<(), Diagnostic> {
        for child in named_children(node) {
            self.visit(child)?;
        }
        Ok(())
    }

    // ---- edits ----

    fn remove(&mut self, node: Node) {
        self.edits.remove(node.start_byte(), node.end_byte());
    }

    fn remove_with_space(&mut self, node: Node) {
        let end = self.skip_inline_space(node.end_byte());
        self.edits.remove(node.start_byte(), end);
    }

    fn remove_token(&mut self, node: Node, token: &str) {
        if let Some(tok) = token_child(node, token) {
            self.remove(tok);
        }
    }

    fn remove_token_with_space(&mut self, node: Node, token: &str) {
        if let Some(tok) = token_child(node, token) {
            self.remove_with_space(tok);
        }
    }

    fn skip_inline_space(&self, mut at: usize) -> usize {
        let bytes = self.source.as_bytes();
        while at < bytes.len() && (bytes[at] == b' ' || bytes[at] == b'\t') {
            at += 1;
        }
        at
    }

    /// `;` when the statement relies on automatic semicolon insertion
    fn terminator(&self, node: Node) -> &'static str {
        if text(node, self.source).trim_end().ends_with(';') {
            ""
        } else {
            ";"
        }
    }

    fn record_type_name(&mut self, node: Node) {
        if let Some(name) = node.child_by_field_name("name") {
            self.type_names.insert(text(name, self.source).to_string());
        }
    }

    // ---- expressions and declarations ----

    fn visit_expression_suffix(&mut self, node: Node) -> Result<(), Diagnostic> {
        match node.named_child(0) {
            Some(inner) => {
                self.edits.remove(inner.end_byte(), node.end_byte());
                self.visit(inner)
            }
            None => Ok(()),
        }
    }

    fn visit_parameter(&mut self, node: Node) -> Result<(), Diagnostic> {
        if let Some(pattern) = node.child_by_field_name("pattern") {
            if pattern.kind() == "this" {
                self.remove_this_parameter(node);
                return Ok(());
            }
        }
        self.remove_token_with_space(node, "readonly");
        if node.kind() == "optional_parameter" {
            self.remove_token(node, "?");
        }
        self.visit_children(node)
    }

    fn remove_this_parameter(&mut self, node: Node) {
        let mut end = node.end_byte();
        if let Some(next) = node.next_sibling() {
            if next.kind() == "," {
                end = self.skip_inline_space(next.end_byte());
            }
        }
        self.edits.remove(node.start_byte(), end);
    }

    fn visit_field(&mut self, node: Node) -> Result<(), Diagnostic> {
        if token_child(node, "declare").is_some() || token_child(node, "abstract").is_some() {
            self.remove(node);
            return Ok(());
        }
        self.remove_token(node, "?");
        self.remove_token(node, "!");
        self.remove_token_with_space(node, "readonly");
        self.visit_children(node)
    }

    fn visit_method(&mut self, node: Node) -> Result<(), Diagnostic> {
        self.remove_token(node, "?");

        let is_constructor = node
            .child_by_field_name("name")
            .is_some_and(|n| text(n, self.source) == "constructor");
        if is_constructor {
            self.insert_parameter_properties(node)?;
        }
        self.visit_children(node)
    }

    /// `constructor(private x)` assigns `this.x = x` on entry.
    ///
    /// In a derived class the assignments follow the top-level `super(...)`
    /// call, wherever it sits in the body.
    fn insert_parameter_properties(&mut self, method: Node) -> Result<(), Diagnostic> {
        let (Some(params), Some(body)) = (
            method.child_by_field_name("parameters"),
            method.child_by_field_name("body"),
        ) else {
            return Ok(());
        };

        let names: Vec<String> = named_children(params)
            .into_iter()
            .filter(|p| is_parameter_property(*p))
            .filter_map(|p| p.child_by_field_name("pattern"))
            .filter(|pattern| pattern.kind() == "identifier")
            .map(|pattern| text(pattern, self.source).to_string())
            .collect();
        if names.is_empty() {
            return Ok(());
        }

        let super_call = named_children(body)
            .into_iter()
            .find(|statement| is_super_call(*statement));
        let (at, prefix) = match super_call {
            Some(statement) => (statement.end_byte(), self.terminator(statement)),
            None if is_derived_class(method) => {
                return Err(diagnostic_at(
                    body,
                    "Parameter properties in a derived class need a top-level `super(...)` call",
                ));
            }
            None => (body.start_byte() + 1, ""),
        };

        let assignments: String = names
            .iter()
            .map(|name| format!(" this.{name} = {name};"))
            .collect();
        self.edits.insert(at, format!("{}{}", prefix, assignments));
        Ok(())
    }

    fn visit_enum(&mut self, node: Node) -> Result<(), Diagnostic> {
        let lowered = lower_enum(node, self.source)?;
        if let Some(body) = node.child_by_field_name("body") {
            self.collect_identifiers(body);
        }
        self.edits
            .replace(node.start_byte(), node.end_byte(), lowered);
        Ok(())
    }

    fn visit_jsx(&mut self, node: Node) -> Result<(), Diagnostic> {
        let lowered = lower_jsx(node, self.source)?;
        self.collect_identifiers(node);
        self.used.insert("React".to_string());
        self.edits
            .replace(node.start_byte(), node.end_byte(), lowered);
        Ok(())
    }

    fn collect_identifiers(&mut self, node: Node) {
        if node.kind() == "identifier" {
            self.used.insert(text(node, self.source).to_string());
        }
        for child in named_children(node) {
            self.collect_identifiers(child);
        }
    }

    // ---- modules ----

    fn visit_import(&mut self, node: Node) -> Result<(), Diagnostic> {
        self.has_module_syntax = true;
        let decl = ImportDecl::from_node(node, self.source);
        if decl.require_form && !self.commonjs() {
            return Err(diagnostic_at(
                node,
                "`import x = require(...)` cannot be emitted as an ES module",
            ));
        }
        for local in decl.type_only_locals() {
            self.type_only_imports.insert(local.to_string());
        }
        self.imports.push(decl);
        Ok(())
    }

    fn visit_export(&mut self, node: Node) -> Result<(), Diagnostic> {
        self.has_module_syntax = true;

        if token_child(node, "=").is_some() {
            return self.visit_export_assignment(node);
        }
        if token_child(node, "namespace").is_some() || token_child(node, "type").is_some() {
            // `export as namespace X` and `export type { ... }`
            self.remove(node);
            return Ok(());
        }
        if let Some(declaration) = node.child_by_field_name("declaration") {
            return self.visit_exported_declaration(node, declaration);
        }
        if let Some(value) = node.child_by_field_name("value") {
            return self.visit_default_value(node, value);
        }

        let module_source = node
            .child_by_field_name("source")
            .map(|s| text(s, self.source).to_string());
        let clause = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "export_clause");
        let namespace = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "namespace_export");

        match (module_source, clause, namespace) {
            (Some(src), Some(clause), _) => {
                let specifiers = export_specifiers(clause, self.source);
                if let Some(replacement) = reexport_replacement(&specifiers, &src, self.format) {
                    self.edits
                        .replace(node.start_byte(), node.end_byte(), replacement);
                }
            }
            (Some(src), None, Some(namespace)) if self.commonjs() => {
                let name = named_children(namespace)
                    .into_iter()
                    .next()
                    .map(|n| text(n, self.source).to_string())
                    .ok_or_else(|| diagnostic_at(namespace, "Namespace export without a name"))?;
                self.edits.replace(
                    node.start_byte(),
                    node.end_byte(),
                    format!("{} = require({});", member("exports", &name), src),
                );
            }
            (Some(src), None, None) if self.commonjs() => {
                self.helpers.export_star = true;
                self.edits.replace(
                    node.start_byte(),
                    node.end_byte(),
                    format!("__exportStar(require({}), exports);", src),
                );
            }
            (None, Some(clause), _) => {
                let specifiers = export_specifiers(clause, self.source);
                for spec in specifiers.iter().filter(|s| !s.type_only) {
                    self.used.insert(spec.name.clone());
                }
                self.local_exports.push(LocalExportList {
                    start: node.start_byte(),
                    end: node.end_byte(),
                    specifiers,
                });
            }
            _ => return self.visit_children(node),
        }
        Ok(())
    }

    /// `export = value`
    fn visit_export_assignment(&mut self, node: Node) -> Result<(), Diagnostic> {
        if !self.commonjs() {
            return Err(diagnostic_at(
                node,
                "`export =` cannot be emitted as an ES module",
            ));
        }
        let value = named_children(node)
            .into_iter()
            .find(|c| c.kind() != "comment" && c.kind() != "decorator")
            .ok_or_else(|| diagnostic_at(node, "`export =` without a value"))?;

        self.edits
            .replace(node.start_byte(), value.start_byte(), "module.exports = ");
        let terminator = self.terminator(node);
        self.edits.insert(node.end_byte(), terminator);
        self.visit(value)
    }

    fn visit_exported_declaration(
        &mut self,
        node: Node,
        declaration: Node,
    ) -> Result<(), Diagnostic> {
        match declaration.kind() {
            "interface_declaration" | "type_alias_declaration" => {
                self.record_type_name(declaration);
                self.remove(node);
                return Ok(());
            }
            "ambient_declaration" | "function_signature" => {
                self.remove(node);
                return Ok(());
            }
            _ => {}
        }

        let names = declared_names(declaration, self.source);
        self.visit(declaration)?;
        if !self.commonjs() {
            return Ok(());
        }

        let export_start = token_child(node, "export")
            .map(|t| t.start_byte())
            .unwrap_or_else(|| node.start_byte());
        self.edits.remove(export_start, declaration.start_byte());

        let is_default = token_child(node, "default").is_some();
        let assignments: String = if is_default {
            names
                .first()
                .map(|name| format!(" exports.default = {};", name))
                .unwrap_or_default()
        } else {
            names
                .iter()
                .map(|name| format!(" {} = {};", member("exports", name), name))
                .collect()
        };
        let terminator = match declaration.kind() {
            "lexical_declaration" | "variable_declaration" => self.terminator(declaration),
            _ => "",
        };
        self.edits
            .insert(node.end_byte(), format!("{}{}", terminator, assignments));
        Ok(())
    }

    /// `export default <expression>`
    fn visit_default_value(&mut self, node: Node, value: Node) -> Result<(), Diagnostic> {
        if value.kind() == "identifier" && self.type_names.contains(text(value, self.source)) {
            self.remove(node);
            return Ok(());
        }
        self.visit(value)?;
        if !self.commonjs() {
            return Ok(());
        }

        let export_start = token_child(node, "export")
            .map(|t| t.start_byte())
            .unwrap_or_else(|| node.start_byte());
        self.edits
            .replace(export_start, value.start_byte(), "exports.default = ");
        let terminator = self.terminator(node);
        self.edits.insert(node.end_byte(), terminator);
        Ok(())
    }

    fn finish(mut self) -> String {
        let elide_unused_imports = self.dialect == SourceDialect::TypeScript;
        for list in &self.local_exports {
            if let Some(replacement) = local_export_replacement(
                list,
                &self.type_names,
                &self.type_only_imports,
                self.format,
            ) {
                self.edits.replace(list.start, list.end, replacement);
            }
        }

        for decl in &self.imports {
            if let Some(replacement) = import_replacement(
                decl,
                &self.used,
                elide_unused_imports,
                self.format,
                &mut self.helpers,
            ) {
                self.edits.replace(decl.start, decl.end, replacement);
            }
        }

        if self.commonjs() && self.has_module_syntax {
            let prelude = commonjs_prelude(self.helpers);
            match self.hash_bang_end {
                Some(at) => {
                    let trimmed = prelude.trim_end_matches('\n');
                    self.edits.insert(at, format!("\n{}", trimmed));
                }
                None => self.edits.insert(0, prelude),
            }
        }

        self.edits.apply(self.source)
    }
}

fn is_parameter_property(param: Node) -> bool {
    if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
        return false;
    }
    token_child(param, "readonly").is_some()
        || named_children(param)
            .iter()
            .any(|c| matches!(c.kind(), "accessibility_modifier" | "override_modifier"))
}

/// Constructor of a class with an `extends` clause
fn is_derived_class(method: Node) -> bool {
    let Some(class) = method.parent().and_then(|body| body.parent()) else {
        return false;
    };
    named_children(class)
        .into_iter()
        .filter(|c| c.kind() == "class_heritage")
        .any(|heritage| {
            named_children(heritage)
                .iter()
                .any(|c| c.kind() == "extends_clause")
        })
}

fn is_super_call(statement: Node) -> bool {
    if statement.kind() != "expression_statement" {
        return false;
    }
    statement
        .named_child(0)
        .filter(|expr| expr.kind() == "call_expression")
        .and_then(|call| call.child_by_field_name("function"))
        .is_some_and(|callee| callee.kind() == "super")
}

/// Bindings introduced by an exported declaration
fn declared_names(declaration: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    match declaration.kind() {
        "lexical_declaration" | "variable_declaration" => {
            for declarator in named_children(declaration) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(pattern) = declarator.child_by_field_name("name") {
                    names_in_pattern(pattern, source, &mut names);
                }
            }
        }
        _ => {
            if let Some(name) = declaration.child_by_field_name("name") {
                names.push(text(name, source).to_string());
            }
        }
    }
    names
}

fn names_in_pattern(node: Node, source: &str, out: &mut Vec<String>) {
    match node.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            out.push(text(node, source).to_string())
        }
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                names_in_pattern(value, source, out);
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                names_in_pattern(left, source, out);
            }
        }
        "type_annotation" => {}
        _ => {
            for child in named_children(node) {
                names_in_pattern(child, source, out);
            }
        }
    }
}
