//! Import/export model and its ES module and CommonJS renderings

use std::collections::HashSet;

use tree_sitter::Node;

use super::syntax::{named_children, text, token_child};
use crate::features::transform::ports::ModuleFormat;

const IMPORT_DEFAULT_HELPER: &str =
    "function __importDefault(mod) { return mod && mod.__esModule ? mod : { default: mod }; }";

const EXPORT_STAR_HELPER: &str = "function __exportStar(mod, target) { Object.keys(mod).forEach(function (key) { if (key !== \"default\" && !Object.prototype.hasOwnProperty.call(target, key)) target[key] = mod[key]; }); }";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ImportBinding {
    Default(String),
    Namespace(String),
    Named {
        imported: String,
        local: String,
        type_only: bool,
    },
}

impl ImportBinding {
    pub fn local(&self) -> &str {
        match self {
            ImportBinding::Default(local) | ImportBinding::Namespace(local) => local,
            ImportBinding::Named { local, .. } => local,
        }
    }

    fn is_type_only(&self) -> bool {
        matches!(self, ImportBinding::Named { type_only: true, .. })
    }
}

/// One `import` statement
#[derive(Debug, Clone)]
pub(crate) struct ImportDecl {
    pub start: usize,
    pub end: usize,
    /// Module specifier as written, quotes included
    pub source: String,
    pub bindings: Vec<ImportBinding>,
    pub type_only: bool,
    /// `import x = require("...")`
    pub require_form: bool,
    pub attributes: Option<String>,
}

impl ImportDecl {
    pub fn from_node(node: Node, source: &str) -> Self {
        let mut decl = ImportDecl {
            start: node.start_byte(),
            end: node.end_byte(),
            source: node
                .child_by_field_name("source")
                .map(|s| text(s, source).to_string())
                .unwrap_or_default(),
            bindings: Vec::new(),
            type_only: token_child(node, "type").is_some() || token_child(node, "typeof").is_some(),
            require_form: false,
            attributes: None,
        };

        for child in named_children(node) {
            match child.kind() {
                "import_clause" => decl.bindings.extend(clause_bindings(child, source)),
                "import_require_clause" => {
                    decl.require_form = true;
                    if let Some(src) = child.child_by_field_name("source") {
                        decl.source = text(src, source).to_string();
                    }
                    if let Some(local) = named_children(child)
                        .into_iter()
                        .find(|n| n.kind() == "identifier")
                    {
                        decl
                            .bindings
                            .push(ImportBinding::Namespace(text(local, source).to_string()));
                    }
                }
                "import_attribute" => decl.attributes = Some(text(child, source).to_string()),
                _ => {}
            }
        }
        decl
    }

    pub fn is_side_effect(&self) -> bool {
        self.bindings.is_empty() && !self.type_only
    }

    /// Local names that only exist at the type level
    pub fn type_only_locals(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|b| self.type_only || b.is_type_only())
            .map(|b| b.local())
            .collect()
    }

    fn retained(&self, used: &HashSet<String>, elide_unused: bool) -> Vec<&ImportBinding> {
        self.bindings
            .iter()
            .filter(|b| !b.is_type_only())
            .filter(|b| !elide_unused || used.contains(b.local()))
            .collect()
    }
}

fn clause_bindings(clause: Node, source: &str) -> Vec<ImportBinding> {
    let mut bindings = Vec::new();
    for child in named_children(clause) {
        match child.kind() {
            "identifier" => bindings.push(ImportBinding::Default(text(child, source).to_string())),
            "namespace_import" => {
                if let Some(local) = named_children(child)
                    .into_iter()
                    .find(|n| n.kind() == "identifier")
                {
                    bindings.push(ImportBinding::Namespace(text(local, source).to_string()));
                }
            }
            "named_imports" => {
                for spec in named_children(child) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let imported = text(name, source).to_string();
                    let local = spec
                        .child_by_field_name("alias")
                        .map(|a| text(a, source).to_string())
                        .unwrap_or_else(|| imported.clone());
                    bindings.push(ImportBinding::Named {
                        imported,
                        local,
                        type_only: token_child(spec, "type").is_some()
                            || token_child(spec, "typeof").is_some(),
                    });
                }
            }
            _ => {}
        }
    }
    bindings
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExportSpecifier {
    pub name: String,
    pub alias: Option<String>,
    pub type_only: bool,
}

impl ExportSpecifier {
    pub fn exported(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn render(&self) -> String {
        match &self.alias {
            Some(alias) if alias != &self.name => format!("{} as {}", self.name, alias),
            _ => self.name.clone(),
        }
    }
}

/// `export { ... }` clause without a source, resolved after the walk
#[derive(Debug, Clone)]
pub(crate) struct LocalExportList {
    pub start: usize,
    pub end: usize,
    pub specifiers: Vec<ExportSpecifier>,
}

pub(crate) fn export_specifiers(clause: Node, source: &str) -> Vec<ExportSpecifier> {
    named_children(clause)
        .into_iter()
        .filter(|spec| spec.kind() == "export_specifier")
        .filter_map(|spec| {
            let name = spec.child_by_field_name("name")?;
            Some(ExportSpecifier {
                name: text(name, source).to_string(),
                alias: spec
                    .child_by_field_name("alias")
                    .map(|a| text(a, source).to_string()),
                type_only: token_child(spec, "type").is_some(),
            })
        })
        .collect()
}

/// CommonJS interop helpers referenced by the rewritten module
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Helpers {
    pub import_default: bool,
    pub export_star: bool,
}

pub(crate) fn commonjs_prelude(helpers: Helpers) -> String {
    let mut out = String::from(
        "\"use strict\";\nObject.defineProperty(exports, \"__esModule\", { value: true });\n",
    );
    if helpers.import_default {
        out.push_str(IMPORT_DEFAULT_HELPER);
        out.push('\n');
    }
    if helpers.export_star {
        out.push_str(EXPORT_STAR_HELPER);
        out.push('\n');
    }
    out
}

/// Replacement text for an import, `None` when it stays as written.
/// An empty replacement removes the statement.
pub(crate) fn import_replacement(
    decl: &ImportDecl,
    used: &HashSet<String>,
    elide_unused: bool,
    format: ModuleFormat,
    helpers: &mut Helpers,
) -> Option<String> {
    if decl.type_only {
        return Some(String::new());
    }
    let retained = decl.retained(used, elide_unused);
    if !decl.is_side_effect() && retained.is_empty() {
        return Some(String::new());
    }

    match format {
        ModuleFormat::EsModule => {
            if retained.len() == decl.bindings.len() {
                None
            } else {
                Some(render_es_import(decl, &retained))
            }
        }
        ModuleFormat::CommonJs => Some(render_commonjs_import(decl, &retained, helpers)),
    }
}

fn render_es_import(decl: &ImportDecl, retained: &[&ImportBinding]) -> String {
    let mut parts = Vec::new();
    let mut named = Vec::new();
    for binding in retained {
        match binding {
            ImportBinding::Default(local) => parts.push(local.clone()),
            ImportBinding::Namespace(local) => parts.push(format!("* as {}", local)),
            ImportBinding::Named {
                imported, local, ..
            } if imported == local => named.push(local.clone()),
            ImportBinding::Named {
                imported, local, ..
            } => named.push(format!("{} as {}", imported, local)),
        }
    }
    if !named.is_empty() {
        parts.push(format!("{{ {} }}", named.join(", ")));
    }
    let attributes = decl
        .attributes
        .as_ref()
        .map(|a| format!(" {}", a))
        .unwrap_or_default();
    format!("import {} from {}{};", parts.join(", "), decl.source, attributes)
}

fn render_commonjs_import(
    decl: &ImportDecl,
    retained: &[&ImportBinding],
    helpers: &mut Helpers,
) -> String {
    let require = format!("require({})", decl.source);
    if retained.is_empty() {
        return format!("{};", require);
    }

    let mut statements = Vec::new();
    let mut named = Vec::new();
    for binding in retained {
        match binding {
            ImportBinding::Namespace(local) => {
                statements.push(format!("const {} = {};", local, require))
            }
            ImportBinding::Default(local) => {
                helpers.import_default = true;
                statements.push(format!(
                    "const {} = __importDefault({}).default;",
                    local, require
                ));
            }
            ImportBinding::Named {
                imported, local, ..
            } if imported == local => named.push(local.clone()),
            ImportBinding::Named {
                imported, local, ..
            } => named.push(format!("{}: {}", imported, local)),
        }
    }
    if !named.is_empty() {
        statements.push(format!("const {{ {} }} = {};", named.join(", "), require));
    }
    statements.join(" ")
}

pub(crate) fn local_export_replacement(
    list: &LocalExportList,
    type_names: &HashSet<String>,
    type_only_imports: &HashSet<String>,
    format: ModuleFormat,
) -> Option<String> {
    let kept: Vec<&ExportSpecifier> = list
        .specifiers
        .iter()
        .filter(|s| !s.type_only)
        .filter(|s| !type_names.contains(&s.name) && !type_only_imports.contains(&s.name))
        .collect();

    match format {
        ModuleFormat::EsModule => {
            if kept.len() == list.specifiers.len() {
                None
            } else if kept.is_empty() {
                Some(String::new())
            } else {
                Some(render_es_export(&kept, None))
            }
        }
        ModuleFormat::CommonJs => Some(
            kept.iter()
                .map(|s| format!("{} = {};", member("exports", s.exported()), s.name))
                .collect::<Vec<_>>()
                .join(" "),
        ),
    }
}

/// `export { ... } from "..."`
pub(crate) fn reexport_replacement(
    specifiers: &[ExportSpecifier],
    module_source: &str,
    format: ModuleFormat,
) -> Option<String> {
    let kept: Vec<&ExportSpecifier> = specifiers.iter().filter(|s| !s.type_only).collect();
    if kept.is_empty() && !specifiers.is_empty() {
        return Some(String::new());
    }

    match format {
        ModuleFormat::EsModule => {
            if kept.len() == specifiers.len() {
                None
            } else {
                Some(render_es_export(&kept, Some(module_source)))
            }
        }
        ModuleFormat::CommonJs => {
            if kept.is_empty() {
                return Some(format!("require({});", module_source));
            }
            let require = format!("require({})", module_source);
            Some(
                kept.iter()
                    .map(|s| {
                        format!(
                            "{} = {};",
                            member("exports", s.exported()),
                            member(&require, &s.name)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }
}

fn render_es_export(kept: &[&ExportSpecifier], module_source: Option<&str>) -> String {
    let list = kept.iter().map(|s| s.render()).collect::<Vec<_>>().join(", ");
    match module_source {
        Some(src) => format!("export {{ {} }} from {};", list, src),
        None => format!("export {{ {} }};", list),
    }
}

/// Property access, bracketed when the name is a string literal
pub(crate) fn member(object: &str, name: &str) -> String {
    if is_identifier_name(name) {
        format!("{}.{}", object, name)
    } else {
        format!("{}[{}]", object, name)
    }
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
