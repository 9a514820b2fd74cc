//! Rust `use`-path classification and registration into the [`SymbolTable`].
//!
//! Classifies every `use` statement into one of four categories and turns it into either a
//! symbol-table import alias (local/cross-workspace) or an `ExternalPackage` reference —
//! never into a graph edge directly; the ingester asks the resolved [`SymbolTable`] for that
//! once every file has been parsed (spec.md §4.2/§4.3 two-pass boundary).
//!
//! # Classification
//! - **Builtin**: `std::`, `core::`, `alloc::` (or bare `std`, `core`, `alloc`) — dropped; the
//!   data model has no node for the standard library.
//! - **IntraCrate**: `crate::`, `self::`, `super::` — resolved via [`RustModTree`].
//! - **CrossWorkspace**: first segment matches a workspace crate name — resolved to that
//!   crate's root module.
//! - **External**: everything else — registered as an `ExternalPackage`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::resolver::SymbolTable;
use crate::resolver::cargo_workspace::discover_rust_workspace_members;
use crate::resolver::rust_mod_tree::{RustModTree, build_mod_tree};

#[derive(Debug, Clone, PartialEq, Eq)]
enum UsePathKind {
    IntraCrate,
    CrossWorkspace,
    Builtin,
    External,
}

/// A single `use` (or `pub use`) statement as captured by the parser, before resolution.
#[derive(Debug, Clone)]
pub struct RustUseStatement {
    /// The path exactly as written, e.g. `"crate::parser::imports"`, `"super::Parser"`,
    /// `"std::collections::HashMap"`. Glob imports keep the trailing `::*`.
    pub path: String,
    /// The bound local name, if the statement renamed it (`use x as y;`). `None` for ordinary
    /// and glob imports — the local name is then derived from `path`'s last segment.
    pub alias: Option<String>,
}

/// Counts collected while registering a project's Rust imports.
#[derive(Debug, Default)]
pub struct RustResolveStats {
    pub resolved: usize,
    pub external: usize,
    pub builtin: usize,
    pub unresolved: usize,
}

/// Classify a Rust use path string. Checked in this order: bare/prefixed `std`/`core`/`alloc`
/// → `Builtin`; `crate::`/`self::`/`super::` → `IntraCrate`; first segment (hyphen-normalized)
/// matches a workspace crate name → `CrossWorkspace`; otherwise → `External`.
fn classify_use_path(path: &str, workspace_crate_names: &HashSet<String>) -> UsePathKind {
    let bare = matches!(path, "std" | "core" | "alloc");
    let prefixed = path.starts_with("std::") || path.starts_with("core::") || path.starts_with("alloc::");
    if bare || prefixed {
        return UsePathKind::Builtin;
    }

    if path.starts_with("crate::") || path.starts_with("self::") || path.starts_with("super::") {
        return UsePathKind::IntraCrate;
    }

    let first_segment = path.split("::").next().unwrap_or("").replace('-', "_");
    if workspace_crate_names.contains(&first_segment) {
        return UsePathKind::CrossWorkspace;
    }

    UsePathKind::External
}

/// Convert a `super::…` path into an absolute `crate::…` path. `None` if the number of
/// `super::` segments exceeds the module's depth (invalid Rust — treated as unresolved).
fn resolve_super_path(path: &str, current_file: &Path, mod_tree: &RustModTree) -> Option<String> {
    let module_path = mod_tree.file_to_module_path(current_file)?.as_str().to_owned();
    let module_segments: Vec<&str> = module_path.split("::").skip(1).collect();

    let mut remaining = path;
    let mut super_count = 0usize;
    while let Some(rest) = remaining.strip_prefix("super::") {
        super_count += 1;
        remaining = rest;
    }

    if super_count > module_segments.len() {
        return None;
    }

    let kept = module_segments.len() - super_count;
    let mut result = String::from("crate");
    for seg in &module_segments[..kept] {
        result.push_str("::");
        result.push_str(seg);
    }
    if !remaining.is_empty() {
        result.push_str("::");
        result.push_str(remaining);
    }
    Some(result)
}

/// Convert a `self::…` path into an absolute `crate::…` path.
fn resolve_self_path(path: &str, current_file: &Path, mod_tree: &RustModTree) -> Option<String> {
    let module_path = mod_tree.file_to_module_path(current_file)?.as_str().to_owned();
    let rest = path.strip_prefix("self::").unwrap_or(path);
    if rest.is_empty() {
        return Some(module_path);
    }
    Some(format!("{module_path}::{rest}"))
}

/// Turn a `crate::a::b` module path into this project's dotted qualified name, e.g.
/// `"proj.a.b"` (dropping the leading `crate` segment — a crate's own root module is the
/// project-scoped module itself, not a named child of it).
pub(crate) fn dotted_qualified_name(project: &str, crate_module_path: &str) -> String {
    let rest = crate_module_path.strip_prefix("crate").unwrap_or(crate_module_path);
    let rest = rest.strip_prefix("::").unwrap_or(rest);
    if rest.is_empty() {
        project.to_string()
    } else {
        format!("{project}.{}", rest.replace("::", "."))
    }
}

fn local_name_of(stmt: &RustUseStatement) -> String {
    if let Some(alias) = &stmt.alias {
        return alias.clone();
    }
    stmt.path.trim_end_matches("::*").rsplit("::").next().unwrap_or(&stmt.path).to_string()
}

/// Register every Rust `use` statement across a project into `table`, resolving local/
/// cross-workspace paths against the crates' module trees and falling back to `ExternalPackage`
/// for everything else. `file_module_qn` maps each indexed file to the dotted qualified name
/// its module was registered under during the structural pass (spec.md §4.3 pass 1).
pub fn register_rust_imports(
    table: &mut SymbolTable,
    project_root: &Path,
    file_module_qn: &HashMap<PathBuf, String>,
    file_uses: &HashMap<PathBuf, Vec<RustUseStatement>>,
) -> RustResolveStats {
    let mut stats = RustResolveStats::default();

    let workspace_members = discover_rust_workspace_members(project_root);
    if workspace_members.is_empty() {
        return stats;
    }
    let workspace_crate_names: HashSet<String> = workspace_members.keys().cloned().collect();

    let mut crate_mod_trees: HashMap<String, RustModTree> = HashMap::new();
    for (crate_name, crate_root) in &workspace_members {
        crate_mod_trees.insert(crate_name.clone(), build_mod_tree(crate_name, crate_root));
    }

    let mut file_to_crate: HashMap<PathBuf, String> = HashMap::new();
    for (crate_name, tree) in &crate_mod_trees {
        for file_path in tree.mod_map.values() {
            file_to_crate.insert(file_path.clone(), crate_name.clone());
        }
    }

    for (file, statements) in file_uses {
        let Some(source_module_qn) = file_module_qn.get(file) else { continue };
        let current_crate = file_to_crate.get(file).cloned().unwrap_or_default();
        let mod_tree = crate_mod_trees.get(&current_crate);

        for stmt in statements {
            match classify_use_path(&stmt.path, &workspace_crate_names) {
                UsePathKind::Builtin => stats.builtin += 1,

                UsePathKind::IntraCrate => {
                    let resolved_path = if stmt.path.starts_with("super::") {
                        mod_tree.and_then(|t| resolve_super_path(&stmt.path, file, t))
                    } else if stmt.path.starts_with("self::") {
                        mod_tree.and_then(|t| resolve_self_path(&stmt.path, file, t))
                    } else {
                        Some(stmt.path.clone())
                    };

                    let Some(resolved_path) = resolved_path else {
                        stats.unresolved += 1;
                        continue;
                    };

                    let is_glob = resolved_path.ends_with("::*");
                    let lookup_path =
                        if is_glob { resolved_path[..resolved_path.len() - 3].to_string() } else { resolved_path.clone() };

                    match mod_tree.and_then(|t| t.resolve_module_path(&lookup_path)) {
                        Some(target_file) => {
                            let target_module = mod_tree
                                .and_then(|t| t.file_to_module_path(target_file))
                                .cloned()
                                .unwrap_or(lookup_path);
                            let target_qn = dotted_qualified_name(table.project(), &target_module);
                            if is_glob {
                                table.register_wildcard_import(source_module_qn, &target_qn);
                            } else {
                                table.register_import_alias(source_module_qn, &local_name_of(stmt), &target_qn);
                            }
                            stats.resolved += 1;
                        }
                        None => stats.unresolved += 1,
                    }
                }

                UsePathKind::CrossWorkspace => {
                    let first_segment = stmt.path.split("::").next().unwrap_or("").replace('-', "_");
                    match workspace_members.get(&first_segment) {
                        Some(root_path) => {
                            if let Some(target_qn) = file_module_qn.get(root_path) {
                                table.register_import_alias(source_module_qn, &local_name_of(stmt), target_qn);
                                stats.resolved += 1;
                            } else {
                                stats.unresolved += 1;
                            }
                        }
                        None => stats.unresolved += 1,
                    }
                }

                UsePathKind::External => {
                    let pkg_name = stmt.path.split("::").next().unwrap_or(&stmt.path).replace('-', "_");
                    let external_qn = table.register_external_package(&pkg_name);
                    table.register_import_alias(source_module_qn, &local_name_of(stmt), &external_qn);
                    stats.external += 1;
                }
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_workspace_set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classify_std_prefixed() {
        let ws = make_workspace_set(&[]);
        assert_eq!(classify_use_path("std::collections::HashMap", &ws), UsePathKind::Builtin);
        assert_eq!(classify_use_path("core::mem::size_of", &ws), UsePathKind::Builtin);
        assert_eq!(classify_use_path("alloc::vec::Vec", &ws), UsePathKind::Builtin);
    }

    #[test]
    fn test_classify_bare_builtin() {
        let ws = make_workspace_set(&[]);
        assert_eq!(classify_use_path("std", &ws), UsePathKind::Builtin);
    }

    #[test]
    fn test_classify_intra_crate() {
        let ws = make_workspace_set(&[]);
        assert_eq!(classify_use_path("crate::parser::imports", &ws), UsePathKind::IntraCrate);
        assert_eq!(classify_use_path("self::utils", &ws), UsePathKind::IntraCrate);
        assert_eq!(classify_use_path("super::sibling", &ws), UsePathKind::IntraCrate);
    }

    #[test]
    fn test_classify_cross_workspace() {
        let ws = make_workspace_set(&["my_lib"]);
        assert_eq!(classify_use_path("my_lib::Foo", &ws), UsePathKind::CrossWorkspace);
    }

    #[test]
    fn test_classify_external() {
        let ws = make_workspace_set(&[]);
        assert_eq!(classify_use_path("serde::Serialize", &ws), UsePathKind::External);
    }

    #[test]
    fn test_dotted_qualified_name() {
        assert_eq!(dotted_qualified_name("proj", "crate"), "proj");
        assert_eq!(dotted_qualified_name("proj", "crate::parser::imports"), "proj.parser.imports");
    }

    #[test]
    fn test_resolve_super_one_level() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path();
        std::fs::create_dir_all(p.join("src/parser")).unwrap();
        std::fs::write(p.join("src/lib.rs"), "pub mod parser;\n").unwrap();
        std::fs::write(p.join("src/parser.rs"), "pub mod imports;\n").unwrap();
        std::fs::write(p.join("src/parser/imports.rs"), "use super::Parser;").unwrap();
        std::fs::write(p.join("Cargo.toml"), "[package]\nname = \"test-crate\"\nversion = \"0.1.0\"\n").unwrap();

        let tree = build_mod_tree("test_crate", &p.join("src/lib.rs"));
        let imports_file = p.join("src/parser/imports.rs");
        let result = resolve_super_path("super::Parser", &imports_file, &tree);
        assert_eq!(result, Some("crate::parser::Parser".to_string()));
    }

    #[test]
    fn test_resolve_super_too_deep_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path();
        std::fs::create_dir_all(p.join("src")).unwrap();
        std::fs::write(p.join("src/lib.rs"), "").unwrap();
        std::fs::write(p.join("Cargo.toml"), "[package]\nname = \"test-crate\"\nversion = \"0.1.0\"\n").unwrap();

        let tree = build_mod_tree("test_crate", &p.join("src/lib.rs"));
        let lib_file = p.join("src/lib.rs");
        assert!(resolve_super_path("super::Foo", &lib_file, &tree).is_none());
    }

    #[test]
    fn test_resolve_self_path() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path();
        std::fs::create_dir_all(p.join("src")).unwrap();
        std::fs::write(p.join("src/lib.rs"), "pub mod parser;\n").unwrap();
        std::fs::write(p.join("src/parser.rs"), "").unwrap();
        std::fs::write(p.join("Cargo.toml"), "[package]\nname = \"test-crate\"\nversion = \"0.1.0\"\n").unwrap();

        let tree = build_mod_tree("test_crate", &p.join("src/lib.rs"));
        let parser_file = p.join("src/parser.rs");
        let result = resolve_self_path("self::Foo", &parser_file, &tree);
        assert_eq!(result, Some("crate::parser::Foo".to_string()));
    }

    #[test]
    fn test_register_rust_imports_resolves_intra_crate() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path();
        std::fs::create_dir_all(p.join("src")).unwrap();
        std::fs::write(p.join("src/lib.rs"), "pub mod a;\npub mod b;\n").unwrap();
        std::fs::write(p.join("src/a.rs"), "pub fn helper() {}\n").unwrap();
        std::fs::write(p.join("src/b.rs"), "use crate::a::helper;\n").unwrap();
        std::fs::write(p.join("Cargo.toml"), "[package]\nname = \"proj\"\nversion = \"0.1.0\"\n").unwrap();

        let mut table = SymbolTable::new("proj");
        let mut file_module_qn = HashMap::new();
        file_module_qn.insert(p.join("src/lib.rs"), "proj".to_string());
        file_module_qn.insert(p.join("src/a.rs"), "proj.a".to_string());
        file_module_qn.insert(p.join("src/b.rs"), "proj.b".to_string());

        let mut file_uses = HashMap::new();
        file_uses.insert(
            p.join("src/b.rs"),
            vec![RustUseStatement { path: "crate::a::helper".to_string(), alias: None }],
        );

        let stats = register_rust_imports(&mut table, p, &file_module_qn, &file_uses);
        assert_eq!(stats.resolved, 1);
        assert_eq!(
            table.resolve("proj.b", "helper"),
            crate::resolver::Resolution::Found("proj.a.helper".to_string())
        );
    }
}
