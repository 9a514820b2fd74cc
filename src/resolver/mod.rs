//! Symbol table and name resolution (spec.md §4.2).
//!
//! Language-specific passes (`rust_resolver`, `ts_resolver`) register modules, classes, and
//! import aliases as files are parsed; [`SymbolTable::resolve`] then answers "what does this
//! name refer to, from this scope" using the six-rule order spec.md §4.2 specifies. Keyed
//! entirely on dotted qualified names rather than graph-store identifiers, so the table has
//! no dependency on the store and can run as an ordinary in-process pass ahead of the writer.

pub mod cargo_workspace;
pub mod rust_mod_tree;
pub mod rust_resolver;
pub mod ts_resolver;
pub mod workspace;

use std::cell::RefCell;
use std::collections::HashMap;

use crate::graph::model::NodeLabel;

/// The outcome of [`SymbolTable::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Resolved to a symbol registered in this project.
    Found(String),
    /// No local definition matched; treated as a reference into an external package.
    External(String),
    /// Nothing matched at all (e.g. a genuinely undefined name — recorded, not fatal).
    Unresolved,
}

#[derive(Debug, Default, Clone)]
struct ModuleEntry {
    /// local name -> qualified name, for symbols defined directly in this module.
    members: HashMap<String, String>,
    /// qualified names of modules imported with `import *` / `from x import *`.
    wildcard_imports: Vec<String>,
}

#[derive(Debug, Default, Clone)]
struct ClassEntry {
    /// local name -> qualified name, for methods/fields defined directly on this class.
    members: HashMap<String, String>,
    /// base class names exactly as written in source (may be unqualified or aliased).
    bases: Vec<String>,
}

/// Per-project symbol table. One instance per ingestion run (spec.md §3: the graph, and
/// therefore name resolution, is scoped per project).
#[derive(Default)]
pub struct SymbolTable {
    /// module qualified_name -> its direct members and wildcard imports.
    modules: HashMap<String, ModuleEntry>,
    /// class qualified_name -> its direct members and declared bases.
    classes: HashMap<String, ClassEntry>,
    /// scope qualified_name (module or class) -> (alias, target) import aliases visible there.
    /// `target` is either a local qualified name or an `ExternalPackage` qualified name.
    import_aliases: HashMap<String, Vec<(String, String)>>,
    /// every qualified name this project has registered, with its label — used to confirm a
    /// `Found` resolution actually points at something real.
    known: HashMap<String, NodeLabel>,
    /// external package short name -> its `ExternalPackage` qualified name (project-scoped,
    /// SPEC_FULL.md §9: `"{project}.__external__.{package_name}"`).
    external_packages: HashMap<String, String>,
    mro_cache: RefCell<HashMap<String, Vec<String>>>,
    /// diagnostics collected while computing MROs — surfaced by `query::hierarchy` as warnings
    /// (spec.md §8 concrete scenario 3: a cycle in the inheritance graph).
    warnings: RefCell<Vec<String>>,
    project: String,
}

impl SymbolTable {
    pub fn new(project: impl Into<String>) -> Self {
        Self { project: project.into(), ..Default::default() }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn external_package_qn(&self, package_name: &str) -> String {
        format!("{}.__external__.{}", self.project, package_name)
    }

    /// Register a module so later lookups can find its members. Idempotent.
    pub fn register_module(&mut self, qualified_name: &str) {
        self.modules.entry(qualified_name.to_string()).or_default();
        self.known.insert(qualified_name.to_string(), NodeLabel::Module);
    }

    /// Register a symbol (function/class/etc.) as a direct member of `scope_qn` (a module or
    /// class qualified name), reachable under `local_name` from within that scope.
    pub fn register_symbol(
        &mut self,
        scope_qn: &str,
        local_name: &str,
        qualified_name: &str,
        label: NodeLabel,
    ) {
        self.known.insert(qualified_name.to_string(), label);
        if let Some(class) = self.classes.get_mut(scope_qn) {
            class.members.insert(local_name.to_string(), qualified_name.to_string());
            return;
        }
        self.modules
            .entry(scope_qn.to_string())
            .or_default()
            .members
            .insert(local_name.to_string(), qualified_name.to_string());
    }

    /// Register a class and its declared base names (as written — resolved lazily by `mro`).
    pub fn register_class(&mut self, qualified_name: &str, bases: Vec<String>) {
        self.known.insert(qualified_name.to_string(), NodeLabel::Class);
        self.classes.entry(qualified_name.to_string()).or_default().bases = bases;
    }

    /// Register an import: within `scope_qn`, the name `alias` refers to `target` (either a
    /// local qualified name or an `ExternalPackage` qualified name).
    pub fn register_import_alias(&mut self, scope_qn: &str, alias: &str, target: &str) {
        self.import_aliases.entry(scope_qn.to_string()).or_default().push((alias.to_string(), target.to_string()));
    }

    /// Register a wildcard import (`from x import *`, `export * from 'x'`): every member of
    /// `target_module_qn` becomes visible, unqualified, within `scope_qn`.
    pub fn register_wildcard_import(&mut self, scope_qn: &str, target_module_qn: &str) {
        self.modules.entry(scope_qn.to_string()).or_default().wildcard_imports.push(target_module_qn.to_string());
    }

    /// Register (or look up) the `ExternalPackage` qualified name for `package_name`, scoped to
    /// this project.
    pub fn register_external_package(&mut self, package_name: &str) -> String {
        if let Some(existing) = self.external_packages.get(package_name) {
            return existing.clone();
        }
        let qn = self.external_package_qn(package_name);
        self.external_packages.insert(package_name.to_string(), qn.clone());
        self.known.insert(qn.clone(), NodeLabel::ExternalPackage);
        qn
    }

    pub fn is_known(&self, qualified_name: &str) -> bool {
        self.known.contains_key(qualified_name)
    }

    /// The label a qualified name was registered under, if any — used to tell an `INHERITS`
    /// base from an `IMPLEMENTS` one (spec.md §3 edge patterns) once a base name resolves.
    pub fn label_of(&self, qualified_name: &str) -> Option<NodeLabel> {
        self.known.get(qualified_name).copied()
    }

    /// Warnings accumulated so far (cycle diagnostics from `mro`).
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    /// Resolve `name` as referenced from `scope_qn`, trying each rule in spec.md §4.2 order:
    /// local scope (own class members, if `scope_qn` is inside a class) → module scope →
    /// imports (longest dotted-prefix match) → inherited MRO → wildcard import union →
    /// `ExternalPackage` fallback.
    pub fn resolve(&self, scope_qn: &str, name: &str) -> Resolution {
        let module_qn = self.module_of(scope_qn);

        if let Some(class_qn) = self.class_of(scope_qn)
            && let Some(class) = self.classes.get(&class_qn)
            && let Some(qn) = class.members.get(name)
        {
            return Resolution::Found(qn.clone());
        }

        if let Some(module) = self.modules.get(&module_qn)
            && let Some(qn) = module.members.get(name)
        {
            return Resolution::Found(qn.clone());
        }

        if let Some(found) = self.resolve_via_imports(&module_qn, name) {
            return found;
        }

        if let Some(class_qn) = self.class_of(scope_qn) {
            for ancestor in self.mro(&class_qn) {
                if ancestor == class_qn {
                    continue;
                }
                if let Some(class) = self.classes.get(&ancestor)
                    && let Some(qn) = class.members.get(name)
                {
                    return Resolution::Found(qn.clone());
                }
            }
        }

        if let Some(module) = self.modules.get(&module_qn) {
            for wildcard_target in &module.wildcard_imports {
                if let Some(target_module) = self.modules.get(wildcard_target)
                    && let Some(qn) = target_module.members.get(name)
                {
                    return Resolution::Found(qn.clone());
                }
            }
        }

        if let Some(qn) = self.external_packages.get(name) {
            return Resolution::External(qn.clone());
        }

        Resolution::Unresolved
    }

    fn resolve_via_imports(&self, module_qn: &str, name: &str) -> Option<Resolution> {
        let aliases = self.import_aliases.get(module_qn)?;
        // Longest dotted-prefix match: prefer the most specific alias (e.g. `foo.bar` over `foo`).
        let mut best: Option<(&str, &str)> = None;
        for (alias, target) in aliases {
            let matches_exact = alias == name;
            let matches_prefix = name.starts_with(&format!("{alias}."));
            if !matches_exact && !matches_prefix {
                continue;
            }
            if best.is_none_or(|(best_alias, _)| alias.len() > best_alias.len()) {
                best = Some((alias, target));
            }
        }
        let (alias, target) = best?;
        let resolved = if alias == name {
            target.to_string()
        } else {
            format!("{}{}", target, &name[alias.len()..])
        };
        if self.known.get(&resolved) == Some(&NodeLabel::ExternalPackage) {
            Some(Resolution::External(resolved))
        } else {
            Some(Resolution::Found(resolved))
        }
    }

    /// The module a scope belongs to: scopes are qualified names, modules are their longest
    /// registered prefix.
    fn module_of(&self, scope_qn: &str) -> String {
        let mut candidate = scope_qn;
        loop {
            if self.modules.contains_key(candidate) {
                return candidate.to_string();
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return scope_qn.to_string(),
            }
        }
    }

    /// The class a scope belongs to, if any registered class is a prefix of `scope_qn`.
    fn class_of(&self, scope_qn: &str) -> Option<String> {
        let mut candidate = scope_qn;
        loop {
            if self.classes.contains_key(candidate) {
                return Some(candidate.to_string());
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return None,
            }
        }
    }

    /// Method resolution order for `class_qn`: the class itself followed by its ancestors in
    /// depth-first declared-base order, memoized and cycle-guarded (spec.md §4.2 / §8 scenario
    /// 3 — a cycle degrades to returning the visited prefix and recording a warning, never an
    /// infinite loop).
    pub fn mro(&self, class_qn: &str) -> Vec<String> {
        if let Some(cached) = self.mro_cache.borrow().get(class_qn) {
            return cached.clone();
        }
        let mut visited = Vec::new();
        let mut seen = std::collections::HashSet::new();
        self.mro_visit(class_qn, &mut visited, &mut seen);
        self.mro_cache.borrow_mut().insert(class_qn.to_string(), visited.clone());
        visited
    }

    fn mro_visit(&self, class_qn: &str, visited: &mut Vec<String>, seen: &mut std::collections::HashSet<String>) {
        if !seen.insert(class_qn.to_string()) {
            self.warnings.borrow_mut().push(format!(
                "inheritance cycle detected: '{class_qn}' revisits an ancestor already in its MRO"
            ));
            return;
        }
        visited.push(class_qn.to_string());
        let Some(class) = self.classes.get(class_qn) else { return };
        for base in &class.bases {
            let base_qn = self.resolve_base_name(class_qn, base);
            self.mro_visit(&base_qn, visited, seen);
        }
    }

    /// Resolve a declared base class name the same way any other name reference would be
    /// resolved from within the class's own module scope.
    fn resolve_base_name(&self, class_qn: &str, base_name: &str) -> String {
        match self.resolve(class_qn, base_name) {
            Resolution::Found(qn) | Resolution::External(qn) => qn,
            Resolution::Unresolved => base_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> SymbolTable {
        let mut t = SymbolTable::new("proj");
        t.register_module("proj.mod_a");
        t.register_symbol("proj.mod_a", "helper", "proj.mod_a.helper", NodeLabel::Function);
        t
    }

    #[test]
    fn resolves_module_scope_member() {
        let t = setup();
        assert_eq!(t.resolve("proj.mod_a", "helper"), Resolution::Found("proj.mod_a.helper".into()));
    }

    #[test]
    fn resolves_via_import_alias_exact() {
        let mut t = setup();
        t.register_module("proj.mod_b");
        t.register_import_alias("proj.mod_b", "helper", "proj.mod_a.helper");
        assert_eq!(t.resolve("proj.mod_b", "helper"), Resolution::Found("proj.mod_a.helper".into()));
    }

    #[test]
    fn resolves_via_import_longest_prefix() {
        let mut t = setup();
        t.register_module("proj.mod_b");
        t.register_import_alias("proj.mod_b", "mod_a", "proj.mod_a");
        assert_eq!(t.resolve("proj.mod_b", "mod_a.helper"), Resolution::Found("proj.mod_a.helper".into()));
    }

    #[test]
    fn falls_back_to_external_package() {
        let mut t = setup();
        t.register_external_package("requests");
        assert_eq!(t.resolve("proj.mod_a", "requests"), Resolution::External("proj.__external__.requests".into()));
    }

    #[test]
    fn unresolved_when_nothing_matches() {
        let t = setup();
        assert_eq!(t.resolve("proj.mod_a", "does_not_exist"), Resolution::Unresolved);
    }

    #[test]
    fn mro_resolves_inherited_member_through_base() {
        let mut t = setup();
        t.register_class("proj.mod_a.Base", vec![]);
        t.register_symbol("proj.mod_a.Base", "greet", "proj.mod_a.Base.greet", NodeLabel::Method);
        t.register_class("proj.mod_a.Child", vec!["Base".to_string()]);
        assert_eq!(t.resolve("proj.mod_a.Child", "greet"), Resolution::Found("proj.mod_a.Base.greet".into()));
    }

    #[test]
    fn mro_cycle_terminates_and_warns() {
        let mut t = SymbolTable::new("proj");
        t.register_module("proj.m");
        t.register_class("proj.m.A", vec!["B".to_string()]);
        t.register_class("proj.m.B", vec!["A".to_string()]);
        let mro = t.mro("proj.m.A");
        assert_eq!(mro, vec!["proj.m.A".to_string(), "proj.m.B".to_string()]);
        assert!(!t.warnings().is_empty());
    }
}
