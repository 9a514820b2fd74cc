//! TypeScript/JavaScript import-specifier resolution.
//!
//! Combines [`workspace`]'s npm/yarn/pnpm monorepo package discovery with `oxc_resolver`, the
//! same module-resolution algorithm Node.js and bundlers use, to turn a relative or bare
//! specifier written in a `.ts`/`.tsx`/`.js`/`.jsx` file into either a file on disk, a Node.js
//! builtin, or an unresolved external package reference.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use oxc_resolver::{ResolveOptions, Resolver};

use crate::resolver::workspace::discover_workspace_packages;

const NODE_BUILTINS: &[&str] = &[
    "fs", "path", "os", "crypto", "http", "https", "net", "stream", "util", "events", "url",
    "assert", "buffer", "child_process", "cluster", "dgram", "dns", "domain", "module", "punycode",
    "querystring", "readline", "repl", "string_decoder", "tls", "tty", "vm", "zlib", "process",
];

/// Outcome of resolving a single import specifier from a given file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Resolved to a file on disk within the project (or a linked workspace package).
    Resolved(PathBuf),
    /// A Node.js builtin module (`"fs"`, `"path"`, ...).
    Builtin(String),
    /// Could not be resolved to a file; treated as an external package reference.
    Unresolved(String),
}

/// Build an `oxc_resolver::Resolver` configured for TS/JS source resolution: the extensions and
/// condition names a bundler would try, plus any path aliases (e.g. from `tsconfig.json`'s
/// `compilerOptions.paths` — collected by the caller since alias shape varies by build tool).
pub fn build_resolver(aliases: HashMap<String, Vec<String>>) -> Resolver {
    let alias = aliases
        .into_iter()
        .map(|(from, to)| (from, to.into_iter().map(oxc_resolver::AliasValue::from).collect()))
        .collect();

    Resolver::new(ResolveOptions {
        extensions: vec![
            ".ts".into(),
            ".tsx".into(),
            ".js".into(),
            ".jsx".into(),
            ".mjs".into(),
            ".cjs".into(),
            ".json".into(),
        ],
        condition_names: vec!["import".into(), "require".into(), "node".into(), "default".into()],
        main_fields: vec!["module".into(), "main".into()],
        alias,
        ..ResolveOptions::default()
    })
}

/// Resolve `specifier` as written in `from_file`. Workspace packages discovered under
/// `project_root` are tried before falling back to `oxc_resolver`'s own `node_modules` walk, so
/// a monorepo's internal packages resolve to their source files rather than (often absent)
/// built output.
pub fn resolve_import(
    resolver: &Resolver,
    project_root: &Path,
    from_file: &Path,
    specifier: &str,
) -> ResolutionOutcome {
    if is_node_builtin(specifier) {
        return ResolutionOutcome::Builtin(specifier.to_string());
    }

    if let Some(package_name) = extract_package_name(specifier)
        && !specifier.starts_with('.')
        && !specifier.starts_with('/')
    {
        let workspace_packages = discover_workspace_packages(project_root);
        if let Some(pkg_dir) = workspace_packages.get(&package_name) {
            let rest = specifier.strip_prefix(&package_name).unwrap_or("").trim_start_matches('/');
            let target = if rest.is_empty() { pkg_dir.join("index") } else { pkg_dir.join(rest) };
            if let Ok(resolution) = resolver.resolve(pkg_dir, &format!("./{}", target.strip_prefix(pkg_dir).unwrap_or(&target).display())) {
                return ResolutionOutcome::Resolved(resolution.full_path());
            }
        }
    }

    let directory = from_file.parent().unwrap_or(project_root);
    match resolver.resolve(directory, specifier) {
        Ok(resolution) => ResolutionOutcome::Resolved(resolution.full_path()),
        Err(_) => ResolutionOutcome::Unresolved(specifier.to_string()),
    }
}

fn is_node_builtin(specifier: &str) -> bool {
    let name = specifier.strip_prefix("node:").unwrap_or(specifier);
    NODE_BUILTINS.contains(&name)
}

/// Extract the package name from a bare specifier: `"lodash"` -> `"lodash"`,
/// `"lodash/fp"` -> `"lodash"`, `"@scope/pkg/sub"` -> `"@scope/pkg"`. `None` for relative or
/// absolute specifiers.
pub fn extract_package_name(specifier: &str) -> Option<String> {
    if specifier.starts_with('.') || specifier.starts_with('/') {
        return None;
    }
    let mut parts = specifier.splitn(3, '/');
    let first = parts.next()?;
    if let Some(scope) = first.strip_prefix('@') {
        let second = parts.next()?;
        return Some(format!("@{scope}/{second}"));
    }
    Some(first.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_specifiers_detected() {
        assert!(is_node_builtin("fs"));
        assert!(is_node_builtin("node:path"));
        assert!(!is_node_builtin("lodash"));
    }

    #[test]
    fn extract_plain_package_name() {
        assert_eq!(extract_package_name("lodash"), Some("lodash".to_string()));
        assert_eq!(extract_package_name("lodash/fp"), Some("lodash".to_string()));
    }

    #[test]
    fn extract_scoped_package_name() {
        assert_eq!(extract_package_name("@myorg/utils"), Some("@myorg/utils".to_string()));
        assert_eq!(extract_package_name("@myorg/utils/helpers"), Some("@myorg/utils".to_string()));
    }

    #[test]
    fn relative_specifiers_have_no_package_name() {
        assert_eq!(extract_package_name("./sibling"), None);
        assert_eq!(extract_package_name("../parent"), None);
    }

    #[test]
    fn resolve_relative_specifier_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path();
        std::fs::write(p.join("a.ts"), "export const x = 1;").unwrap();
        std::fs::write(p.join("b.ts"), "import { x } from './a';").unwrap();

        let resolver = build_resolver(HashMap::new());
        let outcome = resolve_import(&resolver, p, &p.join("b.ts"), "./a");
        assert_eq!(outcome, ResolutionOutcome::Resolved(p.join("a.ts")));
    }

    #[test]
    fn unresolvable_bare_specifier_falls_back_to_unresolved() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path();
        std::fs::write(p.join("b.ts"), "import x from 'totally-missing-package';").unwrap();

        let resolver = build_resolver(HashMap::new());
        let outcome = resolve_import(&resolver, p, &p.join("b.ts"), "totally-missing-package");
        assert_eq!(outcome, ResolutionOutcome::Unresolved("totally-missing-package".to_string()));
    }
}
