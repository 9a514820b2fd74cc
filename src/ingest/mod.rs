//! Two-pass ingestion (spec.md §4.3): walk a project, parse every file once, build the
//! [`SymbolTable`] and the filesystem/definition/import/inheritance edges in pass 1, then
//! resolve retained call captures against the completed table in pass 2. A parse failure in
//! one file is recorded and does not stop the run; a resolver miss degrades to
//! `ExternalPackage`; a writer failure is the only thing that aborts ingestion (spec.md §4.3
//! "Failure policy").

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::Config;
use crate::error::Error;
use crate::graph::EdgeBatchRow;
use crate::graph::model::{EdgeType, NodeLabel, PropValue, Props};
use crate::graph::writer::GraphWriter;
use crate::parser::{self, CallCapture, DefinitionCapture, DefinitionKind, ImportCapture, ParseResult};
use crate::resolver::cargo_workspace::discover_rust_workspace_members;
use crate::resolver::rust_mod_tree::build_mod_tree;
use crate::resolver::rust_resolver::{self, RustUseStatement, dotted_qualified_name};
use crate::resolver::ts_resolver::{self, ResolutionOutcome};
use crate::resolver::workspace::discover_workspace_packages;
use crate::resolver::{Resolution, SymbolTable};
use crate::walker;

/// Everything an ingestion run reports back to its caller (spec.md §8: "re-ingest is
/// idempotent" — a second run over the same tree should produce the same counts).
#[derive(Debug, Default)]
pub struct IngestReport {
    pub project: String,
    pub files_discovered: usize,
    pub files_parsed: usize,
    pub parse_errors: Vec<(PathBuf, String)>,
    pub nodes_written: u64,
    pub edges_written: u64,
    /// Diagnostics surfaced from the symbol table (inheritance cycles) and from calls/imports
    /// that degraded to `ExternalPackage` instead of resolving locally.
    pub warnings: Vec<String>,
}

/// A file's structural extraction, kept only for the duration of one ingestion run.
struct FileUnit {
    path: PathBuf,
    module_qn: String,
    parsed: ParseResult,
}

/// Run both passes over `project_root` against `writer`, scoping every node under `project`.
pub async fn run(
    config: &Config,
    project: &str,
    project_root: &Path,
    writer: &mut GraphWriter,
) -> Result<IngestReport, Error> {
    crate::config::validate_project_name(project)?;

    let mut report = IngestReport { project: project.to_string(), ..Default::default() };

    let files = walker::walk_project(project_root, config, false, None)
        .map_err(|e| Error::new(crate::error::ErrorCode::InternalError, e.to_string()))?;
    report.files_discovered = files.len();

    writer
        .upsert_node(
            NodeLabel::Project,
            Props::from([("name".to_string(), PropValue::from(project.to_string()))]),
        )
        .await?;

    emit_filesystem_structure(project, project_root, &files, writer).await?;

    let registry = parser::default_registry();
    let rust_module_qn = rust_module_qn_map(project, project_root);

    let parsed: Vec<(PathBuf, Result<ParseResult, String>)> = files
        .par_iter()
        .map(|path| {
            let source = match std::fs::read(path) {
                Ok(s) => s,
                Err(err) => return (path.clone(), Err(err.to_string())),
            };
            match registry.parse_file(path, &source) {
                Ok(result) => (path.clone(), Ok(result)),
                Err(err) => (path.clone(), Err(err.to_string())),
            }
        })
        .collect();

    let mut units = Vec::new();
    for (path, outcome) in parsed {
        match outcome {
            Ok(parsed) => {
                let module_qn = rust_module_qn
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| module_qn_from_relpath(project, project_root, &path));
                units.push(FileUnit { path, module_qn, parsed });
            }
            Err(message) => report.parse_errors.push((path, message)),
        }
    }
    report.files_parsed = units.len();

    let mut table = SymbolTable::new(project);

    // Sub-pass 1a: register every module/class/function/method so pass 1b's import and
    // inheritance resolution sees the complete symbol set (spec.md §4.3: imports "are resolved
    // at end of pass 1 against the completed module set").
    let mut class_bases: HashMap<String, Vec<String>> = HashMap::new();
    let mut rust_uses: HashMap<PathBuf, Vec<RustUseStatement>> = HashMap::new();
    let mut other_imports: Vec<(PathBuf, String, ImportCapture)> = Vec::new();

    for unit in &units {
        table.register_module(&unit.module_qn);
        writer
            .upsert_node(NodeLabel::Module, module_props(project, unit))
            .await?;
        emit_containment_from_parent(project, project_root, &unit.path, NodeLabel::Module, &unit.module_qn, writer)
            .await?;

        register_definitions(&mut table, &unit.module_qn, &unit.parsed.definitions, writer).await?;

        for inh in &unit.parsed.inheritance {
            let class_qn = format!("{}.{}", unit.module_qn, inh.class_name);
            class_bases.entry(class_qn).or_default().push(inh.base_name.clone());
        }

        match unit.parsed.language {
            crate::language::LanguageKind::Rust => {
                let statements = unit
                    .parsed
                    .imports
                    .iter()
                    .map(|cap| RustUseStatement {
                        path: if cap.wildcard { format!("{}::*", cap.path) } else { cap.path.clone() },
                        alias: cap.alias.clone(),
                    })
                    .collect();
                rust_uses.insert(unit.path.clone(), statements);
            }
            _ => {
                for cap in &unit.parsed.imports {
                    other_imports.push((unit.path.clone(), unit.module_qn.clone(), cap.clone()));
                }
            }
        }
    }

    for (class_qn, bases) in &class_bases {
        table.register_class(class_qn, bases.clone());
    }

    // Sub-pass 1b: resolve imports and inheritance now that every module/class is known.
    let rust_stats = rust_resolver::register_rust_imports(&mut table, project_root, &rust_module_qn, &rust_uses);
    report.warnings.push(format!(
        "rust imports: {} resolved, {} external, {} builtin, {} unresolved",
        rust_stats.resolved, rust_stats.external, rust_stats.builtin, rust_stats.unresolved
    ));

    let ts_resolver_handle = ts_resolver::build_resolver(HashMap::new());
    for (file, module_qn, capture) in &other_imports {
        resolve_non_rust_import(
            project,
            project_root,
            file,
            module_qn,
            capture,
            &ts_resolver_handle,
            &rust_module_qn,
            &mut table,
            writer,
        )
        .await?;
    }

    for (class_qn, bases) in &class_bases {
        for base_name in bases {
            emit_inheritance_edge(&table, class_qn, base_name, writer).await?;
        }
    }

    // Pass 2: resolve every retained call capture against the completed table.
    for unit in &units {
        for call in &unit.parsed.calls {
            emit_call_edge(&mut table, project, &unit.module_qn, &unit.parsed.definitions, call, writer).await?;
        }
    }

    writer.flush().await?;
    report.warnings.extend(table.warnings());
    report.nodes_written = writer.nodes_written();
    report.edges_written = writer.edges_written();
    Ok(report)
}

fn module_props(project: &str, unit: &FileUnit) -> Props {
    let name = unit.module_qn.rsplit('.').next().unwrap_or(&unit.module_qn).to_string();
    Props::from([
        ("project".to_string(), PropValue::from(project.to_string())),
        ("qualified_name".to_string(), PropValue::from(unit.module_qn.clone())),
        ("name".to_string(), PropValue::from(name)),
        ("path".to_string(), PropValue::from(unit.path.display().to_string())),
    ])
}

async fn register_definitions(
    table: &mut SymbolTable,
    module_qn: &str,
    definitions: &[DefinitionCapture],
    writer: &mut GraphWriter,
) -> Result<(), Error> {
    let project = table.project().to_string();
    for def in definitions {
        match def.kind {
            DefinitionKind::Class | DefinitionKind::Interface => {
                let qn = format!("{module_qn}.{}", def.name);
                let label = if def.kind == DefinitionKind::Interface { NodeLabel::Interface } else { NodeLabel::Class };
                table.register_class(&qn, Vec::new());
                table.register_symbol(module_qn, &def.name, &qn, label);
                writer.upsert_node(label, entity_props(&project, &qn, &def.name)).await?;
                emit_edge(writer, &project, EdgeType::Defines, NodeLabel::Module, module_qn, label, &qn).await?;
                emit_edge(writer, &project, EdgeType::Exports, NodeLabel::Module, module_qn, label, &qn).await?;
            }
            DefinitionKind::Function => {
                let qn = format!("{module_qn}.{}", def.name);
                table.register_symbol(module_qn, &def.name, &qn, NodeLabel::Function);
                writer.upsert_node(NodeLabel::Function, entity_props(&project, &qn, &def.name)).await?;
                emit_edge(writer, &project, EdgeType::Defines, NodeLabel::Module, module_qn, NodeLabel::Function, &qn)
                    .await?;
                emit_edge(writer, &project, EdgeType::Exports, NodeLabel::Module, module_qn, NodeLabel::Function, &qn)
                    .await?;
            }
            DefinitionKind::Method => {
                let class_name = match &def.class_hint {
                    Some(hint) => Some(hint.clone()),
                    None => enclosing_class_name(definitions, def),
                };
                let Some(class_name) = class_name else { continue };
                let class_qn = format!("{module_qn}.{class_name}");
                let method_qn = format!("{class_qn}.{}", def.name);
                table.register_symbol(&class_qn, &def.name, &method_qn, NodeLabel::Method);
                writer.upsert_node(NodeLabel::Method, entity_props(&project, &method_qn, &def.name)).await?;
                emit_edge(
                    writer,
                    &project,
                    EdgeType::DefinesMethod,
                    NodeLabel::Class,
                    &class_qn,
                    NodeLabel::Method,
                    &method_qn,
                )
                .await?;
            }
        }
    }
    Ok(())
}

/// Find the smallest `Class`/`Interface` definition in the same file whose byte range contains
/// `method`'s — used for grammars where methods nest inside the class's own definition node
/// (TypeScript, Python). Rust relies on `class_hint` instead (impl blocks aren't class nodes).
fn enclosing_class_name(definitions: &[DefinitionCapture], method: &DefinitionCapture) -> Option<String> {
    definitions
        .iter()
        .filter(|d| matches!(d.kind, DefinitionKind::Class | DefinitionKind::Interface))
        .filter(|d| d.contains(method.start_byte))
        .min_by_key(|d| d.end_byte - d.start_byte)
        .map(|d| d.name.clone())
}

fn entity_props(project: &str, qn: &str, name: &str) -> Props {
    Props::from([
        ("project".to_string(), PropValue::from(project.to_string())),
        ("qualified_name".to_string(), PropValue::from(qn.to_string())),
        ("name".to_string(), PropValue::from(name.to_string())),
    ])
}

async fn emit_edge(
    writer: &mut GraphWriter,
    project: &str,
    edge_type: EdgeType,
    from_label: NodeLabel,
    from_qn: &str,
    to_label: NodeLabel,
    to_qn: &str,
) -> Result<(), Error> {
    writer
        .upsert_edge(
            edge_type,
            EdgeBatchRow {
                project: project.to_string(),
                from_label,
                from_qn: from_qn.to_string(),
                to_label,
                to_qn: to_qn.to_string(),
                properties: Props::new(),
            },
        )
        .await
}

async fn emit_inheritance_edge(
    table: &SymbolTable,
    class_qn: &str,
    base_name: &str,
    writer: &mut GraphWriter,
) -> Result<(), Error> {
    let resolved = match table.resolve(class_qn, base_name) {
        Resolution::Found(qn) | Resolution::External(qn) => qn,
        Resolution::Unresolved => return Ok(()),
    };
    let edge_type = if table.label_of(&resolved) == Some(NodeLabel::Interface) {
        EdgeType::Implements
    } else {
        EdgeType::Inherits
    };
    let to_label = table.label_of(&resolved).unwrap_or(NodeLabel::Class);
    emit_edge(writer, table.project(), edge_type, NodeLabel::Class, class_qn, to_label, &resolved).await
}

#[allow(clippy::too_many_arguments)]
async fn resolve_non_rust_import(
    project: &str,
    project_root: &Path,
    file: &Path,
    module_qn: &str,
    capture: &ImportCapture,
    ts_resolver_handle: &oxc_resolver::Resolver,
    _rust_module_qn: &HashMap<PathBuf, String>,
    table: &mut SymbolTable,
    writer: &mut GraphWriter,
) -> Result<(), Error> {
    let local_name =
        capture.alias.clone().unwrap_or_else(|| capture.path.rsplit(['.', '/']).next().unwrap_or(&capture.path).to_string());

    let is_python = file.extension().and_then(|e| e.to_str()) == Some("py");
    let (target_qn, is_external) = if is_python {
        resolve_python_import(project, &capture.path, table)
    } else {
        match ts_resolver::resolve_import(ts_resolver_handle, project_root, file, &capture.path) {
            ResolutionOutcome::Resolved(resolved_path) => {
                let target = module_qn_from_relpath(project, project_root, &resolved_path);
                (target, false)
            }
            ResolutionOutcome::Builtin(_) => return Ok(()),
            ResolutionOutcome::Unresolved(specifier) => {
                let package_name = ts_resolver::extract_package_name(&specifier).unwrap_or(specifier);
                (table.register_external_package(&package_name), true)
            }
        }
    };

    if capture.wildcard {
        table.register_wildcard_import(module_qn, &target_qn);
    } else {
        table.register_import_alias(module_qn, &local_name, &target_qn);
    }

    if is_external {
        writer
            .upsert_node(
                NodeLabel::ExternalPackage,
                entity_props(project, &target_qn, target_qn.rsplit('.').next().unwrap_or(&target_qn)),
            )
            .await?;
    }
    emit_edge(
        writer,
        project,
        EdgeType::Imports,
        NodeLabel::Module,
        module_qn,
        if is_external { NodeLabel::ExternalPackage } else { NodeLabel::Module },
        &target_qn,
    )
    .await
}

/// Python import paths are already dotted (`"pkg.sub.mod"`); a project laid out with packages at
/// its root maps `"pkg.sub.mod"` directly onto `"{project}.pkg.sub.mod"`. Falls back to treating
/// the first segment as an external package when that candidate isn't a module we registered.
fn resolve_python_import(project: &str, path: &str, table: &mut SymbolTable) -> (String, bool) {
    let candidate = format!("{project}.{path}");
    if table.is_known(&candidate) {
        return (candidate, false);
    }
    let first_segment = path.split('.').next().unwrap_or(path);
    let qn = table.register_external_package(first_segment);
    let rest = &path[first_segment.len()..];
    (format!("{qn}{rest}"), true)
}

async fn emit_call_edge(
    table: &mut SymbolTable,
    project: &str,
    module_qn: &str,
    definitions: &[DefinitionCapture],
    call: &CallCapture,
    writer: &mut GraphWriter,
) -> Result<(), Error> {
    let Some(caller) = definitions
        .iter()
        .filter(|d| matches!(d.kind, DefinitionKind::Function | DefinitionKind::Method))
        .filter(|d| d.contains(call.start_byte))
        .min_by_key(|d| d.end_byte - d.start_byte)
    else {
        return Ok(());
    };
    let caller_qn = match &caller.class_hint {
        Some(hint) => format!("{module_qn}.{hint}.{}", caller.name),
        None => match enclosing_class_name(definitions, caller) {
            Some(class) => format!("{module_qn}.{class}.{}", caller.name),
            None => format!("{module_qn}.{}", caller.name),
        },
    };

    let callee_name = call.callee.trim_start_matches("self.").trim_start_matches("this.");

    let (callee_qn, newly_external) = match table.resolve(&caller_qn, callee_name) {
        Resolution::Found(qn) => (qn, false),
        Resolution::External(qn) => (qn, false),
        Resolution::Unresolved => {
            let mut parts = callee_name.splitn(2, '.');
            let head = parts.next().unwrap_or(callee_name);
            let rest = parts.next().map(|r| format!(".{r}")).unwrap_or_default();
            let base = table.register_external_package(head);
            (format!("{base}{rest}"), true)
        }
    };

    let already_known = table.label_of(&callee_qn);
    let to_label = already_known.unwrap_or(NodeLabel::Function);

    if newly_external || already_known.is_none() {
        writer
            .upsert_node(
                to_label,
                entity_props(project, &callee_qn, callee_qn.rsplit('.').next().unwrap_or(&callee_qn)),
            )
            .await?;
    }

    // A call inside a method body is a `Method` node, not a `Function` one (spec.md §4.3
    // `(Function|Method)-[:CALLS]->`) — `caller` is already filtered to Function|Method above.
    let caller_label = match caller.kind {
        DefinitionKind::Method => NodeLabel::Method,
        _ => NodeLabel::Function,
    };

    emit_edge(writer, project, EdgeType::Calls, caller_label, &caller_qn, to_label, &callee_qn).await
}

fn rust_module_qn_map(project: &str, project_root: &Path) -> HashMap<PathBuf, String> {
    let mut map = HashMap::new();
    for (crate_name, crate_root) in discover_rust_workspace_members(project_root) {
        let tree = build_mod_tree(&crate_name, &crate_root);
        for (mod_path, file) in &tree.mod_map {
            map.insert(file.clone(), dotted_qualified_name(project, mod_path));
        }
    }
    map
}

/// Fallback module naming for non-Rust files: the project-relative path, dotted, with the
/// extension and a trailing `index`/`__init__` stem dropped (both name the enclosing directory's
/// own module, not a child of it).
fn module_qn_from_relpath(project: &str, root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    let mut segments: Vec<String> = rel
        .with_extension("")
        .components()
        .filter_map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect();
    if matches!(segments.last().map(String::as_str), Some("index") | Some("__init__")) {
        segments.pop();
    }
    if segments.is_empty() {
        project.to_string()
    } else {
        format!("{project}.{}", segments.join("."))
    }
}

fn relpath_str(root: &Path, file: &Path) -> String {
    file.strip_prefix(root).unwrap_or(file).to_string_lossy().replace('\\', "/")
}

/// Upsert `File`/`Folder` nodes for every discovered file and the directory chain above it, plus
/// one `Package` node per detected workspace member (spec.md §3: `Package / Folder / File` are
/// filesystem structure; `(Project|Package|Folder)-[:CONTAINS]->(*)`).
async fn emit_filesystem_structure(
    project: &str,
    project_root: &Path,
    files: &[PathBuf],
    writer: &mut GraphWriter,
) -> Result<(), Error> {
    let mut folders: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    for file in files {
        let rel = relpath_str(project_root, file);
        let mut current = String::new();
        for segment in rel.split('/').rev().skip(1).collect::<Vec<_>>().into_iter().rev() {
            current = if current.is_empty() { segment.to_string() } else { format!("{current}/{segment}") };
            folders.insert(current.clone());
        }
    }

    for folder in &folders {
        let name = folder.rsplit('/').next().unwrap_or(folder);
        writer.upsert_node(NodeLabel::Folder, entity_props(project, folder, name)).await?;
        let parent = folder.rsplit_once('/').map(|(p, _)| p.to_string());
        match parent {
            Some(parent) if folders.contains(&parent) => {
                emit_edge(writer, project, EdgeType::Contains, NodeLabel::Folder, &parent, NodeLabel::Folder, folder).await?;
            }
            _ => {
                writer
                    .upsert_edge(
                        EdgeType::Contains,
                        EdgeBatchRow {
                            project: project.to_string(),
                            from_label: NodeLabel::Project,
                            from_qn: project.to_string(),
                            to_label: NodeLabel::Folder,
                            to_qn: folder.clone(),
                            properties: Props::new(),
                        },
                    )
                    .await?;
            }
        }
    }

    for file in files {
        let rel = relpath_str(project_root, file);
        let name = rel.rsplit('/').next().unwrap_or(&rel).to_string();
        let extension = file.extension().and_then(|e| e.to_str()).unwrap_or("").to_string();
        let mut props = entity_props(project, &rel, &name);
        props.insert("extension".to_string(), PropValue::from(extension));
        writer.upsert_node(NodeLabel::File, props).await?;
        emit_containment_from_parent(project, project_root, file, NodeLabel::File, &rel, writer).await?;
    }

    emit_package_nodes(project, project_root, &folders, writer).await?;
    Ok(())
}

async fn emit_containment_from_parent(
    project: &str,
    project_root: &Path,
    file: &Path,
    child_label: NodeLabel,
    child_qn: &str,
    writer: &mut GraphWriter,
) -> Result<(), Error> {
    let rel = relpath_str(project_root, file);
    match rel.rsplit_once('/') {
        Some((parent, _)) => {
            emit_edge(writer, project, EdgeType::Contains, NodeLabel::Folder, parent, child_label, child_qn).await
        }
        None => {
            writer
                .upsert_edge(
                    EdgeType::Contains,
                    EdgeBatchRow {
                        project: project.to_string(),
                        from_label: NodeLabel::Project,
                        from_qn: project.to_string(),
                        to_label: child_label,
                        to_qn: child_qn.to_string(),
                        properties: Props::new(),
                    },
                )
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fake_store::FakeGraphStore;

    async fn writer_over(dir: &Path) -> (GraphWriter, Config) {
        let config = Config::default();
        let store = FakeGraphStore::new();
        let writer = GraphWriter::connect(Box::new(store), config.graph.batch_size).await.unwrap();
        (writer, config)
    }

    #[tokio::test]
    async fn ingests_python_module_with_class_and_call() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(
            root.join("app.py"),
            "class Greeter:\n    def greet(self):\n        return helper()\n\n\ndef helper():\n    return 'hi'\n",
        )
        .unwrap();

        let (mut writer, config) = writer_over(root).await;
        let report = run(&config, "demo", root, &mut writer).await.unwrap();

        assert_eq!(report.files_parsed, 1);
        assert!(report.parse_errors.is_empty());
        assert!(report.nodes_written > 0);
        assert!(report.edges_written > 0);
    }

    #[tokio::test]
    async fn ingests_rust_crate_with_impl_method_and_trait() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("Cargo.toml"), "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n").unwrap();
        std::fs::write(
            root.join("src/lib.rs"),
            "pub trait Speak {\n    fn say(&self);\n}\n\npub struct Dog;\n\nimpl Speak for Dog {\n    fn say(&self) {\n        bark();\n    }\n}\n\nfn bark() {}\n",
        )
        .unwrap();

        let (mut writer, config) = writer_over(root).await;
        let report = run(&config, "demo", root, &mut writer).await.unwrap();

        assert_eq!(report.files_parsed, 1);
        assert!(report.nodes_written > 0);
        assert!(report.edges_written > 0);

        // `Dog::say` calls `bark()` from inside a method body: the CALLS edge's caller
        // endpoint is a Method node, not a Function one, and must round-trip through the
        // writer as such (a caller-label mismatch silently drops the edge as "missing").
        let mut params = Props::new();
        params.insert("__tool".to_string(), PropValue::Str("callers".to_string()));
        params.insert("project".to_string(), PropValue::Str("demo".to_string()));
        params.insert("start".to_string(), PropValue::Str("demo.bark".to_string()));
        params.insert("max_depth".to_string(), PropValue::Int(1));
        let rows = writer.read("", params).await.unwrap();
        assert!(
            rows.iter().any(|r| r.get("qualified_name").and_then(|v| v.as_str()) == Some("demo.Dog.say")),
            "expected demo.Dog.say to show up as a caller of demo.bark, got {rows:?}"
        );
    }

    #[tokio::test]
    async fn a_missing_file_is_recorded_as_a_parse_error_not_a_fatal_run() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(root.join("good.py"), "def ok():\n    pass\n").unwrap();
        let ghost = root.join("ghost.py");
        std::fs::write(&ghost, "def gone():\n    pass\n").unwrap();

        // walk_project sees `ghost.py` on disk, but it's deleted before the parse stage reads
        // it — a benign race `run` must survive (spec.md §4.3 "parse failure ... is non-fatal").
        let config = Config::default();
        let files = walker::walk_project(root, &config, false, None).unwrap();
        assert_eq!(files.len(), 2);
        std::fs::remove_file(&ghost).unwrap();

        let (mut writer, config) = writer_over(root).await;
        let report = run(&config, "demo", root, &mut writer).await.unwrap();

        assert_eq!(report.files_discovered, 2);
        assert_eq!(report.files_parsed, 1);
        assert_eq!(report.parse_errors.len(), 1);
        assert_eq!(report.parse_errors[0].0, ghost);
    }

    #[test]
    fn module_qn_from_relpath_drops_index_stem() {
        let root = Path::new("/proj");
        let qn = module_qn_from_relpath("demo", root, Path::new("/proj/src/index.ts"));
        assert_eq!(qn, "demo.src");
    }

    #[test]
    fn module_qn_from_relpath_keeps_ordinary_stem() {
        let root = Path::new("/proj");
        let qn = module_qn_from_relpath("demo", root, Path::new("/proj/src/widgets.ts"));
        assert_eq!(qn, "demo.src.widgets");
    }
}

async fn emit_package_nodes(
    project: &str,
    project_root: &Path,
    folders: &std::collections::BTreeSet<String>,
    writer: &mut GraphWriter,
) -> Result<(), Error> {
    let mut package_dirs: Vec<(String, PathBuf)> = Vec::new();

    for (crate_name, crate_root) in discover_rust_workspace_members(project_root) {
        if let Some(src_dir) = crate_root.parent()
            && let Some(crate_dir) = src_dir.parent()
            && crate_dir != project_root
        {
            package_dirs.push((crate_name, crate_dir.to_path_buf()));
        }
    }
    for (pkg_name, pkg_dir) in discover_workspace_packages(project_root) {
        let root_dir = if pkg_dir.file_name().and_then(|n| n.to_str()) == Some("src") {
            pkg_dir.parent().map(Path::to_path_buf).unwrap_or(pkg_dir)
        } else {
            pkg_dir
        };
        if root_dir != project_root {
            package_dirs.push((pkg_name, root_dir));
        }
    }

    for (pkg_name, pkg_dir) in package_dirs {
        writer.upsert_node(NodeLabel::Package, entity_props(project, &pkg_name, &pkg_name)).await?;
        writer
            .upsert_edge(
                EdgeType::Contains,
                EdgeBatchRow {
                    project: project.to_string(),
                    from_label: NodeLabel::Project,
                    from_qn: project.to_string(),
                    to_label: NodeLabel::Package,
                    to_qn: pkg_name.clone(),
                    properties: Props::new(),
                },
            )
            .await?;
        let rel_dir = relpath_str(project_root, &pkg_dir);
        if folders.contains(&rel_dir) {
            emit_edge(writer, project, EdgeType::Contains, NodeLabel::Package, &pkg_name, NodeLabel::Folder, &rel_dir)
                .await?;
        }
    }
    Ok(())
}
