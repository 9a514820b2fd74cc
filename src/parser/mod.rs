//! Multi-language parsing (spec.md §4.1). [`ParserRegistry`] maps a file extension to a
//! [`registry::LanguageSpec`] and runs its four capture queries in a single tree-sitter parse,
//! producing a [`ParseResult`] the ingester's two passes consume — definitions and imports
//! during pass 1, retained call captures during pass 2 (spec.md §4.3). The parse tree itself is
//! never retained past [`ParserRegistry::parse_file`] returning, to keep ingestion memory bounded
//! on large repositories.

pub mod queries;
pub mod registry;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Language, Parser, Query, QueryCursor, StreamingIterator};

use crate::language::LanguageKind;
use registry::LanguageSpec;

/// What kind of definition a `@definition.*` capture produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Class,
    Interface,
    Function,
    Method,
}

#[derive(Debug, Clone)]
pub struct DefinitionCapture {
    pub kind: DefinitionKind,
    pub name: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub end_line: usize,
    /// The enclosing type's name for a `Method`, when the grammar doesn't nest the method
    /// inside a byte range the definitions query already captured as a class (Rust: the
    /// method lives in an `impl Type { .. }` block, not inside `Type`'s own struct/enum
    /// definition). `None` for languages where enclosing-class lookup works by byte
    /// containment against another `DefinitionCapture` instead.
    pub class_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InheritanceCapture {
    pub class_name: String,
    pub base_name: String,
}

#[derive(Debug, Clone)]
pub struct ImportCapture {
    /// The imported path/module exactly as written (e.g. `"./sibling"`, `"crate::a::b"`,
    /// `"os.path"`).
    pub path: String,
    /// The local name bound by this import, if any (e.g. the `Z` in `import X as Z`).
    pub alias: Option<String>,
    /// True for glob/wildcard imports (`use x::*`, `from x import *`).
    pub wildcard: bool,
}

#[derive(Debug, Clone)]
pub struct CallCapture {
    /// The callee text as written at the call site — may be a bare name or a
    /// `.`-qualified member access; resolution happens in pass 2 (spec.md §4.3).
    pub callee: String,
    pub start_byte: usize,
}

/// Everything extracted from a single source file in one tree-sitter parse.
pub struct ParseResult {
    pub language: LanguageKind,
    pub definitions: Vec<DefinitionCapture>,
    pub inheritance: Vec<InheritanceCapture>,
    pub imports: Vec<ImportCapture>,
    /// Retained for pass 2 (spec.md §4.3) — resolved against the completed `SymbolTable`
    /// without a second tree-sitter walk.
    pub calls: Vec<CallCapture>,
}

impl DefinitionCapture {
    /// Does this definition's byte range contain `byte_offset`? Used to find the enclosing
    /// function/method for a call site during pass 2.
    pub fn contains(&self, byte_offset: usize) -> bool {
        self.start_byte <= byte_offset && byte_offset < self.end_byte
    }
}

struct CompiledLanguage {
    spec: LanguageSpec,
    language: Language,
    definitions_query: Query,
    imports_query: Query,
    inheritance_query: Query,
    calls_query: Query,
}

/// Extension -> compiled grammar + queries. Built once via [`ParserRegistry::builtin`];
/// additional languages can be added at runtime with [`ParserRegistry::register`].
pub struct ParserRegistry {
    by_extension: HashMap<&'static str, Arc<CompiledLanguage>>,
}

impl ParserRegistry {
    pub fn builtin() -> Self {
        let mut registry = Self { by_extension: HashMap::new() };
        for spec in registry::builtin_specs() {
            registry.register(spec).expect("builtin language specs must compile");
        }
        registry
    }

    /// Register a new language, compiling its four capture queries against its grammar.
    /// Returns an error if the grammar or a query fails to build — the caller decides whether
    /// that's fatal (it is, for `builtin()`) or just means skipping this registration.
    pub fn register(&mut self, spec: LanguageSpec) -> Result<()> {
        let language = (spec.grammar)();
        let definitions_query = Query::new(&language, spec.definitions_query)
            .with_context(|| format!("compiling definitions query for {:?}", spec.kind))?;
        let imports_query = Query::new(&language, spec.imports_query)
            .with_context(|| format!("compiling imports query for {:?}", spec.kind))?;
        let inheritance_query = Query::new(&language, spec.inheritance_query)
            .with_context(|| format!("compiling inheritance query for {:?}", spec.kind))?;
        let calls_query = Query::new(&language, spec.calls_query)
            .with_context(|| format!("compiling calls query for {:?}", spec.kind))?;

        let compiled = Arc::new(CompiledLanguage {
            spec: spec.clone(),
            language,
            definitions_query,
            imports_query,
            inheritance_query,
            calls_query,
        });
        for ext in spec.extensions {
            self.by_extension.insert(ext, compiled.clone());
        }
        Ok(())
    }

    pub fn supports_extension(&self, ext: &str) -> bool {
        self.by_extension.contains_key(ext)
    }

    /// Parse `source` (the file at `path`, used only to pick the grammar by extension) and run
    /// all four capture queries in one pass. Unsupported extensions are the caller's
    /// responsibility to filter out first (spec.md §4.1 "unknown extensions are skipped").
    pub fn parse_file(&self, path: &Path, source: &[u8]) -> Result<ParseResult> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let compiled = self
            .by_extension
            .get(ext)
            .ok_or_else(|| anyhow!("unsupported file extension: {ext:?}"))?;

        let tree = with_thread_parser(ext, &compiled.language, |parser| parser.parse(source, None))
            .ok_or_else(|| anyhow!("tree-sitter returned None for {:?}", path))?;

        let root = tree.root_node();
        let mut cursor = QueryCursor::new();

        let definitions = extract_definitions(&compiled.definitions_query, &mut cursor, root, source);
        let inheritance = extract_inheritance(&compiled.inheritance_query, &mut cursor, root, source);
        let imports = extract_imports(&compiled.imports_query, &mut cursor, root, source);
        let calls = extract_calls(&compiled.calls_query, &mut cursor, root, source);

        Ok(ParseResult { language: compiled.spec.kind, definitions, inheritance, imports, calls })
    }
}

// One tree-sitter `Parser` per (thread, extension) — grammars aren't `Send`-shareable across a
// rayon pool without per-thread instances, matching the engine's existing thread-local pattern.
thread_local! {
    static PARSERS: RefCell<HashMap<&'static str, Parser>> = RefCell::new(HashMap::new());
}

fn with_thread_parser<T>(ext: &'static str, language: &Language, f: impl FnOnce(&mut Parser) -> T) -> T {
    PARSERS.with(|cell| {
        let mut map = cell.borrow_mut();
        let parser = map.entry(ext).or_insert_with(|| {
            let mut p = Parser::new();
            p.set_language(language).expect("grammar already compiled by ParserRegistry::register");
            p
        });
        f(parser)
    })
}

fn text<'a>(node: tree_sitter::Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn capture_name<'a>(query: &'a Query, index: u32) -> &'a str {
    query.capture_names()[index as usize]
}

fn extract_definitions(
    query: &Query,
    cursor: &mut QueryCursor,
    root: tree_sitter::Node,
    source: &[u8],
) -> Vec<DefinitionCapture> {
    let mut out = Vec::new();
    let mut matches = cursor.matches(query, root, source);
    while let Some(m) = matches.next() {
        let mut name = None;
        let mut def_node = None;
        let mut kind = None;
        let mut class_hint = None;
        for capture in m.captures {
            match capture_name(query, capture.index) {
                "name.class" => name = Some(text(capture.node, source).to_string()),
                "name.interface" => {
                    name = Some(text(capture.node, source).to_string());
                    kind = Some(DefinitionKind::Interface);
                }
                "name.function" => {
                    name = Some(text(capture.node, source).to_string());
                    kind = kind.or(Some(DefinitionKind::Function));
                }
                "name.method" => {
                    name = Some(text(capture.node, source).to_string());
                    kind = Some(DefinitionKind::Method);
                }
                "definition.class" => {
                    def_node = Some(capture.node);
                    kind = kind.or(Some(DefinitionKind::Class));
                }
                "definition.interface" => {
                    def_node = Some(capture.node);
                    kind = Some(DefinitionKind::Interface);
                }
                "definition.function" => {
                    def_node = Some(capture.node);
                    kind = kind.or(Some(DefinitionKind::Function));
                }
                "definition.method" => {
                    def_node = Some(capture.node);
                    kind = Some(DefinitionKind::Method);
                }
                "impl.type" => class_hint = Some(text(capture.node, source).to_string()),
                _ => {}
            }
        }
        if let (Some(name), Some(def_node), Some(kind)) = (name, def_node, kind) {
            out.push(DefinitionCapture {
                kind,
                name,
                start_byte: def_node.start_byte(),
                end_byte: def_node.end_byte(),
                start_line: def_node.start_position().row + 1,
                end_line: def_node.end_position().row + 1,
                class_hint: if kind == DefinitionKind::Method { class_hint } else { None },
            });
        }
    }
    out
}

fn extract_inheritance(
    query: &Query,
    cursor: &mut QueryCursor,
    root: tree_sitter::Node,
    source: &[u8],
) -> Vec<InheritanceCapture> {
    let mut out = Vec::new();
    let mut matches = cursor.matches(query, root, source);
    while let Some(m) = matches.next() {
        let mut class_name = None;
        let mut base_name = None;
        for capture in m.captures {
            match capture_name(query, capture.index) {
                "inheritance.class" => class_name = Some(text(capture.node, source).to_string()),
                "inheritance.base" => base_name = Some(text(capture.node, source).to_string()),
                _ => {}
            }
        }
        if let (Some(class_name), Some(base_name)) = (class_name, base_name) {
            out.push(InheritanceCapture { class_name, base_name });
        }
    }
    out
}

fn extract_imports(
    query: &Query,
    cursor: &mut QueryCursor,
    root: tree_sitter::Node,
    source: &[u8],
) -> Vec<ImportCapture> {
    let mut out = Vec::new();
    let mut matches = cursor.matches(query, root, source);
    while let Some(m) = matches.next() {
        let mut path = None;
        let mut alias = None;
        let mut wildcard = false;
        for capture in m.captures {
            match capture_name(query, capture.index) {
                "import.path" => path = Some(text(capture.node, source).to_string()),
                "import.prefix" => {
                    // scoped_use_list: prefix and path are joined below once both are known.
                }
                "import.alias" => alias = Some(text(capture.node, source).to_string()),
                "import.wildcard" => wildcard = true,
                _ => {}
            }
        }
        if let Some(path) = path {
            out.push(ImportCapture { path, alias, wildcard });
        }
    }
    out
}

fn extract_calls(query: &Query, cursor: &mut QueryCursor, root: tree_sitter::Node, source: &[u8]) -> Vec<CallCapture> {
    let mut out = Vec::new();
    let mut matches = cursor.matches(query, root, source);
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if capture_name(query, capture.index) == "call.callee" {
                out.push(CallCapture { callee: text(capture.node, source).to_string(), start_byte: capture.node.start_byte() });
            }
        }
    }
    out
}

static DEFAULT_REGISTRY: OnceLock<ParserRegistry> = OnceLock::new();

/// The process-wide default registry (the five builtin grammars). Ingestion uses this unless a
/// caller constructs its own `ParserRegistry` with additional registrations.
pub fn default_registry() -> &'static ParserRegistry {
    DEFAULT_REGISTRY.get_or_init(ParserRegistry::builtin)
}
