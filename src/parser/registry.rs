//! The static table of supported languages (spec.md §4.1): file extension -> grammar plus the
//! four named-capture queries (definitions, imports, inheritance, calls) a [`super::ParserRegistry`]
//! runs against that grammar's parse tree.

use tree_sitter::Language;

use crate::language::LanguageKind;

use super::queries;

/// Everything the ingester needs to parse one language: its tree-sitter grammar and the four
/// capture queries spec.md §4.1 requires. `register`ing a new language means constructing one
/// of these and handing it to [`super::ParserRegistry::register`] — no other code changes.
#[derive(Clone)]
pub struct LanguageSpec {
    pub kind: LanguageKind,
    pub extensions: &'static [&'static str],
    pub grammar: fn() -> Language,
    pub definitions_query: &'static str,
    pub imports_query: &'static str,
    pub inheritance_query: &'static str,
    pub calls_query: &'static str,
}

fn typescript_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx_language() -> Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

fn javascript_language() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn rust_language() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}

fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// The five grammars shipped out of the box. TypeScript and TSX are separate entries because
/// tree-sitter ships them as distinct grammars despite sharing a file family.
pub fn builtin_specs() -> Vec<LanguageSpec> {
    vec![
        LanguageSpec {
            kind: LanguageKind::TypeScript,
            extensions: &["ts"],
            grammar: typescript_language,
            definitions_query: queries::typescript::DEFINITIONS,
            imports_query: queries::typescript::IMPORTS,
            inheritance_query: queries::typescript::INHERITANCE,
            calls_query: queries::typescript::CALLS,
        },
        LanguageSpec {
            kind: LanguageKind::TypeScript,
            extensions: &["tsx"],
            grammar: tsx_language,
            definitions_query: queries::typescript::DEFINITIONS,
            imports_query: queries::typescript::IMPORTS,
            inheritance_query: queries::typescript::INHERITANCE,
            calls_query: queries::typescript::CALLS,
        },
        LanguageSpec {
            kind: LanguageKind::JavaScript,
            extensions: &["js", "jsx"],
            grammar: javascript_language,
            definitions_query: queries::typescript::DEFINITIONS,
            imports_query: queries::typescript::IMPORTS,
            inheritance_query: queries::typescript::INHERITANCE,
            calls_query: queries::typescript::CALLS,
        },
        LanguageSpec {
            kind: LanguageKind::Rust,
            extensions: &["rs"],
            grammar: rust_language,
            definitions_query: queries::rust::DEFINITIONS,
            imports_query: queries::rust::IMPORTS,
            inheritance_query: queries::rust::INHERITANCE,
            calls_query: queries::rust::CALLS,
        },
        LanguageSpec {
            kind: LanguageKind::Python,
            extensions: &["py"],
            grammar: python_language,
            definitions_query: queries::python::DEFINITIONS,
            imports_query: queries::python::IMPORTS,
            inheritance_query: queries::python::INHERITANCE,
            calls_query: queries::python::CALLS,
        },
    ]
}
