//! Capture queries shared by TypeScript, TSX, and JavaScript (their grammars agree on the
//! node kinds these patterns touch).

pub const DEFINITIONS: &str = r#"
(class_declaration name: (type_identifier) @name.class) @definition.class
(class_declaration name: (identifier) @name.class) @definition.class
(interface_declaration name: (type_identifier) @name.interface) @definition.interface
(function_declaration name: (identifier) @name.function) @definition.function
(method_definition name: (property_identifier) @name.method) @definition.method
(lexical_declaration
  (variable_declarator
    name: (identifier) @name.function
    value: [(arrow_function) (function_expression)])) @definition.function
"#;

pub const IMPORTS: &str = r#"
(import_statement
  source: (string (string_fragment) @import.path)
  (import_clause (identifier) @import.alias))
(import_statement
  source: (string (string_fragment) @import.path)
  (import_clause (named_imports (import_specifier name: (identifier) @import.alias))))
(import_statement
  source: (string (string_fragment) @import.path)
  (import_clause (namespace_import (identifier) @import.alias)))
(import_statement
  source: (string (string_fragment) @import.path)) @import.wildcard
(call_expression
  function: (import)
  arguments: (arguments (string (string_fragment) @import.path))) @import.dynamic
"#;

pub const INHERITANCE: &str = r#"
(class_declaration
  name: (_) @inheritance.class
  (class_heritage (extends_clause value: (identifier) @inheritance.base)))
(class_declaration
  name: (_) @inheritance.class
  (class_heritage (implements_clause (type_identifier) @inheritance.base)))
(interface_declaration
  name: (_) @inheritance.class
  (extends_type_clause (type_identifier) @inheritance.base))
"#;

pub const CALLS: &str = r#"
(call_expression function: (identifier) @call.callee)
(call_expression function: (member_expression property: (property_identifier) @call.callee))
(new_expression constructor: (identifier) @call.callee)
"#;
