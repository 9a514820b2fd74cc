//! Capture queries for the Rust grammar.

pub const DEFINITIONS: &str = r#"
(struct_item name: (type_identifier) @name.class) @definition.class
(enum_item name: (type_identifier) @name.class) @definition.class
(trait_item name: (type_identifier) @name.interface) @definition.interface
(function_item name: (identifier) @name.function) @definition.function
(impl_item
  type: (type_identifier) @impl.type
  body: (declaration_list
    (function_item name: (identifier) @name.method) @definition.method))
"#;

pub const IMPORTS: &str = r#"
(use_declaration argument: (scoped_identifier) @import.path) @import.single
(use_declaration argument: (identifier) @import.path) @import.single
(use_declaration
  argument: (use_as_clause
    path: (_) @import.path
    alias: (identifier) @import.alias))
(use_declaration argument: (use_wildcard (_) @import.path)) @import.wildcard
(use_declaration
  argument: (scoped_use_list
    path: (_) @import.prefix
    list: (use_list (identifier) @import.path)))
"#;

pub const INHERITANCE: &str = r#"
(impl_item
  trait: (type_identifier) @inheritance.base
  type: (type_identifier) @inheritance.class)
(impl_item
  trait: (scoped_type_identifier name: (type_identifier) @inheritance.base)
  type: (type_identifier) @inheritance.class)
"#;

pub const CALLS: &str = r#"
(call_expression function: (identifier) @call.callee)
(call_expression function: (field_expression field: (field_identifier) @call.callee))
(call_expression
  function: (scoped_identifier name: (identifier) @call.callee))
"#;
