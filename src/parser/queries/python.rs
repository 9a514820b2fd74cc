//! Capture queries for the Python grammar.

pub const DEFINITIONS: &str = r#"
(class_definition name: (identifier) @name.class) @definition.class
(function_definition name: (identifier) @name.function) @definition.function
"#;

pub const IMPORTS: &str = r#"
(import_statement name: (dotted_name) @import.path) @import.single
(import_statement
  name: (aliased_import
    name: (dotted_name) @import.path
    alias: (identifier) @import.alias))
(import_from_statement
  module_name: (dotted_name) @import.path
  name: (dotted_name) @import.alias)
(import_from_statement
  module_name: (dotted_name) @import.path
  name: (aliased_import
    name: (dotted_name)
    alias: (identifier) @import.alias))
(import_from_statement
  module_name: (dotted_name) @import.path
  (wildcard_import)) @import.wildcard
"#;

pub const INHERITANCE: &str = r#"
(class_definition
  name: (identifier) @inheritance.class
  superclasses: (argument_list (identifier) @inheritance.base))
(class_definition
  name: (identifier) @inheritance.class
  superclasses: (argument_list (attribute attribute: (identifier) @inheritance.base)))
"#;

pub const CALLS: &str = r#"
(call function: (identifier) @call.callee)
(call function: (attribute attribute: (identifier) @call.callee))
"#;
