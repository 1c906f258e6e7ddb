//! Tests for the declaration parser

use super::*;
use crate::models::TypeShape;

fn plain(name: &str, type_name: &str) -> Parameter {
    Parameter::new(name, TypeShape::plain(type_name))
}

// === Recognition ===

#[test]
fn test_non_declaration_lines_are_ignored() {
    assert_eq!(parse_declaration("").unwrap(), None);
    assert_eq!(parse_declaration("// export declare function x(): void;").unwrap(), None);
    assert_eq!(parse_declaration("export function add(a: number): number;").unwrap(), None);
    assert_eq!(parse_declaration("export declare const x: number;").unwrap(), None);
    assert_eq!(parse_declaration("  export declare function f(): void;").unwrap(), None);
}

#[test]
fn test_trailing_whitespace_and_cr_are_ignored() {
    let signature = parse_declaration("export declare function f(): void;  \r")
        .unwrap()
        .unwrap();
    assert_eq!(signature.name, "f");
}

// === Example scenarios ===

#[test]
fn test_parse_add() {
    let signature = parse_declaration("export declare function add(a: number, b: number): number;")
        .unwrap()
        .unwrap();

    assert_eq!(signature.name, "add");
    assert_eq!(signature.parameters, vec![plain("a", "number"), plain("b", "number")]);
    assert_eq!(signature.return_type, plain(RETURN_VALUE_NAME, "number"));
    assert!(!signature.return_promise);
}

#[test]
fn test_parse_promise_without_parameters() {
    let signature = parse_declaration("export declare function load(): Promise<void>;")
        .unwrap()
        .unwrap();

    assert_eq!(signature.name, "load");
    assert!(signature.parameters.is_empty());
    assert_eq!(signature.return_type.type_name, "void");
    assert!(signature.return_promise);
}

// === Parameters ===

#[test]
fn test_zero_parameters_is_not_an_error() {
    let signature = parse_declaration("export declare function now(): number;")
        .unwrap()
        .unwrap();
    assert!(signature.parameters.is_empty());
}

#[test]
fn test_function_typed_parameter() {
    let signature = parse_declaration(
        "export declare function on(event: string, cb: (detail: string, code: number) => void): void;",
    )
    .unwrap()
    .unwrap();

    assert_eq!(signature.parameters.len(), 2);
    assert_eq!(signature.parameters[1].name, "cb");
    assert_eq!(
        signature.parameters[1].type_name,
        "(detail: string, code: number) => void"
    );
    assert_eq!(signature.return_type.type_name, "void");
}

#[test]
fn test_decorated_parameters() {
    let signature = parse_declaration(
        "export declare function fill(a: number?, b: string[], c: boolean[]?, d: Date?[]?): void;",
    )
    .unwrap()
    .unwrap();

    let flags: Vec<_> = signature
        .parameters
        .iter()
        .map(|p| (p.type_name.as_str(), p.nullable, p.array, p.array_nullable))
        .collect();
    assert_eq!(
        flags,
        vec![
            ("number", true, false, false),
            ("string", false, true, false),
            ("boolean", false, true, true),
            ("Date", true, true, true),
        ]
    );
}

#[test]
fn test_optional_parameter() {
    let signature = parse_declaration("export declare function greet(name?: string): string;")
        .unwrap()
        .unwrap();

    let parameter = &signature.parameters[0];
    assert_eq!(parameter.name, "name");
    assert!(parameter.optional);
    assert!(!parameter.nullable);
}

#[test]
fn test_generic_parameter_type_keeps_commas() {
    let signature = parse_declaration(
        "export declare function index(map: Map<string, number>, key: string): number | null;",
    )
    .unwrap()
    .unwrap();

    assert_eq!(signature.parameters[0].type_name, "Map<string, number>");
    assert_eq!(signature.parameters[1].name, "key");
    assert!(signature.return_type.nullable);
    assert_eq!(signature.return_type.type_name, "number");
}

// === Return types ===

#[test]
fn test_promise_of_decorated_type() {
    let signature = parse_declaration("export declare function list(): Promise<string[]?>;")
        .unwrap()
        .unwrap();

    assert!(signature.return_promise);
    assert_eq!(signature.return_type.type_name, "string");
    assert!(signature.return_type.array);
    assert!(signature.return_type.array_nullable);
}

#[test]
fn test_object_return_type_with_semicolons() {
    let signature = parse_declaration("export declare function size(): { w: number; h: number };")
        .unwrap()
        .unwrap();
    assert_eq!(signature.return_type.type_name, "{ w: number; h: number }");
}

#[test]
fn test_text_after_terminator_is_ignored() {
    let signature = parse_declaration("export declare function f(): void; // x; y")
        .unwrap()
        .unwrap();
    assert_eq!(signature.return_type.type_name, "void");
    assert!(signature.parameters.is_empty());
}

#[test]
fn test_grouped_nullable_parameter() {
    let signature = parse_declaration("export declare function f(a: (string | null)): void;")
        .unwrap()
        .unwrap();
    assert_eq!(signature.parameters[0].type_name, "string");
    assert!(signature.parameters[0].nullable);
    assert!(!signature.parameters[0].array);
}

// === Grammar errors ===

#[test]
fn test_missing_close_marker_fails() {
    let err = parse_declaration("export declare function add(a: number, b: number) number;")
        .unwrap_err();
    assert_eq!(err.expected, "'): '");
    assert_eq!(err.remainder, ") number;");

    let err = parse_declaration("export declare function now() number;").unwrap_err();
    assert_eq!(err.expected, "'): '");
}

#[test]
fn test_unterminated_parameter_list_fails() {
    let err = parse_declaration("export declare function add(a: number;").unwrap_err();
    assert_eq!(err.expected, "',' or ')'");
}

#[test]
fn test_missing_semicolon_fails() {
    let err = parse_declaration("export declare function add(a: number): number").unwrap_err();
    assert_eq!(err.expected, "';'");
}

#[test]
fn test_missing_open_paren_fails() {
    let err = parse_declaration("export declare function add;").unwrap_err();
    assert_eq!(err.expected, "'('");
}

#[test]
fn test_unclosed_promise_fails() {
    let err = parse_declaration("export declare function load(): Promise<void;").unwrap_err();
    assert_eq!(err.expected, "'>'");
}

#[test]
fn test_empty_names_fail() {
    assert!(parse_declaration("export declare function (): void;").is_err());
    assert!(parse_declaration("export declare function f(: number): void;").is_err());
    assert!(parse_declaration("export declare function f(): ;").is_err());
}

#[test]
fn test_generic_function_name_fails() {
    let err = parse_declaration("export declare function f<T>(a: T): T;").unwrap_err();
    assert_eq!(err.expected, "function name");
    assert_eq!(err.remainder, "f<T>(a: T): T;");
}

#[test]
fn test_non_identifier_parameter_name_fails() {
    let err = parse_declaration("export declare function f(a b: number): void;").unwrap_err();
    assert_eq!(err.expected, "parameter name");
    assert!(parse_declaration("export declare function f({ a }: Opts): void;").is_err());
}
