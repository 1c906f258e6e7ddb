//! Property tests for declaration line parsing.

use proptest::prelude::*;

use dtswatch::models::{FunctionSignature, Parameter, TypeShape, RETURN_VALUE_NAME};
use dtswatch::parse_declaration;

fn identifier() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z_][A-Za-z0-9_]{0,12}").unwrap()
}

fn type_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("number".to_string()),
        Just("string".to_string()),
        Just("boolean".to_string()),
        Just("bigint".to_string()),
        Just("HTMLElement".to_string()),
        Just("Map<string, number>".to_string()),
        Just("{ x: number, y: number }".to_string()),
        Just("(value: string) => void".to_string()),
    ]
}

fn shape() -> impl Strategy<Value = TypeShape> {
    (type_name(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(type_name, nullable, array, array_nullable)| {
            // A bare function type cannot carry `?` or `[]` without parentheses.
            let decorated = nullable || array;
            let type_name = if decorated && type_name.contains("=>") {
                "number".to_string()
            } else {
                type_name
            };
            TypeShape {
                type_name,
                nullable,
                array,
                array_nullable: array && array_nullable,
            }
        },
    )
}

fn parameter() -> impl Strategy<Value = Parameter> {
    (identifier(), shape(), any::<bool>())
        .prop_map(|(name, shape, optional)| Parameter::new(name, shape).with_optional(optional))
}

fn signature() -> impl Strategy<Value = FunctionSignature> {
    (
        identifier(),
        proptest::collection::vec(parameter(), 0..=5),
        shape(),
        any::<bool>(),
    )
        .prop_map(|(name, parameters, return_shape, return_promise)| FunctionSignature {
            name,
            parameters,
            return_type: Parameter::new(RETURN_VALUE_NAME, return_shape),
            return_promise,
        })
}

fn render(signature: &FunctionSignature) -> String {
    let parameters: Vec<String> = signature.parameters.iter().map(|p| p.to_string()).collect();
    let return_type = signature.return_type.declared_type();
    let return_type = if signature.return_promise {
        format!("Promise<{return_type}>")
    } else {
        return_type
    };
    format!(
        "export declare function {}({}): {};",
        signature.name,
        parameters.join(", "),
        return_type
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a rendered signature parses back to the same signature.
    #[test]
    fn property_declaration_round_trip(expected in signature()) {
        let line = render(&expected);
        let parsed = parse_declaration(&line);
        prop_assert_eq!(parsed, Ok(Some(expected)), "line: {}", line);
    }

    /// PROPERTY: without the `): ` marker a declaration never parses.
    #[test]
    fn property_missing_close_marker_fails(expected in signature()) {
        let line = render(&expected).replacen("): ", ") ", 1);
        prop_assert!(parse_declaration(&line).is_err(), "line: {}", line);
    }

    /// PROPERTY: the parser never panics, whatever follows the prefix.
    #[test]
    fn property_parse_declaration_never_panics(rest in "(?s).{0,200}") {
        let _ = parse_declaration(&format!("export declare function {rest}"));
    }

    /// PROPERTY: lines without the prefix are ignored, never errors.
    #[test]
    fn property_other_lines_are_ignored(line in "[^e].{0,80}") {
        prop_assert_eq!(parse_declaration(&line), Ok(None));
    }
}
