//! Type decoration parsing (`?`, `[]`, `[]?`, `| null`)

use crate::error::GrammarError;
use crate::models::TypeShape;

/// Suffixes that make the preceding type nullable
const NULLABLE_SUFFIXES: [&str; 3] = ["?", " | null", " | undefined"];

/// Split a type span into its base type and decoration flags.
///
/// The outermost marker is read first: a trailing nullable marker after
/// `[]` makes the array nullable, one before `[]` makes the elements
/// nullable. Without `[]` a trailing marker makes the value nullable.
pub fn parse_type(span: &str) -> Result<TypeShape, GrammarError> {
    let mut text = span.trim();
    let outer_nullable = strip_nullable(&mut text);

    let shape = match text.strip_suffix("[]") {
        Some(element) => {
            let mut element = element.trim_end();
            let mut nullable = strip_nullable(&mut element);
            if !nullable {
                if let Some(mut inner) = unwrap_group(element) {
                    if strip_nullable(&mut inner) {
                        nullable = true;
                        element = inner;
                    }
                }
            }
            TypeShape {
                type_name: element.to_string(),
                nullable,
                array: true,
                array_nullable: outer_nullable,
            }
        }
        None => {
            let mut nullable = outer_nullable;
            if !nullable {
                if let Some(mut inner) = unwrap_group(text) {
                    if strip_nullable(&mut inner) {
                        nullable = true;
                        text = inner;
                    }
                }
            }
            TypeShape {
                type_name: text.to_string(),
                nullable,
                array: false,
                array_nullable: false,
            }
        }
    };

    if shape.type_name.is_empty() {
        return Err(GrammarError::new("type", span));
    }
    Ok(shape)
}

fn strip_nullable(text: &mut &str) -> bool {
    for suffix in NULLABLE_SUFFIXES {
        if let Some(stripped) = text.strip_suffix(suffix) {
            *text = stripped.trim_end();
            return true;
        }
    }
    false
}

/// Inner text of `( ... )` when the first paren closes at the last char
fn unwrap_group(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0usize;
    for byte in inner.bytes() {
        match byte {
            b'(' => depth += 1,
            b')' if depth == 0 => return None,
            b')' => depth -= 1,
            _ => {}
        }
    }
    Some(inner.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(type_name: &str, nullable: bool, array: bool, array_nullable: bool) -> TypeShape {
        TypeShape {
            type_name: type_name.to_string(),
            nullable,
            array,
            array_nullable,
        }
    }

    #[test]
    fn test_plain_type() {
        assert_eq!(parse_type("number").unwrap(), shape("number", false, false, false));
    }

    #[test]
    fn test_all_decoration_states_are_distinct() {
        assert_eq!(parse_type("number?").unwrap(), shape("number", true, false, false));
        assert_eq!(parse_type("number[]").unwrap(), shape("number", false, true, false));
        assert_eq!(parse_type("number?[]").unwrap(), shape("number", true, true, false));
        assert_eq!(parse_type("number[]?").unwrap(), shape("number", false, true, true));
        assert_eq!(parse_type("number?[]?").unwrap(), shape("number", true, true, true));
    }

    #[test]
    fn test_union_null_is_nullable() {
        assert_eq!(parse_type("string | null").unwrap(), shape("string", true, false, false));
        assert_eq!(
            parse_type("string[] | undefined").unwrap(),
            shape("string", false, true, true)
        );
        assert_eq!(
            parse_type("(string | null)[]").unwrap(),
            shape("string", true, true, false)
        );
    }

    #[test]
    fn test_grouped_union_null_is_nullable() {
        assert_eq!(
            parse_type("(string | null)").unwrap(),
            shape("string", true, false, false)
        );
        assert_eq!(parse_type("(number?)").unwrap(), shape("number", true, false, false));
        // a group without a nullable marker is kept as written
        assert_eq!(parse_type("(string)").unwrap(), shape("(string)", false, false, false));
    }

    #[test]
    fn test_function_type_array_keeps_group() {
        assert_eq!(
            parse_type("((x: number) => void)[]").unwrap(),
            shape("((x: number) => void)", false, true, false)
        );
    }

    #[test]
    fn test_unwrap_group_requires_single_group() {
        assert_eq!(unwrap_group("(a | null)"), Some("a | null"));
        assert_eq!(unwrap_group("(a) => (b)"), None);
        assert_eq!(unwrap_group("a"), None);
    }

    #[test]
    fn test_empty_type_fails() {
        let err = parse_type("  ").unwrap_err();
        assert_eq!(err.expected, "type");
        assert!(parse_type("?").is_err());
        assert!(parse_type("[]").is_err());
    }
}
