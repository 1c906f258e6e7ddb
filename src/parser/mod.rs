//! Declaration parser
//!
//! Turns one line of a declaration file into a [`FunctionSignature`]. Only
//! the narrow `export declare function name(a: T, ...): R;` form is
//! recognized; any other line is not a declaration.
//!
//! ```text
//! export declare function add(a: number, b: number): number;
//! export declare function load(): Promise<void>;
//! ```

mod cursor;
#[cfg(test)]
mod tests;
mod types;

pub use cursor::Cursor;
pub use types::parse_type;

use crate::error::GrammarError;
use crate::models::{FunctionSignature, Parameter, RETURN_VALUE_NAME};

/// Prefix every declaration line starts with
pub const DECLARATION_PREFIX: &str = "export declare function ";

/// Return type wrapper marking an asynchronous result
const PROMISE_WRAPPER: &str = "Promise<";

/// Parse one line.
///
/// Returns `Ok(None)` when the line is not a function declaration, and a
/// [`GrammarError`] when it starts like one but breaks the grammar. No
/// partial signature is ever returned.
pub fn parse_declaration(line: &str) -> Result<Option<FunctionSignature>, GrammarError> {
    let line = line.trim_end();
    let Some(rest) = line.strip_prefix(DECLARATION_PREFIX) else {
        return Ok(None);
    };
    let mut cursor = Cursor::new(rest);

    let name = cursor.take_until('(')?.trim();
    if !is_identifier(name) {
        return Err(GrammarError::new("function name", rest));
    }
    cursor.expect("(")?;

    let parameters = if cursor.peek() == Some(')') {
        cursor.expect("): ")?;
        Vec::new()
    } else {
        parse_parameters(&mut cursor)?
    };

    let (return_type, return_promise) = parse_return_type(&mut cursor)?;

    Ok(Some(FunctionSignature {
        name: name.to_string(),
        parameters,
        return_type,
        return_promise,
    }))
}

fn parse_parameters(cursor: &mut Cursor<'_>) -> Result<Vec<Parameter>, GrammarError> {
    let mut parameters = Vec::new();

    loop {
        let raw_name = cursor.take_until(':')?;
        let (name, optional) = match raw_name.trim().strip_suffix('?') {
            Some(name) => (name.trim_end(), true),
            None => (raw_name.trim(), false),
        };
        if !is_identifier(name) {
            return Err(GrammarError::new("parameter name", cursor.rest()));
        }
        cursor.expect(": ")?;

        let span = cursor.take_type_span()?;
        let shape = parse_type(span)?;
        parameters.push(Parameter::new(name, shape).with_optional(optional));

        if cursor.eat(", ") {
            continue;
        }
        cursor.expect("): ")?;
        return Ok(parameters);
    }
}

fn parse_return_type(cursor: &mut Cursor<'_>) -> Result<(Parameter, bool), GrammarError> {
    let span = cursor.take_terminated(b';')?.trim();

    let (inner, promise) = match span.strip_prefix(PROMISE_WRAPPER) {
        Some(wrapped) => {
            let inner = wrapped
                .strip_suffix('>')
                .ok_or_else(|| GrammarError::new("'>'", wrapped))?;
            (inner, true)
        }
        None => (span, false),
    };

    let shape = parse_type(inner)?;
    Ok((Parameter::new(RETURN_VALUE_NAME, shape), promise))
}

/// `name` is a plain identifier: no generics, spaces or punctuation
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
