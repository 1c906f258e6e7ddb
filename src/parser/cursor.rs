//! Cursor over the unparsed rest of a declaration line

use crate::error::GrammarError;

/// A forward-only view into a line of text.
///
/// Every advance either consumes text and returns it, or fails with a
/// [`GrammarError`] naming what was expected and leaves the cursor intact.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    /// Text not yet consumed
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Consume `token` if the rest starts with it
    pub fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Consume `token` or fail
    pub fn expect(&mut self, token: &str) -> Result<(), GrammarError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("'{token}'")))
        }
    }

    /// Consume everything before the first `delimiter`, leaving the cursor on it
    pub fn take_until(&mut self, delimiter: char) -> Result<&'a str, GrammarError> {
        let end = self
            .rest
            .find(delimiter)
            .ok_or_else(|| self.error(format!("'{delimiter}'")))?;
        Ok(self.split(end))
    }

    /// Consume through the first `delimiter` outside `()`, `[]` and `{}`,
    /// returning the text before it. Whatever follows is left in the cursor.
    pub fn take_terminated(&mut self, delimiter: u8) -> Result<&'a str, GrammarError> {
        let mut depth = 0usize;
        let end = self
            .rest
            .bytes()
            .position(|byte| match byte {
                b'(' | b'[' | b'{' => {
                    depth += 1;
                    false
                }
                b')' | b']' | b'}' => {
                    depth = depth.saturating_sub(1);
                    false
                }
                _ => depth == 0 && byte == delimiter,
            })
            .ok_or_else(|| self.error(format!("'{}'", char::from(delimiter))))?;
        let taken = self.split(end);
        self.rest = &self.rest[1..];
        Ok(taken)
    }

    /// Consume one parameter type.
    ///
    /// The span ends before the first `,` or `)` outside any bracket pair.
    /// `(`, `<`, `[` and `{` all open a level, and `=>` is skipped as a unit so
    /// function types do not close an angle bracket.
    pub fn take_type_span(&mut self) -> Result<&'a str, GrammarError> {
        let bytes = self.rest.as_bytes();
        let mut depth = 0usize;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'=' if bytes.get(i + 1) == Some(&b'>') => {
                    i += 2;
                    continue;
                }
                b'(' | b'<' | b'[' | b'{' => depth += 1,
                b')' | b',' if depth == 0 => return Ok(self.split(i)),
                b')' | b'>' | b']' | b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }

        Err(self.error("',' or ')'"))
    }

    fn split(&mut self, at: usize) -> &'a str {
        let (taken, rest) = self.rest.split_at(at);
        self.rest = rest;
        taken
    }

    fn error(&self, expected: impl Into<String>) -> GrammarError {
        GrammarError::new(expected, self.rest)
    }
}
