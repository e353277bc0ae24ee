//! Field validation and positional token access.
//!
//! [`Field`] is the validator boundary: every semantic field type says what
//! it expects and how a raw token becomes a value. [`Fields`] walks the
//! tokens of one data line and names the field whenever something is
//! missing or does not validate.

use smol_str::SmolStr;

use super::error::RecordError;

/// A semantic field type a raw token can be validated into.
pub trait Field: Sized {
    /// Human description of what a valid token looks like.
    const EXPECTED: &'static str;

    fn validate(token: &str) -> Option<Self>;
}

impl Field for i32 {
    const EXPECTED: &'static str = "an integer";

    fn validate(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl Field for u32 {
    const EXPECTED: &'static str = "a non-negative integer";

    fn validate(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl Field for u8 {
    const EXPECTED: &'static str = "a function type code";

    fn validate(token: &str) -> Option<Self> {
        token.parse().ok()
    }
}

impl Field for f64 {
    const EXPECTED: &'static str = "a finite float";

    fn validate(token: &str) -> Option<Self> {
        token.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Field for SmolStr {
    const EXPECTED: &'static str = "a name";

    fn validate(token: &str) -> Option<Self> {
        Some(SmolStr::new(token))
    }
}

/// `yes`/`no` flags, as written in `[ defaults ]`.
impl Field for bool {
    const EXPECTED: &'static str = "'yes' or 'no'";

    fn validate(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "yes" => Some(true),
            "no" => Some(false),
            _ => None,
        }
    }
}

/// Cursor over the whitespace-separated tokens of a data line.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    content: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> Fields<'a> {
    /// `content` must already be comment-stripped.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            tokens: content.split_whitespace().collect(),
            pos: 0,
        }
    }

    /// Total number of tokens on the line.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    /// The token `offset` places after the cursor, without consuming it.
    pub fn peek_at(&self, offset: usize) -> Option<&'a str> {
        self.tokens.get(self.pos + offset).copied()
    }

    pub fn required<T: Field>(&mut self, field: &'static str) -> Result<T, RecordError> {
        let token = self
            .peek_at(0)
            .ok_or(RecordError::MissingField { field })?;
        let value = T::validate(token).ok_or_else(|| RecordError::invalid(field, token, T::EXPECTED))?;
        self.pos += 1;
        Ok(value)
    }

    /// Like [`required`](Self::required), but end-of-line yields `None`.
    pub fn optional<T: Field>(&mut self, field: &'static str) -> Result<Option<T>, RecordError> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        self.required(field).map(Some)
    }

    /// Validate every remaining token as `T`.
    pub fn rest<T: Field>(&mut self, field: &'static str) -> Result<Vec<T>, RecordError> {
        let mut out = Vec::with_capacity(self.remaining());
        while self.remaining() > 0 {
            out.push(self.required(field)?);
        }
        Ok(out)
    }

    /// Consume the whole line as free text.
    pub fn text(&mut self) -> &'a str {
        self.pos = self.tokens.len();
        self.content.trim()
    }

    /// Fail if any token was left unconsumed.
    pub fn finish(&self) -> Result<(), RecordError> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(RecordError::ExtraData(self.tokens[self.pos..].join(" ")))
        }
    }
}
