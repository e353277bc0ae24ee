//! Classification of single physical lines.

use thiserror::Error;

use super::lexer::{Lexeme, Token, lex};
use crate::base::Origin;

/// Everything from this character to end-of-line is a comment.
pub const COMMENT_MARKER: char = ';';

/// A structural line that does not follow the header or directive grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("malformed section header '{0}'")]
    MalformedHeader(String),
    #[error("malformed '#{directive}' directive: {reason}")]
    MalformedDirective {
        directive: String,
        reason: &'static str,
    },
}

/// A preprocessor directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `#include "path"` (`system == false`) or `#include <path>`.
    Include { path: &'a str, system: bool },
    Define { name: &'a str, value: Option<&'a str> },
    Undef(&'a str),
    IfDef(&'a str),
    IfNDef(&'a str),
    Else,
    EndIf,
    /// Any other `#word`; skipped by the resolver.
    Unknown(&'a str),
}

/// What one physical line is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// Empty, or nothing but a comment.
    Blank,
    /// `[ label ]`; the label as written.
    Header(&'a str),
    Directive(Directive<'a>),
    /// Comment-stripped, trimmed content.
    Data(&'a str),
    Malformed(LineError),
}

/// One line of the logical stream the include resolver produces.
///
/// `text` is the physical line after macro substitution; `origin` points
/// back at the file and line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    pub origin: Origin,
}

impl LogicalLine {
    pub fn new(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }

    pub fn class(&self) -> LineClass<'_> {
        classify(&self.text)
    }
}

/// Cut the comment off a line.
pub fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Classify a physical line.
pub fn classify(line: &str) -> LineClass<'_> {
    let content = strip_comment(line).trim();
    if content.is_empty() {
        LineClass::Blank
    } else if content.starts_with('[') {
        classify_header(content)
    } else if content.starts_with('#') {
        classify_directive(content)
    } else {
        LineClass::Data(content)
    }
}

fn classify_header(content: &str) -> LineClass<'_> {
    let malformed = || LineClass::Malformed(LineError::MalformedHeader(content.to_string()));
    let Ok(lexemes) = lex(content) else {
        return malformed();
    };
    match lexemes.as_slice() {
        [
            Lexeme { token: Token::LBracket, .. },
            Lexeme { token: Token::Word, text, .. },
            Lexeme { token: Token::RBracket, .. },
        ] => LineClass::Header(*text),
        _ => malformed(),
    }
}

fn classify_directive(content: &str) -> LineClass<'_> {
    let lexemes = match lex(content) {
        Ok(lexemes) => lexemes,
        Err(_) => {
            let name = directive_name(content.split_whitespace().next().unwrap_or("#"));
            return LineClass::Malformed(LineError::MalformedDirective {
                directive: name.to_string(),
                reason: "unterminated path or stray character",
            });
        }
    };
    let Some((head, rest)) = lexemes.split_first() else {
        return LineClass::Blank;
    };
    if head.token != Token::Directive {
        return LineClass::Malformed(LineError::MalformedDirective {
            directive: content.to_string(),
            reason: "expected a directive name after '#'",
        });
    }
    let name = directive_name(head.text);
    let malformed = |reason| {
        LineClass::Malformed(LineError::MalformedDirective {
            directive: name.to_string(),
            reason,
        })
    };

    let directive = match name {
        "include" => match rest {
            [path] if path.token == Token::Quoted => Directive::Include {
                path: unquote(path.text),
                system: false,
            },
            [path] if path.token == Token::Angled => Directive::Include {
                path: unquote(path.text),
                system: true,
            },
            _ => return malformed("expected exactly one quoted path"),
        },
        "define" => match rest {
            [] => return malformed("missing macro name"),
            [ident, ..] if ident.token == Token::Word => {
                let value = content[ident.span.end..].trim();
                Directive::Define {
                    name: ident.text,
                    value: (!value.is_empty()).then_some(value),
                }
            }
            _ => return malformed("macro name must be a plain word"),
        },
        "undef" | "ifdef" | "ifndef" => match rest {
            [macro_name] if macro_name.token == Token::Word => match name {
                "undef" => Directive::Undef(macro_name.text),
                "ifdef" => Directive::IfDef(macro_name.text),
                _ => Directive::IfNDef(macro_name.text),
            },
            _ => return malformed("expected exactly one macro name"),
        },
        "else" => Directive::Else,
        "endif" => Directive::EndIf,
        other => Directive::Unknown(other),
    };
    LineClass::Directive(directive)
}

fn directive_name(text: &str) -> &str {
    text.trim_start_matches('#').trim_start()
}

fn unquote(text: &str) -> &str {
    &text[1..text.len() - 1]
}
