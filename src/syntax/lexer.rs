//! Lexer for the structural lines of GROMACS text files.
//!
//! Data lines are plain whitespace-separated tokens and never go through
//! here; only lines starting with `[` or `#` are lexed.

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub enum Token {
    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    /// `#name`, with optional blanks after the `#` as cpp allows.
    #[regex(r"#[ \t]*[A-Za-z_]+")]
    Directive,

    #[regex(r#""[^"\n]*""#)]
    Quoted,

    #[regex(r"<[^>\n]*>")]
    Angled,

    #[regex(r#"[^ \t\r\f\n\[\]"<#;][^ \t\r\f\n\[\]";]*"#)]
    Word,
}

/// A lexed token with its source slice and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub token: Token,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Lex `text` completely, returning the byte offset of the first
/// character no token matches.
pub fn lex(text: &str) -> Result<Vec<Lexeme<'_>>, usize> {
    let mut lexer = Token::lexer(text);
    let mut out = Vec::new();
    while let Some(next) = lexer.next() {
        match next {
            Ok(token) => out.push(Lexeme {
                token,
                text: lexer.slice(),
                span: lexer.span(),
            }),
            Err(()) => return Err(lexer.span().start),
        }
    }
    Ok(out)
}
