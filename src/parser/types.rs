//! Parser Types and Constants
//!
//! Shared types and small token predicates used across parser modules.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::parser::lexer::{Token, TokenType};

/// Iteration ceiling for parsing loops, to stop runaway recovery
pub const MAX_PARSE_ITERATIONS: usize = 1_000_000;

/// A positioned parse error with an optional help hint.
///
/// Errors are accumulated while parsing continues; they are expected output,
/// not an unwind path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub help: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)?;
        if let Some(help) = &self.help {
            write!(f, " (help: {help})")?;
        }
        Ok(())
    }
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Top-level error type for callers of the front end (the CLI binary)
#[derive(Debug, Error)]
pub enum FrontEndError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{count} parse error(s)")]
    Parse { count: usize },
}

/// Trivia tokens never reach the AST
pub fn is_trivia(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Newline | TokenType::Comment | TokenType::MultilineComment
    )
}

/// Comparison operators usable in filters and version checks
pub fn is_comparison_operator(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Gte
            | TokenType::Gt
            | TokenType::Lte
            | TokenType::Lt
            | TokenType::Eq
            | TokenType::Ne
    )
}

/// Operators accepted between expression primaries
pub fn is_binary_operator(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Plus
            | TokenType::Minus
            | TokenType::Star
            | TokenType::Slash
            | TokenType::Equals
    ) || is_comparison_operator(t)
}

/// Tool keywords recognized by detection statements
pub fn is_tool_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::Docker
            | TokenType::Git
            | TokenType::Node
            | TokenType::Npm
            | TokenType::Yarn
            | TokenType::Pnpm
            | TokenType::Python
            | TokenType::Pip
            | TokenType::Go
            | TokenType::Cargo
            | TokenType::Kubectl
            | TokenType::Helm
            | TokenType::Terraform
            | TokenType::Java
            | TokenType::Maven
            | TokenType::Gradle
            | TokenType::Make
            | TokenType::Curl
            | TokenType::Wget
    )
}

/// True for keyword kinds (everything that is a word in the lexicon)
pub fn is_keyword(t: TokenType) -> bool {
    !matches!(
        t,
        TokenType::Illegal
            | TokenType::Eof
            | TokenType::Ident
            | TokenType::String
            | TokenType::Number
            | TokenType::Boolean
            | TokenType::Variable
            | TokenType::Indent
            | TokenType::Dedent
            | TokenType::Newline
            | TokenType::Comment
            | TokenType::MultilineComment
            | TokenType::Gte
            | TokenType::Gt
            | TokenType::Lte
            | TokenType::Lt
            | TokenType::Eq
            | TokenType::Ne
            | TokenType::Plus
            | TokenType::Minus
            | TokenType::Star
            | TokenType::Slash
            | TokenType::Equals
            | TokenType::Colon
            | TokenType::Comma
            | TokenType::LParen
            | TokenType::RParen
            | TokenType::LBrace
            | TokenType::RBrace
            | TokenType::LBracket
            | TokenType::RBracket
    )
}

/// Identifiers and keywords both act as bare names in option positions
pub fn is_name_token(t: &Token) -> bool {
    t.token_type == TokenType::Ident || is_keyword(t.token_type)
}

/// Value tokens accepted on the right side of an option pair
pub fn is_value_token(t: TokenType) -> bool {
    matches!(
        t,
        TokenType::String
            | TokenType::Number
            | TokenType::Boolean
            | TokenType::Variable
            | TokenType::Ident
    )
}

/// Render a token back to source-ish text; strings get their quotes back
pub fn render_token(t: &Token) -> String {
    match t.token_type {
        TokenType::String => format!("\"{}\"", t.literal),
        _ => t.literal.clone(),
    }
}
