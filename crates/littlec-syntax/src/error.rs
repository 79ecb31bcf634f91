//! Syntax error types covering lexical and parse failures.
//!
//! Every variant carries the source position the failure relates to;
//! messages render as `at ROW:COL: ...` so the driver can prefix them
//! uniformly.

use thiserror::Error;

use crate::token::Pos;

/// Errors produced by the lexer and the parser. The first error aborts the
/// pipeline; nothing is retried, aggregated, or suppressed.
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// A byte the lexer has no rule for.
    #[error("at {pos}: unexpected character `{ch}`")]
    UnexpectedChar { ch: char, pos: Pos },

    /// A string literal ran to end of input without a closing quote.
    #[error("at {pos}: string not terminated")]
    UnterminatedString { pos: Pos },

    /// A character literal ran to end of input without a closing quote.
    #[error("at {pos}: character literal not terminated")]
    UnterminatedChar { pos: Pos },

    /// An integer literal does not fit a 32-bit signed integer.
    #[error("at {pos}: integer literal out of range")]
    IntegerOutOfRange { pos: Pos },

    /// The parser found a different token than the grammar requires.
    #[error("at {pos}: expected {expected} got {found}: {context}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
        context: &'static str,
        pos: Pos,
    },

    /// A token with no primary production appeared in expression position.
    #[error("at {pos}: expected expression")]
    ExpectedExpression { pos: Pos },

    /// A declaration is missing its declared name.
    #[error("at {pos}: expected declaration name")]
    ExpectedName { pos: Pos },

    /// The left side of `=` is neither an identifier nor a declaration.
    #[error("at {pos}: invalid assignment target")]
    InvalidAssignTarget { pos: Pos },

    /// A call was applied to something other than a plain identifier.
    #[error("at {pos}: call target must be an identifier")]
    InvalidCallTarget { pos: Pos },
}

impl SyntaxError {
    /// The position the error relates to.
    pub fn pos(&self) -> Pos {
        match self {
            SyntaxError::UnexpectedChar { pos, .. }
            | SyntaxError::UnterminatedString { pos }
            | SyntaxError::UnterminatedChar { pos }
            | SyntaxError::IntegerOutOfRange { pos }
            | SyntaxError::UnexpectedToken { pos, .. }
            | SyntaxError::ExpectedExpression { pos }
            | SyntaxError::ExpectedName { pos }
            | SyntaxError::InvalidAssignTarget { pos }
            | SyntaxError::InvalidCallTarget { pos } => *pos,
        }
    }
}
