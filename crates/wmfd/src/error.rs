//! Errors raised while reading trees and configuring metrics.

use thiserror::Error;

/// The ways in which a Newick string can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The input contained nothing but whitespace and comments.
    #[error("empty input")]
    Empty,
    /// An opening parenthesis was never closed, or a closing one was never opened.
    #[error("unbalanced parentheses")]
    Unbalanced,
    /// The tree was not terminated by a `;`.
    #[error("missing `;` terminator")]
    MissingTerminator,
    /// A character that cannot appear at this position.
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    /// A branch length that is not a finite number.
    #[error("invalid branch length `{0}`")]
    InvalidLength(String),
    /// A sum of branch lengths from the root that is not a finite number.
    #[error("root-to-node height overflows")]
    HeightOverflow,
    /// A `[` without a matching `]`.
    #[error("unclosed comment")]
    UnclosedComment,
    /// A `'` without a matching `'`.
    #[error("unclosed quoted label")]
    UnclosedQuote,
    /// Non-whitespace input after the `;` terminator.
    #[error("trailing input after `;`")]
    TrailingInput,
}

/// An error raised by the Newick parser, with the byte offset at which it was
/// detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {position}")]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Byte offset into the input.
    pub position: usize,
}

impl ParseError {
    /// Creates a new `ParseError`.
    #[must_use]
    pub const fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// An error raised when channel weights cannot be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    /// A weight was negative, infinite or NaN.
    #[error("channel weight λ{index} must be finite and non-negative, got {value}")]
    Invalid {
        /// The 1-based index of the offending weight.
        index: usize,
        /// The offending value.
        value: f64,
    },
}
