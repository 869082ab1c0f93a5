use crate::amount::Currency;
use crate::parser::Rule;

use pest::error::{InputLocation, LineColLocation};
use pest::Position;
use thiserror::Error;

/// Input text that does not match the journal grammar.
///
/// Carries the byte offset of the failure along with its one-based line and
/// column, so callers can point at the offending text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn at(pos: Position<'_>, message: impl Into<String>) -> Self {
        let (line, column) = pos.line_col();
        ParseError {
            offset: pos.pos(),
            line,
            column,
            message: message.into(),
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let offset = match err.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        let (line, column) = match err.line_col {
            LineColLocation::Pos(lc) => lc,
            LineColLocation::Span(lc, _) => lc,
        };
        ParseError {
            offset,
            line,
            column,
            message: err.variant.message().into_owned(),
        }
    }
}

/// Raised while resolving the elided amount of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("more than one posting has its amount elided")]
    MultiplePlugs,
    #[error("postings mix currency amounts and bare multipliers")]
    IncoherentTypes,
    #[error("postings use different currencies: {expected} and {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
    #[error("no amount to balance the elided posting against")]
    Unresolvable,
    #[error("sum of postings overflows")]
    Overflow,
}

/// Raised by amount arithmetic and rule application.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("cannot combine amounts in {expected} and {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
    #[error("posting `{0}' has no amount to scale")]
    ElidedAmount(String),
    #[error("arithmetic overflow")]
    Overflow,
}

impl From<DomainError> for BalanceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::CurrencyMismatch { expected, found } => {
                BalanceError::CurrencyMismatch { expected, found }
            }
            DomainError::ElidedAmount(_) => BalanceError::Unresolvable,
            DomainError::Overflow => BalanceError::Overflow,
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("line {line}: not an automatic transaction")]
    NotARule { line: usize },
}
