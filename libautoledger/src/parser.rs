use crate::error::ParseError;
use crate::statement::{Document, Statement};
use crate::transaction::ParsedTransaction;

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use tracing::debug;

#[derive(Parser)]
#[grammar = "ledger.pest"]
pub struct LedgerParser;

/// Parse a whole journal into its statements.
///
/// Parsing is strict: the first line that matches none of comment, command,
/// transaction or blank line fails the whole document, and the error points
/// at the furthest position the grammar reached.
pub fn parse_document(input: &str) -> Result<Document<'_>, ParseError> {
    let mut journal = LedgerParser::parse(Rule::journal, input)?;
    let journal = journal
        .next()
        .ok_or_else(|| ParseError::at(pest::Position::from_start(input), "empty journal"))?;

    let mut statements = Vec::new();
    for token in journal.into_inner() {
        match token.as_rule() {
            Rule::EOI => {}
            _ => statements.push(Statement::try_from(token)?),
        }
    }

    debug!(statements = statements.len(), "parsed journal");
    Ok(Document::new(statements))
}

/// Parse exactly one transaction block. Trailing whitespace is allowed,
/// anything else after the block is an error.
pub fn parse_transaction(input: &str) -> Result<ParsedTransaction<'_>, ParseError> {
    let token = parse_exact(Rule::transaction, input.trim_end())?;
    ParsedTransaction::parse(token)
}

/// Parse `input` with `rule`, requiring the rule to consume all of it.
pub(crate) fn parse_exact(rule: Rule, input: &str) -> Result<Pair<'_, Rule>, ParseError> {
    let token = LedgerParser::parse(rule, input)?
        .next()
        .ok_or_else(|| ParseError::at(pest::Position::from_start(input), "empty input"))?;

    let end = token.as_span().end_pos();
    if end.pos() != input.len() {
        return Err(ParseError::at(
            end,
            format!("unexpected trailing input: '{}'", &input[end.pos()..]),
        ));
    }

    Ok(token)
}

pub(crate) fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    parent: &pest::Span<'i>,
    expected: &str,
) -> Result<Pair<'i, Rule>, ParseError> {
    pairs.next().ok_or_else(|| {
        ParseError::at(
            parent.end_pos(),
            format!("invalid next token, expected {}", expected),
        )
    })
}

pub(crate) fn unexpected(token: &Pair<'_, Rule>) -> ParseError {
    ParseError::at(
        token.as_span().start_pos(),
        format!("unexpected token: '{}'", token.as_str()),
    )
}
