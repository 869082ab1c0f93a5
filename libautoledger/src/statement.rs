use crate::account::Account;
use crate::amount::Currency;
use crate::error::ParseError;
use crate::parser::{next_pair, unexpected, Rule};
use crate::transaction::ParsedTransaction;

use pest::iterators::Pair;
use serde::Serialize;

use std::convert::TryFrom;
use std::fmt;

/// Byte range and starting line of a piece of source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Location {
    pub fn of(span: &pest::Span<'_>) -> Location {
        Location {
            start: span.start(),
            end: span.end(),
            line: span.start_pos().line_col().0,
        }
    }
}

/// Text following a comment character on a header, posting or note line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Note {
    Tags(Vec<String>),
    Meta { key: String, value: String },
    Text(String),
}

impl Note {
    pub fn parse(token: Pair<'_, Rule>) -> Result<Note, ParseError> {
        if token.as_rule() != Rule::note {
            return Err(unexpected(&token));
        }

        let span = token.as_span();
        let mut pairs = token.into_inner();
        // leading comment character
        next_pair(&mut pairs, &span, "comment char")?;
        let body = next_pair(&mut pairs, &span, "note body")?;

        let note = match body.as_rule() {
            Rule::tag_list => Note::Tags(body.into_inner().map(|t| t.as_str().to_string()).collect()),
            Rule::meta_pair => {
                let span = body.as_span();
                let mut pairs = body.into_inner();
                let key = next_pair(&mut pairs, &span, "metadata key")?;
                let value = next_pair(&mut pairs, &span, "metadata value")?;
                Note::Meta {
                    key: key.as_str().to_string(),
                    value: value.as_str().trim_end().to_string(),
                }
            }
            Rule::note_text => Note::Text(body.as_str().trim_end().to_string()),
            _ => return Err(unexpected(&body)),
        };

        Ok(note)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Tags(tags) => write!(f, "; :{}:", tags.join(":")),
            Note::Meta { key, value } => write!(f, "; {}: {}", key, value),
            Note::Text(text) => write!(f, "; {}", text),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command<'s> {
    Account(Account),
    Payee(&'s str),
    Tag(&'s str),
    Commodity(Currency),
    Include(&'s str),
}

impl<'s> Command<'s> {
    pub fn parse(token: Pair<'s, Rule>) -> Result<Command<'s>, ParseError> {
        let span = token.as_span();
        let mut pairs = token.into_inner();
        let def = next_pair(&mut pairs, &span, "command")?;

        let def_span = def.as_span();
        let rule = def.as_rule();
        let mut pairs = def.into_inner();
        let value = next_pair(&mut pairs, &def_span, "command value")?;

        let command = match rule {
            Rule::account_def => Command::Account(Account::parse(value)?),
            Rule::payee_def => Command::Payee(value.as_str()),
            Rule::tag_def => Command::Tag(value.as_str()),
            Rule::commodity_def => Command::Commodity(Currency::parse(value)?),
            Rule::include_def => Command::Include(value.as_str().trim_end()),
            _ => return Err(unexpected(&value)),
        };

        Ok(command)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement<'s> {
    Comment(&'s str, Location),
    Command(Command<'s>, Location),
    Transaction(ParsedTransaction<'s>),
}

impl<'s> TryFrom<Pair<'s, Rule>> for Statement<'s> {
    type Error = ParseError;

    fn try_from(pair: Pair<'s, Rule>) -> Result<Self, Self::Error> {
        let location = Location::of(&pair.as_span());
        let statement = match pair.as_rule() {
            Rule::comment => {
                let span = pair.as_span();
                let mut pairs = pair.into_inner();
                next_pair(&mut pairs, &span, "comment char")?;
                let text = next_pair(&mut pairs, &span, "comment text")?;
                Self::Comment(text.as_str().trim_end(), location)
            }
            Rule::command => Self::Command(Command::parse(pair)?, location),
            Rule::transaction => Self::Transaction(ParsedTransaction::parse(pair)?),
            _ => return Err(unexpected(&pair)),
        };

        Ok(statement)
    }
}

macro_rules! parse_next {
    ($parser:ident, $pairs:ident, $span:expr) => {
        $parser::parse($crate::parser::next_pair(
            &mut $pairs,
            &$span,
            stringify!($parser),
        )?)?
    };
}

pub(crate) use parse_next;

/// A parsed journal: its statements in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document<'s> {
    statements: Vec<Statement<'s>>,
}

impl<'s> Document<'s> {
    pub fn new(statements: Vec<Statement<'s>>) -> Document<'s> {
        Document { statements }
    }

    pub fn statements(&self) -> &[Statement<'s>] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &ParsedTransaction<'s>> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Transaction(txn) => Some(txn),
            _ => None,
        })
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command<'s>> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Command(command, _) => Some(command),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::account::Account;
    use crate::amount::Currency;
    use crate::parser::{parse_document, LedgerParser, Rule};
    use crate::statement::{Command, Location, Note, Statement};
    use pest::Parser;

    use anyhow::{anyhow, Result};

    use std::convert::TryFrom;

    fn statement(input: &str) -> Result<Statement<'_>> {
        let mut ast = LedgerParser::parse(Rule::journal, input)?;
        let journal = ast.next().ok_or(anyhow!("empty ast"))?;
        let first = journal.into_inner().next().ok_or(anyhow!("no statement"))?;
        Ok(Statement::try_from(first)?)
    }

    #[test]
    fn parse_comment_statement() -> Result<()> {
        assert_eq!(
            statement("% an old-style comment  \n")?,
            Statement::Comment(
                " an old-style comment",
                Location {
                    start: 0,
                    end: 25,
                    line: 1
                }
            )
        );
        Ok(())
    }

    #[test]
    fn parse_account_command() -> Result<()> {
        match statement("account Assets:Bank Account\n")? {
            Statement::Command(Command::Account(account), _) => {
                assert_eq!(account, Account::try_from("Assets:Bank Account")?)
            }
            other => return Err(anyhow!("unexpected statement {:?}", other)),
        }
        Ok(())
    }

    #[test]
    fn parse_other_commands() -> Result<()> {
        let cases = [
            ("payee Grocery Store", Command::Payee("Grocery Store")),
            ("tag holiday2021", Command::Tag("holiday2021")),
            ("commodity EUR", Command::Commodity(Currency::name("EUR"))),
            ("commodity €", Command::Commodity(Currency::Symbol('€'))),
            (
                "commodity \"Air Miles\"",
                Command::Commodity(Currency::long_name("Air Miles")),
            ),
            ("include ./2021/rules.ledger  ", Command::Include("./2021/rules.ledger")),
        ];
        for (input, expected) in cases {
            match statement(input)? {
                Statement::Command(command, _) => assert_eq!(command, expected),
                other => return Err(anyhow!("unexpected statement {:?}", other)),
            }
        }
        Ok(())
    }

    #[test]
    fn document_filters_statements() -> Result<()> {
        let document = parse_document(
            "payee Grocer\n; note\n2021/02/01 Grocer\n    A  1 EUR\n    B\n\ntag food\n",
        )?;
        assert_eq!(document.len(), 4);
        assert_eq!(
            document.commands().collect::<Vec<_>>(),
            vec![&Command::Payee("Grocer"), &Command::Tag("food")]
        );
        let lines: Vec<usize> = document.transactions().map(|t| t.location.line).collect();
        assert_eq!(lines, vec![3]);
        Ok(())
    }

    #[test]
    fn unknown_keyword_is_not_a_command() {
        assert!(LedgerParser::parse(Rule::journal, "accounts Assets:Bank\n").is_err());
        assert!(LedgerParser::parse(Rule::journal, "alias A=Assets\n").is_err());
    }

    #[test]
    fn parse_note_shapes() -> Result<()> {
        let cases = [
            ("; :food:weekly:", Note::Tags(vec!["food".into(), "weekly".into()])),
            (
                "; Receipt: 2021-0042 ",
                Note::Meta {
                    key: "Receipt".into(),
                    value: "2021-0042".into(),
                },
            ),
            ("# see http://example.com", Note::Text("see http://example.com".into())),
            (";", Note::Text(String::new())),
        ];
        for (input, expected) in cases {
            let token = LedgerParser::parse(Rule::note, input)?.next().unwrap();
            assert_eq!(Note::parse(token)?, expected);
        }
        Ok(())
    }

    #[test]
    fn render_notes() {
        assert_eq!(Note::Tags(vec!["a".into(), "b".into()]).to_string(), "; :a:b:");
        assert_eq!(
            Note::Meta {
                key: "k".into(),
                value: "v".into()
            }
            .to_string(),
            "; k: v"
        );
    }
}
