use crate::error::ParseError;
use crate::parser::{parse_exact, unexpected, Rule};

use pest::iterators::Pair;
use serde::Serialize;

use std::convert::TryFrom;
use std::fmt;

/// An account name such as `Expenses:Food:Restaurant`.
///
/// Names may contain single inner spaces but never two in a row, tabs,
/// newlines or any of the comment characters `; # % | *`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn parse(token: Pair<'_, Rule>) -> Result<Account, ParseError> {
        match token.as_rule() {
            Rule::account => Ok(Account(token.as_str().to_string())),
            _ => Err(unexpected(&token)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Colon separated components of the name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(':')
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Account {
    type Error = ParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Account::parse(parse_exact(Rule::account, s)?)
    }
}
