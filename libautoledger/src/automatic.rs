use crate::amount::{scale_quantity, Amount, PostingValue};
use crate::error::{DomainError, LedgerError};
use crate::statement::Location;
use crate::transaction::{ParsedTransaction, Posting, Transaction, TxnKind};

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use std::fmt;

/// Identity of a rule: its position among the automatic transactions of
/// the document it was declared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RuleId(usize);

impl RuleId {
    pub fn new(index: usize) -> RuleId {
        RuleId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A rule: postings whose account matches `pattern` get the template
/// postings added next to them.
#[derive(Clone, Debug)]
pub struct AutomaticTransaction {
    id: RuleId,
    pattern: Regex,
    transaction: Transaction,
    location: Option<Location>,
}

impl AutomaticTransaction {
    pub fn new(
        id: RuleId,
        pattern: &str,
        templates: Vec<Posting>,
    ) -> Result<AutomaticTransaction, LedgerError> {
        Ok(AutomaticTransaction {
            id,
            pattern: Regex::new(pattern)?,
            transaction: Transaction::new(templates)?,
            location: None,
        })
    }

    pub fn from_parsed(
        id: RuleId,
        parsed: &ParsedTransaction<'_>,
    ) -> Result<AutomaticTransaction, LedgerError> {
        let pattern = match parsed.kind {
            TxnKind::Automatic(pattern) => pattern,
            _ => {
                return Err(LedgerError::NotARule {
                    line: parsed.location.line,
                })
            }
        };
        let mut rule = AutomaticTransaction::new(id, pattern, parsed.to_postings())?;
        rule.location = Some(parsed.location);
        Ok(rule)
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn postings(&self) -> &[Posting] {
        self.transaction.postings()
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Unanchored search, so `Food` catches `Expenses:Food:Restaurant`.
    pub fn matches(&self, posting: &Posting) -> bool {
        self.pattern.is_match(posting.account.as_str())
    }

    /// Instantiate the templates against `source`. Does not check
    /// [`matches`](Self::matches).
    pub fn apply(&self, source: &Posting) -> Result<Vec<Posting>, DomainError> {
        self.postings()
            .iter()
            .map(|template| {
                let value = match (&template.value, &source.value) {
                    (PostingValue::Amount(fixed), _) => PostingValue::Amount(fixed.clone()),
                    (PostingValue::Multiplier(factor), PostingValue::Amount(amount)) => {
                        PostingValue::Amount(amount.checked_mul(*factor)?)
                    }
                    (PostingValue::Multiplier(factor), PostingValue::Multiplier(m)) => {
                        PostingValue::Multiplier(scale_quantity(*m, *factor)?)
                    }
                    (PostingValue::Multiplier(_), PostingValue::Elided) => {
                        return Err(DomainError::ElidedAmount(source.account.to_string()))
                    }
                    (PostingValue::Elided, _) => {
                        return Err(DomainError::ElidedAmount(template.account.to_string()))
                    }
                };
                Ok(Posting::new(template.account.clone(), value))
            })
            .collect()
    }
}

impl PartialEq for AutomaticTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.pattern.as_str() == other.pattern.as_str()
            && self.transaction == other.transaction
    }
}

impl fmt::Display for AutomaticTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "= /{}/", self.pattern)?;
        write!(f, "{}", self.transaction)
    }
}

/// A `~` block. Parsed and balanced like a rule, never applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodicTransaction {
    pub period: String,
    transaction: Transaction,
    location: Option<Location>,
}

impl PeriodicTransaction {
    pub fn from_parsed(
        parsed: &ParsedTransaction<'_>,
    ) -> Result<PeriodicTransaction, LedgerError> {
        let period = match parsed.kind {
            TxnKind::Periodic(period) => period,
            _ => {
                return Err(LedgerError::NotARule {
                    line: parsed.location.line,
                })
            }
        };
        Ok(PeriodicTransaction {
            period: period.to_string(),
            transaction: Transaction::new(parsed.to_postings())?,
            location: Some(parsed.location),
        })
    }

    pub fn postings(&self) -> &[Posting] {
        self.transaction.postings()
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl fmt::Display for PeriodicTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "~ /{}/", self.period)?;
        write!(f, "{}", self.transaction)
    }
}

/// The postings one rule produced for one source posting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Derivation<'a> {
    pub source: &'a Posting,
    pub source_index: usize,
    pub rule: RuleId,
    pub postings: Vec<Posting>,
}

impl Derivation<'_> {
    /// Derived postings that carry an amount.
    pub fn amounts(&self) -> impl Iterator<Item = &Amount> {
        self.postings.iter().filter_map(|p| p.value.amount())
    }
}

/// Run every rule against every posting, in posting then declaration order.
pub fn apply_rules<'a>(
    rules: &[AutomaticTransaction],
    postings: &'a [Posting],
) -> Result<Vec<Derivation<'a>>, DomainError> {
    let mut derivations = Vec::new();
    for (source_index, source) in postings.iter().enumerate() {
        for rule in rules.iter().filter(|rule| rule.matches(source)) {
            trace!(account = %source.account, rule = %rule.id(), "rule matched");
            derivations.push(Derivation {
                source,
                source_index,
                rule: rule.id(),
                postings: rule.apply(source)?,
            });
        }
    }
    Ok(derivations)
}
