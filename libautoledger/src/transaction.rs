use crate::account::Account;
use crate::amount::PostingValue;
use crate::balance::{self, Residual};
use crate::date::JournalDate;
use crate::error::{BalanceError, DomainError, ParseError};
use crate::parser::{next_pair, unexpected, Rule};
use crate::statement::{parse_next, Location, Note};

use pest::iterators::Pair;
use serde::Serialize;

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TransactionState {
    Cleared, // '*'
    Pending, // '!'
}

impl TransactionState {
    pub fn parse(token: Pair<'_, Rule>) -> Result<TransactionState, ParseError> {
        match token.as_str() {
            "*" => Ok(TransactionState::Cleared),
            "!" => Ok(TransactionState::Pending),
            _ => Err(unexpected(&token)),
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Cleared => f.write_str("*"),
            TransactionState::Pending => f.write_str("!"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TxnHeader<'th> {
    pub date: JournalDate,
    pub aux_date: Option<JournalDate>,
    pub state: Option<TransactionState>,
    pub payee: &'th str,
    pub note: Option<Note>,
}

impl<'th> TxnHeader<'th> {
    pub fn parse(token: Pair<'th, Rule>) -> Result<TxnHeader<'th>, ParseError> {
        let span = token.as_span();
        let mut pairs = token.into_inner();

        let mut header = TxnHeader {
            date: parse_next!(JournalDate, pairs, span),
            aux_date: None,
            state: None,
            payee: "",
            note: None,
        };

        for token in pairs {
            match token.as_rule() {
                Rule::aux_date => header.aux_date = Some(JournalDate::parse(token)?),
                Rule::state => header.state = Some(TransactionState::parse(token)?),
                Rule::payee => header.payee = token.as_str(),
                Rule::note => header.note = Some(Note::parse(token)?),
                _ => return Err(unexpected(&token)),
            }
        }

        Ok(header)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TxnKind<'s> {
    User(TxnHeader<'s>),
    /// `= /pattern/`
    Automatic(&'s str),
    /// `~ /pattern/`
    Periodic(&'s str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedPosting {
    pub account: Account,
    pub value: PostingValue,
    pub note: Option<Note>,
    pub location: Location,
    /// Where the amount text sits, when there is one.
    pub amount_location: Option<Location>,
}

impl ParsedPosting {
    pub fn parse(token: Pair<'_, Rule>) -> Result<ParsedPosting, ParseError> {
        let location = Location::of(&token.as_span());
        let span = token.as_span();
        let mut pairs = token.into_inner();

        let mut posting = ParsedPosting {
            account: parse_next!(Account, pairs, span),
            value: PostingValue::Elided,
            note: None,
            location,
            amount_location: None,
        };

        for token in pairs {
            match token.as_rule() {
                Rule::amount => {
                    posting.amount_location = Some(Location::of(&token.as_span()));
                    posting.value = PostingValue::parse(token)?;
                }
                Rule::note => posting.note = Some(Note::parse(token)?),
                _ => return Err(unexpected(&token)),
            }
        }

        Ok(posting)
    }

    pub fn to_posting(&self) -> Posting {
        Posting::new(self.account.clone(), self.value.clone())
    }
}

/// A transaction block as written, before any amount is resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedTransaction<'tl> {
    pub kind: TxnKind<'tl>,
    pub postings: Vec<ParsedPosting>,
    pub notes: Vec<Note>,
    pub location: Location,
}

impl<'tl> ParsedTransaction<'tl> {
    pub fn parse(token: Pair<'tl, Rule>) -> Result<ParsedTransaction<'tl>, ParseError> {
        let token = match token.as_rule() {
            Rule::transaction => {
                let span = token.as_span();
                next_pair(&mut token.into_inner(), &span, "transaction")?
            }
            _ => token,
        };

        let location = Location::of(&token.as_span());
        let span = token.as_span();
        let rule = token.as_rule();
        let mut pairs = token.into_inner();

        let kind = match rule {
            Rule::user_transaction => TxnKind::User(parse_next!(TxnHeader, pairs, span)),
            Rule::automatic_transaction => {
                TxnKind::Automatic(next_pair(&mut pairs, &span, "rule pattern")?.as_str())
            }
            Rule::periodic_transaction => {
                TxnKind::Periodic(next_pair(&mut pairs, &span, "rule pattern")?.as_str())
            }
            _ => {
                return Err(ParseError::at(
                    span.start_pos(),
                    format!("unexpected token for transaction: '{}'", span.as_str()),
                ))
            }
        };

        let mut txn = ParsedTransaction {
            kind,
            postings: Vec::new(),
            notes: Vec::new(),
            location,
        };

        for line in pairs {
            match line.as_rule() {
                Rule::posting => txn.postings.push(ParsedPosting::parse(line)?),
                Rule::note_line => {
                    let span = line.as_span();
                    let mut inner = line.into_inner();
                    txn.notes.push(parse_next!(Note, inner, span));
                }
                _ => return Err(unexpected(&line)),
            }
        }

        Ok(txn)
    }

    pub fn to_postings(&self) -> Vec<Posting> {
        self.postings.iter().map(ParsedPosting::to_posting).collect()
    }
}

/// One account line of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub account: Account,
    pub value: PostingValue,
}

impl Posting {
    pub fn new(account: Account, value: impl Into<PostingValue>) -> Posting {
        Posting {
            account,
            value: value.into(),
        }
    }

    pub fn elided(account: Account) -> Posting {
        Posting::new(account, PostingValue::Elided)
    }

    pub fn is_elided(&self) -> bool {
        self.value.is_elided()
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            PostingValue::Elided => write!(f, "{}", self.account),
            value => write!(f, "{}  {}", self.account, value),
        }
    }
}

/// Postings whose single elided amount, if any, has been resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transaction {
    postings: Vec<Posting>,
}

impl Transaction {
    pub fn new(postings: Vec<Posting>) -> Result<Transaction, BalanceError> {
        Ok(Transaction {
            postings: balance::complete(postings)?,
        })
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Per-currency totals; all zero for a balanced transaction.
    pub fn residual(&self) -> Result<Residual, DomainError> {
        Residual::of(&self.postings)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, posting) in self.postings.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "    {}", posting)?;
        }
        Ok(())
    }
}

/// A dated journal entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserTransaction {
    pub date: JournalDate,
    pub aux_date: Option<JournalDate>,
    pub state: Option<TransactionState>,
    pub payee: String,
    pub note: Option<Note>,
    pub notes: Vec<Note>,
    transaction: Transaction,
    posting_locations: Vec<Location>,
    location: Option<Location>,
}

impl UserTransaction {
    pub fn new(
        date: JournalDate,
        payee: impl Into<String>,
        postings: Vec<Posting>,
    ) -> Result<UserTransaction, BalanceError> {
        Ok(UserTransaction {
            date,
            aux_date: None,
            state: None,
            payee: payee.into(),
            note: None,
            notes: Vec::new(),
            transaction: Transaction::new(postings)?,
            posting_locations: Vec::new(),
            location: None,
        })
    }

    /// Build from a parsed block, keeping the source location of every
    /// posting.
    pub fn from_parsed(
        header: &TxnHeader<'_>,
        parsed: &ParsedTransaction<'_>,
    ) -> Result<UserTransaction, BalanceError> {
        Ok(UserTransaction {
            date: header.date.clone(),
            aux_date: header.aux_date.clone(),
            state: header.state,
            payee: header.payee.to_string(),
            note: header.note.clone(),
            notes: parsed.notes.clone(),
            transaction: Transaction::new(parsed.to_postings())?,
            posting_locations: parsed.postings.iter().map(|p| p.location).collect(),
            location: Some(parsed.location),
        })
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn postings(&self) -> &[Posting] {
        self.transaction.postings()
    }

    /// Source locations of the postings, index-aligned with
    /// [`postings`](Self::postings). Empty when not built from source.
    pub fn posting_locations(&self) -> &[Location] {
        &self.posting_locations
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }
}

impl fmt::Display for UserTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)?;
        if let Some(aux_date) = &self.aux_date {
            write!(f, "={}", aux_date)?;
        }
        if let Some(state) = self.state {
            write!(f, " {}", state)?;
        }
        write!(f, " {}", self.payee)?;
        if let Some(note) = &self.note {
            write!(f, "  {}", note)?;
        }
        for note in &self.notes {
            write!(f, "\n    {}", note)?;
        }
        write!(f, "\n{}", self.transaction)
    }
}
