//! Autoledger - a parser and domain model for ledger-style journals
//! ---
//!
//! Reads plain text journals made of dated transactions, account and payee
//! declarations, and automatic transactions (`= /regex/` rules). Every
//! transaction is completed on construction: the one posting written
//! without an amount receives whatever balances the others. Rules are then
//! applied to concrete postings to produce the postings they derive.
//!
//! ```
//! use libautoledger::{extract_transactions, parse_document};
//!
//! let journal = "\
//! = /Income:Salary/
//!     Assets:Savings  -0.3
//!     Assets:Checking  0.3
//!
//! 2021/01/31 Employer
//!     Assets:Checking
//!     Income:Salary  -1000 EUR
//! ";
//!
//! let ledger = extract_transactions(&parse_document(journal)?);
//! let derived = ledger.derive(ledger.automatic_transactions())?;
//! assert_eq!(derived[0].postings[0].to_string(), "Assets:Savings  300.00 EUR");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Account names, e.g. `Expenses:Food:Restaurant`.
pub mod account;

/// Amounts, currency designators and the value a posting carries.
pub mod amount;

/// Rules that derive postings from the postings they match.
///
/// A rule's templates are either fixed amounts, copied as they are, or bare
/// multipliers scaled by the amount of the posting that matched.
pub mod automatic;

/// Resolution of the elided posting of a transaction.
pub mod balance;

pub mod date;
pub mod error;

/// Transactions of a whole document, sorted by kind, and the declarations
/// made by its commands.
pub mod ledger;

/// Our main parser entrypoints.
pub mod parser;

pub mod statement;
pub mod transaction;

pub use account::Account;
pub use amount::{Amount, Currency, PostingValue};
pub use automatic::{apply_rules, AutomaticTransaction, Derivation, PeriodicTransaction, RuleId};
pub use balance::{complete, Residual};
pub use date::JournalDate;
pub use error::{BalanceError, DomainError, LedgerError, ParseError};
pub use ledger::{extract_transactions, Annotation, Declarations, Ledger, Rejected};
pub use parser::{parse_document, parse_transaction};
pub use statement::{Document, Location, Note, Statement};
pub use transaction::{Posting, Transaction, TransactionState, UserTransaction};
