use crate::account::Account;
use crate::amount::Currency;
use crate::automatic::{apply_rules, AutomaticTransaction, PeriodicTransaction, RuleId};
use crate::error::{DomainError, LedgerError};
use crate::statement::{Command, Document, Location, Statement};
use crate::transaction::{ParsedTransaction, Posting, TxnKind, UserTransaction};

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, warn};

/// Names introduced by `account`, `payee`, `tag`, `commodity` and `include`
/// commands, in order of first declaration.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Declarations {
    pub accounts: IndexSet<Account>,
    pub payees: IndexSet<String>,
    pub tags: IndexSet<String>,
    pub commodities: IndexSet<Currency>,
    pub includes: IndexSet<String>,
}

impl Declarations {
    fn declare(&mut self, command: &Command<'_>) {
        match command {
            Command::Account(account) => {
                self.accounts.insert(account.clone());
            }
            Command::Payee(payee) => {
                self.payees.insert(payee.to_string());
            }
            Command::Tag(tag) => {
                self.tags.insert(tag.to_string());
            }
            Command::Commodity(currency) => {
                self.commodities.insert(currency.clone());
            }
            Command::Include(file) => {
                self.includes.insert(file.to_string());
            }
        }
    }

    /// Accounts whose name contains `needle`, ignoring case.
    pub fn search_accounts<'a>(&'a self, needle: &str) -> impl Iterator<Item = &'a Account> {
        let needle = needle.to_lowercase();
        self.accounts
            .iter()
            .filter(move |account| account.as_str().to_lowercase().contains(&needle))
    }
}

/// A transaction block that parsed but could not be built.
#[derive(Debug)]
pub struct Rejected {
    pub location: Location,
    pub error: LedgerError,
}

/// Derived postings for one posting of one user transaction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub transaction: usize,
    pub posting: usize,
    pub location: Option<Location>,
    pub rule: RuleId,
    pub source: Posting,
    pub postings: Vec<Posting>,
}

#[derive(Debug, Default)]
pub struct Ledger {
    user_transactions: Vec<UserTransaction>,
    automatic_transactions: Vec<AutomaticTransaction>,
    periodic_transactions: Vec<PeriodicTransaction>,
    declarations: Declarations,
    rejected: Vec<Rejected>,
    next_rule: usize,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    pub fn user_transactions(&self) -> &[UserTransaction] {
        &self.user_transactions
    }

    pub fn automatic_transactions(&self) -> &[AutomaticTransaction] {
        &self.automatic_transactions
    }

    pub fn periodic_transactions(&self) -> &[PeriodicTransaction] {
        &self.periodic_transactions
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    pub fn process_statement(&mut self, statement: &Statement<'_>) {
        match statement {
            Statement::Comment(..) => {}
            Statement::Command(command, _) => self.declarations.declare(command),
            Statement::Transaction(txn) => {
                if let Err(error) = self.transaction(txn) {
                    warn!(line = txn.location.line, %error, "transaction rejected");
                    self.rejected.push(Rejected {
                        location: txn.location,
                        error,
                    });
                }
            }
        }
    }

    fn transaction(&mut self, txn: &ParsedTransaction<'_>) -> Result<(), LedgerError> {
        match &txn.kind {
            TxnKind::User(header) => {
                let user = UserTransaction::from_parsed(header, txn)?;
                self.user_transactions.push(user);
            }
            TxnKind::Automatic(_) => {
                // ids count every rule block, rejected or not
                let id = RuleId::new(self.next_rule);
                self.next_rule += 1;
                let rule = AutomaticTransaction::from_parsed(id, txn)?;
                self.automatic_transactions.push(rule);
            }
            TxnKind::Periodic(_) => {
                let periodic = PeriodicTransaction::from_parsed(txn)?;
                self.periodic_transactions.push(periodic);
            }
        }
        Ok(())
    }

    /// Apply `rules` to the postings of every user transaction.
    ///
    /// Annotations come in transaction, posting, then rule order and carry
    /// the source location of the posting that triggered them.
    pub fn derive(&self, rules: &[AutomaticTransaction]) -> Result<Vec<Annotation>, DomainError> {
        let mut annotations = Vec::new();
        for (transaction, user) in self.user_transactions.iter().enumerate() {
            for derivation in apply_rules(rules, user.postings())? {
                annotations.push(Annotation {
                    transaction,
                    posting: derivation.source_index,
                    location: user.posting_locations().get(derivation.source_index).copied(),
                    rule: derivation.rule,
                    source: derivation.source.clone(),
                    postings: derivation.postings,
                });
            }
        }
        debug!(annotations = annotations.len(), "derived postings");
        Ok(annotations)
    }
}

/// Build the model of every transaction in `document`.
///
/// A transaction that fails to balance, or a rule whose pattern does not
/// compile, is recorded in [`Ledger::rejected`] and the rest of the
/// document is still processed.
pub fn extract_transactions(document: &Document<'_>) -> Ledger {
    let mut ledger = Ledger::new();
    for statement in document.statements() {
        ledger.process_statement(statement);
    }
    debug!(
        user = ledger.user_transactions.len(),
        automatic = ledger.automatic_transactions.len(),
        periodic = ledger.periodic_transactions.len(),
        rejected = ledger.rejected.len(),
        "extracted transactions"
    );
    ledger
}
