use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use libautoledger::{
    extract_transactions, parse_document, Annotation, AutomaticTransaction, Document, Ledger,
};
use serde::Serialize;
use tracing::{debug, info};

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::align::{align_dot, pad_to_dot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Accounts,
    Payees,
    Tags,
    Commodities,
    Includes,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse<'t>(text: &'t str, path: &Path) -> Result<Document<'t>> {
    let document =
        parse_document(text).with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(file = %path.display(), statements = document.len(), "loaded");
    Ok(document)
}

fn load(path: &Path) -> Result<Ledger> {
    let text = read(path)?;
    Ok(extract_transactions(&parse(&text, path)?))
}

/// Exit code is 1 when any transaction or rule was rejected.
pub fn check(journal: &Path) -> Result<ExitCode> {
    let ledger = load(journal)?;

    for rejected in ledger.rejected() {
        println!(
            "{}:{}: {}",
            journal.display(),
            rejected.location.line,
            rejected.error
        );
    }

    for user in ledger.user_transactions() {
        let line = user.location().map(|l| l.line).unwrap_or_default();
        let residual = match user.transaction().residual() {
            Ok(residual) => residual,
            Err(err) => {
                println!(
                    "{}:{}: warning: cannot sum postings: {}",
                    journal.display(),
                    line,
                    err
                );
                continue;
            }
        };
        if residual.is_zero() {
            continue;
        }
        let mut left: Vec<String> = residual.unbalanced().map(|a| a.to_string()).collect();
        if !residual.multiplier.is_zero() {
            left.push(residual.multiplier.to_string());
        }
        println!(
            "{}:{}: warning: transaction does not balance, off by {}",
            journal.display(),
            line,
            left.join(", ")
        );
    }

    println!(
        "{}: {} transactions, {} automatic, {} periodic, {} rejected",
        journal.display(),
        ledger.user_transactions().len(),
        ledger.automatic_transactions().len(),
        ledger.periodic_transactions().len(),
        ledger.rejected().len()
    );

    if ledger.rejected().is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[derive(Serialize)]
struct DerivedEntry<'a> {
    line: Option<usize>,
    pattern: &'a str,
    /// `file:line` of the rule's `= /pattern/` header.
    definition: Option<String>,
    #[serde(flatten)]
    annotation: &'a Annotation,
}

pub fn derive(
    journal: &Path,
    rules_path: Option<&Path>,
    dot_column: usize,
    format: OutputFormat,
) -> Result<ExitCode> {
    let ledger = load(journal)?;
    let definitions = match rules_path {
        Some(path) => {
            let definitions = load(path)?;
            if let Some(rejected) = definitions.rejected().first() {
                bail!(
                    "{}:{}: {}",
                    path.display(),
                    rejected.location.line,
                    rejected.error
                );
            }
            Some(definitions)
        }
        None => None,
    };
    let rules: &[AutomaticTransaction] = definitions
        .as_ref()
        .unwrap_or(&ledger)
        .automatic_transactions();
    info!(rules = rules.len(), "applying rules");

    let annotations = ledger
        .derive(rules)
        .with_context(|| format!("failed to apply rules to {}", journal.display()))?;
    let definition_file = rules_path.unwrap_or(journal);
    let by_id: HashMap<_, _> = rules.iter().map(|r| (r.id(), r)).collect();

    let entries: Vec<DerivedEntry<'_>> = annotations
        .iter()
        .map(|annotation| {
            let rule = by_id.get(&annotation.rule).copied();
            DerivedEntry {
                line: annotation.location.map(|l| l.line),
                pattern: rule.map(|r| r.pattern()).unwrap_or_default(),
                definition: rule.and_then(|r| r.location()).map(|location| {
                    format!("{}:{}", definition_file.display(), location.line)
                }),
                annotation,
            }
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in &entries {
                print!(
                    "{}:{}: {} matched rule {} /{}/",
                    journal.display(),
                    entry.line.unwrap_or_default(),
                    entry.annotation.source.account,
                    entry.annotation.rule,
                    entry.pattern
                );
                match &entry.definition {
                    Some(definition) => println!(" at {}", definition),
                    None => println!(),
                }
                for posting in &entry.annotation.postings {
                    println!("{}", align_dot(posting, dot_column));
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

pub fn list(kind: ListKind, file: &Path, search: Option<&str>) -> Result<ExitCode> {
    let ledger = load(file)?;
    let declarations = ledger.declarations();

    let names: Vec<String> = match kind {
        ListKind::Accounts => match search {
            Some(needle) => declarations
                .search_accounts(needle)
                .map(|a| a.to_string())
                .collect(),
            None => declarations.accounts.iter().map(|a| a.to_string()).collect(),
        },
        ListKind::Payees => declarations.payees.iter().cloned().collect(),
        ListKind::Tags => declarations.tags.iter().cloned().collect(),
        ListKind::Commodities => declarations
            .commodities
            .iter()
            .map(|c| c.to_string())
            .collect(),
        ListKind::Includes => declarations.includes.iter().cloned().collect(),
    };

    let needle = search.map(str::to_lowercase);
    for name in names {
        // accounts were already searched above
        if let (Some(needle), false) = (&needle, kind == ListKind::Accounts) {
            if !name.to_lowercase().contains(needle.as_str()) {
                continue;
            }
        }
        println!("{}", name);
    }

    Ok(ExitCode::SUCCESS)
}

/// Re-emit `journal` with the amount of every posting line moved so its
/// decimal point sits after `dot_column` characters. Everything else is
/// copied byte for byte.
pub fn align(journal: &Path, dot_column: usize, write: bool) -> Result<ExitCode> {
    let text = read(journal)?;
    let document = parse(&text, journal)?;

    let mut aligned = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut moved = 0;
    for txn in document.transactions() {
        for posting in &txn.postings {
            let amount = match posting.amount_location {
                Some(amount) => amount,
                None => continue,
            };
            let line_start = posting.location.start;
            let line_end = text[amount.start..]
                .find(|c: char| c == '\r' || c == '\n')
                .map_or(text.len(), |idx| amount.start + idx);

            let lead = text[line_start..amount.start].trim_end();
            let rest = text[amount.start..line_end].trim_end();
            let line = pad_to_dot(lead, rest, dot_column);
            if line != text[line_start..line_end] {
                moved += 1;
            }

            aligned.push_str(&text[cursor..line_start]);
            aligned.push_str(&line);
            cursor = line_end;
        }
    }
    aligned.push_str(&text[cursor..]);
    info!(moved, "aligned amounts");

    if write {
        fs::write(journal, &aligned)
            .with_context(|| format!("failed to write {}", journal.display()))?;
    } else {
        print!("{}", aligned);
    }
    Ok(ExitCode::SUCCESS)
}
