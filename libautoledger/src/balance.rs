use crate::amount::{Amount, Currency, PostingValue};
use crate::error::{BalanceError, DomainError};
use crate::transaction::Posting;

use indexmap::IndexMap;
use rust_decimal::Decimal;

use std::mem;

/// Resolve the single elided amount of `postings`, if any.
///
/// The plug is whatever brings the sum of the other postings back to zero:
/// the negated sum of their multipliers, or zero minus the sum of their
/// amounts. Every other value must be of the same kind, and amounts must
/// share one currency. Posting order is preserved.
pub fn complete(mut postings: Vec<Posting>) -> Result<Vec<Posting>, BalanceError> {
    let elided: Vec<usize> = postings
        .iter()
        .enumerate()
        .filter(|(_, posting)| posting.is_elided())
        .map(|(idx, _)| idx)
        .collect();

    let plug_idx = match elided.as_slice() {
        [] => return Ok(postings),
        [idx] => *idx,
        _ => return Err(BalanceError::MultiplePlugs),
    };

    let plug = plug_value(
        postings
            .iter()
            .map(|posting| &posting.value)
            .filter(|value| !value.is_elided())
            .collect(),
    )?;

    postings[plug_idx].value = plug;
    Ok(postings)
}

fn plug_value(values: Vec<&PostingValue>) -> Result<PostingValue, BalanceError> {
    let first = *values.first().ok_or(BalanceError::Unresolvable)?;
    if values
        .iter()
        .any(|value| mem::discriminant(*value) != mem::discriminant(first))
    {
        return Err(BalanceError::IncoherentTypes);
    }

    match first {
        PostingValue::Amount(first) => {
            let mut total = Amount::zero(first.currency.clone());
            for value in &values {
                if let PostingValue::Amount(amount) = value {
                    total = total.checked_add(amount)?;
                }
            }
            Ok(PostingValue::Amount(
                Amount::zero(first.currency.clone()).checked_sub(&total)?,
            ))
        }
        PostingValue::Multiplier(_) => {
            let mut total = Decimal::ZERO;
            for value in &values {
                if let PostingValue::Multiplier(m) = value {
                    total = total.checked_add(*m).ok_or(BalanceError::Overflow)?;
                }
            }
            Ok(PostingValue::Multiplier(Decimal::ZERO - total))
        }
        PostingValue::Elided => Err(BalanceError::Unresolvable),
    }
}

/// What is left when every posting of a transaction is summed.
///
/// Amounts are grouped by currency in order of first appearance; bare
/// multipliers add up separately.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Residual {
    pub amounts: IndexMap<Currency, Decimal>,
    pub multiplier: Decimal,
}

impl Residual {
    pub fn of(postings: &[Posting]) -> Result<Residual, DomainError> {
        let mut residual = Residual::default();
        for posting in postings {
            match &posting.value {
                PostingValue::Amount(amount) => {
                    let total = residual
                        .amounts
                        .entry(amount.currency.clone())
                        .or_insert(Decimal::ZERO);
                    *total = total
                        .checked_add(amount.quantity)
                        .ok_or(DomainError::Overflow)?;
                }
                PostingValue::Multiplier(m) => {
                    residual.multiplier = residual
                        .multiplier
                        .checked_add(*m)
                        .ok_or(DomainError::Overflow)?;
                }
                PostingValue::Elided => {}
            }
        }
        Ok(residual)
    }

    pub fn is_zero(&self) -> bool {
        self.multiplier.is_zero() && self.amounts.values().all(Decimal::is_zero)
    }

    /// Currencies whose total is not zero.
    pub fn unbalanced(&self) -> impl Iterator<Item = Amount> + '_ {
        self.amounts
            .iter()
            .map(|(currency, total)| Amount::new(*total, currency.clone()))
            .filter(|amount| !amount.is_zero())
    }
}
