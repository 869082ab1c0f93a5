use crate::error::{DomainError, ParseError};
use crate::parser::{next_pair, parse_exact, unexpected, Rule};

use pest::iterators::Pair;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use std::fmt;
use std::str::FromStr;

/// Currency symbols accepted in front of a number, e.g. `€12.50`.
pub const CURRENCY_SYMBOLS: [char; 5] = ['$', '£', '¥', '€', '¢'];

/// Number of fractional digits kept by multiplication.
pub const FRACTION_DIGITS: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Currency {
    /// One of [`CURRENCY_SYMBOLS`], written before the number.
    Symbol(char),
    /// Bare alphabetic code written after the number, e.g. `EUR`.
    Name(String),
    /// Free text written quoted after the number; stored without the quotes.
    LongName(String),
}

impl Currency {
    pub fn symbol(c: char) -> Option<Currency> {
        CURRENCY_SYMBOLS.contains(&c).then_some(Currency::Symbol(c))
    }

    pub fn name(name: impl Into<String>) -> Currency {
        Currency::Name(name.into())
    }

    pub fn long_name(name: impl Into<String>) -> Currency {
        Currency::LongName(name.into())
    }

    pub fn parse(token: Pair<'_, Rule>) -> Result<Currency, ParseError> {
        match token.as_rule() {
            Rule::commodity => {
                let span = token.as_span();
                let mut pairs = token.into_inner();
                Currency::parse(next_pair(&mut pairs, &span, "currency")?)
            }
            Rule::currency_symbol => token
                .as_str()
                .chars()
                .next()
                .and_then(Currency::symbol)
                .ok_or_else(|| unexpected(&token)),
            Rule::currency_name => Ok(Currency::Name(token.as_str().to_string())),
            Rule::currency_long => {
                let span = token.as_span();
                let mut pairs = token.into_inner();
                let name = next_pair(&mut pairs, &span, "currency name")?;
                Ok(Currency::LongName(name.as_str().to_string()))
            }
            _ => Err(unexpected(&token)),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Symbol(c) => write!(f, "{}", c),
            Currency::Name(name) => f.write_str(name),
            Currency::LongName(name) => write!(f, "\"{}\"", name),
        }
    }
}

/// Convert a `number` token, dropping thousands separators. Literals that do
/// not fit a `Decimal` without rounding are errors.
pub(crate) fn parse_number(token: &Pair<'_, Rule>) -> Result<Decimal, ParseError> {
    let digits = token.as_str().replace(',', "");
    Decimal::from_str_exact(&digits).map_err(|e| {
        ParseError::at(
            token.as_span().start_pos(),
            format!("invalid number '{}': {}", token.as_str(), e),
        )
    })
}

/// Whole numbers are written as is, anything with a fractional part with
/// exactly two digits.
pub(crate) fn write_quantity(f: &mut fmt::Formatter<'_>, quantity: Decimal) -> fmt::Result {
    if quantity.scale() == 0 {
        return write!(f, "{}", quantity);
    }
    let mut rounded = quantity.round_dp_with_strategy(
        FRACTION_DIGITS,
        RoundingStrategy::MidpointAwayFromZero,
    );
    rounded.rescale(FRACTION_DIGITS);
    write!(f, "{}", rounded)
}

pub(crate) fn scale_quantity(quantity: Decimal, factor: Decimal) -> Result<Decimal, DomainError> {
    quantity
        .checked_mul(factor)
        .map(|q| q.round_dp_with_strategy(FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero))
        .ok_or(DomainError::Overflow)
}

/// A quantity tagged with its currency.
///
/// Equality compares quantities numerically, so `300.0 EUR == 300 EUR`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Amount {
    pub quantity: Decimal,
    pub currency: Currency,
}

impl Amount {
    pub fn new(quantity: Decimal, currency: Currency) -> Amount {
        Amount { quantity, currency }
    }

    pub fn zero(currency: Currency) -> Amount {
        Amount::new(Decimal::ZERO, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }

    fn same_currency(&self, rhs: &Amount) -> Result<(), DomainError> {
        if self.currency != rhs.currency {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency.clone(),
                found: rhs.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, rhs: &Amount) -> Result<Amount, DomainError> {
        self.same_currency(rhs)?;
        let quantity = self
            .quantity
            .checked_add(rhs.quantity)
            .ok_or(DomainError::Overflow)?;
        Ok(Amount::new(quantity, self.currency.clone()))
    }

    pub fn checked_sub(&self, rhs: &Amount) -> Result<Amount, DomainError> {
        self.same_currency(rhs)?;
        let quantity = self
            .quantity
            .checked_sub(rhs.quantity)
            .ok_or(DomainError::Overflow)?;
        Ok(Amount::new(quantity, self.currency.clone()))
    }

    /// Multiply by a dimensionless factor, rounding to two fractional digits.
    pub fn checked_mul(&self, factor: Decimal) -> Result<Amount, DomainError> {
        Ok(Amount::new(
            scale_quantity(self.quantity, factor)?,
            self.currency.clone(),
        ))
    }
}

impl std::ops::Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount::new(-self.quantity, self.currency.clone())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.currency {
            Currency::Symbol(c) => {
                write!(f, "{}", c)?;
                write_quantity(f, self.quantity)
            }
            currency => {
                write_quantity(f, self.quantity)?;
                write!(f, " {}", currency)
            }
        }
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = parse_exact(Rule::amount, s)?;
        match PostingValue::parse(token)? {
            PostingValue::Amount(amount) => Ok(amount),
            _ => Err(ParseError::at(
                pest::Position::from_start(s),
                format!("amount '{}' has no currency", s),
            )),
        }
    }
}

/// What a posting carries: an amount, a bare multiplier, or nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PostingValue {
    Amount(Amount),
    Multiplier(Decimal),
    Elided,
}

impl PostingValue {
    pub fn parse(token: Pair<'_, Rule>) -> Result<PostingValue, ParseError> {
        let span = token.as_span();
        let shape = match token.as_rule() {
            Rule::amount => next_pair(&mut token.into_inner(), &span, "amount")?,
            _ => token,
        };

        let shape_span = shape.as_span();
        let rule = shape.as_rule();
        let mut pairs = shape.into_inner();
        let value = match rule {
            Rule::symbol_amount => {
                let currency = Currency::parse(next_pair(&mut pairs, &shape_span, "currency")?)?;
                let number = next_pair(&mut pairs, &shape_span, "number")?;
                PostingValue::Amount(Amount::new(parse_number(&number)?, currency))
            }
            Rule::named_amount | Rule::long_named_amount => {
                let number = next_pair(&mut pairs, &shape_span, "number")?;
                let currency = Currency::parse(next_pair(&mut pairs, &shape_span, "currency")?)?;
                PostingValue::Amount(Amount::new(parse_number(&number)?, currency))
            }
            Rule::bare_amount => {
                let number = next_pair(&mut pairs, &shape_span, "number")?;
                PostingValue::Multiplier(parse_number(&number)?)
            }
            _ => {
                return Err(ParseError::at(
                    shape_span.start_pos(),
                    format!("unexpected token for amount: '{}'", shape_span.as_str()),
                ))
            }
        };

        Ok(value)
    }

    pub fn is_elided(&self) -> bool {
        matches!(self, PostingValue::Elided)
    }

    pub fn amount(&self) -> Option<&Amount> {
        match self {
            PostingValue::Amount(amount) => Some(amount),
            _ => None,
        }
    }
}

impl fmt::Display for PostingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostingValue::Amount(amount) => write!(f, "{}", amount),
            PostingValue::Multiplier(m) => write_quantity(f, *m),
            PostingValue::Elided => Ok(()),
        }
    }
}

impl FromStr for PostingValue {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostingValue::parse(parse_exact(Rule::amount, s)?)
    }
}

impl From<Amount> for PostingValue {
    fn from(amount: Amount) -> Self {
        PostingValue::Amount(amount)
    }
}

impl From<Decimal> for PostingValue {
    fn from(multiplier: Decimal) -> Self {
        PostingValue::Multiplier(multiplier)
    }
}
