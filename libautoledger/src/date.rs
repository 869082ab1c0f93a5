use crate::error::ParseError;
use crate::parser::{next_pair, unexpected, Rule};

use chrono::NaiveDate;
use pest::iterators::Pair;
use serde::Serialize;

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DateOrder {
    /// `YYYY/MM/DD` or `YYYY-MM-DD`
    YearFirst,
    /// `DD/MM/YYYY` or `DD-MM-YYYY`
    DayFirst,
}

/// A transaction date exactly as written in the journal.
///
/// The digits are kept without calendar validation, so `2021/13/45` is a
/// valid `JournalDate`; use [`JournalDate::to_naive_date`] to check it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JournalDate {
    text: String,
    order: DateOrder,
    year: u16,
    month: u8,
    day: u8,
}

fn digits<T: std::str::FromStr>(token: &Pair<'_, Rule>) -> Result<T, ParseError> {
    token.as_str().parse::<T>().map_err(|_| unexpected(token))
}

impl JournalDate {
    pub fn parse(token: Pair<'_, Rule>) -> Result<JournalDate, ParseError> {
        let span = token.as_span();
        let token = match token.as_rule() {
            Rule::aux_date => next_pair(&mut token.into_inner(), &span, "date")?,
            _ => token,
        };
        if token.as_rule() != Rule::date {
            return Err(unexpected(&token));
        }

        let text = token.as_str().to_string();
        let span = token.as_span();
        let shape = next_pair(&mut token.into_inner(), &span, "date shape")?;
        let order = match shape.as_rule() {
            Rule::iso_date => DateOrder::YearFirst,
            Rule::dmy_date => DateOrder::DayFirst,
            _ => return Err(unexpected(&shape)),
        };

        let shape_span = shape.as_span();
        let mut parts = shape.into_inner();
        let first = next_pair(&mut parts, &shape_span, "date part")?;
        let second = next_pair(&mut parts, &shape_span, "date part")?;
        let third = next_pair(&mut parts, &shape_span, "date part")?;
        let (year, month, day) = match order {
            DateOrder::YearFirst => (digits(&first)?, digits(&second)?, digits(&third)?),
            DateOrder::DayFirst => (digits(&third)?, digits(&second)?, digits(&first)?),
        };

        Ok(JournalDate {
            text,
            order,
            year,
            month,
            day,
        })
    }

    pub fn order(&self) -> DateOrder {
        self.order
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// The calendar date, or `None` when the digits name no real day.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year.into(), self.month.into(), self.day.into())
    }
}

impl fmt::Display for JournalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use crate::date::{DateOrder, JournalDate};
    use crate::parser::{LedgerParser, Rule};
    use chrono::NaiveDate;
    use pest::Parser;

    use anyhow::Result;

    fn date(input: &str) -> Result<JournalDate> {
        let mut tokens = LedgerParser::parse(Rule::date, input)?;
        Ok(JournalDate::parse(tokens.next().unwrap())?)
    }

    #[test]
    fn parse_year_first() -> Result<()> {
        let d = date("2021-03-09")?;
        assert_eq!(d.order(), DateOrder::YearFirst);
        assert_eq!((d.year(), d.month(), d.day()), (2021, 3, 9));
        assert_eq!(d.to_naive_date(), NaiveDate::from_ymd_opt(2021, 3, 9));
        assert_eq!(d.to_string(), "2021-03-09");
        Ok(())
    }

    #[test]
    fn parse_day_first() -> Result<()> {
        let d = date("09/03/2021")?;
        assert_eq!(d.order(), DateOrder::DayFirst);
        assert_eq!((d.year(), d.month(), d.day()), (2021, 3, 9));
        assert_eq!(d.to_string(), "09/03/2021");
        Ok(())
    }

    #[test]
    fn impossible_dates_pass_through() -> Result<()> {
        let d = date("2021/13/32")?;
        assert_eq!((d.month(), d.day()), (13, 32));
        assert_eq!(d.to_naive_date(), None);
        Ok(())
    }

    #[test]
    fn parse_aux_date() -> Result<()> {
        let mut tokens = LedgerParser::parse(Rule::aux_date, "2021/03/10")?;
        let d = JournalDate::parse(tokens.next().unwrap())?;
        assert_eq!(d.day(), 10);
        Ok(())
    }
}
