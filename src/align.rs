use libautoledger::Posting;

pub const DEFAULT_DOT_COLUMN: usize = 58;

const INDENT: &str = "    ";
const MIN_GAP: usize = 2;

/// Render `posting` indented, padding between account and amount so that
/// `dot_column` characters precede the decimal point.
///
/// Whole numbers align the position their point would take. When the account
/// is too long the gap shrinks to two spaces.
pub fn align_dot(posting: &Posting, dot_column: usize) -> String {
    let account = posting.account.as_str();
    let value = posting.value.to_string();
    if value.is_empty() {
        return format!("{}{}", INDENT, account);
    }

    pad_to_dot(&format!("{}{}", INDENT, account), &value, dot_column)
}

/// Join `lead` (indent and account) and `amount` (amount text, maybe
/// followed by a note) with the spaces that put the decimal point after
/// `dot_column` characters, never fewer than two.
pub fn pad_to_dot(lead: &str, amount: &str, dot_column: usize) -> String {
    let before_dot = lead.chars().count() + point_offset(amount);
    let gap = dot_column.saturating_sub(before_dot).max(MIN_GAP);
    format!("{}{}{}", lead, " ".repeat(gap), amount)
}

/// Characters in front of the decimal point, or in front of where it would be.
fn point_offset(value: &str) -> usize {
    let is_number = |c: char| c == '-' || c == '.' || c == ',' || c.is_ascii_digit();
    let start = value
        .find(|c: char| c == '-' || c.is_ascii_digit())
        .unwrap_or(0);
    let number = value[start..]
        .split(|c: char| !is_number(c))
        .next()
        .unwrap_or_default();
    let end = start + number.find('.').unwrap_or(number.len());
    value[..end].chars().count()
}

#[cfg(test)]
mod tests {
    use super::{align_dot, pad_to_dot, DEFAULT_DOT_COLUMN};
    use libautoledger::{Account, Posting, PostingValue};

    use anyhow::Result;

    use std::convert::TryFrom;

    fn posting(account: &str, value: &str) -> Result<Posting> {
        Ok(Posting::new(
            Account::try_from(account)?,
            value.parse::<PostingValue>()?,
        ))
    }

    fn dot_column(line: &str) -> Option<usize> {
        line.chars().position(|c| c == '.')
    }

    #[test]
    fn decimal_points_line_up() -> Result<()> {
        for (account, value) in [
            ("Assets:Savings", "300.00 EUR"),
            ("A", "€-12.50"),
            ("Expenses:Food:Restaurant", "7.25 \"Air Miles\""),
            ("X", "-0.50"),
            ("Y", "5.50 \"v1.2 points\""),
        ] {
            let line = align_dot(&posting(account, value)?, DEFAULT_DOT_COLUMN);
            assert_eq!(dot_column(&line), Some(DEFAULT_DOT_COLUMN), "{:?}", line);
        }
        Ok(())
    }

    #[test]
    fn whole_numbers_align_their_last_digit() -> Result<()> {
        let whole = align_dot(&posting("Assets:Savings", "300 EUR")?, 20);
        let fraction = align_dot(&posting("Assets:Savings", "300.00 EUR")?, 20);
        assert_eq!(whole.find(" EUR"), fraction.find('.'));
        Ok(())
    }

    #[test]
    fn source_text_keeps_separators_and_notes() {
        let line = pad_to_dot("\tAssets:Bank", "€1,000.5  ; rent", 20);
        assert_eq!(line, "\tAssets:Bank  €1,000.5  ; rent");
        let line = pad_to_dot("  A", "1,000 EUR", 10);
        assert_eq!(line.find(" EUR"), Some(10));
    }

    #[test]
    fn long_accounts_keep_two_spaces() -> Result<()> {
        let line = align_dot(&posting("Assets:Very:Long:Account:Name", "1.00 EUR")?, 10);
        assert_eq!(line, "    Assets:Very:Long:Account:Name  1.00 EUR");
        Ok(())
    }

    #[test]
    fn elided_postings_have_no_gap() -> Result<()> {
        let line = align_dot(&Posting::elided(Account::try_from("Assets:Bank")?), 40);
        assert_eq!(line, "    Assets:Bank");
        Ok(())
    }
}
