//! Currency-amount detection used to divert pricing passages.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `$3`, `$3,000`, `$3.25`, `$3k`, `$3 million`, `USD 300`, `usd 300.50`
    static ref MONEY: Regex = Regex::new(
        r"(?x)
        (?:\$|\b(?:USD|usd))
        \s*
        [0-9][0-9,]*
        (?:\.[0-9]+)?
        (?:\s*(?:k|K|m|M|million|billion)\b)?
        "
    )
    .expect("valid money regex");
}

/// Whether `text` contains a currency amount.
pub fn contains_money(text: &str) -> bool {
    MONEY.is_match(text)
}

/// Every currency amount in `text`, in order of appearance.
pub fn find_amounts(text: &str) -> Vec<&str> {
    MONEY.find_iter(text).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts_match() {
        for s in ["$3,000", "$3.25", "$3k", "USD 300", "usd 300.50", "$ 12 million"] {
            assert!(contains_money(s), "expected match for {:?}", s);
        }
    }

    #[test]
    fn test_plain_numbers_do_not_match() {
        for s in ["3000 widgets", "usd", "$ per unit", "section 3.2", "busd300"] {
            assert!(!contains_money(s), "unexpected match for {:?}", s);
        }
    }

    #[test]
    fn test_find_amounts() {
        let text = "not to exceed $50,000 with usd 1.5m reserved";
        assert_eq!(find_amounts(text), vec!["$50,000", "usd 1.5m"]);
    }
}
