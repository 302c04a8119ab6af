//! Total amount and currency extraction.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::{ExtractionMatch, FieldExtractor};
use super::patterns::{CURRENCY_CODE, CURRENCY_SYMBOL, LABELED_TOTAL};

/// A labeled total with the currency found next to it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalAmount {
    pub amount: Decimal,
    pub currency: Option<String>,
}

/// Extractor for "Total: ..." / "Amount due: ..." figures.
pub struct TotalExtractor;

impl TotalExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TotalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TotalExtractor {
    type Output = ExtractionMatch<TotalAmount>;

    /// Prefers an "amount due" figure over a plain "total".
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let all = self.extract_all(text);
        let due = all
            .iter()
            .position(|m| m.source.to_lowercase().starts_with("amount due"));
        match due {
            Some(idx) => all.into_iter().nth(idx),
            None => all.into_iter().last(),
        }
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        LABELED_TOTAL
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let amount = parse_amount(&caps[2])?;
                let currency = caps.get(3).map(|c| c.as_str().to_uppercase());
                Some(
                    ExtractionMatch::new(TotalAmount { amount, currency }, 0.8, full.as_str())
                        .with_position(full.start(), full.end()),
                )
            })
            .collect()
    }
}

/// Extract the most likely payable total from text.
///
/// When the total carries no currency code, the first code or symbol anywhere
/// in the text is used.
pub fn extract_total(text: &str) -> Option<TotalAmount> {
    let mut total = TotalExtractor::new().extract(text)?.value;
    if total.currency.is_none() {
        total.currency = detect_currency(text);
    }
    Some(total)
}

/// First currency code or symbol in the text, as an ISO code.
pub fn detect_currency(text: &str) -> Option<String> {
    if let Some(caps) = CURRENCY_CODE.captures(text) {
        return Some(caps[1].to_string());
    }
    CURRENCY_SYMBOL.find(text).map(|m| {
        match m.as_str() {
            "€" => "EUR",
            "£" => "GBP",
            _ => "USD",
        }
        .to_string()
    })
}

/// Parse an amount with optional grouping separators
/// (e.g., "1,999.99", "1 234,56", "1.500").
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == ',' || c == '.');

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Both present: whichever comes last is the decimal separator
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) if is_grouping(cleaned, ',', c) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(d)) if is_grouping(cleaned, '.', d) => cleaned.replace('.', ""),
        _ => cleaned.to_string(),
    };

    Decimal::from_str(&normalized).ok()
}

/// A lone separator followed by exactly three digits, or a repeated
/// separator, groups thousands.
fn is_grouping(s: &str, sep: char, last: usize) -> bool {
    s.matches(sep).count() > 1 || s.len() - last - 1 == 3
}
