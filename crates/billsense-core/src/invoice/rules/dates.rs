//! Date extraction for invoice text.

use chrono::NaiveDate;

use super::{ExtractionMatch, FieldExtractor};
use super::patterns::{DATE_DMY, DATE_YMD};

/// Date field extractor.
///
/// `dd.mm.yyyy` is read day-first; when that is not a valid calendar date the
/// month-first reading (`mm/dd/yyyy`) is tried with lower confidence.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// All dates in order of appearance.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        // DD.MM.YYYY or DD/MM/YYYY or DD-MM-YYYY
        for caps in DATE_DMY.captures_iter(text) {
            let first: u32 = caps[1].parse().unwrap_or(0);
            let second: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);

            let parsed = NaiveDate::from_ymd_opt(year, second, first)
                .map(|d| (d, 0.9))
                .or_else(|| NaiveDate::from_ymd_opt(year, first, second).map(|d| (d, 0.7)));

            if let (Some((date, confidence)), Some(m)) = (parsed, caps.get(0)) {
                results.push(
                    ExtractionMatch::new(date, confidence, m.as_str())
                        .with_position(m.start(), m.end()),
                );
            }
        }

        // YYYY-MM-DD or YYYY/MM/DD
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let (Some(date), Some(m)) = (NaiveDate::from_ymd_opt(year, month, day), caps.get(0)) {
                results.push(
                    ExtractionMatch::new(date, 0.95, m.as_str())
                        .with_position(m.start(), m.end()),
                );
            }
        }

        results.sort_by_key(|r| r.position.map(|(start, _)| start).unwrap_or(usize::MAX));
        results
    }
}

/// First valid date in the text, formatted as ISO `YYYY-MM-DD`.
pub fn extract_first_date(text: &str) -> Option<String> {
    DateExtractor::new()
        .extract(text)
        .map(|m| m.value.format("%Y-%m-%d").to_string())
}
