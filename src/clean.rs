//! Locale-tolerant cell cleaning.
//!
//! Source exports mix European ("1.234,56 €") and American ("1,234.56")
//! number formats, often in the same column. Every parser here coerces
//! failures to a safe default instead of raising; bad cells must never
//! take down a whole run.

use crate::constants::RANK_SENTINEL;

/// Fallible currency parse. `None` means the cell held something that was
/// neither empty nor a recognizable number.
pub fn try_parse_currency(raw: &str) -> Option<f64> {
    let mut text: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '€' && *c != '$' && *c != '£')
        .collect();

    if text.is_empty() {
        return Some(0.0);
    }

    match (text.find(','), text.find('.')) {
        (Some(comma), Some(dot)) => {
            if dot < comma {
                // European: "1.234,56" -> "1234.56"
                text = text.replace('.', "").replace(',', ".");
            } else {
                // American: "1,234.56" -> "1234.56"
                text = text.replace(',', "");
            }
        }
        (Some(_), None) => {
            // Decimal comma: "12,5" -> "12.5"
            text = text.replace(',', ".");
        }
        _ => {}
    }

    text.parse::<f64>().ok()
}

/// Parse a currency cell into a float.
///
/// Strips currency symbols and whitespace, then disambiguates the decimal
/// separator by position: when both `,` and `.` appear, the earlier one is
/// the thousands separator. A lone `,` is treated as a decimal comma.
/// Anything unparseable becomes `0.0`.
pub fn parse_currency(raw: &str) -> f64 {
    try_parse_currency(raw).unwrap_or(0.0)
}

/// Fallible rank parse. `None` covers unparseable text as well as zero and
/// negative values, none of which are valid ordinal positions.
pub fn try_parse_rank(raw: &str) -> Option<u32> {
    let value = raw.trim().parse::<f64>().ok()?;
    let rank = value.trunc();
    if rank >= 1.0 && rank <= u32::MAX as f64 {
        Some(rank as u32)
    } else {
        None
    }
}

/// Parse a rank cell into a positive integer.
///
/// Accepts integers and floats (truncated). Zero, negatives, and anything
/// unparseable collapse to the sentinel rank, which sorts as worst-case.
pub fn parse_rank(raw: &str) -> u32 {
    try_parse_rank(raw).unwrap_or(RANK_SENTINEL)
}
