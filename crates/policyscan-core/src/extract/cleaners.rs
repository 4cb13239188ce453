//! Per-field-kind cleanup of raw OCR text.

use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::models::record::FieldKind;

lazy_static! {
    // A run that may be an amount once OCR confusables are mapped back.
    static ref AMOUNT_CANDIDATE: Regex = Regex::new(r"[0-9OoIlSB|][0-9OoIlSB|,.]*").unwrap();

    static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b\d{1,2}[/-]\d{1,2}[/-](?:\d{4}|\d{2})\b"
    ).unwrap();

    static ref DATE_ISO: Regex = Regex::new(r"\b\d{4}-\d{1,2}-\d{1,2}\b").unwrap();

    static ref DATE_LONG: Regex = Regex::new(
        r"(?i)\b(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+(\d{1,2}),?\s+(\d{4})\b"
    ).unwrap();

    static ref POLICY_LABEL: Regex = Regex::new(
        r"(?i)^\s*policy\s*(?:number|no\.?|#)?\s*:?\s*"
    ).unwrap();

    static ref POLICY_TOKEN: Regex = Regex::new(
        r"[A-Za-z0-9](?:[A-Za-z0-9\- ]*[A-Za-z0-9])?"
    ).unwrap();
}

/// Apply the cleaner for `kind`. Unusable input gives the empty marker.
pub fn clean(kind: FieldKind, raw: &str) -> String {
    match kind {
        FieldKind::Text => clean_text(raw),
        FieldKind::PolicyNumber => clean_policy_number(raw),
        FieldKind::Name => clean_name(raw),
        FieldKind::Address => clean_address(raw),
        FieldKind::Currency => clean_currency(raw),
        FieldKind::Date => extract_date(raw),
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop closing parentheses, quotes and commas.
pub fn clean_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, ')' | '\'' | '"' | ',' | '\u{2018}' | '\u{2019}'))
        .collect();
    collapse_whitespace(&stripped)
}

pub fn clean_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .map(|c| {
            if c.is_alphabetic() || matches!(c, '.' | '\'' | '-' | ',') {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&kept)
        .trim_matches(|c: char| matches!(c, '.' | ',' | '-' | '\''))
        .to_string()
}

pub fn clean_address(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '#' | '.' | ',' | '-' | '/' | '\'') {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&kept)
        .trim_matches(|c: char| matches!(c, ',' | '-' | '/'))
        .trim()
        .to_string()
}

/// First run of letters, digits, hyphens and spaces, minus any leading label.
pub fn clean_policy_number(raw: &str) -> String {
    let raw = raw.trim();
    let unlabeled = POLICY_LABEL.replace(raw, "");
    POLICY_TOKEN
        .find(&unlabeled)
        .map(|m| collapse_whitespace(m.as_str()))
        .unwrap_or_default()
}

/// Normalize an amount to `$1,234.56`, repairing OCR confusables.
pub fn clean_currency(raw: &str) -> String {
    AMOUNT_CANDIDATE
        .find_iter(raw)
        .filter(|m| m.as_str().chars().any(|c| c.is_ascii_digit()))
        .find_map(|m| parse_amount(&unconfuse(m.as_str())))
        .map(format_amount)
        .unwrap_or_default()
}

fn unconfuse(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'l' | 'I' | '|' => '1',
            'S' => '5',
            'B' => '8',
            other => other,
        })
        .collect()
}

/// Parse a dollar amount, ignoring `$`, commas and surrounding noise.
///
/// When several dots are present only the last one is the decimal point.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let digits: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let digits = digits.trim_matches('.');
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match digits.rfind('.') {
        Some(pos) => format!("{}.{}", digits[..pos].replace('.', ""), &digits[pos + 1..]),
        None => digits.to_string(),
    };
    Decimal::from_str(&normalized).ok()
}

/// Format as `$1,234.56`.
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (integer, fraction) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let (sign, integer) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };

    let chars: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}${}.{}", sign, grouped, fraction)
}

/// First date found, trying numeric, ISO, then month-name forms.
///
/// Month-name dates are normalized to `Aug 21, 2024`.
pub fn extract_date(raw: &str) -> String {
    if let Some(m) = DATE_NUMERIC.find(raw) {
        return m.as_str().to_string();
    }
    if let Some(m) = DATE_ISO.find(raw) {
        return m.as_str().to_string();
    }
    if let Some(caps) = DATE_LONG.captures(raw) {
        let month: String = caps[1].chars().take(3).collect();
        let mut month_chars = month.chars();
        let month = match month_chars.next() {
            Some(first) => first.to_uppercase().chain(month_chars.flat_map(char::to_lowercase)).collect(),
            None => month,
        };
        return format!("{} {}, {}", month, &caps[2], &caps[3]);
    }
    String::new()
}
