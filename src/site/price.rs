//! Price string normalization.
//!
//! Turns display prices like `$ 590.000 COP` into bare digit strings (`590000`).
//! No rounding, currency conversion, or locale handling is performed.

use super::models::NA;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₡', '₲', '₱', '₹', '₩'];

/// Normalizes a raw price string. Empty input and `N/A` yield `N/A`.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NA {
        return NA.to_string();
    }

    let without_codes = trimmed
        .split_whitespace()
        .map(strip_currency_code)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let cleaned: String =
        without_codes.chars().filter(|c| *c != '.' && !CURRENCY_SYMBOLS.contains(c)).collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        NA.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Removes a three-letter uppercase currency code glued to either end of a token.
fn strip_currency_code(token: &str) -> &str {
    if is_currency_code(token) {
        return "";
    }

    let mut token = token;
    if token.len() > 3 && token.is_char_boundary(3) {
        let (head, rest) = token.split_at(3);
        if is_currency_code(head) && !rest.starts_with(|c: char| c.is_alphabetic()) {
            token = rest;
        }
    }
    if token.len() > 3 && token.is_char_boundary(token.len() - 3) {
        let (rest, tail) = token.split_at(token.len() - 3);
        if is_currency_code(tail) && !rest.ends_with(|c: char| c.is_alphabetic()) {
            token = rest;
        }
    }
    token
}

fn is_currency_code(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_uppercase())
}
