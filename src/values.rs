//! Transient readings of string cells. Nothing here fails: a value that
//! does not read as a number or date yields `None`.

use std::cmp::Ordering;

use chrono::NaiveDate;

/// First run of one to three ASCII digits, e.g. `"31 anos"` → 31.
/// Longer runs are cut after three digits.
#[must_use]
pub fn first_number(value: &str) -> Option<u32> {
    let bytes = value.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let len = bytes[start..]
        .iter()
        .take(3)
        .take_while(|b| b.is_ascii_digit())
        .count();
    value[start..start + len].parse().ok()
}

/// Integer prefix: leading whitespace, optional sign, then digits.
/// `"5 - Excelente"` → 5, `"nota"` → `None`.
#[must_use]
pub fn parse_int_prefix(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let n: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -n } else { n })
}

/// Whole-value numeric reading used for sorting. A blank cell reads as 0;
/// `Infinity` is accepted but `inf` and `NaN` are not.
#[must_use]
pub fn sort_number(value: &str) -> Option<f64> {
    let s = value.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    s.parse().ok()
}

/// First `YYYY/MM/DD` in the value, e.g. from
/// `"2025/08/04 10:02:03 da manhã GMT-3"`. Only the first well-shaped
/// window counts: if it is not a real date, the result is `None`.
#[must_use]
pub fn extract_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    if bytes.len() < 10 {
        return None;
    }
    let start = (0..=bytes.len() - 10).find(|&i| {
        bytes[i..i + 10].iter().enumerate().all(|(j, b)| match j {
            4 | 7 => *b == b'/',
            _ => b.is_ascii_digit(),
        })
    })?;
    // Shape matched, so the window is ASCII.
    NaiveDate::parse_from_str(&value[start..start + 10], "%Y/%m/%d").ok()
}

/// Locale-style string ordering: letters first ignoring accents and case,
/// then accents, then case with lowercase first. Raw text breaks any
/// remaining tie so the order stays total.
#[must_use]
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(fold_char)
        .cmp(b.chars().flat_map(fold_char))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

fn fold_char(c: char) -> impl Iterator<Item = char> {
    let base = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        other => other,
    };
    base.to_lowercase()
}
