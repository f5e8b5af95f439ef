//! Survey CSV parser.
//!
//! Lenient by construction: parsing never fails. Blank lines are dropped,
//! short rows are padded with empty values, extra cells are ignored.

use tracing::debug;

use crate::types::Record;

/// Parse survey CSV text into records keyed by the header line.
///
/// Returns one record per non-blank line after the header. Empty or
/// blank-only input yields no records.
#[must_use]
pub fn parse(text: &str) -> Vec<Record> {
    let mut lines = split_lines(text).filter(|l| !l.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let header: Vec<String> = split_header(strip_row_prefix(header_line))
        .into_iter()
        .map(|h| strip_quotes(h).trim().to_string())
        .collect();

    let records: Vec<Record> = lines
        .map(|line| {
            let parts = split_fields(strip_row_prefix(line));
            let mut record = Record::new();
            for (i, key) in header.iter().enumerate() {
                let raw = parts.get(i).map_or("", String::as_str);
                record.insert(key.as_str(), strip_quotes(raw).trim());
            }
            record
        })
        .collect();

    debug!(columns = header.len(), rows = records.len(), "parsed csv");
    records
}

/// Split on LF, dropping a CR that immediately precedes it.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let buf = text.as_bytes();
    let mut start = 0;
    let ends = memchr::memchr_iter(b'\n', buf)
        .map(Some)
        .chain(std::iter::once(None));
    ends.map(move |end| {
        let end = end.unwrap_or(buf.len());
        let line = &text[start..end];
        start = (end + 1).min(buf.len());
        line.strip_suffix('\r').unwrap_or(line)
    })
}

/// Remove a leading `<digits>|` row marker, if present.
pub(crate) fn strip_row_prefix(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && line.as_bytes().get(digits) == Some(&b'|') {
        &line[digits + 1..]
    } else {
        line
    }
}

/// Strip one leading and one trailing `"`, nothing more.
pub(crate) fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

/// Header split: a comma separates tokens only when the rest of the line
/// after it holds an even number of quotes.
fn split_header(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    // quotes_after[i] = number of '"' in bytes[i..]
    let mut quotes_after = vec![0usize; bytes.len() + 1];
    for i in (0..bytes.len()).rev() {
        quotes_after[i] = quotes_after[i + 1] + usize::from(bytes[i] == b'"');
    }

    let mut tokens = Vec::new();
    let mut start = 0;
    for pos in memchr::memchr_iter(b',', bytes) {
        if quotes_after[pos + 1] % 2 == 0 {
            tokens.push(&line[start..pos]);
            start = pos + 1;
        }
    }
    tokens.push(&line[start..]);
    tokens
}

/// Data line split: every `"` toggles quoting and is dropped, commas
/// outside quotes end a field. Doubled quotes are not un-escaped.
fn split_fields(line: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_record_per_data_line() {
        let text = "a,b\n1,2\n\n3,4\r\n   \n5,6\n";
        let records = parse(text);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].get("a"), "5");
        assert_eq!(records[1].get("b"), "4");
    }

    #[test]
    fn quoted_comma_is_one_value() {
        let records = parse("name,comment\nAna,\"a,b\"\n");
        assert_eq!(records[0].get("comment"), "a,b");
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn numeric_prefix_is_stripped() {
        let plain = parse("h1,h2\nval1,val2\n");
        let prefixed = parse("1|h1,h2\n5|val1,val2\n");
        assert_eq!(plain, prefixed);
    }

    #[test]
    fn prefix_needs_digits_and_pipe() {
        assert_eq!(strip_row_prefix("12|x"), "x");
        assert_eq!(strip_row_prefix("|x"), "|x");
        assert_eq!(strip_row_prefix("12x|y"), "12x|y");
        assert_eq!(strip_row_prefix("a1|y"), "a1|y");
    }

    #[test]
    fn header_tokens_are_unquoted_and_trimmed() {
        let records = parse("\"Carimbo\",\"1. Nome, completo\", Idade \nx,y,z\n");
        let keys: Vec<&str> = records[0].keys().collect();
        assert_eq!(keys, ["Carimbo", "1. Nome, completo", "Idade"]);
    }

    #[test]
    fn short_rows_pad_with_empty_values() {
        let records = parse("a,b,c\n1\n");
        assert_eq!(records[0].get("a"), "1");
        assert_eq!(records[0].get("b"), "");
        assert_eq!(records[0].get("c"), "");
        assert_eq!(records[0].len(), 3);
    }

    #[test]
    fn extra_cells_are_ignored() {
        let records = parse("a\n1,2,3\n");
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0].get("a"), "1");
    }

    #[test]
    fn doubled_quotes_are_not_unescaped() {
        // Each quote toggles quoting, so the pair simply disappears.
        let records = parse("a\n\"say \"\"hi\"\"\"\n");
        assert_eq!(records[0].get("a"), "say hi");
    }

    #[test]
    fn values_are_trimmed() {
        let records = parse("a,b\n  x  , \" y \" \n");
        assert_eq!(records[0].get("a"), "x");
        assert_eq!(records[0].get("b"), "y");
    }

    #[test]
    fn degenerate_inputs() {
        assert!(parse("").is_empty());
        assert!(parse("\n\r\n  \n").is_empty());
        assert!(parse("only,header\n").is_empty());
    }

    #[test]
    fn lone_cr_is_not_a_line_break() {
        let records = parse("a\nx\ry\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), "x\ry");
    }
}
