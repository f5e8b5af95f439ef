use std::fmt::Write;

use crate::types::Record;

/// Serialize records to CSV text.
///
/// The header is the key list of the first record, written unquoted. Every
/// value is wrapped in `"` with inner quotes doubled; rows are joined with
/// CRLF and there is no trailing line break. Later records are read by the
/// first record's keys, so fields they lack export as `""`.
///
/// Returns `None` for an empty slice: there is no header to write.
#[must_use]
pub fn to_csv(records: &[&Record]) -> Option<String> {
    let first = records.first()?;
    let header: Vec<&str> = first.keys().collect();

    let mut out = header.join(",");
    for record in records {
        out.push_str("\r\n");
        for (i, key) in header.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "\"{}\"", record.get(key).replace('"', "\"\""));
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    #[test]
    fn quotes_every_value_and_doubles_inner_quotes() {
        let mut r = Record::new();
        r.insert("nome", "Ana");
        r.insert("comentario", "disse \"ok\", obrigado");
        let csv = to_csv(&[&r]).unwrap();
        assert_eq!(
            csv,
            "nome,comentario\r\n\"Ana\",\"disse \"\"ok\"\", obrigado\""
        );
    }

    #[test]
    fn header_comes_from_first_record() {
        let mut a = Record::new();
        a.insert("x", "1");
        let mut b = Record::new();
        b.insert("y", "2");
        let csv = to_csv(&[&a, &b]).unwrap();
        assert_eq!(csv, "x\r\n\"1\"\r\n\"\"");
    }

    #[test]
    fn empty_input_has_no_output() {
        assert!(to_csv(&[]).is_none());
    }

    #[test]
    fn plain_values_survive_reparse() {
        let records = parse("nome,idade,nota\nAna,31 anos,5\nBruno,,4\n");
        let refs: Vec<&Record> = records.iter().collect();
        let csv = to_csv(&refs).unwrap();
        assert_eq!(parse(&csv), records);
    }

    #[test]
    fn quoted_values_do_not_round_trip() {
        // Doubled quotes collapse on re-import: every quote toggles quoting.
        let records = parse("a\nx\n");
        let mut r = records[0].clone();
        r.insert("a", "diz \"oi\"");
        let csv = to_csv(&[&r]).unwrap();
        assert_eq!(parse(&csv)[0].get("a"), "diz oi");
    }
}
