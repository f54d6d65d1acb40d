//! # Indexed-Array Decoding
//!
//! List replies repeat each field with a numeric suffix (`id0`, `id1`, ...).
//! The list ends at the first index whose sentinel field is absent; there is no
//! count header.

use std::collections::BTreeMap;

use super::message::Headers;

/// One decoded list element, keyed by the unsuffixed field name.
pub type IndexedRecord = BTreeMap<String, String>;

/// Decodes an indexed list from `headers`.
///
/// `sentinel` is the field whose absence terminates the list. `fields` are the
/// other fields copied into each record when present. The sentinel itself is
/// always included in the record.
pub fn decode_indexed(headers: &Headers, sentinel: &str, fields: &[&str]) -> Vec<IndexedRecord> {
    let mut records = Vec::new();
    for i in 0.. {
        let Some(value) = headers.get(&format!("{}{}", sentinel, i)) else {
            break;
        };
        let mut record = IndexedRecord::new();
        record.insert(sentinel.to_string(), value.clone());
        for field in fields {
            if let Some(v) = headers.get(&format!("{}{}", field, i)) {
                record.insert((*field).to_string(), v.clone());
            }
        }
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn stops_at_first_missing_sentinel() {
        let h = headers(&[("id0", "1"), ("id1", "2")]);
        let items = decode_indexed(&h, "id", &[]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["id"], "2");
    }

    #[test]
    fn gap_terminates_the_list() {
        let h = headers(&[("id0", "1"), ("id2", "3"), ("name0", "A"), ("name2", "C")]);
        let items = decode_indexed(&h, "id", &["name"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "A");
    }

    #[test]
    fn missing_secondary_fields_are_omitted() {
        let h = headers(&[("time0", "100"), ("id0", "7")]);
        let items = decode_indexed(&h, "time", &["id", "problem"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], "7");
        assert!(!items[0].contains_key("problem"));
    }

    #[test]
    fn empty_headers_yield_nothing() {
        assert!(decode_indexed(&Headers::new(), "language", &[]).is_empty());
    }
}
