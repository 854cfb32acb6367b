//! UTXO record parsing.
//!
//! Dataset lines carry at least six fields: `txid:index`, coinbase flag,
//! height, amount, script and address. The delimiter is not known up front,
//! so each line is tried with tab, comma and semicolon before falling back to
//! whitespace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of fields in a valid record.
pub const MIN_FIELDS: usize = 6;

/// Delimiters tried, in order, before whitespace splitting.
pub const CANDIDATE_DELIMITERS: [char; 3] = ['\t', ',', ';'];

/// Errors that can occur while parsing one record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The line split into fewer than [`MIN_FIELDS`] fields.
    #[error("Expected at least {MIN_FIELDS} fields, found {found}")]
    TooFewFields {
        /// Number of fields found
        found: usize,
    },

    /// A numeric field did not parse as an unsigned integer.
    #[error("Invalid {field} value: {value:?}")]
    InvalidNumber {
        /// Name of the field
        field: &'static str,
        /// The raw text
        value: String,
    },
}

/// Value stored for one unspent output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UtxoValue {
    /// Whether the output comes from a coinbase transaction
    pub coinbase: bool,
    /// Block height
    pub height: u64,
    /// Amount in satoshis
    pub amount: u64,
    /// Locking script
    pub script: String,
    /// Destination address
    pub address: String,
}

impl UtxoValue {
    /// Creates a new value.
    pub fn new(
        coinbase: bool,
        height: u64,
        amount: u64,
        script: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            coinbase,
            height,
            amount,
            script: script.into(),
            address: address.into(),
        }
    }
}

/// A parsed dataset line: the `txid:index` key and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoRecord {
    /// `txid:index`
    pub key: String,
    /// Output data
    pub value: UtxoValue,
}

/// Splits `line` on `delimiter`, keeping quoted runs together.
///
/// A `'` or `"` opens a run that only the same quote character closes.
/// Quote characters are kept in the output. An empty trailing field is not
/// emitted.
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                field.push(c);
            }
            Some(open) if c == open => {
                quote = None;
                field.push(c);
            }
            None if c == delimiter => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    if !field.is_empty() {
        fields.push(field);
    }
    fields
}

/// Splits `line` with the first candidate delimiter that yields at least
/// [`MIN_FIELDS`] fields, or on whitespace if none does.
pub fn sniff_fields(line: &str) -> Vec<String> {
    CANDIDATE_DELIMITERS
        .iter()
        .map(|&delimiter| split_fields(line, delimiter))
        .find(|fields| fields.len() >= MIN_FIELDS)
        .unwrap_or_else(|| line.split_whitespace().map(str::to_string).collect())
}

/// Whether `line` looks like a column header.
pub fn is_header(line: &str) -> bool {
    line.contains("txid:index") || line.contains("coinbase")
}

/// Parses a dataset line into a record.
///
/// # Errors
///
/// Returns [`RecordError`] when the line has too few fields or the height or
/// amount is not an unsigned integer.
pub fn parse_record(line: &str) -> Result<UtxoRecord, RecordError> {
    let fields = sniff_fields(line);
    parse_fields(&fields)
}

/// Builds a record from already-split fields.
pub fn parse_fields<S: AsRef<str>>(fields: &[S]) -> Result<UtxoRecord, RecordError> {
    if fields.len() < MIN_FIELDS {
        return Err(RecordError::TooFewFields {
            found: fields.len(),
        });
    }
    let field = |i: usize| fields[i].as_ref().trim();

    Ok(UtxoRecord {
        key: field(0).to_string(),
        value: UtxoValue {
            coinbase: field(1) == "1",
            height: parse_u64("height", field(2))?,
            amount: parse_u64("amount", field(3))?,
            script: field(4).to_string(),
            address: field(5).to_string(),
        },
    })
}

/// Parses an unsigned integer field.
pub fn parse_u64(field: &'static str, value: &str) -> Result<u64, RecordError> {
    value.trim().parse().map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("a\tb\tc\td\te\tf", 6 ; "tab")]
    #[test_case("a,b,c,d,e,f,g", 7 ; "comma")]
    #[test_case("a;b;c;d;e;f", 6 ; "semicolon")]
    #[test_case("a b  c d e   f", 6 ; "whitespace fallback")]
    #[test_case("a,b,c", 1 ; "too few falls back to whitespace")]
    fn test_sniff_field_count(line: &str, expected: usize) {
        assert_eq!(sniff_fields(line).len(), expected);
    }

    #[test]
    fn test_split_keeps_quoted_delimiters() {
        let fields = split_fields(r#"k,1,"OP_DUP, OP_HASH160",x"#, ',');
        assert_eq!(fields, vec!["k", "1", r#""OP_DUP, OP_HASH160""#, "x"]);

        let fields = split_fields("a,'b,\"c',d", ',');
        assert_eq!(fields, vec!["a", "'b,\"c'", "d"]);
    }

    #[test]
    fn test_split_drops_trailing_empty_field() {
        assert_eq!(split_fields("a,b,", ','), vec!["a", "b"]);
        assert_eq!(split_fields("a,,b", ','), vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_record() {
        let record = parse_record("abcd:0,1,100,5000000000,76a914,1Addr").unwrap();
        assert_eq!(record.key, "abcd:0");
        assert_eq!(
            record.value,
            UtxoValue::new(true, 100, 5_000_000_000, "76a914", "1Addr")
        );
    }

    #[test_case("k:0,0,12,34,s,a", false ; "zero")]
    #[test_case("k:0,1,12,34,s,a", true ; "one")]
    #[test_case("k:0,true,12,34,s,a", false ; "other text")]
    fn test_coinbase_flag(line: &str, coinbase: bool) {
        assert_eq!(parse_record(line).unwrap().value.coinbase, coinbase);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_record("k:0,1,2"),
            Err(RecordError::TooFewFields { found: 1 })
        );
        assert_eq!(
            parse_record("k:0,1,tall,34,s,a"),
            Err(RecordError::InvalidNumber {
                field: "height",
                value: "tall".to_string()
            })
        );
        assert!(matches!(
            parse_record("k:0\t1\t2\t-5\ts\ta"),
            Err(RecordError::InvalidNumber { field: "amount", .. })
        ));
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header("txid:index,coinbase,height,amount,script,address"));
        assert!(!is_header("ab:0,1,2,3,s,a"));
    }
}
