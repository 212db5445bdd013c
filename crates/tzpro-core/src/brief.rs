//! Positional ("brief") JSON decoding.
//!
//! Table endpoints and a few status payloads send rows as flat arrays whose
//! meaning is given by an externally supplied column list. The helpers here
//! walk such arrays without losing byte positions, so every failure carries
//! the offset of the offending value in the response body.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::policy::{self, FieldEncoding, FieldPolicy};
use crate::types::Micheline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Empty body, whitespace only, or `null`.
    Empty,
    Object,
    Array,
}

/// Interpret a response body as UTF-8, locating the first invalid byte.
pub fn body_str(raw: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(raw)
        .map_err(|e| DecodeError::new(e.valid_up_to(), "response body is not valid UTF-8"))
}

/// Classify a payload by its first significant byte.
pub fn shape(text: &str) -> Result<Shape, DecodeError> {
    let trimmed = text.trim_start();
    let offset = text.len() - trimmed.len();
    match trimmed.as_bytes().first() {
        None => Ok(Shape::Empty),
        Some(b'{') => Ok(Shape::Object),
        Some(b'[') => Ok(Shape::Array),
        Some(b'n') if trimmed.trim_end() == "null" => Ok(Shape::Empty),
        Some(&b) => Err(DecodeError::new(
            offset,
            format!("unexpected leading byte {:?}", b as char),
        )),
    }
}

/// Byte position of `inner` within `outer`; `inner` must be a subslice.
fn position(outer: &str, inner: &str) -> usize {
    (inner.as_ptr() as usize).saturating_sub(outer.as_ptr() as usize)
}

/// Visit the non-null values of a positional array alongside their column
/// names. Extra values beyond the column list and missing trailing values
/// are ignored. `base` is the offset of `text` within the response body.
pub fn for_each_column<S, F>(
    text: &str,
    base: usize,
    columns: &[S],
    mut visit: F,
) -> Result<(), DecodeError>
where
    S: AsRef<str>,
    F: FnMut(&str, &RawValue, usize) -> Result<(), DecodeError>,
{
    let values: Vec<&RawValue> =
        serde_json::from_str(text).map_err(|e| DecodeError::from_json(text, base, &e))?;

    for (column, value) in columns.iter().zip(values) {
        if value.get() == "null" {
            continue;
        }
        let offset = base + position(text, value.get());
        visit(column.as_ref(), value, offset)?;
    }
    Ok(())
}

/// Parse a single positional value into `T`, reporting errors at the
/// value's offset.
pub fn parse_value<T: DeserializeOwned>(value: &RawValue, offset: usize) -> Result<T, DecodeError> {
    serde_json::from_str(value.get()).map_err(|e| DecodeError::from_json(value.get(), offset, &e))
}

/// Decode a keyed object located at `base` in the body.
pub fn decode_object<T: DeserializeOwned>(text: &str, base: usize) -> Result<T, DecodeError> {
    serde_json::from_str(text).map_err(|e| DecodeError::from_json(text, base, &e))
}

/// Copy one wire column into the keyed object a row decodes from.
///
/// Skipped columns are dropped and hex columns must carry a valid hex
/// string, which is tagged so it decodes as binary Micheline. Unknown
/// columns are kept when `keep_unknown` is set.
fn put_column(
    object: &mut Map<String, Value>,
    fields: &[FieldPolicy],
    column: &str,
    value: &RawValue,
    offset: usize,
    keep_unknown: bool,
) -> Result<(), DecodeError> {
    match policy::lookup(fields, column) {
        Some(FieldEncoding::Skip) => {}
        None if !keep_unknown => {}
        None | Some(FieldEncoding::Plain) => {
            object.insert(column.to_owned(), parse_value::<Value>(value, offset)?);
        }
        Some(FieldEncoding::Hex) => {
            let encoded: String = parse_value(value, offset)?;
            if let Err(e) = hex::decode(&encoded) {
                return Err(DecodeError::new(offset, format!("column {column}: {e}")));
            }
            object.insert(column.to_owned(), Micheline::hex_tagged(encoded));
        }
    }
    Ok(())
}

fn finish_row<T: DeserializeOwned>(object: Map<String, Value>, base: usize) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| DecodeError::new(base, format!("table row: {e}")))
}

/// Decode one positional row into `T` by rebuilding the keyed object the
/// row stands for, consulting the field policy of `T`.
///
/// Unknown and skipped columns are dropped; `null` values are left out so
/// `#[serde(default)]` fields keep their zero value.
pub fn decode_row<T, S>(
    text: &str,
    base: usize,
    columns: &[S],
    fields: &[FieldPolicy],
) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
    S: AsRef<str>,
{
    let mut object = Map::with_capacity(columns.len());
    for_each_column(text, base, columns, |column, value, offset| {
        put_column(&mut object, fields, column, value, offset, false)
    })?;
    finish_row(object, base)
}

/// Decode one keyed table row into `T` under the same field policy as a
/// positional row, so both wire forms of a row decode alike.
pub fn decode_keyed_row<T: DeserializeOwned>(
    text: &str,
    base: usize,
    fields: &[FieldPolicy],
) -> Result<T, DecodeError> {
    let entries: BTreeMap<String, &RawValue> =
        serde_json::from_str(text).map_err(|e| DecodeError::from_json(text, base, &e))?;

    let mut object = Map::with_capacity(entries.len());
    for (column, value) in entries {
        if value.get() == "null" {
            continue;
        }
        let offset = base + position(text, value.get());
        put_column(&mut object, fields, &column, value, offset, true)?;
    }
    finish_row(object, base)
}

/// Decode a JSON array of rows. Each row may be a keyed object or a
/// positional array described by `columns`.
pub fn decode_rows<T, S>(
    raw: &[u8],
    columns: &[S],
    fields: &[FieldPolicy],
) -> Result<Vec<T>, DecodeError>
where
    T: DeserializeOwned,
    S: AsRef<str>,
{
    let text = body_str(raw)?;
    match shape(text)? {
        Shape::Empty => return Ok(Vec::new()),
        Shape::Object => {
            let offset = text.len() - text.trim_start().len();
            return Err(DecodeError::new(offset, "expected an array of rows, found an object"));
        }
        Shape::Array => {}
    }

    let rows: Vec<&RawValue> =
        serde_json::from_str(text).map_err(|e| DecodeError::from_json(text, 0, &e))?;

    rows.into_iter()
        .map(|row| {
            let row_text = row.get();
            let offset = position(text, row_text);
            match shape(row_text).map_err(|e| DecodeError::new(offset + e.offset, e.message))? {
                Shape::Array => decode_row(row_text, offset, columns, fields),
                Shape::Object => decode_keyed_row(row_text, offset, fields),
                Shape::Empty => Err(DecodeError::new(offset, "null row")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Row {
        row_id: u64,
        height: i64,
        address: String,
        code: Option<Micheline>,
        baker: String,
    }

    const FIELDS: &[FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("height"),
        FieldPolicy::plain("address"),
        FieldPolicy::hex("code"),
        FieldPolicy::skip("baker"),
    ];

    #[test]
    fn shape_classifies_leading_byte() {
        assert_eq!(shape("").expect("empty"), Shape::Empty);
        assert_eq!(shape("  null ").expect("null"), Shape::Empty);
        assert_eq!(shape(" {}").expect("object"), Shape::Object);
        assert_eq!(shape("\n[1]").expect("array"), Shape::Array);

        let err = shape("  42").expect_err("number is not accepted");
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn columns_map_positions_and_skip_nulls() {
        let mut seen = Vec::new();
        for_each_column(r#"["a", null, 3]"#, 0, &["x", "y", "z", "w"], |c, v, off| {
            seen.push((c.to_owned(), v.get().to_owned(), off));
            Ok(())
        })
        .expect("valid array");
        assert_eq!(
            seen,
            vec![("x".to_owned(), r#""a""#.to_owned(), 1), ("z".to_owned(), "3".to_owned(), 12)]
        );
    }

    #[test]
    fn positional_row_matches_keyed_row() {
        let cols = ["row_id", "height", "address", "code", "baker"];
        let brief: Row =
            decode_row(r#"[7, 9007199254740993, "tz1x", "beef", "tz1y"]"#, 0, &cols, FIELDS)
                .expect("positional row");
        let keyed: Row = decode_keyed_row(
            r#"{"row_id":7,"height":9007199254740993,"address":"tz1x","code":"beef","baker":"tz1y"}"#,
            0,
            FIELDS,
        )
        .expect("keyed row");
        assert_eq!(brief, keyed);
        assert_eq!(brief.height, 9_007_199_254_740_993);
        assert!(keyed.baker.is_empty());
        assert_eq!(
            keyed.code.as_ref().and_then(Micheline::as_binary).map(|b| b.as_bytes()),
            Some(&[0xbe, 0xef][..])
        );
    }

    #[test]
    fn keyed_row_checks_hex_columns() {
        let body = r#"{"row_id":1, "code":"zz"}"#;
        let err = decode_keyed_row::<Row>(body, 50, FIELDS).expect_err("invalid hex");
        assert_eq!(err.offset, 50 + body.find(r#""zz""#).expect("value position"));

        let row: Row = decode_keyed_row(r#"{"row_id":2,"code":null,"extra":true}"#, 0, FIELDS)
            .expect("null hex column and unknown key");
        assert_eq!(row.row_id, 2);
        assert!(row.code.is_none());
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let row: Row = decode_row(r#"[1, "extra"]"#, 0, &["row_id", "unknown"], FIELDS)
            .expect("unknown column ignored");
        assert_eq!(row.row_id, 1);
    }

    #[test]
    fn invalid_hex_column_reports_offset() {
        let err = decode_row::<Row, _>(r#"[1, "zz"]"#, 100, &["row_id", "code"], FIELDS)
            .expect_err("invalid hex");
        assert_eq!(err.offset, 104);
    }

    #[test]
    fn rows_may_mix_objects_and_arrays() {
        let body = br#"[{"row_id":1,"height":10,"baker":"tz1y"},[2,20,"tz1y"]]"#;
        let rows: Vec<Row> =
            decode_rows(body, &["row_id", "height", "baker"], FIELDS).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].height, 10);
        assert_eq!(rows[1].row_id, 2);
        assert!(rows.iter().all(|r| r.baker.is_empty()));
    }

    #[test]
    fn rows_reject_object_body() {
        let err = decode_rows::<Row, &str>(b" {}", &[], FIELDS).expect_err("object body");
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn empty_body_yields_no_rows() {
        let rows: Vec<Row> = decode_rows(b"null", &["row_id"], FIELDS).expect("null body");
        assert!(rows.is_empty());
    }
}
