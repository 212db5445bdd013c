//! Per-field serialization policy for table rows.
//!
//! Every row type lists its wire fields in declaration order together with
//! how the table API treats them. The table is consulted when a
//! [`TableQuery`](crate::table::TableQuery) picks its default column list
//! and when table rows are decoded, whether keyed or positional.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// Regular JSON value.
    Plain,
    /// Binary data sent as a hex string by the table API.
    Hex,
    /// Explorer-only field; never requested from or decoded out of a table.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    pub name: &'static str,
    pub encoding: FieldEncoding,
}

impl FieldPolicy {
    pub const fn plain(name: &'static str) -> Self {
        Self {
            name,
            encoding: FieldEncoding::Plain,
        }
    }

    pub const fn hex(name: &'static str) -> Self {
        Self {
            name,
            encoding: FieldEncoding::Hex,
        }
    }

    pub const fn skip(name: &'static str) -> Self {
        Self {
            name,
            encoding: FieldEncoding::Skip,
        }
    }
}

/// Encoding of `column`, `None` when the column is unknown to the table.
pub fn lookup(fields: &[FieldPolicy], column: &str) -> Option<FieldEncoding> {
    fields.iter().find(|f| f.name == column).map(|f| f.encoding)
}

/// Columns a table query requests when the caller did not choose any.
pub fn table_columns(fields: &[FieldPolicy]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|f| f.encoding != FieldEncoding::Skip)
        .map(|f| f.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::skip("baker"),
        FieldPolicy::hex("script"),
    ];

    #[test]
    fn table_columns_drop_skipped_fields() {
        assert_eq!(table_columns(FIELDS), vec!["row_id", "script"]);
    }

    #[test]
    fn lookup_reports_encoding() {
        assert_eq!(lookup(FIELDS, "script"), Some(FieldEncoding::Hex));
        assert_eq!(lookup(FIELDS, "baker"), Some(FieldEncoding::Skip));
        assert_eq!(lookup(FIELDS, "missing"), None);
    }
}
