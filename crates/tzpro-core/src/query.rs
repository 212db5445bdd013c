//! Query parameter builder shared by every resource method.
//!
//! Parameters are kept in a `BTreeMap`, so rendering is deterministic:
//! keys appear in lexicographic byte order no matter in which order they
//! were set, and values are form-urlencoded.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a column filter. `Eq` is rendered as the bare
/// column name, every other mode as `column.mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Range,
    Regexp,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "nin",
            Self::Range => "rg",
            Self::Regexp => "re",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<String, String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encoded parameters without the leading `?`.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// Append the encoded parameters to `base_path`. The path is returned
    /// unchanged when no parameter is set.
    pub fn render(&self, base_path: &str) -> String {
        if self.params.is_empty() {
            return base_path.to_owned();
        }
        format!("{base_path}?{}", self.encode())
    }

    // ========================================================================
    // Chained helpers
    // ========================================================================

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_limit(self, limit: u32) -> Self {
        self.with("limit", limit)
    }

    pub fn with_offset(self, offset: u32) -> Self {
        self.with("offset", offset)
    }

    pub fn with_cursor(self, cursor: u64) -> Self {
        self.with("cursor", cursor)
    }

    pub fn with_order(self, order: Order) -> Self {
        self.with("order", order)
    }

    pub fn with_asc(self) -> Self {
        self.with_order(Order::Asc)
    }

    pub fn with_desc(self) -> Self {
        self.with_order(Order::Desc)
    }

    pub fn with_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with("columns", join(columns))
    }

    /// Ask the server to embed address metadata.
    pub fn with_meta(self) -> Self {
        self.with("meta", 1)
    }

    /// Ask for Micheline primitives alongside decoded values.
    pub fn with_prim(self) -> Self {
        self.with("prim", 1)
    }

    /// Ask the server to unpack packed Micheline bytes.
    pub fn with_unpack(self) -> Self {
        self.with("unpack", 1)
    }

    pub fn with_verbose(self) -> Self {
        self.with("verbose", 1)
    }

    /// Query state as of a past block height.
    pub fn with_height(self, height: i64) -> Self {
        self.with("block", height)
    }

    pub fn with_filter(self, column: &str, mode: FilterMode, value: impl ToString) -> Self {
        self.with(filter_key(column, mode), value)
    }

    /// Filter with a list of values (`in`, `nin`, `rg`), comma joined.
    pub fn with_filter_list<I, S>(self, column: &str, mode: FilterMode, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with(filter_key(column, mode), join(values))
    }
}

fn filter_key(column: &str, mode: FilterMode) -> String {
    match mode {
        FilterMode::Eq => column.to_owned(),
        other => format!("{column}.{}", other.as_str()),
    }
}

fn join<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_without_params_keeps_path() {
        assert_eq!(Query::new().render("/explorer/tip"), "/explorer/tip");
    }

    #[test]
    fn render_orders_keys_lexicographically() {
        let q = Query::new().with_offset(20).with_limit(10).with_meta();
        assert_eq!(q.render("/explorer/bakers"), "/explorer/bakers?limit=10&meta=1&offset=20");
    }

    #[test]
    fn render_is_independent_of_insertion_order() {
        let a = Query::new()
            .with_cursor(42)
            .with_desc()
            .with_columns(["row_id", "address"]);
        let b = Query::new()
            .with_columns(["row_id", "address"])
            .with_desc()
            .with_cursor(42);
        assert_eq!(a, b);
        assert_eq!(a.render("/tables/contract"), b.render("/tables/contract"));
    }

    #[test]
    fn setting_a_key_twice_overwrites() {
        let mut q = Query::new().with_limit(10);
        q.set("limit", 50);
        assert_eq!(q.len(), 1);
        assert_eq!(q.get("limit"), Some("50"));
        assert_eq!(q.render("/x"), "/x?limit=50");
    }

    #[test]
    fn values_are_form_encoded() {
        let q = Query::new()
            .with_columns(["row_id", "address"])
            .with("alias", "a b&c");
        assert_eq!(q.render("/t"), "/t?alias=a+b%26c&columns=row_id%2Caddress");
    }

    #[test]
    fn filters_use_mode_suffix() {
        let q = Query::new()
            .with_filter("height", FilterMode::Gte, 100)
            .with_filter("is_active", FilterMode::Eq, true)
            .with_filter_list("address", FilterMode::In, ["tz1a", "tz1b"]);
        assert_eq!(q.get("height.gte"), Some("100"));
        assert_eq!(q.get("is_active"), Some("true"));
        assert_eq!(q.get("address.in"), Some("tz1a,tz1b"));
    }

    #[test]
    fn remove_drops_key() {
        let mut q = Query::new().with_limit(1).with_prim();
        assert_eq!(q.remove("limit"), Some("1".to_owned()));
        assert!(!q.contains("limit"));
        assert_eq!(q.render("/p"), "/p?prim=1");
    }
}
