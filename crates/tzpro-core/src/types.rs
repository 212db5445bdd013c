//! Shared vocabulary for all resource modules.
//!
//! Addresses and the various base58 hashes are kept as validated string
//! newtypes; the SDK never needs their binary form. `HexBytes` and
//! `StringList` cover the two compact encodings the indexer uses for
//! binary digests and tag lists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};

// ==============================================================================
// Address
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Ed25519,
    Secp256k1,
    P256,
    Bls12_381,
    Contract,
    SmartRollup,
    TxRollup,
}

impl AddressType {
    /// Tezos and Mavryk share the address scheme and differ only in the
    /// implicit account prefixes.
    fn from_prefix(s: &str) -> Option<Self> {
        const PREFIXES: [(&str, AddressType); 11] = [
            ("tz1", AddressType::Ed25519),
            ("tz2", AddressType::Secp256k1),
            ("tz3", AddressType::P256),
            ("tz4", AddressType::Bls12_381),
            ("mv1", AddressType::Ed25519),
            ("mv2", AddressType::Secp256k1),
            ("mv3", AddressType::P256),
            ("mv4", AddressType::Bls12_381),
            ("KT1", AddressType::Contract),
            ("sr1", AddressType::SmartRollup),
            ("txr1", AddressType::TxRollup),
        ];
        PREFIXES
            .iter()
            .find(|(prefix, _)| s.starts_with(prefix))
            .map(|(_, kind)| *kind)
    }
}

/// A base58check account, contract, or rollup address.
///
/// Only the prefix, length, and alphabet are checked; checksum validation is
/// left to the server, which rejects unknown addresses with 400/404.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `None` for the empty (zero) address.
    pub fn kind(&self) -> Option<AddressType> {
        AddressType::from_prefix(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_contract(&self) -> bool {
        self.kind() == Some(AddressType::Contract)
    }
}

impl FromStr for Address {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = AddressType::from_prefix(s).ok_or_else(|| InvalidIdentifier::new("address", s))?;
        let expected_len = if kind == AddressType::TxRollup { 37 } else { 36 };
        if s.len() != expected_len || !is_base58(s) {
            return Err(InvalidIdentifier::new("address", s));
        }
        Ok(Self(s.to_owned()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if s.is_empty() {
            return Ok(Self::default());
        }
        s.parse().map_err(de::Error::custom)
    }
}

// ==============================================================================
// Hashes
// ==============================================================================

macro_rules! base58_hash {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $len:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl FromStr for $name {
            type Err = InvalidIdentifier;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if !s.starts_with($prefix) || s.len() != $len || !is_base58(s) {
                    return Err(InvalidIdentifier::new(stringify!($name), s));
                }
                Ok(Self(s.to_owned()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
                if s.is_empty() {
                    return Ok(Self::default());
                }
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

base58_hash!(
    /// Block hash (`B...`).
    BlockHash, "B", 51
);
base58_hash!(
    /// Operation hash (`o...`).
    OpHash, "o", 51
);
base58_hash!(
    /// Hash of a Micheline expression, used for bigmap keys and global constants.
    ExprHash, "expr", 54
);
base58_hash!(ProtocolHash, "P", 51);
base58_hash!(ChainIdHash, "Net", 15);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} `{value}`")]
pub struct InvalidIdentifier {
    pub kind: &'static str,
    pub value: String,
}

impl InvalidIdentifier {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

fn is_base58(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() && !matches!(b, b'0' | b'O' | b'I' | b'l'))
}

// ==============================================================================
// Hex Bytes
// ==============================================================================

/// Binary data carried as a lowercase hex string on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s).map(Self)
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        s.parse().map_err(de::Error::custom)
    }
}

// ==============================================================================
// String List
// ==============================================================================

/// A list of tags. The server emits either a JSON array or a single
/// comma-separated string; both decode to the same list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = StringList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string array or a comma-separated string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<StringList, E> {
                Ok(StringList(
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect(),
                ))
            }

            fn visit_unit<E: de::Error>(self) -> Result<StringList, E> {
                Ok(StringList::default())
            }

            fn visit_none<E: de::Error>(self) -> Result<StringList, E> {
                Ok(StringList::default())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<StringList, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<String>()? {
                    items.push(item);
                }
                Ok(StringList(items))
            }
        }

        deserializer.deserialize_any(ListVisitor)
    }
}

// ==============================================================================
// Micheline
// ==============================================================================

/// Key of the single-entry object that marks a binary Micheline value.
pub const MICHELINE_HEX_TAG: &str = "hex";

/// A Micheline value: JSON primitives in explorer responses, packed binary
/// in hex columns of table rows.
///
/// Plain JSON, bare strings included, always decodes to [`Micheline::Json`].
/// Binary values only arise from the tagged form `{"hex": "..."}`, which the
/// table row decoder produces for hex columns and which `Binary` serializes
/// back to.
#[derive(Debug, Clone, PartialEq)]
pub enum Micheline {
    Binary(HexBytes),
    Json(serde_json::Value),
}

impl Micheline {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&HexBytes> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }

    /// The tagged wire form of a hex-encoded binary value.
    pub fn hex_tagged(encoded: String) -> serde_json::Value {
        let mut object = serde_json::Map::with_capacity(1);
        object.insert(MICHELINE_HEX_TAG.to_owned(), serde_json::Value::String(encoded));
        serde_json::Value::Object(object)
    }
}

impl Serialize for Micheline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Json(value) => value.serialize(serializer),
            Self::Binary(bytes) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(MICHELINE_HEX_TAG, bytes)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Micheline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Object(ref object) if object.len() == 1 => {
                match object.get(MICHELINE_HEX_TAG) {
                    Some(serde_json::Value::String(encoded)) => {
                        encoded.parse().map(Self::Binary).map_err(de::Error::custom)
                    }
                    _ => Ok(Self::Json(value)),
                }
            }
            value => Ok(Self::Json(value)),
        }
    }
}

// ==============================================================================
// Timestamps
// ==============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTime {
    Millis(i64),
    Text(String),
}

fn wire_time<E: de::Error>(wire: Option<WireTime>) -> Result<Option<DateTime<Utc>>, E> {
    match wire {
        None => Ok(None),
        Some(WireTime::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}"))),
        Some(WireTime::Text(s)) if s.is_empty() => Ok(None),
        Some(WireTime::Text(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| E::custom(format!("invalid timestamp `{s}`: {e}"))),
    }
}

/// Timestamps arrive as RFC 3339 text from explorer endpoints and as unix
/// milliseconds in table rows. `null` and `""` decode to the epoch.
pub fn deserialize_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let wire = Option::<WireTime>::deserialize(deserializer)?;
    Ok(wire_time(wire)?.unwrap_or_default())
}

/// Like [`deserialize_time`], keeping absence as `None`.
pub fn deserialize_opt_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let wire = Option::<WireTime>::deserialize(deserializer)?;
    wire_time(wire)
}
