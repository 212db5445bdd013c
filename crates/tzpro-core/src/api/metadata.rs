//! Off-chain account and contract metadata.
//!
//! The indexer merges several metadata schemas per address. Only `alias`
//! and `baker` are modelled; every other schema is kept as raw JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::CoreError;
use crate::query::Query;
use crate::types::{Address, StringList};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<AliasMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baker: Option<BakerMetadata>,
    /// Remaining schemas (`asset`, `location`, `social`, `tz16`, ...).
    #[serde(flatten)]
    pub schemas: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn alias(&self) -> Option<&AliasMetadata> {
        self.alias.as_ref()
    }

    /// Display name, if the address has an alias.
    pub fn name(&self) -> Option<&str> {
        self.alias
            .as_ref()
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty())
    }

    pub fn schema(&self, name: &str) -> Option<&serde_json::Value> {
        self.schemas.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasMetadata {
    pub name: String,
    pub kind: String,
    pub description: String,
    pub category: String,
    pub logo: String,
    pub tags: StringList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakerMetadata {
    pub status: String,
    pub fee: f64,
    pub payout_delay: bool,
    pub min_payout: f64,
    pub min_delegation: f64,
    pub non_delegatable: bool,
    pub sponsored: String,
}

pub struct MetadataApi<'a> {
    client: &'a Client,
}

impl<'a> MetadataApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Metadata for one wallet or contract. Unknown addresses fail with 404.
    pub async fn wallet(&self, address: &Address) -> Result<Metadata, CoreError> {
        self.client.get(&format!("/metadata/{address}")).await
    }

    pub async fn list(&self, params: &Query) -> Result<Vec<Metadata>, CoreError> {
        self.client.get(&params.render("/metadata")).await
    }
}
