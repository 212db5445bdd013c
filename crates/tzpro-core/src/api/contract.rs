//! Smart contracts, global constants, bigmaps, events, and tickets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::CoreError;
use crate::policy::FieldPolicy;
use crate::query::Query;
use crate::table::{TableQuery, TableRow};
use crate::types::{
    deserialize_time, Address, BlockHash, ExprHash, HexBytes, Micheline, OpHash, StringList,
};

use super::metadata::Metadata;
use super::op::OpList;

// ==============================================================================
// Contract
// ==============================================================================

pub type ContractList = Vec<Contract>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contract {
    pub row_id: u64,
    pub account_id: u64,
    pub address: Address,
    pub creator_id: u64,
    pub creator: Address,
    pub baker_id: u64,
    pub baker: Address,
    pub first_seen: i64,
    pub last_seen: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub first_seen_time: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_time")]
    pub last_seen_time: DateTime<Utc>,
    pub storage_size: i64,
    pub storage_paid: i64,
    pub total_fees_used: f64,
    /// Hex-encoded binary in table rows, Micheline JSON from the explorer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<Micheline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Micheline>,
    #[serde(rename = "iface_hash")]
    pub interface_hash: HexBytes,
    pub code_hash: HexBytes,
    pub storage_hash: HexBytes,
    pub features: StringList,
    pub interfaces: StringList,
    pub call_stats: BTreeMap<String, i64>,
    pub n_calls_in: i64,
    pub n_calls_out: i64,
    pub n_calls_failed: i64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bigmaps: BTreeMap<String, i64>,
    /// Metadata keyed by address, embedded with `?meta=1`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Metadata>,
}

impl Contract {
    /// Metadata of the contract's own address, inserted empty when the
    /// response carried none.
    pub fn meta(&mut self) -> &mut Metadata {
        let address = &self.address;
        self.metadata
            .entry(address.to_string())
            .or_insert_with(|| Metadata::new(address.clone()))
    }

    pub fn bigmap_id(&self, name: &str) -> Option<i64> {
        self.bigmaps.get(name).copied()
    }
}

impl TableRow for Contract {
    const TABLE: &'static str = "contract";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("account_id"),
        FieldPolicy::plain("address"),
        FieldPolicy::plain("creator_id"),
        FieldPolicy::plain("creator"),
        FieldPolicy::skip("baker_id"),
        FieldPolicy::skip("baker"),
        FieldPolicy::plain("first_seen"),
        FieldPolicy::plain("last_seen"),
        FieldPolicy::plain("first_seen_time"),
        FieldPolicy::plain("last_seen_time"),
        FieldPolicy::plain("storage_size"),
        FieldPolicy::plain("storage_paid"),
        FieldPolicy::skip("total_fees_used"),
        FieldPolicy::hex("script"),
        FieldPolicy::hex("storage"),
        FieldPolicy::plain("iface_hash"),
        FieldPolicy::plain("code_hash"),
        FieldPolicy::plain("storage_hash"),
        FieldPolicy::plain("features"),
        FieldPolicy::plain("interfaces"),
        FieldPolicy::skip("call_stats"),
        FieldPolicy::skip("n_calls_in"),
        FieldPolicy::skip("n_calls_out"),
        FieldPolicy::skip("n_calls_failed"),
        FieldPolicy::skip("bigmaps"),
        FieldPolicy::skip("metadata"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

/// Code, storage type, entrypoints, and views of a contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractScript {
    pub script: Option<serde_json::Value>,
    pub storage_type: Option<serde_json::Value>,
    pub entrypoints: BTreeMap<String, serde_json::Value>,
    pub views: BTreeMap<String, serde_json::Value>,
    pub bigmaps: BTreeMap<String, i64>,
}

/// Current contract storage, decoded; `prim` is set with `?prim=1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractValue {
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prim: Option<serde_json::Value>,
}

// ==============================================================================
// Global Constants & Events
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constant {
    pub row_id: u64,
    pub address: ExprHash,
    pub creator_id: u64,
    pub creator: Address,
    pub height: i64,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub storage_size: i64,
    pub value: Option<Micheline>,
    pub features: StringList,
}

impl TableRow for Constant {
    const TABLE: &'static str = "constant";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("address"),
        FieldPolicy::plain("creator_id"),
        FieldPolicy::plain("creator"),
        FieldPolicy::plain("height"),
        FieldPolicy::skip("time"),
        FieldPolicy::plain("storage_size"),
        FieldPolicy::hex("value"),
        FieldPolicy::plain("features"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

/// A contract event emitted with the `EMIT` instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub row_id: u64,
    pub account_id: u64,
    pub contract: Address,
    #[serde(rename = "type")]
    pub kind: Option<Micheline>,
    pub payload: Option<Micheline>,
    pub tag: String,
    pub type_hash: HexBytes,
    pub tag_hash: HexBytes,
    pub op_id: u64,
    pub height: i64,
}

impl TableRow for Event {
    const TABLE: &'static str = "event";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("account_id"),
        FieldPolicy::plain("contract"),
        FieldPolicy::hex("type"),
        FieldPolicy::hex("payload"),
        FieldPolicy::plain("tag"),
        FieldPolicy::plain("type_hash"),
        FieldPolicy::plain("tag_hash"),
        FieldPolicy::plain("op_id"),
        FieldPolicy::plain("height"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

// ==============================================================================
// Bigmaps
// ==============================================================================

pub type BigmapValueList = Vec<BigmapValue>;
pub type BigmapUpdateList = Vec<BigmapUpdate>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bigmap {
    pub row_id: u64,
    pub contract: Address,
    pub account_id: u64,
    pub bigmap_id: i64,
    pub n_updates: i64,
    pub n_keys: i64,
    pub alloc_height: i64,
    pub alloc_block: BlockHash,
    #[serde(deserialize_with = "deserialize_time")]
    pub alloc_time: DateTime<Utc>,
    pub update_height: i64,
    pub update_block: BlockHash,
    #[serde(deserialize_with = "deserialize_time")]
    pub update_time: DateTime<Utc>,
    pub delete_height: i64,
    pub key_type: Option<Micheline>,
    pub value_type: Option<Micheline>,
}

impl TableRow for Bigmap {
    const TABLE: &'static str = "bigmaps";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("contract"),
        FieldPolicy::plain("account_id"),
        FieldPolicy::plain("bigmap_id"),
        FieldPolicy::plain("n_updates"),
        FieldPolicy::plain("n_keys"),
        FieldPolicy::plain("alloc_height"),
        FieldPolicy::skip("alloc_block"),
        FieldPolicy::skip("alloc_time"),
        FieldPolicy::plain("update_height"),
        FieldPolicy::skip("update_block"),
        FieldPolicy::skip("update_time"),
        FieldPolicy::plain("delete_height"),
        FieldPolicy::hex("key_type"),
        FieldPolicy::hex("value_type"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigmapValue {
    pub row_id: u64,
    pub bigmap_id: i64,
    pub height: i64,
    pub key_id: u64,
    /// Expression hash of the key.
    #[serde(alias = "hash")]
    pub key_hash: ExprHash,
    pub key: Option<Micheline>,
    pub value: Option<Micheline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BigmapMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prim: Option<serde_json::Value>,
}

impl TableRow for BigmapValue {
    const TABLE: &'static str = "bigmap_values";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("bigmap_id"),
        FieldPolicy::plain("height"),
        FieldPolicy::plain("key_id"),
        FieldPolicy::plain("hash"),
        FieldPolicy::hex("key"),
        FieldPolicy::hex("value"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

/// Provenance of a bigmap value or update, embedded by the explorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigmapMeta {
    pub contract: Address,
    pub bigmap_id: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub time: DateTime<Utc>,
    pub height: i64,
    pub update_op: OpHash,
    pub sender: Address,
    pub source: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BigmapUpdate {
    pub row_id: u64,
    pub bigmap_id: i64,
    /// `update`, `remove`, `alloc`, or `copy`.
    pub action: String,
    #[serde(alias = "hash")]
    pub key_hash: ExprHash,
    pub key: Option<Micheline>,
    pub value: Option<Micheline>,
    pub key_id: u64,
    pub height: i64,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub op_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BigmapMeta>,
}

impl TableRow for BigmapUpdate {
    const TABLE: &'static str = "bigmap_updates";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("bigmap_id"),
        FieldPolicy::plain("action"),
        FieldPolicy::plain("hash"),
        FieldPolicy::hex("key"),
        FieldPolicy::hex("value"),
        FieldPolicy::plain("key_id"),
        FieldPolicy::plain("height"),
        FieldPolicy::plain("time"),
        FieldPolicy::plain("op_id"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

// ==============================================================================
// Tickets
// ==============================================================================

// Ticket amounts are unbounded naturals and stay decimal strings.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ticket {
    pub id: u64,
    pub ticketer: Address,
    #[serde(rename = "type")]
    pub kind: serde_json::Value,
    pub content: serde_json::Value,
    pub hash: HexBytes,
    pub creator: Address,
    pub first_block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub first_time: DateTime<Utc>,
    pub last_block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub last_time: DateTime<Utc>,
    pub supply: String,
    pub total_mint: String,
    pub total_burn: String,
    pub num_transfers: i64,
    pub num_holders: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketBalance {
    pub id: u64,
    pub ticketer: Address,
    pub ticket_type: serde_json::Value,
    pub ticket_content: serde_json::Value,
    pub ticket_hash: HexBytes,
    pub account: Address,
    pub balance: String,
    pub first_block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub first_time: DateTime<Utc>,
    pub last_block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub last_time: DateTime<Utc>,
    pub num_transfers: i64,
    pub num_mints: i64,
    pub num_burns: i64,
    pub vol_sent: String,
    pub vol_recv: String,
    pub vol_mint: String,
    pub vol_burn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketEvent {
    pub id: u64,
    /// `transfer`, `mint`, or `burn`.
    #[serde(rename = "type")]
    pub kind: String,
    pub ticketer: Address,
    pub ticket_type: serde_json::Value,
    pub ticket_content: serde_json::Value,
    pub ticket_hash: HexBytes,
    pub sender: Address,
    pub receiver: Address,
    pub amount: String,
    pub height: i64,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub op_id: u64,
}

// ==============================================================================
// Contract API
// ==============================================================================

pub struct ContractApi<'a> {
    client: &'a Client,
}

impl<'a> ContractApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    async fn fetch<T: DeserializeOwned>(&self, base: &str, params: &Query) -> Result<T, CoreError> {
        self.client.get(&params.render(base)).await
    }

    pub async fn get(&self, address: &Address, params: &Query) -> Result<Contract, CoreError> {
        self.fetch(&format!("/explorer/contract/{address}"), params).await
    }

    pub async fn script(
        &self,
        address: &Address,
        params: &Query,
    ) -> Result<ContractScript, CoreError> {
        self.fetch(&format!("/explorer/contract/{address}/script"), params).await
    }

    pub async fn storage(
        &self,
        address: &Address,
        params: &Query,
    ) -> Result<ContractValue, CoreError> {
        self.fetch(&format!("/explorer/contract/{address}/storage"), params).await
    }

    pub async fn calls(&self, address: &Address, params: &Query) -> Result<OpList, CoreError> {
        self.fetch(&format!("/explorer/contract/{address}/calls"), params).await
    }

    pub async fn constant(&self, hash: &ExprHash, params: &Query) -> Result<Constant, CoreError> {
        self.fetch(&format!("/explorer/constant/{hash}"), params).await
    }

    pub async fn bigmap(&self, id: i64, params: &Query) -> Result<Bigmap, CoreError> {
        self.fetch(&format!("/explorer/bigmap/{id}"), params).await
    }

    /// Look up one bigmap entry. `key` is the key's expression hash or its
    /// plain scalar value.
    pub async fn bigmap_value(
        &self,
        id: i64,
        key: &str,
        params: &Query,
    ) -> Result<BigmapValue, CoreError> {
        self.fetch(&format!("/explorer/bigmap/{id}/value/{key}"), params).await
    }

    pub async fn bigmap_values(
        &self,
        id: i64,
        params: &Query,
    ) -> Result<BigmapValueList, CoreError> {
        self.fetch(&format!("/explorer/bigmap/{id}/values"), params).await
    }

    pub async fn bigmap_key_updates(
        &self,
        id: i64,
        key: &str,
        params: &Query,
    ) -> Result<BigmapUpdateList, CoreError> {
        self.fetch(&format!("/explorer/bigmap/{id}/{key}/updates"), params).await
    }

    pub async fn bigmap_updates(
        &self,
        id: i64,
        params: &Query,
    ) -> Result<BigmapUpdateList, CoreError> {
        self.fetch(&format!("/explorer/bigmap/{id}/updates"), params).await
    }

    /// Tickets issued by this contract.
    pub async fn tickets(&self, address: &Address, params: &Query) -> Result<Vec<Ticket>, CoreError> {
        self.fetch(&format!("/explorer/contract/{address}/tickets"), params).await
    }

    pub async fn ticket_balances(
        &self,
        address: &Address,
        params: &Query,
    ) -> Result<Vec<TicketBalance>, CoreError> {
        self.fetch(&format!("/explorer/contract/{address}/ticket_balances"), params)
            .await
    }

    pub async fn ticket_events(
        &self,
        address: &Address,
        params: &Query,
    ) -> Result<Vec<TicketEvent>, CoreError> {
        self.fetch(&format!("/explorer/contract/{address}/ticket_events"), params)
            .await
    }

    // ========================================================================
    // Tables
    // ========================================================================

    pub fn new_query(&self) -> TableQuery<Contract> {
        self.client.new_table_query()
    }

    pub fn new_event_query(&self) -> TableQuery<Event> {
        self.client.new_table_query()
    }

    pub fn new_constant_query(&self) -> TableQuery<Constant> {
        self.client.new_table_query()
    }

    pub fn new_bigmap_query(&self) -> TableQuery<Bigmap> {
        self.client.new_table_query()
    }

    pub fn new_bigmap_value_query(&self) -> TableQuery<BigmapValue> {
        self.client.new_table_query()
    }

    pub fn new_bigmap_update_query(&self) -> TableQuery<BigmapUpdate> {
        self.client.new_table_query()
    }
}
