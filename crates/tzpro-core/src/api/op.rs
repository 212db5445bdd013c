use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::CoreError;
use crate::policy::FieldPolicy;
use crate::query::Query;
use crate::table::{TableQuery, TableRow};
use crate::types::{deserialize_time, Address, BlockHash, HexBytes, Micheline, OpHash};

/// Operations of one group, or the result of any list endpoint.
pub type OpList = Vec<Op>;

/// A single (possibly internal) operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Op {
    pub row_id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: OpHash,
    pub height: i64,
    pub cycle: i64,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    /// Position of the group in its block.
    pub op_n: i64,
    /// Position inside a batch.
    pub op_p: i64,
    pub status: String,
    pub is_success: bool,
    pub is_contract: bool,
    pub is_internal: bool,
    pub is_event: bool,
    pub is_rollup: bool,
    pub counter: i64,
    pub gas_limit: i64,
    pub gas_used: i64,
    pub storage_limit: i64,
    pub storage_paid: i64,
    pub volume: f64,
    pub fee: f64,
    pub reward: f64,
    pub deposit: f64,
    pub burned: f64,
    pub sender_id: u64,
    pub receiver_id: u64,
    pub creator_id: u64,
    pub baker_id: u64,
    pub sender: Address,
    pub receiver: Address,
    pub creator: Address,
    pub baker: Address,
    pub block: BlockHash,
    pub entrypoint: String,
    pub data: String,
    pub parameters: Option<Micheline>,
    pub storage: Option<Micheline>,
    pub storage_hash: HexBytes,
    pub code_hash: HexBytes,
    pub errors: Option<serde_json::Value>,
    pub days_destroyed: f64,
}

impl Op {
    pub fn is_transaction(&self) -> bool {
        self.kind == "transaction"
    }
}

impl TableRow for Op {
    const TABLE: &'static str = "op";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("type"),
        FieldPolicy::plain("hash"),
        FieldPolicy::plain("height"),
        FieldPolicy::plain("cycle"),
        FieldPolicy::plain("time"),
        FieldPolicy::plain("op_n"),
        FieldPolicy::plain("op_p"),
        FieldPolicy::plain("status"),
        FieldPolicy::plain("is_success"),
        FieldPolicy::plain("is_contract"),
        FieldPolicy::plain("is_internal"),
        FieldPolicy::plain("is_event"),
        FieldPolicy::plain("is_rollup"),
        FieldPolicy::plain("counter"),
        FieldPolicy::plain("gas_limit"),
        FieldPolicy::plain("gas_used"),
        FieldPolicy::plain("storage_limit"),
        FieldPolicy::plain("storage_paid"),
        FieldPolicy::plain("volume"),
        FieldPolicy::plain("fee"),
        FieldPolicy::plain("reward"),
        FieldPolicy::plain("deposit"),
        FieldPolicy::plain("burned"),
        FieldPolicy::plain("sender_id"),
        FieldPolicy::plain("receiver_id"),
        FieldPolicy::plain("creator_id"),
        FieldPolicy::plain("baker_id"),
        FieldPolicy::plain("sender"),
        FieldPolicy::plain("receiver"),
        FieldPolicy::plain("creator"),
        FieldPolicy::plain("baker"),
        FieldPolicy::skip("block"),
        FieldPolicy::plain("entrypoint"),
        FieldPolicy::plain("data"),
        FieldPolicy::hex("parameters"),
        FieldPolicy::hex("storage"),
        FieldPolicy::plain("storage_hash"),
        FieldPolicy::plain("code_hash"),
        FieldPolicy::plain("errors"),
        FieldPolicy::plain("days_destroyed"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

pub struct OpApi<'a> {
    client: &'a Client,
}

impl<'a> OpApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// All operations sharing `hash` (a batch yields several).
    pub async fn get(&self, hash: &OpHash, params: &Query) -> Result<OpList, CoreError> {
        let path = params.render(&format!("/explorer/op/{hash}"));
        self.client.get(&path).await
    }

    pub fn new_query(&self) -> TableQuery<Op> {
        self.client.new_table_query()
    }
}
