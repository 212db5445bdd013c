use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::CoreError;
use crate::policy::FieldPolicy;
use crate::query::Query;
use crate::table::{TableQuery, TableRow};
use crate::types::{deserialize_time, Address, BlockHash, ProtocolHash};

use super::op::OpList;

// ==============================================================================
// Block Identifier
// ==============================================================================

/// How a block is addressed in explorer paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Head,
    Height(i64),
    Hash(BlockHash),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Height(height) => write!(f, "{height}"),
            Self::Hash(hash) => write!(f, "{hash}"),
        }
    }
}

impl From<i64> for BlockId {
    fn from(height: i64) -> Self {
        Self::Height(height)
    }
}

impl From<BlockHash> for BlockId {
    fn from(hash: BlockHash) -> Self {
        Self::Hash(hash)
    }
}

// ==============================================================================
// Block
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    pub row_id: u64,
    pub hash: BlockHash,
    pub predecessor: BlockHash,
    pub height: i64,
    pub cycle: i64,
    pub is_cycle_snapshot: bool,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub solvetime: i64,
    pub version: i64,
    pub round: i64,
    pub nonce: String,
    pub voting_period_kind: String,
    pub baker_id: u64,
    pub baker: Address,
    pub proposer_id: u64,
    pub proposer: Address,
    pub n_endorsed_slots: i64,
    pub n_ops_applied: i64,
    pub n_ops_failed: i64,
    pub n_calls: i64,
    pub n_rollup_calls: i64,
    pub n_events: i64,
    pub n_tx: i64,
    pub volume: f64,
    pub fee: f64,
    pub reward: f64,
    pub deposit: f64,
    pub activated_supply: f64,
    pub minted_supply: f64,
    pub burned_supply: f64,
    pub n_accounts: i64,
    pub n_new_accounts: i64,
    pub n_new_contracts: i64,
    pub n_cleared_accounts: i64,
    pub n_funded_accounts: i64,
    pub gas_limit: i64,
    pub gas_used: i64,
    pub storage_paid: i64,
    pub pct_account_reuse: f64,
    pub lb_esc_vote: String,
    pub lb_esc_ema: i64,
    pub protocol: ProtocolHash,
    /// Only present when requested with `?ops=1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ops: Option<OpList>,
}

impl TableRow for Block {
    const TABLE: &'static str = "block";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("hash"),
        FieldPolicy::plain("predecessor"),
        FieldPolicy::plain("height"),
        FieldPolicy::plain("cycle"),
        FieldPolicy::plain("is_cycle_snapshot"),
        FieldPolicy::plain("time"),
        FieldPolicy::plain("solvetime"),
        FieldPolicy::plain("version"),
        FieldPolicy::plain("round"),
        FieldPolicy::plain("nonce"),
        FieldPolicy::plain("voting_period_kind"),
        FieldPolicy::plain("baker_id"),
        FieldPolicy::plain("baker"),
        FieldPolicy::plain("proposer_id"),
        FieldPolicy::plain("proposer"),
        FieldPolicy::plain("n_endorsed_slots"),
        FieldPolicy::plain("n_ops_applied"),
        FieldPolicy::plain("n_ops_failed"),
        FieldPolicy::plain("n_calls"),
        FieldPolicy::plain("n_rollup_calls"),
        FieldPolicy::plain("n_events"),
        FieldPolicy::plain("n_tx"),
        FieldPolicy::plain("volume"),
        FieldPolicy::plain("fee"),
        FieldPolicy::plain("reward"),
        FieldPolicy::plain("deposit"),
        FieldPolicy::plain("activated_supply"),
        FieldPolicy::plain("minted_supply"),
        FieldPolicy::plain("burned_supply"),
        FieldPolicy::plain("n_accounts"),
        FieldPolicy::plain("n_new_accounts"),
        FieldPolicy::plain("n_new_contracts"),
        FieldPolicy::plain("n_cleared_accounts"),
        FieldPolicy::plain("n_funded_accounts"),
        FieldPolicy::plain("gas_limit"),
        FieldPolicy::plain("gas_used"),
        FieldPolicy::plain("storage_paid"),
        FieldPolicy::plain("pct_account_reuse"),
        FieldPolicy::plain("lb_esc_vote"),
        FieldPolicy::plain("lb_esc_ema"),
        FieldPolicy::plain("protocol"),
        FieldPolicy::skip("ops"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

// ==============================================================================
// Block API
// ==============================================================================

pub struct BlockApi<'a> {
    client: &'a Client,
}

impl<'a> BlockApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: impl Into<BlockId>, params: &Query) -> Result<Block, CoreError> {
        let path = params.render(&format!("/explorer/block/{}", id.into()));
        self.client.get(&path).await
    }

    pub async fn head(&self, params: &Query) -> Result<Block, CoreError> {
        self.get(BlockId::Head, params).await
    }

    /// Operations included in a block. Use `limit` / `offset` in `params` to
    /// page through busy blocks.
    pub async fn list_ops(
        &self,
        id: impl Into<BlockId>,
        params: &Query,
    ) -> Result<OpList, CoreError> {
        let path = params.render(&format!("/explorer/block/{}/operations", id.into()));
        self.client.get(&path).await
    }

    pub fn new_query(&self) -> TableQuery<Block> {
        self.client.new_table_query()
    }
}
