use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::CoreError;
use crate::policy::FieldPolicy;
use crate::query::Query;
use crate::table::{TableQuery, TableRow};
use crate::types::{deserialize_opt_time, deserialize_time, Address, OpHash};

use super::metadata::Metadata;
use super::op::OpList;

// ==============================================================================
// Bakers
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Baker {
    pub address: Address,
    #[serde(rename = "baker_since_time", deserialize_with = "deserialize_time")]
    pub baker_since: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_opt_time", skip_serializing_if = "Option::is_none")]
    pub baker_until: Option<DateTime<Utc>>,
    pub grace_period: i64,
    pub baker_version: String,
    pub total_balance: f64,
    pub spendable_balance: f64,
    pub frozen_balance: f64,
    pub delegated_balance: f64,
    pub staking_balance: f64,
    pub staking_capacity: f64,
    /// `None` when the baker has not set a limit.
    pub deposits_limit: Option<f64>,
    pub staking_share: f64,
    pub active_delegations: i64,
    pub is_full: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<BakerEvents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<BakerStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakerStatistics {
    pub total_rewards_earned: f64,
    pub total_fees_earned: f64,
    pub total_lost: f64,
    pub blocks_baked: i64,
    pub blocks_proposed: i64,
    pub slots_endorsed: i64,
    pub avg_luck_64: i64,
    pub avg_performance_64: i64,
    pub avg_contribution_64: i64,
    pub n_baker_ops: i64,
    #[serde(rename = "n_proposals")]
    pub n_proposal: i64,
    #[serde(rename = "n_ballots")]
    pub n_ballot: i64,
    pub n_endorsements: i64,
    pub n_preendorsements: i64,
    #[serde(rename = "n_nonce_revelations")]
    pub n_seed_nonces: i64,
    pub n_double_bakings: i64,
    pub n_double_endorsements: i64,
    #[serde(rename = "n_set_limits")]
    pub n_set_deposits_limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakerEvents {
    pub last_bake_height: i64,
    pub last_bake_block: String,
    #[serde(deserialize_with = "deserialize_time")]
    pub last_bake_time: DateTime<Utc>,
    pub last_endorse_height: i64,
    pub last_endorse_block: String,
    #[serde(deserialize_with = "deserialize_time")]
    pub last_endorse_time: DateTime<Utc>,
    pub next_bake_height: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub next_bake_time: DateTime<Utc>,
    pub next_endorse_height: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub next_endorse_time: DateTime<Utc>,
}

// ==============================================================================
// Per-cycle Reports
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleIncome {
    pub address: Address,
    pub cycle: i64,
    #[serde(rename = "snapshot_rolls")]
    pub rolls: i64,
    #[serde(rename = "own_balance")]
    pub balance: f64,
    #[serde(rename = "delegated_balance")]
    pub delegated: f64,
    #[serde(rename = "staking_balance")]
    pub staking: f64,
    pub n_delegations: i64,
    pub n_baking_rights: i64,
    pub n_endorsing_rights: i64,
    pub luck: f64,
    #[serde(rename = "luck_percent")]
    pub luck_pct: i64,
    #[serde(rename = "contribution_percent")]
    pub contribution_pct: i64,
    #[serde(rename = "performance_percent")]
    pub performance_pct: i64,
    pub n_blocks_baked: i64,
    pub n_blocks_proposed: i64,
    pub n_slots_endorsed: i64,
    pub n_seeds_revealed: i64,
    pub expected_income: f64,
    pub total_income: f64,
    pub total_bonds: f64,
    pub baking_income: f64,
    pub endorsing_income: f64,
    pub accusation_income: f64,
    pub seed_income: f64,
    pub fees_income: f64,
    pub total_loss: f64,
    pub accusation_loss: f64,
    pub seed_loss: f64,
    pub endorsing_loss: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delegator {
    pub address: Address,
    pub balance: f64,
}

/// Stake distribution of a baker at the snapshot used for `baking_cycle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleSnapshot {
    #[serde(rename = "baking_cycle")]
    pub bake_cycle: i64,
    #[serde(rename = "snapshot_height")]
    pub height: i64,
    #[serde(rename = "snapshot_cycle")]
    pub cycle: i64,
    #[serde(rename = "snapshot_time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "snapshot_index")]
    pub index: i64,
    #[serde(rename = "snapshot_rolls")]
    pub rolls: i64,
    pub staking_balance: f64,
    pub own_balance: f64,
    pub delegated_balance: f64,
    pub n_delegations: i64,
    pub delegators: Vec<Delegator>,
}

/// Baking and endorsing rights of one cycle. Rights are bitmaps with one
/// bit per block of the cycle, starting at `start_height`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleRights {
    pub address: Address,
    pub cycle: i64,
    pub start_height: i64,
    #[serde(rename = "baking_rights")]
    pub baking: String,
    #[serde(rename = "endorsing_rights")]
    pub endorsing: String,
    pub blocks_baked: String,
    pub blocks_endorsed: String,
    pub seeds_required: String,
    pub seeds_revealed: String,
}

/// A governance ballot or proposal vote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ballot {
    pub row_id: u64,
    pub height: i64,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub election_id: i64,
    pub voting_period: i64,
    pub voting_period_kind: String,
    pub proposal: String,
    pub ballot: String,
    pub rolls: i64,
    pub voting_power: i64,
    pub sender: Address,
    pub op: OpHash,
}

// ==============================================================================
// Stake Snapshots
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeSnapshot {
    pub row_id: u64,
    pub height: i64,
    pub cycle: i64,
    pub is_selected: bool,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub index: i64,
    pub rolls: i64,
    pub account_id: u64,
    pub address: Address,
    pub baker_id: u64,
    pub baker: Address,
    pub is_baker: bool,
    pub is_active: bool,
    pub balance: f64,
    pub delegated: f64,
    pub n_delegations: i64,
    pub since: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub since_time: DateTime<Utc>,
}

impl TableRow for StakeSnapshot {
    const TABLE: &'static str = "snapshot";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("height"),
        FieldPolicy::plain("cycle"),
        FieldPolicy::plain("is_selected"),
        FieldPolicy::plain("time"),
        FieldPolicy::plain("index"),
        FieldPolicy::plain("rolls"),
        FieldPolicy::plain("account_id"),
        FieldPolicy::plain("address"),
        FieldPolicy::plain("baker_id"),
        FieldPolicy::plain("baker"),
        FieldPolicy::plain("is_baker"),
        FieldPolicy::plain("is_active"),
        FieldPolicy::plain("balance"),
        FieldPolicy::plain("delegated"),
        FieldPolicy::plain("n_delegations"),
        FieldPolicy::plain("since"),
        FieldPolicy::plain("since_time"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

// ==============================================================================
// Baker API
// ==============================================================================

pub struct BakerApi<'a> {
    client: &'a Client,
}

impl<'a> BakerApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        address: &Address,
        suffix: &str,
        params: &Query,
    ) -> Result<T, CoreError> {
        let path = params.render(&format!("/explorer/bakers/{address}{suffix}"));
        self.client.get(&path).await
    }

    pub async fn get(&self, address: &Address, params: &Query) -> Result<Baker, CoreError> {
        self.fetch(address, "", params).await
    }

    pub async fn list(&self, params: &Query) -> Result<Vec<Baker>, CoreError> {
        self.client.get(&params.render("/explorer/bakers")).await
    }

    pub async fn votes(&self, address: &Address, params: &Query) -> Result<Vec<Ballot>, CoreError> {
        self.fetch(address, "/votes", params).await
    }

    pub async fn endorsements(&self, address: &Address, params: &Query) -> Result<OpList, CoreError> {
        self.fetch(address, "/endorsements", params).await
    }

    /// Delegations received by the baker.
    pub async fn delegations(&self, address: &Address, params: &Query) -> Result<OpList, CoreError> {
        self.fetch(address, "/delegations", params).await
    }

    pub async fn rights(
        &self,
        address: &Address,
        cycle: i64,
        params: &Query,
    ) -> Result<CycleRights, CoreError> {
        self.fetch(address, &format!("/rights/{cycle}"), params).await
    }

    pub async fn income(
        &self,
        address: &Address,
        cycle: i64,
        params: &Query,
    ) -> Result<CycleIncome, CoreError> {
        self.fetch(address, &format!("/income/{cycle}"), params).await
    }

    /// Delegators and their balances at the snapshot for `cycle`.
    pub async fn snapshot(
        &self,
        address: &Address,
        cycle: i64,
        params: &Query,
    ) -> Result<CycleSnapshot, CoreError> {
        self.fetch(address, &format!("/delegators/{cycle}"), params).await
    }

    pub fn new_snapshot_query(&self) -> TableQuery<StakeSnapshot> {
        self.client.new_table_query()
    }
}
