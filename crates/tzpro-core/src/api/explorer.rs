//! Chain tip, indexer status, protocol deployments, and chain config.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::brief::{self, Shape};
use crate::client::Client;
use crate::error::{CoreError, DecodeError};
use crate::policy::FieldPolicy;
use crate::query::Query;
use crate::table::TableRow;
use crate::types::{deserialize_time, BlockHash, ChainIdHash, ProtocolHash};

// ==============================================================================
// Status
// ==============================================================================

/// Column order used when a positional status arrives without an explicit
/// column list, e.g. embedded in [`Tip`].
pub const STATUS_COLUMNS: [&str; 5] = ["status", "blocks", "finalized", "indexed", "progress"];

/// Sync progress of the indexer.
///
/// The server sends either a keyed object or a positional array; both
/// decode to the same value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Status {
    /// One of `loading`, `connecting`, `stopping`, `stopped`, `waiting`,
    /// `syncing`, `synced`, `failed`.
    pub status: String,
    pub blocks: i64,
    pub finalized: i64,
    pub indexed: i64,
    pub progress: f64,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct StatusFields {
    status: String,
    blocks: i64,
    finalized: i64,
    indexed: i64,
    progress: f64,
}

impl From<StatusFields> for Status {
    fn from(f: StatusFields) -> Self {
        Self {
            status: f.status,
            blocks: f.blocks,
            finalized: f.finalized,
            indexed: f.indexed,
            progress: f.progress,
        }
    }
}

impl Status {
    /// Decode a status payload.
    ///
    /// Empty input and `null` yield the zero status. Objects are decoded by
    /// key; arrays positionally against `columns`, ignoring unknown names and
    /// leaving missing or `null` positions at zero. Integers are parsed as
    /// exact `i64`, never through a float.
    pub fn decode<S: AsRef<str>>(raw: &[u8], columns: &[S]) -> Result<Self, DecodeError> {
        let text = brief::body_str(raw)?;
        match brief::shape(text)? {
            Shape::Empty => Ok(Self::default()),
            Shape::Object => brief::decode_object::<StatusFields>(text, 0).map(Self::from),
            Shape::Array => {
                let mut status = Self::default();
                brief::for_each_column(text, 0, columns, |column, value, offset| {
                    match column {
                        "status" => status.status = brief::parse_value(value, offset)?,
                        "blocks" => status.blocks = brief::parse_value(value, offset)?,
                        "finalized" => status.finalized = brief::parse_value(value, offset)?,
                        "indexed" => status.indexed = brief::parse_value(value, offset)?,
                        "progress" => status.progress = brief::parse_value(value, offset)?,
                        _ => {}
                    }
                    Ok(())
                })?;
                Ok(status)
            }
        }
    }

    pub fn is_synced(&self) -> bool {
        self.status == "synced"
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Status::decode(value.to_string().as_bytes(), &STATUS_COLUMNS).map_err(de::Error::custom)
    }
}

// ==============================================================================
// Tip, Deployments, Config
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tip {
    pub name: String,
    pub network: String,
    pub symbol: String,
    pub chain_id: ChainIdHash,
    #[serde(deserialize_with = "deserialize_time")]
    pub genesis_time: DateTime<Utc>,
    #[serde(rename = "block_hash")]
    pub hash: BlockHash,
    pub height: i64,
    pub cycle: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub protocol: ProtocolHash,
    pub total_accounts: i64,
    pub total_contracts: i64,
    pub total_rollups: i64,
    pub funded_accounts: i64,
    pub dust_accounts: i64,
    pub dust_delegators: i64,
    pub total_ops: i64,
    pub delegators: i64,
    pub bakers: i64,
    pub rolls: i64,
    pub roll_owners: i64,
    pub new_accounts_30d: i64,
    pub cleared_accounts_30d: i64,
    pub funded_accounts_30d: i64,
    pub inflation_1y: f64,
    pub inflation_rate_1y: f64,
    pub health: i64,
    pub supply: Option<Supply>,
    pub status: Status,
}

/// A protocol activated on the indexed chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub protocol: String,
    /// Protocol version sequence on the indexed chain.
    pub version: i64,
    pub start_height: i64,
    /// Last block of this protocol, or -1 while active.
    pub end_height: i64,
}

impl Deployment {
    pub fn is_active(&self) -> bool {
        self.end_height < 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockchainConfig {
    pub name: String,
    pub network: String,
    pub symbol: String,
    pub chain_id: String,
    pub deployment: i64,
    pub version: i64,
    pub protocol: String,
    pub start_height: i64,
    pub end_height: i64,
    pub decimals: i64,
    pub minimal_stake: f64,
    pub preserved_cycles: i64,
    pub minimal_block_delay: i64,
    pub delay_increment_per_round: i64,
}

// ==============================================================================
// Supply
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supply {
    pub row_id: u64,
    pub height: i64,
    pub cycle: i64,
    #[serde(rename = "time", deserialize_with = "deserialize_time")]
    pub timestamp: DateTime<Utc>,
    pub total: f64,
    pub activated: f64,
    pub unclaimed: f64,
    pub circulating: f64,
    pub liquid: f64,
    pub delegated: f64,
    pub staking: f64,
    pub shielded: f64,
    pub active_stake: f64,
    pub active_delegated: f64,
    pub active_staking: f64,
    pub inactive_delegated: f64,
    pub inactive_staking: f64,
    pub minted: f64,
    pub minted_baking: f64,
    pub minted_endorsing: f64,
    pub minted_seeding: f64,
    pub minted_airdrop: f64,
    pub minted_subsidy: f64,
    pub burned: f64,
    pub burned_double_baking: f64,
    pub burned_double_endorse: f64,
    pub burned_origination: f64,
    pub burned_allocation: f64,
    pub burned_storage: f64,
    pub burned_explicit: f64,
    pub burned_seed_miss: f64,
    pub burned_absence: f64,
    pub burned_rollup: f64,
    pub frozen: f64,
    pub frozen_deposits: f64,
    pub frozen_rewards: f64,
    pub frozen_fees: f64,
    pub frozen_bonds: f64,
}

impl TableRow for Supply {
    const TABLE: &'static str = "supply";
    const FIELDS: &'static [FieldPolicy] = &[
        FieldPolicy::plain("row_id"),
        FieldPolicy::plain("height"),
        FieldPolicy::plain("cycle"),
        FieldPolicy::plain("time"),
        FieldPolicy::plain("total"),
        FieldPolicy::plain("activated"),
        FieldPolicy::plain("unclaimed"),
        FieldPolicy::plain("circulating"),
        FieldPolicy::plain("liquid"),
        FieldPolicy::plain("delegated"),
        FieldPolicy::plain("staking"),
        FieldPolicy::plain("shielded"),
        FieldPolicy::plain("active_stake"),
        FieldPolicy::plain("active_delegated"),
        FieldPolicy::plain("active_staking"),
        FieldPolicy::plain("inactive_delegated"),
        FieldPolicy::plain("inactive_staking"),
        FieldPolicy::plain("minted"),
        FieldPolicy::plain("minted_baking"),
        FieldPolicy::plain("minted_endorsing"),
        FieldPolicy::plain("minted_seeding"),
        FieldPolicy::plain("minted_airdrop"),
        FieldPolicy::plain("minted_subsidy"),
        FieldPolicy::plain("burned"),
        FieldPolicy::plain("burned_double_baking"),
        FieldPolicy::plain("burned_double_endorse"),
        FieldPolicy::plain("burned_origination"),
        FieldPolicy::plain("burned_allocation"),
        FieldPolicy::plain("burned_storage"),
        FieldPolicy::plain("burned_explicit"),
        FieldPolicy::plain("burned_seed_miss"),
        FieldPolicy::plain("burned_absence"),
        FieldPolicy::plain("burned_rollup"),
        FieldPolicy::plain("frozen"),
        FieldPolicy::plain("frozen_deposits"),
        FieldPolicy::plain("frozen_rewards"),
        FieldPolicy::plain("frozen_fees"),
        FieldPolicy::plain("frozen_bonds"),
    ];

    fn row_id(&self) -> u64 {
        self.row_id
    }
}

// ==============================================================================
// Explorer API
// ==============================================================================

pub struct ExplorerApi<'a> {
    client: &'a Client,
}

impl<'a> ExplorerApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn status(&self) -> Result<Status, CoreError> {
        self.status_with_columns::<&str>(&[]).await
    }

    /// Ask for a positional status with the given columns and decode it
    /// against the same list.
    pub async fn status_with_columns<S: AsRef<str>>(
        &self,
        columns: &[S],
    ) -> Result<Status, CoreError> {
        let mut query = Query::new();
        if !columns.is_empty() {
            query = query.with_columns(columns);
        }
        let path = query.render("/explorer/status");
        let body = self.client.get_raw(&path).await?;
        Status::decode(&body, columns).map_err(|e| CoreError::decode(&path, e))
    }

    pub async fn tip(&self) -> Result<Tip, CoreError> {
        self.client.get("/explorer/tip").await
    }

    pub async fn protocols(&self) -> Result<Vec<Deployment>, CoreError> {
        self.client.get("/explorer/protocols").await
    }

    /// Chain config at the current head.
    pub async fn config(&self) -> Result<BlockchainConfig, CoreError> {
        self.client.get("/explorer/config/head").await
    }

    pub async fn config_at(&self, height: i64) -> Result<BlockchainConfig, CoreError> {
        self.client.get(&format!("/explorer/config/{height}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{mock_client, TIP_JSON};
    use crate::transport::mock::MockTransport;

    #[test]
    fn status_null_and_empty_are_zero() {
        for raw in ["", "   ", "null", " null\n"] {
            let status = Status::decode(raw.as_bytes(), &STATUS_COLUMNS).expect("zero status");
            assert_eq!(status, Status::default());
        }
    }

    #[test]
    fn status_object_and_array_are_identical() {
        let keyed = Status::decode(br#"{"status":"synced","blocks":100}"#, &["unused"])
            .expect("keyed status");
        let brief = Status::decode(br#"["synced",100]"#, &["status", "blocks"])
            .expect("positional status");
        assert_eq!(keyed, brief);
        assert_eq!(brief.status, "synced");
        assert_eq!(brief.blocks, 100);
        assert!(brief.is_synced());
    }

    #[test]
    fn status_array_ignores_unknown_and_null_columns() {
        let status = Status::decode(
            br#"["syncing", null, 7, 0.5, 99]"#,
            &["status", "blocks", "whatever", "progress"],
        )
        .expect("positional status");
        assert_eq!(status.status, "syncing");
        assert_eq!(status.blocks, 0);
        assert_eq!(status.progress, 0.5);
    }

    #[test]
    fn status_array_shorter_than_columns() {
        let status = Status::decode(b"[\"waiting\"]", &STATUS_COLUMNS).expect("short array");
        assert_eq!(status.status, "waiting");
        assert_eq!(status.indexed, 0);
    }

    #[test]
    fn status_keeps_full_integer_precision() {
        let status = Status::decode(b"[9007199254740993]", &["blocks"]).expect("big height");
        assert_eq!(status.blocks, 9_007_199_254_740_993);
    }

    #[test]
    fn status_rejects_fractional_height() {
        let err = Status::decode(b"[1.5]", &["blocks"]).expect_err("float height");
        assert!((1..=4).contains(&err.offset), "offset {}", err.offset);
    }

    #[test]
    fn status_rejects_unexpected_leading_byte() {
        let err = Status::decode(b"  \"synced\"", &STATUS_COLUMNS).expect_err("string payload");
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn status_rejects_malformed_array() {
        let err = Status::decode(b"[\"synced\",", &STATUS_COLUMNS).expect_err("truncated");
        assert!(err.offset <= 10);
    }

    #[test]
    fn status_embedded_in_tip_accepts_both_forms() {
        let tip: Tip = serde_json::from_str(TIP_JSON).expect("tip fixture");
        assert_eq!(tip.status.status, "synced");
        assert_eq!(tip.status.blocks, 4_321_000);

        let positional: Status =
            serde_json::from_str(r#"["synced", 4321000, 4320998, 4321000, 1.0]"#)
                .expect("positional");
        assert_eq!(positional.finalized, 4_320_998);
        assert_eq!(positional.progress, 1.0);
    }

    #[tokio::test]
    async fn explorer_tip_and_status() {
        let (client, mock) = mock_client(
            MockTransport::builder()
                .with_json("/explorer/tip", TIP_JSON)
                .with_json("/explorer/status", r#"{"status":"syncing","blocks":10,"indexed":9}"#)
                .with_json(
                    "/explorer/status?columns=status%2Cindexed",
                    r#"["syncing",9]"#,
                ),
        );

        let tip = client.explorer().tip().await.expect("tip");
        assert_eq!(tip.network, "mainnet");
        assert_eq!(tip.height, 4_321_000);
        assert_eq!(tip.supply.as_ref().map(|s| s.height), Some(4_321_000));

        let status = client.explorer().status().await.expect("status");
        assert_eq!(status.indexed, 9);
        let brief = client
            .explorer()
            .status_with_columns(&["status", "indexed"])
            .await
            .expect("brief status");
        assert_eq!(brief.indexed, 9);
        assert_eq!(brief.blocks, 0);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn explorer_protocols_and_config() {
        let (client, mock) = mock_client(
            MockTransport::builder()
                .with_json(
                    "/explorer/protocols",
                    r#"[{"protocol":"PtNairobi","version":17,"start_height":3760129,"end_height":-1}]"#,
                )
                .with_json("/explorer/config/head", r#"{"network":"mainnet","decimals":6}"#)
                .with_json("/explorer/config/100", r#"{"network":"mainnet","version":1}"#),
        );
        let protos = client.explorer().protocols().await.expect("protocols");
        assert!(protos[0].is_active());
        assert_eq!(client.explorer().config().await.expect("config").decimals, 6);
        assert_eq!(client.explorer().config_at(100).await.expect("config").version, 1);
        assert_eq!(
            mock.call_paths(),
            vec!["/explorer/protocols", "/explorer/config/head", "/explorer/config/100"]
        );
    }

    #[tokio::test]
    async fn supply_table_rows_use_millisecond_time() {
        let (client, mock) = mock_client(MockTransport::builder().with_json(
            "/tables/supply?columns=row_id%2Cheight%2Ctime%2Ctotal&cursor=10&limit=2",
            "[[11,10,1530374852000,760000000.5]]",
        ));
        let rows = client
            .new_table_query::<Supply>()
            .with_columns(["row_id", "height", "time", "total"])
            .with_limit(2)
            .with_cursor(10)
            .collect_all()
            .await
            .expect("supply rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp.timestamp(), 1_530_374_852);
        assert_eq!(rows[0].total, 760_000_000.5);
        assert_eq!(mock.call_count(), 1);
    }
}
