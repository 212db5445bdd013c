//! Shared test helpers for `tzpro-core` unit tests.
//!
//! Sample identifiers are real mainnet values so they pass the same
//! validation as live responses; JSON fixtures are trimmed copies of what
//! the explorer endpoints return.

use std::sync::Arc;

use crate::client::Client;
use crate::transport::mock::{MockTransport, MockTransportBuilder};

// ==============================================================================
// Client
// ==============================================================================

/// Build a client over a mock transport and keep a handle for assertions.
pub fn mock_client(builder: MockTransportBuilder) -> (Client, Arc<MockTransport>) {
    let mock = Arc::new(builder.build());
    (Client::with_transport(mock.clone()), mock)
}

// ==============================================================================
// Identifiers
// ==============================================================================

pub const BAKER: &str = "tz1irJKkXS2DBWkU1NnmFQx1c1L7pbGg4yhk";
pub const CONTRACT: &str = "KT1HbQepzV1nVGg8QVznG7z4RcHseD5kwqBn";
/// Implicit account on a Mavryk network.
pub const MAVRYK_ACCOUNT: &str = "mv1V4h45W3p4e1sjSBvRkK2uYbvkTnSuHg8g";
pub const BLOCK_HASH: &str = "BLxGBu48ybnWvZoaVLyXV4XVnhdeDc9V2NUbUxwp4FRLQH2Gobx";
pub const OP_HASH: &str = "onvmXPSkBtmSK2u1Qa6R5amwBTjkgDTU6LZ8i5KpE8Ue4J7BvjT";
pub const EXPR_HASH: &str = "exprtZBwZUeYYYfUs9B9Rg2ywHezVHnCCnmF9WsDQVrs582dSK63dC";

// ==============================================================================
// Fixtures
// ==============================================================================

pub const TIP_JSON: &str = r#"{
  "name": "Tezos",
  "network": "mainnet",
  "symbol": "XTZ",
  "chain_id": "NetXdQprcVkpaWU",
  "genesis_time": "2018-06-30T16:07:32Z",
  "block_hash": "BLxGBu48ybnWvZoaVLyXV4XVnhdeDc9V2NUbUxwp4FRLQH2Gobx",
  "height": 4321000,
  "cycle": 650,
  "timestamp": "2023-09-14T10:21:08Z",
  "protocol": "PtNairobiyssHuh87hEhfVBGCVrK3WnS8Z2FT4ymB5tAa4r1nQf",
  "total_accounts": 2500000,
  "bakers": 390,
  "inflation_1y": 4.62,
  "supply": {
    "row_id": 4321001,
    "height": 4321000,
    "cycle": 650,
    "time": "2023-09-14T10:21:08Z",
    "total": 978450120.5,
    "circulating": 970100000.25
  },
  "status": {
    "status": "synced",
    "blocks": 4321000,
    "finalized": 4320998,
    "indexed": 4321000,
    "progress": 1
  }
}"#;
