//! NFT marketplaces: listings, offers, and sales across indexed markets.
//!
//! Token amounts and prices are unbounded naturals kept as decimal strings.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::CoreError;
use crate::query::Query;
use crate::types::{deserialize_opt_time, deserialize_time, Address, OpHash, StringList};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftMarket {
    pub id: u64,
    pub contract: Address,
    pub creator: Address,
    pub name: String,
    pub tags: StringList,
    pub first_block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub first_time: DateTime<Utc>,
    pub last_block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub last_time: DateTime<Utc>,
    pub num_listings: i64,
    pub num_offers: i64,
    pub num_trades: i64,
    pub num_positions: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftEvent {
    pub id: u64,
    pub market: Address,
    /// `list`, `cancel_list`, `offer`, `cancel_offer`, `sale`, ...
    #[serde(rename = "event_type")]
    pub kind: String,
    pub nft_contract: Address,
    pub nft_token_id: String,
    pub amount: String,
    pub price: String,
    pub currency: String,
    pub seller: Address,
    pub buyer: Address,
    pub royalty_address: Address,
    pub royalty_fee: String,
    pub market_fee: String,
    pub tx_hash: OpHash,
    pub block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub time: DateTime<Utc>,
}

/// An open listing or offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftPosition {
    pub id: u64,
    pub market: Address,
    #[serde(rename = "position_type")]
    pub kind: String,
    pub nft_contract: Address,
    pub nft_token_id: String,
    pub owner: Address,
    pub amount: String,
    pub price: String,
    pub currency: String,
    pub open_block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub open_time: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_opt_time", skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftTrade {
    pub id: u64,
    pub market: Address,
    pub nft_contract: Address,
    pub nft_token_id: String,
    pub seller: Address,
    pub buyer: Address,
    pub amount: String,
    pub price: String,
    pub currency: String,
    pub royalty_fee: String,
    pub market_fee: String,
    pub tx_hash: OpHash,
    pub block: i64,
    #[serde(deserialize_with = "deserialize_time")]
    pub time: DateTime<Utc>,
}

pub struct NftApi<'a> {
    client: &'a Client,
}

impl<'a> NftApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    async fn fetch<T: DeserializeOwned>(&self, base: &str, params: &Query) -> Result<T, CoreError> {
        self.client.get(&params.render(base)).await
    }

    pub async fn markets(&self, params: &Query) -> Result<Vec<NftMarket>, CoreError> {
        self.fetch("/v1/nft/markets", params).await
    }

    pub async fn market(&self, address: &Address, params: &Query) -> Result<NftMarket, CoreError> {
        self.fetch(&format!("/v1/nft/markets/{address}"), params).await
    }

    pub async fn events(&self, params: &Query) -> Result<Vec<NftEvent>, CoreError> {
        self.fetch("/v1/nft/events", params).await
    }

    pub async fn market_events(
        &self,
        address: &Address,
        params: &Query,
    ) -> Result<Vec<NftEvent>, CoreError> {
        self.fetch(&format!("/v1/nft/markets/{address}/events"), params).await
    }

    pub async fn positions(&self, params: &Query) -> Result<Vec<NftPosition>, CoreError> {
        self.fetch("/v1/nft/positions", params).await
    }

    pub async fn market_positions(
        &self,
        address: &Address,
        params: &Query,
    ) -> Result<Vec<NftPosition>, CoreError> {
        self.fetch(&format!("/v1/nft/markets/{address}/positions"), params).await
    }

    pub async fn trades(&self, params: &Query) -> Result<Vec<NftTrade>, CoreError> {
        self.fetch("/v1/nft/trades", params).await
    }

    pub async fn market_trades(
        &self,
        address: &Address,
        params: &Query,
    ) -> Result<Vec<NftTrade>, CoreError> {
        self.fetch(&format!("/v1/nft/markets/{address}/trades"), params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{mock_client, BAKER, CONTRACT, OP_HASH};
    use crate::transport::mock::MockTransport;

    #[tokio::test]
    async fn market_scoped_endpoints() {
        let market = format!(
            r#"{{"id":1,"contract":"{CONTRACT}","name":"objkt.com","tags":"marketplace","num_trades":10}}"#
        );
        let event = format!(
            r#"[{{"id":5,"market":"{CONTRACT}","event_type":"sale","price":"1500000",
                 "seller":"{BAKER}","tx_hash":"{OP_HASH}","time":"2023-09-14T10:21:08Z"}}]"#
        );
        let position = format!(
            r#"[{{"id":6,"position_type":"listing","owner":"{BAKER}","expiry_time":null}}]"#
        );
        let trade = r#"[{"id":7,"amount":"1","price":"2000000","currency":"XTZ","block":4321000}]"#;
        let (client, mock) = mock_client(
            MockTransport::builder()
                .with_json(&format!("/v1/nft/markets/{CONTRACT}"), &market)
                .with_json(&format!("/v1/nft/markets/{CONTRACT}/events?limit=1"), &event)
                .with_json(&format!("/v1/nft/markets/{CONTRACT}/positions"), &position)
                .with_json(&format!("/v1/nft/markets/{CONTRACT}/trades"), trade),
        );
        let api = client.nft();
        let addr: Address = CONTRACT.parse().expect("market address");
        let q = Query::new();

        let m = api.market(&addr, &q).await.expect("market");
        assert_eq!(m.name, "objkt.com");
        assert!(m.tags.contains("marketplace"));

        let events = api
            .market_events(&addr, &Query::new().with_limit(1))
            .await
            .expect("events");
        assert_eq!(events[0].kind, "sale");
        assert_eq!(events[0].price, "1500000");

        let positions = api.market_positions(&addr, &q).await.expect("positions");
        assert_eq!(positions[0].kind, "listing");
        assert!(positions[0].expiry_time.is_none());

        let trades = api.market_trades(&addr, &q).await.expect("trades");
        assert_eq!(trades[0].block, 4_321_000);
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test]
    async fn global_listings() {
        let (client, mock) = mock_client(
            MockTransport::builder()
                .with_json("/v1/nft/markets", "[]")
                .with_json("/v1/nft/events?order=desc", "[]")
                .with_json("/v1/nft/positions", "[]")
                .with_json("/v1/nft/trades?cursor=99", "[]"),
        );
        let api = client.nft();
        assert!(api.markets(&Query::new()).await.expect("markets").is_empty());
        assert!(api.events(&Query::new().with_desc()).await.expect("events").is_empty());
        assert!(api.positions(&Query::new()).await.expect("positions").is_empty());
        assert!(api
            .trades(&Query::new().with_cursor(99))
            .await
            .expect("trades")
            .is_empty());
        assert_eq!(
            mock.call_paths(),
            vec![
                "/v1/nft/markets",
                "/v1/nft/events?order=desc",
                "/v1/nft/positions",
                "/v1/nft/trades?cursor=99"
            ]
        );
    }

    #[tokio::test]
    async fn unknown_market_is_not_found() {
        let (client, _) = mock_client(MockTransport::builder());
        let addr: Address = CONTRACT.parse().expect("market address");
        let err = client
            .nft()
            .market(&addr, &Query::new())
            .await
            .expect_err("unmocked path answers 404");
        assert_eq!(err.http_status(), Some(404));
    }
}
