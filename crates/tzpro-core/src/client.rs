//! API client: read-only configuration plus a shared transport.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{BakerApi, BlockApi, ContractApi, ExplorerApi, MetadataApi, NftApi, OpApi};
use crate::brief::body_str;
use crate::config::ClientConfig;
use crate::error::{CoreError, DecodeError, HttpError, TransportError};
use crate::table::{TableQuery, TableRow};
use crate::transport::{HttpTransport, Request, Transport};

/// Async client for the TzPro indexer API.
///
/// Cloning is cheap and clones share the transport. The client holds no
/// mutable state between calls, so it can be used from many tasks at once.
///
/// # Example
///
/// ```no_run
/// use tzpro_core::{Client, ClientConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tzpro_core::CoreError> {
///     let client = Client::new(&ClientConfig::from_env())?;
///     let tip = client.explorer().tip().await?;
///     println!("{} at height {}", tip.network, tip.height);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    deadline: Option<Duration>,
}

impl Client {
    /// Build a client backed by [`HttpTransport`].
    pub fn new(config: &ClientConfig) -> Result<Self, CoreError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Build a client from `TZPRO_URL` / `TZPRO_API_KEY`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(&ClientConfig::from_env())
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            deadline: None,
        }
    }

    /// Abort any single request that takes longer than `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    /// GET `path` and return the body of a 2xx response.
    pub async fn get_raw(&self, path: &str) -> Result<Vec<u8>, CoreError> {
        let request = Request::get(path);
        let send = self.transport.get(&request);
        let response = match self.deadline {
            None => send.await?,
            Some(deadline) => tokio::time::timeout(deadline, send)
                .await
                .map_err(|_| TransportError::DeadlineExceeded(deadline))??,
        };

        if !response.is_success() {
            debug!(api.path = path, status = response.status, "api error response");
            return Err(HttpError::new(path, response.status, &response.body).into());
        }
        Ok(response.body)
    }

    /// GET `path` and decode the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let body = self.get_raw(path).await?;
        decode_json(path, &body)
    }

    // ========================================================================
    // Resource APIs
    // ========================================================================

    pub fn explorer(&self) -> ExplorerApi<'_> {
        ExplorerApi::new(self)
    }

    pub fn blocks(&self) -> BlockApi<'_> {
        BlockApi::new(self)
    }

    pub fn ops(&self) -> OpApi<'_> {
        OpApi::new(self)
    }

    pub fn bakers(&self) -> BakerApi<'_> {
        BakerApi::new(self)
    }

    pub fn contracts(&self) -> ContractApi<'_> {
        ContractApi::new(self)
    }

    pub fn nft(&self) -> NftApi<'_> {
        NftApi::new(self)
    }

    pub fn metadata(&self) -> MetadataApi<'_> {
        MetadataApi::new(self)
    }

    /// Paginated query over the table that stores `T` rows.
    pub fn new_table_query<T: TableRow>(&self) -> TableQuery<T> {
        TableQuery::new(self.clone())
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, CoreError> {
    let text = body_str(body).map_err(|e| CoreError::decode(path, e))?;
    serde_json::from_str(text).map_err(|e| CoreError::decode(path, DecodeError::from_json(text, 0, &e)))
}
