pub mod api;
pub mod brief;
pub mod client;
pub mod config;
pub mod error;
pub mod policy;
pub mod query;
pub mod table;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_util;

pub use api::explorer::Status;
pub use client::Client;
pub use config::ClientConfig;
pub use error::{CoreError, DecodeError, HttpError, TransportError};
pub use query::{FilterMode, Order, Query};
pub use table::{CursorState, RowList, TableQuery, TableRow};
pub use types::{Address, BlockHash, ExprHash, HexBytes, OpHash};
