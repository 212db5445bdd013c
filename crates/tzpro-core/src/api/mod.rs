//! Resource catalog: entity types and the endpoints that serve them.
//!
//! Each resource API borrows a [`Client`](crate::Client) and maps one method
//! to one endpoint. Entities that live in an indexer table also implement
//! [`TableRow`](crate::TableRow) for cursor pagination.

pub mod baker;
pub mod block;
pub mod contract;
pub mod explorer;
pub mod metadata;
pub mod nft;
pub mod op;

pub use baker::BakerApi;
pub use block::BlockApi;
pub use contract::ContractApi;
pub use explorer::ExplorerApi;
pub use metadata::MetadataApi;
pub use nft::NftApi;
pub use op::OpApi;
