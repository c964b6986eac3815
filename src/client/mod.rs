use async_trait::async_trait;

use crate::error::Error;
use crate::query::{QueryResponse, SelectQuery};

mod memory;

pub use memory::MemoryClient;

/// Handle to a remote table store.
///
/// Implementations own transport and authentication. Any failure is
/// reported as `Error::RemoteQuery`.
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn select(&self, query: &SelectQuery) -> Result<QueryResponse, Error>;
}

#[async_trait]
impl<C: TableClient + ?Sized> TableClient for std::sync::Arc<C> {
    async fn select(&self, query: &SelectQuery) -> Result<QueryResponse, Error> {
        (**self).select(query).await
    }
}
