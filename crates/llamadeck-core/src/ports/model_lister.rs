//! Model listing port.

use async_trait::async_trait;

use super::DiscoveryError;
use crate::domain::ModelRecord;

/// Queries a running server for the models it can serve.
///
/// Implementations normalize whatever shape the server returns into
/// [`ModelRecord`]s with unique ids, in the server's order.
#[async_trait]
pub trait ModelLister: Send + Sync {
    async fn list_models(&self, host: &str, port: u16)
    -> Result<Vec<ModelRecord>, DiscoveryError>;
}
