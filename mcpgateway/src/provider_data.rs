//! Provider data structure passed to resources and data sources

use crate::api::Client;
use std::sync::Arc;
use tfplug::{Diagnostic, ProviderData};

#[derive(Clone)]
pub struct McpGatewayProviderData {
    pub client: Arc<Client>,
}

impl McpGatewayProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Recovers the provider data handed to a resource or data source
    ///
    /// `None` is not an error: validation runs before the provider is
    /// configured.
    pub fn from_provider_data(data: Option<ProviderData>) -> Result<Option<Self>, Diagnostic> {
        match data {
            Some(data) => data
                .downcast_ref::<McpGatewayProviderData>()
                .cloned()
                .map(Some)
                .ok_or_else(|| {
                    Diagnostic::error(
                        "Invalid provider data",
                        "Expected McpGatewayProviderData from the provider configuration",
                    )
                }),
            None => Ok(None),
        }
    }
}
