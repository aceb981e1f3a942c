//! Helpers shared by the integration suites

#![allow(dead_code)]

use mcpgateway::McpGatewayProvider;
use tfplug::context::Context;
use tfplug::data_source::ConfigureDataSourceRequest;
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::resource::ConfigureResourceRequest;
use tfplug::types::{AttributePath, ClientCapabilities, DynamicValue};
use tfplug::{DataSourceWithConfigure, ProviderData, ResourceWithConfigure};

pub const TOKEN: &str = "test-token";

pub fn path(name: &str) -> AttributePath {
    AttributePath::new(name)
}

/// Configures a provider against `endpoint` with fast retries
pub async fn configure(endpoint: &str) -> (McpGatewayProvider, ProviderData) {
    let mut provider = McpGatewayProvider::new();

    let mut config = DynamicValue::object();
    let _ = config.set_string(&path("endpoint"), endpoint);
    let _ = config.set_string(&path("token"), TOKEN);
    let _ = config.set_number(&path("max_retries"), 0.0);

    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let data = response.provider_data.expect("provider data");
    (provider, data)
}

pub async fn resource(
    provider: &McpGatewayProvider,
    data: &ProviderData,
    type_name: &str,
) -> Box<dyn ResourceWithConfigure> {
    let factories = provider.resources();
    let mut resource = factories.get(type_name).expect("resource factory")();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data.clone()),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    resource
}

pub async fn data_source(
    provider: &McpGatewayProvider,
    data: &ProviderData,
    type_name: &str,
) -> Box<dyn DataSourceWithConfigure> {
    let factories = provider.data_sources();
    let mut data_source = factories.get(type_name).expect("data source factory")();
    let response = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(data.clone()),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    data_source
}
