//! Health data source implementation

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tfplug::context::Context;
use tfplug::convert::json_to_dynamic;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use crate::api::HealthStatus;
use crate::provider_data::McpGatewayProviderData;
use crate::resources::attrs::api_error_diagnostics;

#[derive(Default)]
pub struct HealthDataSource {
    provider_data: Option<McpGatewayProviderData>,
}

impl HealthDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(health: HealthStatus) -> (DynamicValue, Vec<Diagnostic>) {
        let mut diagnostics = vec![];
        let mut state = DynamicValue::object();
        let _ = state.set_string(&AttributePath::new("id"), "health");
        let _ = state.set_bool(&AttributePath::new("healthy"), health.is_healthy());
        let _ = state.set_string(&AttributePath::new("status"), health.status);

        let details = JsonValue::Object(health.details.into_iter().collect());
        match json_to_dynamic(&details) {
            Ok(details) => {
                let _ = state.set_value(&AttributePath::new("details"), details);
            }
            Err(e) => diagnostics.push(
                Diagnostic::warning("Unsupported health details", e.to_string())
                    .with_attribute(AttributePath::new("details")),
            ),
        }
        (state, diagnostics)
    }
}

#[async_trait]
impl DataSource for HealthDataSource {
    fn type_name(&self) -> &str {
        "mcpgateway_health"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Reports the health of the MCP gateway")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The data source ID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("Status string reported by the gateway")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("healthy", AttributeType::Bool)
                    .description("Whether the status is healthy")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("details", AttributeType::Dynamic)
                    .description("Any further fields of the health report")
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Provider not configured",
                        "Provider data was not properly configured",
                    )],
                };
            }
        };

        tracing::debug!(request_id = %ctx.request_id(), "reading gateway health");
        match provider_data.client.health().await {
            Ok(health) => {
                let (state, diagnostics) = Self::state(health);
                ReadDataSourceResponse { state, diagnostics }
            }
            Err(e) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: api_error_diagnostics("Failed to get gateway health", &e),
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for HealthDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match McpGatewayProviderData::from_provider_data(request.provider_data) {
            Ok(data) => {
                self.provider_data = data;
                ConfigureDataSourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diag) => ConfigureDataSourceResponse {
                diagnostics: vec![diag],
            },
        }
    }
}
