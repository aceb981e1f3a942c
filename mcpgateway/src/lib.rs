pub mod api;
pub mod data_sources;
pub mod provider_data;
pub mod resources;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory, ValidateProviderConfigRequest,
    ValidateProviderConfigResponse,
};
use tfplug::schema::Schema;
use tfplug::types::ServerCapabilities;
use tfplug::validator::NumberRangeValidator;
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, DataSourceWithConfigure, Diagnostic,
    DynamicValue, Provider, ProviderData, ProviderMetadataRequest, ProviderMetadataResponse,
    ResourceWithConfigure, SchemaBuilder,
};

pub use provider_data::McpGatewayProviderData;

use api::{Auth, Client, RetryConfig};
use data_sources::{HealthDataSource, ObjectDataSource};
use resources::attrs::HttpUrlValidator;
use resources::{
    AgentMapping, GatewayMapping, ObjectMapping, ObjectResource, PromptMapping, ResourceMapping,
    ServerMapping, TeamMapping, ToolMapping,
};

pub const ENDPOINT_ENV: &str = "MCPGATEWAY_ENDPOINT";
pub const TOKEN_ENV: &str = "MCPGATEWAY_TOKEN";
pub const USERNAME_ENV: &str = "MCPGATEWAY_USERNAME";
pub const PASSWORD_ENV: &str = "MCPGATEWAY_PASSWORD";
pub const INSECURE_ENV: &str = "MCPGATEWAY_INSECURE";

pub struct McpGatewayProvider {
    provider_data: Option<McpGatewayProviderData>,
}

impl Default for McpGatewayProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl McpGatewayProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    pub fn provider_data(&self) -> Option<&McpGatewayProviderData> {
        self.provider_data.as_ref()
    }

    fn provider_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages objects hosted by an MCP gateway")
            .attribute(
                AttributeBuilder::new("endpoint", AttributeType::String)
                    .description("Base URL of the gateway API. Defaults to MCPGATEWAY_ENDPOINT")
                    .optional()
                    .validator(HttpUrlValidator)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("token", AttributeType::String)
                    .description("Bearer token. Defaults to MCPGATEWAY_TOKEN")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("username", AttributeType::String)
                    .description("Basic auth username. Defaults to MCPGATEWAY_USERNAME")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("Basic auth password. Defaults to MCPGATEWAY_PASSWORD")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip TLS certificate verification. Defaults to MCPGATEWAY_INSECURE")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout_seconds", AttributeType::Number)
                    .description("Per-request timeout in seconds (default 30)")
                    .optional()
                    .validator(NumberRangeValidator::at_least(1.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_retries", AttributeType::Number)
                    .description("Retries for throttled, failing or unreachable requests (default 3)")
                    .optional()
                    .validator(NumberRangeValidator::between(0.0, 10.0))
                    .build(),
            )
            .build()
    }
}

/// Config value, else a non-empty environment variable
fn setting(config: &DynamicValue, name: &str, env: &str) -> Option<String> {
    config
        .get_string_opt(&AttributePath::new(name))
        .filter(|value| !value.is_empty())
        .or_else(|| std::env::var(env).ok().filter(|value| !value.is_empty()))
}

/// Resolved provider configuration
#[derive(Debug)]
pub struct Settings {
    pub endpoint: String,
    pub auth: Auth,
    pub insecure: bool,
    pub retry: RetryConfig,
}

impl Settings {
    pub fn from_config(config: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut diagnostics = vec![];

        let endpoint = setting(config, "endpoint", ENDPOINT_ENV);
        if endpoint.is_none() {
            diagnostics.push(
                Diagnostic::error(
                    "endpoint is required",
                    format!("Set endpoint in the provider block or {}", ENDPOINT_ENV),
                )
                .with_attribute(AttributePath::new("endpoint")),
            );
        }

        let token = setting(config, "token", TOKEN_ENV);
        let username = setting(config, "username", USERNAME_ENV);
        let password = setting(config, "password", PASSWORD_ENV);
        let auth = match (token, username, password) {
            (Some(token), _, _) => Some(Auth::Bearer(token)),
            (None, Some(username), Some(password)) => Some(Auth::Basic { username, password }),
            (None, Some(_), None) => {
                diagnostics.push(
                    Diagnostic::error(
                        "password is required",
                        format!(
                            "username is set; set password in the provider block or {}",
                            PASSWORD_ENV
                        ),
                    )
                    .with_attribute(AttributePath::new("password")),
                );
                None
            }
            (None, None, _) => {
                diagnostics.push(Diagnostic::error(
                    "credentials are required",
                    format!(
                        "Set token (or {}) or username and password (or {} and {})",
                        TOKEN_ENV, USERNAME_ENV, PASSWORD_ENV
                    ),
                ));
                None
            }
        };

        let insecure = config
            .get_bool_opt(&AttributePath::new("insecure"))
            .or_else(|| {
                std::env::var(INSECURE_ENV)
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok())
            })
            .unwrap_or(false);

        let mut retry = RetryConfig::default();
        if let Some(timeout) = config.get_i64_opt(&AttributePath::new("timeout_seconds")) {
            retry.timeout_seconds = timeout.max(1) as u64;
        }
        if let Some(retries) = config.get_i64_opt(&AttributePath::new("max_retries")) {
            retry.max_retries = retries.clamp(0, 10) as u32;
        }

        match (endpoint, auth) {
            (Some(endpoint), Some(auth)) if diagnostics.is_empty() => Ok(Self {
                endpoint,
                auth,
                insecure,
                retry,
            }),
            _ => Err(diagnostics),
        }
    }
}

fn resource_factory<M: ObjectMapping>() -> ResourceFactory {
    Box::new(|| Box::new(ObjectResource::<M>::new()) as Box<dyn ResourceWithConfigure>)
}

fn data_source_factory<M: ObjectMapping>() -> DataSourceFactory {
    Box::new(|| Box::new(ObjectDataSource::<M>::new()) as Box<dyn DataSourceWithConfigure>)
}

#[async_trait]
impl Provider for McpGatewayProvider {
    fn type_name(&self) -> &str {
        "mcpgateway"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "mcpgateway".to_string(),
            server_capabilities: ServerCapabilities {
                plan_destroy: true,
                get_provider_schema_optional: false,
                move_resource_state: false,
            },
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        tracing::debug!(
            request_id = %ctx.request_id(),
            terraform_version = %request.terraform_version,
            "configuring provider"
        );

        let settings = match Settings::from_config(&request.config) {
            Ok(settings) => settings,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        match Client::with_config(
            &settings.endpoint,
            settings.auth,
            settings.insecure,
            settings.retry,
        ) {
            Ok(client) => {
                tracing::info!(endpoint = %client.base_url(), "provider configured");
                let data = McpGatewayProviderData::new(client);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(Arc::new(data) as ProviderData),
                }
            }
            Err(e) => ConfigureProviderResponse {
                diagnostics: vec![Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                )
                .with_attribute(AttributePath::new("endpoint"))],
                provider_data: None,
            },
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        let mut diagnostics = vec![];
        let config = &request.config;
        let set = |name: &str| {
            config
                .get(&AttributePath::new(name))
                .is_some_and(|value| !value.is_null())
        };

        if set("token") && set("username") {
            diagnostics.push(
                Diagnostic::error(
                    "Conflicting credentials",
                    "Set either token or username and password, not both",
                )
                .with_attribute(AttributePath::new("token")),
            );
        }
        // A missing password is reported by configure, after env fallback

        ValidateProviderConfigResponse { diagnostics }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories = HashMap::new();
        factories.insert(AgentMapping::TYPE_NAME.to_string(), resource_factory::<AgentMapping>());
        factories.insert(
            GatewayMapping::TYPE_NAME.to_string(),
            resource_factory::<GatewayMapping>(),
        );
        factories.insert(ToolMapping::TYPE_NAME.to_string(), resource_factory::<ToolMapping>());
        factories.insert(
            ResourceMapping::TYPE_NAME.to_string(),
            resource_factory::<ResourceMapping>(),
        );
        factories.insert(
            PromptMapping::TYPE_NAME.to_string(),
            resource_factory::<PromptMapping>(),
        );
        factories.insert(
            ServerMapping::TYPE_NAME.to_string(),
            resource_factory::<ServerMapping>(),
        );
        factories.insert(TeamMapping::TYPE_NAME.to_string(), resource_factory::<TeamMapping>());
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories = HashMap::new();
        factories.insert(
            AgentMapping::TYPE_NAME.to_string(),
            data_source_factory::<AgentMapping>(),
        );
        factories.insert(
            GatewayMapping::TYPE_NAME.to_string(),
            data_source_factory::<GatewayMapping>(),
        );
        factories.insert(
            ToolMapping::TYPE_NAME.to_string(),
            data_source_factory::<ToolMapping>(),
        );
        factories.insert(
            ResourceMapping::TYPE_NAME.to_string(),
            data_source_factory::<ResourceMapping>(),
        );
        factories.insert(
            PromptMapping::TYPE_NAME.to_string(),
            data_source_factory::<PromptMapping>(),
        );
        factories.insert(
            ServerMapping::TYPE_NAME.to_string(),
            data_source_factory::<ServerMapping>(),
        );
        factories.insert(
            TeamMapping::TYPE_NAME.to_string(),
            data_source_factory::<TeamMapping>(),
        );
        factories.insert(
            "mcpgateway_health".to_string(),
            Box::new(|| Box::new(HealthDataSource::new()) as Box<dyn DataSourceWithConfigure>)
                as DataSourceFactory,
        );
        factories
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::DataSource;

    fn clear_env() {
        for name in [ENDPOINT_ENV, TOKEN_ENV, USERNAME_ENV, PASSWORD_ENV, INSECURE_ENV] {
            std::env::remove_var(name);
        }
    }

    fn configure_request(config: DynamicValue) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config,
            client_capabilities: Default::default(),
        }
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_successfully_with_env_vars() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV, "http://localhost:4444");
        std::env::set_var(TOKEN_ENV, "secret");
        std::env::set_var(INSECURE_ENV, "true");

        let mut provider = McpGatewayProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(response.provider_data.is_some());
        let data = provider.provider_data().unwrap();
        assert_eq!(data.client.base_url(), "http://localhost:4444");

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_config_overrides_env_vars() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV, "http://ignored:1");
        std::env::set_var(TOKEN_ENV, "");

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("endpoint"), "https://gw.example.com/")
            .unwrap();
        config
            .set_string(&AttributePath::new("username"), "admin")
            .unwrap();
        config
            .set_string(&AttributePath::new("password"), "changeme")
            .unwrap();
        config
            .set_number(&AttributePath::new("max_retries"), 0.0)
            .unwrap();

        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.endpoint, "https://gw.example.com/");
        assert!(matches!(settings.auth, Auth::Basic { ref username, .. } if username == "admin"));
        assert_eq!(settings.retry.max_retries, 0);
        assert_eq!(settings.retry.timeout_seconds, 30);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_endpoint() {
        clear_env();
        std::env::set_var(TOKEN_ENV, "secret");

        let mut provider = McpGatewayProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.contains("endpoint is required"));
        assert!(response.provider_data.is_none());

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_requires_credentials() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV, "http://localhost:4444");

        let errors = Settings::from_config(&DynamicValue::object()).unwrap_err();
        assert_eq!(errors[0].summary, "credentials are required");

        std::env::set_var(USERNAME_ENV, "admin");
        let errors = Settings::from_config(&DynamicValue::object()).unwrap_err();
        assert_eq!(errors[0].summary, "password is required");

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn provider_configure_rejects_bad_endpoint() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV, "ftp://localhost");
        std::env::set_var(TOKEN_ENV, "secret");

        let mut provider = McpGatewayProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(DynamicValue::object()))
            .await;
        assert_eq!(response.diagnostics[0].summary, "Failed to create API client");

        clear_env();
    }

    #[tokio::test]
    async fn validate_rejects_mixed_credentials() {
        let provider = McpGatewayProvider::new();
        let mut config = DynamicValue::object();
        config.set_string(&AttributePath::new("token"), "t").unwrap();
        config
            .set_string(&AttributePath::new("username"), "admin")
            .unwrap();

        let response = provider
            .validate(Context::new(), ValidateProviderConfigRequest { config })
            .await;
        let summaries: Vec<_> = response.diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Conflicting credentials"]);
    }

    #[tokio::test]
    #[serial]
    async fn username_with_password_from_env_is_accepted() {
        clear_env();
        std::env::set_var(ENDPOINT_ENV, "http://localhost:4444");
        std::env::set_var(PASSWORD_ENV, "changeme");

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("username"), "admin")
            .unwrap();

        let mut provider = McpGatewayProvider::new();
        let validated = provider
            .validate(
                Context::new(),
                ValidateProviderConfigRequest {
                    config: config.clone(),
                },
            )
            .await;
        assert!(validated.diagnostics.is_empty(), "{:?}", validated.diagnostics);

        let response = provider
            .configure(Context::new(), configure_request(config))
            .await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(response.provider_data.is_some());

        clear_env();
    }

    #[test]
    fn registers_every_object_type() {
        let provider = McpGatewayProvider::new();

        let mut resources: Vec<_> = provider.resources().into_keys().collect();
        resources.sort();
        assert_eq!(
            resources,
            vec![
                "mcpgateway_agent",
                "mcpgateway_gateway",
                "mcpgateway_prompt",
                "mcpgateway_resource",
                "mcpgateway_server",
                "mcpgateway_team",
                "mcpgateway_tool",
            ]
        );

        let data_sources = provider.data_sources();
        assert_eq!(data_sources.len(), 8);
        assert!(data_sources.contains_key("mcpgateway_health"));
        for (name, factory) in &data_sources {
            assert_eq!(factory().type_name(), name.as_str());
        }
    }
}
