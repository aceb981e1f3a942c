//! Data source reads against a mocked gateway

mod common;

use common::{configure, data_source, path};
use mockito::Server;
use tfplug::context::Context;
use tfplug::data_source::{DataSourceSchemaRequest, ReadDataSourceRequest};
use tfplug::types::{ClientCapabilities, Dynamic, DynamicValue};
use tfplug::DataSource;

fn lookup(type_name: &str, id: &str) -> ReadDataSourceRequest {
    let mut config = DynamicValue::object();
    let _ = config.set_string(&path("id"), id);
    ReadDataSourceRequest {
        type_name: type_name.to_string(),
        config,
        client_capabilities: ClientCapabilities::default(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn server_data_source_reads_by_id() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/servers/42")
        .with_body(
            r#"{
                "id": 42,
                "name": "toolbox",
                "associatedTools": [{"id": "t-1"}, 7],
                "isActive": true,
                "created_at": "2025-03-01T10:00:00+02:00"
            }"#,
        )
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let servers = data_source(&provider, &data, "mcpgateway_server").await;

    let response = servers
        .read(Context::new(), lookup("mcpgateway_server", "42"))
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let state = response.state;
    assert_eq!(state.get_string_opt(&path("id")).as_deref(), Some("42"));
    assert_eq!(
        state.get_string_list_opt(&path("associated_tools")),
        Some(vec!["t-1".to_string(), "7".to_string()])
    );
    assert_eq!(state.get_bool_opt(&path("enabled")), Some(true));
    assert_eq!(
        state.get_string_opt(&path("created_at")).as_deref(),
        Some("2025-03-01T08:00:00Z")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_object_is_an_error() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/prompts/nope")
        .with_status(404)
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let prompts = data_source(&provider, &data, "mcpgateway_prompt").await;

    let response = prompts
        .read(Context::new(), lookup("mcpgateway_prompt", "nope"))
        .await;
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "prompt not found");
    assert!(response.state.is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn resource_data_source_hides_content() {
    let server = Server::new_async().await;
    let (provider, data) = configure(&server.url()).await;
    let resources = data_source(&provider, &data, "mcpgateway_resource").await;

    let schema = resources
        .schema(Context::new(), DataSourceSchemaRequest)
        .await
        .schema;
    assert!(schema.attribute("content").is_none());
    assert!(schema.attribute("id").unwrap().required);
}

#[tokio::test(flavor = "multi_thread")]
async fn health_data_source_reports_status() {
    let mut server = Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_body(r#"{"status": "healthy", "version": "0.7.0"}"#)
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let health = data_source(&provider, &data, "mcpgateway_health").await;

    let response = health
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "mcpgateway_health".to_string(),
                config: DynamicValue::object(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(response.state.get_bool_opt(&path("healthy")), Some(true));
    let details = response.state.get_map_opt(&path("details")).unwrap();
    assert_eq!(details["version"], Dynamic::String("0.7.0".to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfigured_data_source_reports_it() {
    let provider = mcpgateway::McpGatewayProvider::new();
    let factories = tfplug::Provider::data_sources(&provider);
    let tools = factories.get("mcpgateway_tool").unwrap()();

    let response = tools
        .read(Context::new(), lookup("mcpgateway_tool", "t-1"))
        .await;
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}
