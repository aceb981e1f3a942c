//! Lifecycle of the non-tool object kinds against a mocked gateway

mod common;

use std::collections::HashMap;

use common::{configure, path, resource};
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::resource::{CreateResourceRequest, ReadResourceRequest, UpdateResourceRequest};
use tfplug::types::{ClientCapabilities, Dynamic, DynamicValue};
use tfplug::Resource;

fn update_request(
    type_name: &str,
    prior_state: DynamicValue,
    planned_state: DynamicValue,
) -> UpdateResourceRequest {
    UpdateResourceRequest {
        type_name: type_name.to_string(),
        prior_state,
        planned_state: planned_state.clone(),
        config: planned_state,
        planned_private: vec![],
    }
}

fn read_request(type_name: &str, current_state: DynamicValue) -> ReadResourceRequest {
    ReadResourceRequest {
        type_name: type_name.to_string(),
        current_state,
        private: vec![],
        client_capabilities: ClientCapabilities::default(),
    }
}

fn resource_body(team_id: &str) -> String {
    json!({
        "id": 5,
        "uri": "docs://readme",
        "name": "readme",
        "mimeType": "text/markdown",
        "size": 7,
        "visibility": "team",
        "teamId": team_id,
        "isActive": true,
        "enabled": true
    })
    .to_string()
}

fn resource_state(team_id: &str) -> DynamicValue {
    let mut state = DynamicValue::object();
    let _ = state.set_string(&path("id"), "5");
    let _ = state.set_string(&path("uri"), "docs://readme");
    let _ = state.set_string(&path("name"), "readme");
    let _ = state.set_string(&path("content"), "# Hello");
    let _ = state.set_string(&path("visibility"), "team");
    let _ = state.set_string(&path("team_id"), team_id);
    let _ = state.set_bool(&path("enabled"), true);
    state
}

#[tokio::test(flavor = "multi_thread")]
async fn resource_update_moves_it_to_another_team() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PUT", "/resources/5")
        .match_body(Matcher::PartialJson(json!({
            "name": "readme",
            "content": "# Hello",
            "team_id": "team-b"
        })))
        .with_body(resource_body("team-b"))
        .create_async()
        .await;
    let _refresh = server
        .mock("GET", "/resources/5")
        .with_body(resource_body("team-b"))
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let resources = resource(&provider, &data, "mcpgateway_resource").await;

    let response = resources
        .update(
            Context::new(),
            update_request(
                "mcpgateway_resource",
                resource_state("team-a"),
                resource_state("team-b"),
            ),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response.new_state.get_string_opt(&path("team_id")).as_deref(),
        Some("team-b")
    );
    assert_eq!(response.new_state.get_bool_opt(&path("enabled")), Some(true));
    update.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn resource_read_keeps_content() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/resources/5")
        .with_body(resource_body("team-a"))
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let resources = resource(&provider, &data, "mcpgateway_resource").await;

    let state = resources
        .read(
            Context::new(),
            read_request("mcpgateway_resource", resource_state("team-a")),
        )
        .await
        .new_state
        .expect("resource still exists");

    assert_eq!(state.get_string_opt(&path("content")).as_deref(), Some("# Hello"));
    assert_eq!(state.get_number_opt(&path("size")), Some(7.0));
    assert_eq!(
        state.get_string_opt(&path("mime_type")).as_deref(),
        Some("text/markdown")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn team_update_never_toggles() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PUT", "/teams/team-1")
        .match_body(Matcher::PartialJson(json!({
            "name": "Platform",
            "max_members": 50
        })))
        .with_body(
            json!({
                "id": "team-1",
                "name": "Platform",
                "slug": "platform",
                "visibility": "private",
                "maxMembers": 50,
                "memberCount": 3,
                "is_active": false
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _refresh = server
        .mock("GET", "/teams/team-1")
        .with_body(
            json!({
                "id": "team-1",
                "name": "Platform",
                "slug": "platform",
                "visibility": "private",
                "maxMembers": 50,
                "memberCount": 3,
                "is_active": false
            })
            .to_string(),
        )
        .create_async()
        .await;
    let toggle = server
        .mock("POST", Matcher::Regex("^/teams/team-1/toggle".to_string()))
        .expect(0)
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let teams = resource(&provider, &data, "mcpgateway_team").await;

    let mut prior_state = DynamicValue::object();
    let _ = prior_state.set_string(&path("id"), "team-1");
    let _ = prior_state.set_string(&path("name"), "Platform");
    let _ = prior_state.set_string(&path("visibility"), "private");
    let _ = prior_state.set_number(&path("max_members"), 25.0);
    let _ = prior_state.set_bool(&path("enabled"), true);
    let mut planned_state = prior_state.clone();
    let _ = planned_state.set_number(&path("max_members"), 50.0);
    let _ = planned_state.mark_unknown(&path("enabled"));

    let response = teams
        .update(
            Context::new(),
            update_request("mcpgateway_team", prior_state, planned_state),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.new_state.get_bool_opt(&path("enabled")), Some(false));
    assert_eq!(response.new_state.get_number_opt(&path("max_members")), Some(50.0));
    update.assert_async().await;
    toggle.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn gateway_create_sends_flat_credentials() {
    let gateway = json!({
        "id": "g-1",
        "name": "upstream",
        "slug": "upstream",
        "url": "https://mcp.example.com/sse",
        "transport": "SSE",
        "authType": "basic",
        "enabled": true,
        "isActive": true,
        "reachable": true
    })
    .to_string();

    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/gateways")
        .match_body(Matcher::PartialJson(json!({
            "name": "upstream",
            "url": "https://mcp.example.com/sse",
            "auth_type": "basic",
            "auth_username": "svc",
            "auth_password": "hunter2"
        })))
        .with_status(201)
        .with_body(&gateway)
        .create_async()
        .await;
    let _refresh = server
        .mock("GET", "/gateways/g-1")
        .with_body(&gateway)
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let gateways = resource(&provider, &data, "mcpgateway_gateway").await;

    let mut plan = DynamicValue::object();
    let _ = plan.set_string(&path("name"), "upstream");
    let _ = plan.set_string(&path("url"), "https://mcp.example.com/sse");
    let _ = plan.set_string(&path("auth_type"), "basic");
    let _ = plan.set_string(&path("auth_username"), "svc");
    let _ = plan.set_string(&path("auth_password"), "hunter2");
    let _ = plan.set_bool(&path("enabled"), true);
    for computed in ["id", "slug", "reachable"] {
        let _ = plan.mark_unknown(&path(computed));
    }

    let response = gateways
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "mcpgateway_gateway".to_string(),
                planned_state: plan.clone(),
                config: plan,
                planned_private: vec![],
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.new_state;
    assert_eq!(state.get_string_opt(&path("id")).as_deref(), Some("g-1"));
    assert_eq!(state.get_string_opt(&path("slug")).as_deref(), Some("upstream"));
    assert_eq!(
        state.get_string_opt(&path("auth_password")).as_deref(),
        Some("hunter2")
    );
    assert_eq!(state.get_bool_opt(&path("enabled")), Some(true));
    create.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn prompt_read_keeps_unset_argument_fields() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/prompts/p-1")
        .with_body(
            json!({
                "id": "p-1",
                "name": "greet",
                "template": "Hello {{ who }}",
                "arguments": [
                    {"name": "who", "description": null, "required": false}
                ],
                "isActive": true
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (provider, data) = configure(&server.url()).await;
    let prompts = resource(&provider, &data, "mcpgateway_prompt").await;

    let mut argument = HashMap::new();
    argument.insert("name".to_string(), Dynamic::String("who".to_string()));
    argument.insert("description".to_string(), Dynamic::Null);
    argument.insert("required".to_string(), Dynamic::Null);
    let arguments = Dynamic::List(vec![Dynamic::Map(argument)]);

    let mut state = DynamicValue::object();
    let _ = state.set_string(&path("id"), "p-1");
    let _ = state.set_string(&path("name"), "greet");
    let _ = state.set_string(&path("template"), "Hello {{ who }}");
    let _ = state.set_value(&path("arguments"), arguments.clone());

    let state = prompts
        .read(Context::new(), read_request("mcpgateway_prompt", state))
        .await
        .new_state
        .expect("prompt still exists");

    assert_eq!(state.get(&path("arguments")), Some(&arguments));
    assert_eq!(state.get_bool_opt(&path("enabled")), Some(true));
}
