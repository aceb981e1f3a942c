//! Gateways API (`/gateways`), the federated MCP servers behind the gateway

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::client::Client;
use super::common::{
    deserialize_tags, deserialize_timestamp_option, string_or_number, ActiveFlag,
    GatewayApiObject,
};
use super::objects::ObjectsApi;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub capabilities: Option<JsonValue>,
    #[serde(default, alias = "passthrough_headers")]
    pub passthrough_headers: Option<Vec<String>>,
    #[serde(default, alias = "auth_type")]
    pub auth_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(
        default,
        alias = "team_id",
        deserialize_with = "string_or_number::deserialize_option"
    )]
    pub team_id: Option<String>,
    #[serde(default, alias = "owner_email")]
    pub owner_email: Option<String>,
    #[serde(flatten)]
    pub active: ActiveFlag,
    #[serde(default)]
    pub reachable: Option<bool>,
    #[serde(
        default,
        alias = "last_seen",
        deserialize_with = "deserialize_timestamp_option"
    )]
    pub last_seen: Option<String>,
    #[serde(
        default,
        alias = "created_at",
        deserialize_with = "deserialize_timestamp_option"
    )]
    pub created_at: Option<String>,
    #[serde(
        default,
        alias = "updated_at",
        deserialize_with = "deserialize_timestamp_option"
    )]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GatewayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passthrough_headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_header_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_header_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl GatewayApiObject for Gateway {
    type CreateRequest = GatewayRequest;
    type UpdateRequest = GatewayRequest;

    const KIND: &'static str = "gateway";

    fn api_path() -> &'static str {
        "/gateways"
    }

    fn object_id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub fn gateways(&self) -> ObjectsApi<'_, Gateway> {
        ObjectsApi::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_gateway() {
        let gateway: Gateway = serde_json::from_str(
            r#"{
                "id": "g-1",
                "name": "upstream",
                "slug": "upstream",
                "url": "https://mcp.example.com/sse",
                "transport": "SSE",
                "capabilities": {"tools": {"listChanged": true}},
                "passthroughHeaders": ["X-Tenant"],
                "authType": "bearer",
                "tags": ["prod"],
                "isActive": true,
                "lastSeen": "2025-05-05T12:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(gateway.transport.as_deref(), Some("SSE"));
        assert_eq!(
            gateway.capabilities.unwrap()["tools"]["listChanged"],
            JsonValue::Bool(true)
        );
        assert_eq!(gateway.passthrough_headers.unwrap(), vec!["X-Tenant"]);
        assert_eq!(gateway.active.value(), Some(true));
        assert_eq!(gateway.last_seen.as_deref(), Some("2025-05-05T12:00:00Z"));
    }
}
