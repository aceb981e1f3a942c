//! Tools API (`/tools`)

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use super::client::Client;
use super::common::{
    deserialize_tags, deserialize_timestamp_option, string_or_number, ActiveFlag,
    GatewayApiObject,
};
use super::objects::ObjectsApi;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    pub name: String,
    /// Name as submitted; `name` may be slugified by the gateway
    #[serde(default, alias = "original_name")]
    pub original_name: Option<String>,
    #[serde(default, alias = "display_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "integration_type")]
    pub integration_type: Option<String>,
    #[serde(default, alias = "request_type")]
    pub request_type: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, alias = "input_schema")]
    pub input_schema: Option<JsonValue>,
    #[serde(default)]
    pub annotations: Option<JsonValue>,
    #[serde(default, alias = "jsonpath_filter")]
    pub jsonpath_filter: Option<String>,
    #[serde(
        default,
        alias = "gateway_id",
        deserialize_with = "string_or_number::deserialize_option"
    )]
    pub gateway_id: Option<String>,
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

/// Credentials the gateway uses when it calls the tool
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ToolAuth {
    pub auth_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_header_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_header_value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonpath_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<ToolAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl GatewayApiObject for Tool {
    type CreateRequest = ToolRequest;
    type UpdateRequest = ToolRequest;

    const KIND: &'static str = "tool";

    fn api_path() -> &'static str {
        "/tools"
    }

    fn object_id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub fn tools(&self) -> ObjectsApi<'_, Tool> {
        ObjectsApi::new(self)
    }
}
