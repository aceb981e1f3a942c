//! MCP resources API (`/resources`)

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{
    deserialize_tags, deserialize_timestamp_option, string_or_number, ActiveFlag,
    GatewayApiObject,
};
use super::objects::ObjectsApi;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpResource {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
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
pub struct ResourceCreateRequest {
    pub uri: String,
    pub name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// The URI is immutable; changing it replaces the resource
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl GatewayApiObject for McpResource {
    type CreateRequest = ResourceCreateRequest;
    type UpdateRequest = ResourceUpdateRequest;

    const KIND: &'static str = "resource";

    fn api_path() -> &'static str {
        "/resources"
    }

    fn object_id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub fn resources(&self) -> ObjectsApi<'_, McpResource> {
        ObjectsApi::new(self)
    }
}
