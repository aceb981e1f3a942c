//! Virtual servers API (`/servers`)

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{
    deserialize_tags, deserialize_timestamp_option, string_or_number, ActiveFlag,
    GatewayApiObject,
};
use super::objects::ObjectsApi;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(
        default,
        alias = "associated_tools",
        deserialize_with = "string_or_number::deserialize_list"
    )]
    pub associated_tools: Vec<String>,
    #[serde(
        default,
        alias = "associated_resources",
        deserialize_with = "string_or_number::deserialize_list"
    )]
    pub associated_resources: Vec<String>,
    #[serde(
        default,
        alias = "associated_prompts",
        deserialize_with = "string_or_number::deserialize_list"
    )]
    pub associated_prompts: Vec<String>,
    #[serde(
        default,
        alias = "associated_a2a_agents",
        deserialize_with = "string_or_number::deserialize_list"
    )]
    pub associated_a2a_agents: Vec<String>,
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
pub struct ServerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_tools: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_resources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_prompts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_a2a_agents: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl GatewayApiObject for Server {
    type CreateRequest = ServerRequest;
    type UpdateRequest = ServerRequest;

    const KIND: &'static str = "server";

    fn api_path() -> &'static str {
        "/servers"
    }

    fn object_id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub fn servers(&self) -> ObjectsApi<'_, Server> {
        ObjectsApi::new(self)
    }
}
