//! Prompt templates API (`/prompts`)

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{
    deserialize_tags, deserialize_timestamp_option, string_or_number, ActiveFlag,
    GatewayApiObject,
};
use super::objects::ObjectsApi;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<PromptArgument>>,
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
pub struct PromptRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl GatewayApiObject for Prompt {
    type CreateRequest = PromptRequest;
    type UpdateRequest = PromptRequest;

    const KIND: &'static str = "prompt";

    fn api_path() -> &'static str {
        "/prompts"
    }

    fn object_id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub fn prompts(&self) -> ObjectsApi<'_, Prompt> {
        ObjectsApi::new(self)
    }
}
