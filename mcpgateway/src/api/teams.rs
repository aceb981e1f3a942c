//! Teams API (`/teams`)

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::{
    deserialize_timestamp_option, string_or_number, ActiveFlag, GatewayApiObject,
};
use super::objects::ObjectsApi;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "is_personal")]
    pub is_personal: Option<bool>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default, alias = "max_members")]
    pub max_members: Option<u64>,
    #[serde(default, alias = "member_count")]
    pub member_count: Option<u64>,
    #[serde(default, alias = "created_by")]
    pub created_by: Option<String>,
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
pub struct TeamRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_members: Option<u64>,
}

impl GatewayApiObject for Team {
    type CreateRequest = TeamRequest;
    type UpdateRequest = TeamRequest;

    const KIND: &'static str = "team";

    fn api_path() -> &'static str {
        "/teams"
    }

    fn object_id(&self) -> &str {
        &self.id
    }

    fn supports_toggle() -> bool {
        false
    }
}

impl Client {
    pub fn teams(&self) -> ObjectsApi<'_, Team> {
        ObjectsApi::new(self)
    }
}
