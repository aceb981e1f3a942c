//! Common types and utilities for the MCP gateway API

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Error body returned by the gateway (FastAPI style)
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: Option<ErrorDetail>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationError>),
    Other(JsonValue),
}

#[derive(Debug, Deserialize)]
pub struct ValidationError {
    #[serde(default)]
    pub loc: Vec<JsonValue>,
    pub msg: String,
}

impl ValidationError {
    /// Dotted field path without the leading "body" segment
    pub fn field(&self) -> String {
        self.loc
            .iter()
            .filter(|part| part.as_str() != Some("body"))
            .map(|part| match part {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl ApiErrorResponse {
    /// Human readable summary plus structured details
    pub fn into_details(self) -> (Option<String>, ApiErrorDetails) {
        let mut field_errors: HashMap<String, Vec<String>> = HashMap::new();
        let summary = match self.detail {
            Some(ErrorDetail::Message(message)) => Some(message),
            Some(ErrorDetail::Validation(errors)) => {
                let mut parts = Vec::with_capacity(errors.len());
                for error in errors {
                    let field = error.field();
                    if field.is_empty() {
                        parts.push(error.msg.clone());
                    } else {
                        parts.push(format!("{}: {}", field, error.msg));
                    }
                    field_errors.entry(field).or_default().push(error.msg);
                }
                Some(parts.join("; "))
            }
            Some(ErrorDetail::Other(value)) => Some(value.to_string()),
            None => self.message.clone(),
        };

        (
            summary.clone(),
            ApiErrorDetails {
                message: summary,
                field_errors,
            },
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: message={message:?}, field_errors={field_errors:?}")]
pub struct ApiErrorDetails {
    pub message: Option<String>,
    pub field_errors: HashMap<String, Vec<String>>,
}

/// An object kind living under its own collection path on the gateway
pub trait GatewayApiObject: DeserializeOwned + Send + Sync + 'static {
    type CreateRequest: Serialize + Send + Sync;
    type UpdateRequest: Serialize + Send + Sync;

    /// Singular noun used in messages, e.g. "tool"
    const KIND: &'static str;

    fn api_path() -> &'static str;

    fn resource_path(id: &str) -> String {
        format!("{}/{}", Self::api_path(), urlencoding::encode(id))
    }

    fn object_id(&self) -> &str;

    /// Whether `POST {path}/{id}/toggle` exists for this collection
    fn supports_toggle() -> bool {
        true
    }
}

/// List endpoints return either a bare array or a paged envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Paged {
        #[serde(alias = "teams", alias = "data", alias = "results")]
        items: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Paged { items } => items,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        format!(
            "?{}",
            self.params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&")
        )
    }
}

/// Active flag of an object
///
/// Gateways report it as `isActive`, `is_active` or `enabled`, and some
/// responses carry more than one of them.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ActiveFlag {
    #[serde(default, rename = "isActive")]
    is_active: Option<bool>,
    #[serde(default, rename = "is_active")]
    is_active_snake: Option<bool>,
    #[serde(default)]
    enabled: Option<bool>,
}

impl ActiveFlag {
    pub fn value(&self) -> Option<bool> {
        self.is_active.or(self.is_active_snake).or(self.enabled)
    }
}

/// Identifiers arrive as strings from some endpoints and integers from others
pub mod string_or_number {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value as JsonValue;

    fn to_id<E: serde::de::Error>(value: JsonValue) -> Result<Option<String>, E> {
        match value {
            JsonValue::Null => Ok(None),
            JsonValue::String(s) => Ok(Some(s)),
            JsonValue::Number(n) => Ok(Some(n.to_string())),
            other => Err(E::custom(format!("expected string or number id, got {}", other))),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        to_id(JsonValue::deserialize(deserializer)?)?
            .ok_or_else(|| serde::de::Error::custom("id must not be null"))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        to_id(JsonValue::deserialize(deserializer)?)
    }

    /// Lists of references, where each entry is an id or an object carrying one
    pub fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = Option::<Vec<JsonValue>>::deserialize(deserializer)?.unwrap_or_default();
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let item = match item {
                JsonValue::Object(mut fields) => fields.remove("id").unwrap_or(JsonValue::Null),
                other => other,
            };
            if let Some(id) = to_id(item)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

/// Tags are plain strings on older gateways and `{id, label}` objects on newer
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tag {
        Plain(String),
        Labeled {
            id: Option<String>,
            label: Option<String>,
        },
    }

    let tags = Option::<Vec<Tag>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(tags
        .into_iter()
        .filter_map(|tag| match tag {
            Tag::Plain(s) => Some(s),
            Tag::Labeled { id, label } => id.or(label),
        })
        .collect())
}

/// Normalizes gateway timestamps to RFC 3339 in UTC
///
/// Naive timestamps are taken to be UTC. Anything unparseable is returned
/// unchanged.
pub fn normalize_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::AutoSi, true);
        }
    }
    raw.to_string()
}

pub fn deserialize_timestamp_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|raw| normalize_timestamp(&raw)))
}
