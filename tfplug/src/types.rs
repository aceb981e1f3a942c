//! Core type system for tfplug
//!
//! This module provides the value model shared by the protocol service and
//! provider implementations: `Dynamic` values, the `DynamicValue` wrapper with
//! path-based accessors, attribute paths and diagnostics.

use crate::error::{Result, TfplugError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// msgpack extension type Terraform uses to mark unknown values
pub(crate) const UNKNOWN_EXT_TYPE: i8 = 0;

/// Dynamic represents Terraform values that can be of any type
/// This is the core type for all configuration and state data
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Dynamic {
    /// Explicit null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Number value (all numbers are f64 to match Terraform)
    Number(f64),
    /// String value
    String(String),
    /// Ordered values; also carries sets and tuples
    List(Vec<Dynamic>),
    /// Map of string keys to values (objects are represented as Maps)
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    /// True when neither this value nor anything nested in it is unknown
    pub fn is_fully_known(&self) -> bool {
        match self {
            Dynamic::Unknown => false,
            Dynamic::List(items) => items.iter().all(Dynamic::is_fully_known),
            Dynamic::Map(map) => map.values().all(Dynamic::is_fully_known),
            _ => true,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Replaces every unknown, at any depth, with null
    pub fn null_unknowns(self) -> Dynamic {
        match self {
            Dynamic::Unknown => Dynamic::Null,
            Dynamic::List(items) => {
                Dynamic::List(items.into_iter().map(Dynamic::null_unknowns).collect())
            }
            Dynamic::Map(map) => Dynamic::Map(
                map.into_iter()
                    .map(|(k, v)| (k, v.null_unknowns()))
                    .collect(),
            ),
            other => other,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Number(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Number(value as f64)
    }
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Dynamic::Null)
    }
}

/// Serializes as raw msgpack `bin` rather than an array of integers
pub(crate) struct RawBytes<'a>(pub(crate) &'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(self.0)
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serialize_number(*n, serializer),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            // rmp-serde writes this newtype name as a msgpack extension
            Dynamic::Unknown => serializer.serialize_newtype_struct(
                "_ExtStruct",
                &(UNKNOWN_EXT_TYPE, RawBytes(&[0])),
            ),
        }
    }
}

/// Integral numbers go out as integers so Terraform sees exact values
pub(crate) fn serialize_number<S>(n: f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    // i64::MAX as f64 rounds up to 2^63, which no i64 can hold
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < 9_223_372_036_854_775_808.0 {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ExtVisitor;

        impl<'de> Visitor<'de> for ExtVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a msgpack extension value")
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let tag: i8 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::custom("extension without type tag"))?;
                let _: Option<de::IgnoredAny> = seq.next_element()?;
                if tag == UNKNOWN_EXT_TYPE {
                    Ok(Dynamic::Unknown)
                } else {
                    Err(de::Error::custom(format!(
                        "unsupported msgpack extension type {}",
                        tag
                    )))
                }
            }
        }

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a valid Dynamic value")
            }

            fn visit_unit<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Dynamic, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Dynamic::deserialize(deserializer)
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::String(value))
            }

            // Terraform sends type descriptions of dynamic values as bin
            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::String(String::from_utf8_lossy(value).into_owned()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                self.visit_bytes(&value)
            }

            fn visit_newtype_struct<D>(
                self,
                deserializer: D,
            ) -> std::result::Result<Dynamic, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_any(ExtVisitor)
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Dynamic::List(vec))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut hashmap = HashMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Dynamic>()? {
                    hashmap.insert(key, value);
                }
                Ok(Dynamic::Map(hashmap))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

/// DynamicValue wraps Dynamic and provides path-based access
/// This is what gets passed between the framework and resources
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    /// Empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    /// Raw lookup; None when any step is missing
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        self.navigate_path(path).ok()
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            _ => Err(type_mismatch("string", value)),
        }
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::Number(n) => Ok(*n),
            _ => Err(type_mismatch("number", value)),
        }
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::Bool(b) => Ok(*b),
            _ => Err(type_mismatch("bool", value)),
        }
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::List(l) => Ok(l.clone()),
            _ => Err(type_mismatch("list", value)),
        }
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::Map(m) => Ok(m.clone()),
            _ => Err(type_mismatch("map", value)),
        }
    }

    /// Lenient accessors: absent, null and unknown all read as None
    pub fn get_string_opt(&self, path: &AttributePath) -> Option<String> {
        self.get(path).and_then(Dynamic::as_string).map(String::from)
    }

    pub fn get_number_opt(&self, path: &AttributePath) -> Option<f64> {
        self.get(path).and_then(Dynamic::as_number)
    }

    pub fn get_i64_opt(&self, path: &AttributePath) -> Option<i64> {
        self.get_number_opt(path).map(|n| n as i64)
    }

    pub fn get_bool_opt(&self, path: &AttributePath) -> Option<bool> {
        self.get(path).and_then(Dynamic::as_bool)
    }

    pub fn get_list_opt(&self, path: &AttributePath) -> Option<Vec<Dynamic>> {
        self.get(path).and_then(Dynamic::as_list).map(<[_]>::to_vec)
    }

    pub fn get_map_opt(&self, path: &AttributePath) -> Option<HashMap<String, Dynamic>> {
        self.get(path).and_then(Dynamic::as_map).cloned()
    }

    /// Known string elements of a list attribute
    pub fn get_string_list_opt(&self, path: &AttributePath) -> Option<Vec<String>> {
        self.get(path).and_then(Dynamic::as_list).map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_string().map(String::from))
                .collect()
        })
    }

    /// Known string values of a map attribute
    pub fn get_string_map_opt(&self, path: &AttributePath) -> Option<HashMap<String, String>> {
        self.get(path).and_then(Dynamic::as_map).map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_string().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
    }

    pub fn set_string(&mut self, path: &AttributePath, value: impl Into<String>) -> Result<()> {
        self.set_value(path, Dynamic::String(value.into()))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(value))
    }

    pub fn set_map(&mut self, path: &AttributePath, value: HashMap<String, Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::Map(value))
    }

    pub fn set_null(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Null)
    }

    /// Mark computed values as unknown during planning
    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::Unknown)
    }

    /// Sets a value, creating intermediate maps as needed
    pub fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = new_value;
            return Ok(());
        };

        let mut current = &mut self.value;
        for step in parents {
            current = match step {
                AttributePathStep::AttributeName(name) | AttributePathStep::ElementKeyString(name) => {
                    if !matches!(current, Dynamic::Map(_)) {
                        *current = Dynamic::Map(HashMap::new());
                    }
                    let Dynamic::Map(m) = current else {
                        return Err(TfplugError::Custom(format!("cannot set {}", path)));
                    };
                    m.entry(name.clone())
                        .or_insert_with(|| Dynamic::Map(HashMap::new()))
                }
                AttributePathStep::ElementKeyInt(idx) => match current {
                    Dynamic::List(l) => l.get_mut(*idx as usize).ok_or_else(|| {
                        TfplugError::AttributeNotFound(format!("list index {} out of bounds", idx))
                    })?,
                    other => return Err(type_mismatch("list", other)),
                },
            };
        }

        match last {
            AttributePathStep::AttributeName(name) | AttributePathStep::ElementKeyString(name) => {
                if !matches!(current, Dynamic::Map(_)) {
                    *current = Dynamic::Map(HashMap::new());
                }
                if let Dynamic::Map(m) = current {
                    m.insert(name.clone(), new_value);
                }
                Ok(())
            }
            AttributePathStep::ElementKeyInt(idx) => match current {
                Dynamic::List(l) => {
                    let slot = l.get_mut(*idx as usize).ok_or_else(|| {
                        TfplugError::AttributeNotFound(format!("list index {} out of bounds", idx))
                    })?;
                    *slot = new_value;
                    Ok(())
                }
                other => Err(type_mismatch("list", other)),
            },
        }
    }

    fn navigate_path<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m
                    .get(name)
                    .ok_or_else(|| TfplugError::AttributeNotFound(name.clone()))?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    l.get(*idx as usize).ok_or_else(|| {
                        TfplugError::AttributeNotFound(format!("list index {} out of bounds", idx))
                    })?
                }
                (other, _) => {
                    return Err(TfplugError::AttributeNotFound(format!(
                        "cannot navigate {} at {}",
                        other.type_name(),
                        path
                    )))
                }
            };
        }

        Ok(current)
    }
}

impl From<Dynamic> for DynamicValue {
    fn from(value: Dynamic) -> Self {
        Self::new(value)
    }
}

fn type_mismatch(expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// AttributePath represents a path to an attribute within a DynamicValue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[{:?}]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Individual step in an AttributePath
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributePathStep {
    /// Access attribute by name in object
    AttributeName(String),
    /// Access element by string key (for maps)
    ElementKeyString(String),
    /// Access element by integer index (for lists)
    ElementKeyInt(i64),
}

/// RawState holds the stored state for a resource to be upgraded
#[derive(Debug, Clone, Default)]
pub struct RawState {
    pub json: Option<Vec<u8>>,
    pub flatmap: Option<HashMap<String, String>>,
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}

pub type Diagnostics = Vec<Diagnostic>;

/// Helpers over diagnostic collections
pub trait DiagnosticsExt {
    fn has_errors(&self) -> bool;
    fn error_count(&self) -> usize;
}

impl DiagnosticsExt for [Diagnostic] {
    fn has_errors(&self) -> bool {
        self.iter().any(Diagnostic::is_error)
    }

    fn error_count(&self) -> usize {
        self.iter().filter(|d| d.is_error()).count()
    }
}

/// ServerCapabilities indicates provider capabilities
#[derive(Debug, Clone, Default)]
pub struct ServerCapabilities {
    pub plan_destroy: bool,
    pub get_provider_schema_optional: bool,
    pub move_resource_state: bool,
}

/// ClientCapabilities indicates Terraform client capabilities
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub deferral_allowed: bool,
    pub write_only_attributes_allowed: bool,
}

/// Deferred indicates a deferred change
#[derive(Debug, Clone)]
pub struct Deferred {
    pub reason: DeferredReason,
}

/// Reason for deferring a change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredReason {
    Unknown,
    ResourceConfigUnknown,
    ProviderConfigUnknown,
    AbsentPrereq,
}

/// Config represents configuration values
pub type Config = DynamicValue;

/// State represents resource state values
pub type State = DynamicValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_serialize_as_integers_only_when_exact() {
        let json = |n: f64| serde_json::to_string(&Dynamic::Number(n)).unwrap();
        assert_eq!(json(42.0), "42");
        assert_eq!(json(-9_223_372_036_854_775_808.0), "-9223372036854775808");
        assert_eq!(json(1.5), "1.5");
        assert_eq!(json(9_223_372_036_854_775_808.0), "9.223372036854776e18");
    }

    #[test]
    fn dynamic_value_string_access() {
        let mut dv = DynamicValue::object();
        dv.set_string(&AttributePath::new("name"), "test").unwrap();

        let result = dv.get_string(&AttributePath::new("name")).unwrap();
        assert_eq!(result, "test");
    }

    #[test]
    fn setters_create_intermediate_maps() {
        let mut dv = DynamicValue::null();
        let path = AttributePath::new("config").attribute("endpoint");
        dv.set_string(&path, "https://example.com").unwrap();

        assert_eq!(dv.get_string(&path).unwrap(), "https://example.com");
        assert!(dv.get_map(&AttributePath::new("config")).is_ok());
    }

    #[test]
    fn strict_getters_report_mismatch_and_absence() {
        let mut dv = DynamicValue::object();
        dv.set_number(&AttributePath::new("port"), 8080.0).unwrap();

        match dv.get_string(&AttributePath::new("port")) {
            Err(TfplugError::TypeMismatch { expected, actual }) => {
                assert_eq!(expected, "string");
                assert_eq!(actual, "number");
            }
            other => panic!("expected type mismatch, got {:?}", other),
        }
        assert!(matches!(
            dv.get_bool(&AttributePath::new("missing")),
            Err(TfplugError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn lenient_getters_treat_null_and_unknown_as_absent() {
        let mut dv = DynamicValue::object();
        dv.set_null(&AttributePath::new("a")).unwrap();
        dv.mark_unknown(&AttributePath::new("b")).unwrap();
        dv.set_bool(&AttributePath::new("c"), true).unwrap();

        assert_eq!(dv.get_string_opt(&AttributePath::new("a")), None);
        assert_eq!(dv.get_string_opt(&AttributePath::new("b")), None);
        assert_eq!(dv.get_string_opt(&AttributePath::new("zz")), None);
        assert_eq!(dv.get_bool_opt(&AttributePath::new("c")), Some(true));
    }

    #[test]
    fn unknown_round_trips_as_msgpack_extension() {
        let bytes = rmp_serde::to_vec(&Dynamic::Unknown).unwrap();
        assert_eq!(bytes, vec![0xd4, 0x00, 0x00]);

        let decoded: Dynamic = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded, Dynamic::Unknown);
    }

    #[test]
    fn msgpack_bin_decodes_as_string() {
        let bytes = rmp_serde::to_vec(&RawBytes(b"\"string\"")).unwrap();
        let decoded: Dynamic = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded, Dynamic::String("\"string\"".to_string()));
    }

    #[test]
    fn integral_numbers_encode_as_integers() {
        let bytes = rmp_serde::to_vec(&Dynamic::Number(5.0)).unwrap();
        assert_eq!(bytes, vec![0x05]);
    }

    #[test]
    fn null_unknowns_reaches_nested_values() {
        let value = Dynamic::Map(HashMap::from([(
            "items".to_string(),
            Dynamic::List(vec![Dynamic::Unknown, Dynamic::Bool(true)]),
        )]));

        assert!(!value.is_fully_known());
        let cleaned = value.null_unknowns();
        assert!(cleaned.is_fully_known());
    }

    #[test]
    fn attribute_path_display() {
        let path = AttributePath::new("arguments").index(0).attribute("name");
        assert_eq!(path.to_string(), "arguments[0].name");

        let path = AttributePath::new("headers").key("X-Api");
        assert_eq!(path.to_string(), "headers[\"X-Api\"]");
    }

    #[test]
    fn diagnostics_helpers_count_errors() {
        let diags = vec![
            Diagnostic::warning("careful", ""),
            Diagnostic::error("broken", "detail").with_attribute(AttributePath::new("name")),
        ];
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
    }
}
