//! Schema-aware encoding of values on the wire
//!
//! Terraform decodes every value against the schema type it expects, so the
//! encoder has to follow that type rather than the shape of the value:
//! objects carry every declared attribute (absent ones as nil) and values in
//! `dynamic` positions are wrapped as `[type-json, value]`. Decoding reverses
//! both rules so resources always see a value conformed to their schema.

use crate::convert::{dynamic_to_json, infer_type};
use crate::error::{Result, TfplugError};
use crate::schema::AttributeType;
use crate::types::{Dynamic, DynamicValue, RawBytes};
use serde::ser::{SerializeMap, SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

static NULL: Dynamic = Dynamic::Null;

/// Encodes a value as msgpack following `ty`
pub fn encode(value: &Dynamic, ty: &AttributeType) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(&Typed { value, ty })
        .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {}", e)))
}

/// Decodes msgpack sent by Terraform; empty input is null
pub fn decode(bytes: &[u8], ty: &AttributeType) -> Result<DynamicValue> {
    if bytes.is_empty() {
        return Ok(DynamicValue::null());
    }
    let raw: Dynamic = rmp_serde::from_slice(bytes)
        .map_err(|e| TfplugError::DecodingError(format!("msgpack decoding failed: {}", e)))?;
    Ok(DynamicValue::new(conform(raw, ty, Wire::Msgpack)?))
}

/// Decodes JSON state, as stored in the state file and sent for upgrades
pub fn decode_json(bytes: &[u8], ty: &AttributeType) -> Result<DynamicValue> {
    if bytes.is_empty() {
        return Ok(DynamicValue::null());
    }
    let raw: Dynamic = serde_json::from_slice(bytes)
        .map_err(|e| TfplugError::DecodingError(format!("json decoding failed: {}", e)))?;
    Ok(DynamicValue::new(conform(raw, ty, Wire::Json)?))
}

#[derive(Clone, Copy)]
enum Wire {
    Msgpack,
    Json,
}

/// Reshapes a decoded value to `ty`: unwraps dynamic values, fills absent
/// object attributes with null and drops attributes the type does not know
fn conform(value: Dynamic, ty: &AttributeType, wire: Wire) -> Result<Dynamic> {
    match (value, ty) {
        (value @ (Dynamic::Null | Dynamic::Unknown), _) => Ok(value),
        (value, AttributeType::Dynamic) => unwrap_dynamic(value, wire),
        (Dynamic::Map(mut map), AttributeType::Object(attrs)) => {
            let mut conformed = HashMap::with_capacity(attrs.len());
            for (name, attr_ty) in attrs {
                let field = map.remove(name).unwrap_or(Dynamic::Null);
                conformed.insert(name.clone(), conform(field, attr_ty, wire)?);
            }
            Ok(Dynamic::Map(conformed))
        }
        (Dynamic::Map(map), AttributeType::Map(elem)) => Ok(Dynamic::Map(
            map.into_iter()
                .map(|(k, v)| conform(v, elem, wire).map(|v| (k, v)))
                .collect::<Result<_>>()?,
        )),
        (Dynamic::List(items), AttributeType::List(elem) | AttributeType::Set(elem)) => {
            Ok(Dynamic::List(
                items
                    .into_iter()
                    .map(|item| conform(item, elem, wire))
                    .collect::<Result<_>>()?,
            ))
        }
        (Dynamic::List(items), AttributeType::Tuple(elems)) => Ok(Dynamic::List(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| conform(item, elems.get(i).unwrap_or(&AttributeType::Dynamic), wire))
                .collect::<Result<_>>()?,
        )),
        (value, _) => Ok(value),
    }
}

fn unwrap_dynamic(value: Dynamic, wire: Wire) -> Result<Dynamic> {
    match (wire, value) {
        (Wire::Msgpack, Dynamic::List(mut pair))
            if pair.len() == 2 && matches!(pair[0], Dynamic::String(_)) =>
        {
            let inner = pair.pop().unwrap_or_default();
            let description = pair.pop().unwrap_or_default();
            let ty = match &description {
                Dynamic::String(s) => AttributeType::from_type_bytes(s.as_bytes())?,
                _ => AttributeType::Dynamic,
            };
            conform(inner, &ty, Wire::Msgpack)
        }
        (Wire::Json, Dynamic::Map(mut map))
            if map.len() == 2 && map.contains_key("value") && map.contains_key("type") =>
        {
            let description = map.remove("type").unwrap_or_default();
            let inner = map.remove("value").unwrap_or_default();
            let ty = AttributeType::from_json(&dynamic_to_json(&description)?)?;
            conform(inner, &ty, Wire::Json)
        }
        (_, value) => Ok(value),
    }
}

/// A value paired with the type it must be written as
struct Typed<'a> {
    value: &'a Dynamic,
    ty: &'a AttributeType,
}

impl Serialize for Typed<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match (self.value, self.ty) {
            (Dynamic::Null | Dynamic::Unknown, _) => self.value.serialize(serializer),
            (value, AttributeType::Dynamic) => {
                let concrete = infer_type(value);
                let description = concrete.to_type_bytes();
                let mut pair = serializer.serialize_tuple(2)?;
                pair.serialize_element(&RawBytes(&description))?;
                pair.serialize_element(&Typed {
                    value,
                    ty: &concrete,
                })?;
                pair.end()
            }
            (Dynamic::Map(map), AttributeType::Object(attrs)) => {
                let mut object = serializer.serialize_map(Some(attrs.len()))?;
                for (name, attr_ty) in attrs {
                    let field = map.get(name).unwrap_or(&NULL);
                    object.serialize_entry(name, &Typed {
                        value: field,
                        ty: attr_ty,
                    })?;
                }
                object.end()
            }
            (Dynamic::Map(map), AttributeType::Map(elem)) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, item) in map {
                    out.serialize_entry(key, &Typed {
                        value: item,
                        ty: elem,
                    })?;
                }
                out.end()
            }
            (Dynamic::List(items), AttributeType::List(elem) | AttributeType::Set(elem)) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Typed {
                        value: item,
                        ty: elem,
                    })?;
                }
                seq.end()
            }
            (Dynamic::List(items), AttributeType::Tuple(elems)) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for (i, item) in items.iter().enumerate() {
                    seq.serialize_element(&Typed {
                        value: item,
                        ty: elems.get(i).unwrap_or(&AttributeType::Dynamic),
                    })?;
                }
                seq.end()
            }
            (value, _) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_type() -> AttributeType {
        AttributeType::object([
            ("id", AttributeType::String),
            ("name", AttributeType::String),
            ("tags", AttributeType::list(AttributeType::String)),
            ("input_schema", AttributeType::Dynamic),
        ])
    }

    #[test]
    fn null_root_is_msgpack_nil() {
        assert_eq!(encode(&Dynamic::Null, &tool_type()).unwrap(), vec![0xc0]);
    }

    #[test]
    fn empty_input_decodes_as_null() {
        assert!(decode(&[], &tool_type()).unwrap().is_null());
    }

    #[test]
    fn objects_emit_every_declared_attribute() {
        let value = Dynamic::Map(HashMap::from([("name".to_string(), "echo".into())]));
        let bytes = encode(&value, &tool_type()).unwrap();

        let raw: Dynamic = rmp_serde::from_slice(&bytes).unwrap();
        let map = raw.as_map().unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map["id"], Dynamic::Null);
        assert_eq!(map["name"], Dynamic::String("echo".to_string()));
    }

    #[test]
    fn dynamic_positions_are_wrapped_with_their_type() {
        let schema_doc = Dynamic::Map(HashMap::from([("type".to_string(), "object".into())]));
        let value = Dynamic::Map(HashMap::from([("input_schema".to_string(), schema_doc.clone())]));
        let bytes = encode(&value, &tool_type()).unwrap();

        let raw: Dynamic = rmp_serde::from_slice(&bytes).unwrap();
        let wrapped = raw.as_map().unwrap()["input_schema"].as_list().unwrap().to_vec();
        assert_eq!(
            wrapped[0],
            Dynamic::String(r#"["object",{"type":"string"}]"#.to_string())
        );

        let decoded = decode(&bytes, &tool_type()).unwrap();
        assert_eq!(
            decoded.value.as_map().unwrap()["input_schema"],
            schema_doc
        );
    }

    #[test]
    fn decode_fills_missing_attributes_and_keeps_unknowns() {
        let value = Dynamic::Map(HashMap::from([
            ("id".to_string(), Dynamic::Unknown),
            ("legacy".to_string(), "dropped".into()),
        ]));
        let bytes = rmp_serde::to_vec_named(&value).unwrap();

        let decoded = decode(&bytes, &tool_type()).unwrap();
        let map = decoded.value.as_map().unwrap();
        assert_eq!(map["id"], Dynamic::Unknown);
        assert_eq!(map["name"], Dynamic::Null);
        assert!(!map.contains_key("legacy"));
    }

    #[test]
    fn decode_json_unwraps_typed_dynamic_values() {
        let state = br#"{
            "id": "t-1",
            "name": "echo",
            "tags": ["a"],
            "input_schema": {"value": {"type": "object"}, "type": ["object", {"type": "string"}]}
        }"#;

        let decoded = decode_json(state, &tool_type()).unwrap();
        let map = decoded.value.as_map().unwrap();
        assert_eq!(map["tags"], Dynamic::List(vec!["a".into()]));
        assert_eq!(
            map["input_schema"],
            Dynamic::Map(HashMap::from([("type".to_string(), "object".into())]))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode(&[0xc1], &tool_type()),
            Err(TfplugError::DecodingError(_))
        ));
    }
}
