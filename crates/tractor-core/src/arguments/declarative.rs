//! Declarative argument encoding
//!
//! Arguments written in JSON or YAML configuration decode as follows:
//!
//! - `null` is an empty list, an object gives named arguments in document
//!   order, an array gives positional arguments
//! - an array element `{"$key": K, "$value": V}` is a keyed argument whose
//!   key may itself be an extraction
//! - `{"$extract": A}` is an extraction, where `A` is a path, `null`, or
//!   another `{"$extract": ...}` for a computed accessor
//! - `{"$literal": X}` is the literal `X`, kept as data
//! - any other object or array value is a nested argument list
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use super::{Argument, ArgumentKey, ArgumentValue, Arguments};
use crate::accessor::{Accessor, Extraction};
use crate::types::{Key, Subject};
use crate::{Error, Result};
use serde_json::{Map, Value};

pub const EXTRACT_MARKER: &str = "$extract";
pub const LITERAL_MARKER: &str = "$literal";
pub const KEY_MARKER: &str = "$key";
pub const VALUE_MARKER: &str = "$value";

impl Arguments {
    /// Decode an argument list from configuration
    pub fn from_config(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Arguments::new()),
            Value::Object(map) => decode_object(map),
            Value::Array(items) => decode_array(items),
            other => Err(Error::configuration(format!(
                "arguments must be an object, an array or null, found {}",
                json_type(other)
            ))),
        }
    }
}

/// Decode an accessor: a path string, `null`, or an extraction marker
pub fn decode_accessor(value: &Value) -> Result<Accessor> {
    match value {
        Value::Null => Ok(Accessor::identity()),
        Value::String(path) => Ok(Accessor::path(path.as_str())),
        Value::Object(map) => match single_marker(map, EXTRACT_MARKER) {
            Some(inner) => Ok(Accessor::computed(decode_accessor(inner)?)),
            None => Err(Error::configuration(format!(
                "accessor object must be {{\"{}\": ...}}",
                EXTRACT_MARKER
            ))),
        },
        other => Err(Error::configuration(format!(
            "accessor must be a string, null or an extraction, found {}",
            json_type(other)
        ))),
    }
}

/// Render an extraction as its configuration marker
pub fn extraction_marker(extraction: &Extraction) -> Value {
    let mut map = Map::new();
    map.insert(EXTRACT_MARKER.to_string(), accessor_to_config(extraction.accessor()));
    Value::Object(map)
}

fn accessor_to_config(accessor: &Accessor) -> Value {
    match accessor {
        Accessor::Path(p) => Value::String(p.clone()),
        Accessor::Computed(inner) => {
            let mut map = Map::new();
            map.insert(EXTRACT_MARKER.to_string(), accessor_to_config(inner));
            Value::Object(map)
        }
    }
}

fn decode_object(map: &Map<String, Value>) -> Result<Arguments> {
    let mut args = Arguments::new();
    for (key, value) in map {
        args.push(Argument {
            key: ArgumentKey::Key(Key::Str(key.clone())),
            value: decode_value(value)?,
        });
    }
    Ok(args)
}

fn decode_array(items: &[Value]) -> Result<Arguments> {
    let mut args = Arguments::new();
    for item in items {
        let argument = match item {
            Value::Object(map) if map.contains_key(KEY_MARKER) => decode_keyed(map)?,
            other => Argument::positional(decode_value(other)?),
        };
        args.push(argument);
    }
    Ok(args)
}

fn decode_keyed(map: &Map<String, Value>) -> Result<Argument> {
    if map.len() != 2 || !map.contains_key(VALUE_MARKER) {
        return Err(Error::configuration(format!(
            "keyed argument must contain exactly \"{}\" and \"{}\"",
            KEY_MARKER, VALUE_MARKER
        )));
    }

    let key = match &map[KEY_MARKER] {
        Value::String(s) => ArgumentKey::Key(Key::Str(s.clone())),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ArgumentKey::Key(Key::Int(i)),
            None => return Err(Error::configuration("argument key must be an integer or a string")),
        },
        Value::Object(_) => match decode_value(&map[KEY_MARKER])? {
            ArgumentValue::Extraction(extraction) => ArgumentKey::Extraction(extraction),
            _ => {
                return Err(Error::configuration(format!(
                    "argument key object must be an \"{}\" marker",
                    EXTRACT_MARKER
                )))
            }
        },
        other => {
            return Err(Error::configuration(format!(
                "argument key must be a string, integer or extraction, found {}",
                json_type(other)
            )))
        }
    };

    Ok(Argument {
        key,
        value: decode_value(&map[VALUE_MARKER])?,
    })
}

fn decode_value(value: &Value) -> Result<ArgumentValue> {
    match value {
        Value::Object(map) => {
            if let Some(inner) = single_marker(map, EXTRACT_MARKER) {
                return Ok(ArgumentValue::Extraction(Extraction::new(decode_accessor(inner)?)));
            }
            if let Some(inner) = single_marker(map, LITERAL_MARKER) {
                return Ok(ArgumentValue::Literal(Subject::from(inner.clone())));
            }
            if map.contains_key(EXTRACT_MARKER) || map.contains_key(LITERAL_MARKER) {
                return Err(Error::configuration(format!(
                    "\"{}\" and \"{}\" markers must be the only key of their object",
                    EXTRACT_MARKER, LITERAL_MARKER
                )));
            }
            decode_object(map).map(ArgumentValue::Nested)
        }
        Value::Array(items) => decode_array(items).map(ArgumentValue::Nested),
        scalar => Ok(ArgumentValue::Literal(Subject::from(scalar.clone()))),
    }
}

fn single_marker<'a>(map: &'a Map<String, Value>, marker: &str) -> Option<&'a Value> {
    if map.len() == 1 {
        map.get(marker)
    } else {
        None
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
