// Order-independent JSON fingerprints.
// Every object key found anywhere in the value is collected into one sorted list, and objects
// are written with their members filtered to and ordered by that list.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::error::FilterError;

/// Serialize a JSON value so that object key insertion order never affects the output.
/// `None` (undefined) and `null` both give `"null"`.
pub fn stable_serialize(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return "null".to_string();
    };

    let mut keys = BTreeSet::new();
    collect_keys(value, &mut keys);
    let key_order: Vec<&str> = keys.into_iter().collect();

    let mut out = String::new();
    write_value(value, &key_order, &mut out);
    out
}

/// Serialize any serde value through [`stable_serialize`].
pub fn stable_serialize_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FilterError> {
    let value = serde_json::to_value(value)?;
    Ok(stable_serialize(Some(&value)))
}

fn collect_keys<'a>(value: &'a Value, keys: &mut BTreeSet<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                keys.insert(key.as_str());
                collect_keys(member, keys);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_keys(item, keys);
            }
        }
        _ => {}
    }
}

fn write_value(value: &Value, key_order: &[&str], out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            let mut first = true;
            for key in key_order {
                if let Some(member) = map.get(*key) {
                    if !first {
                        out.push(',');
                    }
                    first = false;
                    write_string(key, out);
                    out.push(':');
                    write_value(member, key_order, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, key_order, out);
            }
            out.push(']');
        }
        // Compact JSON for scalars, with serde_json's escaping and number format.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push_str(&Value::String(s.to_string()).to_string());
}
