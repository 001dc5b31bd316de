//! Cache Key Module
//!
//! Derives cache keys from request identity.
//!
//! A key has the shape `METHOD:"<path>":<query>:user:"<caller>"`. The path and
//! caller are JSON string literals and the query is a JSON object, so every
//! component is self-delimiting and the key can be split back into its parts.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Caller identity used when a request is unauthenticated.
pub const ANONYMOUS: &str = "anonymous";

/// Marker placed in front of the caller identity.
const CALLER_PREFIX: &str = ":user:";

// == Derive Key ==
/// Builds the cache key for a request.
///
/// `query` is the decoded query string in arrival order. Parameter names are
/// sorted in the query object; values of a repeated parameter keep their order
/// and are folded into an array. `path` is used as given, so callers wanting
/// `?a=1&b=2` and `?b=2&a=1` to share a key pass a path whose query string is
/// sorted the same way (see `RequestSnapshot::canonical_path`).
pub fn derive_key(
    method: &str,
    path: &str,
    query: &[(String, String)],
    caller_id: Option<&str>,
) -> String {
    format!(
        "{}:{}:{}{}",
        method,
        json_string(path),
        canonical_query(query),
        caller_segment(caller_id.unwrap_or(ANONYMOUS))
    )
}

/// Returns the trailing key segment that identifies a caller.
pub fn caller_segment(caller_id: &str) -> String {
    format!("{}{}", CALLER_PREFIX, json_string(caller_id))
}

/// Returns the key text that every key whose path starts with `prefix` contains
/// right after the method.
pub fn path_prefix_segment(prefix: &str) -> String {
    let quoted = json_string(prefix);
    // Drop the closing quote so longer paths still match.
    quoted[..quoted.len() - 1].to_string()
}

/// Serializes query parameters as a JSON object with sorted keys.
fn canonical_query(query: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in query {
        grouped.entry(name.as_str()).or_default().push(value.as_str());
    }

    let mut object = Map::new();
    for (name, mut values) in grouped {
        let value = if values.len() == 1 {
            Value::String(values.remove(0).to_string())
        } else {
            Value::Array(
                values
                    .into_iter()
                    .map(|v| Value::String(v.to_string()))
                    .collect(),
            )
        };
        object.insert(name.to_string(), value);
    }

    Value::Object(object).to_string()
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}
