//! GraphQL [responses](https://spec.graphql.org/June2018/#sec-Response)

use crate::parser::LineColumn;
use crate::parser::SourceMap;
use crate::NodeLocation;
use serde::Deserialize;
use serde::Serialize;
/// Re-export of the version of the `serde_json_bytes` crate used for [`JsonValue`] and [`JsonMap`]
pub use serde_json_bytes;

/// A JSON-compatible dynamically-typed value.
///
/// Note: [`serde_json_bytes::Value`] is similar
/// to [`serde_json::Value`][serde_json_bytes::serde_json::Value]
/// but uses its reference-counted [`ByteString`][serde_json_bytes::ByteString]
/// for string values and map keys.
pub type JsonValue = serde_json_bytes::Value;

/// A JSON-compatible object/map with string keys and dynamically-typed values.
pub type JsonMap = serde_json_bytes::Map<serde_json_bytes::ByteString, JsonValue>;

/// The result of [`Engine::execute`][crate::Engine::execute].
///
/// `data` is `None` (serialized as `null`) when the request could not be executed
/// (syntax, validation, operation selection or variable errors),
/// or when a field error propagated all the way up to the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Response {
    // <https://spec.graphql.org/October2021/#note-6f005> suggests serializing this first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub errors: Vec<GraphQLError>,

    pub data: Option<JsonMap>,
}

/// A serializable [error](https://spec.graphql.org/June2018/#sec-Errors),
/// as found in a GraphQL response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// For a field error, the path to the field in [`Response::data`].
    /// `None` (serialized as `null`) for request errors.
    #[serde(default)]
    pub path: Option<Vec<ResponseDataPathSegment>>,

    /// Locations in the request document relevant to the error, if any.
    #[serde(default)]
    pub locations: Vec<LineColumn>,

    /// Reserved for any additional information
    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    #[serde(default)]
    pub extensions: JsonMap,
}

/// A `Vec<ResponseDataPathSegment>` like in [`GraphQLError::path`]
/// represents a path into [`Response::data`],
/// starting at the root and indexing into increasingly nested JSON objects or arrays.
///
/// # Example
///
/// In a GraphQL response like this:
///
/// ```json
/// {
///   "data": {
///     "players": [
///       {"name": "Alice"},
///       {"name": "Bob"}
///     ]
///   },
///   "errors": [
///     {
///       "message": "Something went wrong",
///       "path": ["players", 1, "name"]
///     }
///   ]
/// }
/// ```
///
/// The error path would have a Rust representation like
/// `vec![Field("players"), ListIndex(1), Field("name")]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseDataPathSegment {
    /// The relevant key in an object value
    Field(crate::Name),

    /// The index of the relevant item in a list value
    ListIndex(usize),
}

impl GraphQLError {
    pub fn new(
        message: impl Into<String>,
        location: Option<NodeLocation>,
        sources: &SourceMap,
    ) -> Self {
        Self {
            message: message.into(),
            path: None,
            locations: location
                .into_iter()
                .filter_map(|location| location.line_column(sources))
                .collect(),
            extensions: Default::default(),
        }
    }

    /// Add an entry to `extensions`
    pub fn with_extension(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.extensions.insert(key, value.into());
        self
    }
}

impl Response {
    /// A response for a request error: no data, only errors
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        Self { errors, data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name;
    use pretty_assertions::assert_eq;

    #[test]
    fn error_serialization() {
        let mut error = GraphQLError::new("boom", None, &Default::default());
        error.path = Some(vec![
            ResponseDataPathSegment::Field(name!("players")),
            ResponseDataPathSegment::ListIndex(1),
        ]);
        error.locations.push(LineColumn { line: 1, column: 3 });
        let response = Response {
            errors: vec![
                error,
                GraphQLError::new("request", None, &Default::default())
                    .with_extension("code", "BAD"),
            ],
            data: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "errors": [
                    {
                        "message": "boom",
                        "path": ["players", 1],
                        "locations": [{"line": 1, "column": 3}],
                    },
                    {
                        "message": "request",
                        "path": null,
                        "locations": [],
                        "extensions": {"code": "BAD"},
                    },
                ],
                "data": null,
            })
        );
    }

    #[test]
    fn empty_errors_are_omitted() {
        let response = Response {
            errors: Vec::new(),
            data: Some(JsonMap::new()),
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"data":{}}"#
        );
    }
}
