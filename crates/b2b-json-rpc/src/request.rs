use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

impl RequestParams {
    /// Get a parameter by name (object params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Get a parameter by index (array params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(vec) => vec.get(index),
            RequestParams::Object(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestParams::Object(map) => map.is_empty(),
            RequestParams::Array(vec) => vec.is_empty(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// A JSON-RPC request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            method: method.into(),
            params,
        }
    }

    /// Create a new request with object parameters
    pub fn with_object_params(
        id: RequestId,
        method: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        Self::new(id, method, Some(RequestParams::Object(params)))
    }

    /// Get a parameter by name (if params are an object)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }

    /// Deserialize the params into a typed shape. Missing params read as `{}`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let value = self
            .params
            .as_ref()
            .map(RequestParams::to_value)
            .unwrap_or_else(|| Value::Object(Map::new()));
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Value {
        // Serializing plain data into a Value cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, json, to_string};

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest::new(RequestId::Number(1), "test_method", None);

        let json = to_string(&request).unwrap();
        let parsed: JsonRpcRequest = from_str(&json).unwrap();

        assert_eq!(parsed.id, RequestId::Number(1));
        assert_eq!(parsed.method, "test_method");
        assert!(parsed.params.is_none());
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_request_with_object_params() {
        let mut params = Map::new();
        params.insert("id".to_string(), json!("edge0"));

        let request = JsonRpcRequest::with_object_params(
            RequestId::from("req1"),
            "setGridConnSchedule",
            params,
        );

        assert_eq!(request.get_param("id"), Some(&json!("edge0")));
        assert_eq!(request.get_param("missing"), None);
    }

    #[test]
    fn test_params_as_typed() {
        #[derive(Deserialize)]
        struct Params {
            ids: Vec<String>,
        }

        let request: JsonRpcRequest = from_str(
            r#"{"jsonrpc":"2.0","id":"a","method":"m","params":{"ids":["edge0","edge1"]}}"#,
        )
        .unwrap();
        let params: Params = request.params_as().unwrap();
        assert_eq!(params.ids, vec!["edge0", "edge1"]);

        let bare = JsonRpcRequest::new(RequestId::Number(1), "m", None);
        assert!(bare.params_as::<Params>().is_err());
    }
}
