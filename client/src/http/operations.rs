use serde::Serialize;
use serde_json::{Map, Value};

/// Value of a named operation parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(Value),
    List(Vec<Value>),
    /// Document properties, sent as `key=value` lines
    Properties(Vec<(String, String)>),
    /// Explicitly absent, skipped on serialization
    Null,
}

impl ParamValue {
    pub fn properties<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ParamValue::Properties(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    fn to_json(&self) -> Option<Value> {
        match self {
            ParamValue::Scalar(Value::Null) | ParamValue::Null => None,
            ParamValue::Scalar(v) => Some(v.clone()),
            ParamValue::List(items) => Some(Value::Array(items.clone())),
            ParamValue::Properties(pairs) => Some(Value::String(flatten_properties(pairs))),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Scalar(Value::String(v.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Scalar(Value::String(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Scalar(Value::Bool(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Scalar(Value::from(v))
    }
}

impl From<Value> for ParamValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Array(items) => ParamValue::List(items),
            other => ParamValue::Scalar(other),
        }
    }
}

/// Join property pairs as `k=v` lines, without a trailing newline
pub fn flatten_properties(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// A single operation call, built per invocation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub operation: String,
    pub input: Option<String>,
    pub params: Vec<(String, ParamValue)>,
    pub void_op: bool,
    pub check_params: bool,
}

#[derive(Serialize)]
struct RequestBody {
    params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<String>,
}

impl OperationRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            input: None,
            params: Vec::new(),
            void_op: false,
            check_params: true,
        }
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Add or replace a named parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        for (name, value) in params {
            self = self.param(name, value);
        }
        self
    }

    /// Mark as side-effect only, the server need not send a body back
    pub fn void_op(mut self, void_op: bool) -> Self {
        self.void_op = void_op;
        self
    }

    pub fn skip_validation(mut self) -> Self {
        self.check_params = false;
        self
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| name.as_str())
    }

    /// JSON body sent to the automation endpoint
    pub fn to_body(&self) -> Value {
        let params = self
            .params
            .iter()
            .filter_map(|(name, value)| value.to_json().map(|v| (name.clone(), v)))
            .collect();
        let body = RequestBody {
            params,
            input: self.input.clone().filter(|i| !i.is_empty()),
        };
        serde_json::to_value(body).unwrap_or(Value::Null)
    }
}

/// Payload returned by the server
#[derive(Debug, Clone, PartialEq)]
pub enum AutomationResponse {
    /// JSON content type, `Value::Null` for an empty body
    Json(Value),
    Raw(Vec<u8>),
}

impl AutomationResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            AutomationResponse::Json(v) => Some(v),
            AutomationResponse::Raw(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            AutomationResponse::Json(v) => Some(v),
            AutomationResponse::Raw(_) => None,
        }
    }

    /// Whether a batch upload response confirms the upload
    pub fn is_uploaded(&self) -> bool {
        match self.as_json().and_then(|v| v.get("uploaded")) {
            Some(Value::Bool(uploaded)) => *uploaded,
            Some(Value::String(uploaded)) => uploaded == "true",
            _ => false,
        }
    }
}
