use crate::Result;
use serde_json::Value;

/// Value returned by a page script
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Arrays and objects, kept as JSON
    Structured(Value),
}

impl ScriptValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScriptValue::Null)
    }
}

impl From<Value> for ScriptValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ScriptValue::Null,
            Value::Bool(b) => ScriptValue::Bool(b),
            Value::Number(n) => n.as_f64().map_or(ScriptValue::Null, ScriptValue::Number),
            Value::String(s) => ScriptValue::String(s),
            other => ScriptValue::Structured(other),
        }
    }
}

impl From<Option<Value>> for ScriptValue {
    fn from(value: Option<Value>) -> Self {
        value.map_or(ScriptValue::Null, ScriptValue::from)
    }
}

/// The single shared browsing surface the pipeline drives.
///
/// Implementations run every call on the surface's own context; callers
/// serialize access (see [`crate::TaskQueue`]), so an implementation never
/// sees two evaluations at once from the pipeline.
#[async_trait::async_trait]
pub trait Surface: Send + Sync {
    /// URL of the currently loaded document, if any
    async fn current_url(&self) -> Result<Option<String>>;

    /// Evaluate a script in the loaded document and return its completion
    /// value. Script exceptions come back as [`crate::Error::Script`].
    async fn evaluate(&self, script: &str) -> Result<ScriptValue>;

    /// Load a URL and wait for the navigation to finish
    async fn navigate(&self, url: &str) -> Result<()>;
}
