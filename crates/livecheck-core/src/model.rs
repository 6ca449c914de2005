use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One currently-live channel, exactly as the API returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamRecord(Map<String, Value>);

/// Live channels in response order. Offline channels are simply absent.
pub type StreamList = Vec<StreamRecord>;

impl StreamRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Channel login, from `login` or the nested `channel.name`.
    pub fn login(&self) -> Option<&str> {
        self.0
            .get("login")
            .and_then(Value::as_str)
            .or_else(|| {
                self.0
                    .get("channel")
                    .and_then(|c| c.get("name"))
                    .and_then(Value::as_str)
            })
    }
}

impl TryFrom<Value> for StreamRecord {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}

impl From<StreamRecord> for Value {
    fn from(record: StreamRecord) -> Self {
        Value::Object(record.0)
    }
}
