use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Boxed error type accepted from user transformations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by a batch stage
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Construction was attempted without a transformation callback
    #[error("batch stage requires a transform callback")]
    MissingCallback,

    /// A stream-backed item arrived while content streams are disabled
    #[error("{name}: content streams are not enabled")]
    StreamsNotEnabled { name: String },

    /// The transformation failed, either synchronously or through its deferred result
    #[error("{name}: {message}")]
    Transform {
        name: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The stage was driven through a transition its lifecycle does not allow
    #[error("{name}: cannot {event} while {from}")]
    InvalidTransition {
        name: String,
        from: String,
        event: String,
    },

    /// The duplex input was used after the stage stopped accepting items
    #[error("{name}: stage is no longer accepting items")]
    Closed { name: String },

    /// Declarative stage settings failed validation
    #[error("Invalid stage settings: {0}")]
    InvalidSettings(String),
}

impl StageError {
    /// Wrap a transformation failure with the stage's diagnostic name.
    ///
    /// Structured errors keep their identity as the `source`; raw values are
    /// converted to text and carry no source.
    pub fn from_rejection(name: &str, rejection: Rejection) -> Self {
        match rejection {
            Rejection::Error(source) => Self::Transform {
                name: name.to_string(),
                message: source.to_string(),
                source: Some(source),
            },
            Rejection::Value(value) => Self::Transform {
                name: name.to_string(),
                message: value_to_text(&value),
                source: None,
            },
        }
    }

    /// Diagnostic name of the stage that produced this error, if any
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::StreamsNotEnabled { name }
            | Self::Transform { name, .. }
            | Self::InvalidTransition { name, .. }
            | Self::Closed { name } => Some(name),
            Self::MissingCallback | Self::InvalidSettings(_) => None,
        }
    }

    /// True for failures raised by the user transformation
    pub fn is_transform_failure(&self) -> bool {
        matches!(self, Self::Transform { .. })
    }
}

pub type Result<T> = std::result::Result<T, StageError>;

/// Failure value returned by a transformation.
///
/// A transformation can fail with a structured error or with an arbitrary raw
/// value. Both are normalized into [`StageError::Transform`] by the stage and
/// never travel further than that.
pub enum Rejection {
    Error(BoxError),
    Value(Value),
}

impl Rejection {
    /// Reject with a raw, non-error value
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Reject with a structured error built from a message
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Error(message.into())
    }

    /// Convert a caught panic payload into a rejection.
    ///
    /// `panic!("..")` payloads are `&str` or `String`; anything else is opaque.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(message) = payload.downcast_ref::<&str>() {
            return Self::Value(Value::String((*message).to_string()));
        }
        match payload.downcast::<String>() {
            Ok(message) => Self::Value(Value::String(*message)),
            Err(_) => Self::Value(Value::String("transform panicked".to_string())),
        }
    }
}

impl<E> From<E> for Rejection
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::Error(Box::new(error))
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(error) => f.debug_tuple("Error").field(&error.to_string()).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(error) => write!(f, "{error}"),
            Self::Value(value) => f.write_str(&value_to_text(value)),
        }
    }
}

// Strings print bare, everything else as compact JSON.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
