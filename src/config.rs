use crate::error::{Result, StageError};
use crate::transform::{AsyncFnTransform, FnTransform, Transform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Diagnostic name used when neither the options nor the transformation provide one
pub const DEFAULT_STAGE_NAME: &str = "batch";

/// Default capacity of the duplex input channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Declarative stage settings, suitable for embedding in host configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    /// Explicit diagnostic name, takes precedence over the transformation's own name
    pub name: Option<String>,
    /// Allow items backed by live content streams
    pub stream: bool,
    /// Bounded capacity of the spawned stage's input channel
    pub channel_capacity: usize,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            name: None,
            stream: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl StageSettings {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(StageError::InvalidSettings(
                "channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse settings from a JSON document, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| StageError::InvalidSettings(format!("Invalid settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Construction options for a batch stage
pub struct StageOptions<T> {
    pub callback: Option<Arc<dyn Transform<T>>>,
    pub settings: StageSettings,
}

impl<T> StageOptions<T> {
    /// Options around a transformation with default settings
    pub fn new(callback: impl Transform<T> + 'static) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
            settings: StageSettings::default(),
        }
    }

    pub fn with_callback(mut self, callback: impl Transform<T> + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = Some(name.into());
        self
    }

    pub fn with_streams(mut self, allow: bool) -> Self {
        self.settings.stream = allow;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.settings.channel_capacity = capacity;
        self
    }

    pub fn with_settings(mut self, settings: StageSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Resolve the diagnostic name: explicit name, then the transformation's
    /// declared name, then [`DEFAULT_STAGE_NAME`]. Blank names count as absent.
    pub fn diagnostic_name(&self) -> String {
        self.settings
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.callback.as_deref().and_then(|callback| callback.name()))
            .unwrap_or(DEFAULT_STAGE_NAME)
            .to_string()
    }
}

impl<T> Default for StageOptions<T> {
    fn default() -> Self {
        Self {
            callback: None,
            settings: StageSettings::default(),
        }
    }
}

impl<T> fmt::Debug for StageOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageOptions")
            .field("callback", &self.callback.as_ref().map(|_| "<transform>"))
            .field("settings", &self.settings)
            .finish()
    }
}

impl<T, F> From<FnTransform<F>> for StageOptions<T>
where
    FnTransform<F>: Transform<T> + 'static,
{
    fn from(callback: FnTransform<F>) -> Self {
        Self::new(callback)
    }
}

impl<T, F> From<AsyncFnTransform<F>> for StageOptions<T>
where
    AsyncFnTransform<F>: Transform<T> + 'static,
{
    fn from(callback: AsyncFnTransform<F>) -> Self {
        Self::new(callback)
    }
}
