use crate::constants::defaults::EXECUTION_TIMEOUT_SECONDS;
use crate::error::{DispatchError, DispatchResult};
use crate::models::selector::TargetSelector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Where the dispatch service writes captured invocation output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDestination {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
}

impl OutputDestination {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key_prefix: None,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Listing prefix for one dispatch: `{key_prefix}/{dispatch_id}` or just the id
    pub fn listing_prefix(&self, dispatch_id: &str) -> String {
        match self.key_prefix.as_deref() {
            Some(prefix) => format!("{prefix}/{dispatch_id}"),
            None => dispatch_id.to_string(),
        }
    }
}

/// A single remote-command dispatch against one target selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub document_name: String,
    #[serde(default)]
    pub parameters: HashMap<String, Vec<String>>,
    pub targets: TargetSelector,
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_seconds: u32,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputDestination>,
}

fn default_execution_timeout() -> u32 {
    EXECUTION_TIMEOUT_SECONDS
}

impl DispatchRequest {
    pub fn new(document_name: impl Into<String>, targets: TargetSelector) -> Self {
        Self {
            document_name: document_name.into(),
            parameters: HashMap::new(),
            targets,
            execution_timeout_seconds: EXECUTION_TIMEOUT_SECONDS,
            comment: String::new(),
            output: None,
        }
    }

    pub fn with_parameter<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.parameters
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_execution_timeout(mut self, seconds: u32) -> Self {
        self.execution_timeout_seconds = seconds;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_output(mut self, output: OutputDestination) -> Self {
        self.output = Some(output);
        self
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.execution_timeout_seconds))
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.document_name.trim().is_empty() {
            return Err(DispatchError::Validation(
                "document name must not be empty".to_string(),
            ));
        }
        if self.execution_timeout_seconds == 0 {
            return Err(DispatchError::Validation(
                "execution timeout must be greater than zero".to_string(),
            ));
        }
        if let Some(output) = &self.output {
            if output.bucket.trim().is_empty() {
                return Err(DispatchError::Validation(
                    "output destination requires a non-empty bucket".to_string(),
                ));
            }
        }
        self.targets.validate()
    }
}
