//! # Resource Definition
//!
//! Declarative attributes of a remote-command resource, as written by the user, and their
//! conversion into [`DispatchRequest`]s for the primary and destroy commands.

use crate::error::{DispatchError, DispatchResult};
use crate::models::{DispatchRequest, OutputDestination, Target, TargetSelector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLocation {
    pub s3_bucket_name: String,
    #[serde(default)]
    pub s3_key_prefix: String,
}

/// Command run when the resource is deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyCommand {
    pub document_name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub document_name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub targets: Vec<Target>,
    /// Seconds; falls back to the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_timeout: Option<u32>,
    #[serde(default)]
    pub comment: String,
    /// At most one block
    #[serde(default)]
    pub output_location: Vec<OutputLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destroy: Option<DestroyCommand>,
}

impl ResourceDefinition {
    pub fn from_json(json: &str) -> DispatchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Request for the primary command
    pub fn to_request(&self, default_execution_timeout: u32) -> DispatchResult<DispatchRequest> {
        self.build_request(
            &self.document_name,
            &self.parameters,
            default_execution_timeout,
        )
    }

    /// Request for the destroy command, `None` when none is configured
    pub fn destroy_request(
        &self,
        default_execution_timeout: u32,
    ) -> Option<DispatchResult<DispatchRequest>> {
        self.destroy.as_ref().map(|destroy| {
            self.build_request(
                &destroy.document_name,
                &destroy.parameters,
                default_execution_timeout,
            )
        })
    }

    fn build_request(
        &self,
        document_name: &str,
        parameters: &[Parameter],
        default_execution_timeout: u32,
    ) -> DispatchResult<DispatchRequest> {
        let request = DispatchRequest {
            document_name: document_name.to_string(),
            parameters: collect_parameters(parameters),
            targets: TargetSelector::new(self.targets.clone()),
            execution_timeout_seconds: self
                .execution_timeout
                .unwrap_or(default_execution_timeout),
            comment: self.comment.clone(),
            output: self.output_destination()?,
        };
        request.validate()?;
        Ok(request)
    }

    fn output_destination(&self) -> DispatchResult<Option<OutputDestination>> {
        match self.output_location.as_slice() {
            [] => Ok(None),
            [location] => {
                let mut destination = OutputDestination::new(location.s3_bucket_name.clone());
                if !location.s3_key_prefix.is_empty() {
                    destination = destination.with_key_prefix(location.s3_key_prefix.clone());
                }
                Ok(Some(destination))
            }
            _ => Err(DispatchError::Validation(format!(
                "output_location accepts at most one block, got {}",
                self.output_location.len()
            ))),
        }
    }
}

fn collect_parameters(parameters: &[Parameter]) -> HashMap<String, Vec<String>> {
    parameters
        .iter()
        .map(|p| (p.name.clone(), p.values.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"{
        "document_name": "AWS-RunShellScript",
        "parameters": [{"name": "commands", "values": ["yum -y update"]}],
        "targets": [{"key": "tag:Env", "values": ["staging"]}],
        "output_location": [{"s3_bucket_name": "command-logs"}],
        "destroy": {
            "document_name": "AWS-RunShellScript",
            "parameters": [{"name": "commands", "values": ["rm -rf /opt/app"]}]
        }
    }"#;

    #[test]
    fn test_primary_request_uses_defaults() {
        let definition = ResourceDefinition::from_json(DEFINITION).unwrap();
        let request = definition.to_request(3600).unwrap();

        assert_eq!(request.execution_timeout_seconds, 3600);
        assert_eq!(request.comment, "");
        assert_eq!(request.parameters["commands"], vec!["yum -y update"]);
        assert_eq!(request.output, Some(OutputDestination::new("command-logs")));
    }

    #[test]
    fn test_destroy_request_swaps_document_parameters() {
        let definition = ResourceDefinition::from_json(DEFINITION).unwrap();
        let request = definition.destroy_request(3600).unwrap().unwrap();

        assert_eq!(request.parameters["commands"], vec!["rm -rf /opt/app"]);
        assert_eq!(request.targets.targets()[0].key, "tag:Env");
    }

    #[test]
    fn test_key_prefix_is_kept_when_set() {
        let mut definition = ResourceDefinition::from_json(DEFINITION).unwrap();
        definition.output_location[0].s3_key_prefix = "runs".to_string();

        let request = definition.to_request(3600).unwrap();
        assert_eq!(
            request.output.unwrap().listing_prefix("cmd-9"),
            "runs/cmd-9"
        );
    }

    #[test]
    fn test_rejects_multiple_output_locations_and_empty_targets() {
        let mut definition = ResourceDefinition::from_json(DEFINITION).unwrap();
        definition
            .output_location
            .push(definition.output_location[0].clone());
        assert!(definition.to_request(3600).is_err());

        let mut definition = ResourceDefinition::from_json(DEFINITION).unwrap();
        definition.targets.clear();
        assert!(definition.to_request(3600).is_err());
    }

    #[test]
    fn test_no_destroy_command() {
        let mut definition = ResourceDefinition::from_json(DEFINITION).unwrap();
        definition.destroy = None;
        assert!(definition.destroy_request(3600).is_none());
    }
}
