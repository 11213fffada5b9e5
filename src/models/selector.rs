//! # Target Selection
//!
//! A [`TargetSelector`] names the fleet members that participate in a dispatch. Key and
//! value semantics belong to the fleet directory (tag selection, explicit ids, ...); the
//! only rule interpreted here is the reserved member-id alias, which the provisioning
//! registry knows under a different filter name.

use crate::constants::filters::{
    ACTIVE_LIFECYCLE_STATES, MEMBER_ID_SELECTOR_KEY, PROVISIONING_LIFECYCLE_FILTER,
    PROVISIONING_MEMBER_ID_FILTER,
};
use crate::error::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};

/// One `(key, values[])` selector entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub key: String,
    pub values: Vec<String>,
}

impl Target {
    pub fn new<K, I, V>(key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Explicit member-id selection
    pub fn member_ids<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::new(MEMBER_ID_SELECTOR_KEY, ids)
    }

    pub fn is_member_id_alias(&self) -> bool {
        self.key.eq_ignore_ascii_case(MEMBER_ID_SELECTOR_KEY)
    }
}

/// Ordered selector entries identifying the participating fleet members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSelector(Vec<Target>);

impl TargetSelector {
    pub fn new(targets: Vec<Target>) -> Self {
        Self(targets)
    }

    pub fn targets(&self) -> &[Target] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> DispatchResult<()> {
        if self.0.is_empty() {
            return Err(DispatchError::Validation(
                "target selector requires at least one entry".to_string(),
            ));
        }
        if let Some(target) = self.0.iter().find(|t| t.key.trim().is_empty()) {
            return Err(DispatchError::Validation(format!(
                "target selector entry with values {:?} has an empty key",
                target.values
            )));
        }
        Ok(())
    }
}

impl From<Vec<Target>> for TargetSelector {
    fn from(targets: Vec<Target>) -> Self {
        Self(targets)
    }
}

/// A named filter passed to a fleet registry query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl RegistryFilter {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Filters for both fleet registries, derived from one selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetFilters {
    pub provisioning: Vec<RegistryFilter>,
    pub heartbeat: Vec<RegistryFilter>,
}

impl FleetFilters {
    /// Translate the member-id alias for the provisioning registry and restrict it to
    /// active lifecycle states. Heartbeat filters use the selector verbatim.
    pub fn from_selector(selector: &TargetSelector) -> Self {
        let mut provisioning = Vec::with_capacity(selector.targets().len() + 1);
        let mut heartbeat = Vec::with_capacity(selector.targets().len());

        for target in selector.targets() {
            let provisioning_name = if target.is_member_id_alias() {
                PROVISIONING_MEMBER_ID_FILTER
            } else {
                target.key.as_str()
            };
            provisioning.push(RegistryFilter::new(
                provisioning_name,
                target.values.clone(),
            ));
            heartbeat.push(RegistryFilter::new(
                target.key.clone(),
                target.values.clone(),
            ));
        }

        provisioning.push(RegistryFilter::new(
            PROVISIONING_LIFECYCLE_FILTER,
            ACTIVE_LIFECYCLE_STATES.iter().map(|s| s.to_string()).collect(),
        ));

        Self {
            provisioning,
            heartbeat,
        }
    }
}
