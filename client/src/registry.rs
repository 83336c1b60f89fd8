//! Operation registry advertised by the server
//!
//! The automation root lists every operation with its parameter schema. The
//! registry is fetched once per session and never mutated afterwards, so it
//! can be shared freely between threads.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::errors::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type")]
    pub param_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperationSchema {
    pub id: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl OperationSchema {
    pub fn required_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

#[derive(Deserialize)]
struct AutomationRoot {
    operations: Vec<OperationSchema>,
}

#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: HashMap<String, OperationSchema>,
}

impl OperationRegistry {
    pub fn new(operations: impl IntoIterator<Item = OperationSchema>) -> Self {
        Self {
            operations: operations
                .into_iter()
                .map(|op| (op.id.clone(), op))
                .collect(),
        }
    }

    /// Build the registry from the automation root document
    pub fn from_json(body: &Value) -> Result<Self> {
        let root = AutomationRoot::deserialize(body).map_err(|e| ClientError::Connection {
            message: format!("Invalid operation registry: {}", e),
        })?;
        Ok(Self::new(root.operations))
    }

    pub fn get(&self, name: &str) -> Option<&OperationSchema> {
        self.operations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Sorted operation ids
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check a parameter set against the schema of `operation`
    pub fn validate<'a>(
        &self,
        operation: &str,
        params: impl IntoIterator<Item = &'a str>,
    ) -> Result<()> {
        let schema = self.get(operation).ok_or_else(|| ClientError::InvalidParameter {
            message: format!("'{}' is not a registered operation", operation),
        })?;

        let supplied: HashSet<&str> = params.into_iter().collect();

        // Deterministic order for error messages
        let mut sorted: Vec<&str> = supplied.iter().copied().collect();
        sorted.sort_unstable();
        if let Some(unexpected) = sorted.into_iter().find(|name| !schema.accepts(name)) {
            return Err(ClientError::InvalidParameter {
                message: format!(
                    "Unexpected param '{}' for operation '{}'",
                    unexpected, operation
                ),
            });
        }

        if let Some(missing) = schema.required_params().find(|name| !supplied.contains(name)) {
            return Err(ClientError::InvalidParameter {
                message: format!(
                    "Missing required param '{}' for operation '{}'",
                    missing, operation
                ),
            });
        }

        Ok(())
    }
}
