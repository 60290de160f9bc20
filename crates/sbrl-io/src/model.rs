//! Serializable model file (spec §6's training entry point return
//! values, plus the serializer explicitly named as a thin external
//! collaborator).

use std::path::Path;

use serde::{Deserialize, Serialize};

use sbrl_core::TrainedModel;

use crate::error::{IoError, IoResult};

/// A trained rule list plus the metadata needed to render and reapply
/// it: θ, the learned rule_ids, and the feature strings of every
/// candidate rule (not just the ones the list uses) so downstream
/// tooling can cross-reference ids without reloading the rules file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub rule_ids: Vec<usize>,
    pub theta: Vec<Vec<f64>>,
    pub feature_strings: Vec<String>,
    pub n_rules: usize,
}

impl Model {
    pub fn from_trained(trained: &TrainedModel, feature_strings: Vec<String>) -> Self {
        Self {
            rule_ids: trained.rule_ids.clone(),
            theta: trained.theta.clone(),
            n_rules: feature_strings.len(),
            feature_strings,
        }
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> IoResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| IoError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> IoResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| IoError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }
}
