//! Search facets identifying one remote variable series.

use crate::types::feature::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Marker appended to a frequency token to ask for instantaneous samples
/// (`6hrPt`) instead of interval means (`6hr`).
pub const POINT_SAMPLING_SUFFIX: &str = "Pt";

/// ESGF search parameters attached to a cutout.
///
/// The four identifying facets are mandatory. `frequency` and `table_id`
/// apply to every feature unless `overrides` names a feature-specific value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsgfParams {
    pub source_id: String,
    pub variant_label: String,
    pub experiment_id: String,
    pub project: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub overrides: BTreeMap<Feature, FeatureQuery>,
}

impl EsgfParams {
    pub fn new(
        source_id: impl Into<String>,
        variant_label: impl Into<String>,
        experiment_id: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            variant_label: variant_label.into(),
            experiment_id: experiment_id.into(),
            project: project.into(),
            frequency: None,
            table_id: None,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    pub fn with_table_id(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    pub fn with_override(mut self, feature: Feature, query: FeatureQuery) -> Self {
        self.overrides.insert(feature, query);
        self
    }
}

/// Per-feature frequency and table selection, e.g. `6hrLev` for model-level wind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureQuery {
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub table_id: Option<String>,
}

/// A complete, immutable catalog query. Each step that needs a different
/// variable or frequency derives a new value instead of editing this one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryParameters {
    source_id: String,
    variant_label: String,
    experiment_id: String,
    project: String,
    frequency: String,
    table_id: Option<String>,
    variable: Option<String>,
}

impl QueryParameters {
    /// Builds the query for `feature`: feature overrides win over the cutout-wide
    /// values, and `default_frequency` fills in when neither names one.
    pub fn for_feature(params: &EsgfParams, feature: Feature, default_frequency: &str) -> Self {
        let feature_query = params.overrides.get(&feature);
        let frequency = feature_query
            .and_then(|q| q.frequency.clone())
            .unwrap_or_else(|| default_frequency.to_string());
        let table_id = feature_query
            .and_then(|q| q.table_id.clone())
            .or_else(|| params.table_id.clone());
        Self {
            source_id: params.source_id.clone(),
            variant_label: params.variant_label.clone(),
            experiment_id: params.experiment_id.clone(),
            project: params.project.clone(),
            frequency,
            table_id,
            variable: None,
        }
    }

    pub fn frequency(&self) -> &str {
        &self.frequency
    }

    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    pub fn table_id(&self) -> Option<&str> {
        self.table_id.as_deref()
    }

    pub fn with_variable(&self, variable: &str) -> Self {
        Self {
            variable: Some(variable.to_string()),
            ..self.clone()
        }
    }

    pub fn with_frequency(&self, frequency: impl Into<String>) -> Self {
        Self {
            frequency: frequency.into(),
            ..self.clone()
        }
    }

    /// The same query asking for point-sampled output.
    pub fn point_sampled(&self) -> Self {
        self.with_frequency(format!("{}{}", self.frequency, POINT_SAMPLING_SUFFIX))
    }

    /// Search facets in a stable order.
    pub fn facets(&self) -> Vec<(&'static str, &str)> {
        let mut facets = vec![
            ("source_id", self.source_id.as_str()),
            ("variant_label", self.variant_label.as_str()),
            ("experiment_id", self.experiment_id.as_str()),
            ("project", self.project.as_str()),
            ("frequency", self.frequency.as_str()),
        ];
        if let Some(table_id) = &self.table_id {
            facets.push(("table_id", table_id.as_str()));
        }
        if let Some(variable) = &self.variable {
            facets.push(("variable", variable.as_str()));
        }
        facets
    }

    /// Facets without the transient `variable` key, as recorded on outputs.
    pub fn provenance(&self) -> BTreeMap<String, String> {
        self.facets()
            .into_iter()
            .filter(|(key, _)| *key != "variable")
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }
}

impl fmt::Display for QueryParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .facets()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
