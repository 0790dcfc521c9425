//! Multi-variable labelled dataset: data variables sharing named dimensions,
//! their coordinates, an optional time axis and provenance attributes.

use crate::grid::calendar::TimeAxis;
use crate::grid::error::GridError;
use crate::grid::variable::Variable;
use crate::grid::TIME_DIM;
use chrono::NaiveDateTime;
use log::{debug, warn};
use ndarray::Array1;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A 1-D coordinate. `dim` is `None` for scalar coordinates such as the
/// 2 m `height` reference attached to near-surface variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub dim: Option<String>,
    pub values: Array1<f64>,
    pub valid_range: Option<(f64, f64)>,
}

impl Coordinate {
    pub fn new(dim: &str, values: Vec<f64>) -> Self {
        Self {
            dim: Some(dim.to_string()),
            values: Array1::from(values),
            valid_range: None,
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            dim: None,
            values: Array1::from(vec![value]),
            valid_range: None,
        }
    }

    fn on_dim(&self, dim: &str) -> bool {
        self.dim.as_deref() == Some(dim)
    }
}

/// Provenance recorded on every produced dataset: the query parameters it was
/// resolved from (without the per-variable key) and the variables it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    pub query: BTreeMap<String, String>,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub time: Option<TimeAxis>,
    pub coords: BTreeMap<String, Coordinate>,
    pub data_vars: BTreeMap<String, Variable>,
    pub attrs: Attributes,
}

impl Dataset {
    pub fn contains(&self, name: &str) -> bool {
        self.data_vars.contains_key(name)
    }

    pub fn variable(&self, name: &str) -> Result<&Variable, GridError> {
        self.data_vars
            .get(name)
            .ok_or_else(|| GridError::MissingVariable(name.to_string()))
    }

    pub fn coord(&self, name: &str) -> Result<&Coordinate, GridError> {
        self.coords
            .get(name)
            .ok_or_else(|| GridError::MissingCoordinate(name.to_string()))
    }

    /// A dimension coordinate exposed as a variable along its own dimension.
    pub fn coord_variable(&self, name: &str) -> Result<Variable, GridError> {
        let coord = self.coord(name)?;
        let dim = coord.dim.as_deref().unwrap_or(name);
        Variable::new(&[dim], coord.values.clone().into_dyn())
    }

    pub fn times(&self) -> Result<&[NaiveDateTime], GridError> {
        self.time
            .as_ref()
            .ok_or(GridError::MissingTimeAxis)?
            .as_standard()
    }

    pub fn insert(&mut self, name: &str, variable: Variable) {
        self.data_vars.insert(name.to_string(), variable);
    }

    /// Variable `name` of `other`, reindexed by label onto this dataset's time
    /// axis. Timestamps `other` does not carry are filled with NaN.
    pub fn aligned_variable(&self, other: &Dataset, name: &str) -> Result<Variable, GridError> {
        let var = other.variable(name)?;
        if !var.has_dim(TIME_DIM) {
            return Ok(var.clone());
        }
        let mine = self.times()?;
        let theirs = other.times()?;
        if mine == theirs {
            return Ok(var.clone());
        }

        let mut positions = HashMap::with_capacity(theirs.len());
        for (i, time) in theirs.iter().enumerate() {
            positions.entry(*time).or_insert(i);
        }
        let indices: Vec<Option<usize>> = mine.iter().map(|t| positions.get(t).copied()).collect();
        let missing = indices.iter().filter(|i| i.is_none()).count();
        if missing > 0 {
            warn!(
                "'{}' has no value at {} of {} timestamps, filling with NaN",
                name,
                missing,
                mine.len()
            );
        }
        Ok(var.reindex(TIME_DIM, &indices))
    }

    /// Inserts `other`'s variable `source` as `name`, aligned on time labels.
    pub fn insert_aligned(
        &mut self,
        name: &str,
        other: &Dataset,
        source: &str,
    ) -> Result<(), GridError> {
        let variable = self.aligned_variable(other, source)?;
        self.insert(name, variable);
        Ok(())
    }

    pub fn rename_var(&mut self, old: &str, new: &str) -> Result<(), GridError> {
        let variable = self
            .data_vars
            .remove(old)
            .ok_or_else(|| GridError::MissingVariable(old.to_string()))?;
        self.data_vars.insert(new.to_string(), variable);
        Ok(())
    }

    pub fn drop_coord(&mut self, name: &str) -> Option<Coordinate> {
        self.coords.remove(name)
    }

    /// Keeps exactly the variables in `names`, failing if one is absent.
    pub fn retain_vars(&mut self, names: &[&str]) -> Result<(), GridError> {
        if let Some(missing) = names.iter().find(|name| !self.contains(name)) {
            return Err(GridError::MissingVariable(missing.to_string()));
        }
        self.data_vars
            .retain(|name, _| names.contains(&name.as_str()));
        Ok(())
    }

    /// Positional selection along `dim`, applied to every variable and
    /// coordinate on that dimension (and to the time axis for `time`).
    pub fn isel(&self, dim: &str, indices: &[usize]) -> Dataset {
        let time = match (&self.time, dim == TIME_DIM) {
            (Some(time), true) => Some(time.select(indices)),
            (time, _) => time.clone(),
        };
        let coords = self
            .coords
            .iter()
            .map(|(name, coord)| {
                let coord = if coord.on_dim(dim) {
                    Coordinate {
                        values: indices.iter().map(|&i| coord.values[i]).collect(),
                        ..coord.clone()
                    }
                } else {
                    coord.clone()
                };
                (name.clone(), coord)
            })
            .collect();
        let data_vars = self
            .data_vars
            .iter()
            .map(|(name, var)| (name.clone(), var.select(dim, indices)))
            .collect();
        Dataset {
            time,
            coords,
            data_vars,
            attrs: self.attrs.clone(),
        }
    }

    /// Label selection keeping coordinate values within `[min(a, b), max(a, b)]`,
    /// in their existing order.
    pub fn sel_range(&self, dim: &str, a: f64, b: f64) -> Result<Dataset, GridError> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let values = &self.coord(dim)?.values;
        let indices: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| (lo..=hi).contains(*v))
            .map(|(i, _)| i)
            .collect();
        Ok(self.isel(dim, &indices))
    }

    /// Keeps timestamps within `[start, end]` (inclusive).
    pub fn sel_time(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Dataset, GridError> {
        let indices: Vec<usize> = self
            .times()?
            .iter()
            .enumerate()
            .filter(|(_, t)| (start..=end).contains(*t))
            .map(|(i, _)| i)
            .collect();
        Ok(self.isel(TIME_DIM, &indices))
    }

    /// Sorts along the dimension of coordinate `name` by ascending value (stable).
    pub fn sortby(&self, name: &str) -> Result<Dataset, GridError> {
        let coord = self.coord(name)?;
        let values = &coord.values;
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        Ok(self.isel(coord.dim.as_deref().unwrap_or(name), &order))
    }

    pub fn reverse(&self, name: &str) -> Result<Dataset, GridError> {
        let coord = self.coord(name)?;
        let order: Vec<usize> = (0..coord.values.len()).rev().collect();
        Ok(self.isel(coord.dim.as_deref().unwrap_or(name), &order))
    }

    /// Renames a dimension along with its coordinate.
    pub fn rename_dim(&mut self, old: &str, new: &str) {
        if let Some(coord) = self.coords.remove(old) {
            self.coords.insert(new.to_string(), coord);
        }
        for coord in self.coords.values_mut().filter(|c| c.on_dim(old)) {
            coord.dim = Some(new.to_string());
        }
        for var in self.data_vars.values_mut() {
            var.rename_dim(old, new);
        }
    }

    /// Replaces the time axis with `target`, taking source positions from
    /// `indices`; `None` positions are filled with NaN.
    pub fn reindex_time(&self, target: Vec<NaiveDateTime>, indices: &[Option<usize>]) -> Dataset {
        let data_vars = self
            .data_vars
            .iter()
            .map(|(name, var)| (name.clone(), var.reindex(TIME_DIM, indices)))
            .collect();
        Dataset {
            time: Some(TimeAxis::Standard(target)),
            coords: self.coords.clone(),
            data_vars,
            attrs: self.attrs.clone(),
        }
    }

    /// Adds `other`'s variables and coordinates. Entries already present are
    /// kept; both time axes, when present, must have the same length.
    pub fn merge(&mut self, other: Dataset) -> Result<(), GridError> {
        if let (Some(mine), Some(theirs)) = (&self.time, &other.time) {
            if mine.len() != theirs.len() {
                return Err(GridError::IncompatibleTimeAxes(format!(
                    "merging {} timestamps with {}",
                    mine.len(),
                    theirs.len()
                )));
            }
        }
        if self.time.is_none() {
            self.time = other.time;
        }
        for (name, coord) in other.coords {
            self.coords.entry(name).or_insert(coord);
        }
        for (name, var) in other.data_vars {
            if self.data_vars.contains_key(&name) {
                debug!("Keeping existing '{}' while merging", name);
                continue;
            }
            self.data_vars.insert(name, var);
        }
        Ok(())
    }

    /// Joins datasets end to end along time, in the given order. Variables
    /// and coordinates without a time dimension are taken from the first part.
    pub fn concat_time(parts: Vec<Dataset>) -> Result<Dataset, GridError> {
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            return Ok(Dataset::default());
        };
        let rest: Vec<Dataset> = parts.collect();
        if rest.is_empty() {
            return Ok(first);
        }

        let mut axes = Vec::with_capacity(rest.len() + 1);
        axes.push(first.time.as_ref().ok_or(GridError::MissingTimeAxis)?);
        for part in &rest {
            axes.push(part.time.as_ref().ok_or(GridError::MissingTimeAxis)?);
        }
        let time = TimeAxis::concat(&axes)?;

        let mut data_vars = BTreeMap::new();
        for (name, var) in &first.data_vars {
            if !var.has_dim(TIME_DIM) {
                data_vars.insert(name.clone(), var.clone());
                continue;
            }
            let mut pieces = Vec::with_capacity(rest.len() + 1);
            pieces.push(var.clone());
            for part in &rest {
                pieces.push(part.variable(name)?.clone());
            }
            data_vars.insert(name.clone(), Variable::concat(TIME_DIM, &pieces)?);
        }

        Ok(Dataset {
            time: Some(time),
            coords: first.coords,
            data_vars,
            attrs: first.attrs,
        })
    }
}
