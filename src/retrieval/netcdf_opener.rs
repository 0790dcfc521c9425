//! Reads staged NetCDF files into [`Dataset`]s.

use crate::grid::calendar::{Calendar, TimeAxis};
use crate::grid::dataset::{Coordinate, Dataset};
use crate::grid::variable::Variable;
use crate::grid::TIME_DIM;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::opener::DatasetOpener;
use crate::retrieval::staging::stage_locator;
use crate::types::locator::Locator;
use async_trait::async_trait;
use log::{debug, warn};
use netcdf::AttributeValue;
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::task;

/// Downloads each file into the staging directory and decodes it.
#[derive(Debug, Clone, Default)]
pub struct NetcdfOpener {
    client: Client,
}

impl NetcdfOpener {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatasetOpener for NetcdfOpener {
    async fn open(
        &self,
        locator: &Locator,
        staging_dir: &Path,
    ) -> Result<Dataset, RetrievalError> {
        let path = stage_locator(&self.client, locator, staging_dir).await?;
        let name = locator.filename.clone();
        task::spawn_blocking(move || read_dataset(path, &name)).await?
    }
}

fn open_error(locator: &str, message: impl ToString) -> RetrievalError {
    RetrievalError::Open {
        locator: locator.to_string(),
        message: message.to_string(),
    }
}

fn string_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

fn numeric_attribute(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(value) => Some(value),
        AttributeValue::Float(value) => Some(f64::from(value)),
        AttributeValue::Int(value) => Some(f64::from(value)),
        AttributeValue::Short(value) => Some(f64::from(value)),
        _ => None,
    }
}

fn read_dataset(path: PathBuf, locator: &str) -> Result<Dataset, RetrievalError> {
    let file = netcdf::open(&path).map_err(|e| open_error(locator, e))?;
    let mut ds = Dataset::default();

    let scalar_coords: BTreeSet<String> = file
        .variables()
        .filter_map(|var| string_attribute(&var, "coordinates"))
        .flat_map(|names| {
            names
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    for var in file.variables() {
        let name = var.name();
        if name.ends_with("_bnds") || name.ends_with("_bounds") {
            continue;
        }
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let mut values = match var.get_values::<f64, _>(..) {
            Ok(values) => values,
            Err(e) => {
                debug!("Skipping non-numeric variable '{}' in {}: {}", name, locator, e);
                continue;
            }
        };
        let fills: Vec<f64> = ["_FillValue", "missing_value"]
            .iter()
            .filter_map(|attr| numeric_attribute(&var, attr))
            .collect();
        for value in values.iter_mut() {
            if fills.contains(value) {
                *value = f64::NAN;
            }
        }

        if name == TIME_DIM && dims.len() == 1 {
            let units = string_attribute(&var, "units")
                .ok_or_else(|| open_error(locator, "time variable has no 'units'"))?;
            let calendar: Calendar = string_attribute(&var, "calendar")
                .as_deref()
                .unwrap_or("standard")
                .parse()?;
            ds.time = Some(TimeAxis::decode(&units, calendar, &values)?);
            continue;
        }
        if dims.len() == 1 && dims[0] == name {
            ds.coords.insert(name.clone(), Coordinate::new(&name, values));
            continue;
        }
        if dims.is_empty() && scalar_coords.contains(&name) {
            if let Some(&value) = values.first() {
                ds.coords.insert(name, Coordinate::scalar(value));
            }
            continue;
        }
        ds.insert(&name, Variable::from_shape_vec(&dims, &shape, values)?);
    }

    if ds.time.is_none() {
        warn!("{} has no time axis", locator);
    }
    debug!(
        "Read {} with variables {:?}",
        locator,
        ds.data_vars.keys().collect::<Vec<_>>()
    );
    Ok(ds)
}
