//! In-memory collaborators and synthetic grids for tests.

use crate::catalog::error::CatalogError;
use crate::catalog::search::{DatasetRecord, SearchService};
use crate::grid::calendar::{Calendar, CfDateTime, TimeAxis};
use crate::grid::dataset::{Coordinate, Dataset};
use crate::grid::variable::Variable;
use crate::grid::{LAT, LEVEL_DIM, LON, TIME_DIM};
use crate::retrieval::error::RetrievalError;
use crate::retrieval::opener::DatasetOpener;
use crate::types::locator::Locator;
use crate::types::query::QueryParameters;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Longitudes on the archive's `0..360` convention, wrapping to `-2..=2`.
pub const TEST_LON: [f64; 5] = [0.0, 1.0, 2.0, 358.0, 359.0];
/// Latitudes north to south.
pub const TEST_LAT: [f64; 5] = [2.0, 1.0, 0.0, -1.0, -2.0];

/// Catalog keyed by `(variable, frequency)`, recording every searched frequency.
#[derive(Debug, Default)]
pub struct MemorySearch {
    datasets: HashMap<(String, String), String>,
    files: HashMap<String, Vec<Locator>>,
    searched: Mutex<Vec<String>>,
}

impl MemorySearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(mut self, variable: &str, frequency: &str, files: Vec<Locator>) -> Self {
        let id = format!("CMIP6.test.{variable}.{frequency}");
        self.datasets
            .insert((variable.to_string(), frequency.to_string()), id.clone());
        self.files.insert(id, files);
        self
    }

    pub fn searched_frequencies(&self) -> Vec<String> {
        self.searched.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchService for MemorySearch {
    async fn search_datasets(
        &self,
        query: &QueryParameters,
    ) -> Result<Vec<DatasetRecord>, CatalogError> {
        if let Ok(mut searched) = self.searched.lock() {
            searched.push(query.frequency().to_string());
        }
        let key = (
            query.variable().unwrap_or_default().to_string(),
            query.frequency().to_string(),
        );
        Ok(self
            .datasets
            .get(&key)
            .map(|id| DatasetRecord {
                id: id.clone(),
                data_node: None,
                number_of_files: self.files.get(id).map(|f| f.len() as u64),
            })
            .into_iter()
            .collect())
    }

    async fn list_files(&self, dataset: &DatasetRecord) -> Result<Vec<Locator>, CatalogError> {
        Ok(self.files.get(&dataset.id).cloned().unwrap_or_default())
    }
}

/// Serves prepared datasets by file name and tracks how many opens overlap.
#[derive(Debug, Default)]
pub struct MemoryOpener {
    files: HashMap<String, Dataset>,
    delay: Option<Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    opened: Mutex<Vec<String>>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, filename: &str, ds: Dataset) -> Self {
        self.files.insert(filename.to_string(), ds);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DatasetOpener for MemoryOpener {
    async fn open(
        &self,
        locator: &Locator,
        _staging_dir: &Path,
    ) -> Result<Dataset, RetrievalError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if let Ok(mut opened) = self.opened.lock() {
            opened.push(locator.filename.clone());
        }
        self.files
            .get(&locator.filename)
            .cloned()
            .ok_or_else(|| RetrievalError::Open {
                locator: locator.filename.clone(),
                message: "not in memory".to_string(),
            })
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .unwrap_or_default()
}

pub fn hourly(start: NaiveDateTime, steps: usize) -> Vec<NaiveDateTime> {
    (0..steps)
        .map(|i| start + TimeDelta::hours(i as i64))
        .collect()
}

fn time_axis(times: &[NaiveDateTime], calendar: Option<Calendar>) -> TimeAxis {
    match calendar {
        None => TimeAxis::Standard(times.to_vec()),
        Some(calendar) => TimeAxis::Calendar {
            calendar,
            dates: times.iter().copied().map(CfDateTime::from_naive).collect(),
        },
    }
}

fn with_horizontal_coords(mut ds: Dataset) -> Dataset {
    ds.coords
        .insert(LON.to_string(), Coordinate::new(LON, TEST_LON.to_vec()));
    ds.coords
        .insert(LAT.to_string(), Coordinate::new(LAT, TEST_LAT.to_vec()));
    ds
}

/// A `(time, lat, lon)` field where each value is
/// `base + 100 * step + 10 * lat_index + lon_index`.
pub fn surface_field(steps: usize, base: f64) -> Variable {
    let (ny, nx) = (TEST_LAT.len(), TEST_LON.len());
    let values = (0..steps * ny * nx)
        .map(|i| base + (100 * (i / (ny * nx)) + 10 * ((i / nx) % ny) + i % nx) as f64)
        .collect();
    Variable::from_shape_vec(&[TIME_DIM, LAT, LON], &[steps, ny, nx], values)
        .unwrap_or_else(|_| Variable::scalar(f64::NAN))
}

/// One file of a near-surface variable with hourly steps from `start`.
pub fn surface_file(
    var: &str,
    start: NaiveDateTime,
    steps: usize,
    base: f64,
    calendar: Option<Calendar>,
) -> Dataset {
    let mut ds = with_horizontal_coords(Dataset {
        time: Some(time_axis(&hourly(start, steps), calendar)),
        ..Default::default()
    });
    ds.coords.insert("height".to_string(), Coordinate::scalar(2.0));
    ds.insert(var, surface_field(steps, base));
    ds
}

/// Standard-calendar surface file starting `start_hour` hours into `year`.
pub fn hourly_surface_file(
    var: &str,
    year: i32,
    start_hour: i64,
    steps: usize,
    base: f64,
) -> Dataset {
    let start = at(year, 1, 1, 0) + TimeDelta::hours(start_hour);
    surface_file(var, start, steps, base, None)
}

fn constant(dims: &[&str], shape: &[usize], value: f64) -> Variable {
    let len = shape.iter().product();
    Variable::from_shape_vec(dims, shape, vec![value; len])
        .unwrap_or_else(|_| Variable::scalar(f64::NAN))
}

/// Vertical coordinate description for a level file.
#[derive(Debug, Clone)]
pub enum Levels {
    /// Hybrid sigma-pressure with pre-scaled `ap`, `b` and surface pressure `ps`.
    HybridAp { lev: Vec<f64>, ap: Vec<f64>, b: Vec<f64>, ps: f64 },
    /// Hybrid sigma-pressure with `a`, `b`, reference `p0` and `ps`.
    HybridA { lev: Vec<f64>, a: Vec<f64>, b: Vec<f64>, p0: f64, ps: f64 },
    /// Pressure levels with `b` and orography `orog`.
    Pressure { lev: Vec<f64>, b: Vec<f64>, orog: f64 },
}

impl Levels {
    fn lev(&self) -> &[f64] {
        match self {
            Levels::HybridAp { lev, .. }
            | Levels::HybridA { lev, .. }
            | Levels::Pressure { lev, .. } => lev,
        }
    }
}

/// A `(time, lev, lat, lon)` file holding `var` at a constant value per level
/// plus the auxiliary fields of `levels`.
pub fn level_file(
    var: &str,
    start: NaiveDateTime,
    steps: usize,
    per_level: &[f64],
    levels: &Levels,
) -> Dataset {
    let (nz, ny, nx) = (levels.lev().len(), TEST_LAT.len(), TEST_LON.len());
    let mut ds = with_horizontal_coords(Dataset {
        time: Some(TimeAxis::Standard(hourly(start, steps))),
        ..Default::default()
    });
    ds.coords.insert(
        LEVEL_DIM.to_string(),
        Coordinate::new(LEVEL_DIM, levels.lev().to_vec()),
    );

    let values = (0..steps * nz * ny * nx)
        .map(|i| per_level[(i / (ny * nx)) % nz])
        .collect();
    if let Ok(field) =
        Variable::from_shape_vec(&[TIME_DIM, LEVEL_DIM, LAT, LON], &[steps, nz, ny, nx], values)
    {
        ds.insert(var, field);
    }

    let surface = [TIME_DIM, LAT, LON];
    let surface_shape = [steps, ny, nx];
    let on_levels = |values: &[f64]| {
        Variable::from_shape_vec(&[LEVEL_DIM], &[values.len()], values.to_vec())
            .unwrap_or_else(|_| Variable::scalar(f64::NAN))
    };
    match levels {
        Levels::HybridAp { ap, b, ps, .. } => {
            ds.insert("ap", on_levels(ap));
            ds.insert("b", on_levels(b));
            ds.insert("ps", constant(&surface, &surface_shape, *ps));
        }
        Levels::HybridA { a, b, p0, ps, .. } => {
            ds.insert("a", on_levels(a));
            ds.insert("b", on_levels(b));
            ds.insert("p0", Variable::scalar(*p0));
            ds.insert("ps", constant(&surface, &surface_shape, *ps));
        }
        Levels::Pressure { b, orog, .. } => {
            ds.insert("b", on_levels(b));
            ds.insert("orog", constant(&[LAT, LON], &[ny, nx], *orog));
        }
    }
    ds
}
