//! The target grid the retrieved data is prepared for.

use crate::types::query::EsgfParams;
use bon::Builder;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::collections::BTreeSet;

/// Spatial extent of a cutout: `(x_min, y_min, x_max, y_max)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

/// What the retrieval pipeline needs from a cutout.
pub trait Cutout: Sync {
    /// The cutout's time coordinate, ascending.
    fn times(&self) -> &[NaiveDateTime];

    fn bounds(&self) -> Bounds;

    /// Nominal time step code, e.g. `"6H"` or `"D"`.
    fn dt(&self) -> &str;

    fn esgf_params(&self) -> Option<&EsgfParams>;

    /// Calendar years touched by the time coordinate.
    fn years(&self) -> BTreeSet<i32> {
        self.times().iter().map(|t| t.year()).collect()
    }

    /// First and last timestamp, truncated to the hour.
    fn time_window(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let truncate = |t: &NaiveDateTime| {
            t.date()
                .and_hms_opt(t.hour(), 0, 0)
                .unwrap_or(*t)
        };
        let first = self.times().first()?;
        let last = self.times().last()?;
        Some((truncate(first), truncate(last)))
    }
}

/// A plain in-memory cutout description.
///
/// # Examples
///
/// ```
/// use cmip_esgf::{Bounds, CutoutSpec, EsgfParams};
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let cutout = CutoutSpec::builder()
///     .times((0..4).map(|h| start + chrono::Duration::hours(6 * h)).collect())
///     .bounds(Bounds::new(5.0, 50.0, 10.0, 55.0))
///     .dt("6H".to_string())
///     .esgf_params(EsgfParams::new("MPI-ESM1-2-HR", "r1i1p1f1", "ssp585", "CMIP6"))
///     .build();
/// ```
#[derive(Debug, Clone, Builder)]
pub struct CutoutSpec {
    times: Vec<NaiveDateTime>,
    bounds: Bounds,
    dt: String,
    esgf_params: Option<EsgfParams>,
}

impl Cutout for CutoutSpec {
    fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn dt(&self) -> &str {
        &self.dt
    }

    fn esgf_params(&self) -> Option<&EsgfParams> {
        self.esgf_params.as_ref()
    }
}
