//! The feature families this crate can derive from CMIP output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A group of derived variables retrieved and computed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// Wind speed and geopotential height on the lowest model or pressure levels.
    Wind,
    /// 10 m wind components and speed.
    Wind10m,
    /// Near-surface temperature, specific humidity and surface pressure.
    Surface,
    /// Downwelling and upwelling shortwave radiation at the surface.
    Influx,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Wind => "wind",
            Feature::Wind10m => "wind10m",
            Feature::Surface => "surface",
            Feature::Influx => "influx",
        }
    }

    /// The exact variable set a dataset for this feature carries.
    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            Feature::Wind => &["wnd", "z", "ua", "va", "ta", "hus", "pa"],
            Feature::Wind10m => &["ua10m", "va10m", "wnd10m"],
            Feature::Surface => &["temperature", "humidity", "pressure"],
            Feature::Influx => &["influx", "outflux"],
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
