//! Wind speed and height on the lowest levels.
//!
//! Model-level files carry surface pressure `ps` next to the wind components;
//! their heights are integrated hydrostatically from the surface. Pressure-level
//! files carry `b` and orography instead, and height follows directly from the
//! level value.

use crate::catalog::search::SearchService;
use crate::error::CmipError;
use crate::features::physics::{
    full_level_pressure, geopotential_height, pressure_level_height, virtual_temperature,
    wind_speed, LEVEL_LAYOUT,
};
use crate::features::FeatureContext;
use crate::grid::dataset::Dataset;
use crate::grid::LEVEL_DIM;
use crate::retrieval::opener::DatasetOpener;
use crate::types::feature::Feature;
use log::info;

/// Hybrid sigma-pressure levels kept, as fractions of surface pressure.
pub const HYBRID_LEVELS: (f64, f64) = (1.0, 0.9);
/// Pressure levels kept.
pub const PRESSURE_LEVELS: (f64, f64) = (50.0, 200.0);

pub async fn get_data_wind<S, O>(ctx: &FeatureContext<'_, S, O>) -> Result<Dataset, CmipError>
where
    S: SearchService,
    O: DatasetOpener,
{
    let u = ctx.fetch("ua").await?;
    let v = ctx.fetch("va").await?;

    let hybrid = u.contains("ps");
    let (lo, hi) = if hybrid {
        HYBRID_LEVELS
    } else {
        PRESSURE_LEVELS
    };
    info!(
        "Selecting {} levels in [{}, {}]",
        if hybrid { "model" } else { "pressure" },
        lo,
        hi
    );

    let u = u.sel_range(LEVEL_DIM, lo, hi)?;
    let v = v.sel_range(LEVEL_DIM, lo, hi)?;
    let t = ctx.fetch("ta").await?.sel_range(LEVEL_DIM, lo, hi)?;
    let q = ctx.fetch("hus").await?.sel_range(LEVEL_DIM, lo, hi)?;

    // Every input is put on the time labels of `ua`.
    let ua = u.variable("ua")?.transpose(&LEVEL_LAYOUT)?;
    let va = u.aligned_variable(&v, "va")?.transpose(&LEVEL_LAYOUT)?;
    let ta = u.aligned_variable(&t, "ta")?.transpose(&LEVEL_LAYOUT)?;
    let hus = u.aligned_variable(&q, "hus")?.transpose(&LEVEL_LAYOUT)?;
    let wnd = wind_speed(&ua, &va)?;

    let (z, pa) = if hybrid {
        let ps = if t.contains("ps") {
            u.aligned_variable(&t, "ps")?
        } else {
            u.variable("ps")?.clone()
        };
        let tv = virtual_temperature(&ta, &hus)?;
        let pa = full_level_pressure(&u, &ps)?;
        let z = geopotential_height(&tv, &pa, &ps)?;
        (z, pa)
    } else {
        let z = pressure_level_height(&u, &wnd)?;
        let pa = u.coord_variable(LEVEL_DIM)?.broadcast_like(&wnd)?;
        (z, pa)
    };

    let mut ds = u;
    ds.insert("wnd", wnd);
    ds.insert("z", z);
    ds.insert("ua", ua);
    ds.insert("va", va);
    ds.insert("ta", ta);
    ds.insert("hus", hus);
    ds.insert("pa", pa);

    ctx.finish(ds, Feature::Wind)
}
