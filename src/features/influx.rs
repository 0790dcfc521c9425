use crate::catalog::search::SearchService;
use crate::error::CmipError;
use crate::features::FeatureContext;
use crate::grid::dataset::Dataset;
use crate::grid::error::GridError;
use crate::retrieval::opener::DatasetOpener;
use crate::types::feature::Feature;

/// Downwelling and upwelling shortwave radiation at the surface.
pub async fn get_data_influx<S, O>(ctx: &FeatureContext<'_, S, O>) -> Result<Dataset, CmipError>
where
    S: SearchService,
    O: DatasetOpener,
{
    let rsds = ctx.fetch("rsds").await?;
    let rsus = ctx.fetch("rsus").await?;

    let mut ds = rsds;
    ds.insert_aligned("rsus", &rsus, "rsus")?;
    ds.rename_var("rsds", "influx")?;
    ds.rename_var("rsus", "outflux")?;

    ctx.finish(ds, Feature::Influx)
}

/// Clips negative downwelling radiation to zero. Missing values stay NaN.
pub fn sanitize_influx(mut ds: Dataset) -> Result<Dataset, GridError> {
    let influx = ds
        .data_vars
        .get_mut("influx")
        .ok_or_else(|| GridError::MissingVariable("influx".to_string()))?;
    influx.map_inplace(|v| if v < 0.0 { 0.0 } else { v });
    Ok(ds)
}
