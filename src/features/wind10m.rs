use crate::catalog::search::SearchService;
use crate::error::CmipError;
use crate::features::physics::wind_speed;
use crate::features::FeatureContext;
use crate::grid::dataset::Dataset;
use crate::retrieval::opener::DatasetOpener;
use crate::types::feature::Feature;

/// 10 m wind components and their speed.
pub async fn get_data_wind10m<S, O>(ctx: &FeatureContext<'_, S, O>) -> Result<Dataset, CmipError>
where
    S: SearchService,
    O: DatasetOpener,
{
    let uas = ctx.fetch("uas").await?;
    let vas = ctx.fetch("vas").await?;

    let va10m = uas.aligned_variable(&vas, "vas")?;
    let speed = wind_speed(uas.variable("uas")?, &va10m)?;

    let mut ds = uas;
    ds.rename_var("uas", "ua10m")?;
    ds.insert("va10m", va10m);
    ds.insert("wnd10m", speed);
    ds.drop_coord("height");

    ctx.finish(ds, Feature::Wind10m)
}
