use crate::catalog::search::SearchService;
use crate::error::CmipError;
use crate::features::FeatureContext;
use crate::grid::dataset::Dataset;
use crate::retrieval::opener::DatasetOpener;
use crate::types::feature::Feature;

/// Near-surface temperature, specific humidity and surface pressure.
pub async fn get_data_surface<S, O>(ctx: &FeatureContext<'_, S, O>) -> Result<Dataset, CmipError>
where
    S: SearchService,
    O: DatasetOpener,
{
    let tas = ctx.fetch("tas").await?;
    let huss = ctx.fetch("huss").await?;
    let ps = ctx.fetch("ps").await?;

    let mut ds = tas;
    ds.rename_var("tas", "temperature")?;
    ds.insert_aligned("humidity", &huss, "huss")?;
    ds.insert_aligned("pressure", &ps, "ps")?;
    ds.drop_coord("height");

    ctx.finish(ds, Feature::Surface)
}
