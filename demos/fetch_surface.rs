use chrono::{NaiveDate, TimeDelta};
use cmip_esgf::{Bounds, Cmip, CmipError, CutoutSpec, EsgfParams, RetrievalLock};
use std::env;

#[tokio::main]
async fn main() -> Result<(), CmipError> {
    let staging_dir = env::temp_dir().join("cmip_esgf");
    let start = NaiveDate::from_ymd_opt(2030, 7, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    // Two days of 6-hourly steps over the Netherlands.
    let cutout = CutoutSpec::builder()
        .times((0..8).map(|i| start + TimeDelta::hours(6 * i)).collect())
        .bounds(Bounds::new(3.0, 50.5, 7.5, 53.5))
        .dt("6H".to_string())
        .esgf_params(EsgfParams::new("MPI-ESM1-2-HR", "r1i1p1f1", "ssp585", "CMIP6"))
        .build();

    let client = Cmip::new();
    let lock = RetrievalLock::new();

    let surface = client
        .get_data()
        .cutout(&cutout)
        .feature("surface")
        .staging_dir(&staging_dir)
        .lock(&lock)
        .call()
        .await?;

    println!("{:#?}", surface.attrs);
    for (name, variable) in &surface.data_vars {
        println!("{name}: {:?} {:?}", variable.dims(), variable.shape());
    }

    Ok(())
}
