//! Entry point: retrieve one feature of CMIP output for a cutout.

use crate::catalog::search::SearchService;
use crate::error::CmipError;
use crate::features::{calculate, lookup, FeatureContext};
use crate::grid::dataset::Dataset;
use crate::retrieval::engine::RetrievalEngine;
use crate::retrieval::lock::RetrievalLock;
use crate::retrieval::opener::DatasetOpener;
use crate::types::cadence::Cadence;
use crate::types::cutout::Cutout;
use crate::types::query::QueryParameters;
use bon::bon;
use log::{debug, info};
use std::path::Path;

#[cfg(feature = "netcdf")]
use crate::catalog::search::EsgfSearchClient;
#[cfg(feature = "netcdf")]
use crate::retrieval::netcdf_opener::NetcdfOpener;

/// Retrieves CMIP features from a search service through a dataset opener.
///
/// With the `netcdf` feature, [`Cmip::new`] wires the ESGF REST client and the
/// NetCDF opener. Any other pair of [`SearchService`] and [`DatasetOpener`]
/// can be plugged in with [`Cmip::with_services`].
pub struct Cmip<S, O> {
    engine: RetrievalEngine<S, O>,
}

#[cfg(feature = "netcdf")]
impl Cmip<EsgfSearchClient, NetcdfOpener> {
    /// A client against the default ESGF index node.
    pub fn new() -> Self {
        Self::with_services(EsgfSearchClient::builder().build(), NetcdfOpener::new())
    }
}

#[cfg(feature = "netcdf")]
impl Default for Cmip<EsgfSearchClient, NetcdfOpener> {
    fn default() -> Self {
        Self::new()
    }
}

#[bon]
impl<S: SearchService, O: DatasetOpener> Cmip<S, O> {
    pub fn with_services(search: S, opener: O) -> Self {
        Self {
            engine: RetrievalEngine::new(search, opener),
        }
    }

    pub fn engine(&self) -> &RetrievalEngine<S, O> {
        &self.engine
    }

    /// Retrieves `feature` for `cutout`, shaped to its time window and bounds.
    ///
    /// The search frequency is the cutout's global `frequency` when set,
    /// otherwise the archive token for the cutout's `dt` code. Per-feature
    /// overrides in the cutout's parameters win over both.
    ///
    /// # Optional Builder Methods
    ///
    /// * `.lock(&RetrievalLock)`: serialize retrieval with other holders of the lock.
    /// * `.sanitize(bool)`: apply the feature's sanitizer if it has one (default `true`).
    ///
    /// # Errors
    ///
    /// * [`CmipError::MissingQueryParameters`] if the cutout has no ESGF parameters.
    /// * [`CmipError::UnknownCadence`] if no frequency is set and `dt` is not a known code.
    /// * [`CmipError::UnknownFeature`] if `feature` is not registered.
    /// * [`CmipError::Catalog`] / [`CmipError::Retrieval`] if any variable cannot be
    ///   found or opened; no partial result is returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # #[cfg(feature = "netcdf")]
    /// # async fn run() -> Result<(), cmip_esgf::CmipError> {
    /// use cmip_esgf::{Bounds, Cmip, CutoutSpec, EsgfParams};
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    /// let cutout = CutoutSpec::builder()
    ///     .times((0..8).map(|i| start + chrono::TimeDelta::hours(3 * i)).collect())
    ///     .bounds(Bounds::new(5.0, 50.0, 10.0, 55.0))
    ///     .dt("3H".to_string())
    ///     .esgf_params(EsgfParams::new("MPI-ESM1-2-HR", "r1i1p1f1", "ssp585", "CMIP6"))
    ///     .build();
    ///
    /// let cmip = Cmip::new();
    /// let influx = cmip
    ///     .get_data()
    ///     .cutout(&cutout)
    ///     .feature("influx")
    ///     .staging_dir(std::path::Path::new("/tmp/cmip"))
    ///     .call()
    ///     .await?;
    /// println!("{:?}", influx.attrs);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn get_data(
        &self,
        cutout: &dyn Cutout,
        feature: &str,
        staging_dir: &Path,
        lock: Option<&RetrievalLock>,
        #[builder(default = true)] sanitize: bool,
    ) -> Result<Dataset, CmipError> {
        let params = cutout
            .esgf_params()
            .ok_or(CmipError::MissingQueryParameters)?;

        let (frequency, cadence) = match (&params.frequency, cutout.dt().parse::<Cadence>()) {
            (Some(frequency), cadence) => (frequency.clone(), cadence.ok()),
            (None, cadence) => {
                let cadence = cadence?;
                (cadence.frequency().to_string(), Some(cadence))
            }
        };
        if cadence.is_none() {
            debug!("No cadence for dt '{}', time labels kept as converted", cutout.dt());
        }

        let registration = lookup(feature)?;
        let window = cutout.time_window().ok_or(CmipError::EmptyCutoutTime)?;
        let no_lock = RetrievalLock::none();

        let ctx = FeatureContext {
            engine: &self.engine,
            query: QueryParameters::for_feature(params, registration.feature, &frequency),
            target_times: cutout.times(),
            window,
            bounds: cutout.bounds(),
            years: cutout.years(),
            cadence,
            staging_dir,
            lock: lock.unwrap_or(&no_lock),
        };

        info!("Requesting data for feature {}...", feature);
        let ds = calculate(registration.feature, &ctx).await?;

        match registration.sanitizer {
            Some(sanitizer) if sanitize => {
                debug!("Sanitizing {}", feature);
                Ok(sanitizer(ds)?)
            }
            _ => Ok(ds),
        }
    }
}
