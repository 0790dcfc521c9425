//! References to remote files returned by the catalog.

use serde::{Deserialize, Serialize};

/// One published file of a dataset.
///
/// CMIP filenames end in the covered date range, e.g.
/// `ua_6hrLev_MPI-ESM1-2-HR_ssp585_r1i1p1f1_gn_201501010600-201601010000.nc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub filename: String,
    pub opendap_url: Option<String>,
    pub download_url: Option<String>,
}

impl Locator {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            opendap_url: None,
            download_url: None,
        }
    }

    pub fn with_opendap_url(mut self, url: impl Into<String>) -> Self {
        self.opendap_url = Some(url.into());
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// The `start-end` token: the last `_`-separated segment of the file
    /// name, without extension.
    pub fn date_range_token(&self) -> &str {
        let name = self.filename.rsplit('/').next().unwrap_or(&self.filename);
        let segment = name.rsplit('_').next().unwrap_or(name);
        segment.split('.').next().unwrap_or(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_token() {
        let locator = Locator::new(
            "ua_6hrLev_MPI-ESM1-2-HR_ssp585_r1i1p1f1_gn_201501010600-201601010000.nc",
        );
        assert_eq!(locator.date_range_token(), "201501010600-201601010000");

        let with_path = Locator::new("thredds/dodsC/cmip6/tas_day_X_gn_20150101-20241231.nc");
        assert_eq!(with_path.date_range_token(), "20150101-20241231");
    }
}
