//! Coarse year-level test of which published files cover the requested period.

use crate::types::locator::Locator;
use log::{debug, warn};
use std::collections::BTreeSet;

/// Parses the start and end year of a `YYYYMMDD[hhmm]-YYYYMMDD[hhmm]` token.
/// Anything after the first `.` is ignored.
pub fn parse_year_span(token: &str) -> Option<(i32, i32)> {
    let token = token.split('.').next()?;
    let (start, end) = token.split_once('-')?;
    let year = |part: &str| part.get(..4)?.parse::<i32>().ok();
    Some((year(start)?, year(end)?))
}

/// Whether a file spanning `token` covers any of `years`.
///
/// A file is kept when its range collapses to a single requested year, or
/// when any year start from the first to the last year of the range is
/// requested. Partial overlap is enough; the exact cut happens on time labels
/// after opening.
pub fn year_in_file(token: &str, years: &BTreeSet<i32>) -> bool {
    let Some((start, end)) = parse_year_span(token) else {
        warn!("Cannot read a date range from '{}', skipping file", token);
        return false;
    };
    if start > end {
        warn!("Date range '{}' ends before it starts, skipping file", token);
        return false;
    }
    if start == end {
        return years.contains(&end);
    }
    years.range(start..=end).next().is_some()
}

/// Keeps the locators whose date range intersects `years`, ordered by the
/// start of their range.
pub fn filter_locators(locators: Vec<Locator>, years: &BTreeSet<i32>) -> Vec<Locator> {
    let total = locators.len();
    let mut kept: Vec<Locator> = locators
        .into_iter()
        .filter(|locator| year_in_file(locator.date_range_token(), years))
        .collect();
    kept.sort_by(|a, b| a.date_range_token().cmp(b.date_range_token()));
    debug!("{} of {} files cover years {:?}", kept.len(), total, years);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years(list: &[i32]) -> BTreeSet<i32> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_parse_year_span() {
        assert_eq!(parse_year_span("20150101-20241231"), Some((2015, 2024)));
        assert_eq!(
            parse_year_span("201501010600-201601010000.nc"),
            Some((2015, 2016))
        );
        assert_eq!(parse_year_span("fx"), None);
        assert_eq!(parse_year_span("20-2015"), None);
    }

    #[test]
    fn test_single_requested_year_included() {
        assert!(year_in_file("20150101-20151231", &years(&[2015])));
        assert!(year_in_file("20150701-20150731.nc", &years(&[2014, 2015])));
    }

    #[test]
    fn test_disjoint_range_excluded() {
        assert!(!year_in_file("20150101-20191231", &years(&[2010, 2030])));
        assert!(!year_in_file("20150101-20151231", &years(&[2016])));
    }

    #[test]
    fn test_multi_year_range_included_when_any_year_requested() {
        assert!(year_in_file("20100101-20141231", &years(&[2012])));
        // A file ending exactly at the first instant of a requested year.
        assert!(year_in_file("201401010600-201501010000", &years(&[2015])));
    }

    #[test]
    fn test_unparseable_token_excluded() {
        assert!(!year_in_file("latest", &years(&[2015])));
    }

    #[test]
    fn test_reversed_range_excluded() {
        assert!(!year_in_file("20200101-20151231", &years(&[2015, 2017, 2020])));
        let kept = filter_locators(
            vec![
                Locator::new("tas_day_gn_20200101-20151231.nc"),
                Locator::new("tas_day_gn_20150101-20151231.nc"),
            ],
            &years(&[2015]),
        );
        let tokens: Vec<&str> = kept.iter().map(Locator::date_range_token).collect();
        assert_eq!(tokens, ["20150101-20151231"]);
    }

    #[test]
    fn test_filter_orders_by_range_start() {
        let locators = vec![
            Locator::new("tas_day_M_ssp585_r1_gn_20200101-20241231.nc"),
            Locator::new("tas_day_M_ssp585_r1_gn_20150101-20191231.nc"),
            Locator::new("tas_day_M_ssp585_r1_gn_20250101-20291231.nc"),
        ];
        let kept = filter_locators(locators, &years(&[2019, 2020]));
        let tokens: Vec<&str> = kept.iter().map(Locator::date_range_token).collect();
        assert_eq!(tokens, ["20150101-20191231", "20200101-20241231"]);
    }
}
