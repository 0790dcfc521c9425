//! Canonical axes and time labels for raw archive datasets.
//!
//! Raw files name their horizontal axes `lon`/`lat`, often on `0..360`, and
//! label time on the model's own calendar at the interval centre. After
//! [`normalize`] a dataset has ascending `x`/`y` axes with longitude in
//! `[-180, 180)`, a standard-calendar time axis and bin-start labels.

use crate::grid::calendar::{Calendar, CfDateTime, TimeAxis};
use crate::grid::dataset::{Coordinate, Dataset};
use crate::grid::error::GridError;
use crate::grid::{LAT, LON, X_DIM, Y_DIM};
use crate::types::cadence::Cadence;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::collections::HashMap;

pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    /// Keep `lon`/`lat` as aliases of the renamed `x`/`y` axes.
    pub add_lon_lat: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { add_lon_lat: true }
    }
}

/// Maps a longitude onto `[-180, 180)`.
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // `rem_euclid` rounds up to 360 for inputs just below -180.
    if wrapped >= LONGITUDE_RANGE.1 {
        LONGITUDE_RANGE.0
    } else {
        wrapped
    }
}

/// Normalizes one raw variable dataset.
///
/// `target_times` is the cutout's time axis; `360_day` data is reindexed onto
/// it after conversion, leaving NaN where no source step maps. With a
/// `cadence`, converted timestamps are floored to the start of their bin.
pub fn normalize(
    mut ds: Dataset,
    target_times: &[NaiveDateTime],
    cadence: Option<Cadence>,
    options: NormalizeOptions,
) -> Result<Dataset, GridError> {
    let lon = ds
        .coords
        .get_mut(LON)
        .ok_or_else(|| GridError::MissingCoordinate(LON.to_string()))?;
    lon.values.mapv_inplace(wrap_longitude);
    lon.valid_range = Some(LONGITUDE_RANGE);
    let mut ds = ds.sortby(LON)?;

    ds.coord(LAT)?;
    ds.rename_dim(LON, X_DIM);
    ds.rename_dim(LAT, Y_DIM);
    let mut ds = swap_spatial_dims(ds)?;

    if options.add_lon_lat {
        let x = ds.coord(X_DIM)?.clone();
        let y = ds.coord(Y_DIM)?.clone();
        ds.coords.insert(LON.to_string(), x);
        ds.coords.insert(LAT.to_string(), y);
    }

    harmonize_time(ds, target_times, cadence)
}

/// Reverses `x` or `y` where they run from high to low.
fn swap_spatial_dims(mut ds: Dataset) -> Result<Dataset, GridError> {
    for dim in [X_DIM, Y_DIM] {
        let values = &ds.coord(dim)?.values;
        let descending = values.len() > 1 && values[0] > values[values.len() - 1];
        if descending {
            debug!("Reversing descending '{}' axis", dim);
            ds = ds.reverse(dim)?;
        }
    }
    Ok(ds)
}

fn harmonize_time(
    ds: Dataset,
    target_times: &[NaiveDateTime],
    cadence: Option<Cadence>,
) -> Result<Dataset, GridError> {
    let floor = |t: NaiveDateTime| cadence.map_or(t, |c| c.floor(t));
    match &ds.time {
        None => Ok(ds),
        Some(TimeAxis::Standard(times)) => {
            let times: Vec<NaiveDateTime> = times.iter().copied().map(floor).collect();
            warn_if_irregular(&times, "standard");
            Ok(Dataset {
                time: Some(TimeAxis::Standard(times)),
                ..ds
            })
        }
        Some(TimeAxis::Calendar {
            calendar: Calendar::Day360,
            dates,
        }) => {
            info!(
                "Converting 360_day calendar onto {} target timestamps",
                target_times.len()
            );
            let converted: Vec<Option<NaiveDateTime>> = dates
                .iter()
                .map(|date| date.align_day360_on_year().map(floor))
                .collect();
            let indices = reindex_positions(&converted, target_times);
            let unmatched = indices.iter().filter(|i| i.is_none()).count();
            if unmatched > 0 {
                debug!("{} target timestamps have no 360_day source", unmatched);
            }
            Ok(ds.reindex_time(target_times.to_vec(), &indices))
        }
        Some(TimeAxis::Calendar { calendar, dates }) => {
            let calendar = *calendar;
            let times = coerce_to_standard(calendar, dates)?;
            let times: Vec<NaiveDateTime> = times.into_iter().map(floor).collect();
            warn_if_irregular(&times, calendar.name());
            Ok(Dataset {
                time: Some(TimeAxis::Standard(times)),
                ..ds
            })
        }
    }
}

/// For each target timestamp, the first source position carrying it.
fn reindex_positions(
    source: &[Option<NaiveDateTime>],
    target: &[NaiveDateTime],
) -> Vec<Option<usize>> {
    let mut positions = HashMap::with_capacity(source.len());
    for (i, time) in source.iter().enumerate() {
        if let Some(time) = time {
            positions.entry(*time).or_insert(i);
        }
    }
    target.iter().map(|t| positions.get(t).copied()).collect()
}

/// Field-wise conversion, clamping dates the standard calendar lacks.
fn coerce_to_standard(
    calendar: Calendar,
    dates: &[CfDateTime],
) -> Result<Vec<NaiveDateTime>, GridError> {
    let mut clamped = 0usize;
    let mut times = Vec::with_capacity(dates.len());
    for date in dates {
        let (time, was_clamped) = date.to_naive_clamped().ok_or_else(|| {
            GridError::IncompatibleTimeAxes(format!("{date} on '{calendar}' has no standard equivalent"))
        })?;
        clamped += usize::from(was_clamped);
        times.push(time);
    }
    if clamped > 0 {
        warn!(
            "{} timestamp(s) on the '{}' calendar do not exist on the standard calendar and were clamped",
            clamped, calendar
        );
    }
    Ok(times)
}

fn warn_if_irregular(times: &[NaiveDateTime], source: &str) {
    let duplicated = times.windows(2).filter(|w| w[0] == w[1]).count();
    let reversed = times.windows(2).filter(|w| w[0] > w[1]).count();
    if duplicated > 0 || reversed > 0 {
        warn!(
            "Time axis converted from '{}' is not strictly increasing ({} duplicated, {} out of order)",
            source, duplicated, reversed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::variable::Variable;
    use chrono::NaiveDate;
    use ndarray::array;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    /// One time step over `lat` x `lon` with value `10 * lat_index + lon_index`.
    fn raw(lon: Vec<f64>, lat: Vec<f64>, time: TimeAxis) -> Result<Dataset, GridError> {
        let (nx, ny, nt) = (lon.len(), lat.len(), time.len());
        let values = (0..nt * ny * nx)
            .map(|i| (10 * ((i / nx) % ny) + i % nx) as f64)
            .collect();
        let mut ds = Dataset {
            time: Some(time),
            ..Default::default()
        };
        ds.coords.insert(LON.into(), Coordinate::new(LON, lon));
        ds.coords.insert(LAT.into(), Coordinate::new(LAT, lat));
        ds.insert(
            "tas",
            Variable::from_shape_vec(&["time", LAT, LON], &[nt, ny, nx], values)?,
        );
        Ok(ds)
    }

    #[test]
    fn test_wrap_longitude_is_idempotent_and_bounded() {
        for lon in [-540.0, -180.0, -0.5, 0.0, 179.9, 180.0, 270.0, 359.75, 720.0] {
            let once = wrap_longitude(lon);
            assert!((-180.0..180.0).contains(&once), "{lon} -> {once}");
            assert_eq!(wrap_longitude(once), once);
        }
        assert_eq!(wrap_longitude(270.0), -90.0);
        assert_eq!(wrap_longitude(180.0), -180.0);
    }

    #[test]
    fn test_wrap_longitude_just_below_range() {
        let below = f64::from_bits((-180.0_f64).to_bits() + 1);
        assert!(below < -180.0);
        assert_eq!(wrap_longitude(below), -180.0);
    }

    #[test]
    fn test_longitudes_wrapped_and_ascending() -> Result<(), GridError> {
        let ds = raw(
            vec![0.0, 90.0, 180.0, 270.0],
            vec![0.0],
            TimeAxis::Standard(vec![at(2020, 1, 1, 0)]),
        )?;

        let ds = normalize(ds, &[], None, NormalizeOptions::default())?;

        let x = &ds.coord(X_DIM)?.values;
        assert_eq!(x, &array![-180.0, -90.0, 0.0, 90.0]);
        assert_eq!(ds.coord(X_DIM)?.valid_range, Some(LONGITUDE_RANGE));
        assert_eq!(ds.coord(LON)?.values, *x);
        assert_eq!(
            ds.variable("tas")?.data(),
            &array![[[2.0, 3.0, 0.0, 1.0]]].into_dyn()
        );
        assert_eq!(ds.variable("tas")?.dims(), ["time", Y_DIM, X_DIM]);

        let again = normalize(ds.clone(), &[], None, NormalizeOptions::default())?;
        assert_eq!(again, ds);
        Ok(())
    }

    #[test]
    fn test_descending_latitude_swapped() -> Result<(), GridError> {
        let ds = raw(
            vec![10.0],
            vec![1.0, 0.0, -1.0],
            TimeAxis::Standard(vec![at(2020, 1, 1, 0)]),
        )?;

        let ds = normalize(ds, &[], None, NormalizeOptions { add_lon_lat: false })?;

        assert_eq!(ds.coord(Y_DIM)?.values, array![-1.0, 0.0, 1.0]);
        assert_eq!(
            ds.variable("tas")?.data(),
            &array![[[20.0], [10.0], [0.0]]].into_dyn()
        );
        assert!(ds.coord(LAT).is_err());
        Ok(())
    }

    #[test]
    fn test_standard_times_floored_to_bin_start() -> Result<(), GridError> {
        let times = vec![at(2020, 1, 1, 12), at(2020, 1, 2, 12)];
        let ds = raw(vec![0.0], vec![0.0], TimeAxis::Standard(times))?;

        let ds = normalize(ds, &[], Some(Cadence::Daily), NormalizeOptions::default())?;

        assert_eq!(ds.times()?, &[at(2020, 1, 1, 0), at(2020, 1, 2, 0)]);
        Ok(())
    }

    #[test]
    fn test_360_day_aligned_and_reindexed_on_target() -> Result<(), GridError> {
        let time = TimeAxis::Calendar {
            calendar: Calendar::Day360,
            dates: vec![
                CfDateTime::new(2015, 2, 29, 0, 0, 0),
                CfDateTime::new(2015, 2, 30, 0, 0, 0),
            ],
        };
        let mut ds = raw(vec![0.0], vec![0.0], time)?;
        ds.insert(
            "tas",
            Variable::new(&["time", LAT, LON], array![[[1.0]], [[2.0]]].into_dyn())?,
        );
        let target = [at(2015, 3, 1, 0), at(2015, 3, 2, 0), at(2015, 3, 3, 0)];

        let ds = normalize(ds, &target, Some(Cadence::Daily), NormalizeOptions::default())?;

        assert_eq!(ds.times()?, &target);
        let tas = ds.variable("tas")?.data();
        assert_eq!(tas[[0, 0, 0]], 1.0);
        assert_eq!(tas[[1, 0, 0]], 2.0);
        assert!(tas[[2, 0, 0]].is_nan());
        Ok(())
    }

    #[test]
    fn test_other_calendars_coerced_field_wise() -> Result<(), GridError> {
        let time = TimeAxis::Calendar {
            calendar: Calendar::AllLeap,
            dates: vec![
                CfDateTime::new(2015, 2, 28, 3, 0, 0),
                CfDateTime::new(2015, 2, 29, 3, 0, 0),
                CfDateTime::new(2015, 3, 1, 3, 0, 0),
            ],
        };
        let ds = raw(vec![0.0], vec![0.0], time)?;

        let ds = normalize(ds, &[], None, NormalizeOptions::default())?;

        // The clamped 29 February duplicates 28 February; it is kept, not rejected.
        assert_eq!(
            ds.times()?,
            &[at(2015, 2, 28, 3), at(2015, 2, 28, 3), at(2015, 3, 1, 3)]
        );
        Ok(())
    }

    #[test]
    fn test_missing_longitude_is_an_error() -> Result<(), GridError> {
        let mut ds = raw(vec![0.0], vec![0.0], TimeAxis::Standard(vec![at(2020, 1, 1, 0)]))?;
        ds.drop_coord(LON);
        assert!(matches!(
            normalize(ds, &[], None, NormalizeOptions::default()),
            Err(GridError::MissingCoordinate(name)) if name == LON
        ));
        Ok(())
    }
}
