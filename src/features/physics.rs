//! Wind speed, virtual temperature and hydrostatic height.

use crate::grid::dataset::Dataset;
use crate::grid::error::GridError;
use crate::grid::variable::Variable;
use crate::grid::{LEVEL_DIM, TIME_DIM, X_DIM, Y_DIM};
use log::info;
use ndarray::{Array4, ArrayView3, ArrayView4, Axis, Ix3, Ix4, Zip};

/// Gas constant of dry air, J kg-1 K-1.
pub const RD: f64 = 287.058;
/// Standard gravity, m s-2.
pub const G: f64 = 9.80665;
/// Ratio of the gas constants of dry air and water vapour.
pub const EPSILON: f64 = 0.62198;

/// `(time, lev, y, x)`, the layout of every level field this module returns.
pub const LEVEL_LAYOUT: [&str; 4] = [TIME_DIM, LEVEL_DIM, Y_DIM, X_DIM];

/// Horizontal wind speed `sqrt(u² + v²)`.
pub fn wind_speed(u: &Variable, v: &Variable) -> Result<Variable, GridError> {
    u.zip_with(v, f64::hypot)
}

/// Virtual temperature from temperature and specific humidity.
pub fn virtual_temperature(t: &Variable, q: &Variable) -> Result<Variable, GridError> {
    t.zip_with(q, |t, q| t * (q + EPSILON) / (EPSILON * (1.0 + q)))
}

/// Pressure at full model levels, `a * p0 + b * ps` when the file carries a
/// reference pressure `p0` and `ap + b * ps` otherwise, in [`LEVEL_LAYOUT`].
pub fn full_level_pressure(levels: &Dataset, ps: &Variable) -> Result<Variable, GridError> {
    let ap = if levels.contains("p0") {
        info!("Hybrid sigma-pressure levels with reference pressure");
        levels
            .variable("a")?
            .zip_with(levels.variable("p0")?, |a, p0| a * p0)?
    } else {
        info!("Hybrid sigma-pressure levels with pre-scaled coefficients");
        levels.variable("ap")?.clone()
    };
    let b_ps = levels.variable("b")?.zip_with(ps, |b, ps| b * ps)?;
    ap.zip_with(&b_ps, |ap, b_ps| ap + b_ps)?
        .transpose(&LEVEL_LAYOUT)
}

/// Integrates geopotential height upward from the surface with the
/// hypsometric equation.
///
/// Level 0 is the one nearest the surface:
///
/// ```text
/// z[0] = -(Rd/g) * tv[0] * ln(p[0] / ps)
/// z[k] = z[k-1] - (Rd/g) * (tv[k] + tv[k-1]) / 2 * ln(p[k] / p[k-1])
/// ```
///
/// `tv` and `p` are `(time, lev, y, x)`, `ps` is `(time, y, x)`. Each level
/// is filled from the one below it, in ascending order.
pub fn integrate_height(
    tv: ArrayView4<'_, f64>,
    p: ArrayView4<'_, f64>,
    ps: ArrayView3<'_, f64>,
) -> Result<Array4<f64>, GridError> {
    let (nt, nz, ny, nx) = tv.dim();
    if p.dim() != tv.dim() || ps.dim() != (nt, ny, nx) {
        return Err(GridError::UnexpectedDimensions {
            expected: vec![format!("{:?}", tv.shape())],
            found: vec![format!("{:?}", p.shape()), format!("{:?}", ps.shape())],
        });
    }

    let scale = RD / G;
    let mut z = Array4::<f64>::zeros((nt, nz, ny, nx));
    if nz == 0 {
        return Ok(z);
    }

    Zip::from(z.index_axis_mut(Axis(1), 0))
        .and(tv.index_axis(Axis(1), 0))
        .and(p.index_axis(Axis(1), 0))
        .and(ps)
        .for_each(|z, &tv, &p, &ps| *z = -scale * tv * (p / ps).ln());

    for k in 1..nz {
        let (below, mut above) = z.view_mut().split_at(Axis(1), k);
        Zip::from(above.index_axis_mut(Axis(1), 0))
            .and(below.index_axis(Axis(1), k - 1))
            .and(tv.index_axis(Axis(1), k))
            .and(tv.index_axis(Axis(1), k - 1))
            .and(p.index_axis(Axis(1), k))
            .and(p.index_axis(Axis(1), k - 1))
            .for_each(|z, &z_below, &tv, &tv_below, &p, &p_below| {
                *z = z_below - scale * 0.5 * (tv + tv_below) * (p / p_below).ln();
            });
    }
    Ok(z)
}

/// Geopotential height on hybrid levels, in [`LEVEL_LAYOUT`].
pub fn geopotential_height(
    tv: &Variable,
    p: &Variable,
    ps: &Variable,
) -> Result<Variable, GridError> {
    let tv = tv.transpose(&LEVEL_LAYOUT)?.into_data().into_dimensionality::<Ix4>()?;
    let p = p.transpose(&LEVEL_LAYOUT)?.into_data().into_dimensionality::<Ix4>()?;
    let ps = ps
        .transpose(&[TIME_DIM, Y_DIM, X_DIM])?
        .into_data()
        .into_dimensionality::<Ix3>()?;
    let z = integrate_height(tv.view(), p.view(), ps.view())?;
    Variable::new(&LEVEL_LAYOUT, z.into_dyn())
}

/// Height above ground on pressure levels, `lev + (b - 1) * orog`, broadcast
/// over the dimensions of `like`.
pub fn pressure_level_height(
    levels: &Dataset,
    like: &Variable,
) -> Result<Variable, GridError> {
    info!("Pressure levels, height from level coordinate and orography");
    let lev = levels.coord_variable(LEVEL_DIM)?.broadcast_like(like)?;
    let offset = levels
        .variable("b")?
        .zip_with(levels.variable("orog")?, |b, orog| (b - 1.0) * orog)?;
    lev.zip_with(&offset, |lev, offset| lev + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::dataset::Coordinate;
    use ndarray::{array, Array3};

    #[test]
    fn test_wind_speed() -> Result<(), GridError> {
        let u = Variable::new(&["x"], array![3.0, 0.0, -3.0, 0.0].into_dyn())?;
        let v = Variable::new(&["x"], array![4.0, 0.0, -4.0, 1e-9].into_dyn())?;

        let speed = wind_speed(&u, &v)?;

        assert_eq!(speed.data(), &array![5.0, 0.0, 5.0, 1e-9].into_dyn());
        assert!(speed.data().iter().all(|s| *s >= 0.0));
        Ok(())
    }

    #[test]
    fn test_virtual_temperature_dry_air_unchanged() -> Result<(), GridError> {
        let t = Variable::new(&["x"], array![280.0, 300.0].into_dyn())?;
        let dry = Variable::new(&["x"], array![0.0, 0.0].into_dyn())?;
        let moist = Variable::new(&["x"], array![0.01, 0.02].into_dyn())?;

        assert_eq!(virtual_temperature(&t, &dry)?.data(), t.data());
        let tv = virtual_temperature(&t, &moist)?;
        assert!(tv.data().iter().zip(t.data()).all(|(tv, t)| tv > t));
        Ok(())
    }

    fn isothermal(nz: usize, tv: f64) -> (Array4<f64>, Array4<f64>, Array3<f64>) {
        let tv = Array4::from_elem((1, nz, 1, 1), tv);
        let p = Array4::from_shape_fn((1, nz, 1, 1), |(_, k, _, _)| 99_000.0 - 5_000.0 * k as f64);
        let ps = Array3::from_elem((1, 1, 1), 100_000.0);
        (tv, p, ps)
    }

    #[test]
    fn test_height_increases_away_from_surface() -> Result<(), GridError> {
        let (tv, p, ps) = isothermal(4, 300.0);

        let z = integrate_height(tv.view(), p.view(), ps.view())?;

        let expected_z0 = RD / G * 300.0 * (100_000.0_f64 / 99_000.0).ln();
        assert!((z[[0, 0, 0, 0]] - expected_z0).abs() < 1e-9);
        let column: Vec<f64> = (0..4).map(|k| z[[0, k, 0, 0]]).collect();
        assert!(column.windows(2).all(|w| w[1] > w[0]), "{column:?}");

        let expected_top = RD / G * 300.0 * (100_000.0_f64 / 84_000.0).ln();
        assert!((column[3] - expected_top).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_each_level_depends_on_levels_below() -> Result<(), GridError> {
        let (tv, p, ps) = isothermal(3, 300.0);
        let mut warm_base = tv.clone();
        warm_base[[0, 0, 0, 0]] = 310.0;

        let reference = integrate_height(tv.view(), p.view(), ps.view())?;
        let perturbed = integrate_height(warm_base.view(), p.view(), ps.view())?;

        for k in 0..3 {
            assert!(perturbed[[0, k, 0, 0]] > reference[[0, k, 0, 0]], "level {k}");
        }
        Ok(())
    }

    #[test]
    fn test_mismatched_shapes_rejected() {
        let (tv, _, ps) = isothermal(3, 300.0);
        let (_, p, _) = isothermal(2, 300.0);
        assert!(integrate_height(tv.view(), p.view(), ps.view()).is_err());
    }

    fn hybrid_levels(with_p0: bool) -> Result<Dataset, GridError> {
        let mut ds = Dataset::default();
        ds.coords
            .insert(LEVEL_DIM.into(), Coordinate::new(LEVEL_DIM, vec![0.99, 0.95]));
        ds.insert("b", Variable::new(&[LEVEL_DIM], array![0.9, 0.5].into_dyn())?);
        if with_p0 {
            ds.insert("a", Variable::new(&[LEVEL_DIM], array![0.01, 0.1].into_dyn())?);
            ds.insert("p0", Variable::scalar(100_000.0));
        } else {
            ds.insert("ap", Variable::new(&[LEVEL_DIM], array![1_000.0, 10_000.0].into_dyn())?);
        }
        Ok(ds)
    }

    #[test]
    fn test_full_level_pressure_both_formulations() -> Result<(), GridError> {
        let ps = Variable::new(
            &[TIME_DIM, Y_DIM, X_DIM],
            Array3::from_elem((2, 1, 1), 100_000.0).into_dyn(),
        )?;

        for with_p0 in [true, false] {
            let p = full_level_pressure(&hybrid_levels(with_p0)?, &ps)?;
            assert_eq!(p.dims(), LEVEL_LAYOUT);
            assert_eq!(p.shape(), &[2, 2, 1, 1]);
            assert!((p.data()[[1, 0, 0, 0]] - 91_000.0).abs() < 1e-6);
            assert!((p.data()[[1, 1, 0, 0]] - 60_000.0).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_missing_coefficients_reported() -> Result<(), GridError> {
        let mut levels = hybrid_levels(false)?;
        levels.data_vars.remove("ap");
        let ps = Variable::scalar(100_000.0);
        assert!(matches!(
            full_level_pressure(&levels, &ps),
            Err(GridError::MissingVariable(name)) if name == "ap"
        ));
        Ok(())
    }

    #[test]
    fn test_pressure_level_height() -> Result<(), GridError> {
        let mut levels = Dataset::default();
        levels
            .coords
            .insert(LEVEL_DIM.into(), Coordinate::new(LEVEL_DIM, vec![100.0, 150.0]));
        levels.insert("b", Variable::new(&[LEVEL_DIM], array![0.5, 1.0].into_dyn())?);
        levels.insert(
            "orog",
            Variable::new(&[Y_DIM, X_DIM], array![[200.0]].into_dyn())?,
        );
        let like = Variable::new(
            &LEVEL_LAYOUT,
            Array4::<f64>::zeros((3, 2, 1, 1)).into_dyn(),
        )?;

        let z = pressure_level_height(&levels, &like)?;

        assert_eq!(z.dims(), LEVEL_LAYOUT);
        assert_eq!(z.data()[[2, 0, 0, 0]], 0.0);
        assert_eq!(z.data()[[2, 1, 0, 0]], 150.0);
        Ok(())
    }
}
