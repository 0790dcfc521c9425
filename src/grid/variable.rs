//! A single n-dimensional array whose axes are addressed by name.
//!
//! Arithmetic between two variables aligns axes by dimension name and
//! broadcasts missing dimensions, so `b * ps` with `b(lev)` and
//! `ps(time, y, x)` yields a `(lev, time, y, x)` variable.

use crate::grid::error::GridError;
use ndarray::{concatenate, ArrayD, ArrayViewD, Axis, IxDyn, Zip};

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    data: ArrayD<f64>,
}

impl Variable {
    /// Wraps `data`, naming its axes in order.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnexpectedDimensions`] if the number of names does not
    /// match the array rank or a name is repeated.
    pub fn new<D: AsRef<str>>(dims: &[D], data: ArrayD<f64>) -> Result<Self, GridError> {
        let dims: Vec<String> = dims.iter().map(|d| d.as_ref().to_string()).collect();
        let repeated = dims
            .iter()
            .enumerate()
            .any(|(i, d)| dims[..i].contains(d));
        if dims.len() != data.ndim() || repeated {
            return Err(GridError::UnexpectedDimensions {
                expected: dims,
                found: data.shape().iter().map(|len| len.to_string()).collect(),
            });
        }
        Ok(Self { dims, data })
    }

    /// Builds a variable from a flat row-major buffer.
    pub fn from_shape_vec<D: AsRef<str>>(
        dims: &[D],
        shape: &[usize],
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Self::new(dims, data)
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            data: ArrayD::from_elem(IxDyn(&[]), value),
        }
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis_of(dim).is_some()
    }

    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|ax| self.data.len_of(Axis(ax)))
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Variable {
        Variable {
            dims: self.dims.clone(),
            data: self.data.mapv(f),
        }
    }

    pub fn map_inplace(&mut self, f: impl Fn(f64) -> f64) {
        self.data.mapv_inplace(f);
    }

    /// Element-wise combination with name-based broadcasting.
    ///
    /// The result carries `self`'s dimensions first, followed by any dimension
    /// only `other` has, in `other`'s order.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DimensionMismatch`] if a shared dimension has
    /// different lengths on the two operands.
    pub fn zip_with(
        &self,
        other: &Variable,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Variable, GridError> {
        let mut dims = self.dims.clone();
        for dim in &other.dims {
            if !dims.contains(dim) {
                dims.push(dim.clone());
            }
        }

        let mut shape = Vec::with_capacity(dims.len());
        for dim in &dims {
            let len = match (self.len_of(dim), other.len_of(dim)) {
                (Some(left), Some(right)) if left != right => {
                    return Err(GridError::DimensionMismatch {
                        dim: dim.clone(),
                        left,
                        right,
                    })
                }
                (Some(len), _) | (None, Some(len)) => len,
                (None, None) => 1,
            };
            shape.push(len);
        }

        let lhs = self.aligned(&dims)?;
        let rhs = other.aligned(&dims)?;
        let lhs = lhs
            .broadcast(shape.as_slice())
            .ok_or_else(|| self.not_broadcastable(&dims))?;
        let rhs = rhs
            .broadcast(shape.as_slice())
            .ok_or_else(|| other.not_broadcastable(&dims))?;

        let data = Zip::from(&lhs).and(&rhs).map_collect(|&a, &b| f(a, b));
        Ok(Variable { dims, data })
    }

    /// Expands to exactly `dims` (which must include every current dimension)
    /// with the given lengths.
    pub fn broadcast_to<D: AsRef<str>>(
        &self,
        dims: &[D],
        shape: &[usize],
    ) -> Result<Variable, GridError> {
        let dims: Vec<String> = dims.iter().map(|d| d.as_ref().to_string()).collect();
        let view = self.aligned(&dims)?;
        let data = view
            .broadcast(shape)
            .ok_or_else(|| self.not_broadcastable(&dims))?
            .to_owned();
        Ok(Variable { dims, data })
    }

    pub fn broadcast_like(&self, other: &Variable) -> Result<Variable, GridError> {
        self.broadcast_to(&other.dims, other.shape())
    }

    /// Reorders axes to `order`, which must name every dimension exactly once.
    pub fn transpose<D: AsRef<str>>(&self, order: &[D]) -> Result<Variable, GridError> {
        let unexpected = || GridError::UnexpectedDimensions {
            expected: order.iter().map(|d| d.as_ref().to_string()).collect(),
            found: self.dims.clone(),
        };
        if order.len() != self.dims.len() {
            return Err(unexpected());
        }
        let perm = order
            .iter()
            .map(|d| self.axis_of(d.as_ref()))
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(unexpected)?;
        if perm.iter().enumerate().all(|(i, &ax)| i == ax) {
            return Ok(self.clone());
        }
        let data = self.data.view().permuted_axes(perm).to_owned();
        Ok(Variable {
            dims: order.iter().map(|d| d.as_ref().to_string()).collect(),
            data,
        })
    }

    /// Takes `indices` along `dim`; variables without `dim` are returned unchanged.
    pub fn select(&self, dim: &str, indices: &[usize]) -> Variable {
        match self.axis_of(dim) {
            Some(ax) => Variable {
                dims: self.dims.clone(),
                data: self.data.select(Axis(ax), indices),
            },
            None => self.clone(),
        }
    }

    /// Like [`Variable::select`], but `None` entries produce NaN slices.
    pub fn reindex(&self, dim: &str, indices: &[Option<usize>]) -> Variable {
        let Some(ax) = self.axis_of(dim) else {
            return self.clone();
        };
        let mut shape = self.data.shape().to_vec();
        shape[ax] = indices.len();
        let mut data = ArrayD::from_elem(IxDyn(&shape), f64::NAN);
        for (target, source) in indices.iter().enumerate() {
            if let Some(source) = source {
                data.index_axis_mut(Axis(ax), target)
                    .assign(&self.data.index_axis(Axis(ax), *source));
            }
        }
        Variable {
            dims: self.dims.clone(),
            data,
        }
    }

    /// Picks a single position along `dim`, dropping the dimension.
    pub fn index(&self, dim: &str, index: usize) -> Result<Variable, GridError> {
        let ax = self
            .axis_of(dim)
            .ok_or_else(|| GridError::MissingCoordinate(dim.to_string()))?;
        let mut dims = self.dims.clone();
        dims.remove(ax);
        Ok(Variable {
            dims,
            data: self.data.index_axis(Axis(ax), index).to_owned(),
        })
    }

    pub fn rename_dim(&mut self, old: &str, new: &str) {
        for dim in self.dims.iter_mut().filter(|d| d.as_str() == old) {
            *dim = new.to_string();
        }
    }

    /// Joins `parts` end to end along `dim`. Every part must carry the same
    /// dimensions; their axis order may differ.
    pub fn concat(dim: &str, parts: &[Variable]) -> Result<Variable, GridError> {
        let Some(first) = parts.first() else {
            return Err(GridError::MissingCoordinate(dim.to_string()));
        };
        let ax = first
            .axis_of(dim)
            .ok_or_else(|| GridError::MissingCoordinate(dim.to_string()))?;
        let aligned = parts
            .iter()
            .map(|part| part.transpose(&first.dims))
            .collect::<Result<Vec<_>, _>>()?;
        let views: Vec<ArrayViewD<'_, f64>> = aligned.iter().map(|v| v.data.view()).collect();
        let data = concatenate(Axis(ax), &views)?;
        Ok(Variable {
            dims: first.dims.clone(),
            data,
        })
    }

    /// View of the data with axes ordered as in `dims` and length-1 axes
    /// inserted for dimensions this variable lacks.
    fn aligned(&self, dims: &[String]) -> Result<ArrayViewD<'_, f64>, GridError> {
        let perm: Vec<usize> = dims.iter().filter_map(|d| self.axis_of(d)).collect();
        if perm.len() != self.dims.len() {
            return Err(self.not_broadcastable(dims));
        }
        let mut view = self.data.view().permuted_axes(perm);
        for (pos, dim) in dims.iter().enumerate() {
            if !self.has_dim(dim) {
                view = view.insert_axis(Axis(pos));
            }
        }
        Ok(view)
    }

    fn not_broadcastable(&self, dims: &[String]) -> GridError {
        GridError::NotBroadcastable {
            from: self.dims.clone(),
            to: dims.to_vec(),
        }
    }
}
