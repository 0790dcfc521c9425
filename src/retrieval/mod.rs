pub mod engine;
pub mod error;
pub mod lock;
#[cfg(feature = "netcdf")]
pub mod netcdf_opener;
pub mod opener;
pub mod staging;
