pub mod cadence;
pub mod cutout;
pub mod feature;
pub mod locator;
pub mod query;
