pub mod calendar;
pub mod dataset;
pub mod error;
pub mod variable;

pub const TIME_DIM: &str = "time";
pub const LEVEL_DIM: &str = "lev";
pub const X_DIM: &str = "x";
pub const Y_DIM: &str = "y";
pub const LON: &str = "lon";
pub const LAT: &str = "lat";
