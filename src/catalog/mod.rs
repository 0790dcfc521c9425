pub mod error;
pub mod resolver;
pub mod search;
