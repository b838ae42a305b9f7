pub mod domain;
pub mod elements;
pub mod units;
