pub mod casing;
pub mod domain;
pub mod error;
pub mod protocol;
