// Cell value parsing for ingested tables

pub mod lexer;
pub mod scalar;

pub use scalar::parse_scalar;
