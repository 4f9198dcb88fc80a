pub mod candidate;
pub mod collector;
pub mod field_model;
pub mod filler;
pub mod locator;
pub mod payload;
pub mod value_mapper;
