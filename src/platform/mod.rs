pub mod catalog;
pub mod classifier;
pub mod markup;
