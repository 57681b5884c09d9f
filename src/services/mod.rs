pub mod feedback;
pub mod generation;
pub mod generator;
pub mod parser;
pub mod prompt;
pub mod questions;
pub mod reconcile;
pub mod store;
