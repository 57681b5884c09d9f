pub mod feedback;
pub mod instance;
pub mod profile;
pub mod structure;
