pub mod discover;
pub mod feedback;
pub mod interviews;
pub mod profiles;
pub mod structures;
