pub mod extract;
pub mod probe;
