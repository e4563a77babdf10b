pub mod retrieval;
pub mod vector;
