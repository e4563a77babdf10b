pub mod classifier;
pub mod embeddings;
