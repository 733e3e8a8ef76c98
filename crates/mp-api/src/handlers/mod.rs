pub mod embeddings;
pub mod health;
pub mod matches;
