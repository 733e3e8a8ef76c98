mod description;
mod hash_embedder;

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

pub use description::{athlete_description, club_description};
pub use hash_embedder::HashEmbedder;

use crate::{AthleteProfile, ClubProfile};

/// Width of the profile vectors stored alongside athletes and clubs.
pub const EMBEDDING_DIMENSION: usize = 1536;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(String),
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Turns profile text into a fixed-width vector.
pub trait EmbeddingGenerator: Send + Sync {
    /// Implementation name, reported next to generated vectors.
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    fn generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Never fails: a provider error or a vector of the wrong width degrades to
/// the all-zero vector, which scores 0 on style.
pub fn generate_or_zero(generator: &dyn EmbeddingGenerator, text: &str) -> Vec<f32> {
    let dimension = generator.dimension();
    let result = generator.generate(text).and_then(|vector| {
        if vector.len() == dimension {
            Ok(vector)
        } else {
            Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            })
        }
    });

    match result {
        Ok(vector) => vector,
        Err(err) => {
            warn!(
                generator = generator.name(),
                error = %err,
                "embedding generation failed; using zero vector"
            );
            vec![0.0; dimension]
        }
    }
}

pub fn embed_athlete(generator: &dyn EmbeddingGenerator, athlete: &AthleteProfile) -> Vec<f32> {
    generate_or_zero(generator, &athlete_description(athlete))
}

pub fn embed_club(generator: &dyn EmbeddingGenerator, club: &ClubProfile) -> Vec<f32> {
    generate_or_zero(generator, &club_description(club))
}

/// Generator factory. Only the offline `"hash"` generator ships in-tree;
/// unknown names fall back to it.
pub fn create_generator(name: &str, dimension: usize) -> Arc<dyn EmbeddingGenerator> {
    match name {
        "hash" => Arc::new(HashEmbedder::new(dimension)),
        other => {
            warn!(requested = other, "unknown embedding generator; using hash");
            Arc::new(HashEmbedder::new(dimension))
        }
    }
}
