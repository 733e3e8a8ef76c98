use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

use super::{EMBEDDING_DIMENSION, EmbeddingError, EmbeddingGenerator};

// Changing either key changes every stored vector.
const HASH_SEED_K0: u64 = 0x6d61_7463_6826_706c;
const HASH_SEED_K1: u64 = 0x6179_2d65_6d62_6564;

/// Deterministic feature-hashing embedder over words and word bigrams.
///
/// Needs no network and no model files, so it backs local runs and tests.
/// Empty text maps to the all-zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIMENSION)
    }
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash(&self, token: &str) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        hasher.finish()
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = self.hash(feature);
        let index = (hash % self.dimension as u64) as usize;
        // The top bit picks the sign so collisions tend to cancel out.
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl EmbeddingGenerator for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);

        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_unit_vectors_of_the_configured_width() {
        let embedder = HashEmbedder::new(256);

        let vector = embedder.generate("Ailier gauche, rapide, bon dribble").unwrap();

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert_eq!(vector.len(), 256);
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn deterministic_and_case_insensitive() {
        let embedder = HashEmbedder::default();

        let a = embedder.generate("Pressing Haut").unwrap();
        let b = embedder.generate("pressing haut").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIMENSION);
    }

    #[test]
    fn empty_text_is_the_zero_vector() {
        let embedder = HashEmbedder::new(16);

        assert_eq!(embedder.generate("  ,, ").unwrap(), vec![0.0; 16]);
    }

    #[test]
    fn zero_dimension_is_bumped_to_one() {
        assert_eq!(HashEmbedder::new(0).dimension(), 1);
    }
}
