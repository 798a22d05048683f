//! Deterministic trigram embeddings.

use super::EmbeddingProvider;
use protoqa_core::AppResult;
use std::collections::HashMap;

/// Default vector size of the trigram provider.
pub const DEFAULT_DIMENSIONS: usize = 384;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "should", "when", "how",
];

/// Offline embedding provider hashing word trigrams into a fixed-size vector.
///
/// Not semantic, but stable: identical texts map to identical unit vectors
/// and texts sharing vocabulary land close together. Good enough for
/// similarity metrics in tests and air-gapped runs.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for (word, freq) in term_frequencies(text) {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(&trigram, 37)] += (freq as f32).sqrt();
            }
            vector[self.bucket(&word, 31)] += freq as f32;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn bucket(&self, token: &str, multiplier: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }
}

impl Default for TrigramProvider {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

fn term_frequencies(text: &str) -> HashMap<String, usize> {
    let mut freq = HashMap::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
    {
        *freq.entry(word.to_string()).or_insert(0) += 1;
    }
    freq
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}
