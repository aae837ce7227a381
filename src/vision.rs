use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseasePrediction {
    pub label: String,
    pub confidence: f64,
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn detect(&self, image: &[u8], filename: &str) -> Vec<DiseasePrediction>;
}

/// Placeholder detector until a trained crop-disease model is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCropDiseaseDetector;

#[async_trait]
impl ImageClassifier for StubCropDiseaseDetector {
    async fn detect(&self, image: &[u8], _filename: &str) -> Vec<DiseasePrediction> {
        if image.is_empty() {
            return Vec::new();
        }
        vec![DiseasePrediction {
            label: "unclassified".to_string(),
            confidence: 0.10,
        }]
    }
}
