use super::types::{DifferentialCandidate, DifferentialDiagnosis};

/// Deployment without a local classifier.
pub struct NoDifferential;

impl DifferentialDiagnosis for NoDifferential {
    fn rank(&self, _symptom_text: &str, _top_n: usize) -> Vec<DifferentialCandidate> {
        Vec::new()
    }
}

/// Returns a fixed candidate list, highest confidence first.
pub struct FixedDifferential {
    candidates: Vec<DifferentialCandidate>,
}

impl FixedDifferential {
    pub fn new(candidates: &[(&str, f64)]) -> Self {
        let mut candidates: Vec<DifferentialCandidate> = candidates
            .iter()
            .map(|(disease, confidence)| DifferentialCandidate {
                disease: disease.to_string(),
                confidence: confidence.clamp(0.0, 1.0),
            })
            .collect();
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Self { candidates }
    }
}

impl DifferentialDiagnosis for FixedDifferential {
    fn rank(&self, _symptom_text: &str, top_n: usize) -> Vec<DifferentialCandidate> {
        self.candidates.iter().take(top_n).cloned().collect()
    }
}
