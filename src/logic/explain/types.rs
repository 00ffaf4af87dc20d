use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub name: String,
    /// Value of the field in the explained record
    pub value: f64,
    /// Signed share of (prediction - baseline)
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    /// Average prediction over the reference set
    pub baseline: f64,
    /// Prediction for the explained record
    pub prediction: f64,
    /// One entry per field, in layout order
    pub contributions: Vec<FeatureContribution>,
    pub permutations: usize,
    pub background_rows: usize,
}

impl AttributionResult {
    /// baseline + Σ contributions
    pub fn reconstructed(&self) -> f64 {
        self.baseline + self.contributions.iter().map(|c| c.contribution).sum::<f64>()
    }

    /// Absolute distance between the reconstruction and the prediction
    pub fn efficiency_gap(&self) -> f64 {
        (self.reconstructed() - self.prediction).abs()
    }

    pub fn contribution(&self, name: &str) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.contribution)
    }

    /// Contributions by descending magnitude; ties keep layout order
    pub fn ranked(&self) -> Vec<&FeatureContribution> {
        let mut ranked: Vec<&FeatureContribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }
}
