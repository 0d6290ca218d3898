/// Shared data structures for the application state
///
/// These structs represent what flows from the API layer into the
/// session and from there into the view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one prediction request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Predicted skin-condition label, e.g. "Acne"
    pub label: String,
    /// Per-class probabilities, parallel to the server's class list
    pub probabilities: Option<Vec<f64>>,
    /// Probability of `label` as reported by the server
    pub confidence: Option<f64>,
    /// Label -> probability, when the server sends the full breakdown
    pub all_predictions: Option<BTreeMap<String, f64>>,
}

impl AnalysisResult {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            probabilities: None,
            confidence: None,
            all_predictions: None,
        }
    }

    /// Probability to show next to the label.
    ///
    /// With a known class list the probability at the label's index wins.
    /// Otherwise the first probability is used, then the server's
    /// `confidence`, then the label's entry in `all_predictions`.
    pub fn confidence(&self, classes: &[String]) -> Option<f64> {
        if let Some(probabilities) = self.probabilities.as_deref().filter(|p| !p.is_empty()) {
            let indexed = classes
                .iter()
                .position(|class| class.eq_ignore_ascii_case(&self.label))
                .and_then(|index| probabilities.get(index));
            return indexed.or_else(|| probabilities.first()).copied();
        }

        self.confidence.or_else(|| {
            self.all_predictions
                .as_ref()
                .and_then(|all| all.get(&self.label))
                .copied()
        })
    }

    /// Label/probability pairs, highest first.
    ///
    /// Taken from `all_predictions` when present, else by zipping the class
    /// list with `probabilities`. Empty when neither is available.
    pub fn breakdown(&self, classes: &[String]) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = match (&self.all_predictions, &self.probabilities) {
            (Some(all), _) => all.iter().map(|(label, p)| (label.clone(), *p)).collect(),
            (None, Some(probabilities)) if !classes.is_empty() => classes
                .iter()
                .cloned()
                .zip(probabilities.iter().copied())
                .collect(),
            _ => Vec::new(),
        };
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs
    }
}

/// Format a probability in [0, 1] as a percentage with two decimals
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// A recommended product for a label
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub product_name: String,
    /// URL of the product picture
    pub product_image: String,
    /// Outbound shop link
    pub product_link: String,
}

/// What a recommendation fetch produced.
///
/// Keeps "the server has nothing for this label" apart from "the request
/// failed".
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    Found(Vec<Recommendation>),
    Empty,
    Failed(String),
}

impl RecommendationOutcome {
    pub fn from_list(list: Vec<Recommendation>) -> Self {
        if list.is_empty() {
            Self::Empty
        } else {
            Self::Found(list)
        }
    }

    pub fn products(&self) -> &[Recommendation] {
        match self {
            Self::Found(list) => list.as_slice(),
            Self::Empty | Self::Failed(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        ["Acne", "Eczema", "Rosacea"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_confidence_from_first_probability() {
        let mut result = AnalysisResult::new("Acne");
        result.probabilities = Some(vec![0.87, 0.05, 0.08]);

        let confidence = result.confidence(&[]).unwrap();
        assert_eq!(format_percent(confidence), "87.00%");
    }

    #[test]
    fn test_confidence_uses_label_index_when_classes_known() {
        let mut result = AnalysisResult::new("rosacea");
        result.probabilities = Some(vec![0.10, 0.15, 0.75]);

        assert_eq!(result.confidence(&classes()), Some(0.75));
    }

    #[test]
    fn test_confidence_falls_back_to_server_fields() {
        let mut result = AnalysisResult::new("Eczema");
        assert_eq!(result.confidence(&classes()), None);

        result.all_predictions = Some([("Eczema".to_string(), 0.4)].into_iter().collect());
        assert_eq!(result.confidence(&classes()), Some(0.4));

        result.confidence = Some(0.6);
        assert_eq!(result.confidence(&classes()), Some(0.6));
    }

    #[test]
    fn test_breakdown_sorted_descending() {
        let mut result = AnalysisResult::new("Rosacea");
        result.probabilities = Some(vec![0.10, 0.15, 0.75]);

        let breakdown = result.breakdown(&classes());
        let labels: Vec<&str> = breakdown.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, ["Rosacea", "Eczema", "Acne"]);

        // without a class list the probabilities cannot be labelled
        assert!(result.breakdown(&[]).is_empty());
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.5), "50.00%");
        assert_eq!(format_percent(0.1234), "12.34%");
        assert_eq!(format_percent(1.0), "100.00%");
    }

    #[test]
    fn test_outcome_from_list() {
        assert_eq!(RecommendationOutcome::from_list(Vec::new()), RecommendationOutcome::Empty);

        let product = Recommendation {
            product_name: "Cream A".to_string(),
            product_image: "a.png".to_string(),
            product_link: "http://x/a".to_string(),
        };
        let outcome = RecommendationOutcome::from_list(vec![product.clone()]);
        assert_eq!(outcome.products(), &[product]);
        assert!(RecommendationOutcome::Failed("boom".into()).products().is_empty());
    }
}
