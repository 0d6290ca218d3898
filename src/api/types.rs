/// JSON bodies exchanged with the prediction server
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::state::data::AnalysisResult;

/// Body of a successful `POST /predict`
///
/// Only `prediction` is required; the other fields vary by server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PredictResponse {
    pub prediction: String,
    #[serde(default)]
    pub probabilities: Option<Vec<f64>>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub all_predictions: Option<BTreeMap<String, f64>>,
}

impl From<PredictResponse> for AnalysisResult {
    fn from(response: PredictResponse) -> Self {
        AnalysisResult {
            probabilities: response.probabilities,
            confidence: response.confidence,
            all_predictions: response.all_predictions,
            ..AnalysisResult::new(response.prediction)
        }
    }
}

/// Body the server sends with 4xx/5xx responses
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

/// Best human-readable message for a failed response body
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::Recommendation;

    #[test]
    fn test_minimal_predict_response() {
        let response: PredictResponse = serde_json::from_str(r#"{"prediction": "Acne"}"#).unwrap();
        let result = AnalysisResult::from(response);
        assert_eq!(result, AnalysisResult::new("Acne"));
    }

    #[test]
    fn test_flask_predict_response() {
        let body = r#"{
            "prediction": "Eczema",
            "confidence": 0.91,
            "all_predictions": { "Acne": 0.04, "Eczema": 0.91, "Rosacea": 0.05 }
        }"#;
        let result = AnalysisResult::from(serde_json::from_str::<PredictResponse>(body).unwrap());

        assert_eq!(result.label, "Eczema");
        assert_eq!(result.confidence, Some(0.91));
        assert_eq!(result.all_predictions.unwrap().len(), 3);
        assert!(result.probabilities.is_none());
    }

    #[test]
    fn test_missing_prediction_is_an_error() {
        assert!(serde_json::from_str::<PredictResponse>(r#"{"probabilities": [1.0]}"#).is_err());
    }

    #[test]
    fn test_recommendation_list() {
        let body = r#"[{"product_name": "Cream A", "product_image": "a.png", "product_link": "http://x/a"}]"#;
        let list: Vec<Recommendation> = serde_json::from_str(body).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].product_name, "Cream A");
        assert_eq!(list[0].product_link, "http://x/a");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"error": "No file uploaded"}"#), "No file uploaded");
        assert_eq!(error_message("Internal Server Error\n"), "Internal Server Error");
        assert_eq!(error_message(""), "no response body");
    }
}
