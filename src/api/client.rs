/// reqwest client for the prediction and recommendation endpoints
///
/// Every call issues exactly one request. There is no retry and no
/// cancellation; ordering of concurrent responses is the session's job.

use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use std::future::Future;
use std::time::{Duration, Instant};

use super::error::ApiError;
use super::types::{error_message, PredictResponse};
use crate::capture::SelectedImage;
use crate::config::Config;
use crate::state::data::{AnalysisResult, Recommendation, RecommendationOutcome};

/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    predict_url: String,
    recommendations_url: String,
    upload_field: String,
}

impl ApiClient {
    /// Build a client from the config, applying the optional request timeout.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            predict_url: config.predict_url.clone(),
            recommendations_url: config.recommendations_url.clone(),
            upload_field: config.upload_field.clone(),
        }
    }

    /// Upload `image` to the prediction endpoint.
    ///
    /// `None` fails with `ApiError::Validation` before anything is sent.
    pub async fn analyze(&self, image: Option<&SelectedImage>) -> Result<AnalysisResult, ApiError> {
        let image = image.ok_or(ApiError::Validation)?;

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)?;
        let form = Form::new().part(self.upload_field.clone(), part);

        log::info!(
            "📤 Uploading {} ({}KB) to {}",
            image.file_name,
            image.bytes.len() / 1024,
            self.predict_url
        );
        let started = Instant::now();

        let response = self
            .http
            .post(&self.predict_url)
            .multipart(form)
            .send()
            .await?;
        let body = success_body(response).await?;

        let parsed: PredictResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        log::info!(
            "✅ Prediction \"{}\" in {}ms",
            parsed.prediction,
            started.elapsed().as_millis()
        );
        Ok(parsed.into())
    }

    /// Fetch products for `label`.
    ///
    /// A 404 or an empty list means the server has nothing for this label;
    /// every other failure is reported as `Failed`.
    pub async fn fetch_recommendations(&self, label: &str) -> RecommendationOutcome {
        match self.try_fetch_recommendations(label).await {
            Ok(list) => {
                log::info!("🛍️  {} recommendations for \"{}\"", list.len(), label);
                RecommendationOutcome::from_list(list)
            }
            Err(err) if err.is_not_found() => {
                log::info!("No recommendations for \"{}\"", label);
                RecommendationOutcome::Empty
            }
            Err(err) => {
                log::warn!("⚠️  Recommendation fetch for \"{}\" failed: {}", label, err);
                RecommendationOutcome::Failed(err.to_string())
            }
        }
    }

    async fn try_fetch_recommendations(&self, label: &str) -> Result<Vec<Recommendation>, ApiError> {
        let url = self.recommendations_url(label)?;
        let response = self.http.get(url).send().await?;
        let body = success_body(response).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `<base>/<label>` with the label encoded as a single path segment
    pub fn recommendations_url(&self, label: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.recommendations_url)
            .map_err(|_| ApiError::Url(self.recommendations_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(self.recommendations_url.clone()))?
            .pop_if_empty()
            .push(label);
        Ok(url)
    }

    /// Download a product picture. Only http(s) URLs are followed.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let parsed = Url::parse(url).map_err(|_| ApiError::Url(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Url(url.to_string()));
        }

        let response = self.http.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Body text of a 2xx response, or `ApiError::Server` with the decoded message
async fn success_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

/// Resolve `future` no sooner than `floor` after the call.
///
/// Keeps a progress indicator visible for a minimum time; the output is
/// whatever `future` produced.
pub async fn with_min_duration<F: Future>(future: F, floor: Duration) -> F::Output {
    let (output, _) = tokio::join!(future, tokio::time::sleep(floor));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::selected::tests::gradient_png;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (base, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if request_complete(&buf) {
                break;
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let body_len = buf.len() - header_end - 4;

        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());

        match content_length {
            Some(len) => body_len >= len,
            None if headers.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        }
    }

    fn client_for(predict_url: String, recommendations_url: String) -> ApiClient {
        let config = Config {
            predict_url,
            recommendations_url,
            ..Config::default()
        };
        ApiClient::new(&config).unwrap()
    }

    fn sample_image() -> SelectedImage {
        SelectedImage::from_bytes(gradient_png(8, 8), "face.png").unwrap()
    }

    /// A URL nothing is listening on
    async fn dead_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_analyze_without_image_sends_nothing() {
        let client = client_for(dead_url().await, dead_url().await);
        let result = client.analyze(None).await;
        assert_eq!(result, Err(ApiError::Validation));
    }

    #[tokio::test]
    async fn test_analyze_posts_multipart_and_parses_result() {
        let (base, server) =
            serve_once("200 OK", r#"{"prediction": "Acne", "probabilities": [0.87, 0.05, 0.08]}"#).await;
        let client = client_for(format!("{}/predict", base), format!("{}/recommendations", base));

        let result = client.analyze(Some(&sample_image())).await.unwrap();
        assert_eq!(result.label, "Acne");
        assert_eq!(result.probabilities, Some(vec![0.87, 0.05, 0.08]));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /predict HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data"));
        assert!(request.contains(r#"name="file"; filename="face.png""#));
        assert!(request.contains("image/png"));
    }

    #[tokio::test]
    async fn test_analyze_uses_configured_field_name() {
        let (base, server) = serve_once("200 OK", r#"{"prediction": "Eczema"}"#).await;
        let config = Config {
            predict_url: format!("{}/api/analyze/", base),
            upload_field: "image".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();

        client.analyze(Some(&sample_image())).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/analyze/ HTTP/1.1"));
        assert!(request.contains(r#"name="image""#));
    }

    #[tokio::test]
    async fn test_analyze_server_error_decodes_body() {
        let (base, _server) = serve_once("400 Bad Request", r#"{"error": "No file uploaded"}"#).await;
        let client = client_for(format!("{}/predict", base), base.clone());

        let err = client.analyze(Some(&sample_image())).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 400,
                message: "No file uploaded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_analyze_unexpected_body() {
        let (base, _server) = serve_once("200 OK", r#"{"label": "Acne"}"#).await;
        let client = client_for(format!("{}/predict", base), base.clone());

        let err = client.analyze(Some(&sample_image())).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_analyze_connection_refused() {
        let client = client_for(format!("{}/predict", dead_url().await), dead_url().await);
        let err = client.analyze(Some(&sample_image())).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_recommendations_found() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"product_name": "Cream A", "product_image": "a.png", "product_link": "http://x/a"}]"#,
        )
        .await;
        let client = client_for(base.clone(), format!("{}/recommendations", base));

        let outcome = client.fetch_recommendations("Acne").await;
        assert_eq!(
            outcome,
            RecommendationOutcome::Found(vec![Recommendation {
                product_name: "Cream A".to_string(),
                product_image: "a.png".to_string(),
                product_link: "http://x/a".to_string(),
            }])
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /recommendations/Acne HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_fetch_recommendations_not_found_is_empty() {
        let (base, _server) = serve_once("404 Not Found", r#"{"error": "No recommendations found"}"#).await;
        let client = client_for(base.clone(), format!("{}/recommendations", base));

        assert_eq!(client.fetch_recommendations("Unknown").await, RecommendationOutcome::Empty);
    }

    #[tokio::test]
    async fn test_fetch_recommendations_empty_list() {
        let (base, _server) = serve_once("200 OK", "[]").await;
        let client = client_for(base.clone(), format!("{}/recommendations", base));

        assert_eq!(client.fetch_recommendations("Acne").await, RecommendationOutcome::Empty);
    }

    #[tokio::test]
    async fn test_fetch_recommendations_failure_is_distinct() {
        let (base, _server) = serve_once("500 Internal Server Error", "boom").await;
        let client = client_for(base.clone(), format!("{}/recommendations", base));

        match client.fetch_recommendations("Acne").await {
            RecommendationOutcome::Failed(reason) => assert!(reason.contains("500")),
            other => panic!("expected Failed, got {:?}", other),
        }

        let client = client_for(base.clone(), format!("{}/recommendations", dead_url().await));
        assert!(matches!(
            client.fetch_recommendations("Acne").await,
            RecommendationOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_recommendations_url_encodes_label() {
        let client = client_for(
            "http://127.0.0.1:8080/predict".to_string(),
            "http://127.0.0.1:8080/recommendations/".to_string(),
        );
        let url = client.recommendations_url("Dark Spots/Acne").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/recommendations/Dark%20Spots%2FAcne"
        );
    }

    #[test]
    fn test_recommendations_url_rejects_bad_base() {
        let client = client_for("http://127.0.0.1:8080/predict".to_string(), "not a url".to_string());
        assert!(matches!(client.recommendations_url("Acne"), Err(ApiError::Url(_))));
    }

    #[tokio::test]
    async fn test_fetch_image_rejects_non_http() {
        let client = client_for(dead_url().await, dead_url().await);
        let err = client.fetch_image("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, ApiError::Url(_)));
    }

    #[tokio::test]
    async fn test_min_duration_holds_fast_futures() {
        let floor = Duration::from_millis(60);
        let started = Instant::now();
        let value = with_min_duration(async { 7 }, floor).await;
        assert_eq!(value, 7);
        assert!(started.elapsed() >= floor);
    }
}
