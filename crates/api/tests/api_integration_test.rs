use api::{ImageFetcher, build_router, config::FetchConfig, state::AppState};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use inference::{
    ExecutionProvider, InferenceBackend, InferenceConfig, InferenceOutput, ModelTask, Predictor,
};
use ndarray::{Array, ArrayD, IxDyn};
use serde_json::{Value, json};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

const LABELS: [&str; 13] = [
    "jacket",
    "short pants",
    "tailored pants",
    "jumper",
    "shirts",
    "coat",
    "dress",
    "casual pants",
    "blouse",
    "tshirts",
    "skirt",
    "tearing",
    "pollution",
];

/// Backend replaying a fixed model output
struct MockBackend {
    output: ArrayD<f32>,
}

impl InferenceBackend for MockBackend {
    fn load_model(config: &InferenceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            output: ArrayD::zeros(IxDyn(&[1, 4 + config.labels.len(), 8])),
        })
    }

    fn infer(&mut self, _images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        Ok(InferenceOutput {
            raw: self.output.clone(),
        })
    }
}

fn inference_config() -> InferenceConfig {
    InferenceConfig {
        model_path: String::new(),
        task: ModelTask::Detection,
        execution_provider: ExecutionProvider::Cpu,
        input_size: (640, 640),
        input_name: "images".to_string(),
        output_name: "output0".to_string(),
        confidence_threshold: 0.25,
        iou_threshold: 0.5,
        labels: LABELS.iter().map(|l| l.to_string()).collect(),
    }
}

/// `[1, 17, n]` output from `(cxcywh, class_id, score)` rows
fn detection_output(rows: &[([f32; 4], usize, f32)]) -> ArrayD<f32> {
    let attrs = 4 + LABELS.len();
    let n = rows.len();
    let mut data = vec![0.0f32; attrs * n];
    for (i, (bbox, class_id, score)) in rows.iter().enumerate() {
        for (a, value) in bbox.iter().enumerate() {
            data[a * n + i] = *value;
        }
        data[(4 + class_id) * n + i] = *score;
    }
    Array::from_shape_vec(IxDyn(&[1, attrs, n]), data).unwrap()
}

fn app(output: ArrayD<f32>) -> Router {
    let config = inference_config();
    let predictor = Predictor::new(MockBackend { output }, &config);
    let fetcher = ImageFetcher::new(&FetchConfig {
        timeout_ms: 2_000,
        max_retries: 3,
        retry_base_delay_ms: 1,
        max_bytes: 1024 * 1024,
    })
    .unwrap();
    build_router(AppState::new(predictor, fetcher))
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 180, 160])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

struct ImageServer {
    addr: SocketAddr,
    flaky_hits: Arc<AtomicUsize>,
}

impl ImageServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Local server standing in for the remote image host
async fn spawn_image_server() -> ImageServer {
    let png = png_bytes(320, 240);
    let flaky_hits = Arc::new(AtomicUsize::new(0));
    let hits = flaky_hits.clone();

    let router = Router::new()
        .route(
            "/shirt.png",
            get(move || {
                let png = png.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], png) }
            }),
        )
        .route("/broken.png", get(|| async { "this is not a png" }))
        .route(
            "/flaky.png",
            get(move || {
                hits.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::SERVICE_UNAVAILABLE }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    ImageServer { addr, flaky_hits }
}

async fn post_predict(app: Router, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/models/clothes/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-request-id", "test-123")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn url_body(url: &str) -> String {
    json!({ "url": url }).to_string()
}

#[tokio::test]
async fn test_health_check_with_and_without_trailing_slash() {
    for uri in ["/health-check", "/health-check/"] {
        let response = app(detection_output(&[]))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok"}));
    }
}

#[tokio::test]
async fn test_predict_returns_top1() {
    let server = spawn_image_server().await;
    let output = detection_output(&[
        ([100.0, 100.0, 80.0, 80.0], 5, 0.8),
        ([104.0, 102.0, 80.0, 80.0], 0, 0.7),
        ([500.0, 500.0, 60.0, 60.0], 10, 0.4),
        ([300.0, 300.0, 60.0, 60.0], 1, 0.1),
    ]);

    let (status, body) = post_predict(app(output), url_body(&server.url("/shirt.png"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["top1ClassName"], "coat");
    assert!((body["top1Score"].as_f64().unwrap() - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn test_predict_nothing_detected() {
    let server = spawn_image_server().await;
    let output = detection_output(&[([100.0, 100.0, 80.0, 80.0], 5, 0.2)]);

    let (status, body) = post_predict(app(output), url_body(&server.url("/shirt.png"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"top1ClassName": null, "top1Score": null}));
}

#[tokio::test]
async fn test_malformed_json_is_unprocessable() {
    let (status, body) = post_predict(app(detection_output(&[])), "{\"link\": 3}".to_string()).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["metadata"]["request_info"]["method"], "POST");
    assert_eq!(body["metadata"]["request_headers"]["x-request-id"], "test-123");
}

#[tokio::test]
async fn test_non_http_url_is_unprocessable() {
    let (status, body) =
        post_predict(app(detection_output(&[])), url_body("ftp://example.com/a.png")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ValidationError");
    assert!(body["message"].as_str().unwrap().contains("ftp"));
}

#[tokio::test]
async fn test_missing_image_is_bad_gateway() {
    let server = spawn_image_server().await;

    let (status, body) =
        post_predict(app(detection_output(&[])), url_body(&server.url("/missing.png"))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "FetchError");
    assert!(body["message"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = spawn_image_server().await;

    let (status, _) =
        post_predict(app(detection_output(&[])), url_body(&server.url("/flaky.png"))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(server.flaky_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_undecodable_image_is_bad_request() {
    let server = spawn_image_server().await;

    let (status, body) =
        post_predict(app(detection_output(&[])), url_body(&server.url("/broken.png"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "DecodeError");
}
