//! In-process mock of the dealership backend for client integration tests.
//!
//! The mock listens on an ephemeral port, records every request, and keeps
//! just enough state (drafts, brands) to exercise the client end to end.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use dealerdash_client::{session_context, DashboardApi};
use dealerdash_core::locale::Locale;
use dealerdash_core::session::Session;

pub const SUPER_TOKEN: &str = "test-token";
pub const VIEWER_TOKEN: &str = "viewer-token";

/// Seeded draft with two persisted images and a video.
pub const SEEDED_DRAFT_ID: i64 = 7;

/// Number of rows the mock returns from `GET /cars` (never with a total).
pub const CAR_ROWS: usize = 12;

type Shared = Arc<Mutex<MockState>>;

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path without the `/api/v1` prefix.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub accept_language: Option<String>,
}

/// Text fields and file names of one main-info submission.
#[derive(Debug, Clone, Default)]
pub struct MainInfoSubmission {
    pub fields: BTreeMap<String, String>,
    pub image_names: Vec<String>,
    pub video: Option<String>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub requests: Vec<Recorded>,
    pub drafts: BTreeMap<i64, Value>,
    pub brands: Vec<Value>,
    pub main_info_submissions: Vec<MainInfoSubmission>,
    pub specs_payloads: Vec<Value>,
    next_car_id: i64,
    next_image_id: i64,
}

impl MockState {
    fn seeded() -> Self {
        let mut drafts = BTreeMap::new();
        drafts.insert(
            SEEDED_DRAFT_ID,
            json!({
                "id": SEEDED_DRAFT_ID,
                "name": { "ar": "كامري ٢٠٢٤", "en": "Camry 2024" },
                "progress": { "mainInfo": true, "carSpecs": false, "seoInfo": false },
                "mainInfo": {
                    "brandId": 1,
                    "modelId": 1,
                    "price": 120000.0,
                    "hasOffer": false,
                    "offer": null,
                    "images": [
                        { "id": 501, "url": "https://cdn.test/front.jpg" },
                        { "id": 502, "url": "https://cdn.test/back.jpg" }
                    ],
                    "video": "https://cdn.test/tour.mp4"
                },
                "specs": [],
                "seo": null,
                "draft": true,
                "showCar": false
            }),
        );
        Self {
            drafts,
            brands: vec![
                json!({ "id": 1, "name": { "ar": "تويوتا", "en": "Toyota" } }),
                json!({ "id": 2, "name": { "ar": "بي إم دبليو", "en": "BMW" } }),
            ],
            next_car_id: 0,
            next_image_id: 900,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct MockBackend {
    pub base_url: String,
    pub state: Shared,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// How many requests hit `method path`.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn draft(&self, id: i64) -> Value {
        self.state.lock().unwrap().drafts[&id].clone()
    }

    pub fn main_info_submissions(&self) -> Vec<MainInfoSubmission> {
        self.state.lock().unwrap().main_info_submissions.clone()
    }
}

/// Start the mock backend on an ephemeral port.
pub async fn spawn_backend() -> MockBackend {
    let state: Shared = Arc::new(Mutex::new(MockState::seeded()));
    let app = router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockBackend {
        base_url: format!("http://{addr}/api/v1"),
        state,
    }
}

/// Client for `backend` with the given session.
pub fn client(backend: &MockBackend, session: Session) -> DashboardApi {
    DashboardApi::new(
        &backend.base_url,
        session_context(session),
        Duration::from_secs(5),
    )
    .unwrap()
}

/// Client signed in as the super admin.
pub async fn super_admin_client(backend: &MockBackend) -> DashboardApi {
    let api = client(backend, Session::anonymous(Locale::En));
    api.login("admin@example.com", "secret").await.unwrap();
    api
}

/// Client signed in as an admin who may only read brands.
pub async fn viewer_client(backend: &MockBackend) -> DashboardApi {
    let api = client(backend, Session::anonymous(Locale::Ar));
    api.login("viewer@example.com", "secret").await.unwrap();
    api
}

/// Smallest byte string `image::guess_format` recognizes as PNG.
pub fn png_bytes(seed: u8) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 13, seed]);
    bytes
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/cars", get(list_cars))
        .route("/cars/main-info", post(create_main_info))
        .route("/cars/{id}", get(get_car).delete(delete_car))
        .route("/cars/{id}/main-info", put(update_main_info))
        .route("/cars/{id}/car-specs", post(save_specs))
        .route("/cars/{id}/seo-info", post(save_seo))
        .route("/brand", get(list_brands).post(create_brand))
        .route("/brand/{id}", delete(delete_brand))
        .route("/models", get(list_models))
        .route("/spec-categories", get(list_categories))
        .route("/specs", get(list_specs))
        .route("/news", get(slow_news))
        .route("/news/{id}", delete(broken_delete))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(state, record))
}

async fn record(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let headers = req.headers();
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path = req.uri().path();
    let entry = Recorded {
        method: req.method().to_string(),
        path: path.strip_prefix("/api/v1").unwrap_or(path).to_string(),
        query: req.uri().query().map(str::to_string),
        authorization: header_value(header::AUTHORIZATION),
        accept_language: header_value(header::ACCEPT_LANGUAGE),
    };
    state.lock().unwrap().requests.push(entry);
    next.run(req).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn super_admin() -> Value {
    json!({
        "id": 1,
        "name": "Sara",
        "email": "admin@example.com",
        "role": "superAdmin",
        "permissions": []
    })
}

fn viewer() -> Value {
    json!({
        "id": 2,
        "name": "Omar",
        "email": "viewer@example.com",
        "role": "admin",
        "permissions": [
            { "module": "brands", "read": true, "create": false, "update": false, "delete": false }
        ]
    })
}

// -- auth --

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (email, password) {
        ("admin@example.com", "secret") => {
            Json(json!({ "data": { "token": SUPER_TOKEN, "admin": super_admin() } })).into_response()
        }
        ("viewer@example.com", "secret") => {
            Json(json!({ "data": { "token": VIEWER_TOKEN, "admin": viewer() } })).into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn me(headers: HeaderMap) -> Response {
    match bearer(&headers).as_deref() {
        Some(SUPER_TOKEN) => Json(json!({ "data": super_admin() })).into_response(),
        Some(VIEWER_TOKEN) => Json(json!({ "data": viewer() })).into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "Session expired"),
    }
}

// -- cars --

async fn list_cars(Query(query): Query<BTreeMap<String, String>>) -> Json<Value> {
    let drafts = query.get("draft").map(String::as_str) == Some("true");
    let rows: Vec<Value> = (1..=CAR_ROWS)
        .map(|i| {
            json!({
                "id": i,
                "name": { "ar": format!("سيارة {i}"), "en": format!("Car {i}") },
                "draft": drafts
            })
        })
        .collect();
    Json(json!({ "data": rows }))
}

async fn get_car(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.lock().unwrap().drafts.get(&id) {
        Some(draft) => Json(json!({ "data": draft })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Car not found"),
    }
}

async fn delete_car(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match state.lock().unwrap().drafts.remove(&id) {
        Some(_) => Json(json!({ "data": null })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Car not found"),
    }
}

async fn read_multipart(mut multipart: Multipart) -> MainInfoSubmission {
    let mut submission = MainInfoSubmission::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                field.bytes().await.unwrap();
                if name == "video" {
                    submission.video = Some(file_name);
                } else {
                    submission.image_names.push(file_name);
                }
            }
            None => {
                let text = field.text().await.unwrap();
                submission.fields.insert(name, text);
            }
        }
    }
    submission
}

fn apply_main_info(state: &mut MockState, id: i64, submission: MainInfoSubmission) {
    let existing = state.drafts.get(&id).cloned();
    let deleted: Vec<i64> = submission
        .fields
        .get("deletedImages")
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();

    let mut images: Vec<Value> = existing
        .as_ref()
        .and_then(|d| d["mainInfo"]["images"].as_array().cloned())
        .unwrap_or_default();
    images.retain(|img| !deleted.contains(&img["id"].as_i64().unwrap_or_default()));
    for name in &submission.image_names {
        state.next_image_id += 1;
        images.push(json!({ "id": state.next_image_id, "url": format!("https://cdn.test/{name}") }));
    }

    let mut video = existing
        .as_ref()
        .map(|d| d["mainInfo"]["video"].clone())
        .unwrap_or(Value::Null);
    if submission.fields.get("deleteVideo").map(String::as_str) == Some("true") {
        video = Value::Null;
    }
    if let Some(name) = &submission.video {
        video = json!(format!("https://cdn.test/{name}"));
    }

    let field = |key: &str| submission.fields.get(key).cloned().unwrap_or_default();
    let mut draft = existing.unwrap_or_else(|| {
        json!({
            "id": id,
            "progress": { "mainInfo": false, "carSpecs": false, "seoInfo": false },
            "specs": [],
            "seo": null
        })
    });
    draft["name"] = json!({ "ar": field("name[ar]"), "en": field("name[en]") });
    draft["mainInfo"] = json!({
        "brandId": field("brandId").parse::<i64>().unwrap(),
        "modelId": field("modelId").parse::<i64>().unwrap(),
        "price": field("price").parse::<f64>().unwrap(),
        "hasOffer": field("hasOffer") == "true",
        "offer": submission.fields.get("offer").map(|o| o.parse::<f64>().unwrap()),
        "images": images,
        "video": video
    });
    draft["progress"]["mainInfo"] = json!(true);
    draft["draft"] = json!(field("draft") == "true");
    draft["showCar"] = json!(field("showCar") == "true");

    state.drafts.insert(id, draft);
    state.main_info_submissions.push(submission);
}

async fn create_main_info(State(state): State<Shared>, multipart: Multipart) -> Json<Value> {
    let submission = read_multipart(multipart).await;
    let mut state = state.lock().unwrap();
    state.next_car_id += 1;
    let id = state.next_car_id;
    apply_main_info(&mut state, id, submission);
    Json(json!({ "data": { "carId": id } }))
}

async fn update_main_info(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let submission = read_multipart(multipart).await;
    let mut state = state.lock().unwrap();
    if !state.drafts.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "Car not found");
    }
    apply_main_info(&mut state, id, submission);
    Json(json!({ "data": { "carId": id } })).into_response()
}

async fn save_specs(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.specs_payloads.push(body.clone());
    let Some(draft) = state.drafts.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Car not found");
    };
    let specs: Value = match body["specs"].as_str().map(serde_json::from_str::<Value>) {
        Some(Ok(specs)) => specs,
        _ => return error(StatusCode::BAD_REQUEST, "specs must be a JSON string"),
    };
    draft["specs"] = specs;
    draft["progress"]["carSpecs"] = json!(true);
    draft["draft"] = body["draft"].clone();
    draft["showCar"] = body["showCar"].clone();
    Json(json!({ "data": { "carId": id } })).into_response()
}

async fn save_seo(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    let Some(draft) = state.drafts.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Car not found");
    };
    draft["seo"] = json!({
        "metaTitle": body["metaTitle"],
        "metaDescription": body["metaDescription"],
        "keywords": body["keywords"]
    });
    draft["progress"]["seoInfo"] = json!(true);
    draft["draft"] = body["draft"].clone();
    draft["showCar"] = body["showCar"].clone();
    Json(json!({ "data": { "carId": id } })).into_response()
}

// -- reference data --

async fn list_brands(State(state): State<Shared>) -> Json<Value> {
    let brands = state.lock().unwrap().brands.clone();
    Json(json!({ "data": brands, "total": brands.len() }))
}

async fn create_brand(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    let brand = json!({ "id": state.brands.len() + 1, "name": body["name"] });
    state.brands.push(brand.clone());
    Json(json!({ "data": brand }))
}

async fn delete_brand(Path(id): Path<i64>) -> Response {
    if id == 1 {
        return error(StatusCode::CONFLICT, "Brand has models");
    }
    Json(json!({ "data": null })).into_response()
}

/// Ignores `brandId` on purpose: the client must filter as well.
async fn list_models() -> Json<Value> {
    Json(json!({
        "data": [
            { "id": 1, "name": { "ar": "كامري", "en": "Camry" }, "brandId": 1, "modelTypeId": 1, "year": 2024 },
            { "id": 2, "name": { "ar": "إكس 5", "en": "X5" }, "brandId": 2, "year": 2023 },
            { "id": 3, "name": { "ar": "كورولا", "en": "Corolla" }, "brandId": 1, "year": 2022 }
        ]
    }))
}

async fn list_categories() -> Json<Value> {
    Json(json!({
        "data": [
            { "id": 1, "name": { "ar": "المحرك", "en": "Engine" } },
            { "id": 2, "name": { "ar": "الداخلية", "en": "Interior" } }
        ]
    }))
}

async fn list_specs() -> Json<Value> {
    Json(json!({
        "data": [
            {
                "id": 10,
                "categoryId": 1,
                "name": { "ar": "ناقل الحركة", "en": "Transmission" },
                "values": { "ar": ["أوتوماتيك", "يدوي"], "en": ["Automatic", "Manual"] }
            },
            {
                "id": 11,
                "categoryId": 99,
                "name": { "ar": "فتحة سقف", "en": "Sunroof" },
                "values": { "ar": ["نعم"], "en": ["Yes"] }
            }
        ]
    }))
}

// -- misbehaving endpoints --

async fn slow_news() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({ "data": [] }))
}

async fn broken_delete() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}
