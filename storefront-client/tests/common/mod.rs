//! Common test utilities: an in-process stub of the catalog backend
//!
//! The stub speaks the same envelope protocol as the real API and
//! records how many times each endpoint was hit, so tests can assert
//! that validation failures never reach the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use storefront_client::{ApiClient, MemoryTokenStore, SessionManager};
use storefront_core::models::{Category, Product};

/// A user known to the stub backend
#[derive(Debug, Clone)]
pub struct StubUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl StubUser {
    fn identity(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "role": self.role,
            "created_at": self.created_at,
        })
    }
}

/// Backend state plus per-endpoint hit counters
#[derive(Default)]
pub struct StubState {
    users: RwLock<Vec<StubUser>>,
    tokens: RwLock<HashMap<String, Uuid>>,
    categories: RwLock<Vec<Category>>,
    products: RwLock<Vec<Product>>,
    seq: AtomicU64,

    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub me_calls: AtomicUsize,
    pub product_list_calls: AtomicUsize,
    pub product_create_calls: AtomicUsize,
    pub product_update_calls: AtomicUsize,
    pub product_delete_calls: AtomicUsize,
    pub category_list_calls: AtomicUsize,
    pub category_create_calls: AtomicUsize,
    pub category_update_calls: AtomicUsize,
    pub category_delete_calls: AtomicUsize,
}

impl StubState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic timestamps so creation order fixes the sort order
    fn next_timestamp(&self) -> DateTime<Utc> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(1_700_000_000 + seq as i64, 0).expect("valid timestamp")
    }

    pub fn seed_admin(&self, email: &str, password: &str) -> StubUser {
        let user = StubUser {
            id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: "admin".to_string(),
            created_at: self.next_timestamp(),
        };
        self.users.write().unwrap().push(user.clone());
        user
    }

    pub fn insert_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: self.next_timestamp(),
        };
        self.categories.write().unwrap().push(category.clone());
        category
    }

    pub fn insert_product(&self, name: &str, category: &Category, price: f64) -> Product {
        let ts = self.next_timestamp();
        let product = Product {
            id: Uuid::new_v4(),
            category_id: category.id,
            category_name: category.name.clone(),
            name: name.to_string(),
            description: format!("{} description", name),
            price,
            created_at: ts,
            updated_at: ts,
        };
        self.products.write().unwrap().push(product.clone());
        product
    }

    pub fn issue_token(&self, user_id: Uuid) -> String {
        let token = format!("tok-{}", Uuid::new_v4());
        self.tokens.write().unwrap().insert(token.clone(), user_id);
        token
    }

    /// Invalidate every issued token without touching users
    pub fn revoke_tokens(&self) {
        self.tokens.write().unwrap().clear();
    }
}

/// A running stub backend
pub struct StubApi {
    /// Base URL of the stub, e.g. `http://127.0.0.1:49152`
    pub addr: String,
    pub state: Arc<StubState>,
}

/// Start a stub backend on an ephemeral port
pub async fn start_stub_api() -> StubApi {
    let state = Arc::new(StubState::new());
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub listener");
    let addr = format!(
        "http://{}",
        listener.local_addr().expect("Failed to read stub address")
    );

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server crashed");
    });

    StubApi { addr, state }
}

/// Seed an admin account and return a logged-in session for it
pub async fn admin_session(stub: &StubApi) -> Arc<SessionManager<MemoryTokenStore>> {
    stub.state.seed_admin("admin@example.com", "password123");
    let api = ApiClient::new(&stub.addr);
    let session = Arc::new(SessionManager::new(api, MemoryTokenStore::new()));
    session
        .login("admin@example.com", "password123")
        .await
        .expect("admin login failed");
    session
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/me", get(me))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state)
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": { "message": message } }))).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(String::from)
}

fn require_admin(state: &StubState, headers: &HeaderMap) -> Result<StubUser, Response> {
    let token = bearer_token(headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "missing authorization header"))?;
    let user_id = state
        .tokens
        .read()
        .unwrap()
        .get(&token)
        .copied()
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "invalid token"))?;
    let user = state
        .users
        .read()
        .unwrap()
        .iter()
        .find(|u| u.id == user_id)
        .cloned()
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "invalid token"))?;
    if user.role != "admin" {
        return Err(api_error(StatusCode::FORBIDDEN, "forbidden"));
    }
    Ok(user)
}

async fn health() -> Response {
    Json(json!({ "data": { "status": "ok" } })).into_response()
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or("").to_string();
    let password = body["password"].as_str().unwrap_or("").to_string();

    // Emails starting with "slow" let tests race a logout against a login.
    if email.starts_with("slow") {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    let user = state
        .users
        .read()
        .unwrap()
        .iter()
        .find(|u| u.email == email && u.password == password)
        .cloned();
    let Some(user) = user else {
        return api_error(StatusCode::UNAUTHORIZED, "invalid credentials");
    };

    let token = state.issue_token(user.id);
    Json(json!({
        "data": {
            "access_token": token,
            "token_type": "Bearer",
            "expires_at": Utc::now() + chrono::Duration::hours(1),
        }
    }))
    .into_response()
}

async fn register(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    state.register_calls.fetch_add(1, Ordering::SeqCst);

    let email = body["email"].as_str().unwrap_or("").to_string();
    let exists = state.users.read().unwrap().iter().any(|u| u.email == email);
    if exists {
        return api_error(StatusCode::CONFLICT, "email already registered");
    }

    let user = StubUser {
        id: Uuid::new_v4(),
        name: body["name"].as_str().unwrap_or("").to_string(),
        email,
        password: body["password"].as_str().unwrap_or("").to_string(),
        role: "user".to_string(),
        created_at: state.next_timestamp(),
    };
    state.users.write().unwrap().push(user.clone());
    (StatusCode::CREATED, Json(json!({ "data": user.identity() }))).into_response()
}

async fn me(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);

    let Some(token) = bearer_token(&headers) else {
        return api_error(StatusCode::UNAUTHORIZED, "missing authorization header");
    };
    let user_id = state.tokens.read().unwrap().get(&token).copied();
    let Some(user_id) = user_id else {
        return api_error(StatusCode::UNAUTHORIZED, "invalid token");
    };
    let user = state
        .users
        .read()
        .unwrap()
        .iter()
        .find(|u| u.id == user_id)
        .cloned();
    match user {
        Some(user) => Json(json!({ "data": user.identity() })).into_response(),
        None => api_error(StatusCode::UNAUTHORIZED, "invalid token"),
    }
}

async fn list_categories(State(state): State<Arc<StubState>>) -> Response {
    state.category_list_calls.fetch_add(1, Ordering::SeqCst);

    let categories = state.categories.read().unwrap().clone();
    let count = categories.len();
    Json(json!({ "data": categories, "meta": { "count": count } })).into_response()
}

async fn create_category(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.category_create_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let name = body["name"].as_str().unwrap_or("").to_string();
    let exists = state
        .categories
        .read()
        .unwrap()
        .iter()
        .any(|c| c.name == name);
    if exists {
        return api_error(StatusCode::CONFLICT, "category already exists");
    }

    let category = state.insert_category(&name);
    (StatusCode::CREATED, Json(json!({ "data": category }))).into_response()
}

async fn update_category(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.category_update_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let name = body["name"].as_str().unwrap_or("").to_string();
    let updated = {
        let mut categories = state.categories.write().unwrap();
        let Some(category) = categories.iter_mut().find(|c| c.id == id) else {
            return api_error(StatusCode::NOT_FOUND, "category not found");
        };
        category.name = name.clone();
        category.clone()
    };

    // Keep the denormalized name on product rows in sync.
    for product in state.products.write().unwrap().iter_mut() {
        if product.category_id == id {
            product.category_name = name.clone();
        }
    }

    Json(json!({ "data": updated })).into_response()
}

async fn delete_category(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    state.category_delete_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let mut categories = state.categories.write().unwrap();
    let Some(index) = categories.iter().position(|c| c.id == id) else {
        return api_error(StatusCode::NOT_FOUND, "category not found");
    };
    categories.remove(index);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_products(
    State(state): State<Arc<StubState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.product_list_calls.fetch_add(1, Ordering::SeqCst);

    let q = params.get("q").cloned().unwrap_or_default();
    // "slow" delays the response, "boom" fails it; both are test hooks.
    if q == "slow" {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    if q == "boom" {
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, "simulated failure");
    }

    let mut items = state.products.read().unwrap().clone();
    if !q.is_empty() {
        let needle = q.to_lowercase();
        items.retain(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        });
    }
    if let Some(id) = params.get("category_id").and_then(|s| Uuid::parse_str(s).ok()) {
        items.retain(|p| p.category_id == id);
    }
    if let Some(min) = params.get("min_price").and_then(|s| s.parse::<f64>().ok()) {
        items.retain(|p| p.price >= min);
    }
    if let Some(max) = params.get("max_price").and_then(|s| s.parse::<f64>().ok()) {
        items.retain(|p| p.price <= max);
    }

    match params.get("sort").map(String::as_str) {
        Some("price") => items.sort_by(|a, b| {
            a.price
                .partial_cmp(&b.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        _ => items.sort_by_key(|p| p.created_at),
    }
    if params.get("order").map(String::as_str) != Some("asc") {
        items.reverse();
    }

    let page = params
        .get("page")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    let limit = params
        .get("limit")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(10)
        .clamp(1, 100);

    let total = items.len() as u64;
    let start = ((page - 1) * limit) as usize;
    let items: Vec<Product> = items.into_iter().skip(start).take(limit as usize).collect();

    Json(json!({
        "data": items,
        "meta": { "page": page, "limit": limit, "total": total }
    }))
    .into_response()
}

async fn get_product(State(state): State<Arc<StubState>>, Path(id): Path<Uuid>) -> Response {
    let products = state.products.read().unwrap();
    match products.iter().find(|p| p.id == id) {
        Some(product) => Json(json!({ "data": product })).into_response(),
        None => api_error(StatusCode::NOT_FOUND, "product not found"),
    }
}

async fn create_product(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.product_create_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let Some(category) = resolve_category(&state, &body) else {
        return api_error(StatusCode::BAD_REQUEST, "category_id not found");
    };

    let ts = state.next_timestamp();
    let product = Product {
        id: Uuid::new_v4(),
        category_id: category.id,
        category_name: category.name.clone(),
        name: body["name"].as_str().unwrap_or("").to_string(),
        description: body["description"].as_str().unwrap_or("").to_string(),
        price: body["price"].as_f64().unwrap_or(0.0),
        created_at: ts,
        updated_at: ts,
    };
    state.products.write().unwrap().push(product.clone());
    (StatusCode::CREATED, Json(json!({ "data": product }))).into_response()
}

async fn update_product(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.product_update_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let Some(category) = resolve_category(&state, &body) else {
        return api_error(StatusCode::BAD_REQUEST, "category_id not found");
    };

    let ts = state.next_timestamp();
    let mut products = state.products.write().unwrap();
    let Some(product) = products.iter_mut().find(|p| p.id == id) else {
        return api_error(StatusCode::NOT_FOUND, "product not found");
    };
    product.category_id = category.id;
    product.category_name = category.name.clone();
    product.name = body["name"].as_str().unwrap_or("").to_string();
    product.description = body["description"].as_str().unwrap_or("").to_string();
    product.price = body["price"].as_f64().unwrap_or(0.0);
    product.updated_at = ts;

    Json(json!({ "data": product.clone() })).into_response()
}

async fn delete_product(
    State(state): State<Arc<StubState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    state.product_delete_calls.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }

    let mut products = state.products.write().unwrap();
    let Some(index) = products.iter().position(|p| p.id == id) else {
        return api_error(StatusCode::NOT_FOUND, "product not found");
    };
    products.remove(index);
    StatusCode::NO_CONTENT.into_response()
}

fn resolve_category(state: &StubState, body: &Value) -> Option<Category> {
    let id = body["category_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())?;
    state
        .categories
        .read()
        .unwrap()
        .iter()
        .find(|c| c.id == id)
        .cloned()
}
