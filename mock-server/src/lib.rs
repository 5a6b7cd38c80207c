use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use base64::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

/// Page size used when a request carries no `limit`.
pub const DEFAULT_LIMIT: usize = 100;

/// Largest page the server hands out, whatever `limit` asks for.
pub const DEFAULT_MAX_LIMIT: usize = 10_000;

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub username: String,
    pub password: String,
    pub max_limit: usize,
    /// Number of generated `/inventory/items` records.
    pub inventory_items: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
            max_limit: DEFAULT_MAX_LIMIT,
            inventory_items: 0,
        }
    }
}

/// In-memory collections. Records are stored as raw JSON objects in
/// insertion order, which is also the paging order.
#[derive(Debug, Default)]
pub struct Backend {
    pub orders: Vec<Value>,
    pub items: Vec<Value>,
    pub inventory: Vec<Value>,
    next_order_id: i64,
    next_item_id: i64,
}

impl Backend {
    pub fn with_inventory(count: usize) -> Self {
        let inventory = (1..=count)
            .map(|n| json!({"id": n, "partNo": format!("PART-{n:05}"), "whse": "00"}))
            .collect();
        Self {
            inventory,
            ..Self::default()
        }
    }
}

pub type Db = Arc<RwLock<Backend>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    authorization: Arc<str>,
    max_limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub start: Option<usize>,
    pub filter: Option<String>,
}

pub fn app(config: &MockConfig) -> Router {
    let db = Arc::new(RwLock::new(Backend::with_inventory(config.inventory_items)));
    app_with_db(config, db)
}

/// Router over an existing store, so tests can inspect it afterwards.
pub fn app_with_db(config: &MockConfig, db: Db) -> Router {
    let credentials = format!("{}:{}", config.username, config.password);
    let state = AppState {
        db,
        authorization: format!("Basic {}", BASE64_STANDARD.encode(credentials)).into(),
        max_limit: config.max_limit.max(1),
    };

    Router::new()
        .route("/", get(company))
        .route("/sales/orders", get(list_orders).post(create_order))
        .route("/sales/orders/{id}", delete(delete_order))
        .route("/sales/items", get(list_items))
        .route("/inventory/items", get(list_inventory))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app(&config)).await
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(state.authorization.as_ref()) {
        debug!(uri = %request.uri(), "rejecting request with bad credentials");
        return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
    }
    next.run(request).await
}

async fn company() -> Json<Value> {
    Json(json!({"name": "Mock Company", "status": "ok"}))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let db = state.db.read().await;
    page(&db.orders, &params, state.max_limit)
}

async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let db = state.db.read().await;
    page(&db.items, &params, state.max_limit)
}

async fn list_inventory(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let db = state.db.read().await;
    page(&db.inventory, &params, state.max_limit)
}

/// Accepts an order object; its `items` array is split off into line items
/// tagged with the order's number. Answers 201 with an empty body.
async fn create_order(
    State(state): State<AppState>,
    Json(order): Json<Value>,
) -> Result<StatusCode, (StatusCode, String)> {
    let Value::Object(mut order) = order else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "order must be a JSON object".to_string(),
        ));
    };

    let mut db = state.db.write().await;
    db.next_order_id += 1;
    let id = db.next_order_id;
    order.insert("id".to_string(), json!(id));
    let order_no = order
        .entry("orderNo")
        .or_insert_with(|| json!(format!("{id:07}")))
        .clone();

    let items = match order.remove("items") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    for item in items {
        let Value::Object(mut item) = item else {
            continue;
        };
        db.next_item_id += 1;
        item.insert("id".to_string(), json!(db.next_item_id));
        item.insert("orderNo".to_string(), order_no.clone());
        db.items.push(Value::Object(item));
    }

    info!(id, order_no = %order_no, "sales order created");
    db.orders.push(Value::Object(order));
    Ok(StatusCode::CREATED)
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut db = state.db.write().await;
    let Some(index) = db.orders.iter().position(|o| o["id"] == json!(id)) else {
        return Err((StatusCode::NOT_FOUND, format!("sales order {id} not found")));
    };
    let order = db.orders.remove(index);
    db.items.retain(|item| item["orderNo"] != order["orderNo"]);
    info!(id, "sales order deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn page(
    records: &[Value],
    params: &ListParams,
    max_limit: usize,
) -> Result<Json<Value>, (StatusCode, String)> {
    let filter = match params.filter.as_deref() {
        Some(raw) => Some(
            serde_json::from_str::<Value>(raw)
                .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid filter: {e}")))?,
        ),
        None => None,
    };

    let matching: Vec<&Value> = records
        .iter()
        .filter(|record| filter.as_ref().map_or(true, |f| matches(record, f)))
        .collect();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(max_limit);
    let start = params.start.unwrap_or(0);
    let page: Vec<Value> = matching
        .iter()
        .skip(start)
        .take(limit)
        .map(|record| (*record).clone())
        .collect();

    debug!(start, limit, returned = page.len(), count = matching.len(), "page served");
    Ok(Json(json!({"records": page, "count": matching.len()})))
}

/// Evaluates a filter document against a record: plain keys are equality
/// tests, `$or`/`$and` combine arrays of sub-filters.
pub fn matches(record: &Value, filter: &Value) -> bool {
    let Some(conditions) = filter.as_object() else {
        return false;
    };
    conditions.iter().all(|(key, expected)| condition_holds(record, key, expected))
}

fn condition_holds(record: &Value, key: &str, expected: &Value) -> bool {
    match key {
        "$or" => expected
            .as_array()
            .is_some_and(|subs| subs.iter().any(|f| matches(record, f))),
        "$and" => expected
            .as_array()
            .is_some_and(|subs| subs.iter().all(|f| matches(record, f))),
        field => record.get(field) == Some(expected),
    }
}
