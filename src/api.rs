//! REST API server for VaultNexus
//!
//! Exposes every marketplace operation over HTTP. The caller principal is
//! supplied explicitly in each request body (hex-encoded), standing in for
//! the transaction signer a host chain would provide.

use axum::{
    extract::{Path, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::MarketError;
use crate::identity::{principal_from_hex, principal_to_hex, Principal};
use crate::marketplace::Marketplace;
use crate::persistence::Persistence;
use crate::registry::{Asset, AssetDraft, AssetId, AssetUpdate};
use crate::settlement::Ledger;

/// Shared server state: the marketplace, its ledger collaborator, and an
/// optional persistence backend snapshotted after every state change.
pub struct Node {
    pub marketplace: Arc<RwLock<Marketplace>>,
    pub ledger: Arc<RwLock<Box<dyn Ledger>>>,
    pub persistence: Option<Arc<Box<dyn Persistence>>>,
    faucet_amount: u64,
    api_stats: Arc<RwLock<ApiStats>>,
}

impl Node {
    pub fn new(
        marketplace: Marketplace,
        ledger: Box<dyn Ledger>,
        persistence: Option<Arc<Box<dyn Persistence>>>,
        faucet_amount: u64,
    ) -> Self {
        Node {
            marketplace: Arc::new(RwLock::new(marketplace)),
            ledger: Arc::new(RwLock::new(ledger)),
            persistence,
            faucet_amount,
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    /// Get API statistics
    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            assets_registered: stats.assets_registered,
            assets_acquired: stats.assets_acquired,
            uptime_seconds: uptime,
        }
    }

    /// Snapshot the marketplace to the persistence backend, if any. A failed
    /// snapshot is logged and not surfaced: the in-memory state stays
    /// authoritative.
    async fn persist(&self) {
        if let Some(persistence) = &self.persistence {
            let market = self.marketplace.read().await;
            if let Err(e) = persistence.save_marketplace(&market) {
                tracing::warn!(error = %e, "marketplace snapshot failed");
            }
        }
    }
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    assets_registered: u64,
    assets_acquired: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Market(MarketError),
    InvalidInput(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            ApiError::Market(e) => {
                let status = match &e {
                    MarketError::Unauthorized | MarketError::NotPurchased(_) => {
                        StatusCode::FORBIDDEN
                    }
                    MarketError::AssetNotFound(_) => StatusCode::NOT_FOUND,
                    MarketError::InactiveAsset(_)
                    | MarketError::AlreadyPurchased(_)
                    | MarketError::DuplicateFeedback(_) => StatusCode::CONFLICT,
                    MarketError::InvalidPrice
                    | MarketError::ExcessiveRoyalty(_)
                    | MarketError::InvalidRating(_)
                    | MarketError::InvalidField(_) => StatusCode::BAD_REQUEST,
                    MarketError::SettlementFailed(_) => StatusCode::PAYMENT_REQUIRED,
                    MarketError::DatabaseError(_)
                    | MarketError::ConfigError(_)
                    | MarketError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let code = e.code();
                (status, e.to_string(), code)
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
        };

        (status, Json(ErrorResponse { error: message, code })).into_response()
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        ApiError::Market(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u32>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterAssetRequest {
    pub caller: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub sector: String,
    pub thumbnail: String,
    pub resource: String,
    pub royalty: u64,
}

#[derive(Deserialize)]
pub struct ModifyAssetRequest {
    pub caller: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub sector: String,
    pub thumbnail: String,
    pub resource: String,
    pub active: bool,
}

#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

#[derive(Deserialize)]
pub struct RelistAssetRequest {
    pub caller: String,
    pub price: u64,
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub caller: String,
    pub rating: u64,
    pub comment: String,
}

#[derive(Deserialize)]
pub struct FaucetRequest {
    pub principal: String,
}

#[derive(Serialize)]
pub struct RegisterAssetResponse {
    pub id: AssetId,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub assets_registered: u64,
    pub assets_acquired: u64,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
struct SuccessResponse {
    message: String,
}

#[derive(Deserialize)]
struct PaginationQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_limit")]
    limit: u64,
}

fn default_page() -> u64 {
    0
}
fn default_limit() -> u64 {
    10
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Parses a 64-character hex string into a Principal ([u8; 32]).
fn parse_principal(hex_str: &str) -> Result<Principal, ApiError> {
    principal_from_hex(hex_str)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid principal: {}", e)))
}

/// Asset rendered for the wire, principals as hex.
fn asset_json(asset: &Asset) -> serde_json::Value {
    serde_json::json!({
        "id": asset.id,
        "creator": principal_to_hex(&asset.creator),
        "vendor": principal_to_hex(&asset.vendor),
        "name": asset.name,
        "description": asset.description,
        "price": asset.price,
        "sector": asset.sector,
        "thumbnail": asset.thumbnail,
        "resource": asset.resource,
        "royalty": asset.royalty,
        "active": asset.active,
        "registered_at": asset.registered_at,
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging and statistics middleware
async fn stats_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = node.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Detailed request logging middleware. Logs method, path, status and duration.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints (also used by tests)
pub fn build_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        // Asset registry endpoints
        .route("/assets", get(list_assets).post(register_asset))
        .route("/assets/count", get(count_assets))
        .route("/assets/:id", get(fetch_asset).put(modify_asset))
        .route("/assets/:id/deactivate", post(deactivate_asset))
        .route("/assets/:id/relist", post(relist_asset))
        .route("/assets/:id/acquire", post(acquire_asset))
        .route("/assets/:id/feedback", post(post_feedback))
        .route("/assets/:id/feedback/:buyer", get(fetch_feedback))
        .route("/assets/:id/acquisition/:buyer", get(verify_acquisition))
        .route("/vendors/:vendor/assets", get(assets_by_vendor))
        // Ledger endpoints (dev ledger)
        .route("/faucet", post(faucet))
        .route("/balance/:principal", get(get_balance))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so we always record timing
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(
            node.clone(),
            stats_middleware,
        ))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Run the API server on the given port; the `PORT` environment variable
/// overrides it.
pub async fn run_server(node: Arc<Node>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(node);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(port);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "API server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_api_stats(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let stats = node.get_stats().await;
    Json(stats)
}

async fn register_asset(
    State(node): State<Arc<Node>>,
    Json(req): Json<RegisterAssetRequest>,
) -> Result<Json<RegisterAssetResponse>, ApiError> {
    let caller = parse_principal(&req.caller)?;
    let draft = AssetDraft {
        name: req.name,
        description: req.description,
        price: req.price,
        sector: req.sector,
        thumbnail: req.thumbnail,
        resource: req.resource,
        royalty: req.royalty,
    };

    let id = {
        let mut market = node.marketplace.write().await;
        market.register_asset(caller, draft)?
    };

    {
        let mut stats = node.api_stats.write().await;
        stats.assets_registered += 1;
    }
    node.persist().await;

    Ok(Json(RegisterAssetResponse { id }))
}

async fn list_assets(
    State(node): State<Arc<Node>>,
    Query(params): Query<PaginationQuery>,
) -> impl IntoResponse {
    let market = node.marketplace.read().await;
    let assets = market.list_assets();
    let total = assets.len();

    let limit = params.limit.min(100); // Max 100 assets per request
    let offset = params.page * limit;

    let assets_json: Vec<_> = assets
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .map(|a| asset_json(a))
        .collect();

    Json(serde_json::json!({
        "assets": assets_json,
        "total": total,
        "page": params.page,
        "limit": limit
    }))
}

async fn count_assets(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let market = node.marketplace.read().await;
    Json(serde_json::json!({ "count": market.count_registered_assets() }))
}

async fn fetch_asset(
    State(node): State<Arc<Node>>,
    Path(id): Path<AssetId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let market = node.marketplace.read().await;
    market
        .fetch_asset(id)
        .map(|a| Json(asset_json(a)))
        .ok_or(ApiError::Market(MarketError::AssetNotFound(id)))
}

async fn modify_asset(
    State(node): State<Arc<Node>>,
    Path(id): Path<AssetId>,
    Json(req): Json<ModifyAssetRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let caller = parse_principal(&req.caller)?;
    let update = AssetUpdate {
        name: req.name,
        description: req.description,
        price: req.price,
        sector: req.sector,
        thumbnail: req.thumbnail,
        resource: req.resource,
        active: req.active,
    };

    {
        let mut market = node.marketplace.write().await;
        market.modify_asset(caller, id, update)?;
    }
    node.persist().await;

    Ok(Json(SuccessResponse {
        message: "Asset modified successfully".to_string(),
    }))
}

async fn deactivate_asset(
    State(node): State<Arc<Node>>,
    Path(id): Path<AssetId>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let caller = parse_principal(&req.caller)?;

    {
        let mut market = node.marketplace.write().await;
        market.deactivate_asset(caller, id)?;
    }
    node.persist().await;

    Ok(Json(SuccessResponse {
        message: "Asset deactivated successfully".to_string(),
    }))
}

async fn relist_asset(
    State(node): State<Arc<Node>>,
    Path(id): Path<AssetId>,
    Json(req): Json<RelistAssetRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let caller = parse_principal(&req.caller)?;

    {
        let mut market = node.marketplace.write().await;
        market.relist_asset(caller, id, req.price)?;
    }
    node.persist().await;

    Ok(Json(SuccessResponse {
        message: "Asset relisted successfully".to_string(),
    }))
}

async fn acquire_asset(
    State(node): State<Arc<Node>>,
    Path(id): Path<AssetId>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let caller = parse_principal(&req.caller)?;

    {
        let mut market = node.marketplace.write().await;
        let mut ledger = node.ledger.write().await;
        market.acquire_asset(caller, id, ledger.as_mut())?;
    }

    {
        let mut stats = node.api_stats.write().await;
        stats.assets_acquired += 1;
    }
    node.persist().await;

    Ok(Json(SuccessResponse {
        message: "Asset acquired successfully".to_string(),
    }))
}

async fn post_feedback(
    State(node): State<Arc<Node>>,
    Path(id): Path<AssetId>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let caller = parse_principal(&req.caller)?;

    {
        let mut market = node.marketplace.write().await;
        market.post_feedback(caller, id, req.rating, req.comment)?;
    }
    node.persist().await;

    Ok(Json(SuccessResponse {
        message: "Feedback submitted successfully".to_string(),
    }))
}

async fn fetch_feedback(
    State(node): State<Arc<Node>>,
    Path((id, buyer_str)): Path<(AssetId, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let buyer = parse_principal(&buyer_str)?;
    let market = node.marketplace.read().await;

    let record = market.fetch_feedback(id, &buyer).ok_or_else(|| {
        ApiError::NotFound(format!("No feedback for asset {} from {}", id, buyer_str))
    })?;

    Ok(Json(serde_json::json!({
        "asset_id": record.asset_id,
        "buyer": principal_to_hex(&record.buyer),
        "rating": record.rating,
        "comment": record.comment,
        "posted_at": record.posted_at,
    })))
}

async fn verify_acquisition(
    State(node): State<Arc<Node>>,
    Path((id, buyer_str)): Path<(AssetId, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let buyer = parse_principal(&buyer_str)?;
    let market = node.marketplace.read().await;
    Ok(Json(serde_json::json!({
        "asset_id": id,
        "buyer": buyer_str,
        "purchased": market.verify_acquisition(id, &buyer)
    })))
}

async fn assets_by_vendor(
    State(node): State<Arc<Node>>,
    Path(vendor_str): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let vendor = parse_principal(&vendor_str)?;
    let market = node.marketplace.read().await;
    let assets: Vec<_> = market
        .assets_by_vendor(&vendor)
        .iter()
        .map(|a| asset_json(a))
        .collect();

    Ok(Json(serde_json::json!({
        "vendor": vendor_str,
        "count": assets.len(),
        "assets": assets
    })))
}

async fn faucet(
    State(node): State<Arc<Node>>,
    Json(req): Json<FaucetRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let principal = parse_principal(&req.principal)?;
    let amount = node.faucet_amount;

    {
        let mut ledger = node.ledger.write().await;
        ledger.credit(principal, amount)?;
    }

    Ok(Json(SuccessResponse {
        message: format!("Credited {} to {}", amount, req.principal),
    }))
}

async fn get_balance(
    State(node): State<Arc<Node>>,
    Path(principal_str): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let principal = parse_principal(&principal_str)?;
    let ledger = node.ledger.read().await;
    Ok(Json(serde_json::json!({
        "principal": principal_str,
        "balance": ledger.balance_of(&principal)
    })))
}
