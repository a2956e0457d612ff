//! Stub Bridge HTTP Server
//!
//! # Endpoints
//!
//! - `GET /` - Service index
//! - `GET /health` - Handshake target, always healthy
//! - `GET /account_info` - Demo account snapshot
//! - `POST /get_tick` - Last tick for `{symbol}`
//! - `POST /get_rates` - Newest `{count}` bars for `{symbol, timeframe}`
//! - `POST /symbol_info` - Contract specification for `{symbol}`
//! - `GET /symbols` - Offered symbols

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bridge_client::infrastructure::http::api_types::{
    AccountInfoResponse, ErrorResponse, HealthResponse, RateRow, RatesRequest, RatesResponse,
    SYMBOL_NOT_FOUND_CODE, SymbolInfoResponse, SymbolRequest, SymbolsResponse, TickResponse,
    paths,
};
use bridge_client::{Granularity, MAX_BAR_COUNT, Symbol};
use chrono::Utc;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::market::StubMarket;

/// Shared handler state.
pub type SharedMarket = Arc<StubMarket>;

// =============================================================================
// Errors
// =============================================================================

/// Stub server error.
#[derive(Debug, thiserror::Error)]
pub enum StubServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind {0}: {1}")]
    BindFailed(SocketAddr, String),
    /// The server stopped with an error.
    #[error("stub server failed: {0}")]
    ServerFailed(String),
}

/// A JSON error reply in the bridge's `{error, code}` shape.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn bad_request(message: impl Into<String>, code: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: message.into(),
                code: Some(code.to_string()),
            },
        }
    }

    fn symbol_not_found(symbol: &Symbol) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorResponse {
                error: format!("Symbol {symbol} not found"),
                code: Some(SYMBOL_NOT_FOUND_CODE.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn parse_symbol(raw: &str) -> Result<Symbol, ApiError> {
    Symbol::new(raw).map_err(|e| ApiError::bad_request(e.to_string(), "INVALID_SYMBOL"))
}

// =============================================================================
// Router
// =============================================================================

/// Create the router over `market`.
pub fn create_router(market: SharedMarket) -> Router {
    Router::new()
        .route("/", get(index))
        .route(paths::HEALTH, get(health))
        .route(paths::ACCOUNT_INFO, get(account_info))
        .route(paths::GET_TICK, post(get_tick))
        .route(paths::GET_RATES, post(get_rates))
        .route(paths::SYMBOL_INFO, post(symbol_info))
        .route(paths::SYMBOLS, get(symbols))
        .with_state(market)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(
    addr: SocketAddr,
    market: SharedMarket,
    shutdown: F,
) -> Result<(), StubServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| StubServerError::BindFailed(addr, e.to_string()))?;
    serve_on(listener, market, shutdown).await
}

/// Serve on an already bound `listener` until `shutdown` resolves.
pub async fn serve_on<F>(
    listener: TcpListener,
    market: SharedMarket,
    shutdown: F,
) -> Result<(), StubServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| StubServerError::ServerFailed(e.to_string()))?;

    tracing::info!(%addr, symbols = market.symbols().len(), "Stub bridge listening");

    axum::serve(listener, create_router(market))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StubServerError::ServerFailed(e.to_string()))?;

    tracing::info!("Stub bridge stopped");
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Serialize)]
struct IndexResponse {
    service: &'static str,
    version: &'static str,
    endpoints: Vec<&'static str>,
}

async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "bridge-stub",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "GET /health",
            "GET /account_info",
            "POST /get_tick",
            "POST /get_rates",
            "POST /symbol_info",
            "GET /symbols",
        ],
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        terminal_connected: true,
        timestamp: Some(Utc::now().to_rfc3339()),
        server: Some(format!("bridge-stub {}", env!("CARGO_PKG_VERSION"))),
    })
}

async fn account_info(State(market): State<SharedMarket>) -> Json<AccountInfoResponse> {
    Json(AccountInfoResponse::from_domain(market.account()))
}

async fn get_tick(
    State(market): State<SharedMarket>,
    Json(request): Json<SymbolRequest>,
) -> Result<Json<TickResponse>, ApiError> {
    let symbol = parse_symbol(&request.symbol)?;
    let quote = market
        .quote(&symbol)
        .ok_or_else(|| ApiError::symbol_not_found(&symbol))?;
    Ok(Json(TickResponse::from_domain(&quote)))
}

async fn get_rates(
    State(market): State<SharedMarket>,
    Json(request): Json<RatesRequest>,
) -> Result<Json<RatesResponse>, ApiError> {
    let symbol = parse_symbol(&request.symbol)?;
    let granularity: Granularity = request
        .timeframe
        .parse()
        .map_err(|_| {
            ApiError::bad_request(
                format!("Invalid timeframe: {}", request.timeframe),
                "INVALID_TIMEFRAME",
            )
        })?;

    if request.count == 0 || request.count > MAX_BAR_COUNT {
        return Err(ApiError::bad_request(
            format!("count must be between 1 and {MAX_BAR_COUNT}"),
            "INVALID_COUNT",
        ));
    }

    let bars = market
        .bars(&symbol, granularity, request.count)
        .ok_or_else(|| ApiError::symbol_not_found(&symbol))?;

    tracing::debug!(
        symbol = %symbol,
        granularity = %granularity,
        count = bars.len(),
        "Serving rates"
    );

    Ok(Json(RatesResponse {
        symbol: symbol.to_string(),
        timeframe: granularity.as_str().to_string(),
        count: bars.len(),
        data: bars.iter().map(RateRow::from_domain).collect(),
    }))
}

async fn symbol_info(
    State(market): State<SharedMarket>,
    Json(request): Json<SymbolRequest>,
) -> Result<Json<SymbolInfoResponse>, ApiError> {
    let symbol = parse_symbol(&request.symbol)?;
    let info = market
        .symbol_info(&symbol)
        .ok_or_else(|| ApiError::symbol_not_found(&symbol))?;
    Ok(Json(SymbolInfoResponse::from_domain(&info)))
}

async fn symbols(State(market): State<SharedMarket>) -> Json<SymbolsResponse> {
    let symbols: Vec<String> = market.symbols().into_iter().map(String::from).collect();
    Json(SymbolsResponse {
        count: symbols.len(),
        symbols,
    })
}
