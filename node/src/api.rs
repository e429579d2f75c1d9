// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # REST + WebSocket API
//!
//! The axum router in front of the launch market. Handlers share one
//! [`AppState`] through axum's `State` extractor, call the market directly,
//! record metrics, and fan successful mutations out to WebSocket subscribers.
//! Mutations and their broadcasts run one at a time, so the event feed is in
//! the order the market applied the changes.
//!
//! ## Endpoints
//!
//! | Method | Path                       | Description                          |
//! |--------|----------------------------|--------------------------------------|
//! | GET    | `/health`                  | Liveness probe                       |
//! | GET    | `/balance`                 | Global virtual balance               |
//! | GET    | `/tokens`                  | Every token, in creation order       |
//! | POST   | `/tokens`                  | Launch a token                       |
//! | GET    | `/tokens/trending`         | Top tokens by supply (`?limit=N`)    |
//! | GET    | `/tokens/migrated`         | Migrated tokens                      |
//! | GET    | `/tokens/:id`              | One token (counts a view)            |
//! | POST   | `/tokens/:id/commit`       | Commit a preset amount               |
//! | POST   | `/tokens/:id/upvote`       | Upvote                               |
//! | GET    | `/tokens/:id/comments`     | Comment thread                       |
//! | POST   | `/tokens/:id/comments`     | Post a comment                       |
//! | POST   | `/migrated/:id/buy`        | Buy supply on a migrated token       |
//! | POST   | `/migrated/:id/sell`       | Sell supply on a migrated token      |
//! | GET    | `/ws`                      | Live market events                   |

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use launchpad_market::{
    Comment, Market, MarketError, MarketEvent, NewToken, Phase, Token, TradeReceipt, TradeSide,
};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state. Cloning copies `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Reported by `/health`.
    pub version: String,
    pub market: Arc<Market>,
    /// Fan-out for WebSocket subscribers.
    pub event_tx: broadcast::Sender<MarketEvent>,
    pub metrics: SharedMetrics,
    /// Held across a mutation and its broadcast so subscribers see events
    /// in the order the market applied them.
    pub event_order: Arc<Mutex<()>>,
}

impl AppState {
    /// Runs one market operation, timing it and counting rejections.
    fn run<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Market) -> Result<T, MarketError>,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let result = f(&self.market);
        self.metrics
            .operation_latency_seconds
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(value) => {
                self.metrics
                    .observe_market(self.market.token_count(), self.market.balance());
                Ok(value)
            }
            Err(err) => {
                let kind = err.kind();
                self.metrics
                    .rejected_operations_total
                    .with_label_values(&[kind.as_str()])
                    .inc();
                if kind.is_internal() {
                    tracing::warn!(op, error = %err, "market operation failed");
                } else {
                    tracing::debug!(op, %kind, "market operation rejected");
                }
                Err(ApiError::Market(err))
            }
        }
    }

    /// Runs a mutating operation and broadcasts the events it produced.
    ///
    /// Mutations are serialized with their broadcasts, so two trades on the
    /// same token can never reach a subscriber out of order.
    fn mutate<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Market) -> Result<T, MarketError>,
        events: impl FnOnce(&T) -> Vec<MarketEvent>,
    ) -> Result<T, ApiError> {
        let _order = self.event_order.lock();
        let value = self.run(op, f)?;
        for event in events(&value) {
            // No subscribers is not an error.
            let _ = self.event_tx.send(event);
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the API router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/balance", get(balance_handler))
        .route("/tokens", get(list_tokens_handler).post(create_token_handler))
        .route("/tokens/trending", get(trending_handler))
        .route("/tokens/migrated", get(migrated_handler))
        .route("/tokens/:id", get(token_handler))
        .route("/tokens/:id/commit", post(commit_handler))
        .route("/tokens/:id/upvote", post(upvote_handler))
        .route(
            "/tokens/:id/comments",
            get(comments_handler).post(add_comment_handler),
        )
        .route("/migrated/:id/buy", post(buy_handler))
        .route("/migrated/:id/sell", post(sell_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The market refused the operation.
    Market(MarketError),
    /// The request body or query did not parse.
    BadRequest(String),
}

/// `{"error": {"kind": "...", "message": "..."}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Market(err) => match err {
                MarketError::MissingField(_)
                | MarketError::MissingWallet
                | MarketError::InvalidAmount { .. }
                | MarketError::InvalidCurveParams { .. } => StatusCode::BAD_REQUEST,
                MarketError::NotFound(_) | MarketError::NotMigrated(_) => StatusCode::NOT_FOUND,
                MarketError::DuplicateTicker(_)
                | MarketError::AlreadyCommitted { .. }
                | MarketError::AlreadyUpvoted { .. } => StatusCode::CONFLICT,
                MarketError::InsufficientBalance { .. }
                | MarketError::InsufficientSupply { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                MarketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn detail(&self) -> ErrorDetail {
        match self {
            ApiError::BadRequest(message) => ErrorDetail {
                kind: "INVALID_REQUEST".into(),
                message: message.clone(),
            },
            ApiError::Market(err) => ErrorDetail {
                kind: err.kind().as_str().into(),
                message: err.to_string(),
            },
        }
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        ApiError::Market(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.detail(),
        };
        (self.status(), Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /tokens/:id/commit`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitRequest {
    #[serde(default)]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Body of `POST /tokens/:id/upvote`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpvoteRequest {
    #[serde(default)]
    pub wallet_id: Option<String>,
}

/// Body of `POST /migrated/:id/buy` and `/sell`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradeRequest {
    #[serde(default)]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub sol_amount: Option<f64>,
}

/// Body of `POST /tokens/:id/comments`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendingQuery {
    pub limit: Option<usize>,
}

/// A token plus the figures derived from its curve.
#[derive(Debug, Serialize)]
pub struct TokenView {
    #[serde(flatten)]
    pub token: Token,
    pub phase: Phase,
    /// `None` when the curve cannot be evaluated at the current supply.
    pub spot_price: Option<f64>,
    pub market_cap: Option<f64>,
    /// Percent of the funding target reached, in `[0, 100]`.
    pub funding_progress: f64,
}

impl From<Token> for TokenView {
    fn from(token: Token) -> Self {
        Self {
            phase: token.phase(),
            spot_price: token.spot_price().ok(),
            market_cap: token.market_cap().ok(),
            funding_progress: token.funding_progress(),
            token,
        }
    }
}

fn views(tokens: Vec<Token>) -> Vec<TokenView> {
    tokens.into_iter().map(TokenView::from).collect()
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub token: TokenView,
    pub migrated_now: bool,
}

#[derive(Debug, Serialize)]
pub struct TradeResponse {
    pub token: TokenView,
    pub side: TradeSide,
    pub amount: f64,
    pub value: f64,
    pub balance: f64,
}

impl From<TradeReceipt> for TradeResponse {
    fn from(receipt: TradeReceipt) -> Self {
        Self {
            side: receipt.side,
            amount: receipt.amount,
            value: receipt.value,
            balance: receipt.balance,
            token: receipt.token.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "tokens": state.market.token_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /balance`
async fn balance_handler(State(state): State<AppState>) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        balance: state.market.balance(),
    })
}

/// `GET /tokens`
async fn list_tokens_handler(State(state): State<AppState>) -> Json<Vec<TokenView>> {
    Json(views(state.market.list_all()))
}

/// `POST /tokens`
async fn create_token_handler(
    State(state): State<AppState>,
    body: Result<Json<NewToken>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TokenView>)> {
    let Json(request) = body?;
    let token = state.mutate(
        "create_token",
        |m| m.create_token(request),
        |token| vec![MarketEvent::token_created(token)],
    )?;

    state.metrics.tokens_created_total.inc();
    Ok((StatusCode::CREATED, Json(token.into())))
}

/// `GET /tokens/trending?limit=N`
async fn trending_handler(
    State(state): State<AppState>,
    query: Result<Query<TrendingQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TokenView>>> {
    let Query(query) = query?;
    Ok(Json(views(state.market.list_trending(query.limit))))
}

/// `GET /tokens/migrated`
async fn migrated_handler(State(state): State<AppState>) -> Json<Vec<TokenView>> {
    Json(views(state.market.list_migrated()))
}

/// `GET /tokens/:id`. Each successful read counts as a view.
async fn token_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TokenView>> {
    let token = state.run("record_view", |m| m.record_view(&id))?;
    Ok(Json(token.into()))
}

/// `POST /tokens/:id/commit`
///
/// An absent amount is passed through as NaN so it fails the preset check
/// after the wallet check, like any other bad amount.
async fn commit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CommitRequest>, JsonRejection>,
) -> ApiResult<Json<CommitResponse>> {
    let Json(request) = body?;
    let wallet = request.wallet_id.unwrap_or_default();
    let amount = request.amount.unwrap_or(f64::NAN);

    let receipt = state.mutate(
        "commit",
        |m| m.commit(&id, &wallet, amount),
        |receipt| MarketEvent::from_commit(wallet.trim(), receipt),
    )?;

    state.metrics.commits_total.inc();
    if receipt.migrated_now {
        state.metrics.migrations_total.inc();
    }
    Ok(Json(CommitResponse {
        migrated_now: receipt.migrated_now,
        token: receipt.token.into(),
    }))
}

/// `POST /tokens/:id/upvote`
async fn upvote_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpvoteRequest>, JsonRejection>,
) -> ApiResult<Json<TokenView>> {
    let Json(request) = body?;
    let wallet = request.wallet_id.unwrap_or_default();

    let token = state.mutate(
        "upvote",
        |m| m.upvote(&id, &wallet),
        |token| vec![MarketEvent::upvoted(wallet.trim(), token)],
    )?;

    state.metrics.upvotes_total.inc();
    Ok(Json(token.into()))
}

/// `GET /tokens/:id/comments`
async fn comments_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    let comments = state.run("comments", |m| m.comments(&id))?;
    Ok(Json(comments))
}

/// `POST /tokens/:id/comments`
async fn add_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Json(request) = body?;
    let author = request.author.unwrap_or_default();
    let text = request.text.unwrap_or_default();

    let comment = state.mutate(
        "add_comment",
        |m| m.add_comment(&id, &author, &text),
        |comment| vec![MarketEvent::commented(&id, comment)],
    )?;

    state.metrics.comments_total.inc();
    Ok((StatusCode::CREATED, Json(comment)))
}

/// `POST /migrated/:id/buy`
async fn buy_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> ApiResult<Json<TradeResponse>> {
    trade(state, id, TradeSide::Buy, body?.0)
}

/// `POST /migrated/:id/sell`
async fn sell_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> ApiResult<Json<TradeResponse>> {
    trade(state, id, TradeSide::Sell, body?.0)
}

fn trade(
    state: AppState,
    id: String,
    side: TradeSide,
    request: TradeRequest,
) -> ApiResult<Json<TradeResponse>> {
    let wallet = request.wallet_id.unwrap_or_default();
    let amount = request.sol_amount.unwrap_or(f64::NAN);

    let traded = |receipt: &TradeReceipt| vec![MarketEvent::from(receipt)];
    let receipt = match side {
        TradeSide::Buy => state.mutate(
            "buy_migrated",
            |m| m.buy_migrated(&id, &wallet, amount),
            traded,
        )?,
        TradeSide::Sell => state.mutate(
            "sell_migrated",
            |m| m.sell_migrated(&id, &wallet, amount),
            traded,
        )?,
    };

    let label = side.to_string();
    state
        .metrics
        .trades_total
        .with_label_values(&[label.as_str()])
        .inc();
    Ok(Json(receipt.into()))
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `GET /ws`: upgrades and streams [`MarketEvent`]s as JSON text frames.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_events(socket, state.event_tx.subscribe()))
}

async fn stream_events(mut socket: WebSocket, mut rx: broadcast::Receiver<MarketEvent>) {
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to serialize market event");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "websocket subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // Push-only feed; client frames are read and dropped.
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}
