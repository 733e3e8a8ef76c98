use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    extract::State,
    extract::connect_info::ConnectInfo,
    http::Method,
    http::Request,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use mp_common::embedding::{EMBEDDING_DIMENSION, EmbeddingGenerator, create_generator};
use mp_common::geo::{CachedDistance, GazetteerDistance};
use mp_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use mp_common::matching::{MatchScorer, MatchingConfig, MatchingEngine};
use mp_common::run_id;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod auth;
pub mod error;
pub mod handlers;

use auth::{API_KEY_HEADER, AuthConfig, AuthMode};
use error::ApiError;
use handlers::{embeddings, health, matches};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const REQUEST_BODY_LIMIT: usize = 1024 * 1024;
const MAX_EMBEDDING_DIMENSION: usize = 8192;
const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Parser)]
#[command(name = "mp-api", about = "HTTP API for Match&Play athlete/club matching")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3002)]
    port: u16,

    /// API key for X-API-Key authentication
    #[arg(long, env = "MP_API_KEY")]
    api_key: Option<String>,

    /// Authentication mode: none | api_key
    #[arg(long, env = "AUTH_MODE", default_value = "none", value_enum)]
    auth_mode: AuthMode,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "MP_CORS_ORIGINS", default_value = "http://localhost:8080")]
    cors_origins: String,

    /// Width of generated embedding vectors
    #[arg(long, env = "MP_EMBEDDING_DIMENSION", default_value_t = EMBEDDING_DIMENSION)]
    embedding_dimension: usize,

    /// Embedding generator name
    #[arg(long, env = "MP_EMBEDDING_GENERATOR", default_value = "hash")]
    embedding_generator: String,

    /// Ranking requests replenished per second, per client IP
    #[arg(long, env = "MP_RATE_LIMIT_RANK_PER_SEC", default_value_t = 5)]
    rank_rate_per_sec: u32,

    /// Ranking requests a client IP may burst before being throttled
    #[arg(long, env = "MP_RATE_LIMIT_RANK_BURST", default_value_t = 10)]
    rank_rate_burst: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_sec: 5,
            burst: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub embedding_dimension: usize,
    pub embedding_generator: String,
    pub rank_rate_limit: RateLimitConfig,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "MP_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        let auth = AuthConfig {
            mode: cli.auth_mode,
            api_key: cli.api_key.filter(|key| !key.trim().is_empty()),
        };

        if auth.mode == AuthMode::ApiKey && auth.api_key.is_none() {
            return Err(ApiError::BadRequest(
                "MP_API_KEY is required when AUTH_MODE=api_key".into(),
            ));
        }

        if !(1..=MAX_EMBEDDING_DIMENSION).contains(&cli.embedding_dimension) {
            return Err(ApiError::BadRequest(format!(
                "MP_EMBEDDING_DIMENSION must be between 1 and {MAX_EMBEDDING_DIMENSION}"
            )));
        }

        if cli.rank_rate_per_sec == 0 || cli.rank_rate_burst == 0 {
            return Err(ApiError::BadRequest(
                "MP_RATE_LIMIT_RANK_PER_SEC and MP_RATE_LIMIT_RANK_BURST must be positive".into(),
            ));
        }

        Ok(Self {
            port: cli.port,
            cors_origins,
            auth,
            embedding_dimension: cli.embedding_dimension,
            embedding_generator: cli.embedding_generator,
            rank_rate_limit: RateLimitConfig {
                per_sec: cli.rank_rate_per_sec,
                burst: cli.rank_rate_burst,
            },
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            port: 3002,
            cors_origins: vec!["http://localhost:8080".into()],
            auth,
            embedding_dimension: EMBEDDING_DIMENSION,
            embedding_generator: "hash".into(),
            rank_rate_limit: RateLimitConfig::default(),
        }
    }
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

fn build_ip_limiter(limits: RateLimitConfig) -> Arc<IpRateLimiter> {
    let per_second = NonZeroU32::new(limits.per_sec).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(limits.burst).unwrap_or(NonZeroU32::MIN);

    Arc::new(RateLimiter::keyed(
        Quota::per_second(per_second).allow_burst(burst),
    ))
}

#[derive(Clone)]
pub struct AppState {
    pub engine: MatchingEngine,
    pub embedder: Arc<dyn EmbeddingGenerator>,
    pub config: AppConfig,
    pub readiness: Arc<AtomicBool>,
    rank_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, matching: MatchingConfig) -> Self {
        let distance = Arc::new(CachedDistance::new(GazetteerDistance::default()));
        let embedder = create_generator(&config.embedding_generator, config.embedding_dimension);
        let rank_limiter = build_ip_limiter(config.rank_rate_limit);

        Self {
            engine: MatchingEngine::new(MatchScorer::new(matching, distance)),
            embedder,
            config,
            readiness: Arc::new(AtomicBool::new(true)),
            rank_limiter,
        }
    }
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

/// Request ids are ULIDs, like match run ids, so both sort by time.
#[derive(Debug, Clone, Copy, Default)]
struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&run_id::generate())
            .ok()
            .map(RequestId::new)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

/// Requests without a peer address (in-process callers) are never limited.
fn enforce_rate_limit(limiter: &IpRateLimiter, ip: Option<IpAddr>) -> Result<(), ApiError> {
    if let Some(client_ip) = ip {
        if limiter.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests(format!(
                "ranking rate limit exceeded for {client_ip}"
            )));
        }
    }

    Ok(())
}

async fn rank_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rank_limiter, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    error::with_request_id(request_id, next.run(req)).await
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let api_routes = Router::new()
        .route("/matches/score", post(matches::score_pair))
        .route(
            "/matches/rank-clubs",
            post(matches::rank_clubs).route_layer(middleware::from_fn_with_state(
                state.clone(),
                rank_rate_limit,
            )),
        )
        .route(
            "/matches/rank-athletes",
            post(matches::rank_athletes).route_layer(middleware::from_fn_with_state(
                state.clone(),
                rank_rate_limit,
            )),
        )
        .route("/embeddings", post(embeddings::generate_embedding));

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUlid))
        .layer(cors)
        .with_state(state)
}

/// State with API-key auth, default scoring and the offline embedder.
pub fn test_state(api_key: &str) -> SharedState {
    let auth = AuthConfig {
        mode: AuthMode::ApiKey,
        api_key: Some(api_key.to_string()),
    };

    Arc::new(AppState::new(
        AppConfig::for_tests(auth),
        MatchingConfig::default(),
    ))
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    let state = Arc::new(AppState::new(config.clone(), MatchingConfig::from_env()));

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        auth_mode = ?config.auth.mode,
        embedder = state.embedder.name(),
        run_id = run_id::get(),
        "mp-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);
    info!("shutdown requested; draining");

    // Lets load balancers see /readyz fail before the listener closes.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}
