use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use chrono::Duration as ChronoDuration;
use domain::memory::{InMemoryPartnerStore, InMemoryRegistrationStore, InMemoryVisitLog};
use domain::ports::{PartnerStore, RegistrationStore, VisitMetricsSource};
use domain::services::{
    Clock, IntakeOptions, PartnerIntake, RateLimitPolicy, RateLimiter, RegistrationIntake,
    StatsService, SystemClock,
};
use persistence::repositories::{PgPartnerRepository, PgRegistrationRepository, PgVisitRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, MAX_RATE_LIMIT_WINDOW_SECS};
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin_key, security_headers_middleware,
    trace_id,
};
use crate::routes::{health, partners, registrations, visits};

/// Backing stores selected at startup.
#[derive(Clone)]
pub struct Stores {
    pub registrations: Arc<dyn RegistrationStore>,
    pub partners: Arc<dyn PartnerStore>,
    pub visits: Arc<dyn VisitMetricsSource>,
    /// Present when running against PostgreSQL.
    pub pool: Option<PgPool>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            registrations: Arc::new(PgRegistrationRepository::new(pool.clone())),
            partners: Arc::new(PgPartnerRepository::new(pool.clone())),
            visits: Arc::new(PgVisitRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            registrations: Arc::new(InMemoryRegistrationStore::with_clock(clock.clone())),
            partners: Arc::new(InMemoryPartnerStore::with_clock(clock.clone())),
            visits: Arc::new(InMemoryVisitLog::with_clock(clock)),
            pool: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "in_memory"
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub rate_limiter: Arc<RateLimiter>,
    pub registration_intake: RegistrationIntake,
    pub partner_intake: PartnerIntake,
    pub stats: StatsService,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, clock: Arc<dyn Clock>) -> Self {
        let window_secs = config.rate_limit.window_secs.min(MAX_RATE_LIMIT_WINDOW_SECS);
        let policy = RateLimitPolicy::new(
            config.rate_limit.max_requests,
            ChronoDuration::seconds(window_secs as i64),
        )
        .with_max_tracked_clients(config.rate_limit.max_tracked_clients);
        let rate_limiter = Arc::new(RateLimiter::new(policy, clock.clone()));

        let registration_intake = RegistrationIntake::new(
            stores.registrations.clone(),
            rate_limiter.clone(),
            IntakeOptions {
                strict_group_type: config.registration.strict_group_type,
            },
        );
        let partner_intake = PartnerIntake::new(stores.partners.clone(), rate_limiter.clone());

        let visits = config
            .stats
            .visit_stats_enabled
            .then(|| stores.visits.clone());
        let stats = StatsService::new(stores.registrations.clone(), visits, clock);

        Self {
            config: Arc::new(config),
            stores,
            rate_limiter,
            registration_intake,
            partner_intake,
            stats,
        }
    }
}

/// Builds the router with the wall clock.
pub fn create_app(config: Config, stores: Stores) -> Router {
    create_router(AppState::new(config, stores, Arc::new(SystemClock)))
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Moderation routes (shared admin key when configured)
    let admin_routes = Router::new()
        .route(
            "/api/v1/registrations/:id",
            get(registrations::get_registration)
                .patch(registrations::update_registration)
                .delete(registrations::delete_registration),
        )
        .route(
            "/api/v1/partners/:id",
            get(partners::get_partner)
                .patch(partners::update_partner)
                .delete(partners::delete_partner),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_key,
        ));

    // Public routes. The list handlers check the admin key themselves,
    // since `?stats=true` stays public.
    let public_routes = Router::new()
        .route(
            "/api/v1/registrations",
            post(registrations::create_registration).get(registrations::list_registrations),
        )
        .route(
            "/api/v1/partners",
            post(partners::create_partner).get(partners::list_partners),
        )
        .route("/api/v1/visits", post(visits::record_visit))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
