//! Amicale API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use amicale_application::{
    AccessService, AuthenticationProvider, MembershipService, PermissionCache, RoleAdminService,
};
use amicale_core::AppError;
use amicale_infrastructure::{
    ConsoleOtpProvider, NoopPermissionCache, PostgresAssociationRepository,
    PostgresAuditRepository, PostgresCatalogRepository, PostgresMembershipRepository,
    PostgresRoleRepository, RedisPermissionCache,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api_config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let permission_cache: Arc<dyn PermissionCache> = match &config.redis_url {
        Some(redis_url) => {
            let client = redis::Client::open(redis_url.as_str()).map_err(|error| {
                AppError::Validation(format!("invalid REDIS_URL: {error}"))
            })?;
            Arc::new(RedisPermissionCache::new(
                client,
                "amicale",
                config.permission_cache_ttl_seconds,
            ))
        }
        None => Arc::new(NoopPermissionCache::new()),
    };

    let association_repository = Arc::new(PostgresAssociationRepository::new(pool.clone()));
    let catalog_repository = Arc::new(PostgresCatalogRepository::new(pool.clone()));
    let role_repository = Arc::new(PostgresRoleRepository::new(pool.clone()));
    let membership_repository = Arc::new(PostgresMembershipRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));

    let access_service = AccessService::new(
        association_repository.clone(),
        membership_repository.clone(),
        role_repository.clone(),
        catalog_repository.clone(),
        permission_cache,
    );
    let role_admin_service = RoleAdminService::new(
        access_service.clone(),
        role_repository,
        membership_repository.clone(),
        catalog_repository,
        audit_repository.clone(),
    );
    let membership_service = MembershipService::new(
        access_service.clone(),
        association_repository,
        membership_repository,
        audit_repository,
    );

    let auth_provider: Arc<dyn AuthenticationProvider> = Arc::new(ConsoleOtpProvider::new());

    let app_state = AppState {
        access_service,
        role_admin_service,
        membership_service,
        auth_provider,
        frontend_url: config.frontend_url.clone(),
    };

    let protected_routes = Router::new()
        .route(
            "/api/v1/associations",
            post(handlers::associations::create_association_handler),
        )
        .route(
            "/api/v1/associations/{id}/join",
            post(handlers::associations::join_handler),
        )
        .route(
            "/api/v1/associations/{id}/members",
            get(handlers::associations::list_members_handler),
        )
        .route(
            "/api/v1/associations/{id}/members/{member_id}/review",
            post(handlers::associations::review_join_handler),
        )
        .route(
            "/api/v1/associations/{id}/members/{member_id}/exclude",
            post(handlers::associations::exclude_member_handler),
        )
        .route(
            "/api/v1/associations/{id}/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/v1/associations/{id}/roles/{role_id}",
            put(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/v1/associations/{id}/members/{member_id}/roles",
            get(handlers::members::member_roles_handler)
                .post(handlers::members::assign_roles_handler),
        )
        .route(
            "/api/v1/associations/{id}/members/{member_id}/roles/{role_id}",
            axum::routing::delete(handlers::members::remove_role_handler),
        )
        .route(
            "/api/v1/associations/{id}/members/{member_id}/permissions/grant",
            post(handlers::members::grant_permission_handler),
        )
        .route(
            "/api/v1/associations/{id}/members/{member_id}/permissions/revoke",
            post(handlers::members::revoke_permission_handler),
        )
        .route(
            "/api/v1/associations/{id}/permissions",
            get(handlers::permissions::list_catalog_handler),
        )
        .route(
            "/api/v1/associations/{id}/transfer-admin",
            post(handlers::members::transfer_admin_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/otp/request", post(auth::otp_request_handler))
        .route("/auth/otp/verify", post(auth::otp_verify_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&config.api_host).map_err(|error| {
        AppError::Internal(format!("invalid API_HOST '{}': {error}", config.api_host))
    })?;
    let address = SocketAddr::from((host, config.api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "amicale-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
