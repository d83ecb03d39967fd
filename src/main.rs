//! Lodge administration backend
//!
//! REST backend with SQLite persistence for brothers, finances, positions,
//! agenda, attendance, minutes, documents and the public contact form.

mod agenda;
mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod errors;
mod finance;
mod models;
mod notify;
mod reports;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use notify::Notifier;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub notifier: Arc<Notifier>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting lodge backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (LODGE_API_PSK). Authentication is disabled!");
    }
    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let notifier = Arc::new(Notifier::new(
        config.notify_url.clone(),
        config.notify_timeout,
    ));
    if !notifier.is_enabled() {
        tracing::info!("No LODGE_NOTIFY_URL set, contact replies will not be e-mailed");
    }

    let state = AppState {
        repo,
        notifier,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    let api_routes = Router::new()
        // Brothers
        .route("/brothers", get(api::list_brothers).post(api::create_brother))
        .route(
            "/brothers/{id}",
            get(api::get_brother)
                .put(api::update_brother)
                .delete(api::delete_brother),
        )
        // Finance
        .route(
            "/finance/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route("/finance/categories/{id}", delete(api::delete_category))
        .route(
            "/finance/accounts",
            get(api::list_bank_accounts).post(api::create_bank_account),
        )
        .route(
            "/finance/accounts/{id}",
            get(api::get_bank_account)
                .put(api::update_bank_account)
                .delete(api::delete_bank_account),
        )
        .route(
            "/finance/transactions",
            get(api::list_transactions).post(api::create_transaction),
        )
        .route(
            "/finance/transactions/{id}",
            get(api::get_transaction)
                .put(api::update_transaction)
                .delete(api::delete_transaction),
        )
        .route(
            "/finance/budgets",
            get(api::list_budgets).post(api::create_budget),
        )
        .route(
            "/finance/budgets/{id}",
            get(api::get_budget)
                .put(api::update_budget)
                .delete(api::delete_budget),
        )
        .route("/finance/goals", get(api::list_goals).post(api::create_goal))
        .route(
            "/finance/goals/{id}",
            get(api::get_goal)
                .put(api::update_goal)
                .delete(api::delete_goal),
        )
        // Positions
        .route(
            "/positions",
            get(api::list_positions).post(api::assign_position),
        )
        .route("/positions/history", get(api::list_position_history))
        .route("/positions/{position_type}", delete(api::remove_position))
        // Agenda
        .route("/events", get(api::list_events).post(api::create_event))
        .route("/events/conflicts", get(api::check_conflicts))
        .route(
            "/events/{id}",
            get(api::get_event)
                .put(api::update_event)
                .delete(api::delete_event),
        )
        // Sessions and attendance
        .route("/sessions", get(api::list_sessions).post(api::create_session))
        .route("/sessions/{id}", get(api::get_session))
        .route("/sessions/{id}/finalize", post(api::finalize_session))
        .route(
            "/sessions/{id}/attendance",
            get(api::list_session_attendance).post(api::record_attendance),
        )
        .route("/attendance", get(api::list_attendance))
        .route("/attendance/frequency", get(api::attendance_frequency))
        .route("/attendance/{id}", put(api::update_attendance))
        // Minutes
        .route("/minutes", get(api::list_minutes).post(api::create_minutes))
        .route(
            "/minutes/{id}",
            get(api::get_minutes)
                .put(api::update_minutes)
                .delete(api::delete_minutes),
        )
        .route("/minutes/{id}/signatures", post(api::sign_minutes))
        // Documents
        .route(
            "/documents",
            get(api::list_documents).post(api::create_document),
        )
        .route(
            "/documents/{id}",
            get(api::get_document)
                .put(api::update_document)
                .delete(api::delete_document),
        )
        // Contact inbox
        .route("/contact/messages", get(api::list_contact_messages))
        .route(
            "/contact/messages/{id}",
            get(api::get_contact_message).delete(api::delete_contact_message),
        )
        .route(
            "/contact/messages/{id}/read",
            put(api::mark_contact_message_read),
        )
        .route(
            "/contact/messages/{id}/reply",
            post(api::reply_contact_message),
        )
        // Reports
        .route("/reports/finance", get(api::finance_report))
        .route("/reports/finance.csv", get(api::finance_csv))
        .route("/reports/brothers.csv", get(api::brothers_report_csv))
        .route("/reports/attendance.csv", get(api::attendance_report_csv))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/contact", post(api::create_contact_message));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
