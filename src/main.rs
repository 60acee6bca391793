use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{error_handling::HandleErrorLayer, http::StatusCode};
use tower::{BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

use consultation_scheduler::{
    create_router,
    notifier::{NoopNotifier, NotificationDispatcher, WebhookNotifier},
    services::booking::BookingCoordinator,
    services::directory::ConsultantDirectory,
    services::storage::create_appointment_store,
    AppState, SchedulingConfig,
};

// Error handler
async fn handle_error(error: BoxError) -> (StatusCode, String) {
    if error.is::<tokio::time::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            "Request took too long".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", error),
        )
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load the consultant directory snapshot
    let directory_path = env::var("CONSULTANT_DIRECTORY_PATH")
        .expect("CONSULTANT_DIRECTORY_PATH must be set in environment");
    let directory = Arc::new(
        ConsultantDirectory::load(&directory_path).expect("Failed to load consultant directory"),
    );

    // Initialize the appointment store
    let store = create_appointment_store();
    info!("Appointment store initialized");

    // Scheduling policy from environment with defaults
    let config = SchedulingConfig::from_env();

    // Notification dispatch is optional; without an endpoint events are
    // logged and dropped
    let notifier: Arc<dyn NotificationDispatcher> = match WebhookNotifier::from_env() {
        Some(notifier) => {
            info!("Notification webhook dispatch enabled");
            Arc::new(notifier)
        }
        None => {
            info!("No notification endpoint configured - events will be dropped");
            Arc::new(NoopNotifier)
        }
    };

    // Check if running in production mode
    let is_production = env::var("ENVIRONMENT")
        .map(|val| val.to_lowercase() == "production")
        .unwrap_or(false);

    if is_production {
        info!("Running in PRODUCTION mode - restricting available endpoints");
    } else {
        info!("Running in DEVELOPMENT mode - all endpoints will be available");
    }

    let coordinator =
        BookingCoordinator::new(store, Arc::clone(&directory), notifier, config);

    // Create shared application state
    let app_state = Arc::new(AppState {
        coordinator,
        directory,
    });

    // Create router with appropriate routes based on environment
    let app = create_router(app_state, is_production).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .load_shed()
            .concurrency_limit(64)
            .timeout(Duration::from_secs(10))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any)),
    );

    // Bind to port 3000
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Set up signal handler for graceful shutdown
    let shutdown = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received interrupt signal, starting graceful shutdown");
            },
            _ = terminate => {
                info!("Received terminate signal, starting graceful shutdown");
            },
        }
    };

    // Start server with graceful shutdown
    info!("Server is ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Failed to start server");

    info!("Server has been gracefully shut down");
}
