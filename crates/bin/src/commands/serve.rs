//! Serve command - runs the Sealnote web server.

use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use tokio::signal::unix::{SignalKind, signal};
use tracing_subscriber::EnvFilter;

use sealnote::{
    backend::{Backend, InMemory, Sqlite},
    credential::CredentialManager,
    custody::{KeyCustodian, MasterKey},
    ratelimit::RateLimiter,
    service::{self, AppState},
    token::TokenService,
};

use crate::cli::{Backend as BackendKind, ServeArgs};

const DB_FILE: &str = "sealnote.db";

/// Run the Sealnote server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("sealnote=info".parse().unwrap()),
        )
        .init();

    // Secrets are validated up front; a short signing secret or a weak
    // master key refuses to start rather than serving with it.
    let tokens = Arc::new(TokenService::new(args.signing_secret.clone().into_bytes())?);
    let master_key = MasterKey::new(args.master_key.as_bytes())?;

    // Create the storage backend
    let (backend, backend_kind): (Arc<dyn Backend>, &'static str) = match args.backend {
        BackendKind::Sqlite => {
            let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            let path = data_dir.join(DB_FILE);
            tracing::info!("Opening SQLite database at {}", path.display());
            (Arc::new(Sqlite::connect(&path).await?), "sqlite")
        }
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; data will not survive restart");
            (Arc::new(InMemory::new()), "memory")
        }
    };

    let custodian = Arc::new(KeyCustodian::new(master_key, Arc::clone(&backend)));

    let limiter = Arc::new(RateLimiter::new(
        args.rate_limit,
        Duration::from_secs(args.rate_window),
    ));
    Arc::clone(&limiter).spawn_sweeper();

    let state = AppState {
        backend,
        credentials: Arc::new(CredentialManager::with_defaults()),
        tokens,
        custodian,
        limiter,
        backend_kind,
    };

    // Build router
    let app = service::router(state);

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    // Print startup message
    println!(
        "Sealnote server starting on http://localhost:{}",
        local_addr.port()
    );
    println!();
    println!("Available endpoints:");
    println!("  GET    /            - Service banner");
    println!("  GET    /health      - Health check");
    println!("  POST   /register    - Create an account (rate limited)");
    println!("  POST   /login       - Obtain a bearer token (rate limited)");
    println!("  POST   /notes       - Create an encrypted note");
    println!("  GET    /notes       - List decrypted notes");
    println!("  PUT    /notes/{{id}} - Update a note");
    println!("  DELETE /notes/{{id}} - Delete a note");
    println!();
    println!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to set up SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to set up SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
            _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
        }
    })
    .await?;

    println!("Server shut down");
    Ok(())
}
