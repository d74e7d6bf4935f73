use std::{error::Error, fs::OpenOptions, net::SocketAddr, path::PathBuf, process::ExitCode, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use expensync::{
    AppState, GoogleOAuth, OAuthConfig, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for ExpenSync.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    db_path: String,

    /// Directory holding an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The server speaks plain HTTP when this is not given.
    #[arg(long, env = "CERT_PATH")]
    cert_path: Option<PathBuf>,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// The secret used to sign bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// How many minutes a bearer token stays valid.
    #[arg(long, env = "TOKEN_DURATION_MINUTES", default_value_t = 60)]
    token_duration_minutes: i64,

    /// The origin of the web client, allowed through CORS and used for
    /// redirects after Google log in.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:5173")]
    frontend_url: String,

    /// The OAuth client ID issued by Google.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    google_client_id: Option<String>,

    /// The OAuth client secret issued by Google.
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    google_client_secret: Option<String>,

    /// Where Google sends the user after consent, e.g.
    /// "http://localhost:5000/api/auth/google/callback".
    #[arg(long, env = "GOOGLE_REDIRECT_URL")]
    google_redirect_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(error) = setup_logging() {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("Server stopped with an error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let google_oauth = match (args.google_client_id, args.google_client_secret) {
        (Some(client_id), Some(client_secret)) => {
            let redirect_url = args.google_redirect_url.unwrap_or_else(|| {
                format!("http://localhost:{}/api/auth/google/callback", args.port)
            });
            let config = OAuthConfig::google(client_id, client_secret, &redirect_url)?;

            Some(GoogleOAuth::new(config))
        }
        _ => {
            tracing::info!("Google client ID or secret not set, Google log in is disabled.");
            None
        }
    };

    let conn = Connection::open(&args.db_path)?;
    let app_state = AppState::new(conn, &args.jwt_secret, &args.frontend_url, google_oauth)?
        .with_token_duration(Duration::minutes(args.token_duration_minutes));

    let cors_layer = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&app_state.frontend_url)?)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(app_state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer);
    let router = add_tracing_layer(router);

    match args.cert_path {
        Some(cert_path) => {
            let tls_config =
                RustlsConfig::from_pem_file(cert_path.join("cert.pem"), cert_path.join("key.pem"))
                    .await?;

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await?;
        }
    }

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .try_init()?;

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
