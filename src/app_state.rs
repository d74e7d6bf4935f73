//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{GoogleOAuth, JwtKeys},
    db::initialize,
};

/// How long a bearer token stays valid after it is issued.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(1);

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys for signing and verifying bearer tokens.
    pub jwt_keys: JwtKeys,

    /// The duration for which newly issued tokens are valid.
    pub token_duration: Duration,

    /// The Google OAuth client, if federated log in is configured.
    pub google_oauth: Option<GoogleOAuth>,

    /// The base URL of the single-page application, e.g. "http://localhost:5173".
    pub frontend_url: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        frontend_url: &str,
        google_oauth: Option<GoogleOAuth>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            google_oauth,
            frontend_url: frontend_url.trim_end_matches('/').to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Set how long newly issued tokens stay valid.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }
}
