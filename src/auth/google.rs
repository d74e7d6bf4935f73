//! Log in with a Google account.
//!
//! Implements the OAuth 2.0 authorization code flow with PKCE:
//!
//! 1. [get_google_log_in] redirects the browser to Google's consent page and
//!    stores the CSRF state with its PKCE verifier in the `oauth_state` table.
//! 2. [google_callback] consumes the stored state, exchanges the code for an
//!    access token, fetches the Google profile, links it to a local user and
//!    redirects to the single-page app with a bearer token in the query string.
//!
//! Failures during the callback send the browser back to the app's log-in
//! page with `error=auth_failed` instead of returning an error body.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
    basic::BasicClient,
};
use rusqlite::{Connection, OptionalExtension};
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{
        JwtKeys, User,
        token::encode_token,
        user::{NewUser, create_user, get_user_by_email, get_user_by_google_id, set_google_id},
    },
};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// How long the user has to complete the consent screen.
const OAUTH_STATE_LIFETIME: Duration = Duration::minutes(10);

/// OAuth client configuration for one provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
}

impl OAuthConfig {
    /// Configure the Google endpoints for the given client credentials.
    ///
    /// `redirect_url` must be the absolute URL of this server's Google
    /// callback route, exactly as registered with Google.
    ///
    /// # Errors
    ///
    /// Returns [Error::OAuth] if `redirect_url` is not a valid URL.
    pub fn google(
        client_id: String,
        client_secret: String,
        redirect_url: &str,
    ) -> Result<Self, Error> {
        let to_error = |error: oauth2::url::ParseError| Error::OAuth(error.to_string());

        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            auth_url: AuthUrl::new(GOOGLE_AUTH_URL.to_owned()).map_err(to_error)?,
            token_url: TokenUrl::new(GOOGLE_TOKEN_URL.to_owned()).map_err(to_error)?,
            redirect_url: RedirectUrl::new(redirect_url.to_owned()).map_err(to_error)?,
        })
    }
}

/// OAuth client type with the auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// The profile fields read from Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Google's stable ID for the account.
    pub id: String,
    /// The account's primary email address.
    pub email: String,
    /// The account's display name, if shared.
    #[serde(default)]
    pub name: Option<String>,
}

/// The Google OAuth client.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    config: OAuthConfig,
}

impl GoogleOAuth {
    /// Create a Google OAuth client from `config`.
    pub fn new(config: OAuthConfig) -> Self {
        Self { config }
    }

    fn create_client(&self) -> ConfiguredClient {
        BasicClient::new(self.config.client_id.clone())
            .set_client_secret(self.config.client_secret.clone())
            .set_auth_uri(self.config.auth_url.clone())
            .set_token_uri(self.config.token_url.clone())
            .set_redirect_uri(self.config.redirect_url.clone())
    }

    /// Build the URL of Google's consent page.
    ///
    /// Returns the URL together with the CSRF state and the PKCE verifier
    /// that must be kept until the callback.
    fn authorize_url(&self) -> (String, String, String) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .create_client()
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_owned()))
            .add_scope(Scope::new("email".to_owned()))
            .add_scope(Scope::new("profile".to_owned()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        (
            auth_url.to_string(),
            csrf_state.secret().clone(),
            pkce_verifier.secret().clone(),
        )
    }

    /// Exchange an authorization code for an access token and fetch the
    /// profile of the Google account that granted it.
    async fn fetch_profile(
        &self,
        code: String,
        pkce_verifier: String,
    ) -> Result<GoogleProfile, Error> {
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|error| Error::OAuth(error.to_string()))?;

        let token = self
            .create_client()
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&http_client)
            .await
            .map_err(|error| Error::OAuth(format!("token exchange failed: {error}")))?;

        http_client
            .get(GOOGLE_USER_INFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| Error::OAuth(error.to_string()))?
            .json::<GoogleProfile>()
            .await
            .map_err(|error| Error::OAuth(error.to_string()))
    }
}

/// Create the table that holds pending OAuth handshakes.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_oauth_state_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS oauth_state (
                state TEXT PRIMARY KEY,
                pkce_verifier TEXT NOT NULL,
                expires_at INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Remember `state` and its PKCE verifier until `expires_at`.
///
/// Handshakes that have already expired are purged at the same time.
fn store_oauth_state(
    state: &str,
    pkce_verifier: &str,
    expires_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM oauth_state WHERE expires_at <= ?1",
        (OffsetDateTime::now_utc().unix_timestamp(),),
    )?;
    connection.execute(
        "INSERT INTO oauth_state (state, pkce_verifier, expires_at) VALUES (?1, ?2, ?3)",
        (state, pkce_verifier, expires_at.unix_timestamp()),
    )?;

    Ok(())
}

/// Remove `state` and return its PKCE verifier if it has not expired by `now`.
///
/// A state can be taken at most once.
fn take_oauth_state(
    state: &str,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Option<String>, Error> {
    connection
        .query_row(
            "DELETE FROM oauth_state WHERE state = ?1 AND expires_at > ?2 RETURNING pkce_verifier",
            (state, now.unix_timestamp()),
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
}

/// Find the local user for a Google account, creating or linking one if needed.
///
/// Users are matched on the Google account ID first. Failing that, an
/// existing user with the same email address gets the Google account linked
/// to it. Otherwise a new user without a password is created.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn find_or_create_google_user(
    profile: &GoogleProfile,
    connection: &Connection,
) -> Result<User, Error> {
    if let Some(user) = get_user_by_google_id(&profile.id, connection)? {
        return Ok(user);
    }

    if let Some(mut user) = get_user_by_email(&profile.email, connection)? {
        set_google_id(user.id, &profile.id, connection)?;
        tracing::info!("Linked Google account to user {}", user.id);
        user.google_id = Some(profile.id.clone());
        return Ok(user);
    }

    let name = profile
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| {
            profile
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_owned()
        });

    let user = create_user(
        NewUser {
            name,
            email: profile.email.clone(),
            password_hash: None,
            google_id: Some(profile.id.clone()),
        },
        connection,
    )?;
    tracing::info!("Registered user {} through Google", user.id);

    Ok(user)
}

/// The state needed for the Google log-in routes.
#[derive(Debug, Clone)]
pub struct GoogleState {
    /// The Google client, if configured.
    pub google_oauth: Option<GoogleOAuth>,
    /// The base URL of the single-page app to redirect back to.
    pub frontend_url: String,
    /// The keys for signing issued tokens.
    pub jwt_keys: JwtKeys,
    /// How long issued tokens stay valid.
    pub token_duration: Duration,
    /// The database connection for users and pending handshakes.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoogleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            google_oauth: state.google_oauth.clone(),
            frontend_url: state.frontend_url.clone(),
            jwt_keys: state.jwt_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Redirect the browser to Google's consent page.
///
/// Responds with 404 if Google log in is not configured.
pub async fn get_google_log_in(State(state): State<GoogleState>) -> Response {
    let Some(google_oauth) = state.google_oauth else {
        return Error::FederatedLoginDisabled.into_response();
    };

    let (auth_url, csrf_state, pkce_verifier) = google_oauth.authorize_url();
    let expires_at = OffsetDateTime::now_utc() + OAUTH_STATE_LIFETIME;

    let stored = match state.db_connection.lock() {
        Ok(connection) => store_oauth_state(&csrf_state, &pkce_verifier, expires_at, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    match stored {
        Ok(()) => Redirect::to(&auth_url).into_response(),
        Err(error) => error.into_response(),
    }
}

/// The query parameters Google sends to the callback.
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Complete the Google log in and redirect to the single-page app.
///
/// On success the browser lands on `{frontend}/dashboard?token=<token>`,
/// otherwise on `{frontend}/login?error=auth_failed`.
pub async fn google_callback(
    State(state): State<GoogleState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Response {
    let Some(google_oauth) = state.google_oauth.as_ref() else {
        return Error::FederatedLoginDisabled.into_response();
    };

    match complete_google_log_in(google_oauth, &state, query).await {
        Ok(token) => {
            Redirect::to(&format!("{}/dashboard?token={token}", state.frontend_url))
                .into_response()
        }
        Err(error) => {
            tracing::warn!("Google log in failed: {error}");
            Redirect::to(&format!("{}/login?error=auth_failed", state.frontend_url))
                .into_response()
        }
    }
}

async fn complete_google_log_in(
    google_oauth: &GoogleOAuth,
    state: &GoogleState,
    query: GoogleCallbackQuery,
) -> Result<String, Error> {
    if let Some(error) = query.error {
        return Err(Error::OAuth(format!("consent was not granted: {error}")));
    }

    let code = query.code.ok_or(Error::MissingField("code"))?;
    let csrf_state = query.state.ok_or(Error::MissingField("state"))?;

    let pkce_verifier = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        take_oauth_state(&csrf_state, OffsetDateTime::now_utc(), &connection)?
    }
    .ok_or_else(|| Error::OAuth("invalid or expired OAuth state".to_owned()))?;

    let profile = google_oauth.fetch_profile(code, pkce_verifier).await?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        find_or_create_google_user(&profile, &connection)?
    };

    encode_token(user.id, state.token_duration, &state.jwt_keys)
}
