//! User accounts, password and Google log in, and the bearer token guard for
//! protected routes.

mod google;
mod log_in;
mod middleware;
mod password;
mod sign_up;
mod token;
mod user;

pub use google::{
    GoogleOAuth, OAuthConfig, create_oauth_state_table, get_google_log_in, google_callback,
};
pub use log_in::log_in;
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use sign_up::sign_up;
pub use token::{JwtKeys, encode_token};
pub use user::{User, UserID, create_user_table};

#[cfg(test)]
pub use user::{NewUser, create_user};
