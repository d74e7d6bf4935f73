//! Issuing and verifying the signed bearer tokens that authenticate API requests.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The keys for signing and verifying tokens, derived from one shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create HMAC keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

/// The contents of a token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// When the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// When the token expires, in seconds since the Unix epoch.
    pub exp: i64,
}

/// Issue a token for `user_id` that is valid for `duration` from now.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the claims could not be signed.
pub fn encode_token(user_id: UserID, duration: Duration, keys: &JwtKeys) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        user_id,
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode_claims(&claims, keys)
}

pub(crate) fn encode_claims(claims: &Claims, keys: &JwtKeys) -> Result<String, Error> {
    encode(&Header::default(), claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, was signed with
/// another key, or has expired.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected token: {error}");
            Error::InvalidToken
        })
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        auth::{
            UserID,
            token::{Claims, JwtKeys, decode_token, encode_claims, encode_token},
        },
    };

    #[test]
    fn decode_gives_back_user_id() {
        let keys = JwtKeys::new("foobar");
        let token = encode_token(UserID::new(7), Duration::hours(1), &keys).unwrap();

        let claims = decode_token(&token, &keys).unwrap();

        assert_eq!(claims.user_id, UserID::new(7));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn decode_fails_with_wrong_key() {
        let token =
            encode_token(UserID::new(7), Duration::hours(1), &JwtKeys::new("foobar")).unwrap();

        let result = decode_token(&token, &JwtKeys::new("not-foobar"));

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn decode_fails_on_expired_token() {
        let keys = JwtKeys::new("foobar");
        let issued_at = OffsetDateTime::now_utc() - Duration::hours(2);
        let claims = Claims {
            user_id: UserID::new(7),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + Duration::hours(1)).unix_timestamp(),
        };
        let token = encode_claims(&claims, &keys).unwrap();

        assert_eq!(decode_token(&token, &keys), Err(Error::InvalidToken));
    }

    #[test]
    fn decode_fails_on_garbage() {
        let keys = JwtKeys::new("foobar");

        assert_eq!(decode_token("not.a.token", &keys), Err(Error::InvalidToken));
    }

    #[test]
    fn claims_use_camel_case() {
        let claims = Claims {
            user_id: UserID::new(1),
            iat: 10,
            exp: 20,
        };

        let json = serde_json::to_string(&claims).unwrap();

        assert_eq!(json, r#"{"userId":1,"iat":10,"exp":20}"#);
    }
}
