//! Current user service
//!
//! Get the current user from the request based on the Authorization header

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::extract::OptionalFromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Error;
use crate::storage::Storage;
use crate::users::User;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims to identifies a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: Uuid,

    /// In how many seconds does the token expire
    exp: i64,

    /// A sessions ID, used to expire/invalidate tokens before the expiration date
    jti: Uuid,
}

/// Token information served to the user
#[derive(Debug, Serialize)]
pub struct Token {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)] // `type` is a reserved keyword
    token_type: String,

    /// In how many seconds does the token expire
    expires_in: i64,

    /// The access token to provide to follow up requests in the Authorization header
    #[allow(clippy::struct_field_names)] // `access_token` is the name of the field
    access_token: String,
}

impl Token {
    /// Create a new token response
    fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            token_type: "Bearer".to_string(),
            expires_in,
            access_token,
        }
    }
}

/// Current user service
pub struct CurrentUser<S: Storage> {
    /// The actual user
    user: Arc<User>,

    /// The storage flavor the user was loaded from
    _storage: PhantomData<S>,
}

impl<S: Storage> CurrentUser<S> {
    /// Create the current user from a user
    fn new(user: User) -> Self {
        Self {
            user: Arc::new(user),
            _storage: PhantomData,
        }
    }
}

impl<S: Storage> Clone for CurrentUser<S> {
    fn clone(&self) -> Self {
        Self {
            user: Arc::clone(&self.user),
            _storage: PhantomData,
        }
    }
}

impl<S: Storage> Deref for CurrentUser<S> {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// Generate a token for the outside world for a given user
pub fn generate_token(jwt_keys: &JwtKeys, user: &User) -> Result<Token, Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let expires_in = 3600; // valid for an hour
    let claims = Claims {
        sub: user.id,
        exp: chrono::Utc::now().timestamp() + expires_in,
        jti: user.session_id,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(Token::new(access_token, expires_in))
}

/// Verify a raw token and resolve it to a live user
///
/// Used for both the Authorization header and the WebSocket handshake;
/// a token from before the user's last session rotation is rejected
pub async fn verify_token<S: Storage>(
    jwt_keys: &JwtKeys,
    storage: &S,
    token: &str,
) -> Result<User, Error> {
    use jsonwebtoken::Validation;
    use jsonwebtoken::decode;

    let token_data = decode::<Claims>(token, &jwt_keys.decoding, &Validation::default())
        .map_err(|err| Error::forbidden(format!("Invalid token: {err}")))?;

    let claims = token_data.claims;

    let user = storage
        .find_single_user_by_id(&claims.sub)
        .await
        .map_err(|_| Error::forbidden("Could not find user"))?;

    if let Some(user) = user {
        // mechanism to invalidate JWT tokens
        if claims.jti != user.session_id {
            return Err(Error::forbidden("Token expired"));
        }

        Ok(user)
    } else {
        Err(Error::forbidden("Could not find user"))
    }
}

impl<B, S> FromRequestParts<B> for CurrentUser<S>
where
    B: Send + Sync,
    S: Storage,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        // Extract the token from the authorization header
        // fully qualified: `TypedHeader` also has an optional extractor impl
        let TypedHeader(Authorization(bearer)) =
            <TypedHeader<Authorization<Bearer>> as FromRequestParts<B>>::from_request_parts(
                parts, state,
            )
            .await
            .map_err(|_| Error::forbidden("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let Extension(storage) = parts
            .extract::<Extension<S>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get a storage pool"))?;

        let user = verify_token(&jwt_keys, &storage, bearer.token()).await?;

        Ok(CurrentUser::new(user))
    }
}

/// Optional variant for routes that are public but personalize when a
/// token is provided; a present-but-invalid token is still rejected
impl<B, S> OptionalFromRequestParts<B> for CurrentUser<S>
where
    B: Send + Sync,
    S: Storage,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &B,
    ) -> Result<Option<Self>, Self::Rejection> {
        if parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            <Self as FromRequestParts<B>>::from_request_parts(parts, state)
                .await
                .map(Some)
        } else {
            Ok(None)
        }
    }
}
