//! Authentication extractor
//!
//! Verifies the identity token in the Authorization header and yields the
//! [`Actor`] it carries.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use grace_core::Actor;

use crate::response::ApiError;
use crate::state::AppState;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub actor: Actor,
}

impl AuthUser {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn user_id(&self) -> &str {
        &self.actor.user_id
    }
}

fn verify(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let actor = state.verifier().verify(token).map_err(|e| {
        tracing::warn!(error = %e, "Rejected identity token");
        ApiError::App(e)
    })?;
    Ok(AuthUser::new(actor))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::MissingAuth)?;

        verify(&AppState::from_ref(state), bearer.token())
    }
}

/// Optional authenticated caller
///
/// `None` when the Authorization header is missing or its token fails
/// verification. Routes taking this extractor answer anonymous callers
/// instead of rejecting them.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(AuthUser::user_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await;
        let user = match header {
            Ok(TypedHeader(Authorization(bearer))) => {
                verify(&AppState::from_ref(state), bearer.token()).ok()
            }
            Err(_) => None,
        };
        Ok(Self(user))
    }
}
