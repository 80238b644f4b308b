//! HTTP Basic-auth session extractor.
//!
//! The username is the user's cnet. A request without an `Authorization`
//! header is a guest; one with a header that does not check out is rejected.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use coursebid_core::{
  actor::{Actor, RequestContext},
  store::CourseStore,
};
use rand_core::OsRng;

use crate::{AppState, error::Error};

/// The per-request context, resolved from credentials.
pub struct Session(pub RequestContext);

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Split a `Basic` header into `(cnet, password)`.
fn credentials(value: &str) -> Result<(String, String), Error> {
  let encoded = value.strip_prefix("Basic ").ok_or(Error::Unauthorized)?;
  let decoded = B64.decode(encoded.trim()).map_err(|_| Error::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;
  let (cnet, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok((cnet.to_owned(), password.to_owned()))
}

/// Resolve the acting party from request headers.
pub async fn authenticate<S: CourseStore>(headers: &HeaderMap, store: &S) -> Result<Actor, Error> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(Actor::Guest);
  };
  let value = value.to_str().map_err(|_| Error::Unauthorized)?;
  let (cnet, password) = credentials(value)?;

  let user = store
    .find_user_by_cnet(&cnet)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Actor::from(user))
}

impl<S> FromRequestParts<AppState<S>> for Session
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let actor = authenticate(&parts.headers, state.store.as_ref()).await?;
    Ok(Session(RequestContext::new(actor, Utc::now())))
  }
}
