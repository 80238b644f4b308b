//! `POST /users`: admin registration of accounts.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use coursebid_core::{
  policy,
  store::CourseStore,
  user::{NewUser, Role},
  validation,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{Session, hash_password},
  error::{Error, Result},
  gate,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBody {
  pub cnet:            String,
  pub full_name:       String,
  pub email:           String,
  pub role:            Role,
  /// Only meaningful for students.
  #[serde(default)]
  pub course_requests: u32,
  pub password:        String,
}

/// `POST /users`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  policy::authorize_manage(&ctx.actor).map_err(|d| gate::denied(&ctx, "create user", d))?;
  validation::validate_user(&body.cnet, &body.full_name, &body.password)?;

  let password_hash =
    hash_password(&body.password).map_err(|e| Error::Store(e.to_string().into()))?;
  let course_requests = if body.role == Role::Student { body.course_requests } else { 0 };

  let user = state
    .store
    .add_user(NewUser {
      cnet: body.cnet.trim().to_owned(),
      full_name: body.full_name.trim().to_owned(),
      email: body.email.trim().to_owned(),
      role: body.role,
      course_requests,
      password_hash,
    })
    .await
    .map_err(Error::store)?;
  tracing::info!(actor = %ctx.actor.describe(), cnet = %user.cnet, role = %user.role, "user created");

  Ok((StatusCode::CREATED, Json(user)))
}
