//! HTTP handlers, one module per resource.

pub mod bids;
pub mod courses;
pub mod listings;
pub mod quarters;
pub mod users;

use axum::{Json, extract::State};
use coursebid_core::store::CourseStore;
use serde_json::{Value, json};

use crate::{
  AppState,
  error::{Error, Result},
};

/// `GET /health`: succeeds when the store answers a query.
pub async fn health<S>(State(state): State<AppState<S>>) -> Result<Json<Value>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  state.store.active_quarter().await.map_err(Error::store)?;
  Ok(Json(json!({ "status": "ok" })))
}
