//! Handlers for quarter management.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`   | `/quarters` | Newest first; unpublished quarters for admins only |
//! | `POST`  | `/quarters` | Admin |
//! | `PATCH` | `/quarters/{year}/{season}` | Admin; body is any of `published`, `active`, deadlines |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Datelike, Utc};
use coursebid_core::{
  actor::Actor,
  policy,
  quarter::{NewQuarter, QuarterChanges, Season, year_unslug},
  store::{CourseQuery, CourseStore},
  validation::{self, ValidationErrors},
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::Session,
  error::{Error, Result},
  gate,
  views::{QuarterView, QuartersView},
};

/// `GET /quarters`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
) -> Result<Json<QuartersView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let admin = matches!(ctx.actor, Actor::Admin(_));
  let quarters = state.store.list_quarters().await.map_err(Error::store)?;

  Ok(Json(QuartersView {
    quarters:       quarters
      .iter()
      .filter(|q| admin || q.published)
      .map(|q| QuarterView::new(q, ctx.now))
      .collect(),
    default_season: Season::of_month(ctx.now.month()),
  }))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBody {
  /// Year slug, e.g. `"2024-2025"`.
  pub year:                     String,
  pub season:                   Season,
  #[serde(default)]
  pub published:                bool,
  #[serde(default)]
  pub active:                   bool,
  pub course_deadline:          DateTime<Utc>,
  pub student_bidding_deadline: DateTime<Utc>,
}

/// `POST /quarters`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  policy::authorize_manage(&ctx.actor).map_err(|d| gate::denied(&ctx, "create quarter", d))?;

  let year = year_unslug(&body.year)
    .map_err(|_| ValidationErrors::single("year", validation::INVALID_YEAR))?;

  let quarter = state
    .store
    .add_quarter(NewQuarter {
      year,
      season: body.season,
      published: body.published,
      active: body.active,
      course_deadline: body.course_deadline,
      student_bidding_deadline: body.student_bidding_deadline,
    })
    .await
    .map_err(Error::store)?;
  tracing::info!(actor = %ctx.actor.describe(), quarter = %quarter.formatted(), "quarter created");

  Ok((StatusCode::CREATED, Json(QuarterView::new(&quarter, ctx.now))))
}

/// `PATCH /quarters/{year}/{season}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path((year, season)): Path<(String, String)>,
  Json(changes): Json<QuarterChanges>,
) -> Result<Json<QuarterView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  policy::authorize_manage(&ctx.actor).map_err(|d| gate::denied(&ctx, "update quarter", d))?;

  let store = state.store.as_ref();
  let mut quarter = gate::resolve_quarter(store, &year, &season).await?;
  changes.apply_to(&mut quarter);

  let published_courses = if quarter.published {
    0
  } else {
    store
      .list_courses(CourseQuery {
        published: Some(true),
        ..CourseQuery::in_quarter(quarter.quarter_id)
      })
      .await
      .map_err(Error::store)?
      .len()
  };
  validation::validate_quarter(&quarter, published_courses)?;

  let saved = store
    .update_quarter(quarter)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("quarter not found".into()))?;
  tracing::info!(actor = %ctx.actor.describe(), quarter = %saved.formatted(), "quarter updated");

  Ok(Json(QuarterView::new(&saved, ctx.now)))
}
