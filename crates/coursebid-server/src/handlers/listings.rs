//! Handlers for course listings.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/` | Published courses of the active quarter, or `?year=&season=` |
//! | `GET` | `/{year}/{season}` | Published courses of one quarter |
//! | `GET` | `/courses` | Finalised courses the requester may list |
//! | `GET` | `/courses/drafts` | Admin and faculty; faculty see their own |
//! | `GET` | `/courses/mine` | Faculty; every course they teach |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use coursebid_core::{
  course::Course,
  listing, policy,
  quarter::Quarter,
  store::{CourseQuery, CourseStore},
};

use crate::{
  AppState,
  auth::Session,
  error::{Error, Result},
  gate::{self, QuarterParams},
  views::{CourseSummary, Directory, IndexView, ListingView, QuarterView},
};

async fn courses_in<S: CourseStore>(store: &S, quarter: &Quarter) -> Result<Vec<Course>> {
  store
    .list_courses(CourseQuery::in_quarter(quarter.quarter_id))
    .await
    .map_err(Error::store)
}

async fn published_listing<S: CourseStore>(store: &S, quarter: Option<Quarter>) -> Result<ListingView> {
  let Some(quarter) = quarter else {
    return Ok(ListingView { quarter: None, courses: Vec::new() });
  };
  let courses = listing::published_in(&quarter, courses_in(store, &quarter).await?);
  let directory = Directory::load(store).await?;
  Ok(ListingView {
    courses: CourseSummary::list(&courses, &quarter, &directory),
    quarter: Some(QuarterView::new(&quarter, Utc::now())),
  })
}

/// `GET /[?year=&season=]`
pub async fn home<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<QuarterParams>,
) -> Result<Json<ListingView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let quarter = gate::quarter_if_any(store, &params).await?;
  Ok(Json(published_listing(store, quarter).await?))
}

/// `GET /{year}/{season}`
pub async fn quarter<S>(
  State(state): State<AppState<S>>,
  Path((year, season)): Path<(String, String)>,
) -> Result<Json<ListingView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let quarter = gate::resolve_quarter(store, &year, &season).await?;
  Ok(Json(published_listing(store, Some(quarter)).await?))
}

/// `GET /courses[?year=&season=]`
pub async fn index<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Query(params): Query<QuarterParams>,
) -> Result<Json<IndexView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let quarter = gate::quarter_or_active(store, &params).await?;
  let listed = listing::index(&ctx, &quarter, courses_in(store, &quarter).await?);
  let directory = Directory::load(store).await?;

  Ok(Json(IndexView {
    quarter:   QuarterView::new(&quarter, ctx.now),
    courses:   CourseSummary::list(&listed.courses, &quarter, &directory),
    published: CourseSummary::list(&listed.published, &quarter, &directory),
  }))
}

/// `GET /courses/drafts[?year=&season=]`
pub async fn drafts<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Query(params): Query<QuarterParams>,
) -> Result<Json<ListingView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  policy::authorize_drafts(&ctx.actor).map_err(|d| gate::denied(&ctx, "drafts", d))?;

  let store = state.store.as_ref();
  let quarter = gate::quarter_or_active(store, &params).await?;
  let drafts = listing::drafts(&ctx, courses_in(store, &quarter).await?);
  let directory = Directory::load(store).await?;

  Ok(Json(ListingView {
    courses: CourseSummary::list(&drafts, &quarter, &directory),
    quarter: Some(QuarterView::new(&quarter, ctx.now)),
  }))
}

/// `GET /courses/mine[?year=&season=]`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Query(params): Query<QuarterParams>,
) -> Result<Json<ListingView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let instructor =
    policy::authorize_my_courses(&ctx.actor).map_err(|d| gate::denied(&ctx, "my courses", d))?;

  let store = state.store.as_ref();
  let quarter = gate::quarter_or_active(store, &params).await?;
  let courses = store
    .list_courses(CourseQuery {
      instructor_id: Some(instructor.user_id),
      ..CourseQuery::in_quarter(quarter.quarter_id)
    })
    .await
    .map_err(Error::store)?;
  let directory = Directory::load(store).await?;

  Ok(Json(ListingView {
    courses: CourseSummary::list(&courses, &quarter, &directory),
    quarter: Some(QuarterView::new(&quarter, ctx.now)),
  }))
}
