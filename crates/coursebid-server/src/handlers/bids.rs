//! Handlers for student bids.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/courses/{id}/student_requests` | Admin or owning instructor |
//! | `PUT` | `/courses/{id}/bid` | Student; body `{"preference":1}` |
//! | `GET` | `/bids` | Student; `?year=&season=`, defaults to the active quarter |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use coursebid_core::{
  bid::{self, Bid, BidInput, BidSlot},
  listing, policy,
  store::{CourseQuery, CourseStore},
  user::Role,
  validation,
};

use crate::{
  AppState,
  auth::Session,
  error::{Error, Result},
  gate::{self, CourseLocator, QuarterParams},
  views::{BidRow, CourseSummary, Directory, MyRequestsView, QuarterView, RequesterView, RequestersView},
};

/// `GET /courses/{id}/student_requests`
pub async fn student_requests<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<String>,
) -> Result<Json<RequestersView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let (course, quarter) = gate::find_course(store, &CourseLocator::ById(id)).await?;
  policy::authorize_requests(&ctx, &course, &quarter)
    .map_err(|d| gate::denied(&ctx, "student requests", d))?;

  let bids = store.list_bids_for_course(course.course_id).await.map_err(Error::store)?;
  let students = store
    .list_users(Some(Role::Student))
    .await
    .map_err(Error::store)?;
  let split = bid::partition_requesters(course.course_id, students, &bids);

  let directory = Directory::load(store).await?;
  Ok(Json(RequestersView {
    course: CourseSummary::new(&course, &quarter, &directory),
    top:    split.top.iter().map(RequesterView::from).collect(),
    other:  split.other.iter().map(RequesterView::from).collect(),
  }))
}

/// `PUT /courses/{id}/bid`
pub async fn save<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<String>,
  Json(body): Json<BidInput>,
) -> Result<Json<Bid>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let (course, quarter) = gate::find_course(store, &CourseLocator::ById(id)).await?;
  let student = policy::authorize_bid(&ctx, &course, &quarter)
    .map_err(|d| gate::denied(&ctx, "save bid", d))?;
  validation::validate_preference(body.preference)?;

  let saved = store
    .save_bid(student.user_id, course.course_id, body.preference)
    .await
    .map_err(Error::store)?;
  tracing::info!(
    student = %student.cnet,
    course = %course.number,
    preference = saved.preference,
    "bid saved"
  );
  Ok(Json(saved))
}

/// `GET /bids[?year=&season=]`
pub async fn my_requests<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Query(params): Query<QuarterParams>,
) -> Result<Json<MyRequestsView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let student =
    policy::authorize_my_requests(&ctx.actor).map_err(|d| gate::denied(&ctx, "my requests", d))?;

  let store = state.store.as_ref();
  let quarter = gate::quarter_or_active(store, &params).await?;
  let courses = store
    .list_courses(CourseQuery::in_quarter(quarter.quarter_id))
    .await
    .map_err(Error::store)?;
  let courses = listing::published_in(&quarter, courses);
  let bids = store
    .list_bids_for_student(student.user_id, quarter.quarter_id)
    .await
    .map_err(Error::store)?;
  let directory = Directory::load(store).await?;

  let requests = courses
    .iter()
    .map(|course| BidRow {
      course: CourseSummary::new(course, &quarter, &directory),
      slot:   BidSlot::find_or_build(course.course_id, &bids),
    })
    .collect();

  Ok(Json(MyRequestsView {
    quarter: QuarterView::new(&quarter, ctx.now),
    course_requests: student.course_requests,
    can_save: quarter.published && quarter.bidding_open(ctx.now),
    requests,
  }))
}
