//! Handlers for individual courses.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/courses/{id}` | Optional `?year=&season=`; a stale quarter redirects |
//! | `GET`    | `/{year}/{season}/{number}` | Canonical address |
//! | `GET`    | `/courses/{id}/edit`, `/{year}/{season}/{number}/edit` | Edit form context |
//! | `GET`    | `/courses/new` | Admin; `?year=&season=` preselects a quarter |
//! | `POST`   | `/courses` | Admin; body `{"course":{…},"year":…,"season":…}` |
//! | `PATCH`  | `/courses/{id}`, `/courses/{id}/edit` | Body `{"course":{…}}` |
//! | `DELETE` | `/courses/{id}` | Admin; redirects to the quarter's index |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Redirect},
};
use coursebid_core::{
  actor::{Actor, RequestContext},
  bid::BidSlot,
  course::{Course, CourseInput, InstructorChoice, NewCourse},
  policy,
  quarter::Quarter,
  store::{CourseQuery, CourseStore},
  user::Role,
  validation::{self, ValidationErrors},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Session,
  error::{Error, Result},
  gate::{self, CourseLocator, QuarterParams},
  views::{CourseView, Directory, EditView, NewFormView, Notice, QuarterView},
};

const UPDATED: &str = "Course information successfully updated.";

// ─── Show ────────────────────────────────────────────────────────────────────

/// `GET /courses/{id}[?year=&season=]`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<String>,
  Query(params): Query<QuarterParams>,
) -> Result<Json<CourseView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let (course, quarter) = gate::find_course(store, &CourseLocator::ById(id)).await?;
  let view = render_show(store, &ctx, course, &quarter).await?;
  gate::check_quarter_params(store, &params, &view.course, &quarter).await?;
  Ok(Json(view))
}

/// `GET /{year}/{season}/{number}`
pub async fn show_scoped<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path((year, season, number)): Path<(String, String, String)>,
) -> Result<Json<CourseView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let locator = CourseLocator::ByNumber { year, season, number };
  let (course, quarter) = gate::find_course(store, &locator).await?;
  Ok(Json(render_show(store, &ctx, course, &quarter).await?))
}

async fn render_show<S: CourseStore>(
  store: &S,
  ctx: &RequestContext,
  course: Course,
  quarter: &Quarter,
) -> Result<CourseView> {
  let access = policy::authorize_view(ctx, &course, quarter)
    .map_err(|d| gate::denied(ctx, "view course", d))?;

  let directory = Directory::load(store).await?;
  let course_id = course.course_id;
  let view = CourseView::new(course, quarter, access, &directory, ctx.now);

  match &ctx.actor {
    Actor::Student(student) => {
      let existing = store
        .find_bid(student.user_id, course_id)
        .await
        .map_err(Error::store)?;
      Ok(view.with_bid(BidSlot::find_or_build(course_id, existing.as_slice())))
    }
    _ => Ok(view),
  }
}

// ─── Edit form ───────────────────────────────────────────────────────────────

/// `GET /courses/{id}/edit[?year=&season=]`
pub async fn edit<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<String>,
  Query(params): Query<QuarterParams>,
) -> Result<Json<EditView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let (course, quarter) = gate::find_course(store, &CourseLocator::ById(id)).await?;
  let view = render_edit(store, &ctx, course, &quarter).await?;
  gate::check_quarter_params(store, &params, &view.course.course, &quarter)
    .await
    .map_err(|e| match e {
      Error::StaleQuarter(path) => Error::StaleQuarter(format!("{path}/edit")),
      other => other,
    })?;
  Ok(Json(view))
}

/// `GET /{year}/{season}/{number}/edit`
pub async fn edit_scoped<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path((year, season, number)): Path<(String, String, String)>,
) -> Result<Json<EditView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let locator = CourseLocator::ByNumber { year, season, number };
  let (course, quarter) = gate::find_course(store, &locator).await?;
  Ok(Json(render_edit(store, &ctx, course, &quarter).await?))
}

async fn render_edit<S: CourseStore>(
  store: &S,
  ctx: &RequestContext,
  course: Course,
  quarter: &Quarter,
) -> Result<EditView> {
  let access = policy::authorize_edit(ctx, &course, quarter)
    .map_err(|d| gate::denied(ctx, "edit course", d))?;

  let directory = Directory::load(store).await?;
  let db_instructor_cnet = directory.instructor(&course).map(|p| p.cnet);
  let selected_instructor = match &db_instructor_cnet {
    Some(cnet) => InstructorChoice::Cnet(cnet.clone()),
    None => InstructorChoice::Unassigned,
  };

  Ok(EditView {
    course: CourseView::new(course, quarter, access, &directory, ctx.now),
    db_instructor_cnet,
    selected_instructor,
    instructors: directory.faculty(),
    writable_fields: policy::writable_fields(&ctx.actor),
  })
}

// ─── New form ────────────────────────────────────────────────────────────────

/// `GET /courses/new[?year=&season=]`
pub async fn new_form<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Query(params): Query<QuarterParams>,
) -> Result<Json<NewFormView>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  policy::authorize_create(&ctx.actor).map_err(|d| gate::denied(&ctx, "new course", d))?;

  let store = state.store.as_ref();
  let quarter = gate::quarter_or_active(store, &params).await?;
  let quarters = store.list_quarters().await.map_err(Error::store)?;
  let directory = Directory::load(store).await?;

  Ok(Json(NewFormView {
    quarter:             QuarterView::new(&quarter, ctx.now),
    quarters:            quarters.iter().map(|q| QuarterView::new(q, ctx.now)).collect(),
    selected_instructor: InstructorChoice::Unassigned,
    instructors:         directory.faculty(),
    writable_fields:     policy::writable_fields(&ctx.actor),
  }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBody {
  pub course: CourseInput,
  /// Year slug, e.g. `"2024-2025"`.
  pub year:   String,
  pub season: String,
}

/// `POST /courses`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  policy::authorize_create(&ctx.actor).map_err(|d| gate::denied(&ctx, "create course", d))?;
  policy::permit(&ctx.actor, &body.course).map_err(|d| gate::denied(&ctx, "course fields", d))?;

  let store = state.store.as_ref();
  let quarter = gate::resolve_quarter(store, &body.year, &body.season).await?;
  let instructor = resolve_instructor(store, body.course.instructor.as_ref()).await?;

  let input = NewCourse::from_input(&quarter, body.course, instructor.flatten())?;
  let siblings = courses_in(store, &quarter).await?;
  validation::validate_unique(None, &input.number, &input.title, &siblings)?;

  let course = store.add_course(input).await.map_err(Error::store)?;
  tracing::info!(
    actor = %ctx.actor.describe(),
    course = %course.course_id,
    number = %course.number,
    quarter = %quarter.formatted(),
    "course created"
  );

  let access = policy::decide(&ctx, &course, &quarter);
  let directory = Directory::load(store).await?;
  let view = CourseView::new(course, &quarter, access, &directory, ctx.now);
  Ok((
    StatusCode::CREATED,
    [(header::LOCATION, view.path.clone())],
    Json(view),
  ))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBody {
  pub course: CourseInput,
}

/// `PATCH /courses/{id}` and `PATCH /courses/{id}/edit`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<String>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Notice>>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let (course, quarter) = gate::find_course(store, &CourseLocator::ById(id)).await?;

  policy::authorize_edit(&ctx, &course, &quarter)
    .map_err(|d| gate::denied(&ctx, "update course", d))?;
  policy::permit(&ctx.actor, &body.course).map_err(|d| gate::denied(&ctx, "course fields", d))?;

  let instructor = resolve_instructor(store, body.course.instructor.as_ref()).await?;
  let mut changed = course;
  changed.apply(body.course, instructor);
  changed.validate(&quarter)?;
  let siblings = courses_in(store, &quarter).await?;
  validation::validate_unique(Some(changed.course_id), &changed.number, &changed.title, &siblings)?;

  let saved = store
    .update_course(changed)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound("course not found".into()))?;
  tracing::info!(
    actor = %ctx.actor.describe(),
    course = %saved.course_id,
    number = %saved.number,
    "course updated"
  );

  let access = policy::decide(&ctx, &saved, &quarter);
  let directory = Directory::load(store).await?;
  Ok(Json(Notice {
    notice: UPDATED,
    course: CourseView::new(saved, &quarter, access, &directory, ctx.now),
  }))
}

/// Every course in `quarter`. The unique indexes still catch a concurrent
/// collision.
async fn courses_in<S: CourseStore>(store: &S, quarter: &Quarter) -> Result<Vec<Course>> {
  store
    .list_courses(CourseQuery::in_quarter(quarter.quarter_id))
    .await
    .map_err(Error::store)
}

/// Turn the submitted instructor into an assignment: `None` when the field was
/// not sent, `Some(None)` for "unassigned".
async fn resolve_instructor<S: CourseStore>(
  store: &S,
  choice: Option<&InstructorChoice>,
) -> Result<Option<Option<Uuid>>> {
  match choice {
    None => Ok(None),
    Some(InstructorChoice::Unassigned) => Ok(Some(None)),
    Some(InstructorChoice::Cnet(cnet)) => {
      let faculty = store
        .find_user_by_cnet(cnet)
        .await
        .map_err(Error::store)?
        .filter(|u| u.role == Role::Faculty)
        .ok_or_else(|| ValidationErrors::single("instructor", validation::NOT_FACULTY))?;
      Ok(Some(Some(faculty.user_id)))
    }
  }
}

// ─── Destroy ─────────────────────────────────────────────────────────────────

/// `DELETE /courses/{id}`
pub async fn destroy<S>(
  State(state): State<AppState<S>>,
  Session(ctx): Session,
  Path(id): Path<String>,
) -> Result<Redirect>
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  let store = state.store.as_ref();
  let (course, quarter) = gate::find_course(store, &CourseLocator::ById(id)).await?;
  policy::authorize_destroy(&ctx, &course, &quarter)
    .map_err(|d| gate::denied(&ctx, "destroy course", d))?;

  if store.delete_course(course.course_id).await.map_err(Error::store)? {
    tracing::info!(
      actor = %ctx.actor.describe(),
      course = %course.course_id,
      number = %course.number,
      "course deleted"
    );
    return Ok(Redirect::to(&gate::courses_path(&quarter)));
  }

  tracing::warn!(course = %course.course_id, "course could not be deleted");
  let access = policy::decide(&ctx, &course, &quarter);
  let directory = Directory::load(store).await?;
  Err(Error::DestroyFailed(Box::new(CourseView::new(
    course, &quarter, access, &directory, ctx.now,
  ))))
}
