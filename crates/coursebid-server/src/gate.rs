//! Request gate: turn route parameters into loaded resources.
//!
//! Every course route passes through here before the policy is consulted.
//! Quarter parameters arrive as a year slug (`"2024-2025"`) plus a season
//! name; anything that does not resolve to a stored quarter is a 404.

use coursebid_core::{
  actor::RequestContext,
  course::Course,
  policy::Denial,
  quarter::{Quarter, Season, year_unslug},
  store::CourseStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};

const COURSE_NOT_FOUND: &str = "course not found";
const QUARTER_NOT_FOUND: &str = "quarter not found";

// ─── Quarter parameters ──────────────────────────────────────────────────────

/// Optional `?year=&season=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuarterParams {
  pub year:   Option<String>,
  pub season: Option<String>,
}

impl QuarterParams {
  /// Both halves, or neither. One without the other is a bad request.
  pub fn supplied(&self) -> Result<Option<(&str, &str)>> {
    match (self.year.as_deref(), self.season.as_deref()) {
      (Some(year), Some(season)) => Ok(Some((year, season))),
      (None, None) => Ok(None),
      _ => Err(Error::BadRequest("year and season must be given together".into())),
    }
  }
}

/// Parse a slug/season pair without touching the store.
fn parse_quarter(year: &str, season: &str) -> Option<(i32, Season)> {
  Some((year_unslug(year).ok()?, season.parse().ok()?))
}

/// Look up the quarter named by a year slug and season.
pub async fn resolve_quarter<S: CourseStore>(store: &S, year: &str, season: &str) -> Result<Quarter> {
  let not_found = || Error::NotFound(QUARTER_NOT_FOUND.into());
  let (year, season) = parse_quarter(year, season).ok_or_else(not_found)?;
  store
    .find_quarter(year, season)
    .await
    .map_err(Error::store)?
    .ok_or_else(not_found)
}

/// The quarter named by the parameters, or the active quarter if none were
/// given.
pub async fn quarter_or_active<S: CourseStore>(store: &S, params: &QuarterParams) -> Result<Quarter> {
  match params.supplied()? {
    Some((year, season)) => resolve_quarter(store, year, season).await,
    None => store
      .active_quarter()
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound("no active quarter".into())),
  }
}

/// Like [`quarter_or_active`] but `None` when nothing resolves. The home
/// route shows an empty listing rather than a 404.
pub async fn quarter_if_any<S: CourseStore>(store: &S, params: &QuarterParams) -> Result<Option<Quarter>> {
  match quarter_or_active(store, params).await {
    Ok(quarter) => Ok(Some(quarter)),
    Err(Error::NotFound(_)) => Ok(None),
    Err(e) => Err(e),
  }
}

// ─── Course location ─────────────────────────────────────────────────────────

/// How a route names a course.
#[derive(Debug, Clone)]
pub enum CourseLocator {
  /// `/courses/{id}`, as it appeared in the path.
  ById(String),
  /// `/{year}/{season}/{number}`
  ByNumber {
    year:   String,
    season: String,
    number: String,
  },
}

/// Load a course and its quarter. A malformed id or an unknown quarter is
/// reported as an unknown course.
pub async fn find_course<S: CourseStore>(store: &S, locator: &CourseLocator) -> Result<(Course, Quarter)> {
  let not_found = || Error::NotFound(COURSE_NOT_FOUND.into());

  match locator {
    CourseLocator::ById(raw) => {
      let id = Uuid::parse_str(raw).map_err(|_| not_found())?;
      let course = store.get_course(id).await.map_err(Error::store)?.ok_or_else(not_found)?;
      let quarter = store
        .get_quarter(course.quarter_id)
        .await
        .map_err(Error::store)?
        .ok_or_else(not_found)?;
      Ok((course, quarter))
    }
    CourseLocator::ByNumber { year, season, number } => {
      let quarter = resolve_quarter(store, year, season).await.map_err(missing_course)?;
      let course = store
        .find_course_by_number(quarter.quarter_id, number)
        .await
        .map_err(Error::store)?
        .ok_or_else(not_found)?;
      Ok((course, quarter))
    }
  }
}

/// When a course is addressed by id with explicit quarter parameters, those
/// parameters must name the course's own quarter. If they name a different
/// stored quarter the request is redirected to the canonical path.
pub async fn check_quarter_params<S: CourseStore>(
  store: &S,
  params: &QuarterParams,
  course: &Course,
  quarter: &Quarter,
) -> Result<()> {
  let Some((year, season)) = params.supplied()? else {
    return Ok(());
  };
  let named = resolve_quarter(store, year, season).await.map_err(missing_course)?;
  if named.quarter_id == quarter.quarter_id {
    Ok(())
  } else {
    Err(Error::StaleQuarter(canonical_path(course, quarter)))
  }
}

fn missing_course(err: Error) -> Error {
  match err {
    Error::NotFound(_) => Error::NotFound(COURSE_NOT_FOUND.into()),
    other => other,
  }
}

// ─── Paths ───────────────────────────────────────────────────────────────────

/// `/{year_slug}/{season}/{number}`
pub fn canonical_path(course: &Course, quarter: &Quarter) -> String {
  format!("{}/{}", index_path(quarter), encode_segment(&course.number))
}

/// `/{year_slug}/{season}`
pub fn index_path(quarter: &Quarter) -> String {
  format!("/{}/{}", quarter.slug(), quarter.season)
}

/// `/courses?year=…&season=…`
pub fn courses_path(quarter: &Quarter) -> String {
  format!("/courses?year={}&season={}", quarter.slug(), quarter.season)
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(segment: &str) -> String {
  let mut out = String::with_capacity(segment.len());
  for byte in segment.bytes() {
    if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
      out.push(byte as char);
    } else {
      out.push_str(&format!("%{byte:02X}"));
    }
  }
  out
}

// ─── Denials ─────────────────────────────────────────────────────────────────

/// Log a refusal and convert it into a response error.
pub fn denied(ctx: &RequestContext, action: &str, denial: Denial) -> Error {
  tracing::warn!(actor = %ctx.actor.describe(), action, ?denial, "access denied");
  Error::from(denial)
}
