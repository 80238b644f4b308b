//! Field-level validation messages.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use uuid::Uuid;

use crate::{course::Course, quarter::Quarter};

pub const BLANK: &str = "can't be blank";
pub const TAKEN: &str = "has already been taken";
pub const PUBLISH_IN_UNPUBLISHED_QUARTER: &str =
  "cannot be published in an unpublished quarter";
pub const UNPUBLISH_WITH_PUBLISHED_COURSES: &str =
  "cannot be unpublished while it has published courses";
pub const NOT_FACULTY: &str = "is not a faculty member";
pub const INVALID_YEAR: &str = "is not a valid academic year";

/// Messages keyed by field name, in stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// A single message on a single field.
  pub fn single(field: &str, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn on(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn into_result(self) -> Result<(), Self> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{field} {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}

/// Checks shared by course creation and update.
pub fn validate_course(
  title: &str,
  number: &str,
  published: bool,
  quarter: &Quarter,
) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::new();
  if title.trim().is_empty() {
    errors.add("title", BLANK);
  }
  if number.trim().is_empty() {
    errors.add("number", BLANK);
  }
  if published && !quarter.published {
    errors.add("published", PUBLISH_IN_UNPUBLISHED_QUARTER);
  }
  errors.into_result()
}

/// Number and title are each unique within a quarter. `siblings` are the
/// quarter's courses; `own` is skipped so an update does not collide with
/// itself. Both fields are reported when both collide.
pub fn validate_unique(
  own: Option<Uuid>,
  number: &str,
  title: &str,
  siblings: &[Course],
) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::new();
  let others = || siblings.iter().filter(|c| Some(c.course_id) != own);
  if others().any(|c| c.number == number) {
    errors.add("number", TAKEN);
  }
  if others().any(|c| c.title == title) {
    errors.add("title", TAKEN);
  }
  errors.into_result()
}

/// A quarter may not be unpublished out from under its published courses.
pub fn validate_quarter(
  quarter: &Quarter,
  published_courses: usize,
) -> Result<(), ValidationErrors> {
  if !quarter.published && published_courses > 0 {
    return Err(ValidationErrors::single(
      "published",
      UNPUBLISH_WITH_PUBLISHED_COURSES,
    ));
  }
  Ok(())
}

/// Bid preferences are 1-based ranks.
pub fn validate_preference(preference: u32) -> Result<(), ValidationErrors> {
  if preference == 0 {
    return Err(ValidationErrors::single("preference", "must be at least 1"));
  }
  Ok(())
}

/// Account registration: every identifying field must be present.
pub fn validate_user(cnet: &str, full_name: &str, password: &str) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::new();
  for (field, value) in [("cnet", cnet), ("full_name", full_name), ("password", password)] {
    if value.trim().is_empty() {
      errors.add(field, BLANK);
    }
  }
  errors.into_result()
}
