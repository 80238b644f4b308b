//! Courses and the attribute payloads used to create and edit them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::{
  quarter::Quarter,
  validation::{self, ValidationErrors},
};

// ─── Course ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:            Uuid,
  pub quarter_id:           Uuid,
  /// Unique within the quarter; the public URL key.
  pub number:               String,
  /// Unique within the quarter.
  pub title:                String,
  /// `None` while no instructor is assigned.
  pub instructor_id:        Option<Uuid>,
  pub draft:                bool,
  pub published:            bool,
  pub syllabus:             Option<String>,
  pub prerequisites:        Option<String>,
  pub time:                 Option<String>,
  pub location:             Option<String>,
  pub website:              Option<String>,
  pub satisfies:            Option<String>,
  pub course_prerequisites: Option<String>,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

impl Course {
  /// Visible to everyone: finalised, published, and in a published quarter.
  pub fn is_public_in(&self, quarter: &Quarter) -> bool {
    !self.draft && self.published && quarter.published
  }

  pub fn is_taught_by(&self, user_id: Uuid) -> bool {
    self.instructor_id == Some(user_id)
  }

  /// Apply submitted attributes in place. `instructor` is the already
  /// resolved assignment: `None` leaves it untouched, `Some(None)` clears it.
  pub fn apply(&mut self, input: CourseInput, instructor: Option<Option<Uuid>>) {
    if let Some(title) = input.title {
      self.title = title.trim().to_owned();
    }
    if let Some(number) = input.number {
      self.number = number.trim().to_owned();
    }
    if let Some(instructor_id) = instructor {
      self.instructor_id = instructor_id;
    }
    if let Some(draft) = input.draft {
      self.draft = draft;
    }
    if let Some(published) = input.published {
      self.published = published;
    }
    set_text(&mut self.syllabus, input.syllabus);
    set_text(&mut self.prerequisites, input.prerequisites);
    set_text(&mut self.time, input.time);
    set_text(&mut self.location, input.location);
    set_text(&mut self.website, input.website);
    set_text(&mut self.satisfies, input.satisfies);
    set_text(&mut self.course_prerequisites, input.course_prerequisites);
  }

  pub fn validate(&self, quarter: &Quarter) -> Result<(), ValidationErrors> {
    validation::validate_course(&self.title, &self.number, self.published, quarter)
  }
}

/// An empty string clears an optional text attribute.
fn set_text(slot: &mut Option<String>, value: Option<String>) {
  if let Some(value) = value {
    let trimmed = value.trim();
    *slot = (!trimmed.is_empty()).then(|| trimmed.to_owned());
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// A writable course attribute. Which of these an actor may submit is decided
/// by [`crate::policy::writable_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseField {
  Title,
  Number,
  Instructor,
  Syllabus,
  Prerequisites,
  Time,
  Location,
  Website,
  Satisfies,
  Published,
  CoursePrerequisites,
  Draft,
}

impl CourseField {
  pub fn as_str(self) -> &'static str {
    match self {
      CourseField::Title => "title",
      CourseField::Number => "number",
      CourseField::Instructor => "instructor",
      CourseField::Syllabus => "syllabus",
      CourseField::Prerequisites => "prerequisites",
      CourseField::Time => "time",
      CourseField::Location => "location",
      CourseField::Website => "website",
      CourseField::Satisfies => "satisfies",
      CourseField::Published => "published",
      CourseField::CoursePrerequisites => "course_prerequisites",
      CourseField::Draft => "draft",
    }
  }
}

impl fmt::Display for CourseField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Instructor assignment ───────────────────────────────────────────────────

/// The instructor submitted with a course form.
///
/// On the wire this is a cnet string, with `"TBD"` meaning "nobody yet". The
/// sentinel never travels further than deserialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructorChoice {
  Unassigned,
  Cnet(String),
}

impl InstructorChoice {
  pub const UNASSIGNED_LABEL: &'static str = "TBD";

  pub fn cnet(&self) -> Option<&str> {
    match self {
      InstructorChoice::Unassigned => None,
      InstructorChoice::Cnet(cnet) => Some(cnet),
    }
  }

  fn from_wire(raw: &str) -> Self {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(Self::UNASSIGNED_LABEL) {
      InstructorChoice::Unassigned
    } else {
      InstructorChoice::Cnet(raw.to_owned())
    }
  }
}

impl<'de> Deserialize<'de> for InstructorChoice {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    Ok(Self::from_wire(&String::deserialize(deserializer)?))
  }
}

/// A present `null` clears the instructor; only an absent key leaves it alone.
fn present_instructor<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<Option<InstructorChoice>, D::Error> {
  let raw = Option::<String>::deserialize(deserializer)?;
  Ok(Some(raw.as_deref().map_or(InstructorChoice::Unassigned, InstructorChoice::from_wire)))
}

impl Serialize for InstructorChoice {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.cnet().unwrap_or(Self::UNASSIGNED_LABEL))
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Course attributes submitted on create or update. Absent fields are left
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseInput {
  pub title:                Option<String>,
  pub number:               Option<String>,
  #[serde(default, deserialize_with = "present_instructor")]
  pub instructor:           Option<InstructorChoice>,
  pub syllabus:             Option<String>,
  pub prerequisites:        Option<String>,
  pub time:                 Option<String>,
  pub location:             Option<String>,
  pub website:              Option<String>,
  pub satisfies:            Option<String>,
  pub published:            Option<bool>,
  pub course_prerequisites: Option<String>,
  pub draft:                Option<bool>,
}

impl CourseInput {
  /// The fields present in this payload.
  pub fn fields(&self) -> Vec<CourseField> {
    let present = [
      (CourseField::Title, self.title.is_some()),
      (CourseField::Number, self.number.is_some()),
      (CourseField::Instructor, self.instructor.is_some()),
      (CourseField::Syllabus, self.syllabus.is_some()),
      (CourseField::Prerequisites, self.prerequisites.is_some()),
      (CourseField::Time, self.time.is_some()),
      (CourseField::Location, self.location.is_some()),
      (CourseField::Website, self.website.is_some()),
      (CourseField::Satisfies, self.satisfies.is_some()),
      (CourseField::Published, self.published.is_some()),
      (CourseField::CoursePrerequisites, self.course_prerequisites.is_some()),
      (CourseField::Draft, self.draft.is_some()),
    ];
    present
      .into_iter()
      .filter_map(|(field, set)| set.then_some(field))
      .collect()
  }
}

// ─── NewCourse ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::CourseStore::add_course`]. Identity and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewCourse {
  pub quarter_id:           Uuid,
  pub number:               String,
  pub title:                String,
  pub instructor_id:        Option<Uuid>,
  pub draft:                bool,
  pub published:            bool,
  pub syllabus:             Option<String>,
  pub prerequisites:        Option<String>,
  pub time:                 Option<String>,
  pub location:             Option<String>,
  pub website:              Option<String>,
  pub satisfies:            Option<String>,
  pub course_prerequisites: Option<String>,
}

impl NewCourse {
  /// Build a course for `quarter` from a create payload. New courses start
  /// as unpublished drafts unless the payload says otherwise.
  pub fn from_input(
    quarter: &Quarter,
    input: CourseInput,
    instructor_id: Option<Uuid>,
  ) -> Result<Self, ValidationErrors> {
    let text = |value: Option<String>| {
      value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
    };

    let course = NewCourse {
      quarter_id:           quarter.quarter_id,
      number:               input.number.unwrap_or_default().trim().to_owned(),
      title:                input.title.unwrap_or_default().trim().to_owned(),
      instructor_id,
      draft:                input.draft.unwrap_or(true),
      published:            input.published.unwrap_or(false),
      syllabus:             text(input.syllabus),
      prerequisites:        text(input.prerequisites),
      time:                 text(input.time),
      location:             text(input.location),
      website:              text(input.website),
      satisfies:            text(input.satisfies),
      course_prerequisites: text(input.course_prerequisites),
    };

    validation::validate_course(&course.title, &course.number, course.published, quarter)?;
    Ok(course)
  }
}
