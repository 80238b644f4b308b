//! The `CourseStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `coursebid-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.

use std::{fmt, future::Future};

use uuid::Uuid;

use crate::{
  bid::Bid,
  course::{Course, NewCourse},
  quarter::{NewQuarter, Quarter, Season},
  user::{NewUser, Role, User},
  validation,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// What callers need to know about a backend failure beyond its message.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The column of a violated uniqueness constraint, if that is what failed.
  fn duplicate_field(&self) -> Option<&str>;

  /// Set when the write would leave a published course in an unpublished
  /// quarter.
  fn publication_conflict(&self) -> Option<PublicationConflict>;
}

/// The two ways a write can break "a published course lives in a published
/// quarter".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationConflict {
  /// Publishing a course whose quarter is unpublished.
  UnpublishedQuarter,
  /// Unpublishing a quarter that still has published courses.
  PublishedCourses,
}

impl PublicationConflict {
  /// The validation message for the `published` field.
  pub fn message(self) -> &'static str {
    match self {
      PublicationConflict::UnpublishedQuarter => validation::PUBLISH_IN_UNPUBLISHED_QUARTER,
      PublicationConflict::PublishedCourses => validation::UNPUBLISH_WITH_PUBLISHED_COURSES,
    }
  }
}

impl fmt::Display for PublicationConflict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.message())
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`CourseStore::list_courses`]. `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
  pub quarter_id:    Option<Uuid>,
  pub instructor_id: Option<Uuid>,
  pub draft:         Option<bool>,
  pub published:     Option<bool>,
}

impl CourseQuery {
  pub fn in_quarter(quarter_id: Uuid) -> Self {
    Self {
      quarter_id: Some(quarter_id),
      ..Self::default()
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a course-bidding store backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime. Lookups return `None` rather than an
/// error when nothing matches.
pub trait CourseStore: Send + Sync {
  type Error: StoreError;

  // ── Quarters ──────────────────────────────────────────────────────────

  /// Persist a new quarter. Activating it deactivates every other quarter.
  fn add_quarter(
    &self,
    input: NewQuarter,
  ) -> impl Future<Output = Result<Quarter, Self::Error>> + Send + '_;

  fn get_quarter(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Quarter>, Self::Error>> + Send + '_;

  /// Resolve a quarter by its stored start year and season.
  fn find_quarter(
    &self,
    year: i32,
    season: Season,
  ) -> impl Future<Output = Result<Option<Quarter>, Self::Error>> + Send + '_;

  fn active_quarter(
    &self,
  ) -> impl Future<Output = Result<Option<Quarter>, Self::Error>> + Send + '_;

  /// All quarters, newest first.
  fn list_quarters(
    &self,
  ) -> impl Future<Output = Result<Vec<Quarter>, Self::Error>> + Send + '_;

  /// Write the mutable attributes of `quarter`. Activating it deactivates
  /// every other quarter in the same transaction. Returns `None` if the
  /// quarter does not exist. Unpublishing a quarter that has published
  /// courses fails with [`PublicationConflict::PublishedCourses`].
  fn update_quarter(
    &self,
    quarter: Quarter,
  ) -> impl Future<Output = Result<Option<Quarter>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn find_user_by_cnet<'a>(
    &'a self,
    cnet: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// All users ordered by cnet, optionally restricted to one role.
  fn list_users(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Courses ───────────────────────────────────────────────────────────

  /// Fails with [`PublicationConflict::UnpublishedQuarter`] when a published
  /// course is added to an unpublished quarter.
  fn add_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn find_course_by_number<'a>(
    &'a self,
    quarter_id: Uuid,
    number: &'a str,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + 'a;

  /// Courses matching `query`, ordered by number.
  fn list_courses(
    &self,
    query: CourseQuery,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  /// Overwrite a course's attributes and bump `updated_at`. Returns `None` if
  /// the course does not exist. Publishing it while its quarter is
  /// unpublished fails with [`PublicationConflict::UnpublishedQuarter`].
  fn update_course(
    &self,
    course: Course,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// Delete a course and its bids. Returns `false` if nothing was deleted.
  fn delete_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Bids ──────────────────────────────────────────────────────────────

  /// Insert or update the bid for (`student_id`, `course_id`).
  fn save_bid(
    &self,
    student_id: Uuid,
    course_id: Uuid,
    preference: u32,
  ) -> impl Future<Output = Result<Bid, Self::Error>> + Send + '_;

  fn find_bid(
    &self,
    student_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Option<Bid>, Self::Error>> + Send + '_;

  fn list_bids_for_course(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Bid>, Self::Error>> + Send + '_;

  /// A student's bids on courses in one quarter, best preference first.
  fn list_bids_for_student(
    &self,
    student_id: Uuid,
    quarter_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Bid>, Self::Error>> + Send + '_;
}
