//! JSON read models returned by the handlers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use coursebid_core::{
  bid::BidSlot,
  course::{Course, CourseField, InstructorChoice},
  policy::CourseAccess,
  quarter::{Quarter, Season},
  store::CourseStore,
  user::{Role, User},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  gate,
};

// ─── Quarters ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct QuarterView {
  pub quarter_id:               Uuid,
  /// Year slug, e.g. `"2024-2025"`.
  pub year:                     String,
  pub season:                   Season,
  pub display_year:             i32,
  pub label:                    String,
  pub label_with_current:       String,
  pub published:                bool,
  pub active:                   bool,
  pub course_deadline:          DateTime<Utc>,
  pub student_bidding_deadline: DateTime<Utc>,
  pub bidding_open:             bool,
  pub path:                     String,
}

impl QuarterView {
  pub fn new(quarter: &Quarter, now: DateTime<Utc>) -> Self {
    Self {
      quarter_id:               quarter.quarter_id,
      year:                     quarter.slug(),
      season:                   quarter.season,
      display_year:             quarter.display_year(),
      label:                    quarter.formatted(),
      label_with_current:       quarter.formatted_with_current(),
      published:                quarter.published,
      active:                   quarter.active,
      course_deadline:          quarter.course_deadline,
      student_bidding_deadline: quarter.student_bidding_deadline,
      bidding_open:             quarter.bidding_open(now),
      path:                     gate::index_path(quarter),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct QuartersView {
  pub quarters:       Vec<QuarterView>,
  /// Season preselected on the new-quarter form.
  pub default_season: Season,
}

// ─── People ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PersonView {
  pub cnet:      String,
  pub full_name: String,
}

impl From<&User> for PersonView {
  fn from(user: &User) -> Self {
    Self {
      cnet:      user.cnet.clone(),
      full_name: user.full_name.clone(),
    }
  }
}

/// Faculty keyed by id, for resolving instructors. Only faculty can be
/// assigned to a course, so nobody else is loaded.
pub struct Directory {
  faculty: HashMap<Uuid, User>,
}

impl Directory {
  pub async fn load<S: CourseStore>(store: &S) -> Result<Self> {
    let faculty = store
      .list_users(Some(Role::Faculty))
      .await
      .map_err(Error::store)?;
    Ok(Self {
      faculty: faculty.into_iter().map(|u| (u.user_id, u)).collect(),
    })
  }

  pub fn instructor(&self, course: &Course) -> Option<PersonView> {
    course
      .instructor_id
      .and_then(|id| self.faculty.get(&id))
      .map(PersonView::from)
  }

  /// Faculty who may be assigned to a course, by name.
  pub fn faculty(&self) -> Vec<PersonView> {
    let mut faculty: Vec<PersonView> = self.faculty.values().map(PersonView::from).collect();
    faculty.sort_by(|a, b| a.full_name.cmp(&b.full_name).then_with(|| a.cnet.cmp(&b.cnet)));
    faculty
  }
}

// ─── Courses ─────────────────────────────────────────────────────────────────

/// One row of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
  pub course_id:  Uuid,
  pub number:     String,
  pub title:      String,
  pub instructor: Option<PersonView>,
  pub time:       Option<String>,
  pub draft:      bool,
  pub published:  bool,
  pub path:       String,
}

impl CourseSummary {
  pub fn new(course: &Course, quarter: &Quarter, directory: &Directory) -> Self {
    Self {
      course_id:  course.course_id,
      number:     course.number.clone(),
      title:      course.title.clone(),
      instructor: directory.instructor(course),
      time:       course.time.clone(),
      draft:      course.draft,
      published:  course.published,
      path:       gate::canonical_path(course, quarter),
    }
  }

  pub fn list(courses: &[Course], quarter: &Quarter, directory: &Directory) -> Vec<Self> {
    courses.iter().map(|c| Self::new(c, quarter, directory)).collect()
  }
}

/// A single course as its viewer may see it.
#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
  pub course:     Course,
  pub quarter:    QuarterView,
  pub path:       String,
  pub instructor: Option<PersonView>,
  pub access:     CourseAccess,
  /// Present for students only.
  pub bid:        Option<BidSlot>,
}

impl CourseView {
  pub fn new(
    course: Course,
    quarter: &Quarter,
    access: CourseAccess,
    directory: &Directory,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      path: gate::canonical_path(&course, quarter),
      instructor: directory.instructor(&course),
      quarter: QuarterView::new(quarter, now),
      course,
      access,
      bid: None,
    }
  }

  pub fn with_bid(mut self, bid: BidSlot) -> Self {
    self.bid = Some(bid);
    self
  }
}

/// Context for the edit form.
#[derive(Debug, Serialize)]
pub struct EditView {
  pub course:              CourseView,
  /// The instructor currently stored, before any unsaved change.
  pub db_instructor_cnet:  Option<String>,
  pub selected_instructor: InstructorChoice,
  pub instructors:         Vec<PersonView>,
  pub writable_fields:     &'static [CourseField],
}

/// Context for the new-course form.
#[derive(Debug, Serialize)]
pub struct NewFormView {
  pub quarter:             QuarterView,
  pub quarters:            Vec<QuarterView>,
  pub selected_instructor: InstructorChoice,
  pub instructors:         Vec<PersonView>,
  pub writable_fields:     &'static [CourseField],
}

#[derive(Debug, Serialize)]
pub struct Notice {
  pub notice: &'static str,
  pub course: CourseView,
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ListingView {
  /// `None` when there is no quarter to show.
  pub quarter: Option<QuarterView>,
  pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Serialize)]
pub struct IndexView {
  pub quarter:   QuarterView,
  pub courses:   Vec<CourseSummary>,
  pub published: Vec<CourseSummary>,
}

// ─── Bids ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RequesterView {
  pub cnet:            String,
  pub full_name:       String,
  pub email:           String,
  pub course_requests: u32,
}

impl From<&User> for RequesterView {
  fn from(user: &User) -> Self {
    Self {
      cnet:            user.cnet.clone(),
      full_name:       user.full_name.clone(),
      email:           user.email.clone(),
      course_requests: user.course_requests,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct RequestersView {
  pub course: CourseSummary,
  pub top:    Vec<RequesterView>,
  pub other:  Vec<RequesterView>,
}

#[derive(Debug, Serialize)]
pub struct BidRow {
  pub course: CourseSummary,
  pub slot:   BidSlot,
}

#[derive(Debug, Serialize)]
pub struct MyRequestsView {
  pub quarter:         QuarterView,
  pub course_requests: u32,
  /// `false` once the bidding deadline has passed.
  pub can_save:        bool,
  pub requests:        Vec<BidRow>,
}
