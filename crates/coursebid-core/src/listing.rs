//! Course listings for a quarter.
//!
//! The store hands back every course in a quarter; these functions narrow
//! that down to what a given listing shows. Whether the requester may see the
//! listing at all is decided in [`crate::policy`].

use serde::Serialize;
use uuid::Uuid;

use crate::{
  actor::{Actor, RequestContext},
  course::Course,
  policy,
  quarter::Quarter,
};

pub fn filter_draft(courses: Vec<Course>, draft: bool) -> Vec<Course> {
  courses.into_iter().filter(|c| c.draft == draft).collect()
}

pub fn filter_published(courses: Vec<Course>, published: bool) -> Vec<Course> {
  courses.into_iter().filter(|c| c.published == published).collect()
}

/// The course index: finalised courses the actor may list, plus the subset
/// of those that are published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexListing {
  pub courses:   Vec<Course>,
  pub published: Vec<Course>,
}

pub fn index(ctx: &RequestContext, quarter: &Quarter, courses: Vec<Course>) -> IndexListing {
  let courses: Vec<Course> = filter_draft(courses, false)
    .into_iter()
    .filter(|c| policy::decide(ctx, c, quarter).can_list_in_index)
    .collect();
  let published = filter_published(courses.clone(), true);
  IndexListing { courses, published }
}

/// What the public sees for a quarter. Nothing, while the quarter itself is
/// unpublished.
pub fn published_in(quarter: &Quarter, courses: Vec<Course>) -> Vec<Course> {
  if !quarter.published {
    return Vec::new();
  }
  filter_published(filter_draft(courses, false), true)
}

/// Draft courses. Faculty only ever see their own.
pub fn drafts(ctx: &RequestContext, courses: Vec<Course>) -> Vec<Course> {
  let drafts = filter_draft(courses, true);
  match &ctx.actor {
    Actor::Faculty(user) => taught_by(drafts, user.user_id),
    _ => drafts,
  }
}

/// Every course an instructor teaches, in any state.
pub fn taught_by(courses: Vec<Course>, instructor_id: Uuid) -> Vec<Course> {
  courses
    .into_iter()
    .filter(|c| c.is_taught_by(instructor_id))
    .collect()
}
