//! The authorization policy.
//!
//! Pure functions of ([`RequestContext`], [`Course`], [`Quarter`]). Nothing
//! here touches storage; callers load the resources and ask.
//!
//! A course is *public* when it is finalised (`!draft`), published, and its
//! quarter is published. Public courses are visible to everyone. Non-public
//! courses are visible only to their instructor and to admins.
//!
//! Refusals come in two kinds (see [`Denial`]): a silent redirect home for
//! parties who should not learn the resource exists or who need to sign in,
//! and an explicit access-denied for signed-in parties who found a resource
//! they may not touch.

use serde::Serialize;

use crate::{
  actor::{Actor, RequestContext},
  course::{Course, CourseField, CourseInput},
  quarter::Quarter,
  user::User,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// How a refused request is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
  /// Send the requester to the home route with no error indicator.
  Redirect,
  /// Show an explicit "access denied" error.
  Forbidden,
}

/// Everything an actor may do with one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CourseAccess {
  pub can_view:          bool,
  pub can_edit:          bool,
  pub can_publish:       bool,
  pub can_list_in_index: bool,
  pub can_bid:           bool,
  pub can_view_requests: bool,
  pub can_destroy:       bool,
}

// ─── Field permissions ───────────────────────────────────────────────────────

const ADMIN_FIELDS: &[CourseField] = &[
  CourseField::Title,
  CourseField::Number,
  CourseField::Instructor,
  CourseField::Syllabus,
  CourseField::Prerequisites,
  CourseField::Time,
  CourseField::Location,
  CourseField::Website,
  CourseField::Satisfies,
  CourseField::Published,
  CourseField::CoursePrerequisites,
  CourseField::Draft,
];

const FACULTY_FIELDS: &[CourseField] = &[
  CourseField::Syllabus,
  CourseField::Prerequisites,
  CourseField::Website,
  CourseField::Satisfies,
  CourseField::CoursePrerequisites,
  CourseField::Draft,
];

/// The course attributes `actor` may submit. Faculty may only use these on
/// courses they teach; see [`authorize_edit`].
pub fn writable_fields(actor: &Actor) -> &'static [CourseField] {
  match actor {
    Actor::Admin(_) => ADMIN_FIELDS,
    Actor::Faculty(_) => FACULTY_FIELDS,
    Actor::Guest | Actor::Student(_) => &[],
  }
}

/// Reject payloads that carry any attribute outside the actor's set.
pub fn permit(actor: &Actor, input: &CourseInput) -> Result<(), Denial> {
  let allowed = writable_fields(actor);
  if input.fields().iter().all(|f| allowed.contains(f)) {
    Ok(())
  } else {
    Err(refusal(actor))
  }
}

// ─── Course decisions ────────────────────────────────────────────────────────

pub fn decide(ctx: &RequestContext, course: &Course, quarter: &Quarter) -> CourseAccess {
  let public = course.is_public_in(quarter);

  match &ctx.actor {
    Actor::Guest => CourseAccess {
      can_view: public,
      can_list_in_index: public,
      ..CourseAccess::default()
    },
    Actor::Student(_) => CourseAccess {
      can_view: public,
      can_list_in_index: public,
      can_bid: public && quarter.bidding_open(ctx.now),
      ..CourseAccess::default()
    },
    Actor::Faculty(user) => {
      let owner = course.is_taught_by(user.user_id);
      CourseAccess {
        can_view: public || owner,
        can_edit: owner,
        can_list_in_index: public,
        can_view_requests: owner,
        ..CourseAccess::default()
      }
    }
    Actor::Admin(_) => CourseAccess {
      can_view:          true,
      can_edit:          true,
      can_publish:       quarter.published,
      can_list_in_index: true,
      can_bid:           false,
      can_view_requests: true,
      can_destroy:       true,
    },
  }
}

/// Only admins create courses.
pub fn can_create(actor: &Actor) -> bool { matches!(actor, Actor::Admin(_)) }

pub fn authorize_view(
  ctx: &RequestContext,
  course: &Course,
  quarter: &Quarter,
) -> Result<CourseAccess, Denial> {
  let access = decide(ctx, course, quarter);
  if access.can_view {
    return Ok(access);
  }
  // To guests and students a non-public course does not exist.
  match ctx.actor {
    Actor::Guest | Actor::Student(_) => Err(Denial::Redirect),
    Actor::Faculty(_) | Actor::Admin(_) => Err(Denial::Forbidden),
  }
}

pub fn authorize_edit(
  ctx: &RequestContext,
  course: &Course,
  quarter: &Quarter,
) -> Result<CourseAccess, Denial> {
  let access = decide(ctx, course, quarter);
  if access.can_edit { Ok(access) } else { Err(refusal(&ctx.actor)) }
}

pub fn authorize_destroy(
  ctx: &RequestContext,
  course: &Course,
  quarter: &Quarter,
) -> Result<(), Denial> {
  if decide(ctx, course, quarter).can_destroy {
    Ok(())
  } else {
    Err(refusal(&ctx.actor))
  }
}

pub fn authorize_requests(
  ctx: &RequestContext,
  course: &Course,
  quarter: &Quarter,
) -> Result<(), Denial> {
  if decide(ctx, course, quarter).can_view_requests {
    Ok(())
  } else {
    Err(refusal(&ctx.actor))
  }
}

/// Saving a bid: the course must be public and bidding still open.
pub fn authorize_bid<'a>(
  ctx: &'a RequestContext,
  course: &Course,
  quarter: &Quarter,
) -> Result<&'a User, Denial> {
  match &ctx.actor {
    Actor::Student(user) if decide(ctx, course, quarter).can_bid => Ok(user),
    actor => Err(refusal(actor)),
  }
}

pub fn authorize_create(actor: &Actor) -> Result<(), Denial> {
  if can_create(actor) { Ok(()) } else { Err(refusal(actor)) }
}

// ─── Listing and page gates ──────────────────────────────────────────────────

/// The drafts listing is for staff. Faculty see only their own drafts; the
/// filtering happens in [`crate::listing::drafts`].
pub fn authorize_drafts(actor: &Actor) -> Result<(), Denial> {
  match actor {
    Actor::Admin(_) | Actor::Faculty(_) => Ok(()),
    Actor::Guest | Actor::Student(_) => Err(refusal(actor)),
  }
}

/// "My courses" is a faculty page.
pub fn authorize_my_courses(actor: &Actor) -> Result<&User, Denial> {
  match actor {
    Actor::Faculty(user) => Ok(user),
    _ => Err(refusal(actor)),
  }
}

/// "My requests" is a student page. It stays readable after the bidding
/// deadline; saving is gated by [`authorize_bid`].
pub fn authorize_my_requests(actor: &Actor) -> Result<&User, Denial> {
  match actor {
    Actor::Student(user) => Ok(user),
    _ => Err(refusal(actor)),
  }
}

/// Quarter and account administration.
pub fn authorize_manage(actor: &Actor) -> Result<&User, Denial> {
  match actor {
    Actor::Admin(user) => Ok(user),
    _ => Err(refusal(actor)),
  }
}

/// Guests are sent home to sign in; anyone signed in is told no.
fn refusal(actor: &Actor) -> Denial {
  if actor.is_guest() { Denial::Redirect } else { Denial::Forbidden }
}
