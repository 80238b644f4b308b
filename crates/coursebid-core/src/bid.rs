//! Student bids and the requester partition shown to instructors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// A student's ranked request for a course. One per (student, course).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
  pub bid_id:     Uuid,
  pub student_id: Uuid,
  pub course_id:  Uuid,
  /// 1 is the student's first choice.
  pub preference: u32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Body of a bid save.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BidInput {
  pub preference: u32,
}

/// A row on the bidding page: the student's existing bid for a course, or an
/// empty slot ready to be filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BidSlot {
  pub course_id:  Uuid,
  pub preference: Option<u32>,
  pub saved:      bool,
}

impl BidSlot {
  pub fn find_or_build(course_id: Uuid, bids: &[Bid]) -> Self {
    match bids.iter().find(|b| b.course_id == course_id) {
      Some(bid) => BidSlot {
        course_id,
        preference: Some(bid.preference),
        saved: true,
      },
      None => BidSlot {
        course_id,
        preference: None,
        saved: false,
      },
    }
  }
}

// ─── Requesters ──────────────────────────────────────────────────────────────

/// Students who bid on one course, split by how highly they ranked it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Requesters {
  /// Ranked the course within the number of courses they asked for.
  pub top:   Vec<User>,
  pub other: Vec<User>,
}

/// Partition the students who bid on `course_id`.
///
/// A student is a top requester when their bid on this course has a
/// preference no greater than their `course_requests`. Students without a bid
/// on the course are left out. Input order is preserved within each group.
pub fn partition_requesters(
  course_id: Uuid,
  students: impl IntoIterator<Item = User>,
  bids: &[Bid],
) -> Requesters {
  let preference: HashMap<Uuid, u32> = bids
    .iter()
    .filter(|b| b.course_id == course_id)
    .map(|b| (b.student_id, b.preference))
    .collect();

  let mut requesters = Requesters::default();
  for student in students {
    let Some(&rank) = preference.get(&student.user_id) else {
      continue;
    };
    if rank <= student.course_requests {
      requesters.top.push(student);
    } else {
      requesters.other.push(student);
    }
  }
  requesters
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::user::Role;

  fn student(cnet: &str, course_requests: u32) -> User {
    User {
      user_id: Uuid::new_v4(),
      cnet: cnet.into(),
      full_name: cnet.to_uppercase(),
      email: format!("{cnet}@example.edu"),
      role: Role::Student,
      course_requests,
      password_hash: String::new(),
      created_at: Utc::now(),
    }
  }

  fn bid(student: &User, course_id: Uuid, preference: u32) -> Bid {
    Bid {
      bid_id: Uuid::new_v4(),
      student_id: student.user_id,
      course_id,
      preference,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn preference_within_requests_is_top() {
    let course = Uuid::new_v4();
    let keen = student("keen", 2);
    let lukewarm = student("lukewarm", 2);
    let bids = vec![bid(&keen, course, 1), bid(&lukewarm, course, 3)];

    let split = partition_requesters(course, [keen.clone(), lukewarm.clone()], &bids);
    assert_eq!(split.top, vec![keen]);
    assert_eq!(split.other, vec![lukewarm]);
  }

  #[test]
  fn boundary_preference_counts_as_top() {
    let course = Uuid::new_v4();
    let s = student("edge", 2);
    let bids = vec![bid(&s, course, 2)];
    let split = partition_requesters(course, [s.clone()], &bids);
    assert_eq!(split.top, vec![s]);
    assert!(split.other.is_empty());
  }

  #[test]
  fn only_the_bid_for_this_course_is_evaluated() {
    let course = Uuid::new_v4();
    let elsewhere = Uuid::new_v4();
    let s = student("picky", 1);
    // First choice elsewhere, third choice here.
    let bids = vec![bid(&s, elsewhere, 1), bid(&s, course, 3)];

    let split = partition_requesters(course, [s.clone()], &bids);
    assert!(split.top.is_empty());
    assert_eq!(split.other, vec![s]);
  }

  #[test]
  fn students_without_a_bid_are_skipped() {
    let course = Uuid::new_v4();
    let split = partition_requesters(course, [student("idle", 3)], &[]);
    assert_eq!(split, Requesters::default());
  }

  #[test]
  fn slot_reflects_existing_bid() {
    let course = Uuid::new_v4();
    let s = student("slot", 2);
    let bids = vec![bid(&s, course, 4)];

    let found = BidSlot::find_or_build(course, &bids);
    assert!(found.saved);
    assert_eq!(found.preference, Some(4));

    let fresh = BidSlot::find_or_build(Uuid::new_v4(), &bids);
    assert!(!fresh.saved);
    assert_eq!(fresh.preference, None);
  }
}
