//! Who is making a request, and when.

use chrono::{DateTime, Utc};

use crate::{
  course::Course,
  user::{Role, User},
};

/// The party acting on a request. Every policy decision matches on this
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
  Guest,
  Admin(User),
  Faculty(User),
  Student(User),
}

impl From<User> for Actor {
  fn from(user: User) -> Self {
    match user.role {
      Role::Admin => Actor::Admin(user),
      Role::Faculty => Actor::Faculty(user),
      Role::Student => Actor::Student(user),
    }
  }
}

impl From<Option<User>> for Actor {
  fn from(user: Option<User>) -> Self { user.map_or(Actor::Guest, Actor::from) }
}

impl Actor {
  pub fn user(&self) -> Option<&User> {
    match self {
      Actor::Guest => None,
      Actor::Admin(u) | Actor::Faculty(u) | Actor::Student(u) => Some(u),
    }
  }

  pub fn is_guest(&self) -> bool { matches!(self, Actor::Guest) }

  /// `true` for the faculty member assigned to `course`.
  pub fn teaches(&self, course: &Course) -> bool {
    match self {
      Actor::Faculty(u) => course.is_taught_by(u.user_id),
      _ => false,
    }
  }

  /// Short label for logs.
  pub fn describe(&self) -> String {
    match self.user() {
      None => "guest".to_owned(),
      Some(u) => format!("{} {}", u.role, u.cnet),
    }
  }
}

/// Everything a policy decision may depend on besides the resources
/// themselves.
#[derive(Debug, Clone)]
pub struct RequestContext {
  pub actor: Actor,
  pub now:   DateTime<Utc>,
}

impl RequestContext {
  pub fn new(actor: Actor, now: DateTime<Utc>) -> Self { Self { actor, now } }

  pub fn guest(now: DateTime<Utc>) -> Self { Self::new(Actor::Guest, now) }
}
