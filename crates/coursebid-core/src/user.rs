//! Users and their roles.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Faculty,
  Student,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Faculty => "faculty",
      Role::Student => "student",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "admin" => Ok(Role::Admin),
      "faculty" => Ok(Role::Faculty),
      "student" => Ok(Role::Student),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:         Uuid,
  /// Campus login handle; unique.
  pub cnet:            String,
  pub full_name:       String,
  pub email:           String,
  pub role:            Role,
  /// How many courses a student wants this quarter. Zero for staff.
  pub course_requests: u32,
  /// Argon2 PHC string. Never leaves the server.
  #[serde(skip)]
  pub password_hash:   String,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::CourseStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub cnet:            String,
  pub full_name:       String,
  pub email:           String,
  pub role:            Role,
  pub course_requests: u32,
  pub password_hash:   String,
}
