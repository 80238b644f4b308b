//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! enums their lowercase names.

use chrono::{DateTime, Utc};
use coursebid_core::{
  bid::Bid,
  course::Course,
  quarter::{Quarter, Season},
  user::{Role, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_season(s: Season) -> &'static str { s.as_str() }

pub fn decode_season(s: &str) -> Result<Season> { Ok(s.parse()?) }

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

// ─── Column lists ────────────────────────────────────────────────────────────

pub const QUARTER_COLUMNS: &str = "quarter_id, year, season, published, active, \
   course_deadline, student_bidding_deadline, created_at";

pub const USER_COLUMNS: &str =
  "user_id, cnet, full_name, email, role, course_requests, password_hash, created_at";

pub const COURSE_COLUMNS: &str = "course_id, quarter_id, number, title, instructor_id, \
   draft, published, syllabus, prerequisites, time, location, website, satisfies, \
   course_prerequisites, created_at, updated_at";

pub const BID_COLUMNS: &str =
  "bid_id, student_id, course_id, preference, created_at, updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `quarters` row, in [`QUARTER_COLUMNS`] order.
pub struct RawQuarter {
  pub quarter_id:               String,
  pub year:                     i32,
  pub season:                   String,
  pub published:                bool,
  pub active:                   bool,
  pub course_deadline:          String,
  pub student_bidding_deadline: String,
  pub created_at:               String,
}

impl RawQuarter {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      quarter_id:               row.get(0)?,
      year:                     row.get(1)?,
      season:                   row.get(2)?,
      published:                row.get(3)?,
      active:                   row.get(4)?,
      course_deadline:          row.get(5)?,
      student_bidding_deadline: row.get(6)?,
      created_at:               row.get(7)?,
    })
  }

  pub fn into_quarter(self) -> Result<Quarter> {
    Ok(Quarter {
      quarter_id:               decode_uuid(&self.quarter_id)?,
      year:                     self.year,
      season:                   decode_season(&self.season)?,
      published:                self.published,
      active:                   self.active,
      course_deadline:          decode_dt(&self.course_deadline)?,
      student_bidding_deadline: decode_dt(&self.student_bidding_deadline)?,
      created_at:               decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `users` row, in [`USER_COLUMNS`] order.
pub struct RawUser {
  pub user_id:         String,
  pub cnet:            String,
  pub full_name:       String,
  pub email:           String,
  pub role:            String,
  pub course_requests: u32,
  pub password_hash:   String,
  pub created_at:      String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:         row.get(0)?,
      cnet:            row.get(1)?,
      full_name:       row.get(2)?,
      email:           row.get(3)?,
      role:            row.get(4)?,
      course_requests: row.get(5)?,
      password_hash:   row.get(6)?,
      created_at:      row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:         decode_uuid(&self.user_id)?,
      cnet:            self.cnet,
      full_name:       self.full_name,
      email:           self.email,
      role:            decode_role(&self.role)?,
      course_requests: self.course_requests,
      password_hash:   self.password_hash,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read from a `courses` row, in [`COURSE_COLUMNS`] order.
pub struct RawCourse {
  pub course_id:            String,
  pub quarter_id:           String,
  pub number:               String,
  pub title:                String,
  pub instructor_id:        Option<String>,
  pub draft:                bool,
  pub published:            bool,
  pub syllabus:             Option<String>,
  pub prerequisites:        Option<String>,
  pub time:                 Option<String>,
  pub location:             Option<String>,
  pub website:              Option<String>,
  pub satisfies:            Option<String>,
  pub course_prerequisites: Option<String>,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawCourse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:            row.get(0)?,
      quarter_id:           row.get(1)?,
      number:               row.get(2)?,
      title:                row.get(3)?,
      instructor_id:        row.get(4)?,
      draft:                row.get(5)?,
      published:            row.get(6)?,
      syllabus:             row.get(7)?,
      prerequisites:        row.get(8)?,
      time:                 row.get(9)?,
      location:             row.get(10)?,
      website:              row.get(11)?,
      satisfies:            row.get(12)?,
      course_prerequisites: row.get(13)?,
      created_at:           row.get(14)?,
      updated_at:           row.get(15)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:            decode_uuid(&self.course_id)?,
      quarter_id:           decode_uuid(&self.quarter_id)?,
      number:               self.number,
      title:                self.title,
      instructor_id:        decode_opt_uuid(self.instructor_id)?,
      draft:                self.draft,
      published:            self.published,
      syllabus:             self.syllabus,
      prerequisites:        self.prerequisites,
      time:                 self.time,
      location:             self.location,
      website:              self.website,
      satisfies:            self.satisfies,
      course_prerequisites: self.course_prerequisites,
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `bids` row, in [`BID_COLUMNS`] order.
pub struct RawBid {
  pub bid_id:     String,
  pub student_id: String,
  pub course_id:  String,
  pub preference: u32,
  pub created_at: String,
  pub updated_at: String,
}

impl RawBid {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bid_id:     row.get(0)?,
      student_id: row.get(1)?,
      course_id:  row.get(2)?,
      preference: row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_bid(self) -> Result<Bid> {
    Ok(Bid {
      bid_id:     decode_uuid(&self.bid_id)?,
      student_id: decode_uuid(&self.student_id)?,
      course_id:  decode_uuid(&self.course_id)?,
      preference: self.preference,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
