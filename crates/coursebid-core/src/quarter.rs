//! Quarters: the academic terms courses are offered in.
//!
//! A quarter's `year` is the *start* year of its academic year: autumn 2024
//! and winter 2025 both carry `year = 2024`. Anything shown to people goes
//! through [`display_year`]; anything crossing the HTTP boundary goes through
//! [`year_slug`] / [`year_unslug`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Season ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
  Winter,
  Spring,
  Summer,
  Autumn,
}

impl Season {
  /// Seasons in calendar order.
  pub const ALL: [Season; 4] =
    [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

  pub fn as_str(self) -> &'static str {
    match self {
      Season::Winter => "winter",
      Season::Spring => "spring",
      Season::Summer => "summer",
      Season::Autumn => "autumn",
    }
  }

  /// Capitalised name for labels.
  pub fn label(self) -> &'static str {
    match self {
      Season::Winter => "Winter",
      Season::Spring => "Spring",
      Season::Summer => "Summer",
      Season::Autumn => "Autumn",
    }
  }

  /// Winter and spring fall in the second calendar year of an academic year.
  pub fn in_second_calendar_year(self) -> bool {
    matches!(self, Season::Winter | Season::Spring)
  }

  /// The season a calendar month (1–12) belongs to. Out-of-range months are
  /// clamped into the nearest season.
  pub fn of_month(month: u32) -> Season {
    let index = (month.clamp(1, 12) - 1) / 3;
    Season::ALL[index as usize]
  }
}

impl fmt::Display for Season {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Season {
  type Err = Error;

  /// Case-insensitive; surrounding whitespace is ignored.
  fn from_str(s: &str) -> Result<Self> {
    let lowered = s.trim().to_ascii_lowercase();
    Season::ALL
      .into_iter()
      .find(|season| season.as_str() == lowered)
      .ok_or_else(|| Error::UnknownSeason(s.to_owned()))
  }
}

// ─── Year transforms ─────────────────────────────────────────────────────────

/// The calendar year a quarter is shown with.
pub fn display_year(year: i32, season: Season) -> i32 {
  if season.in_second_calendar_year() { year + 1 } else { year }
}

/// The URL form of a stored academic start year: `2024` → `"2024-2025"`.
pub fn year_slug(year: i32) -> String { format!("{year}-{}", year + 1) }

/// Inverse of [`year_slug`]. Only the canonical spelling is accepted, so
/// `"02024-02025"` or `"+2024-2025"` name no quarter.
pub fn year_unslug(slug: &str) -> Result<i32> {
  let slug = slug.trim();
  let invalid = || Error::InvalidYearSlug(slug.to_owned());

  let (start, _) = slug.split_once('-').ok_or_else(invalid)?;
  let start: i32 = start.parse().map_err(|_| invalid())?;
  let end = start.checked_add(1).ok_or_else(invalid)?;

  if slug != format!("{start}-{end}") {
    return Err(invalid());
  }
  Ok(start)
}

// ─── Quarter ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quarter {
  pub quarter_id:               Uuid,
  /// Start year of the academic year (see module docs).
  pub year:                     i32,
  pub season:                   Season,
  pub published:                bool,
  /// At most one quarter is active at a time; the store enforces this.
  pub active:                   bool,
  pub course_deadline:          DateTime<Utc>,
  pub student_bidding_deadline: DateTime<Utc>,
  pub created_at:               DateTime<Utc>,
}

impl Quarter {
  pub fn display_year(&self) -> i32 { display_year(self.year, self.season) }

  pub fn slug(&self) -> String { year_slug(self.year) }

  /// `"Autumn 2024"`, `"Winter 2025"`.
  pub fn formatted(&self) -> String {
    format!("{} {}", self.season.label(), self.display_year())
  }

  /// [`Quarter::formatted`] with a `" (current)"` suffix on the active quarter.
  pub fn formatted_with_current(&self) -> String {
    let mut label = self.formatted();
    if self.active {
      label.push_str(" (current)");
    }
    label
  }

  /// Students may place or change bids strictly before the deadline.
  pub fn bidding_open(&self, now: DateTime<Utc>) -> bool {
    now < self.student_bidding_deadline
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CourseStore::add_quarter`].
#[derive(Debug, Clone)]
pub struct NewQuarter {
  pub year:                     i32,
  pub season:                   Season,
  pub published:                bool,
  pub active:                   bool,
  pub course_deadline:          DateTime<Utc>,
  pub student_bidding_deadline: DateTime<Utc>,
}

/// Mutable quarter attributes. Year and season never change once a quarter
/// exists, so they are not here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuarterChanges {
  pub published:                Option<bool>,
  pub active:                   Option<bool>,
  pub course_deadline:          Option<DateTime<Utc>>,
  pub student_bidding_deadline: Option<DateTime<Utc>>,
}

impl QuarterChanges {
  pub fn apply_to(&self, quarter: &mut Quarter) {
    if let Some(published) = self.published {
      quarter.published = published;
    }
    if let Some(active) = self.active {
      quarter.active = active;
    }
    if let Some(deadline) = self.course_deadline {
      quarter.course_deadline = deadline;
    }
    if let Some(deadline) = self.student_bidding_deadline {
      quarter.student_bidding_deadline = deadline;
    }
  }
}
