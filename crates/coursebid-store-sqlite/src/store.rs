//! [`SqliteStore`]: the SQLite implementation of [`CourseStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{types::Value, OptionalExtension as _};
use uuid::Uuid;

use coursebid_core::{
  bid::Bid,
  course::{Course, NewCourse},
  quarter::{NewQuarter, Quarter, Season},
  store::{CourseQuery, CourseStore, PublicationConflict},
  user::{NewUser, Role, User},
};

use crate::{
  encode::{
    encode_dt, encode_role, encode_season, encode_uuid, RawBid, RawCourse, RawQuarter,
    RawUser, BID_COLUMNS, COURSE_COLUMNS, QUARTER_COLUMNS, USER_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A course-bidding store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn quarter_where(
    &self,
    clause: &'static str,
    params: Vec<Value>,
  ) -> Result<Option<Quarter>> {
    let raw: Option<RawQuarter> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {QUARTER_COLUMNS} FROM quarters WHERE {clause}");
        let raw = conn
          .query_row(&sql, rusqlite::params_from_iter(params), RawQuarter::from_row)
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawQuarter::into_quarter).transpose()
  }

  async fn course_where(
    &self,
    clause: &'static str,
    params: Vec<String>,
  ) -> Result<Option<Course>> {
    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE {clause}");
        let raw = conn
          .query_row(&sql, rusqlite::params_from_iter(params), RawCourse::from_row)
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawCourse::into_course).transpose()
  }

  async fn user_where(&self, clause: &'static str, param: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let raw = conn
          .query_row(&sql, rusqlite::params![param], RawUser::from_row)
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }
}

/// Order in which quarters are listed, newest first by the calendar year they
/// are shown with: within one stored year, summer precedes autumn, then
/// winter and spring of the following calendar year.
const QUARTER_ORDER: &str = "year DESC, CASE season \
   WHEN 'spring' THEN 4 WHEN 'winter' THEN 3 WHEN 'autumn' THEN 2 ELSE 1 END DESC";

/// Outcome of a write guarded by the publication invariant.
enum Guarded<T> {
  Written(T),
  /// The row exists but the guard rejected the write.
  Refused,
  Missing,
}

impl<T> Guarded<T> {
  /// Classify a write that touched no rows.
  fn unwritten(conn: &rusqlite::Connection, exists_sql: &str, id: &str) -> rusqlite::Result<Self> {
    let exists: bool = conn.query_row(exists_sql, rusqlite::params![id], |row| row.get(0))?;
    Ok(if exists { Guarded::Refused } else { Guarded::Missing })
  }

  fn resolve(self, conflict: PublicationConflict) -> Result<Option<T>> {
    match self {
      Guarded::Written(value) => Ok(Some(value)),
      Guarded::Missing => Ok(None),
      Guarded::Refused => Err(Error::Publication(conflict)),
    }
  }
}

// ─── CourseStore impl ────────────────────────────────────────────────────────

impl CourseStore for SqliteStore {
  type Error = Error;

  // ── Quarters ──────────────────────────────────────────────────────────────

  async fn add_quarter(&self, input: NewQuarter) -> Result<Quarter> {
    let quarter = Quarter {
      quarter_id:               Uuid::new_v4(),
      year:                     input.year,
      season:                   input.season,
      published:                input.published,
      active:                   input.active,
      course_deadline:          input.course_deadline,
      student_bidding_deadline: input.student_bidding_deadline,
      created_at:               Utc::now(),
    };

    let id_str       = encode_uuid(quarter.quarter_id);
    let season_str   = encode_season(quarter.season);
    let course_dl    = encode_dt(quarter.course_deadline);
    let bidding_dl   = encode_dt(quarter.student_bidding_deadline);
    let created_str  = encode_dt(quarter.created_at);
    let (year, published, active) = (quarter.year, quarter.published, quarter.active);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if active {
          tx.execute("UPDATE quarters SET active = 0 WHERE active = 1", [])?;
        }
        tx.execute(
          &format!(
            "INSERT INTO quarters ({QUARTER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![
            id_str,
            year,
            season_str,
            published,
            active,
            course_dl,
            bidding_dl,
            created_str,
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(quarter)
  }

  async fn get_quarter(&self, id: Uuid) -> Result<Option<Quarter>> {
    self
      .quarter_where("quarter_id = ?1", vec![Value::from(encode_uuid(id))])
      .await
  }

  async fn find_quarter(&self, year: i32, season: Season) -> Result<Option<Quarter>> {
    self
      .quarter_where(
        "year = ?1 AND season = ?2",
        vec![Value::from(year), Value::from(encode_season(season).to_owned())],
      )
      .await
  }

  async fn active_quarter(&self) -> Result<Option<Quarter>> {
    self.quarter_where("active = 1", Vec::new()).await
  }

  async fn list_quarters(&self) -> Result<Vec<Quarter>> {
    let raws: Vec<RawQuarter> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUARTER_COLUMNS} FROM quarters ORDER BY {QUARTER_ORDER}"
        ))?;
        let rows = stmt
          .query_map([], RawQuarter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuarter::into_quarter).collect()
  }

  async fn update_quarter(&self, quarter: Quarter) -> Result<Option<Quarter>> {
    let id_str     = encode_uuid(quarter.quarter_id);
    let course_dl  = encode_dt(quarter.course_deadline);
    let bidding_dl = encode_dt(quarter.student_bidding_deadline);
    let (published, active) = (quarter.published, quarter.active);

    let outcome: Guarded<RawQuarter> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if active {
          tx.execute(
            "UPDATE quarters SET active = 0 WHERE active = 1 AND quarter_id != ?1",
            rusqlite::params![id_str],
          )?;
        }
        let changed = tx.execute(
          "UPDATE quarters
             SET published = ?2, active = ?3,
                 course_deadline = ?4, student_bidding_deadline = ?5
           WHERE quarter_id = ?1
             AND (?2 = 1 OR NOT EXISTS (
                   SELECT 1 FROM courses c
                    WHERE c.quarter_id = quarters.quarter_id AND c.published = 1))",
          rusqlite::params![id_str, published, active, course_dl, bidding_dl],
        )?;
        if changed == 0 {
          // Dropping `tx` rolls back the deactivation above.
          return Ok(Guarded::unwritten(
            &tx,
            "SELECT EXISTS (SELECT 1 FROM quarters WHERE quarter_id = ?1)",
            &id_str,
          )?);
        }
        let raw = tx.query_row(
          &format!("SELECT {QUARTER_COLUMNS} FROM quarters WHERE quarter_id = ?1"),
          rusqlite::params![id_str],
          RawQuarter::from_row,
        )?;
        tx.commit()?;
        Ok(Guarded::Written(raw))
      })
      .await?;

    outcome
      .resolve(PublicationConflict::PublishedCourses)?
      .map(RawQuarter::into_quarter)
      .transpose()
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:         Uuid::new_v4(),
      cnet:            input.cnet,
      full_name:       input.full_name,
      email:           input.email,
      role:            input.role,
      course_requests: input.course_requests,
      password_hash:   input.password_hash,
      created_at:      Utc::now(),
    };

    let id_str      = encode_uuid(user.user_id);
    let cnet        = user.cnet.clone();
    let full_name   = user.full_name.clone();
    let email       = user.email.clone();
    let role_str    = encode_role(user.role);
    let requests    = user.course_requests;
    let hash        = user.password_hash.clone();
    let created_str = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
          rusqlite::params![
            id_str,
            cnet,
            full_name,
            email,
            role_str,
            requests,
            hash,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn find_user_by_cnet<'a>(&'a self, cnet: &'a str) -> Result<Option<User>> {
    self.user_where("cnet = ?1", cnet.to_owned()).await
  }

  async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
    let role_str = role.map(encode_role);

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users WHERE (?1 IS NULL OR role = ?1) ORDER BY cnet"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn add_course(&self, input: NewCourse) -> Result<Course> {
    let now = Utc::now();
    let course = Course {
      course_id:            Uuid::new_v4(),
      quarter_id:           input.quarter_id,
      number:               input.number,
      title:                input.title,
      instructor_id:        input.instructor_id,
      draft:                input.draft,
      published:            input.published,
      syllabus:             input.syllabus,
      prerequisites:        input.prerequisites,
      time:                 input.time,
      location:             input.location,
      website:              input.website,
      satisfies:            input.satisfies,
      course_prerequisites: input.course_prerequisites,
      created_at:           now,
      updated_at:           now,
    };

    let row = course.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          &format!(
            "INSERT INTO courses ({COURSE_COLUMNS})
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16
              WHERE ?7 = 0 OR EXISTS (
                    SELECT 1 FROM quarters WHERE quarter_id = ?2 AND published = 1)"
          ),
          rusqlite::params![
            encode_uuid(row.course_id),
            encode_uuid(row.quarter_id),
            row.number,
            row.title,
            row.instructor_id.map(encode_uuid),
            row.draft,
            row.published,
            row.syllabus,
            row.prerequisites,
            row.time,
            row.location,
            row.website,
            row.satisfies,
            row.course_prerequisites,
            encode_dt(row.created_at),
            encode_dt(row.updated_at),
          ],
        )?;
        Ok(n)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::Publication(PublicationConflict::UnpublishedQuarter));
    }
    Ok(course)
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    self.course_where("course_id = ?1", vec![encode_uuid(id)]).await
  }

  async fn find_course_by_number<'a>(
    &'a self,
    quarter_id: Uuid,
    number: &'a str,
  ) -> Result<Option<Course>> {
    self
      .course_where(
        "quarter_id = ?1 AND number = ?2",
        vec![encode_uuid(quarter_id), number.to_owned()],
      )
      .await
  }

  async fn list_courses(&self, query: CourseQuery) -> Result<Vec<Course>> {
    let quarter_str    = query.quarter_id.map(encode_uuid);
    let instructor_str = query.instructor_id.map(encode_uuid);
    let (draft, published) = (query.draft, query.published);

    let raws: Vec<RawCourse> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COURSE_COLUMNS} FROM courses
            WHERE (?1 IS NULL OR quarter_id = ?1)
              AND (?2 IS NULL OR instructor_id = ?2)
              AND (?3 IS NULL OR draft = ?3)
              AND (?4 IS NULL OR published = ?4)
            ORDER BY number"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![quarter_str, instructor_str, draft, published],
            RawCourse::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn update_course(&self, course: Course) -> Result<Option<Course>> {
    let mut course = course;
    course.updated_at = Utc::now();

    let row = course.clone();
    let outcome: Guarded<()> = self
      .conn
      .call(move |conn| {
        let id_str = encode_uuid(row.course_id);
        let changed = conn.execute(
          "UPDATE courses
              SET number = ?2, title = ?3, instructor_id = ?4, draft = ?5,
                  published = ?6, syllabus = ?7, prerequisites = ?8, time = ?9,
                  location = ?10, website = ?11, satisfies = ?12,
                  course_prerequisites = ?13, updated_at = ?14
            WHERE course_id = ?1
              AND (?6 = 0 OR EXISTS (
                    SELECT 1 FROM quarters q
                     WHERE q.quarter_id = courses.quarter_id AND q.published = 1))",
          rusqlite::params![
            id_str,
            row.number,
            row.title,
            row.instructor_id.map(encode_uuid),
            row.draft,
            row.published,
            row.syllabus,
            row.prerequisites,
            row.time,
            row.location,
            row.website,
            row.satisfies,
            row.course_prerequisites,
            encode_dt(row.updated_at),
          ],
        )?;
        if changed > 0 {
          return Ok(Guarded::Written(()));
        }
        Ok(Guarded::unwritten(
          conn,
          "SELECT EXISTS (SELECT 1 FROM courses WHERE course_id = ?1)",
          &id_str,
        )?)
      })
      .await?;

    Ok(
      outcome
        .resolve(PublicationConflict::UnpublishedQuarter)?
        .map(|()| course),
    )
  }

  async fn delete_course(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute("DELETE FROM courses WHERE course_id = ?1", rusqlite::params![id_str])?;
        Ok(n)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Bids ──────────────────────────────────────────────────────────────────

  async fn save_bid(&self, student_id: Uuid, course_id: Uuid, preference: u32) -> Result<Bid> {
    let bid_str     = encode_uuid(Uuid::new_v4());
    let student_str = encode_uuid(student_id);
    let course_str  = encode_uuid(course_id);
    let now_str     = encode_dt(Utc::now());

    let raw: RawBid = self
      .conn
      .call(move |conn| {
        let raw = conn.query_row(
          &format!(
            "INSERT INTO bids ({BID_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (student_id, course_id) DO UPDATE
               SET preference = excluded.preference, updated_at = excluded.updated_at
             RETURNING {BID_COLUMNS}"
          ),
          rusqlite::params![bid_str, student_str, course_str, preference, now_str],
          RawBid::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_bid()
  }

  async fn find_bid(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<Bid>> {
    let student_str = encode_uuid(student_id);
    let course_str  = encode_uuid(course_id);

    let raw: Option<RawBid> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {BID_COLUMNS} FROM bids WHERE student_id = ?1 AND course_id = ?2"),
            rusqlite::params![student_str, course_str],
            RawBid::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawBid::into_bid).transpose()
  }

  async fn list_bids_for_course(&self, course_id: Uuid) -> Result<Vec<Bid>> {
    let course_str = encode_uuid(course_id);

    let raws: Vec<RawBid> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {BID_COLUMNS} FROM bids WHERE course_id = ?1 ORDER BY preference, created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![course_str], RawBid::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBid::into_bid).collect()
  }

  async fn list_bids_for_student(&self, student_id: Uuid, quarter_id: Uuid) -> Result<Vec<Bid>> {
    let student_str = encode_uuid(student_id);
    let quarter_str = encode_uuid(quarter_id);

    let raws: Vec<RawBid> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.bid_id, b.student_id, b.course_id, b.preference, b.created_at, b.updated_at
             FROM bids b
             JOIN courses c ON c.course_id = b.course_id
            WHERE b.student_id = ?1 AND c.quarter_id = ?2
            ORDER BY b.preference, c.number",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![student_str, quarter_str], RawBid::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBid::into_bid).collect()
  }
}
