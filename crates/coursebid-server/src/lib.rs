//! HTTP layer for the course-bidding administration tool.
//!
//! Exposes an axum [`Router`] backed by any [`CourseStore`]. Responses are
//! JSON; refusals either redirect home or answer 403, as decided by
//! [`coursebid_core::policy`].

pub mod auth;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod views;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use coursebid_core::{
  store::CourseStore,
  user::{NewUser, Role, User},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{bids, courses, listings, quarters, users};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Administrator account created at start-up if it does not exist.
  pub admin_cnet:          Option<String>,
  /// Argon2 PHC string for the bootstrap administrator.
  pub admin_password_hash: Option<String>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: CourseStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

/// Create the configured administrator unless an account with that cnet
/// already exists. Returns the account if one was created.
pub async fn ensure_admin<S: CourseStore>(
  store: &S,
  config: &ServerConfig,
) -> Result<Option<User>, S::Error> {
  let (Some(cnet), Some(password_hash)) = (&config.admin_cnet, &config.admin_password_hash)
  else {
    return Ok(None);
  };
  if store.find_user_by_cnet(cnet).await?.is_some() {
    return Ok(None);
  }
  let admin = store
    .add_user(NewUser {
      cnet:            cnet.clone(),
      full_name:       "Administrator".to_owned(),
      email:           String::new(),
      role:            Role::Admin,
      course_requests: 0,
      password_hash:   password_hash.clone(),
    })
    .await?;
  Ok(Some(admin))
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CourseStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/",                               get(listings::home::<S>))
    .route("/health",                         get(handlers::health::<S>))
    // Courses
    .route("/courses",                        get(listings::index::<S>).post(courses::create::<S>))
    .route("/courses/drafts",                 get(listings::drafts::<S>))
    .route("/courses/mine",                   get(listings::mine::<S>))
    .route("/courses/new",                    get(courses::new_form::<S>))
    .route(
      "/courses/{id}",
      get(courses::show::<S>)
        .patch(courses::update::<S>)
        .delete(courses::destroy::<S>),
    )
    .route("/courses/{id}/edit",              get(courses::edit::<S>).patch(courses::update::<S>))
    .route("/courses/{id}/student_requests",  get(bids::student_requests::<S>))
    .route("/courses/{id}/bid",               put(bids::save::<S>))
    // Bids, quarters, users
    .route("/bids",                           get(bids::my_requests::<S>))
    .route("/quarters",                       get(quarters::list::<S>).post(quarters::create::<S>))
    .route("/quarters/{year}/{season}",       patch(quarters::update::<S>))
    .route("/users",                          post(users::create::<S>))
    // Quarter-scoped addresses
    .route("/{year}/{season}",                get(listings::quarter::<S>))
    .route("/{year}/{season}/{number}",       get(courses::show_scoped::<S>))
    .route("/{year}/{season}/{number}/edit",  get(courses::edit_scoped::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use chrono::{Duration, Utc};
  use coursebid_core::{
    bid::Bid,
    course::{Course, NewCourse},
    quarter::{NewQuarter, Quarter, Season},
    store::CourseQuery,
    validation,
  };
  use coursebid_store_sqlite::SqliteStore;
  use uuid::Uuid;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  const PASSWORD: &str = "secret";

  struct Fixture {
    state:   AppState<SqliteStore>,
    quarter: Quarter,
    admin:   User,
    owner:   User,
    other:   User,
    student: User,
    keen:    User,
    public:  Course,
    draft:   Course,
  }

  fn config() -> ServerConfig {
    ServerConfig {
      host:                "127.0.0.1".to_string(),
      port:                3000,
      store_path:          PathBuf::from(":memory:"),
      admin_cnet:          None,
      admin_password_hash: None,
    }
  }

  fn quarter_input(year: i32, season: Season, published: bool, active: bool) -> NewQuarter {
    let now = Utc::now();
    NewQuarter {
      year,
      season,
      published,
      active,
      course_deadline: now + Duration::days(7),
      student_bidding_deadline: now + Duration::days(21),
    }
  }

  fn course_input(quarter: &Quarter, number: &str, instructor: &User, draft: bool) -> NewCourse {
    NewCourse {
      quarter_id:           quarter.quarter_id,
      number:               number.into(),
      title:                format!("Course {number}"),
      instructor_id:        Some(instructor.user_id),
      draft,
      published:            !draft,
      syllabus:             None,
      prerequisites:        None,
      time:                 None,
      location:             None,
      website:              None,
      satisfies:            None,
      course_prerequisites: None,
    }
  }

  async fn fixture() -> Fixture {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let hash = auth::hash_password(PASSWORD).unwrap();

    let mut people = Vec::new();
    for (cnet, role, course_requests) in [
      ("admin", Role::Admin, 0),
      ("owner", Role::Faculty, 0),
      ("other", Role::Faculty, 0),
      ("student", Role::Student, 2),
      ("keen", Role::Student, 2),
    ] {
      let user = store
        .add_user(NewUser {
          cnet: cnet.into(),
          full_name: cnet.to_uppercase(),
          email: format!("{cnet}@example.edu"),
          role,
          course_requests,
          password_hash: hash.clone(),
        })
        .await
        .unwrap();
      people.push(user);
    }
    let [admin, owner, other, student, keen]: [User; 5] = people.try_into().unwrap();

    let quarter = store
      .add_quarter(quarter_input(2024, Season::Autumn, true, true))
      .await
      .unwrap();
    let public = store.add_course(course_input(&quarter, "101", &owner, false)).await.unwrap();
    let draft = store.add_course(course_input(&quarter, "102", &owner, true)).await.unwrap();

    Fixture {
      state: AppState { store: Arc::new(store), config: Arc::new(config()) },
      quarter,
      admin,
      owner,
      other,
      student,
      keen,
      public,
      draft,
    }
  }

  fn basic(user: &User) -> String {
    format!("Basic {}", B64.encode(format!("{}:{PASSWORD}", user.cnet)))
  }

  async fn send<S>(
    state:  &AppState<S>,
    method: &str,
    uri:    &str,
    user:   Option<&User>,
    body:   Option<Value>,
  ) -> Response
  where
    S: CourseStore + Clone + Send + Sync + 'static,
  {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_of(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn location(resp: &Response) -> &str {
    resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
  }

  // ── Visibility ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn guest_sees_a_public_course_and_the_index_lists_it() {
    let f = fixture().await;

    let resp = send(&f.state, "GET", "/2024-2025/autumn/101", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    assert_eq!(body["course"]["number"], "101");
    assert_eq!(body["instructor"]["cnet"], "owner");
    assert_eq!(body["quarter"]["label"], "Autumn 2024");

    let resp = send(&f.state, "GET", "/courses?year=2024-2025&season=autumn", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    let numbers: Vec<&str> = body["courses"]
      .as_array()
      .unwrap()
      .iter()
      .map(|c| c["number"].as_str().unwrap())
      .collect();
    assert_eq!(numbers, ["101"]);
  }

  #[tokio::test]
  async fn draft_course_visibility_by_role() {
    let f = fixture().await;
    let uri = format!("/courses/{}", f.draft.course_id);

    let resp = send(&f.state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let resp = send(&f.state, "GET", &uri, Some(&f.student), None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = send(&f.state, "GET", &uri, Some(&f.owner), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&f.state, "GET", &uri, Some(&f.admin), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&f.state, "GET", &uri, Some(&f.other), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_of(resp).await, json!({ "error": "Access denied", "alert": "danger" }));
  }

  #[tokio::test]
  async fn bad_credentials_are_rejected() {
    let f = fixture().await;
    let req = Request::builder()
      .uri("/courses")
      .header(header::AUTHORIZATION, format!("Basic {}", B64.encode("owner:nope")))
      .body(Body::empty())
      .unwrap();
    let resp = router(f.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn home_lists_the_active_quarter() {
    let f = fixture().await;
    let resp = send(&f.state, "GET", "/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    assert_eq!(body["quarter"]["year"], "2024-2025");
    assert_eq!(body["courses"].as_array().unwrap().len(), 1);
    assert_eq!(body["courses"][0]["path"], "/2024-2025/autumn/101");
  }

  #[tokio::test]
  async fn unpublished_quarter_listing_is_empty() {
    let f = fixture().await;
    let winter = f
      .state
      .store
      .add_quarter(quarter_input(2024, Season::Winter, false, false))
      .await
      .unwrap();
    // The store will not file a published course under a hidden quarter.
    let err = f
      .state
      .store
      .add_course(course_input(&winter, "201", &f.owner, false))
      .await
      .unwrap_err();
    assert!(matches!(
      Error::store(err),
      Error::Validation(fields) if fields.on("published") == [validation::PUBLISH_IN_UNPUBLISHED_QUARTER]
    ));
    f.state
      .store
      .add_course(course_input(&winter, "202", &f.owner, true))
      .await
      .unwrap();

    let resp = send(&f.state, "GET", "/2024-2025/winter", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(json_of(resp).await["courses"].as_array().unwrap().is_empty());
  }

  // ── Request gate ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn stale_quarter_params_redirect_to_the_canonical_path() {
    let f = fixture().await;
    f.state
      .store
      .add_quarter(quarter_input(2024, Season::Winter, true, false))
      .await
      .unwrap();

    let uri = format!("/courses/{}?year=2024-2025&season=winter", f.public.course_id);
    let resp = send(&f.state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/2024-2025/autumn/101");

    let uri = format!("/courses/{}?year=2024-2025&season=autumn", f.public.course_id);
    let resp = send(&f.state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn unknown_quarters_and_courses_are_not_found() {
    let f = fixture().await;
    for uri in [
      "/2023-2024/autumn/101",
      "/2024-2026/autumn/101",
      "/2024-2025/fall/101",
      "/2024-2025/autumn/999",
      "/02024-02025/autumn/101",
    ] {
      let resp = send(&f.state, "GET", uri, Some(&f.admin), None).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
      assert_eq!(json_of(resp).await["error"], "course not found");
    }

    let uri = format!("/courses/{}?year=2030-2031&season=spring", f.public.course_id);
    let resp = send(&f.state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn malformed_course_ids_are_not_found() {
    let f = fixture().await;
    for (method, uri, body) in [
      ("GET", "/courses/101", None),
      ("GET", "/courses/not-a-uuid/edit", None),
      ("PATCH", "/courses/not-a-uuid", Some(json!({ "course": { "syllabus": "x" } }))),
      ("DELETE", "/courses/xyz", None),
      ("GET", "/courses/xyz/student_requests", None),
      ("PUT", "/courses/xyz/bid", Some(json!({ "preference": 1 }))),
    ] {
      let resp = send(&f.state, method, uri, Some(&f.admin), body).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {uri}");
      assert_eq!(json_of(resp).await, json!({ "error": "course not found" }));
    }
  }

  // ── Editing ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn edit_form_context() {
    let f = fixture().await;
    let resp = send(&f.state, "GET", "/2024-2025/autumn/101/edit", Some(&f.owner), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    assert_eq!(body["db_instructor_cnet"], "owner");
    assert_eq!(body["selected_instructor"], "owner");
    let instructors: Vec<&str> = body["instructors"]
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["cnet"].as_str().unwrap())
      .collect();
    assert_eq!(instructors, ["other", "owner"]);
    assert!(
      !body["writable_fields"]
        .as_array()
        .unwrap()
        .contains(&json!("title"))
    );

    let resp = send(&f.state, "GET", "/2024-2025/autumn/101/edit", Some(&f.other), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = send(&f.state, "GET", "/2024-2025/autumn/101/edit", None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  }

  #[tokio::test]
  async fn faculty_may_only_touch_their_own_fields() {
    let f = fixture().await;
    let uri = format!("/courses/{}", f.public.course_id);

    let resp = send(
      &f.state,
      "PATCH",
      &uri,
      Some(&f.owner),
      Some(json!({ "course": { "title": "Renamed" } })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(
      &f.state,
      "PATCH",
      &uri,
      Some(&f.owner),
      Some(json!({ "course": { "syllabus": "Week 1: parsing" } })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    assert_eq!(body["notice"], "Course information successfully updated.");
    assert_eq!(body["course"]["course"]["syllabus"], "Week 1: parsing");

    let resp = send(
      &f.state,
      "PATCH",
      &format!("{uri}/edit"),
      Some(&f.other),
      Some(json!({ "course": { "syllabus": "hijacked" } })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn publishing_requires_a_published_quarter() {
    let f = fixture().await;
    let winter = f
      .state
      .store
      .add_quarter(quarter_input(2024, Season::Winter, false, false))
      .await
      .unwrap();
    let mut input = course_input(&winter, "201", &f.owner, true);
    input.published = false;
    let course = f.state.store.add_course(input).await.unwrap();

    let resp = send(
      &f.state,
      "PATCH",
      &format!("/courses/{}", course.course_id),
      Some(&f.admin),
      Some(json!({ "course": { "draft": false, "published": true } })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_of(resp).await;
    assert_eq!(
      body["fields"]["published"][0],
      "cannot be published in an unpublished quarter"
    );
  }

  #[tokio::test]
  async fn duplicate_number_is_a_field_error() {
    let f = fixture().await;
    let resp = send(
      &f.state,
      "PATCH",
      &format!("/courses/{}", f.draft.course_id),
      Some(&f.admin),
      Some(json!({ "course": { "number": "101" } })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_of(resp).await["fields"]["number"][0], "has already been taken");
  }

  #[tokio::test]
  async fn create_reports_every_taken_field() {
    let f = fixture().await;
    let body = |number: &str, title: &str| {
      json!({
        "year": "2024-2025",
        "season": "autumn",
        "course": { "number": number, "title": title }
      })
    };

    let resp = send(&f.state, "POST", "/courses", Some(&f.admin), Some(body("101", "Course 101"))).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let fields = json_of(resp).await["fields"].clone();
    assert_eq!(fields["number"], json!(["has already been taken"]));
    assert_eq!(fields["title"], json!(["has already been taken"]));

    let resp = send(&f.state, "POST", "/courses", Some(&f.admin), Some(body("301", "Course 101"))).await;
    let fields = json_of(resp).await["fields"].clone();
    assert!(fields.get("number").is_none());
    assert_eq!(fields["title"], json!(["has already been taken"]));
  }

  // ── Create and destroy ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_creates_an_unassigned_draft() {
    let f = fixture().await;
    let body = json!({
      "year": "2024-2025",
      "season": "autumn",
      "course": { "title": "Compilers", "number": "221", "instructor": "TBD" }
    });

    let resp = send(&f.state, "POST", "/courses", Some(&f.owner), Some(body.clone())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&f.state, "POST", "/courses", Some(&f.admin), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(location(&resp), "/2024-2025/autumn/221");
    let body = json_of(resp).await;
    assert_eq!(body["course"]["instructor_id"], Value::Null);
    assert_eq!(body["course"]["draft"], true);
    assert_eq!(body["course"]["published"], false);
  }

  #[tokio::test]
  async fn create_assigns_faculty_by_cnet() {
    let f = fixture().await;
    let body = |instructor: &str| {
      json!({
        "year": "2024-2025",
        "season": "autumn",
        "course": { "title": "Networks", "number": "232", "instructor": instructor }
      })
    };

    let resp = send(&f.state, "POST", "/courses", Some(&f.admin), Some(body("student"))).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = send(&f.state, "POST", "/courses", Some(&f.admin), Some(body("other"))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_of(resp).await["instructor"]["cnet"], "other");
  }

  #[tokio::test]
  async fn destroy_is_admin_only_and_redirects_to_the_index() {
    let f = fixture().await;
    let uri = format!("/courses/{}", f.public.course_id);

    let resp = send(&f.state, "DELETE", &uri, Some(&f.owner), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&f.state, "DELETE", &uri, Some(&f.admin), None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/courses?year=2024-2025&season=autumn");

    let resp = send(&f.state, "GET", &uri, Some(&f.admin), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  /// Delegates to SQLite but never deletes a course.
  #[derive(Clone)]
  struct UndeletableStore(SqliteStore);

  impl CourseStore for UndeletableStore {
    type Error = coursebid_store_sqlite::Error;

    async fn add_quarter(&self, input: NewQuarter) -> Result<Quarter, Self::Error> {
      self.0.add_quarter(input).await
    }

    async fn get_quarter(&self, id: Uuid) -> Result<Option<Quarter>, Self::Error> {
      self.0.get_quarter(id).await
    }

    async fn find_quarter(&self, year: i32, season: Season) -> Result<Option<Quarter>, Self::Error> {
      self.0.find_quarter(year, season).await
    }

    async fn active_quarter(&self) -> Result<Option<Quarter>, Self::Error> {
      self.0.active_quarter().await
    }

    async fn list_quarters(&self) -> Result<Vec<Quarter>, Self::Error> {
      self.0.list_quarters().await
    }

    async fn update_quarter(&self, quarter: Quarter) -> Result<Option<Quarter>, Self::Error> {
      self.0.update_quarter(quarter).await
    }

    async fn add_user(&self, input: NewUser) -> Result<User, Self::Error> {
      self.0.add_user(input).await
    }

    async fn find_user_by_cnet<'a>(&'a self, cnet: &'a str) -> Result<Option<User>, Self::Error> {
      self.0.find_user_by_cnet(cnet).await
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, Self::Error> {
      self.0.list_users(role).await
    }

    async fn add_course(&self, input: NewCourse) -> Result<Course, Self::Error> {
      self.0.add_course(input).await
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, Self::Error> {
      self.0.get_course(id).await
    }

    async fn find_course_by_number<'a>(
      &'a self,
      quarter_id: Uuid,
      number: &'a str,
    ) -> Result<Option<Course>, Self::Error> {
      self.0.find_course_by_number(quarter_id, number).await
    }

    async fn list_courses(&self, query: CourseQuery) -> Result<Vec<Course>, Self::Error> {
      self.0.list_courses(query).await
    }

    async fn update_course(&self, course: Course) -> Result<Option<Course>, Self::Error> {
      self.0.update_course(course).await
    }

    async fn delete_course(&self, _id: Uuid) -> Result<bool, Self::Error> {
      Ok(false)
    }

    async fn save_bid(&self, student_id: Uuid, course_id: Uuid, preference: u32) -> Result<Bid, Self::Error> {
      self.0.save_bid(student_id, course_id, preference).await
    }

    async fn find_bid(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<Bid>, Self::Error> {
      self.0.find_bid(student_id, course_id).await
    }

    async fn list_bids_for_course(&self, course_id: Uuid) -> Result<Vec<Bid>, Self::Error> {
      self.0.list_bids_for_course(course_id).await
    }

    async fn list_bids_for_student(&self, student_id: Uuid, quarter_id: Uuid) -> Result<Vec<Bid>, Self::Error> {
      self.0.list_bids_for_student(student_id, quarter_id).await
    }
  }

  #[tokio::test]
  async fn failed_destroy_rerenders_the_course() {
    let f = fixture().await;
    let state = AppState {
      store:  Arc::new(UndeletableStore((*f.state.store).clone())),
      config: f.state.config.clone(),
    };
    let uri = format!("/courses/{}", f.public.course_id);

    let resp = send(&state, "DELETE", &uri, Some(&f.admin), None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = json_of(resp).await;
    assert_eq!(body["error"], "Course could not be deleted.");
    assert_eq!(body["course"]["course"]["number"], "101");

    let resp = send(&f.state, "GET", &uri, Some(&f.admin), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  // ── Listings ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn drafts_listing_by_role() {
    let f = fixture().await;

    let resp = send(&f.state, "GET", "/courses/drafts", Some(&f.owner), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_of(resp).await["courses"][0]["number"], "102");

    let resp = send(&f.state, "GET", "/courses/drafts", Some(&f.other), None).await;
    assert!(json_of(resp).await["courses"].as_array().unwrap().is_empty());

    let resp = send(&f.state, "GET", "/courses/drafts", Some(&f.student), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = send(&f.state, "GET", "/courses/drafts", None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  }

  #[tokio::test]
  async fn my_courses_include_drafts() {
    let f = fixture().await;
    let resp = send(&f.state, "GET", "/courses/mine", Some(&f.owner), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_of(resp).await["courses"].as_array().unwrap().len(), 2);

    let resp = send(&f.state, "GET", "/courses/mine", Some(&f.admin), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  // ── Bids ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn requesters_are_split_by_preference() {
    let f = fixture().await;
    let course = f.public.course_id;
    f.state.store.save_bid(f.keen.user_id, course, 1).await.unwrap();
    f.state.store.save_bid(f.student.user_id, course, 3).await.unwrap();

    let uri = format!("/courses/{course}/student_requests");
    let resp = send(&f.state, "GET", &uri, Some(&f.owner), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    assert_eq!(body["top"][0]["cnet"], "keen");
    assert_eq!(body["top"].as_array().unwrap().len(), 1);
    assert_eq!(body["other"][0]["cnet"], "student");

    let resp = send(&f.state, "GET", &uri, Some(&f.other), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = send(&f.state, "GET", &uri, Some(&f.student), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn students_bid_until_the_deadline() {
    let f = fixture().await;
    let uri = format!("/courses/{}/bid", f.public.course_id);

    let resp = send(&f.state, "PUT", &uri, Some(&f.student), Some(json!({ "preference": 2 }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_of(resp).await["preference"], 2);

    let resp = send(&f.state, "PUT", &uri, Some(&f.student), Some(json!({ "preference": 0 }))).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let draft_uri = format!("/courses/{}/bid", f.draft.course_id);
    let resp =
      send(&f.state, "PUT", &draft_uri, Some(&f.student), Some(json!({ "preference": 1 }))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Close bidding.
    let mut quarter = f.quarter.clone();
    quarter.student_bidding_deadline = Utc::now() - Duration::hours(1);
    f.state.store.update_quarter(quarter).await.unwrap();

    let resp = send(&f.state, "PUT", &uri, Some(&f.student), Some(json!({ "preference": 1 }))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The page stays readable.
    let resp = send(&f.state, "GET", "/bids", Some(&f.student), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_of(resp).await;
    assert_eq!(body["can_save"], false);
    assert_eq!(body["requests"][0]["slot"]["preference"], 2);
    assert_eq!(body["requests"][0]["slot"]["saved"], true);
  }

  #[tokio::test]
  async fn my_requests_is_for_students() {
    let f = fixture().await;
    let resp = send(&f.state, "GET", "/bids", None, None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let resp = send(&f.state, "GET", "/bids", Some(&f.owner), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = send(&f.state, "GET", "/bids", Some(&f.keen), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn student_show_includes_an_empty_bid_slot() {
    let f = fixture().await;
    let uri = format!("/courses/{}", f.public.course_id);
    let body = json_of(send(&f.state, "GET", &uri, Some(&f.keen), None).await).await;
    assert_eq!(body["bid"]["saved"], false);
    assert_eq!(body["access"]["can_bid"], true);

    let body = json_of(send(&f.state, "GET", &uri, Some(&f.owner), None).await).await;
    assert_eq!(body["bid"], Value::Null);
  }

  // ── Quarters and users ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn quarter_with_published_courses_cannot_be_unpublished() {
    let f = fixture().await;
    let resp = send(
      &f.state,
      "PATCH",
      "/quarters/2024-2025/autumn",
      Some(&f.admin),
      Some(json!({ "published": false })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = send(
      &f.state,
      "PATCH",
      "/quarters/2024-2025/autumn",
      Some(&f.owner),
      Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn admin_creates_and_activates_quarters() {
    let f = fixture().await;
    let now = Utc::now();
    let resp = send(
      &f.state,
      "POST",
      "/quarters",
      Some(&f.admin),
      Some(json!({
        "year": "2024-2025",
        "season": "winter",
        "published": true,
        "active": true,
        "course_deadline": now + Duration::days(30),
        "student_bidding_deadline": now + Duration::days(45),
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_of(resp).await;
    assert_eq!(body["label_with_current"], "Winter 2025 (current)");

    let active = f.state.store.active_quarter().await.unwrap().unwrap();
    assert_eq!(active.season, Season::Winter);

    let resp = send(&f.state, "GET", "/quarters", None, None).await;
    let body = json_of(resp).await;
    assert_eq!(body["quarters"][0]["label"], "Winter 2025");
    assert_eq!(body["quarters"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn admin_registers_users() {
    let f = fixture().await;
    let body = json!({
      "cnet": "newbie",
      "full_name": "New Student",
      "email": "newbie@example.edu",
      "role": "student",
      "course_requests": 3,
      "password": "pw",
    });

    let resp = send(&f.state, "POST", "/users", Some(&f.owner), Some(body.clone())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&f.state, "POST", "/users", Some(&f.admin), Some(body.clone())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_of(resp).await;
    assert_eq!(created["course_requests"], 3);
    assert!(created.get("password_hash").is_none());

    let resp = send(&f.state, "POST", "/users", Some(&f.admin), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn health_and_bootstrap_admin() {
    let f = fixture().await;
    let resp = send(&f.state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let config = ServerConfig {
      admin_cnet: Some("root".into()),
      admin_password_hash: Some(auth::hash_password("pw").unwrap()),
      ..config()
    };
    let created = ensure_admin(f.state.store.as_ref(), &config).await.unwrap();
    assert_eq!(created.unwrap().role, Role::Admin);
    assert!(ensure_admin(f.state.store.as_ref(), &config).await.unwrap().is_none());
  }
}
