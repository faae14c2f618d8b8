//! Integration tests for the exam-prep backend.
//!
//! Each test boots the real router on an ephemeral port and drives it through
//! the typed client, so cache, classification, and authorization behavior are
//! exercised end to end.

use std::sync::Arc;

use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::client::cache::{QueryKey, QueryStatus};
use crate::client::{ClientError, ExamPrepClient};
use crate::config::Config;
use crate::daykey;
use crate::db::{init_database, Repository};
use crate::models::{ContentType, UserProfile, UserRole};
use crate::{create_router, AppState};

const ADMIN: &str = "admin-principal";

/// Test fixture for integration tests.
struct TestFixture {
    base_url: String,
    pool: SqlitePool,
    server: JoinHandle<()>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(None).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool.clone()));
        repo.seed_admin(ADMIN).await.expect("Failed to seed admin");

        // Create config
        let config = Config {
            api_psk: psk,
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            admin_principals: vec![ADMIN.to_string()],
        };

        let state = AppState {
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            base_url,
            pool,
            server,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn admin_client(&self) -> ExamPrepClient {
        ExamPrepClient::connect(self.base_url.as_str()).with_principal(ADMIN)
    }

    fn client_as(&self, principal: &str) -> ExamPrepClient {
        ExamPrepClient::connect(self.base_url.as_str()).with_principal(principal)
    }

    fn anonymous_client(&self) -> ExamPrepClient {
        ExamPrepClient::connect(self.base_url.as_str())
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = reqwest::get(fixture.url("/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::with_psk(Some("secret-key".to_string())).await;

    // Request without API key
    let client = reqwest::Client::new();
    let resp = client
        .get(fixture.url("/api/study-materials"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::with_psk(Some("correct-key".to_string())).await;

    // Request with wrong API key
    let client = reqwest::Client::new();
    let resp = client
        .get(fixture.url("/api/study-materials"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_PSK");
}

#[tokio::test]
async fn test_auth_valid_psk() {
    let fixture = TestFixture::with_psk(Some("test-api-key".to_string())).await;

    let client = ExamPrepClient::connect(fixture.base_url.as_str())
        .with_api_key("test-api-key")
        .with_principal(ADMIN);

    let materials = client.get_all_study_materials().await.unwrap();
    assert!(materials.is_empty());
}

#[tokio::test]
async fn test_study_material_crud() {
    let fixture = TestFixture::new().await;
    let client = fixture.admin_client();

    // Add
    let id = client
        .add_study_material(
            "NCERT History Class 10",
            "upsc-hindi",
            ContentType::PdfBook,
            "https://example.org/history.pdf",
        )
        .await
        .unwrap();

    // List reflects the new record
    let all = client.get_all_study_materials().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].title, "NCERT History Class 10");
    assert_eq!(all[0].content_type, ContentType::PdfBook);

    // Get by id
    let found = client.get_study_material_by_id(id).await.unwrap();
    assert_eq!(found.unwrap().subject, "upsc-hindi");

    // Delete
    client.delete_study_material(id).await.unwrap();
    let after = client.get_all_study_materials().await.unwrap();
    assert!(after.is_empty());
    assert_eq!(client.get_study_material_by_id(id).await.unwrap(), None);
}

#[tokio::test]
async fn test_subject_key_filtering_end_to_end() {
    let fixture = TestFixture::new().await;
    let client = fixture.admin_client();

    for subject in ["upsc-hindi", "upsc-english", "tat-hindi"] {
        client
            .add_study_material("Practice Set", subject, ContentType::Book, "")
            .await
            .unwrap();
    }

    // Exact, case-sensitive match; insertion order preserved
    let matched = client
        .get_study_materials_by_subject("upsc-hindi")
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].subject, "upsc-hindi");

    let none = client
        .get_study_materials_by_subject("upsc-gujarati")
        .await
        .unwrap();
    assert!(none.is_empty());

    // Empty url was stored as the placeholder
    assert_eq!(matched[0].url, "#");
}

#[tokio::test]
async fn test_study_materials_by_type() {
    let fixture = TestFixture::new().await;
    let client = fixture.admin_client();

    client
        .add_study_material("Polity Lecture", "gpsc-english", ContentType::VideoLecture, "")
        .await
        .unwrap();
    client
        .add_study_material("Polity Textbook", "gpsc-english", ContentType::Book, "")
        .await
        .unwrap();

    let videos = client
        .get_study_materials_by_type(ContentType::VideoLecture)
        .await
        .unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "Polity Lecture");
}

#[tokio::test]
async fn test_unauthorized_write_surfaces_permission_denied() {
    let fixture = TestFixture::new().await;

    // Authenticated, but not an admin
    let student = fixture.client_as("student-principal");
    let err = student
        .add_study_material("Notes", "tet-gujarati", ContentType::PdfBook, "")
        .await
        .unwrap_err();

    // The permission-denied variant, not the generic try-again one
    assert_eq!(
        err,
        ClientError::PermissionDenied(
            "You do not have permission to add study materials.".to_string()
        )
    );

    // Anonymous callers are refused the same way
    let anonymous = fixture.anonymous_client();
    let err = anonymous.delete_study_material(1).await.unwrap_err();
    assert!(matches!(err, ClientError::PermissionDenied(_)));

    // Nothing was written
    let admin = fixture.admin_client();
    assert!(admin.get_all_study_materials().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_side_validation() {
    let fixture = TestFixture::new().await;

    let client = reqwest::Client::new();

    // Empty title rejected even though the request is otherwise well-formed
    let resp = client
        .post(fixture.url("/api/study-materials"))
        .header("x-principal", ADMIN)
        .json(&json!({
            "title": "   ",
            "subject": "upsc-hindi",
            "contentType": "PdfBook",
            "url": "#"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Year outside [2000, 2100] rejected
    let resp = client
        .post(fixture.url("/api/previous-year-papers"))
        .header("x-principal", ADMIN)
        .json(&json!({
            "year": 1999,
            "subject": "General Studies",
            "examName": "upsc-hindi",
            "url": "#"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_previous_year_paper_crud() {
    let fixture = TestFixture::new().await;
    let client = fixture.admin_client();

    let id = client
        .add_previous_year_paper(2022, "General Studies Paper I", "upsc-hindi", "")
        .await
        .unwrap();
    client
        .add_previous_year_paper(2023, "Child Development", "tet-gujarati", "")
        .await
        .unwrap();

    let all = client.get_all_previous_year_papers().await.unwrap();
    assert_eq!(all.len(), 2);

    // Papers are keyed by exam name
    let by_exam = client
        .get_previous_year_papers_by_exam("upsc-hindi")
        .await
        .unwrap();
    assert_eq!(by_exam.len(), 1);
    assert_eq!(by_exam[0].year, 2022);

    let by_subject = client
        .get_previous_year_papers_by_subject("Child Development")
        .await
        .unwrap();
    assert_eq!(by_subject.len(), 1);

    let found = client.get_previous_year_paper_by_id(id).await.unwrap();
    assert_eq!(found.unwrap().exam_name, "upsc-hindi");

    client.delete_previous_year_paper(id).await.unwrap();
    assert_eq!(client.get_previous_year_paper_by_id(id).await.unwrap(), None);
}

#[tokio::test]
async fn test_daily_pollution_by_day() {
    let fixture = TestFixture::new().await;
    let client = fixture.admin_client();

    let today = daykey::today_day_key();

    let id = client
        .add_daily_pollution_entry(today, "Moderate", "Vehicle emissions", "Wear a mask outdoors")
        .await
        .unwrap();
    client
        .add_daily_pollution_entry(today - 1, "Good", "None significant", "Enjoy outdoor activities")
        .await
        .unwrap();

    let todays = client.get_daily_pollution_by_day(today).await.unwrap();
    assert_eq!(todays.len(), 1);
    assert_eq!(todays[0].air_quality, "Moderate");

    let yesterdays = client.get_daily_pollution_by_day(today - 1).await.unwrap();
    assert_eq!(yesterdays.len(), 1);

    let all = client.get_all_daily_pollution_entries().await.unwrap();
    assert_eq!(all.len(), 2);

    client.delete_daily_pollution_entry(id).await.unwrap();
    let after = client.get_daily_pollution_by_day(today).await.unwrap();
    assert!(after.is_empty());
}

#[tokio::test]
async fn test_daily_test_series_reads() {
    let fixture = TestFixture::new().await;
    let client = fixture.anonymous_client();

    let today = daykey::today_day_key();

    // No write surface exists for test series; rows are managed out of band.
    for (day, subject, name) in [
        (today, "upsc-hindi", "Polity Mock 12"),
        (today, "gpsc-gujarati", "Geography Mock 4"),
        (today - 1, "upsc-hindi", "Polity Mock 11"),
    ] {
        sqlx::query(
            "INSERT INTO daily_test_series (day, subject, test_name, description, questions_url, video_lecture_url, answers_url) VALUES (?, ?, ?, ?, '#', '#', '#')",
        )
        .bind(day)
        .bind(subject)
        .bind(name)
        .bind("Daily practice test")
        .execute(&fixture.pool)
        .await
        .unwrap();
    }

    let todays = client.get_daily_test_series_by_day(today).await.unwrap();
    assert_eq!(todays.len(), 2);
    assert_eq!(todays[0].test_name, "Polity Mock 12");

    let by_subject = client
        .get_daily_test_series_by_subject("upsc-hindi")
        .await
        .unwrap();
    assert_eq!(by_subject.len(), 2);

    let all = client.get_all_daily_test_series().await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_roles_and_admin_assignment() {
    let fixture = TestFixture::new().await;

    // Anonymous callers are guests
    let anonymous = fixture.anonymous_client();
    assert_eq!(anonymous.get_caller_user_role().await.unwrap(), UserRole::Guest);
    assert!(!anonymous.is_caller_admin().await.unwrap());

    // Authenticated callers without an assignment default to plain users
    let student = fixture.client_as("student-principal");
    assert_eq!(student.get_caller_user_role().await.unwrap(), UserRole::User);

    // Seeded admin
    let admin = fixture.admin_client();
    assert_eq!(admin.get_caller_user_role().await.unwrap(), UserRole::Admin);
    assert!(admin.is_caller_admin().await.unwrap());

    // Admin promotes a colleague; the colleague's next session sees it
    admin
        .assign_user_role("colleague-principal", UserRole::Admin)
        .await
        .unwrap();
    let colleague = fixture.client_as("colleague-principal");
    assert!(colleague.is_caller_admin().await.unwrap());

    // Non-admins cannot assign roles
    let err = student
        .assign_user_role("student-principal", UserRole::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_profile_save_and_fetch() {
    let fixture = TestFixture::new().await;
    let client = fixture.client_as("student-principal");

    // Nothing stored yet
    assert_eq!(client.get_caller_user_profile().await.unwrap(), None);

    let profile = UserProfile {
        name: "Asha Patel".to_string(),
    };
    client.save_caller_user_profile(&profile).await.unwrap();

    // The save invalidated the cached profile query
    let fetched = client.get_caller_user_profile().await.unwrap();
    assert_eq!(fetched, Some(profile.clone()));

    // Visible through the by-principal lookup as well
    let other = fixture.anonymous_client();
    let looked_up = other.get_user_profile("student-principal").await.unwrap();
    assert_eq!(looked_up, Some(profile));

    // Saving a blank name never reaches the backend
    let err = client
        .save_caller_user_profile(&UserProfile { name: "  ".to_string() })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_mutation_invalidates_exactly_the_affected_queries() {
    let fixture = TestFixture::new().await;
    let client = fixture.admin_client();

    // Prime both caches
    assert!(client.get_all_study_materials().await.unwrap().is_empty());
    assert!(client.get_all_previous_year_papers().await.unwrap().is_empty());

    client
        .add_study_material("Economics Notes", "gpsc-english", ContentType::PdfBook, "")
        .await
        .unwrap();

    // The materials query was marked stale and refetches...
    let materials = client.get_all_study_materials().await.unwrap();
    assert_eq!(materials.len(), 1);

    // ...while the papers query is still the cached value, untouched
    let papers_entry = client
        .cache()
        .peek(&QueryKey::new(["previousYearPapers"]))
        .await
        .unwrap();
    assert!(!papers_entry.is_stale);
    assert_eq!(papers_entry.status, QueryStatus::Success);
}

#[tokio::test]
async fn test_failed_refetch_retains_cached_value() {
    let fixture = TestFixture::new().await;
    let client = fixture.admin_client();

    client
        .add_study_material("Science Digest", "class3-gujarati", ContentType::Book, "")
        .await
        .unwrap();
    let before = client.get_all_study_materials().await.unwrap();
    assert_eq!(before.len(), 1);

    // Backend goes away; force a refetch of the cached query
    fixture.server.abort();
    client
        .cache()
        .invalidate(&QueryKey::new(["studyMaterials"]))
        .await;

    // The stale value is still served and the error flag is observable
    let after = client.get_all_study_materials().await.unwrap();
    assert_eq!(after, before);

    let entry = client
        .cache()
        .peek(&QueryKey::new(["studyMaterials"]))
        .await
        .unwrap();
    assert_eq!(entry.status, QueryStatus::Error);
    assert!(entry.error.is_some());
    assert!(entry.value.is_some());
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    // Raw surface: structured NOT_FOUND envelope
    let resp = reqwest::get(fixture.url("/api/study-materials/424242"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // Typed surface: a missing record is simply absent
    let client = fixture.anonymous_client();
    assert_eq!(client.get_study_material_by_id(424242).await.unwrap(), None);

    // Deleting a missing record is a generic failure, not a permission one
    let admin = fixture.admin_client();
    let err = admin.delete_study_material(424242).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Failed("Failed to delete study materials. Please try again.".to_string())
    );
}

#[tokio::test]
async fn test_unknown_content_type_query_is_rejected() {
    let fixture = TestFixture::new().await;

    let resp = reqwest::get(fixture.url("/api/study-materials?contentType=Hologram"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
