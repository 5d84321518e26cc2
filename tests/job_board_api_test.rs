use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use jobboard_backend::models::job::Job;
use jobboard_backend::services::application_service::ApplicationService;
use jobboard_backend::services::job_service::{JobService, NewJob};
use jobboard_backend::services::storage_service::StorageService;
use jobboard_backend::services::user_service::{NewUser, ProfileUpdate, UserService};
use jobboard_backend::utils::token::issue_token;

const TEST_SECRET: &str = "test_secret_key";

async fn setup_pool() -> PgPool {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", TEST_SECRET);
    env::set_var("TOKEN_TTL_HOURS", "24");
    env::set_var("CLOUDINARY_CLOUD_NAME", "test-cloud");
    env::set_var("CLOUDINARY_API_KEY", "key");
    env::set_var("CLOUDINARY_API_SECRET", "secret");
    let _ = jobboard_backend::config::init_config();

    let pool = jobboard_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

/// Local stand-in for the storage gateway: every destroy succeeds.
async fn spawn_storage_gateway() -> String {
    let app = Router::new().route(
        "/v1_1/:cloud/:resource_type/destroy",
        post(|| async { Json(json!({"result": "ok"})) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind gateway");
    let addr = listener.local_addr().expect("gateway addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

fn local_storage(api_base: String) -> StorageService {
    StorageService::new(
        Client::new(),
        api_base,
        "test-cloud".to_string(),
        "key".to_string(),
        "secret".to_string(),
        None,
    )
}

async fn seed_user(pool: &PgPool, role: &str) -> Uuid {
    let user = UserService::new(pool.clone())
        .create(NewUser {
            name: format!("{} user", role),
            email: format!("{}_{}@example.com", role, Uuid::new_v4()),
            password: "correct horse battery".to_string(),
            role: role.to_string(),
            bio: String::new(),
            skills: Vec::new(),
            resume_url: String::new(),
            profile_picture_url: String::new(),
        })
        .await
        .expect("seed user");
    user.id
}

async fn seed_job(pool: &PgPool, storage: &StorageService, employer_id: Uuid) -> Job {
    JobService::new(pool.clone(), storage.clone())
        .create(NewJob {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build the backend".to_string(),
            location: "Remote".to_string(),
            salary: rust_decimal::Decimal::from(90_000),
            employer_id,
            logo_url: None,
            tags: vec!["rust".to_string()],
            deadline: chrono::Utc::now() + chrono::Duration::days(30),
        })
        .await
        .expect("seed job")
}

async fn seed_application(
    pool: &PgPool,
    job_id: Uuid,
    applicant_id: Uuid,
    resume_url: &str,
    resume_public_id: Option<&str>,
) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO applications (job_id, applicant_id, name, email, resume_url, resume_public_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(job_id)
    .bind(applicant_id)
    .bind("Applicant")
    .bind(format!("applicant_{}@example.com", applicant_id))
    .bind(resume_url)
    .bind(resume_public_id)
    .fetch_one(pool)
    .await
    .expect("seed application")
}

#[tokio::test]
async fn duplicate_application_conflicts_and_keeps_one_row() {
    let pool = setup_pool().await;
    let app_state = jobboard_backend::AppState::new(pool.clone());
    let employer = seed_user(&pool, "employer").await;
    let candidate = seed_user(&pool, "candidate").await;
    let job = seed_job(&pool, &app_state.storage, employer).await;

    let router = Router::new()
        .route(
            "/api/applications",
            post(jobboard_backend::routes::application::submit_application),
        )
        .with_state(app_state);

    let token = issue_token(candidate, "candidate", TEST_SECRET, 24).expect("token");
    let payload = json!({
        "jobId": job.id,
        "applicantId": candidate,
        "name": "Alice",
        "email": "alice@example.com",
        "resume": "https://res.cloudinary.com/test-cloud/raw/upload/v1/resumes/alice_cv.pdf",
    });
    let request = || {
        Request::builder()
            .method("POST")
            .uri("/api/applications")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::from(payload.to_string()))
            .unwrap()
    };

    let resp = router.clone().oneshot(request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = router.clone().oneshot(request()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let body: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "You have already applied to this job");

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE job_id = $1 AND applicant_id = $2",
    )
    .bind(job.id)
    .bind(candidate)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn cascade_delete_counts_applications_and_resumes() {
    let pool = setup_pool().await;
    let storage = local_storage(spawn_storage_gateway().await);
    let job_service = JobService::new(pool.clone(), storage.clone());

    let employer = seed_user(&pool, "employer").await;
    let job = seed_job(&pool, &storage, employer).await;

    // two applications with resolvable locators, one with a foreign URL and
    // no stored public id
    let tag = Uuid::new_v4();
    for n in 0..2 {
        let candidate = seed_user(&pool, "candidate").await;
        let public_id = format!("resumes/cascade_{}_{}", tag, n);
        seed_application(
            &pool,
            job.id,
            candidate,
            &format!(
                "https://res.cloudinary.com/test-cloud/raw/upload/v1/{}.pdf",
                public_id
            ),
            Some(&public_id),
        )
        .await;
    }
    let candidate = seed_user(&pool, "candidate").await;
    seed_application(
        &pool,
        job.id,
        candidate,
        "https://example.com/files/old_cv.pdf",
        None,
    )
    .await;

    let outcome = job_service.delete_cascade(&job).await.expect("cascade");
    assert_eq!(outcome.deleted_applications, 3);
    assert_eq!(outcome.deleted_resumes, 2);

    let jobs_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE id = $1")
        .bind(job.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(jobs_left, 0);
    let apps_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE job_id = $1")
        .bind(job.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(apps_left, 0);

    // both destroys were confirmed by the gateway, so nothing was queued
    let queued: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM storage_cleanup_queue WHERE public_id LIKE $1",
    )
    .bind(format!("resumes/cascade_{}_%", tag))
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(queued, 0);
}

#[tokio::test]
async fn delete_without_locator_still_removes_record() {
    let pool = setup_pool().await;
    let storage = local_storage(spawn_storage_gateway().await);
    let service = ApplicationService::new(pool.clone(), storage.clone());

    let employer = seed_user(&pool, "employer").await;
    let candidate = seed_user(&pool, "candidate").await;
    let job = seed_job(&pool, &storage, employer).await;
    let id = seed_application(
        &pool,
        job.id,
        candidate,
        "https://example.com/files/cv.pdf",
        None,
    )
    .await;

    let application = service.get_by_id(id).await.expect("fetch");
    let remote_deleted = service.delete(&application).await.expect("delete");
    assert!(!remote_deleted);

    let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(left, 0);
}

#[tokio::test]
async fn partial_profile_update_keeps_omitted_fields() {
    let pool = setup_pool().await;
    let user_service = UserService::new(pool.clone());

    let user = user_service
        .create(NewUser {
            name: "Original Name".to_string(),
            email: format!("profile_{}@example.com", Uuid::new_v4()),
            password: "correct horse battery".to_string(),
            role: "candidate".to_string(),
            bio: "Original bio".to_string(),
            skills: vec!["rust".to_string(), "sql".to_string()],
            resume_url: "https://res.cloudinary.com/test-cloud/raw/upload/v1/resumes/cv.pdf"
                .to_string(),
            profile_picture_url: String::new(),
        })
        .await
        .expect("seed user");

    let updated = user_service
        .update_profile(
            user.id,
            ProfileUpdate {
                bio: Some("Updated bio".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.bio, "Updated bio");
    assert_eq!(updated.name, "Original Name");
    assert_eq!(updated.skills, vec!["rust", "sql"]);
    assert_eq!(updated.resume_url, user.resume_url);
}
