use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;

use quizdeck::configuration::{get_configuration, DatabaseSettings};
use quizdeck::startup::run;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let server = run(listener, connection_pool.clone(), configuration.auth.clone())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

/// Registers a user, logs in, and returns their access token.
async fn authenticated_token(app: &TestApp, client: &reqwest::Client, username: &str) -> String {
    let email = format!("{}@example.com", username);

    let response = client
        .post(&format!("{}/api/users", &app.address))
        .json(&json!({
            "username": username,
            "email": email,
            "password": "SecurePass123"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());

    let response = client
        .post(&format!("{}/api/users/login", &app.address))
        .json(&json!({
            "email": email,
            "password": "SecurePass123"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_and_fetch_quiz_with_selections() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = authenticated_token(&app, &client, "quizauthor").await;

    let response = client
        .post(&format!("{}/api/quizzes", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "question": "Which keyword declares an immutable binding?",
            "quiz_type": "single_choice",
            "selections": [
                { "selection_text": "let", "is_correct": true },
                { "selection_text": "mut", "is_correct": false }
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    let created: Value = response.json().await.unwrap();
    let quiz_id = created["id"].as_i64().unwrap();
    assert_eq!(created["selections"].as_array().unwrap().len(), 2);

    let response = client
        .get(&format!("{}/api/quizzes/{}", &app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["question"], "Which keyword declares an immutable binding?");
    assert_eq!(fetched["quiz_type"], "single_choice");
    assert_eq!(fetched["selections"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_selection_leaves_no_partial_quiz_behind() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = authenticated_token(&app, &client, "quizauthor").await;

    // The second selection is invalid; the request must fail without
    // persisting the quiz or the first selection.
    let response = client
        .post(&format!("{}/api/quizzes", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "question": "Which keyword declares an immutable binding?",
            "quiz_type": "single_choice",
            "selections": [
                { "selection_text": "let", "is_correct": true },
                { "selection_text": "bad\u{0000}text", "is_correct": false }
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());

    let quiz_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count quizzes");
    assert_eq!(quiz_count, 0);

    let selection_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_selections")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count selections");
    assert_eq!(selection_count, 0);
}

#[tokio::test]
async fn create_quiz_rejects_unknown_quiz_type() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = authenticated_token(&app, &client, "quizauthor").await;

    let response = client
        .post(&format!("{}/api/quizzes", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "question": "A question",
            "quiz_type": "essay"
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn quiz_mutation_is_scoped_to_the_creator() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner_token = authenticated_token(&app, &client, "owner").await;
    let other_token = authenticated_token(&app, &client, "other").await;

    let response = client
        .post(&format!("{}/api/quizzes", &app.address))
        .header("Authorization", format!("Bearer {}", owner_token))
        .json(&json!({
            "question": "Whose quiz is this?",
            "quiz_type": "true_false"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // A different user cannot delete it.
    let response = client
        .delete(&format!("{}/api/quizzes/{}", &app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, response.status().as_u16());

    // The creator can.
    let response = client
        .delete(&format!("{}/api/quizzes/{}", &app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", owner_token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn quiz_suite_crud_round_trip() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = authenticated_token(&app, &client, "suiteauthor").await;

    let response = client
        .post(&format!("{}/api/quiz-suites", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Rust basics",
            "description": "Ownership and borrowing"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());
    let suite_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = client
        .put(&format!("{}/api/quiz-suites/{}", &app.address, suite_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Rust fundamentals" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let response = client
        .get(&format!("{}/api/quiz-suites/{}", &app.address, suite_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["title"], "Rust fundamentals");
    assert_eq!(fetched["description"], "Ownership and borrowing");
    assert!(fetched["quizzes"].as_array().unwrap().is_empty());

    let response = client
        .get(&format!("{}/api/quiz-suites", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.json::<Value>().await.unwrap().as_array().unwrap().len(), 1);

    let response = client
        .delete(&format!("{}/api/quiz-suites/{}", &app.address, suite_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn suite_read_includes_linked_quizzes() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = authenticated_token(&app, &client, "suiteauthor").await;

    let response = client
        .post(&format!("{}/api/quizzes", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "question": "Is Rust memory safe?",
            "quiz_type": "true_false"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    let quiz_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let response = client
        .post(&format!("{}/api/quiz-suites", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Safety" }))
        .send()
        .await
        .expect("Failed to execute request.");
    let suite_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Link through the join table directly; membership mutation has no
    // HTTP surface.
    sqlx::query("INSERT INTO quiz_suite_quizzes (quiz_suite_id, quiz_id) VALUES ($1, $2)")
        .bind(suite_id)
        .bind(quiz_id)
        .execute(&app.db_pool)
        .await
        .expect("Failed to link quiz to suite");

    let response = client
        .get(&format!("{}/api/quiz-suites/{}", &app.address, suite_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");

    let fetched: Value = response.json().await.unwrap();
    let quizzes = fetched["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0]["id"].as_i64().unwrap(), quiz_id);
}

#[tokio::test]
async fn user_update_with_new_password_revokes_sessions() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(&format!("{}/api/users", &app.address))
        .json(&json!({
            "username": "rotator",
            "email": "rotator@example.com",
            "password": "SecurePass123"
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    let login: Value = client
        .post(&format!("{}/api/users/login", &app.address))
        .json(&json!({
            "email": "rotator@example.com",
            "password": "SecurePass123"
        }))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    let access_token = login["access_token"].as_str().unwrap();
    let refresh_token = login["refresh_token"].as_str().unwrap();
    let user_id = login["user"]["id"].as_i64().unwrap();

    let response = client
        .put(&format!("{}/api/users/{}", &app.address, user_id))
        .header("Authorization", format!("Bearer {}", access_token))
        .json(&json!({ "password": "EvenStronger456" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    // The pre-change session handle is gone.
    let response = client
        .post(&format!("{}/api/users/refresh", &app.address))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(401, response.status().as_u16());

    // And the new password is the one that works.
    let response = client
        .post(&format!("{}/api/users/login", &app.address))
        .json(&json!({
            "email": "rotator@example.com",
            "password": "EvenStronger456"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
}
