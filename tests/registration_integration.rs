//! Integration tests for the registration wizard REST surface.
//!
//! Each test spins up the real router on a random port with short wizard
//! delays and drives a session through reqwest.

use std::time::Duration;

use axum::http::{StatusCode, header};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use hybridflow::config::{ServerConfig, WizardConfig};
use hybridflow::server::build_router;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server(wizard: WizardConfig) -> String {
    let config = ServerConfig {
        wizard,
        ..Default::default()
    };
    let app = build_router(&config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Quick submit, reset far enough out not to interfere.
fn fast_submit() -> WizardConfig {
    WizardConfig {
        submit_delay: Duration::from_millis(20),
        reset_delay: Duration::from_secs(60),
    }
}

async fn create_session(client: &reqwest::Client, base: &str) -> String {
    let resp = client
        .post(format!("{base}/api/registration"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["phase"], "identity");
    assert_eq!(body["step"], 1);
    assert_eq!(body["open"], true);
    body["id"].as_str().unwrap().to_string()
}

async fn post(client: &reqwest::Client, url: String) -> reqwest::Response {
    client.post(url).send().await.unwrap()
}

async fn patch(client: &reqwest::Client, url: String, body: Value) -> reqwest::Response {
    client.patch(url).json(&body).send().await.unwrap()
}

/// Read one XML part out of an XLSX download.
fn xlsx_part(bytes: &[u8], name: &str) -> String {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut part = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut part)
        .unwrap();
    part
}

/// Fill in and advance through all three steps, ending on step 3.
async fn complete_form(client: &reqwest::Client, session: &str) {
    let resp = patch(
        client,
        session.to_string(),
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "company": "Analytical Engines",
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(post(client, format!("{session}/next")).await.status(), StatusCode::OK);

    let resp = patch(
        client,
        session.to_string(),
        json!({
            "jobTitle": "Analyst",
            "location": "London",
            "teamSize": "11-50",
            "workMode": "Remote",
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(post(client, format!("{session}/next")).await.status(), StatusCode::OK);

    let resp = client
        .post(format!("{session}/interests"))
        .json(&json!({"interest": "AI Insights"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["phase"], "interests");
    assert_eq!(body["stepValid"], true);
}

#[tokio::test]
async fn full_registration_and_exports() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(fast_submit()).await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;
        let session = format!("{base}/api/registration/{id}");

        complete_form(&client, &session).await;

        let resp = post(&client, format!("{session}/submit")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["phase"], "success");
        assert!(body["submittedAt"].is_string());
        assert_eq!(body["record"]["interests"], json!(["AI Insights"]));

        let resp = client
            .get(format!("{session}/export/xlsx"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap(),
            "attachment; filename=\"HybridFlow_Registration_Ada_Lovelace.xlsx\""
        );
        let bytes = resp.bytes().await.unwrap();
        let strings = xlsx_part(&bytes, "xl/sharedStrings.xml");
        for text in [
            "First Name",
            "Registration Date",
            "Ada",
            "Lovelace",
            "ada@example.com",
            "Analytical Engines",
            "11-50",
            "Remote",
            "AI Insights",
        ] {
            assert!(strings.contains(&format!(">{text}<")), "missing {text}");
        }
        let sheet = xlsx_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"r="K2""#));
        let workbook = xlsx_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="User Registration""#));

        let resp = client
            .get(format!("{session}/export/pdf"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "application/pdf"
        );
        assert!(
            resp.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .contains("HybridFlow_Registration_Ada_Lovelace.pdf")
        );
        assert!(resp.bytes().await.unwrap().starts_with(b"%PDF"));

        // The record is frozen on the success screen.
        let resp = patch(&client, session.clone(), json!({"firstName": "Grace"})).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn incomplete_step_is_422_with_missing_fields() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(fast_submit()).await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;
        let session = format!("{base}/api/registration/{id}");

        patch(
            &client,
            session.clone(),
            json!({"firstName": "Ada", "email": "not-an-email"}),
        )
        .await;

        let resp = post(&client, format!("{session}/next")).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["step"], 1);
        assert_eq!(body["missing"], json!(["lastName", "email", "company"]));

        // Still on step 1.
        let body: Value = client
            .get(&session)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["step"], 1);
        assert_eq!(body["stepValid"], false);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn invalid_values_and_early_actions_are_rejected() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(fast_submit()).await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;
        let session = format!("{base}/api/registration/{id}");

        let resp = patch(&client, session.clone(), json!({"teamSize": "lots"})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = post(&client, format!("{session}/submit")).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = client
            .get(format!("{session}/export/pdf"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = client
            .get(format!("{session}/export/docx"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_bodies_get_json_400() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(fast_submit()).await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;
        let session = format!("{base}/api/registration/{id}");

        let resp = client
            .post(format!("{session}/interests"))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("interest"));

        let resp = patch(&client, session.clone(), json!({"nickname": "Ada"})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        // Nothing was applied.
        let body: Value = client
            .get(&session)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["record"]["firstName"], "");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn back_keeps_entered_data() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(fast_submit()).await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;
        let session = format!("{base}/api/registration/{id}");

        complete_form(&client, &session).await;

        let body: Value = post(&client, format!("{session}/back"))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["phase"], "professional");
        assert_eq!(body["record"]["jobTitle"], "Analyst");
        assert_eq!(body["record"]["interests"], json!(["AI Insights"]));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn success_screen_reset_ends_the_session() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(WizardConfig {
            submit_delay: Duration::from_millis(10),
            reset_delay: Duration::from_millis(100),
        })
        .await;
        let client = reqwest::Client::new();
        let id = create_session(&client, &base).await;
        let session = format!("{base}/api/registration/{id}");

        complete_form(&client, &session).await;
        assert_eq!(
            post(&client, format!("{session}/submit")).await.status(),
            StatusCode::OK
        );

        // Re-opening inside the reset window starts a fresh form and keeps
        // the session alive.
        let body: Value = post(&client, format!("{session}/open"))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["open"], true);
        assert_eq!(body["step"], 1);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            client.get(&session).send().await.unwrap().status(),
            StatusCode::OK
        );

        // Without a re-open the reset closes the wizard and the session
        // is gone.
        complete_form(&client, &session).await;
        assert_eq!(
            post(&client, format!("{session}/submit")).await.status(),
            StatusCode::OK
        );
        tokio::time::sleep(Duration::from_millis(400)).await;

        let resp = client.get(&session).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = client
            .post(format!("{session}/interests"))
            .json(&json!({"interest": "AI Insights"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn form_options_list_choices() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(fast_submit()).await;
        let body: Value = reqwest::get(format!("{base}/api/registration/options"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(
            body["teamSizes"],
            json!(["1-10", "11-50", "51-200", "201-1000", "1000+"])
        );
        assert_eq!(
            body["workModes"],
            json!(["Remote", "Hybrid", "Office-based", "Flexible"])
        );
        assert_eq!(body["interests"].as_array().unwrap().len(), 6);
        assert!(
            body["interests"]
                .as_array()
                .unwrap()
                .contains(&json!("AI Insights"))
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unknown_and_deleted_sessions() {
    timeout(TEST_TIMEOUT, async {
        let base = start_server(fast_submit()).await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("{base}/api/registration/not-a-uuid"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = client
            .get(format!(
                "{base}/api/registration/00000000-0000-4000-8000-000000000000"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let id = create_session(&client, &base).await;
        let session = format!("{base}/api/registration/{id}");
        let resp = client.delete(&session).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = client.get(&session).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = client.delete(&session).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    })
    .await
    .expect("test timed out");
}
