//! Profile, draft, submission, backoffice and certificate routes

mod common;

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use devicevault_server::models::Certificate;
    use devicevault_server::repos::CertificateRepository;

    use super::common::{submission_body, TestApp, Wallet};

    async fn submit(app: &TestApp, token: &str) -> Value {
        let (status, body) = app
            .request(
                Method::POST,
                "/api/submissions",
                Some(token),
                Some(submission_body()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "submission failed: {body}");
        body
    }

    async fn review(
        app: &TestApp,
        operator_token: &str,
        id: &str,
        status: &str,
    ) -> (StatusCode, Value) {
        app.request(
            Method::POST,
            &format!("/api/admin/submissions/{id}/review"),
            Some(operator_token),
            Some(json!({ "status": status, "notes": "checked" })),
        )
        .await
    }

    #[tokio::test]
    async fn test_profile_created_lazily_and_updated() {
        let app = TestApp::new();
        let wallet = Wallet::generate();
        let token = app.token(&wallet).await;

        let (status, body) = app
            .request(Method::GET, "/api/profile", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["walletAddress"], wallet.address.as_str());
        assert_eq!(body["email"], Value::Null);

        let (status, body) = app
            .request(
                Method::PUT,
                "/api/profile",
                Some(token.as_str()),
                Some(json!({ "email": "ops@example.com", "name": "Dana" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ops@example.com");
        assert_eq!(body["name"], "Dana");

        // Absent fields are left unchanged
        let (_, body) = app
            .request(
                Method::PUT,
                "/api/profile",
                Some(token.as_str()),
                Some(json!({ "company": "Acme" })),
            )
            .await;
        assert_eq!(body["email"], "ops@example.com");
        assert_eq!(body["company"], "Acme");
    }

    #[tokio::test]
    async fn test_profile_rejects_invalid_email() {
        let app = TestApp::new();
        let token = app.token(&Wallet::generate()).await;

        let (status, body) = app
            .request(
                Method::PUT,
                "/api/profile",
                Some(token.as_str()),
                Some(json!({ "email": "not-an-email" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");
    }

    #[tokio::test]
    async fn test_draft_lifecycle() {
        let app = TestApp::new();
        let token = app.token(&Wallet::generate()).await;

        let (status, _) = app
            .request(Method::GET, "/api/drafts", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .request(
                Method::PUT,
                "/api/drafts",
                Some(token.as_str()),
                Some(json!({ "currentStep": 2, "data": { "deviceName": "Logger" } })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentStep"], 2);

        let (status, body) = app
            .request(Method::GET, "/api/drafts", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["deviceName"], "Logger");

        for _ in 0..2 {
            let (status, _) = app
                .request(Method::DELETE, "/api/drafts", Some(token.as_str()), None)
                .await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let (status, _) = app
            .request(Method::GET, "/api/drafts", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_draft_validation() {
        let app = TestApp::new();
        let token = app.token(&Wallet::generate()).await;

        for body in [
            json!({ "currentStep": 0, "data": {} }),
            json!({ "currentStep": 11, "data": {} }),
            json!({ "currentStep": 1, "data": [1, 2, 3] }),
            json!({ "currentStep": 1, "data": {}, "extra": true }),
        ] {
            let (status, response) = app
                .request(Method::PUT, "/api/drafts", Some(token.as_str()), Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(response["error"], "ValidationError");
        }
    }

    #[tokio::test]
    async fn test_submission_clears_draft_and_lists_own() {
        let app = TestApp::new();
        let token = app.token(&Wallet::generate()).await;
        let other = app.token(&Wallet::generate()).await;

        app.request(
            Method::PUT,
            "/api/drafts",
            Some(token.as_str()),
            Some(json!({ "currentStep": 5, "data": {} })),
        )
        .await;

        let created = submit(&app, &token).await;
        assert_eq!(created["status"], "PENDING");
        assert_eq!(created["documents"].as_array().unwrap().len(), 1);

        let (status, _) = app
            .request(Method::GET, "/api/drafts", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        app.clock.advance(Duration::seconds(1));
        let second = submit(&app, &token).await;
        let (status, body) = app
            .request(Method::GET, "/api/submissions", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["id"], second["id"]);

        let (_, body) = app
            .request(Method::GET, "/api/submissions", Some(other.as_str()), None)
            .await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submission_hidden_from_other_users() {
        let app = TestApp::new();
        let owner = app.token(&Wallet::generate()).await;
        let stranger = app.token(&Wallet::generate()).await;
        let operator = app.token(&app.operator).await;

        let created = submit(&app, &owner).await;
        let uri = format!("/api/submissions/{}", created["id"].as_str().unwrap());

        let (status, _) = app.request(Method::GET, &uri, Some(owner.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.request(Method::GET, &uri, Some(stranger.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");

        let (status, _) = app.request(Method::GET, &uri, Some(operator.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .request(Method::GET, "/api/submissions/not-a-uuid", Some(owner.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submission_rejects_bad_document_url() {
        let app = TestApp::new();
        let token = app.token(&Wallet::generate()).await;

        let mut body = submission_body();
        body["documents"][0]["url"] = json!("not a url");

        let (status, response) = app
            .request(Method::POST, "/api/submissions", Some(token.as_str()), Some(body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "ValidationError");
    }

    #[tokio::test]
    async fn test_backoffice_requires_operator() {
        let app = TestApp::new();
        let token = app.token(&Wallet::generate()).await;
        let created = submit(&app, &token).await;

        let (status, body) = app
            .request(Method::GET, "/api/admin/submissions", Some(token.as_str()), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");

        let (status, _) = review(&app, &token, created["id"].as_str().unwrap(), "APPROVED").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .request(Method::GET, "/api/admin/submissions", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_review_flow_and_status_filter() {
        let app = TestApp::new();
        let owner = app.token(&Wallet::generate()).await;
        let operator = app.token(&app.operator).await;

        let approved = submit(&app, &owner).await;
        let pending = submit(&app, &owner).await;
        let approved_id = approved["id"].as_str().unwrap();

        let (status, body) = review(&app, &operator, approved_id, "APPROVED").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "APPROVED");
        assert_eq!(body["reviewNotes"], "checked");

        let (status, body) = review(&app, &operator, approved_id, "REJECTED").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Conflict");

        let (status, _) = review(&app, &operator, &Uuid::new_v4().to_string(), "APPROVED").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = review(&app, &operator, pending["id"].as_str().unwrap(), "PENDING").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .request(
                Method::GET,
                "/api/admin/submissions?status=PENDING",
                Some(operator.as_str()),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], pending["id"]);

        let (_, body) = app
            .request(Method::GET, "/api/admin/submissions", Some(operator.as_str()), None)
            .await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _) = app
            .request(
                Method::GET,
                "/api/admin/submissions?status=UNKNOWN",
                Some(operator.as_str()),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_certificate_only_for_approved_submission() {
        let app = TestApp::new();
        let owner = app.token(&Wallet::generate()).await;
        let operator = app.token(&app.operator).await;

        let created = submit(&app, &owner).await;
        let id = created["id"].as_str().unwrap();
        let request = json!({ "submissionId": id });

        let (status, body) = app
            .request(
                Method::POST,
                "/api/certificates/generate",
                Some(owner.as_str()),
                Some(request.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Conflict");

        review(&app, &operator, id, "APPROVED").await;

        let (status, first) = app
            .request(
                Method::POST,
                "/api/certificates/generate",
                Some(owner.as_str()),
                Some(request.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["submissionId"], id);
        assert_eq!(first["contentHash"].as_str().unwrap().len(), 64);

        let (status, second) = app
            .request(
                Method::POST,
                "/api/certificates/generate",
                Some(owner.as_str()),
                Some(request),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["id"], first["id"]);
    }

    #[tokio::test]
    async fn test_certificate_for_other_users_submission_is_not_found() {
        let app = TestApp::new();
        let owner = app.token(&Wallet::generate()).await;
        let stranger = app.token(&Wallet::generate()).await;
        let operator = app.token(&app.operator).await;

        let created = submit(&app, &owner).await;
        let id = created["id"].as_str().unwrap();
        review(&app, &operator, id, "APPROVED").await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/certificates/generate",
                Some(stranger.as_str()),
                Some(json!({ "submissionId": id })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_verification() {
        let app = TestApp::new();
        let owner = app.token(&Wallet::generate()).await;
        let operator = app.token(&app.operator).await;

        let created = submit(&app, &owner).await;
        let id = created["id"].as_str().unwrap();
        review(&app, &operator, id, "APPROVED").await;

        let (_, cert) = app
            .request(
                Method::POST,
                "/api/certificates/generate",
                Some(owner.as_str()),
                Some(json!({ "submissionId": id })),
            )
            .await;
        let uri = format!("/api/certificates/{}/verify", cert["id"].as_str().unwrap());

        let (status, body) = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["certificate"]["serialNumber"], "*********7654");
        assert_eq!(body["certificate"]["contentHash"], cert["contentHash"]);
        assert!(body["certificate"].get("walletAddress").is_none());
        assert!(body["certificate"].get("submissionId").is_none());
    }

    #[tokio::test]
    async fn test_unknown_certificate_is_invalid() {
        let app = TestApp::new();

        for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
            let (status, body) = app
                .request(
                    Method::GET,
                    &format!("/api/certificates/{id}/verify"),
                    None,
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "valid": false }));
        }
    }

    #[tokio::test]
    async fn test_certificate_with_stale_hash_is_invalid() {
        let app = TestApp::new();
        let owner = app.token(&Wallet::generate()).await;
        let operator = app.token(&app.operator).await;

        let created = submit(&app, &owner).await;
        let id = created["id"].as_str().unwrap();
        review(&app, &operator, id, "APPROVED").await;

        let (_, issued) = app
            .request(
                Method::POST,
                "/api/certificates/generate",
                Some(owner.as_str()),
                Some(json!({ "submissionId": id })),
            )
            .await;
        let cert_id: Uuid = issued["id"].as_str().unwrap().parse().unwrap();
        let cert = app.repos.certificates.get(cert_id).await.unwrap().unwrap();

        // Same hash over a different serial number
        let tampered = Certificate {
            id: Uuid::new_v4(),
            submission_id: Uuid::new_v4(),
            serial_number: "SN-999".to_string(),
            ..cert
        };
        let (_, created) = app
            .repos
            .certificates
            .insert_or_get(&tampered)
            .await
            .unwrap();
        assert!(created);

        let (status, body) = app
            .request(
                Method::GET,
                &format!("/api/certificates/{}/verify", tampered.id),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "valid": false }));

        let (status, body) = app
            .request(
                Method::GET,
                &format!("/api/certificates/{cert_id}/verify"),
                None,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let app = TestApp::new();
        let response = app
            .router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert!(headers.contains_key("content-security-policy"));
        assert_eq!(headers["cache-control"], "no-store");
    }
}
