//! Integration tests for the GitHub forge.
//!
//! The REST client runs against a local wiremock server.

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use branchtale::forge::github::GitHubForge;
use branchtale::forge::{CreatePrRequest, Forge, ForgeError, MergeMethod, MergePrRequest};

fn create_request() -> CreatePrRequest {
    CreatePrRequest {
        owner: "acme".into(),
        repo: "widgets".into(),
        title: "Raise the request timeout".into(),
        body: "Body".into(),
        head: "fix/timeout".into(),
        base: "main".into(),
    }
}

fn merge_request(method: MergeMethod) -> MergePrRequest {
    MergePrRequest {
        owner: "acme".into(),
        repo: "widgets".into(),
        number: 7,
        method,
    }
}

async fn forge(server: &MockServer) -> GitHubForge {
    GitHubForge::with_api_base("ghp_test", server.uri())
}

mod create_pr {
    use super::*;

    #[tokio::test]
    async fn posts_and_returns_number_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls"))
            .and(header("Authorization", "Bearer ghp_test"))
            .and(header("Accept", "application/vnd.github+json"))
            .and(body_json(serde_json::json!({
                "title": "Raise the request timeout",
                "body": "Body",
                "head": "fix/timeout",
                "base": "main"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "number": 7,
                "html_url": "https://github.com/acme/widgets/pull/7",
                "state": "open"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pr = forge(&server)
            .await
            .create_pr(create_request())
            .await
            .unwrap();
        assert_eq!(pr.number, 7);
        assert_eq!(pr.url, "https://github.com/acme/widgets/pull/7");
    }

    #[tokio::test]
    async fn unauthorized_is_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "message": "Bad credentials" })),
            )
            .mount(&server)
            .await;

        let err = forge(&server)
            .await
            .create_pr(create_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn forbidden_names_scopes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("X-Accepted-OAuth-Scopes", "repo")
                    .set_body_json(serde_json::json!({ "message": "Resource not accessible" })),
            )
            .mount(&server)
            .await;

        let err = forge(&server)
            .await
            .create_pr(create_request())
            .await
            .unwrap_err();
        match err {
            ForgeError::AuthFailed(message) => {
                assert!(message.contains("Resource not accessible"));
                assert!(message.contains("required scopes: repo"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn validation_error_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "message": "Validation Failed",
                "errors": [{ "message": "A pull request already exists for acme:fix/timeout." }]
            })))
            .mount(&server)
            .await;

        let err = forge(&server)
            .await
            .create_pr(create_request())
            .await
            .unwrap_err();
        match err {
            ForgeError::ApiError { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("Validation Failed"));
                assert!(message.contains("already exists"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = forge(&server)
            .await
            .create_pr(create_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::RateLimited));
    }

    #[tokio::test]
    async fn missing_repository() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({ "message": "Not Found" })),
            )
            .mount(&server)
            .await;

        let err = forge(&server)
            .await
            .create_pr(create_request())
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::NotFound(ref m) if m == "Not Found"));
    }
}

mod merge_pr {
    use super::*;

    #[tokio::test]
    async fn merged_returns_sha() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/acme/widgets/pulls/7/merge"))
            .and(body_json(serde_json::json!({ "merge_method": "merge" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
                "merged": true,
                "message": "Pull Request successfully merged"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = forge(&server)
            .await
            .merge_pr(merge_request(MergeMethod::Merge))
            .await
            .unwrap();
        assert!(outcome.merged);
        assert_eq!(
            outcome.sha.as_deref(),
            Some("6dcb09b5b57875f334f61aebed695e2e4193db5e")
        );
    }

    #[tokio::test]
    async fn method_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(body_json(serde_json::json!({ "merge_method": "squash" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sha": "abc",
                "merged": true,
                "message": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        forge(&server)
            .await
            .merge_pr(merge_request(MergeMethod::Squash))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn not_mergeable_is_an_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(405).set_body_json(serde_json::json!({
                "message": "Required status check \"ci\" is expected."
            })))
            .mount(&server)
            .await;

        let outcome = forge(&server)
            .await
            .merge_pr(merge_request(MergeMethod::Merge))
            .await
            .unwrap();
        assert!(!outcome.merged);
        assert!(outcome.sha.is_none());
        assert!(outcome.message.contains("Required status check"));
    }

    #[tokio::test]
    async fn head_moved_is_an_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "message": "Head branch was modified. Review and try the merge again."
            })))
            .mount(&server)
            .await;

        let outcome = forge(&server)
            .await
            .merge_pr(merge_request(MergeMethod::Rebase))
            .await
            .unwrap();
        assert!(!outcome.merged);
    }

    #[tokio::test]
    async fn server_error_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = forge(&server)
            .await
            .merge_pr(merge_request(MergeMethod::Merge))
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::ApiError { status: 502, .. }));
    }
}

#[tokio::test]
async fn unreachable_api_is_network_error() {
    // Port 9 on loopback refuses connections.
    let forge = GitHubForge::with_api_base("ghp_test", "http://127.0.0.1:9");
    let err = forge.create_pr(create_request()).await.unwrap_err();
    assert!(matches!(err, ForgeError::NetworkError(_)));
}
