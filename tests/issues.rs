use serde_json::json;
use trivy_issue::config::IssueConfig;
use trivy_issue::github::{issue_marker, GitHubClient, GitHubIssues, IssueManager};
use trivy_issue::model::{Finding, IssueOption, Severity, TargetResult, VulnerabilityReport};
use trivy_issue::pipeline::publish;
use trivy_issue::{Error, Outcome};
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn manager(server: &MockServer) -> IssueManager<GitHubIssues> {
    let api = GitHubClient::new(server.uri(), Some("secret".to_string()));
    IssueManager::new(GitHubIssues::new(api, "octo/hello").unwrap())
}

fn issue(number: u64, body: &str) -> serde_json::Value {
    json!({
        "number": number,
        "title": "Security Alert",
        "body": body,
        "labels": [{"name": "trivy"}, {"name": "vulnerability"}],
        "html_url": format!("https://github.com/octo/hello/issues/{}", number),
    })
}

fn option() -> IssueOption {
    IssueOption {
        title: "Security Alert".to_string(),
        body: "report body".to_string(),
        labels: vec!["trivy".to_string(), "vulnerability".to_string()],
        assignees: vec!["octocat".to_string()],
    }
}

#[tokio::test]
async fn creates_issue_when_no_open_issue_mentions_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("state", "open"))
        .and(query_param("labels", "trivy,vulnerability"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue(1, "nginx:1.19")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/hello/issues"))
        .and(body_partial_json(json!({
            "title": "Security Alert",
            "labels": ["trivy", "vulnerability"],
            "assignees": ["octocat"],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(issue(7, "created")))
        .expect(1)
        .mount(&server)
        .await;

    let response = manager(&server)
        .create_or_update("alpine:3.10", &option())
        .await
        .unwrap();

    assert_eq!(response.issue_number, 7);
    assert_eq!(response.html_url, "https://github.com/octo/hello/issues/7");
}

#[tokio::test]
async fn updates_body_of_first_matching_issue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            issue(3, "nginx:1.19"),
            issue(4, "Vulnerabilities found in image: alpine:3.10"),
            issue(5, "alpine:3.10 again"),
        ])))
        .mount(&server)
        .await;
    let expected_body = format!("{}\nreport body", issue_marker("alpine:3.10"));
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/hello/issues/4"))
        .and(body_partial_json(json!({ "body": expected_body })))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue(4, &expected_body)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let response = manager(&server)
        .create_or_update("alpine:3.10", &option())
        .await
        .unwrap();

    assert_eq!(response.issue_number, 4);
}

#[tokio::test]
async fn pull_requests_mentioning_image_are_skipped() {
    let server = MockServer::start().await;
    let mut pr = issue(2, &format!("{}\nbump base image", issue_marker("alpine:3.10")));
    pr["pull_request"] = json!({ "url": "https://api.github.com/repos/octo/hello/pulls/2" });
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([pr])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(201).set_body_json(issue(8, "created")))
        .expect(1)
        .mount(&server)
        .await;

    let response = manager(&server)
        .create_or_update("alpine:3.10", &option())
        .await
        .unwrap();

    assert_eq!(response.issue_number, 8);
}

#[tokio::test]
async fn finds_matching_issue_on_later_page() {
    let server = MockServer::start().await;
    let first_page: Vec<_> = (100..200).map(|n| issue(n, "nginx:1.19")).collect();
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(first_page)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue(
            42,
            "alpine:3.10"
        )])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/repos/octo/hello/issues/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue(42, "updated")))
        .expect(1)
        .mount(&server)
        .await;

    let response = manager(&server)
        .create_or_update("alpine:3.10", &option())
        .await
        .unwrap();

    assert_eq!(response.issue_number, 42);
}

#[tokio::test]
async fn api_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let err = manager(&server)
        .create_or_update("alpine:3.10", &option())
        .await
        .unwrap_err();

    match err {
        Error::GitHubApi { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Bad credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn publish_skips_tracker_for_clean_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let report = VulnerabilityReport::new(vec![TargetResult::new("alpine:3.10", None)]);
    let outcome = publish("alpine:3.10", &report, &manager(&server), &IssueConfig::default())
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Clean);
}

#[tokio::test]
async fn publish_files_markdown_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(201).set_body_json(issue(9, "created")))
        .expect(1)
        .mount(&server)
        .await;

    let finding = Finding {
        vulnerability_id: "CVE-2021-36159".to_string(),
        pkg_name: "apk-tools".to_string(),
        installed_version: "2.10.6-r0".to_string(),
        severity: Severity::Critical,
        ..Default::default()
    };
    let report = VulnerabilityReport::new(vec![TargetResult::new(
        "alpine:3.10 (alpine 3.10.9)",
        Some(vec![finding]),
    )]);

    let outcome = publish("alpine:3.10", &report, &manager(&server), &IssueConfig::default())
        .await
        .unwrap();

    match outcome {
        Outcome::Issue { response, findings } => {
            assert_eq!(response.issue_number, 9);
            assert_eq!(findings, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
    let text = body["body"].as_str().unwrap();
    assert!(text.contains("|N/A|CRITICAL|CVE-2021-36159|apk-tools|2.10.6-r0|N/A|N/A|"));
    assert!(text.contains("alpine:3.10"));
}
