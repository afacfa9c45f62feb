// tests/providers_workday.rs
use internship_sentinel::discovery::providers::workday::{
    WorkdayInterceptProvider, WorkdayProvider, WorkdayTarget, PAGE_SIZE,
};
use internship_sentinel::JobProvider;
use mockito::Matcher;
use serde_json::json;

const GET_PATH: &str = "/wday/cxs/acme/External/getJobs";

fn page(start: usize, n: usize) -> String {
    let postings: Vec<_> = (start..start + n)
        .map(|i| {
            json!({
                "title": format!("Engineering Intern {i}"),
                "jobPostingId": format!("JR-{i}"),
                "externalPath": format!("/job/Remote/Engineering-Intern_JR-{i}")
            })
        })
        .collect();
    json!({ "total": 60, "jobPostings": postings }).to_string()
}

fn skip(offset: usize) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("$skip".into(), offset.to_string()),
        Matcher::UrlEncoded("$top".into(), PAGE_SIZE.to_string()),
    ])
}

#[tokio::test]
async fn get_channel_drains_every_page_until_empty() {
    let mut server = mockito::Server::new_async().await;
    let p0 = server
        .mock("GET", GET_PATH)
        .match_query(skip(0))
        .with_status(200)
        .with_body(page(0, PAGE_SIZE))
        .create_async()
        .await;
    let p1 = server
        .mock("GET", GET_PATH)
        .match_query(skip(PAGE_SIZE))
        .with_status(200)
        .with_body(page(PAGE_SIZE, 10))
        .create_async()
        .await;
    let p2 = server
        .mock("GET", GET_PATH)
        .match_query(skip(2 * PAGE_SIZE))
        .with_status(200)
        .with_body(r#"{"total": 60, "jobPostings": []}"#)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/wday/cxs/acme/External/jobs")
        .expect(0)
        .create_async()
        .await;

    let p = WorkdayProvider::new(WorkdayTarget::new("acme"), reqwest::Client::new())
        .with_base_url(server.url());
    let items = p.fetch().await.unwrap();

    p0.assert_async().await;
    p1.assert_async().await;
    p2.assert_async().await;
    post.assert_async().await;

    assert_eq!(items.len(), PAGE_SIZE + 10);
    assert_eq!(items[0].id, "JR-0");
    assert_eq!(
        items[0].url,
        format!(
            "{}/en-US/External/job/Remote/Engineering-Intern_JR-0",
            server.url()
        )
    );
}

#[tokio::test]
async fn blocked_tenant_degrades_to_empty_without_browser() {
    let mut server = mockito::Server::new_async().await;
    let _get = server
        .mock("GET", GET_PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;
    let _post = server
        .mock("POST", "/wday/cxs/acme/External/jobs")
        .with_status(422)
        .create_async()
        .await;

    let p = WorkdayProvider::new(WorkdayTarget::new("acme"), reqwest::Client::new())
        .with_base_url(server.url());
    let items = p.fetch().await.expect("workday fetch never errors");
    assert!(items.is_empty());
}

#[tokio::test]
async fn intercept_only_provider_never_touches_json_endpoints() {
    let mut server = mockito::Server::new_async().await;
    let get = server
        .mock("GET", GET_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let inner = WorkdayProvider::new(WorkdayTarget::new("acme"), reqwest::Client::new())
        .with_base_url(server.url());
    let p = WorkdayInterceptProvider::new(inner);
    assert!(p.fetch().await.unwrap().is_empty());
    assert_eq!(p.name(), "WorkdayIntercept");
    get.assert_async().await;
}
