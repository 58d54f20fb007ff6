use crate::test_config;
use carrier_scout::PageFetcher;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_url(server: &MockServer, page_path: &str) -> Url {
    Url::parse(&server.uri()).unwrap().join(page_path).unwrap()
}

#[tokio::test]
async fn test_detail_retries_server_errors_then_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transportadora/instavel"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(&test_config(&server.uri()).http).unwrap();
    let body = fetcher
        .fetch_detail(&page_url(&server, "/transportadora/instavel"))
        .await;

    assert_eq!(body, None);
}

#[tokio::test]
async fn test_detail_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transportadora/lenta"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transportadora/lenta"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Lenta Ltda</h1>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(&test_config(&server.uri()).http).unwrap();
    let body = fetcher
        .fetch_detail(&page_url(&server, "/transportadora/lenta"))
        .await;

    assert_eq!(body.as_deref(), Some("<h1>Lenta Ltda</h1>"));
}

#[tokio::test]
async fn test_detail_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transportadora/sumiu"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(&test_config(&server.uri()).http).unwrap();
    let body = fetcher
        .fetch_detail(&page_url(&server, "/transportadora/sumiu"))
        .await;

    assert_eq!(body, None);
}

#[tokio::test]
async fn test_listing_is_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rotas/pagina-1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(&test_config(&server.uri()).http).unwrap();
    let body = fetcher
        .fetch_listing(&page_url(&server, "/rotas/pagina-1"))
        .await;

    assert_eq!(body, None);
}
