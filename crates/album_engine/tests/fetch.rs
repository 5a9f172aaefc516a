use std::time::Duration;

use album_engine::{FailureKind, FetchRequest, FetchSettings, Fetcher, ReqwestFetcher};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFERER: &str = "https://vk.com/album-1_2";

#[tokio::test]
async fn get_returns_image_bytes_and_sends_referer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/a.jpg"))
        .and(header("referer", REFERER))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"JPEGDATA".to_vec(), "image/jpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/img/a.jpg", server.uri());

    let output = fetcher
        .fetch(&FetchRequest::get(url.as_str(), REFERER))
        .await
        .expect("fetch ok");
    assert_eq!(output.bytes.as_ref(), b"JPEGDATA");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.byte_len, 8);
    assert_eq!(output.metadata.content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn post_sends_listing_form_as_xhr() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/album-1_2"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("al=1&offset=40&part=1&rev=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"payload\":[0,[]]}"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let url = format!("{}/album-1_2", server.uri());
    let request = FetchRequest::post_form(
        url.as_str(),
        url.as_str(),
        &[
            ("al", "1".to_string()),
            ("offset", "40".to_string()),
            ("part", "1".to_string()),
            ("rev", "1".to_string()),
        ],
    );

    let output = fetcher.fetch(&request).await.expect("fetch ok");
    assert_eq!(output.bytes.as_ref(), b"{\"payload\":[0,[]]}");
}

#[tokio::test]
async fn client_and_server_errors_map_to_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();

    let err = fetcher
        .fetch(&FetchRequest::get(format!("{}/missing", server.uri()), REFERER))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert!(!err.is_transient());

    let err = fetcher
        .fetch(&FetchRequest::get(format!("{}/broken", server.uri()), REFERER))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    assert!(err.is_transient());
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings).unwrap();

    let err = fetcher
        .fetch(&FetchRequest::get(format!("{}/slow", server.uri()), REFERER))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
    assert!(err.is_transient());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(ResponseTemplate::new(200).set_body_string("01234567890"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestFetcher::new(settings).unwrap();

    let err = fetcher
        .fetch(&FetchRequest::get(format!("{}/large", server.uri()), REFERER))
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn malformed_url_is_permanent() {
    let fetcher = ReqwestFetcher::new(FetchSettings::default()).unwrap();
    let err = fetcher
        .fetch(&FetchRequest::get("not a url", REFERER))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
    assert!(!err.is_transient());
}
