use futures::StreamExt;
use httpmock::prelude::*;
use serde_json::json;

use scribe_completion::{
    CompletionClient, CompletionError, CompletionRequest, HttpImageFetcher, ImageFetcher,
    OpenRouterClient,
};
use scribe_core::OpenRouterSettings;

fn client_for(server: &MockServer) -> OpenRouterClient {
    OpenRouterClient::new(&OpenRouterSettings {
        api_key: "sk-test".into(),
        api_url: server.url("/api/v1/chat/completions"),
        model: "test/model".into(),
    })
}

fn request() -> CompletionRequest {
    CompletionRequest {
        system: "Write issues".into(),
        text: "login button broken".into(),
        images: vec![],
    }
}

#[tokio::test]
async fn streams_deltas_in_order() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .json_body_includes(json!({"stream": true, "model": "test/model"}).to_string());
        then.status(200)
            .header("content-type", "text/event-stream")
            .body(concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"issues\\\"\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\": []}\"}}]}\n\n",
                "data: [DONE]\n\n"
            ));
    });

    let stream = client_for(&server)
        .stream_completion(request())
        .await
        .expect("stream starts");
    let text: Vec<String> = stream.map(|t| t.expect("token")).collect().await;

    mock.assert();
    assert_eq!(text.concat(), "{\"issues\": []}");
}

#[tokio::test]
async fn api_error_status_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/chat/completions");
        then.status(402).body("insufficient credits");
    });

    let err = client_for(&server)
        .stream_completion(request())
        .await
        .err()
        .expect("request fails");
    match err {
        CompletionError::Api { status, body } => {
            assert_eq!(status, 402);
            assert_eq!(body, "insufficient credits");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn image_is_inlined_with_header_mime() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/file/botSECRET/photos/a");
        then.status(200)
            .header("content-type", "image/png")
            .body("ABC");
    });

    let image = HttpImageFetcher::new()
        .fetch(&server.url("/file/botSECRET/photos/a"))
        .await
        .expect("image loads");
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, "QUJD");
}

#[tokio::test]
async fn image_mime_falls_back_to_extension() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/photos/b.webp");
        then.status(200)
            .header("content-type", "application/octet-stream")
            .body("ABC");
    });

    let image = HttpImageFetcher::new()
        .fetch(&server.url("/photos/b.webp"))
        .await
        .expect("image loads");
    assert_eq!(image.mime_type, "image/webp");
}

#[tokio::test]
async fn image_error_hides_url() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/file/botSECRET/missing.jpg");
        then.status(404);
    });

    let err = HttpImageFetcher::new()
        .fetch(&server.url("/file/botSECRET/missing.jpg"))
        .await
        .err()
        .expect("fetch fails");
    let text = err.to_string();
    assert_eq!(text, "image fetch failed: HTTP 404");
    assert!(!text.contains("SECRET"));
}
