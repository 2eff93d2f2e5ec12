use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use promptcast_core::ImageHandle;
use promptcast_engine::{
    FailureKind, GenerationInvoker, GenerationParams, GradioInvoker, HttpSettings, SpaceLocator,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_payload() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 0, 255])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn invoker(server: &MockServer, settings: HttpSettings) -> GradioInvoker {
    GradioInvoker::new(
        settings,
        SpaceLocator::mirror(&server.uri()).unwrap(),
        Some("hf_test".into()),
    )
}

async fn mount_completion(server: &MockServer, space: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{space}/call/infer/evt-1")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn minimal_backend_gets_prompt_only_and_image_is_downloaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/black-forest-labs-flux-1-schnell/call/infer"))
        .and(body_json(json!({ "data": ["a red fox"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "evt-1" })))
        .expect(1)
        .mount(&server)
        .await;
    let image_url = format!("{}/cdn/out.png", server.uri());
    mount_completion(
        &server,
        "black-forest-labs-flux-1-schnell",
        format!(
            "event: generating\ndata: null\n\n{}",
            format!("event: complete\ndata: [{{\"url\": \"{image_url}\"}}, 1234]\n\n")
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/cdn/out.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_payload()))
        .mount(&server)
        .await;

    let handle = invoker(&server, HttpSettings::default())
        .invoke(
            "black-forest-labs/FLUX.1-schnell",
            "a red fox",
            &GenerationParams::default(),
        )
        .await
        .expect("generation ok");
    assert_eq!(handle, ImageHandle::Bytes(png_payload()));
}

#[tokio::test]
async fn full_backend_gets_every_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me-sdxl/call/infer"))
        .and(body_json(json!({ "data": ["a blue whale", 0, 1024, 1024, 3.5, 28] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "evt-1" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_completion(
        &server,
        "me-sdxl",
        "event: complete\ndata: [{\"path\": \"/tmp/gradio/x.png\", \"url\": null}]\n\n".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/me-sdxl/file=/tmp/gradio/x.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_payload()))
        .mount(&server)
        .await;

    let handle = invoker(&server, HttpSettings::default())
        .invoke("me/sdxl", "a blue whale", &GenerationParams::default())
        .await
        .expect("generation ok");
    assert!(matches!(handle, ImageHandle::Bytes(bytes) if !bytes.is_empty()));
}

#[tokio::test]
async fn backend_error_event_is_a_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me-sdxl/call/infer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "evt-1" })))
        .mount(&server)
        .await;
    mount_completion(
        &server,
        "me-sdxl",
        "event: error\ndata: \"You have exceeded your GPU quota\"\n\n".to_string(),
    )
    .await;

    let err = invoker(&server, HttpSettings::default())
        .invoke("me/sdxl", "x", &GenerationParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Backend);
    assert!(err.message.contains("GPU quota"));
}

#[tokio::test]
async fn rejected_call_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me-sdxl/call/infer"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad arguments"))
        .mount(&server)
        .await;

    let err = invoker(&server, HttpSettings::default())
        .invoke("me/sdxl", "x", &GenerationParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(422));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me-sdxl/call/infer"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "event_id": "evt-1" })),
        )
        .mount(&server)
        .await;

    let settings = HttpSettings {
        generation_timeout: Duration::from_millis(50),
        ..HttpSettings::default()
    };
    let err = invoker(&server, settings)
        .invoke("me/sdxl", "x", &GenerationParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_image_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/me-sdxl/call/infer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "evt-1" })))
        .mount(&server)
        .await;
    let image_url = format!("{}/cdn/big.png", server.uri());
    mount_completion(
        &server,
        "me-sdxl",
        format!("event: complete\ndata: [\"{image_url}\"]\n\n"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/cdn/big.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
        .mount(&server)
        .await;

    let settings = HttpSettings {
        max_image_bytes: 10,
        ..HttpSettings::default()
    };
    let err = invoker(&server, settings)
        .invoke("me/sdxl", "x", &GenerationParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 10, .. }));
}
