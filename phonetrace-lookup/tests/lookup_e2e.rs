mod common;

use phonetrace_common::{PhonetraceError, INTERPRET_FAILURE_MESSAGE};
use phonetrace_config::{LlmSettings, LookupSettings, PhonetraceConfig};
use phonetrace_lookup::{perform_lookup, Confidence, PhoneLookup, Source};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-test";
const NUMBER: &str = "+8801712345678";

fn config_for(server: &MockServer) -> PhonetraceConfig {
    PhonetraceConfig {
        llm: LlmSettings {
            api_key: Some("test-key".into()),
            model: MODEL.into(),
            endpoint: format!("{}/v1beta", server.uri()),
            ..LlmSettings::default()
        },
        ..PhonetraceConfig::default()
    }
}

fn model_payload() -> Value {
    json!({
        "name": "Karim Electronics",
        "adminName": "Abdul Karim",
        "city": "Sylhet",
        "location": "Sylhet Division, Bangladesh",
        "carrier": "Grameenphone",
        "type": "Mobile",
        "summary": "Listed as the contact number of an electronics shop.",
        "confidence": "High",
        "socialPresence": {
            "whatsapp": { "available": true, "link": "https://wa.me/8801712345678", "note": "Business profile" },
            "telegram": { "available": false, "link": "", "note": "No public account" }
        }
    })
}

fn gemini_reply(text: &str, chunks: Vec<Value>) -> Value {
    let mut candidate = json!({
        "content": { "role": "model", "parts": [{ "text": text }] },
        "finishReason": "STOP"
    });
    if !chunks.is_empty() {
        candidate["groundingMetadata"] = json!({
            "webSearchQueries": [format!("{NUMBER} owner")],
            "groundingChunks": chunks
        });
    }
    json!({ "candidates": [candidate] })
}

fn web_chunk(uri: &str, title: Option<&str>) -> Value {
    match title {
        Some(title) => json!({ "web": { "uri": uri, "title": title } }),
        None => json!({ "web": { "uri": uri } }),
    }
}

async fn mount_reply(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn grounded_lookup_builds_full_result() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .and(body_partial_json(json!({
            "tools": [{ "googleSearch": {} }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": phonetrace_lookup::prompt::lookup_response_schema()
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(
            &model_payload().to_string(),
            vec![
                web_chunk("https://directory.example/karim", Some("Business Directory")),
                web_chunk("https://callerid.example/8801712345678", None),
            ],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let result = perform_lookup(&config_for(&server), NUMBER).await.unwrap();

    assert_eq!(result.phone_number, NUMBER);
    assert_eq!(result.name, "Karim Electronics");
    assert_eq!(result.admin_name, "Abdul Karim");
    assert_eq!(result.line_type, "Mobile");
    assert_eq!(result.confidence, Confidence::High);
    assert!(result.social_presence.whatsapp.available);
    assert!(!result.social_presence.telegram.available);
    assert_eq!(
        result.sources,
        vec![
            Source {
                title: "Business Directory".into(),
                uri: "https://directory.example/karim".into(),
            },
            Source {
                title: "Public Record Source".into(),
                uri: "https://callerid.example/8801712345678".into(),
            },
        ]
    );
}

#[tokio::test]
async fn prompt_embeds_the_number() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_reply(&server, gemini_reply(&model_payload().to_string(), vec![])).await;

    perform_lookup(&config_for(&server), NUMBER).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains(&format!("\"{NUMBER}\"")));
    assert!(body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("phone number investigator"));
    assert!(body.get("safetySettings").is_none());
}

#[tokio::test]
async fn model_echo_of_number_is_ignored() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let mut payload = model_payload();
    payload["phoneNumber"] = json!("+10000000000");
    mount_reply(&server, gemini_reply(&payload.to_string(), vec![])).await;

    let result = perform_lookup(&config_for(&server), &format!("  {NUMBER}\n"))
        .await
        .unwrap();
    assert_eq!(result.phone_number, NUMBER);
}

#[tokio::test]
async fn fenced_output_is_accepted() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let text = format!("```json\n{:#}\n```", model_payload());
    mount_reply(&server, gemini_reply(&text, vec![])).await;

    let result = perform_lookup(&config_for(&server), NUMBER).await.unwrap();
    assert_eq!(result.city, "Sylhet");
}

#[tokio::test]
async fn missing_grounding_gives_no_sources() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_reply(&server, gemini_reply(&model_payload().to_string(), vec![])).await;

    let result = perform_lookup(&config_for(&server), NUMBER).await.unwrap();
    assert!(result.sources.is_empty());
}

#[tokio::test]
async fn sources_are_capped_at_five_by_default() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let chunks = (0..8)
        .map(|i| web_chunk(&format!("https://s{i}.example"), Some("hit")))
        .collect();
    mount_reply(&server, gemini_reply(&model_payload().to_string(), chunks)).await;

    let result = perform_lookup(&config_for(&server), NUMBER).await.unwrap();
    assert_eq!(result.sources.len(), 5);
    assert_eq!(result.sources[0].uri, "https://s0.example");
    assert_eq!(result.sources[4].uri, "https://s4.example");
}

#[tokio::test]
async fn zero_cap_keeps_every_source() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let chunks = (0..8)
        .map(|i| web_chunk(&format!("https://s{i}.example"), None))
        .collect();
    mount_reply(&server, gemini_reply(&model_payload().to_string(), chunks)).await;

    let config = PhonetraceConfig {
        lookup: LookupSettings {
            max_sources: Some(0),
            ..LookupSettings::default()
        },
        ..config_for(&server)
    };
    let lookup = PhoneLookup::from_config(&config).unwrap();
    assert_eq!(lookup.policy().max_sources, None);

    let result = lookup.perform_lookup(NUMBER).await.unwrap();
    assert_eq!(result.sources.len(), 8);
}

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.llm.api_key = None;

    let err = perform_lookup(&config, NUMBER).await.unwrap_err();
    assert!(err.is_config(), "got {err:?}");
    assert!(err.user_message().contains("API_KEY"));
}

#[tokio::test]
async fn blank_number_is_rejected_without_request() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = perform_lookup(&config_for(&server), " \t ").await.unwrap_err();
    assert!(matches!(err, PhonetraceError::InvalidInput(_)));
}

#[tokio::test]
async fn service_error_surfaces_provider_message() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "Permission denied: consumer has been suspended.",
                "status": "PERMISSION_DENIED"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = perform_lookup(&config_for(&server), NUMBER).await.unwrap_err();
    assert!(matches!(err, PhonetraceError::Service(_)), "got {err:?}");
    assert!(err
        .user_message()
        .contains("Permission denied: consumer has been suspended."));
}

#[tokio::test]
async fn prose_reply_is_malformed() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_reply(
        &server,
        gemini_reply("I was unable to find information about this number.", vec![]),
    )
    .await;

    let err = perform_lookup(&config_for(&server), NUMBER).await.unwrap_err();
    assert!(matches!(err, PhonetraceError::Malformed(_)), "got {err:?}");
    assert_eq!(err.user_message(), INTERPRET_FAILURE_MESSAGE);
}

#[tokio::test]
async fn incomplete_payload_is_malformed() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let mut payload = model_payload();
    payload["socialPresence"]
        .as_object_mut()
        .unwrap()
        .remove("telegram");
    mount_reply(&server, gemini_reply(&payload.to_string(), vec![])).await;

    let err = perform_lookup(&config_for(&server), NUMBER).await.unwrap_err();
    assert!(matches!(err, PhonetraceError::Malformed(_)), "got {err:?}");
}
