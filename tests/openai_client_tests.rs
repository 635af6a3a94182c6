use aerodesk::llm::{CompletionRequest, LLMClient, OpenAIClient, OpenAIConfig};
use aerodesk::types::{AppError, ToolDefinition, TranscriptItem};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAIClient {
    OpenAIClient::new(OpenAIConfig {
        api_base: format!("{}/v1", server.uri()),
        api_key: Some("sk-test".to_string()),
        model: "gpt-4.1-mini".to_string(),
        temperature: 0.2,
        timeout_secs: 5,
    })
    .unwrap()
}

fn completion(message: Value, finish_reason: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": message, "finish_reason": finish_reason }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
    })
}

async fn last_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    requests.last().unwrap().body_json().unwrap()
}

#[tokio::test]
async fn test_text_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "Your flight is on time." }),
            "stop",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .complete(CompletionRequest::new(
            "You are a Flight Status Agent.",
            vec![TranscriptItem::user("Is FLT-123 on time?")],
        ))
        .await
        .unwrap();

    assert_eq!(response.content, "Your flight is on time.");
    assert_eq!(response.finish_reason, "stop");
    assert!(response.tool_calls.is_empty());
    assert_eq!(response.usage.unwrap().total_tokens, 17);

    let body = last_body(&server).await;
    assert_eq!(body["model"], "gpt-4.1-mini");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Is FLT-123 on time?");
    assert!(body.get("tools").is_none());
    assert!(body.get("response_format").is_none());
}

#[tokio::test]
async fn test_tool_call_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": { "name": "transfer_to_faq_agent", "arguments": "{}" }
                }]
            }),
            "tool_calls",
        )))
        .mount(&server)
        .await;

    let request = CompletionRequest::new("triage", vec![TranscriptItem::user("wifi?")]).with_tools(
        vec![ToolDefinition {
            name: "transfer_to_faq_agent".to_string(),
            description: "Handoff to the FAQ Agent to handle the request.".to_string(),
            parameters: json!({ "type": "object", "properties": {}, "required": [] }),
        }],
    );
    let response = client_for(&server).complete(request).await.unwrap();

    assert_eq!(response.content, "");
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "call_abc");
    assert_eq!(response.tool_calls[0].name, "transfer_to_faq_agent");

    let body = last_body(&server).await;
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "transfer_to_faq_agent");
}

#[tokio::test]
async fn test_transcript_tool_items_are_replayed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "Done." }),
            "stop",
        )))
        .mount(&server)
        .await;

    let transcript = vec![
        TranscriptItem::user("status of FLT-9"),
        TranscriptItem::ToolCall {
            call_id: "call_1".into(),
            name: "flight_status_tool".into(),
            arguments: r#"{"flight_number":"FLT-9"}"#.into(),
        },
        TranscriptItem::ToolResult {
            call_id: "call_1".into(),
            output: "Flight FLT-9 is on time".into(),
        },
    ];
    client_for(&server)
        .complete(CompletionRequest::new("status", transcript))
        .await
        .unwrap();

    let body = last_body(&server).await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
    assert_eq!(messages[3]["role"], "tool");
    assert_eq!(messages[3]["tool_call_id"], "call_1");
    assert_eq!(messages[3]["content"], "Flight FLT-9 is on time");
}

#[tokio::test]
async fn test_json_request_sets_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            json!({ "role": "assistant", "content": "{\"is_relevant\": true, \"reasoning\": \"ok\"}" }),
            "stop",
        )))
        .mount(&server)
        .await;

    client_for(&server)
        .complete(CompletionRequest::json("judge relevance", "my bag is lost"))
        .await
        .unwrap();

    let body = last_body(&server).await;
    assert_eq!(body["response_format"], json!({ "type": "json_object" }));
}

#[tokio::test]
async fn test_http_error_maps_to_llm_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(CompletionRequest::new("sys", vec![TranscriptItem::user("hi")]))
        .await
        .unwrap_err();

    match err {
        AppError::LLM(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("upstream exploded"));
        }
        other => panic!("expected LLM error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(CompletionRequest::new("sys", vec![TranscriptItem::user("hi")]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::LLM(msg) if msg.contains("No response")));
}
