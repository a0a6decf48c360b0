//! Integration tests for the OpenAI-compatible adapter with a mock HTTP
//! server, exercising the real client stack: request bodies on the wire,
//! JSON response parsing, HTTP error mapping, and a full planning session
//! over HTTP.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tempora::contract;
use tempora::{
    AvailabilityWindow, DayOfWeek, Message, OpenAiBackend, OpenAiConfig, Person, Planner,
    PlannerConfig, ReasoningBackend, RequestOptions, RetryPolicy, Task, ToolDefinition,
};

fn backend_for(server: &MockServer) -> OpenAiBackend {
    OpenAiBackend::new(OpenAiConfig::new("test-key", "gpt-4o").with_base_url(server.uri()))
}

fn list_tasks_tool() -> ToolDefinition {
    ToolDefinition::new(
        "list_tasks",
        "List the user's tasks",
        json!({ "type": "object", "properties": {} }),
    )
}

#[tokio::test]
async fn completion_round_trip_and_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "{\"recs\": []}" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let options = RequestOptions::new()
        .with_temperature(0.2)
        .with_response_schema(contract::output_schema());
    let turn = backend
        .converse(
            &[Message::system("contract"), Message::user("The time is now.")],
            &[list_tasks_tool()],
            &options,
        )
        .await
        .expect("request succeeds");

    assert_eq!(turn.text, "{\"recs\": []}");
    assert!(!turn.wants_tools());

    // Inspect what actually went over the wire.
    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("request body is JSON");
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["stream"], false);
    assert_eq!(body["temperature"], 0.2);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["tools"][0]["function"]["name"], "list_tasks");
    assert_eq!(body["tool_choice"], "auto");
    assert_eq!(body["response_format"]["type"], "json_schema");
    assert_eq!(
        body["response_format"]["json_schema"]["name"],
        "recommendation_set"
    );
}

#[tokio::test]
async fn tool_call_response_becomes_invocation_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": { "name": "list_tasks", "arguments": "{}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .mount(&server)
        .await;

    let turn = backend_for(&server)
        .converse(&[Message::user("hi")], &[list_tasks_tool()], &RequestOptions::new())
        .await
        .expect("request succeeds");

    assert!(turn.wants_tools());
    assert_eq!(turn.tool_calls.len(), 1);
    assert_eq!(turn.tool_calls[0].call_id, "call_abc");
    assert_eq!(turn.tool_calls[0].name, "list_tasks");
}

#[tokio::test]
async fn unauthorized_is_a_terminal_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided" }
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .converse(&[Message::user("hi")], &[], &RequestOptions::new())
        .await
        .expect_err("401 is an error");
    assert_eq!(err.code(), "CONFIG_INVALID");
    assert!(err.message().contains("Incorrect API key"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn rate_limit_and_server_errors_are_retryable_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit exceeded" }
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let backend = backend_for(&server);

    let rate_limited = backend
        .converse(&[Message::user("hi")], &[], &RequestOptions::new())
        .await
        .expect_err("429 is an error");
    assert_eq!(rate_limited.code(), "TRANSPORT_FAILED");
    assert!(rate_limited.is_retryable());

    let server_error = backend
        .converse(&[Message::user("hi")], &[], &RequestOptions::new())
        .await
        .expect_err("500 is an error");
    assert_eq!(server_error.code(), "TRANSPORT_FAILED");
    assert!(server_error.is_retryable());
}

#[tokio::test]
async fn full_planning_session_over_http() {
    let server = MockServer::start().await;

    // First round trip: the model asks for the task list.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "list_tasks", "arguments": "{}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Second round trip: the final structured answer.
    let answer = json!({
        "recs": [{
            "start_time": "2025-03-04T09:00:00",
            "end_time": "2025-03-04T10:00:00",
            "title": "Write the report"
        }]
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": answer.to_string() },
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let planner = Planner::new(
        Arc::new(backend_for(&server)) as Arc<dyn ReasoningBackend>,
        PlannerConfig::new().with_retry(RetryPolicy::new().with_base_delay_ms(1)),
    );

    let person = Person::new("ada", "ada@example.com")
        .with_task(
            Task::new("t-1", "Write the report").with_due_date(dt(2025, 3, 7, 17, 0)),
        )
        .with_availability(AvailabilityWindow::new(
            DayOfWeek::Tuesday,
            time(9, 0),
            time(17, 0),
        ));

    let report = planner
        .plan_for_at(&person, dt(2025, 3, 4, 8, 0))
        .await
        .expect("session succeeds");
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].title, "Write the report");

    // The second request carried the tool result back to the model.
    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 2);
    let second: serde_json::Value =
        serde_json::from_slice(&requests[1].body).expect("request body is JSON");
    let messages = second["messages"].as_array().expect("messages array");
    let tool_message = messages
        .iter()
        .find(|m| m["role"] == "tool")
        .expect("tool result present");
    assert_eq!(tool_message["tool_call_id"], "call_1");
    assert!(
        tool_message["content"]
            .as_str()
            .is_some_and(|c| c.contains("Write the report"))
    );
}

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, 0))
        .expect("valid datetime")
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}
