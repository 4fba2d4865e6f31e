use httpmock::prelude::*;
use serde_json::json;
use side_chat::bubbles::{Alignment, BubbleContainer};
use side_chat::config::OllamaConfig;
use side_chat::conversation::{Conversation, Phase};
use side_chat::message::Sender;
use side_chat::ollama::OllamaClient;

fn conversation() -> Conversation {
    Conversation::new(BubbleContainer::new(48, 8))
}

fn transcript(chat: &Conversation) -> Vec<(Sender, Alignment, bool, String)> {
    chat.transcript()
        .iter()
        .map(|e| {
            (
                e.bubble.message.sender,
                e.alignment,
                e.bubble.message.is_error,
                e.bubble.markup.plain_text(),
            )
        })
        .collect()
}

#[tokio::test]
async fn question_and_answer_land_in_order() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate").body_contains("\"prompt\":\"2+2?\"");
            then.status(200).json_body(json!({ "response": "4" }));
        })
        .await;

    let client = OllamaClient::new(&OllamaConfig {
        url: server.url("/api/generate"),
        ..OllamaConfig::default()
    })
    .unwrap();

    let mut chat = conversation();
    chat.set_input("2+2?".to_string());
    let (dispatch, _) = chat.submit().expect("non-empty input dispatches");
    assert!(!chat.input_enabled());

    let result = tokio::spawn({
        let client = client.clone();
        async move { client.complete(&dispatch.prompt).await }
    })
    .await
    .unwrap();

    let done = chat.complete(result).unwrap();

    mock.assert_hits_async(1).await;
    assert!(done.focus_input);
    assert_eq!(chat.phase(), Phase::Idle);
    assert!(chat.input_enabled());
    assert_eq!(
        transcript(&chat),
        vec![
            (Sender::User, Alignment::Right, false, "2+2?".to_string()),
            (Sender::Assistant, Alignment::Left, false, "4".to_string()),
        ]
    );
}

#[tokio::test]
async fn timeout_becomes_an_error_bubble() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .delay(std::time::Duration::from_secs(3))
                .json_body(json!({ "response": "late" }));
        })
        .await;

    let client = OllamaClient::new(&OllamaConfig {
        url: server.url("/api/generate"),
        request_timeout_secs: Some(1),
        ..OllamaConfig::default()
    })
    .unwrap();

    let mut chat = conversation();
    chat.set_input("are you there?".to_string());
    let (dispatch, _) = chat.submit().unwrap();

    let result = client.complete(&dispatch.prompt).await;
    chat.complete(result).unwrap();

    assert!(chat.input_enabled());
    let (sender, alignment, is_error, text) = transcript(&chat).pop().unwrap();
    assert_eq!(sender, Sender::Assistant);
    assert_eq!(alignment, Alignment::Left);
    assert!(is_error);
    assert!(text.starts_with("Error: request timed out"), "{text}");
}

#[tokio::test]
async fn empty_submission_sends_nothing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({ "response": "unused" }));
        })
        .await;

    let mut chat = conversation();
    chat.set_input(String::new());
    assert!(chat.submit().is_none());

    mock.assert_hits_async(0).await;
    assert!(chat.transcript().is_empty());
    assert_eq!(chat.dispatched(), 0);
}
