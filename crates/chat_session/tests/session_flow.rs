mod support;

use std::sync::Arc;

use chat_api::{ChatMessage, ChatRequest};
use chat_session::{
    ChatSession, Phase, Rejection, SendOutcome, SessionConfig, SessionError,
    DEFAULT_ERROR_MESSAGE,
};
use pretty_assertions::assert_eq;
use streamchat::markdown::BoxFuture;
use streamchat::{
    Author, ConverterLoader, IncrementalRenderer, LoadError, MarkdownCapability,
    MarkdownConverter, ViewConfig,
};
use support::{chunk, frame, markdown_session, BodyStep, FakeTransport, Scripted};
use tokio::sync::Notify;

fn last_markup<T>(session: &ChatSession<T>) -> String
where
    T: chat_session::ChatTransport,
{
    session.with_view(|view| view.last().expect("entry").markup())
}

#[tokio::test]
async fn non_streaming_reply_is_committed() {
    let session = markdown_session(FakeTransport::new(vec![Scripted::Complete(
        r#"{"response":"hello"}"#.to_string(),
    )]));

    let outcome = session.send("hi").await;
    assert!(matches!(&outcome, SendOutcome::Committed { reply } if reply == "hello"));
    assert_eq!(
        session.history().messages(),
        &[ChatMessage::user("hi"), ChatMessage::assistant("hello")]
    );
    assert_eq!(last_markup(&session), "<p>hello</p>");
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(session.last_settled(), Some(Phase::Committed));
    assert!(!session.is_busy());
}

#[tokio::test]
async fn settled_phase_tracks_each_cycle_outcome() {
    let session = markdown_session(FakeTransport::new(vec![
        Scripted::Status(503, "busy".to_string()),
        Scripted::Complete(r#"{"response":"ok"}"#.to_string()),
    ]));
    assert_eq!(session.last_settled(), None);

    assert!(matches!(session.send("one").await, SendOutcome::Failed { .. }));
    assert_eq!(session.last_settled(), Some(Phase::Failed));
    assert_eq!(session.phase(), Phase::Idle);

    assert!(session.send("  ").await.is_rejected());
    assert_eq!(session.last_settled(), Some(Phase::Failed));

    assert!(session.send("two").await.is_committed());
    assert_eq!(session.last_settled(), Some(Phase::Committed));
    assert_eq!(session.phase(), Phase::Idle);
}

#[tokio::test]
async fn streamed_reply_accumulates_until_done() {
    let session = markdown_session(FakeTransport::new(vec![Scripted::Stream(vec![
        frame(r#"{"response":"He"}"#),
        frame(r#"{"response":"llo"}"#),
        frame("[DONE]"),
        frame(r#"{"response":" after done"}"#),
    ])]));

    let outcome = session.send("hi").await;
    assert!(matches!(&outcome, SendOutcome::Committed { reply } if reply == "Hello"));
    assert_eq!(
        session.history().messages(),
        &[ChatMessage::user("hi"), ChatMessage::assistant("Hello")]
    );
    assert_eq!(last_markup(&session), "<p>Hello</p>");
}

#[tokio::test]
async fn server_error_appends_one_error_message_and_restores_input() {
    let session = markdown_session(FakeTransport::new(vec![Scripted::Status(
        500,
        "model unavailable".to_string(),
    )]));

    let outcome = session.send("hi").await;
    match outcome {
        SendOutcome::Failed { error, partial } => {
            assert!(matches!(error, SessionError::Transport(_)));
            assert!(partial.is_empty());
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let history = session.history();
    assert_eq!(
        history.messages(),
        &[
            ChatMessage::user("hi"),
            ChatMessage::assistant(DEFAULT_ERROR_MESSAGE)
        ]
    );
    assert!(!session.is_busy());
    session.with_view(|view| {
        assert!(view.input().enabled);
        assert!(view.input().focused);
        assert!(!view.is_typing());
        // user entry, then the error entry; no empty assistant bubble
        assert_eq!(view.len(), 2);
        assert_eq!(view.last().expect("entry").author(), Author::Assistant);
    });
}

#[tokio::test]
async fn malformed_frame_between_valid_frames_is_skipped() {
    let session = markdown_session(FakeTransport::new(vec![Scripted::Stream(vec![
        frame(r#"{"response":"a"}"#),
        chunk("data: {bad}\n\n"),
        frame(r#"{"choices":[{"delta":{"content":"b"}}]}"#),
    ])]));

    let outcome = session.send("hi").await;
    assert!(matches!(&outcome, SendOutcome::Committed { reply } if reply == "ab"));
    assert_eq!(
        session.history().last(),
        Some(&ChatMessage::assistant("ab"))
    );
}

#[tokio::test]
async fn frames_split_across_chunks_reassemble() {
    let body = "data: {\"response\":\"caf\u{e9} \"}\r\n\r\ndata: {\"response\":\"ok\"}\n\ndata: [DONE]\n\n";
    let bytes = body.as_bytes();
    let steps = bytes
        .chunks(3)
        .map(|part| BodyStep::Chunk(part.to_vec()))
        .collect();
    let session = markdown_session(FakeTransport::new(vec![Scripted::Stream(steps)]));

    let outcome = session.send("hi").await;
    assert!(matches!(&outcome, SendOutcome::Committed { reply } if reply == "caf\u{e9} ok"));
}

#[tokio::test]
async fn second_send_while_streaming_is_a_silent_no_op() {
    let gate = Arc::new(Notify::new());
    let session = markdown_session(FakeTransport::new(vec![Scripted::Stream(vec![
        frame(r#"{"response":"first"}"#),
        BodyStep::Gate(Arc::clone(&gate)),
        frame(r#"{"response":" reply"}"#),
        frame("[DONE]"),
    ])]));

    let (first, second) = tokio::join!(session.send("one"), async {
        while session.phase() != Phase::Streaming {
            tokio::task::yield_now().await;
        }
        assert!(session.is_busy());
        session.with_view(|view| assert!(!view.input().enabled));
        let outcome = session.send("two").await;
        gate.notify_one();
        outcome
    });

    assert!(matches!(&first, SendOutcome::Committed { reply } if reply == "first reply"));
    assert!(matches!(second, SendOutcome::Rejected(Rejection::Busy)));
    assert_eq!(session.transport().request_count(), 1);
    assert_eq!(
        session.history().messages(),
        &[
            ChatMessage::user("one"),
            ChatMessage::assistant("first reply")
        ]
    );
}

#[tokio::test]
async fn blank_input_is_rejected_without_request() {
    let session = markdown_session(FakeTransport::new(Vec::new()));
    assert!(matches!(
        session.send("   \n\t").await,
        SendOutcome::Rejected(Rejection::EmptyInput)
    ));
    assert_eq!(session.transport().request_count(), 0);
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn request_carries_full_history_with_trimmed_input() {
    let session = ChatSession::new(
        FakeTransport::new(vec![
            Scripted::Complete(r#"{"response":"one"}"#.to_string()),
            Scripted::Complete(r#"{"choices":[{"message":{"content":"two"}}]}"#.to_string()),
        ]),
        IncrementalRenderer::default(),
        SessionConfig::default().with_greeting("Hi! What shall we build?"),
    );

    session.send("  first  ").await;
    session.send("second").await;

    let requests: Vec<ChatRequest> = session.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].messages,
        vec![
            ChatMessage::assistant("Hi! What shall we build?"),
            ChatMessage::user("first"),
            ChatMessage::assistant("one"),
            ChatMessage::user("second"),
        ]
    );
}

#[tokio::test]
async fn stream_error_keeps_partial_text_on_screen_only() {
    let session = markdown_session(FakeTransport::new(vec![Scripted::Stream(vec![
        frame(r#"{"response":"partial"}"#),
        BodyStep::Fail("connection reset".to_string()),
    ])]));

    let outcome = session.send("hi").await;
    assert!(matches!(&outcome, SendOutcome::Failed { partial, .. } if partial == "partial"));
    assert_eq!(
        session.history().messages(),
        &[
            ChatMessage::user("hi"),
            ChatMessage::assistant(DEFAULT_ERROR_MESSAGE)
        ]
    );
    session.with_view(|view| {
        let markups: Vec<String> = view.entries().iter().map(|entry| entry.markup()).collect();
        assert_eq!(markups.len(), 3);
        assert_eq!(markups[1], "<p>partial</p>");
    });
}

#[tokio::test]
async fn malformed_completion_body_fails_the_cycle() {
    let session = markdown_session(FakeTransport::new(vec![Scripted::Complete(
        "<html>oops</html>".to_string(),
    )]));

    let outcome = session.send("hi").await;
    assert!(matches!(
        outcome,
        SendOutcome::Failed {
            error: SessionError::MalformedCompletion(_),
            ..
        }
    ));
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn submit_input_sends_and_clears_the_box() {
    let session = markdown_session(FakeTransport::new(vec![Scripted::Complete(
        r#"{"response":"ok"}"#.to_string(),
    )]));
    session.set_input("hello");

    assert!(session.submit_input().await.is_committed());
    session.with_view(|view| assert_eq!(view.input().value, ""));
    assert_eq!(session.history().messages()[0], ChatMessage::user("hello"));
}

struct Offline;

impl ConverterLoader for Offline {
    fn load(&self) -> BoxFuture<'_, Result<Arc<dyn MarkdownConverter>, LoadError>> {
        Box::pin(async { Err(LoadError::Unavailable("offline".to_string())) })
    }
}

#[tokio::test]
async fn converter_load_failure_keeps_plain_text() {
    let session = ChatSession::new(
        FakeTransport::new(vec![Scripted::Complete(
            r#"{"response":"**bold**"}"#.to_string(),
        )]),
        IncrementalRenderer::new(MarkdownCapability::new(Offline), ViewConfig::default()),
        SessionConfig::default(),
    );

    assert!(session.send("hi").await.is_committed());
    assert_eq!(last_markup(&session), "**bold**");
}

#[tokio::test]
async fn greeting_is_upgraded_to_markdown_once_converter_loads() {
    let session = ChatSession::new(
        FakeTransport::new(vec![Scripted::Complete(r#"{"response":"x"}"#.to_string())]),
        IncrementalRenderer::default(),
        SessionConfig::default().with_greeting("**Welcome**"),
    );
    session.with_view(|view| {
        assert_eq!(view.entries()[0].markup(), "**Welcome**");
    });

    session.send("hi").await;
    session.with_view(|view| {
        assert_eq!(
            view.entries()[0].markup(),
            "<p><strong>Welcome</strong></p>"
        );
    });
}
