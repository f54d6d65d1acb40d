//! # Client Session Scenarios
//!
//! Plays the server's side of a whole contestant session against
//! `AbacusClient`: login and the refresh it triggers, clarification pushes
//! and the details dialog, the clarification request form, and a connection
//! reset. Outbound messages are read from the channel transport and answered
//! by hand.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use tokio::sync::mpsc::UnboundedReceiver;

use lib_abacus::features::session::NO_LOGIN;
use lib_abacus::queue::ChannelTransport;
use lib_abacus::ui::{Dialog, DialogKind, Tab};
use lib_abacus::{AbacusClient, ClientCommand, ClientSettings, Message, UiEvent, UiSink};

fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(v) = rx.try_recv() {
        out.push(v);
    }
    out
}

/// The canned answer a cooperative server gives to each refresh request.
fn answer(request: &Message) -> Message {
    match request.name.as_str() {
        "whatami" => Message::new("ok").with_header("type", "contestant"),
        "contesttime" => Message::new("ok")
            .with_header("running", "yes")
            .with_header("remain", "3600")
            .with_header("blinds", "600"),
        "standings" => Message::new("ok")
            .with_header("nrows", "1")
            .with_header("ncols", "3")
            .with_header("row_0_0", "Contestant")
            .with_header("row_0_1", "Solved")
            .with_header("row_0_2", "Time"),
        _ => Message::new("ok"),
    }
}

fn details(events: &[UiEvent]) -> Vec<lib_abacus::ui::ClarificationDetails> {
    events
        .iter()
        .filter_map(|e| match e {
            UiEvent::OpenDialog(Dialog::ClarificationDetails(d)) => Some(d.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("--- Starting Client Session Scenarios ---");

    let (transport, mut sent) = ChannelTransport::channel();
    let (ui, mut events) = UiSink::channel();
    let settings = ClientSettings {
        auto_user: Some(NO_LOGIN.to_string()),
        ..Default::default()
    };
    let mut client = AbacusClient::new(settings, Box::new(transport), ui);

    // --- TEST 1: Login and refresh ---
    println!("\n[Test 1] Login and refresh...");
    client.handshake(true);
    assert!(drain(&mut sent).is_empty());
    client.apply(ClientCommand::Login {
        user: "alice".into(),
        pass: "pw".into(),
    });
    let auth = drain(&mut sent);
    assert_eq!(auth.len(), 1);
    assert_eq!(auth[0].header("user"), Some("alice"));
    client.on_message(Message::new("ok").with_header("user", "alice"));

    let mut refreshed = 0;
    loop {
        let outbound = drain(&mut sent);
        let Some(request) = outbound.first() else { break };
        assert_eq!(outbound.len(), 1, "more than one request in flight");
        client.on_message(answer(request));
        refreshed += 1;
    }
    assert_eq!(refreshed, 9);
    assert!(client.state().session.is_logged_in());
    let seen = drain(&mut events);
    assert!(seen.contains(&UiEvent::LoggedIn {
        username: "alice".into()
    }));
    assert!(!seen.iter().any(|e| matches!(e, UiEvent::Alert { .. })));
    println!("✅ Logged in; {} refresh requests answered one at a time", refreshed);

    // --- TEST 2: Clarification pushes and details ---
    println!("\n[Test 2] Clarification pushes...");
    client.on_message(
        Message::new("updateclarificationrequests")
            .with_header("id", "5")
            .with_header("time", "100")
            .with_header("problem", "A")
            .with_header("question", "Is n positive?"),
    );
    for (id, time, text) in [("11", "200", "Yes"), ("12", "300", "Read again")] {
        client.on_message(
            Message::new("updateclarifications")
                .with_header("id", id)
                .with_header("req_id", "5")
                .with_header("time", time)
                .with_header("problem", "A")
                .with_header("question", "Is n positive?")
                .with_header("answer", text),
        );
    }
    assert!(drain(&mut events).contains(&UiEvent::HighlightTab(Tab::Clarifications)));
    assert!(client.state().clarifications.is_answered("5"));

    client.apply(ClientCommand::ShowClarificationRequest("5".into()));
    let newest = details(&drain(&mut events));
    assert_eq!(newest[0].reply_id.as_deref(), Some("12"));
    assert!(newest[0].has_previous && !newest[0].has_next);

    client.apply(ClientCommand::ShowClarification {
        reply_id: "12".into(),
        offset: 1,
    });
    let older = details(&drain(&mut events));
    assert_eq!(older[0].answer.as_deref(), Some("Yes"));
    assert!(!older[0].has_previous && older[0].has_next);

    client.apply(ClientCommand::ShowClarification {
        reply_id: "12".into(),
        offset: 2,
    });
    assert!(details(&drain(&mut events)).is_empty());
    println!("✅ Replies paged newest first; out-of-range offset ignored");

    // --- TEST 3: Clarification request form ---
    println!("\n[Test 3] Clarification request form...");
    client.apply(ClientCommand::RequestClarificationDialog {
        problem_id: "2".into(),
        question: String::new(),
    });
    let outbound = drain(&mut sent);
    assert_eq!(outbound[0].name, "getproblems");
    client.on_message(
        Message::new("ok")
            .with_header("id0", "1")
            .with_header("name0", "Apples")
            .with_header("code0", "A")
            .with_header("id1", "2")
            .with_header("name1", "Bananas")
            .with_header("code1", "B"),
    );
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        UiEvent::OpenDialog(Dialog::ClarificationRequest { problem_id, .. }) if problem_id == "2"
    )));

    client.apply(ClientCommand::SendClarificationRequest {
        problem_id: "-1".into(),
        question: "Why?".into(),
    });
    assert!(drain(&mut sent).is_empty());
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        UiEvent::Alert { message, .. } if message == "You must select a problem!"
    )));

    client.apply(ClientCommand::SendClarificationRequest {
        problem_id: "2".into(),
        question: "Why?".into(),
    });
    let outbound = drain(&mut sent);
    assert_eq!(outbound[0].name, "clarificationrequest");
    assert_eq!(outbound[0].header("prob_id"), Some("2"));
    client.on_message(Message::new("ok"));
    assert!(drain(&mut events).contains(&UiEvent::CloseDialog(DialogKind::ClarificationRequest)));
    println!("✅ Form opened after problems; validation and send behave");

    // --- TEST 4: Connection reset ---
    println!("\n[Test 4] Connection reset mid-request...");
    client.apply(ClientCommand::ShowSubmission("7".into()));
    assert_eq!(drain(&mut sent)[0].name, "fetchfile");
    client.on_message(Message::new("connectionreset"));
    assert!(drain(&mut events).contains(&UiEvent::ReloadRequired));
    assert!(!client.queue().is_waiting());
    assert_eq!(client.queue().pending_len(), 0);
    // The answer to the abandoned request is dropped.
    client.on_message(Message::new("ok").with_header("count", "1"));
    assert!(drain(&mut sent).is_empty());
    println!("✅ Queue abandoned; late reply discarded");

    println!("\n--- All Client Session Scenarios Passed ---");
    Ok(())
}
