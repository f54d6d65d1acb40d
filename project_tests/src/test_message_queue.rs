//! # Message Queue Scenarios
//!
//! Drives `MessageQueue` through the interaction patterns the client relies
//! on: multi-step operations whose follow-ups are queued from reply
//! handlers, handler-only entries, a failing transport, a failing handler and
//! a hard reset in the middle of a conversation.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use lib_abacus::queue::{ChannelTransport, TransportError, SEND_FAILURE};
use lib_abacus::{HandlerError, Message, MessageQueue, Reply, Scheduler, Transport, UiEvent, UiSink};

type Trace = Vec<String>;

/// Publishes into a channel, failing every message whose name is listed.
struct FlakyTransport {
    inner: ChannelTransport,
    refuse: Vec<&'static str>,
}

impl Transport for FlakyTransport {
    fn publish(&mut self, message: &Message) -> Result<(), TransportError> {
        if self.refuse.contains(&message.name.as_str()) {
            return Err(TransportError::Socket("refused".to_string()));
        }
        self.inner.publish(message)
    }
}

fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(v) = rx.try_recv() {
        out.push(v);
    }
    out
}

fn names(sent: &[Message]) -> Vec<String> {
    sent.iter().map(|m| m.name.clone()).collect()
}

fn main() -> anyhow::Result<()> {
    println!("--- Starting Message Queue Scenarios ---");

    // --- TEST 1: Follow-ups queued from a handler run after earlier work ---
    println!("\n[Test 1] Fan-out from a reply handler...");
    let (transport, mut sent) = ChannelTransport::channel();
    let (ui, mut events) = UiSink::channel();
    let mut queue: MessageQueue<Trace> = MessageQueue::new(Box::new(transport), ui.clone());
    let mut trace = Trace::new();

    queue.send_message_block(&mut trace, Message::new("count"), |t: &mut Trace, r: &Reply, s: &mut Scheduler<'_, Trace>| {
        let n: usize = r.message.number("count")?;
        for i in 0..n {
            s.send_message_block(Message::new(format!("file{}", i)), |t: &mut Trace, r: &Reply, _: &mut Scheduler<'_, Trace>| {
                t.push(r.message.header("name").unwrap_or_default().to_string());
                Ok(())
            });
        }
        s.queue_handler(json!("done"), |t: &mut Trace, r: &Reply, _: &mut Scheduler<'_, Trace>| {
            t.push(format!("dialog:{}", r.data.as_ref().and_then(|d| d.as_str()).unwrap_or("")));
            Ok(())
        });
        t.push(format!("count={}", n));
        Ok(())
    });
    // Queued behind the count before its reply arrives.
    queue.send_message_block(&mut trace, Message::new("unrelated"), |t: &mut Trace, _: &Reply, _: &mut Scheduler<'_, Trace>| {
        t.push("unrelated".to_string());
        Ok(())
    });

    queue.reply(&mut trace, Reply::from_message(Message::new("ok").with_header("count", "2")));
    queue.reply(&mut trace, Reply::from_message(Message::new("ok")));
    queue.reply(&mut trace, Reply::from_message(Message::new("ok").with_header("name", "a")));
    queue.reply(&mut trace, Reply::from_message(Message::new("ok").with_header("name", "b")));

    assert_eq!(names(&drain(&mut sent)), vec!["count", "unrelated", "file0", "file1"]);
    assert_eq!(trace, vec!["count=2", "unrelated", "a", "b", "dialog:done"]);
    assert!(!queue.is_waiting());
    assert_eq!(drain(&mut events).last(), Some(&UiEvent::Idle));
    println!("✅ Follow-ups joined the tail; the local entry resolved last");

    // --- TEST 2: A refused publish resolves with a synthesized error ---
    println!("\n[Test 2] Transport failure...");
    let (inner, mut sent) = ChannelTransport::channel();
    let transport = FlakyTransport {
        inner,
        refuse: vec!["submit"],
    };
    let mut queue: MessageQueue<Trace> = MessageQueue::new(Box::new(transport), ui.clone());
    let mut trace = Trace::new();
    queue.send_message_block(&mut trace, Message::new("submit"), |t: &mut Trace, r: &Reply, _: &mut Scheduler<'_, Trace>| {
        t.push(r.error().unwrap_or("ok").to_string());
        Ok(())
    });
    queue.send_message_block(&mut trace, Message::new("whatami"), |t: &mut Trace, _: &Reply, _: &mut Scheduler<'_, Trace>| {
        t.push("whatami".to_string());
        Ok(())
    });
    assert_eq!(trace, vec![SEND_FAILURE.to_string()]);
    assert_eq!(names(&drain(&mut sent)), vec!["whatami"]);
    println!("✅ Synthesized err delivered; draining continued");

    // --- TEST 3: A failing handler is reported and isolated ---
    println!("\n[Test 3] Handler failure...");
    drain(&mut events);
    queue.reply(&mut trace, Reply::from_message(Message::new("ok")));
    queue.send_message_block(&mut trace, Message::new("contesttime"), |_: &mut Trace, _: &Reply, _: &mut Scheduler<'_, Trace>| {
        Err(HandlerError::Precondition("no clock".to_string()))
    });
    queue.queue_handler(&mut trace, json!(null), |t: &mut Trace, _: &Reply, _: &mut Scheduler<'_, Trace>| {
        t.push("after".to_string());
        Ok(())
    });
    queue.reply(&mut trace, Reply::from_message(Message::new("ok")));
    assert_eq!(trace.last().map(String::as_str), Some("after"));
    let alerted = drain(&mut events).into_iter().any(|e| {
        matches!(e, UiEvent::Alert { title, message }
            if title == "Unexpected exception" && message.contains("no clock"))
    });
    assert!(alerted);
    println!("✅ Failure alerted; next entry still ran");

    // --- TEST 4: Reset abandons everything ---
    println!("\n[Test 4] Reset mid-conversation...");
    let mut trace = Trace::new();
    for name in ["a", "b", "c"] {
        queue.send_message_block(&mut trace, Message::new(name), |t: &mut Trace, _: &Reply, _: &mut Scheduler<'_, Trace>| {
            t.push("late".to_string());
            Ok(())
        });
    }
    queue.reset();
    queue.reply(&mut trace, Reply::from_message(Message::new("ok")));
    assert!(trace.is_empty());
    assert_eq!(queue.pending_len(), 0);
    assert!(!queue.is_waiting());
    println!("✅ Late reply discarded; queue idle and empty");

    println!("\n--- All Message Queue Scenarios Passed ---");
    Ok(())
}
