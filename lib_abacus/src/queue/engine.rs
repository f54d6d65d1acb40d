//! # Message Queue Engine
//!
//! A FIFO of pending interactions with a single slot for the one request that
//! is allowed to be in flight. The state the handlers operate on is owned by
//! the caller and lent to the queue for each call, so the engine stays a plain
//! synchronous state machine that an async session loop can drive.

use std::collections::VecDeque;

use serde_json::Value;

use super::channel::Transport;
use super::HandlerResult;
use crate::protocol::{Message, Reply};
use crate::ui::{UiEvent, UiSink};

/// Text of the reply synthesized when a request could not be handed to the
/// transport.
pub const SEND_FAILURE: &str = "Error sending message to Abacus server.";

/// Callback that receives the reply to a queued entry.
///
/// It may schedule follow-up entries through the [`Scheduler`]; those join
/// the tail of the queue and run after everything already pending.
pub type ReplyHandler<S> =
    Box<dyn FnOnce(&mut S, &Reply, &mut Scheduler<'_, S>) -> HandlerResult + Send>;

enum Entry<S> {
    /// Sent to the server; resolved by its `ok`/`err`.
    Request {
        message: Message,
        handler: ReplyHandler<S>,
    },
    /// Never sent; resolved by a synthesized `ok` carrying `data`.
    Local { data: Value, handler: ReplyHandler<S> },
}

/// Appends entries to the queue without pumping it.
///
/// Handed to reply handlers and to [`MessageQueue::schedule`] callers. The
/// queue pumps once the borrow ends.
pub struct Scheduler<'a, S> {
    pending: &'a mut VecDeque<Entry<S>>,
}

impl<S> Scheduler<'_, S> {
    /// Queues a request for the server.
    pub fn send_message_block<F>(&mut self, message: Message, handler: F)
    where
        F: FnOnce(&mut S, &Reply, &mut Scheduler<'_, S>) -> HandlerResult + Send + 'static,
    {
        self.pending.push_back(Entry::Request {
            message,
            handler: Box::new(handler),
        });
    }

    /// Queues a handler-only entry that resolves with `data` once every
    /// earlier entry has been answered.
    pub fn queue_handler<F>(&mut self, data: Value, handler: F)
    where
        F: FnOnce(&mut S, &Reply, &mut Scheduler<'_, S>) -> HandlerResult + Send + 'static,
    {
        self.pending.push_back(Entry::Local {
            data,
            handler: Box::new(handler),
        });
    }

    /// Entries currently waiting behind the in-flight one.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// # Message Queue
///
/// Guarantees at most one request in flight and delivers every reply to the
/// handler of the oldest unanswered entry.
pub struct MessageQueue<S> {
    pending: VecDeque<Entry<S>>,
    waiting: bool,
    active: Option<ReplyHandler<S>>,
    transport: Box<dyn Transport>,
    ui: UiSink,
}

impl<S> MessageQueue<S> {
    /// Creates an empty, idle queue publishing through `transport`.
    pub fn new(transport: Box<dyn Transport>, ui: UiSink) -> Self {
        Self {
            pending: VecDeque::new(),
            waiting: false,
            active: None,
            transport,
            ui,
        }
    }

    /// True while an entry awaits its reply.
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Entries queued behind the in-flight one.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Appends a request and pumps.
    pub fn send_message_block<F>(&mut self, state: &mut S, message: Message, handler: F)
    where
        F: FnOnce(&mut S, &Reply, &mut Scheduler<'_, S>) -> HandlerResult + Send + 'static,
    {
        self.schedule(state, |_, sched| sched.send_message_block(message, handler));
    }

    /// Appends a handler-only entry and pumps.
    pub fn queue_handler<F>(&mut self, state: &mut S, data: Value, handler: F)
    where
        F: FnOnce(&mut S, &Reply, &mut Scheduler<'_, S>) -> HandlerResult + Send + 'static,
    {
        self.schedule(state, |_, sched| sched.queue_handler(data, handler));
    }

    /// Runs `f` with a scheduler over this queue, then pumps.
    ///
    /// Everything `f` schedules lands in the queue before the pump runs, so a
    /// multi-step operation is enqueued atomically.
    pub fn schedule<R>(
        &mut self,
        state: &mut S,
        f: impl FnOnce(&mut S, &mut Scheduler<'_, S>) -> R,
    ) -> R {
        let result = {
            let mut sched = Scheduler {
                pending: &mut self.pending,
            };
            f(state, &mut sched)
        };
        self.pump(state);
        result
    }

    /// Delivers an `ok`/`err` received from the server.
    ///
    /// A reply with nothing in flight is logged and dropped.
    pub fn reply(&mut self, state: &mut S, reply: Reply) {
        if !self.waiting {
            log::warn!(
                "Discarding '{}' reply received with no request outstanding",
                reply.message.name
            );
            return;
        }
        self.resolve(state, reply);
        self.pump(state);
    }

    /// Drops every pending entry and the in-flight handler, and goes idle.
    ///
    /// Replies arriving afterwards find nothing waiting and are discarded.
    pub fn reset(&mut self) {
        if !self.pending.is_empty() || self.waiting {
            log::info!(
                "Resetting message queue ({} pending, in flight: {})",
                self.pending.len(),
                self.waiting
            );
        }
        self.pending.clear();
        self.active = None;
        self.waiting = false;
        self.ui.send(UiEvent::Idle);
    }

    fn pump(&mut self, state: &mut S) {
        while !self.waiting {
            let Some(entry) = self.pending.pop_front() else {
                self.ui.send(UiEvent::Idle);
                return;
            };
            self.ui.send(UiEvent::Waiting {
                remaining: self.pending.len() + 1,
            });
            self.waiting = true;

            match entry {
                Entry::Local { data, handler } => {
                    self.active = Some(handler);
                    self.resolve(state, Reply::local(data));
                }
                Entry::Request { message, handler } => {
                    self.active = Some(handler);
                    log::debug!("{}", message.log_text("Sent"));
                    if let Err(e) = self.transport.publish(&message) {
                        log::error!("Failed to publish '{}': {}", message.name, e);
                        self.resolve(state, Reply::error_reply(SEND_FAILURE));
                    }
                }
            }
        }
    }

    /// Runs the active handler against `reply` and clears the in-flight slot.
    fn resolve(&mut self, state: &mut S, reply: Reply) {
        if let Some(handler) = self.active.take() {
            let mut sched = Scheduler {
                pending: &mut self.pending,
            };
            if let Err(e) = handler(state, &reply, &mut sched) {
                let text = format!(
                    "Unexpected exception \"{}\" generated whilst processing message \"{}\"",
                    e, reply.message.name
                );
                log::error!("{}", text);
                self.ui.send(UiEvent::LogLine(text.clone()));
                self.ui.alert_titled("Unexpected exception", text);
            }
        }
        self.waiting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolError;
    use crate::queue::{ChannelTransport, HandlerError};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    type Log = Vec<String>;

    fn queue() -> (
        MessageQueue<Log>,
        UnboundedReceiver<Message>,
        UnboundedReceiver<UiEvent>,
    ) {
        let (transport, sent) = ChannelTransport::channel();
        let (ui, events) = UiSink::channel();
        (MessageQueue::new(Box::new(transport), ui), sent, events)
    }

    fn record(tag: &'static str) -> impl FnOnce(&mut Log, &Reply, &mut Scheduler<'_, Log>) -> HandlerResult + Send {
        move |log: &mut Log, reply: &Reply, _: &mut Scheduler<'_, Log>| {
            log.push(format!("{}:{}", tag, reply.message.name));
            Ok(())
        }
    }

    fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(v) = rx.try_recv() {
            out.push(v);
        }
        out
    }

    #[test]
    fn one_in_flight_and_fifo_across_local_entries() {
        let (mut q, mut sent, _events) = queue();
        let mut log = Log::new();

        q.send_message_block(&mut log, Message::new("a"), record("a"));
        q.queue_handler(&mut log, json!(null), record("local"));
        q.send_message_block(&mut log, Message::new("b"), record("b"));

        let first = drain(&mut sent);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "a");
        assert!(log.is_empty());
        assert_eq!(q.pending_len(), 2);

        q.reply(&mut log, Reply::from_message(Message::new("ok")));
        // The local entry resolves immediately, then "b" goes out.
        assert_eq!(log, vec!["a:ok", "local:ok"]);
        let second = drain(&mut sent);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "b");

        q.reply(&mut log, Reply::from_message(Message::new("err")));
        assert_eq!(log, vec!["a:ok", "local:ok", "b:err"]);
        assert!(!q.is_waiting());
    }

    #[test]
    fn local_entry_receives_its_data() {
        let (mut q, _sent, _events) = queue();
        let mut log = Log::new();
        q.queue_handler(&mut log, json!({"dialog": "submit"}), |log: &mut Log, reply: &Reply, _: &mut Scheduler<'_, Log>| {
            assert!(reply.is_ok());
            log.push(reply.data.as_ref().map(|d| d["dialog"].to_string()).unwrap_or_default());
            Ok(())
        });
        assert_eq!(log, vec!["\"submit\""]);
        assert!(!q.is_waiting());
    }

    #[test]
    fn reset_prevents_stale_handlers() {
        let (mut q, _sent, _events) = queue();
        let mut log = Log::new();
        q.send_message_block(&mut log, Message::new("a"), record("a"));
        q.send_message_block(&mut log, Message::new("b"), record("b"));

        q.reset();
        assert!(!q.is_waiting());
        assert_eq!(q.pending_len(), 0);

        q.reply(&mut log, Reply::from_message(Message::new("ok")));
        q.reply(&mut log, Reply::from_message(Message::new("err")));
        assert!(log.is_empty());
    }

    #[test]
    fn failing_handler_does_not_stall_the_queue() {
        let (mut q, mut sent, mut events) = queue();
        let mut log = Log::new();

        q.send_message_block(&mut log, Message::new("a"), |_: &mut Log, _: &Reply, _: &mut Scheduler<'_, Log>| {
            Err(HandlerError::from(ProtocolError::MissingHeader {
                message: "ok".into(),
                header: "user".into(),
            }))
        });
        q.send_message_block(&mut log, Message::new("b"), record("b"));

        q.reply(&mut log, Reply::from_message(Message::new("ok")));
        let names: Vec<String> = drain(&mut sent).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["a", "b"]);

        let alerted = drain(&mut events).into_iter().any(|e| {
            matches!(e, UiEvent::Alert { ref title, ref message }
                if title == "Unexpected exception" && message.contains("processing message \"ok\""))
        });
        assert!(alerted);

        q.reply(&mut log, Reply::from_message(Message::new("ok")));
        assert_eq!(log, vec!["b:ok"]);
    }

    #[test]
    fn follow_ups_join_the_tail() {
        let (mut q, mut sent, _events) = queue();
        let mut log = Log::new();

        q.send_message_block(&mut log, Message::new("a"), |log: &mut Log, _: &Reply, sched: &mut Scheduler<'_, Log>| {
            log.push("a".into());
            sched.send_message_block(Message::new("c"), record("c"));
            Ok(())
        });
        q.send_message_block(&mut log, Message::new("b"), record("b"));

        for _ in 0..3 {
            q.reply(&mut log, Reply::from_message(Message::new("ok")));
        }
        let names: Vec<String> = drain(&mut sent).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(log, vec!["a", "b:ok", "c:ok"]);
    }

    #[test]
    fn publish_failure_synthesizes_error_reply() {
        let (mut q, sent, _events) = queue();
        drop(sent);
        let mut log = Log::new();

        q.send_message_block(&mut log, Message::new("a"), |log: &mut Log, reply: &Reply, _: &mut Scheduler<'_, Log>| {
            log.push(reply.error().unwrap_or("none").to_string());
            Ok(())
        });
        q.send_message_block(&mut log, Message::new("b"), record("b"));

        assert_eq!(log, vec![SEND_FAILURE.to_string(), "b:err".to_string()]);
        assert!(!q.is_waiting());
    }

    #[test]
    fn unsolicited_reply_is_ignored() {
        let (mut q, _sent, _events) = queue();
        let mut log = Log::new();
        q.reply(&mut log, Reply::from_message(Message::new("ok")));
        assert!(log.is_empty());
        assert!(!q.is_waiting());
    }

    #[test]
    fn waiting_indicator_counts_down_to_idle() {
        let (mut q, _sent, mut events) = queue();
        let mut log = Log::new();
        q.schedule(&mut log, |_, sched| {
            sched.send_message_block(Message::new("a"), record("a"));
            sched.send_message_block(Message::new("b"), record("b"));
        });
        q.reply(&mut log, Reply::from_message(Message::new("ok")));
        q.reply(&mut log, Reply::from_message(Message::new("ok")));

        let seen: Vec<UiEvent> = drain(&mut events);
        assert_eq!(
            seen,
            vec![
                UiEvent::Waiting { remaining: 2 },
                UiEvent::Waiting { remaining: 1 },
                UiEvent::Idle,
            ]
        );
    }
}
