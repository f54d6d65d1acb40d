//! # Clarifications
//!
//! Clarification requests (questions asked) and clarifications (answers,
//! possibly general ones without a request the user can see). Both lists are
//! refreshed in full after login and grow through pushes afterwards. Tables
//! list the newest entries first.

use serde_json::json;

use super::{alert_error, newest_first, problems, record_number, take_field, ClientScheduler};
use crate::client::ClientState;
use crate::protocol::{decode_indexed, Message, Reply};
use crate::queue::{HandlerError, HandlerResult};
use crate::ui::{ClarificationDetails, Dialog, DialogKind, Table, UiEvent};
use crate::utils::{decode_newlines, encode_newlines, epoch_time_to_string, escape_html, short_text};

/// Problem id the request form uses for "nothing selected".
pub const NO_PROBLEM: &str = "-1";

/// A question asked by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarificationRequest {
    /// Request id.
    pub id: String,
    /// Unix time of the request.
    pub time: i64,
    /// Id of the asking user.
    pub user_id: String,
    /// Problem label.
    pub problem: String,
    /// Question, newlines encoded.
    pub question: String,
}

/// An answer to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clarification {
    /// Clarification id.
    pub id: String,
    /// Id of the request it answers.
    pub req_id: String,
    /// Unix time of the answer.
    pub time: i64,
    /// Problem label.
    pub problem: String,
    /// Question, newlines encoded.
    pub question: String,
    /// Answer, newlines encoded.
    pub answer: String,
}

/// Which entry a details dialog starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsTarget {
    /// A row of the requests table.
    Request(String),
    /// A row of the clarifications table.
    Reply(String),
}

/// Both clarification lists.
#[derive(Debug, Clone, Default)]
pub struct ClarificationBook {
    requests: Vec<ClarificationRequest>,
    clarifications: Vec<Clarification>,
}

impl ClarificationBook {
    /// Requests, newest first.
    pub fn requests(&self) -> &[ClarificationRequest] {
        &self.requests
    }

    /// Clarifications, newest first.
    pub fn clarifications(&self) -> &[Clarification] {
        &self.clarifications
    }

    /// True when some clarification answers request `id`.
    pub fn is_answered(&self, id: &str) -> bool {
        self.clarifications.iter().any(|c| c.req_id == id)
    }

    fn sort(&mut self) {
        self.requests
            .sort_by(|a, b| newest_first(a.time, &a.id, b.time, &b.id));
        self.clarifications
            .sort_by(|a, b| newest_first(a.time, &a.id, b.time, &b.id));
    }

    /// Renders the requests table body.
    pub fn requests_html(&self) -> String {
        self.requests
            .iter()
            .map(|r| {
                let status = if self.is_answered(&r.id) {
                    "<span class=\"clarification-request-answered\">Answered</span>"
                } else {
                    "<span class=\"clarification-request-unanswered\">Unanswered</span>"
                };
                format!(
                    "<tr class=\"clarification-request-row\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&r.id),
                    escape_html(&epoch_time_to_string(r.time)),
                    escape_html(&r.problem),
                    status,
                    decode_newlines(&escape_html(&short_text(&r.question)), false),
                )
            })
            .collect()
    }

    /// Renders the clarifications table body.
    pub fn clarifications_html(&self) -> String {
        self.clarifications
            .iter()
            .map(|c| {
                format!(
                    "<tr class=\"clarification-row\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&c.id),
                    escape_html(&c.req_id),
                    escape_html(&epoch_time_to_string(c.time)),
                    escape_html(&c.problem),
                    decode_newlines(&escape_html(&short_text(&c.question)), false),
                    decode_newlines(&escape_html(&short_text(&c.answer)), false),
                )
            })
            .collect()
    }

    /// Builds the details dialog for a request and one of its replies.
    ///
    /// Replies are walked newest first: positive `offset` moves to older
    /// replies, negative to newer ones. Returns `None` when the target or the
    /// requested reply does not exist.
    pub fn details(&self, target: &DetailsTarget, offset: i64) -> Option<ClarificationDetails> {
        let (request_id, reply_id) = match target {
            DetailsTarget::Request(id) => (id.clone(), None),
            DetailsTarget::Reply(id) => {
                let reply = self.clarifications.iter().find(|c| &c.id == id)?;
                (reply.req_id.clone(), Some(id.as_str()))
            }
        };

        let replies: Vec<&Clarification> = self
            .clarifications
            .iter()
            .filter(|c| c.req_id == request_id)
            .collect();

        if replies.is_empty() {
            let request = self.requests.iter().find(|r| r.id == request_id)?;
            return Some(ClarificationDetails {
                request_id,
                problem: request.problem.clone(),
                question: decode_newlines(&request.question, true),
                answer: None,
                reply_id: None,
                has_previous: false,
                has_next: false,
            });
        }

        let start = reply_id
            .and_then(|id| replies.iter().position(|c| c.id == id))
            .unwrap_or(0) as i64;
        let pos = usize::try_from(start + offset).ok()?;
        let shown = replies.get(pos)?;
        // The question comes from the reply so general clarifications, whose
        // request the user cannot see, still show it.
        Some(ClarificationDetails {
            request_id,
            problem: shown.problem.clone(),
            question: decode_newlines(&shown.question, true),
            answer: Some(decode_newlines(&shown.answer, true)),
            reply_id: Some(shown.id.clone()),
            has_previous: pos + 1 < replies.len(),
            has_next: pos > 0,
        })
    }
}

fn render_requests(state: &ClientState) {
    state.ui.send(UiEvent::TableUpdated {
        table: Table::ClarificationRequests,
        html: state.clarifications.requests_html(),
    });
}

fn render_clarifications(state: &ClientState) {
    state.ui.send(UiEvent::TableUpdated {
        table: Table::Clarifications,
        html: state.clarifications.clarifications_html(),
    });
}

/// Refreshes the clarification requests.
pub fn get_clarification_requests(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("getclarificationrequests"), requests_reply);
}

fn requests_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if alert_error(state, reply, "Error updating clarification requests") {
        return Ok(());
    }
    let mut requests = Vec::new();
    for mut r in decode_indexed(&reply.message.headers, "time", &["id", "question", "problem", "user_id"]) {
        requests.push(ClarificationRequest {
            time: record_number(&r, "time")?,
            id: take_field(&mut r, "id"),
            user_id: take_field(&mut r, "user_id"),
            problem: take_field(&mut r, "problem"),
            question: take_field(&mut r, "question"),
        });
    }
    state.clarifications.requests = requests;
    state.clarifications.sort();
    render_requests(state);
    Ok(())
}

/// Refreshes the clarifications.
pub fn get_clarifications(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("getclarifications"), clarifications_reply);
}

fn clarifications_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if alert_error(state, reply, "Error updating clarifications") {
        return Ok(());
    }
    let mut items = Vec::new();
    for mut r in decode_indexed(
        &reply.message.headers,
        "time",
        &["req_id", "id", "question", "problem", "answer"],
    ) {
        items.push(Clarification {
            time: record_number(&r, "time")?,
            id: take_field(&mut r, "id"),
            req_id: take_field(&mut r, "req_id"),
            problem: take_field(&mut r, "problem"),
            question: take_field(&mut r, "question"),
            answer: take_field(&mut r, "answer"),
        });
    }
    state.clarifications.clarifications = items;
    state.clarifications.sort();
    render_clarifications(state);
    Ok(())
}

/// Handles an `updateclarificationrequests` push.
pub fn request_posted(state: &mut ClientState, message: &Message) -> HandlerResult {
    let request = ClarificationRequest {
        id: message.require("id")?.to_string(),
        time: message.number("time")?,
        user_id: message.header("user_id").unwrap_or_default().to_string(),
        problem: message.header("problem").unwrap_or_default().to_string(),
        question: message.header("question").unwrap_or_default().to_string(),
    };
    state.clarifications.requests.push(request);
    state.clarifications.sort();
    render_requests(state);
    Ok(())
}

/// Handles an `updateclarifications` push.
///
/// Re-renders the requests too, since the new answer may close one.
pub fn clarification_posted(state: &mut ClientState, message: &Message) -> HandlerResult {
    let clarification = Clarification {
        id: message.require("id")?.to_string(),
        req_id: message.header("req_id").unwrap_or_default().to_string(),
        time: message.number("time")?,
        problem: message.header("problem").unwrap_or_default().to_string(),
        question: message.header("question").unwrap_or_default().to_string(),
        answer: message.header("answer").unwrap_or_default().to_string(),
    };
    state.clarifications.clarifications.push(clarification);
    state.clarifications.sort();
    render_clarifications(state);
    render_requests(state);
    Ok(())
}

/// Opens the details dialog.
pub fn show_details(state: &ClientState, target: &DetailsTarget, offset: i64) {
    match state.clarifications.details(target, offset) {
        Some(details) => state.ui.send(UiEvent::OpenDialog(Dialog::ClarificationDetails(details))),
        None => log::warn!("No clarification details for {:?} at offset {}", target, offset),
    }
}

/// Refreshes the problems, then opens the request form once they arrived.
///
/// A pre-selected problem that is not in the refreshed list opens the form
/// with nothing selected.
pub fn request_clarification_dialog(sched: &mut ClientScheduler<'_>, problem_id: &str, question: &str) {
    problems::get_problems(sched);
    sched.queue_handler(
        json!({ "problem_id": problem_id, "question": question }),
        |state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>| {
            let data = reply
                .data
                .as_ref()
                .ok_or_else(|| HandlerError::Precondition("clarification dialog without data".into()))?;
            let text = |key: &str| data[key].as_str().unwrap_or_default().to_string();
            let problem_id = match state.catalog.problem(&text("problem_id")) {
                Some(problem) => problem.id.clone(),
                None => NO_PROBLEM.to_string(),
            };
            state.ui.send(UiEvent::OpenDialog(Dialog::ClarificationRequest {
                problems: state.catalog.problems().to_vec(),
                problem_id,
                question: text("question"),
            }));
            Ok(())
        },
    );
}

/// Sends a clarification request from the form.
pub fn send_clarification_request(
    state: &ClientState,
    sched: &mut ClientScheduler<'_>,
    problem_id: &str,
    question: &str,
) {
    if problem_id == NO_PROBLEM {
        state.ui.alert("You must select a problem!");
        return;
    }
    let msg = Message::new("clarificationrequest")
        .with_header("prob_id", problem_id)
        .with_header("question", encode_newlines(question));
    sched.send_message_block(msg, |state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>| {
        match reply.error() {
            None => state.ui.send(UiEvent::CloseDialog(DialogKind::ClarificationRequest)),
            Some(msg) => state.ui.alert(format!(
                "Failed to send clarification request. Error was: {}",
                msg
            )),
        }
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, time: i64, question: &str) -> ClarificationRequest {
        ClarificationRequest {
            id: id.into(),
            time,
            user_id: "3".into(),
            problem: "A".into(),
            question: question.into(),
        }
    }

    fn answer(id: &str, req_id: &str, time: i64, text: &str) -> Clarification {
        Clarification {
            id: id.into(),
            req_id: req_id.into(),
            time,
            problem: "A".into(),
            question: "q".into(),
            answer: text.into(),
        }
    }

    fn book() -> ClarificationBook {
        let mut book = ClarificationBook {
            requests: vec![request("1", 100, "first\u{1}line"), request("2", 100, "second")],
            clarifications: vec![
                answer("10", "1", 110, "old answer"),
                answer("11", "1", 120, "new answer"),
            ],
        };
        book.sort();
        book
    }

    #[test]
    fn sorted_newest_first_with_id_tiebreak() {
        let book = book();
        let ids: Vec<&str> = book.requests().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(book.clarifications()[0].id, "11");
    }

    #[test]
    fn requests_table_marks_answered() {
        let html = book().requests_html();
        assert_eq!(html.matches("clarification-request-unanswered").count(), 1);
        assert_eq!(html.matches("clarification-request-answered").count(), 1);
        assert!(html.contains("first ..."));
    }

    #[test]
    fn details_navigate_replies() {
        let book = book();
        let newest = book.details(&DetailsTarget::Request("1".into()), 0).unwrap();
        assert_eq!(newest.answer.as_deref(), Some("new answer"));
        assert!(newest.has_previous);
        assert!(!newest.has_next);

        let older = book.details(&DetailsTarget::Reply("11".into()), 1).unwrap();
        assert_eq!(older.reply_id.as_deref(), Some("10"));
        assert!(!older.has_previous);
        assert!(older.has_next);

        assert!(book.details(&DetailsTarget::Reply("10".into()), 1).is_none());
    }

    #[test]
    fn unanswered_request_shows_its_question() {
        let book = book();
        let d = book.details(&DetailsTarget::Request("2".into()), 0).unwrap();
        assert_eq!(d.question, "second");
        assert!(d.answer.is_none());
        assert!(book.details(&DetailsTarget::Request("99".into()), 0).is_none());
    }
}
