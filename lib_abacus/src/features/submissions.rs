//! # Submissions
//!
//! The user's submissions (every submission for judges), making new ones and
//! retrieving the files attached to a judged one.

use serde::Serialize;
use serde_json::{json, Value};

use super::session::Permission;
use super::{alert_error, clarifications, default_reply, newest_first, problems, record_number, take_field, ClientScheduler};
use crate::client::ClientState;
use crate::protocol::{decode_indexed, Message, ProtocolError, Reply};
use crate::queue::{HandlerError, HandlerResult};
use crate::ui::{Dialog, DialogKind, Table, UiEvent};
use crate::utils::{epoch_time_to_string, escape_html, time_to_string};

/// Problem or language id the submission form uses for "nothing selected".
pub const NO_SELECTION: &str = "-1";

/// Problem file holding the expected output.
const EXPECTED_OUTPUT_FILE: &str = "testcase.output";

/// Most files a submission is expected to have; a larger `count` is treated
/// as a malformed reply rather than queued.
pub const MAX_SUBMISSION_FILES: usize = 64;

/// One submission as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Submission id.
    pub submission_id: String,
    /// Unix time of the submission.
    pub time: i64,
    /// Contest seconds elapsed at submission.
    pub contesttime: i64,
    /// Problem id.
    pub prob_id: String,
    /// Problem label.
    pub problem: String,
    /// Judging outcome text.
    pub comment: String,
}

/// How a judging comment is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Compilation failed; the row opens the compiler output.
    CompilationFailed,
    /// Any kind of wrong result.
    Wrong,
    /// Accepted.
    Correct,
    /// Pending or unknown.
    Other,
}

impl Verdict {
    /// Classifies a judging comment.
    pub fn classify(comment: &str) -> Self {
        match comment {
            "Compilation failed" => Self::CompilationFailed,
            "Abnormal termination of program" | "Wrong answer" | "Time limit exceeded" | "Format error" => {
                Self::Wrong
            }
            "Correct answer" => Self::Correct,
            _ => Self::Other,
        }
    }

    /// CSS class of the comment cell.
    pub fn comment_class(self) -> &'static str {
        match self {
            Self::CompilationFailed => "submission-compilation-failed",
            Self::Wrong => "submission-wrong",
            Self::Correct => "submission-correct",
            Self::Other => "",
        }
    }

    /// CSS class of the row.
    pub fn row_class(self) -> &'static str {
        match self {
            Self::CompilationFailed => "submission-row-clickable submission-row",
            _ => "submission-row",
        }
    }
}

/// A file retrieved for the submission result dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionFile {
    /// Display name.
    pub name: String,
    /// Decoded text.
    pub content: String,
}

/// Submission list plus the files being gathered for a result dialog.
#[derive(Debug, Clone, Default)]
pub struct SubmissionList {
    submissions: Vec<Submission>,
    collected: Vec<SubmissionFile>,
}

impl SubmissionList {
    /// Submissions, newest first.
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Looks a submission up by id.
    pub fn submission(&self, id: &str) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.submission_id == id)
    }

    /// Replaces the submission with the same id, or appends.
    pub fn upsert(&mut self, submission: Submission) {
        match self
            .submissions
            .iter_mut()
            .find(|s| s.submission_id == submission.submission_id)
        {
            Some(existing) => *existing = submission,
            None => self.submissions.push(submission),
        }
        self.sort();
    }

    fn replace_all(&mut self, submissions: Vec<Submission>) {
        self.submissions = submissions;
        self.sort();
    }

    fn sort(&mut self) {
        self.submissions
            .sort_by(|a, b| newest_first(a.time, &a.submission_id, b.time, &b.submission_id));
    }

    /// Renders the submissions table body.
    pub fn html(&self) -> String {
        let mut html = String::new();
        for s in &self.submissions {
            let verdict = Verdict::classify(&s.comment);
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
                 <td><div class=\"{}\">{}</div></td>\
                 <td><button class=\"abacus-button ui-state-default submission-request-clarification\">Request clarification</button></td></tr>",
                verdict.row_class(),
                escape_html(&s.submission_id),
                escape_html(&time_to_string(s.contesttime)),
                escape_html(&epoch_time_to_string(s.time)),
                escape_html(&s.problem),
                verdict.comment_class(),
                escape_html(&s.comment),
            ));
        }
        html
    }
}

fn render(state: &ClientState) {
    state.ui.send(UiEvent::TableUpdated {
        table: Table::Submissions,
        html: state.submissions.html(),
    });
}

/// Refreshes the submission list.
pub fn get_submissions(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("getsubmissions"), submissions_reply);
}

fn submissions_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if alert_error(state, reply, "Error updating submissions") {
        return Ok(());
    }
    let mut items = Vec::new();
    for mut r in decode_indexed(
        &reply.message.headers,
        "time",
        &["submission_id", "contesttime", "prob_id", "problem", "comment"],
    ) {
        items.push(Submission {
            time: record_number(&r, "time")?,
            contesttime: record_number(&r, "contesttime")?,
            submission_id: take_field(&mut r, "submission_id"),
            prob_id: take_field(&mut r, "prob_id"),
            problem: take_field(&mut r, "problem"),
            comment: take_field(&mut r, "comment"),
        });
    }
    log::debug!("Received {} submission(s)", items.len());
    state.submissions.replace_all(items);
    render(state);
    Ok(())
}

/// Handles an `updatesubmissions` push.
pub fn submission_updated(state: &mut ClientState, message: &Message) -> HandlerResult {
    let submission = Submission {
        submission_id: message.require("submission_id")?.to_string(),
        time: message.number("time")?,
        contesttime: message.number("contesttime")?,
        prob_id: message.header("prob_id").unwrap_or_default().to_string(),
        problem: message.header("problem").unwrap_or_default().to_string(),
        comment: message.header("comment").unwrap_or_default().to_string(),
    };
    state.submissions.upsert(submission);
    render(state);
    Ok(())
}

/// Refreshes problems and languages, then opens the submission form.
pub fn make_submission_dialog(sched: &mut ClientScheduler<'_>) {
    problems::get_problems(sched);
    problems::get_languages(sched);
    sched.queue_handler(Value::Null, |state: &mut ClientState, _: &Reply, _: &mut ClientScheduler<'_>| {
        state.ui.send(UiEvent::OpenDialog(Dialog::Submission {
            problems: state.catalog.problems().to_vec(),
            languages: state.catalog.languages().to_vec(),
            username: state.session.username().to_string(),
        }));
        Ok(())
    });
}

/// Opens the clarification request form about one submission, with its
/// problem pre-selected and the question prefixed by the submission id.
pub fn request_clarification(state: &ClientState, sched: &mut ClientScheduler<'_>, submission_id: &str) {
    let Some(submission) = state.submissions.submission(submission_id) else {
        log::warn!("Submission {} is not listed; cannot ask about it", submission_id);
        return;
    };
    // The table shows the problem code; the form selects by id.
    let problem_id = state
        .catalog
        .problem_for_code(&submission.problem)
        .map(|p| p.id.clone())
        .unwrap_or_else(|| submission.prob_id.clone());
    clarifications::request_clarification_dialog(
        sched,
        &problem_id,
        &format!("[Submission {}] ", submission.submission_id),
    );
}

/// Submits the uploaded file identified by `file_key`.
pub fn submit(
    state: &ClientState,
    sched: &mut ClientScheduler<'_>,
    problem_id: &str,
    language: &str,
    file_key: Option<&str>,
) {
    if problem_id == NO_SELECTION {
        state.ui.alert("You must select a problem!");
        return;
    }
    if language == NO_SELECTION {
        state.ui.alert("You must select a language!");
        return;
    }
    let mut msg = Message::new("submit")
        .with_header("prob_id", problem_id)
        .with_header("lang", language);
    if let Some(key) = file_key {
        msg = msg.with_file_key(key);
    }
    sched.send_message_block(msg, |state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>| {
        match reply.error() {
            None => state.ui.send(UiEvent::CloseDialog(DialogKind::Submission)),
            Some(msg) => state
                .ui
                .alert(format!("Failed to make submission. Error was: {}", msg)),
        }
        Ok(())
    });
}

fn fetch_data(submission_id: &str, index: usize) -> Message {
    Message::new("fetchfile")
        .with_header("request", "data")
        .with_header("submission_id", submission_id)
        .with_header("index", index.to_string())
}

/// Fetches the compiler output of a failed submission and shows it.
pub fn show_compilation_failure(sched: &mut ClientScheduler<'_>, submission_id: &str) {
    sched.send_message_block(
        fetch_data(submission_id, 0),
        |state: &mut ClientState, reply: &Reply, sched: &mut ClientScheduler<'_>| {
            if reply.error().is_some() {
                return default_reply(state, reply, sched);
            }
            let content = reply.message.content_text().unwrap_or_default();
            state.ui.send(UiEvent::OpenDialog(Dialog::CompilationFailure {
                content: escape_html(&content),
            }));
            Ok(())
        },
    );
}

/// Collects every file of a submission, then opens the result dialog.
///
/// The file count comes first; the per-file fetches, the expected output,
/// the source and the dialog itself are queued from its reply so they run
/// in that order.
pub fn show_submission(sched: &mut ClientScheduler<'_>, submission_id: &str) {
    let msg = Message::new("fetchfile")
        .with_header("request", "count")
        .with_header("submission_id", submission_id);
    let id = submission_id.to_string();
    sched.send_message_block(
        msg,
        move |state: &mut ClientState, reply: &Reply, sched: &mut ClientScheduler<'_>| {
            if reply.error().is_some() {
                return default_reply(state, reply, sched);
            }
            let count: usize = reply.message.number("count")?;
            if count > MAX_SUBMISSION_FILES {
                return Err(ProtocolError::InvalidNumber {
                    header: "count".to_string(),
                    value: count.to_string(),
                }
                .into());
            }
            state.submissions.collected.clear();

            for index in 0..count {
                sched.send_message_block(fetch_data(&id, index), |state: &mut ClientState, reply: &Reply, sched: &mut ClientScheduler<'_>| {
                    let name = reply.header("name").unwrap_or_default().to_string();
                    collect_file(state, reply, sched, name)
                });
            }

            if state.session.has_permission(Permission::SeeProblemDetails) {
                match state.submissions.submission(&id) {
                    Some(submission) => {
                        let msg = Message::new("getprobfile")
                            .with_header("prob_id", submission.prob_id.as_str())
                            .with_header("file", EXPECTED_OUTPUT_FILE);
                        sched.send_message_block(msg, |state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>| {
                            match reply.error() {
                                None => push_file(state, reply, "Expected output"),
                                Some(msg) => log::debug!("No expected output available: {}", msg),
                            }
                            Ok(())
                        });
                    }
                    None => log::warn!("Submission {} is not listed; skipping expected output", id),
                }
            }

            let msg = Message::new("getsubmissionsource").with_header("submission_id", id.as_str());
            sched.send_message_block(msg, |state: &mut ClientState, reply: &Reply, sched: &mut ClientScheduler<'_>| {
                collect_file(state, reply, sched, "Contestant source".to_string())
            });

            sched.queue_handler(json!(id), open_result_dialog);
            Ok(())
        },
    );
}

fn push_file(state: &mut ClientState, reply: &Reply, name: &str) {
    state.submissions.collected.push(SubmissionFile {
        name: name.to_string(),
        content: reply.message.content_text().unwrap_or_default(),
    });
}

fn collect_file(state: &mut ClientState, reply: &Reply, sched: &mut ClientScheduler<'_>, name: String) -> HandlerResult {
    if reply.error().is_some() {
        return default_reply(state, reply, sched);
    }
    push_file(state, reply, &name);
    Ok(())
}

fn open_result_dialog(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    let submission_id = reply
        .data
        .as_ref()
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::Precondition("result dialog without a submission id".into()))?
        .to_string();
    let files = std::mem::take(&mut state.submissions.collected);
    state.ui.send(UiEvent::OpenDialog(Dialog::SubmissionResult {
        submission_id,
        files,
        judge: state.session.has_permission(Permission::Judge),
    }));
    Ok(())
}
