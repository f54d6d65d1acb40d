//! Problem and language catalogues.
//!
//! The server never pushes changes to either list, so dialogs refresh them
//! right before opening.

use serde::Serialize;

use super::{alert_error, ClientScheduler};
use crate::client::ClientState;
use crate::protocol::{decode_indexed, Message, Reply};
use crate::queue::HandlerResult;
use crate::ui::UiEvent;

/// A problem as listed by `getproblems`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Server id.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Short code shown in tables.
    pub code: String,
}

/// What the user can currently submit to and in.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    problems: Vec<Problem>,
    languages: Vec<String>,
}

impl Catalog {
    /// Problems in server order.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Languages in server order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Looks a problem up by id.
    pub fn problem(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    /// Looks a problem up by its short code, as shown in the tables.
    pub fn problem_for_code(&self, code: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.code == code)
    }
}

/// Refreshes the problem list.
pub fn get_problems(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("getproblems"), problems_reply);
}

fn problems_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if alert_error(state, reply, "Error fetching problem info") {
        return Ok(());
    }
    let problems: Vec<Problem> = decode_indexed(&reply.message.headers, "id", &["name", "code"])
        .into_iter()
        .map(|mut r| Problem {
            id: r.remove("id").unwrap_or_default(),
            name: r.remove("name").unwrap_or_default(),
            code: r.remove("code").unwrap_or_default(),
        })
        .collect();
    log::debug!("Received {} problem(s)", problems.len());
    state.catalog.problems = problems.clone();
    state.ui.send(UiEvent::ProblemsChanged(problems));
    Ok(())
}

/// Refreshes the language list.
pub fn get_languages(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("getlanguages"), languages_reply);
}

fn languages_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if alert_error(state, reply, "Error fetching language info") {
        return Ok(());
    }
    let languages: Vec<String> = decode_indexed(&reply.message.headers, "language", &[])
        .into_iter()
        .filter_map(|mut r| r.remove("language"))
        .collect();
    state.catalog.languages = languages.clone();
    state.ui.send(UiEvent::LanguagesChanged(languages));
    Ok(())
}
