//! # UI Boundary
//!
//! The engines never touch a widget. Every user-visible effect is a
//! [`UiEvent`] pushed over an unbounded channel to whatever front-end is
//! attached (the console client, a test harness, a web bridge).

use serde::Serialize;
use tokio::sync::mpsc;

use crate::features::problems::Problem;
use crate::features::submissions::SubmissionFile;
use crate::standings::StandingsView;

/// Tabs that can be flagged as holding new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    /// Clarifications tab.
    Clarifications,
    /// Submissions tab.
    Submissions,
    /// Standings tab.
    Standings,
}

/// Tables rendered as HTML row fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Clarification requests table body.
    ClarificationRequests,
    /// Clarifications table body.
    Clarifications,
    /// Submissions table body.
    Submissions,
}

/// Dialogs the front-end may be asked to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    /// The clarification request form.
    ClarificationRequest,
    /// The submission form.
    Submission,
}

/// Details of one clarification request and one of its replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClarificationDetails {
    /// Id of the request.
    pub request_id: String,
    /// Problem label shown in the dialog.
    pub problem: String,
    /// Question text with newlines decoded.
    pub question: String,
    /// Answer of the shown reply; `None` while unanswered.
    pub answer: Option<String>,
    /// Id of the shown reply, for paging from it.
    pub reply_id: Option<String>,
    /// Whether an older reply exists.
    pub has_previous: bool,
    /// Whether a newer reply exists.
    pub has_next: bool,
}

/// A dialog to open, with everything it shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "dialog", rename_all = "snake_case")]
pub enum Dialog {
    /// Form to ask for a clarification, pre-filled.
    ClarificationRequest {
        /// Problems to choose from.
        problems: Vec<Problem>,
        /// Pre-selected problem id, `0` for general.
        problem_id: String,
        /// Pre-filled question.
        question: String,
    },
    /// Details of a clarification request and its replies.
    ClarificationDetails(ClarificationDetails),
    /// Form to make a submission.
    Submission {
        /// Problems to choose from.
        problems: Vec<Problem>,
        /// Languages to choose from.
        languages: Vec<String>,
        /// User the upload is made for.
        username: String,
    },
    /// Compiler output of a failed submission.
    CompilationFailure {
        /// Escaped compiler output.
        content: String,
    },
    /// Every file collected for a submission.
    SubmissionResult {
        /// Submission id.
        submission_id: String,
        /// Collected files in retrieval order.
        files: Vec<SubmissionFile>,
        /// Show judge buttons instead of contestant buttons.
        judge: bool,
    },
}

/// One user-visible effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum UiEvent {
    /// A blocking message box.
    Alert {
        /// Box title.
        title: String,
        /// Box text.
        message: String,
    },
    /// Requests are in flight or queued.
    Waiting {
        /// Entries not yet resolved, the in-flight one included.
        remaining: usize,
    },
    /// The message queue drained.
    Idle,
    /// The transport connection went up or down.
    Connected(bool),
    /// Login succeeded.
    LoggedIn {
        /// The authenticated user.
        username: String,
    },
    /// Login failed. The text is escaped and may be `&nbsp;`.
    LoginFailed {
        /// Escaped error text.
        error_html: String,
    },
    /// Client state can no longer be trusted; the front-end should restart.
    ReloadRequired,
    /// A tab received new data.
    HighlightTab(Tab),
    /// New contest status line.
    ContestStatus {
        /// `Contest stopped` or the countdown text.
        text: String,
        /// Whether the standings are frozen for this user.
        frozen: bool,
    },
    /// A table body was re-rendered.
    TableUpdated {
        /// Which table.
        table: Table,
        /// Rendered `<tr>` rows.
        html: String,
    },
    /// Standings re-rendered.
    StandingsRendered(StandingsView),
    /// The problem list changed.
    ProblemsChanged(Vec<Problem>),
    /// The language list changed.
    LanguagesChanged(Vec<String>),
    /// Open a dialog.
    OpenDialog(Dialog),
    /// Close a dialog.
    CloseDialog(DialogKind),
    /// Show or hide the debug panel.
    DebugPanel(bool),
    /// A line for the message log.
    LogLine(String),
    /// New resources page body.
    ResourcesUpdated(String),
}

/// Sending half of the UI channel.
///
/// Cloned freely; a closed receiver silently drops events since there is no
/// one left to show them to.
#[derive(Debug, Clone)]
pub struct UiSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl UiSink {
    /// Creates a sink and the matching receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Wraps an existing sender.
    pub fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    /// Emits an event.
    pub fn send(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("UI receiver dropped; event discarded");
        }
    }

    /// Emits an alert with the default title.
    pub fn alert(&self, message: impl Into<String>) {
        self.alert_titled("Alert", message);
    }

    /// Emits an alert with a custom title.
    pub fn alert_titled(&self, title: impl Into<String>, message: impl Into<String>) {
        self.send(UiEvent::Alert {
            title: title.into(),
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_default_title() {
        let (ui, mut rx) = UiSink::channel();
        ui.alert("boom");
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Alert {
                title: "Alert".into(),
                message: "boom".into()
            }
        );
    }

    #[test]
    fn dropped_receiver_is_harmless() {
        let (ui, rx) = UiSink::channel();
        drop(rx);
        ui.send(UiEvent::Idle);
    }

    #[test]
    fn events_serialize_tagged() {
        let v = serde_json::to_value(UiEvent::Waiting { remaining: 2 }).unwrap();
        assert_eq!(v["event"], "waiting");
        assert_eq!(v["data"]["remaining"], 2);
        let v = serde_json::to_value(UiEvent::Connected(true)).unwrap();
        assert_eq!(v["data"], true);
    }
}
