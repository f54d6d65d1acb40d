//! # Abacus Client
//!
//! Glues the message queue to the feature modules. The transport hands every
//! inbound message to [`AbacusClient::on_message`]; the front-end hands every
//! user action to [`AbacusClient::apply`]. Both run on the same task, so the
//! state is never touched concurrently.

use crate::features::clarifications::{self, ClarificationBook, DetailsTarget};
use crate::features::contest_status::{self, ContestStatus};
use crate::features::problems::Catalog;
use crate::features::session::{self, Permission, Session};
use crate::features::submissions::{self, SubmissionList};
use crate::features::{default_reply, standings};
use crate::protocol::{Inbound, Message, Reply};
use crate::queue::{HandlerResult, MessageQueue, Transport};
use crate::standings::StandingsBoard;
use crate::ui::{Tab, UiEvent, UiSink};

/// Log target of the lines the server pushes on its log channel, so a
/// front-end can route them apart from the client's own logging.
pub const SERVER_LOG_TARGET: &str = "abacus_server";

/// Source of the current time in milliseconds since the Unix epoch.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Settings the client needs at runtime.
#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    /// User for automatic authentication; `nologin` disables it.
    pub auto_user: Option<String>,
    /// Password for automatic authentication.
    pub auto_pass: Option<String>,
    /// Measured delay between the server sending and the client receiving.
    pub network_lag_ms: i64,
}

/// Everything the reply and push handlers operate on.
#[derive(Debug)]
pub struct ClientState {
    /// Outlet for user-visible effects.
    pub ui: UiSink,
    /// Runtime settings.
    pub settings: ClientSettings,
    /// Time source.
    pub clock: Clock,
    /// Connection and login.
    pub session: Session,
    /// Problems and languages.
    pub catalog: Catalog,
    /// Clarification requests and replies.
    pub clarifications: ClarificationBook,
    /// Submissions.
    pub submissions: SubmissionList,
    /// Contest clock.
    pub contest: ContestStatus,
    /// Standings table.
    pub standings: StandingsBoard,
    /// Whether the debug panel is shown.
    pub debug_visible: bool,
}

impl ClientState {
    /// Fresh state for a client that has not connected yet.
    pub fn new(settings: ClientSettings, ui: UiSink) -> Self {
        Self {
            ui,
            settings,
            clock: system_clock,
            session: Session::default(),
            catalog: Catalog::default(),
            clarifications: ClarificationBook::default(),
            submissions: SubmissionList::default(),
            contest: ContestStatus::default(),
            standings: StandingsBoard::new(),
            debug_visible: false,
        }
    }

    /// Milliseconds since the epoch.
    pub fn now_ms(&self) -> i64 {
        (self.clock)()
    }

    /// Seconds since the epoch.
    pub fn now(&self) -> i64 {
        self.now_ms().div_euclid(1000)
    }

    /// Checks a permission of the logged-in user.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.session.has_permission(permission)
    }
}

/// A user action.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Log in with credentials.
    Login {
        /// User name.
        user: String,
        /// Password.
        pass: String,
    },
    /// Log out.
    Logout,
    /// New standings filter text.
    SetStandingsFilter(String),
    /// Open the clarification request form.
    RequestClarificationDialog {
        /// Pre-selected problem id.
        problem_id: String,
        /// Pre-filled question.
        question: String,
    },
    /// Send the clarification request form.
    SendClarificationRequest {
        /// Selected problem id, `-1` when none.
        problem_id: String,
        /// Question text.
        question: String,
    },
    /// Open the details of a clarification request.
    ShowClarificationRequest(String),
    /// Open the details of a clarification, or page from it.
    ShowClarification {
        /// Clarification id.
        reply_id: String,
        /// Steps towards older replies; negative for newer.
        offset: i64,
    },
    /// Open the clarification request form about a submission.
    ClarifySubmission(String),
    /// Open the submission form.
    MakeSubmissionDialog,
    /// Send the submission form.
    Submit {
        /// Selected problem id, `-1` when none.
        problem_id: String,
        /// Selected language, `-1` when none.
        language: String,
        /// Key of the uploaded file.
        file_key: Option<String>,
    },
    /// Open the files of a submission.
    ShowSubmission(String),
    /// Open the compiler output of a submission.
    ShowCompilationFailure(String),
    /// Send an arbitrary message from the debug console.
    RawMessage(Message),
}

/// The client: state plus the queue that drives it.
pub struct AbacusClient {
    state: ClientState,
    queue: MessageQueue<ClientState>,
}

impl AbacusClient {
    /// Creates a client publishing through `transport`.
    pub fn new(settings: ClientSettings, transport: Box<dyn Transport>, ui: UiSink) -> Self {
        Self {
            queue: MessageQueue::new(transport, ui.clone()),
            state: ClientState::new(settings, ui),
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.state.clock = clock;
        self
    }

    /// Read access to the state.
    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Read access to the queue.
    pub fn queue(&self) -> &MessageQueue<ClientState> {
        &self.queue
    }

    /// Result of a transport handshake. Success starts a fresh session.
    pub fn handshake(&mut self, successful: bool) {
        if successful {
            log::info!("Handshake with Abacus server succeeded");
            self.connection_reset();
        } else {
            log::warn!("Handshake with Abacus server failed");
        }
    }

    /// Transport connection went up or down.
    pub fn set_connected(&mut self, connected: bool) {
        session::set_connected(&mut self.state, connected);
    }

    /// A line from the server log channel.
    pub fn on_log_line(&self, line: &str) {
        log::info!(target: SERVER_LOG_TARGET, "{}", line);
        self.state.ui.send(UiEvent::LogLine(line.to_string()));
    }

    /// Countdown tick.
    pub fn tick(&self) {
        contest_status::tick(&self.state);
    }

    /// Abandons everything queued and starts over.
    pub fn connection_reset(&mut self) {
        self.queue.reset();
        self.queue.schedule(&mut self.state, session::after_reset);
    }

    /// Routes an inbound message.
    pub fn on_message(&mut self, message: Message) {
        log::debug!("{}", message.log_text("Received"));
        if self.state.debug_visible {
            self.state.ui.send(UiEvent::LogLine(message.log_text("Received")));
        }
        let name = message.name.clone();
        let result: HandlerResult = match Inbound::decode(message) {
            Inbound::Ok(m) | Inbound::Err(m) => {
                self.queue.reply(&mut self.state, Reply::from_message(m));
                Ok(())
            }
            Inbound::ClarificationRequestPosted(m) => clarifications::request_posted(&mut self.state, &m),
            Inbound::ClarificationPosted(m) => {
                let result = clarifications::clarification_posted(&mut self.state, &m);
                self.state.ui.send(UiEvent::HighlightTab(Tab::Clarifications));
                result
            }
            Inbound::SubmissionUpdated(m) => {
                let result = submissions::submission_updated(&mut self.state, &m);
                self.state.ui.send(UiEvent::HighlightTab(Tab::Submissions));
                result
            }
            Inbound::StandingsUpdated(m) => {
                let result = standings::standings_pushed(&mut self.state, &m);
                self.state.ui.send(UiEvent::HighlightTab(Tab::Standings));
                result
            }
            Inbound::StartStop(action, _) => {
                self.queue.schedule(&mut self.state, |state, sched| {
                    contest_status::start_stop(state, sched, action)
                });
                Ok(())
            }
            Inbound::ConnectionReset => {
                self.connection_reset();
                Ok(())
            }
            Inbound::Unknown(m) => {
                log::warn!("Ignoring unknown message '{}'", m.name);
                Ok(())
            }
        };

        if let Err(e) = result {
            let text = format!(
                "Unexpected exception \"{}\" generated whilst processing message \"{}\"",
                e, name
            );
            log::error!("{}", text);
            self.state.ui.send(UiEvent::LogLine(text.clone()));
            self.state.ui.alert_titled("Unexpected exception", text);
        }
    }

    /// Applies a user action.
    pub fn apply(&mut self, command: ClientCommand) {
        log::debug!("Applying {}", command_name(&command));
        match command {
            ClientCommand::Login { user, pass } => {
                self.queue
                    .schedule(&mut self.state, |_, sched| session::login(sched, &user, &pass));
            }
            ClientCommand::Logout => self.queue.schedule(&mut self.state, |_, sched| session::logout(sched)),
            ClientCommand::SetStandingsFilter(text) => standings::set_filter(&mut self.state, &text),
            ClientCommand::RequestClarificationDialog { problem_id, question } => {
                self.queue.schedule(&mut self.state, |_, sched| {
                    clarifications::request_clarification_dialog(sched, &problem_id, &question)
                });
            }
            ClientCommand::SendClarificationRequest { problem_id, question } => {
                self.queue.schedule(&mut self.state, |state, sched| {
                    clarifications::send_clarification_request(state, sched, &problem_id, &question)
                });
            }
            ClientCommand::ShowClarificationRequest(id) => {
                clarifications::show_details(&self.state, &DetailsTarget::Request(id), 0)
            }
            ClientCommand::ShowClarification { reply_id, offset } => {
                clarifications::show_details(&self.state, &DetailsTarget::Reply(reply_id), offset)
            }
            ClientCommand::ClarifySubmission(id) => {
                self.queue.schedule(&mut self.state, |state, sched| {
                    submissions::request_clarification(state, sched, &id)
                });
            }
            ClientCommand::MakeSubmissionDialog => {
                self.queue
                    .schedule(&mut self.state, |_, sched| submissions::make_submission_dialog(sched));
            }
            ClientCommand::Submit {
                problem_id,
                language,
                file_key,
            } => {
                self.queue.schedule(&mut self.state, |state, sched| {
                    submissions::submit(state, sched, &problem_id, &language, file_key.as_deref())
                });
            }
            ClientCommand::ShowSubmission(id) => {
                self.queue
                    .schedule(&mut self.state, |_, sched| submissions::show_submission(sched, &id));
            }
            ClientCommand::ShowCompilationFailure(id) => {
                self.queue.schedule(&mut self.state, |_, sched| {
                    submissions::show_compilation_failure(sched, &id)
                });
            }
            ClientCommand::RawMessage(message) => {
                self.queue.send_message_block(&mut self.state, message, default_reply);
            }
        }
    }
}

// Keeps passwords out of the log.
fn command_name(command: &ClientCommand) -> &'static str {
    match command {
        ClientCommand::Login { .. } => "login",
        ClientCommand::Logout => "logout",
        ClientCommand::SetStandingsFilter(_) => "set_standings_filter",
        ClientCommand::RequestClarificationDialog { .. } => "request_clarification_dialog",
        ClientCommand::SendClarificationRequest { .. } => "send_clarification_request",
        ClientCommand::ShowClarificationRequest(_) => "show_clarification_request",
        ClientCommand::ShowClarification { .. } => "show_clarification",
        ClientCommand::ClarifySubmission(_) => "clarify_submission",
        ClientCommand::MakeSubmissionDialog => "make_submission_dialog",
        ClientCommand::Submit { .. } => "submit",
        ClientCommand::ShowSubmission(_) => "show_submission",
        ClientCommand::ShowCompilationFailure(_) => "show_compilation_failure",
        ClientCommand::RawMessage(_) => "raw_message",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ChannelTransport;
    use crate::ui::{Dialog, DialogKind, Table};
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        client: AbacusClient,
        sent: UnboundedReceiver<Message>,
        events: UnboundedReceiver<UiEvent>,
    }

    fn fixed_clock() -> i64 {
        1_000_000_000
    }

    fn harness(auto_user: Option<&str>) -> Harness {
        let (transport, sent) = ChannelTransport::channel();
        let (ui, events) = UiSink::channel();
        let settings = ClientSettings {
            auto_user: auto_user.map(str::to_string),
            auto_pass: auto_user.map(|_| "secret".to_string()),
            network_lag_ms: 0,
        };
        let client = AbacusClient::new(settings, Box::new(transport), ui).with_clock(fixed_clock);
        Harness { client, sent, events }
    }

    impl Harness {
        fn sent(&mut self) -> Vec<Message> {
            let mut out = Vec::new();
            while let Ok(m) = self.sent.try_recv() {
                out.push(m);
            }
            out
        }

        fn events(&mut self) -> Vec<UiEvent> {
            let mut out = Vec::new();
            while let Ok(e) = self.events.try_recv() {
                out.push(e);
            }
            out
        }

        fn reply(&mut self, msg: Message) {
            self.client.on_message(msg);
        }

        fn ok(&mut self) {
            self.reply(Message::new("ok"));
        }
    }

    fn alerts(events: &[UiEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                UiEvent::Alert { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn login_refreshes_everything_in_order() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.handshake(true);
        assert!(h.sent().is_empty());

        h.client.apply(ClientCommand::Login {
            user: "alice".into(),
            pass: "pw".into(),
        });
        assert_eq!(h.sent()[0].name, "auth");
        h.reply(Message::new("ok").with_header("user", "alice"));
        assert!(h.events().contains(&UiEvent::LoggedIn {
            username: "alice".into()
        }));

        let mut names = Vec::new();
        for _ in 0..9 {
            let sent = h.sent();
            assert_eq!(sent.len(), 1);
            names.push(sent[0].name.clone());
            let reply = match sent[0].name.as_str() {
                "whatami" => Message::new("ok").with_header("type", "judge"),
                "contesttime" => Message::new("ok")
                    .with_header("running", "no")
                    .with_header("remain", "600")
                    .with_header("blinds", "300"),
                "standings" => Message::new("ok")
                    .with_header("nrows", "1")
                    .with_header("ncols", "3")
                    .with_header("row_0_0", "Contestant")
                    .with_header("row_0_1", "Solved")
                    .with_header("row_0_2", "Time"),
                _ => Message::new("ok"),
            };
            h.reply(reply);
        }
        assert_eq!(
            names,
            vec![
                "subscribetime",
                "getproblems",
                "getlanguages",
                "contesttime",
                "getclarifications",
                "getclarificationrequests",
                "getsubmissions",
                "standings",
                "whatami"
            ]
        );
        assert!(h.client.state().has_permission(Permission::Judge));
        assert!(!h.client.queue().is_waiting());
        assert!(alerts(&h.events()).is_empty());
    }

    #[test]
    fn automatic_authentication_after_handshake() {
        let mut h = harness(Some("bob"));
        h.client.handshake(true);
        let sent = h.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "auth");
        assert_eq!(sent[0].header("user"), Some("bob"));
        assert_eq!(sent[0].header("pass"), Some("secret"));
    }

    #[test]
    fn automatic_authentication_without_credentials_sends_bare_auth() {
        let mut h = harness(None);
        h.client.handshake(true);
        let sent = h.sent();
        assert_eq!(sent[0].name, "auth");
        assert!(sent[0].headers.is_empty());

        h.reply(Message::new("err"));
        let events = h.events();
        assert!(alerts(&events).is_empty());
        assert!(events.contains(&UiEvent::LoginFailed {
            error_html: "&nbsp;".into()
        }));
    }

    #[test]
    fn reset_while_logged_in_requires_reload() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.apply(ClientCommand::Login {
            user: "alice".into(),
            pass: "pw".into(),
        });
        h.reply(Message::new("ok").with_header("user", "alice"));
        h.sent();
        h.events();

        h.client.on_message(Message::new("connectionreset"));
        let events = h.events();
        assert!(events.contains(&UiEvent::ReloadRequired));
        assert_eq!(
            alerts(&events),
            vec!["The connection with the Abacus server has been reset. \
                  This page will reload once you close this popup."
                .to_string()]
        );
        assert!(!h.client.queue().is_waiting());
        assert_eq!(h.client.queue().pending_len(), 0);
        assert!(!h.client.state().session.is_logged_in());
    }

    #[test]
    fn submission_push_renders_and_highlights() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.on_message(
            Message::new("updatesubmissions")
                .with_header("submission_id", "7")
                .with_header("time", "1000")
                .with_header("contesttime", "60")
                .with_header("prob_id", "1")
                .with_header("problem", "A")
                .with_header("comment", "Correct answer"),
        );
        let events = h.events();
        assert!(events.contains(&UiEvent::HighlightTab(Tab::Submissions)));
        assert!(events.iter().any(|e| matches!(
            e,
            UiEvent::TableUpdated { table: Table::Submissions, html } if html.contains("submission-correct")
        )));
    }

    #[test]
    fn malformed_push_alerts_unexpected_exception() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.on_message(Message::new("updatesubmissions"));
        let events = h.events();
        assert!(events.iter().any(|e| matches!(
            e,
            UiEvent::Alert { title, message }
                if title == "Unexpected exception" && message.contains("\"updatesubmissions\"")
        )));
    }

    #[test]
    fn start_push_requeries_contest_time() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client
            .on_message(Message::new("startstop").with_header("action", "start"));
        assert_eq!(alerts(&h.events()), vec!["The contest has been started".to_string()]);
        assert_eq!(h.sent()[0].name, "contesttime");

        h.reply(
            Message::new("ok")
                .with_header("running", "yes")
                .with_header("remain", "3661")
                .with_header("blinds", "0"),
        );
        assert!(h.events().contains(&UiEvent::ContestStatus {
            text: "Contest running: 01:01:01 remaining".into(),
            frozen: false,
        }));
    }

    #[test]
    fn submit_validates_selection_locally() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.apply(ClientCommand::Submit {
            problem_id: "-1".into(),
            language: "C".into(),
            file_key: None,
        });
        h.client.apply(ClientCommand::Submit {
            problem_id: "1".into(),
            language: "-1".into(),
            file_key: None,
        });
        assert!(h.sent().is_empty());
        assert_eq!(
            alerts(&h.events()),
            vec!["You must select a problem!".to_string(), "You must select a language!".to_string()]
        );

        h.client.apply(ClientCommand::Submit {
            problem_id: "1".into(),
            language: "C".into(),
            file_key: Some("k1".into()),
        });
        let sent = h.sent();
        assert_eq!(sent[0].file_key.as_deref(), Some("k1"));
        h.ok();
        assert!(h.events().contains(&UiEvent::CloseDialog(DialogKind::Submission)));
    }

    #[test]
    fn show_submission_collects_files_then_opens_dialog() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.apply(ClientCommand::ShowSubmission("7".into()));
        assert_eq!(h.sent()[0].header("request"), Some("count"));
        h.reply(Message::new("ok").with_header("count", "1"));

        let data = h.sent();
        assert_eq!(data[0].header("index"), Some("0"));
        let mut file = Message::new("ok").with_header("name", "stdout");
        file.content = Some(crate::protocol::Content::Text("42".into()));
        h.reply(file);

        assert_eq!(h.sent()[0].name, "getsubmissionsource");
        let mut source = Message::new("ok");
        source.content = Some(crate::protocol::Content::Bytes(b"int main;".to_vec()));
        h.reply(source);

        let dialog = h.events().into_iter().find_map(|e| match e {
            UiEvent::OpenDialog(Dialog::SubmissionResult { files, judge, .. }) => Some((files, judge)),
            _ => None,
        });
        let (files, judge) = dialog.unwrap();
        assert!(!judge);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["stdout", "Contestant source"]);
        assert_eq!(files[1].content, "int main;");
    }

    #[test]
    fn clarify_submission_selects_problem_by_code() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.on_message(
            Message::new("updatesubmissions")
                .with_header("submission_id", "7")
                .with_header("time", "1000")
                .with_header("contesttime", "60")
                .with_header("prob_id", "1")
                .with_header("problem", "B")
                .with_header("comment", "Wrong answer"),
        );
        h.events();

        h.client.apply(ClientCommand::ClarifySubmission("7".into()));
        assert_eq!(h.sent()[0].name, "getproblems");
        h.reply(
            Message::new("ok")
                .with_header("id0", "4")
                .with_header("name0", "Apples")
                .with_header("code0", "A")
                .with_header("id1", "5")
                .with_header("name1", "Bananas")
                .with_header("code1", "B"),
        );
        let opened = h.events().into_iter().find_map(|e| match e {
            UiEvent::OpenDialog(Dialog::ClarificationRequest { problem_id, question, .. }) => {
                Some((problem_id, question))
            }
            _ => None,
        });
        assert_eq!(opened, Some(("5".to_string(), "[Submission 7] ".to_string())));
    }

    #[test]
    fn unknown_preselected_problem_opens_form_unselected() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client.apply(ClientCommand::RequestClarificationDialog {
            problem_id: "9".into(),
            question: "Why?".into(),
        });
        h.sent();
        h.reply(Message::new("ok").with_header("id0", "4").with_header("code0", "A"));
        assert!(h.events().iter().any(|e| matches!(
            e,
            UiEvent::OpenDialog(Dialog::ClarificationRequest { problem_id, .. })
                if problem_id == clarifications::NO_PROBLEM
        )));

        h.client.apply(ClientCommand::ClarifySubmission("404".into()));
        assert!(h.sent().is_empty());
    }

    #[test]
    fn debug_filter_toggles_panel() {
        let mut h = harness(Some(session::NO_LOGIN));
        h.client
            .apply(ClientCommand::SetStandingsFilter("debug show".into()));
        assert!(h.client.state().debug_visible);
        assert!(h.events().contains(&UiEvent::DebugPanel(true)));
    }
}
