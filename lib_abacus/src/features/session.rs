//! # Session
//!
//! Connection flag, the logged-in user and what that user may do.
//!
//! A successful handshake and a `connectionreset` push both lead to
//! [`after_reset`]: whoever was logged in loses the session and is told to
//! reload, otherwise the client tries to authenticate on its own.

use std::collections::HashSet;

use serde::Serialize;

use super::{clarifications, contest_status, problems, standings, submissions, ClientScheduler};
use crate::client::ClientState;
use crate::protocol::{Message, Reply};
use crate::queue::HandlerResult;
use crate::ui::UiEvent;
use crate::utils::escape_html;

/// Configured user name that disables automatic authentication.
pub const NO_LOGIN: &str = "nologin";

/// Something a user may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Authenticated at all.
    Auth,
    /// Submit solutions.
    Submit,
    /// Ask for clarifications.
    ClarificationRequest,
    /// Answer clarification requests.
    ClarificationReply,
    /// Change own password.
    ChangePassword,
    /// Listed in the standings.
    InStandings,
    /// See any standings.
    SeeStandings,
    /// See non-contestants in the standings.
    SeeAllStandings,
    /// See standings past the blinds.
    SeeFinalStandings,
    /// See every user's clarification requests.
    SeeAllClarificationRequests,
    /// See every clarification.
    SeeAllClarifications,
    /// See every user's submissions.
    SeeAllSubmissions,
    /// Submit to any problem.
    SeeAllProblems,
    /// See problem internals such as expected output.
    SeeProblemDetails,
    /// See submission internals.
    SeeSubmissionDetails,
    /// See which user made a request or submission.
    SeeUserId,
    /// Mark assigned work.
    Mark,
    /// Decide deferred judgements.
    Judge,
    /// Override any mark.
    JudgeOverride,
    /// Award bonuses.
    SetBonus,
    /// Manage users.
    UserAdmin,
    /// Manage servers.
    ServerAdmin,
    /// Manage problems.
    ProblemAdmin,
    /// Start and stop the contest.
    StartStop,
}

const CONTESTANT: &[Permission] = &[
    Permission::Auth,
    Permission::Submit,
    Permission::ClarificationRequest,
    Permission::ChangePassword,
    Permission::InStandings,
    Permission::SeeStandings,
];

const JUDGE: &[Permission] = &[
    Permission::Auth,
    Permission::ClarificationRequest,
    Permission::ClarificationReply,
    Permission::ChangePassword,
    Permission::SeeStandings,
    Permission::SeeAllStandings,
    Permission::SeeFinalStandings,
    Permission::SeeAllClarificationRequests,
    Permission::SeeAllClarifications,
    Permission::SeeAllSubmissions,
    Permission::SeeAllProblems,
    Permission::SeeProblemDetails,
    Permission::SeeSubmissionDetails,
    Permission::Judge,
    Permission::SetBonus,
];

const ADMIN_EXTRA: &[Permission] = &[
    Permission::SeeUserId,
    Permission::Mark,
    Permission::JudgeOverride,
    Permission::UserAdmin,
    Permission::ServerAdmin,
    Permission::ProblemAdmin,
    Permission::StartStop,
];

/// Permissions granted to a `whatami` user type.
///
/// Unknown types get the same set as `none`.
pub fn permissions_for(user_type: &str) -> HashSet<Permission> {
    let mut set = HashSet::new();
    match user_type {
        "contestant" => set.extend(CONTESTANT.iter().copied()),
        "judge" => set.extend(JUDGE.iter().copied()),
        "admin" => {
            set.extend(JUDGE.iter().copied());
            set.extend(ADMIN_EXTRA.iter().copied());
        }
        _ => {
            set.insert(Permission::SeeStandings);
        }
    }
    set
}

/// Connection and login state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    connected: bool,
    username: String,
    permissions: HashSet<Permission>,
}

impl Session {
    /// Whether the transport is up.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The logged-in user, empty when nobody is.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// True when a user is logged in.
    pub fn is_logged_in(&self) -> bool {
        !self.username.is_empty()
    }

    /// Checks one permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    fn clear(&mut self) {
        self.username.clear();
        self.permissions.clear();
    }
}

/// Updates the connection flag, telling the UI only about changes.
pub fn set_connected(state: &mut ClientState, connected: bool) {
    if state.session.connected != connected {
        state.session.connected = connected;
        log::info!("Connection to Abacus server {}", if connected { "up" } else { "down" });
        state.ui.send(UiEvent::Connected(connected));
    }
}

/// Sends `auth` with the given credentials.
pub fn login(sched: &mut ClientScheduler<'_>, user: &str, pass: &str) {
    let msg = Message::new("auth")
        .with_header("user", user)
        .with_header("pass", pass);
    sched.send_message_block(msg, login_reply);
}

fn login_reply(state: &mut ClientState, reply: &Reply, sched: &mut ClientScheduler<'_>) -> HandlerResult {
    if let Some(error) = reply.error() {
        let error_html = if error.is_empty() {
            "&nbsp;".to_string()
        } else {
            escape_html(error)
        };
        state.ui.send(UiEvent::LoginFailed { error_html });
        return Ok(());
    }

    let user = reply.message.require("user")?;
    state.session.username = user.to_string();
    log::info!("Logged in as '{}'", user);
    state.ui.send(UiEvent::LoggedIn {
        username: user.to_string(),
    });

    // Everything the client shows depends on the user, so refresh it all.
    contest_status::register_start_stop(sched);
    problems::get_problems(sched);
    problems::get_languages(sched);
    contest_status::get_contest_status(sched);
    clarifications::get_clarifications(sched);
    clarifications::get_clarification_requests(sched);
    submissions::get_submissions(sched);
    standings::get_standings(sched);
    whatami(sched);
    Ok(())
}

/// Sends `logout`.
pub fn logout(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("logout"), logout_reply);
}

fn logout_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    match reply.error() {
        None => state.ui.send(UiEvent::ReloadRequired),
        Some(msg) => state.ui.alert(format!("Failed to logout: {}", msg)),
    }
    Ok(())
}

/// Asks the server what kind of user this is.
pub fn whatami(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("whatami"), whatami_reply);
}

fn whatami_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if super::alert_error(state, reply, "Error fetching user type") {
        return Ok(());
    }
    let user_type = reply.message.require("type")?;
    state.session.permissions = permissions_for(user_type);
    log::debug!("User type '{}' grants {} permission(s)", user_type, state.session.permissions.len());
    // The freeze indicator depends on the permissions.
    contest_status::update_status(state);
    Ok(())
}

/// Authenticates with configured credentials, or with none so the server
/// falls back to the credentials cached in its session.
pub fn attempt_automatic_authentication(state: &ClientState, sched: &mut ClientScheduler<'_>) {
    let settings = &state.settings;
    if settings.auto_user.as_deref() == Some(NO_LOGIN) {
        log::info!("Automatic authentication disabled");
        return;
    }
    let mut msg = Message::new("auth");
    if let (Some(user), Some(pass)) = (&settings.auto_user, &settings.auto_pass) {
        if !user.is_empty() && !pass.is_empty() {
            msg = msg.with_header("user", user).with_header("pass", pass);
        }
    }
    sched.send_message_block(msg, login_reply);
}

/// Continues a connection reset once the queue has been emptied.
pub fn after_reset(state: &mut ClientState, sched: &mut ClientScheduler<'_>) {
    if state.session.is_logged_in() {
        log::warn!("Connection reset while logged in as '{}'", state.session.username);
        state.session.clear();
        state.ui.alert_titled(
            "Connection reset",
            "The connection with the Abacus server has been reset. \
             This page will reload once you close this popup.",
        );
        state.ui.send(UiEvent::ReloadRequired);
    } else {
        state.session.permissions.clear();
        attempt_automatic_authentication(state, sched);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_sets_by_user_type() {
        let contestant = permissions_for("contestant");
        assert!(contestant.contains(&Permission::Submit));
        assert!(!contestant.contains(&Permission::SeeFinalStandings));

        let judge = permissions_for("judge");
        assert!(judge.contains(&Permission::Judge));
        assert!(judge.contains(&Permission::SeeProblemDetails));
        assert!(!judge.contains(&Permission::StartStop));

        let admin = permissions_for("admin");
        assert!(admin.is_superset(&judge));
        assert!(admin.contains(&Permission::StartStop));

        assert_eq!(permissions_for("none").len(), 1);
        assert_eq!(permissions_for("martian"), permissions_for("none"));
    }
}
