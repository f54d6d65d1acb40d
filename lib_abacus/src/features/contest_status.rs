//! # Contest Status
//!
//! The server reports the remaining time once (`contesttime`) and announces
//! starts and stops (`startstop`). Between those the client counts down on
//! its own from a projected stop time.

use super::session::Permission;
use super::{null_reply, ClientScheduler};
use crate::client::ClientState;
use crate::protocol::{Message, Reply, StartStop};
use crate::queue::HandlerResult;
use crate::ui::UiEvent;
use crate::utils::time_to_string;

/// Clock state of the contest.
#[derive(Debug, Clone, Default)]
pub struct ContestStatus {
    /// Unix time at which the running contest ends; `None` when stopped.
    projected_stop: Option<i64>,
    /// `remain` from the last `contesttime` reply.
    last_remain: i64,
    /// Seconds before the end at which the standings freeze.
    blinds: i64,
}

impl ContestStatus {
    /// Whether the contest is counting down.
    pub fn is_running(&self) -> bool {
        self.projected_stop.is_some()
    }

    /// Seconds remaining at `now`, clamped at zero.
    pub fn remaining(&self, now: i64) -> i64 {
        match self.projected_stop {
            Some(stop) => (stop - now).max(0),
            None => self.last_remain,
        }
    }

    /// Status line at `now`.
    pub fn text(&self, now: i64) -> String {
        if self.is_running() {
            format!("Contest running: {} remaining", time_to_string(self.remaining(now)))
        } else {
            "Contest stopped".to_string()
        }
    }

    /// Whether the standings are frozen at `now` for a user who may or may
    /// not see the final standings.
    pub fn frozen(&self, now: i64, see_final: bool) -> bool {
        !(see_final || self.remaining(now) >= self.blinds)
    }
}

/// Subscribes to `startstop` pushes.
pub fn register_start_stop(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("subscribetime"), null_reply);
}

/// Queries the remaining time.
pub fn get_contest_status(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("contesttime"), contest_time_reply);
}

fn contest_time_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if super::alert_error(state, reply, "Error updating status") {
        return Ok(());
    }
    let remain: i64 = reply.message.number("remain")?;
    let blinds: i64 = reply.message.number("blinds")?;
    let running = reply.header("running") == Some("yes");

    state.contest.last_remain = remain;
    state.contest.blinds = blinds;
    state.contest.projected_stop = if running {
        let lag_ms = state.settings.network_lag_ms;
        state
            .ui
            .send(UiEvent::LogLine(format!("Lag from server is currently {}ms", lag_ms)));
        // Count from when the server sent the reply, not when it arrived.
        let sent_at = (state.now_ms() - lag_ms).div_euclid(1000);
        Some(sent_at + remain)
    } else {
        None
    };
    update_status(state);
    Ok(())
}

/// Handles a `startstop` push. An unrecognised action counts as a stop.
pub fn start_stop(state: &mut ClientState, sched: &mut ClientScheduler<'_>, action: Option<StartStop>) {
    match action {
        Some(StartStop::Start) => {
            log::info!("Contest started");
            state.ui.alert("The contest has been started");
        }
        _ => {
            log::info!("Contest stopped");
            state.contest.projected_stop = None;
            state.ui.alert("The contest has been stopped");
        }
    }
    update_status(state);
    get_contest_status(sched);
}

/// Emits the status line and freeze flag for the current time.
pub fn update_status(state: &ClientState) {
    let now = state.now();
    let see_final = state.session.has_permission(Permission::SeeFinalStandings);
    state.ui.send(UiEvent::ContestStatus {
        text: state.contest.text(now),
        frozen: state.contest.frozen(now, see_final),
    });
}

/// Countdown tick. Only a running contest changes from second to second.
pub fn tick(state: &ClientState) {
    if state.contest.is_running() {
        update_status(state);
    }
}
