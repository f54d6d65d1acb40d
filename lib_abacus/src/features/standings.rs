//! Standings received over the message channel.
//!
//! The `standings` reply and the `updatestandings` push carry the same grid;
//! both feed the [`StandingsBoard`](crate::standings::StandingsBoard) owned by
//! the client state.

use super::{alert_error, ClientScheduler};
use crate::client::ClientState;
use crate::protocol::{Grid, Message, Reply};
use crate::queue::HandlerResult;
use crate::standings::{debug_command, Snapshot};
use crate::ui::UiEvent;

/// Requests the full standings.
pub fn get_standings(sched: &mut ClientScheduler<'_>) {
    sched.send_message_block(Message::new("standings"), standings_reply);
}

fn standings_reply(state: &mut ClientState, reply: &Reply, _: &mut ClientScheduler<'_>) -> HandlerResult {
    if alert_error(state, reply, "Error updating standings") {
        return Ok(());
    }
    show_grid(state, &reply.message)
}

/// Handles an `updatestandings` push.
pub fn standings_pushed(state: &mut ClientState, message: &Message) -> HandlerResult {
    show_grid(state, message)
}

fn show_grid(state: &mut ClientState, message: &Message) -> HandlerResult {
    let grid = Grid::decode(&message.headers)?;
    let snapshot = Snapshot::from_grid(&grid)?;
    log::debug!("Standings with {} row(s)", snapshot.rows.len());
    let view = state.standings.update_standings(Some(snapshot));
    state.ui.send(UiEvent::StandingsRendered(view));
    Ok(())
}

/// Applies new filter text.
///
/// `debug show` and `debug hide` also toggle the debug panel; the text is
/// still applied as a filter like any other.
pub fn set_filter(state: &mut ClientState, text: &str) {
    if let Some(visible) = debug_command(text) {
        state.debug_visible = visible;
        state.ui.send(UiEvent::DebugPanel(visible));
    }
    let view = state.standings.set_filter(text);
    state.ui.send(UiEvent::StandingsRendered(view));
}
