//! # Inbound Message Kinds
//!
//! Every message arriving on `/service/abacus` is classified once, here, into
//! an [`Inbound`] variant. Replies (`ok`/`err`) go to the message queue; every
//! other variant is an unsolicited push routed to its feature module.

use super::message::Message;

/// Direction of a `startstop` push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStop {
    /// The contest was started.
    Start,
    /// The contest was stopped.
    Stop,
}

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Successful reply to the in-flight request.
    Ok(Message),
    /// Failed reply to the in-flight request.
    Err(Message),
    /// A clarification request was posted.
    ClarificationRequestPosted(Message),
    /// A clarification was posted.
    ClarificationPosted(Message),
    /// A submission was added or re-judged.
    SubmissionUpdated(Message),
    /// New standings grid.
    StandingsUpdated(Message),
    /// The contest was started or stopped. An unrecognised action header
    /// is carried as `None`.
    StartStop(Option<StartStop>, Message),
    /// The server lost this client's session.
    ConnectionReset,
    /// Anything else. Ignored by the client.
    Unknown(Message),
}

impl Inbound {
    /// Classifies a raw message by name.
    pub fn decode(message: Message) -> Self {
        match message.name.as_str() {
            "ok" => Inbound::Ok(message),
            "err" => Inbound::Err(message),
            "updateclarificationrequests" => Inbound::ClarificationRequestPosted(message),
            "updateclarifications" => Inbound::ClarificationPosted(message),
            "updatesubmissions" => Inbound::SubmissionUpdated(message),
            "updatestandings" => Inbound::StandingsUpdated(message),
            "startstop" => {
                let action = match message.header("action") {
                    Some("start") => Some(StartStop::Start),
                    Some("stop") => Some(StartStop::Stop),
                    _ => None,
                };
                Inbound::StartStop(action, message)
            }
            "connectionreset" => Inbound::ConnectionReset,
            _ => Inbound::Unknown(message),
        }
    }

    /// True for `ok`/`err`.
    pub fn is_reply(&self) -> bool {
        matches!(self, Inbound::Ok(_) | Inbound::Err(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_name() {
        assert!(Inbound::decode(Message::new("ok")).is_reply());
        assert!(Inbound::decode(Message::new("err")).is_reply());
        assert!(matches!(
            Inbound::decode(Message::new("updatestandings")),
            Inbound::StandingsUpdated(_)
        ));
        assert_eq!(
            Inbound::decode(Message::new("connectionreset")),
            Inbound::ConnectionReset
        );
        assert!(matches!(
            Inbound::decode(Message::new("mystery")),
            Inbound::Unknown(_)
        ));
    }

    #[test]
    fn start_stop_action() {
        let start = Message::new("startstop").with_header("action", "start");
        assert!(matches!(
            Inbound::decode(start),
            Inbound::StartStop(Some(StartStop::Start), _)
        ));
        let odd = Message::new("startstop").with_header("action", "pause");
        assert!(matches!(Inbound::decode(odd), Inbound::StartStop(None, _)));
    }
}
