//! Console front-end: turns typed lines into [`ClientCommand`]s and
//! [`UiEvent`]s into coloured terminal lines.

use colored::*;

use lib_abacus::features::clarifications::NO_PROBLEM;
use lib_abacus::ui::{Dialog, Table};
use lib_abacus::{ClientCommand, Message, UiEvent};

pub const HELP: &str = "\
Commands:
  login <user> <pass>                 log in
  logout                              log out
  filter [text]                       standings filter ('debug show' / 'debug hide' toggle the log)
  ask-dialog [problem_id]             open the clarification form
  ask <problem_id> <question...>      request a clarification ('\\n' for a line break)
  clar <request_id>                   show a clarification request
  reply <clarification_id> [offset]   show a clarification, paging by offset
  clarify <submission_id>             ask about a submission
  submit-dialog                       open the submission form
  submit <problem_id> <lang> [key]    submit an uploaded file
  show <submission_id>                show the files of a submission
  compile <submission_id>             show compiler output
  raw <name> [key=value...]           send a raw message
  help                                this text
  quit                                exit";

/// Parses one console line.
///
/// `Ok(None)` means the line needs no client command (blank, `help`).
pub fn parse_command(line: &str) -> Result<Option<ClientCommand>, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();
    let arg = |i: usize, what: &str| -> Result<String, String> {
        args.get(i)
            .map(|s| s.to_string())
            .ok_or_else(|| format!("missing {}", what))
    };

    let command = match verb {
        "" | "help" => return Ok(None),
        "login" => ClientCommand::Login {
            user: arg(0, "user")?,
            pass: arg(1, "password")?,
        },
        "logout" => ClientCommand::Logout,
        "filter" => ClientCommand::SetStandingsFilter(rest.to_string()),
        "ask-dialog" => ClientCommand::RequestClarificationDialog {
            problem_id: args.first().map(|s| s.to_string()).unwrap_or_else(|| NO_PROBLEM.to_string()),
            question: String::new(),
        },
        "ask" => {
            let problem_id = arg(0, "problem id")?;
            let question = rest[problem_id.len()..].trim().replace("\\n", "\n");
            if question.is_empty() {
                return Err("missing question".to_string());
            }
            ClientCommand::SendClarificationRequest { problem_id, question }
        }
        "clar" => ClientCommand::ShowClarificationRequest(arg(0, "request id")?),
        "reply" => ClientCommand::ShowClarification {
            reply_id: arg(0, "clarification id")?,
            offset: match args.get(1) {
                Some(s) => s.parse().map_err(|_| format!("bad offset '{}'", s))?,
                None => 0,
            },
        },
        "clarify" => ClientCommand::ClarifySubmission(arg(0, "submission id")?),
        "submit-dialog" => ClientCommand::MakeSubmissionDialog,
        "submit" => ClientCommand::Submit {
            problem_id: arg(0, "problem id")?,
            language: arg(1, "language")?,
            file_key: args.get(2).map(|s| s.to_string()),
        },
        "show" => ClientCommand::ShowSubmission(arg(0, "submission id")?),
        "compile" => ClientCommand::ShowCompilationFailure(arg(0, "submission id")?),
        "raw" => {
            let mut message = Message::new(arg(0, "message name")?);
            for pair in args.iter().skip(1) {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
                message = message.with_header(key, value);
            }
            ClientCommand::RawMessage(message)
        }
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(command))
}

fn table_name(table: Table) -> &'static str {
    match table {
        Table::ClarificationRequests => "clarification requests",
        Table::Clarifications => "clarifications",
        Table::Submissions => "submissions",
    }
}

/// Drops markup from a rendered fragment for terminal display.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&minus;", "-")
        .replace("&amp;", "&")
}

fn rows(html: &str) -> Vec<String> {
    html.split("</tr>")
        .map(strip_tags)
        .filter(|r| !r.is_empty())
        .collect()
}

fn dialog_lines(dialog: &Dialog) -> String {
    match dialog {
        Dialog::ClarificationRequest { problems, problem_id, question } => {
            let list = problems
                .iter()
                .map(|p| format!("{}={}", p.id, p.code))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "Clarification request (problem {}, question '{}'). Problems: {}\nUse: ask <problem_id> <question>",
                problem_id, question, list
            )
        }
        Dialog::ClarificationDetails(d) => {
            let mut text = format!("Clarification request {} [{}]\nQ: {}", d.request_id, d.problem, d.question);
            match &d.answer {
                Some(answer) => text.push_str(&format!("\nA: {}", answer)),
                None => text.push_str("\n(unanswered)"),
            }
            if d.has_previous || d.has_next {
                text.push_str(&format!(
                    "\n(older reply: {}, newer reply: {})",
                    d.has_previous, d.has_next
                ));
            }
            text
        }
        Dialog::Submission { problems, languages, username } => format!(
            "Submission for {}. Problems: {}. Languages: {}\nUse: submit <problem_id> <lang> <file_key>",
            username,
            problems.iter().map(|p| format!("{}={}", p.id, p.code)).collect::<Vec<_>>().join(", "),
            languages.join(", ")
        ),
        Dialog::CompilationFailure { content } => format!("Compilation failed:\n{}", strip_tags(content)),
        Dialog::SubmissionResult { submission_id, files, judge } => {
            let mut text = format!(
                "Submission {} ({} view)",
                submission_id,
                if *judge { "judge" } else { "contestant" }
            );
            for file in files {
                text.push_str(&format!("\n--- {} ---\n{}", file.name, file.content));
            }
            text
        }
    }
}

/// Formats an event for the terminal. Events with nothing to show give
/// `None`.
pub fn render_event(event: &UiEvent) -> Option<String> {
    let line = match event {
        UiEvent::Alert { title, message } => {
            format!("{} {}", format!("[{}]", title).bright_yellow(), message.bright_white())
        }
        UiEvent::Waiting { remaining } => format!("{}", format!("... {} pending", remaining).truecolor(128, 128, 128)),
        UiEvent::Idle => return None,
        UiEvent::Connected(true) => "Connected".bright_green().to_string(),
        UiEvent::Connected(false) => "Disconnected".bright_red().to_string(),
        UiEvent::LoggedIn { username } => format!("Logged in as {}", username.bright_cyan()),
        UiEvent::LoginFailed { error_html } => format!("{} {}", "Login failed:".bright_red(), strip_tags(error_html)),
        UiEvent::ReloadRequired => "Session lost; restart the client to continue.".bright_red().to_string(),
        UiEvent::HighlightTab(tab) => format!("{}", format!("* new data in {:?}", tab).bright_cyan()),
        UiEvent::ContestStatus { text, frozen } => {
            if *frozen {
                format!("{} {}", text, "(standings frozen)".bright_blue())
            } else {
                text.clone()
            }
        }
        UiEvent::TableUpdated { table, html } => {
            let rows = rows(html);
            let mut text = format!("{} ({})", table_name(*table).bright_white(), rows.len());
            for row in rows {
                text.push_str(&format!("\n  {}", row));
            }
            text
        }
        UiEvent::StandingsRendered(view) => {
            let mut text = "standings".bright_white().to_string();
            if view.filter_invalid {
                text.push_str(&format!(" {}", "(invalid filter)".bright_red()));
            }
            for row in rows(&view.body_html) {
                text.push_str(&format!("\n  {}", row));
            }
            if !view.highlighted.is_empty() {
                text.push_str(&format!("\n  changed: {}", view.highlighted.join(", ").bright_green()));
            }
            if !view.matched.is_empty() {
                text.push_str(&format!("\n  matched: {}", view.matched.join(", ").bright_cyan()));
            }
            text
        }
        UiEvent::ProblemsChanged(_) | UiEvent::LanguagesChanged(_) => return None,
        UiEvent::OpenDialog(dialog) => dialog_lines(dialog),
        UiEvent::CloseDialog(kind) => format!("{:?} done", kind).bright_green().to_string(),
        UiEvent::DebugPanel(visible) => format!("Message log {}", if *visible { "shown" } else { "hidden" }),
        UiEvent::LogLine(line) => format!("{}", line.truecolor(128, 128, 128)),
        UiEvent::ResourcesUpdated(body) => format!("{}\n{}", "Resources".bright_white(), strip_tags(body)),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  "), Ok(None));
        assert_eq!(
            parse_command("login alice pw"),
            Ok(Some(ClientCommand::Login {
                user: "alice".into(),
                pass: "pw".into()
            }))
        );
        assert_eq!(
            parse_command("ask 3 why is\\nthis wrong"),
            Ok(Some(ClientCommand::SendClarificationRequest {
                problem_id: "3".into(),
                question: "why is\nthis wrong".into()
            }))
        );
        assert_eq!(
            parse_command("reply 11 -1"),
            Ok(Some(ClientCommand::ShowClarification {
                reply_id: "11".into(),
                offset: -1
            }))
        );
        assert_eq!(
            parse_command("filter debug show"),
            Ok(Some(ClientCommand::SetStandingsFilter("debug show".into())))
        );
        assert_eq!(
            parse_command("clarify 7"),
            Ok(Some(ClientCommand::ClarifySubmission("7".into())))
        );
        assert_eq!(
            parse_command("ask-dialog"),
            Ok(Some(ClientCommand::RequestClarificationDialog {
                problem_id: NO_PROBLEM.into(),
                question: String::new()
            }))
        );
        assert!(parse_command("login alice").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn raw_message_headers() {
        let Ok(Some(ClientCommand::RawMessage(m))) = parse_command("raw fetchfile request=count submission_id=7") else {
            panic!("expected a raw message");
        };
        assert_eq!(m.name, "fetchfile");
        assert_eq!(m.header("submission_id"), Some("7"));
        assert!(parse_command("raw x novalue").is_err());
    }

    #[test]
    fn strips_markup() {
        assert_eq!(strip_tags("<tr><td>1</td><td>a &lt;b&gt;</td></tr>"), "1 a <b>");
    }
}
