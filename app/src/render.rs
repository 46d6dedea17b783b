//! Terminal rendering of conversation snapshots.

use chrono::Local;
use colored::{ColoredString, Colorize};
use std::borrow::Cow;
use teller_conversation::{ErrorNotice, QUICK_ACTIONS};
use teller_core::{
    AgentColor, AgentTag, DeliveryState, LONG_MESSAGE_CHARS, Message, Origin, Span, SpanKind,
    StructuredText, describe, format, is_long, preview,
};

pub const TYPING_INDICATOR: &str = "TBC Assistant is typing...";

fn paint(text: &str, color: AgentColor) -> ColoredString {
    let (r, g, b) = color.rgb();
    text.truecolor(r, g, b)
}

fn is_unsafe(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\t'
}

/// Replace control characters other than `\n` and `\t` with U+FFFD, so text
/// from the backend cannot carry escape sequences to the terminal.
pub fn terminal_safe(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_unsafe) {
        return Cow::Borrowed(text);
    }
    text.chars()
        .map(|c| if is_unsafe(c) { char::REPLACEMENT_CHARACTER } else { c })
        .collect()
}

fn span(span: &Span) -> ColoredString {
    let mut text = ColoredString::from(terminal_safe(&span.text).as_ref());
    for kind in span.marks.kinds() {
        text = match kind {
            SpanKind::Plain => text,
            SpanKind::Strong => text.bold(),
            SpanKind::Emphasis => text.italic(),
            SpanKind::Code => text.bright_cyan(),
            SpanKind::Currency => {
                let (r, g, b) = AgentColor::Success.rgb();
                text.truecolor(r, g, b).bold()
            }
        };
    }
    text
}

/// ANSI rendering of formatted text.
pub fn styled(text: &StructuredText) -> String {
    text.spans().iter().map(|s| span(s).to_string()).collect()
}

fn header(msg: &Message) -> String {
    let number = msg.id().to_string();
    let time = msg.created_at().with_timezone(&Local).format("%H:%M");
    match msg.origin() {
        Origin::User => {
            let status = match msg.delivery() {
                DeliveryState::Sending => "sending".dimmed(),
                DeliveryState::Delivered => "✓".green(),
                DeliveryState::Failed => {
                    format!("failed, /retry {} to resend", msg.id().get()).red()
                }
            };
            format!(
                "{} {} {} {status}",
                number.dimmed(),
                "You".green().bold(),
                time.to_string().dimmed()
            )
        }
        Origin::Agent | Origin::System => {
            let agent = describe(msg.agent().copied().unwrap_or(AgentTag::Unknown));
            format!(
                "{} {} {} {}",
                number.dimmed(),
                agent.icon.glyph(),
                paint(agent.display_name, agent.color).bold(),
                time.to_string().dimmed()
            )
        }
    }
}

/// Header line plus body. Long bodies are collapsed to a preview.
pub fn message(msg: &Message, show_feedback: bool) -> String {
    let mut out = header(msg);
    out.push('\n');

    let text = msg.text();
    if is_long(text) {
        out.push_str(&styled(&format(&preview(text, LONG_MESSAGE_CHARS))));
        out.push('\n');
        out.push_str(
            &format!("(/show {} for the full message)", msg.id().get())
                .dimmed()
                .to_string(),
        );
    } else {
        out.push_str(&styled(&format(text)));
    }

    if show_feedback && !msg.is_user() {
        let n = msg.id().get();
        out.push('\n');
        out.push_str(&format!("/good {n}  /bad {n}  /copy {n}").dimmed().to_string());
    }
    out
}

pub fn typing() -> String {
    format!("🤖 {}", TYPING_INDICATOR.italic().dimmed())
}

pub fn error(notice: &ErrorNotice) -> String {
    let mut line = format!("⚠ {}", notice.message).red().to_string();
    if notice.retryable {
        line.push_str(&"  (/retry to resend, /dismiss to hide)".dimmed().to_string());
    }
    line
}

pub fn quick_actions() -> String {
    QUICK_ACTIONS
        .iter()
        .enumerate()
        .map(|(i, action)| format!("  /quick {}  {} {}", i + 1, action.emoji, action.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn suggestions(suggestions: &[String]) -> Option<String> {
    if suggestions.is_empty() {
        return None;
    }
    let list = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  /suggest {}  {}", i + 1, terminal_safe(s)))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("{}\n{list}", "Suggestions:".bright_black()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teller_core::MessageId;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_styled_without_colors_is_visible_text() {
        plain();
        let text = format("Limit **₾5,000.00** for `CARD-1`");
        assert_eq!(styled(&text), "Limit ₾5,000.00 for CARD-1");
    }

    #[test]
    fn test_agent_header_uses_directory_name() {
        plain();
        let msg = Message::reply(MessageId::new(3), "Done", AgentTag::CardOperations);
        let out = message(&msg, false);
        assert!(out.starts_with("#3 💳 Card Operations"), "{out}");
        assert!(out.ends_with("Done"));
    }

    #[test]
    fn test_unknown_agent_renders_as_assistant() {
        plain();
        let msg = Message::reply(MessageId::new(1), "Hi", AgentTag::Unknown);
        assert!(message(&msg, false).contains("🤖 TBC Assistant"));
    }

    #[test]
    fn test_failed_user_message_offers_retry() {
        plain();
        let mut msg = Message::outgoing(MessageId::new(2), "Block my card");
        msg.settle(DeliveryState::Failed);
        let out = message(&msg, true);
        assert!(out.contains("You"));
        assert!(out.contains("/retry 2"));
        assert!(!out.contains("/good"));
    }

    #[test]
    fn test_long_messages_are_collapsed() {
        plain();
        let text = "word ".repeat(60);
        let msg = Message::reply(MessageId::new(7), text.clone(), AgentTag::Support);
        let out = message(&msg, true);
        assert!(out.contains("..."));
        assert!(out.contains("/show 7"));
        assert!(out.contains("/good 7"));
        assert!(!out.contains(text.trim_end()));
    }

    #[test]
    fn test_quick_actions_are_numbered_from_one() {
        plain();
        let out = quick_actions();
        assert!(out.contains("/quick 1  🔒 Block my card"));
        assert!(out.contains("/quick 4  📞 Contact information"));
    }

    #[test]
    fn test_no_suggestions_renders_nothing() {
        assert!(suggestions(&[]).is_none());
        plain();
        let out = suggestions(&["Unblock my card".to_string()]).unwrap();
        assert!(out.contains("/suggest 1  Unblock my card"));
    }

    #[test]
    fn test_control_sequences_never_reach_the_terminal() {
        plain();
        let out = styled(&format("hi \x1b[2J\x1b]0;pwned\x07 **ok**"));
        assert!(!out.contains('\u{1b}'), "{out:?}");
        assert!(!out.contains('\u{7}'), "{out:?}");
        assert_eq!(out, "hi \u{fffd}[2J\u{fffd}]0;pwned\u{fffd} ok");
    }

    #[test]
    fn test_terminal_safe_keeps_layout_characters() {
        assert_eq!(terminal_safe("a\tb\nc"), "a\tb\nc");
        assert_eq!(terminal_safe("bell\u{7}\u{9b}31m"), "bell\u{fffd}\u{fffd}31m");
        let reply = Message::reply(MessageId::new(4), "\x1b[31mred", AgentTag::Support);
        plain();
        assert!(!message(&reply, false).contains('\u{1b}'));
    }
}
