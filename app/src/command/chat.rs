//! Interactive chat with the banking assistant.

use anyhow::bail;
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use teller_conversation::{
    ControllerConfig, Feedback, OutboundRequest, SEND_FAILED_NOTICE, SessionController,
    Submission, quick_action,
};
use teller_core::{MessageId, Transport, format};
use teller_transport::HttpTransport;
use tracing::info;

use super::init_common_components;
use crate::render;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Customer id override
    pub customer: Option<String>,
    /// Start without the greeting message
    pub no_greeting: bool,
    /// Backend base URL override
    pub api_url: Option<String>,
}

/// Strategy for executing the Chat command.
///
/// With `--message` a single turn is sent and the reply printed; otherwise
/// an interactive session runs until `exit`.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components(input.api_url)?;
        let customer_id = input.customer.unwrap_or(common.config.customer.id);
        let greeting = if input.no_greeting || input.message.is_some() {
            None
        } else {
            common.config.chat.greeting
        };
        let controller = SessionController::new(
            Arc::clone(&common.transport),
            ControllerConfig::new(customer_id).with_greeting(greeting),
        );

        if let Some(msg) = input.message {
            return single_turn(controller, &msg).await;
        }

        let mut repl = Repl {
            controller,
            transport: common.transport,
            show_feedback: common.config.chat.show_feedback,
            shown: 0,
        };
        repl.run().await
    }
}

async fn single_turn(
    mut controller: SessionController<Arc<HttpTransport>>,
    text: &str,
) -> anyhow::Result<()> {
    match controller.submit_message(text).await {
        Submission::Delivered { reply, .. } => {
            if let Some(msg) = controller.messages().iter().find(|m| m.id() == reply) {
                println!("{}", render::styled(&format(msg.text())));
            }
            if let Some(session) = controller.session_id() {
                info!("Session: {session}");
            }
            Ok(())
        }
        Submission::Failed { .. } => bail!(SEND_FAILED_NOTICE),
        Submission::Rejected => bail!("Message is empty"),
    }
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Exit,
    Help,
    /// Send this text, or the input buffer when `None`.
    Send(Option<String>),
    Quick(usize),
    Suggest(usize),
    /// Resend a failed message; the one behind the error notice when `None`.
    Retry(Option<u64>),
    Dismiss,
    Copy(u64),
    Show(u64),
    Rate(u64, Feedback),
    Invalid(String),
}

/// Classifies on the trimmed line; text to send keeps its spacing and only
/// loses the line terminator.
fn parse_line(line: &str) -> ReplCommand {
    let raw = line.trim_end_matches(['\r', '\n']);
    let line = raw.trim();
    if matches!(line, "exit" | "quit" | "q") {
        return ReplCommand::Exit;
    }
    if line.is_empty() {
        return ReplCommand::Send(None);
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplCommand::Send(Some(raw.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().and_then(|n| n.parse::<u64>().ok());
    let index = arg.and_then(|n| usize::try_from(n).ok());

    match (name, arg, index) {
        ("help", _, _) => ReplCommand::Help,
        ("retry", arg, _) => ReplCommand::Retry(arg),
        ("dismiss", _, _) => ReplCommand::Dismiss,
        ("quick", _, Some(n)) => ReplCommand::Quick(n),
        ("suggest", _, Some(n)) => ReplCommand::Suggest(n),
        ("copy", Some(n), _) => ReplCommand::Copy(n),
        ("show", Some(n), _) => ReplCommand::Show(n),
        ("good", Some(n), _) => ReplCommand::Rate(n, Feedback::Positive),
        ("bad", Some(n), _) => ReplCommand::Rate(n, Feedback::Negative),
        _ => ReplCommand::Invalid(line.to_string()),
    }
}

struct Repl {
    controller: SessionController<Arc<HttpTransport>>,
    transport: Arc<HttpTransport>,
    show_feedback: bool,
    /// Messages already printed.
    shown: usize,
}

impl Repl {
    async fn run(&mut self) -> anyhow::Result<()> {
        println!("{}", "=== TBC Bank Assistant ===".bright_blue().bold());
        println!(
            "{}",
            "Type a message, /help for commands, or 'exit' to quit.".bright_black()
        );
        println!("{}\n", render::quick_actions());
        self.print_new();

        loop {
            if self.controller.input().is_empty() {
                print!("> ");
            } else {
                print!("[{}] > ", self.controller.input().bright_black());
            }
            std::io::stdout().flush()?;

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line)? == 0 {
                break;
            }

            if !self.handle(parse_line(&line)).await {
                break;
            }
        }

        let stats = self.controller.snapshot().stats();
        println!(
            "\nSession ended. {} messages sent, {} failed.",
            stats.user_messages, stats.failed_messages
        );
        Ok(())
    }

    /// Returns `false` when the session should end.
    async fn handle(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Exit => return false,
            ReplCommand::Help => print_help(),
            ReplCommand::Send(text) => {
                if let Some(text) = text {
                    self.controller.set_input(&text);
                }
                let outbound = self.controller.begin_submit_input();
                self.exchange(outbound).await;
            }
            ReplCommand::Quick(n) => match quick_action(n) {
                Some(action) => self.prefill(action.text),
                None => println!("No quick action {n}."),
            },
            ReplCommand::Suggest(n) => {
                let suggestion = n
                    .checked_sub(1)
                    .and_then(|i| self.controller.suggestions().get(i))
                    .cloned();
                match suggestion {
                    Some(text) => self.prefill(&text),
                    None => println!("No suggestion {n}."),
                }
            }
            ReplCommand::Retry(n) => {
                let failed = n
                    .map(MessageId::new)
                    .or_else(|| self.controller.last_error().map(|e| e.failed_message));
                match failed {
                    Some(id) => match self.controller.begin_retry(id) {
                        Some(outbound) => self.exchange(Some(outbound)).await,
                        None => println!("Message {id} cannot be retried."),
                    },
                    None => println!("Nothing to retry."),
                }
            }
            ReplCommand::Dismiss => self.controller.clear_error(),
            ReplCommand::Copy(n) => match self.controller.copy_text(MessageId::new(n)) {
                Some(text) => println!("{}", render::terminal_safe(&text)),
                None => println!("No message #{n}."),
            },
            ReplCommand::Show(n) => {
                let id = MessageId::new(n);
                match self.controller.messages().iter().find(|m| m.id() == id) {
                    Some(msg) => println!("{}\n", render::styled(&format(msg.text()))),
                    None => println!("No message #{n}."),
                }
            }
            ReplCommand::Rate(n, feedback) => {
                if self.controller.feedback(MessageId::new(n), feedback) {
                    println!("{}", "Thanks for your feedback!".green());
                } else {
                    println!("Only assistant messages can be rated.");
                }
            }
            ReplCommand::Invalid(line) => {
                println!("Unknown command: {line}. Type /help for commands.");
            }
        }
        true
    }

    fn prefill(&mut self, text: &str) {
        self.controller.accept_quick_action(text);
        println!("{}", "Press Enter to send, or type a new message.".bright_black());
    }

    /// Send an accepted request and print everything it added.
    async fn exchange(&mut self, outbound: Option<OutboundRequest>) {
        let Some(outbound) = outbound else {
            return;
        };
        self.print_new();
        if self.controller.is_loading() {
            println!("{}", render::typing());
        }

        let outcome = self.transport.send_message(&outbound.request).await;
        self.controller.complete(outbound.id, outcome);
        self.print_new();

        if let Some(notice) = self.controller.last_error() {
            println!("{}\n", render::error(notice));
        } else if let Some(suggestions) = render::suggestions(self.controller.suggestions()) {
            println!("{suggestions}\n");
        }
    }

    fn print_new(&mut self) {
        let messages = self.controller.messages();
        for msg in messages.iter().skip(self.shown) {
            println!("{}\n", render::message(msg, self.show_feedback));
        }
        self.shown = messages.len();
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /quick N     put quick action N into the input");
    println!("  /suggest N   put suggestion N into the input");
    println!("  /retry [N]   resend failed message N, or the last failure");
    println!("  /dismiss     hide the error notice");
    println!("  /show N      print message N in full");
    println!("  /copy N      print the raw text of message N");
    println!("  /good N      rate message N as helpful");
    println!("  /bad N       rate message N as unhelpful");
    println!("  exit         end the session");
    println!("\n{}\n", render::quick_actions());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_text_is_sent_as_typed() {
        assert_eq!(
            parse_line("  Block my card \n"),
            ReplCommand::Send(Some("  Block my card ".to_string()))
        );
        assert_eq!(
            parse_line("line one\tindented\r\n"),
            ReplCommand::Send(Some("line one\tindented".to_string()))
        );
        assert_eq!(parse_line("\n"), ReplCommand::Send(None));
        assert_eq!(parse_line("   \r\n"), ReplCommand::Send(None));
    }

    #[test]
    fn test_exit_words() {
        for word in ["exit", "quit", "q", " exit\n"] {
            assert_eq!(parse_line(word), ReplCommand::Exit);
        }
    }

    #[test]
    fn test_numbered_commands() {
        assert_eq!(parse_line("/quick 2"), ReplCommand::Quick(2));
        assert_eq!(parse_line("/suggest 1"), ReplCommand::Suggest(1));
        assert_eq!(parse_line("/copy 5"), ReplCommand::Copy(5));
        assert_eq!(parse_line("/show 5"), ReplCommand::Show(5));
        assert_eq!(parse_line("/good 3"), ReplCommand::Rate(3, Feedback::Positive));
        assert_eq!(parse_line("/bad 3"), ReplCommand::Rate(3, Feedback::Negative));
        assert_eq!(parse_line("/retry"), ReplCommand::Retry(None));
        assert_eq!(parse_line("/retry 4"), ReplCommand::Retry(Some(4)));
        assert_eq!(parse_line("/dismiss"), ReplCommand::Dismiss);
        assert_eq!(parse_line("/help"), ReplCommand::Help);
    }

    #[test]
    fn test_malformed_commands_are_invalid() {
        assert_eq!(
            parse_line("/quick"),
            ReplCommand::Invalid("/quick".to_string())
        );
        assert_eq!(
            parse_line("/copy x"),
            ReplCommand::Invalid("/copy x".to_string())
        );
        assert_eq!(parse_line("/nope"), ReplCommand::Invalid("/nope".to_string()));
    }
}
