//! CLI channel: interactive terminal chat.
//!
//! Reads one line at a time from stdin and writes the transcript to stdout.
//! Lines starting with `/` are commands:
//!
//! | Line | Effect |
//! |------|--------|
//! | `/upload <path>` | attach a document (replaces any earlier upload) |
//! | `/transcript` | print the whole transcript again |
//! | `/restart` | start a new session |
//! | `exit`, `quit` | leave |

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tripcover_core::channel::{Channel, ChannelId, ChannelInput, ChannelMessage};
use tripcover_core::error::ChannelError;
use tripcover_core::message::{Role, Turn};

/// Trailing marker the turn runner appends to partial replies.
const CURSOR: char = '▌';

/// What a single input line means.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Input(ChannelInput),
    Exit,
    Empty,
    /// A command used wrongly; the text is a usage hint.
    Usage(&'static str),
}

/// Interpret one line of user input.
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() {
        return ParsedLine::Empty;
    }
    if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
        return ParsedLine::Exit;
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "/upload" if rest.is_empty() => ParsedLine::Usage("Usage: /upload <path to PDF>"),
        "/upload" => ParsedLine::Input(ChannelInput::Upload {
            path: PathBuf::from(rest.trim_matches('"')),
        }),
        "/transcript" => ParsedLine::Input(ChannelInput::ShowTranscript),
        "/restart" => ParsedLine::Input(ChannelInput::Restart),
        _ => ParsedLine::Input(ChannelInput::Utterance {
            content: line.to_string(),
        }),
    }
}

/// Terminal label for a role.
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Advisor",
        Role::System => "System",
    }
}

/// How much of the current reply is already on screen.
#[derive(Debug, Default)]
struct StreamView {
    shown: usize,
    cursor: bool,
}

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    id: ChannelId,
    view: Mutex<StreamView>,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            id: ChannelId("cli".into()),
            view: Mutex::new(StreamView::default()),
        }
    }

    fn write(&self, text: &str) -> Result<(), ChannelError> {
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "cli".into(),
                reason: e.to_string(),
            })
    }

    fn view(&self) -> std::sync::MutexGuard<'_, StreamView> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(32);
        let channel_id = self.id.clone();

        tokio::spawn(async move {
            let reader = BufReader::new(io::stdin());
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let input = match parse_line(&line) {
                            ParsedLine::Input(input) => input,
                            ParsedLine::Empty => continue,
                            ParsedLine::Exit => break,
                            ParsedLine::Usage(hint) => {
                                eprintln!("{hint}");
                                continue;
                            }
                        };

                        let msg = ChannelMessage {
                            channel_id: channel_id.clone(),
                            sender_id: "local_user".into(),
                            input,
                        };

                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn render_transcript(&self, turns: &[Turn]) -> Result<(), ChannelError> {
        let text: String = turns
            .iter()
            .filter(|t| t.role != Role::System)
            .map(|t| format!("{}: {}\n\n", role_label(t.role), t.content))
            .collect();
        self.write(&text)
    }

    async fn render_partial(&self, partial: &str) -> Result<(), ChannelError> {
        let body = partial.strip_suffix(CURSOR).unwrap_or(partial);
        let mut out = String::new();
        {
            let mut view = self.view();
            if view.shown == 0 && !view.cursor {
                out.push_str(role_label(Role::Assistant));
                out.push_str(": ");
            }
            if view.cursor {
                out.push('\u{8}');
            }
            out.push_str(body.get(view.shown..).unwrap_or_default());
            view.shown = body.len();
            view.cursor = body.len() != partial.len();
            if view.cursor {
                out.push(CURSOR);
            }
        }
        self.write(&out)
    }

    async fn render_reply(&self, reply: &str) -> Result<(), ChannelError> {
        let streamed = std::mem::take(&mut *self.view());
        let text = if streamed.shown == 0 && !streamed.cursor {
            format!("{}: {reply}\n\n", role_label(Role::Assistant))
        } else {
            let rest = reply.get(streamed.shown..).unwrap_or_default();
            let erase = if streamed.cursor { "\u{8} \u{8}" } else { "" };
            format!("{erase}{rest}\n\n")
        };
        self.write(&text)
    }

    async fn notify(&self, notice: &str) -> Result<(), ChannelError> {
        self.write(&format!("✅ {notice}\n"))
    }

    async fn report_error(&self, error: &str) -> Result<(), ChannelError> {
        let streamed = std::mem::take(&mut *self.view());
        if streamed.shown > 0 || streamed.cursor {
            self.write("\n")?;
        }
        eprintln!("❌ {error}");
        Ok(())
    }
}
