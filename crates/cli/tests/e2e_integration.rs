//! End-to-end tests for the advisor pipeline.
//!
//! These drive whole sessions from reference loading through advisory
//! derivation, context assembly and streamed replies, with a scripted
//! provider standing in for the hosted completion service.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tripcover_agent::{AdvisoryPolicy, Session, TurnOutcome, TurnRunner};
use tripcover_channels::{CliChannel, ParsedLine, parse_line};
use tripcover_config::{AppConfig, ReferenceConfig};
use tripcover_core::channel::{Channel, ChannelId, ChannelInput, ChannelMessage};
use tripcover_core::error::{ChannelError, ProviderError};
use tripcover_core::message::{Role, Turn};
use tripcover_core::provider::{
    ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage,
};
use tripcover_corpus::{ReferenceLibrary, StandardExtractor, UploadedDocument};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Streams scripted replies in sequence, one per call, split on spaces.
struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn text(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }

    fn next_reply(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedProvider exhausted")
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        let text = self.next_reply(request)?;
        Ok(ProviderResponse {
            turn: Turn::assistant(text),
            usage: None,
            model,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let text = self.next_reply(request)?;
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        tokio::spawn(async move {
            for (i, word) in text.split(' ').enumerate() {
                let fragment = if i == 0 { word.to_string() } else { format!(" {word}") };
                if tx.send(Ok(StreamChunk::text(fragment))).await.is_err() {
                    return;
                }
            }
            let _ = tx
                .send(Ok(StreamChunk::finished(Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }))))
                .await;
        });
        Ok(rx)
    }
}

/// Records everything rendered.
struct CaptureChannel {
    id: ChannelId,
    partials: Mutex<Vec<String>>,
}

impl CaptureChannel {
    fn new() -> Self {
        Self {
            id: ChannelId("capture".into()),
            partials: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Channel for CaptureChannel {
    fn name(&self) -> &str {
        "capture"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(
        &self,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(rx)
    }

    async fn render_transcript(&self, _turns: &[Turn]) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn render_partial(&self, partial: &str) -> Result<(), ChannelError> {
        self.partials.lock().unwrap().push(partial.to_string());
        Ok(())
    }

    async fn render_reply(&self, _reply: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn notify(&self, _notice: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn report_error(&self, _error: &str) -> Result<(), ChannelError> {
        Ok(())
    }
}

fn runner(provider: Arc<ScriptedProvider>, library: ReferenceLibrary) -> TurnRunner {
    TurnRunner::from_config(&AppConfig::default(), provider, Arc::new(library))
}

/// A reference directory with two text policies and a CSV destination list.
fn reference_dir() -> (tempfile::TempDir, ReferenceConfig) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("scoot.txt"), "Scootsurance: medical cover $200,000").unwrap();
    std::fs::write(dir.path().join("easy.txt"), "TravelEasy: flood cover included").unwrap();
    std::fs::write(
        dir.path().join("destinations.csv"),
        "Region,Country,Country Code,Notes\nSoutheast Asia,Philippines,PH,\nNorth Asia,Japan,JP,\n",
    )
    .unwrap();

    let config = ReferenceConfig {
        base_dir: dir.path().to_path_buf(),
        documents: vec!["scoot.txt".into(), "easy.txt".into()],
        destination_table: "destinations.csv".into(),
    };
    (dir, config)
}

// ── E2E: Session lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn e2e_first_render_greets_once() {
    let mut session = Session::new();
    assert!(session.is_empty());

    session.ensure_greeting();
    session.ensure_greeting();

    assert_eq!(session.all().len(), 1);
    assert_eq!(session.all()[0].role, Role::Assistant);
    assert!(!session.all().iter().any(|t| t.role != Role::Assistant));
}

#[tokio::test]
async fn e2e_high_risk_trip_injects_both_advisories() {
    let provider = Arc::new(ScriptedProvider::text(&["I recommend flood cover."]));
    let runner = runner(provider.clone(), ReferenceLibrary::default());
    let mut session = Session::new();
    session.ensure_greeting();

    let outcome = runner
        .run(
            &mut session,
            "I'm going to Philippines for 10 days",
            &CaptureChannel::new(),
            &CancellationToken::new(),
        )
        .await;
    assert!(matches!(outcome, TurnOutcome::Replied { .. }));

    let advisory = &session.advisory;
    assert_eq!(advisory.destination.as_deref(), Some("Philippines"));
    assert_eq!(advisory.duration.as_deref(), Some("10"));
    assert!(advisory.weather.as_deref().unwrap().contains("flood"));
    assert!(advisory.disaster_risk.is_some());

    let turns = provider.request(0).turns;
    let risk = turns.iter().position(|t| t.content.contains("disaster risk advisory")).unwrap();
    let weather = turns.iter().position(|t| t.content.starts_with("Latest weather forecast")).unwrap();
    let history = turns.iter().position(|t| t.role != Role::System).unwrap();
    assert!(risk < weather && weather < history);
}

#[tokio::test]
async fn e2e_low_risk_trip_has_no_risk_turn() {
    let provider = Arc::new(ScriptedProvider::text(&["Japan is lovely."]));
    let runner = runner(provider.clone(), ReferenceLibrary::default());
    let mut session = Session::new();
    session.ensure_greeting();

    runner
        .run(
            &mut session,
            "I'm going to Japan for 5 days",
            &CaptureChannel::new(),
            &CancellationToken::new(),
        )
        .await;

    assert!(session.advisory.disaster_risk.is_none());
    assert!(session.advisory.weather.as_deref().unwrap().contains("moderate"));

    let turns = provider.request(0).turns;
    assert!(!turns.iter().any(|t| t.content.contains("disaster risk advisory")));
}

#[tokio::test]
async fn e2e_advisory_builds_up_across_turns() {
    let provider = Arc::new(ScriptedProvider::text(&["How long?", "Noted.", "Great."]));
    let runner = runner(provider.clone(), ReferenceLibrary::default());
    let channel = CaptureChannel::new();
    let cancel = CancellationToken::new();
    let mut session = Session::new();
    session.ensure_greeting();

    runner.run(&mut session, "Heading to vietnam soon", &channel, &cancel).await;
    assert!(session.advisory.weather.is_none());
    assert_eq!(provider.request(0).turns.iter().filter(|t| t.role == Role::System).count(), 1);

    runner.run(&mut session, "It's a 6 day trip", &channel, &cancel).await;
    assert_eq!(session.advisory.destination.as_deref(), Some("Vietnam"));
    assert_eq!(session.advisory.duration.as_deref(), Some("6"));
    assert!(session.advisory.disaster_risk.is_some());

    runner.run(&mut session, "I'm 42 years old", &channel, &cancel).await;
    assert_eq!(session.advisory.destination.as_deref(), Some("Vietnam"));

    // greeting + three user/assistant pairs
    assert_eq!(session.all().len(), 7);
    let last = provider.request(2).turns;
    assert_eq!(last.last().unwrap(), &Turn::user("I'm 42 years old"));
}

#[tokio::test]
async fn e2e_streamed_partials_carry_cursor() {
    let provider = Arc::new(ScriptedProvider::text(&["Travel safe"]));
    let runner = runner(provider, ReferenceLibrary::default());
    let channel = CaptureChannel::new();
    let mut session = Session::new();

    runner.run(&mut session, "hello", &channel, &CancellationToken::new()).await;

    let partials = channel.partials.lock().unwrap().clone();
    assert_eq!(partials, vec!["Travel▌", "Travel safe▌"]);
    assert_eq!(session.all().last().unwrap(), &Turn::assistant("Travel safe"));
}

#[tokio::test]
async fn e2e_gateway_failure_leaves_session_usable() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::RateLimited { retry_after_secs: 2 }),
        Ok("Back online.".into()),
    ]));
    let runner = runner(provider.clone(), ReferenceLibrary::default());
    let channel = CaptureChannel::new();
    let cancel = CancellationToken::new();
    let mut session = Session::new();
    session.ensure_greeting();

    let first = runner.run(&mut session, "hi", &channel, &cancel).await;
    assert!(matches!(first, TurnOutcome::Failed(ProviderError::RateLimited { .. })));
    assert_eq!(session.all().len(), 2);

    let second = runner.run(&mut session, "hello again", &channel, &cancel).await;
    assert!(matches!(second, TurnOutcome::Replied { ref text, .. } if text == "Back online."));
    assert_eq!(session.all().len(), 4);
    assert_eq!(provider.calls(), 2);
}

// ── E2E: Reference material ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_reference_material_reaches_the_provider() {
    let (_dir, reference) = reference_dir();
    let (library, notices) = ReferenceLibrary::load(&reference, &StandardExtractor);
    assert_eq!(
        notices,
        vec!["scoot.txt loaded!", "easy.txt loaded!", "Destination list loaded!"]
    );

    let provider = Arc::new(ScriptedProvider::text(&["Here are your options."]));
    let runner = runner(provider.clone(), library);
    let mut session = Session::new();
    session.ensure_greeting();
    session.set_upload(UploadedDocument {
        name: "current.pdf".into(),
        text: "Existing annual plan".into(),
    });

    runner
        .run(&mut session, "What covers floods?", &CaptureChannel::new(), &CancellationToken::new())
        .await;

    let contents: Vec<String> = provider.request(0).turns.into_iter().map(|t| t.content).collect();
    assert!(contents[1].starts_with("Here is the list of travel destinations supported:\n"));
    assert!(contents[1].contains("Philippines"));
    assert!(!contents[1].contains("Notes"));
    assert_eq!(
        contents[2],
        "Travel insurance policy data from scoot.txt:\nScootsurance: medical cover $200,000"
    );
    assert_eq!(
        contents[3],
        "Travel insurance policy data from easy.txt:\nTravelEasy: flood cover included"
    );
    assert_eq!(
        contents[4],
        "The user uploaded a PDF. Here is the content:\nExisting annual plan"
    );
}

#[tokio::test]
async fn e2e_duplicate_reference_is_loaded_once() {
    let (_dir, mut reference) = reference_dir();
    reference.documents = vec!["scoot.txt".into(), "scoot.txt".into()];

    let (library, notices) = ReferenceLibrary::load(&reference, &StandardExtractor);
    assert_eq!(library.corpus.len(), 1);
    assert_eq!(notices.iter().filter(|n| n.as_str() == "scoot.txt loaded!").count(), 1);
}

#[tokio::test]
async fn e2e_missing_reference_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let reference = ReferenceConfig {
        base_dir: dir.path().to_path_buf(),
        ..ReferenceConfig::default()
    };

    let (library, notices) = ReferenceLibrary::load(&reference, &StandardExtractor);
    assert!(library.corpus.is_empty());
    assert!(library.destinations.is_none());
    assert!(notices.is_empty());
}

// ── E2E: Configuration & surface ─────────────────────────────────────────

#[tokio::test]
async fn e2e_config_defaults_and_custom_advisory() {
    let config = AppConfig::default();
    assert_eq!(config.model, "llama-3.1-8b-instant");
    assert_eq!(config.provider.api_url, "https://api.groq.com/openai/v1");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[advisory]\nhigh_risk_destinations = [\"Japan\"]\ndisaster_risk = \"Quake risk in {destination}\"\n",
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    let policy = AdvisoryPolicy::from_config(&config.advisory);
    let state = policy.derive("going to japan for 3 days", &Default::default());
    assert_eq!(state.disaster_risk.as_deref(), Some("Quake risk in Japan"));
}

#[tokio::test]
async fn e2e_cli_surface_commands() {
    assert_eq!(
        parse_line("/upload policy.pdf"),
        ParsedLine::Input(ChannelInput::Upload {
            path: "policy.pdf".into()
        })
    );
    assert_eq!(parse_line("quit"), ParsedLine::Exit);

    let channel = CliChannel::new();
    assert_eq!(channel.name(), "cli");
}
