//! `tripcover chat`: interactive or single-message advisor session.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tripcover_agent::{Session, TurnOutcome, TurnRunner};
use tripcover_channels::CliChannel;
use tripcover_config::{API_KEY_ENV, AppConfig};
use tripcover_core::channel::{Channel, ChannelInput};
use tripcover_corpus::{ReferenceLibrary, StandardExtractor, UploadedDocument};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable (or put it in a .env file):");
        eprintln!("    {API_KEY_ENV}=gsk_...");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let extractor = StandardExtractor;
    let (library, notices) = ReferenceLibrary::load(&config.reference, &extractor);
    info!(
        documents = library.corpus.len(),
        destinations = library.destinations.is_some(),
        "Reference material ready"
    );

    let provider = tripcover_providers::build_from_config(&config);
    let runner = TurnRunner::from_config(&config, provider, Arc::new(library));
    let channel = CliChannel::new();
    let mut session = Session::new();

    if let Some(msg) = message {
        // Single message mode
        return match runner
            .run(&mut session, &msg, &channel, &CancellationToken::new())
            .await
        {
            TurnOutcome::Replied { text, .. } => {
                channel.render_reply(&text).await?;
                Ok(())
            }
            TurnOutcome::Cancelled { .. } => Ok(()),
            TurnOutcome::Failed(e) => Err(e.into()),
        };
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║    🧳 Your Travel Insurance Companion         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.provider.name);
    println!("  Model:     {}", config.model);
    println!();
    println!("  /upload <path>   attach your own policy PDF");
    println!("  /transcript      show the conversation so far");
    println!("  /restart         start over");
    println!("  Type 'exit' or press Ctrl+C to quit. Ctrl+C during a reply stops it.");
    println!();

    for notice in &notices {
        channel.notify(notice).await?;
    }
    if !notices.is_empty() {
        println!();
    }

    session.ensure_greeting();
    channel.render_transcript(session.all()).await?;

    let mut rx = channel.start().await.map_err(|e| format!("Channel error: {e}"))?;

    loop {
        let next = tokio::select! {
            next = rx.recv() => next,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(result) = next else { break };

        let input = match result {
            Ok(msg) => msg.input,
            Err(e) => {
                eprintln!("  [Channel Error] {e}");
                break;
            }
        };

        match input {
            ChannelInput::Utterance { content } => {
                let cancel = CancellationToken::new();
                let watcher = tokio::spawn({
                    let cancel = cancel.clone();
                    async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    }
                });

                let outcome = runner.run(&mut session, &content, &channel, &cancel).await;
                watcher.abort();

                match outcome {
                    TurnOutcome::Replied { text, .. } => channel.render_reply(&text).await?,
                    TurnOutcome::Cancelled { .. } => channel.report_error("Reply cancelled.").await?,
                    TurnOutcome::Failed(e) => {
                        channel
                            .report_error(&format!("Sorry, the advisor is unavailable right now: {e}"))
                            .await?
                    }
                }
            }
            ChannelInput::Upload { path } => {
                match UploadedDocument::from_path(&path, &extractor) {
                    Ok(doc) if doc.text.trim().is_empty() => {
                        channel
                            .report_error(&format!("No text could be extracted from {}.", doc.name))
                            .await?
                    }
                    Ok(doc) => {
                        info!(name = %doc.name, chars = doc.text.len(), "Document uploaded");
                        session.set_upload(doc);
                        channel.notify("PDF uploaded and text extracted!").await?;
                    }
                    Err(e) => channel.report_error(&e.to_string()).await?,
                }
            }
            ChannelInput::ShowTranscript => channel.render_transcript(session.all()).await?,
            ChannelInput::Restart => {
                session = Session::new();
                session.ensure_greeting();
                channel.render_transcript(session.all()).await?;
            }
        }
    }

    println!();
    println!("  Safe travels! 👋");
    println!();

    Ok(())
}
