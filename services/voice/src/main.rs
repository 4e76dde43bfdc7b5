mod config;
mod render;
mod store;

use crate::config::{COMMAND_CAPACITY, Config, ROOM_EVENT_CAPACITY};
use crate::render::Renderer;
use crate::store::FileStore;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sci_core::Command;
use sci_core::api::HttpBackend;
use sci_core::controller::PageController;
use sci_core::credentials::{CredentialStore, StoredCredentials, UserMetadata, UserProfile};
use sci_core::feedback::FeedbackError;
use sci_core::mode::{AgentMode, DEFAULT_VOICE};
use sci_core::sanitize::sanitize_email;
use sci_core::transcript::Speaker;
use sci_room_client::types::ServerEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(name = "sci-voice", about = "Voice chat client for the SCI learning service")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// General-purpose assistant chat
    Chat {
        /// Agent voice to request
        #[arg(long, default_value = DEFAULT_VOICE)]
        voice: String,
        /// Display name override for this session
        #[arg(long)]
        name: Option<String>,
    },
    /// English-conversation practice
    Podcast {
        #[arg(long)]
        name: Option<String>,
    },
    /// Ten-sentence learning drill
    Sentences {
        #[arg(long)]
        name: Option<String>,
    },
    /// Store credentials produced by the login flow
    SignIn {
        #[arg(long)]
        token: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Clear stored credentials
    SignOut,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    let store = FileStore::from_platform_dirs().context("Failed to open the credential store")?;

    match args.command {
        CliCommand::SignIn {
            token,
            email,
            name,
            user_id,
            full_name,
        } => sign_in(&store, token, email, name, user_id, full_name),
        CliCommand::SignOut => {
            sci_core::credentials::sign_out(&store)?;
            tracing::info!("Signed out; credentials cleared.");
            Ok(())
        }
        CliCommand::Chat { voice, name } => {
            run_session(config, store, AgentMode::Assistant { voice_name: voice }, name).await
        }
        CliCommand::Podcast { name } => {
            run_session(config, store, AgentMode::EnglishConversation, name).await
        }
        CliCommand::Sentences { name } => {
            run_session(config, store, AgentMode::SentencesLearning, name).await
        }
    }
}

fn sign_in(
    store: &FileStore,
    token: String,
    email: Option<String>,
    name: Option<String>,
    user_id: Option<String>,
    full_name: Option<String>,
) -> Result<()> {
    let credentials = StoredCredentials {
        access_token: token,
        user_email: email.map(|email| sanitize_email(&email)),
        user_name: name,
        user_data: if user_id.is_some() || full_name.is_some() {
            Some(UserProfile {
                user_id,
                user_metadata: UserMetadata { full_name },
            })
        } else {
            None
        },
    };
    store.save(&credentials)?;
    tracing::info!("Credentials stored at {}", store.path().display());
    Ok(())
}

async fn run_session(
    config: Config,
    store: FileStore,
    mode: AgentMode,
    name_override: Option<String>,
) -> Result<()> {
    tracing::info!("Configuration loaded successfully. Starting voice session...");

    let api = HttpBackend::new(config.backend_base_url.clone());

    // The command channel decouples controller decisions from rendering.
    let (command_tx, mut command_rx) = tokio::sync::mpsc::channel::<Command>(COMMAND_CAPACITY);

    let mut controller =
        PageController::new(api, store, mode, config.controller, command_tx);

    // This task executes controller commands as terminal output. It ends
    // when the controller (and its spawned helpers) drop the channel.
    let render_handle = tokio::spawn(async move {
        let mut renderer = Renderer::new();
        while let Some(command) = command_rx.recv().await {
            renderer.handle(command);
        }
    });

    // Page-load equivalent: restore the session or redirect to login.
    if !controller.bootstrap(name_override).await {
        tracing::warn!("no stored credentials; run `sci-voice sign-in` first");
        drop(controller);
        let _ = render_handle.await;
        return Ok(());
    }

    // Dispatch the agent and fetch the admission token.
    let ticket = match controller.join().await {
        Ok(ticket) => ticket,
        Err(e) => {
            tracing::error!("could not start the session: {}", e);
            drop(controller);
            let _ = render_handle.await;
            return Ok(());
        }
    };

    // Open the room session.
    let url = config
        .room_url_override
        .clone()
        .unwrap_or_else(|| ticket.url.clone());
    let room_config = sci_room_client::Config::builder()
        .with_url(&url)
        .with_token(&ticket.token)
        .build();
    let mut room = match sci_room_client::connect_with_config(ROOM_EVENT_CAPACITY, room_config).await
    {
        Ok(room) => room,
        Err(e) => {
            controller.on_connect_failure(&e).await;
            drop(controller);
            let _ = render_handle.await;
            return Ok(());
        }
    };

    let mut events = room
        .server_events()
        .await
        .context("Failed to get room events channel")?;

    // One-shot microphone request; refusal leaves the session receive-only.
    if let Err(e) = room.publish_microphone(Default::default()).await {
        tracing::warn!("microphone publication failed: {:#}", e);
    }

    // Receive and process room events, plus the transcript finalize
    // deadlines the controller keeps armed.
    loop {
        let user_deadline = controller.transcript_deadline(Speaker::User);
        let assistant_deadline = controller.transcript_deadline(Speaker::Assistant);

        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let ended = matches!(
                            event,
                            ServerEvent::Close { .. } | ServerEvent::RoomDisconnected(_)
                        );
                        controller.on_room_event(event).await;
                        if ended {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("dropped {} room events; falling behind", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::info!("room event stream ended");
                        break;
                    }
                }
            }
            _ = sleep_until_deadline(user_deadline), if user_deadline.is_some() => {
                controller.on_transcript_deadline(Speaker::User).await;
            }
            _ = sleep_until_deadline(assistant_deadline), if assistant_deadline.is_some() => {
                controller.on_transcript_deadline(Speaker::Assistant).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, leaving the session...");
                if let Err(e) = room.leave().await {
                    tracing::warn!("failed to send leave request: {:#}", e);
                }
                controller.leave().await;
                break;
            }
        }
    }

    // The assistant page offers the feedback card shortly after teardown.
    if controller.mode().collects_feedback() {
        tokio::time::sleep(controller.config().session.feedback_reveal_delay).await;
        controller.show_feedback().await;
        if let Err(e) = prompt_feedback(&mut controller).await {
            tracing::warn!("feedback prompt aborted: {:#}", e);
        }
    }

    drop(controller);
    let _ = render_handle.await;
    tracing::info!("Shutting down...");
    Ok(())
}

/// Reads the feedback card's star rating and comment from stdin.
async fn prompt_feedback(
    controller: &mut PageController<HttpBackend, FileStore>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Stars (1-5, empty to skip):");
    let Some(line) = lines.next_line().await? else {
        controller.skip_feedback().await;
        return Ok(());
    };
    let line = line.trim().to_string();
    if line.is_empty() {
        controller.skip_feedback().await;
        return Ok(());
    }
    let stars: u8 = match line.parse() {
        Ok(stars) => stars,
        Err(_) => {
            println!("Not a number; skipping.");
            controller.skip_feedback().await;
            return Ok(());
        }
    };
    controller.set_feedback_rating(stars);

    println!("Any comments? (empty for none):");
    if let Some(comment) = lines.next_line().await? {
        let comment = comment.trim();
        if !comment.is_empty() {
            controller.set_feedback_comment(comment);
        }
    }

    match controller.submit_feedback().await {
        Ok(()) => {}
        Err(FeedbackError::RatingRequired) => {
            println!("A star rating is required.");
            controller.skip_feedback().await;
        }
    }
    Ok(())
}

async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
