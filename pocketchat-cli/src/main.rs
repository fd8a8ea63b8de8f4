use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use pocketchat_appcore::screen::{EXAMPLE_PROMPTS, SUGGESTED_PROMPTS, numbered_prompt};
use pocketchat_appcore::{Account, ChatService, Collaborators, ScreenState, UiEvent};
use pocketchat_core::types::Role;
use pocketchat_engine::worker::CompletionEvent;
use pocketchat_platform::device::{StaticPermissions, StillCamera, UnavailableSpeech};
use pocketchat_platform::fs::{FsContentResolver, PathPicker};
use pocketchat_runtime::defaults::{TRANSCRIPT_FILE_NAME, default_config_path};
use pocketchat_runtime::secrets::KeyringSecrets;
use pocketchat_runtime::settings_store::SettingsStore;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a message and press enter to send it. An empty line sends the current draft.
  /attach <path>   attach a document
  /image <path>    attach an image
  /camera <path>   use an image file as a camera capture
  /voice           toggle voice input
  /suggest [n]     list suggestions, or send suggestion n
  /examples [n]    list example prompts, or send example n
  /token [value]   save an API token override; without a value, remove it
  /clear           clear the conversation
  /export          write the conversation as JSON
  /quit            exit";

fn notify(notice: Option<String>) {
    if let Some(n) = notice {
        println!("* {n}");
    }
}

struct Cli {
    svc: ChatService,
    state: ScreenState,
    picker: Arc<PathPicker>,
    camera: Arc<StillCamera>,
}

impl Cli {
    /// Returns `false` when the user asked to quit.
    async fn command(&mut self, line: &str) -> bool {
        let (cmd, arg) = match line.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        match cmd {
            "/quit" | "/exit" => return false,
            "/help" => println!("{HELP}"),
            "/attach" => {
                self.picker.queue(arg);
                self.svc.attach_document().await;
            }
            "/image" => {
                self.picker.queue(arg);
                self.svc.attach_image().await;
            }
            "/camera" => {
                self.camera.queue(arg);
                self.svc.capture_image().await;
            }
            "/voice" => notify(self.svc.toggle_voice().await),
            "/suggest" => self.prompt_list(SUGGESTED_PROMPTS, arg),
            "/examples" => self.prompt_list(EXAMPLE_PROMPTS, arg),
            "/token" => {
                let result = if arg.is_empty() {
                    self.svc.clear_api_token().map(|()| "API token removed")
                } else {
                    self.svc.set_api_token(arg).map(|()| "API token saved")
                };
                match result {
                    Ok(msg) => println!("* {msg}"),
                    Err(e) => println!("* Error: {e:#}"),
                }
            }
            "/clear" => notify(self.svc.clear_chat(&mut self.state)),
            "/export" => match self.svc.export_chat() {
                Ok(path) => println!("* Chat exported to {}", path.display()),
                Err(e) => println!("* Error: {e:#}"),
            },
            "" => notify(self.svc.send_message(&mut self.state)),
            other if other.starts_with('/') => println!("* Unknown command {other}; try /help"),
            _ => {
                self.state.draft = line.to_string();
                notify(self.svc.send_message(&mut self.state));
            }
        }

        if self.state.typing {
            println!("[{}]", self.state.status_text);
        }
        true
    }

    fn prompt_list(&mut self, prompts: &[&'static str], arg: &str) {
        match arg.parse().ok().and_then(|n| numbered_prompt(prompts, n)) {
            Some(prompt) => {
                println!("you> {prompt}");
                notify(self.svc.send_suggestion(&mut self.state, prompt));
            }
            None => {
                for (i, p) in prompts.iter().enumerate() {
                    println!("  {}. {p}", i + 1);
                }
            }
        }
    }

    fn event(&mut self, event: UiEvent) {
        let is_reply = matches!(event, UiEvent::Completion(CompletionEvent::Reply { .. }));
        let before = self.svc.transcript().len();
        let draft_before = self.state.draft.clone();
        notify(self.svc.handle_event(&mut self.state, event));

        if is_reply && self.svc.transcript().len() > before {
            if let Some(msg) = self.svc.transcript().last().filter(|m| m.role == Role::Bot) {
                println!("bot> {}", msg.text);
                println!("[{}]", self.state.model_info);
            }
        }
        if !self.state.draft.is_empty() && self.state.draft != draft_before {
            println!("draft> {}", self.state.draft);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var_os("POCKETCHAT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let store = SettingsStore::at_path(&config_path);
    let cfg = store
        .load()
        .with_context(|| format!("load settings from {}", config_path.display()))?;
    log::info!("settings loaded from {}", config_path.display());

    let account = Account {
        store,
        secrets: Arc::new(KeyringSecrets),
        fallback_token: std::env::var("POCKETCHAT_API_KEY").ok(),
    };

    let export_path = config_path
        .parent()
        .map(|p| p.join(TRANSCRIPT_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(TRANSCRIPT_FILE_NAME));

    let picker = Arc::new(PathPicker::new());
    let camera = Arc::new(StillCamera::new());
    let collab = Collaborators {
        picker: picker.clone(),
        camera: camera.clone(),
        resolver: Arc::new(FsContentResolver),
        permissions: Arc::new(StaticPermissions::all_granted()),
        speech: Arc::new(UnavailableSpeech),
    };

    let (svc, state, mut events) = ChatService::new(cfg, account, collab, export_path)?;
    let mut cli = Cli {
        svc,
        state,
        picker,
        camera,
    };

    println!("PocketChat. {}", cli.state.model_info);
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else {
                    break;
                };
                if !cli.command(line.trim()).await {
                    break;
                }
            }
            Some(event) = events.next() => cli.event(event),
        }
    }

    cli.svc.shutdown();
    Ok(())
}
