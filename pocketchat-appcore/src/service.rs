use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use pocketchat_core::config::{AppConfig, Settings};
use pocketchat_core::text::{
    clean_message, file_attached_draft, image_attached_draft, normalize_draft,
};
use pocketchat_core::types::{ChatMessage, Role, TurnId};
use pocketchat_engine::attachment::{AttachmentAdapter, AttachmentEvent};
use pocketchat_engine::completion::CompletionClient;
use pocketchat_engine::session::VoiceState;
use pocketchat_engine::traits::{
    Camera, ChoicePrompt, ContentResolver, MediaPicker, PermissionRequester, SpeechService,
};
use pocketchat_engine::voice::{RecognizerSignal, VoiceEvent, VoiceInputAdapter};
use pocketchat_engine::worker::{CompletionEvent, CompletionWorker};
use pocketchat_runtime::runtime_engine::build_client_from_config;
use pocketchat_runtime::secrets::{SecretKey, SecretStore};
use pocketchat_runtime::settings_store::SettingsStore;
use pocketchat_runtime::transcript::TranscriptStore;
use tokio::sync::mpsc;

use crate::screen::{Phase, RecordingState, STATUS_LISTENING, STATUS_ONLINE, ScreenState};

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Platform pieces the chat screen is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub picker: Arc<dyn MediaPicker>,
    pub camera: Arc<dyn Camera>,
    pub resolver: Arc<dyn ContentResolver>,
    pub permissions: Arc<dyn PermissionRequester>,
    pub speech: Arc<dyn SpeechService>,
}

/// Where the settings file and the API token override are kept.
#[derive(Clone)]
pub struct Account {
    pub store: SettingsStore,
    pub secrets: Arc<dyn SecretStore>,
    /// Used when no override is stored, e.g. from the environment.
    pub fallback_token: Option<String>,
}

#[derive(Debug)]
pub enum UiEvent {
    Completion(CompletionEvent),
    Voice(VoiceEvent),
    Attachment(AttachmentEvent),
}

/// Results from the worker and adapters, delivered to the task that owns the screen.
pub struct ChatEvents {
    completion: mpsc::UnboundedReceiver<CompletionEvent>,
    voice: mpsc::UnboundedReceiver<VoiceEvent>,
    attachment: mpsc::UnboundedReceiver<AttachmentEvent>,
}

impl ChatEvents {
    /// Next event from any source; `None` once every source has closed.
    pub async fn next(&mut self) -> Option<UiEvent> {
        tokio::select! {
            Some(ev) = self.completion.recv() => Some(UiEvent::Completion(ev)),
            Some(ev) = self.voice.recv() => Some(UiEvent::Voice(ev)),
            Some(ev) = self.attachment.recv() => Some(UiEvent::Attachment(ev)),
            else => None,
        }
    }

    /// Non-blocking variant used when draining after a user action.
    pub fn try_next(&mut self) -> Option<UiEvent> {
        if let Ok(ev) = self.completion.try_recv() {
            return Some(UiEvent::Completion(ev));
        }
        if let Ok(ev) = self.voice.try_recv() {
            return Some(UiEvent::Voice(ev));
        }
        self.attachment.try_recv().ok().map(UiEvent::Attachment)
    }
}

/// The chat screen's controller.
///
/// Holds the transcript and the adapters. Screen state lives with the caller and is
/// passed into each handler; handlers return a short notice for the user, if any.
pub struct ChatService {
    cfg: AppConfig,
    account: Account,
    preferred_model: Option<String>,
    worker: CompletionWorker,
    voice: Option<VoiceInputAdapter>,
    attachments: AttachmentAdapter,
    transcript: Vec<ChatMessage>,
    // Outstanding turns and the model that served each, once known.
    pending: HashMap<TurnId, Option<String>>,
    exports: TranscriptStore,
}

impl ChatService {
    /// Must be called from within a Tokio runtime; the completion worker starts here.
    pub fn new(
        cfg: AppConfig,
        account: Account,
        collab: Collaborators,
        export_path: PathBuf,
    ) -> anyhow::Result<(Self, ScreenState, ChatEvents)> {
        let client = Self::client_for(&cfg, &account)?;
        let preferred_model = client.preferred_model().map(str::to_string);
        let (worker, completion) = CompletionWorker::spawn(Arc::new(client));
        let (voice, voice_rx) =
            VoiceInputAdapter::new(collab.speech.as_ref(), collab.permissions.clone());
        let (attachments, attachment) = AttachmentAdapter::new(
            collab.picker,
            collab.camera,
            collab.resolver,
            collab.permissions,
        );

        let state = ScreenState::new(preferred_model.as_deref(), cfg.settings.text_size);
        let svc = Self {
            cfg,
            account,
            preferred_model,
            worker,
            voice: Some(voice),
            attachments,
            transcript: Vec::new(),
            pending: HashMap::new(),
            exports: TranscriptStore::at_path(export_path),
        };
        let events = ChatEvents {
            completion,
            voice: voice_rx,
            attachment,
        };
        Ok((svc, state, events))
    }

    fn client_for(cfg: &AppConfig, account: &Account) -> anyhow::Result<CompletionClient> {
        build_client_from_config(
            cfg,
            account.secrets.as_ref(),
            account.fallback_token.clone(),
        )
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn settings(&self) -> &Settings {
        &self.cfg.settings
    }

    pub fn api_token_present(&self) -> bool {
        self.cfg.api_key_present
    }

    /// Store a token override. Turns sent from now on use it.
    pub fn set_api_token(&mut self, token: &str) -> anyhow::Result<()> {
        let token = token.trim();
        anyhow::ensure!(!token.is_empty(), "API token is empty");
        self.account
            .secrets
            .set(SecretKey::ApiToken, token)
            .context("store API token")?;
        self.token_changed(true)
    }

    /// Drop the override and go back to the fallback token.
    pub fn clear_api_token(&mut self) -> anyhow::Result<()> {
        self.account
            .secrets
            .delete(SecretKey::ApiToken)
            .context("remove API token")?;
        self.token_changed(false)
    }

    fn token_changed(&mut self, present: bool) -> anyhow::Result<()> {
        self.cfg.api_key_present = present;
        self.account.store.save(&self.cfg)?;
        let client = Self::client_for(&self.cfg, &self.account)?;
        self.worker.replace_client(Arc::new(client))
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice
            .as_ref()
            .map(VoiceInputAdapter::state)
            .unwrap_or_default()
    }

    /// Send the current draft as a new turn.
    pub fn send_message(&mut self, state: &mut ScreenState) -> Option<String> {
        let Some(prompt) = normalize_draft(&state.draft) else {
            return Some("Please enter a message".into());
        };

        let turn = match self.worker.submit(prompt.clone()) {
            Ok(turn) => turn,
            Err(e) => {
                log::error!("failed to queue completion: {e:#}");
                return Some(format!("Error: {e}"));
            }
        };

        state.phase = Phase::Chatting;
        state.draft.clear();
        state.message_count += 1;
        self.push(turn, Role::User, &prompt);
        self.pending.insert(turn, None);
        state.show_typing();
        None
    }

    /// Put a suggested prompt in the draft and send it.
    pub fn send_suggestion(&mut self, state: &mut ScreenState, prompt: &str) -> Option<String> {
        state.draft = prompt.to_string();
        self.send_message(state)
    }

    pub fn handle_event(&mut self, state: &mut ScreenState, event: UiEvent) -> Option<String> {
        match event {
            UiEvent::Completion(ev) => self.on_completion_event(state, ev),
            UiEvent::Voice(ev) => self.on_voice_event(state, ev),
            UiEvent::Attachment(ev) => self.on_attachment_event(state, ev),
        }
    }

    pub fn on_completion_event(
        &mut self,
        state: &mut ScreenState,
        event: CompletionEvent,
    ) -> Option<String> {
        match event {
            CompletionEvent::ModelServed { turn, model } => {
                if let Some(served) = self.pending.get_mut(&turn) {
                    *served = Some(model);
                }
                None
            }
            CompletionEvent::Reply { turn, text } => {
                let Some(served) = self.pending.remove(&turn) else {
                    // Cleared while the call was in flight.
                    log::debug!("dropping reply for cleared turn {}", turn.0);
                    return None;
                };
                self.push(turn, Role::Bot, &text);
                if self.pending.is_empty() {
                    let model = served.or_else(|| self.preferred_model.clone());
                    state.hide_typing(model.as_deref());
                }
                None
            }
        }
    }

    pub fn on_voice_event(&mut self, state: &mut ScreenState, event: VoiceEvent) -> Option<String> {
        match event {
            VoiceEvent::Started => {
                state.recording = RecordingState::Recording;
                state.status_text = STATUS_LISTENING.into();
                Some("Speak now...".into())
            }
            VoiceEvent::Stopped => {
                state.recording = RecordingState::Idle;
                state.volume = 0.0;
                if !state.typing {
                    state.status_text = STATUS_ONLINE.into();
                }
                None
            }
            VoiceEvent::Volume(level) => {
                state.volume = level;
                None
            }
            VoiceEvent::Transcript { is_final: false, .. } => None,
            VoiceEvent::Transcript {
                text,
                is_final: true,
            } => {
                state.draft = text;
                if self.cfg.settings.is_auto_send_enabled() {
                    self.send_message(state)
                } else {
                    None
                }
            }
            VoiceEvent::Failed(err) => Some(format!("Voice input error: {err}")),
        }
    }

    pub fn on_attachment_event(
        &mut self,
        state: &mut ScreenState,
        event: AttachmentEvent,
    ) -> Option<String> {
        match event {
            AttachmentEvent::FileAttached(file) => {
                state.draft = file_attached_draft(&file.name, &file.mime_type);
                Some(format!("File attached: {}", file.name))
            }
            AttachmentEvent::ImageAttached(img) => {
                state.draft = image_attached_draft(&img.name);
                Some(format!("Image attached: {}", img.name))
            }
            AttachmentEvent::Failed(err) => Some(format!("Error: {err}")),
        }
    }

    /// Mic button: start listening, or stop if already listening.
    pub async fn toggle_voice(&mut self) -> Option<String> {
        if !self.cfg.settings.is_voice_input_enabled() {
            return Some("Voice input is disabled in settings".into());
        }
        // The adapter owns the toggle; the screen's recording flag may lag behind it.
        self.voice.as_mut()?.start().await;
        None
    }

    /// Feed a callback from the speech engine into the voice state machine.
    pub fn voice_signal(&mut self, signal: RecognizerSignal) {
        if let Some(voice) = self.voice.as_mut() {
            voice.handle_signal(signal);
        }
    }

    pub async fn show_attachment_picker(&self, prompt: &dyn ChoicePrompt) {
        self.attachments.show_picker(prompt).await;
    }

    pub async fn attach_document(&self) {
        self.attachments.pick_document().await;
    }

    pub async fn attach_image(&self) {
        self.attachments.pick_image().await;
    }

    pub async fn capture_image(&self) {
        self.attachments.capture_image().await;
    }

    pub fn clear_chat(&mut self, state: &mut ScreenState) -> Option<String> {
        self.transcript.clear();
        self.pending.clear();
        state.phase = Phase::WelcomeShown;
        state.message_count = 0;
        state.hide_typing(self.preferred_model.as_deref());
        Some("Chat cleared".into())
    }

    /// Write the transcript as JSON to the configured export path.
    pub fn export_chat(&self) -> anyhow::Result<PathBuf> {
        self.exports.export(&self.transcript, now_unix_ms())?;
        Ok(self.exports.path().to_path_buf())
    }

    /// Release the speech engine. Call once when the screen goes away.
    pub fn shutdown(mut self) {
        if let Some(voice) = self.voice.take() {
            voice.release();
        }
    }

    fn push(&mut self, turn: TurnId, role: Role, text: &str) {
        self.transcript
            .push(ChatMessage::new(turn, role, clean_message(text), now_unix_ms()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketchat_engine::attachment::{FileAttachment, ImageAttachment};
    use pocketchat_engine::traits::{AttachmentChoice, PickOutcome};
    use pocketchat_engine::voice::VoiceError;
    use pocketchat_platform::device::{StaticPermissions, UnavailableCamera, UnavailableSpeech};
    use pocketchat_platform::test::{
        FixedCamera, FixedChoice, MemoryResolver, ScriptedPicker, ScriptedSpeech,
    };
    use pocketchat_runtime::secrets::MemorySecrets;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        svc: ChatService,
        state: ScreenState,
        events: ChatEvents,
        dir: tempfile::TempDir,
    }

    async fn fixture_with(
        server: &MockServer,
        settings: Settings,
        speech: Arc<dyn SpeechService>,
        picker: Arc<ScriptedPicker>,
        resolver: MemoryResolver,
        camera: Arc<dyn Camera>,
    ) -> Fixture {
        let mut cfg = AppConfig::default();
        cfg.settings = settings;
        cfg.completion.endpoint = format!("{}/v1/chat", server.uri());
        cfg.completion.models = vec!["command-r".into(), "command".into()];

        let dir = tempfile::tempdir().unwrap();
        let account = Account {
            store: SettingsStore::at_path(dir.path().join("config.json")),
            secrets: Arc::new(MemorySecrets::default()),
            fallback_token: Some("tok".into()),
        };
        let collab = Collaborators {
            picker,
            camera,
            resolver: Arc::new(resolver),
            permissions: Arc::new(StaticPermissions::all_granted()),
            speech,
        };
        let (svc, state, events) =
            ChatService::new(cfg, account, collab, dir.path().join("chat.json")).unwrap();
        Fixture {
            svc,
            state,
            events,
            dir,
        }
    }

    async fn fixture(server: &MockServer) -> Fixture {
        fixture_with(
            server,
            Settings::default(),
            Arc::new(UnavailableSpeech),
            Arc::new(ScriptedPicker::default()),
            MemoryResolver::default(),
            Arc::new(UnavailableCamera),
        )
        .await
    }

    async fn reply_with(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn pump_until_idle(f: &mut Fixture) {
        while f.state.typing {
            let ev = f.events.next().await.unwrap();
            let _ = f.svc.handle_event(&mut f.state, ev);
        }
    }

    #[tokio::test]
    async fn empty_draft_is_not_sent() {
        let server = MockServer::start().await;
        let mut f = fixture(&server).await;

        f.state.draft = "   ".into();
        assert_eq!(
            f.svc.send_message(&mut f.state).as_deref(),
            Some("Please enter a message")
        );
        assert_eq!(f.state.phase, Phase::WelcomeShown);
        assert!(f.svc.transcript().is_empty());
    }

    #[tokio::test]
    async fn send_appends_user_turn_and_then_bot_reply() {
        let server = MockServer::start().await;
        reply_with(&server, 200, serde_json::json!({"text": "Bot: Hello there"})).await;
        let mut f = fixture(&server).await;

        f.state.draft = "  You: hi  ".into();
        assert_eq!(f.svc.send_message(&mut f.state), None);
        assert_eq!(f.state.phase, Phase::Chatting);
        assert_eq!(f.state.draft, "");
        assert_eq!(f.state.message_count, 1);
        assert_eq!(f.state.status_text, "Typing...");

        pump_until_idle(&mut f).await;

        let t = f.svc.transcript();
        assert_eq!(t.len(), 2);
        assert_eq!((t[0].role, t[0].text.as_str()), (Role::User, "hi"));
        assert_eq!((t[1].role, t[1].text.as_str()), (Role::Bot, "Hello there"));
        assert_eq!(t[0].turn, t[1].turn);
        assert_eq!(f.state.status_text, "Online");
        assert_eq!(f.state.model_info, "Model: command-r • Ready to help");
    }

    #[tokio::test]
    async fn fallback_model_is_shown_after_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({"model": "command-r"}),
            ))
            .respond_with(ResponseTemplate::new(404).set_body_string("retired"))
            .mount(&server)
            .await;
        reply_with(&server, 200, serde_json::json!({"message": "ok"})).await;
        let mut f = fixture(&server).await;

        f.svc.send_suggestion(&mut f.state, "Tell me a joke");
        pump_until_idle(&mut f).await;

        assert_eq!(f.state.model_info, "Model: command • Ready to help");
        assert_eq!(f.svc.transcript()[1].text, "ok");
    }

    #[tokio::test]
    async fn replies_for_cleared_turns_are_dropped() {
        let server = MockServer::start().await;
        reply_with(&server, 200, serde_json::json!({"text": "late"})).await;
        let mut f = fixture(&server).await;

        f.state.draft = "hello".into();
        f.svc.send_message(&mut f.state);
        assert_eq!(
            f.svc.clear_chat(&mut f.state).as_deref(),
            Some("Chat cleared")
        );
        assert_eq!(f.state.phase, Phase::WelcomeShown);
        assert_eq!(f.state.message_count, 0);
        assert!(!f.state.typing);

        loop {
            if let UiEvent::Completion(ev @ CompletionEvent::Reply { .. }) =
                f.events.next().await.unwrap()
            {
                f.svc.on_completion_event(&mut f.state, ev);
                break;
            }
        }
        assert!(f.svc.transcript().is_empty());
    }

    #[tokio::test]
    async fn voice_disabled_in_settings_short_circuits() {
        let server = MockServer::start().await;
        let settings = Settings {
            voice_input: false,
            ..Settings::default()
        };
        let speech = ScriptedSpeech::default();
        let mut f = fixture_with(
            &server,
            settings,
            Arc::new(speech.clone()),
            Arc::new(ScriptedPicker::default()),
            MemoryResolver::default(),
            Arc::new(UnavailableCamera),
        )
        .await;

        assert_eq!(
            f.svc.toggle_voice().await.as_deref(),
            Some("Voice input is disabled in settings")
        );
        assert_eq!(speech.calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn voice_round_trip_fills_draft_and_auto_sends() {
        let server = MockServer::start().await;
        reply_with(&server, 200, serde_json::json!({"text": "sure"})).await;
        let settings = Settings {
            auto_send: true,
            ..Settings::default()
        };
        let speech = ScriptedSpeech::default();
        let mut f = fixture_with(
            &server,
            settings,
            Arc::new(speech.clone()),
            Arc::new(ScriptedPicker::default()),
            MemoryResolver::default(),
            Arc::new(UnavailableCamera),
        )
        .await;

        f.svc.toggle_voice().await;
        f.svc.voice_signal(RecognizerSignal::ReadyForSpeech);
        f.svc
            .voice_signal(RecognizerSignal::Results(vec!["what time is it".into()]));

        // Started, Transcript, Stopped.
        for _ in 0..3 {
            let ev = f.events.voice.try_recv().unwrap();
            let _ = f.svc.on_voice_event(&mut f.state, ev);
        }
        assert_eq!(f.state.recording, RecordingState::Idle);
        assert_eq!(f.state.draft, "");
        assert_eq!(f.svc.transcript()[0].text, "what time is it");

        pump_until_idle(&mut f).await;
        assert_eq!(f.svc.transcript()[1].text, "sure");

        f.svc.shutdown();
        assert_eq!(
            speech.calls(),
            vec!["create", "start:free_form", "release"]
        );
    }

    #[tokio::test]
    async fn voice_states_drive_recording_indicator() {
        let server = MockServer::start().await;
        let mut f = fixture(&server).await;

        assert_eq!(
            f.svc.on_voice_event(&mut f.state, VoiceEvent::Started).as_deref(),
            Some("Speak now...")
        );
        assert!(f.state.is_recording());
        assert_eq!(f.state.status_text, "Listening...");

        f.state.draft = "typed".into();
        f.svc.on_voice_event(
            &mut f.state,
            VoiceEvent::Transcript {
                text: "partial".into(),
                is_final: false,
            },
        );
        assert_eq!(f.state.draft, "typed");

        let notice = f.svc.on_voice_event(
            &mut f.state,
            VoiceEvent::Failed(VoiceError::RecognitionUnavailable),
        );
        assert_eq!(
            notice.as_deref(),
            Some("Voice input error: Speech recognition not available on this device")
        );

        f.svc.on_voice_event(&mut f.state, VoiceEvent::Stopped);
        assert!(!f.state.is_recording());
        assert_eq!(f.state.status_text, "Online");
    }

    #[tokio::test]
    async fn attachments_prefill_the_draft() {
        let server = MockServer::start().await;
        let mut f = fixture(&server).await;

        let notice = f.svc.on_attachment_event(
            &mut f.state,
            AttachmentEvent::FileAttached(FileAttachment {
                name: "notes.csv".into(),
                mime_type: "text/csv".into(),
                content_base64: "YQ==".into(),
            }),
        );
        assert_eq!(notice.as_deref(), Some("File attached: notes.csv"));
        assert_eq!(
            f.state.draft,
            "📎 File attached: notes.csv\n\nPlease analyze this text/csv file."
        );

        let img = image::DynamicImage::new_rgb8(2, 2);
        let notice = f.svc.on_attachment_event(
            &mut f.state,
            AttachmentEvent::ImageAttached(ImageAttachment {
                name: "camera_image.jpg".into(),
                image: img,
                content_base64: String::new(),
            }),
        );
        assert_eq!(notice.as_deref(), Some("Image attached: camera_image.jpg"));
        assert!(f.state.draft.starts_with("🖼️ Image attached: camera_image.jpg"));
    }

    #[tokio::test]
    async fn picker_flow_reaches_the_draft() {
        let server = MockServer::start().await;
        let uri = Url::parse("content://docs/1").unwrap();
        let resolver = MemoryResolver::default().with(
            &uri,
            Some("todo.txt"),
            Some("text/plain"),
            b"milk".to_vec(),
        );
        let picker = Arc::new(ScriptedPicker::default());
        picker.push_document(PickOutcome::Picked(uri));
        let mut f = fixture_with(
            &server,
            Settings::default(),
            Arc::new(UnavailableSpeech),
            picker,
            resolver,
            Arc::new(UnavailableCamera),
        )
        .await;

        f.svc
            .show_attachment_picker(&FixedChoice(AttachmentChoice::Document))
            .await;
        let ev = f.events.try_next().unwrap();
        let notice = f.svc.handle_event(&mut f.state, ev);
        assert_eq!(notice.as_deref(), Some("File attached: todo.txt"));

        f.svc.capture_image().await;
        let ev = f.events.try_next().unwrap();
        let notice = f.svc.handle_event(&mut f.state, ev);
        assert_eq!(
            notice.as_deref(),
            Some("Error: Camera not available on this device")
        );
    }

    #[tokio::test]
    async fn export_writes_transcript_json() {
        let server = MockServer::start().await;
        reply_with(&server, 200, serde_json::json!({"text": "pong"})).await;
        let mut f = fixture(&server).await;

        f.state.draft = "ping".into();
        f.svc.send_message(&mut f.state);
        pump_until_idle(&mut f).await;

        let path = f.svc.export_chat().unwrap();
        let doc = TranscriptStore::at_path(path).load().unwrap();
        assert_eq!(doc.messages.len(), 2);
        assert_eq!(doc.messages[1].text, "pong");
    }

    #[tokio::test]
    async fn tap_after_recognizer_error_starts_a_new_session() {
        let server = MockServer::start().await;
        let speech = ScriptedSpeech::default();
        let mut f = fixture_with(
            &server,
            Settings::default(),
            Arc::new(speech.clone()),
            Arc::new(ScriptedPicker::default()),
            MemoryResolver::default(),
            Arc::new(UnavailableCamera),
        )
        .await;

        f.svc.toggle_voice().await;
        f.svc.voice_signal(RecognizerSignal::ReadyForSpeech);
        let ev = f.events.voice.try_recv().unwrap();
        f.svc.on_voice_event(&mut f.state, ev);
        assert!(f.state.is_recording());

        // Failed and Stopped stay queued; the screen still shows recording.
        f.svc.voice_signal(RecognizerSignal::Error(2));
        assert!(f.state.is_recording());
        assert_eq!(f.svc.voice_state(), VoiceState::Idle);

        f.svc.toggle_voice().await;
        assert_eq!(f.svc.voice_state(), VoiceState::Listening);
        assert_eq!(
            speech.calls(),
            vec!["create", "start:free_form", "start:free_form"]
        );
    }

    #[tokio::test]
    async fn api_token_override_is_saved_and_used_for_later_turns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer mine"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "custom"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "default"})),
            )
            .mount(&server)
            .await;
        let mut f = fixture(&server).await;
        let store = SettingsStore::at_path(f.dir.path().join("config.json"));
        assert!(!f.svc.api_token_present());

        assert!(f.svc.set_api_token("   ").is_err());
        f.svc.set_api_token(" mine ").unwrap();
        assert!(f.svc.api_token_present());
        assert!(store.load().unwrap().api_key_present);

        f.svc.send_suggestion(&mut f.state, "hi");
        pump_until_idle(&mut f).await;
        assert_eq!(f.svc.transcript()[1].text, "custom");

        f.svc.clear_api_token().unwrap();
        assert!(!f.svc.api_token_present());
        assert!(!store.load().unwrap().api_key_present);

        f.svc.send_suggestion(&mut f.state, "again");
        pump_until_idle(&mut f).await;
        assert_eq!(f.svc.transcript()[3].text, "default");
    }

    #[tokio::test]
    async fn gallery_and_camera_images_prefill_the_draft() {
        let server = MockServer::start().await;
        let mut png = Vec::new();
        image::DynamicImage::new_rgb8(1600, 1200)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let uri = Url::parse("content://media/7").unwrap();
        let resolver = MemoryResolver::default().with(&uri, Some("beach.png"), None, png);
        let picker = Arc::new(ScriptedPicker::default());
        picker.push_image(PickOutcome::Picked(uri));
        let camera = FixedCamera {
            thumbnail: image::DynamicImage::new_rgb8(160, 120),
        };
        let mut f = fixture_with(
            &server,
            Settings::default(),
            Arc::new(UnavailableSpeech),
            picker,
            resolver,
            Arc::new(camera),
        )
        .await;

        f.svc.attach_image().await;
        let ev = f.events.try_next().unwrap();
        if let UiEvent::Attachment(AttachmentEvent::ImageAttached(img)) = &ev {
            assert_eq!((img.image.width(), img.image.height()), (800, 600));
        } else {
            panic!("expected an attached image, got {ev:?}");
        }
        f.svc.handle_event(&mut f.state, ev);
        assert!(f.state.draft.starts_with("🖼️ Image attached: beach.png"));

        f.svc.capture_image().await;
        let ev = f.events.try_next().unwrap();
        assert_eq!(
            f.svc.handle_event(&mut f.state, ev).as_deref(),
            Some("Image attached: camera_image.jpg")
        );
    }
}
