use regex::Regex;
use std::sync::OnceLock;

fn speaker_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(You|Bot):\s*").expect("valid speaker prefix regex"))
}

/// Strip a leading `You:` / `Bot:` label before a message is shown in the transcript.
pub fn clean_message(text: &str) -> String {
    speaker_prefix_re().replace(text, "").to_string()
}

/// The draft as it will be sent, or `None` when there is nothing to send.
pub fn normalize_draft(draft: &str) -> Option<String> {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn file_attached_draft(file_name: &str, mime_type: &str) -> String {
    format!("📎 File attached: {file_name}\n\nPlease analyze this {mime_type} file.")
}

pub fn image_attached_draft(file_name: &str) -> String {
    format!("🖼️ Image attached: {file_name}\n\nPlease describe this image.")
}
