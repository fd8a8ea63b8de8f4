// Fixed values for talking to the hosted chat endpoint.

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.cohere.ai/v1/chat";

// Hosted model names get retired from time to time; these are tried in order.
pub const DEFAULT_CANDIDATE_MODELS: &[&str] = &[
    "command-r",
    "command-r-08-2024",
    "command",
    "command-light",
    "command-nightly",
];

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const UNPARSED_REPLY_TEXT: &str = "Received response but couldn't parse it properly.";

pub const APOLOGY_TEXT: &str = "I apologize, but I'm currently unable to process your request. This could be due to:\n\n\
• Network connectivity issues\n\
• API service maintenance\n\
• Model availability\n\n\
Please check your internet connection and try again in a moment.";

pub fn api_error_text(status: u16, body: &str) -> String {
    format!("API Error {status}: {body}")
}

pub fn model_info_text(model: &str) -> String {
    format!("Model: {model} • Ready to help")
}
