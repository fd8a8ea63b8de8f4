use anyhow::{Context, anyhow};
use serde_json::Value;

/// Reply keys, most preferred first.
const REPLY_KEYS: &[&str] = &["text", "message"];

/// Extract the reply from a successful chat response.
///
/// The first reply key present decides; later keys are not consulted even when it is
/// blank. `Ok(None)` means no key was present or the reply was blank. A reply key
/// holding anything but a string is an error.
pub fn parse_chat_reply(body: &[u8]) -> anyhow::Result<Option<String>> {
    let value: Value = serde_json::from_slice(body).context("decode chat JSON")?;
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("chat response is not a JSON object"))?;

    let found = REPLY_KEYS
        .iter()
        .find_map(|k| obj.get(*k).map(|v| (*k, v)));
    let Some((key, value)) = found else {
        return Ok(None);
    };
    let text = value
        .as_str()
        .ok_or_else(|| anyhow!("chat reply field `{key}` is not a string"))?
        .trim();

    Ok((!text.is_empty()).then(|| text.to_string()))
}
