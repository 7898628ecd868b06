use serde_json::{json, Value};

pub const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub fn request_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "user", "content": prompt }
        ]
    })
}

pub fn response_text(body: &Value) -> Option<String> {
    let text = body
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()?;
    (!text.trim().is_empty()).then(|| text.to_string())
}
