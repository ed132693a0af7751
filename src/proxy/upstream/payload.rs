use serde::de::DeserializeOwned;

/// Classification of a raw upstream response body.
///
/// The panel answers an expired session with its HTML login page and HTTP
/// 200, so "is this actually JSON" is a first-class parsing step rather
/// than an error-path afterthought.
#[derive(Debug)]
pub enum Payload<T> {
    Json(T),
    LoginPage,
    Malformed(String),
}

pub fn classify<T: DeserializeOwned>(body: &str) -> Payload<T> {
    let trimmed = body.trim_start();
    if looks_like_html(trimmed) {
        return Payload::LoginPage;
    }
    match serde_json::from_str(trimmed.trim_end()) {
        Ok(value) => Payload::Json(value),
        Err(e) => Payload::Malformed(e.to_string()),
    }
}

fn looks_like_html(s: &str) -> bool {
    let head: String = s.chars().take(32).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}
