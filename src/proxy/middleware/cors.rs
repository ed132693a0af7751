use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Builds the CORS layer from the configured allow-list. An empty list means
/// the deployment did not restrict origins and the API stays open.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring unparseable CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_builds_an_open_layer() {
        // Construction must not panic; behaviour is exercised end to end.
        let _ = cors_layer(&[]);
    }

    #[test]
    fn bad_origins_are_skipped_not_fatal() {
        let origins = vec![
            "https://app.example.com".to_string(),
            "bad\norigin".to_string(),
        ];
        let _ = cors_layer(&origins);
    }
}
