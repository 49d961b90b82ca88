//! Video reference checks done before anything reaches the pipeline.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Video URL is empty")]
    Empty,
    #[error("Not a YouTube video URL: {0}")]
    NotYouTube(String),
}

const ID_PREFIXES: [&str; 4] = ["watch?v=", "youtu.be/", "shorts/", "embed/"];

/// Extract the 11-character video id from the common YouTube URL shapes.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    if !(url.contains("youtube.com") || url.contains("youtu.be")) {
        return None;
    }
    ID_PREFIXES.iter().find_map(|prefix| {
        let rest = &url[url.find(prefix)? + prefix.len()..];
        let id: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        (id.len() == 11).then_some(id)
    })
}

pub fn validate_video_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::Empty);
    }
    youtube_video_id(url).ok_or_else(|| ValidationError::NotYouTube(url.to_string()))?;
    Ok(url.to_string())
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

/// The pipeline error panel shows this when the basis does not look like a URL.
pub fn url_scheme_hint(url: &str) -> Option<String> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        None
    } else {
        Some("Make sure the video URL starts with http:// or https://".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids_from_common_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=30",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ&list=PL123",
        ] {
            assert_eq!(youtube_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn rejects_other_hosts_and_short_ids() {
        assert_eq!(youtube_video_id("https://vimeo.com/123456789"), None);
        assert_eq!(youtube_video_id("https://youtu.be/short"), None);
        assert_eq!(validate_video_url("  "), Err(ValidationError::Empty));
        assert!(matches!(
            validate_video_url("https://example.com/video"),
            Err(ValidationError::NotYouTube(_))
        ));
    }

    #[test]
    fn hint_only_without_scheme() {
        assert_eq!(url_scheme_hint("https://youtu.be/dQw4w9WgXcQ"), None);
        assert!(url_scheme_hint("youtu.be/dQw4w9WgXcQ").is_some());
        assert_eq!(embed_url("abc"), "https://www.youtube.com/embed/abc");
    }
}
