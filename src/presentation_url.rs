use once_cell::sync::Lazy;
use regex::Regex;

/// Presentation links look like `https://docs.google.com/presentation/d/<id>/edit`
static PRESENTATION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/presentation/d/([a-zA-Z0-9_-]+)").expect("presentation id pattern is valid")
});

/// Extract the presentation id from a pasted Google Slides link.
///
/// Returns `None` when the string has no `/presentation/d/<id>` segment.
pub fn extract_presentation_id(url: &str) -> Option<String> {
    PRESENTATION_ID_RE
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}
