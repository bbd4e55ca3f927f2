/*!
 * Tests for presentation id extraction
 */

use slidelingo::presentation_url::extract_presentation_id;

#[test]
fn test_extract_withEditUrl_shouldReturnId() {
    assert_eq!(
        extract_presentation_id("https://docs.google.com/presentation/d/ABC123/edit"),
        Some("ABC123".to_string())
    );
}

#[test]
fn test_extract_withIdCharacters_shouldKeepDashesAndUnderscores() {
    let url = "https://docs.google.com/presentation/d/1aB_c-D9xYz/edit#slide=id.p1";
    assert_eq!(extract_presentation_id(url), Some("1aB_c-D9xYz".to_string()));
}

#[test]
fn test_extract_withQueryString_shouldReturnId() {
    let url = "https://docs.google.com/presentation/d/XyZ_42/present?usp=sharing";
    assert_eq!(extract_presentation_id(url), Some("XyZ_42".to_string()));
}

#[test]
fn test_extract_withOtherDocuments_shouldReturnNone() {
    assert_eq!(extract_presentation_id("https://docs.google.com/document/d/ABC123/edit"), None);
    assert_eq!(extract_presentation_id("https://example.com"), None);
    assert_eq!(extract_presentation_id(""), None);
    assert_eq!(extract_presentation_id("/presentation/d/"), None);
}
