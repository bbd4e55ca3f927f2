/*!
 * Google Slides REST wire model.
 *
 * Only the parts of the presentation resource that carry text are modelled;
 * everything else in the JSON is ignored on deserialization. Request types
 * serialize into the `presentations.batchUpdate` request shape.
 */

use serde::{Deserialize, Serialize};

/// A presentation as returned by `presentations.get`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Presentation identifier
    #[serde(default)]
    pub presentation_id: String,

    /// Title shown in Drive
    #[serde(default)]
    pub title: Option<String>,

    /// Slides in presentation order
    #[serde(default)]
    pub slides: Vec<Page>,
}

/// A single slide
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Object id of the slide
    #[serde(default)]
    pub object_id: String,

    /// Elements rendered on the slide
    #[serde(default)]
    pub page_elements: Vec<PageElement>,
}

/// A shape, table, group or other visual element on a page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    /// Object id of the element
    #[serde(default)]
    pub object_id: String,

    /// Present when the element is a shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,

    /// Present when the element is a table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,

    /// Present when the element groups other elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_group: Option<Group>,
}

/// Shape payload of a page element
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

/// Group payload of a page element
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub children: Vec<PageElement>,
}

/// Table payload of a page element
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub rows: u32,

    #[serde(default)]
    pub columns: u32,

    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    /// Location of the cell; omitted for some merged cells
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<TableCellLocation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

/// Zero-based row/column of a table cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    #[serde(default)]
    pub row_index: u32,

    #[serde(default)]
    pub column_index: u32,
}

/// Text body of a shape or table cell
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text_elements: Vec<TextContentElement>,
}

/// One entry of `textElements`: a text run, paragraph marker or auto text
///
/// Offsets are in UTF-16 code units. The API omits `startIndex` when it is zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContentElement {
    #[serde(default)]
    pub start_index: u32,

    #[serde(default)]
    pub end_index: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

/// A run of text sharing one style
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

/// One operation of a `presentations.batchUpdate` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateRequest {
    ReplaceAllText(ReplaceAllTextRequest),
    DeleteText(DeleteTextRequest),
    InsertText(InsertTextRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAllTextRequest {
    pub contains_text: SubstringMatchCriteria,
    pub replace_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_object_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    pub text: String,
    pub match_case: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTextRequest {
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_location: Option<TableCellLocation>,
    pub text_range: TextRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTextRequest {
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_location: Option<TableCellLocation>,
    pub text: String,
    pub insertion_index: u32,
}

/// A `FIXED_RANGE` text range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    #[serde(rename = "type")]
    pub range_type: String,
    pub start_index: u32,
    pub end_index: u32,
}

impl TextRange {
    pub fn fixed(start_index: u32, end_index: u32) -> Self {
        Self {
            range_type: "FIXED_RANGE".to_string(),
            start_index,
            end_index,
        }
    }
}

impl UpdateRequest {
    /// Replace every case-sensitive occurrence of `find` on the given slide
    pub fn replace_all_text(find: &str, replace: &str, page_object_id: &str) -> Self {
        Self::ReplaceAllText(ReplaceAllTextRequest {
            contains_text: SubstringMatchCriteria {
                text: find.to_string(),
                match_case: true,
            },
            replace_text: replace.to_string(),
            page_object_ids: vec![page_object_id.to_string()],
        })
    }
}

/// Body of a `presentations.batchUpdate` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateBody<'a> {
    pub requests: &'a [UpdateRequest],
}

/// Response of a `presentations.batchUpdate` call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub presentation_id: String,

    /// One reply per request; only `replaceAllText` replies carry data
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

impl BatchUpdateResponse {
    /// Total occurrences changed by `replaceAllText` requests
    pub fn occurrences_changed(&self) -> u64 {
        self.replies
            .iter()
            .filter_map(|reply| reply.get("replaceAllText"))
            .filter_map(|reply| reply.get("occurrencesChanged"))
            .filter_map(|count| count.as_u64())
            .sum()
    }
}
