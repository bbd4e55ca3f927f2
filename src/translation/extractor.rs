/*!
 * Text extraction from slide pages.
 *
 * Walks a slide's page elements in document order and collects every
 * non-blank text run from shapes, table cells and grouped elements.
 */

use serde::Serialize;

use crate::presentation::{Page, PageElement, TableCellLocation, TextContent};

/// A run of text found on a slide
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Object id of the shape or table holding the run
    pub object_id: String,

    /// Run content with surrounding whitespace removed
    pub text: String,

    /// Untrimmed run content as returned by the API
    #[serde(skip)]
    pub content: String,

    /// Start offset of the run in UTF-16 code units
    pub start_index: u32,

    /// End offset of the run in UTF-16 code units
    pub end_index: u32,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_table: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_index: Option<u32>,

    /// Cell the run lives in, for range-targeted updates
    #[serde(skip)]
    pub cell_location: Option<TableCellLocation>,
}

impl TextElement {
    /// Offsets of the trimmed text within its shape or cell, in UTF-16 units
    pub fn trimmed_range(&self) -> (u32, u32) {
        let leading = self.content.len() - self.content.trim_start().len();
        let trailing_start = self.content.trim_end().len();

        let leading_units = utf16_len(&self.content[..leading]);
        let trailing_units = utf16_len(&self.content[trailing_start..]);

        let start = self.start_index + leading_units;
        let end = self.end_index.saturating_sub(trailing_units).max(start);
        (start, end)
    }
}

fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// Collect the text runs of one slide in document order
pub fn extract_text_elements(slide: &Page) -> Vec<TextElement> {
    let mut elements = Vec::new();
    for page_element in &slide.page_elements {
        collect_from_element(page_element, &mut elements);
    }
    elements
}

fn collect_from_element(page_element: &PageElement, out: &mut Vec<TextElement>) {
    if let Some(text) = page_element.shape.as_ref().and_then(|shape| shape.text.as_ref()) {
        collect_runs(&page_element.object_id, text, None, out);
    }

    if let Some(table) = &page_element.table {
        for (row_index, row) in table.table_rows.iter().enumerate() {
            for (cell_index, cell) in row.table_cells.iter().enumerate() {
                let Some(text) = &cell.text else { continue };
                let location = cell.location.unwrap_or(TableCellLocation {
                    row_index: row_index as u32,
                    column_index: cell_index as u32,
                });
                collect_runs(
                    &page_element.object_id,
                    text,
                    Some((row_index as u32, cell_index as u32, location)),
                    out,
                );
            }
        }
    }

    if let Some(group) = &page_element.element_group {
        for child in &group.children {
            collect_from_element(child, out);
        }
    }
}

fn collect_runs(
    object_id: &str,
    text: &TextContent,
    cell: Option<(u32, u32, TableCellLocation)>,
    out: &mut Vec<TextElement>,
) {
    for text_element in &text.text_elements {
        let Some(run) = &text_element.text_run else { continue };
        let trimmed = run.content.trim();
        if trimmed.is_empty() {
            continue;
        }

        out.push(TextElement {
            object_id: object_id.to_string(),
            text: trimmed.to_string(),
            content: run.content.clone(),
            start_index: text_element.start_index,
            end_index: text_element.end_index,
            is_table: cell.is_some(),
            row_index: cell.map(|(row, _, _)| row),
            cell_index: cell.map(|(_, column, _)| column),
            cell_location: cell.map(|(_, _, location)| location),
        });
    }
}
