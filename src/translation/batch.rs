/*!
 * Batch update construction and submission.
 *
 * Translated runs of one slide are turned into a single
 * `presentations.batchUpdate` call, using one of two strategies:
 *
 * - `ReplaceAllText`: one case-sensitive `replaceAllText` per run, scoped to
 *   the slide. Identical runs with different translations collide.
 * - `TextRange`: a `deleteText` + `insertText` pair per run targeting its
 *   exact UTF-16 range, applied from the end of each shape or cell backwards.
 */

use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::app_config::UpdateStrategy;
use crate::errors::ProviderError;
use crate::presentation::{
    DeleteTextRequest, InsertTextRequest, TableCellLocation, TextRange, UpdateRequest,
};
use crate::providers::PresentationProvider;

use super::dispatcher::TranslatedElement;

/// Build the update requests for one slide
pub fn build_update_requests(
    slide_object_id: &str,
    elements: &[TranslatedElement],
    strategy: UpdateStrategy,
) -> Vec<UpdateRequest> {
    let changed: Vec<&TranslatedElement> = elements.iter().filter(|e| e.changes_text()).collect();

    match strategy {
        UpdateStrategy::ReplaceAllText => replace_all_requests(slide_object_id, &changed),
        UpdateStrategy::TextRange => text_range_requests(&changed),
    }
}

fn replace_all_requests(slide_object_id: &str, elements: &[&TranslatedElement]) -> Vec<UpdateRequest> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for element in elements {
        if let Some(previous) = seen.insert(&element.original_text, &element.translated_text) {
            if previous != element.translated_text {
                warn!(
                    "Slide {}: '{}' appears more than once with different translations; \
                     the first replacement wins",
                    slide_object_id, element.original_text
                );
            }
        }
    }

    elements
        .iter()
        .map(|element| {
            UpdateRequest::replace_all_text(
                &element.original_text,
                &element.translated_text,
                slide_object_id,
            )
        })
        .collect()
}

type RangeTarget<'a> = (&'a str, Option<(u32, u32)>);

fn text_range_requests(elements: &[&TranslatedElement]) -> Vec<UpdateRequest> {
    let mut by_target: BTreeMap<RangeTarget<'_>, Vec<&TranslatedElement>> = BTreeMap::new();
    for element in elements {
        let cell = element
            .element
            .cell_location
            .map(|location| (location.row_index, location.column_index));
        by_target
            .entry((element.element.object_id.as_str(), cell))
            .or_default()
            .push(element);
    }

    let mut requests = Vec::with_capacity(elements.len() * 2);
    for ((object_id, cell), mut group) in by_target {
        // later offsets first so earlier ranges stay valid
        group.sort_by_key(|element| std::cmp::Reverse(element.element.trimmed_range().0));

        let cell_location = cell.map(|(row_index, column_index)| TableCellLocation {
            row_index,
            column_index,
        });

        for element in group {
            let (start, end) = element.element.trimmed_range();
            if start < end {
                requests.push(UpdateRequest::DeleteText(DeleteTextRequest {
                    object_id: object_id.to_string(),
                    cell_location,
                    text_range: TextRange::fixed(start, end),
                }));
            }
            requests.push(UpdateRequest::InsertText(InsertTextRequest {
                object_id: object_id.to_string(),
                cell_location,
                text: element.translated_text.clone(),
                insertion_index: start,
            }));
        }
    }

    requests
}

/// Writes translated runs back to a presentation
#[derive(Clone)]
pub struct UpdateSubmitter {
    provider: Arc<dyn PresentationProvider>,
    strategy: UpdateStrategy,
}

impl UpdateSubmitter {
    pub fn new(provider: Arc<dyn PresentationProvider>, strategy: UpdateStrategy) -> Self {
        Self { provider, strategy }
    }

    pub fn strategy(&self) -> UpdateStrategy {
        self.strategy
    }

    /// Submit one batch for the slide; returns the number of requests sent
    ///
    /// Nothing is sent when no run changed.
    pub async fn submit(
        &self,
        presentation_id: &str,
        slide_object_id: &str,
        elements: &[TranslatedElement],
    ) -> Result<usize, ProviderError> {
        let requests = build_update_requests(slide_object_id, elements, self.strategy);
        if requests.is_empty() {
            debug!("Slide {}: nothing to update", slide_object_id);
            return Ok(0);
        }

        let response = self.provider.batch_update(presentation_id, &requests).await?;
        debug!(
            "Slide {}: {} requests applied, {} occurrences changed",
            slide_object_id,
            requests.len(),
            response.occurrences_changed()
        );
        Ok(requests.len())
    }
}
