//! Model response to [`SemanticDiffResult`].

use std::collections::HashSet;
use tracing::warn;

use crate::discovery::normalize_url;
use crate::types::document::ScrapedDocument;
use crate::types::semantic::SemanticDiffResult;

/// Strip a Markdown code fence, or cut to the outermost JSON object.
fn json_payload(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if unfenced.starts_with('{') {
        return unfenced;
    }
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

/// Parse and validate a raw model response.
///
/// Unparseable output becomes the "analysis failed" placeholder for
/// `keyword`. Recommendations without a section or content are dropped, and
/// competitor URLs are restricted to the documents the model was shown.
pub fn parse_semantic_response(
    raw: &str,
    keyword: &str,
    competitor_docs: &[ScrapedDocument],
) -> SemanticDiffResult {
    let mut result: SemanticDiffResult = match serde_json::from_str(json_payload(raw)) {
        Ok(result) => result,
        Err(e) => {
            warn!(keyword = %keyword, error = %e, "Unparseable semantic analysis response");
            return SemanticDiffResult::analysis_failed(keyword);
        }
    };

    let allowed: HashSet<String> = competitor_docs.iter().map(|d| normalize_url(&d.url)).collect();
    let keep_known = |urls: &mut Vec<String>| urls.retain(|u| allowed.contains(&normalize_url(u)));

    result
        .recommended_additions
        .retain(|r| !r.section.trim().is_empty() && !r.content.trim().is_empty());
    for addition in &mut result.recommended_additions {
        keep_known(&mut addition.competitor_urls);
    }
    for analysis in &mut result.keyword_specific_analysis {
        analysis.what_to_add.retain(|w| !w.item.trim().is_empty());
        for item in &mut analysis.what_to_add {
            keep_known(&mut item.competitor_urls);
        }
    }
    result.missing_content.retain(|m| !m.trim().is_empty());

    result
}
