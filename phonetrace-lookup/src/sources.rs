use crate::types::Source;
use phonetrace_llm::traits::Citation;

/// Keep citations that carry a URI, in order, titled and capped.
///
/// `max` of `None` keeps everything.
pub fn collect_sources(
    citations: &[Citation],
    fallback_title: &str,
    max: Option<usize>,
) -> Vec<Source> {
    citations
        .iter()
        .filter_map(|citation| {
            let uri = citation.uri.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
            let title = citation
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(fallback_title);
            Some(Source {
                title: title.to_string(),
                uri: uri.to_string(),
            })
        })
        .take(max.unwrap_or(usize::MAX))
        .collect()
}
