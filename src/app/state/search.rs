use crate::rendition::SectionText;
use regex::RegexBuilder;
use serde::Serialize;
use tracing::{debug, warn};

const EXCERPT_CONTEXT_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchExcerpt {
    pub pre: String,
    pub matched: String,
    pub post: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub section_index: usize,
    pub href: String,
    pub excerpts: Vec<SearchExcerpt>,
}

/// Case-insensitive literal search over every section's text.
pub(in crate::app) fn search_sections(sections: &[SectionText], keyword: &str) -> Vec<SearchResult> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Vec::new();
    }
    let regex = match RegexBuilder::new(&regex::escape(keyword))
        .case_insensitive(true)
        .build()
    {
        Ok(regex) => regex,
        Err(err) => {
            warn!("Search pattern rejected: {err}");
            return Vec::new();
        }
    };

    let results: Vec<SearchResult> = sections
        .iter()
        .filter_map(|section| {
            let excerpts: Vec<SearchExcerpt> = regex
                .find_iter(&section.text)
                .map(|found| excerpt(&section.text, found.start(), found.end()))
                .collect();
            (!excerpts.is_empty()).then(|| SearchResult {
                section_index: section.index,
                href: section.href.clone(),
                excerpts,
            })
        })
        .collect();
    debug!(
        keyword,
        sections = results.len(),
        matches = results.iter().map(|r| r.excerpts.len()).sum::<usize>(),
        "Searched book"
    );
    results
}

fn excerpt(text: &str, start: usize, end: usize) -> SearchExcerpt {
    let pre: Vec<char> = text[..start]
        .chars()
        .rev()
        .take(EXCERPT_CONTEXT_CHARS)
        .collect();
    let pre: String = pre.into_iter().rev().collect();
    let post: String = text[end..].chars().take(EXCERPT_CONTEXT_CHARS).collect();
    SearchExcerpt {
        pre: collapse_whitespace(&pre),
        matched: text[start..end].to_string(),
        post: collapse_whitespace(&post),
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out
}
