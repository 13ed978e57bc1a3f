use once_cell::sync::Lazy;
use regex::Regex;

static CFI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^epubcfi\(/6/(\d+)(?:\[[^\]]*\])?!(?:/4(?:\[[^\]]*\])?/(\d+))?")
        .expect("valid cfi pattern")
});

/// Section and paragraph addressed by a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfiTarget {
    pub section: usize,
    pub paragraph: Option<usize>,
}

pub fn section_cfi(section: usize, paragraph: usize) -> String {
    format!("epubcfi(/6/{}!/4/{})", step(section), step(paragraph))
}

/// Range locator for a character span inside one paragraph.
pub fn range_cfi(section: usize, paragraph: usize, start: usize, end: usize) -> String {
    format!(
        "epubcfi(/6/{}!/4/{},/1:{start},/1:{end})",
        step(section),
        step(paragraph)
    )
}

pub fn parse_cfi(locator: &str) -> Option<CfiTarget> {
    let captures = CFI_PATTERN.captures(locator.trim())?;
    let section = unstep(captures.get(1)?.as_str())?;
    let paragraph = match captures.get(2) {
        Some(value) => Some(unstep(value.as_str())?),
        None => None,
    };
    Some(CfiTarget { section, paragraph })
}

fn step(index: usize) -> usize {
    (index + 1) * 2
}

fn unstep(value: &str) -> Option<usize> {
    let step: usize = value.parse().ok()?;
    if step < 2 || step % 2 != 0 {
        return None;
    }
    Some(step / 2 - 1)
}
