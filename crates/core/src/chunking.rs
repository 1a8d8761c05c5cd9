use crate::error::IngestError;
use crate::extractor::PageText;
use crate::models::{ChunkingOptions, RulebookChunk};
use regex::Regex;

/// Characters stripped outright from extracted page text: common bullet
/// glyphs plus the private-use bullet and non-breaking space that PDF
/// extraction tends to leave behind.
const STRIPPED_ARTIFACTS: [char; 5] = ['\u{2022}', '\u{b7}', '\u{25ba}', '\u{f0b7}', '\u{a0}'];

/// Clean one page of extracted text. The rules run in a fixed order:
/// collapse runs of 3+ newlines to a paragraph break, drop bullet
/// artifacts, remove "page N" footer tokens, trim every line, lowercase.
///
/// Lowercasing is unconditional and irreversible; stored text and queries
/// go through the same normalization so retrieval stays consistent.
pub fn clean_page_text(text: &str) -> Result<String, IngestError> {
    let collapse_newlines = Regex::new(r"\n{3,}")?;
    let page_footer = Regex::new(r"(?i)page\s+\d+")?;

    let text = collapse_newlines.replace_all(text, "\n\n");
    let text: String = text
        .chars()
        .filter(|symbol| !STRIPPED_ARTIFACTS.contains(symbol))
        .collect();
    let text = page_footer.replace_all(&text, "");
    let text = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(text.to_lowercase())
}

/// A window of page text with its starting character offset. Offsets let
/// callers strip the overlap shared with the previous slice and recover the
/// page verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice {
    pub start: usize,
    pub text: String,
}

/// Boundary preference when a window has to be cut, best first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ".", " "];

/// Split cleaned page text into overlapping windows of at most
/// `chunk_size` characters.
///
/// Each window past the first starts `chunk_overlap` characters before the
/// previous window's end. When a window does not reach the end of the page,
/// its cut point snaps back to the latest paragraph break, newline,
/// sentence period, or space found in the later half of the window, falling
/// back to a hard character cut. Concatenating the slices with their
/// overlaps stripped reconstructs the input exactly.
pub fn split_page(text: &str, options: &ChunkingOptions) -> Vec<PageSlice> {
    let chars: Vec<char> = text.chars().collect();
    let mut slices = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let hard_end = (start + options.chunk_size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            snap_boundary(&chars, start, hard_end, options.chunk_size)
        };

        slices.push(PageSlice {
            start,
            text: chars[start..end].iter().collect(),
        });

        if end == chars.len() {
            break;
        }

        let next = end.saturating_sub(options.chunk_overlap);
        start = if next > start { next } else { end };
    }

    slices
}

fn snap_boundary(chars: &[char], start: usize, hard_end: usize, chunk_size: usize) -> usize {
    // Only the later half of the window is searched so a stray early
    // separator cannot produce a degenerate sliver.
    let floor = start + chunk_size / 2;

    for separator in SEPARATORS {
        let sep: Vec<char> = separator.chars().collect();
        let mut position = hard_end.checked_sub(sep.len());

        while let Some(at) = position {
            if at < floor {
                break;
            }
            if chars[at..at + sep.len()] == sep[..] {
                return at + sep.len();
            }
            position = at.checked_sub(1);
        }
    }

    hard_end
}

/// Turn extracted pages into provenance-stamped chunks.
///
/// Pages are cleaned first; a page whose cleaned text is blank yields no
/// chunks. Output order is page order, then intra-page window order.
pub fn build_chunks(
    pages: &[PageText],
    source: &str,
    game: &str,
    options: &ChunkingOptions,
) -> Result<Vec<RulebookChunk>, IngestError> {
    options.validate()?;

    let mut chunks = Vec::new();
    for page in pages {
        let cleaned = clean_page_text(&page.text)?;
        if cleaned.trim().is_empty() {
            continue;
        }

        for slice in split_page(&cleaned, options) {
            if slice.text.trim().is_empty() {
                continue;
            }
            chunks.push(RulebookChunk {
                text: slice.text,
                source: source.to_string(),
                page: page.number,
                game: game.to_string(),
            });
        }
    }

    Ok(chunks)
}
