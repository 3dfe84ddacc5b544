//! Document export: lay the transcription out into a paginated PDF.
//!
//! Fixed-margin layout. Paragraphs are blank-line delimited; a paragraph that
//! would overflow the remaining vertical space starts a new page, and one
//! taller than a whole page continues line-by-line across pages.

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

// US Letter, in points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const FONT_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 16.0;

// Average glyph advance for Helvetica at FONT_SIZE; used for greedy wrapping.
const CHAR_WIDTH: f32 = FONT_SIZE * 0.55;

/// Render `text` into PDF bytes.
pub fn render_pdf(text: &str) -> Result<Vec<u8>> {
    build_pdf(&paginate(text))
}

/// Lines the layout can fit per page.
fn max_lines_per_page() -> usize {
    ((PAGE_HEIGHT - 2.0 * MARGIN) / LINE_HEIGHT) as usize
}

/// Characters the layout can fit per line.
fn max_chars_per_line() -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / CHAR_WIDTH) as usize
}

/// Split text into pages of wrapped lines. Empty strings inside a page mark
/// the gap between paragraphs.
fn paginate(text: &str) -> Vec<Vec<String>> {
    let max_lines = max_lines_per_page();
    let max_chars = max_chars_per_line();

    let mut pages: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for paragraph in split_paragraphs(text) {
        let lines: Vec<String> = paragraph
            .iter()
            .flat_map(|source_line| wrap_line(source_line, max_chars))
            .collect();

        // One separator line when the paragraph joins an existing page.
        let needed = lines.len() + usize::from(!current.is_empty());
        if !current.is_empty() && needed > max_lines - current.len() {
            pages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(String::new());
        }
        for line in lines {
            if current.len() >= max_lines {
                pages.push(std::mem::take(&mut current));
            }
            current.push(line);
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }
    if pages.is_empty() {
        pages.push(vec![String::new()]);
    }
    pages
}

/// Blank-line-delimited paragraphs, each a list of source lines.
fn split_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

/// Greedy word wrap by character count. Words longer than a line are
/// hard-split.
fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        for piece in split_word(word, max_chars) {
            let piece_len = piece.chars().count();
            if current_len > 0 && current_len + 1 + piece_len > max_chars {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn split_word(word: &str, max_chars: usize) -> Vec<String> {
    if word.chars().count() <= max_chars {
        return vec![word.to_string()];
    }
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Assemble the page tree. One content stream per page; text set in the
/// built-in Helvetica, so non-Latin bytes survive structurally but render
/// only for Latin scripts.
fn build_pdf(pages: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LINE_HEIGHT.into()]),
            Operation::new(
                "Td",
                vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()],
            ),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                ops.push(Operation::new("T*", vec![]));
            }
            if !line.is_empty() {
                ops.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            }
        }
        ops.push(Operation::new("ET", vec![]));

        let content = Content { operations: ops };
        let stream_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().context("Failed to encode page content")?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => stream_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut std::io::Cursor::new(&mut out))
        .context("Failed to serialize PDF")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_count(pdf: &[u8]) -> usize {
        Document::load_mem(pdf).unwrap().get_pages().len()
    }

    fn paragraph_of_lines(n: usize) -> String {
        (0..n)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_short_text_is_one_page() {
        let pdf = render_pdf("Dear diary,\n\nToday it rained.").unwrap();
        assert_eq!(&pdf[..5], b"%PDF-");
        assert_eq!(page_count(&pdf), 1);
    }

    #[test]
    fn test_two_overflowing_paragraphs_make_two_pages() {
        let max_lines = max_lines_per_page();
        // Each paragraph fits a page alone, but not both on one page.
        let para = paragraph_of_lines(max_lines * 2 / 3);
        let text = format!("{}\n\n{}", para, para);

        let pdf = render_pdf(&text).unwrap();
        assert_eq!(page_count(&pdf), 2);
    }

    #[test]
    fn test_oversized_paragraph_continues_across_pages() {
        let max_lines = max_lines_per_page();
        let text = paragraph_of_lines(max_lines + 5);
        assert_eq!(page_count(&render_pdf(&text).unwrap()), 2);
    }

    #[test]
    fn test_empty_text_is_still_a_valid_single_page() {
        assert_eq!(page_count(&render_pdf("").unwrap()), 1);
    }

    #[test]
    fn test_wrap_line_respects_width() {
        let max = 10;
        let lines = wrap_line("aaa bbb ccc ddd eee", max);
        assert!(lines.iter().all(|l| l.chars().count() <= max));
        assert_eq!(lines.join(" "), "aaa bbb ccc ddd eee");
    }

    #[test]
    fn test_oversized_word_is_hard_split() {
        let lines = wrap_line(&"x".repeat(25), 10);
        assert_eq!(lines, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn test_paragraph_separator_line_counts_against_page() {
        let max_lines = max_lines_per_page();
        // First paragraph leaves exactly one free line; a two-line paragraph
        // plus its separator cannot fit, so it moves to the next page whole.
        let text = format!(
            "{}\n\n{}",
            paragraph_of_lines(max_lines - 1),
            paragraph_of_lines(2)
        );
        let pages = paginate(&text);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].len(), 2);
    }
}
