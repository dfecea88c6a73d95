//! Property-based tests for paragraph reflow.

use mailwrap::compose::{ComposeConfig, ComposeEditor, Reflow};
use mailwrap::link::find_links;
use mailwrap::text::{Tag, TextBuffer};
use mailwrap::unicode::{WidthMethod, display_width_with_method};
use mailwrap::{LineEnd, LineParams, Style};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

const URL: &str = "http://example.com/a/rather/long/path";

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z]{1,9}",
        1 => Just(URL.to_string()),
        1 => Just("日本語".to_string()),
        1 => Just("supercalifragilistic".to_string()),
    ]
}

fn line() -> impl Strategy<Value = String> {
    (prop::collection::vec(word(), 1..8), 1usize..3)
        .prop_map(|(words, gap)| words.join(&" ".repeat(gap)))
}

/// Unquoted paragraphs separated by blank lines.
fn body() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::collection::vec(line(), 1..5), 1..4).prop_map(|paras| {
        paras
            .iter()
            .map(|lines| lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    })
}

/// Lines with mixed quote depths.
fn quoted_body() -> impl Strategy<Value = String> {
    prop::collection::vec((0usize..3, line()), 1..8).prop_map(|lines| {
        lines
            .iter()
            .map(|(depth, text)| format!("{}{text}", "> ".repeat(*depth)))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn reflow(text: &str, width: u32) -> TextBuffer {
    let config = ComposeConfig::default().with_linewrap_len(width);
    let mut buffer = TextBuffer::with_text(text, Style::NONE);
    Reflow::new(&config).reflow_all(&mut buffer, true);
    buffer
}

fn squeeze(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn width(line: &str) -> u32 {
    display_width_with_method(line, WidthMethod::WcWidth) as u32
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Reflow only moves whitespace.
    #[test]
    fn content_is_preserved(text in body(), len in 10u32..60) {
        let buffer = reflow(&text, len);
        prop_assert_eq!(squeeze(&buffer.text()), squeeze(&text));
    }

    /// A second pass changes neither text nor tags.
    #[test]
    fn reflow_is_idempotent(text in quoted_body(), len in 10u32..60) {
        let config = ComposeConfig::default().with_linewrap_len(len);
        let mut buffer = TextBuffer::with_text(&text, Style::NONE);
        let reflow = Reflow::new(&config);
        reflow.reflow_all(&mut buffer, true);
        let once = buffer.clone();

        let again = reflow.reflow_all(&mut buffer, true);
        prop_assert!(again.is_unchanged(), "{:?} -> {:?}", once.text(), buffer.text());
        prop_assert_eq!(buffer.text(), once.text());
        prop_assert_eq!(buffer.tags(), once.tags());
    }

    /// Links survive whole and are tagged.
    #[test]
    fn links_are_never_split(text in body(), len in 10u32..60) {
        let buffer = reflow(&text, len);
        let after = buffer.text();
        prop_assert_eq!(after.matches(URL).count(), text.matches(URL).count());
        for link in find_links(&after) {
            prop_assert_eq!(
                buffer.tags().range_at(Tag::Link, link.range.start),
                Some(link.range.clone())
            );
        }
    }

    /// Only single words overflow the wrap width.
    #[test]
    fn long_lines_are_single_words(text in body(), len in 10u32..60) {
        let buffer = reflow(&text, len);
        for line in buffer.text().split('\n') {
            if width(line) > len {
                prop_assert!(!line.contains(' '), "{:?} is {} wide", line, width(line));
            }
        }
    }

    /// Quoted continuations repeat their prefix and keep their color.
    #[test]
    fn quote_depth_is_kept(text in quoted_body(), len in 16u32..60) {
        let buffer = reflow(&text, len);
        let before: Vec<usize> = text.split('\n').map(|l| l.matches("> ").count()).collect();
        let after: Vec<usize> = buffer.text().split('\n').map(|l| l.matches("> ").count()).collect();
        let mut depths = before;
        depths.dedup();
        let mut kept = after;
        kept.dedup();
        prop_assert_eq!(depths, kept);
    }

    /// Newlines typed by the user are never joined.
    #[test]
    fn user_newlines_survive(lines in prop::collection::vec(line(), 1..6), len in 10u32..60) {
        let config = ComposeConfig::default().with_linewrap_len(len);
        let mut editor = ComposeEditor::new(config);
        let text = lines.join("\n");
        editor.insert(0, &text, Style::NONE);
        editor.reflow_all(true);

        let hard = editor.tag_ranges(Tag::NoJoin).to_vec();
        prop_assert_eq!(hard.len(), lines.len() - 1);
        for r in hard {
            prop_assert_eq!(r.len(), 1);
            prop_assert_eq!(editor.buffer().char_at(r.start), '\n');
        }
    }
}

// ============================================================================
// Layout cache under autowrap
// ============================================================================

/// Chunks typed at the end of some line: a word or a newline.
fn typing() -> impl Strategy<Value = Vec<(f64, String)>> {
    let chunk = prop_oneof![
        4 => word().prop_map(|w| format!(" {w}")),
        1 => Just("\n".to_string()),
    ];
    prop::collection::vec((0.0..1.0f64, chunk), 1..12)
}

type Shape = (usize, usize, LineEnd, u32, usize);

fn shape(line: &LineParams) -> Shape {
    (
        line.start.index(),
        line.end.index(),
        line.terminator,
        line.pixel_width,
        line.displayable_chars,
    )
}

fn line_ends(text: &str) -> Vec<usize> {
    text.chars()
        .enumerate()
        .filter(|&(_, c)| c == '\n')
        .map(|(i, _)| i)
        .chain(std::iter::once(text.chars().count()))
        .collect()
}

proptest! {
    /// After every autowrapped edit the cached lines equal a fresh layout
    /// starting at the cache head.
    #[test]
    fn autowrap_keeps_cache_fresh(
        text in quoted_body(),
        typed in typing(),
        len in 10u32..40,
        columns in 8u32..40,
    ) {
        let config = ComposeConfig::default()
            .with_linewrap_len(len)
            .with_linewrap_quote(true)
            .with_autowrap(true);
        let mut editor = ComposeEditor::new(config);
        editor.set_viewport(columns, 6);
        editor.set_text(&text);

        for (pick, chunk) in &typed {
            let ends = line_ends(&editor.text());
            let at = ends[((pick * ends.len() as f64) as usize).min(ends.len() - 1)];
            editor.insert(at, chunk, Style::NONE);

            let checked = editor.check_invariants();
            prop_assert!(checked.is_ok(), "{:?}", checked);
            let cached: Vec<Shape> = editor.cache().lines().iter().map(shape).collect();
            let full: Vec<Shape> = editor.layout_all().iter().map(shape).collect();
            let offset = full.iter().position(|line| line.0 == cached[0].0);
            prop_assert!(offset.is_some(), "cache head {} is not a line start", cached[0].0);
            let offset = offset.unwrap();
            prop_assert_eq!(&cached[..], full.get(offset..offset + cached.len()).unwrap_or(&[]));
        }
    }
}
