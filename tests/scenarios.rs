//! End-to-end compose scenarios.
//!
//! Each test drives a [`ComposeEditor`] (or a bare buffer) the way a host
//! would and checks what ends up on screen and in the tag table.

use std::sync::Once;

use mailwrap::compose::{ComposeConfig, ComposeEditor, WrapWidth};
use mailwrap::layout::{LayoutContext, TabStops, layout_all};
use mailwrap::link::find_links;
use mailwrap::text::{Tag, TextBuffer};
use mailwrap::{MonospaceMetrics, Rgba, Style};
use tracing::info;

fn setup_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

fn lines_of(buffer: &TextBuffer, width: u32) -> Vec<String> {
    let metrics = MonospaceMetrics::columns();
    let stops = TabStops::default();
    let ctx = LayoutContext::new(&metrics, &stops, width);
    layout_all(buffer, &ctx)
        .iter()
        .map(|line| {
            let shown = line.visible_range();
            buffer.text_range(shown.start, shown.end)
        })
        .collect()
}

#[test]
fn insert_wraps_into_three_lines() {
    setup_test_logging();
    let mut editor = ComposeEditor::default();
    editor.set_wrap_width(WrapWidth::Columns(5));
    editor.insert(0, "aaaa bbbb cccc", Style::NONE);

    assert_eq!(editor.display_lines(), ["aaaa", "bbbb", "cccc"]);
    editor.check_invariants().unwrap();
}

#[test]
fn quoted_continuations_keep_the_prefix() {
    setup_test_logging();
    let config = ComposeConfig::default().with_linewrap_len(20);
    let mut editor = ComposeEditor::new(config);
    editor.set_text("> quoted text that is long enough to wrap");
    let report = editor.reflow_all(true);
    info!(broken = report.broken, "reflowed");

    let text = editor.text();
    let lines: Vec<&str> = text.split('\n').collect();
    assert!(lines.len() > 1);
    for line in &lines {
        assert!(line.starts_with("> "), "{line:?} lost its prefix");
        assert!(line.chars().count() <= 20);
    }
    assert_eq!(editor.tag_ranges(Tag::Quote1), &[0..text.chars().count()]);
    assert!(editor.tag_ranges(Tag::Quote2).is_empty());
    assert!(editor.tag_ranges(Tag::Quote3).is_empty());
}

#[test]
fn list_items_are_never_merged() {
    setup_test_logging();
    let mut editor = ComposeEditor::default();
    editor.set_text("* item one\n* item two\n");
    for force in [false, true] {
        editor.reflow_all(force);
        editor.reflow_paragraph(0, force);
        assert_eq!(editor.text(), "* item one\n* item two\n");
    }
}

#[test]
fn url_is_never_split() {
    setup_test_logging();
    let text = "Visit http://example.com/very/long/path now";
    for len in 8..45 {
        let config = ComposeConfig::default().with_linewrap_len(len);
        let mut editor = ComposeEditor::new(config);
        editor.set_text(text);
        editor.reflow_all(false);

        let after = editor.text();
        let links = find_links(&after);
        assert_eq!(links.len(), 1, "width {len}: {after:?}");
        let range = links[0].range.clone();
        let url: String = after.chars().skip(range.start).take(range.len()).collect();
        assert_eq!(url, "http://example.com/very/long/path", "width {len}");
    }
}

#[test]
fn url_is_not_split_by_display_layout() {
    let buffer = TextBuffer::with_text("Visit http://example.com/very/long/path now", Style::NONE);
    for width in 1..45 {
        let lines = lines_of(&buffer, width);
        assert!(
            lines.iter().any(|l| l.contains("http://example.com/very/long/path")),
            "width {width}: {lines:?}"
        );
    }
}

#[test]
fn reinserting_uniform_text_leaves_one_run() {
    let mut buffer = TextBuffer::new();
    buffer.insert(0, "red ", Style::fg(Rgba::RED));
    buffer.insert(4, "blue ", Style::fg(Rgba::BLUE));
    buffer.insert(9, "plain", Style::NONE);
    assert_eq!(buffer.runs().run_count(), 3);

    let text = buffer.text();
    buffer.delete(0, buffer.len());
    assert_eq!(buffer.runs().run_count(), 0);
    buffer.insert(0, &text, Style::NONE);

    assert_eq!(buffer.runs().run_count(), 1);
    assert_eq!(buffer.runs().total_len(), buffer.len());
    buffer.runs().check_invariants().unwrap();
}

#[test]
fn wide_characters_in_a_narrow_view_make_progress() {
    let buffer = TextBuffer::with_text("日本語のテキスト", Style::NONE);
    let lines = lines_of(&buffer, 1);
    assert_eq!(lines, ["日", "本", "語", "の", "テ", "キ", "ス", "ト"]);
}

#[test]
fn no_join_survives_repeated_reflow() {
    setup_test_logging();
    let mut editor = ComposeEditor::default();
    editor.insert(0, "first line\nsecond line", Style::NONE);
    for _ in 0..3 {
        editor.reflow_all(true);
    }
    assert_eq!(editor.text(), "first line\nsecond line");
    assert!(editor.has_tag(Tag::NoJoin, 10));
}

#[test]
fn reflow_twice_is_stable() {
    setup_test_logging();
    let config = ComposeConfig::default().with_linewrap_len(24).with_linewrap_quote(true);
    let mut editor = ComposeEditor::new(config);
    editor.set_text(
        "Hi,\n\nsee https://example.org/docs for the details of this\nproposal.\n\n\
         > > older quote that goes on\n> > and on\n> newer quote\n\n-- \nsig",
    );
    editor.reflow_all(false);
    let text = editor.text();
    let tags: Vec<_> = Tag::ALL
        .iter()
        .map(|&tag| editor.tag_ranges(tag).to_vec())
        .collect();

    let again = editor.reflow_all(false);
    assert!(again.is_unchanged());
    assert_eq!(editor.text(), text);
    let tags_again: Vec<_> = Tag::ALL
        .iter()
        .map(|&tag| editor.tag_ranges(tag).to_vec())
        .collect();
    assert_eq!(tags, tags_again);
}

#[test]
fn thaw_matches_unfrozen_layout() {
    setup_test_logging();
    let text = (0..60)
        .map(|i| format!("paragraph {i} with a few words in it"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut frozen = ComposeEditor::default();
    frozen.set_viewport(20, 6);
    frozen.set_text(&text);
    let mut live = ComposeEditor::default();
    live.set_viewport(20, 6);
    live.set_text(&text);

    frozen.freeze();
    for editor in [&mut frozen, &mut live] {
        editor.insert(0, "new opening words\n", Style::NONE);
        editor.delete(40, 12);
        editor.insert(100, " more", Style::NONE);
    }
    frozen.thaw();

    assert_eq!(frozen.text(), live.text());
    let shape = |editor: &ComposeEditor| {
        editor
            .cache()
            .lines()
            .iter()
            .map(|l| (l.start.index(), l.end.index(), l.terminator, l.pixel_width))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&frozen), shape(&live));
    assert_eq!(frozen.cache().scroll_y(), live.cache().scroll_y());
    assert_eq!(frozen.display_lines(), live.display_lines());
    frozen.check_invariants().unwrap();
}

#[test]
fn signature_is_tagged_and_left_alone() {
    let config = ComposeConfig::default().with_linewrap_len(10);
    let mut editor = ComposeEditor::new(config);
    editor.set_text("short\nbody");
    editor.insert_signature("a signature line longer than ten columns");
    editor.reflow_all(true);

    let text = editor.text();
    assert!(text.starts_with("short body\n\n-- \n"));
    assert!(text.ends_with("a signature line longer than ten columns"));
    let sig_start = text.find("-- ").unwrap();
    assert_eq!(editor.tag_ranges(Tag::Signature), &[sig_start..text.chars().count()]);
}
