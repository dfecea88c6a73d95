//! Line layout and cache benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use mailwrap::compose::ComposeEditor;
use mailwrap::layout::{LayoutContext, TabStops, layout_all};
use mailwrap::text::TextBuffer;
use mailwrap::{MonospaceMetrics, Style};
use std::hint::black_box;

fn build_text(paragraphs: usize) -> String {
    let para = "A paragraph of prose with http://example.com/link and a tab\there, \
                long enough to wrap a few times at eighty columns or less.\n";
    para.repeat(paragraphs)
}

fn bench_layout_all(c: &mut Criterion) {
    let metrics = MonospaceMetrics::columns();
    let stops = TabStops::default();
    let mut group = c.benchmark_group("layout_all");
    for paragraphs in [10, 100, 1_000] {
        let buffer = TextBuffer::with_text(&build_text(paragraphs), Style::NONE);
        group.bench_with_input(BenchmarkId::new("paragraphs", paragraphs), &buffer, |b, buffer| {
            let ctx = LayoutContext::new(&metrics, &stops, 40);
            b.iter(|| layout_all(black_box(buffer), &ctx));
        });
    }
    group.finish();
}

fn bench_typing(c: &mut Criterion) {
    let text = build_text(1_000);
    c.bench_function("editor_type_in_view_1k", |b| {
        b.iter_batched(
            || {
                let mut editor = ComposeEditor::default();
                editor.set_viewport(60, 30);
                editor.set_text(&text);
                let mid = text.len() / 2;
                editor.set_point(mid);
                editor.scroll_to_index(mid);
                editor
            },
            |mut editor| {
                let at = editor.point().index();
                for (i, ch) in ["t", "y", "p", "e", " "].iter().enumerate() {
                    editor.insert(at + i, ch, Style::NONE);
                }
                editor
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_scroll(c: &mut Criterion) {
    let mut editor = ComposeEditor::default();
    editor.set_viewport(60, 30);
    editor.set_text(&build_text(1_000));
    c.bench_function("editor_scroll_page", |b| {
        b.iter(|| {
            editor.scroll_down(black_box(30));
            editor.scroll_up(black_box(15));
        });
    });
}

criterion_group!(benches, bench_layout_all, bench_typing, bench_scroll);
criterion_main!(benches);
