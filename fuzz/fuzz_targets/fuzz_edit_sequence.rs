//! Fuzz target for compose editing.
//!
//! Drives a `ComposeEditor` through arbitrary edits, reflows, scrolls and
//! freeze/thaw pairs, checking the buffer and layout invariants after each
//! step.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mailwrap::compose::{ComposeConfig, ComposeEditor, QuoteKind, WrapWidth};
use mailwrap::{Rgba, Style};

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { at: u16, text: String, red: bool },
    Delete { at: u16, count: u8 },
    Paste { at: u16, text: String },
    Quote { at: u16, text: String, forward: bool },
    Reflow { at: u16, force: bool },
    ReflowAll { force: bool },
    Width { columns: u8 },
    Scroll { down: bool, px: u8 },
    Freeze,
    Thaw,
}

#[derive(Arbitrary, Debug)]
struct Input {
    autowrap: bool,
    linewrap_quote: bool,
    linewrap_len: u8,
    ops: Vec<Op>,
}

fn clamp(at: u16, len: usize) -> usize {
    usize::from(at) % (len + 1)
}

fuzz_target!(|input: Input| {
    let config = ComposeConfig::default()
        .with_autowrap(input.autowrap)
        .with_linewrap_quote(input.linewrap_quote)
        .with_linewrap_len(u32::from(input.linewrap_len).max(1));
    let mut editor = ComposeEditor::new(config);
    editor.set_viewport(40, 10);

    for op in input.ops.iter().take(64) {
        let len = editor.len();
        match op {
            Op::Insert { at, text, red } => {
                let style = if *red { Style::fg(Rgba::RED) } else { Style::NONE };
                editor.insert(clamp(*at, len), text, style);
            }
            Op::Delete { at, count } => {
                let at = clamp(*at, len);
                editor.delete(at, usize::from(*count).min(len - at));
            }
            Op::Paste { at, text } => {
                editor.paste(clamp(*at, len), text, Style::NONE);
            }
            Op::Quote { at, text, forward } => {
                let kind = if *forward { QuoteKind::Forward } else { QuoteKind::Reply };
                editor.insert_quoted(clamp(*at, len), text, kind);
            }
            Op::Reflow { at, force } => {
                editor.reflow_paragraph(clamp(*at, len), *force);
            }
            Op::ReflowAll { force } => {
                editor.reflow_all(*force);
            }
            Op::Width { columns } => {
                editor.set_wrap_width(WrapWidth::Columns(u32::from(*columns)));
            }
            Op::Scroll { down, px } => {
                if *down {
                    editor.scroll_down(u32::from(*px));
                } else {
                    editor.scroll_up(u32::from(*px));
                }
            }
            Op::Freeze => editor.freeze(),
            Op::Thaw => {
                if editor.is_frozen() {
                    editor.thaw();
                }
            }
        }
        if let Err(msg) = editor.check_invariants() {
            panic!("{msg}");
        }
    }
});
