//! XLIFF `<source>`/`<target>` content rendering.

use std::fmt::{Display, Formatter};

use crate::fragment::{Code, TagType, TextFragment, char_to_index, is_marker};
use crate::render::escape_text;

/// Which XLIFF inline-markup vocabulary to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `<bpt>`/`<ept>`/`<ph>` wrapping the escaped native data.
    Verbose,
    /// `<g>`/`<x/>` placeholders without native data.
    Compact,
}

/// Renders inline codes in XLIFF markup, either verbose (`<bpt id="1">`,
/// `<ept id="1">`, `<ph id="2">` around the escaped native data) or compact
/// (`<g id="1">`, `</g>`, `<x id="2"/>` with the data omitted).
///
/// [`Display`] shows the verbose form.
#[derive(Debug, Default)]
pub struct XliffContent {
    coded_text: String,
    codes: Vec<Code>,
}

impl XliffContent {
    pub fn new() -> Self {
        XliffContent::default()
    }

    /// Normalizes the fragment and copies its content for rendering.
    pub fn set_content(&mut self, fragment: &mut TextFragment) -> &mut Self {
        fragment.normalize();
        self.coded_text = fragment.coded_text().to_string();
        self.codes = fragment.codes().to_vec();
        self
    }

    /// The verbose rendering, native data included.
    pub fn to_verbose(&self) -> String {
        self.render(Mode::Verbose)
    }

    /// The compact rendering, native data omitted.
    pub fn to_compact(&self) -> String {
        self.render(Mode::Compact)
    }

    fn render(&self, mode: Mode) -> String {
        let mut out = String::with_capacity(self.coded_text.len());
        let mut iter = self.coded_text.chars();
        let mut text = String::new();
        while let Some(c) = iter.next() {
            if !is_marker(c) {
                text.push(c);
                continue;
            }
            escape_text(&text, false, &mut out);
            text.clear();
            let Some(index_char) = iter.next() else {
                break;
            };
            write_code(&self.codes[char_to_index(index_char)], mode, &mut out);
        }
        escape_text(&text, false, &mut out);
        out
    }
}

fn write_code(code: &Code, mode: Mode, out: &mut String) {
    match mode {
        Mode::Verbose => {
            let mut data = String::new();
            escape_text(code.data(), false, &mut data);
            match code.tag_type() {
                TagType::Opening => {
                    out.push_str(&format!("<bpt id=\"{}\">{}</bpt>", code.id(), data));
                }
                TagType::Closing => {
                    out.push_str(&format!("<ept id=\"{}\">{}</ept>", code.id(), data));
                }
                TagType::Isolated => {
                    out.push_str(&format!("<ph id=\"{}\">{}</ph>", code.id(), data));
                }
            }
        }
        Mode::Compact => match code.tag_type() {
            TagType::Opening => out.push_str(&format!("<g id=\"{}\">", code.id())),
            TagType::Closing => out.push_str("</g>"),
            TagType::Isolated => out.push_str(&format!("<x id=\"{}\"/>", code.id())),
        },
    }
}

impl Display for XliffContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_verbose())
    }
}
