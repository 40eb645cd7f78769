//! TMX `<seg>` content rendering.

use std::fmt::{Display, Formatter};

use crate::fragment::{Code, TagType, TextFragment, char_to_index, is_marker};
use crate::render::escape_text;

/// Renders inline codes as TMX paired-tag elements: opening codes become
/// `<bpt i="..">`, closing codes `<ept i="..">` and isolated codes
/// `<ph i="..">`, each wrapping the escaped native data.
///
/// Literal text is escaped for XML content; `>` is escaped only when
/// [`Self::set_escape_gt`] is set or a `]]>` sequence would appear.
#[derive(Debug, Default)]
pub struct TmxContent {
    coded_text: String,
    codes: Vec<Code>,
    escape_gt: bool,
}

impl TmxContent {
    pub fn new() -> Self {
        TmxContent::default()
    }

    /// Escape `>` in all positions, not only after `]]`.
    pub fn set_escape_gt(&mut self, escape_gt: bool) {
        self.escape_gt = escape_gt;
    }

    /// Normalizes the fragment and copies its content for rendering.
    pub fn set_content(&mut self, fragment: &mut TextFragment) -> &mut Self {
        fragment.normalize();
        self.coded_text = fragment.coded_text().to_string();
        self.codes = fragment.codes().to_vec();
        self
    }

    fn write_code(&self, code: &Code, out: &mut String) {
        let mut data = String::new();
        escape_text(code.data(), self.escape_gt, &mut data);
        match code.tag_type() {
            TagType::Opening => {
                out.push_str(&format!("<bpt i=\"{}\">{}</bpt>", code.id(), data));
            }
            TagType::Closing => {
                out.push_str(&format!("<ept i=\"{}\">{}</ept>", code.id(), data));
            }
            TagType::Isolated => {
                out.push_str(&format!("<ph i=\"{}\">{}</ph>", code.id(), data));
            }
        }
    }
}

impl Display for TmxContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut out = String::with_capacity(self.coded_text.len());
        let mut text = String::new();
        let mut iter = self.coded_text.chars();
        while let Some(c) = iter.next() {
            if !is_marker(c) {
                text.push(c);
                continue;
            }
            escape_text(&text, self.escape_gt, &mut out);
            text.clear();
            let Some(index_char) = iter.next() else {
                break;
            };
            self.write_code(&self.codes[char_to_index(index_char)], &mut out);
        }
        escape_text(&text, self.escape_gt, &mut out);
        f.write_str(&out)
    }
}
