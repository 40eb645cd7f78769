//! Numbered placeholder rendering, e.g. `Hello <1>world</1>!`.

use std::fmt::{Display, Formatter, Write};

use crate::fragment::{Code, TagType, TextFragment, char_to_index, is_marker};

/// Renders inline codes as numbered placeholder tags built from each code's
/// id: `<1>`, `</1>` and `<2/>`. The native data is not shown, which makes
/// this the compact human-readable view used in logs and tests.
///
/// # Example
/// ```rust
/// use locflow::fragment::{TagType, TextFragment};
/// use locflow::render::generic::GenericContent;
///
/// let mut fragment = TextFragment::new();
/// fragment.append_text("Hello ");
/// fragment.append_code(TagType::Opening, "b", "<b>");
/// fragment.append_text("world");
/// fragment.append_code(TagType::Closing, "b", "</b>");
/// fragment.append_text("!");
///
/// let mut content = GenericContent::new();
/// assert_eq!(content.set_content(&mut fragment).to_string(), "Hello <1>world</1>!");
/// ```
#[derive(Debug, Default)]
pub struct GenericContent {
    coded_text: String,
    codes: Vec<Code>,
}

impl GenericContent {
    pub fn new() -> Self {
        GenericContent::default()
    }

    /// Normalizes the fragment and copies its content for rendering.
    pub fn set_content(&mut self, fragment: &mut TextFragment) -> &mut Self {
        fragment.normalize();
        self.coded_text = fragment.coded_text().to_string();
        self.codes = fragment.codes().to_vec();
        self
    }
}

impl Display for GenericContent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut iter = self.coded_text.chars();
        while let Some(c) = iter.next() {
            if !is_marker(c) {
                f.write_char(c)?;
                continue;
            }
            let Some(index_char) = iter.next() else {
                break;
            };
            let code = &self.codes[char_to_index(index_char)];
            match code.tag_type() {
                TagType::Opening => write!(f, "<{}>", code.id())?,
                TagType::Closing => write!(f, "</{}>", code.id())?,
                TagType::Isolated => write!(f, "<{}/>", code.id())?,
            }
        }
        Ok(())
    }
}
