//! Renderers producing interchange views of coded text.
//!
//! Each renderer copies the coded text and code list out of a normalized
//! [`TextFragment`](crate::fragment::TextFragment) and formats the inline
//! codes in the target convention: numbered placeholder tags
//! ([`generic::GenericContent`]), TMX `bpt`/`ept`/`ph` elements
//! ([`tmx::TmxContent`]) or XLIFF elements in both verbose and compact form
//! ([`xliff::XliffContent`]).

pub mod generic;
pub mod tmx;
pub mod xliff;

/// Escapes text for inclusion in XML content: `&` and `<` always, `>` when
/// `escape_gt` is set or when it would form a `]]>` sequence.
pub(crate) fn escape_text(text: &str, escape_gt: bool, out: &mut String) {
    let mut prev = '\0';
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if escape_gt || prev == ']' => out.push_str("&gt;"),
            _ => out.push(c),
        }
        prev = c;
    }
}
