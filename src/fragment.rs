//! The coded-text engine.
//!
//! A [`TextFragment`] is a Unicode string in which inline formatting is
//! carried out-of-band: each inline code occupies exactly two characters in
//! the text, a reserved marker code point followed by one index character,
//! and the pair references an entry in a parallel list of [`Code`] records.
//! The fragment can re-render itself with the original markup, with no
//! markup at all, or through the renderers in [`crate::render`].
//!
//! Opening and closing codes are paired by label during normalization, which
//! runs lazily before any operation that depends on resolved ids and is a
//! no-op on an already-normalized fragment.
//!
//! Coded text is only ever produced by this engine itself; it is never read
//! from untrusted input. Malformed coded text therefore panics instead of
//! returning an error.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Marker character introducing an opening inline code.
pub const MARKER_OPENING: char = '\u{E101}';
/// Marker character introducing a closing inline code.
pub const MARKER_CLOSING: char = '\u{E102}';
/// Marker character introducing an isolated inline code.
pub const MARKER_ISOLATED: char = '\u{E103}';

/// Base code point for index characters. The character following a marker is
/// `CHARBASE + n` where `n` is the position of the code in the code list.
const CHARBASE: u32 = 0xE110;

/// Field delimiter of the intra-process code record format.
const FIELD_SEPARATOR: char = '\u{009C}';
/// Record delimiter of the intra-process code record format.
const RECORD_SEPARATOR: char = '\u{009D}';

/// Returns true for the three reserved marker code points.
pub fn is_marker(c: char) -> bool {
    matches!(c, MARKER_OPENING | MARKER_CLOSING | MARKER_ISOLATED)
}

/// Converts a code-list position into its index character.
///
/// # Panics
///
/// Panics when the position cannot be mapped to a valid code point; a single
/// fragment holds far fewer codes than that in practice.
pub fn index_to_char(index: usize) -> char {
    match u32::try_from(index)
        .ok()
        .and_then(|i| char::from_u32(CHARBASE + i))
    {
        Some(c) => c,
        None => panic!("inline code index {index} cannot be encoded"),
    }
}

/// Converts an index character back into a code-list position.
///
/// # Panics
///
/// Panics when `c` is not an index character.
pub fn char_to_index(c: char) -> usize {
    match (c as u32).checked_sub(CHARBASE) {
        Some(i) => i as usize,
        None => panic!("{c:?} is not an inline code index character"),
    }
}

fn marker_for(tag_type: TagType) -> char {
    match tag_type {
        TagType::Opening => MARKER_OPENING,
        TagType::Closing => MARKER_CLOSING,
        TagType::Isolated => MARKER_ISOLATED,
    }
}

/// The structural role of an inline code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagType {
    /// Start of a paired span, e.g. `<b>`.
    Opening,
    /// End of a paired span, e.g. `</b>`.
    Closing,
    /// Standalone code, e.g. `<br/>` or an unpaired tag.
    Isolated,
}

impl Display for TagType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagType::Opening => write!(f, "opening"),
            TagType::Closing => write!(f, "closing"),
            TagType::Isolated => write!(f, "isolated"),
        }
    }
}

impl FromStr for TagType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opening" => Ok(TagType::Opening),
            "closing" => Ok(TagType::Closing),
            "isolated" => Ok(TagType::Isolated),
            other => Err(Error::structure(format!("unknown tag type `{other}`"))),
        }
    }
}

/// One inline formatting code.
///
/// The id is meaningful only after normalization: opening and isolated codes
/// receive an id when appended, a closing code keeps `-1` until it is paired
/// with its opening (or retyped isolated) by [`TextFragment::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    tag_type: TagType,
    id: i32,
    label: String,
    data: String,
}

impl Code {
    /// Creates a code with an unassigned id.
    pub fn new(tag_type: TagType, label: impl Into<String>, data: impl Into<String>) -> Self {
        Code {
            tag_type,
            id: -1,
            label: label.into(),
            data: data.into(),
        }
    }

    /// The pairing id, `-1` when not yet assigned.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    /// The tag or element name used to pair opening and closing codes.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The exact original markup this code stands for.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Replaces the native data.
    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub(crate) fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub(crate) fn set_tag_type(&mut self, tag_type: TagType) {
        self.tag_type = tag_type;
    }
}

/// Serializes codes into the flat intra-process record format: per code the
/// fields id, type, data and label, separated by reserved delimiters.
///
/// Native data and labels must not contain the delimiter characters
/// U+009C/U+009D; they never occur in real markup.
pub fn codes_to_string(codes: &[Code]) -> String {
    let mut out = String::new();
    for code in codes {
        out.push_str(&code.id.to_string());
        out.push(FIELD_SEPARATOR);
        out.push_str(&code.tag_type.to_string());
        out.push(FIELD_SEPARATOR);
        out.push_str(&code.data);
        out.push(FIELD_SEPARATOR);
        out.push_str(&code.label);
        out.push(RECORD_SEPARATOR);
    }
    out
}

/// Rebuilds a code list from [`codes_to_string`] output.
///
/// # Panics
///
/// Panics on malformed records. The format is used only for intra-process
/// transfer, so a malformed record is a programming error, not bad input.
pub fn codes_from_string(data: &str) -> Vec<Code> {
    data.split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
        .map(|record| {
            let mut fields = record.split(FIELD_SEPARATOR);
            let mut next = || match fields.next() {
                Some(field) => field,
                None => panic!("corrupt inline-code record: {record:?}"),
            };
            let id = match next().parse::<i32>() {
                Ok(id) => id,
                Err(_) => panic!("corrupt inline-code record: {record:?}"),
            };
            let tag_type = match next().parse::<TagType>() {
                Ok(t) => t,
                Err(_) => panic!("corrupt inline-code record: {record:?}"),
            };
            let data = next().to_string();
            let label = next().to_string();
            let mut code = Code::new(tag_type, label, data);
            code.set_id(id);
            code
        })
        .collect()
}

/// A string carrying inline formatting codes out-of-band.
///
/// # Example
/// ```rust
/// use locflow::fragment::{TagType, TextFragment};
///
/// let mut fragment = TextFragment::new();
/// fragment.append_text("Hello ");
/// fragment.append_code(TagType::Opening, "b", "<b>");
/// fragment.append_text("world");
/// fragment.append_code(TagType::Closing, "b", "</b>");
/// fragment.append_text("!");
///
/// assert_eq!(fragment.to_string(), "Hello <b>world</b>!");
/// assert_eq!(fragment.plain_text(), "Hello world!");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFragment {
    text: String,
    codes: Vec<Code>,
    last_code_id: i32,
    balanced: bool,
}

impl TextFragment {
    /// Creates an empty fragment.
    pub fn new() -> Self {
        TextFragment {
            text: String::new(),
            codes: Vec::new(),
            last_code_id: 0,
            balanced: true,
        }
    }

    /// True when the fragment holds no text and no codes.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the fragment holds at least one inline code.
    pub fn has_code(&self) -> bool {
        !self.codes.is_empty()
    }

    /// True when the fragment holds literal text. With
    /// `white_spaces_as_text` set, whitespace counts as text; otherwise only
    /// non-whitespace characters do.
    pub fn has_text(&self, white_spaces_as_text: bool) -> bool {
        let mut chars = self.text.chars();
        while let Some(c) = chars.next() {
            if is_marker(c) {
                chars.next();
                continue;
            }
            if white_spaces_as_text || !c.is_whitespace() {
                return true;
            }
        }
        false
    }

    /// Number of characters in the coded text, markers and index characters
    /// included (every inline code accounts for exactly two).
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Removes all text and codes.
    pub fn clear(&mut self) {
        self.text.clear();
        self.codes.clear();
        self.last_code_id = 0;
        self.balanced = true;
    }

    /// Appends literal text. The text must not contain the reserved marker
    /// code points U+E101..U+E103 or index characters.
    pub fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Appends a single literal character.
    pub fn append_char(&mut self, c: char) {
        self.text.push(c);
    }

    /// Appends an inline code and its two-character marker.
    ///
    /// Opening and isolated codes are assigned the next id immediately;
    /// closing codes stay at `-1` until normalization pairs them.
    pub fn append_code(&mut self, tag_type: TagType, label: &str, data: &str) -> &mut Code {
        self.text.push(marker_for(tag_type));
        self.text.push(index_to_char(self.codes.len()));
        let mut code = Code::new(tag_type, label, data);
        if tag_type != TagType::Closing {
            self.last_code_id += 1;
            code.set_id(self.last_code_id);
        }
        if tag_type != TagType::Isolated {
            self.balanced = false;
        }
        self.codes.push(code);
        let last = self.codes.len() - 1;
        &mut self.codes[last]
    }

    /// Appends another fragment, renumbering its marker indices to avoid
    /// collision, then re-normalizes the combined fragment.
    ///
    /// The ids already assigned to this fragment's codes are left untouched;
    /// the appended codes receive fresh ids, so the two sets stay disjoint.
    pub fn append_fragment(&mut self, other: &TextFragment) {
        self.normalize();
        self.splice(self.char_count(), other);
        self.normalize();
    }

    /// Inserts another fragment at a character position of the coded text.
    /// The inserted codes are renumbered like in [`Self::append_fragment`],
    /// but normalization is left to run lazily.
    ///
    /// # Panics
    ///
    /// Panics when `pos` is out of bounds or splits a marker/index pair.
    pub fn insert(&mut self, pos: usize, other: &TextFragment) {
        let chars: Vec<char> = self.text.chars().collect();
        assert_valid_position(&chars, pos);
        self.splice(pos, other);
    }

    fn splice(&mut self, pos: usize, other: &TextFragment) {
        let mut insert_text = String::new();
        let mut iter = other.text.chars();
        while let Some(c) = iter.next() {
            if !is_marker(c) {
                insert_text.push(c);
                continue;
            }
            let Some(index_char) = iter.next() else {
                panic!("coded text ends with a bare marker");
            };
            let mut code = other.codes[char_to_index(index_char)].clone();
            insert_text.push(c);
            insert_text.push(index_to_char(self.codes.len()));
            if code.tag_type() != TagType::Closing {
                self.last_code_id += 1;
                code.set_id(self.last_code_id);
            } else {
                code.set_id(-1);
            }
            if code.tag_type() != TagType::Isolated {
                self.balanced = false;
            }
            self.codes.push(code);
        }
        let byte_pos = byte_position(&self.text, pos);
        self.text.insert_str(byte_pos, &insert_text);
    }

    /// Removes the character span `[start, end)` from the coded text. Codes
    /// whose markers fall inside the span are dropped and the remaining
    /// index characters are renumbered.
    ///
    /// # Panics
    ///
    /// Panics when a bound is out of bounds or splits a marker/index pair.
    pub fn remove(&mut self, start: usize, end: usize) {
        let chars: Vec<char> = self.text.chars().collect();
        assert_valid_range(&chars, start, end);

        let mut removed = vec![false; self.codes.len()];
        let mut i = start;
        while i < end {
            if is_marker(chars[i]) {
                removed[char_to_index(chars[i + 1])] = true;
                i += 2;
            } else {
                i += 1;
            }
        }

        // Positions of the codes that survive, in the renumbered list.
        let mut new_index = vec![0usize; self.codes.len()];
        let mut next = 0;
        for (old, dropped) in removed.iter().enumerate() {
            if !dropped {
                new_index[old] = next;
                next += 1;
            }
        }

        let mut new_text = String::new();
        let mut i = 0;
        while i < chars.len() {
            if i == start {
                i = end;
                if i >= chars.len() {
                    break;
                }
            }
            let c = chars[i];
            if is_marker(c) {
                // Markers outside the removed span never reference a
                // removed code: each code is referenced exactly once.
                new_text.push(c);
                new_text.push(index_to_char(new_index[char_to_index(chars[i + 1])]));
                i += 2;
            } else {
                new_text.push(c);
                i += 1;
            }
        }

        let mut kept = Vec::with_capacity(next);
        for (old, code) in self.codes.drain(..).enumerate() {
            if !removed[old] {
                kept.push(code);
            }
        }
        self.text = new_text;
        self.codes = kept;
        self.balanced = self.codes.is_empty();
    }

    /// Converts the literal character span `[start, end)` into a single
    /// inline code whose native data is that span.
    ///
    /// # Panics
    ///
    /// Panics when a bound is invalid or the span already contains codes.
    pub fn change_to_code(&mut self, start: usize, end: usize, tag_type: TagType, label: &str) {
        let chars: Vec<char> = self.text.chars().collect();
        assert_valid_range(&chars, start, end);
        let span: String = chars[start..end].iter().collect();
        if span.chars().any(is_marker) {
            panic!("span {start}..{end} already contains inline codes");
        }

        let mut new_text: String = chars[..start].iter().collect();
        new_text.push(marker_for(tag_type));
        new_text.push(index_to_char(self.codes.len()));
        new_text.extend(chars[end..].iter());
        self.text = new_text;

        let mut code = Code::new(tag_type, label, span);
        if tag_type != TagType::Closing {
            self.last_code_id += 1;
            code.set_id(self.last_code_id);
        }
        if tag_type != TagType::Isolated {
            self.balanced = false;
        }
        self.codes.push(code);
    }

    /// The coded text: literal characters plus marker/index pairs.
    pub fn coded_text(&self) -> &str {
        &self.text
    }

    /// A character span of the coded text.
    ///
    /// # Panics
    ///
    /// Panics when a bound is out of bounds or splits a marker/index pair.
    pub fn coded_text_range(&self, start: usize, end: usize) -> String {
        let chars: Vec<char> = self.text.chars().collect();
        assert_valid_range(&chars, start, end);
        chars[start..end].iter().collect()
    }

    /// Replaces the coded text, keeping the current code list.
    ///
    /// # Panics
    ///
    /// Panics when the text references a code index outside the list or ends
    /// with a bare marker.
    pub fn set_coded_text(&mut self, text: &str) {
        let codes = std::mem::take(&mut self.codes);
        self.apply_coded_text(text, codes);
    }

    /// Replaces both the coded text and the code list, e.g. after moving
    /// them separately across an intra-process boundary.
    ///
    /// # Panics
    ///
    /// Panics when the text references a code index outside the list or ends
    /// with a bare marker.
    pub fn set_coded_text_with_codes(&mut self, text: &str, codes: Vec<Code>) {
        self.apply_coded_text(text, codes);
    }

    fn apply_coded_text(&mut self, text: &str, codes: Vec<Code>) {
        let mut iter = text.chars();
        while let Some(c) = iter.next() {
            if !is_marker(c) {
                continue;
            }
            let Some(index_char) = iter.next() else {
                panic!("coded text ends with a bare marker");
            };
            let index = char_to_index(index_char);
            if index >= codes.len() {
                panic!("coded text references code {index} of {}", codes.len());
            }
        }
        self.text = text.to_string();
        self.last_code_id = codes.iter().map(Code::id).filter(|id| *id > 0).max().unwrap_or(0);
        self.balanced = codes.is_empty();
        self.codes = codes;
    }

    /// The code list, in the order the codes were added. Marker index
    /// characters in the text point into this list.
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// One code by list position.
    pub fn code(&self, index: usize) -> &Code {
        &self.codes[index]
    }

    /// The resolved id of a code, normalizing first.
    pub fn code_id(&mut self, index: usize) -> i32 {
        self.normalize();
        self.codes[index].id()
    }

    /// Pairs opening and closing codes and retypes the unpaired ones.
    ///
    /// For each opening code, the matching closing code is found by a
    /// forward scan over same-label codes with a depth counter, so nested
    /// same-label pairs resolve correctly. An opening with no matching
    /// closing is retyped isolated and keeps its id; a closing that was
    /// never paired is retyped isolated and receives a fresh id. Markers in
    /// the text are rewritten to agree with the retyped codes.
    ///
    /// Runs at most once per mutation: a normalized fragment returns
    /// immediately.
    pub fn normalize(&mut self) {
        if self.balanced {
            return;
        }

        for i in 0..self.codes.len() {
            if self.codes[i].tag_type() != TagType::Opening {
                continue;
            }
            let label = self.codes[i].label.clone();
            let id = self.codes[i].id();
            let mut depth = 1;
            let mut paired = false;
            for j in (i + 1)..self.codes.len() {
                if self.codes[j].label != label {
                    continue;
                }
                match self.codes[j].tag_type() {
                    TagType::Opening => depth += 1,
                    TagType::Closing => {
                        depth -= 1;
                        if depth == 0 {
                            self.codes[j].set_id(id);
                            paired = true;
                            break;
                        }
                    }
                    TagType::Isolated => {}
                }
            }
            if !paired {
                self.codes[i].set_tag_type(TagType::Isolated);
            }
        }

        for code in &mut self.codes {
            if code.tag_type() == TagType::Closing && code.id() == -1 {
                code.set_tag_type(TagType::Isolated);
                self.last_code_id += 1;
                code.set_id(self.last_code_id);
            }
        }

        // Markers must agree with the retyped codes.
        let mut new_text = String::with_capacity(self.text.len());
        let mut iter = self.text.chars();
        while let Some(c) = iter.next() {
            if !is_marker(c) {
                new_text.push(c);
                continue;
            }
            let Some(index_char) = iter.next() else {
                panic!("coded text ends with a bare marker");
            };
            new_text.push(marker_for(self.codes[char_to_index(index_char)].tag_type()));
            new_text.push(index_char);
        }
        self.text = new_text;
        self.balanced = true;
    }

    /// The original text: markers replaced by each code's native data.
    pub fn native_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut iter = self.text.chars();
        while let Some(c) = iter.next() {
            if is_marker(c) {
                if let Some(index_char) = iter.next() {
                    out.push_str(self.codes[char_to_index(index_char)].data());
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    /// The text with markers and codes dropped entirely.
    pub fn plain_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut iter = self.text.chars();
        while let Some(c) = iter.next() {
            if is_marker(c) {
                iter.next();
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl Default for TextFragment {
    fn default() -> Self {
        TextFragment::new()
    }
}

impl PartialEq for TextFragment {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.codes == other.codes
    }
}

impl Display for TextFragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.native_text())
    }
}

impl From<&str> for TextFragment {
    fn from(text: &str) -> Self {
        let mut fragment = TextFragment::new();
        fragment.append_text(text);
        fragment
    }
}

impl From<String> for TextFragment {
    fn from(text: String) -> Self {
        TextFragment::from(text.as_str())
    }
}

fn byte_position(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

fn assert_valid_position(chars: &[char], pos: usize) {
    if pos > chars.len() {
        panic!("position {pos} is out of bounds ({} characters)", chars.len());
    }
    if pos > 0 && is_marker(chars[pos - 1]) {
        panic!("position {pos} splits a marker/index pair");
    }
}

fn assert_valid_range(chars: &[char], start: usize, end: usize) {
    if start > end {
        panic!("range {start}..{end} is inverted");
    }
    assert_valid_position(chars, start);
    assert_valid_position(chars, end);
}
