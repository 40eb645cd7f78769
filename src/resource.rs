//! The resources carried by extraction events.
//!
//! Filters break a document into resources: the extractable text lands in
//! [`TextUnit`]s, everything else in skeleton-bearing resources such as
//! [`DocumentPart`] and the group and document boundary markers. Each
//! resource owns its id, an optional [`GenericSkeleton`] and a
//! [`PropertyMap`], which is what the [`Resource`] trait exposes uniformly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::DecodeReaderBytesBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fragment::TextFragment;
use crate::locale::LocaleId;
use crate::skeleton::GenericSkeleton;

/// A named value attached to a resource, e.g. an attribute of the original
/// markup. Read-only properties are informational and must not be modified
/// by pipeline steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    value: String,
    read_only: bool,
}

impl Property {
    /// Creates a modifiable property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Property {
            name: name.into(),
            value: value.into(),
            read_only: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

/// Properties of a resource, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap {
    properties: HashMap<String, Property>,
}

impl PropertyMap {
    pub fn new() -> Self {
        PropertyMap::default()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Inserts a property under its own name, replacing any previous one.
    pub fn set(&mut self, property: Property) {
        self.properties.insert(property.name().to_string(), property);
    }

    /// Shorthand for inserting a modifiable named value.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(Property::new(name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    /// The value of a property, when present.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(Property::value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.properties.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }
}

/// What every event resource exposes: an id and an optional skeleton.
pub trait Resource {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: &str);
    fn skeleton(&self) -> Option<&GenericSkeleton>;
    fn set_skeleton(&mut self, skeleton: GenericSkeleton);
}

macro_rules! impl_resource {
    ($($ty:ty),+ $(,)?) => {
        $(impl Resource for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: &str) {
                self.id = id.to_string();
            }

            fn skeleton(&self) -> Option<&GenericSkeleton> {
                self.skeleton.as_ref()
            }

            fn set_skeleton(&mut self, skeleton: GenericSkeleton) {
                self.skeleton = Some(skeleton);
            }
        })+
    };
}

impl_resource!(StartDocument, Ending, StartGroup, StartSubDocument, DocumentPart, TextUnit);

/// Opens a document: where it came from and how to write it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartDocument {
    pub id: String,
    /// Display name, usually the input path or resource name.
    pub name: String,
    pub locale: LocaleId,
    /// Encoding label of the original document.
    pub encoding: String,
    /// Whether the original UTF-8 document started with a byte order mark.
    pub has_utf8_bom: bool,
    /// The line break convention of the original document.
    pub line_break: String,
    /// True when the document carries more than one language.
    pub multilingual: bool,
    pub properties: PropertyMap,
    pub skeleton: Option<GenericSkeleton>,
}

impl StartDocument {
    pub fn new(id: impl Into<String>) -> Self {
        StartDocument {
            id: id.into(),
            name: String::new(),
            locale: LocaleId::default(),
            encoding: "UTF-8".to_string(),
            has_utf8_bom: false,
            line_break: "\n".to_string(),
            multilingual: false,
            properties: PropertyMap::new(),
            skeleton: None,
        }
    }
}

/// Closes a document, sub-document or group, carrying any trailing skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub id: String,
    pub properties: PropertyMap,
    pub skeleton: Option<GenericSkeleton>,
}

impl Ending {
    pub fn new(id: impl Into<String>) -> Self {
        Ending {
            id: id.into(),
            ..Ending::default()
        }
    }
}

/// Opens a logical grouping of resources, e.g. a table or a menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartGroup {
    pub id: String,
    pub name: String,
    pub group_type: Option<String>,
    /// True when the group is output through a skeleton reference instead
    /// of at its own position.
    pub referent: bool,
    pub properties: PropertyMap,
    pub skeleton: Option<GenericSkeleton>,
}

impl StartGroup {
    pub fn new(id: impl Into<String>) -> Self {
        StartGroup {
            id: id.into(),
            ..StartGroup::default()
        }
    }
}

/// Opens a dependent section of a document, e.g. one file of a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartSubDocument {
    pub id: String,
    pub name: String,
    pub properties: PropertyMap,
    pub skeleton: Option<GenericSkeleton>,
}

impl StartSubDocument {
    pub fn new(id: impl Into<String>) -> Self {
        StartSubDocument {
            id: id.into(),
            ..StartSubDocument::default()
        }
    }
}

/// A non-extractable stretch of the document, carried as skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPart {
    pub id: String,
    /// True when the part is output through a skeleton reference instead of
    /// at its own position.
    pub referent: bool,
    pub properties: PropertyMap,
    pub skeleton: Option<GenericSkeleton>,
}

impl DocumentPart {
    pub fn new(id: impl Into<String>) -> Self {
        DocumentPart {
            id: id.into(),
            ..DocumentPart::default()
        }
    }
}

/// An extractable unit of text with its translations.
///
/// The source content is a [`TextFragment`]; target content is kept per
/// locale. [`Self::create_target`] seeds a missing target from the source so
/// steps can edit it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    pub id: String,
    /// Resource name from the original document, when it has one.
    pub name: Option<String>,
    /// Original element or record type, when the filter knows it.
    pub unit_type: Option<String>,
    pub translatable: bool,
    pub preserve_whitespace: bool,
    /// True when the unit is output through a skeleton reference instead of
    /// at its own position.
    pub referent: bool,
    pub source: TextFragment,
    pub targets: HashMap<LocaleId, TextFragment>,
    pub properties: PropertyMap,
    pub skeleton: Option<GenericSkeleton>,
}

impl TextUnit {
    pub fn new(id: impl Into<String>) -> Self {
        TextUnit {
            id: id.into(),
            name: None,
            unit_type: None,
            translatable: true,
            preserve_whitespace: false,
            referent: false,
            source: TextFragment::new(),
            targets: HashMap::new(),
            properties: PropertyMap::new(),
            skeleton: None,
        }
    }

    /// Creates a unit whose source is already filled in.
    pub fn with_source(id: impl Into<String>, source: impl Into<TextFragment>) -> Self {
        let mut unit = TextUnit::new(id);
        unit.source = source.into();
        unit
    }

    pub fn has_target(&self, locale: &LocaleId) -> bool {
        self.targets.contains_key(locale)
    }

    pub fn target(&self, locale: &LocaleId) -> Option<&TextFragment> {
        self.targets.get(locale)
    }

    pub fn target_mut(&mut self, locale: &LocaleId) -> Option<&mut TextFragment> {
        self.targets.get_mut(locale)
    }

    pub fn set_target(&mut self, locale: LocaleId, target: TextFragment) {
        self.targets.insert(locale, target);
    }

    /// Returns the target for `locale`, creating it as a copy of the source
    /// when missing. With `overwrite` set, an existing target is replaced by
    /// a fresh copy of the source.
    pub fn create_target(&mut self, locale: &LocaleId, overwrite: bool) -> &mut TextFragment {
        if overwrite || !self.targets.contains_key(locale) {
            self.targets.insert(locale.clone(), self.source.clone());
        }
        // Present by now in either branch.
        self.targets
            .entry(locale.clone())
            .or_insert_with(TextFragment::new)
    }
}

/// Where a raw document's content lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawInput {
    Path(PathBuf),
    Text(String),
    Bytes(Vec<u8>),
}

/// An unparsed input document plus what a filter needs to parse it: the
/// declared encoding and the locales to extract for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub input: RawInput,
    /// Encoding label, e.g. `UTF-8` or `windows-1252`. A byte order mark in
    /// the content overrides it.
    pub encoding: String,
    pub source_locale: LocaleId,
    pub target_locale: Option<LocaleId>,
}

impl RawDocument {
    pub fn from_path(
        path: impl Into<PathBuf>,
        encoding: impl Into<String>,
        source_locale: LocaleId,
    ) -> Self {
        RawDocument {
            id: String::new(),
            input: RawInput::Path(path.into()),
            encoding: encoding.into(),
            source_locale,
            target_locale: None,
        }
    }

    pub fn from_text(text: impl Into<String>, source_locale: LocaleId) -> Self {
        RawDocument {
            id: String::new(),
            input: RawInput::Text(text.into()),
            encoding: "UTF-8".to_string(),
            source_locale,
            target_locale: None,
        }
    }

    pub fn from_bytes(
        bytes: Vec<u8>,
        encoding: impl Into<String>,
        source_locale: LocaleId,
    ) -> Self {
        RawDocument {
            id: String::new(),
            input: RawInput::Bytes(bytes),
            encoding: encoding.into(),
            source_locale,
            target_locale: None,
        }
    }

    pub fn with_target_locale(mut self, locale: LocaleId) -> Self {
        self.target_locale = Some(locale);
        self
    }

    fn declared_encoding(&self) -> Result<&'static Encoding> {
        Encoding::for_label(self.encoding.as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(self.encoding.clone()))
    }

    /// A reader that yields the content decoded to UTF-8, honoring a byte
    /// order mark over the declared encoding.
    pub fn decoded_reader(&self) -> Result<Box<dyn Read + '_>> {
        match &self.input {
            RawInput::Text(text) => Ok(Box::new(Cursor::new(text.as_bytes()))),
            RawInput::Bytes(bytes) => {
                let encoding = self.declared_encoding()?;
                Ok(Box::new(
                    DecodeReaderBytesBuilder::new()
                        .encoding(Some(encoding))
                        .bom_override(true)
                        .build(Cursor::new(bytes.as_slice())),
                ))
            }
            RawInput::Path(path) => {
                let encoding = self.declared_encoding()?;
                let file = File::open(path)?;
                Ok(Box::new(
                    DecodeReaderBytesBuilder::new()
                        .encoding(Some(encoding))
                        .bom_override(true)
                        .build(file),
                ))
            }
        }
    }

    /// Reads and decodes the whole content.
    pub fn read_to_string(&self) -> Result<String> {
        let mut out = String::new();
        self.decoded_reader()?.read_to_string(&mut out)?;
        Ok(out)
    }

    /// True when the content is UTF-8 and starts with a byte order mark.
    pub fn has_utf8_bom(&self) -> Result<bool> {
        const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
        let head = match &self.input {
            RawInput::Text(_) => return Ok(false),
            RawInput::Bytes(bytes) => {
                let mut head = [0u8; 3];
                let len = bytes.len().min(3);
                head[..len].copy_from_slice(&bytes[..len]);
                head
            }
            RawInput::Path(path) => {
                let mut head = [0u8; 3];
                let mut file = File::open(path)?;
                let mut filled = 0;
                while filled < head.len() {
                    let n = file.read(&mut head[filled..])?;
                    if n == 0 {
                        break;
                    }
                    filled += n;
                }
                head
            }
        };
        Ok(head == BOM && self.declared_encoding()? == UTF_8)
    }
}

/// The line break convention of a text, from its first line break. Defaults
/// to `\n` when the text has none.
pub fn detect_line_break(text: &str) -> &'static str {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                return if chars.peek() == Some(&'\n') { "\r\n" } else { "\r" };
            }
            '\n' => return "\n",
            _ => {}
        }
    }
    "\n"
}
