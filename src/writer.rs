//! Skeleton-driven output: turning an event stream back into a document.
//!
//! [`SkeletonWriter`] resolves the skeleton parts attached to resources into
//! output text, filling content and value placeholders for the requested
//! output locale and chasing cross-resource references. On top of it,
//! [`GenericFilterWriter`] implements [`FilterWriter`]: it opens the output
//! on `START_DOCUMENT`, encodes the resolved text, and closes on
//! `END_DOCUMENT`. Re-emitting an unmodified stream reproduces the original
//! document byte for byte.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use lazy_static::lazy_static;
use regex::Regex;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::event::Event;
use crate::locale::LocaleId;
use crate::resource::{
    DocumentPart, Ending, PropertyMap, StartDocument, StartGroup, StartSubDocument, TextUnit,
};
use crate::skeleton::{GenericSkeleton, SkeletonPart};
use crate::traits::FilterWriter;

lazy_static! {
    static ref LINE_BREAKS: Regex = Regex::new(r"\r\n|\r|\n").unwrap();
}

/// An output line break convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBreak {
    Lf,
    CrLf,
    Cr,
}

impl LineBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineBreak::Lf => "\n",
            LineBreak::CrLf => "\r\n",
            LineBreak::Cr => "\r",
        }
    }
}

/// Rewrites every line break in `text` to the given convention.
pub fn normalize_line_breaks(text: &str, line_break: &str) -> String {
    LINE_BREAKS.replace_all(text, line_break).into_owned()
}

/// A resource that was announced as a referent and is waiting to be written
/// through a skeleton reference.
#[derive(Debug, Clone)]
enum Referent {
    Unit(TextUnit),
    Part(DocumentPart),
    Group(StartGroup),
}

/// The resource a skeleton belongs to, for placeholder resolution.
enum Owner<'a> {
    Document(&'a StartDocument),
    SubDocument(&'a StartSubDocument),
    Group(&'a StartGroup),
    Unit(&'a TextUnit),
    Part(&'a DocumentPart),
    End(&'a Ending),
}

impl Owner<'_> {
    fn id(&self) -> &str {
        match self {
            Owner::Document(r) => &r.id,
            Owner::SubDocument(r) => &r.id,
            Owner::Group(r) => &r.id,
            Owner::Unit(r) => &r.id,
            Owner::Part(r) => &r.id,
            Owner::End(r) => &r.id,
        }
    }

    fn properties(&self) -> &PropertyMap {
        match self {
            Owner::Document(r) => &r.properties,
            Owner::SubDocument(r) => &r.properties,
            Owner::Group(r) => &r.properties,
            Owner::Unit(r) => &r.properties,
            Owner::Part(r) => &r.properties,
            Owner::End(r) => &r.properties,
        }
    }
}

/// Resolves resource skeletons into output text.
///
/// Referent resources are held back when announced and consumed when a
/// skeleton reference names them; consuming them keeps reference chains
/// finite, so a second reference to the same id is an error.
#[derive(Debug, Default)]
pub struct SkeletonWriter {
    output_locale: Option<LocaleId>,
    output_encoding: String,
    document_locale: Option<LocaleId>,
    referents: HashMap<String, Referent>,
}

impl SkeletonWriter {
    pub fn new() -> Self {
        SkeletonWriter::default()
    }

    /// Starts a document: remembers the output options and drops any
    /// referents left over from a previous document.
    pub fn process_start_document(
        &mut self,
        locale: Option<LocaleId>,
        encoding: &str,
        resource: &StartDocument,
    ) -> Result<String> {
        self.output_locale = locale;
        self.output_encoding = encoding.to_string();
        self.document_locale = Some(resource.locale.clone());
        self.referents.clear();
        self.resolve_optional(resource.skeleton.as_ref(), &Owner::Document(resource))
    }

    pub fn process_end_document(&mut self, resource: &Ending) -> Result<String> {
        self.resolve_optional(resource.skeleton.as_ref(), &Owner::End(resource))
    }

    pub fn process_start_sub_document(&mut self, resource: &StartSubDocument) -> Result<String> {
        self.resolve_optional(resource.skeleton.as_ref(), &Owner::SubDocument(resource))
    }

    pub fn process_end_sub_document(&mut self, resource: &Ending) -> Result<String> {
        self.resolve_optional(resource.skeleton.as_ref(), &Owner::End(resource))
    }

    pub fn process_start_group(&mut self, resource: &StartGroup) -> Result<String> {
        if resource.referent {
            self.referents
                .insert(resource.id.clone(), Referent::Group(resource.clone()));
            return Ok(String::new());
        }
        self.resolve_optional(resource.skeleton.as_ref(), &Owner::Group(resource))
    }

    pub fn process_end_group(&mut self, resource: &Ending) -> Result<String> {
        self.resolve_optional(resource.skeleton.as_ref(), &Owner::End(resource))
    }

    /// A text unit resolves to its skeleton when it has one, else directly
    /// to its content. Referent units produce nothing here and are written
    /// where a reference names them.
    pub fn process_text_unit(&mut self, resource: &TextUnit) -> Result<String> {
        if resource.referent {
            self.referents
                .insert(resource.id.clone(), Referent::Unit(resource.clone()));
            return Ok(String::new());
        }
        match resource.skeleton.as_ref() {
            Some(skeleton) => self.resolve_skeleton(skeleton, &Owner::Unit(resource)),
            None => Ok(self.content_text(&Owner::Unit(resource), None)),
        }
    }

    pub fn process_document_part(&mut self, resource: &DocumentPart) -> Result<String> {
        if resource.referent {
            self.referents
                .insert(resource.id.clone(), Referent::Part(resource.clone()));
            return Ok(String::new());
        }
        self.resolve_optional(resource.skeleton.as_ref(), &Owner::Part(resource))
    }

    fn resolve_optional(
        &mut self,
        skeleton: Option<&GenericSkeleton>,
        owner: &Owner<'_>,
    ) -> Result<String> {
        match skeleton {
            Some(skeleton) => self.resolve_skeleton(skeleton, owner),
            None => Ok(String::new()),
        }
    }

    fn resolve_skeleton(&mut self, skeleton: &GenericSkeleton, owner: &Owner<'_>) -> Result<String> {
        let mut out = String::new();
        for part in skeleton.parts() {
            match part {
                SkeletonPart::Data(data) => out.push_str(data),
                SkeletonPart::ContentPlaceholder { locale } => {
                    out.push_str(&self.content_text(owner, locale.as_ref()));
                }
                SkeletonPart::ValuePlaceholder { property, locale } => {
                    out.push_str(&self.property_value(owner, property, locale.as_ref()));
                }
                SkeletonPart::Reference { resource_id } => {
                    out.push_str(&self.resolve_reference(resource_id)?);
                }
            }
        }
        Ok(out)
    }

    /// The text a content placeholder stands for: the source content, or
    /// the target for the effective locale with the source as fallback.
    fn content_text(&self, owner: &Owner<'_>, locale: Option<&LocaleId>) -> String {
        let Owner::Unit(unit) = owner else {
            log::warn!(
                "content placeholder on resource `{}` which has no content",
                owner.id()
            );
            return String::new();
        };
        let effective = locale.or(self.output_locale.as_ref());
        let fragment = match effective {
            None => &unit.source,
            Some(locale) => unit.target(locale).unwrap_or(&unit.source),
        };
        fragment.native_text()
    }

    fn property_value(&self, owner: &Owner<'_>, name: &str, locale: Option<&LocaleId>) -> String {
        // The encoding and language pseudo-properties reflect the output
        // options rather than anything stored on the resource.
        match name {
            "encoding" => return self.output_encoding.clone(),
            "language" => {
                return locale
                    .or(self.output_locale.as_ref())
                    .or(self.document_locale.as_ref())
                    .map(LocaleId::to_string)
                    .unwrap_or_default();
            }
            _ => {}
        }
        match owner.properties().value(name) {
            Some(value) => value.to_string(),
            None => {
                log::warn!("no property `{}` on resource `{}`", name, owner.id());
                String::new()
            }
        }
    }

    fn resolve_reference(&mut self, resource_id: &str) -> Result<String> {
        let referent = self
            .referents
            .remove(resource_id)
            .ok_or_else(|| Error::MissingReferent(resource_id.to_string()))?;
        match referent {
            Referent::Unit(unit) => match unit.skeleton.as_ref() {
                Some(skeleton) => self.resolve_skeleton(skeleton, &Owner::Unit(&unit)),
                None => Ok(self.content_text(&Owner::Unit(&unit), None)),
            },
            Referent::Part(part) => {
                self.resolve_optional(part.skeleton.as_ref(), &Owner::Part(&part))
            }
            Referent::Group(group) => {
                self.resolve_optional(group.skeleton.as_ref(), &Owner::Group(&group))
            }
        }
    }
}

/// How the resolved text is encoded into output bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncodeMode {
    Utf8,
    Utf16Le,
    Utf16Be,
    Legacy(&'static Encoding),
}

fn encode_mode(label: &str) -> Result<EncodeMode> {
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
    Ok(if encoding == UTF_8 {
        EncodeMode::Utf8
    } else if encoding == UTF_16LE {
        EncodeMode::Utf16Le
    } else if encoding == UTF_16BE {
        EncodeMode::Utf16Be
    } else {
        EncodeMode::Legacy(encoding)
    })
}

enum Destination {
    Direct { file: File, path: PathBuf },
    Temp { file: NamedTempFile, path: PathBuf },
    Stream(Box<dyn Write + Send>),
    Buffer(Vec<u8>),
}

impl Destination {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Destination::Direct { file, .. } => file,
            Destination::Temp { file, .. } => file,
            Destination::Stream(stream) => stream.as_mut(),
            Destination::Buffer(bytes) => bytes,
        }
    }
}

struct Sink {
    destination: Destination,
    mode: EncodeMode,
    encoding_label: String,
}

/// Where the writer sends its bytes before a document opens.
enum OutputTarget {
    Path(PathBuf),
    Stream(Box<dyn Write + Send>),
    Buffer,
}

/// A [`FilterWriter`] that re-creates the original document format from the
/// skeleton attached to the stream, for any filter that produces
/// [`GenericSkeleton`] resources.
///
/// By default the output is collected in memory and retrieved with
/// [`Self::take_buffer`]; [`FilterWriter::set_output_path`] and
/// [`FilterWriter::set_output_stream`] redirect it.
pub struct GenericFilterWriter {
    skeleton_writer: SkeletonWriter,
    target: OutputTarget,
    locale: Option<LocaleId>,
    encoding: Option<String>,
    line_break: Option<LineBreak>,
    sink: Option<Sink>,
    buffer: Option<Vec<u8>>,
}

impl GenericFilterWriter {
    pub fn new() -> Self {
        GenericFilterWriter {
            skeleton_writer: SkeletonWriter::new(),
            target: OutputTarget::Buffer,
            locale: None,
            encoding: None,
            line_break: None,
            sink: None,
            buffer: None,
        }
    }

    /// Forces every line break of the output to one convention. Without an
    /// override the skeleton's original line breaks pass through untouched.
    pub fn set_line_break(&mut self, line_break: LineBreak) {
        self.line_break = Some(line_break);
    }

    /// The collected output, when writing to the in-memory buffer. Empty
    /// before [`FilterWriter::close`] runs.
    pub fn take_buffer(&mut self) -> Option<Vec<u8>> {
        self.buffer.take()
    }

    fn open_document(&mut self, resource: &StartDocument) -> Result<()> {
        let encoding_label = match &self.encoding {
            Some(label) => label.clone(),
            None => resource.encoding.clone(),
        };
        let mode = encode_mode(&encoding_label)?;

        // The stream target is one-shot; path and buffer targets can open
        // further documents.
        let destination = match std::mem::replace(&mut self.target, OutputTarget::Buffer) {
            OutputTarget::Buffer => Destination::Buffer(Vec::new()),
            OutputTarget::Stream(stream) => Destination::Stream(stream),
            OutputTarget::Path(path) => {
                let destination = open_output_file(&path)?;
                self.target = OutputTarget::Path(path);
                destination
            }
        };
        let mut sink = Sink {
            destination,
            mode,
            encoding_label,
        };

        // A UTF-8 byte order mark is kept only when the original document
        // had one; UTF-16 output always leads with one.
        match sink.mode {
            EncodeMode::Utf8 if resource.has_utf8_bom => {
                sink.destination.writer().write_all(&[0xEF, 0xBB, 0xBF])?;
            }
            EncodeMode::Utf16Le => sink.destination.writer().write_all(&[0xFF, 0xFE])?,
            EncodeMode::Utf16Be => sink.destination.writer().write_all(&[0xFE, 0xFF])?,
            _ => {}
        }
        self.sink = Some(sink);

        let text = self.skeleton_writer.process_start_document(
            self.locale.clone(),
            match &self.encoding {
                Some(label) => label,
                None => &resource.encoding,
            },
            resource,
        )?;
        self.write_text(&text)
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let normalized;
        let text = match self.line_break {
            Some(line_break) => {
                normalized = normalize_line_breaks(text, line_break.as_str());
                normalized.as_str()
            }
            None => text,
        };
        let Some(sink) = self.sink.as_mut() else {
            return Err(Error::filter("output written before START_DOCUMENT"));
        };
        match sink.mode {
            EncodeMode::Utf8 => sink.destination.writer().write_all(text.as_bytes())?,
            EncodeMode::Utf16Le => {
                let writer = sink.destination.writer();
                for unit in text.encode_utf16() {
                    writer.write_all(&unit.to_le_bytes())?;
                }
            }
            EncodeMode::Utf16Be => {
                let writer = sink.destination.writer();
                for unit in text.encode_utf16() {
                    writer.write_all(&unit.to_be_bytes())?;
                }
            }
            EncodeMode::Legacy(encoding) => {
                let (bytes, _, had_unmappable) = encoding.encode(text);
                if had_unmappable {
                    log::warn!(
                        "characters not representable in {} were written as character references",
                        sink.encoding_label
                    );
                }
                sink.destination.writer().write_all(&bytes)?;
            }
        }
        Ok(())
    }
}

impl Default for GenericFilterWriter {
    fn default() -> Self {
        GenericFilterWriter::new()
    }
}

fn open_output_file(path: &Path) -> Result<Destination> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() && fs::remove_file(path).is_err() {
        // The destination may still be held open by the reading side; write
        // to a sibling temporary file and copy over it at close.
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file = NamedTempFile::new_in(dir)?;
        return Ok(Destination::Temp {
            file,
            path: path.to_path_buf(),
        });
    }
    Ok(Destination::Direct {
        file: File::create(path)?,
        path: path.to_path_buf(),
    })
}

impl FilterWriter for GenericFilterWriter {
    fn name(&self) -> &str {
        "generic"
    }

    fn set_output_path(&mut self, path: &Path) {
        self.target = OutputTarget::Path(path.to_path_buf());
    }

    fn set_output_stream(&mut self, stream: Box<dyn Write + Send>) {
        self.target = OutputTarget::Stream(stream);
    }

    fn set_options(&mut self, locale: Option<LocaleId>, encoding: Option<&str>) {
        if locale.is_some() {
            self.locale = locale;
        }
        if let Some(encoding) = encoding {
            self.encoding = Some(encoding.to_string());
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<Event> {
        match &event {
            Event::StartDocument(resource) => self.open_document(resource)?,
            Event::EndDocument(resource) => {
                let text = self.skeleton_writer.process_end_document(resource)?;
                self.write_text(&text)?;
                self.close()?;
            }
            Event::StartSubDocument(resource) => {
                let text = self.skeleton_writer.process_start_sub_document(resource)?;
                self.write_text(&text)?;
            }
            Event::EndSubDocument(resource) => {
                let text = self.skeleton_writer.process_end_sub_document(resource)?;
                self.write_text(&text)?;
            }
            Event::StartGroup(resource) => {
                let text = self.skeleton_writer.process_start_group(resource)?;
                self.write_text(&text)?;
            }
            Event::EndGroup(resource) => {
                let text = self.skeleton_writer.process_end_group(resource)?;
                self.write_text(&text)?;
            }
            Event::TextUnit(resource) => {
                let text = self.skeleton_writer.process_text_unit(resource)?;
                self.write_text(&text)?;
            }
            Event::DocumentPart(resource) => {
                let text = self.skeleton_writer.process_document_part(resource)?;
                self.write_text(&text)?;
            }
            Event::Multi(multi) => {
                // Groups the pipeline left intact are written out event by
                // event.
                for sub in multi.iter() {
                    self.handle_event(sub.clone())?;
                }
            }
            Event::Canceled => self.cancel(),
            _ => {}
        }
        Ok(event)
    }

    fn close(&mut self) -> Result<()> {
        let Some(sink) = self.sink.take() else {
            return Ok(());
        };
        match sink.destination {
            Destination::Direct { mut file, .. } => file.flush()?,
            Destination::Temp { mut file, path } => {
                file.flush()?;
                fs::copy(file.path(), &path)?;
                if let Err(error) = file.close() {
                    log::warn!("could not remove temporary output file: {error}");
                }
            }
            Destination::Stream(mut stream) => stream.flush()?,
            Destination::Buffer(bytes) => self.buffer = Some(bytes),
        }
        Ok(())
    }

    fn cancel(&mut self) {
        let Some(sink) = self.sink.take() else {
            return;
        };
        match sink.destination {
            Destination::Direct { file, path } => {
                drop(file);
                if let Err(error) = fs::remove_file(&path) {
                    log::warn!("could not remove cancelled output {}: {error}", path.display());
                }
            }
            // Dropping the temporary file removes it.
            Destination::Temp { .. } => {}
            Destination::Stream(_) => {}
            Destination::Buffer(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::TextFragment;
    use crate::resource::Property;

    fn locale(tag: &str) -> LocaleId {
        LocaleId::new(tag).unwrap()
    }

    fn skeleton_unit(id: &str, before: &str, source: &str, after: &str) -> TextUnit {
        let mut unit = TextUnit::with_source(id, source);
        let mut skeleton = GenericSkeleton::new();
        skeleton.add(before);
        skeleton.add_content_placeholder(None);
        skeleton.append(after);
        unit.skeleton = Some(skeleton);
        unit
    }

    #[test]
    fn test_content_placeholder_uses_source_without_locale() {
        let mut writer = SkeletonWriter::new();
        writer
            .process_start_document(None, "UTF-8", &StartDocument::new("d1"))
            .unwrap();
        let unit = skeleton_unit("tu1", "msg=", "Hello", "\n");
        assert_eq!(writer.process_text_unit(&unit).unwrap(), "msg=Hello\n");
    }

    #[test]
    fn test_content_placeholder_prefers_target_with_fallback() {
        let mut writer = SkeletonWriter::new();
        writer
            .process_start_document(Some(locale("fr")), "UTF-8", &StartDocument::new("d1"))
            .unwrap();

        let mut unit = skeleton_unit("tu1", "msg=", "Hello", "\n");
        unit.set_target(locale("fr"), TextFragment::from("Bonjour"));
        assert_eq!(writer.process_text_unit(&unit).unwrap(), "msg=Bonjour\n");

        // No target for the output locale: the source is written.
        let unit = skeleton_unit("tu2", "msg=", "World", "\n");
        assert_eq!(writer.process_text_unit(&unit).unwrap(), "msg=World\n");
    }

    #[test]
    fn test_text_unit_without_skeleton_writes_content() {
        let mut writer = SkeletonWriter::new();
        writer
            .process_start_document(None, "UTF-8", &StartDocument::new("d1"))
            .unwrap();
        let unit = TextUnit::with_source("tu1", "plain");
        assert_eq!(writer.process_text_unit(&unit).unwrap(), "plain");
    }

    #[test]
    fn test_value_placeholder_resolves_property_and_builtins() {
        let mut writer = SkeletonWriter::new();
        writer
            .process_start_document(Some(locale("fr-CA")), "windows-1252", &StartDocument::new("d1"))
            .unwrap();

        let mut part = DocumentPart::new("dp1");
        part.properties.set(Property::new("version", "2.0"));
        let mut skeleton = GenericSkeleton::new();
        skeleton.add("version=");
        skeleton.add_value_placeholder("version", None);
        skeleton.append(" charset=");
        skeleton.add_value_placeholder("encoding", None);
        skeleton.append(" lang=");
        skeleton.add_value_placeholder("language", None);
        part.skeleton = Some(skeleton);

        assert_eq!(
            writer.process_document_part(&part).unwrap(),
            "version=2.0 charset=windows-1252 lang=fr-CA"
        );
    }

    #[test]
    fn test_missing_property_resolves_empty() {
        let mut writer = SkeletonWriter::new();
        writer
            .process_start_document(None, "UTF-8", &StartDocument::new("d1"))
            .unwrap();
        let mut part = DocumentPart::new("dp1");
        let mut skeleton = GenericSkeleton::new();
        skeleton.add_value_placeholder("nope", None);
        part.skeleton = Some(skeleton);
        assert_eq!(writer.process_document_part(&part).unwrap(), "");
    }

    #[test]
    fn test_reference_consumes_referent() {
        let mut writer = SkeletonWriter::new();
        writer
            .process_start_document(None, "UTF-8", &StartDocument::new("d1"))
            .unwrap();

        let mut referent = TextUnit::with_source("tu1", "referenced");
        referent.referent = true;
        assert_eq!(writer.process_text_unit(&referent).unwrap(), "");

        let mut part = DocumentPart::new("dp1");
        let mut skeleton = GenericSkeleton::new();
        skeleton.add("[");
        skeleton.add_reference("tu1");
        skeleton.append("]");
        part.skeleton = Some(skeleton);
        assert_eq!(writer.process_document_part(&part).unwrap(), "[referenced]");

        // Consumed: a second reference to the same id fails.
        let mut again = DocumentPart::new("dp2");
        let mut skeleton = GenericSkeleton::new();
        skeleton.add_reference("tu1");
        again.skeleton = Some(skeleton);
        assert!(matches!(
            writer.process_document_part(&again),
            Err(Error::MissingReferent(id)) if id == "tu1"
        ));
    }

    #[test]
    fn test_unknown_reference_is_an_error() {
        let mut writer = SkeletonWriter::new();
        writer
            .process_start_document(None, "UTF-8", &StartDocument::new("d1"))
            .unwrap();
        let mut part = DocumentPart::new("dp1");
        let mut skeleton = GenericSkeleton::new();
        skeleton.add_reference("ghost");
        part.skeleton = Some(skeleton);
        assert!(writer.process_document_part(&part).is_err());
    }

    fn buffer_of(writer: &mut GenericFilterWriter, events: Vec<Event>) -> Vec<u8> {
        for event in events {
            writer.handle_event(event).unwrap();
        }
        writer.take_buffer().unwrap_or_default()
    }

    fn simple_document(encoding: &str, has_utf8_bom: bool) -> Vec<Event> {
        let mut document = StartDocument::new("d1");
        document.encoding = encoding.to_string();
        document.has_utf8_bom = has_utf8_bom;
        vec![
            Event::StartDocument(document),
            Event::TextUnit(skeleton_unit("tu1", "greeting=", "Hello", "\n")),
            Event::EndDocument(Ending::new("d1")),
        ]
    }

    #[test]
    fn test_filter_writer_buffer_output() {
        let mut writer = GenericFilterWriter::new();
        let bytes = buffer_of(&mut writer, simple_document("UTF-8", false));
        assert_eq!(bytes, b"greeting=Hello\n");
    }

    #[test]
    fn test_utf8_bom_is_preserved() {
        let mut writer = GenericFilterWriter::new();
        let bytes = buffer_of(&mut writer, simple_document("UTF-8", true));
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"greeting=Hello\n");
    }

    #[test]
    fn test_utf16le_output_with_bom() {
        let mut writer = GenericFilterWriter::new();
        writer.set_options(None, Some("UTF-16LE"));
        let bytes = buffer_of(&mut writer, simple_document("UTF-8", false));
        assert_eq!(&bytes[..2], &[0xFF, 0xFE]);
        assert_eq!(&bytes[2..4], &[b'g', 0x00]);
        assert_eq!(bytes.len(), 2 + "greeting=Hello\n".len() * 2);
    }

    #[test]
    fn test_legacy_encoding_substitutes_character_references() {
        let mut writer = GenericFilterWriter::new();
        writer.set_options(None, Some("windows-1252"));
        let events = vec![
            Event::StartDocument(StartDocument::new("d1")),
            Event::TextUnit(TextUnit::with_source("tu1", "pi: \u{3C0}")),
            Event::EndDocument(Ending::new("d1")),
        ];
        let bytes = buffer_of(&mut writer, events);
        assert_eq!(bytes, b"pi: &#960;");
    }

    #[test]
    fn test_line_break_override() {
        let mut writer = GenericFilterWriter::new();
        writer.set_line_break(LineBreak::CrLf);
        let bytes = buffer_of(&mut writer, simple_document("UTF-8", false));
        assert_eq!(bytes, b"greeting=Hello\r\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut writer = GenericFilterWriter::new();
        for event in simple_document("UTF-8", false) {
            writer.handle_event(event).unwrap();
        }
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(writer.take_buffer().is_some());
    }

    #[test]
    fn test_normalize_line_breaks() {
        assert_eq!(normalize_line_breaks("a\r\nb\rc\nd", "\n"), "a\nb\nc\nd");
        assert_eq!(normalize_line_breaks("a\nb", "\r\n"), "a\r\nb");
    }
}
