//! The events that flow between filters, pipeline steps and writers.
//!
//! A filter turns a document into an ordered stream of [`Event`]s: batch and
//! document boundaries, extractable [`TextUnit`]s, skeleton-bearing
//! [`DocumentPart`]s and group markers. Steps transform the stream; a writer
//! at the end turns it back into a document. [`SequenceChecker`] validates
//! the structural rules a well-formed stream obeys.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::locale::LocaleId;
use crate::parameters::Parameters;
use crate::resource::{
    DocumentPart, Ending, RawDocument, Resource, StartDocument, StartGroup, StartSubDocument,
    TextUnit,
};

/// A group of events delivered as one, e.g. a step splitting a text unit.
///
/// With `propagate_as_single` unset, the pipeline expands the group and
/// sends each contained event through the remaining steps on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiEvent {
    pub id: String,
    pub events: Vec<Event>,
    pub propagate_as_single: bool,
}

impl MultiEvent {
    pub fn new() -> Self {
        MultiEvent::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl IntoIterator for MultiEvent {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// Runtime reconfiguration delivered through the stream: where to write the
/// output, in which encoding and for which locales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineParameters {
    pub id: String,
    pub output_path: Option<std::path::PathBuf>,
    pub output_encoding: Option<String>,
    pub source_locale: Option<LocaleId>,
    pub target_locale: Option<LocaleId>,
    pub filter_config: Option<String>,
    pub extra: Parameters,
}

impl PipelineParameters {
    pub fn new() -> Self {
        PipelineParameters::default()
    }
}

/// One unit of the extraction stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StartBatch,
    EndBatch,
    StartBatchItem,
    EndBatchItem,
    RawDocument(RawDocument),
    StartDocument(StartDocument),
    EndDocument(Ending),
    StartSubDocument(StartSubDocument),
    EndSubDocument(Ending),
    StartGroup(StartGroup),
    EndGroup(Ending),
    TextUnit(TextUnit),
    DocumentPart(DocumentPart),
    Multi(MultiEvent),
    Custom(Parameters),
    PipelineParameters(PipelineParameters),
    Canceled,
    NoOp,
}

/// The kind of an [`Event`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    StartBatch,
    EndBatch,
    StartBatchItem,
    EndBatchItem,
    RawDocument,
    StartDocument,
    EndDocument,
    StartSubDocument,
    EndSubDocument,
    StartGroup,
    EndGroup,
    TextUnit,
    DocumentPart,
    MultiEvent,
    Custom,
    PipelineParameters,
    Canceled,
    NoOp,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::StartBatch => "START_BATCH",
            EventKind::EndBatch => "END_BATCH",
            EventKind::StartBatchItem => "START_BATCH_ITEM",
            EventKind::EndBatchItem => "END_BATCH_ITEM",
            EventKind::RawDocument => "RAW_DOCUMENT",
            EventKind::StartDocument => "START_DOCUMENT",
            EventKind::EndDocument => "END_DOCUMENT",
            EventKind::StartSubDocument => "START_SUBDOCUMENT",
            EventKind::EndSubDocument => "END_SUBDOCUMENT",
            EventKind::StartGroup => "START_GROUP",
            EventKind::EndGroup => "END_GROUP",
            EventKind::TextUnit => "TEXT_UNIT",
            EventKind::DocumentPart => "DOCUMENT_PART",
            EventKind::MultiEvent => "MULTI_EVENT",
            EventKind::Custom => "CUSTOM",
            EventKind::PipelineParameters => "PIPELINE_PARAMETERS",
            EventKind::Canceled => "CANCELED",
            EventKind::NoOp => "NO_OP",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StartBatch => EventKind::StartBatch,
            Event::EndBatch => EventKind::EndBatch,
            Event::StartBatchItem => EventKind::StartBatchItem,
            Event::EndBatchItem => EventKind::EndBatchItem,
            Event::RawDocument(_) => EventKind::RawDocument,
            Event::StartDocument(_) => EventKind::StartDocument,
            Event::EndDocument(_) => EventKind::EndDocument,
            Event::StartSubDocument(_) => EventKind::StartSubDocument,
            Event::EndSubDocument(_) => EventKind::EndSubDocument,
            Event::StartGroup(_) => EventKind::StartGroup,
            Event::EndGroup(_) => EventKind::EndGroup,
            Event::TextUnit(_) => EventKind::TextUnit,
            Event::DocumentPart(_) => EventKind::DocumentPart,
            Event::Multi(_) => EventKind::MultiEvent,
            Event::Custom(_) => EventKind::Custom,
            Event::PipelineParameters(_) => EventKind::PipelineParameters,
            Event::Canceled => EventKind::Canceled,
            Event::NoOp => EventKind::NoOp,
        }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, Event::NoOp)
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Event::Canceled)
    }

    pub fn is_text_unit(&self) -> bool {
        matches!(self, Event::TextUnit(_))
    }

    /// The text unit payload.
    ///
    /// # Panics
    ///
    /// Panics when the event is not a `TextUnit`; use
    /// [`Self::as_text_unit`] when the kind is not known.
    pub fn text_unit(&self) -> &TextUnit {
        match self {
            Event::TextUnit(unit) => unit,
            other => panic!("expected TEXT_UNIT, found {}", other.kind()),
        }
    }

    pub fn as_text_unit(&self) -> Option<&TextUnit> {
        match self {
            Event::TextUnit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn as_text_unit_mut(&mut self) -> Option<&mut TextUnit> {
        match self {
            Event::TextUnit(unit) => Some(unit),
            _ => None,
        }
    }

    pub fn into_text_unit(self) -> Result<TextUnit> {
        match self {
            Event::TextUnit(unit) => Ok(unit),
            other => Err(Error::UnexpectedResource {
                expected: "TEXT_UNIT",
                found: other.kind().name(),
            }),
        }
    }

    pub fn as_start_document(&self) -> Option<&StartDocument> {
        match self {
            Event::StartDocument(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_start_document_mut(&mut self) -> Option<&mut StartDocument> {
        match self {
            Event::StartDocument(document) => Some(document),
            _ => None,
        }
    }

    pub fn into_start_document(self) -> Result<StartDocument> {
        match self {
            Event::StartDocument(document) => Ok(document),
            other => Err(Error::UnexpectedResource {
                expected: "START_DOCUMENT",
                found: other.kind().name(),
            }),
        }
    }

    pub fn into_raw_document(self) -> Result<RawDocument> {
        match self {
            Event::RawDocument(document) => Ok(document),
            other => Err(Error::UnexpectedResource {
                expected: "RAW_DOCUMENT",
                found: other.kind().name(),
            }),
        }
    }

    /// The payload as a [`Resource`], for the event kinds that carry one.
    pub fn resource(&self) -> Option<&dyn Resource> {
        match self {
            Event::StartDocument(r) => Some(r),
            Event::EndDocument(r) => Some(r),
            Event::StartSubDocument(r) => Some(r),
            Event::EndSubDocument(r) => Some(r),
            Event::StartGroup(r) => Some(r),
            Event::EndGroup(r) => Some(r),
            Event::TextUnit(r) => Some(r),
            Event::DocumentPart(r) => Some(r),
            _ => None,
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Validates the structural rules of an event stream: one document per
/// stream, balanced group and sub-document markers, content only inside an
/// open document.
///
/// Feed every event to [`Self::check`] and call [`Self::finish`] at the end
/// of the stream.
#[derive(Debug, Default)]
pub struct SequenceChecker {
    document_open: bool,
    completed: bool,
    group_depth: usize,
    subdoc_depth: usize,
}

impl SequenceChecker {
    pub fn new() -> Self {
        SequenceChecker::default()
    }

    pub fn check(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::StartDocument(_) => {
                if self.document_open {
                    return Err(Error::structure("START_DOCUMENT while a document is open"));
                }
                if self.completed {
                    return Err(Error::structure("START_DOCUMENT after the document completed"));
                }
                self.document_open = true;
            }
            Event::EndDocument(_) => {
                if !self.document_open {
                    return Err(Error::structure("END_DOCUMENT without an open document"));
                }
                if self.group_depth > 0 {
                    return Err(Error::structure(format!(
                        "END_DOCUMENT with {} open group(s)",
                        self.group_depth
                    )));
                }
                if self.subdoc_depth > 0 {
                    return Err(Error::structure(format!(
                        "END_DOCUMENT with {} open sub-document(s)",
                        self.subdoc_depth
                    )));
                }
                self.document_open = false;
                self.completed = true;
            }
            Event::StartSubDocument(_) => {
                self.require_open(event)?;
                self.subdoc_depth += 1;
            }
            Event::EndSubDocument(_) => {
                self.require_open(event)?;
                if self.subdoc_depth == 0 {
                    return Err(Error::structure("END_SUBDOCUMENT without a matching start"));
                }
                self.subdoc_depth -= 1;
            }
            Event::StartGroup(_) => {
                self.require_open(event)?;
                self.group_depth += 1;
            }
            Event::EndGroup(_) => {
                self.require_open(event)?;
                if self.group_depth == 0 {
                    return Err(Error::structure("END_GROUP without a matching START_GROUP"));
                }
                self.group_depth -= 1;
            }
            Event::TextUnit(_) | Event::DocumentPart(_) => {
                self.require_open(event)?;
            }
            Event::Multi(multi) => {
                for sub in multi.iter() {
                    self.check(sub)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Call once the stream is exhausted.
    pub fn finish(&self) -> Result<()> {
        if self.document_open {
            return Err(Error::structure("stream ended without END_DOCUMENT"));
        }
        Ok(())
    }

    fn require_open(&self, event: &Event) -> Result<()> {
        if !self.document_open {
            return Err(Error::structure(format!(
                "{} outside an open document",
                event.kind()
            )));
        }
        Ok(())
    }
}
