//! Event-driven localization extraction and merge framework.
//!
//! Documents are broken into a stream of [`Event`]s by a format [`Filter`]:
//! the translatable text lands in [`TextUnit`] resources as coded text,
//! everything else travels as skeleton. A [`Pipeline`] drives the stream
//! through processing steps, and a [`FilterWriter`] at the end turns it
//! back into a document, so an unmodified stream reproduces the original
//! file byte for byte.
//!
//! # Coded text
//!
//! Inline markup is carried out-of-band: each code occupies two reserved
//! characters in the text and a record in a parallel list, which keeps the
//! translatable text clean while preserving the original tags.
//!
//! ```rust
//! use locflow::fragment::{TagType, TextFragment};
//!
//! let mut fragment = TextFragment::new();
//! fragment.append_text("Hello ");
//! fragment.append_code(TagType::Opening, "b", "<b>");
//! fragment.append_text("world");
//! fragment.append_code(TagType::Closing, "b", "</b>");
//! fragment.append_text("!");
//!
//! assert_eq!(fragment.to_string(), "Hello <b>world</b>!");
//! assert_eq!(fragment.plain_text(), "Hello world!");
//! ```
//!
//! # Pipelines
//!
//! Steps are chained in a [`Pipeline`] and batches are run item by item:
//!
//! ```rust,no_run
//! use locflow::pipeline::Pipeline;
//! use locflow::resource::RawDocument;
//! use locflow::locale::LocaleId;
//!
//! # fn build_steps(_p: &mut Pipeline) {}
//! # fn main() -> locflow::Result<()> {
//! let mut pipeline = Pipeline::new();
//! build_steps(&mut pipeline);
//!
//! pipeline.start_batch()?;
//! let input = RawDocument::from_path("strings.txt", "UTF-8", LocaleId::new("en")?);
//! pipeline.process_raw_document(input)?;
//! pipeline.end_batch()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod fragment;
pub mod locale;
pub mod parameters;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod resource;
pub mod skeleton;
pub mod steps;
pub mod traits;
pub mod writer;

// Re-export the types most code touches.
pub use crate::{
    error::{Error, Result},
    event::{Event, EventKind, MultiEvent, PipelineParameters, SequenceChecker},
    fragment::{Code, TagType, TextFragment},
    locale::LocaleId,
    parameters::Parameters,
    pipeline::{Pipeline, PipelineState},
    registry::FilterRegistry,
    resource::{
        DocumentPart, Ending, Property, PropertyMap, RawDocument, RawInput, Resource,
        StartDocument, StartGroup, StartSubDocument, TextUnit,
    },
    skeleton::{GenericSkeleton, SkeletonPart},
    steps::{FilterStep, WriterStep},
    traits::{Filter, FilterWriter, Observer, PipelineStep},
    writer::{GenericFilterWriter, LineBreak, SkeletonWriter},
};
