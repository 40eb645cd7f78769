//! Skeleton storage for the non-extractable parts of a document.
//!
//! A filter that generates skeleton attaches a [`GenericSkeleton`] to each
//! resource it sends. The skeleton holds the surrounding markup verbatim,
//! plus placeholders for the pieces that are produced at write time: the
//! text content of the owning resource, a property value, or another
//! resource referenced by id. The writer walks the parts in order and
//! resolves each placeholder against the output locale and parameters, so
//! re-emitting every event reproduces the original file.

use serde::{Deserialize, Serialize};

use crate::locale::LocaleId;

/// One ordered piece of a skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkeletonPart {
    /// Verbatim output data.
    Data(String),
    /// The text content of the owning resource, for the given locale or the
    /// output default when `None`.
    ContentPlaceholder { locale: Option<LocaleId> },
    /// The value of a property of the owning resource.
    ValuePlaceholder {
        property: String,
        locale: Option<LocaleId>,
    },
    /// The output of another resource, referenced by id.
    Reference { resource_id: String },
}

/// An ordered list of skeleton parts.
///
/// Consecutive [`Self::append`] calls grow the current data part;
/// [`Self::add`] and every placeholder start a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericSkeleton {
    parts: Vec<SkeletonPart>,
    fresh_part: bool,
}

impl GenericSkeleton {
    pub fn new() -> Self {
        GenericSkeleton::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[SkeletonPart] {
        &self.parts
    }

    /// Starts a new data part.
    pub fn add(&mut self, data: impl Into<String>) {
        self.parts.push(SkeletonPart::Data(data.into()));
        self.fresh_part = false;
    }

    /// Extends the current data part, or starts one after a placeholder.
    pub fn append(&mut self, data: &str) {
        if !self.fresh_part {
            if let Some(SkeletonPart::Data(current)) = self.parts.last_mut() {
                current.push_str(data);
                return;
            }
        }
        self.add(data);
    }

    /// Marks where the owning resource's content goes in the output.
    pub fn add_content_placeholder(&mut self, locale: Option<LocaleId>) {
        self.parts.push(SkeletonPart::ContentPlaceholder { locale });
        self.fresh_part = true;
    }

    /// Marks where a property value of the owning resource goes.
    pub fn add_value_placeholder(&mut self, property: impl Into<String>, locale: Option<LocaleId>) {
        self.parts.push(SkeletonPart::ValuePlaceholder {
            property: property.into(),
            locale,
        });
        self.fresh_part = true;
    }

    /// Marks where the referenced resource's output goes.
    pub fn add_reference(&mut self, resource_id: impl Into<String>) {
        self.parts.push(SkeletonPart::Reference {
            resource_id: resource_id.into(),
        });
        self.fresh_part = true;
    }
}

impl From<&str> for GenericSkeleton {
    fn from(data: &str) -> Self {
        let mut skeleton = GenericSkeleton::new();
        skeleton.add(data);
        skeleton
    }
}
