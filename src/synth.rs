//! Placement of described fields into a document's form.


use std::collections::BTreeMap;
use std::fmt;

use lopdf::{Document, ObjectId};
use tracing::{debug, info, warn};

use crate::color::{self, ColorValue};
use crate::config::Config;
use crate::descriptor::FieldDescriptor;
use crate::field::{self, ColorAttribute, FieldKind};
use crate::geometry;
use crate::pdf::{self, FormLayer};


/// A condition that aborts the whole run.
#[derive(Debug)]
pub enum Error {
    PageIndexOutOfRange { index: usize, name: String, page: usize, page_count: usize },
    InvalidGeometry { index: usize, name: String, error: geometry::Error },
    UnsupportedFieldType { index: usize, name: String, error: field::Error },
    Pdf(pdf::Error),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageIndexOutOfRange { index, name, page, page_count }
                => write!(f, "descriptor {} ({:?}) refers to page index {} but the document has {} pages", index, name, page, page_count),
            Self::InvalidGeometry { index, name, error }
                => write!(f, "descriptor {} ({:?}) has an invalid position: {}", index, name, error),
            Self::UnsupportedFieldType { index, name, error }
                => write!(f, "descriptor {} ({:?}): {}", index, name, error),
            Self::Pdf(e)
                => write!(f, "failed to update the form: {}", e),
        }
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PageIndexOutOfRange { .. } => None,
            Self::InvalidGeometry { error, .. } => Some(error),
            Self::UnsupportedFieldType { error, .. } => Some(error),
            Self::Pdf(e) => Some(e),
        }
    }
}
impl From<pdf::Error> for Error {
    fn from(value: pdf::Error) -> Self { Self::Pdf(value) }
}


/// A color that could not be applied to a field; the attribute was left unstyled.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ColorWarning {
    pub index: usize,
    pub field_name: String,
    pub attribute: ColorAttribute,
    pub error: color::Error,
}
impl fmt::Display for ColorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot apply {} to field {:?}: {}", self.attribute, self.field_name, self.error)
    }
}


/// The outcome of a successful synthesis.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SynthesisReport {
    /// Names of the registered fields, in registration order.
    pub fields: Vec<String>,

    /// Field-scoped color problems encountered on the way.
    pub warnings: Vec<ColorWarning>,
}


/// Adds the fields described by a list of descriptors to a document.
pub struct FormSynthesizer<'c> {
    config: &'c Config,
}
impl<'c> FormSynthesizer<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Processes the descriptors in order, registering one field per descriptor.
    ///
    /// Color problems are recorded in the report and leave the affected attribute unstyled; every
    /// other problem aborts, in which case the document must not be saved. An empty descriptor list
    /// leaves the document untouched.
    pub fn synthesize(&self, doc: &mut Document, descriptors: &[FieldDescriptor]) -> Result<SynthesisReport, Error> {
        let mut report = SynthesisReport::default();
        if descriptors.is_empty() {
            info!("no field descriptors; leaving the form unchanged");
            return Ok(report);
        }

        let pages = doc.get_pages();
        let form = FormLayer::open(doc, &self.config.appearance)?;
        debug!("form is object {:?}", form.acroform_id());

        for (index, descriptor) in descriptors.iter().enumerate() {
            self.add_field(doc, &form, &pages, index, descriptor, &mut report)?;
        }

        info!("added {} fields ({} color warnings)", report.fields.len(), report.warnings.len());
        Ok(report)
    }

    fn add_field(
        &self,
        doc: &mut Document,
        form: &FormLayer,
        pages: &BTreeMap<u32, ObjectId>,
        index: usize,
        descriptor: &FieldDescriptor,
        report: &mut SynthesisReport,
    ) -> Result<(), Error> {
        // descriptors count pages from 0, the page tree from 1
        let page_id = descriptor.page.checked_add(1)
            .and_then(|number| u32::try_from(number).ok())
            .and_then(|number| pages.get(&number))
            .copied()
            .ok_or_else(|| Error::PageIndexOutOfRange {
                index,
                name: descriptor.name.clone(),
                page: descriptor.page,
                page_count: pages.len(),
            })?;
        debug!("descriptor {} ({:?}) goes on page object {:?}", index, descriptor.name, page_id);

        let rect = geometry::to_rectangle(&descriptor.position)
            .map_err(|error| Error::InvalidGeometry { index, name: descriptor.name.clone(), error })?;
        if let Some(media_box) = pdf::page_media_box(doc, page_id) {
            if !rect.is_within(media_box) {
                debug!("field {:?} extends beyond the media box {:?} of its page", descriptor.name, media_box);
            }
        }

        // an unknown kind gets no colors; creating the field reports it
        let attributes = descriptor.field_type.parse::<FieldKind>()
            .map(|kind| kind.color_attributes())
            .unwrap_or(&[]);
        let text_color = if attributes.contains(&ColorAttribute::Text) {
            self.resolve_color(index, descriptor, ColorAttribute::Text, report)
        } else {
            None
        };
        let background_color = if attributes.contains(&ColorAttribute::Background) {
            self.resolve_color(index, descriptor, ColorAttribute::Background, report)
        } else {
            None
        };

        let field = field::create(descriptor, rect, text_color, background_color)
            .map_err(|error| Error::UnsupportedFieldType { index, name: descriptor.name.clone(), error })?;

        let field_id = form.register(doc, page_id, &field)?;
        debug!("registered {} field {:?} as object {:?}", field.kind, field.name, field_id);
        report.fields.push(field.name);
        Ok(())
    }

    fn resolve_color(
        &self,
        index: usize,
        descriptor: &FieldDescriptor,
        attribute: ColorAttribute,
        report: &mut SynthesisReport,
    ) -> Option<ColorValue> {
        let (override_color, default_color) = match attribute {
            ColorAttribute::Text
                => (descriptor.text_color.as_deref(), self.config.default_text_color.as_deref()),
            ColorAttribute::Background
                => (descriptor.background_color.as_deref(), self.config.default_background_color.as_deref()),
        };
        match color::resolve(override_color, default_color) {
            Ok(resolved) => resolved,
            Err(error) => {
                let warning = ColorWarning {
                    index,
                    field_name: descriptor.name.clone(),
                    attribute,
                    error,
                };
                warn!("{}", warning);
                report.warnings.push(warning);
                None
            },
        }
    }
}
