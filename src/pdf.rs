//! Structures and procedures relevant to the interactive form layer of a Portable Document Format
//! file.


use std::fmt;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::color::ColorValue;
use crate::config::Appearance;
use crate::field::{FieldKind, Justification, SynthesizedField, Trigger};


/// Annotation flag: print the annotation when the page is printed.
const ANNOTATION_FLAG_PRINT: i64 = 1 << 2;

/// Field flag for text fields: the text may span multiple lines.
const FIELD_FLAG_MULTILINE: i64 = 1 << 12;

/// Resource name of the font used by variable text fields.
const TEXT_FONT: &str = "Helv";

/// Resource name of the font providing the check box glyph.
const SYMBOL_FONT: &str = "ZaDb";

/// The ZapfDingbats character drawn in a checked check box (a check mark).
const CHECK_MARK: &str = "4";

/// Appearance state name of a checked check box.
const CHECKED_STATE: &str = "Yes";

/// Appearance state name of an unchecked check box.
const UNCHECKED_STATE: &str = "Off";

/// Width of the check mark glyph in ZapfDingbats, in text space units.
const CHECK_MARK_WIDTH: f32 = 0.846;

/// Height of the check mark glyph in ZapfDingbats, in text space units.
const CHECK_MARK_HEIGHT: f32 = 0.705;

/// Share of the shorter box side taken up by the check mark.
const CHECK_MARK_SCALE: f32 = 0.8;

/// Guard against cyclic page trees when looking up inherited attributes.
const MAX_PAGE_TREE_DEPTH: usize = 64;


#[derive(Debug)]
pub enum Error {
    Pdf(lopdf::Error),
    MissingCatalog,
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf(e)
                => write!(f, "PDF error: {}", e),
            Self::MissingCatalog
                => write!(f, "document trailer does not reference a catalog"),
        }
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pdf(e) => Some(e),
            Self::MissingCatalog => None,
        }
    }
}
impl From<lopdf::Error> for Error {
    fn from(value: lopdf::Error) -> Self { Self::Pdf(value) }
}


/// Encodes a textual string as a PDF text string object.
///
/// Pure ASCII is stored as is; anything else is encoded in UTF-16BE with BOM, written out in
/// hexadecimal.
pub fn text_string(string: &str) -> Object {
    if string.is_ascii() {
        return Object::String(string.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = Vec::with_capacity(2 + 2*string.len());
    bytes.extend_from_slice(b"\xFE\xFF");
    for word in string.encode_utf16() {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}


/// Formats a number for use in a content stream fragment, without superfluous zeroes.
fn format_number(value: f32) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}


fn color_array(color: ColorValue) -> Object {
    let [r, g, b] = color.to_unit_components();
    Object::Array(vec![r.into(), g.into(), b.into()])
}


/// The default appearance string of a variable text field.
///
/// Without a text color, the format's default (black) is used.
pub fn text_appearance(font_size: f32, text_color: Option<ColorValue>) -> String {
    let color_operator = match text_color {
        Some(c) => {
            let [r, g, b] = c.to_unit_components();
            format!("{} {} {} rg", format_number(r), format_number(g), format_number(b))
        },
        None => "0 g".to_owned(),
    };
    format!("/{} {} Tf {}", TEXT_FONT, format_number(font_size), color_operator)
}


fn symbol_font() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "ZapfDingbats",
    }
}


/// Builds a form XObject of the field's size from the given content stream operators.
fn appearance_stream(field: &SynthesizedField, content: String, resources: Option<Dictionary>) -> Stream {
    let width = field.rect.width.get().abs();
    let height = field.rect.height.get().abs();
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "FormType" => 1,
        "BBox" => vec![0.into(), 0.into(), width.into(), height.into()],
    };
    if let Some(res) = resources {
        dict.set("Resources", res);
    }
    Stream::new(dict, content.into_bytes())
}


/// Operators filling the whole appearance with the field's background color, if it has one.
fn background_operators(field: &SynthesizedField) -> String {
    let Some(bg) = field.background_color else {
        return String::new();
    };
    let [r, g, b] = bg.to_unit_components();
    format!(
        "q {} {} {} rg 0 0 {} {} re f Q\n",
        format_number(r), format_number(g), format_number(b),
        format_number(field.rect.width.get().abs()), format_number(field.rect.height.get().abs()),
    )
}


/// Operators drawing the check mark centered in the field.
fn check_mark_operators(field: &SynthesizedField) -> String {
    let width = field.rect.width.get().abs();
    let height = field.rect.height.get().abs();
    let size = width.min(height) * CHECK_MARK_SCALE;
    let x = (width - size * CHECK_MARK_WIDTH) / 2.0;
    let y = (height - size * CHECK_MARK_HEIGHT) / 2.0;
    format!(
        "q BT 0 g /{} {} Tf {} {} Td ({}) Tj ET Q\n",
        SYMBOL_FONT, format_number(size), format_number(x), format_number(y), CHECK_MARK,
    )
}


/// Adds the normal appearance streams of the field to the document and returns the value of the
/// `/N` entry of its appearance dictionary.
///
/// Check boxes get one stream per state; all other kinds get a single stream showing the
/// background, which viewers replace once the field has a value.
fn add_normal_appearance(doc: &mut Document, field: &SynthesizedField) -> Object {
    match field.kind {
        FieldKind::CheckBox => {
            let checked = appearance_stream(
                field,
                format!("{}{}", background_operators(field), check_mark_operators(field)),
                Some(dictionary! { "Font" => dictionary! { SYMBOL_FONT => symbol_font() } }),
            );
            let unchecked = appearance_stream(field, background_operators(field), None);
            let checked_id = doc.add_object(checked);
            let unchecked_id = doc.add_object(unchecked);
            Object::Dictionary(dictionary! {
                CHECKED_STATE => Object::Reference(checked_id),
                UNCHECKED_STATE => Object::Reference(unchecked_id),
            })
        },
        FieldKind::Text|FieldKind::Date|FieldKind::Multiline|FieldKind::Signature => {
            let stream = appearance_stream(field, background_operators(field), None);
            Object::Reference(doc.add_object(stream))
        },
    }
}


fn trigger_key(trigger: Trigger) -> &'static str {
    match trigger {
        Trigger::FocusGained => "Fo",
        Trigger::Keystroke => "K",
        Trigger::Format => "F",
    }
}


fn javascript_action(javascript: &str) -> Dictionary {
    dictionary! {
        "Type" => "Action",
        "S" => "JavaScript",
        "JS" => Object::string_literal(javascript),
    }
}


/// Encodes a synthesized field as a merged field and widget annotation dictionary on the given
/// page.
pub fn field_dictionary(field: &SynthesizedField, page_id: ObjectId, appearance: &Appearance) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "T" => text_string(&field.name),
        "Rect" => vec![
            field.rect.left().into(),
            field.rect.bottom().into(),
            field.rect.right().into(),
            field.rect.top().into(),
        ],
        "F" => ANNOTATION_FLAG_PRINT,
        "P" => Object::Reference(page_id),
    };

    let mut characteristics = Dictionary::new();
    if let Some(bg) = field.background_color {
        characteristics.set("BG", color_array(bg));
    }

    match field.kind {
        FieldKind::CheckBox => {
            dict.set("FT", "Btn");
            dict.set("V", UNCHECKED_STATE);
            dict.set("AS", UNCHECKED_STATE);
            dict.set("DA", Object::string_literal(format!("/{} 0 Tf 0 g", SYMBOL_FONT)));
            characteristics.set("CA", Object::string_literal(CHECK_MARK));
        },
        FieldKind::Text|FieldKind::Date|FieldKind::Multiline => {
            dict.set("FT", "Tx");
            dict.set("V", Object::string_literal(""));
            dict.set("DA", Object::string_literal(text_appearance(appearance.font_size, field.text_color)));
            if field.kind == FieldKind::Multiline {
                dict.set("Ff", FIELD_FLAG_MULTILINE);
            }
            if field.justification != Justification::Left {
                dict.set("Q", i64::from(field.justification.to_base_type()));
            }
        },
        FieldKind::Signature => {
            dict.set("FT", "Sig");
        },
    }

    if !characteristics.is_empty() {
        dict.set("MK", characteristics);
    }

    if !field.scripts.is_empty() {
        let mut additional_actions = Dictionary::new();
        for script in &field.scripts {
            additional_actions.set(trigger_key(script.trigger), javascript_action(&script.javascript));
        }
        dict.set("AA", additional_actions);
    }

    dict
}


fn catalog_id(doc: &Document) -> Result<ObjectId, Error> {
    doc.trailer.get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| Error::MissingCatalog)
}


/// Returns the ID of the dictionary stored under `key` in the dictionary `parent_id`.
///
/// An inline dictionary is moved into its own object; a missing (or non-dictionary) entry is
/// replaced by a new empty dictionary.
fn child_dictionary_id(doc: &mut Document, parent_id: ObjectId, key: &[u8]) -> Result<ObjectId, Error> {
    let existing = doc.get_dictionary(parent_id)?
        .get(key)
        .ok()
        .cloned();
    let child = match existing {
        Some(Object::Reference(id)) => return Ok(id),
        Some(Object::Dictionary(inline)) => inline,
        _ => Dictionary::new(),
    };
    let child_id = doc.add_object(child);
    doc.get_dictionary_mut(parent_id)?
        .set(key, Object::Reference(child_id));
    Ok(child_id)
}


/// Appends a reference to the array stored under `key` in the dictionary `holder_id`, creating
/// the array if necessary.
fn append_reference(doc: &mut Document, holder_id: ObjectId, key: &[u8], item: ObjectId) -> Result<(), Error> {
    let holder = doc.get_dictionary_mut(holder_id)?;
    let array_id = match holder.get_mut(key) {
        Ok(Object::Array(items)) => {
            items.push(Object::Reference(item));
            return Ok(());
        },
        Ok(Object::Reference(id)) => *id,
        _ => {
            holder.set(key, vec![Object::Reference(item)]);
            return Ok(());
        },
    };
    doc.get_object_mut(array_id)?
        .as_array_mut()?
        .push(Object::Reference(item));
    Ok(())
}


/// Looks up the media box of a page, following inheritance through the page tree.
pub fn page_media_box(doc: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let mut node_id = page_id;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(media_box) = node.get(b"MediaBox") {
            let (_, media_box) = doc.dereference(media_box).ok()?;
            let media_box_array = media_box.as_array().ok()?;
            if media_box_array.len() != 4 {
                return None;
            }

            let mut dimensions = [0f32; 4];
            for (elem_index, elem) in media_box_array.iter().enumerate() {
                dimensions[elem_index] = match elem {
                    Object::Integer(i) => *i as f32,
                    Object::Real(r) => *r,
                    _ => return None,
                };
            }
            return Some(dimensions);
        }
        node_id = node.get(b"Parent")
            .and_then(Object::as_reference)
            .ok()?;
    }
    None
}


/// The document-wide interactive form (AcroForm) of a document.
#[derive(Clone, Debug, PartialEq)]
pub struct FormLayer {
    acroform_id: ObjectId,
    appearance: Appearance,
}
impl FormLayer {
    /// Obtains the form of the document, creating it if the document has none.
    ///
    /// Existing fields are kept. The default resources are extended with the fonts that new
    /// fields refer to, unless fonts with the same resource names are already present.
    pub fn open(doc: &mut Document, appearance: &Appearance) -> Result<Self, Error> {
        let catalog_id = catalog_id(doc)?;
        let acroform_id = child_dictionary_id(doc, catalog_id, b"AcroForm")?;

        {
            let acroform = doc.get_dictionary_mut(acroform_id)?;
            if !acroform.has(b"Fields") {
                acroform.set("Fields", Vec::<Object>::new());
            }
            if !acroform.has(b"DA") {
                acroform.set("DA", Object::string_literal(text_appearance(appearance.font_size, None)));
            }
            acroform.set("NeedAppearances", appearance.need_appearances);
        }

        let resources_id = child_dictionary_id(doc, acroform_id, b"DR")?;
        let fonts_id = child_dictionary_id(doc, resources_id, b"Font")?;
        let standard_fonts = [
            (TEXT_FONT, dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            }),
            (SYMBOL_FONT, symbol_font()),
        ];
        for (resource_name, font) in standard_fonts {
            if doc.get_dictionary(fonts_id)?.has(resource_name.as_bytes()) {
                continue;
            }
            let font_id = doc.add_object(font);
            doc.get_dictionary_mut(fonts_id)?
                .set(resource_name, Object::Reference(font_id));
        }

        Ok(Self {
            acroform_id,
            appearance: appearance.clone(),
        })
    }

    pub fn acroform_id(&self) -> ObjectId { self.acroform_id }

    /// Adds the field, along with its appearance streams, to the form and its widget to the
    /// page's annotations.
    ///
    /// Fields are appended, so the order of registration is the order of the form's fields and
    /// of the page's annotations.
    pub fn register(&self, doc: &mut Document, page_id: ObjectId, field: &SynthesizedField) -> Result<ObjectId, Error> {
        let mut widget = field_dictionary(field, page_id, &self.appearance);
        let normal_appearance = add_normal_appearance(doc, field);
        widget.set("AP", dictionary! { "N" => normal_appearance });
        let field_id = doc.add_object(widget);
        append_reference(doc, page_id, b"Annots", field_id)?;
        append_reference(doc, self.acroform_id, b"Fields", field_id)?;
        Ok(field_id)
    }
}
