//! Creation of typed form fields from descriptors.


use std::fmt;
use std::str::FromStr;

use from_to_repr::from_to_other;

use crate::color::ColorValue;
use crate::descriptor::FieldDescriptor;
use crate::geometry::Rectangle;


/// The date pattern used by all date field scripts.
pub const DATE_FORMAT: &str = "dd/mm/yy";


#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Error {
    UnsupportedFieldType { field_type: String },
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFieldType { field_type }
                => write!(f, "unsupported field type: {:?}", field_type),
        }
    }
}
impl std::error::Error for Error {
}


/// A styling attribute that can receive a color.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ColorAttribute {
    Text,
    Background,
}
impl fmt::Display for ColorAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text color"),
            Self::Background => f.write_str("background color"),
        }
    }
}


/// The supported kinds of form field.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FieldKind {
    CheckBox,
    Text,
    Date,
    Multiline,
    Signature,
}
impl FieldKind {
    /// The styling attributes a field of this kind can carry.
    ///
    /// Check boxes and signatures have no editable text, so they only take a background color.
    pub fn color_attributes(&self) -> &'static [ColorAttribute] {
        match self {
            Self::CheckBox|Self::Signature
                => &[ColorAttribute::Background],
            Self::Text|Self::Date|Self::Multiline
                => &[ColorAttribute::Text, ColorAttribute::Background],
        }
    }

    pub fn takes_color(&self, attribute: ColorAttribute) -> bool {
        self.color_attributes().contains(&attribute)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckBox => "checkbox",
            Self::Text => "text",
            Self::Date => "date",
            Self::Multiline => "multiline",
            Self::Signature => "signature",
        }
    }
}
impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for FieldKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkbox" => Ok(Self::CheckBox),
            "text" => Ok(Self::Text),
            "date" => Ok(Self::Date),
            "multiline" => Ok(Self::Multiline),
            "signature" => Ok(Self::Signature),
            other => Err(Error::UnsupportedFieldType { field_type: other.to_owned() }),
        }
    }
}


/// Quadding (horizontal text alignment) of a variable text field.
#[derive(Clone, Copy, Debug)]
#[from_to_other(base_type = u8, derive_compare = "as_int")]
pub enum Justification {
    Left = 0,
    Center = 1,
    // catch-all for from_to_other; never produced by field creation
    Other(u8),
}


/// The viewer event that runs an attached script.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Trigger {
    /// The field receives the input focus.
    FocusGained,

    /// The user types into the field or otherwise changes its content.
    Keystroke,

    /// The value is about to be displayed after a change was committed.
    Format,
}


/// A script attached to a field, executed by the viewer when the trigger fires.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TriggerScript {
    pub trigger: Trigger,
    pub javascript: String,
}
impl TriggerScript {
    pub fn new<S: Into<String>>(trigger: Trigger, javascript: S) -> Self {
        Self { trigger, javascript: javascript.into() }
    }
}


/// A fully styled form field, ready to be registered with the document's form.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedField {
    pub kind: FieldKind,
    pub name: String,
    pub rect: Rectangle,
    pub text_color: Option<ColorValue>,
    pub background_color: Option<ColorValue>,
    pub justification: Justification,
    pub scripts: Vec<TriggerScript>,
}


/// The scripts that turn a plain text field into a date entry field with a picker.
pub fn date_scripts() -> Vec<TriggerScript> {
    vec![
        TriggerScript::new(
            Trigger::FocusGained,
            format!(
                "var cDate = app.pickDate(); if (cDate != null) event.target.value = util.printd('{}', cDate);",
                DATE_FORMAT,
            ),
        ),
        TriggerScript::new(Trigger::Keystroke, format!("AFDate_KeystrokeEx('{}');", DATE_FORMAT)),
        TriggerScript::new(Trigger::Format, format!("AFDate_FormatEx('{}');", DATE_FORMAT)),
    ]
}


/// Creates the field described by `descriptor` at `rect` using the already resolved colors.
///
/// Colors for attributes that the field kind does not support are dropped.
pub fn create(
    descriptor: &FieldDescriptor,
    rect: Rectangle,
    text_color: Option<ColorValue>,
    background_color: Option<ColorValue>,
) -> Result<SynthesizedField, Error> {
    let kind: FieldKind = descriptor.field_type.parse()?;

    let (justification, scripts) = match kind {
        FieldKind::Date => (Justification::Center, date_scripts()),
        FieldKind::CheckBox|FieldKind::Text|FieldKind::Multiline|FieldKind::Signature
            => (Justification::Left, Vec::new()),
    };

    Ok(SynthesizedField {
        kind,
        name: descriptor.name.clone(),
        rect,
        text_color: text_color.filter(|_| kind.takes_color(ColorAttribute::Text)),
        background_color: background_color.filter(|_| kind.takes_color(ColorAttribute::Background)),
        justification,
        scripts,
    })
}
