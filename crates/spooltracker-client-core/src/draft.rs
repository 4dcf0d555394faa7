//! Transient form state behind the "new spool" dialog and the profile editor.

use serde::Serialize;

use crate::model::{DEFAULT_COLOR_HEX, DEFAULT_FILAMENT_TYPE, SpoolAttributes};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a profile name")]
    EmptyProfileName,
    #[error("Spool capacity must be greater than 0")]
    InvalidCapacity,
    #[error("Please select a profile to delete")]
    NoProfileSelected,
}

/// Editable spool attributes. Capacity stays as typed until a command is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftFields {
    pub capacity_text: String,
    pub filament_type: String,
    pub color_hex: String,
    pub manufacturer: String,
}

impl Default for DraftFields {
    fn default() -> Self {
        Self {
            capacity_text: String::new(),
            filament_type: DEFAULT_FILAMENT_TYPE.to_string(),
            color_hex: DEFAULT_COLOR_HEX.to_string(),
            manufacturer: String::new(),
        }
    }
}

impl DraftFields {
    #[must_use]
    pub fn capacity(&self) -> Option<f64> {
        parse_float_prefix(&self.capacity_text)
    }

    pub fn fill_from(&mut self, attributes: &SpoolAttributes) {
        self.capacity_text = format_capacity(attributes.capacity_weight_g);
        self.filament_type.clone_from(&attributes.filament_type);
        self.color_hex.clone_from(&attributes.color_hex);
        self.manufacturer.clone_from(&attributes.manufacturer);
    }

    #[must_use]
    pub fn to_attributes(&self, capacity_weight_g: f64) -> SpoolAttributes {
        SpoolAttributes {
            capacity_weight_g,
            filament_type: self.filament_type.clone(),
            color_hex: self.color_hex.clone(),
            manufacturer: self.manufacturer.clone(),
        }
    }

    /// Capacity for `load_new_spool`: finite and strictly positive.
    pub fn positive_capacity(&self) -> Result<f64, ValidationError> {
        match self.capacity() {
            Some(capacity) if capacity.is_finite() && capacity > 0.0 => Ok(capacity),
            _ => Err(ValidationError::InvalidCapacity),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Draft {
    #[serde(flatten)]
    pub fields: DraftFields,
    pub profile_name: String,
    selected_profile_name: String,
}

/// A single user edit coming from a bound form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Capacity(String),
    FilamentType(String),
    Color(String),
    Manufacturer(String),
    ProfileName(String),
    SelectedProfile(String),
}

impl DraftEdit {
    /// Maps a bound control's field name to an edit. `None` for unknown fields.
    #[must_use]
    pub fn from_field(field: &str, value: String) -> Option<Self> {
        let edit = match field {
            "capacity" | "spool_capacity_g" => Self::Capacity(value),
            "filament_type" => Self::FilamentType(value),
            "color" => Self::Color(value),
            "manufacturer" => Self::Manufacturer(value),
            "profile_name" => Self::ProfileName(value),
            "selected_profile" => Self::SelectedProfile(value),
            _ => return None,
        };
        Some(edit)
    }
}

/// Follow-up work an edit asks of the form controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftReaction {
    RefreshColorPreview(String),
    LoadProfile(String),
}

impl Draft {
    #[must_use]
    pub fn selected_profile_name(&self) -> &str {
        &self.selected_profile_name
    }

    /// Returns whether the selection actually changed.
    pub fn set_selected_profile_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name == self.selected_profile_name {
            return false;
        }
        self.selected_profile_name = name;
        true
    }

    pub fn apply(&mut self, edit: DraftEdit) -> Option<DraftReaction> {
        match edit {
            DraftEdit::Capacity(value) => self.fields.capacity_text = value,
            DraftEdit::FilamentType(value) => self.fields.filament_type = value,
            DraftEdit::Manufacturer(value) => self.fields.manufacturer = value,
            DraftEdit::ProfileName(value) => self.profile_name = value,
            DraftEdit::Color(value) => {
                self.fields.color_hex.clone_from(&value);
                return Some(DraftReaction::RefreshColorPreview(value));
            }
            DraftEdit::SelectedProfile(value) => {
                if self.set_selected_profile_name(value.clone()) {
                    return Some(DraftReaction::LoadProfile(value));
                }
            }
        }
        None
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Trimmed profile name, or the validation error for an empty one.
    pub fn profile_name_for_save(&self) -> Result<String, ValidationError> {
        let name = self.profile_name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProfileName);
        }
        Ok(name.to_string())
    }
}

/// `parseFloat`-style parse: leading whitespace is skipped and the longest numeric
/// prefix wins, so `"500g"` is `500`. `None` when no prefix is numeric.
#[must_use]
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let integer_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - integer_start;

    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut cursor = fraction_start;
        while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        mantissa_digits += cursor - fraction_start;
        if mantissa_digits > 0 {
            end = cursor;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut cursor = end + 1;
        if matches!(bytes.get(cursor), Some(b'+' | b'-')) {
            cursor += 1;
        }
        let exponent_start = cursor;
        while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        if cursor > exponent_start {
            end = cursor;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// Shortest rendering of a stored capacity: `500.0` becomes `"500"`.
#[must_use]
pub fn format_capacity(capacity_weight_g: f64) -> String {
    format!("{capacity_weight_g}")
}
