use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILAMENT_TYPE: &str = "PLA";
pub const DEFAULT_COLOR_HEX: &str = "#000000";

/// The currently loaded spool as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spool {
    pub remaining_weight_g: f64,
    pub capacity_weight_g: f64,
    pub filament_type: String,
    pub color_hex: String,
    pub manufacturer: String,
}

impl Default for Spool {
    fn default() -> Self {
        Self {
            remaining_weight_g: 0.0,
            capacity_weight_g: 0.0,
            filament_type: DEFAULT_FILAMENT_TYPE.to_string(),
            color_hex: DEFAULT_COLOR_HEX.to_string(),
            manufacturer: String::new(),
        }
    }
}

/// Spool attributes shared by profiles and the `load_new_spool` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoolAttributes {
    #[serde(rename = "spool_capacity_g", default)]
    pub capacity_weight_g: f64,
    #[serde(default = "default_filament_type")]
    pub filament_type: String,
    #[serde(rename = "color", default = "default_color_hex")]
    pub color_hex: String,
    #[serde(default)]
    pub manufacturer: String,
}

impl Default for SpoolAttributes {
    fn default() -> Self {
        Self {
            capacity_weight_g: 0.0,
            filament_type: default_filament_type(),
            color_hex: default_color_hex(),
            manufacturer: String::new(),
        }
    }
}

/// A named profile row, as rendered in the profile picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub name: String,
    #[serde(flatten)]
    pub attributes: SpoolAttributes,
}

/// Profiles keyed by name, in the order the backend listed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileCatalog(IndexMap<String, SpoolAttributes>);

impl ProfileCatalog {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, case-sensitive lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Profile> {
        self.0.get(name).map(|attributes| Profile {
            name: name.to_string(),
            attributes: attributes.clone(),
        })
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Profile> + '_ {
        self.0.iter().map(|(name, attributes)| Profile {
            name: name.clone(),
            attributes: attributes.clone(),
        })
    }
}

impl FromIterator<(String, SpoolAttributes)> for ProfileCatalog {
    fn from_iter<I: IntoIterator<Item = (String, SpoolAttributes)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Partial spool update. Only fields present in the message are `Some`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpoolPatch {
    #[serde(rename = "remaining_g", default, skip_serializing_if = "Option::is_none")]
    pub remaining_weight_g: Option<f64>,
    #[serde(
        rename = "spool_capacity_g",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub capacity_weight_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filament_type: Option<String>,
    #[serde(rename = "color", default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

impl SpoolPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining_weight_g.is_none()
            && self.capacity_weight_g.is_none()
            && self.filament_type.is_none()
            && self.color_hex.is_none()
            && self.manufacturer.is_none()
    }
}

/// One-shot startup snapshot returned by `GET <command endpoint>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "remaining_g", default)]
    pub remaining_weight_g: f64,
    #[serde(rename = "spool_capacity_g", default)]
    pub capacity_weight_g: f64,
    #[serde(default = "default_filament_type")]
    pub filament_type: String,
    #[serde(rename = "color", default)]
    pub color_hex: Option<String>,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub profiles: Option<ProfileCatalog>,
}

impl Snapshot {
    #[must_use]
    pub fn spool(&self) -> Spool {
        Spool {
            remaining_weight_g: self.remaining_weight_g,
            capacity_weight_g: self.capacity_weight_g,
            filament_type: self.filament_type.clone(),
            color_hex: self
                .color_hex
                .clone()
                .filter(|color_hex| !color_hex.is_empty())
                .unwrap_or_else(default_color_hex),
            manufacturer: self.manufacturer.clone(),
        }
    }
}

/// Remaining weight with one decimal place and a `g` suffix: `7.532` renders as `7.5g`.
///
/// Exact ties round away from zero (`987.25` renders as `987.3g`), matching
/// `Number.prototype.toFixed` on the host page.
#[must_use]
pub fn format_remaining(remaining_weight_g: f64) -> String {
    format!("{:.1}g", round_tenths(remaining_weight_g))
}

// Only values ending in .25 or .75 sit exactly on a tenths tie; `{:.1}` would
// round those to even.
fn round_tenths(value: f64) -> f64 {
    let quarters = value * 4.0;
    let exact_tie = quarters.is_finite() && quarters.fract() == 0.0 && quarters % 2.0 != 0.0;
    if exact_tie {
        (value * 10.0).round() / 10.0
    } else {
        value
    }
}

fn default_filament_type() -> String {
    DEFAULT_FILAMENT_TYPE.to_string()
}

fn default_color_hex() -> String {
    DEFAULT_COLOR_HEX.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_remaining_rounds_to_one_decimal() {
        assert_eq!(format_remaining(7.532), "7.5g");
        assert_eq!(format_remaining(0.0), "0.0g");
        assert_eq!(format_remaining(1000.0), "1000.0g");
    }

    #[test]
    fn format_remaining_rounds_exact_ties_away_from_zero() {
        assert_eq!(format_remaining(987.25), "987.3g");
        assert_eq!(format_remaining(0.25), "0.3g");
        assert_eq!(format_remaining(2.25), "2.3g");
        assert_eq!(format_remaining(2.75), "2.8g");
        assert_eq!(format_remaining(-0.25), "-0.3g");
        // 0.15 is stored just below the tie.
        assert_eq!(format_remaining(0.15), "0.1g");
    }

    #[test]
    fn snapshot_empty_color_falls_back_to_black() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"remaining_g":1,"spool_capacity_g":1000,"filament_type":"PLA","color":"","manufacturer":""}"#,
        )
        .expect("decode snapshot");

        assert_eq!(snapshot.spool().color_hex, "#000000");
    }

    #[test]
    fn snapshot_defaults_missing_color_and_profiles() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"remaining_g":812.5,"spool_capacity_g":1000,"filament_type":"PETG","manufacturer":"Prusament"}"#,
        )
        .expect("decode snapshot");

        let spool = snapshot.spool();
        assert_eq!(spool.remaining_weight_g, 812.5);
        assert_eq!(spool.capacity_weight_g, 1000.0);
        assert_eq!(spool.color_hex, DEFAULT_COLOR_HEX);
        assert!(snapshot.profiles.is_none());
    }

    #[test]
    fn profile_catalog_preserves_wire_order() {
        let catalog: ProfileCatalog = serde_json::from_str(
            r##"{
                "Zeta":{"spool_capacity_g":1000,"filament_type":"PLA","color":"#fff","manufacturer":"A"},
                "Alpha":{"spool_capacity_g":750,"filament_type":"ABS","color":"#000","manufacturer":"B"},
                "Mid":{"spool_capacity_g":500,"filament_type":"TPU","color":"#0f0","manufacturer":"C"}
            }"##,
        )
        .expect("decode catalog");

        assert_eq!(catalog.names(), vec!["Zeta", "Alpha", "Mid"]);
        let rows = catalog.rows().map(|row| row.name).collect::<Vec<_>>();
        assert_eq!(rows, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn profile_lookup_is_case_sensitive() {
        let catalog = ProfileCatalog::from_iter([("Basic".to_string(), SpoolAttributes::default())]);
        assert!(catalog.get("Basic").is_some());
        assert!(catalog.get("basic").is_none());
    }

    #[test]
    fn patch_keeps_falsy_but_present_values() {
        let patch: SpoolPatch =
            serde_json::from_str(r#"{"manufacturer":"","remaining_g":0}"#).expect("decode patch");
        assert_eq!(patch.manufacturer.as_deref(), Some(""));
        assert_eq!(patch.remaining_weight_g, Some(0.0));
        assert!(patch.filament_type.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn profile_row_serializes_flat() {
        let row = Profile {
            name: "P1".to_string(),
            attributes: SpoolAttributes {
                capacity_weight_g: 500.0,
                filament_type: "PETG".to_string(),
                color_hex: "#00f".to_string(),
                manufacturer: "B".to_string(),
            },
        };
        let value = serde_json::to_value(&row).expect("encode row");
        assert_eq!(value["name"], "P1");
        assert_eq!(value["spool_capacity_g"], 500.0);
        assert_eq!(value["color"], "#00f");
    }
}
