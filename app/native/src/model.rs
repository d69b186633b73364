//! Core data types shared by the stores, the navigation cursor and the engine.
//!
//! Field names follow the on-disk JSON documents (state file and favorites
//! ledger), so the same types are used for persistence and in memory.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Default UI zoom factor for a fresh state.
pub const DEFAULT_ZOOM_FACTOR: f64 = 1.3;

/// One of the two logical collections the cursor walks over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Feed-sourced daily images, most recent first.
    #[default]
    #[serde(alias = "bing")]
    Remote,
    /// User-pinned images, in insertion order.
    Favorite,
}

impl Collection {
    /// Returns the lowercase name used in files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Favorite => "favorite",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" | "bing" | "history" => Ok(Self::Remote),
            "favorite" | "favorites" | "fav" => Ok(Self::Favorite),
            _ => Err(format!(
                "Invalid collection '{s}'. Expected 'remote' or 'favorite'."
            )),
        }
    }
}

/// One entry of either collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Full-resolution image URL; the identity key of a record.
    pub picture_url: String,
    /// Thumbnail URL.
    pub thumbnail_url: String,
    /// Free-text caption (the feed calls it copyright).
    #[serde(rename = "copyright", default)]
    pub caption: String,
    /// Publication day of the image.
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    /// Which collection the record belongs to.
    #[serde(default)]
    pub source: Collection,
}

/// A favorite: an image record plus the metadata of its private copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    /// Time-based identifier, immutable once assigned.
    pub id: String,
    #[serde(flatten)]
    pub record: ImageRecord,
    /// Absolute path of the copied image file.
    pub file_path: PathBuf,
    /// When the favorite was added (local time).
    #[serde(with = "timestamp_format")]
    pub added_date: NaiveDateTime,
}

/// The durable engine snapshot written to the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineState {
    /// Picture URL of the last applied remote image.
    pub picture_url: String,
    /// Local file of the last applied remote image.
    pub picture_file_path: PathBuf,
    /// Caption of the last applied remote image.
    pub copyright: String,
    /// Remote history snapshot, most recent first.
    pub history: Vec<ImageRecord>,
    /// Collection the cursor points into.
    pub current_source: Collection,
    /// Index within `current_source`.
    pub current_index: usize,
    /// UI scaling preference; opaque to the engine.
    pub zoom_factor: f64,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            picture_url: String::new(),
            picture_file_path: PathBuf::new(),
            copyright: String::new(),
            history: Vec::new(),
            current_source: Collection::Remote,
            current_index: 0,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
        }
    }
}

/// Read-only view of what is currently displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWallpaper {
    #[serde(flatten)]
    pub record: ImageRecord,
    pub collection: Collection,
    pub index: usize,
    pub total: usize,
    pub file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_id: Option<String>,
}

/// Dates are written as ISO `YYYY-MM-DD`; the feed's compact `YYYYMMDD`
/// form is accepted when reading older files.
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const ISO: &str = "%Y-%m-%d";
    const COMPACT: &str = "%Y%m%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(ISO).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Parses either date form.
    ///
    /// # Errors
    ///
    /// Returns a message when neither form matches.
    pub fn parse(raw: &str) -> Result<NaiveDate, String> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, ISO)
            .or_else(|_| NaiveDate::parse_from_str(raw, COMPACT))
            .map_err(|err| format!("invalid date '{raw}': {err}"))
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ImageRecord {
        ImageRecord {
            picture_url: "https://www.bing.com/th?id=OHR.Fox_UHD.jpg".to_string(),
            thumbnail_url: "https://www.bing.com/th?id=OHR.Fox_320x240.jpg".to_string(),
            caption: "A fox (© Someone)".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 9).unwrap(),
            source: Collection::Remote,
        }
    }

    #[test]
    fn test_record_uses_ledger_field_names() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["copyright"], "A fox (© Someone)");
        assert_eq!(json["date"], "2025-04-09");
        assert_eq!(json["source"], "remote");
    }

    #[test]
    fn test_record_accepts_compact_date_and_legacy_source() {
        let json = r#"{
            "picture_url": "a", "thumbnail_url": "b", "copyright": "c",
            "date": "20250409", "source": "bing"
        }"#;
        let parsed: ImageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.date, NaiveDate::from_ymd_opt(2025, 4, 9).unwrap());
        assert_eq!(parsed.source, Collection::Remote);
    }

    #[test]
    fn test_favorite_entry_is_flat() {
        let entry = FavoriteEntry {
            id: "1700000000".to_string(),
            record: ImageRecord { source: Collection::Favorite, ..record() },
            file_path: PathBuf::from("/data/favorites/favorite_1700000000.jpg"),
            added_date: NaiveDate::from_ymd_opt(2025, 4, 10)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        for key in [
            "id",
            "picture_url",
            "thumbnail_url",
            "copyright",
            "date",
            "file_path",
            "added_date",
            "source",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["added_date"], "2025-04-10 08:30:00");
        assert_eq!(json["source"], "favorite");

        let back: FavoriteEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_engine_state_defaults_fill_missing_fields() {
        let state: EngineState = serde_json::from_str(r#"{"picture_url": "x"}"#).unwrap();
        assert_eq!(state.picture_url, "x");
        assert!(state.history.is_empty());
        assert_eq!(state.current_source, Collection::Remote);
        assert!((state.zoom_factor - DEFAULT_ZOOM_FACTOR).abs() < f64::EPSILON);
    }

    #[test]
    fn test_collection_from_str() {
        assert_eq!("remote".parse::<Collection>(), Ok(Collection::Remote));
        assert_eq!("Favorite".parse::<Collection>(), Ok(Collection::Favorite));
        assert!("other".parse::<Collection>().is_err());
    }
}
