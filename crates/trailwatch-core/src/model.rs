//! Shared incident types exchanged between the reporting form, the backend and the dashboard.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum number of photos attached to one report.
pub const MAX_PHOTOS: usize = 5;

/// Fixed hazard categories offered by the reporting form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IncidentType {
    #[default]
    #[serde(rename = "Fallen trees blocking trail")]
    FallenTrees,
    #[serde(rename = "Broken or unstable bridges")]
    BrokenBridge,
    #[serde(rename = "Erosion or collapsed sections")]
    Erosion,
    #[serde(rename = "Slippery or muddy sections")]
    SlipperySection,
    #[serde(rename = "Other hazard")]
    Other,
}

impl IncidentType {
    /// All categories in form order.
    pub const ALL: [IncidentType; 5] = [
        IncidentType::FallenTrees,
        IncidentType::BrokenBridge,
        IncidentType::Erosion,
        IncidentType::SlipperySection,
        IncidentType::Other,
    ];

    /// Label used on the wire and in the UI.
    pub fn label(self) -> &'static str {
        match self {
            IncidentType::FallenTrees => "Fallen trees blocking trail",
            IncidentType::BrokenBridge => "Broken or unstable bridges",
            IncidentType::Erosion => "Erosion or collapsed sections",
            IncidentType::SlipperySection => "Slippery or muddy sections",
            IncidentType::Other => "Other hazard",
        }
    }

    /// Short command-line name.
    pub fn slug(self) -> &'static str {
        match self {
            IncidentType::FallenTrees => "fallen-trees",
            IncidentType::BrokenBridge => "bridge",
            IncidentType::Erosion => "erosion",
            IncidentType::SlipperySection => "slippery",
            IncidentType::Other => "other",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IncidentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        IncidentType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s) || t.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown incident type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Severity::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown severity: {s}"))
    }
}

/// Review status of a reported incident.
///
/// Values other than `Open` and `Resolved` are kept verbatim so a backend
/// that grows a new status does not break listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Open,
    Resolved,
    Other(String),
}

impl Status {
    pub fn label(&self) -> &str {
        match self {
            Status::Open => "Open",
            Status::Resolved => "Resolved",
            Status::Other(s) => s,
        }
    }

    /// Two-level sort rank: open work first, resolved last.
    pub fn rank(&self) -> u8 {
        match self {
            Status::Open => 0,
            Status::Other(_) => 1,
            Status::Resolved => 2,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        match s {
            "Open" => Status::Open,
            "Resolved" => Status::Resolved,
            other => Status::Other(other.to_string()),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.as_deref().map(Status::from).unwrap_or_default())
    }
}

/// How the authoritative location of a report is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LocationMode {
    /// Device position, coordinates typed or pasted into the text, or text alone.
    #[default]
    #[serde(rename = "gps_or_text")]
    GpsOrText,
    /// The primary EXIF fix of the uploaded photos.
    #[serde(rename = "photo_metadata")]
    PhotoMetadata,
}

impl LocationMode {
    pub fn wire_value(self) -> &'static str {
        match self {
            LocationMode::GpsOrText => "gps_or_text",
            LocationMode::PhotoMetadata => "photo_metadata",
        }
    }
}

impl FromStr for LocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "gps_or_text" | "gps" | "text" => Ok(LocationMode::GpsOrText),
            "photo_metadata" | "photo" | "exif" => Ok(LocationMode::PhotoMetadata),
            other => Err(format!("unknown location mode: {other}")),
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both axes finite and neither exactly zero.
    ///
    /// A zero axis is how cameras and phones record "no fix", so it is not
    /// treated as a real position.
    pub fn is_plausible(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && self.lat != 0.0 && self.lng != 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// `"lat, lng"` with six decimals.
    pub fn display(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("static float pattern")
});

/// Lenient number parsing: reads the longest numeric prefix after leading
/// whitespace, so `"6.9271abc"` is `6.9271` and `"abc"` is `None`.
/// Values that overflow to infinity are rejected.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let m = LEADING_FLOAT.find(s)?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// An image selected for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoAttachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename).to_string();
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        Ok(Self::new(filename, bytes))
    }
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" | "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// A stored photo reference returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    #[serde(default)]
    pub name: String,
}

/// A server-confirmed incident.
///
/// Coordinates arrive as numbers, numeric strings, empty strings or null;
/// they are normalised to `Option<f64>` on the way in. Text fields treat
/// null as empty, and the id is read from `id` or the legacy `_id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "IncidentRecord")]
pub struct Incident {
    pub id: String,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub severity: String,
    pub status: Status,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
    /// Older records carry free text here instead of `locationText`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub photos: Vec<Photo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Wire shape of an incident as the backend sends it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncidentRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    id: String,
    #[serde(rename = "_id", default, deserialize_with = "string_or_number")]
    legacy_id: String,
    #[serde(rename = "type", default, deserialize_with = "string_or_number")]
    incident_type: String,
    #[serde(default, deserialize_with = "string_or_number")]
    severity: String,
    #[serde(default)]
    status: Status,
    #[serde(default, deserialize_with = "string_or_number")]
    description: String,
    #[serde(default, deserialize_with = "optional_text")]
    date: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    time: Option<String>,
    #[serde(default, deserialize_with = "loose_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "optional_text")]
    location_text: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    photos: Vec<Photo>,
    #[serde(default, deserialize_with = "optional_text")]
    photo_url: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    created_at: Option<String>,
}

impl From<IncidentRecord> for Incident {
    fn from(r: IncidentRecord) -> Self {
        let id = if r.id.is_empty() { r.legacy_id } else { r.id };
        Self {
            id,
            incident_type: r.incident_type,
            severity: r.severity,
            status: r.status,
            description: r.description,
            date: r.date,
            time: r.time,
            latitude: r.latitude,
            longitude: r.longitude,
            location_text: r.location_text,
            location: r.location,
            photos: r.photos,
            photo_url: r.photo_url,
            created_at: r.created_at,
        }
    }
}

impl Incident {
    pub fn severity(&self) -> Option<Severity> {
        self.severity.parse().ok()
    }

    pub fn incident_type(&self) -> Option<IncidentType> {
        self.incident_type.parse().ok()
    }

    /// Both coordinates, when present and finite.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let c = Coordinates::new(self.latitude?, self.longitude?);
        c.is_finite().then_some(c)
    }

    /// Free-text location, preferring `locationText` over the legacy field.
    pub fn location_label(&self) -> Option<&str> {
        self.location_text
            .as_deref()
            .or(self.location.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// URL of the first photo, if any.
    pub fn cover_photo(&self) -> Option<&str> {
        self.photos
            .first()
            .map(|p| p.url.as_str())
            .or(self.photo_url.as_deref())
    }
}

fn loose_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => parse_float(&s),
        _ => None,
    })
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Either every value or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: Copy> Filter<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Filter::All => None,
            Filter::Only(v) => Some(*v),
        }
    }
}

impl Filter<Severity> {
    pub fn matches(&self, severity: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(s) => s.label() == severity,
        }
    }
}

impl Filter<IncidentType> {
    pub fn matches(&self, incident_type: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(t) => t.label() == incident_type,
        }
    }
}

impl<T: FromStr<Err = String>> FromStr for Filter<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse().map(Filter::Only)
        }
    }
}

/// Per-session dashboard state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    severity: Filter<Severity>,
    incident_type: Filter<IncidentType>,
    selected: Option<String>,
}

impl ViewState {
    pub fn severity(&self) -> Filter<Severity> {
        self.severity
    }

    pub fn incident_type(&self) -> Filter<IncidentType> {
        self.incident_type
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Changing a filter drops the current selection.
    pub fn set_severity(&mut self, severity: Filter<Severity>) {
        self.severity = severity;
        self.selected = None;
    }

    pub fn set_incident_type(&mut self, incident_type: Filter<IncidentType>) {
        self.incident_type = incident_type;
        self.selected = None;
    }

    /// `None` shows every incident on the map.
    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }
}
