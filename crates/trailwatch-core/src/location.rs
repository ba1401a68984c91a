//! Location resolution for a draft report.
//!
//! In `GpsOrText` mode the location comes from typed or pasted coordinates,
//! then the device position, or from the free text alone. In
//! `PhotoMetadata` mode only the primary EXIF fix counts.

use std::sync::LazyLock;

use regex::Regex;

use crate::draft::IncidentDraft;
use crate::model::{Coordinates, LocationMode, parse_float};

static COORDINATE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)").expect("static coordinate pattern")
});

/// Find the first `lat, lng` pair anywhere in free text.
///
/// Returns the matched substrings as written, e.g. a pasted maps link or
/// `"6.9271, 79.8612 extra text"`.
pub fn parse_coordinates_in_text(text: &str) -> Option<(String, String)> {
    let caps = COORDINATE_PAIR.captures(text)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

impl IncidentDraft {
    /// Store the location text and pick up any coordinates embedded in it.
    pub fn set_location_text(&mut self, value: impl Into<String>) {
        self.location_text = value.into();
        if let Some((lat, lng)) = parse_coordinates_in_text(&self.location_text) {
            self.set_manual_coordinates(&lat, &lng);
        }
    }

    /// Update the coordinate inputs; the resolved position changes only
    /// when both parse as numbers.
    pub fn set_manual_coordinates(&mut self, lat: &str, lng: &str) {
        self.lat_input = lat.to_string();
        self.lng_input = lng.to_string();
        if let (Some(lat), Some(lng)) = (parse_float(lat), parse_float(lng)) {
            self.coords = Some(Coordinates::new(lat, lng));
            self.geo.locked = true;
            self.geo.error = None;
        }
    }

    /// Apply a device position fix and the text describing it.
    pub fn apply_device_position(&mut self, coords: Coordinates, display_text: impl Into<String>) {
        self.coords = Some(coords);
        self.lat_input = coords.lat.to_string();
        self.lng_input = coords.lng.to_string();
        self.location_text = display_text.into();
        self.geo.loading = false;
        self.geo.error = None;
        self.geo.locked = true;
    }

    /// Record a failed position lookup without touching the rest of the form.
    pub fn record_position_error(&mut self, message: impl Into<String>) {
        self.geo.loading = false;
        self.geo.locked = false;
        self.geo.error = Some(message.into());
    }

    /// The coordinates that will be sent with the report, if any.
    pub fn resolved_location(&self) -> Option<Coordinates> {
        match self.location_mode {
            LocationMode::GpsOrText => self.input_coordinates().or(self.coords),
            LocationMode::PhotoMetadata => self.exif.primary().filter(Coordinates::is_finite),
        }
    }

    fn input_coordinates(&self) -> Option<Coordinates> {
        let lat = parse_float(&self.lat_input)?;
        let lng = parse_float(&self.lng_input)?;
        Some(Coordinates::new(lat, lng))
    }
}
