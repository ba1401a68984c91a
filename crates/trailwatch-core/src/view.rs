//! Dashboard view model: filtering, ordering and map-eligible subsets.
//!
//! Everything here is a pure function of the cached incident list and the
//! session's [`ViewState`].

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::model::{Coordinates, Filter, Incident, IncidentType, Severity, Status, ViewState};

/// Map center when no incident has usable coordinates.
pub const WORLD_CENTER: Coordinates = Coordinates { lat: 20.0, lng: 0.0 };

/// Keep incidents that pass both filters, open work first, newest first.
///
/// The sort is stable, so incidents that compare equal keep their input order.
pub fn filter_incidents(
    all: &[Incident],
    severity: Filter<Severity>,
    incident_type: Filter<IncidentType>,
) -> Vec<Incident> {
    let mut filtered: Vec<Incident> = all
        .iter()
        .filter(|i| severity.matches(&i.severity) && incident_type.matches(&i.incident_type))
        .cloned()
        .collect();
    filtered.sort_by(compare_for_review);

    let counts = StatusCounts::of(&filtered);
    debug!(open = counts.open, resolved = counts.resolved, "filtered incidents");
    filtered
}

fn compare_for_review(a: &Incident, b: &Incident) -> Ordering {
    a.status
        .rank()
        .cmp(&b.status.rank())
        .then_with(|| created_at(b).cmp(&created_at(a)))
}

/// Creation time, falling back to the report's `date` field.
///
/// `None` sorts before any timestamp, so undated incidents end up last
/// under the descending comparison.
pub fn created_at(incident: &Incident) -> Option<DateTime<Utc>> {
    incident
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| incident.date.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// An incident that can be placed on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapIncident {
    pub incident: Incident,
    pub position: Coordinates,
}

/// Incidents whose coordinates coerce to finite numbers.
///
/// Incidents without usable coordinates stay in the list view; they are only
/// left off the map.
pub fn map_eligible(filtered: &[Incident]) -> Vec<MapIncident> {
    filtered
        .iter()
        .filter_map(|incident| {
            let position = incident.coordinates()?;
            Some(MapIncident {
                incident: incident.clone(),
                position,
            })
        })
        .collect()
}

/// First eligible incident's position, or [`WORLD_CENTER`].
pub fn default_center(eligible: &[MapIncident]) -> Coordinates {
    eligible.first().map_or(WORLD_CENTER, |m| m.position)
}

/// Markers to draw: just the selected incident, or all of them.
pub fn visible_markers<'a>(eligible: &'a [MapIncident], selected: Option<&str>) -> Vec<&'a MapIncident> {
    match selected {
        Some(id) => eligible.iter().filter(|m| m.incident.id == id).collect(),
        None => eligible.iter().collect(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub open: usize,
    pub resolved: usize,
}

impl StatusCounts {
    pub fn of(incidents: &[Incident]) -> Self {
        incidents.iter().fold(Self::default(), |mut acc, i| {
            match i.status {
                Status::Open => acc.open += 1,
                Status::Resolved => acc.resolved += 1,
                Status::Other(_) => {}
            }
            acc
        })
    }
}

/// Everything the dashboard renders for one [`ViewState`].
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub incidents: Vec<Incident>,
    pub eligible: Vec<MapIncident>,
    pub center: Coordinates,
    pub selected: Option<String>,
    pub counts: StatusCounts,
}

impl DashboardView {
    pub fn build(all: &[Incident], state: &ViewState) -> Self {
        let incidents = filter_incidents(all, state.severity(), state.incident_type());
        let eligible = map_eligible(&incidents);
        let center = default_center(&eligible);
        let counts = StatusCounts::of(&incidents);
        Self {
            incidents,
            eligible,
            center,
            selected: state.selected().map(str::to_string),
            counts,
        }
    }

    pub fn markers(&self) -> Vec<&MapIncident> {
        visible_markers(&self.eligible, self.selected.as_deref())
    }
}

/// How an incident links out to a maps page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapsLink {
    Gps(String),
    Text(String),
}

impl MapsLink {
    pub fn url(&self) -> &str {
        match self {
            MapsLink::Gps(url) | MapsLink::Text(url) => url,
        }
    }
}

/// Link by coordinates when present, else by location text.
pub fn maps_link(incident: &Incident) -> Option<MapsLink> {
    if let Some(c) = incident.coordinates() {
        return Some(MapsLink::Gps(format!(
            "https://www.google.com/maps?q={},{}",
            c.lat, c.lng
        )));
    }
    incident.location_label().map(|text| {
        MapsLink::Text(format!(
            "https://www.google.com/maps/search/{}",
            encode_component(text)
        ))
    })
}

fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*'
            | b'\'' | b'(' | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Marker fill colour per severity.
pub fn marker_color(severity: &str) -> &'static str {
    match severity.parse::<Severity>() {
        Ok(Severity::Medium) => "#ffd60a",
        Ok(Severity::High) => "#e63946",
        _ => "#95d5b2",
    }
}
