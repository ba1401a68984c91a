pub mod config;
pub mod draft;
pub mod geotag;
pub mod location;
pub mod model;
pub mod view;
pub mod viewport;

pub use config::{AppConfig, ConfigError};
pub use draft::{GeoStatus, IncidentDraft, ValidationError};
pub use geotag::{ExifBatch, PhotoExifRecord, extract_gps, extract_gps_from_path};
pub use location::parse_coordinates_in_text;
pub use model::{
    Coordinates, Filter, Incident, IncidentType, LocationMode, MAX_PHOTOS, Photo, PhotoAttachment,
    Severity, Status, ViewState, parse_float,
};
pub use view::{
    DashboardView, MapIncident, MapsLink, StatusCounts, filter_incidents, map_eligible, maps_link,
    marker_color,
};
pub use viewport::{Bounds, FIT_PADDING, FOCUS_ZOOM, MapSync, ViewportCommand, viewport_for};
