//! Vertical card display for incidents, directory users and photo scans.

use trailwatch_client::DirectoryUser;
use trailwatch_core::{
    DashboardView, ExifBatch, Incident, PhotoAttachment, ViewportCommand, maps_link, marker_color,
};

const MAX_DESCRIPTION: usize = 200;

// ── Incidents ──

/// Print one incident as a card grouped into sections.
pub fn print_incident_card(incident: &Incident) {
    let heading = if incident.incident_type.is_empty() {
        "Incident"
    } else {
        incident.incident_type.as_str()
    };
    println!("=== {} [{}] ===", heading, incident.status);
    if !incident.description.is_empty() {
        println!("{}", truncate(&incident.description, MAX_DESCRIPTION));
    }
    println!();

    println!("Identity");
    field("id", &incident.id);
    field(
        "severity",
        &format!("{} ({})", incident.severity, marker_color(&incident.severity)),
    );
    if let Some(created) = &incident.created_at {
        field("created_at", created);
    }
    match (&incident.date, &incident.time) {
        (Some(d), Some(t)) => field("reported", &format!("{d} {t}")),
        (Some(d), None) => field("reported", d),
        _ => {}
    }
    println!();

    let coords = incident.coordinates();
    let label = incident.location_label();
    if coords.is_some() || label.is_some() {
        println!("Location");
        if let Some(text) = label {
            field("place", text);
        }
        if let Some(c) = coords {
            field("coordinates", &c.display());
        }
        if let Some(link) = maps_link(incident) {
            field("map", link.url());
        }
        println!();
    }

    if let Some(cover) = incident.cover_photo() {
        println!("Photos");
        field("cover", cover);
        if incident.photos.len() > 1 {
            field("count", &incident.photos.len().to_string());
        }
        println!();
    }
}

/// Print the filtered dashboard: totals, cards, then the map summary.
pub fn print_dashboard(view: &DashboardView) {
    println!(
        "{} incidents ({} open, {} resolved), {} on the map",
        view.incidents.len(),
        view.counts.open,
        view.counts.resolved,
        view.eligible.len()
    );
    println!();

    let shown: Vec<&Incident> = match view.selected.as_deref() {
        Some(id) => view.incidents.iter().filter(|i| i.id == id).collect(),
        None => view.incidents.iter().collect(),
    };
    if shown.is_empty() {
        println!("No incidents match the current filters.");
        return;
    }
    for incident in shown {
        print_incident_card(incident);
    }
}

pub fn print_viewport(command: &ViewportCommand) {
    println!("Map");
    match command {
        ViewportCommand::SetView {
            center,
            zoom,
            animate,
        } => {
            field("center", &center.display());
            field("zoom", &zoom.to_string());
            field("animate", if *animate { "yes" } else { "no" });
        }
        ViewportCommand::FitBounds { bounds, padding } => {
            field("south_west", &bounds.south_west.display());
            field("north_east", &bounds.north_east.display());
            field("padding", &format!("{}x{}", padding.0, padding.1));
        }
    }
}

// ── Users ──

pub fn print_user_card(user: &DirectoryUser) {
    println!("=== {} ===", user.display_name);
    field("id", &user.id);
    field("user_name", &user.user_name);
    field("email", &user.email);
    field("name", &format!("{} {}", user.given_name, user.family_name));
    field("job_title", &user.job_title);
    field("organization", &user.organization);
    field("department", &user.department);
    field("manager", &user.manager);
    if !user.roles.is_empty() {
        field("roles", &user.roles.join(", "));
    }
    field("active", if user.active { "yes" } else { "no" });
    if let Some(created) = &user.created_at {
        field("created_at", created);
    }
    println!();
}

// ── Photos ──

pub fn print_exif_batch(photos: &[PhotoAttachment], batch: &ExifBatch) {
    for photo in photos {
        println!("  {:<26} {}", photo.filename, batch.badge(&photo.filename));
    }
    match batch.primary() {
        Some(fix) => println!("  {:<26} {}", "primary fix", fix.display()),
        None => println!("  {:<26} none", "primary fix"),
    }
}

// ── Helpers ──

fn field(name: &str, value: &str) {
    println!("  {:<26} {}", name, value);
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars - 3).collect();
    format!("{cut}...")
}
