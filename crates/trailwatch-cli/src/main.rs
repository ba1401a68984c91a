mod display;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use trailwatch_client::{
    Dashboard, FixedPosition, Geocoder, IncidentClient, IncidentEvents, NewUser, ReverseGeocoder,
    Submission, scan_photos, select_photos, use_current_location,
};
use trailwatch_core::{
    AppConfig, Coordinates, Filter, IncidentDraft, IncidentType, LocationMode, PhotoAttachment,
    Severity, parse_coordinates_in_text, parse_float,
};

#[derive(Parser)]
#[command(name = "trailwatch", version, about = "Report and triage hiking-trail incidents")]
struct Cli {
    /// Runtime configuration file
    #[arg(long, global = true, env = "TRAILWATCH_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Bearer token for authenticated calls
    #[arg(long, global = true, env = "TRAILWATCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a new incident report
    Report(ReportArgs),
    /// List incidents, filtered and sorted as on the dashboard
    Incidents {
        #[arg(long, default_value = "all")]
        severity: Filter<Severity>,
        #[arg(long = "type", default_value = "all")]
        incident_type: Filter<IncidentType>,
        /// Focus a single incident
        #[arg(long)]
        select: Option<String>,
    },
    /// Mark an incident resolved
    Resolve { id: String },
    /// Manage the user directory
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },
    /// Show GPS metadata found in photos
    Exif {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Reverse geocode a coordinate pair
    #[command(allow_negative_numbers = true)]
    Geocode { lat: f64, lng: f64 },
    /// Print the effective configuration
    Config,
}

#[derive(clap::Args)]
struct ReportArgs {
    #[arg(long = "type")]
    incident_type: Option<IncidentType>,
    #[arg(long)]
    severity: Option<Severity>,
    #[arg(long)]
    description: String,
    /// gps_or_text or photo_metadata
    #[arg(long)]
    location_mode: Option<LocationMode>,
    /// Trail name, landmark or town; may embed "lat, lng"
    #[arg(long)]
    location_text: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<String>,
    /// Photo to attach (repeatable)
    #[arg(long = "photo")]
    photos: Vec<PathBuf>,
    /// Current device position as "LAT,LNG"
    #[arg(long, allow_hyphen_values = true)]
    here: Option<String>,
}

#[derive(Subcommand)]
enum UsersCommand {
    List,
    Create {
        #[arg(long)]
        user_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        given_name: String,
        #[arg(long)]
        family_name: String,
        #[arg(long, env = "TRAILWATCH_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        inactive: bool,
    },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config).with_env_overrides();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "trailwatch starting");

    let client = IncidentClient::from_config(&config).with_token(cli.token.clone());

    match cli.command {
        Command::Report(args) => report(&config, client, args).await?,
        Command::Incidents {
            severity,
            incident_type,
            select,
        } => {
            let mut dashboard = Dashboard::new(client);
            dashboard.refresh().await.context("loading incidents")?;
            let state = dashboard.state_mut();
            state.set_severity(severity);
            state.set_incident_type(incident_type);
            state.select(select);

            display::print_dashboard(&dashboard.view());
            if let Some(command) = dashboard.map_command() {
                display::print_viewport(&command);
            }
        }
        Command::Resolve { id } => {
            let mut dashboard = Dashboard::new(client);
            let updated = dashboard.resolve(&id).await.context("updating status")?;
            println!("Incident {} is now {}", updated.id, updated.status);
        }
        Command::Users { action } => users(&client, action).await?,
        Command::Exif { files } => {
            let photos = read_photos(&files)?;
            let (photos, batch) = scan_photos(photos).await;
            display::print_exif_batch(&photos, &batch);
        }
        Command::Geocode { lat, lng } => {
            let place = Geocoder::from_config(&config)
                .reverse(Coordinates::new(lat, lng))
                .await;
            println!("{place}");
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}

async fn report(config: &AppConfig, client: IncidentClient, args: ReportArgs) -> anyhow::Result<()> {
    let mut draft = IncidentDraft::new();
    draft.incident_type = args.incident_type.unwrap_or_default();
    draft.severity = args.severity.unwrap_or_default();
    draft.description = args.description;
    draft.location_mode = args.location_mode.unwrap_or_default();

    if let Some(here) = args.here {
        let coords = parse_here(&here)?;
        let geocoder = Geocoder::from_config(config);
        use_current_location(&mut draft, &FixedPosition(coords), &geocoder).await?;
    }
    if let Some(text) = args.location_text {
        draft.set_location_text(text);
    }
    match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => draft.set_manual_coordinates(&lat, &lng),
        (None, None) => {}
        _ => bail!("--lat and --lng must be given together"),
    }

    if !args.photos.is_empty() {
        select_photos(&mut draft, read_photos(&args.photos)?).await;
        display::print_exif_batch(draft.photos(), draft.exif());
        println!();
    }

    let submission = Submission::new();
    let incident = submission
        .submit(&mut draft, &client, &IncidentEvents::new())
        .await?;
    if let Some(message) = submission.current_message(Instant::now()) {
        println!("{}", message.text);
        println!();
    }
    display::print_incident_card(&incident);
    Ok(())
}

async fn users(client: &IncidentClient, action: UsersCommand) -> anyhow::Result<()> {
    match action {
        UsersCommand::List => {
            let users = client.list_users().await.context("listing users")?;
            println!("{} users", users.len());
            println!();
            for user in &users {
                display::print_user_card(user);
            }
        }
        UsersCommand::Create {
            user_name,
            email,
            given_name,
            family_name,
            password,
            inactive,
        } => {
            let user = NewUser {
                user_name,
                email,
                given_name,
                family_name,
                password,
                active: !inactive,
            };
            client.create_user(&user).await.context("creating user")?;
            println!("Created user {}", user.user_name);
        }
        UsersCommand::Delete { id } => {
            client.delete_user(&id).await.context("deleting user")?;
            println!("Deleted user {id}");
        }
    }
    Ok(())
}

fn parse_here(value: &str) -> anyhow::Result<Coordinates> {
    let parsed = parse_coordinates_in_text(value)
        .and_then(|(lat, lng)| Some(Coordinates::new(parse_float(&lat)?, parse_float(&lng)?)));
    match parsed {
        Some(coords) => Ok(coords),
        None => bail!("--here expects \"LAT,LNG\", got {value:?}"),
    }
}

fn read_photos(paths: &[PathBuf]) -> anyhow::Result<Vec<PhotoAttachment>> {
    paths
        .iter()
        .map(|p| PhotoAttachment::from_path(p).with_context(|| format!("reading {}", p.display())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn here_accepts_negative_pairs() {
        assert_eq!(
            parse_here("-33.5,-70.25").unwrap(),
            Coordinates::new(-33.5, -70.25)
        );
        assert!(parse_here("somewhere").is_err());
    }

    #[test]
    fn incidents_filters_parse() {
        let cli = Cli::try_parse_from([
            "trailwatch",
            "incidents",
            "--severity",
            "High",
            "--type",
            "all",
        ])
        .unwrap();
        match cli.command {
            Command::Incidents {
                severity,
                incident_type,
                select,
            } => {
                assert_eq!(severity, Filter::Only(Severity::High));
                assert_eq!(incident_type, Filter::All);
                assert_eq!(select, None);
            }
            _ => panic!("expected incidents"),
        }
    }
}
