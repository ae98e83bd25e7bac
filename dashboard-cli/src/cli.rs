use std::{fmt, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use dashboard_core::{
    Config, Prediction, ProviderId, SearchController, SearchState, Units,
    provider::places_client_from_config,
    search::{self, MIN_QUERY_CHARS},
};
use inquire::{Password, PasswordDisplayMode, Select, Text};

use crate::{
    app::{App, ChannelNotifier},
    render,
};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-dashboard",
    version,
    about = "Current weather, forecast and air quality for any place"
)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Explicit coordinates instead of geolocation.
#[derive(Debug, Args)]
pub struct Coordinates {
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
}

impl Coordinates {
    fn pair(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a provider.
    Configure {
        /// Provider short name: "openweather" or "google-places".
        provider: String,
    },

    /// Show current weather and forecast.
    Weather {
        /// standard, metric or imperial; defaults to the configured units.
        #[arg(long)]
        units: Option<Units>,

        #[command(flatten)]
        at: Coordinates,
    },

    /// Show air quality.
    Air {
        #[command(flatten)]
        at: Coordinates,
    },

    /// Determine the current position and its name.
    Locate,

    /// Search for a place and show its weather.
    Search {
        /// Initial search text; prompted for when absent.
        query: Option<String>,

        #[arg(long)]
        units: Option<Units>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure { provider } => configure(config, &provider),
            Command::Weather { units, at } => {
                ensure_configured(&config, &[ProviderId::OpenWeather])?;
                let app = App::start(config).await?;
                app.resolve_position(at.pair()).await?;
                show_weather(&app, units).await
            }
            Command::Air { at } => {
                ensure_configured(&config, &[ProviderId::OpenWeather])?;
                let app = App::start(config).await?;
                app.resolve_position(at.pair()).await?;
                show_air(&app).await
            }
            Command::Locate => {
                ensure_configured(&config, &[ProviderId::OpenWeather])?;
                let app = App::start(config).await?;
                app.resolve_position(None).await?;
                show_location(&app).await
            }
            Command::Search { query, units } => {
                ensure_configured(&config, &[ProviderId::OpenWeather, ProviderId::GooglePlaces])?;
                let app = App::start(config).await?;
                search_place(&app, query).await?;
                show_weather(&app, units).await?;
                show_air(&app).await
            }
        }
    }
}

/// Fails before any prompt or request when a needed API key is missing.
fn ensure_configured(config: &Config, providers: &[ProviderId]) -> anyhow::Result<()> {
    if let Some(id) = providers.iter().find(|id| !config.is_provider_configured(**id)) {
        bail!(
            "No API key configured for provider '{id}'.\n\
             Hint: run `weather-dashboard configure {id}` and enter your API key."
        );
    }
    Ok(())
}

fn configure(mut config: Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key);
    config.save()?;

    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show_location(app: &App) -> anyhow::Result<()> {
    let name = match app.dashboard.refresh_location_name().await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(error = %e, "Reverse geocoding failed");
            None
        }
    };

    if let Some(position) = app.dashboard.position() {
        render::position(name.as_deref(), &position);
    }
    if let Some(status) = app.dashboard.geolocation_status() {
        println!("Location permission: {status}");
    }
    Ok(())
}

async fn show_weather(app: &App, units: Option<Units>) -> anyhow::Result<()> {
    let units = units.unwrap_or_else(|| app.config.units());

    if app.dashboard.location_name().is_none() {
        if let Err(e) = app.dashboard.refresh_location_name().await {
            tracing::warn!(error = %e, "Reverse geocoding failed");
        }
    }

    let Some(weather) = app.dashboard.current_weather(Some(units)).await? else {
        println!("No position selected.");
        return Ok(());
    };

    if let Some(position) = app.dashboard.position() {
        render::position(app.dashboard.location_name().as_deref(), &position);
    }
    render::weather(&weather, units);
    Ok(())
}

async fn show_air(app: &App) -> anyhow::Result<()> {
    match app.dashboard.air_pollution().await? {
        Some(air) => render::air(&air),
        None => println!("No position selected."),
    }
    Ok(())
}

enum Choice {
    Place(Prediction),
    Again,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Place(p) => f.write_str(search::display(Some(p))),
            Choice::Again => f.write_str("↺ Search again"),
        }
    }
}

/// Drive the search controller until a place has been resolved into the
/// dashboard's current position.
async fn search_place(app: &App, mut query: Option<String>) -> anyhow::Result<()> {
    let places = places_client_from_config(&app.config)?;
    let (notifier, mut notices) = ChannelNotifier::new();
    let handle = SearchController::spawn(
        places,
        Arc::clone(&app.dashboard),
        Arc::new(notifier),
        app.config.debounce(),
    );
    let mut positions = app.dashboard.subscribe_position();
    let mut view = handle.view();

    loop {
        let text = match query.take() {
            Some(text) => text,
            None => Text::new("Search place:").prompt()?,
        };
        let text = text.trim().to_string();

        if text.chars().count() <= MIN_QUERY_CHARS {
            println!("Type at least {} characters.", MIN_QUERY_CHARS + 1);
            continue;
        }

        handle.input(text.clone());

        let predictions = tokio::time::timeout(
            SEARCH_TIMEOUT,
            view.wait_for(|v| {
                v.state == SearchState::DisplayingPredictions
                    && v.results_for.as_deref() == Some(text.as_str())
            }),
        )
        .await
        .context("Timed out waiting for place predictions")?
        .context("Search stopped unexpectedly")?
        .predictions
        .clone();

        let mut choices: Vec<Choice> = predictions.into_iter().map(Choice::Place).collect();
        choices.push(Choice::Again);

        let prediction = match Select::new("Pick a place:", choices).prompt()? {
            Choice::Place(p) => p,
            Choice::Again => continue,
        };
        let has_place = prediction.place_id.is_some();
        if prediction.is_sentinel() {
            println!("Nothing matched \"{text}\", try another search.");
        }
        handle.select(prediction);

        if !has_place {
            continue;
        }

        tokio::select! {
            position = positions.recv() => {
                let position = position.context("Position updates stopped")?;
                tracing::debug!(%position, "Search resolved");
                return Ok(());
            }
            Some(message) = notices.recv() => {
                eprintln!("{message}");
            }
            _ = tokio::time::sleep(SEARCH_TIMEOUT) => {
                bail!("Timed out waiting for place details");
            }
        }
    }
}
