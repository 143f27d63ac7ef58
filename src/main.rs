use anyhow::{Context, Result};
use serde::Deserialize;

use inforecord_core::{Config, ConfigError};
use inforecord_map::{
    InMemoryProvider, JsonFileStore, MapEvent, PinDatabase, PlaceDetails, PlaceRequest,
    RetryPolicy, ScreenId, ScreenPoint, WeatherMapController,
};

/// One step of a replayed weather map session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Click { lat: f64, lng: f64 },
    Tap { x: f64, y: f64 },
    TapDraft,
    TapPin(usize),
    Label(String),
    Keyword(String),
    Close,
    Commit,
}

/// Weather attached to exported pins until a forecast source is wired in.
fn replay_details() -> PlaceDetails {
    PlaceDetails {
        comment: String::new(),
        color: "#4A90E2".to_string(),
        weather: "Clear".to_string(),
        temperature: 18.0,
        humidity: 55.0,
    }
}

fn demo_steps(config: &Config) -> Vec<Step> {
    let (lat, lng) = (config.map.center_lat, config.map.center_lng);
    vec![
        Step::Click { lat, lng },
        Step::Label("카페".to_string()),
        Step::Keyword("따뜻한".to_string()),
        Step::Commit,
        Step::Tap { x: 60.0, y: 80.0 },
        Step::Label("산책로".to_string()),
        Step::Close,
        Step::TapDraft,
        Step::Commit,
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    inforecord_core::init()?;

    let (config, _) = Config::load_validated().map_err(|e| {
        if let Some(config_err) = e.downcast_ref::<ConfigError>() {
            println!("{}", config_err.user_message());
        }
        e
    })?;

    let steps = match std::env::args().nth(1) {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session script {}", path))?;
            serde_json::from_str(&contents).context("Failed to parse session script")?
        }
        None => demo_steps(&config),
    };

    let form_store = JsonFileStore::open(config.form_path())?;
    let pins = PinDatabase::open(&config.pins_db_path())?;

    let mut controller = WeatherMapController::new(InMemoryProvider::new(), form_store, &config)?
        .with_pin_database(pins);
    controller.on_navigate_request(|screen: &ScreenId| {
        tracing::info!("Navigation requested: {}", screen.as_str());
    });

    let restored = controller.restore_pins()?;

    match controller.load_map(&RetryPolicy::from_config(&config.map)).await {
        Ok(drawn) => tracing::info!("Map ready, drew {} of {} stored pin(s)", drawn, restored),
        Err(e) => {
            println!("{}", e.user_message());
            return Ok(());
        }
    }

    for step in steps {
        let event = match step {
            Step::Click { lat, lng } => MapEvent::Click { lat, lng },
            Step::Tap { x, y } => MapEvent::Pointer(ScreenPoint::new(x, y)),
            Step::TapDraft => match controller.draft_marker() {
                Some(handle) => MapEvent::MarkerClick(handle),
                None => {
                    println!("  ! no draft pin to tap");
                    continue;
                }
            },
            Step::TapPin(index) => {
                let handle = controller
                    .store()
                    .iter()
                    .nth(index)
                    .and_then(|pin| controller.pin_marker(pin.id()));
                match handle {
                    Some(handle) => MapEvent::MarkerClick(handle),
                    None => {
                        println!("  ! no saved pin #{}", index);
                        continue;
                    }
                }
            }
            Step::Label(text) => MapEvent::SetLabel(text),
            Step::Keyword(text) => MapEvent::SetKeyword(text),
            Step::Close => MapEvent::CloseOverlay,
            Step::Commit => MapEvent::Commit,
        };

        if let Err(e) = controller.handle(event) {
            tracing::warn!("Event rejected: {}", e);
            println!("  ! {}", e.user_message());
        }
    }

    println!("Saved pins:");
    for pin in controller.store().iter() {
        println!(
            "  {} {} '{}' [{}]",
            pin.created_at().format("%Y-%m-%d %H:%M:%S"),
            pin.position(),
            pin.label(),
            pin.keyword()
        );

        let request = PlaceRequest::from_marker(pin, replay_details());
        let validation = request.validate();
        if validation.is_valid() {
            let payload =
                serde_json::to_string(&request).context("Failed to serialize place request")?;
            println!("    export {}", payload);
        } else {
            println!("    not exportable: {}", validation.error_summary());
        }
    }

    Ok(())
}
