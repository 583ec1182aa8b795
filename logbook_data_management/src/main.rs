use std::path::PathBuf;

use logbook_data_management::DataManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// CLI for manual data operations.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("register-user") => {
            let Some(name) = args.get(2) else {
                eprintln!("Usage: register-user <name>");
                std::process::exit(1);
            };
            let manager = DataManager::start().await?;
            let user = manager.register_user(name.clone()).await?;
            println!("Registered user {} with id {}", user.name, user.user_id);
            println!("API token: {}", user.api_token);
        }
        Some("import-gpx") => {
            let (Some(user_id), Some(path)) = (args.get(2), args.get(3)) else {
                eprintln!("Usage: import-gpx <user_id> <path> [title]");
                std::process::exit(1);
            };
            let user_id: i64 = user_id.parse()?;
            let manager = DataManager::start().await?;
            let trip = manager
                .import_gpx_trip(user_id, &PathBuf::from(path), args.get(4).cloned())
                .await?;
            println!(
                "Imported trip {} \"{}\": {:.2} NM over {} minutes",
                trip.trip_id, trip.title, trip.distance_nm, trip.duration_minutes
            );
        }
        _ => {
            eprintln!("Usage: register-user <name> | import-gpx <user_id> <path> [title]");
            std::process::exit(1);
        }
    }

    Ok(())
}
