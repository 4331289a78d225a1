use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webtoon_sync::app::App;
use webtoon_sync::models::SyncRequest;

#[derive(Debug, Parser)]
#[command(name = "webtoon-sync")]
#[command(about = "Sync webtoon episode images from storage into the database")]
struct CliArgs {
    /// Storage folder holding the episode images, e.g. AKS/001.
    #[arg(value_name = "FOLDER")]
    folder: String,

    /// Id of the work the episode belongs to.
    #[arg(short, long)]
    work_id: i64,

    /// Episode number within the work.
    #[arg(short, long)]
    episode: i64,

    /// Title used when a new episode record is created.
    #[arg(short, long)]
    title: Option<String>,
}

impl CliArgs {
    fn into_request(self) -> SyncRequest {
        let title = self
            .title
            .unwrap_or_else(|| format!("Episode {}", self.episode));
        SyncRequest {
            work_id: self.work_id,
            episode_number: self.episode,
            title,
            folder: self.folder.trim_matches('/').to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webtoon_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting webtoon-sync");

    let request = CliArgs::parse().into_request();

    match App::new() {
        Ok(app) => match app.run(&request).await {
            Ok(report) => {
                info!(
                    "Sync completed: episode {} now has {} image(s)",
                    report.episode_id, report.image_count
                );
                Ok(())
            }
            Err(e) => {
                error!("Sync failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
