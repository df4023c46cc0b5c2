//! `dealerdash` -- admin dashboard for the dealership platform.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default                        | Description                     |
//! |------------------------|----------|--------------------------------|---------------------------------|
//! | `API_BASE_URL`         | no       | `http://localhost:4000/api/v1` | Versioned backend API root      |
//! | `DASHBOARD_LOCALE`     | no       | `en`                           | Locale for new sessions         |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`                           | Per-request timeout             |
//! | `PAGE_SIZE`            | no       | `10`                           | Rows per list page (max 100)    |
//! | `SESSION_FILE`         | no       | `.dealerdash-session.json`     | Where the session is kept       |
//! | `MEDIA360_URL`         | no       | --                             | 360° service root               |
//! | `MEDIA360_TOKEN`       | no       | --                             | 360° service token              |

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealerdash_cli::cli::Cli;
use dealerdash_cli::commands::{describe, App};
use dealerdash_cli::config::DashboardConfig;
use dealerdash_cli::store::SessionStore;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dealerdash=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let session = match SessionStore::new(&config.session_file).load(config.locale) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let app = match App::new(config, session) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", describe(&e));
            return ExitCode::FAILURE;
        }
    };

    match app.run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "Command failed");
            // Failures raised under a toast were already printed.
            if app.notifier().errors_shown() == 0 {
                eprintln!("!! {}", describe(&e));
            }
            ExitCode::FAILURE
        }
    }
}
