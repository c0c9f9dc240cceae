use anyhow::{Context, Result};
use clap::Parser;
use strata_fetch::{Outcome, ResourceDescriptor, StreamDownloadEngine};
use tracing::info;

use crate::cli::App;
use crate::client::ClientSetting;
use crate::config::FileConfig;
use crate::ui::tracker::ProgressTrackerBuilder;

mod cli;
mod client;
mod config;
mod credentials;
mod logging;
mod ui;

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();
    logging::init(app.verbose);
    run(app).await
}

async fn run(app: App) -> Result<()> {
    let config = FileConfig::load(app.config.as_deref())?;
    let options = config.options(&app);
    let resource = resource(&app, &config)?;

    let tracker = ProgressTrackerBuilder::default()
        .with_prefix(&file_name(&resource))
        .hidden(app.quiet)
        .build();
    let sink = tracker.clone();
    let options = options.on_progress(move |progress| sink.update(progress));

    let client = ClientSetting::from(&config)
        .build()
        .context("Failed to set up the HTTP client")?;
    let engine = StreamDownloadEngine::new(client).with_options(options);

    let outcome = engine.download(&resource).await;
    tracker.abandon();

    match outcome.with_context(|| format!("Failed to download {}", resource.url))? {
        Outcome::Downloaded { bytes } => {
            info!(destination = %resource.destination.display(), bytes, "saved");
        }
        Outcome::AlreadyPresent => {
            info!(destination = %resource.destination.display(), "already downloaded");
        }
    }
    Ok(())
}

/// The resource with headers from the config file, then the flags.
fn resource(app: &App, config: &FileConfig) -> Result<ResourceDescriptor> {
    let mut resource = ResourceDescriptor::new(app.url.clone(), app.output.clone())
        .user_agent(config.user_agent(app))
        .headers(config.headers.clone());

    if let Some(cookies_file) = &app.cookies_file {
        let token = credentials::access_token(cookies_file)?;
        resource = credentials::authorize(resource, &token);
    }
    Ok(resource.headers(app.headers.iter().cloned()))
}

fn file_name(resource: &ResourceDescriptor) -> String {
    resource
        .destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| resource.url.clone())
}
