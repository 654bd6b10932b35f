use anyhow::Result;
use content_scraper::datasource::repository::content::PgContentRepository;
use content_scraper::enricher::catalog::Catalog;
use content_scraper::jobs::pipeline::Pipeline;
use content_scraper::jobs::poller::{self, ScrapePoller};
use content_scraper::scraper::kat::KatSearch;
use content_scraper::scraper::ProviderConfig;
use content_scraper::state::{AppState, ScraperConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ScraperConfig::from_env()?;
    let app_state = AppState::from_env()?;
    sqlx::migrate!().run(&app_state.pool).await?;

    let search = KatSearch::new(app_state.client.clone(), config.kat_base()?);
    let trakt = trakt::Client::new(&config.trakt_client_id, app_state.client.clone())?;
    let catalog = Catalog::new(trakt, app_state.client.clone());
    let repository = PgContentRepository::new(app_state.pool.clone());
    let pipeline =
        Pipeline::new(search, catalog, repository)?.with_concurrency(config.concurrency);
    let providers = ProviderConfig::defaults()
        .into_iter()
        .map(|p| p.with_max_pages(config.max_pages))
        .collect();

    let cancel = CancellationToken::new();
    let job = ScrapePoller::new(pipeline, providers);
    let handle = poller::start_with_period(job, config.interval(), cancel.clone())?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down after the current run");
    cancel.cancel();
    handle.await?;
    Ok(())
}
