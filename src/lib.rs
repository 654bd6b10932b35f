pub mod datasource;
pub mod enricher;
pub mod errors;
pub mod extractor;
pub mod jobs;
pub mod merger;
pub mod models;
pub mod reconcile;
pub mod scraper;
pub mod state;

#[cfg(test)]
mod testing;
