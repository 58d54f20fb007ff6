//! Integration tests for fetching and page runs
//!
//! These tests use wiremock to stand in for the directory sites and drive
//! the adapters and the pipeline end to end.

mod fetcher_tests;
mod pipeline_tests;

use carrier_scout::Config;

/// Default configuration with every source pointed at `base_url`
///
/// Delays are shortened so retries and politeness pauses do not slow the
/// suite down.
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.http.retry_delay_ms = 10;
    config.http.detail_timeout_secs = 5;

    for source in [
        &mut config.sources.portal_dos_fretes,
        &mut config.sources.cargas,
        &mut config.sources.guia_do_transporte,
    ] {
        source.base_url = base_url.to_string();
        source.politeness_delay_ms = 0;
    }

    config
}
