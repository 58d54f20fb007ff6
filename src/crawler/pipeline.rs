//! Per-page orchestration for one source
//!
//! A page run goes through four stages:
//! 1. Enumerate the routes on the listing page
//! 2. Extract company summaries from each route page, sequentially
//! 3. Fetch detail pages on the worker pool, one fetch per distinct link
//! 4. Fold every occurrence into the aggregator as results complete
//!
//! Batches are either one route or the whole page, depending on the source's
//! `batch-scope`. The politeness pause follows each batch.

use crate::config::BatchScope;
use crate::crawler::{Aggregator, FetchScheduler};
use crate::model::{CompanySummary, DetailRecord, PageOutcome, Route};
use crate::sources::SourceAdapter;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// A company occurrence together with the route it was listed under
type Occurrence = (Route, CompanySummary);

/// One detail fetch; the occurrence that first requested the link
#[derive(Debug, Clone)]
struct DetailJob {
    link: Url,
    route: Route,
    summary: CompanySummary,
}

/// Runs listing pages of one source end to end
#[derive(Clone)]
pub struct Pipeline {
    adapter: Arc<dyn SourceAdapter>,
}

impl Pipeline {
    pub fn new(adapter: Arc<dyn SourceAdapter>) -> Self {
        Self { adapter }
    }

    pub fn name(&self) -> &'static str {
        self.adapter.name()
    }

    /// Highest listing page index, 0 when the site is unreachable
    pub async fn total_pages(&self) -> u32 {
        self.adapter.total_pages().await
    }

    /// Runs one listing page
    ///
    /// Returns the "no routes" message when the listing page yields no routes,
    /// and otherwise the merged companies (possibly none).
    pub async fn run_page(&self, page: u32) -> PageOutcome {
        let routes = self.adapter.enumerate_routes(page).await;
        if routes.is_empty() {
            tracing::info!("{}: no routes on page {}", self.name(), page);
            return PageOutcome::no_routes(page);
        }

        tracing::info!("{}: {} routes on page {}", self.name(), routes.len(), page);

        let settings = self.adapter.settings();
        let scheduler = FetchScheduler::new(settings.workers, settings.politeness_delay);
        let mut run = PageRun::default();

        match settings.batch_scope {
            BatchScope::Route => {
                for route in &routes {
                    let occurrences = self.collect(std::slice::from_ref(route)).await;
                    self.process(&scheduler, &mut run, occurrences).await;
                    scheduler.pause().await;
                }
            }
            BatchScope::Page => {
                let occurrences = self.collect(&routes).await;
                self.process(&scheduler, &mut run, occurrences).await;
                scheduler.pause().await;
            }
        }

        tracing::info!(
            "{}: page {} done, {} companies",
            self.name(),
            page,
            run.aggregator.len()
        );
        PageOutcome::Companies(run.aggregator.finish())
    }

    /// Company occurrences on the given routes, in route order
    async fn collect(&self, routes: &[Route]) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        for route in routes {
            let summaries = self.adapter.extract_company_summaries(route).await;
            tracing::debug!("{} companies on {}", summaries.len(), route.link);
            occurrences.extend(summaries.into_iter().map(|summary| (route.clone(), summary)));
        }
        occurrences
    }

    /// Fetches what is not known yet and folds the whole batch
    async fn process(
        &self,
        scheduler: &FetchScheduler,
        run: &mut PageRun,
        occurrences: Vec<Occurrence>,
    ) {
        let mut jobs = Vec::new();
        let mut waiting: HashMap<Url, Vec<Occurrence>> = HashMap::new();

        for (route, summary) in occurrences {
            let Some(link) = summary.detail_link.clone() else {
                run.fold(&route, &summary, &DetailRecord::default());
                continue;
            };

            if let Some(record) = run.cache.get(&link).cloned() {
                run.fold(&route, &summary, &record);
                continue;
            }

            let group = waiting.entry(link.clone()).or_default();
            if group.is_empty() {
                jobs.push(DetailJob {
                    link,
                    route: route.clone(),
                    summary: summary.clone(),
                });
            }
            group.push((route, summary));
        }

        if jobs.is_empty() {
            return;
        }

        tracing::debug!(
            "{}: fetching {} detail pages with {} workers",
            self.name(),
            jobs.len(),
            scheduler.workers()
        );

        let adapter = Arc::clone(&self.adapter);
        scheduler
            .run(
                jobs,
                move |job: DetailJob| {
                    let adapter = Arc::clone(&adapter);
                    async move { adapter.extract_details(&job.summary, &job.route).await }
                },
                |job, record: DetailRecord| {
                    for (route, summary) in waiting.remove(&job.link).unwrap_or_default() {
                        run.fold(&route, &summary, &record);
                    }
                    run.cache.insert(job.link, record);
                },
            )
            .await;
    }
}

/// State that lives for one `run_page` call
#[derive(Default)]
struct PageRun {
    aggregator: Aggregator,

    /// Detail records by link, so a company listed on several routes is
    /// fetched once per page
    cache: HashMap<Url, DetailRecord>,
}

impl PageRun {
    fn fold(&mut self, route: &Route, summary: &CompanySummary, record: &DetailRecord) {
        let summary = with_route_context(summary, route);
        self.aggregator.absorb(&summary, record);
    }
}

/// Fills endpoints the summary lacks from the route it was found on
fn with_route_context(summary: &CompanySummary, route: &Route) -> CompanySummary {
    let mut summary = summary.clone();
    if summary.origin_candidate.is_none() {
        summary.origin_candidate = route.origin.clone();
    }
    if summary.destination_candidate.is_none() {
        summary.destination_candidate = route.destination.clone();
    }
    summary
}
