//! Keeps the record page and the global stats in step with the query state.
//!
//! Every refresh dispatches the record-list request (and, depending on
//! [`StatsRefresh`], the stats request) concurrently on the current task.
//! Dispatch happens when the refresh is called; the returned future only
//! drives the requests, so callers can draw the busy state and accept new
//! input while it runs.
//! Each response is applied as soon as it resolves. Requests carry a
//! generation number so a response for an outdated query can be told apart
//! from the latest one.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::StudentApi;
use crate::models::{StatsSummary, StudentRecord};
use crate::query::{Change, QueryState};

/// What to do with a response that arrives after a newer request went out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Drop it. Only the most recently dispatched request may update the
    /// snapshot.
    #[default]
    LatestOnly,
    /// Apply every response in resolution order. A slow response for an old
    /// query can overwrite newer data.
    ApplyAll,
}

/// When the stats request is re-issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsRefresh {
    /// Only for filter changes, or while no stats have been loaded yet.
    #[default]
    OnFilterChange,
    /// On every query change, pagination included.
    EveryChange,
}

/// Last known good data plus the busy flag for the record-list request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<StudentRecord>,
    pub stats: Option<StatsSummary>,
    pub loading: bool,
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: Snapshot,
    records_generation: u64,
    stats_generation: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the loading flag when the latest record-list request settles,
/// whichever way it settles: success, failure, or the future being dropped.
struct RecordsInFlight<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl Drop for RecordsInFlight<'_> {
    fn drop(&mut self) {
        let mut inner = lock(self.inner);
        if inner.records_generation == self.generation {
            inner.snapshot.loading = false;
        }
    }
}

pub struct DataSynchronizer<A> {
    api: A,
    stale_policy: StalePolicy,
    stats_refresh: StatsRefresh,
    inner: Mutex<Inner>,
}

impl<A: StudentApi> DataSynchronizer<A> {
    pub fn new(api: A, stale_policy: StalePolicy, stats_refresh: StatsRefresh) -> Self {
        Self {
            api,
            stale_policy,
            stats_refresh,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.inner).snapshot.clone()
    }

    /// Re-fetch after a query change. Always fetches the record page; the
    /// stats follow the configured [`StatsRefresh`].
    ///
    /// The requests are registered (and the loading flag raised) as soon as
    /// this is called, before the returned future is first polled.
    pub fn refresh(&self, query: &QueryState, change: Change) -> impl Future<Output = ()> + '_ {
        let with_stats = match self.stats_refresh {
            StatsRefresh::EveryChange => true,
            StatsRefresh::OnFilterChange => {
                change == Change::Filter || lock(&self.inner).snapshot.stats.is_none()
            }
        };
        self.dispatch(query, with_stats)
    }

    /// Fetch both the record page and the stats, regardless of policy.
    pub fn refresh_all(&self, query: &QueryState) -> impl Future<Output = ()> + '_ {
        self.dispatch(query, true)
    }

    /// Fetch the stats alone, leaving the record page untouched.
    pub async fn refresh_stats(&self) {
        let generation = self.begin_stats();
        self.load_stats(generation).await;
    }

    fn dispatch(&self, query: &QueryState, with_stats: bool) -> impl Future<Output = ()> + '_ {
        let query = query.clone();
        let in_flight = self.begin_records();
        let stats_generation = with_stats.then(|| self.begin_stats());
        async move {
            let records = self.load_records(&query, in_flight);
            match stats_generation {
                Some(generation) => {
                    tokio::join!(records, self.load_stats(generation));
                }
                None => records.await,
            }
        }
    }

    fn begin_records(&self) -> RecordsInFlight<'_> {
        let mut inner = lock(&self.inner);
        inner.records_generation += 1;
        inner.snapshot.loading = true;
        RecordsInFlight {
            inner: &self.inner,
            generation: inner.records_generation,
        }
    }

    fn begin_stats(&self) -> u64 {
        let mut inner = lock(&self.inner);
        inner.stats_generation += 1;
        inner.stats_generation
    }

    async fn load_records(&self, query: &QueryState, in_flight: RecordsInFlight<'_>) {
        let generation = in_flight.generation;
        debug!(
            generation,
            page = query.page,
            limit = query.page_size,
            "dispatching student page request"
        );
        let result = self.api.list_students(query).await;

        let mut inner = lock(&self.inner);
        match result {
            Ok(records) => {
                let latest = inner.records_generation;
                if generation == latest || self.stale_policy == StalePolicy::ApplyAll {
                    debug!(generation, count = records.len(), "applying student page");
                    inner.snapshot.records = records;
                } else {
                    warn!(generation, latest, "discarding stale student page");
                }
            }
            Err(err) => {
                warn!(generation, error = %err, "failed to fetch students, keeping previous page");
            }
        }
        drop(inner);
        drop(in_flight);
    }

    async fn load_stats(&self, generation: u64) {
        debug!(generation, "dispatching stats request");
        let result = self.api.fetch_stats().await;

        let mut inner = lock(&self.inner);
        match result {
            Ok(stats) => {
                let latest = inner.stats_generation;
                if generation == latest || self.stale_policy == StalePolicy::ApplyAll {
                    inner.snapshot.stats = Some(stats);
                } else {
                    warn!(generation, latest, "discarding stale stats");
                }
            }
            Err(err) => {
                warn!(generation, error = %err, "failed to fetch stats, keeping previous figures");
            }
        }
    }
}
