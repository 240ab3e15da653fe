//! Sequential fetch loop building a [`ReportStore`] from a URL list.

use pagespeed_core::UrlSpec;
use tracing::Instrument;

use crate::client::ReportSource;
use crate::retry::{retry_classified, RetryPolicy, Sleeper, TokioSleeper};
use crate::store::ReportStore;

/// Result of a fetch run: the populated store plus the entries whose
/// attempts were all exhausted.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub store: ReportStore,
    pub dropped: Vec<UrlSpec>,
}

impl FetchOutcome {
    #[must_use]
    pub fn into_store(self) -> ReportStore {
        self.store
    }
}

/// Requests one report per [`UrlSpec`], strictly one at a time and in input
/// order, retrying each entry under a [`RetryPolicy`].
pub struct Fetcher<S, Z = TokioSleeper> {
    source: S,
    sleeper: Z,
    policy: RetryPolicy,
}

impl<S: ReportSource> Fetcher<S, TokioSleeper> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self::with_sleeper(source, TokioSleeper, policy)
    }
}

impl<S: ReportSource, Z: Sleeper> Fetcher<S, Z> {
    pub fn with_sleeper(source: S, sleeper: Z, policy: RetryPolicy) -> Self {
        Self {
            source,
            sleeper,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches every entry of `specs`.
    ///
    /// An entry whose attempts are all exhausted is left out of the store and
    /// recorded in [`FetchOutcome::dropped`]; the run carries on with the next
    /// entry.
    pub async fn fetch(&self, specs: &[UrlSpec]) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let total = specs.len();

        for (row, spec) in specs.iter().enumerate() {
            let span = tracing::info_span!(
                "fetch_report",
                row,
                url = %spec.url,
                device = %spec.device_type
            );
            let result = retry_classified(&self.policy, &self.sleeper, |attempt| {
                tracing::info!(attempt, "requesting report");
                self.source.fetch_report(&spec.url, spec.device_type)
            })
            .instrument(span.clone())
            .await;

            let _entered = span.enter();
            match result {
                Ok(report) => {
                    outcome
                        .store
                        .insert(spec.device_type, &spec.url, report, &spec.page_type);
                    tracing::info!(done = row + 1, total, "stored report");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "all attempts failed, dropping entry");
                    outcome.dropped.push(spec.clone());
                }
            }
        }

        tracing::info!(
            requested = total,
            dropped = outcome.dropped.len(),
            "fetch run complete"
        );
        outcome
    }
}
