//! Run coordinator - main orchestration logic
//!
//! Sequences one run end to end:
//! - Authenticating the session (fatal on failure)
//! - Opening the entry log with a run banner
//! - Discovering listings and spawning one entry workflow per listing
//! - Waiting for every workflow before reporting the summary

use crate::config::Config;
use crate::crawler::auth::authenticate;
use crate::crawler::discovery::{discover, DiscoveryReport};
use crate::crawler::entry::{EntryOutcome, EntryWorkflow};
use crate::output::{print_summary, EntryLog, RunSummary};
use crate::session::{Credentials, SessionContext};
use crate::GiveawayError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Main run coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    session: Arc<SessionContext>,
    log: Arc<EntryLog>,
    credentials: Credentials,
}

impl Coordinator {
    /// Creates a new coordinator with a fresh session
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration
    /// * `credentials` - Sign-in credentials
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(GiveawayError)` - The HTTP client or base URL could not be set up
    pub fn new(config: Config, credentials: Credentials) -> Result<Self, GiveawayError> {
        let session = Arc::new(SessionContext::new(&config)?);
        let log = Arc::new(EntryLog::new(&config.output.entry_log_path));

        Ok(Self {
            config: Arc::new(config),
            session,
            log,
            credentials,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn entry_log(&self) -> &Arc<EntryLog> {
        &self.log
    }

    /// Runs authentication, discovery and entry to completion
    ///
    /// Returns `Err` only when the run could not start: a failed login, an
    /// unwritable entry log or a broken configuration. Individual workflows that
    /// abandon or fail are counted in the summary instead.
    pub async fn run(&self) -> Result<RunSummary, GiveawayError> {
        tracing::info!(
            "Starting run as {} (session jar #{})",
            self.credentials.username(),
            self.session.jar_id()
        );

        authenticate(&self.session, &self.config, &self.credentials).await?;

        let banner = self.log.write_banner().await?;
        tracing::debug!("Entry log {} opened: {}", self.log.path().display(), banner);

        let workflow = EntryWorkflow::new(
            Arc::clone(&self.session),
            Arc::clone(&self.log),
            &self.config,
        )?;
        let limiter = Arc::new(Semaphore::new(
            self.config.crawler.max_concurrent_entries as usize,
        ));
        let mut tasks = JoinSet::new();

        let report = discover(&self.session, &self.config, |listing| {
            let workflow = workflow.clone();
            let limiter = Arc::clone(&limiter);
            tasks.spawn(async move {
                // Never closed, so acquisition only fails if the run is torn down.
                let _permit = limiter.acquire_owned().await.ok();
                workflow.run(listing).await
            });
        })
        .await;

        // Workflows already spawned finish even if discovery itself errored.
        let (abandoned, failed) = drain(&mut tasks).await;
        let report: DiscoveryReport = report?;

        let summary = RunSummary {
            entered: self.log.entered_count().await,
            abandoned,
            failed,
            pages_fetched: report.pages_fetched,
            listings_queued: report.listings_queued,
            discovery_stop: report.stop,
            entry_log_path: self.log.path().to_path_buf(),
        };

        tracing::info!(
            "Run completed: {} entered, {} abandoned, {} failed",
            summary.entered,
            summary.abandoned,
            summary.failed
        );

        Ok(summary)
    }
}

/// Waits for every entry workflow, returning (abandoned, failed) counts
async fn drain(tasks: &mut JoinSet<EntryOutcome>) -> (u64, u64) {
    let mut abandoned = 0;
    let mut failed = 0;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(EntryOutcome::Accepted { .. }) => {}
            Ok(EntryOutcome::Abandoned { .. }) => abandoned += 1,
            Ok(EntryOutcome::Failed { .. }) => failed += 1,
            Err(e) => {
                tracing::error!("Entry workflow panicked or was cancelled: {}", e);
                failed += 1;
            }
        }
    }

    (abandoned, failed)
}

/// Runs one complete giveaway session and prints its summary
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `credentials` - Sign-in credentials
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run completed (possibly with zero entries)
/// * `Err(GiveawayError)` - The run could not start, e.g. the login failed
pub async fn run_giveaways(
    config: Config,
    credentials: Credentials,
) -> Result<RunSummary, GiveawayError> {
    let coordinator = Coordinator::new(config, credentials)?;
    let summary = coordinator.run().await?;
    print_summary(&summary);
    Ok(summary)
}
