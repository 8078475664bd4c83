mod stats;

pub use stats::{RunReport, Stats};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use hdrhistogram::{AdditionError, CreationError};
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    client::SearchTarget, command::SearchCommand, profile::LoadProfile, sampler::QuerySampler,
};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to create a latency histogram: {0}")]
    Histogram(#[from] CreationError),
    #[error("Failed to merge latency histograms: {0}")]
    Merge(#[from] AdditionError),
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub profile: LoadProfile,
    /// How often the number of running virtual users is adjusted to the profile.
    pub tick: Duration,
    /// How long in-flight iterations may take to finish once the profile is over.
    pub graceful_stop: Duration,
    /// Virtual user `n` is seeded with `seed + n`. Without a seed every user is seeded from the OS.
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            profile: LoadProfile::default(),
            tick: Duration::from_millis(100),
            graceful_stop: Duration::from_secs(30),
            seed: None,
        }
    }
}

struct VirtualUser {
    id: usize,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Stats>,
}

impl VirtualUser {
    fn spawn<TTarget: SearchTarget>(
        id: usize,
        sampler: QuerySampler,
        target: TTarget,
        seed: Option<u64>,
        stats: Stats,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_os_rng(),
        };

        let handle = tokio::spawn(virtual_user(
            id,
            sampler,
            target,
            rng,
            stop.clone(),
            stats,
        ));

        Self { id, stop, handle }
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[instrument(skip(sampler, target, rng, stop, stats))]
async fn virtual_user<TTarget: SearchTarget>(
    id: usize,
    sampler: QuerySampler,
    mut target: TTarget,
    mut rng: StdRng,
    stop: Arc<AtomicBool>,
    mut stats: Stats,
) -> Stats {
    debug!("started");

    while !stop.load(Ordering::Relaxed) {
        let command = SearchCommand::new(sampler.sample(&mut rng));

        let started = Instant::now();
        let outcome = target.search(&command).await;
        stats.record(started.elapsed(), outcome.is_ok());

        if let Err(error) = outcome {
            debug!(query = %command.query(), "iteration failed: {error}");
        }

        // a target that never suspends would otherwise starve the controller
        tokio::task::yield_now().await;
    }

    debug!("stopped after {} iterations", stats.iterations());

    stats
}

/// Runs virtual users against `target` following the load profile, then waits for them to
/// finish their last iteration.
///
/// Failed iterations are counted, never retried.
pub async fn run<TTarget: SearchTarget>(
    sampler: QuerySampler,
    target: TTarget,
    options: &RunOptions,
) -> Result<RunReport, RunError> {
    let mut active: Vec<VirtualUser> = vec![];
    let mut retired: Vec<VirtualUser> = vec![];
    let mut peak_users = 0;

    info!(
        profile = %options.profile,
        words = sampler.corpus().len(),
        "starting the load test"
    );

    let start = Instant::now();

    while let Some(target_users) = options.profile.target_at(start.elapsed()) {
        while active.len() < target_users {
            let id = active.len() + retired.len();

            active.push(VirtualUser::spawn(
                id,
                sampler.clone(),
                target.clone(),
                options.seed,
                Stats::new()?,
            ));
        }

        while active.len() > target_users {
            let Some(user) = active.pop() else { break };

            user.stop();
            retired.push(user);
        }

        if active.len() > peak_users {
            peak_users = active.len();
            debug!("{peak_users} virtual users running");
        }

        time::sleep(options.tick).await;
    }

    let elapsed = start.elapsed();

    info!("profile finished, stopping {} virtual users", active.len());

    for user in &active {
        user.stop();
    }

    let mut total = Stats::new()?;
    let mut aborted_users = 0;
    // too far out to represent means no deadline at all
    let deadline = Instant::now().checked_add(options.graceful_stop);

    for mut user in active.into_iter().chain(retired) {
        let finished = match deadline {
            Some(deadline) => time::timeout_at(deadline, &mut user.handle).await,
            None => Ok((&mut user.handle).await),
        };

        match finished {
            Ok(Ok(stats)) => total.merge(&stats)?,
            Ok(Err(join_error)) => error!("virtual user {} failed: {join_error}", user.id),
            Err(_) => {
                warn!(
                    "virtual user {} did not finish within {:?}, aborting",
                    user.id, options.graceful_stop
                );

                user.handle.abort();
                aborted_users += 1;
            }
        }
    }

    let report = RunReport {
        stats: total,
        elapsed,
        peak_users,
        aborted_users,
    };

    info!("load test finished");

    Ok(report)
}
