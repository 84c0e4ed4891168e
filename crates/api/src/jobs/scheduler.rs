//! Periodic background jobs with cooperative shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
    Hourly,
    Daily,
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
            JobFrequency::Hourly => Duration::from_secs(3600),
            JobFrequency::Daily => Duration::from_secs(86_400),
        }
    }
}

/// A unit of periodic work.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    async fn execute(&self) -> Result<(), String>;
}

/// Runs a job once and logs its result.
async fn run_once(job: &dyn Job) -> bool {
    let start = Instant::now();
    match job.execute().await {
        Ok(()) => {
            info!(
                job = job.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Job completed"
            );
            true
        }
        Err(e) => {
            error!(
                job = job.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "Job failed"
            );
            false
        }
    }
}

/// Owns the spawned job loops.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawns one loop per job. The first run happens one period after start.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            self.handles.push(tokio::spawn(async move {
                let period = job.frequency().duration();
                let mut interval =
                    tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            run_once(job.as_ref()).await;
                        }
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                info!(job = job.name(), "Job stopped");
                                break;
                            }
                        }
                    }
                }
            }));
        }
    }

    /// Signals every loop to stop and waits up to `timeout` for them.
    pub async fn shutdown(self, timeout: Duration) {
        let _ = self.shutdown_tx.send(true);

        let join_all = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };
        if tokio::time::timeout(timeout, join_all).await.is_err() {
            warn!(timeout_ms = timeout.as_millis() as u64, "Job shutdown timed out");
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(3600)
        }

        async fn execute(&self) -> Result<(), String> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("boom".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_job_frequency_duration() {
        assert_eq!(JobFrequency::Seconds(30).duration(), Duration::from_secs(30));
        assert_eq!(JobFrequency::Minutes(2).duration(), Duration::from_secs(120));
        assert_eq!(JobFrequency::Daily.duration(), Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_run_once_reports_result() {
        let runs = Arc::new(AtomicUsize::new(0));
        let ok = CountingJob { runs: runs.clone(), fail: false };
        let failing = CountingJob { runs: runs.clone(), fail: true };

        assert!(run_once(&ok).await);
        assert!(!run_once(&failing).await);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(CountingJob { runs: runs.clone(), fail: false });
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.shutdown(Duration::from_secs(2)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
