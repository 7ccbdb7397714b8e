use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::attributes::compute;
use super::elements_cache::ElementsCache;
use super::error::CycleError;
use super::position::PositionSource;
use super::registry::SubscriberRegistry;
use super::snapshot::{Published, TelemetrySnapshot};
use crate::orbit::{track_since, IlluminationOracle, TrackWindow};

/// Runs one broadcast cycle at a time: fetch and propagate in parallel, derive
/// attributes, publish.
pub struct BroadcastScheduler {
    pub elements: Arc<ElementsCache>,
    pub position: Arc<dyn PositionSource>,
    pub registry: Arc<SubscriberRegistry>,
    pub oracle: Arc<dyn IlluminationOracle>,
    pub window: TrackWindow,
    pub crew_count: u32,
}

impl BroadcastScheduler {
    /// One broadcast tick centered on `now`. On a failed position fetch the
    /// latest snapshot and all subscribers are left untouched.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<usize, CycleError> {
        let elements = self.elements.current();
        let track_elements = elements.clone();
        let window = self.window;

        let (fetched, track) = tokio::join!(
            self.position.fetch_current(),
            tokio::task::spawn_blocking(move || {
                track_since(track_elements.as_deref(), now, window)
            }),
        );

        let sample = match fetched {
            Ok(sample) => sample,
            Err(e) => {
                log::error!("skipping broadcast, no position this cycle: {}", e);
                return Err(e.into());
            }
        };

        let track = track.unwrap_or_else(|e| {
            log::error!("track propagation task failed: {}", e);
            Vec::new()
        });

        let attributes = compute(elements.as_deref(), &sample, now, self.oracle.as_ref());
        let snapshot =
            TelemetrySnapshot::assemble(sample, track, attributes, self.crew_count, now);
        let published = match Published::new(snapshot) {
            Ok(published) => published,
            Err(e) => {
                log::error!("skipping broadcast, snapshot could not be encoded: {}", e);
                return Err(e.into());
            }
        };

        if self.registry.is_empty() {
            log::debug!("published snapshot with no subscribers connected");
        }
        Ok(self.registry.publish(published))
    }

    pub async fn refresh_elements(&self) {
        // failures are logged by the cache; the next refresh is the retry
        let _ = self.elements.refresh().await;
    }
}

#[derive(Debug)]
struct WorkerHandle {
    name: &'static str,
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the elements-refresh and broadcast tasks for the life of the process.
#[derive(Debug)]
pub struct Supervisor {
    workers: Vec<WorkerHandle>,
}

impl Supervisor {
    pub fn start(
        scheduler: Arc<BroadcastScheduler>,
        refresh_every: Duration,
        broadcast_every: Duration,
    ) -> Self {
        log::info!(
            "starting telemetry tasks (refresh every {}, broadcast every {})",
            humantime::format_duration(refresh_every),
            humantime::format_duration(broadcast_every)
        );

        let refresher = scheduler.clone();
        let refresh = spawn_periodic("elements-refresh", refresh_every, move || {
            let scheduler = refresher.clone();
            async move { scheduler.refresh_elements().await }
        });

        let broadcast = spawn_periodic("broadcast", broadcast_every, move || {
            let scheduler = scheduler.clone();
            async move {
                let _ = scheduler.tick(Utc::now()).await;
            }
        });

        Self {
            workers: vec![refresh, broadcast],
        }
    }

    /// Signal both tasks and wait for any in-flight tick to finish.
    pub async fn shutdown(self) {
        for worker in self.workers {
            let _ = worker.stop_tx.send(());
            if let Err(e) = worker.join.await {
                log::error!("{} task ended abnormally: {}", worker.name, e);
            }
        }
        log::info!("telemetry tasks stopped");
    }
}

/// Run `task` every `period`, starting immediately. Runs never overlap;
/// ticks that fall due while a run is in progress are skipped.
fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut task: F) -> WorkerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel();

    let join = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => task().await,
                _ = &mut stop_rx => break,
            }
        }
        log::debug!("{} task stopped", name);
    });

    WorkerHandle {
        name,
        stop_tx,
        join,
    }
}
