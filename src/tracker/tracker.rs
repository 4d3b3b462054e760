use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::error::TrackerError;
use super::orientation::OrientationTracker;
use super::types::{
    AngleUnit, CalibrationOffset, CalibrationState, CalibrationStrategy, Orientation,
    UpdateResult,
};
use crate::sample::{decode, decode_environment, EnvSample};
use crate::sink::{CalibrationSource, PublishSink};

const QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TrackerStatus {
    pub running: bool,
    pub state: CalibrationState,
    pub strategy: CalibrationStrategy,
    pub orientation: Orientation,
    pub offset: CalibrationOffset,
    pub samples_processed: u64,
    pub samples_rejected: u64,
    pub publishes: u64,
    pub publish_failures: u64,
    pub last_published: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Counters {
    samples_processed: u64,
    samples_rejected: u64,
    publishes: u64,
    publish_failures: u64,
}

#[derive(Debug)]
struct Shared {
    core: OrientationTracker,
    environment: Option<EnvSample>,
    counters: Counters,
    last_published: Option<DateTime<Utc>>,
}

struct Ingest {
    payload: Vec<u8>,
    reply: oneshot::Sender<Result<UpdateResult, TrackerError>>,
}

struct WorkerHandle {
    queue: mpsc::Sender<Ingest>,
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the orientation state and the single worker that applies samples to
/// it. Every method takes `&self`, so the tracker can be shared behind an
/// `Arc` between the HTTP API and the device reader.
pub struct Tracker {
    shared: Arc<StdMutex<Shared>>,
    sink: Arc<dyn PublishSink>,
    calibration_source: Option<Arc<dyn CalibrationSource>>,
    worker: StdMutex<Option<WorkerHandle>>,
}

impl Tracker {
    pub fn new(
        core: OrientationTracker,
        sink: Arc<dyn PublishSink>,
        calibration_source: Option<Arc<dyn CalibrationSource>>,
    ) -> Self {
        Self {
            shared: Arc::new(StdMutex::new(Shared {
                core,
                environment: None,
                counters: Counters::default(),
                last_published: None,
            })),
            sink,
            calibration_source,
            worker: StdMutex::new(None),
        }
    }

    /// Spawn the ingest worker. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), TrackerError> {
        let mut worker = lock(&self.worker);
        if worker.is_some() {
            return Err(TrackerError::AlreadyRunning);
        }

        let (queue, queue_rx) = mpsc::channel(QUEUE_DEPTH);
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_ingest_loop(
            self.shared.clone(),
            self.sink.clone(),
            queue_rx,
            stop_rx,
        ));

        *worker = Some(WorkerHandle {
            queue,
            stop_tx,
            join,
        });
        log::info!("Tracker started");
        Ok(())
    }

    pub async fn stop(&self) {
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
            log::info!("Tracker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).is_some()
    }

    /// Queue a raw azimuth/altitude payload and wait until the worker has
    /// applied it (and published the result, if it changed).
    pub async fn submit(&self, payload: Vec<u8>) -> Result<UpdateResult, TrackerError> {
        let queue = lock(&self.worker)
            .as_ref()
            .map(|w| w.queue.clone())
            .ok_or(TrackerError::NotRunning)?;

        let (reply, response) = oneshot::channel();
        queue
            .send(Ingest { payload, reply })
            .await
            .map_err(|_| TrackerError::NotRunning)?;
        response.await.map_err(|_| TrackerError::NotRunning)?
    }

    pub fn record_environment(&self, payload: &[u8]) -> Result<EnvSample, TrackerError> {
        let env = decode_environment(payload).map_err(|e| {
            log::warn!("Discarding malformed environment reading: {}", e);
            e
        })?;
        log::info!("Environment: {}", env);
        lock(&self.shared).environment = Some(env);
        Ok(env)
    }

    pub fn environment(&self) -> Option<EnvSample> {
        lock(&self.shared).environment
    }

    pub async fn calibrate(
        &self,
        observed: Option<Orientation>,
    ) -> Result<CalibrationOffset, TrackerError> {
        let strategy = self.strategy();
        let observed = match (observed, strategy) {
            (None, CalibrationStrategy::ExternallyReported) => match &self.calibration_source {
                Some(source) => Some(source.observe().await.map_err(|e| {
                    log::warn!("Calibration source unavailable: {}", e);
                    e
                })?),
                None => None,
            },
            (observed, _) => observed,
        };

        let result = lock(&self.shared).core.calibrate(observed);
        match &result {
            Ok(offset) => log::info!(
                "Calibrated ({}): az_off={:.5} alt_off={:.5}",
                strategy,
                offset.azimuth,
                offset.altitude
            ),
            Err(e) => log::warn!("Calibration failed: {}", e),
        }
        result
    }

    pub fn orientation(&self, unit: AngleUnit) -> Orientation {
        lock(&self.shared).core.get_orientation(unit)
    }

    pub fn strategy(&self) -> CalibrationStrategy {
        lock(&self.shared).core.settings().strategy
    }

    pub fn status(&self) -> TrackerStatus {
        let running = self.is_running();
        let locked = lock(&self.shared);
        TrackerStatus {
            running,
            state: locked.core.state(),
            strategy: locked.core.settings().strategy,
            orientation: locked.core.current(),
            offset: locked.core.offset(),
            samples_processed: locked.counters.samples_processed,
            samples_rejected: locked.counters.samples_rejected,
            publishes: locked.counters.publishes,
            publish_failures: locked.counters.publish_failures,
            last_published: locked.last_published,
        }
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_ingest_loop(
    shared: Arc<StdMutex<Shared>>,
    sink: Arc<dyn PublishSink>,
    mut queue_rx: mpsc::Receiver<Ingest>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        let request = tokio::select! {
            request = queue_rx.recv() => match request {
                Some(request) => request,
                None => break,
            },
            _ = &mut stop_rx => break,
        };

        let result = apply_payload(&shared, &request.payload);
        if let Ok(update) = &result {
            if update.changed {
                publish(&shared, sink.as_ref(), &update.orientation).await;
            }
        }
        let _ = request.reply.send(result);
    }
}

fn apply_payload(
    shared: &StdMutex<Shared>,
    payload: &[u8],
) -> Result<UpdateResult, TrackerError> {
    let sample = match decode(payload) {
        Ok(sample) => sample,
        Err(e) => {
            log::warn!("Discarding malformed sample: {}", e);
            lock(shared).counters.samples_rejected += 1;
            return Err(e.into());
        }
    };

    let mut locked = lock(shared);
    locked.counters.samples_processed += 1;
    Ok(locked.core.update(sample))
}

async fn publish(shared: &StdMutex<Shared>, sink: &dyn PublishSink, orientation: &Orientation) {
    match sink.publish(orientation).await {
        Ok(()) => {
            let mut locked = lock(shared);
            locked.counters.publishes += 1;
            locked.last_published = Some(Utc::now());
        }
        Err(e) => {
            log::warn!("Failed to publish orientation: {}", e);
            lock(shared).counters.publish_failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkError;
    use crate::tracker::{AzimuthRange, SignificanceThresholds, TrackerSettings};
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingSink {
        published: StdMutex<Vec<Orientation>>,
        fail: bool,
    }

    #[async_trait]
    impl PublishSink for RecordingSink {
        async fn publish(&self, orientation: &Orientation) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Status(503));
            }
            self.published.lock().unwrap().push(*orientation);
            Ok(())
        }
    }

    struct FixedView(Orientation);

    #[async_trait]
    impl CalibrationSource for FixedView {
        async fn observe(&self) -> Result<Orientation, SinkError> {
            Ok(self.0)
        }
    }

    fn settings(strategy: CalibrationStrategy) -> TrackerSettings {
        TrackerSettings {
            reference_pose: Orientation::from_degrees(180.0, 36.84),
            thresholds: SignificanceThresholds::default(),
            azimuth_range: AzimuthRange::Positive,
            strategy,
        }
    }

    fn payload(azimuth_deg: f32, altitude_deg: f32) -> Vec<u8> {
        let mut bytes = azimuth_deg.to_le_bytes().to_vec();
        bytes.extend_from_slice(&altitude_deg.to_le_bytes());
        bytes
    }

    #[tokio::test]
    async fn test_publishes_only_significant_changes() {
        let sink = Arc::new(RecordingSink::default());
        let tracker = Tracker::new(
            OrientationTracker::new(settings(CalibrationStrategy::SelfReferential)),
            sink.clone(),
            None,
        );
        tracker.start().unwrap();

        assert!(!tracker.submit(payload(179.999, 36.84)).await.unwrap().changed);
        assert!(tracker.submit(payload(170.0, 36.84)).await.unwrap().changed);
        assert!(!tracker.submit(payload(170.0, 36.84)).await.unwrap().changed);
        tracker.stop().await;

        let published = sink.published.lock().unwrap().clone();
        assert_eq!(published.len(), 1);
        assert!((published[0].azimuth - 170f64.to_radians()).abs() < 1e-9);

        let status = tracker.status();
        assert!(!status.running);
        assert_eq!(status.samples_processed, 3);
        assert_eq!(status.publishes, 1);
        assert!(status.last_published.is_some());
    }

    #[tokio::test]
    async fn test_malformed_payload_leaves_state_untouched() {
        let tracker = Tracker::new(
            OrientationTracker::new(settings(CalibrationStrategy::SelfReferential)),
            Arc::new(RecordingSink::default()),
            None,
        );
        tracker.start().unwrap();
        let before = tracker.orientation(AngleUnit::Radians);

        let result = tracker.submit(vec![0u8; 7]).await;
        assert!(matches!(result, Err(TrackerError::Decode(_))));
        assert_eq!(tracker.orientation(AngleUnit::Radians), before);
        assert_eq!(tracker.status().samples_rejected, 1);
        tracker.stop().await;
    }

    #[tokio::test]
    async fn test_publish_failure_is_not_fatal() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let tracker = Tracker::new(
            OrientationTracker::new(settings(CalibrationStrategy::SelfReferential)),
            sink,
            None,
        );
        tracker.start().unwrap();

        let result = tracker.submit(payload(90.0, 10.0)).await.unwrap();
        assert!(result.changed);
        assert!(tracker.submit(payload(91.0, 10.0)).await.unwrap().changed);

        let status = tracker.status();
        assert_eq!(status.publish_failures, 2);
        assert_eq!(status.publishes, 0);
        tracker.stop().await;
    }

    #[tokio::test]
    async fn test_submit_requires_running_worker() {
        let tracker = Tracker::new(
            OrientationTracker::new(settings(CalibrationStrategy::SelfReferential)),
            Arc::new(RecordingSink::default()),
            None,
        );
        assert!(matches!(
            tracker.submit(payload(1.0, 1.0)).await,
            Err(TrackerError::NotRunning)
        ));

        tracker.start().unwrap();
        assert!(matches!(tracker.start(), Err(TrackerError::AlreadyRunning)));
        tracker.stop().await;
        assert!(matches!(
            tracker.submit(payload(1.0, 1.0)).await,
            Err(TrackerError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_external_calibration_queries_source() {
        let observed = Orientation::from_degrees(100.0, 30.0);
        let tracker = Tracker::new(
            OrientationTracker::new(settings(CalibrationStrategy::ExternallyReported)),
            Arc::new(RecordingSink::default()),
            Some(Arc::new(FixedView(observed))),
        );
        tracker.start().unwrap();
        tracker.submit(payload(90.0, 30.0)).await.unwrap();

        let offset = tracker.calibrate(None).await.unwrap();
        assert!((offset.azimuth - 10f64.to_radians()).abs() < 1e-9);
        assert!(offset.altitude.abs() < 1e-9);
        assert_eq!(tracker.status().state, CalibrationState::Calibrated);

        let result = tracker.submit(payload(90.0, 30.0)).await.unwrap();
        assert!(result.changed);
        assert!((result.orientation.azimuth - observed.azimuth).abs() < 1e-9);
        tracker.stop().await;
    }

    #[tokio::test]
    async fn test_external_calibration_without_source_fails() {
        let tracker = Tracker::new(
            OrientationTracker::new(settings(CalibrationStrategy::ExternallyReported)),
            Arc::new(RecordingSink::default()),
            None,
        );
        assert!(matches!(
            tracker.calibrate(None).await,
            Err(TrackerError::CalibrationInput(_))
        ));
        assert_eq!(tracker.status().state, CalibrationState::Uncalibrated);
    }

    #[test]
    fn test_record_environment() {
        let tracker = Tracker::new(
            OrientationTracker::new(settings(CalibrationStrategy::SelfReferential)),
            Arc::new(RecordingSink::default()),
            None,
        );
        assert!(tracker.environment().is_none());
        assert!(tracker.record_environment(&[0u8; 8]).is_err());

        let mut bytes = 68.5f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&40.0f32.to_le_bytes());
        bytes.extend_from_slice(&43.5f32.to_le_bytes());
        let env = tracker.record_environment(&bytes).unwrap();
        assert_eq!(tracker.environment(), Some(env));
        assert_eq!(env.humidity_pct, 40.0);
    }
}
