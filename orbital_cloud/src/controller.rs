//! Background recomputation of the point cloud.
//!
//! One worker thread per redraw fills a buffer it owns outright. The
//! controller takes the buffer back when the thread is joined and, if the
//! fill completed, publishes it behind an `Arc`. The render side only ever
//! holds published buffers, so it never sees a partially filled cloud.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::cloud::{CloudBuilder, FillOutcome, FillReport, PointCloudBuffer, RedrawRequest};
use crate::error::CloudError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No worker and nothing published yet (or the last run was stopped).
    Idle,
    /// A worker is filling a buffer.
    Running,
    /// A worker has been told to stop and is being joined.
    Cancelling,
    /// The most recent run completed and its buffer is published.
    Ready,
}

type WorkerResult = (PointCloudBuffer, Result<FillReport, CloudError>);

struct Worker {
    handle: JoinHandle<WorkerResult>,
    cancel: CancelToken,
    started: Instant,
    id: u64,
}

/// Owns the sampling worker and the published cloud.
pub struct RecomputeController {
    builder: Arc<CloudBuilder>,
    max_points: usize,
    state: ControllerState,
    worker: Option<Worker>,
    ready: Option<Arc<PointCloudBuffer>>,
    spare: Option<PointCloudBuffer>,
    next_id: u64,
    last_report: Option<FillReport>,
    /// Failure of a run that a newer request replaced.
    superseded_error: Option<CloudError>,
}

impl RecomputeController {
    pub fn new(builder: CloudBuilder, max_points: usize) -> Self {
        Self {
            builder: Arc::new(builder),
            max_points,
            state: ControllerState::Idle,
            worker: None,
            ready: None,
            spare: None,
            next_id: 1,
            last_report: None,
            superseded_error: None,
        }
    }

    /// Cancel and join any running worker, then start a fill for `request`.
    /// Returns the id the new buffer will carry.
    ///
    /// A failure of the superseded worker does not stop the new run; it is
    /// returned by the next `poll`, `wait` or `stop`.
    pub fn request_redraw(&mut self, mut request: RedrawRequest) -> Result<u64, CloudError> {
        if let Err(e) = self.cancel_and_join() {
            log::error!("superseded sampling run failed: {e}");
            self.superseded_error = Some(e);
        }

        if request.params.point_count > self.max_points {
            log::warn!(
                "point count {} clamped to {}",
                request.params.point_count,
                self.max_points
            );
            request.params.point_count = self.max_points;
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut buffer = self.spare.take().unwrap_or_default();
        let cancel = CancelToken::new();
        let builder = Arc::clone(&self.builder);
        let worker_cancel = cancel.clone();

        let handle = std::thread::Builder::new()
            .name("cloud-sampler".into())
            .spawn(move || {
                let result = builder.fill(&mut buffer, &request, id, &worker_cancel);
                (buffer, result)
            })
            .map_err(CloudError::ThreadSpawn)?;

        log::debug!("started sampling run #{id}");
        self.worker = Some(Worker {
            handle,
            cancel,
            started: Instant::now(),
            id,
        });
        self.state = ControllerState::Running;
        Ok(id)
    }

    /// Publish the running fill if it has finished. Returns the id of a
    /// newly published buffer. Never blocks.
    pub fn poll(&mut self) -> Result<Option<u64>, CloudError> {
        self.take_superseded_error()?;
        match &self.worker {
            Some(worker) if worker.handle.is_finished() => self.join_worker(),
            _ => Ok(None),
        }
    }

    /// Block until the running fill finishes and publish it.
    pub fn wait(&mut self) -> Result<Option<FillReport>, CloudError> {
        if self.worker.is_none() {
            self.take_superseded_error()?;
            return Ok(None);
        }
        self.join_worker()?;
        self.take_superseded_error()?;
        Ok(self.last_report)
    }

    /// Stop the current draw. The previously published buffer stays.
    pub fn stop(&mut self) -> Result<(), CloudError> {
        self.cancel_and_join()?;
        self.take_superseded_error()
    }

    /// Cancel and join the worker, ignoring its result. Safe to call twice.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.cancel_and_join() {
            log::warn!("sampling run failed during shutdown: {e}");
        }
        self.superseded_error = None;
    }

    /// Most recently published buffer.
    pub fn ready(&self) -> Option<Arc<PointCloudBuffer>> {
        self.ready.clone()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Time since the running fill started.
    pub fn running_for(&self) -> Option<Duration> {
        self.worker.as_ref().map(|w| w.started.elapsed())
    }

    /// Report of the last fill that was joined.
    pub fn last_report(&self) -> Option<FillReport> {
        self.last_report
    }

    pub fn threads(&self) -> usize {
        self.builder.threads()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    fn take_superseded_error(&mut self) -> Result<(), CloudError> {
        match self.superseded_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn cancel_and_join(&mut self) -> Result<(), CloudError> {
        let Some(worker) = &self.worker else {
            return Ok(());
        };
        log::debug!("cancelling sampling run #{}", worker.id);
        worker.cancel.cancel();
        self.state = ControllerState::Cancelling;
        self.join_worker().map(|_| ())
    }

    fn join_worker(&mut self) -> Result<Option<u64>, CloudError> {
        let Some(worker) = self.worker.take() else {
            return Ok(None);
        };

        let (mut buffer, result) = match worker.handle.join() {
            Ok(joined) => joined,
            Err(payload) => {
                self.state = self.settled_state();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_owned());
                log::error!("sampling run #{} panicked: {message}", worker.id);
                return Err(CloudError::WorkerPanicked(message));
            }
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                buffer.recycle();
                self.spare = Some(buffer);
                self.state = self.settled_state();
                log::error!("sampling run #{} failed: {e}", worker.id);
                return Err(e);
            }
        };
        self.last_report = Some(report);

        match report.outcome {
            FillOutcome::Complete => {
                log::info!(
                    "cloud #{} ready: {} points in {:.3}s on {} threads",
                    worker.id,
                    report.points,
                    report.elapsed.as_secs_f64(),
                    report.threads
                );
                self.publish(buffer);
                self.state = ControllerState::Ready;
                Ok(Some(worker.id))
            }
            FillOutcome::Aborted => {
                log::warn!("sampling run #{} cancelled after {:?}", worker.id, report.elapsed);
                buffer.recycle();
                self.spare = Some(buffer);
                self.state = ControllerState::Idle;
                Ok(None)
            }
        }
    }

    fn publish(&mut self, buffer: PointCloudBuffer) {
        let previous = self.ready.replace(Arc::new(buffer));
        // Reuse the old allocation unless a reader still holds it.
        if let Some(mut old) = previous.and_then(|arc| Arc::try_unwrap(arc).ok()) {
            old.recycle();
            self.spare = Some(old);
        }
    }

    fn settled_state(&self) -> ControllerState {
        if self.ready.is_some() {
            ControllerState::Ready
        } else {
            ControllerState::Idle
        }
    }
}

impl Drop for RecomputeController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
