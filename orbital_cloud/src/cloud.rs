//! Point buffers and the parallel fill

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::config::{Palette, SamplingConfig};
use crate::dataset::Dataset;
use crate::error::CloudError;
use crate::quantum_state::Component;
use crate::sampler::{Draw, PointSampler, SamplePoint};

/// Where a buffer is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generation {
    /// Never filled, or recycled.
    #[default]
    Stale,
    /// Being filled, or abandoned mid-fill.
    InProgress,
    /// Every slot holds an accepted point.
    Ready,
}

/// User-facing parameters of a cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudParams {
    pub m: i32,
    pub component: Component,
    pub point_count: usize,
}

/// Everything needed to draw one cloud.
#[derive(Debug, Clone)]
pub struct RedrawRequest {
    pub dataset: Arc<Dataset>,
    pub params: CloudParams,
}

/// Fixed-size list of sample points plus the request it was built from.
#[derive(Debug, Default)]
pub struct PointCloudBuffer {
    points: Vec<SamplePoint>,
    generation: Generation,
    id: u64,
    request: Option<RedrawRequest>,
}

impl PointCloudBuffer {
    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Monotonic id of the fill that produced this buffer.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> Option<&RedrawRequest> {
        self.request.as_ref()
    }

    /// Raw bytes for a vertex/instance upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }

    /// Size for `request` and put every slot back at the zero point.
    fn reset(&mut self, request: &RedrawRequest, id: u64) {
        self.points.clear();
        self.points.resize(request.params.point_count, SamplePoint::ZERO);
        self.generation = Generation::InProgress;
        self.id = id;
        self.request = Some(request.clone());
    }

    /// Forget contents but keep the allocation for the next fill.
    pub(crate) fn recycle(&mut self) {
        self.points.clear();
        self.generation = Generation::Stale;
        self.request = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Complete,
    Aborted,
}

/// Summary of one fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillReport {
    pub outcome: FillOutcome,
    pub elapsed: Duration,
    pub points: usize,
    pub threads: usize,
    pub seed: u64,
}

/// Why a slot stopped early.
enum Interrupt {
    Aborted,
    Failed(CloudError),
}

/// Fills buffers in parallel with rayon.
#[derive(Debug)]
pub struct CloudBuilder {
    pool: Option<rayon::ThreadPool>,
    seed: Option<u64>,
    palette: Palette,
}

impl CloudBuilder {
    /// Builder using a dedicated pool of `worker_threads` threads when set,
    /// the global rayon pool otherwise.
    pub fn new(config: &SamplingConfig, palette: Palette) -> Result<Self, CloudError> {
        let pool = match config.worker_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("cloud-fill-{i}"))
                    .build()
                    .map_err(|e| CloudError::Config(format!("sampling pool: {e}")))?,
            ),
            None => None,
        };
        Ok(Self {
            pool,
            seed: config.seed,
            palette,
        })
    }

    /// Threads a fill runs on.
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |pool| pool.current_num_threads())
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Reset `buffer` for `request` and fill every slot. The buffer is
    /// marked Ready only if the fill completes; an aborted buffer stays
    /// InProgress with some slots still at the zero point.
    pub fn fill(
        &self,
        buffer: &mut PointCloudBuffer,
        request: &RedrawRequest,
        id: u64,
        cancel: &CancelToken,
    ) -> Result<FillReport, CloudError> {
        let started = Instant::now();
        buffer.reset(request, id);

        let sampler = PointSampler::new(
            &request.dataset,
            request.params.m,
            request.params.component,
            self.palette,
        )?;
        let seed = self.seed.unwrap_or_else(rand::random);

        let run = |points: &mut [SamplePoint]| {
            points
                .par_iter_mut()
                .enumerate()
                .try_for_each(|(i, slot)| {
                    let mut rng = StdRng::seed_from_u64(slot_seed(seed, i));
                    match sampler.sample(&mut rng, cancel) {
                        Ok(Draw::Accepted(point)) => {
                            *slot = point;
                            Ok(())
                        }
                        Ok(Draw::Aborted) => Err(Interrupt::Aborted),
                        Err(e) => Err(Interrupt::Failed(e)),
                    }
                })
        };

        let result = match &self.pool {
            Some(pool) => pool.install(|| run(&mut buffer.points)),
            None => run(&mut buffer.points),
        };

        let outcome = match result {
            Ok(()) => {
                buffer.generation = Generation::Ready;
                FillOutcome::Complete
            }
            Err(Interrupt::Aborted) => FillOutcome::Aborted,
            Err(Interrupt::Failed(e)) => return Err(e),
        };

        let report = FillReport {
            outcome,
            elapsed: started.elapsed(),
            points: buffer.len(),
            threads: self.threads(),
            seed,
        };
        log::debug!("fill #{id}: {:?} after {:?}", report.outcome, report.elapsed);
        Ok(report)
    }
}

/// Per-slot seed; slot i draws the same points for a given base seed no
/// matter which thread runs it.
fn slot_seed(seed: u64, slot: usize) -> u64 {
    seed ^ (slot as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
