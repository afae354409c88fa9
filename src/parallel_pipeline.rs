// THEORY:
// The `parallel_pipeline` runs the same four stages as `pipeline::Session`, but
// spreads Stage 2 (per-detection enrichment) of each frame across a pool of tokio
// workers.
//
// Frames still go through one at a time:
//   Stage 1 takes the write half of the scene lock and records every detection of
//           the frame, so duplicate track ids within one frame are serialized.
//   Stage 2 fans one task per detection out to the workers. Each worker takes
//           the read half of the lock, so enrichment of a frame runs concurrently.
//   Stage 3 joins every reply and offers the results to the emitter in detection
//           order, so ids and events match the sequential session exactly.

use crate::core_modules::detection::{Position, TrackId, TrackedFrame};
use crate::core_modules::event::{AggregateStats, DetectionEvent, EnrichedDetection, EventEmitter};
use crate::error::{Error, Result};
use crate::pipeline::{FrameReport, SceneState, SessionConfig, SessionOutput, check_frame};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::info;

pub(crate) struct EnrichTask {
    scene: Arc<RwLock<SceneState>>,
    frame: Arc<TrackedFrame>,
    index: usize,
    result_sender: oneshot::Sender<Option<EnrichedDetection>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<EnrichTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and `worker_count` workers. Must run inside a tokio runtime.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<EnrichTask>();
        let mut workers = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<EnrichTask>())
            .unzip();

        // Round-robin dispatcher
        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        }));

        for mut worker_receiver in worker_receivers {
            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let enriched = {
                        let scene = task.scene.read().await;
                        scene.enrich(&task.frame, task.index)
                    };
                    let _ = task.result_sender.send(enriched);
                }
            }));
        }

        Self { task_sender, workers }
    }

    /// Queues one detection for enrichment and returns the reply channel.
    pub(crate) fn submit(
        &self,
        scene: Arc<RwLock<SceneState>>,
        frame: Arc<TrackedFrame>,
        index: usize,
    ) -> Result<oneshot::Receiver<Option<EnrichedDetection>>> {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = EnrichTask {
            scene,
            frame,
            index,
            result_sender,
        };
        self.task_sender
            .send(task)
            .map_err(|_| Error::WorkerPool("failed to send task to worker pool"))?;
        Ok(result_receiver)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

/// A session whose per-frame enrichment runs on a worker pool.
pub struct ParallelSession {
    scene: Arc<RwLock<SceneState>>,
    emitter: EventEmitter,
    worker_pool: WorkerPool,
    fps: f64,
    frames_processed: u64,
}

impl ParallelSession {
    /// One worker per logical CPU.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_workers(config, num_cpus::get())
    }

    /// Fails with `Error::WorkerPool` when called outside a tokio runtime.
    pub fn with_workers(config: SessionConfig, worker_count: usize) -> Result<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current()
            .map_err(|_| Error::WorkerPool("parallel session requires a tokio runtime"))?;
        info!(
            zones = config.zones.zones().len(),
            sampling_interval = config.emitter.sampling_interval,
            workers = worker_count.max(1),
            "parallel session started"
        );
        let emitter = EventEmitter::new(config.emitter.clone());
        let fps = config.fps;
        Ok(Self {
            scene: Arc::new(RwLock::new(SceneState::new(config))),
            emitter,
            worker_pool: WorkerPool::new(worker_count),
            fps,
            frames_processed: 0,
        })
    }

    pub async fn process_frame(&mut self, frame: TrackedFrame) -> Result<FrameReport> {
        check_frame(&frame)?;

        self.scene.write().await.record_frame(&frame);

        let frame = Arc::new(frame);
        let receivers = (0..frame.detections.len())
            .map(|i| self.worker_pool.submit(Arc::clone(&self.scene), Arc::clone(&frame), i))
            .collect::<Result<Vec<_>>>()?;

        let mut detections = Vec::with_capacity(receivers.len());
        for reply in join_all(receivers).await {
            let enriched = reply.map_err(|_| Error::WorkerPool("failed to receive result from worker"))?;
            detections.extend(enriched);
        }

        let events = detections
            .iter()
            .filter_map(|d| self.emitter.offer(frame.frame_index, self.fps, d))
            .collect();

        self.frames_processed += 1;
        Ok(FrameReport {
            frame_index: frame.frame_index,
            detections,
            events,
        })
    }

    pub fn events(&self) -> &[DetectionEvent] {
        self.emitter.events()
    }

    pub fn stats(&self) -> &AggregateStats {
        self.emitter.stats()
    }

    pub async fn history_of(&self, track_id: TrackId) -> Vec<Position> {
        self.scene.read().await.history_of(track_id).to_vec()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub async fn finish(self) -> SessionOutput {
        let tracks = self.scene.read().await.track_count();
        info!(
            frames = self.frames_processed,
            tracks,
            events = self.emitter.events().len(),
            "parallel session finished"
        );
        let (events, stats) = self.emitter.into_parts();
        SessionOutput { events, stats }
    }
}
