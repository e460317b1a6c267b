//! # Task Management System
//!
//! This module provides the chunk regeneration scheduler: a deduplicating work queue
//! drained by exactly one background worker thread.
//!
//! ## Architecture Overview
//!
//! - `ChunkScheduler`: owns the queue, the worker and both channels
//! - `RegenerationTask`: one relight + remesh of one chunk
//! - `TaskResult`: a finished mesh, or the fault that prevented it
//! - `MeshSink`: where finished meshes go on the main thread
//!
//! The main thread is the only producer. It pushes chunk handles into the queue and
//! pokes the worker through a wake channel. The worker pops chunks one at a time,
//! regenerates each under its write lock and sends the result back on a result
//! channel, which the main thread drains with
//! [`process_completed_tasks`](ChunkScheduler::process_completed_tasks).
//!
//! ## Queue Rules
//! - Only one chunk is regenerated at a time. Inline regenerations wait for the
//!   worker's current chunk, so two threads never hold chunk locks while reading
//!   each other's chunks.
//! - A chunk is queued at most once. A chunk counts as queued until the worker has
//!   finished it, but the worker only reads blocks once it holds the chunk's lock,
//!   so an edit made while the chunk is queued is always picked up.
//! - Edits on a chunk edge put the neighbour across that edge at the front of the
//!   queue and that neighbour's perpendicular neighbours at the back.
//!
//! ## Shutdown
//! Dropping the scheduler closes the wake channel. The worker drains whatever is still
//! queued, then exits, and the drop joins it.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use voxel_engine::engine_state::meshing::ChunkMesh;
//! use voxel_engine::engine_state::task_management::ChunkScheduler;
//! use voxel_engine::engine_state::voxels::chunk::{Chunk, ChunkHandle, ChunkPosition};
//! use voxel_engine::engine_state::VoxelContext;
//!
//! let context = Arc::new(VoxelContext::builtin().unwrap());
//! let scheduler = ChunkScheduler::new(context).unwrap();
//!
//! let chunk = ChunkHandle::new(Chunk::new(ChunkPosition::new(0, 0)));
//! scheduler.request_update(&chunk, true, 8, 8, true);
//! assert!(scheduler.wait_for_idle(Duration::from_secs(5)));
//!
//! let mut meshes: Vec<ChunkMesh> = Vec::new();
//! assert_eq!(scheduler.process_completed_tasks(&mut meshes), 1);
//! ```

pub mod task;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;
use web_time::Instant;

use crate::engine_state::meshing::ChunkMesh;
use crate::engine_state::voxels::chunk::neighbors::NeighborDirection;
use crate::engine_state::voxels::chunk::{ChunkHandle, ChunkPosition, CHUNK_WIDTH};
use crate::engine_state::VoxelContext;

pub use task::{ChunkPipeline, GenerationError, LightAndMesh, RegenerationTask, TaskResult};

/// Errors raised while setting up the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to spawn the regeneration worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Receives finished regenerations on the main thread.
///
/// A new mesh for a chunk replaces any earlier mesh for that chunk wholesale.
pub trait MeshSink {
    fn receive_mesh(&mut self, mesh: ChunkMesh);

    /// Called for regenerations that faulted. The chunk keeps its previous mesh.
    fn regeneration_failed(&mut self, error: GenerationError) {
        let _ = error;
    }
}

impl MeshSink for Vec<ChunkMesh> {
    fn receive_mesh(&mut self, mesh: ChunkMesh) {
        self.push(mesh);
    }
}

impl MeshSink for HashMap<ChunkPosition, ChunkMesh> {
    fn receive_mesh(&mut self, mesh: ChunkMesh) {
        self.insert(mesh.position, mesh);
    }
}

/// Queued chunks in pop order, plus the identities of every chunk not yet finished.
struct PendingQueue {
    order: VecDeque<ChunkHandle>,
    pending: HashSet<usize>,
}

/// State shared between the scheduler and its worker.
struct SchedulerShared {
    queue: Mutex<PendingQueue>,
    /// Held for the whole of every regeneration, inline or on the worker. Taken
    /// before any chunk lock.
    generation: Mutex<()>,
    /// Signalled whenever the pending set becomes empty.
    idle: Condvar,
}

impl SchedulerShared {
    fn pop_front(&self) -> Option<ChunkHandle> {
        self.queue.lock().order.pop_front()
    }

    fn finish(&self, handle: &ChunkHandle) {
        let mut queue = self.queue.lock();
        queue.pending.remove(&handle.id());
        if queue.pending.is_empty() {
            self.idle.notify_all();
        }
    }
}

/// Deduplicating regeneration queue with one background worker.
pub struct ChunkScheduler {
    context: Arc<VoxelContext>,
    pipeline: Arc<dyn ChunkPipeline>,
    shared: Arc<SchedulerShared>,
    wake_sender: Option<Sender<()>>,
    result_sender: Sender<TaskResult>,
    result_receiver: Receiver<TaskResult>,
    worker: Option<JoinHandle<()>>,
}

impl ChunkScheduler {
    /// Creates the scheduler and spawns its worker thread.
    pub fn new(context: Arc<VoxelContext>) -> Result<Self, SchedulerError> {
        Self::with_pipeline(context, Arc::new(LightAndMesh))
    }

    /// Like [`new`](Self::new) with a custom regeneration pipeline.
    pub fn with_pipeline(
        context: Arc<VoxelContext>,
        pipeline: Arc<dyn ChunkPipeline>,
    ) -> Result<Self, SchedulerError> {
        let capacity = context.config().queue_capacity;
        let shared = Arc::new(SchedulerShared {
            queue: Mutex::new(PendingQueue {
                order: VecDeque::with_capacity(capacity),
                pending: HashSet::with_capacity(capacity),
            }),
            generation: Mutex::new(()),
            idle: Condvar::new(),
        });

        let (wake_sender, wake_receiver) = channel::<()>();
        let (result_sender, result_receiver) = channel::<TaskResult>();

        let worker = {
            let context = context.clone();
            let pipeline = pipeline.clone();
            let shared = shared.clone();
            let result_sender = result_sender.clone();
            thread::Builder::new()
                .name(context.config().worker_thread_name.clone())
                .spawn(move || {
                    run_worker(&context, pipeline.as_ref(), &shared, wake_receiver, result_sender)
                })?
        };

        info!(
            "Started chunk regeneration worker `{}`",
            context.config().worker_thread_name
        );

        Ok(ChunkScheduler {
            context,
            pipeline,
            shared,
            wake_sender: Some(wake_sender),
            result_sender,
            result_receiver,
            worker: Some(worker),
        })
    }

    /// Schedules a chunk after an edit at chunk-local column `(edit_x, edit_z)`.
    ///
    /// Edits on an edge also schedule the neighbour across it (at the front of the
    /// queue) and that neighbour's perpendicular neighbours (at the back). The edited
    /// chunk is queued last: at the front when `high_priority`, else at the back.
    /// Chunks already queued stay where they are.
    ///
    /// With `threaded == false` the same chunks are regenerated inline instead, and
    /// their results are delivered through the same result channel.
    pub fn request_update(
        &self,
        handle: &ChunkHandle,
        high_priority: bool,
        edit_x: usize,
        edit_z: usize,
        threaded: bool,
    ) {
        let (across, beyond) = cascade_targets(handle, edit_x, edit_z);

        if !threaded {
            for target in across.iter().chain(beyond.iter()).chain(std::iter::once(handle)) {
                self.regenerate_inline(target);
            }
            return;
        }

        let mut queue = self.shared.queue.lock();
        for neighbor in &across {
            self.enqueue_locked(&mut queue, neighbor, true);
        }
        for neighbor in &beyond {
            self.enqueue_locked(&mut queue, neighbor, false);
        }
        self.enqueue_locked(&mut queue, handle, high_priority);
    }

    /// Schedules a single chunk without looking at its neighbours.
    pub fn request_regeneration(&self, handle: &ChunkHandle, high_priority: bool, threaded: bool) {
        if !threaded {
            self.regenerate_inline(handle);
            return;
        }
        let mut queue = self.shared.queue.lock();
        self.enqueue_locked(&mut queue, handle, high_priority);
    }

    fn enqueue_locked(&self, queue: &mut PendingQueue, handle: &ChunkHandle, front: bool) -> bool {
        if !queue.pending.insert(handle.id()) {
            debug!("Chunk {} is already queued", handle.position());
            return false;
        }
        if front {
            queue.order.push_front(handle.clone());
        } else {
            queue.order.push_back(handle.clone());
        }
        debug!(
            "Queued chunk {} at the {} ({} pending)",
            handle.position(),
            if front { "front" } else { "back" },
            queue.pending.len()
        );

        if let Some(wake_sender) = &self.wake_sender {
            let _ = wake_sender.send(());
        }
        true
    }

    fn regenerate_inline(&self, handle: &ChunkHandle) {
        let _generating = self.shared.generation.lock();
        let task = RegenerationTask::new(handle.clone());
        task.process(&self.context, self.pipeline.as_ref(), |result| {
            if let Err(error) = &result {
                error!("{}", error);
            }
            let _ = self.result_sender.send(result);
        });
    }

    /// Regenerates a chunk on the calling thread and returns the result directly.
    ///
    /// Waits for a regeneration in progress on the worker to finish first.
    pub fn regenerate_now(&self, handle: &ChunkHandle) -> TaskResult {
        let _generating = self.shared.generation.lock();
        RegenerationTask::new(handle.clone()).process(&self.context, self.pipeline.as_ref(), |result| result)
    }

    /// `true` while the chunk is queued or being regenerated.
    pub fn is_queued(&self, handle: &ChunkHandle) -> bool {
        self.shared.queue.lock().pending.contains(&handle.id())
    }

    /// Number of chunks queued or being regenerated.
    pub fn pending_count(&self) -> usize {
        self.shared.queue.lock().pending.len()
    }

    /// Blocks until nothing is pending or `timeout` elapses. Returns `true` when idle.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut queue = self.shared.queue.lock();
        while !queue.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.shared.idle.wait_for(&mut queue, remaining);
        }
        true
    }

    /// Hands every finished regeneration to `sink`. Returns how many were delivered.
    pub fn process_completed_tasks(&self, sink: &mut dyn MeshSink) -> usize {
        let mut delivered = 0;
        while let Ok(result) = self.result_receiver.try_recv() {
            match result {
                Ok(mesh) => sink.receive_mesh(mesh),
                Err(error) => sink.regeneration_failed(error),
            }
            delivered += 1;
        }
        delivered
    }

    pub fn context(&self) -> &VoxelContext {
        &self.context
    }
}

impl Drop for ChunkScheduler {
    fn drop(&mut self) {
        self.wake_sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Chunk regeneration worker exited with a panic");
            }
        }
    }
}

/// Chunks to refresh after an edit: those across the edited edges, then their
/// perpendicular neighbours.
///
/// Each chunk is read-locked on its own, briefly, before any queue lock is taken.
fn cascade_targets(
    handle: &ChunkHandle,
    edit_x: usize,
    edit_z: usize,
) -> (Vec<ChunkHandle>, Vec<ChunkHandle>) {
    let mut edges = Vec::with_capacity(2);
    if edit_x == 0 {
        edges.push(NeighborDirection::Left);
    }
    if edit_x == CHUNK_WIDTH - 1 {
        edges.push(NeighborDirection::Right);
    }
    if edit_z == 0 {
        edges.push(NeighborDirection::Back);
    }
    if edit_z == CHUNK_WIDTH - 1 {
        edges.push(NeighborDirection::Front);
    }
    if edges.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let across: Vec<(NeighborDirection, ChunkHandle)> = {
        let chunk = handle.get();
        edges
            .into_iter()
            .filter_map(|direction| chunk.neighbor(direction).map(|neighbor| (direction, neighbor)))
            .collect()
    };

    let mut beyond = Vec::new();
    for (direction, neighbor) in &across {
        let neighbor_chunk = neighbor.get();
        for perpendicular in direction.perpendicular() {
            if let Some(next) = neighbor_chunk.neighbor(perpendicular) {
                beyond.push(next);
            }
        }
    }

    (across.into_iter().map(|(_, neighbor)| neighbor).collect(), beyond)
}

fn run_worker(
    context: &VoxelContext,
    pipeline: &dyn ChunkPipeline,
    shared: &SchedulerShared,
    wake_receiver: Receiver<()>,
    result_sender: Sender<TaskResult>,
) {
    debug!("Chunk regeneration worker running");

    let process = |handle: ChunkHandle| {
        let _generating = shared.generation.lock();
        let task = RegenerationTask::new(handle);
        task.process(context, pipeline, |result| {
            if let Err(error) = &result {
                error!("{}", error);
            }
            let _ = result_sender.send(result);
            shared.finish(task.handle());
        });
    };

    while wake_receiver.recv().is_ok() {
        while let Some(handle) = shared.pop_front() {
            process(handle);
        }
    }

    // The wake channel is closed: finish what is still queued before exiting.
    while let Some(handle) = shared.pop_front() {
        process(handle);
    }

    debug!("Chunk regeneration worker stopped");
}
