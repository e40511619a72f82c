use crate::asset_loader::run_loader_phase;
use crate::task::{LoadPhase, LoadTaskId};
use crate::{AssetDescriptor, AssetParameters, DynAssetLoader, FileHandle};
use crate::{LoadRequest, LoadResult, PreparedAsset};
use crossbeam_channel::{Receiver, Sender};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum WorkerRequestKind {
    DiscoverDependencies,
    LoadAsync,
}

pub(crate) struct WorkerRequest {
    pub task_id: LoadTaskId,
    pub kind: WorkerRequestKind,
    pub loader: Arc<dyn DynAssetLoader>,
    pub name: String,
    pub file: FileHandle,
    pub parameters: AssetParameters,
}

pub(crate) enum WorkerOutput {
    Dependencies(Vec<AssetDescriptor>),
    Prepared(PreparedAsset),
}

pub(crate) struct WorkerResult {
    pub task_id: LoadTaskId,
    pub output: LoadResult<WorkerOutput>,
}

fn execute_request(request: WorkerRequest) -> WorkerResult {
    let load_request = LoadRequest {
        name: &request.name,
        file: &request.file,
        parameters: &request.parameters,
    };

    let output = match request.kind {
        WorkerRequestKind::DiscoverDependencies => {
            profiling::scope!("WorkerRequestKind::DiscoverDependencies");
            run_loader_phase(&request.name, LoadPhase::DiscoveringDependencies, || {
                request.loader.dependencies(&load_request)
            })
            .map(WorkerOutput::Dependencies)
        }
        WorkerRequestKind::LoadAsync => {
            profiling::scope!("WorkerRequestKind::LoadAsync");
            run_loader_phase(&request.name, LoadPhase::RunningAsyncWork, || {
                request.loader.load_async(&load_request)
            })
            .map(WorkerOutput::Prepared)
        }
    };

    WorkerResult {
        task_id: request.task_id,
        output,
    }
}

// Thread that tries to take jobs out of the request channel and ends when the finish channel is signalled
struct WorkerThread {
    finish_tx: Sender<()>,
    join_handle: JoinHandle<()>,
}

impl WorkerThread {
    fn new(
        request_rx: Receiver<WorkerRequest>,
        result_tx: Sender<WorkerResult>,
        active_request_count: Arc<AtomicUsize>,
        thread_index: usize,
    ) -> LoadResult<Self> {
        let (finish_tx, finish_rx) = crossbeam_channel::bounded(1);
        let join_handle = std::thread::Builder::new()
            .name("Asset Load Worker".into())
            .spawn(move || {
                profiling::register_thread!(&format!("WorkerThread {}", thread_index));
                loop {
                    crossbeam_channel::select! {
                        recv(request_rx) -> msg => {
                            let request = match msg {
                                Ok(request) => request,
                                Err(_) => return,
                            };

                            log::trace!(
                                "worker {} start {:?} {} {:?}",
                                thread_index,
                                request.kind,
                                request.name,
                                request.task_id
                            );
                            let result = execute_request(request);
                            let sent = result_tx.send(result);
                            active_request_count.fetch_sub(1, Ordering::Release);
                            if sent.is_err() {
                                return;
                            }
                        },
                        recv(finish_rx) -> _msg => {
                            return;
                        }
                    }
                }
            })?;

        Ok(WorkerThread {
            finish_tx,
            join_handle,
        })
    }
}

// Runs loader phases on N threads and collects their results. With zero threads every request is
// executed immediately on the submitting thread and its result is queued like any other.
pub(crate) struct WorkerPool {
    worker_threads: Vec<WorkerThread>,
    request_tx: Sender<WorkerRequest>,
    result_rx: Receiver<WorkerResult>,
    ready: VecDeque<WorkerResult>,
    active_request_count: Arc<AtomicUsize>,
}

impl WorkerPool {
    pub fn new(thread_count: usize) -> LoadResult<Self> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<WorkerRequest>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<WorkerResult>();
        let active_request_count = Arc::new(AtomicUsize::new(0));

        let mut worker_threads = Vec::with_capacity(thread_count);
        for thread_index in 0..thread_count {
            let worker = WorkerThread::new(
                request_rx.clone(),
                result_tx.clone(),
                active_request_count.clone(),
                thread_index,
            )?;
            worker_threads.push(worker);
        }

        log::debug!("Started {} asset load worker threads", thread_count);

        Ok(WorkerPool {
            worker_threads,
            request_tx,
            result_rx,
            ready: VecDeque::default(),
            active_request_count,
        })
    }

    pub fn is_inline(&self) -> bool {
        self.worker_threads.is_empty()
    }

    pub fn submit(
        &mut self,
        request: WorkerRequest,
    ) {
        if self.is_inline() {
            log::trace!("inline {:?} {}", request.kind, request.name);
            self.ready.push_back(execute_request(request));
            return;
        }

        self.active_request_count.fetch_add(1, Ordering::Release);
        if let Err(error) = self.request_tx.send(request) {
            // Only possible if every worker is gone, run it here instead
            self.active_request_count.fetch_sub(1, Ordering::Release);
            self.ready.push_back(execute_request(error.into_inner()));
        }
    }

    pub fn try_recv(&mut self) -> Option<WorkerResult> {
        self.ready
            .pop_front()
            .or_else(|| self.result_rx.try_recv().ok())
    }

    /// Blocks until a result is available or `timeout` passes. Returns true if a result is ready.
    pub fn wait(
        &mut self,
        timeout: Duration,
    ) -> bool {
        if !self.ready.is_empty() {
            return true;
        }

        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.ready.push_back(result);
                true
            }
            Err(_) => false,
        }
    }

    pub fn active_request_count(&self) -> usize {
        self.active_request_count.load(Ordering::Acquire)
    }

    pub fn has_outstanding_work(&self) -> bool {
        !self.ready.is_empty() || self.active_request_count() > 0 || !self.result_rx.is_empty()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker_thread in &self.worker_threads {
            let _ = worker_thread.finish_tx.send(());
        }

        for worker_thread in self.worker_threads.drain(..) {
            if worker_thread.join_handle.join().is_err() {
                log::error!("Asset load worker thread panicked");
            }
        }
    }
}
