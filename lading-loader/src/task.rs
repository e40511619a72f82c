use crate::asset_loader::run_loader_phase;
use crate::worker_pool::{WorkerOutput, WorkerPool, WorkerRequest, WorkerRequestKind};
use crate::{AssetCache, AssetDescriptor, DynAsset, DynAssetLoader, FileHandle, FileResolver};
use crate::{LoadError, LoadRequest, LoadResult, PreparedAsset};
use lading_base::hashing::HashSet;
use lading_base::AssetTypeId;
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    // Promoted from the pending queue, file not resolved yet
    Created,
    // Waiting on a worker to report the loader's dependency list
    DiscoveringDependencies,
    // Dependencies are loading, higher up the task stack
    AwaitingDependencies,
    // Waiting on a worker to run the loader's off-thread phase
    RunningAsyncWork,
    // Ready to run the loader's finishing phase on the next pump
    RunningSyncFinish,
    Done,
    Cancelled,
    Failed,
}

impl LoadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadPhase::Done | LoadPhase::Cancelled | LoadPhase::Failed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTaskId(pub u64);

pub(crate) enum TaskStep {
    // Nothing happened, the task is waiting on a worker
    Waiting,
    Advanced,
    // The loader reported dependencies that must be scheduled before this task can continue
    DependenciesDiscovered(Vec<AssetDescriptor>),
    Finished(Arc<dyn DynAsset>),
    Cancelled,
    Failed(LoadError),
}

pub(crate) struct TaskContext<'a> {
    pub cache: &'a AssetCache,
    pub resolver: &'a dyn FileResolver,
    pub workers: &'a mut WorkerPool,
}

/// What is left of a task that was abandoned while it may still own prepared data
pub(crate) struct OrphanedTask {
    descriptor: AssetDescriptor,
    loader: Arc<dyn DynAssetLoader>,
    file: Option<FileHandle>,
}

impl OrphanedTask {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Hands prepared data back to the loader's unload hook
    pub fn reclaim(
        &self,
        prepared: Option<PreparedAsset>,
    ) {
        let file = match &self.file {
            Some(file) => file,
            None => return,
        };

        log::debug!("unload_async {}", self.descriptor);
        let request = LoadRequest {
            name: self.descriptor.name(),
            file,
            parameters: self.descriptor.parameters(),
        };
        self.loader.unload_async(&request, prepared);
    }

    pub fn reclaim_result(
        &self,
        output: LoadResult<WorkerOutput>,
    ) {
        if let Ok(WorkerOutput::Prepared(prepared)) = output {
            self.reclaim(Some(prepared));
        }
    }
}

/// One in-flight asset. Advanced one phase per call to `update`, only ever by the manager.
pub(crate) struct LoadTask {
    id: LoadTaskId,
    descriptor: AssetDescriptor,
    loader: Arc<dyn DynAssetLoader>,
    file: Option<FileHandle>,
    phase: LoadPhase,
    dependencies: Option<Vec<AssetDescriptor>>,
    cancel_requested: bool,
    job_in_flight: bool,
    result: Option<LoadResult<WorkerOutput>>,
    prepared: Option<PreparedAsset>,
    is_dependency: bool,
    // Other parents in the same batch that wanted this asset before it started loading
    extra_references: u32,
}

impl LoadTask {
    pub fn new(
        id: LoadTaskId,
        descriptor: AssetDescriptor,
        loader: Arc<dyn DynAssetLoader>,
        is_dependency: bool,
    ) -> Self {
        LoadTask {
            id,
            descriptor,
            loader,
            file: None,
            phase: LoadPhase::Created,
            dependencies: None,
            cancel_requested: false,
            job_in_flight: false,
            result: None,
            prepared: None,
            is_dependency,
            extra_references: 0,
        }
    }

    pub fn id(&self) -> LoadTaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn asset_type(&self) -> AssetTypeId {
        self.descriptor.asset_type()
    }

    pub fn descriptor(&self) -> &AssetDescriptor {
        &self.descriptor
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_dependency(&self) -> bool {
        self.is_dependency
    }

    pub fn is_started(&self) -> bool {
        self.phase != LoadPhase::Created
    }

    pub fn dependencies(&self) -> &[AssetDescriptor] {
        self.dependencies.as_deref().unwrap_or(&[])
    }

    pub fn request_cancel(&mut self) {
        self.cancel_requested = true;
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn add_extra_reference(&mut self) {
        self.extra_references += 1;
    }

    pub fn extra_references(&self) -> u32 {
        self.extra_references
    }

    pub fn accept_result(
        &mut self,
        output: LoadResult<WorkerOutput>,
    ) {
        self.job_in_flight = false;
        self.result = Some(output);
    }

    #[profiling::function]
    pub fn update(
        &mut self,
        ctx: &mut TaskContext,
    ) -> TaskStep {
        if self.cancel_requested {
            return TaskStep::Cancelled;
        }

        match self.phase {
            LoadPhase::Created => {
                let file = match self.descriptor.resolve(ctx.resolver) {
                    Ok(file) => file,
                    Err(error) => return self.fail(error),
                };

                log::debug!("{} resolved to {:?}", self.descriptor, file.path());
                self.file = Some(file);
                self.submit(ctx.workers, WorkerRequestKind::DiscoverDependencies);
                self.set_phase(LoadPhase::DiscoveringDependencies);
                TaskStep::Advanced
            }
            LoadPhase::DiscoveringDependencies => match self.result.take() {
                None => TaskStep::Waiting,
                Some(Err(error)) => self.fail(error),
                Some(Ok(WorkerOutput::Dependencies(dependencies))) => {
                    let dependencies = Self::dedup_dependencies(dependencies);
                    if dependencies.is_empty() {
                        log::debug!("{} has no dependencies", self.descriptor);
                        self.start_async_work(ctx.workers);
                        TaskStep::Advanced
                    } else {
                        self.dependencies = Some(dependencies.clone());
                        self.set_phase(LoadPhase::AwaitingDependencies);
                        TaskStep::DependenciesDiscovered(dependencies)
                    }
                }
                Some(Ok(WorkerOutput::Prepared(_))) => self.unexpected_output(),
            },
            LoadPhase::AwaitingDependencies => {
                let ready = self
                    .dependencies()
                    .iter()
                    .all(|x| ctx.cache.is_loaded_with_type(x.name(), x.asset_type()));
                if ready {
                    self.start_async_work(ctx.workers);
                    TaskStep::Advanced
                } else {
                    TaskStep::Waiting
                }
            }
            LoadPhase::RunningAsyncWork => match self.result.take() {
                None => TaskStep::Waiting,
                Some(Err(error)) => self.fail(error),
                Some(Ok(WorkerOutput::Prepared(prepared))) => {
                    self.prepared = Some(prepared);
                    self.set_phase(LoadPhase::RunningSyncFinish);
                    TaskStep::Advanced
                }
                Some(Ok(WorkerOutput::Dependencies(_))) => self.unexpected_output(),
            },
            LoadPhase::RunningSyncFinish => self.finish(ctx.cache),
            LoadPhase::Done | LoadPhase::Cancelled | LoadPhase::Failed => TaskStep::Waiting,
        }
    }

    /// Ends the task without installing anything. If a worker still owes this task a result the
    /// returned orphan must be kept until it arrives so the prepared data can be reclaimed.
    pub fn abandon(
        mut self,
        phase: LoadPhase,
    ) -> Option<(LoadTaskId, OrphanedTask)> {
        log::debug!("abandon {} in {:?} -> {:?}", self.descriptor, self.phase, phase);
        self.phase = phase;

        let orphan = OrphanedTask {
            descriptor: self.descriptor,
            loader: self.loader,
            file: self.file,
        };

        if self.job_in_flight {
            return Some((self.id, orphan));
        }

        let prepared = match self.result.take() {
            Some(Ok(WorkerOutput::Prepared(prepared))) => Some(prepared),
            _ => self.prepared.take(),
        };

        if prepared.is_some() {
            orphan.reclaim(prepared);
        }

        None
    }

    fn finish(
        &mut self,
        cache: &AssetCache,
    ) -> TaskStep {
        let prepared = match self.prepared.take() {
            Some(prepared) => prepared,
            None => return self.unexpected_output(),
        };

        let result = match &self.file {
            Some(file) => {
                let request = LoadRequest {
                    name: self.descriptor.name(),
                    file,
                    parameters: self.descriptor.parameters(),
                };

                let loader = &self.loader;
                run_loader_phase(self.descriptor.name(), LoadPhase::RunningSyncFinish, || {
                    profiling::scope!("load_sync");
                    loader.load_sync(cache, &request, prepared)
                })
            }
            None => Err(LoadError::loader_execution(
                self.descriptor.name(),
                LoadPhase::RunningSyncFinish,
                "file was never resolved".into(),
            )),
        };

        match result {
            Ok(asset) => {
                self.set_phase(LoadPhase::Done);
                TaskStep::Finished(asset)
            }
            Err(error) => self.fail(error),
        }
    }

    fn start_async_work(
        &mut self,
        workers: &mut WorkerPool,
    ) {
        self.submit(workers, WorkerRequestKind::LoadAsync);
        self.set_phase(LoadPhase::RunningAsyncWork);
    }

    fn submit(
        &mut self,
        workers: &mut WorkerPool,
        kind: WorkerRequestKind,
    ) {
        let file = match &self.file {
            Some(file) => file.clone(),
            None => return,
        };

        self.job_in_flight = true;
        workers.submit(WorkerRequest {
            task_id: self.id,
            kind,
            loader: self.loader.clone(),
            name: self.descriptor.name().to_string(),
            file,
            parameters: self.descriptor.parameters().clone(),
        });
    }

    fn set_phase(
        &mut self,
        phase: LoadPhase,
    ) {
        log::debug!("{} {:?} -> {:?}", self.descriptor, self.phase, phase);
        self.phase = phase;
    }

    fn fail(
        &mut self,
        error: LoadError,
    ) -> TaskStep {
        log::error!("{} failed in {:?}: {}", self.descriptor, self.phase, error);
        self.phase = LoadPhase::Failed;
        TaskStep::Failed(error)
    }

    fn unexpected_output(&mut self) -> TaskStep {
        let error = LoadError::loader_execution(
            self.descriptor.name(),
            self.phase,
            format!("unexpected worker output while {:?}", self.phase).into(),
        );
        self.fail(error)
    }

    // Same name listed twice collapses to the first occurrence
    fn dedup_dependencies(dependencies: Vec<AssetDescriptor>) -> Vec<AssetDescriptor> {
        let mut seen = HashSet::default();
        dependencies
            .into_iter()
            .filter(|x| seen.insert(x.name().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asset_loader::TypedLoader;
    use crate::{Asset, AssetLoader, LoaderResult};
    use lading_base::TypeUuid;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(TypeUuid)]
    #[uuid = "8e7f6a5b-4c3d-4e2f-9a1b-0c9d8e7f6a81"]
    struct Mesh {
        vertex_count: usize,
    }

    impl Asset for Mesh {}

    #[derive(Default)]
    struct MeshLoader {
        dependencies: Vec<&'static str>,
        unloads: Arc<AtomicUsize>,
    }

    impl AssetLoader for MeshLoader {
        type Asset = Mesh;
        type Prepared = usize;

        fn dependencies(
            &self,
            _request: &LoadRequest,
        ) -> LoaderResult<Vec<AssetDescriptor>> {
            Ok(self
                .dependencies
                .iter()
                .map(|x| AssetDescriptor::new::<Mesh>(*x))
                .collect())
        }

        fn load_async(
            &self,
            request: &LoadRequest,
        ) -> LoaderResult<usize> {
            Ok(request.name.len())
        }

        fn load_sync(
            &self,
            _cache: &AssetCache,
            request: &LoadRequest,
            prepared: usize,
        ) -> LoaderResult<Mesh> {
            if request.name.starts_with("bad") {
                return Err("corrupt mesh".into());
            }
            Ok(Mesh {
                vertex_count: prepared,
            })
        }

        fn unload_async(
            &self,
            _request: &LoadRequest,
            prepared: Option<usize>,
        ) {
            assert!(prepared.is_some());
            self.unloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn resolver() -> impl FileResolver {
        |name: &str| -> LoadResult<FileHandle> { Ok(FileHandle::new(name)) }
    }

    fn task(
        name: &str,
        loader: MeshLoader,
    ) -> LoadTask {
        LoadTask::new(
            LoadTaskId(1),
            AssetDescriptor::new::<Mesh>(name),
            Arc::new(TypedLoader(loader)),
            false,
        )
    }

    // Feeds worker results back the way the manager does
    fn step(
        task: &mut LoadTask,
        cache: &AssetCache,
        workers: &mut WorkerPool,
    ) -> TaskStep {
        while let Some(result) = workers.try_recv() {
            task.accept_result(result.output);
        }

        let resolver = resolver();
        let mut ctx = TaskContext {
            cache,
            resolver: &resolver,
            workers,
        };
        task.update(&mut ctx)
    }

    #[test]
    fn walks_every_phase_without_dependencies() {
        let cache = AssetCache::default();
        let mut workers = WorkerPool::new(0).unwrap();
        let mut task = task("cube.mesh", MeshLoader::default());

        assert!(matches!(step(&mut task, &cache, &mut workers), TaskStep::Advanced));
        assert_eq!(task.phase(), LoadPhase::DiscoveringDependencies);
        assert!(matches!(step(&mut task, &cache, &mut workers), TaskStep::Advanced));
        assert_eq!(task.phase(), LoadPhase::RunningAsyncWork);
        assert!(matches!(step(&mut task, &cache, &mut workers), TaskStep::Advanced));
        assert_eq!(task.phase(), LoadPhase::RunningSyncFinish);
        match step(&mut task, &cache, &mut workers) {
            TaskStep::Finished(asset) => {
                let mesh = asset.downcast_arc::<Mesh>().ok().unwrap();
                assert_eq!(mesh.vertex_count, "cube.mesh".len());
            }
            _ => panic!("expected the task to finish"),
        }
        assert_eq!(task.phase(), LoadPhase::Done);
        assert!(task.phase().is_terminal());
    }

    #[test]
    fn waits_for_dependencies_in_cache() {
        let cache = AssetCache::default();
        let mut workers = WorkerPool::new(0).unwrap();
        let loader = MeshLoader {
            dependencies: vec!["a.mesh", "b.mesh", "a.mesh"],
            ..Default::default()
        };
        let mut task = task("scene.mesh", loader);

        step(&mut task, &cache, &mut workers);
        match step(&mut task, &cache, &mut workers) {
            TaskStep::DependenciesDiscovered(dependencies) => {
                let names: Vec<_> = dependencies.iter().map(|x| x.name()).collect();
                assert_eq!(names, vec!["a.mesh", "b.mesh"]);
            }
            _ => panic!("expected dependencies"),
        }
        assert_eq!(task.phase(), LoadPhase::AwaitingDependencies);

        cache
            .insert("a.mesh", Arc::new(Mesh { vertex_count: 1 }), 1)
            .unwrap();
        assert!(matches!(step(&mut task, &cache, &mut workers), TaskStep::Waiting));
        cache
            .insert("b.mesh", Arc::new(Mesh { vertex_count: 1 }), 1)
            .unwrap();
        assert!(matches!(step(&mut task, &cache, &mut workers), TaskStep::Advanced));
        assert_eq!(task.phase(), LoadPhase::RunningAsyncWork);
    }

    #[test]
    fn finishing_errors_fail_the_task() {
        let cache = AssetCache::default();
        let mut workers = WorkerPool::new(0).unwrap();
        let mut task = task("bad.mesh", MeshLoader::default());
        for _ in 0..3 {
            step(&mut task, &cache, &mut workers);
        }

        match step(&mut task, &cache, &mut workers) {
            TaskStep::Failed(LoadError::LoaderExecution { phase, .. }) => {
                assert_eq!(phase, LoadPhase::RunningSyncFinish)
            }
            _ => panic!("expected a failure"),
        }
        assert_eq!(task.phase(), LoadPhase::Failed);
    }

    #[test]
    fn abandoning_returns_prepared_data_to_loader() {
        let cache = AssetCache::default();
        let mut workers = WorkerPool::new(0).unwrap();
        let unloads = Arc::new(AtomicUsize::new(0));
        let loader = MeshLoader {
            unloads: unloads.clone(),
            ..Default::default()
        };
        let mut task = task("cube.mesh", loader);

        // Submit the async work but don't collect the result yet
        step(&mut task, &cache, &mut workers);
        step(&mut task, &cache, &mut workers);
        assert_eq!(task.phase(), LoadPhase::RunningAsyncWork);

        let (id, orphan) = task.abandon(LoadPhase::Cancelled).unwrap();
        assert_eq!(id, LoadTaskId(1));
        assert_eq!(orphan.name(), "cube.mesh");
        assert_eq!(unloads.load(Ordering::SeqCst), 0);

        let result = workers.try_recv().unwrap();
        orphan.reclaim_result(result.output);
        assert_eq!(unloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_short_circuits() {
        let cache = AssetCache::default();
        let mut workers = WorkerPool::new(0).unwrap();
        let mut task = task("cube.mesh", MeshLoader::default());
        task.request_cancel();
        assert!(matches!(step(&mut task, &cache, &mut workers), TaskStep::Cancelled));
        assert!(task.abandon(LoadPhase::Cancelled).is_none());
    }
}
