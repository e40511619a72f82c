use crate::task::{LoadTask, OrphanedTask, TaskContext, TaskStep};
use crate::worker_pool::WorkerPool;
use crate::{Asset, AssetCache, AssetDescriptor, AssetLoader, AssetManagerConfig, AssetParameters};
use crate::{DependencyGraph, DirectoryFileResolver, DynAsset, FileResolver, LoaderRegistry};
use crate::{LoadError, LoadPhase, LoadResult, LoadTaskId};
use lading_base::hashing::HashMap;
use lading_base::AssetTypeId;
use std::collections::VecDeque;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

// How long blocking calls wait on a worker before pumping again
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub type ErrorListener = Box<dyn FnMut(&AssetDescriptor, &LoadError) + Send>;

/// Snapshot of one loaded asset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadInfo {
    pub name: String,
    pub asset_type: AssetTypeId,
    pub ref_count: u32,
    pub dependencies: Vec<String>,
}

/// Loads named assets and everything they depend on, and keeps them reference counted until they
/// are unloaded.
///
/// Requests are queued by [`load`](Self::load) and make progress only when the owning thread calls
/// [`pump`](Self::pump) (or one of the blocking helpers built on it). One requested asset is in
/// flight at a time. Its dependencies are stacked on top of it and finished first, so finishing
/// work always runs on the pumping thread in a deterministic order while the off-thread phases are
/// handed to the worker pool.
pub struct AssetManager {
    registry: LoaderRegistry,
    resolver: Box<dyn FileResolver>,
    cache: AssetCache,
    graph: DependencyGraph,
    pending: VecDeque<AssetDescriptor>,
    // Bottom is the asset that was requested, everything above it is a dependency still loading.
    // Only the top task is advanced.
    tasks: Vec<LoadTask>,
    workers: WorkerPool,
    // Cancelled tasks a worker still owes a result to
    orphans: HashMap<LoadTaskId, OrphanedTask>,
    next_task_id: u64,
    error_listener: Option<ErrorListener>,

    // Progress bookkeeping for the current batch
    loaded: usize,
    to_load: usize,
    peak_tasks: usize,
    progress_floor: f32,
}

impl AssetManager {
    pub fn new(config: AssetManagerConfig) -> LoadResult<Self> {
        let resolver = DirectoryFileResolver::new(config.asset_root.clone())
            .require_existing(config.require_existing_files);
        Self::with_resolver(config, resolver)
    }

    pub fn with_resolver(
        config: AssetManagerConfig,
        resolver: impl FileResolver + 'static,
    ) -> LoadResult<Self> {
        log::info!("Creating asset manager {:?}", config);
        Ok(AssetManager {
            registry: LoaderRegistry::default(),
            resolver: Box::new(resolver),
            cache: AssetCache::default(),
            graph: DependencyGraph::default(),
            pending: VecDeque::default(),
            tasks: Vec::default(),
            workers: WorkerPool::new(config.worker_thread_count)?,
            orphans: HashMap::default(),
            next_task_id: 0,
            error_listener: None,
            loaded: 0,
            to_load: 0,
            peak_tasks: 0,
            progress_floor: 0.0,
        })
    }

    pub fn register_loader<L: AssetLoader>(
        &mut self,
        loader: L,
    ) {
        self.registry.register(loader);
    }

    pub fn register_loader_with_suffix<L: AssetLoader>(
        &mut self,
        suffix: &str,
        loader: L,
    ) {
        self.registry.register_with_suffix(suffix, loader);
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// With a listener installed, failed loads are reported to it and `pump` keeps returning Ok
    pub fn set_error_listener(
        &mut self,
        listener: impl FnMut(&AssetDescriptor, &LoadError) + Send + 'static,
    ) {
        self.error_listener = Some(Box::new(listener));
    }

    pub fn clear_error_listener(&mut self) {
        self.error_listener = None;
    }

    /// Shared handle to the loaded assets, usable from other threads
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    //
    // Requests
    //

    pub fn load<T: Asset>(
        &mut self,
        name: &str,
    ) -> LoadResult<()> {
        self.load_descriptor(AssetDescriptor::new::<T>(name))
    }

    pub fn load_with_parameters<T: Asset>(
        &mut self,
        name: &str,
        parameters: AssetParameters,
    ) -> LoadResult<()> {
        self.load_descriptor(AssetDescriptor::new::<T>(name).with_parameters(parameters))
    }

    /// Queues a load. Each successful call holds one reference once the asset is loaded, to be
    /// given back with [`unload`](Self::unload).
    #[profiling::function]
    pub fn load_descriptor(
        &mut self,
        descriptor: AssetDescriptor,
    ) -> LoadResult<()> {
        let asset_type = descriptor.asset_type();
        if self.registry.find(asset_type, descriptor.name()).is_none() {
            return Err(LoadError::NoLoader {
                name: descriptor.name().to_string(),
                asset_type,
            });
        }

        if let Some(existing) = self.known_asset_type(descriptor.name()) {
            if existing != asset_type {
                return Err(LoadError::TypeConflict {
                    name: descriptor.name().to_string(),
                    existing,
                    requested: asset_type,
                });
            }
        }

        if self.is_finished() {
            self.loaded = 0;
            self.to_load = 0;
            self.peak_tasks = 0;
        }

        self.to_load += 1;
        self.progress_floor = 0.0;
        log::debug!("Queued {}", descriptor);
        self.pending.push_back(descriptor);
        Ok(())
    }

    /// Stops a load that hasn't finished. A pending request is dropped without running its
    /// loader and the request in flight is cancelled on the next pump. Returns false if there was
    /// nothing to cancel, including when the asset already finished loading.
    pub fn cancel(
        &mut self,
        name: &str,
    ) -> bool {
        if let Some(root) = self.tasks.first_mut() {
            if root.name() == name {
                log::info!("Cancel requested for {}", root.descriptor());
                root.request_cancel();
                return true;
            }
        }

        if let Some(index) = self.pending.iter().position(|x| x.name() == name) {
            if let Some(descriptor) = self.pending.remove(index) {
                log::info!("Removed {} from the load queue", descriptor);
                self.to_load = self.to_load.saturating_sub(1);
                self.notify_loaded(&descriptor);
            }
            return true;
        }

        false
    }

    /// Gives back one reference. Cancels the load instead if `name` is still queued or in flight.
    #[profiling::function]
    pub fn unload(
        &mut self,
        name: &str,
    ) -> LoadResult<()> {
        if self.cancel(name) {
            return Ok(());
        }

        if !self.cache.is_loaded(name) {
            return Err(LoadError::NotFound {
                name: name.to_string(),
            });
        }

        log::info!("Unload {}", name);
        self.graph.cascade_release(&self.cache, name)
    }

    /// Unloads everything and abandons any load in progress
    pub fn clear(&mut self) {
        log::info!(
            "Clearing asset manager, {} loaded, {} queued",
            self.cache.len(),
            self.queued_count()
        );
        self.pending.clear();
        self.unwind_tasks(LoadPhase::Cancelled);
        self.reclaim_orphans();

        loop {
            let names = self.cache.names();
            if names.is_empty() {
                break;
            }

            let mut roots: Vec<String> = names
                .iter()
                .filter(|x| !self.graph.is_dependency(x))
                .cloned()
                .collect();
            if roots.is_empty() {
                roots = names.clone();
            }

            for name in roots {
                while self.cache.is_loaded(&name) {
                    if let Err(error) = self.graph.cascade_release(&self.cache, &name) {
                        log::error!("Error while unloading {}: {}", name, error);
                        break;
                    }
                }
            }

            if self.cache.len() >= names.len() {
                log::error!("Could not unload {} assets", self.cache.len());
                break;
            }
        }

        self.graph.clear();
        self.loaded = 0;
        self.to_load = 0;
        self.peak_tasks = 0;
        self.progress_floor = 0.0;
    }

    //
    // Driving loads
    //

    /// Advances loading by one step. Never blocks on workers. Returns true once nothing is queued
    /// or in flight.
    #[profiling::function]
    pub fn pump(&mut self) -> LoadResult<bool> {
        self.raise_progress_floor();
        self.drain_worker_results();

        if self
            .tasks
            .first()
            .map_or(false, |x| x.is_cancel_requested())
        {
            self.cancel_active_load();
        } else {
            if self.tasks.is_empty() {
                self.promote_next_request()?;
            }

            if !self.tasks.is_empty() {
                self.update_active_task()?;
            }
        }

        self.raise_progress_floor();
        Ok(self.is_finished())
    }

    /// Pumps until everything is loaded or `budget` runs out. Returns true if everything loaded.
    pub fn update_for(
        &mut self,
        budget: Duration,
    ) -> LoadResult<bool> {
        let deadline = Instant::now() + budget;
        loop {
            let finished = self.pump()?;
            let now = Instant::now();
            if finished || now >= deadline {
                return Ok(finished);
            }

            if self.workers.active_request_count() > 0 {
                self.workers
                    .wait(deadline.saturating_duration_since(now).min(WORKER_POLL_INTERVAL));
            }
        }
    }

    /// Blocks until everything queued has loaded
    pub fn finish_loading(&mut self) -> LoadResult<()> {
        loop {
            if self.pump()? {
                return Ok(());
            }

            self.wait_for_workers();
        }
    }

    /// Blocks until `name` is loaded. Fails with `NotFound` if the manager runs out of work
    /// without loading it, for example because it was never requested or its load was cancelled.
    pub fn finish_loading_asset(
        &mut self,
        name: &str,
    ) -> LoadResult<()> {
        log::debug!("Waiting for {} to finish loading", name);
        loop {
            if self.cache.is_loaded(name) {
                return Ok(());
            }

            let finished = self.pump()?;
            if self.cache.is_loaded(name) {
                return Ok(());
            }

            if finished {
                return Err(LoadError::NotFound {
                    name: name.to_string(),
                });
            }

            self.wait_for_workers();
        }
    }

    pub fn finish_loading_asset_typed<T: Asset>(
        &mut self,
        name: &str,
    ) -> LoadResult<Arc<T>> {
        self.finish_loading_asset(name)?;
        self.get::<T>(name)
    }

    //
    // Queries
    //

    pub fn get<T: Asset>(
        &self,
        name: &str,
    ) -> LoadResult<Arc<T>> {
        self.cache.get::<T>(name)
    }

    pub fn get_by_type(
        &self,
        name: &str,
        asset_type: AssetTypeId,
    ) -> LoadResult<Arc<dyn DynAsset>> {
        self.cache.get_by_type(name, asset_type)
    }

    pub fn is_loaded(
        &self,
        name: &str,
    ) -> bool {
        self.cache.is_loaded(name)
    }

    pub fn is_loaded_with_type(
        &self,
        name: &str,
        asset_type: AssetTypeId,
    ) -> bool {
        self.cache.is_loaded_with_type(name, asset_type)
    }

    pub fn asset_type(
        &self,
        name: &str,
    ) -> Option<AssetTypeId> {
        self.cache.asset_type(name)
    }

    pub fn reference_count(
        &self,
        name: &str,
    ) -> Option<u32> {
        self.cache.ref_count(name)
    }

    /// Direct dependencies of a loaded asset, in the order its loader reported them
    pub fn dependencies(
        &self,
        name: &str,
    ) -> Vec<String> {
        self.graph.dependencies(name)
    }

    pub fn loaded_asset_names(&self) -> Vec<String> {
        self.cache.names()
    }

    pub fn loaded_count(&self) -> usize {
        self.cache.len()
    }

    /// Requests waiting in the queue plus tasks in flight
    pub fn queued_count(&self) -> usize {
        self.pending.len() + self.tasks.len()
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty() && self.tasks.is_empty()
    }

    /// Phase of the in-flight task loading `name`, if any
    pub fn load_phase(
        &self,
        name: &str,
    ) -> Option<LoadPhase> {
        self.tasks
            .iter()
            .find(|x| x.name() == name)
            .map(|x| x.phase())
    }

    pub fn load_info(
        &self,
        name: &str,
    ) -> Option<LoadInfo> {
        Some(LoadInfo {
            name: name.to_string(),
            asset_type: self.cache.asset_type(name)?,
            ref_count: self.cache.ref_count(name)?,
            dependencies: self.graph.dependencies(name),
        })
    }

    /// Fraction of the current batch that has loaded, between 0 and 1. Dependencies discovered
    /// while loading never make it go backwards. Queueing a new request starts it over.
    pub fn progress(&self) -> f32 {
        self.raw_progress().max(self.progress_floor).min(1.0)
    }

    /// One line per loaded asset with its reference count and dependencies
    pub fn diagnostics(&self) -> String {
        let mut output = String::new();
        for name in self.cache.names() {
            let ref_count = self.cache.ref_count(&name).unwrap_or(0);
            let _ = write!(output, "{}, refs: {}", name, ref_count);
            let dependencies = self.graph.dependencies(&name);
            if !dependencies.is_empty() {
                let _ = write!(output, ", deps: [{}]", dependencies.join(", "));
            }
            output.push('\n');
        }
        output
    }

    //
    // Internals
    //

    fn raw_progress(&self) -> f32 {
        if self.to_load == 0 {
            return 1.0;
        }

        let mut fraction = self.loaded as f32;
        if self.peak_tasks > 0 {
            fraction += self.peak_tasks.saturating_sub(self.tasks.len()) as f32
                / self.peak_tasks as f32;
        }

        (fraction / self.to_load as f32).min(1.0)
    }

    fn raise_progress_floor(&mut self) {
        self.progress_floor = self.progress_floor.max(self.raw_progress());
    }

    fn known_asset_type(
        &self,
        name: &str,
    ) -> Option<AssetTypeId> {
        self.cache
            .asset_type(name)
            .or_else(|| {
                self.tasks
                    .iter()
                    .find(|x| x.name() == name)
                    .map(|x| x.asset_type())
            })
            .or_else(|| {
                self.pending
                    .iter()
                    .find(|x| x.name() == name)
                    .map(|x| x.asset_type())
            })
    }

    fn allocate_task_id(&mut self) -> LoadTaskId {
        self.next_task_id += 1;
        LoadTaskId(self.next_task_id)
    }

    fn wait_for_workers(&mut self) {
        if self.workers.active_request_count() > 0 {
            self.workers.wait(WORKER_POLL_INTERVAL);
        }
    }

    fn drain_worker_results(&mut self) {
        while let Some(result) = self.workers.try_recv() {
            if let Some(task) = self.tasks.iter_mut().find(|x| x.id() == result.task_id) {
                task.accept_result(result.output);
            } else if let Some(orphan) = self.orphans.remove(&result.task_id) {
                log::debug!("Discarding result for cancelled load of {}", orphan.name());
                orphan.reclaim_result(result.output);
            } else {
                log::warn!("Dropping result for unknown load task {:?}", result.task_id);
            }
        }
    }

    fn reclaim_orphans(&mut self) {
        while !self.orphans.is_empty() && self.workers.has_outstanding_work() {
            self.workers.wait(WORKER_POLL_INTERVAL);
            self.drain_worker_results();
        }

        self.orphans.clear();
    }

    fn notify_loaded(
        &self,
        descriptor: &AssetDescriptor,
    ) {
        if let Some(callback) = descriptor.parameters().loaded_callback() {
            callback(self, descriptor.name(), descriptor.asset_type());
        }
    }

    fn promote_next_request(&mut self) -> LoadResult<()> {
        let descriptor = match self.pending.pop_front() {
            Some(descriptor) => descriptor,
            None => return Ok(()),
        };

        let asset_type = descriptor.asset_type();
        match self.cache.asset_type(descriptor.name()) {
            Some(existing) if existing == asset_type => {
                log::debug!("{} is already loaded, adding a reference", descriptor);
                if let Err(error) = self.reference_loaded(descriptor.name()) {
                    return self.fail_load(descriptor, None, error);
                }
                self.loaded += 1;
                self.notify_loaded(&descriptor);
                return Ok(());
            }
            Some(existing) => {
                let error = LoadError::TypeConflict {
                    name: descriptor.name().to_string(),
                    existing,
                    requested: asset_type,
                };
                return self.fail_load(descriptor, None, error);
            }
            None => {}
        }

        let loader = match self.registry.find(asset_type, descriptor.name()) {
            Some(loader) => loader,
            None => {
                let error = LoadError::NoLoader {
                    name: descriptor.name().to_string(),
                    asset_type,
                };
                return self.fail_load(descriptor, None, error);
            }
        };

        log::debug!("Start loading {}", descriptor);
        let id = self.allocate_task_id();
        self.tasks.push(LoadTask::new(id, descriptor, loader, false));
        self.peak_tasks = self.peak_tasks.max(self.tasks.len());
        Ok(())
    }

    fn update_active_task(&mut self) -> LoadResult<()> {
        let step = match self.tasks.last_mut() {
            Some(task) => {
                let mut ctx = TaskContext {
                    cache: &self.cache,
                    resolver: &*self.resolver,
                    workers: &mut self.workers,
                };
                task.update(&mut ctx)
            }
            None => return Ok(()),
        };

        match step {
            TaskStep::Waiting | TaskStep::Advanced => Ok(()),
            TaskStep::DependenciesDiscovered(dependencies) => {
                self.schedule_dependencies(dependencies)
            }
            TaskStep::Finished(asset) => self.finish_active_task(asset),
            TaskStep::Cancelled => {
                self.cancel_active_load();
                Ok(())
            }
            TaskStep::Failed(error) => {
                let failing = self
                    .tasks
                    .last()
                    .map(|x| x.name().to_string())
                    .unwrap_or_default();
                self.fail_active_load(&failing, error)
            }
        }
    }

    // Records the edges for a freshly discovered dependency list and makes sure each dependency is
    // either already loaded (and referenced) or stacked above the parent, in discovery order
    fn schedule_dependencies(
        &mut self,
        dependencies: Vec<AssetDescriptor>,
    ) -> LoadResult<()> {
        let parent = match self.tasks.last() {
            Some(task) => task.name().to_string(),
            None => return Ok(()),
        };

        let mut scheduled = Vec::default();
        let mut failure = None;
        for dependency in dependencies {
            let name = dependency.name().to_string();
            if let Err(error) = self.schedule_dependency(&parent, dependency, &mut scheduled) {
                failure = Some((name, error));
                break;
            }
        }

        // Tasks taken from lower in the stack must go back before any unwinding
        for task in scheduled.into_iter().rev() {
            self.tasks.push(task);
        }
        self.peak_tasks = self.peak_tasks.max(self.tasks.len());

        match failure {
            Some((failing, error)) => self.fail_active_load(&failing, error),
            None => Ok(()),
        }
    }

    fn schedule_dependency(
        &mut self,
        parent: &str,
        dependency: AssetDescriptor,
        scheduled: &mut Vec<LoadTask>,
    ) -> LoadResult<()> {
        let name = dependency.name();
        let asset_type = dependency.asset_type();

        let existing = self.known_asset_type(name).or_else(|| {
            scheduled
                .iter()
                .find(|x| x.name() == name)
                .map(|x| x.asset_type())
        });
        if let Some(existing) = existing {
            if existing != asset_type {
                return Err(LoadError::TypeConflict {
                    name: name.to_string(),
                    existing,
                    requested: asset_type,
                });
            }
        }

        if self.cache.is_loaded(name) {
            log::debug!("Dependency {} of {} is already loaded", name, parent);
            self.reference_loaded(name)?;
            // The edge must only exist while it holds a reference
            if let Err(error) = self.graph.add_edge(parent, name) {
                self.graph.cascade_release(&self.cache, name)?;
                return Err(error);
            }
            return Ok(());
        }

        self.graph.add_edge(parent, name)?;

        if let Some(index) = self.tasks.iter().position(|x| x.name() == name) {
            if self.tasks[index].is_started() {
                // Only ancestors of the parent are started, so this is a cycle
                return Err(LoadError::DependencyCycle {
                    parent: parent.to_string(),
                    child: name.to_string(),
                });
            }

            log::debug!("Dependency {} of {} is already scheduled", name, parent);
            let mut task = self.tasks.remove(index);
            task.add_extra_reference();
            scheduled.push(task);
            return Ok(());
        }

        let loader = self
            .registry
            .find(asset_type, name)
            .ok_or_else(|| LoadError::NoLoader {
                name: name.to_string(),
                asset_type,
            })?;

        log::debug!("Schedule dependency {} of {}", dependency, parent);
        let id = self.allocate_task_id();
        scheduled.push(LoadTask::new(id, dependency, loader, true));
        Ok(())
    }

    fn finish_active_task(
        &mut self,
        asset: Arc<dyn DynAsset>,
    ) -> LoadResult<()> {
        let task = match self.tasks.pop() {
            Some(task) => task,
            None => return Ok(()),
        };

        let name = task.name().to_string();
        let extra_references = task.extra_references();
        let installed = extra_references
            .checked_add(1)
            .ok_or_else(|| LoadError::RefCountOverflow { name: name.clone() })
            .and_then(|ref_count| self.cache.insert(&name, asset, ref_count));
        if let Err(error) = installed {
            // Put it back so it is unwound with the rest of the batch
            self.tasks.push(task);
            return self.fail_active_load(&name, error);
        }

        for cascaded in 0..extra_references {
            if let Err(error) = self.graph.cascade_add_ref(&self.cache, &name) {
                self.uninstall(&name, cascaded);
                self.tasks.push(task);
                return self.fail_active_load(&name, error);
            }
        }

        log::info!("Loaded {}", task.descriptor());
        if self.tasks.is_empty() {
            self.loaded += 1;
            self.peak_tasks = 0;
        }

        if !task.is_dependency() {
            self.notify_loaded(task.descriptor());
        }
        Ok(())
    }

    // Adds a reference to a loaded asset and everything it depends on, all or nothing
    fn reference_loaded(
        &mut self,
        name: &str,
    ) -> LoadResult<()> {
        self.cache.add_ref(name)?;
        if let Err(error) = self.graph.cascade_add_ref(&self.cache, name) {
            self.cache.release(name)?;
            return Err(error);
        }

        Ok(())
    }

    // Takes a just-installed asset back out of the cache after `cascaded` of its extra references
    // were mirrored onto its dependencies. Its own edges are left for the unwind to release.
    fn uninstall(
        &mut self,
        name: &str,
        cascaded: u32,
    ) {
        for _ in 0..cascaded {
            if let Err(error) = self.graph.cascade_release(&self.cache, name) {
                log::error!("Error releasing {}: {}", name, error);
            }
        }

        while let Ok(remaining) = self.cache.release(name) {
            if remaining == 0 {
                break;
            }
        }
    }

    fn cancel_active_load(&mut self) {
        if let Some(root) = self.tasks.first() {
            log::info!("Cancelled loading {}", root.descriptor());
        }

        self.unwind_tasks(LoadPhase::Cancelled);
        self.loaded += 1;
        self.peak_tasks = 0;
    }

    fn fail_active_load(
        &mut self,
        failing: &str,
        error: LoadError,
    ) -> LoadResult<()> {
        let root = match self.tasks.first() {
            Some(root) => root.descriptor().clone(),
            None => return Err(error),
        };

        self.fail_load(root, Some(failing), error)
    }

    // Fail-fast: the whole batch is abandoned and the queue cleared
    fn fail_load(
        &mut self,
        root: AssetDescriptor,
        failing: Option<&str>,
        error: LoadError,
    ) -> LoadResult<()> {
        let error = match failing {
            Some(failing) if failing != root.name() => LoadError::DependencyLoad {
                name: root.name().to_string(),
                dependency: failing.to_string(),
                source: Box::new(error),
            },
            _ => error,
        };

        log::error!("Failed to load {}: {}", root, error);
        self.unwind_tasks(LoadPhase::Failed);
        if !self.pending.is_empty() {
            log::warn!("Dropping {} queued loads", self.pending.len());
            self.pending.clear();
        }
        self.loaded = 0;
        self.to_load = 0;
        self.peak_tasks = 0;

        match self.error_listener.as_mut() {
            Some(listener) => {
                listener(&root, &error);
                Ok(())
            }
            None => Err(error),
        }
    }

    // Abandons every task, top of the stack first, giving back the references each one took on
    // its dependencies
    fn unwind_tasks(
        &mut self,
        phase: LoadPhase,
    ) {
        while let Some(task) = self.tasks.pop() {
            let name = task.name().to_string();
            if let Some((id, orphan)) = task.abandon(phase) {
                self.orphans.insert(id, orphan);
            }

            if let Err(error) = self.graph.release_dependencies(&self.cache, &name) {
                log::error!("Error releasing dependencies of {}: {}", name, error);
            }
        }
    }
}

impl Drop for AssetManager {
    fn drop(&mut self) {
        self.clear();
    }
}
