use crate::{AssetCache, LoadError, LoadResult};
use lading_base::hashing::{HashMap, HashSet};
use lading_base::OrderedSet;

/// Tracks which assets each asset depends on, in discovery order. Reference counts of children
/// follow their parents: every reference a parent gains or loses is mirrored onto everything
/// reachable from it.
///
/// Cascades walk the graph with an explicit stack. Edges that would close a cycle are rejected
/// when added, so the walks always terminate.
#[derive(Default)]
pub struct DependencyGraph {
    edges: HashMap<String, OrderedSet<String>>,
}

impl DependencyGraph {
    /// Returns false if the edge already existed
    pub fn add_edge(
        &mut self,
        parent: &str,
        child: &str,
    ) -> LoadResult<bool> {
        if self
            .edges
            .get(parent)
            .map_or(false, |x| x.contains(&child.to_string()))
        {
            return Ok(false);
        }

        if parent == child || self.is_reachable(child, parent) {
            return Err(LoadError::DependencyCycle {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        log::trace!("add dependency {} -> {}", parent, child);
        Ok(self
            .edges
            .entry(parent.to_string())
            .or_default()
            .try_insert_at_end(child.to_string()))
    }

    pub fn is_reachable(
        &self,
        from: &str,
        to: &str,
    ) -> bool {
        let mut visited = HashSet::default();
        let mut stack = vec![from];
        while let Some(name) = stack.pop() {
            if name == to {
                return true;
            }

            if !visited.insert(name) {
                continue;
            }

            if let Some(children) = self.edges.get(name) {
                stack.extend(children.iter().map(|x| x.as_str()));
            }
        }

        false
    }

    pub fn dependencies(
        &self,
        name: &str,
    ) -> Vec<String> {
        self.edges.get(name).map(|x| x.to_vec()).unwrap_or_default()
    }

    pub fn has_dependencies(
        &self,
        name: &str,
    ) -> bool {
        self.edges.get(name).map_or(false, |x| !x.is_empty())
    }

    /// True if any asset lists `name` as a dependency
    pub fn is_dependency(
        &self,
        name: &str,
    ) -> bool {
        let name = name.to_string();
        self.edges.values().any(|x| x.contains(&name))
    }

    pub fn remove_edges(
        &mut self,
        name: &str,
    ) {
        self.edges.remove(name);
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Adds one reference to every asset reachable from `root` (not to `root` itself), once per
    /// path leading to it. Work and counts grow with the number of paths, so a deep stack of
    /// diamonds can exhaust the `u32` count; the overflowing `add_ref` fails the whole cascade and
    /// the references already added are taken back.
    pub fn cascade_add_ref(
        &self,
        cache: &AssetCache,
        root: &str,
    ) -> LoadResult<()> {
        profiling::scope!("DependencyGraph::cascade_add_ref");
        let mut added: Vec<String> = Vec::new();
        let mut stack = self.children_reversed(root);
        while let Some(name) = stack.pop() {
            if let Err(error) = cache.add_ref(&name) {
                for name in added.iter().rev() {
                    cache.release(name)?;
                }
                return Err(error);
            }
            stack.extend(self.children_reversed(&name));
            added.push(name);
        }

        Ok(())
    }

    /// Releases `root` and, once per path, everything reachable from it. Assets that hit zero are
    /// disposed parent first, children in discovery order, and lose their outgoing edges. Names
    /// that are not loaded are skipped.
    pub fn cascade_release(
        &mut self,
        cache: &AssetCache,
        root: &str,
    ) -> LoadResult<()> {
        profiling::scope!("DependencyGraph::cascade_release");
        let mut stack = vec![root.to_string()];
        while let Some(name) = stack.pop() {
            if !cache.is_loaded(&name) {
                log::trace!("cascade_release skipping {}, not loaded", name);
                continue;
            }

            let remaining = cache.release(&name)?;
            stack.extend(self.children_reversed(&name));
            if remaining == 0 {
                self.edges.remove(&name);
            }
        }

        Ok(())
    }

    /// Drops the references `name` holds on its direct dependencies and forgets its edges. Used
    /// when a load is abandoned before `name` itself made it into the cache.
    pub fn release_dependencies(
        &mut self,
        cache: &AssetCache,
        name: &str,
    ) -> LoadResult<()> {
        for child in self.dependencies(name) {
            self.cascade_release(cache, &child)?;
        }

        self.edges.remove(name);
        Ok(())
    }

    fn children_reversed(
        &self,
        name: &str,
    ) -> Vec<String> {
        let mut children = self.dependencies(name);
        children.reverse();
        children
    }
}
