//! # Install-time cycle detection.
//!
//! [`DependencyGraph`] is a plain-data copy of the installed graph: one node per
//! installed service (keyed by primary name) with its aliases and declared
//! dependencies. It is only touched under the registry lock.
//!
//! ## Algorithm
//! ```text
//! install(S):
//!   insert S tentatively
//!   keep  = every node that can reach S          (reverse walk)
//!   paths = every simple path S ─► … ─► S        (DFS restricted to `keep`)
//!   paths non-empty → remove S, reject install
//! ```
//!
//! Paths are reported by the names the edges were declared with, so a cycle closed
//! through an alias shows the alias: `a -> b-alias -> a`.

use std::collections::{HashMap, HashSet};

use crate::services::ServiceName;

struct Node {
    aliases: Vec<ServiceName>,
    deps: Vec<ServiceName>,
}

/// Installed services and their declared dependencies.
#[derive(Default)]
pub(crate) struct DependencyGraph {
    nodes: HashMap<ServiceName, Node>,
    /// Name or alias → primary name.
    owners: HashMap<ServiceName, ServiceName>,
}

impl DependencyGraph {
    /// Adds a node. Its name and aliases must not be owned yet.
    pub(crate) fn insert(&mut self, name: ServiceName, aliases: Vec<ServiceName>, deps: Vec<ServiceName>) {
        self.owners.insert(name.clone(), name.clone());
        for alias in &aliases {
            self.owners.insert(alias.clone(), name.clone());
        }
        self.nodes.insert(name, Node { aliases, deps });
    }

    /// Removes a node and the names it owns.
    pub(crate) fn remove(&mut self, name: &ServiceName) {
        if let Some(node) = self.nodes.remove(name) {
            self.owners.remove(name);
            for alias in &node.aliases {
                self.owners.remove(alias);
            }
        }
    }

    /// Adds `name` and keeps it only if that closes no cycle.
    ///
    /// On rejection the graph is left exactly as before and every cycle is returned.
    pub(crate) fn try_insert(
        &mut self,
        name: ServiceName,
        aliases: Vec<ServiceName>,
        deps: Vec<ServiceName>,
    ) -> Result<(), Vec<Vec<ServiceName>>> {
        self.insert(name.clone(), aliases, deps);
        let cycles = self.cycles_through(&name);
        if cycles.is_empty() {
            Ok(())
        } else {
            self.remove(&name);
            Err(cycles)
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, name: &ServiceName) -> bool {
        self.nodes.contains_key(name)
    }

    /// Primary names, sorted.
    pub(crate) fn names(&self) -> Vec<ServiceName> {
        let mut names: Vec<ServiceName> = self.nodes.keys().cloned().collect();
        names.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        names
    }

    fn owner(&self, name: &ServiceName) -> Option<&ServiceName> {
        self.owners.get(name)
    }

    /// Every distinct simple path from `start` back to itself.
    pub(crate) fn cycles_through(&self, start: &ServiceName) -> Vec<Vec<ServiceName>> {
        if !self.nodes.contains_key(start) {
            return Vec::new();
        }
        let keep = self.reaching(start);
        let mut cycles = Vec::new();
        let mut path = vec![start.clone()];
        let mut on_path: HashSet<ServiceName> = HashSet::new();
        on_path.insert(start.clone());
        self.walk(start, start, &keep, &mut path, &mut on_path, &mut cycles);
        cycles
    }

    fn walk(
        &self,
        start: &ServiceName,
        at: &ServiceName,
        keep: &HashSet<ServiceName>,
        path: &mut Vec<ServiceName>,
        on_path: &mut HashSet<ServiceName>,
        cycles: &mut Vec<Vec<ServiceName>>,
    ) {
        let Some(node) = self.nodes.get(at) else {
            return;
        };
        for dep in &node.deps {
            let Some(owner) = self.owner(dep) else {
                continue;
            };
            if owner == start {
                let mut cycle = path.clone();
                cycle.push(dep.clone());
                cycles.push(cycle);
                continue;
            }
            if !keep.contains(owner) || on_path.contains(owner) {
                continue;
            }
            path.push(dep.clone());
            on_path.insert(owner.clone());
            self.walk(start, owner, keep, path, on_path, cycles);
            on_path.remove(owner);
            path.pop();
        }
    }

    /// Primary names of every node with a path to `target`.
    fn reaching(&self, target: &ServiceName) -> HashSet<ServiceName> {
        let mut reverse: HashMap<&ServiceName, Vec<&ServiceName>> = HashMap::new();
        for (name, node) in &self.nodes {
            for dep in &node.deps {
                if let Some(owner) = self.owner(dep) {
                    reverse.entry(owner).or_default().push(name);
                }
            }
        }

        let mut seen: HashSet<ServiceName> = HashSet::new();
        let mut stack = vec![target];
        while let Some(at) = stack.pop() {
            for &from in reverse.get(at).map(Vec::as_slice).unwrap_or_default() {
                if seen.insert(from.clone()) {
                    stack.push(from);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<ServiceName> {
        list.iter().map(|n| ServiceName::from(*n)).collect()
    }

    fn render(cycles: &[Vec<ServiceName>]) -> Vec<String> {
        let mut out: Vec<String> = cycles
            .iter()
            .map(|c| c.iter().map(ServiceName::as_str).collect::<Vec<_>>().join(" -> "))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn acyclic_install_is_kept() {
        let mut g = DependencyGraph::default();
        g.try_insert("a".into(), vec![], names(&["b"])).unwrap();
        g.try_insert("b".into(), vec![], names(&["c"])).unwrap();
        assert!(g.contains(&"a".into()));
        assert!(g.contains(&"b".into()));
    }

    #[test]
    fn closing_a_cycle_is_rejected_and_rolled_back() {
        let mut g = DependencyGraph::default();
        g.try_insert("a".into(), vec![], names(&["b"])).unwrap();
        g.try_insert("b".into(), vec![], names(&["c"])).unwrap();

        let cycles = g.try_insert("c".into(), vec![], names(&["a"])).unwrap_err();
        assert_eq!(render(&cycles), vec!["c -> a -> b -> c"]);
        assert!(!g.contains(&"c".into()));
        assert_eq!(g.names(), names(&["a", "b"]));
    }

    #[test]
    fn every_distinct_cycle_is_reported() {
        let mut g = DependencyGraph::default();
        g.try_insert("b".into(), vec![], names(&["a"])).unwrap();
        g.try_insert("c".into(), vec![], names(&["a", "b"])).unwrap();

        let cycles = g.try_insert("a".into(), vec![], names(&["b", "c"])).unwrap_err();
        assert_eq!(
            render(&cycles),
            vec!["a -> b -> a", "a -> c -> a", "a -> c -> b -> a"]
        );
    }

    #[test]
    fn self_and_alias_dependencies_are_cycles() {
        let mut g = DependencyGraph::default();
        let cycles = g.try_insert("a".into(), vec![], names(&["a"])).unwrap_err();
        assert_eq!(render(&cycles), vec!["a -> a"]);

        let cycles = g
            .try_insert("a".into(), names(&["a2"]), names(&["a2"]))
            .unwrap_err();
        assert_eq!(render(&cycles), vec!["a -> a2"]);
        assert!(g.names().is_empty());
    }

    #[test]
    fn cycle_through_alias_names_the_alias() {
        let mut g = DependencyGraph::default();
        g.try_insert("b".into(), names(&["b-alias"]), names(&["a"])).unwrap();

        let cycles = g.try_insert("a".into(), vec![], names(&["b-alias"])).unwrap_err();
        assert_eq!(render(&cycles), vec!["a -> b-alias -> a"]);
    }

    #[test]
    fn dangling_dependencies_are_ignored() {
        let mut g = DependencyGraph::default();
        g.try_insert("a".into(), vec![], names(&["missing"])).unwrap();
        g.remove(&"a".into());
        assert!(g.names().is_empty());
    }
}
