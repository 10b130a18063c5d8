//! File dependency graph.
//!
//! Nodes are the extracted files (by index into the path-sorted file list),
//! edges are resolved imports. Resolution runs against an immutable
//! [`FileIndex`] of the complete file set, so the outcome for one file never
//! depends on which other files were looked at first. Cycles come from a
//! Tarjan SCC pass over the finished edge set.

pub mod index;

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{registry, SourceFile, SymbolDetail};

pub use index::FileIndex;

/// `from` imports `to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: usize,
    pub to: usize,
    pub from_path: String,
    pub to_path: String,
}

/// An import that names nothing inside the project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalDependency {
    pub file: String,
    pub specifier: String,
}

/// Files whose imports form a closed loop, in walk order.
///
/// `files` may name a file more than once when no simple loop passes
/// through every member; `members` lists each file once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub files: Vec<String>,
    #[serde(skip)]
    pub members: Vec<usize>,
}

impl Cycle {
    /// Number of distinct files in the cycle.
    pub fn len(&self) -> usize {
        self.files.iter().collect::<BTreeSet<_>>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Resolved import graph over one scan's files.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    edges: Vec<DependencyEdge>,
    external: Vec<ExternalDependency>,
    cycles: Vec<Cycle>,
    /// Per file, the resolution of each import in source order.
    resolved: Vec<Vec<Option<usize>>>,
}

impl DependencyGraph {
    /// Resolve every import of `files` and detect cycles.
    pub fn build(files: &[SourceFile]) -> Self {
        let nodes: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
        let index = FileIndex::new(&nodes);

        let mut edges = BTreeSet::new();
        let mut external = BTreeSet::new();
        let mut resolved = Vec::with_capacity(files.len());

        for (from, file) in files.iter().enumerate() {
            let adapter = registry().for_tag(&file.language);
            let mut targets = Vec::new();
            for spec in file.imports() {
                let target = adapter.and_then(|a| (a.resolve)(spec, &file.path, &index));
                match target {
                    Some(to) => {
                        edges.insert((from, to));
                    }
                    None => {
                        external.insert(ExternalDependency {
                            file: file.path.clone(),
                            specifier: spec.raw.clone(),
                        });
                    }
                }
                targets.push(target);
            }
            resolved.push(targets);
        }

        let edges: Vec<DependencyEdge> = edges
            .into_iter()
            .map(|(from, to)| DependencyEdge {
                from,
                to,
                from_path: nodes[from].clone(),
                to_path: nodes[to].clone(),
            })
            .collect();
        let cycles = find_cycles(&nodes, &edges);

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            external = external.len(),
            cycles = cycles.len(),
            "dependency graph built"
        );

        Self {
            nodes,
            edges,
            external: external.into_iter().collect(),
            cycles,
            resolved,
        }
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Deduplicated edges sorted by `(from, to)`.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Unresolved imports, deduplicated and sorted.
    pub fn external(&self) -> &[ExternalDependency] {
        &self.external
    }

    /// Cycles sorted by their first member.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Files `idx` imports.
    pub fn dependencies(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(move |e| e.from == idx)
            .map(|e| e.to_path.as_str())
    }

    /// Files importing `idx`.
    pub fn dependents(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.edges
            .iter()
            .filter(move |e| e.to == idx)
            .map(|e| e.from_path.as_str())
    }

    /// Copy each import's resolved path into its symbol.
    pub fn annotate(&self, files: Vec<SourceFile>) -> Vec<SourceFile> {
        files
            .into_iter()
            .enumerate()
            .map(|(idx, mut file)| {
                let mut targets = self.resolved.get(idx).map(|r| r.iter()).into_iter().flatten();
                for symbol in &mut file.symbols {
                    if let SymbolDetail::Import { resolved, .. } = &mut symbol.detail {
                        *resolved = targets
                            .next()
                            .copied()
                            .flatten()
                            .map(|to| self.nodes[to].clone());
                    }
                }
                file
            })
            .collect()
    }
}

/// Strongly connected components with more than one file, or a self-import.
///
/// Each cycle starts at its lexicographically smallest path. Consecutive
/// entries, and the last entry back to the first, are always import edges.
fn find_cycles(nodes: &[String], edges: &[DependencyEdge]) -> Vec<Cycle> {
    let mut graph = DiGraph::<usize, ()>::with_capacity(nodes.len(), edges.len());
    let handles: Vec<NodeIndex> = (0..nodes.len()).map(|i| graph.add_node(i)).collect();
    for edge in edges {
        graph.add_edge(handles[edge.from], handles[edge.to], ());
    }
    let self_loops: HashSet<usize> = edges
        .iter()
        .filter(|e| e.from == e.to)
        .map(|e| e.from)
        .collect();

    let mut cycles: Vec<Cycle> = tarjan_scc(&graph)
        .into_iter()
        .map(|scc| scc.into_iter().map(|n| graph[n]).collect::<Vec<usize>>())
        .filter(|scc| scc.len() > 1 || self_loops.contains(&scc[0]))
        .map(|scc| {
            let walk = Component::new(&scc, nodes, edges).walk();
            let mut seen = HashSet::new();
            let members = walk.iter().copied().filter(|m| seen.insert(*m)).collect();
            Cycle {
                files: walk.iter().map(|m| nodes[*m].clone()).collect(),
                members,
            }
        })
        .collect();
    cycles.sort_by(|a, b| a.files.cmp(&b.files));
    cycles
}

/// Node expansions spent looking for a simple cycle through every member
/// before settling for a closed walk.
const SIMPLE_CYCLE_BUDGET: usize = 4096;

/// One strongly connected component with successors in path order.
struct Component {
    start: usize,
    size: usize,
    successors: HashMap<usize, Vec<usize>>,
    /// Members sorted by path.
    sorted: Vec<usize>,
}

impl Component {
    fn new(scc: &[usize], nodes: &[String], edges: &[DependencyEdge]) -> Self {
        let in_scc: HashSet<usize> = scc.iter().copied().collect();
        let mut successors: HashMap<usize, Vec<usize>> = HashMap::new();
        for edge in edges
            .iter()
            .filter(|e| in_scc.contains(&e.from) && in_scc.contains(&e.to))
        {
            successors.entry(edge.from).or_default().push(edge.to);
        }
        for next in successors.values_mut() {
            next.sort_by(|a, b| nodes[*a].cmp(&nodes[*b]));
        }
        let mut sorted = scc.to_vec();
        sorted.sort_by(|a, b| nodes[*a].cmp(&nodes[*b]));
        Self {
            start: sorted.first().copied().unwrap_or_default(),
            size: sorted.len(),
            successors,
            sorted,
        }
    }

    fn next(&self, node: usize) -> &[usize] {
        self.successors.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A simple cycle through every member when one is found within budget,
    /// otherwise a closed walk visiting every member.
    fn walk(&self) -> Vec<usize> {
        if self.size == 0 {
            return Vec::new();
        }
        self.simple_cycle().unwrap_or_else(|| self.covering_walk())
    }

    /// Backtracking search, trying successors in path order.
    fn simple_cycle(&self) -> Option<Vec<usize>> {
        let mut path = vec![self.start];
        let mut on_path = HashSet::from([self.start]);
        // Per path entry, how many of its successors were already tried
        let mut tried = vec![0usize];
        let mut budget = SIMPLE_CYCLE_BUDGET;

        while let Some(&node) = path.last() {
            let next = self.next(node);
            if path.len() == self.size && next.contains(&self.start) {
                return Some(path);
            }
            let depth = path.len() - 1;
            let offset = next[tried[depth]..]
                .iter()
                .position(|n| !on_path.contains(n));
            match offset {
                Some(_) if budget == 0 => return None,
                Some(offset) => {
                    budget -= 1;
                    let chosen = next[tried[depth] + offset];
                    tried[depth] += offset + 1;
                    path.push(chosen);
                    on_path.insert(chosen);
                    tried.push(0);
                }
                None => {
                    path.pop();
                    on_path.remove(&node);
                    tried.pop();
                }
            }
        }
        None
    }

    /// From the start, take the shortest route to the smallest unvisited
    /// member until every member is on the walk, then the shortest route home.
    fn covering_walk(&self) -> Vec<usize> {
        let mut walk = vec![self.start];
        let mut visited = HashSet::from([self.start]);
        let mut current = self.start;
        loop {
            let Some(target) = self.sorted.iter().copied().find(|m| !visited.contains(m)) else {
                break;
            };
            let Some(route) = self.shortest_route(current, target) else {
                break;
            };
            visited.extend(route.iter().copied());
            walk.extend(route);
            current = target;
        }
        if let Some(mut home) = self.shortest_route(current, self.start) {
            home.pop();
            walk.extend(home);
        }
        walk
    }

    /// Breadth-first route from `from` to `to`, excluding `from`, including `to`.
    fn shortest_route(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let mut parent: HashMap<usize, usize> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            for &n in self.next(node) {
                if n == to {
                    let mut route = vec![n];
                    let mut cur = node;
                    while cur != from {
                        route.push(cur);
                        cur = match parent.get(&cur) {
                            Some(&prev) => prev,
                            None => break,
                        };
                    }
                    route.reverse();
                    return Some(route);
                }
                if n != from && !parent.contains_key(&n) {
                    parent.insert(n, node);
                    queue.push_back(n);
                }
            }
        }
        None
    }
}
