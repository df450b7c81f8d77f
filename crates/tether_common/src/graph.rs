//! Directed multigraph with named, prioritized edges.
//!
//! Vertices and edges are keyed by caller-supplied names. Edge priority is a
//! plain integer where lower values are preferred when building a spanning
//! tree (causal links use 1, candidate orderings use 2).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt::{Debug, Display};
use std::hash::Hash;

use tracing::warn;

use crate::error::{Result, TetherError};

#[derive(Debug, Clone)]
pub struct Vertex<V> {
    pub name: V,
    pub out_edges: Vec<usize>,
    pub in_edges: Vec<usize>,
    pub mark: bool,
}

#[derive(Debug, Clone)]
pub struct Edge<E> {
    pub id: E,
    pub source: usize,
    pub target: usize,
    pub priority: u32,
    pub mark: bool,
}

/// Pending edge in the spanning-tree frontier.
///
/// Heap order: lowest priority first, then the most recently discovered edge,
/// which keeps the traversal depth-first among equally preferred edges.
#[derive(Debug, PartialEq, Eq)]
struct FrontierEdge {
    priority: u32,
    seq: u64,
    edge: usize,
}

impl Ord for FrontierEdge {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for FrontierEdge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
pub struct DirectedGraph<V, E> {
    name: String,
    start: Option<usize>,
    vertices: Vec<Vertex<V>>,
    edges: Vec<Edge<E>>,
    vertex_index: HashMap<V, usize>,
    edge_index: HashMap<E, usize>,
}

impl<V, E> DirectedGraph<V, E>
where
    V: Clone + Eq + Hash + Debug,
    E: Clone + Eq + Hash + Debug,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_index: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a vertex, or return the existing one with that name.
    ///
    /// The last call with `is_start = true` designates the start vertex.
    pub fn add_vertex(&mut self, name: V, is_start: bool) -> usize {
        let index = match self.vertex_index.get(&name) {
            Some(&index) => index,
            None => {
                let index = self.vertices.len();
                self.vertex_index.insert(name.clone(), index);
                self.vertices.push(Vertex {
                    name,
                    out_edges: Vec::new(),
                    in_edges: Vec::new(),
                    mark: false,
                });
                index
            }
        };
        if is_start {
            self.start = Some(index);
        }
        index
    }

    /// Add an edge between two vertices, creating missing endpoints.
    pub fn add_edge(&mut self, id: E, source: V, target: V, priority: u32) -> Result<usize> {
        if self.edge_index.contains_key(&id) {
            return Err(TetherError::DuplicateEdge(format!("{:?}", id)));
        }
        let source = self.add_vertex(source, false);
        let target = self.add_vertex(target, false);
        let index = self.edges.len();
        self.edge_index.insert(id.clone(), index);
        self.edges.push(Edge {
            id,
            source,
            target,
            priority,
            mark: false,
        });
        self.vertices[source].out_edges.push(index);
        self.vertices[target].in_edges.push(index);
        Ok(index)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn start(&self) -> Option<&V> {
        self.start.map(|index| &self.vertices[index].name)
    }

    pub fn contains_vertex(&self, name: &V) -> bool {
        self.vertex_index.contains_key(name)
    }

    /// Vertex names, in insertion order.
    pub fn vertex_names(&self) -> impl Iterator<Item = &V> + '_ {
        self.vertices.iter().map(|v| &v.name)
    }

    /// Number of edges entering `name`; zero for an unknown vertex.
    pub fn in_degree(&self, name: &V) -> usize {
        self.vertex_index
            .get(name)
            .map(|&index| self.vertices[index].in_edges.len())
            .unwrap_or(0)
    }

    /// `(id, source, target, priority)` of every edge, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&E, &V, &V, u32)> + '_ {
        self.edges.iter().map(|e| {
            (
                &e.id,
                &self.vertices[e.source].name,
                &self.vertices[e.target].name,
                e.priority,
            )
        })
    }

    /// True if `target` is reachable from `source` over outgoing edges.
    pub fn path_exists(&self, source: &V, target: &V) -> bool {
        if source == target {
            return true;
        }
        let (Some(&source), Some(&target)) =
            (self.vertex_index.get(source), self.vertex_index.get(target))
        else {
            return false;
        };

        let mut visited = vec![false; self.vertices.len()];
        visited[source] = true;
        let mut stack: Vec<usize> = self.vertices[source].out_edges.clone();

        while let Some(edge) = stack.pop() {
            let vertex = self.edges[edge].target;
            if visited[vertex] {
                continue;
            }
            if vertex == target {
                return true;
            }
            visited[vertex] = true;
            stack.extend(self.vertices[vertex].out_edges.iter().copied());
        }
        false
    }

    /// Mark a spanning tree rooted at the start vertex.
    ///
    /// Each vertex is entered through at most one marked edge. While any
    /// lower-priority edge can reach an unmarked vertex it is taken before a
    /// higher-priority one. Vertices unreachable from the start stay unmarked.
    pub fn mark_preferred_spanning_tree(&mut self) {
        let Some(start) = self.start else {
            warn!("Graph {} has no start vertex; cannot build spanning tree", self.name);
            return;
        };
        self.remove_marks();

        let mut seq: u64 = 0;
        let mut frontier = BinaryHeap::new();
        self.vertices[start].mark = true;
        for &edge in &self.vertices[start].out_edges {
            frontier.push(FrontierEdge {
                priority: self.edges[edge].priority,
                seq,
                edge,
            });
            seq += 1;
        }

        while let Some(FrontierEdge { edge, .. }) = frontier.pop() {
            let vertex = self.edges[edge].target;
            if self.vertices[vertex].mark {
                continue;
            }
            self.edges[edge].mark = true;
            self.vertices[vertex].mark = true;
            for &next in &self.vertices[vertex].out_edges {
                if !self.vertices[self.edges[next].target].mark {
                    frontier.push(FrontierEdge {
                        priority: self.edges[next].priority,
                        seq,
                        edge: next,
                    });
                    seq += 1;
                }
            }
        }
    }

    pub fn remove_marks(&mut self) {
        for vertex in &mut self.vertices {
            vertex.mark = false;
        }
        for edge in &mut self.edges {
            edge.mark = false;
        }
    }

    pub fn is_edge_marked(&self, id: &E) -> bool {
        self.edge_index
            .get(id)
            .map(|&index| self.edges[index].mark)
            .unwrap_or(false)
    }

    pub fn is_vertex_marked(&self, name: &V) -> bool {
        self.vertex_index
            .get(name)
            .map(|&index| self.vertices[index].mark)
            .unwrap_or(false)
    }

    /// Ids of marked edges, in insertion order.
    pub fn marked_edges(&self) -> impl Iterator<Item = &E> + '_ {
        self.edges.iter().filter(|e| e.mark).map(|e| &e.id)
    }
}

impl<V, E> DirectedGraph<V, E>
where
    V: Clone + Eq + Hash + Debug + Display,
    E: Clone + Eq + Hash + Debug + Display,
{
    /// Render vertices and edges, optionally only the marked ones.
    pub fn describe(&self, marked_only: bool) -> String {
        let vertices: Vec<String> = self
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !marked_only || v.mark)
            .map(|(index, v)| {
                if Some(index) == self.start {
                    format!("{}(S)", v.name)
                } else {
                    v.name.to_string()
                }
            })
            .collect();
        let edges: Vec<String> = self
            .edges
            .iter()
            .filter(|e| !marked_only || e.mark)
            .map(|e| {
                format!(
                    "[{}, {}, {}]",
                    e.id, self.vertices[e.source].name, self.vertices[e.target].name
                )
            })
            .collect();
        let label = if marked_only { "marked " } else { "" };
        format!(
            "Graph {}, {}vertices [{}], {}edges [{}]",
            self.name,
            label,
            vertices.join(", "),
            label,
            edges.join(", ")
        )
    }
}
