//! Dependency graph between warehouse tables.
//!
//! Nodes are staging tables (sources) and models; an edge `a → b` means
//! model `b` reads table `a`. Before anything runs the graph is checked:
//!
//! - every dependency names a staging table or another model
//! - no model reads a table from a later layer
//! - marts and analytics never read staging directly
//! - there are no cycles
//!
//! The execution plan is layer-major and topologically ordered within a
//! layer, ties broken by declaration order.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::Model;
use crate::schema::{tables, Layer};

/// Error returned when the model declarations do not form a valid build.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("Model {0} is declared more than once")]
    DuplicateModel(String),

    #[error("Model {model} depends on unknown table {dependency}")]
    UnknownDependency { model: String, dependency: String },

    #[error("Model {model} ({model_layer}) may not read {dependency} ({dependency_layer})")]
    LayerViolation {
        model: String,
        model_layer: Layer,
        dependency: String,
        dependency_layer: Layer,
    },

    #[error("Circular dependencies detected: {}", format_cycles(.0))]
    Cycle(Vec<Vec<String>>),
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|c| format!("{} → (back to start)", c.join(" → ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A node in the build graph.
#[derive(Debug, Clone, Copy)]
pub enum GraphNode {
    Source(&'static str),
    Model(&'static Model),
}

impl GraphNode {
    pub fn name(&self) -> &'static str {
        match self {
            GraphNode::Source(name) => name,
            GraphNode::Model(model) => model.name(),
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            GraphNode::Source(_) => Layer::Staging,
            GraphNode::Model(model) => model.layer(),
        }
    }
}

/// Validated dependency graph of the warehouse models.
#[derive(Debug)]
pub struct BuildGraph {
    graph: DiGraph<GraphNode, ()>,
    index: HashMap<&'static str, NodeIndex>,
    /// Models in declaration order.
    models: Vec<&'static Model>,
}

impl BuildGraph {
    /// Graph of every model the warehouse builds.
    pub fn standard() -> Result<Self, GraphError> {
        Self::new(&super::all_models())
    }

    /// Build and validate a graph over the given models.
    pub fn new(models: &[&'static Model]) -> Result<Self, GraphError> {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for &model in models {
            if index.contains_key(model.name()) {
                return Err(GraphError::DuplicateModel(model.name().to_string()));
            }
            let idx = graph.add_node(GraphNode::Model(model));
            index.insert(model.name(), idx);
        }

        for &model in models {
            let to = index[model.name()];
            for dep in model.depends_on {
                let from = match index.get(dep) {
                    Some(&idx) => idx,
                    None => {
                        let source = tables::find(dep)
                            .filter(|t| t.layer == Layer::Staging)
                            .ok_or_else(|| GraphError::UnknownDependency {
                                model: model.name().to_string(),
                                dependency: dep.to_string(),
                            })?;
                        let idx = graph.add_node(GraphNode::Source(source.name));
                        index.insert(source.name, idx);
                        idx
                    }
                };

                check_layers(model, graph[from])?;
                graph.add_edge(from, to, ());
            }
        }

        let build = Self {
            graph,
            index,
            models: models.to_vec(),
        };
        build.check_acyclic()?;
        Ok(build)
    }

    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0])
            })
            .map(|scc| {
                let mut names: Vec<String> = scc
                    .iter()
                    .map(|&idx| self.graph[idx].name().to_string())
                    .collect();
                names.sort();
                names
            })
            .collect();

        if cycles.is_empty() {
            Ok(())
        } else {
            cycles.sort();
            Err(GraphError::Cycle(cycles))
        }
    }

    pub fn models(&self) -> &[&'static Model] {
        &self.models
    }

    /// Tables `name` reads directly.
    pub fn dependencies(&self, name: &str) -> Vec<&'static str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Models that read `name` directly.
    pub fn dependents(&self, name: &str) -> Vec<&'static str> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&'static str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&'static str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].name())
            .collect();
        names.sort_unstable();
        names
    }

    /// Every table `name` reads, directly or transitively.
    pub fn upstream(&self, name: &str) -> HashSet<&'static str> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            for dep in self.dependencies(current) {
                if seen.insert(dep) {
                    queue.push_back(dep);
                }
            }
        }
        seen
    }

    /// Layer-major, dependency-respecting build order.
    pub fn plan(&self) -> ExecutionPlan {
        let mut done: HashSet<&'static str> = HashSet::new();
        let mut steps = Vec::with_capacity(self.models.len());

        for layer in Layer::DERIVED {
            let mut pending: Vec<&'static Model> = self
                .models
                .iter()
                .copied()
                .filter(|m| m.layer() == layer)
                .collect();

            while !pending.is_empty() {
                // Acyclic and layer-checked, so some pending model is always ready.
                let ready = pending
                    .iter()
                    .position(|m| {
                        self.dependencies(m.name()).iter().all(|dep| {
                            done.contains(dep) || !self.is_model(dep)
                        })
                    })
                    .unwrap_or(0);
                let model = pending.remove(ready);
                done.insert(model.name());
                steps.push(model);
            }
        }

        ExecutionPlan { steps }
    }

    fn is_model(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&idx| matches!(self.graph[idx], GraphNode::Model(_)))
    }
}

fn check_layers(model: &Model, dep: GraphNode) -> Result<(), GraphError> {
    let dep_layer = dep.layer();
    let reads_later_layer = dep_layer > model.layer();
    let aggregate_reads_staging = model.layer() >= Layer::Mart && dep_layer == Layer::Staging;

    if reads_later_layer || aggregate_reads_staging {
        return Err(GraphError::LayerViolation {
            model: model.name().to_string(),
            model_layer: model.layer(),
            dependency: dep.name().to_string(),
            dependency_layer: dep_layer,
        });
    }
    Ok(())
}

/// Ordered list of models to build.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub steps: Vec<&'static Model>,
}

impl ExecutionPlan {
    /// Models of one layer, in build order.
    pub fn stage(&self, layer: Layer) -> impl Iterator<Item = &'static Model> + '_ {
        self.steps.iter().copied().filter(move |m| m.layer() == layer)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for layer in Layer::DERIVED {
            let names: Vec<&str> = self.stage(layer).map(|m| m.name()).collect();
            if !names.is_empty() {
                writeln!(f, "{}: {}", layer, names.join(", "))?;
            }
        }
        Ok(())
    }
}
