use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::task::{StudyTask, TaskId};

/// Prerequisite graph over tasks. Edges run prerequisite -> dependent.
pub struct DependencyDag {
    pub graph: DiGraph<TaskId, ()>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl DependencyDag {
    pub fn build(tasks: &[StudyTask]) -> Self {
        let mut graph: DiGraph<TaskId, ()> = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::with_capacity(tasks.len());

        // Nodes first, so edges can reference any task regardless of order.
        for task in tasks {
            let node_ix = graph.add_node(task.id);
            id_to_index.insert(task.id, node_ix);
        }

        for task in tasks {
            for prerequisite in &task.dependencies {
                if let (Some(&u), Some(&v)) =
                    (id_to_index.get(prerequisite), id_to_index.get(&task.id))
                {
                    graph.add_edge(u, v, ());
                }
            }
        }

        Self { graph, id_to_index }
    }

    /// True when making `task` depend on `prerequisite` would close a cycle.
    pub fn would_create_cycle(&self, task: TaskId, prerequisite: TaskId) -> bool {
        if task == prerequisite {
            return true;
        }
        match (self.id_to_index.get(&task), self.id_to_index.get(&prerequisite)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Prerequisites first; among ready tasks the lowest id goes first.
    /// Returns `None` when the graph contains a cycle.
    pub fn study_order(&self) -> Option<Vec<TaskId>> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|ix| {
                let incoming = self
                    .graph
                    .neighbors_directed(ix, Direction::Incoming)
                    .count();
                (ix, incoming)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<(TaskId, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(&ix, _)| Reverse((self.graph[ix], ix)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((task_id, ix))) = ready.pop() {
            order.push(task_id);
            for next in self.graph.neighbors_directed(ix, Direction::Outgoing) {
                if let Some(deg) = in_degree.get_mut(&next) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse((self.graph[next], next)));
                    }
                }
            }
        }

        (order.len() == self.graph.node_count()).then_some(order)
    }
}
