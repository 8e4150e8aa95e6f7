use std::collections::{HashMap, VecDeque};

use crate::error::ScheduleError;

use super::task::TaskLike;

/// Task dependency graph (DAG)
///
/// Dependency ids that name no task in the graph are dropped at
/// construction time: the task schedules as if that dependency did not
/// exist. This keeps planner output usable even when the planner names a
/// dependency it never emitted.
#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskLike> {
    /// Task nodes: task_id -> Task
    pub nodes: HashMap<String, T>,

    /// Dependency edges: task_id -> list of dependencies (known ids only)
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Original insertion order (for stable scheduling)
    insertion_order: Vec<String>,
}

impl<T: TaskLike> TaskGraph<T> {
    /// Construct the graph from planner output.
    pub fn from_tasks(tasks: &[T]) -> Result<Self, ScheduleError> {
        let mut nodes: HashMap<String, T> = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in tasks {
            if nodes.contains_key(task.id()) {
                return Err(ScheduleError::DuplicateTaskId(task.id().to_string()));
            }
            nodes.insert(task.id().to_string(), task.clone());
            insertion_order.push(task.id().to_string());
        }

        // Second pass: edges, with unknown dependency ids filtered out.
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();

        for task in tasks {
            let mut dependencies = Vec::new();
            for dep in task.dependencies() {
                if nodes.contains_key(dep) {
                    dependencies.push(dep.clone());
                } else {
                    tracing::debug!(
                        task_id = task.id(),
                        missing_dep = dep.as_str(),
                        "dropping dependency on unknown task id"
                    );
                }
            }
            for dep in &dependencies {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id().to_string());
            }
            edges.insert(task.id().to_string(), dependencies);
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flat topological order using Kahn's algorithm.
    ///
    /// Zero-in-degree tasks are seeded in planner emission order and the
    /// queue is FIFO, so the output is deterministic for a given planner
    /// output. If the result is shorter than the graph, the remaining
    /// tasks form at least one cycle and scheduling fails naming them all;
    /// no partial order is returned.
    pub fn schedule(&self) -> Result<Vec<String>, ScheduleError> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for id in self.nodes.keys() {
            in_degree.insert(id.as_str(), 0);
        }
        for (task_id, dependencies) in &self.edges {
            *in_degree.get_mut(task_id.as_str()).unwrap() += dependencies.len();
        }

        let mut queue: VecDeque<&str> = self
            .insertion_order
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree[id] == 0)
            .collect();

        let mut order: Vec<String> = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());

            if let Some(dependents) = self.reverse_edges.get(id) {
                for dependent in dependents {
                    let degree = in_degree.get_mut(dependent.as_str()).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent.as_str());
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let remaining: Vec<String> = self
                .insertion_order
                .iter()
                .filter(|id| !order.contains(id))
                .cloned()
                .collect();
            return Err(ScheduleError::Cycle { remaining });
        }

        Ok(order)
    }

    /// Topological order grouped into dependency stages.
    ///
    /// Tasks in the same stage have no mutual dependency and may run
    /// concurrently; stage N+1 tasks depend only on stages <= N.
    pub fn stages(&self) -> Result<Vec<Vec<String>>, ScheduleError> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for id in self.nodes.keys() {
            in_degree.insert(id.as_str(), 0);
        }
        for (task_id, dependencies) in &self.edges {
            *in_degree.get_mut(task_id.as_str()).unwrap() += dependencies.len();
        }

        let mut current: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|id| in_degree[id.as_str()] == 0)
            .cloned()
            .collect();

        let mut stages: Vec<Vec<String>> = Vec::new();
        let mut processed = 0usize;

        while !current.is_empty() {
            processed += current.len();

            let mut next: Vec<String> = Vec::new();
            for id in &current {
                if let Some(dependents) = self.reverse_edges.get(id) {
                    for dependent in dependents {
                        let degree = in_degree.get_mut(dependent.as_str()).unwrap();
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.clone());
                        }
                    }
                }
            }

            // Preserve emission order inside each stage
            next.sort_by_key(|id| {
                self.insertion_order
                    .iter()
                    .position(|k| k == id)
                    .unwrap_or(usize::MAX)
            });

            stages.push(std::mem::replace(&mut current, next));
        }

        if processed != self.nodes.len() {
            let flat: Vec<&String> = stages.iter().flatten().collect();
            let remaining: Vec<String> = self
                .insertion_order
                .iter()
                .filter(|id| !flat.contains(id))
                .cloned()
                .collect();
            return Err(ScheduleError::Cycle { remaining });
        }

        Ok(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::super::task::Task;
    use super::*;

    fn graph(tasks: &[Task]) -> TaskGraph<Task> {
        TaskGraph::from_tasks(tasks).unwrap()
    }

    #[test]
    fn schedule_respects_dependencies() {
        let tasks = vec![
            Task::new("b", "second").depends_on("a"),
            Task::new("a", "first"),
        ];
        let order = graph(&tasks).schedule().unwrap();
        assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn schedule_is_deterministic_for_ties() {
        let tasks = vec![
            Task::new("t3", "three"),
            Task::new("t1", "one"),
            Task::new("t2", "two"),
        ];
        let g = graph(&tasks);
        let first = g.schedule().unwrap();
        for _ in 0..10 {
            assert_eq!(g.schedule().unwrap(), first);
        }
        // Ties resolve in emission order, not id order
        assert_eq!(first, vec!["t3", "t1", "t2"]);
    }

    #[test]
    fn empty_graph_schedules_empty() {
        let g: TaskGraph<Task> = TaskGraph::from_tasks(&[]).unwrap();
        assert!(g.schedule().unwrap().is_empty());
        assert!(g.stages().unwrap().is_empty());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let tasks = vec![Task::new("a", "one"), Task::new("a", "again")];
        match TaskGraph::from_tasks(&tasks) {
            Err(ScheduleError::DuplicateTaskId(id)) => assert_eq!(id, "a"),
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }

    #[test]
    fn cycle_names_every_unresolved_task() {
        let tasks = vec![
            Task::new("task-x", "x").depends_on("task-y"),
            Task::new("task-y", "y").depends_on("task-x"),
        ];
        match graph(&tasks).schedule() {
            Err(ScheduleError::Cycle { remaining }) => {
                assert_eq!(remaining, vec!["task-x".to_string(), "task-y".to_string()]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn cycle_returns_no_partial_order() {
        // "c" is schedulable but the cycle must fail the whole schedule
        let tasks = vec![
            Task::new("a", "a").depends_on("b"),
            Task::new("b", "b").depends_on("a"),
            Task::new("c", "c"),
        ];
        assert!(graph(&tasks).schedule().is_err());
    }

    #[test]
    fn missing_dependency_is_tolerated() {
        let tasks = vec![Task::new("a", "a").depends_on("ghost"), Task::new("b", "b")];
        let order = graph(&tasks).schedule().unwrap();
        assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn stages_group_independent_tasks() {
        let tasks = vec![
            Task::new("a", "a"),
            Task::new("b", "b"),
            Task::new("c", "c").depends_on("a").depends_on("b"),
            Task::new("d", "d").depends_on("c"),
        ];
        let stages = graph(&tasks).stages().unwrap();
        assert_eq!(
            stages,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string()],
                vec!["d".to_string()],
            ]
        );
    }

    #[test]
    fn schedule_matches_stage_flattening() {
        let tasks = vec![
            Task::new("a", "a"),
            Task::new("b", "b").depends_on("a"),
            Task::new("c", "c").depends_on("a"),
            Task::new("d", "d").depends_on("b").depends_on("c"),
        ];
        let g = graph(&tasks);
        let flat = g.schedule().unwrap();
        let staged: Vec<String> = g.stages().unwrap().into_iter().flatten().collect();
        assert_eq!(flat, staged);
    }
}
