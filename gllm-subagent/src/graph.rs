//! Dependency graph construction and cycle detection for a sub-agent batch.

use crate::SubagentTaskSpec;

/// Build each task's dependency set (indices into the same batch).
///
/// `wait = true` is an explicit barrier on every task submitted earlier in
/// the batch. Otherwise the dependency set is whichever batch tasks'
/// `task_key` appears in this task's `input_keys` — note this search is
/// over the whole batch, not just earlier entries, so two tasks naming
/// each other's `task_key` in their `input_keys` form a genuine cycle for
/// [`has_cycle`] to catch. An `input_key` matching no batch task is
/// assumed already resolvable from shared state and contributes no
/// scheduling dependency.
pub fn build_dependencies(specs: &[SubagentTaskSpec]) -> Vec<Vec<usize>> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            if spec.wait {
                (0..i).collect()
            } else {
                specs.iter().enumerate().filter(|(j, s)| *j != i && spec.input_keys.contains(&s.task_key)).map(|(j, _)| j).collect()
            }
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Whether `deps` (edge i -> j means "i depends on j") contains a cycle.
pub fn has_cycle(deps: &[Vec<usize>]) -> bool {
    let mut colors = vec![Color::Unvisited; deps.len()];
    for start in 0..deps.len() {
        if colors[start] == Color::Unvisited && visit(start, deps, &mut colors) {
            return true;
        }
    }
    false
}

fn visit(node: usize, deps: &[Vec<usize>], colors: &mut [Color]) -> bool {
    colors[node] = Color::InProgress;
    for &next in &deps[node] {
        match colors[next] {
            Color::InProgress => return true,
            Color::Done => continue,
            Color::Unvisited => {
                if visit(next, deps, colors) {
                    return true;
                }
            }
        }
    }
    colors[node] = Color::Done;
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(task_key: &str, input_keys: &[&str], wait: bool) -> SubagentTaskSpec {
        SubagentTaskSpec {
            agent_name: "researcher".into(),
            instruction: "do work".into(),
            task_key: task_key.into(),
            input_keys: input_keys.iter().map(|s| s.to_string()).collect(),
            wait,
        }
    }

    #[test]
    fn input_key_dependency_links_to_matching_earlier_task() {
        let specs = vec![spec("a", &[], false), spec("b", &["a"], false)];
        let deps = build_dependencies(&specs);
        assert_eq!(deps, vec![vec![], vec![0]]);
        assert!(!has_cycle(&deps));
    }

    #[test]
    fn unmatched_input_key_contributes_no_dependency() {
        let specs = vec![spec("a", &["from_prior_batch"], false)];
        let deps = build_dependencies(&specs);
        assert_eq!(deps, vec![vec![]]);
    }

    #[test]
    fn wait_barrier_depends_on_every_earlier_task() {
        let specs = vec![spec("a", &[], false), spec("b", &[], false), spec("c", &[], true)];
        let deps = build_dependencies(&specs);
        assert_eq!(deps[2], vec![0, 1]);
    }

    #[test]
    fn self_consistent_chain_has_no_cycle() {
        let specs = vec![spec("a", &[], false), spec("b", &["a"], false), spec("c", &["b"], false)];
        assert!(!has_cycle(&build_dependencies(&specs)));
    }

    #[test]
    fn circular_input_keys_are_detected() {
        // b depends on a's output, but a's input_keys name b's task_key too.
        let specs = vec![spec("a", &["b"], false), spec("b", &["a"], false)];
        assert!(has_cycle(&build_dependencies(&specs)));
    }
}
