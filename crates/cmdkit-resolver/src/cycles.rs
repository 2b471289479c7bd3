use std::collections::BTreeSet;

use crate::DependencyGraph;

struct CycleSearch<'g, G: ?Sized> {
    graph: &'g G,
    members: BTreeSet<String>,
    visited: BTreeSet<String>,
    stack: Vec<String>,
    cycles: Vec<Vec<String>>,
}

impl<G> CycleSearch<'_, G>
where
    G: DependencyGraph + ?Sized,
{
    fn visit(&mut self, node: &str) {
        self.visited.insert(node.to_string());
        self.stack.push(node.to_string());

        let mut deps = self.graph.dependencies_of(node);
        deps.retain(|dep| self.members.contains(dep));
        deps.sort();
        deps.dedup();

        for dep in deps {
            if let Some(start) = self.stack.iter().position(|on_stack| *on_stack == dep) {
                self.cycles.push(self.stack[start..].to_vec());
            } else if !self.visited.contains(&dep) {
                self.visit(&dep);
            }
        }

        self.stack.pop();
    }
}

/// Every cycle reachable among `names`, found by depth-first search.
///
/// A back-edge to a node still on the recursion stack yields the stack slice
/// starting at that node. Edges leaving the requested set are ignored.
pub fn detect_circular_dependencies<G, S>(graph: &G, names: &[S]) -> Vec<Vec<String>>
where
    G: DependencyGraph + ?Sized,
    S: AsRef<str>,
{
    let mut search = CycleSearch {
        graph,
        members: names.iter().map(|name| name.as_ref().to_string()).collect(),
        visited: BTreeSet::new(),
        stack: Vec::new(),
        cycles: Vec::new(),
    };

    for name in names {
        let name = name.as_ref();
        if !search.visited.contains(name) {
            search.visit(name);
        }
    }

    search.cycles
}
