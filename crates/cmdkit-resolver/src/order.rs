use std::collections::{BTreeMap, BTreeSet};

use crate::DependencyGraph;

/// Kahn's algorithm over the edges whose endpoints are both in `selected`.
///
/// Returns `None` when some node never reaches in-degree zero, i.e. a cycle
/// slipped past detection.
pub(crate) fn topo_order<G>(graph: &G, selected: &[String]) -> Option<Vec<String>>
where
    G: DependencyGraph + ?Sized,
{
    let members: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    let mut reverse: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut in_degree: BTreeMap<String, usize> = BTreeMap::new();

    for name in selected {
        reverse.entry(name.clone()).or_default();
        in_degree.insert(name.clone(), 0);
    }

    for name in selected {
        let deps = graph
            .dependencies_of(name)
            .into_iter()
            .filter(|dep| members.contains(dep.as_str()))
            .collect::<BTreeSet<_>>();
        in_degree.insert(name.clone(), deps.len());
        for dep_name in deps {
            reverse.entry(dep_name).or_default().insert(name.clone());
        }
    }

    let mut ready: BTreeSet<String> = in_degree
        .iter()
        .filter_map(|(name, degree)| (*degree == 0).then_some(name.clone()))
        .collect();
    let mut ordered = Vec::with_capacity(selected.len());

    while let Some(next) = ready.pop_first() {
        if let Some(children) = reverse.get(&next) {
            for child in children {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(child.clone());
                    }
                }
            }
        }
        ordered.push(next);
    }

    (ordered.len() == selected.len()).then_some(ordered)
}
