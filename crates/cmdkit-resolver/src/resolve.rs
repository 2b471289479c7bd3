use std::collections::BTreeSet;

use cmdkit_core::{CommandsetError, Result};

use crate::cycles::detect_circular_dependencies;
use crate::order::topo_order;
use crate::DependencyGraph;

/// Orders `names` so that every commandset follows its declared dependencies.
///
/// The input is deduplicated first. Every declared dependency of a requested
/// commandset must itself be requested; nothing is pulled in implicitly.
pub fn resolve_install_order<G, S>(graph: &G, names: &[S]) -> Result<Vec<String>>
where
    G: DependencyGraph + ?Sized,
    S: AsRef<str>,
{
    let requested = dedup_names(names);
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let members: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
    for name in &requested {
        for required in graph.dependencies_of(name) {
            if !members.contains(required.as_str()) {
                return Err(CommandsetError::MissingDependency {
                    commandset: name.clone(),
                    required,
                });
            }
        }
    }

    if let Some(cycle) = detect_circular_dependencies(graph, requested.as_slice())
        .into_iter()
        .next()
    {
        return Err(CommandsetError::CircularDependency { cycle });
    }

    match topo_order(graph, &requested) {
        Some(order) => Ok(order),
        None => {
            tracing::warn!(
                requested = ?requested,
                "topological sort left nodes unresolved, keeping request order"
            );
            Ok(requested)
        }
    }
}

pub(crate) fn dedup_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
