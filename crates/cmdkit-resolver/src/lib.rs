mod cycles;
mod graph;
mod order;
mod resolve;

pub use cycles::detect_circular_dependencies;
pub use graph::DependencyGraph;
pub use resolve::resolve_install_order;
