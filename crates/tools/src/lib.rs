//! Developer Tooling: scene inspector.
//!
//! # Invariants
//! - Inspection never mutates or commits the objects it reads.

mod inspector;

pub use inspector::{InstanceInfo, SceneInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "prism-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
