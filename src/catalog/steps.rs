//! Step catalog: the user-visible steps of one operation, in order.

use std::path::Path;

use super::parset::Parset;
use crate::artifact::ReadOutcome;
use crate::error::{CheckError, Result};

/// How the pipeline treats a declared step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// A recipe or executable; counts as progress
    Ordinary,
    /// Administrative step (mapfile bookkeeping, directory changes)
    Plugin,
    /// Repeats its `loopsteps` until a break condition
    Loop,
}

impl StepKind {
    /// Classify a step by its `control.kind` entry. Missing means ordinary.
    pub fn of(parset: &Parset, step: &str) -> Self {
        match parset.module_value(step, "control.kind").map(|v| v.trim_matches(['\'', '"'])) {
            Some("plugin") => StepKind::Plugin,
            Some("loop") => StepKind::Loop,
            _ => StepKind::Ordinary,
        }
    }
}

/// Ordered list of substantive steps for one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCatalog {
    steps: Vec<String>,
}

impl StepCatalog {
    /// Resolve the step list declared in a parset.
    ///
    /// Plugin steps are dropped. Loop steps are replaced by their non-plugin
    /// sub-steps. Only one level is expanded: a loop nested inside a loop
    /// stays in the list under its own name.
    pub fn from_parset(parset: &Parset, source: &Path) -> Result<Self> {
        let declared = parset
            .module_value("pipeline", "steps")
            .map(super::parset::parse_vector)
            .ok_or_else(|| CheckError::StepDeclaration {
                path: source.to_path_buf(),
                reason: "no pipeline.steps entry".to_string(),
            })?;

        let mut steps = Vec::new();
        for step in declared {
            match StepKind::of(parset, &step) {
                StepKind::Ordinary => steps.push(step),
                StepKind::Plugin => {}
                StepKind::Loop => {
                    let loopsteps = parset
                        .module_value(&step, "control.loopsteps")
                        .map(super::parset::parse_vector)
                        .ok_or_else(|| CheckError::StepDeclaration {
                            path: source.to_path_buf(),
                            reason: format!("loop step '{}' has no loopsteps", step),
                        })?;
                    for sub in loopsteps {
                        match StepKind::of(parset, &sub) {
                            StepKind::Plugin => {}
                            StepKind::Loop => {
                                log::debug!("Nested loop '{}' inside '{}' is not expanded", sub, step);
                                steps.push(sub);
                            }
                            StepKind::Ordinary => steps.push(sub),
                        }
                    }
                }
            }
        }

        Ok(Self { steps })
    }

    /// Load and resolve an operation's `pipeline.parset`.
    ///
    /// A missing or still-empty parset is a transient condition reported
    /// through the outer `ReadOutcome`. A parset that exists but declares
    /// no steps is a configuration fault.
    pub fn load(path: &Path) -> Result<ReadOutcome<Self>> {
        match Parset::from_file(path) {
            ReadOutcome::Present(parset) if parset.is_empty() => {
                Ok(ReadOutcome::Malformed("empty parset".to_string()))
            }
            ReadOutcome::Present(parset) => Self::from_parset(&parset, path).map(ReadOutcome::Present),
            ReadOutcome::Absent => Ok(ReadOutcome::Absent),
            ReadOutcome::Malformed(reason) => Ok(ReadOutcome::Malformed(reason)),
        }
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, step: &str) -> bool {
        self.steps.iter().any(|s| s == step)
    }

    pub fn position(&self, step: &str) -> Option<usize> {
        self.steps.iter().position(|s| s == step)
    }

    /// Index of the step that follows `previous`, clamped to the last step.
    ///
    /// Inside a loop this points past the loop body even while the loop is
    /// still iterating; the statefile does not record iterations.
    pub fn index_after(&self, previous: &str) -> Option<usize> {
        let idx = self.position(previous)?;
        Some((idx + 1).min(self.steps.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog(text: &str) -> StepCatalog {
        StepCatalog::from_parset(&Parset::parse(text), Path::new("pipeline.parset")).unwrap()
    }

    #[test]
    fn test_loop_expanded_and_plugins_dropped() {
        let catalog = catalog(
            "pipeline.steps = [a, b, loop, e]\n\
             loop.control.kind = loop\n\
             loop.control.loopsteps = [c, d]\n\
             c.control.kind = plugin\n",
        );
        assert_eq!(catalog.steps(), &["a", "b", "d", "e"]);
    }

    #[test]
    fn test_top_level_plugin_dropped() {
        let catalog = catalog(
            "pipeline.steps = [mk_dir, image, mosaic]\n\
             mk_dir.control.kind = plugin\n\
             image.control.kind = recipe\n",
        );
        assert_eq!(catalog.steps(), &["image", "mosaic"]);
    }

    #[test]
    fn test_trailing_comments_do_not_leak_into_steps() {
        let catalog = catalog(
            "pipeline.steps = [mk, a, b] # main steps\n\
             mk.control.kind = plugin # bookkeeping\n",
        );
        assert_eq!(catalog.steps(), &["a", "b"]);
    }

    #[test]
    fn test_nested_loop_not_expanded() {
        let catalog = catalog(
            "pipeline.steps = [outer]\n\
             outer.control.kind = loop\n\
             outer.control.loopsteps = [x, inner]\n\
             inner.control.kind = loop\n\
             inner.control.loopsteps = [y, z]\n",
        );
        assert_eq!(catalog.steps(), &["x", "inner"]);
    }

    #[test]
    fn test_missing_steps_is_declaration_error() {
        let err = StepCatalog::from_parset(&Parset::parse("a.control.kind = plugin\n"), Path::new("p")).unwrap_err();
        assert!(matches!(err, CheckError::StepDeclaration { .. }));
    }

    #[test]
    fn test_loop_without_loopsteps_is_declaration_error() {
        let err = StepCatalog::from_parset(
            &Parset::parse("pipeline.steps = [l]\nl.control.kind = loop\n"),
            Path::new("p"),
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::StepDeclaration { .. }));
    }

    #[test]
    fn test_index_after_clamps() {
        let catalog = catalog("pipeline.steps = [a, b, c]\n");
        assert_eq!(catalog.index_after("a"), Some(1));
        assert_eq!(catalog.index_after("b"), Some(2));
        assert_eq!(catalog.index_after("c"), Some(2));
        assert_eq!(catalog.index_after("zzz"), None);
    }

    #[test]
    fn test_load_missing_is_absent() {
        let temp = TempDir::new().unwrap();
        let outcome = StepCatalog::load(&temp.path().join("pipeline.parset")).unwrap();
        assert_eq!(outcome, ReadOutcome::Absent);
    }

    #[test]
    fn test_load_empty_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.parset");
        fs::write(&path, "").unwrap();
        assert!(matches!(StepCatalog::load(&path).unwrap(), ReadOutcome::Malformed(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.parset");
        fs::write(&path, "pipeline.steps = [prep, solve]\n").unwrap();
        let catalog = StepCatalog::load(&path).unwrap().present().unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("solve"));
    }
}
