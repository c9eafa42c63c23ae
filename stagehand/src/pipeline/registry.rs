//! Registered stages and route search between stage names.

use std::collections::HashSet;
use tracing::debug;

use crate::config::StagehandConfig;
use crate::errors::{Result, StagehandError};
use crate::stages::{CommandStage, Stage};
use crate::utils::ShellRunner;

/// Index of a stage in a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(usize);

impl StageId {
    /// The registration index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stages keyed by registration order.
///
/// Each stage is an edge from its source stage name to its target stage
/// name. Stage names must be unique.
#[derive(Debug, Default)]
pub struct Registry {
    stages: Vec<Box<dyn Stage>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds command stages from `config`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a command is invalid or two stages share a name.
    pub fn from_config(config: &StagehandConfig, shell: ShellRunner) -> Result<Self> {
        let mut registry = Self::new();
        for command in &config.commands {
            registry.register(Box::new(CommandStage::from_config(command, shell)?))?;
        }
        Ok(registry)
    }

    /// Adds a stage.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is already registered.
    pub fn register(&mut self, stage: Box<dyn Stage>) -> Result<StageId> {
        if self.find(stage.name()).is_some() {
            return Err(StagehandError::config(format!(
                "stage `{}' is registered more than once",
                stage.name()
            )));
        }
        debug!(
            stage = %stage.name(),
            src = %stage.src_stage(),
            target = %stage.target_stage(),
            "Registered stage"
        );
        self.stages.push(stage);
        Ok(StageId(self.stages.len() - 1))
    }

    /// Adds a stage, builder style.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is already registered.
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Result<Self> {
        self.register(Box::new(stage))?;
        Ok(self)
    }

    /// Number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stage with `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from another registry.
    #[must_use]
    pub fn get(&self, id: StageId) -> &dyn Stage {
        self.stages[id.0].as_ref()
    }

    /// Looks a stage up by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<StageId> {
        self.stages.iter().position(|s| s.name() == name).map(StageId)
    }

    /// Iterates stages in registration order.
    pub fn stages(&self) -> impl Iterator<Item = &dyn Stage> {
        self.stages.iter().map(|s| &**s as &dyn Stage)
    }

    /// Every source and target stage name, in order of first mention.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for stage in &self.stages {
            for name in [stage.src_stage(), stage.target_stage()] {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Returns true if `name` is the source or target of some stage.
    #[must_use]
    pub fn knows_stage(&self, name: &str) -> bool {
        self.stages
            .iter()
            .any(|s| s.src_stage() == name || s.target_stage() == name)
    }

    /// Finds the shortest route from `source` to `target`.
    ///
    /// Only routes that mention every `through` name, either as a stage name
    /// or as a stage name they pass through, are considered. Ties go to the
    /// route found first when stages are explored in registration order.
    /// Returns `Some(vec![])` when `source == target` and `through` is empty.
    #[must_use]
    pub fn make_path(&self, source: &str, target: &str, through: &[String]) -> Option<Vec<StageId>> {
        if source == target && through.is_empty() {
            return Some(Vec::new());
        }

        let mut found: Vec<Vec<StageId>> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([source]);
        let mut current: Vec<StageId> = Vec::new();
        self.walk(source, target, &mut visited, &mut current, &mut found);

        found
            .into_iter()
            .filter(|path| self.covers(path, through))
            .reduce(|best, path| if path.len() < best.len() { path } else { best })
    }

    fn walk<'a>(
        &'a self,
        node: &str,
        target: &str,
        visited: &mut HashSet<&'a str>,
        current: &mut Vec<StageId>,
        found: &mut Vec<Vec<StageId>>,
    ) {
        for (index, stage) in self.stages.iter().enumerate() {
            if stage.src_stage() != node {
                continue;
            }
            let next = stage.target_stage();
            current.push(StageId(index));
            if next == target {
                found.push(current.clone());
            } else if visited.insert(next) {
                self.walk(next, target, visited, current, found);
                visited.remove(next);
            }
            current.pop();
        }
    }

    fn covers(&self, path: &[StageId], through: &[String]) -> bool {
        through.iter().all(|wanted| {
            path.iter().any(|id| {
                let stage = self.get(*id);
                stage.name() == wanted
                    || stage.src_stage() == wanted
                    || stage.target_stage() == wanted
            })
        })
    }

    /// Removes the stages named by `ids` and returns them in that order.
    ///
    /// # Panics
    ///
    /// Panics if an id repeats or came from another registry.
    #[must_use]
    pub fn into_stages(self, ids: &[StageId]) -> Vec<Box<dyn Stage>> {
        let mut slots: Vec<Option<Box<dyn Stage>>> = self.stages.into_iter().map(Some).collect();
        ids.iter()
            .map(|id| {
                slots[id.0]
                    .take()
                    .unwrap_or_else(|| panic!("stage {} taken twice", id.0))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chain_registry, MockStage};
    use pretty_assertions::assert_eq;

    fn names(registry: &Registry, path: &[StageId]) -> Vec<String> {
        path.iter().map(|id| registry.get(*id).name().to_string()).collect()
    }

    fn diamond() -> Registry {
        Registry::new()
            .with_stage(MockStage::new("a-long1", "a", "m")).unwrap()
            .with_stage(MockStage::new("m-long2", "m", "n")).unwrap()
            .with_stage(MockStage::new("n-long3", "n", "z")).unwrap()
            .with_stage(MockStage::new("a-short", "a", "z")).unwrap()
            .with_stage(MockStage::new("a-alt", "a", "k")).unwrap()
            .with_stage(MockStage::new("k-alt", "k", "z")).unwrap()
    }

    #[test]
    fn test_chain_path() {
        let registry = chain_registry(&["a", "b", "c", "d"]);
        let path = registry.make_path("a", "d", &[]).unwrap();
        assert_eq!(names(&registry, &path), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_shortest_path_wins() {
        let registry = diamond();
        let path = registry.make_path("a", "z", &[]).unwrap();
        assert_eq!(names(&registry, &path), vec!["a-short"]);
    }

    #[test]
    fn test_through_forces_route() {
        let registry = diamond();

        let path = registry.make_path("a", "z", &["k".to_string()]).unwrap();
        assert_eq!(names(&registry, &path), vec!["a-alt", "k-alt"]);

        let path = registry.make_path("a", "z", &["m-long2".to_string()]).unwrap();
        assert_eq!(names(&registry, &path), vec!["a-long1", "m-long2", "n-long3"]);
    }

    #[test]
    fn test_ties_go_to_first_registered() {
        let registry = Registry::new()
            .with_stage(MockStage::new("first", "a", "b")).unwrap()
            .with_stage(MockStage::new("second", "a", "b")).unwrap();

        let path = registry.make_path("a", "b", &[]).unwrap();
        assert_eq!(names(&registry, &path), vec!["first"]);
    }

    #[test]
    fn test_no_route() {
        let registry = chain_registry(&["a", "b", "c"]);
        assert!(registry.make_path("c", "a", &[]).is_none());
        assert!(registry.make_path("a", "c", &["x".to_string()]).is_none());
    }

    #[test]
    fn test_same_source_and_target_is_empty() {
        let registry = chain_registry(&["a", "b"]);
        assert_eq!(registry.make_path("a", "a", &[]), Some(Vec::new()));
    }

    #[test]
    fn test_cycles_terminate() {
        let registry = Registry::new()
            .with_stage(MockStage::new("ab", "a", "b")).unwrap()
            .with_stage(MockStage::new("ba", "b", "a")).unwrap()
            .with_stage(MockStage::new("bc", "b", "c")).unwrap();

        let path = registry.make_path("a", "c", &[]).unwrap();
        assert_eq!(names(&registry, &path), vec!["ab", "bc"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = Registry::new()
            .with_stage(MockStage::new("x", "a", "b")).unwrap()
            .with_stage(MockStage::new("x", "b", "c"))
            .unwrap_err();
        assert!(matches!(err, StagehandError::Config(_)));
    }

    #[test]
    fn test_stage_names_in_first_mention_order() {
        let registry = diamond();
        assert_eq!(registry.stage_names(), vec!["a", "m", "n", "z", "k"]);
        assert!(registry.knows_stage("k"));
        assert!(!registry.knows_stage("q"));
    }

    #[test]
    fn test_into_stages_preserves_requested_order() {
        let registry = chain_registry(&["a", "b", "c"]);
        let ids = registry.make_path("a", "c", &[]).unwrap();
        let stages = registry.into_stages(&ids);

        let taken: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        assert_eq!(taken, vec!["a", "b"]);
    }

    #[test]
    fn test_from_config_builds_command_stages() {
        let config = StagehandConfig::from_toml_str(
            "[[commands]]\nsrc = \"a\"\ntarget = \"b\"\n\n[[commands.steps]]\nname = \"s\"\ncmd = \"cat\"\n",
        )
        .unwrap();

        let registry = Registry::from_config(&config, ShellRunner::default()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find("a"), Some(StageId(0)));
    }
}
