//! Simulation parameters.
//!
//! The configuration is a flat JSON document; keys and value spellings match
//! the ones the GUI writes (`"Min ID"`, `"No Root"`, ...). Missing keys take
//! the documented defaults, unknown keys or values are rejected as
//! [`ErrorKind::InvalidConfiguration`].

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};

/// The shape of the neighbor relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    Line,
    Clique,
    Random,
    Tree,
    Star,
}

/// How node identifiers are assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdType {
    Sequential,
    Random,
}

/// How the distinguished root is selected, if at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootMode {
    #[serde(rename = "No Root")]
    NoRoot,
    Random,
    #[serde(rename = "Min ID")]
    MinId,
}

/// Per-hop delay model used by the communication facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayMode {
    /// Every hop takes one time unit.
    Constant,
    /// Every hop draws a delay uniformly from `[0, 1)`.
    Random,
}

/// Whether change-log recording for a graphical observer is enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    Text,
    Graph,
}

/// Verbosity of the engine trace stream. Levels are cumulative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogDetail {
    /// Start and end banners only.
    Short,
    /// Additionally a summary line per `init` invocation.
    Medium,
    /// Additionally a line per delivered message.
    Long,
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Line
    }
}

impl Default for IdType {
    fn default() -> Self {
        IdType::Sequential
    }
}

impl Default for RootMode {
    fn default() -> Self {
        RootMode::Random
    }
}

impl Default for DelayMode {
    fn default() -> Self {
        DelayMode::Random
    }
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Text
    }
}

impl Default for LogDetail {
    fn default() -> Self {
        LogDetail::Short
    }
}

/// Validated simulation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Node count. Must be positive.
    #[serde(rename = "N", alias = "Number of Computers", default = "default_node_count")]
    pub node_count: u32,
    #[serde(rename = "Topology", default)]
    pub topology: Topology,
    #[serde(rename = "ID Type", default)]
    pub id_type: IdType,
    #[serde(rename = "Root", default)]
    pub root: RootMode,
    #[serde(rename = "Delay", default)]
    pub delay: DelayMode,
    #[serde(rename = "Display", default)]
    pub display: DisplayMode,
    #[serde(rename = "Logging", default)]
    pub logging: LogDetail,
    /// Tree height bound. Defaults to `⌊log₂ N⌋ + 1` when absent.
    #[serde(rename = "Max Depth", default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    /// Source path for the algorithm loader.
    #[serde(rename = "Algorithm", default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

fn default_node_count() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_count: default_node_count(),
            topology: Topology::default(),
            id_type: IdType::default(),
            root: RootMode::default(),
            delay: DelayMode::default(),
            display: DisplayMode::default(),
            logging: LogDetail::default(),
            max_depth: None,
            algorithm: None,
        }
    }
}

impl Config {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(text)
            .map_err(|err| ErrorKind::InvalidConfiguration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.node_count == 0 {
            return Err(ErrorKind::InvalidConfiguration("N must be positive".into()).into());
        }
        if self.max_depth == Some(0) {
            return Err(
                ErrorKind::InvalidConfiguration("Max Depth must be at least 1".into()).into(),
            );
        }
        if self.root == RootMode::NoRoot
            && matches!(self.topology, Topology::Tree | Topology::Star)
        {
            return Err(ErrorKind::InvalidConfiguration(format!(
                "{:?} topology requires a designated root",
                self.topology
            ))
            .into());
        }
        Ok(())
    }

    /// The effective tree height bound.
    pub fn max_depth(&self) -> usize {
        match self.max_depth {
            Some(depth) => depth as usize,
            None => (f64::from(self.node_count)).log2().floor() as usize + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn empty_document_takes_defaults() {
        let config = Config::from_json("{}").expect("defaults must parse");
        assert_eq!(config.node_count, 10);
        assert_eq!(config.topology, Topology::Line);
        assert_eq!(config.id_type, IdType::Sequential);
        assert_eq!(config.root, RootMode::Random);
        assert_eq!(config.delay, DelayMode::Random);
        assert_eq!(config.display, DisplayMode::Text);
        assert_eq!(config.logging, LogDetail::Short);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.algorithm, None);
    }

    #[test]
    fn full_document_parses() {
        let text = r#"{
            "N": 6,
            "Topology": "Star",
            "ID Type": "Random",
            "Root": "Min ID",
            "Delay": "Constant",
            "Display": "Graph",
            "Logging": "Long",
            "Max Depth": 3,
            "Algorithm": "algorithms/bfs.rs"
        }"#;
        let config = Config::from_json(text).expect("document must parse");
        assert_eq!(config.node_count, 6);
        assert_eq!(config.topology, Topology::Star);
        assert_eq!(config.id_type, IdType::Random);
        assert_eq!(config.root, RootMode::MinId);
        assert_eq!(config.delay, DelayMode::Constant);
        assert_eq!(config.display, DisplayMode::Graph);
        assert_eq!(config.logging, LogDetail::Long);
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.algorithm.as_deref(), Some("algorithms/bfs.rs"));
    }

    #[test]
    fn long_key_alias_is_accepted() {
        let config = Config::from_json(r#"{"Number of Computers": 4}"#).unwrap();
        assert_eq!(config.node_count, 4);
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let err = Config::from_json(r#"{"Topology": "Ring"}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidConfiguration(_)));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = Config::from_json(r#"{"Colour": "red"}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_nodes_is_rejected() {
        let err = Config::from_json(r#"{"N": 0}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidConfiguration(_)));
    }

    #[test]
    fn rooted_topologies_reject_no_root() {
        for topology in ["Tree", "Star"] {
            let text = format!(r#"{{"Topology": {:?}, "Root": "No Root"}}"#, topology);
            let err = Config::from_json(&text).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn default_tree_depth_is_log2_plus_one() {
        let mut config = Config::default();
        config.node_count = 10;
        assert_eq!(config.max_depth(), 4);
        config.node_count = 1;
        assert_eq!(config.max_depth(), 1);
        config.max_depth = Some(7);
        assert_eq!(config.max_depth(), 7);
    }

    #[test]
    fn logging_levels_are_ordered() {
        assert!(LogDetail::Short < LogDetail::Medium);
        assert!(LogDetail::Medium < LogDetail::Long);
    }
}
