//! Cog composition and splitting.
//!
//! Both operations validate every input before the first cog is created, then
//! add the new cogs through [`CogSystem::add_cog`] so they cascade like any
//! other addition, optionally attach them to a graph and record one lineage
//! operation.

use super::system::CogSystem;
use crate::models::{
    Bucket, CascadeReport, Cog, CogId, CogScoring, DIRECTIONAL_BIAS, LineageOperation, Metadata,
    OpType,
};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

static WORD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[A-Za-z]+").unwrap_or_else(|_| unreachable!()));

/// Where a composed or split cog lands in a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPlacement {
    /// Target graph.
    pub graph_id: String,
    /// Target bucket.
    pub bucket: Bucket,
}

/// Input of [`CogSystem::compose`].
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    /// Source cogs, at least two.
    pub cog_ids: Vec<CogId>,
    /// Id of the composed cog.
    pub new_cog_id: CogId,
    /// Explicit theme; defaults to the unique source themes joined by ` + `.
    pub theme: Option<String>,
    /// Optional graph attachment.
    pub placement: Option<GraphPlacement>,
    /// Extra lineage metadata.
    pub lineage_meta: Metadata,
}

impl ComposeRequest {
    /// Creates a request.
    #[must_use]
    pub fn new<I, T>(cog_ids: I, new_cog_id: impl Into<CogId>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CogId>,
    {
        Self {
            cog_ids: cog_ids.into_iter().map(Into::into).collect(),
            new_cog_id: new_cog_id.into(),
            ..Self::default()
        }
    }

    /// Sets the theme.
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    /// Attaches the result to a graph bucket.
    #[must_use]
    pub fn with_placement(mut self, graph_id: impl Into<String>, bucket: Bucket) -> Self {
        self.placement = Some(GraphPlacement {
            graph_id: graph_id.into(),
            bucket,
        });
        self
    }

    /// Adds a lineage metadata entry.
    #[must_use]
    pub fn with_lineage_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.lineage_meta.insert(key.to_string(), value.into());
        self
    }
}

/// Result of [`CogSystem::compose`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeOutcome {
    /// The composed cog.
    pub new_cog_id: CogId,
    /// The sources, in request order.
    pub source_cog_ids: Vec<CogId>,
    /// The theme of the composed cog.
    pub theme: String,
    /// Number of merged component ids.
    pub component_count: usize,
    /// Work done by the cascade.
    pub cascade: CascadeReport,
}

/// Tokenization used by [`CogSystem::split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Runs of ASCII letters.
    #[default]
    Words,
    /// Single alphabetic characters.
    Chars,
}

impl SplitMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Chars => "chars",
        }
    }

    /// Parses a mode name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for anything other than
    /// `words` or `chars`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "words" => Ok(Self::Words),
            "chars" => Ok(Self::Chars),
            other => Err(Error::InvalidConfiguration(format!(
                "unsupported split mode '{other}' (expected words or chars)"
            ))),
        }
    }

    /// Splits `text` into tokens.
    #[must_use]
    pub fn tokenize(self, text: &str) -> Vec<String> {
        match self {
            Self::Words => WORD_RUN
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect(),
            Self::Chars => text
                .chars()
                .filter(|c| c.is_alphabetic())
                .map(String::from)
                .collect(),
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SplitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Input of [`CogSystem::split`].
#[derive(Debug, Clone, Default)]
pub struct SplitRequest {
    /// The cog to split.
    pub cog_id: CogId,
    /// Tokenization mode.
    pub mode: SplitMode,
    /// Child id prefix; defaults to `<cog_id>_split`.
    pub prefix: Option<String>,
    /// Keep at most this many tokens.
    pub max_items: Option<usize>,
    /// Optional graph attachment for every child.
    pub placement: Option<GraphPlacement>,
    /// Extra lineage metadata.
    pub lineage_meta: Metadata,
}

impl SplitRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(cog_id: impl Into<CogId>, mode: SplitMode) -> Self {
        Self {
            cog_id: cog_id.into(),
            mode,
            ..Self::default()
        }
    }

    /// Sets the child id prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Caps the number of children.
    #[must_use]
    pub const fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Attaches every child to a graph bucket.
    #[must_use]
    pub fn with_placement(mut self, graph_id: impl Into<String>, bucket: Bucket) -> Self {
        self.placement = Some(GraphPlacement {
            graph_id: graph_id.into(),
            bucket,
        });
        self
    }

    /// Adds a lineage metadata entry.
    #[must_use]
    pub fn with_lineage_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.lineage_meta.insert(key.to_string(), value.into());
        self
    }
}

/// Result of [`CogSystem::split`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitOutcome {
    /// The split cog.
    pub source_cog_id: CogId,
    /// Tokenization used.
    pub mode: SplitMode,
    /// Children in token order.
    pub created_cog_ids: Vec<CogId>,
}

fn unique_in_order<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for item in items {
        if !unique.contains(item) {
            unique.push(item.clone());
        }
    }
    unique
}

impl CogSystem {
    fn check_placement(&self, placement: Option<&GraphPlacement>) -> Result<()> {
        placement.map_or(Ok(()), |p| self.require_graph(&p.graph_id).map(|_| ()))
    }

    /// Merges several cogs into a new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionFailed`] for fewer than two sources,
    /// [`Error::UnknownReference`] for an unknown source or graph and
    /// [`Error::DuplicateId`] when the new id is taken. Nothing changes on
    /// error.
    #[instrument(skip(self, request), fields(new_cog_id = %request.new_cog_id, sources = request.cog_ids.len()))]
    pub fn compose(&mut self, request: &ComposeRequest) -> Result<ComposeOutcome> {
        if request.cog_ids.len() < 2 {
            return Err(Error::PreconditionFailed(
                "composition needs at least two cog ids".to_string(),
            ));
        }
        let sources = request
            .cog_ids
            .iter()
            .map(|id| self.require_cog(id.as_str()))
            .collect::<Result<Vec<&Cog>>>()?;
        if self.cog(request.new_cog_id.as_str()).is_some() {
            return Err(Error::duplicate("cog", request.new_cog_id.as_str()));
        }
        self.check_placement(request.placement.as_ref())?;

        let themes = unique_in_order(sources.iter().map(|c| &c.theme));
        let theme = request.theme.clone().unwrap_or_else(|| themes.join(" + "));
        let contents: Vec<&str> = sources
            .iter()
            .map(|c| c.content.as_str())
            .filter(|content| !content.trim().is_empty())
            .collect();
        let content = if contents.is_empty() {
            themes.join(" ")
        } else {
            contents.join(" ")
        };
        let component_ids = unique_in_order(sources.iter().flat_map(|c| &c.component_ids));
        #[allow(clippy::cast_precision_loss)]
        let bias = sources.iter().map(|c| c.feature(DIRECTIONAL_BIAS)).sum::<f64>() / sources.len() as f64;

        let mut composed = Cog::new(request.new_cog_id.clone(), theme.clone())
            .with_content(content)
            .with_feature(DIRECTIONAL_BIAS, bias);
        composed.component_ids = component_ids;
        composed.scoring = CogScoring {
            feature_techniques: sources[0].scoring.feature_techniques.clone(),
            ..CogScoring::default()
        };

        let component_count = composed.component_ids.len();
        let cascade = self.add_cog(composed)?;
        if let Some(placement) = &request.placement {
            self.attach_to_graph(&placement.graph_id, &request.new_cog_id, placement.bucket)?;
        }

        let mut op = LineageOperation::new(
            OpType::Compose,
            request.cog_ids.iter().map(ToString::to_string).collect(),
            vec![request.new_cog_id.to_string()],
        );
        op.metadata.extend(request.lineage_meta.clone());
        self.lineage.push(op);
        tracing::info!(component_count, "Composed cog");

        Ok(ComposeOutcome {
            new_cog_id: request.new_cog_id.clone(),
            source_cog_ids: request.cog_ids.clone(),
            theme,
            component_count,
            cascade,
        })
    }

    /// Tokenizes a cog's text and creates one child per token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownReference`] for an unknown cog or graph,
    /// [`Error::PreconditionFailed`] when no token is produced and
    /// [`Error::DuplicateId`] when a child id is taken. Nothing changes on
    /// error.
    #[instrument(skip(self, request), fields(cog_id = %request.cog_id, mode = %request.mode))]
    pub fn split(&mut self, request: &SplitRequest) -> Result<SplitOutcome> {
        let source = self.require_cog(request.cog_id.as_str())?;
        let mut tokens = request.mode.tokenize(source.text());
        if let Some(max) = request.max_items {
            tokens.truncate(max);
        }
        if tokens.is_empty() {
            return Err(Error::PreconditionFailed(format!(
                "splitting cog '{}' produced no tokens",
                request.cog_id
            )));
        }
        self.check_placement(request.placement.as_ref())?;

        let prefix = request
            .prefix
            .clone()
            .unwrap_or_else(|| format!("{}_split", request.cog_id));
        let bias = source.feature(DIRECTIONAL_BIAS);
        let children: Vec<Cog> = tokens
            .into_iter()
            .enumerate()
            .map(|(i, token)| {
                let mut child = Cog::new(format!("{prefix}_{}", i + 1), source.theme.clone())
                    .with_content(token)
                    .with_feature(DIRECTIONAL_BIAS, bias);
                child.scoring.feature_techniques = source.scoring.feature_techniques.clone();
                child
            })
            .collect();

        for child in &children {
            if self.cog(child.id.as_str()).is_some() {
                return Err(Error::duplicate("cog", child.id.as_str()));
            }
            self.recompute_features(&mut child.clone())?;
        }

        let mut created = Vec::with_capacity(children.len());
        for child in children {
            let id = child.id.clone();
            self.add_cog(child)?;
            if let Some(placement) = &request.placement {
                self.attach_to_graph(&placement.graph_id, &id, placement.bucket)?;
            }
            created.push(id);
        }

        let mut op = LineageOperation::new(
            OpType::Split,
            vec![request.cog_id.to_string()],
            created.iter().map(ToString::to_string).collect(),
        )
        .with_meta("mode", request.mode.as_str());
        op.metadata.extend(request.lineage_meta.clone());
        self.lineage.push(op);
        tracing::info!(children = created.len(), "Split cog");

        Ok(SplitOutcome {
            source_cog_id: request.cog_id.clone(),
            mode: request.mode,
            created_cog_ids: created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CogGraph;
    use test_case::test_case;

    fn system() -> CogSystem {
        let mut system = CogSystem::new();
        system.register_default_word_feature_techniques();
        system
    }

    #[test_case("invoicing pipeline", SplitMode::Words, &["invoicing", "pipeline"]; "words")]
    #[test_case("a1-b c", SplitMode::Chars, &["a", "b", "c"]; "chars")]
    #[test_case("don't stop", SplitMode::Words, &["don", "t", "stop"]; "apostrophe splits")]
    #[test_case("123 !!", SplitMode::Words, &[]; "no letters")]
    fn test_tokenize(text: &str, mode: SplitMode, expected: &[&str]) {
        assert_eq!(mode.tokenize(text), expected);
    }

    #[test]
    fn test_split_mode_parse() {
        assert_eq!("chars".parse::<SplitMode>().unwrap(), SplitMode::Chars);
        assert!(matches!(
            SplitMode::parse("lines"),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_compose_merges_sources() {
        let mut system = system();
        system
            .add_cog(
                Cog::new("a", "finance")
                    .with_content("ledger")
                    .with_component("c1")
                    .with_feature(DIRECTIONAL_BIAS, 0.2),
            )
            .unwrap();
        system
            .add_cog(
                Cog::new("b", "finance")
                    .with_content("  ")
                    .with_component("c1")
                    .with_component("c2")
                    .with_feature(DIRECTIONAL_BIAS, 0.6),
            )
            .unwrap();
        system.add_cog(Cog::new("c", "ops").with_content("deploy")).unwrap();

        let outcome = system
            .compose(&ComposeRequest::new(["a", "b", "c"], "abc").with_lineage_meta("workspace_id", "w"))
            .unwrap();
        assert_eq!(outcome.theme, "finance + ops");
        assert_eq!(outcome.component_count, 2);

        let cog = system.cog("abc").unwrap();
        assert_eq!(cog.content, "ledger deploy");
        assert_eq!(cog.component_ids, vec!["c1", "c2"]);
        assert!((cog.feature(DIRECTIONAL_BIAS) - 0.8 / 3.0).abs() < 1e-12);

        let op = system.lineage().last().unwrap();
        assert_eq!(op.op_type, OpType::Compose);
        assert_eq!(op.inputs, vec!["a", "b", "c"]);
        assert_eq!(op.outputs, vec!["abc"]);
        assert_eq!(op.metadata["workspace_id"], "w");
    }

    #[test]
    fn test_compose_falls_back_to_themes_for_content() {
        let mut system = system();
        system.add_cog(Cog::new("a", "x")).unwrap();
        system.add_cog(Cog::new("b", "y")).unwrap();
        system
            .compose(&ComposeRequest::new(["a", "b"], "ab").with_theme("custom"))
            .unwrap();
        let cog = system.cog("ab").unwrap();
        assert_eq!(cog.content, "x y");
        assert_eq!(cog.theme, "custom");
    }

    #[test]
    fn test_compose_validates_before_mutating() {
        let mut system = system();
        system.add_cog(Cog::new("a", "x")).unwrap();
        system.add_cog(Cog::new("b", "y")).unwrap();

        assert!(matches!(
            system.compose(&ComposeRequest::new(["a"], "n")),
            Err(Error::PreconditionFailed(_))
        ));
        assert!(matches!(
            system.compose(&ComposeRequest::new(["a", "ghost"], "n")),
            Err(Error::UnknownReference { .. })
        ));
        assert!(matches!(
            system.compose(&ComposeRequest::new(["a", "b"], "a")),
            Err(Error::DuplicateId { .. })
        ));
        assert!(system
            .compose(&ComposeRequest::new(["a", "b"], "n").with_placement("nope", Bucket::Layered))
            .is_err());
        assert!(system.cog("n").is_none());
        assert!(system.lineage().is_empty());
    }

    #[test]
    fn test_split_words_inherits_bias_and_attaches() {
        let mut system = system();
        system
            .add_cog(
                Cog::new("flow", "ops")
                    .with_content("invoicing pipeline")
                    .with_feature(DIRECTIONAL_BIAS, 0.4),
            )
            .unwrap();
        system.add_graph(CogGraph::new("g", "flow")).unwrap();

        let outcome = system
            .split(&SplitRequest::new("flow", SplitMode::Words).with_placement("g", Bucket::Adjacent))
            .unwrap();
        let ids: Vec<&str> = outcome.created_cog_ids.iter().map(CogId::as_str).collect();
        assert_eq!(ids, vec!["flow_split_1", "flow_split_2"]);

        let first = system.cog("flow_split_1").unwrap();
        assert_eq!(first.content, "invoicing");
        assert_eq!(first.theme, "ops");
        assert!((first.feature(DIRECTIONAL_BIAS) - 0.4).abs() < f64::EPSILON);
        assert_eq!(system.cog("flow_split_2").unwrap().content, "pipeline");

        let graph = system.graph("g").unwrap();
        assert_eq!(graph.adjacent_order.len(), 2);
        let op = system.lineage().last().unwrap();
        assert_eq!(op.metadata["mode"], "words");
        assert_eq!(op.outputs, vec!["flow_split_1", "flow_split_2"]);
    }

    #[test]
    fn test_split_chars_uses_theme_when_content_empty() {
        let mut system = system();
        system.add_cog(Cog::new("t", "abc")).unwrap();
        let outcome = system
            .split(&SplitRequest::new("t", SplitMode::Chars).with_prefix("p").with_max_items(2))
            .unwrap();
        let ids: Vec<&str> = outcome.created_cog_ids.iter().map(CogId::as_str).collect();
        assert_eq!(ids, vec!["p_1", "p_2"]);
        assert_eq!(system.cog("p_2").unwrap().content, "b");
    }

    #[test]
    fn test_split_rejects_collisions_and_empty_tokens() {
        let mut system = system();
        system.add_cog(Cog::new("s", "t").with_content("one two")).unwrap();
        system.add_cog(Cog::new("s_split_2", "t")).unwrap();
        assert!(matches!(
            system.split(&SplitRequest::new("s", SplitMode::Words)),
            Err(Error::DuplicateId { .. })
        ));
        assert!(system.cog("s_split_1").is_none());

        system.add_cog(Cog::new("digits", "42").with_content("42")).unwrap();
        assert!(matches!(
            system.split(&SplitRequest::new("digits", SplitMode::Words)),
            Err(Error::PreconditionFailed(_))
        ));
        assert!(matches!(
            system.split(&SplitRequest::new("s", SplitMode::Words).with_max_items(0)),
            Err(Error::PreconditionFailed(_))
        ));
    }
}
