use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use graph::{Backoff, LoadOptions, RetryPolicy};

use crate::args::Args;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Graph file \"{0}\" does not exist")]
    GraphNotFound(String),
    #[error("Penalty exponent must be a finite, non-negative number (got {0})")]
    InvalidPenalty(f64),
    #[error("Group depth must be at least 1")]
    InvalidGroupDepth,
    #[error("Id separator must not be empty")]
    EmptySeparator,
}

/// Which parts of the analysis to run.
#[derive(Debug, Clone, Copy)]
pub struct Stages {
    pub annotate: bool,
    pub impact: bool,
}

/// How components are grouped and scored.
#[derive(Debug, Clone)]
pub struct ScoreSettings {
    pub penalty: f64,
    pub group_depth: usize,
    pub separator: String,
}

impl ScoreSettings {
    /// The first `group_depth` segments of `id`, or None if it has fewer.
    pub fn group<'a>(&self, id: &'a str) -> Option<&'a str> {
        let sep = self.separator.as_str();
        match id.match_indices(sep).nth(self.group_depth.saturating_sub(1)) {
            Some((pos, _)) => Some(&id[..pos]),
            None if id.split(sep).count() == self.group_depth => Some(id),
            None => None,
        }
    }
}

/// Settings are like Args, except all the logic has
/// been applied so e.g. defaults are added in.
#[derive(Debug)]
pub struct Settings {
    pub graph: PathBuf,
    pub output: PathBuf,
    pub verbose: u8,
    pub dry_run: bool,
    pub stages: Stages,
    pub score: ScoreSettings,
    pub load: LoadOptions,
    pub exclude: Vec<String>,
    pub retry: RetryPolicy,
}

impl Settings {
    /// True if `id` should be left out of scheduling and scoring.
    pub fn is_excluded(&self, id: &str) -> bool {
        self.exclude.iter().any(|x| id.contains(x.as_str()))
    }
}

impl TryFrom<Args> for Settings {
    type Error = anyhow::Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let mut graph = PathBuf::from(&args.graph);
        if graph.exists() {
            graph = graph.canonicalize()?;
        } else {
            return Err(Error::GraphNotFound(args.graph).into());
        }

        if !args.penalty.is_finite() || args.penalty < 0.0 {
            return Err(Error::InvalidPenalty(args.penalty).into());
        }
        if args.group_depth == 0 {
            return Err(Error::InvalidGroupDepth.into());
        }
        if args.separator.is_empty() {
            return Err(Error::EmptySeparator.into());
        }

        let retry = RetryPolicy {
            max_attempts: args.retries.max(1),
            base_delay: Duration::from_millis(args.retry_delay_ms),
            backoff: args.backoff.parse::<Backoff>()?,
        };

        Ok(Self {
            graph,
            output: PathBuf::from(&args.output),
            verbose: args.verbose,
            dry_run: args.dry_run,
            stages: Stages {
                annotate: !args.no_annotate,
                impact: !args.no_impact,
            },
            score: ScoreSettings {
                penalty: args.penalty,
                group_depth: args.group_depth,
                separator: args.separator,
            },
            load: LoadOptions {
                strip_prefix: args.strip_prefix,
            },
            exclude: args.exclude,
            retry,
        })
    }
}
