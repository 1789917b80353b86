use std::collections::BTreeMap;

use serde::Serialize;

use super::{CouplingMatrix, NO_RELATIONSHIP};
use crate::settings::ScoreSettings;

/// `scores[group][component]`: sum of the component's scored matrix column.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CumulativeScores {
    scores: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CumulativeScores {
    pub fn compute(matrix: &CouplingMatrix, settings: &ScoreSettings) -> Self {
        let mut scores: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        let ids = matrix.ids();
        for (j, id) in ids.iter().enumerate() {
            let Some(group) = settings.group(id) else {
                log::debug!("{id} has no group, leaving it out of cumulative scores");
                continue;
            };
            let total = (0..ids.len())
                .map(|i| matrix.get(i, j))
                .filter(|score| *score != NO_RELATIONSHIP)
                .sum();
            scores
                .entry(group.to_owned())
                .or_default()
                .insert(id.clone(), total);
        }
        Self { scores }
    }

    #[cfg(test)]
    pub fn get(&self, group: &str, component: &str) -> Option<f64> {
        self.scores.get(group)?.get(component).copied()
    }

    pub fn num_groups(&self) -> usize {
        self.scores.len()
    }
}
