use anyhow::Result;

use graph::{ComponentId, GraphStrings};
use traverse::FlowPaths;
use util::HashMap;

use crate::settings::ScoreSettings;

/// Marks pairs that have no relationship, as opposed to a score of zero.
pub const NO_RELATIONSHIP: f64 = -1.0;

/// `Σ count[l] / l^p` over all distances `l > 0`; None if there are no distances at all.
pub fn coupling_score<I: IntoIterator<Item = u32>>(distances: I, penalty: f64) -> Option<f64> {
    let mut counts: HashMap<u32, u32> = HashMap::default();
    for d in distances {
        *counts.entry(d).or_default() += 1;
    }
    if counts.is_empty() {
        return None;
    }
    Some(
        counts
            .into_iter()
            .filter(|(l, _)| *l > 0)
            .map(|(l, n)| n as f64 / (l as f64).powf(penalty))
            .sum(),
    )
}

/// Symmetric matrix of coupling scores, indexed by sorted component id.
#[derive(Debug, Clone)]
pub struct CouplingMatrix {
    ids: Vec<String>,
    scores: Vec<f64>,
}

impl CouplingMatrix {
    /// Score every pair of `components` that falls in the same group.
    pub fn compute(
        paths: &FlowPaths,
        strings: &GraphStrings,
        components: &[ComponentId],
        settings: &ScoreSettings,
    ) -> Result<Self> {
        let mut named = components
            .iter()
            .map(|c| Ok((strings.component(*c)?, *c)))
            .collect::<Result<Vec<_>>>()?;
        named.sort_unstable();

        let n = named.len();
        let mut scores = vec![NO_RELATIONSHIP; n * n];
        for i in 0..n {
            let (name_a, a) = named[i];
            let Some(group) = settings.group(name_a) else {
                continue;
            };
            for j in (i + 1)..n {
                let (name_b, b) = named[j];
                if settings.group(name_b) != Some(group) {
                    continue;
                }
                let distances = paths
                    .get(a, b)
                    .iter()
                    .chain(paths.get(b, a))
                    .map(|e| e.distance);
                if let Some(score) = coupling_score(distances, settings.penalty) {
                    scores[i * n + j] = score;
                    scores[j * n + i] = score;
                }
            }
        }

        Ok(Self {
            ids: named.into_iter().map(|(name, _)| name.to_owned()).collect(),
            scores,
        })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.scores[i * self.ids.len() + j]
    }

    /// Score between two components by id, if both are in the matrix.
    #[cfg(test)]
    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.ids.binary_search_by(|id| id.as_str().cmp(a)).ok()?;
        let j = self.ids.binary_search_by(|id| id.as_str().cmp(b)).ok()?;
        Some(self.get(i, j))
    }

    /// Header row of ids, then one row per id.
    pub fn to_csv(&self) -> String {
        let n = self.ids.len();
        let mut out = String::with_capacity((n + 1) * (n + 1) * 8);
        for id in &self.ids {
            out.push(',');
            out.push_str(&super::csv_field(id));
        }
        out.push('\n');
        for (i, id) in self.ids.iter().enumerate() {
            out.push_str(&super::csv_field(id));
            for j in 0..n {
                out.push(',');
                out.push_str(&format!("{:?}", self.get(i, j)));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use graph::{ComponentKind, GraphAccess, GraphStore};
    use traverse::{FlowType, PathEntry};

    #[test]
    fn test_score_bounds() {
        // one path at distance 1 and one at distance 2:
        let score = coupling_score([1, 2], 1.0).unwrap();
        assert!(score > 0.5 && score < 1.5);
        assert_eq!(1.5, score);
        assert_eq!(Some(2.0), coupling_score([1, 1], 1.0));
        assert_eq!(Some(1.25), coupling_score([1, 2], 2.0));
        assert_eq!(None, coupling_score([], 1.0));
    }

    fn entry(context: ComponentId, flow: FlowType, distance: u32) -> PathEntry {
        PathEntry {
            context,
            flow,
            distance,
        }
    }

    #[test]
    fn test_matrix_is_symmetric() -> Result<()> {
        let mut store = GraphStore::default();
        let w = store.add_component("g/p/wf.cwl", ComponentKind::Workflow)?;
        let a = store.add_component("g/p/a.cwl", ComponentKind::Tool)?;
        let b = store.add_component("g/p/b.cwl", ComponentKind::Tool)?;
        let c = store.add_component("g/p/c.cwl", ComponentKind::Tool)?;
        let x = store.add_component("h/q/x.cwl", ComponentKind::Tool)?;

        let mut paths = FlowPaths::default();
        paths.add(a, b, entry(w, FlowType::Sequential, 1));
        paths.add(b, a, entry(w, FlowType::Transitive, 2));
        paths.add(w, a, entry(w, FlowType::Direct, 1));
        paths.add(a, x, entry(w, FlowType::Sequential, 1));

        let settings = ScoreSettings {
            penalty: 1.0,
            group_depth: 2,
            separator: "/".to_owned(),
        };
        let m = CouplingMatrix::compute(&paths, store.strings(), &[w, a, b, c, x], &settings)?;
        assert_eq!(
            &["g/p/a.cwl", "g/p/b.cwl", "g/p/c.cwl", "g/p/wf.cwl", "h/q/x.cwl"],
            m.ids()
        );
        for i in 0..m.ids().len() {
            for j in 0..m.ids().len() {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        assert_eq!(Some(1.5), m.score("g/p/a.cwl", "g/p/b.cwl"));
        assert_eq!(Some(1.0), m.score("g/p/wf.cwl", "g/p/a.cwl"));
        // no paths, and different groups:
        assert_eq!(Some(NO_RELATIONSHIP), m.score("g/p/a.cwl", "g/p/c.cwl"));
        assert_eq!(Some(NO_RELATIONSHIP), m.score("g/p/a.cwl", "h/q/x.cwl"));
        assert_eq!(Some(NO_RELATIONSHIP), m.score("g/p/a.cwl", "g/p/a.cwl"));

        let csv = m.to_csv();
        let mut lines = csv.lines();
        assert_eq!(
            Some(",g/p/a.cwl,g/p/b.cwl,g/p/c.cwl,g/p/wf.cwl,h/q/x.cwl"),
            lines.next()
        );
        assert_eq!(Some("g/p/a.cwl,-1.0,1.5,-1.0,1.0,-1.0"), lines.next());
        Ok(())
    }
}
