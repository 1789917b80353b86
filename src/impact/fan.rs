use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use graph::{ComponentId, GraphStrings};
use traverse::FlowPaths;

use super::csv_field;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Partners {
    fan_in: BTreeSet<String>,
    fan_out: BTreeSet<String>,
}

/// Distinct incoming and outgoing path partners per component.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanData {
    rows: BTreeMap<String, Partners>,
}

impl FanData {
    /// Every component in `components` gets a row, even with no partners.
    pub fn compute(
        paths: &FlowPaths,
        strings: &GraphStrings,
        components: &[ComponentId],
    ) -> Result<Self> {
        let mut rows = BTreeMap::<String, Partners>::new();
        for c in components {
            rows.entry(strings.component(*c)?.to_owned()).or_default();
        }
        for (source, target, entries) in paths.iter() {
            if source == target || entries.is_empty() {
                continue;
            }
            let source = strings.component(source)?;
            let target = strings.component(target)?;
            // only count partners that are both being reported
            if !(rows.contains_key(source) && rows.contains_key(target)) {
                continue;
            }
            if let Some(row) = rows.get_mut(source) {
                row.fan_out.insert(target.to_owned());
            }
            if let Some(row) = rows.get_mut(target) {
                row.fan_in.insert(source.to_owned());
            }
        }
        Ok(Self { rows })
    }

    /// (fan-in, fan-out) for a component.
    #[cfg(test)]
    pub fn get(&self, component: &str) -> Option<(usize, usize)> {
        self.rows
            .get(component)
            .map(|p| (p.fan_in.len(), p.fan_out.len()))
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("component_id,fan-in,fan-out,fan-out set,fan-in * fan-out\n");
        for (id, partners) in &self.rows {
            let fan_in = partners.fan_in.len();
            let fan_out = partners.fan_out.len();
            let set = format!(
                "[{}]",
                partners
                    .fan_out
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(id),
                fan_in,
                fan_out,
                csv_field(&set),
                fan_in * fan_out
            ));
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
    fn test_fan_counts_distinct_partners() -> Result<()> {
        let mut store = GraphStore::default();
        let w = store.add_component("g/p/wf.cwl", ComponentKind::Workflow)?;
        let a = store.add_component("g/p/a.cwl", ComponentKind::Tool)?;
        let b = store.add_component("g/p/b.cwl", ComponentKind::Tool)?;
        let lonely = store.add_component("g/p/lonely.cwl", ComponentKind::Tool)?;

        let entry = |flow, distance| PathEntry {
            context: w,
            flow,
            distance,
        };
        let mut paths = FlowPaths::default();
        paths.add(w, a, entry(FlowType::Direct, 1));
        paths.add(w, b, entry(FlowType::Direct, 1));
        paths.add(a, b, entry(FlowType::Sequential, 1));
        paths.add(a, b, entry(FlowType::Sequential, 1));
        paths.add(a, w, entry(FlowType::Indirect, 1));
        paths.add(b, w, entry(FlowType::Indirect, 1));

        let fan = FanData::compute(&paths, store.strings(), &[w, a, b, lonely])?;
        assert_eq!(Some((1, 2)), fan.get("g/p/a.cwl"));
        assert_eq!(Some((2, 1)), fan.get("g/p/b.cwl"));
        assert_eq!(Some((2, 2)), fan.get("g/p/wf.cwl"));
        assert_eq!(Some((0, 0)), fan.get("g/p/lonely.cwl"));

        let csv = fan.to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(5, lines.len());
        assert_eq!("g/p/a.cwl,1,2,\"[g/p/b.cwl, g/p/wf.cwl]\",2", lines[1]);
        assert_eq!("g/p/lonely.cwl,0,0,[],0", lines[3]);
        Ok(())
    }
}
