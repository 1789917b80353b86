use anyhow::Result;

use intern::{GetStr, PackedInterner, TypedInterner};

use crate::{ComponentId, DataId, LabelId, StepId};

type Interner<K> = TypedInterner<K, PackedInterner<u32, u32>>;

/// Stores all the interned strings associated with a component graph.
#[derive(Debug)]
pub struct GraphStrings {
    /// Path-like component ids, e.g. "repos/group/project/steps/align.cwl"
    pub components: Interner<ComponentId>,
    /// Step ids used inside workflows
    pub steps: Interner<StepId>,
    /// Data ids carried on edges, e.g. "align/bam"
    pub data: Interner<DataId>,
    /// Parameter ids, data item names, and declared types
    pub labels: Interner<LabelId>,
}

impl Default for GraphStrings {
    fn default() -> Self {
        Self {
            components: TypedInterner::new(PackedInterner::with_capacity_and_avg_len(64, 48)),
            steps: TypedInterner::new(PackedInterner::with_capacity_and_avg_len(64, 16)),
            data: TypedInterner::new(PackedInterner::with_capacity_and_avg_len(256, 24)),
            labels: TypedInterner::new(PackedInterner::with_capacity_and_avg_len(256, 16)),
        }
    }
}

impl GraphStrings {
    /// Component id as a string, for messages and output files.
    #[inline]
    pub fn component(&self, id: ComponentId) -> Result<&str> {
        self.components.get(id)
    }

    /// Step id as a string.
    #[inline]
    pub fn step(&self, id: StepId) -> Result<&str> {
        self.steps.get(id)
    }

    /// Render a list of component ids, joined with ", ".
    pub fn components_str(&self, ids: &[ComponentId]) -> Result<String> {
        let names = ids
            .iter()
            .map(|id| self.components.get(*id))
            .collect::<Result<Vec<_>>>()?;
        Ok(names.join(", "))
    }

    pub fn log_sizes(&self) {
        self.log_sizes_for("Components", &self.components);
        self.log_sizes_for("Steps", &self.steps);
        self.log_sizes_for("Data ids", &self.data);
        self.log_sizes_for("Labels", &self.labels);
    }

    fn log_sizes_for<T: GetStr>(&self, name: &str, interner: &T) {
        log::debug!(
            "{} {}, str len {}",
            interner.len(),
            name,
            interner.str_len()
        );
    }
}

/// True if `data` names an output of `step`, i.e. it starts with "{step}/".
#[inline]
pub fn has_step_prefix(data: &str, step: &str) -> bool {
    data.len() > step.len() && data.starts_with(step) && data.as_bytes()[step.len()] == b'/'
}
