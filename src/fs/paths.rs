use std::path::{Path, PathBuf};

use super::Fs;

pub const FLOW_PATHS: &str = "flow_paths.json";
pub const COUPLING_MATRIX: &str = "change_impact_analysis.csv";
pub const CUMULATIVE_SCORES: &str = "change_impact_cumulative_scores.json";
pub const FAN_DATA: &str = "fan_data.csv";
pub const MEMBERSHIPS: &str = "memberships.json";

/// Paths of the files written to the output directory.
impl Fs {
    /// $OUTPUT/flow_paths.json
    pub fn flow_paths<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.output_prefix, FLOW_PATHS, buf)
    }

    /// $OUTPUT/change_impact_analysis.csv
    pub fn coupling_matrix<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.output_prefix, COUPLING_MATRIX, buf)
    }

    /// $OUTPUT/change_impact_cumulative_scores.json
    pub fn cumulative_scores<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.output_prefix, CUMULATIVE_SCORES, buf)
    }

    /// $OUTPUT/fan_data.csv
    pub fn fan_data<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.output_prefix, FAN_DATA, buf)
    }

    /// $OUTPUT/memberships.json
    pub fn memberships<'a>(&self, buf: &'a mut PathBuf) -> &'a Path {
        self.parts2(&self.output_prefix, MEMBERSHIPS, buf)
    }

    fn parts2<'a, T, U>(&self, p1: T, p2: U, buf: &'a mut PathBuf) -> &'a Path
    where
        T: AsRef<Path>,
        U: AsRef<Path>,
    {
        buf.clear();
        buf.push(p1);
        buf.push(p2);
        &*buf
    }
}
