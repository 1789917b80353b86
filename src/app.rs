use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use graph::{ComponentId, Errors, GraphAccess, GraphRecords, GraphStore, Retrying};
use traverse::{annotate_memberships, classify_flows, schedule, CancelToken, FlowPaths};

use crate::dump::MembershipDump;
use crate::fs::Fs;
use crate::impact::{CouplingMatrix, CumulativeScores, FanData};
use crate::settings::Settings;
use crate::ui::Ui;

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
    /// Checked between node visits
    cancel: CancelToken,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let fs = Fs::new(&settings.output, settings.dry_run);
        let ui = Ui::new(&settings);
        Self {
            settings,
            fs,
            ui,
            cancel: CancelToken::default(),
        }
    }

    /// Token that stops the run at the next node visit when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Load the graph, walk every workflow, and write the analysis files.
    pub fn run(mut self) -> Result<()> {
        if self.settings.verbose > 0 {
            eprintln!("Using output directory {:?}", self.settings.output);
        }
        self.fs.ensure_output_dir_exists(self.ui.verbose)?;

        let mut errors = Errors::default();
        let store = self.load_graph(&mut errors)?;
        let mut graph = Retrying::new(store, self.settings.retry);

        self.ui.start_timer();
        self.ui.verbose_progress("Scheduling workflows");
        let order = self.included(&graph, schedule(&graph)?)?;
        self.ui.done();
        log::info!("{} workflows scheduled", order.len());

        if self.settings.stages.annotate {
            self.ui.start_timer();
            self.ui.verbose_progress("Annotating memberships");
            annotate_memberships(&mut graph, &order, &self.cancel, &mut errors)?;
            self.ui.done();
            self.ui.print_elapsed("Annotation");
        }

        self.ui.start_timer();
        self.ui.verbose_progress("Classifying flows");
        let paths = classify_flows(&mut graph, &order, &self.cancel, &mut errors)?;
        self.ui.done();
        self.ui.print_elapsed("Classification");

        let store = graph.into_inner();
        self.write_outputs(&store, &paths)?;

        errors.print_recap("analyzing workflows", store.strings())
    }

    fn load_graph(&self, errors: &mut Errors) -> Result<GraphStore> {
        self.ui
            .verbose_progress_debug("Loading graph", &self.settings.graph);
        let mut text = String::with_capacity(0); // resized on read.
        self.fs
            .read_to_buf(&self.settings.graph, &mut text)
            .with_context(|| format!("reading graph file {:?}", self.settings.graph))?;
        let records = GraphRecords::from_json(&text)?;
        let store = records.into_store(&self.settings.load, errors)?;
        self.ui.done();
        Ok(store)
    }

    /// Drop excluded components from `ids`, keeping order.
    fn included<G: GraphAccess>(&self, graph: &G, ids: Vec<ComponentId>) -> Result<Vec<ComponentId>> {
        let mut kept = Vec::with_capacity(ids.len());
        for id in ids {
            let name = graph.strings().component(id)?;
            if self.settings.is_excluded(name) {
                log::debug!("excluding {}", name.cyan());
            } else {
                kept.push(id);
            }
        }
        Ok(kept)
    }

    fn write_outputs(&mut self, store: &GraphStore, paths: &FlowPaths) -> Result<()> {
        let strings = store.strings();
        let mut buf = PathBuf::with_capacity(512);

        let rendered = paths.render(strings)?;
        self.write_json_output(self.fs.flow_paths(&mut buf), &rendered)?;

        if self.settings.stages.impact {
            self.ui.start_timer();
            self.ui.verbose_progress("Computing coupling scores");
            let components = self.included(store, store.component_ids()?)?;
            let matrix = CouplingMatrix::compute(paths, strings, &components, &self.settings.score)?;
            let cumulative = CumulativeScores::compute(&matrix, &self.settings.score);
            log::info!(
                "scored {} components in {} groups",
                matrix.ids().len(),
                cumulative.num_groups()
            );
            let fan = FanData::compute(paths, strings, &components)?;
            self.ui.done();
            self.ui.print_elapsed("Scoring");

            self.write_text_output(self.fs.coupling_matrix(&mut buf), &matrix.to_csv())?;
            self.write_json_output(self.fs.cumulative_scores(&mut buf), &cumulative)?;
            self.write_text_output(self.fs.fan_data(&mut buf), &fan.to_csv())?;
        }

        if self.settings.stages.annotate {
            let dump = MembershipDump::collect(store)?;
            self.write_json_output(self.fs.memberships(&mut buf), &dump)?;
        }
        Ok(())
    }

    fn write_text_output(&self, path: &Path, text: &str) -> Result<()> {
        if self.fs.is_dry_run() {
            self.ui.verbose_msg(&format!("Dry run. Not writing {:?}", path));
            return Ok(());
        }
        log::info!("writing {:?}", path);
        self.fs.write_file(path, text)
    }

    fn write_json_output<V: serde::Serialize>(&self, path: &Path, value: &V) -> Result<()> {
        if self.fs.is_dry_run() {
            self.ui.verbose_msg(&format!("Dry run. Not writing {:?}", path));
            return Ok(());
        }
        log::info!("writing {:?}", path);
        self.fs.write_json(path, value)
    }
}
