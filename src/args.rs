use clap::Parser;

const CMD_NAME: &str = "nf";
const DEFAULT_GRAPH: &str = "graph.json";
const DEFAULT_OUTPUT: &str = "output";

/// Stores our command-line args format.
#[derive(Parser)]
#[command(name = CMD_NAME, version, about = None, long_about = None)]
pub struct Args {
    /// Component graph records (JSON)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_GRAPH)]
    #[arg(env = "NESTFLOW_GRAPH")]
    pub graph: String,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    #[arg(env = "NESTFLOW_OUTPUT")]
    pub output: String,

    /// Distance penalty exponent used in coupling scores
    #[arg(short, long, value_name = "P", default_value_t = 1.0)]
    pub penalty: f64,

    /// Number of leading id segments that make up a component's group
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub group_depth: usize,

    /// Separator between component id segments
    #[arg(long, value_name = "SEP", default_value = "/")]
    pub separator: String,

    /// Local-folder prefix to strip from component ids
    #[arg(long, value_name = "PREFIX")]
    pub strip_prefix: Option<String>,

    /// Skip components whose id contains this string (repeatable)
    #[arg(short = 'x', long, value_name = "STR")]
    pub exclude: Vec<String>,

    /// Attempts per graph request before giving up
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub retries: u32,

    /// Base delay between retries, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub retry_delay_ms: u64,

    /// How the retry delay grows: fixed, linear or exponential
    #[arg(long, value_name = "KIND", default_value = "exponential")]
    pub backoff: String,

    /// Don't annotate workflow memberships
    #[arg(long)]
    pub no_annotate: bool,

    /// Don't compute coupling scores
    #[arg(long)]
    pub no_impact: bool,

    /// Print additional debugging info (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Dry run; analyze the graph but don't write anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}
