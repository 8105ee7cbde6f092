use std::path::PathBuf;

use blockwalk::{Config, DEFAULT_CHECKPOINT_DIR};

/// Census block to precinct assignment CLI
#[derive(clap::Parser, Debug)]
#[command(name = "blockwalk", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for named checkpoints
    #[arg(long, env = "BLOCKWALK_CHECKPOINT_DIR", default_value = DEFAULT_CHECKPOINT_DIR, global = true,
          value_hint = clap::ValueHint::DirPath)]
    pub checkpoint_dir: PathBuf,

    /// Neither read nor write cache artifacts next to source files
    #[arg(long, env = "BLOCKWALK_NO_CACHE", global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Loader/checkpoint settings, with `id_field` naming the DBF identifier field.
    pub fn config(&self, id_field: Option<&str>) -> Config {
        let config = Config::default()
            .with_checkpoint_dir(self.checkpoint_dir.clone())
            .with_cache(!self.no_cache);
        match id_field {
            Some(field) => config.with_id_field(field),
            None => config,
        }
    }

    /// Default log filter for the verbosity count.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Sum block attributes into the precincts that contain them
    Assign(AssignArgs),

    /// Build (or load) the rook dual graph of a shapefile
    Graph(GraphArgs),
}

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// Precinct shapefile
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub target: PathBuf,

    /// Block shapefile holding population attributes
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub pop: PathBuf,

    /// Block shapefile holding voting-age population attributes (defaults to --pop)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub vap: Option<PathBuf>,

    /// Attributes summed from the population layer
    #[arg(long, value_delimiter = ',', required = true)]
    pub pop_columns: Vec<String>,

    /// Attributes summed from the VAP layer
    #[arg(long, value_delimiter = ',')]
    pub vap_columns: Vec<String>,

    /// DBF field holding precinct identifiers (row index if unset)
    #[arg(long, env = "BLOCKWALK_TARGET_ID")]
    pub target_id: Option<String>,

    /// DBF field holding block identifiers (row index if unset)
    #[arg(long, env = "BLOCKWALK_SOURCE_ID")]
    pub source_id: Option<String>,

    /// Output CSV file, defaults to "./precincts.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct GraphArgs {
    /// Shapefile to build the graph over
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub path: PathBuf,

    /// DBF field holding unit identifiers (row index if unset)
    #[arg(long, env = "BLOCKWALK_ID_FIELD")]
    pub id_field: Option<String>,

    /// Integer node attribute giving each unit's part (district)
    #[arg(long, requires = "checkpoint")]
    pub parts: Option<String>,

    /// Checkpoint the unit-to-part assignment under this name
    #[arg(long, requires = "parts")]
    pub checkpoint: Option<String>,
}
