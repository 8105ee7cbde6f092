use std::path::PathBuf;

use anyhow::{Context, Result};
use blockwalk::{Loader, aggregate, assign, assign_population_data};
use tracing::info;

use crate::cli::{AssignArgs, Cli};

pub fn run(cli: &Cli, args: &AssignArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./precincts.csv"));

    let target_loader = Loader::new(cli.config(args.target_id.as_deref()));
    let source_loader = Loader::new(cli.config(args.source_id.as_deref()));

    info!(path = %args.target.display(), "loading precincts");
    let precincts = target_loader.load_layer(&args.target)
        .with_context(|| format!("[assign] failed to load precincts from {}", args.target.display()))?;

    info!(path = %args.pop.display(), "loading population blocks");
    let pop = source_loader.load_layer(&args.pop)
        .with_context(|| format!("[assign] failed to load blocks from {}", args.pop.display()))?;

    let pop_columns = args.pop_columns.iter().map(String::as_str).collect::<Vec<_>>();
    let vap_columns = args.vap_columns.iter().map(String::as_str).collect::<Vec<_>>();

    let enriched = match &args.vap {
        Some(vap_path) => {
            info!(path = %vap_path.display(), "loading VAP blocks");
            let vap = source_loader.load_layer(vap_path)
                .with_context(|| format!("[assign] failed to load blocks from {}", vap_path.display()))?;
            assign_population_data(&precincts, &pop, &vap, &pop_columns, &vap_columns)?
        }
        None => {
            let columns = pop_columns.iter().chain(&vap_columns).copied().collect::<Vec<_>>();
            let assignment = assign(&pop, &precincts)?;
            aggregate(&precincts, &pop, &assignment, &columns)?
        }
    };

    info!(path = %out_path.display(), rows = enriched.len(), "writing precinct totals");
    enriched.write_csv(&out_path)?;
    println!("[assign] wrote {} precincts to {}", enriched.len(), out_path.display());

    Ok(())
}
