use std::{collections::BTreeSet, sync::Arc};

use anyhow::{Context, Result};
use blockwalk::{CheckpointStore, Loader, Partition};

use crate::cli::{Cli, GraphArgs};

pub fn run(cli: &Cli, args: &GraphArgs) -> Result<()> {
    let config = cli.config(args.id_field.as_deref());
    let graph = Loader::new(config.clone()).load_graph(&args.path)
        .with_context(|| format!("[graph] failed to load graph from {}", args.path.display()))?;
    let graph = Arc::new(graph);

    println!("[graph] {} nodes, {} edges", graph.node_count(), graph.edge_count() / 2);

    if let (Some(parts), Some(name)) = (&args.parts, &args.checkpoint) {
        let partition = Partition::from_attribute(graph.clone(), parts)?;
        let stored = CheckpointStore::from_config(&config).checkpoint_assignment(name, &partition)?;
        let num_parts = stored.values().collect::<BTreeSet<_>>().len();
        println!("[graph] checkpoint {name:?}: {} units in {num_parts} parts", stored.len());
    }

    Ok(())
}
