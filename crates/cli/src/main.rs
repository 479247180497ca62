use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use pedigree_kinship_core::genetics::{
    GraphProvider, IndividualRef, Pedigree, RelationshipCalculator,
};
use pedigree_kinship_core::kinship::{KinshipEngine, KinshipResult, LineagePath};
use pedigree_kinship_core::topology::{Topology, TopologyBuilder};
use pedigree_kinship_core::types::{format_exact, to_f64};

#[derive(Parser)]
#[command(name = "kinship")]
#[command(version)]
#[command(about = "Kinship coefficients and common ancestors for genealogical pedigrees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the generation levels of every individual of a pedigree
    Topology {
        /// Path to pedigree CSV (columns: id, father, mother[, provisional])
        #[arg(short, long)]
        pedigree: String,

        /// Tree name of the pedigree
        #[arg(long, default_value = "tree")]
        tree: String,

        /// Write the topology as JSON to this file instead of a summary
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compute the kinship coefficient of two individuals
    Kinship {
        /// Path to pedigree CSV (columns: id, father, mother[, provisional])
        #[arg(short, long)]
        pedigree: String,

        /// Tree name of the pedigree
        #[arg(long, default_value = "tree")]
        tree: String,

        /// First individual ID
        #[arg(long)]
        first: String,

        /// Second individual ID
        #[arg(long)]
        second: String,

        /// Tree of the second individual, when different from --tree
        #[arg(long)]
        second_tree: Option<String>,

        /// List common ancestors and lineage paths
        #[arg(long)]
        paths: bool,

        /// Reuse a topology JSON written by the `topology` command
        #[arg(long)]
        topology: Option<String>,

        /// Output format: "text" (default) or "json"
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print the additive relationship matrix of selected individuals
    Matrix {
        /// Path to pedigree CSV (columns: id, father, mother[, provisional])
        #[arg(short, long)]
        pedigree: String,

        /// Tree name of the pedigree
        #[arg(long, default_value = "tree")]
        tree: String,

        /// Individual IDs (comma separated or repeated)
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Topology {
            pedigree,
            tree,
            output,
        } => cmd_topology(&pedigree, &tree, output.as_deref()),
        Commands::Kinship {
            pedigree,
            tree,
            first,
            second,
            second_tree,
            paths,
            topology,
            format,
        } => cmd_kinship(
            &pedigree,
            &tree,
            &first,
            &second,
            second_tree.as_deref(),
            paths,
            topology.as_deref(),
            &format,
        ),
        Commands::Matrix {
            pedigree,
            tree,
            ids,
        } => cmd_matrix(&pedigree, &tree, &ids),
    }
}

fn load_pedigree(path: &str, tree: &str) -> Result<Pedigree> {
    let ped = Pedigree::from_csv(tree, path)
        .with_context(|| format!("Failed to load pedigree from '{}'", path))?;
    ped.validate().context("Invalid pedigree")?;
    eprintln!(
        "Loaded pedigree with {} individuals from '{}'",
        ped.n_individuals(),
        path
    );
    Ok(ped)
}

fn build_topology(ped: &Pedigree) -> Result<Topology> {
    TopologyBuilder::new(ped)
        .build()
        .context("Failed to build topology")
}

fn load_topology(path: &str) -> Result<Topology> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology from '{}'", path))?;
    let topology: Topology = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse topology in '{}'", path))?;
    info!("reusing topology of tree '{}' from '{}'", topology.tree(), path);
    Ok(topology)
}

fn cmd_topology(pedigree_path: &str, tree: &str, output: Option<&str>) -> Result<()> {
    let ped = load_pedigree(pedigree_path, tree)?;
    let topology = build_topology(&ped)?;

    if let Some(out) = output {
        let json = serde_json::to_string_pretty(&topology)?;
        std::fs::write(Path::new(out), json)
            .with_context(|| format!("Failed to write topology to '{}'", out))?;
        eprintln!("Wrote topology of {} individuals to '{}'", topology.len(), out);
        return Ok(());
    }

    println!("Tree: {}", topology.tree());
    println!("Leveled individuals: {}", topology.len());
    println!(
        "Excluded (provisional): {}",
        ped.n_individuals() - topology.len()
    );
    if let Some(max) = topology.max_order() {
        println!("\nIndividuals per order:");
        for order in 0..=max {
            println!("  {:>3}: {}", order, topology.individuals_at(order).len());
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_kinship(
    pedigree_path: &str,
    tree: &str,
    first: &str,
    second: &str,
    second_tree: Option<&str>,
    paths: bool,
    topology_path: Option<&str>,
    output_format: &str,
) -> Result<()> {
    let ped = load_pedigree(pedigree_path, tree)?;
    let topology = match topology_path {
        Some(path) => load_topology(path)?,
        None => build_topology(&ped)?,
    };

    let first = ped.individual(first);
    let second = IndividualRef::new(second_tree.unwrap_or(tree), second);

    let result = KinshipEngine::new(&ped, &topology)
        .compute(&first, &second, paths)
        .with_context(|| format!("Failed to compute kinship of {} and {}", first, second))?;

    match output_format.to_lowercase().as_str() {
        "json" => print_json(&result)?,
        _ => print!("{}", result.summary()),
    }

    Ok(())
}

fn print_json(result: &KinshipResult) -> Result<()> {
    let mut map = serde_json::Map::new();

    map.insert(
        "coefficient".to_string(),
        serde_json::json!(format_exact(&result.coefficient)),
    );
    map.insert(
        "coefficient_f64".to_string(),
        serde_json::json!(result.coefficient_f64()),
    );

    if result.paths_reconstructed {
        let ancestors: Vec<serde_json::Value> = result
            .common_ancestors
            .iter()
            .map(|a| {
                let paths = |list: &[LineagePath]| -> Vec<serde_json::Value> {
                    list.iter()
                        .map(|p| {
                            serde_json::json!({
                                "depth": p.depth,
                                "multiplicity": p.multiplicity.count(),
                                "via": p.intermediates,
                            })
                        })
                        .collect()
                };
                serde_json::json!({
                    "id": a.xref,
                    "order": a.order,
                    "contribution": format_exact(&a.contribution),
                    "contribution_f64": to_f64(&a.contribution),
                    "first_paths": paths(&a.first_paths),
                    "second_paths": paths(&a.second_paths),
                })
            })
            .collect();
        map.insert("common_ancestors".to_string(), serde_json::json!(ancestors));
    }

    let json_str = serde_json::to_string_pretty(&serde_json::Value::Object(map))?;
    println!("{}", json_str);
    Ok(())
}

fn cmd_matrix(pedigree_path: &str, tree: &str, ids: &[String]) -> Result<()> {
    let ped = load_pedigree(pedigree_path, tree)?;
    let topology = build_topology(&ped)?;

    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    let mut calc = RelationshipCalculator::new(&ped, &topology);
    let a = calc
        .matrix(&ids)
        .context("Failed to compute relationship matrix")?;

    print!("{:>10}", "");
    for id in &ids {
        print!(" {:>10}", id);
    }
    println!();
    for (i, id) in ids.iter().enumerate() {
        print!("{:>10}", id);
        for j in 0..ids.len() {
            print!(" {:>10.6}", a[(i, j)]);
        }
        println!();
    }

    Ok(())
}
