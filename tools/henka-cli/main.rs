use clap::{ArgGroup, Args, Parser, Subcommand};
use henka::prelude::*;
use serde_json::Value;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Detect schema changes and migrate stored block-tree data
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log every rewrite and comparison
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two schema versions and produce a migration plan
    Detect(DetectArgs),
    /// Apply a plan or a single operation to stored data
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Path to the old schema JSON file
    old_schema: String,
    /// Path to the new schema JSON file
    new_schema: String,

    /// Schemas are Wagtail `[path, args, kwargs]` deconstructions
    #[arg(long)]
    deconstructed: bool,

    /// Path to a similarity config JSON file
    #[arg(long)]
    config: Option<String>,
    /// Score at or above which a rename is taken without asking
    #[arg(long)]
    confident: Option<f64>,
    /// Score below which two blocks are never considered the same
    #[arg(long)]
    verifying: Option<f64>,

    /// Answer yes to every question
    #[arg(long, conflicts_with = "assume_no")]
    assume_yes: bool,
    /// Answer no to every question
    #[arg(long)]
    assume_no: bool,

    /// Write the plan JSON to this file
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("change").required(true)))]
struct ApplyArgs {
    /// Path to the schema JSON file the data currently conforms to (the old schema for
    /// plans written by `detect`)
    schema: String,
    /// Path to the data: one stream value, or an array of {"id", "raw"} records
    data: String,

    /// Apply a saved migration plan
    #[arg(long, group = "change")]
    plan: Option<String>,
    /// Rename the children called OLD of the block at PATH
    #[arg(long, num_args = 3, value_names = ["PATH", "OLD", "NEW"], group = "change")]
    rename: Option<Vec<String>>,
    /// Remove the children called NAME of the block at PATH
    #[arg(long, num_args = 2, value_names = ["PATH", "NAME"], group = "change")]
    remove: Option<Vec<String>>,

    /// Skip and log records that fail instead of stopping
    #[arg(long)]
    skip_errors: bool,

    /// Write the migrated data to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Detect(args) => run_detect(args),
        Command::Apply(args) => run_apply(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_schema(path: &str, deconstructed: bool) -> BlockDef {
    let result = if deconstructed {
        fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| DeconstructedBlock::from_json(&json).map_err(|e| e.to_string()))
            .and_then(|block| block.into_block_def().map_err(|e| e.to_string()))
    } else {
        BlockDef::from_file(path).map_err(|e| e.to_string())
    };
    result.unwrap_or_else(|e| exit_with_error(&format!("Failed to load schema '{}': {}", path, e)))
}

fn run_detect(args: DetectArgs) {
    let old = load_schema(&args.old_schema, args.deconstructed);
    let new = load_schema(&args.new_schema, args.deconstructed);

    let config = match &args.config {
        Some(path) => SimilarityConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => SimilarityConfig::default(),
    }
    .with_thresholds(args.confident, args.verifying);
    if let Err(e) = config.validate() {
        exit_with_error(&e.to_string());
    }
    let comparator = StructuralComparator::new(config);

    let start = Instant::now();
    let plan = if args.assume_yes {
        detect(comparator, AlwaysConfirm, &old, &new)
    } else if args.assume_no {
        detect(comparator, NeverConfirm, &old, &new)
    } else {
        detect(comparator, InteractiveQuestioner::stdio(), &old, &new)
    };
    println!(
        "\nDetected {} change(s) in {:.2?}:",
        plan.len(),
        start.elapsed()
    );
    print!("{}", plan);

    if let Some(output) = &args.output {
        plan.save(output)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save plan: {}", e)));
        println!("Plan written to '{}'", output);
    }
}

fn detect<Q: DecisionSource>(
    comparator: StructuralComparator,
    questioner: Q,
    old: &BlockDef,
    new: &BlockDef,
) -> MigrationPlan {
    ChangeDetector::with_comparator(comparator, questioner)
        .detect(old, new)
        .unwrap_or_else(|e| exit_with_error(&format!("Change detection failed: {}", e)))
}

/// Picks the Stream or Struct flavour of an operation from the kind of the block `path` leads to.
fn parent_kind(schema: &dyn BlockSchema, path: &BlockPath) -> BlockKind {
    let segments = path.segments();
    let mut node = schema;
    let mut index = 0;
    while let Some(segment) = segments.get(index) {
        // Lists are passed through unless the segment is the item placeholder.
        let next = match node.kind() {
            BlockKind::List => {
                if segment == LIST_ITEM_NAME {
                    index += 1;
                }
                node.child_block()
            }
            _ => {
                index += 1;
                node.child(segment)
            }
        };
        match next {
            Some(child) if child.kind().is_container() => node = child,
            _ => break,
        }
    }
    node.kind()
}

fn single_operation_plan(args: &ApplyArgs, schema: &BlockDef) -> MigrationPlan {
    let mut plan = MigrationPlan::new();
    if let Some(values) = &args.rename {
        let [path, old_name, new_name] = values.as_slice() else {
            exit_with_error("--rename takes PATH OLD NEW");
        };
        let path = BlockPath::parse(path);
        match parent_kind(schema, &path) {
            BlockKind::Struct => plan.push(RenameStructChildren::new(old_name, new_name), path),
            _ => plan.push(RenameStreamChildren::new(old_name, new_name), path),
        }
    } else if let Some(values) = &args.remove {
        let [path, name] = values.as_slice() else {
            exit_with_error("--remove takes PATH NAME");
        };
        let path = BlockPath::parse(path);
        match parent_kind(schema, &path) {
            BlockKind::Struct => plan.push(RemoveStructChildren::new(name), path),
            _ => plan.push(RemoveStreamChildren::new(name), path),
        }
    }
    plan
}

fn run_apply(args: ApplyArgs) {
    let schema = load_schema(&args.schema, false);
    let plan = match &args.plan {
        Some(path) => MigrationPlan::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load plan: {}", e))),
        None => single_operation_plan(&args, &schema),
    };

    let content = fs::read_to_string(&args.data)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read data '{}': {}", args.data, e)));
    let data: Value = serde_json::from_str(&content)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse data JSON: {}", e)));

    let start = Instant::now();
    let migrated = match serde_json::from_value::<Vec<StreamRecord>>(data.clone()) {
        Ok(records) => {
            let policy = if args.skip_errors {
                ErrorPolicy::SkipAndLog
            } else {
                ErrorPolicy::Abort
            };
            let report = migrate_records(records, &plan, &schema, policy)
                .unwrap_or_else(|e| exit_with_error(&format!("Migration failed: {}", e)));
            eprintln!(
                "Migrated {} record(s), {} changed, {} skipped in {:.2?}",
                report.migrated.len(),
                report.changed_ids.len(),
                report.skipped.len(),
                start.elapsed()
            );
            serde_json::to_value(&report.migrated)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode records: {}", e)))
        }
        Err(_) => plan
            .apply(data, &schema)
            .unwrap_or_else(|e| exit_with_error(&format!("Migration failed: {}", e))),
    };

    let json = serde_json::to_string_pretty(&migrated)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode output: {}", e)));
    match &args.output {
        Some(path) => fs::write(path, json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e))),
        None => println!("{}", json),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
