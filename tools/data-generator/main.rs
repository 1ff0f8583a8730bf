use clap::Parser;
use henka::batch::StreamRecord;
use henka::block::{Block, BlockKind};
use henka::schema::{BlockDef, BlockSchema};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};
use std::fs;

/// A CLI tool to generate stored block-tree records for a schema
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the schema JSON file the records must conform to
    schema: String,

    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_records.json")]
    output: String,

    /// How many records to generate
    #[arg(short, long, default_value_t = 100)]
    count: usize,

    /// The minimum number of children per Stream or List
    #[arg(long, default_value_t = 0)]
    min: usize,

    /// The maximum number of children per Stream or List
    #[arg(long, default_value_t = 6)]
    max: usize,

    /// Write some lists in the legacy bare form instead of wrapped items
    #[arg(long)]
    legacy_lists: bool,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

struct Generator {
    rng: StdRng,
    min: usize,
    max: usize,
    legacy_lists: bool,
    next_id: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    let schema = BlockDef::from_file(&cli.schema)?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut generator = Generator {
        rng,
        min: cli.min,
        max: cli.max,
        legacy_lists: cli.legacy_lists,
        next_id: 0,
    };

    println!(
        "Generating {} record(s) (children per container: {} to {})...",
        cli.count, cli.min, cli.max
    );

    let records: Vec<StreamRecord> = (0..cli.count)
        .map(|index| StreamRecord::new(format!("record-{}", index + 1), generator.value(&schema)))
        .collect();

    let json_output = serde_json::to_string_pretty(&records)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved records to '{}'",
        cli.output
    );

    Ok(())
}

impl Generator {
    fn block_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:08x}-{:04x}", self.next_id, self.rng.random::<u16>())
    }

    fn child_count(&mut self) -> usize {
        self.rng.random_range(self.min..=self.max)
    }

    /// Generates a stored value conforming to `schema`.
    fn value(&mut self, schema: &dyn BlockSchema) -> Value {
        match schema.kind() {
            BlockKind::Stream => {
                let children = schema.children();
                if children.is_empty() {
                    return Value::Array(Vec::new());
                }
                let count = self.child_count();
                let entries = (0..count)
                    .map(|_| {
                        let (name, child) = children[self.rng.random_range(0..children.len())];
                        let value = self.value(child);
                        Block::new(name, value).with_id(self.block_id()).into_raw()
                    })
                    .collect();
                Value::Array(entries)
            }
            BlockKind::Struct => {
                let mut fields = Map::new();
                for (name, child) in schema.children() {
                    fields.insert(name.to_string(), self.value(child));
                }
                Value::Object(fields)
            }
            BlockKind::List => {
                let Some(child) = schema.child_block() else {
                    return Value::Array(Vec::new());
                };
                let legacy = self.legacy_lists && self.rng.random_bool(0.5);
                let count = self.child_count();
                let items = (0..count)
                    .map(|_| {
                        let value = self.value(child);
                        if legacy {
                            value
                        } else {
                            Block::item(value).with_id(self.block_id()).into_raw()
                        }
                    })
                    .collect();
                Value::Array(items)
            }
            BlockKind::Leaf => self.leaf(schema),
        }
    }

    fn leaf(&mut self, schema: &dyn BlockSchema) -> Value {
        let type_name = schema.type_name();
        let class_name = type_name.rsplit('.').next().unwrap_or(type_name);
        match class_name {
            "IntegerBlock" => json!(self.rng.random_range(0..1000)),
            "FloatBlock" | "DecimalBlock" => json!(self.rng.random_range(0.0..1000.0)),
            "BooleanBlock" => json!(self.rng.random_bool(0.5)),
            _ => json!(format!("text-{}", self.rng.random_range(0..100_000))),
        }
    }
}
