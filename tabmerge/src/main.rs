use std::path::PathBuf;
use std::process;

use arrow::util::pretty::pretty_format_batches;
use clap::{Args, Parser, Subcommand};
use tabmerge::compute::{BusinessFilter, IntegerTarget, IntegerWidth};
use tabmerge::datagen::{GeneratorConfig, write_sources};
use tabmerge::join::{DuplicateKeyPolicy, JoinType};
use tabmerge::{JoinSettings, Pipeline, PipelineConfig, PipelineOutput, Result};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PREVIEW_ROWS: usize = 5;

fn main() {
    // Initialize tracing subscriber to respect RUST_LOG environment variable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        tracing::debug!("tabmerge failed: {err:?}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

#[derive(Parser)]
#[command(
    name = "tabmerge",
    about = "Join orders, products and customers, then keep the large orders"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write synthetic orders.csv, products.json and customers.csv.
    Generate(GenerateArgs),
    /// Run the pipeline over a data directory and print a summary.
    Run(RunArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Directory the source files are written to.
    #[arg(long = "data-dir", value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    #[arg(long, default_value_t = GeneratorConfig::default().orders)]
    orders: usize,
    #[arg(long, default_value_t = GeneratorConfig::default().customers)]
    customers: usize,
    #[arg(long, default_value_t = GeneratorConfig::default().products)]
    products: usize,
    #[arg(long, default_value_t = GeneratorConfig::default().seed)]
    seed: u64,
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding orders.csv, products.json and customers.csv.
    #[arg(long = "data-dir", value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Keep orders whose total value is strictly greater than this.
    #[arg(long = "min-total", default_value_t = 100.0)]
    min_total: f64,
    /// Keep only customers of this segment (for example Premium).
    #[arg(long)]
    segment: Option<String>,
    /// Use inner joins instead of left joins.
    #[arg(long)]
    inner: bool,
    /// Accept non-unique product or customer ids instead of failing.
    #[arg(long = "allow-duplicate-keys")]
    allow_duplicate_keys: bool,
    /// Narrow integer columns to this width (8, 16, 32 or 64) instead of the smallest fitting one.
    #[arg(long = "int-width", value_name = "BITS", value_parser = parse_int_width)]
    int_width: Option<IntegerWidth>,
    /// Number of result rows to print.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    preview: usize,
}

impl RunArgs {
    fn from_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            min_total: 100.0,
            segment: None,
            inner: false,
            allow_duplicate_keys: false,
            int_width: None,
            preview: DEFAULT_PREVIEW_ROWS,
        }
    }

    fn config(&self) -> PipelineConfig {
        let mut filter = BusinessFilter::default().with_min_total_value(self.min_total);
        if let Some(segment) = &self.segment {
            filter = filter.with_segment(segment.clone());
        }
        let join = JoinSettings {
            join_type: if self.inner {
                JoinType::Inner
            } else {
                JoinType::Left
            },
            duplicate_keys: if self.allow_duplicate_keys {
                DuplicateKeyPolicy::Accept
            } else {
                DuplicateKeyPolicy::Reject
            },
        };
        let mut config = PipelineConfig::from_dir(&self.data_dir)
            .with_filter(filter)
            .with_join(join);
        if let Some(width) = self.int_width {
            config.narrowing = config
                .narrowing
                .with_integer_target(IntegerTarget::Fixed(width));
        }
        config
    }
}

fn parse_int_width(value: &str) -> std::result::Result<IntegerWidth, String> {
    match value {
        "8" => Ok(IntegerWidth::W8),
        "16" => Ok(IntegerWidth::W16),
        "32" => Ok(IntegerWidth::W32),
        "64" => Ok(IntegerWidth::W64),
        other => Err(format!("invalid integer width '{other}', expected 8, 16, 32 or 64")),
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Generate(args)) => run_generate(&args),
        Some(Command::Run(args)) => run_pipeline(&args),
        None => {
            let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
            run_generate(&GenerateArgs {
                data_dir: data_dir.clone(),
                orders: GeneratorConfig::default().orders,
                customers: GeneratorConfig::default().customers,
                products: GeneratorConfig::default().products,
                seed: GeneratorConfig::default().seed,
            })?;
            run_pipeline(&RunArgs::from_dir(data_dir))
        }
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        orders: args.orders,
        customers: args.customers,
        products: args.products,
        seed: args.seed,
    };
    let paths = write_sources(&args.data_dir, &config)?;
    println!("Generated sources in {}:", args.data_dir.display());
    for path in paths {
        println!("  - {}", path.display());
    }
    Ok(())
}

fn run_pipeline(args: &RunArgs) -> Result<()> {
    let output = Pipeline::new(args.config()).run()?;
    print_output(&output, args.preview)
}

fn print_output(output: &PipelineOutput, preview: usize) -> Result<()> {
    println!("\n{}", output.summary);
    if preview > 0 && output.result.num_rows() > 0 {
        let rows = preview.min(output.result.num_rows());
        let head = output.result.slice(0, rows);
        println!("\nFirst {rows} result rows:");
        println!("{}", pretty_format_batches(&[head])?);
    }
    Ok(())
}
