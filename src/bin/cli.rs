use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{
    Cell, CellAlignment, ContentArrangement, Table,
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};
use fnv::FnvBuildHasher;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::HashSet, hash::BuildHasher};
use tracing::info;
use tracing_subscriber::EnvFilter;
use universal_bloom::{
    BloomConfig, BloomConfigBuilder, BloomFilter, Murmur3BuildHasher,
    common::bits2hr,
};

/// Items used by the experiment: random 4-byte tuples.
type Item = (u8, u8, u8, u8);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert random items and measure the false positive rate on a disjoint set
    Fpr {
        /// Number of items to insert (also the expected item count)
        #[arg(short, long, default_value = "100000")]
        items: usize,

        /// Target false positive rate
        #[arg(short, long, default_value = "0.01")]
        error_rate: f64,

        /// Seed for both the test data and the hash family
        #[arg(short, long)]
        seed: Option<u64>,

        /// Base hash applied before the universal hash family
        #[arg(long, value_enum, default_value_t = BaseHash::Murmur3)]
        hasher: BaseHash,
    },

    /// Show the derived filter parameters without allocating a filter
    Params {
        /// Expected number of items
        #[arg(short, long, default_value = "100000")]
        items: usize,

        /// Target false positive rate
        #[arg(short, long, default_value = "0.01")]
        error_rate: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BaseHash {
    Murmur3,
    Fnv,
}

fn random_items<R: Rng>(rng: &mut R, count: usize) -> HashSet<Item> {
    (0..count).map(|_| rng.random()).collect()
}

fn run_fpr<S: BuildHasher>(
    mut filter: BloomFilter<S>,
    rng: &mut StdRng,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = filter.expected_items();
    let inserted = random_items(rng, count);
    let probes: HashSet<Item> = random_items(rng, count)
        .difference(&inserted)
        .copied()
        .collect();
    info!(
        inserted = inserted.len(),
        probes = probes.len(),
        "generated test data"
    );

    filter.add_all(&inserted);

    let missing = inserted.iter().filter(|item| !filter.contains(*item)).count();
    if missing > 0 {
        return Err(format!("{missing} inserted items were not found").into());
    }

    let false_positives =
        probes.iter().filter(|item| filter.contains(*item)).count();
    let observed = false_positives as f64 / probes.len().max(1) as f64;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Hashes").set_alignment(CellAlignment::Center),
            Cell::new("Bits").set_alignment(CellAlignment::Center),
            Cell::new("Inserted").set_alignment(CellAlignment::Center),
            Cell::new("False Positives").set_alignment(CellAlignment::Center),
            Cell::new("Target FPR").set_alignment(CellAlignment::Center),
            Cell::new("Observed FPR").set_alignment(CellAlignment::Center),
            Cell::new("Estimated FPR").set_alignment(CellAlignment::Center),
            Cell::new("Fill Ratio").set_alignment(CellAlignment::Center),
            Cell::new("Accuracy").set_alignment(CellAlignment::Center),
        ]);
    table.add_row(vec![
        Cell::new(filter.num_hashes()),
        Cell::new(filter.num_bits()),
        Cell::new(filter.seen()),
        Cell::new(format!("{}/{}", false_positives, probes.len())),
        Cell::new(format!("{:.4}%", filter.error_rate() * 100.0)),
        Cell::new(format!("{:.4}%", observed * 100.0)),
        Cell::new(format!(
            "{:.4}%",
            filter.false_positive_probability() * 100.0
        )),
        Cell::new(format!("{:.4}", filter.fill_ratio())),
        Cell::new(format!("{:.4}", 1.0 - observed)),
    ]);

    println!("{table}");
    println!("Bits still clear (estimated): {}", filter.theoretical_error_rate());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fpr {
            items,
            error_rate,
            seed,
            hasher,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            let config: BloomConfig = BloomConfigBuilder::default()
                .expected_items(items)
                .error_rate(error_rate)
                .seed(Some(rng.random()))
                .build()?;

            match hasher {
                BaseHash::Murmur3 => run_fpr(
                    BloomFilter::with_hasher(config, Murmur3BuildHasher::default())?,
                    &mut rng,
                )?,
                BaseHash::Fnv => run_fpr(
                    BloomFilter::with_hasher(config, FnvBuildHasher::default())?,
                    &mut rng,
                )?,
            }
        }
        Commands::Params { items, error_rate } => {
            let config = BloomConfigBuilder::default()
                .expected_items(items)
                .error_rate(error_rate)
                .build()?;
            config.validate()?;

            let params = universal_bloom::BloomParams::from(&config);
            println!("Expected items:  {}", config.expected_items);
            println!("Error rate:      {}", config.error_rate);
            println!("Bits (m):        {}", params.num_bits);
            println!("Hashes (k):      {}", params.num_hashes);
            println!(
                "Bits per item:   {:.2}",
                params.num_bits as f64 / config.expected_items.max(1) as f64
            );
            println!("Memory:          {}", bits2hr(params.num_bits));
        }
    }

    Ok(())
}
