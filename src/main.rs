use amusic_api::RestApi;
use amusic_core::{EntityKind, IndexBuilder, Metric, RowId};
use amusic_recommend::{EngineConfig, RecommendRequest};
use amusic_storage::{load_table, Catalog, CatalogConfig, IndexArtifact, TableSchema};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_HTTP_PORT: u16 = 8642;

/// Nearest-neighbor music recommendations over audio feature tables
#[derive(Parser, Debug)]
#[command(name = "amusic")]
#[command(about = "Nearest-neighbor music recommendations", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an index artifact from a feature table
    Build {
        /// Entity kind the table describes
        #[arg(short, long)]
        kind: EntityKind,

        /// CSV feature table
        #[arg(short, long)]
        table: PathBuf,

        /// Output artifact file
        #[arg(short, long)]
        out: PathBuf,

        /// Features to index, comma separated (defaults to the kind's audio features)
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,

        /// Distance metric
        #[arg(long, default_value_t = Metric::Euclidean)]
        metric: Metric,
    },

    /// Print artifact metadata
    Inspect {
        /// Artifact file
        #[arg(short, long)]
        artifact: PathBuf,
    },

    /// Answer one recommendation query
    Recommend {
        #[command(flatten)]
        data: DataArgs,

        #[arg(short, long)]
        kind: EntityKind,

        /// Seed row id
        #[arg(long, conflicts_with = "label", required_unless_present = "label")]
        seed: Option<String>,

        /// Seed label; the first row carrying it is used
        #[arg(long)]
        label: Option<String>,

        /// Number of results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Diversity in [0, 1]
        #[arg(long)]
        diversity: Option<f32>,
    },

    /// Serve the HTTP API
    Serve {
        #[command(flatten)]
        data: DataArgs,

        /// HTTP API port
        #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
        http_port: u16,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Directory holding feature tables and index artifacts
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Build and save indexes for tables without an artifact
    #[arg(long)]
    build_missing: bool,

    /// Near-duplicate distance at full diversity; 0 keeps label dedup only
    #[arg(long, default_value_t = 0.0)]
    min_separation: f32,
}

impl DataArgs {
    fn catalog_config(&self, kinds: Vec<EntityKind>) -> CatalogConfig {
        let mut config = CatalogConfig::new(&self.data_dir);
        config.kinds = kinds;
        config.build_missing = self.build_missing;
        config.engine = EngineConfig {
            min_separation: self.min_separation,
            ..EngineConfig::default()
        };
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Build {
            kind,
            table,
            out,
            features,
            metric,
        } => {
            let schema = match features {
                Some(features) => TableSchema::for_kind(kind).with_features(features),
                None => TableSchema::for_kind(kind),
            };
            let (table, _) = load_table(&table, &schema)
                .with_context(|| format!("loading {} table {:?}", kind, table))?;
            let index = IndexBuilder::new().with_metric(metric).build_all(&table)?;
            let artifact = IndexArtifact::new(kind, index)?;
            artifact.save(&out)?;
            println!("{}", serde_json::to_string_pretty(&artifact.info)?);
        }
        Command::Inspect { artifact } => {
            let artifact = IndexArtifact::load(&artifact)
                .with_context(|| format!("reading artifact {:?}", artifact))?;
            println!("{}", serde_json::to_string_pretty(&artifact.info)?);
        }
        Command::Recommend {
            data,
            kind,
            seed,
            label,
            limit,
            diversity,
        } => {
            let catalog = Catalog::open(&data.catalog_config(vec![kind]))?;
            let engine = catalog
                .engine(kind)
                .with_context(|| format!("{} is not loaded", kind))?;
            let response = match (seed, label) {
                (Some(seed), _) => {
                    let mut request = RecommendRequest::new(RowId::parse(&seed), limit);
                    request.diversity = diversity;
                    engine.recommend(&request)?
                }
                (None, Some(label)) => engine.recommend_by_label(&label, limit, diversity)?,
                (None, None) => anyhow::bail!("either --seed or --label is required"),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Serve { data, http_port } => {
            info!("Starting amusic v{}", env!("CARGO_PKG_VERSION"));
            info!("Data directory: {:?}", data.data_dir);

            let catalog = Arc::new(Catalog::open(&data.catalog_config(EntityKind::ALL.to_vec()))?);
            info!("Catalog initialized with {} kinds", catalog.len());

            let http_handle = std::thread::spawn(move || {
                info!("Starting HTTP server on port {}", http_port);
                let sys = actix_web::rt::System::new();
                sys.block_on(async {
                    if let Err(e) = RestApi::start(catalog, http_port).await {
                        eprintln!("HTTP server error: {}", e);
                    }
                })
            });

            info!("HTTP API: http://localhost:{}/kinds", http_port);

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                }
                _ = tokio::task::spawn_blocking(move || {
                    http_handle.join().ok();
                }) => {
                    info!("HTTP server stopped");
                }
            }

            info!("Shutting down...");
        }
    }

    Ok(())
}
