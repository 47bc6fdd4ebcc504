//! Nebula CLI
//!
//! Command-line interface over the Nebula client:
//! - List tables and inspect table state
//! - Load and unload tables
//! - Run queries from flags or a JSON description

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use nebula_client::client::{NebulaClient, SimplifiedResponse, TableState};
use nebula_client::config::{generate_default_config, Config};
use nebula_client::log::init_tracing;
use nebula_client::query::{MetricSpec, QueryDescription, TimelineSpec};
use nebula_client::wire::{LoadError, LoadRequest, LoadType, OrderType, Rollup, TimeUnit};

#[derive(Parser)]
#[command(name = "nebula-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for the Nebula query service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Service address, overrides config and NS_ADDR
    #[arg(long, global = true)]
    pub addr: Option<String>,

    /// User identity sent with every call
    #[arg(short, long, default_value = "", global = true)]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List tables
    Tables,

    /// Show the loaded state of a table
    State {
        /// Table name
        table: String,
    },

    /// Unload a table
    Unload {
        /// Table name
        table: String,
    },

    /// Load a table
    Load {
        /// Table name
        #[arg(short, long)]
        table: String,
        /// Load spec as JSON
        #[arg(short, long)]
        json: String,
        /// Time to live in seconds
        #[arg(long, default_value = "0")]
        ttl: u32,
        /// Load type
        #[arg(long = "type", value_enum, default_value = "demand")]
        load_type: LoadKind,
    },

    /// Run a query
    Query {
        /// Query description as a JSON file
        #[arg(short, long, conflicts_with = "table")]
        file: Option<PathBuf>,
        /// Table name
        #[arg(short, long)]
        table: Option<String>,
        /// Start time: epoch milliseconds, date or relative ("-3d")
        #[arg(long, default_value = "-1d")]
        start: String,
        /// End time: epoch milliseconds, date or "now"
        #[arg(long, default_value = "now")]
        end: String,
        /// Key columns
        #[arg(short, long)]
        key: Vec<String>,
        /// Metrics as column:method[:alias]
        #[arg(short, long)]
        metric: Vec<String>,
        /// Sort order of the first metric (asc, desc)
        #[arg(long)]
        sort: Option<String>,
        /// Maximum rows returned
        #[arg(short, long, default_value = "0")]
        limit: u32,
        /// Timeline window size; enables timeline mode
        #[arg(long)]
        window: Option<u32>,
        /// Timeline rounding unit (none, hour, day, week, month, quarter, year)
        #[arg(long, default_value = "none")]
        unit: String,
        /// Timezone offset in seconds
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i32,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LoadKind {
    Config,
    Demand,
    GoogleSheet,
}

impl From<LoadKind> for LoadType {
    fn from(kind: LoadKind) -> Self {
        match kind {
            LoadKind::Config => LoadType::Config,
            LoadKind::Demand => LoadType::Demand,
            LoadKind::GoogleSheet => LoadType::GoogleSheet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let config = generate_default_config();
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &config)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", config),
        }
        return Ok(());
    }

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(addr) = cli.addr.clone() {
        config.service.addr = addr;
    }

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let client = NebulaClient::connect(&config.service)?;

    match cli.command {
        Commands::Tables => {
            let tables = client.list_tables(&cli.user).await?;
            if tables.is_empty() {
                println!("No tables loaded.");
            }
            for table in tables {
                println!("{}", table);
            }
        }

        Commands::State { table } => {
            let state = client.table_state(&cli.user, &table).await?;
            print_state(&state);
        }

        Commands::Unload { table } => {
            if client.unload_table(&cli.user, &table).await? {
                println!("Unloaded {}", table);
            } else {
                eprintln!("Failed to unload {}", table);
                std::process::exit(1);
            }
        }

        Commands::Load {
            table,
            json,
            ttl,
            load_type,
        } => {
            let request = LoadRequest {
                load_type: load_type.into(),
                table,
                json,
                ttl,
            };
            let reply = client.load_table(&cli.user, request).await?;
            if reply.error != LoadError::Success {
                eprintln!("Load failed: {:?} (code {})", reply.error, reply.error.code());
                std::process::exit(1);
            }
            println!("Loaded {} in {} ms", reply.table, reply.load_time_ms);
        }

        Commands::Query {
            file,
            table,
            start,
            end,
            key,
            metric,
            sort,
            limit,
            window,
            unit,
            offset,
        } => {
            let query = match file {
                Some(path) => QueryDescription::from_json(&std::fs::read_to_string(&path)?)?,
                None => {
                    let mut builder = QueryDescription::builder(table.unwrap_or_default())
                        .start(start)
                        .end(end)
                        .limit(limit);

                    for column in key {
                        builder = builder.key(column);
                    }
                    for spec in &metric {
                        builder = builder.metric_spec(parse_metric(spec)?);
                    }
                    if let Some(sort) = sort {
                        let order = OrderType::from_str(&sort)
                            .ok_or_else(|| format!("Invalid sort order: {}. Use: asc, desc", sort))?;
                        builder = builder.sort(order);
                    }
                    if let Some(window) = window {
                        let unit = TimeUnit::from_str(&unit)
                            .ok_or_else(|| format!("Invalid timeline unit: {}", unit))?;
                        builder = builder.timeline(TimelineSpec::new(window).unit(unit).offset(offset));
                    }

                    builder.build()
                }
            };

            let response = client.query(&cli.user, &query).await?;
            print_response(&response);
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn parse_metric(spec: &str) -> Result<MetricSpec, Box<dyn std::error::Error>> {
    let mut parts = spec.splitn(3, ':');
    let column = parts.next().unwrap_or_default().trim();
    let method = parts.next().unwrap_or_default().trim();

    if column.is_empty() || method.is_empty() {
        return Err(format!("Invalid metric: {}. Use: column:method[:alias]", spec).into());
    }

    let rollup =
        Rollup::from_str(method).ok_or_else(|| format!("Unknown aggregation method: {}", method))?;
    let metric = MetricSpec::new(column, rollup);

    Ok(match parts.next().map(str::trim) {
        Some(alias) if !alias.is_empty() => metric.with_alias(alias),
        _ => metric,
    })
}

fn print_state(state: &TableState) {
    let min = chrono::DateTime::from_timestamp(state.min_time, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let max = chrono::DateTime::from_timestamp(state.max_time, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("Table: {}", state.table_name);
    println!();
    println!("  Blocks:  {}", state.block_count);
    println!("  Rows:    {}", state.row_count);
    println!("  Memory:  {}", format_bytes(state.memory_size));
    println!("  Range:   {} .. {}", min, max);
    println!("  Keys:    {}", state.column_keys.join(", "));
    println!("  Values:  {}", state.column_values.join(", "));
}

fn print_response(response: &SimplifiedResponse) {
    eprintln!(
        "error={} duration={}ms scanned={} rows / {} blocks returned={}",
        response.error,
        response.duration_ms,
        response.rows_scanned,
        response.blocks_scanned,
        response.rows_returned
    );
    println!("{}", String::from_utf8_lossy(&response.data));
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
