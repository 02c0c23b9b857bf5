//! NewsLab CLI — snapshot status, coverage, and local import commands.
//!
//! Commands:
//! - `status` — report counts and date ranges across every snapshot
//! - `coverage` — per-symbol field coverage of the financial table
//! - `import` — merge locally exported per-symbol CSV files into the store
//! - `universe show` / `universe init` — inspect or write the symbol universe

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use newslab_core::news::store::NewsStore;
use newslab_core::schema::Field;
use newslab_core::report::{database_status, financial_coverage};
use newslab_core::settings::Settings;
use newslab_core::store::corp_actions::CorpActionStore;
use newslab_core::store::financial::FinancialStore;
use newslab_core::store::listing::ListingStore;
use newslab_core::universe::Universe;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "newslab",
    about = "NewsLab CLI — market-data and news snapshot management"
)]
struct Cli {
    /// Data workspace directory.
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report counts and date ranges across every snapshot.
    Status,
    /// Per-symbol field coverage of the financial table.
    Coverage,
    /// Print a slice of the financial table.
    Query {
        /// Symbols to include. Defaults to every symbol in the store.
        symbols: Vec<String>,

        /// Fields to include (e.g. CLOSE MARKET_CAP). Defaults to all.
        #[arg(long)]
        fields: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to the start of the table.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to the end of the table.
        #[arg(long)]
        end: Option<String>,
    },
    /// Merge locally exported per-symbol CSV files into the financial store.
    Import {
        /// Directory of `SYMBOL.csv` files in long format (date,field,value).
        #[arg(long)]
        dir: PathBuf,

        /// Replace the whole table instead of reconciling symbol by symbol.
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Universe management commands.
    Universe {
        #[command(subcommand)]
        action: UniverseAction,
    },
}

#[derive(Subcommand)]
enum UniverseAction {
    /// Print the universe, sector by sector.
    Show {
        /// Universe TOML file. Defaults to universe.toml in the data dir.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Write the default Bursa Malaysia universe file.
    Init {
        /// Destination. Defaults to universe.toml in the data dir.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::default_in(&cli.data_dir);

    match cli.command {
        Commands::Status => run_status(&settings),
        Commands::Coverage => run_coverage(&settings),
        Commands::Query {
            symbols,
            fields,
            start,
            end,
        } => run_query(&settings, symbols, fields, start, end),
        Commands::Import { dir, overwrite } => run_import(&settings, &dir, overwrite),
        Commands::Universe { action } => match action {
            UniverseAction::Show { file } => {
                run_universe_show(&file.unwrap_or_else(|| settings.data_dir.join("universe.toml")))
            }
            UniverseAction::Init { file } => {
                run_universe_init(&file.unwrap_or_else(|| settings.data_dir.join("universe.toml")))
            }
        },
    }
}

fn run_status(settings: &Settings) -> Result<()> {
    let financial = FinancialStore::load_or_empty(&settings.financial_db);
    let corp_actions = CorpActionStore::load_or_empty(&settings.corp_act_db);
    let listings = ListingStore::load_or_empty(&settings.listing_db);
    let news = NewsStore::load_or_empty(&settings.links_db, &settings.news_db);

    println!("Workspace: {}", settings.data_dir.display());
    println!();
    println!("{}", database_status(&financial, &corp_actions, &listings, &news));
    Ok(())
}

fn run_coverage(settings: &Settings) -> Result<()> {
    let financial = FinancialStore::load_or_empty(&settings.financial_db);
    let coverage = financial_coverage(&financial);

    if coverage.is_empty() {
        println!("Financial store is empty: {}", settings.financial_db.display());
        return Ok(());
    }

    println!("{:<12} {:<12} {:<12} {:>8} {:>8}", "Symbol", "First", "Last", "Fields", "Values");
    println!("{}", "-".repeat(56));
    for cov in &coverage {
        let values: usize = cov.non_null.values().sum();
        println!(
            "{:<12} {:<12} {:<12} {:>8} {:>8}",
            cov.symbol,
            cov.first.to_string(),
            cov.last.to_string(),
            cov.non_null.len(),
            values
        );
    }
    Ok(())
}

fn run_query(
    settings: &Settings,
    symbols: Vec<String>,
    fields: Vec<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<()> {
    let financial = FinancialStore::load_or_empty(&settings.financial_db);

    let field_list: Vec<Field> = fields
        .iter()
        .map(|f| f.parse::<Field>().map_err(anyhow::Error::msg))
        .collect::<Result<_>>()?;

    let (table_start, table_end) = financial
        .frame()
        .date_range()
        .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
    let from = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("parse --start")?
        .unwrap_or(table_start);
    let to = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("parse --end")?
        .unwrap_or(table_end);

    let symbol_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    let slice = financial.query(
        (!symbol_refs.is_empty()).then_some(symbol_refs.as_slice()),
        (!field_list.is_empty()).then_some(field_list.as_slice()),
        from,
        to,
    );

    if slice.is_empty() {
        println!("No data in range.");
        return Ok(());
    }

    let header: Vec<String> = slice
        .columns
        .iter()
        .map(|(symbol, field)| format!("{symbol}:{field}"))
        .collect();
    println!("{:<12} {}", "DATE", header.join(" "));
    for (r, date) in slice.dates.iter().enumerate() {
        let cells: Vec<String> = slice
            .values
            .iter()
            .map(|col| match col[r] {
                Some(v) => format!("{v}"),
                None => String::new(),
            })
            .collect();
        println!("{:<12} {}", date.to_string(), cells.join(" "));
    }
    Ok(())
}

fn run_import(settings: &Settings, dir: &Path, overwrite: bool) -> Result<()> {
    let batch = newslab_core::acquire::import_dir(dir)
        .with_context(|| format!("import from {}", dir.display()))?;

    if batch.is_empty() {
        println!("No usable series found in {}", dir.display());
        return Ok(());
    }

    let symbols = batch.symbols().len();
    let columns = batch.column_count();

    let mut store = FinancialStore::load_or_empty(&settings.financial_db);
    store.merge_symbols(batch, overwrite);
    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("create {}", settings.data_dir.display()))?;
    store
        .save(&settings.financial_db)
        .with_context(|| format!("save {}", settings.financial_db.display()))?;

    println!(
        "Merged {symbols} symbol(s), {columns} column(s) into {}",
        settings.financial_db.display()
    );
    Ok(())
}

fn run_universe_show(file: &Path) -> Result<()> {
    let universe = Universe::from_file(file).map_err(anyhow::Error::msg)?;

    for sector in universe.sector_names() {
        let symbols = universe.sector_symbols(sector).unwrap_or(&[]);
        println!("{sector} ({}):", symbols.len());
        for symbol in symbols {
            println!("  {symbol}");
        }
    }
    println!();
    println!("{} symbol(s) in {} sector(s)", universe.symbol_count(), universe.sector_names().len());
    Ok(())
}

fn run_universe_init(file: &Path) -> Result<()> {
    if file.exists() {
        anyhow::bail!("refusing to overwrite existing {}", file.display());
    }
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let universe = Universe::default_bursa();
    let toml_str = universe.to_toml().map_err(anyhow::Error::msg)?;
    std::fs::write(file, toml_str).with_context(|| format!("write {}", file.display()))?;

    println!("Wrote default universe to {}", file.display());
    Ok(())
}
