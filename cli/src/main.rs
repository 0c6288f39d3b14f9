mod config;
mod render;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use contacts_core::parse::{parse_column_defs, parse_field_list, parse_filters, parse_record_data};
use contacts_core::{Combinator, FindRequest};
use contacts_sqlite::RecordStore;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, DisplayStyle};
use crate::render::{render_records, render_schema};

#[derive(Debug, Parser)]
#[command(name = "contacts")]
#[command(about = "Manage tables and records in a contacts database", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Database file path, or `:memory:` (overrides the config file).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Config file path (default: ~/.config/contacts/config.yml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output style for records (overrides the config file).
    #[arg(long, global = true, value_enum)]
    display_style: Option<DisplayStyle>,
    /// Log every executed statement to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a table from `name=>type|...` column definitions.
    CreateTable(CreateTableArgs),
    /// Drop a table and every record in it.
    DropTable(TableArgs),
    /// List user tables.
    ListTables,
    /// Show the columns and declared types of a table.
    Schema(TableArgs),
    /// Insert a record from `field=>value|...` data.
    Add(AddArgs),
    /// Find records matching `column~operator~value|...` filters.
    Find(FindArgs),
    /// Update fields of one record.
    Update(UpdateArgs),
    /// Delete records by id.
    Delete(DeleteArgs),
    /// List every record of a table.
    List(ListArgs),
    /// Delete every record of a table, keeping the table.
    Clear(TableArgs),
}

#[derive(Debug, Args)]
struct TableArgs {
    /// Table name.
    #[arg(long)]
    table: String,
}

#[derive(Debug, Args)]
struct CreateTableArgs {
    /// Table name.
    #[arg(long)]
    table: String,
    /// Column definitions, e.g. `name=>text|age=>integer`.
    #[arg(long, default_value = "")]
    columns: String,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Table name.
    #[arg(long)]
    table: String,
    /// Record data, e.g. `name=>"Ann"|age=>30`. Text values are double-quoted.
    #[arg(long, default_value = "")]
    data: String,
}

#[derive(Debug, Args)]
struct FindArgs {
    /// Table name.
    #[arg(long)]
    table: String,
    /// Filters, e.g. `age~greater_than~30|name~contains~"An"`.
    #[arg(long, default_value = "")]
    filters: String,
    /// How filters are joined.
    #[arg(long, default_value = "and", value_parser = Combinator::from_str)]
    combinator: Combinator,
    /// Fields to show, e.g. `id|name`. Empty shows every field.
    #[arg(long, default_value = "")]
    fields: String,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Table name.
    #[arg(long)]
    table: String,
    /// Record id.
    #[arg(long)]
    id: i64,
    /// Fields to change, e.g. `age=>31`.
    #[arg(long)]
    data: String,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Table name.
    #[arg(long)]
    table: String,
    /// Record id; repeat to delete several.
    #[arg(long = "id", required = true)]
    ids: Vec<i64>,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Table name.
    #[arg(long)]
    table: String,
    /// Fields to show, e.g. `id|name`. Empty shows every field.
    #[arg(long, default_value = "")]
    fields: String,
}

/// Database and output settings after merging config file and flags.
#[derive(Debug)]
struct Settings {
    database: PathBuf,
    display_style: DisplayStyle,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("contacts=debug,contacts_sqlite=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let settings = resolve_settings(&cli.global)?;
    debug!(database = %settings.database.display(), "resolved settings");
    let mut store = open_store(&settings.database)?;

    let result = match cli.command {
        Command::CreateTable(args) => run_create_table(&mut store, args),
        Command::DropTable(args) => run_drop_table(&mut store, args),
        Command::ListTables => run_list_tables(&store),
        Command::Schema(args) => run_schema(&store, args),
        Command::Add(args) => run_add(&mut store, args),
        Command::Find(args) => run_find(&store, args, settings.display_style),
        Command::Update(args) => run_update(&mut store, args),
        Command::Delete(args) => run_delete(&mut store, args),
        Command::List(args) => run_list(&store, args, settings.display_style),
        Command::Clear(args) => run_clear(&mut store, args),
    };

    let closed = store
        .close()
        .map_err(|e| format!("Failed to close database: {e}"));
    command_error_first(result, closed)
}

/// Reports the command's own error ahead of a failure to close.
fn command_error_first(
    result: Result<(), String>,
    closed: Result<(), String>,
) -> Result<(), String> {
    if let (Err(_), Err(close_err)) = (&result, &closed) {
        warn!("{close_err}");
    }
    result.and(closed)
}

fn resolve_settings(global: &GlobalArgs) -> Result<Settings, String> {
    let config = CliConfig::resolve(global.config.as_deref()).map_err(|e| e.to_string())?;
    Ok(Settings {
        database: global.db.clone().unwrap_or(config.database),
        display_style: global.display_style.unwrap_or(config.display_style),
    })
}

fn open_store(path: &Path) -> Result<RecordStore, String> {
    RecordStore::open(path)
        .map_err(|e| format!("Failed to open database '{}': {e}", path.display()))
}

// ---------------------------------------------------------------------------
// table commands
// ---------------------------------------------------------------------------

fn run_create_table(store: &mut RecordStore, args: CreateTableArgs) -> Result<(), String> {
    let columns =
        parse_column_defs(&args.columns).map_err(|e| format!("Invalid column definitions: {e}"))?;
    store
        .create_table(&args.table, &columns)
        .map_err(|e| format!("Failed to create table: {e}"))?;
    println!("Table '{}' created.", args.table);
    Ok(())
}

fn run_drop_table(store: &mut RecordStore, args: TableArgs) -> Result<(), String> {
    store
        .drop_table(&args.table)
        .map_err(|e| format!("Failed to drop table: {e}"))?;
    println!("Table '{}' dropped.", args.table);
    Ok(())
}

fn run_list_tables(store: &RecordStore) -> Result<(), String> {
    let tables = store
        .list_tables()
        .map_err(|e| format!("Failed to list tables: {e}"))?;
    for table in tables {
        println!("{table}");
    }
    Ok(())
}

fn run_schema(store: &RecordStore, args: TableArgs) -> Result<(), String> {
    let schema = store
        .table_schema(&args.table)
        .map_err(|e| format!("Failed to read schema: {e}"))?;
    print!("{}", render_schema(&schema));
    Ok(())
}

// ---------------------------------------------------------------------------
// record commands
// ---------------------------------------------------------------------------

fn run_add(store: &mut RecordStore, args: AddArgs) -> Result<(), String> {
    let data = parse_record_data(&args.data).map_err(|e| format!("Invalid data: {e}"))?;
    let id = store
        .insert(&args.table, &data)
        .map_err(|e| format!("Failed to add record: {e}"))?;
    println!("Record {id} added to '{}'.", args.table);
    Ok(())
}

fn run_find(store: &RecordStore, args: FindArgs, style: DisplayStyle) -> Result<(), String> {
    let filters = parse_filters(&args.filters).map_err(|e| format!("Invalid filters: {e}"))?;
    let request = FindRequest {
        filters,
        combinator: args.combinator,
        projection: parse_field_list(&args.fields),
    };
    print_records(store, &args.table, &request, style)
}

fn run_list(store: &RecordStore, args: ListArgs, style: DisplayStyle) -> Result<(), String> {
    let request = FindRequest::new().project(parse_field_list(&args.fields));
    print_records(store, &args.table, &request, style)
}

fn print_records(
    store: &RecordStore,
    table: &str,
    request: &FindRequest,
    style: DisplayStyle,
) -> Result<(), String> {
    let records = store
        .find(table, request)
        .map_err(|e| format!("Failed to find records: {e}"))?;
    print!("{}", render_records(&records, style)?);
    Ok(())
}

fn run_update(store: &mut RecordStore, args: UpdateArgs) -> Result<(), String> {
    let data = parse_record_data(&args.data).map_err(|e| format!("Invalid data: {e}"))?;
    let updated = store
        .update(&args.table, args.id, &data)
        .map_err(|e| format!("Failed to update record: {e}"))?;
    if !updated {
        return Err(format!(
            "Record {} does not exist in '{}'",
            args.id, args.table
        ));
    }
    println!("Record {} updated.", args.id);
    Ok(())
}

fn run_delete(store: &mut RecordStore, args: DeleteArgs) -> Result<(), String> {
    let removed = store
        .delete(&args.table, &args.ids)
        .map_err(|e| format!("Failed to delete records: {e}"))?;
    println!("{removed} record(s) deleted from '{}'.", args.table);
    Ok(())
}

fn run_clear(store: &mut RecordStore, args: TableArgs) -> Result<(), String> {
    let removed = store
        .clear(&args.table)
        .map_err(|e| format!("Failed to clear table: {e}"))?;
    println!("{removed} record(s) deleted from '{}'.", args.table);
    Ok(())
}
