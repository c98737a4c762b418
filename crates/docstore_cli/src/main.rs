//! Command-line entry point.
//!
//! # Responsibility
//! - Read configuration from the environment and initialize logging.
//! - Open the store once, run one command, and close the store on every path.
//! - Select the record codec (structural or `Profile` schema) per invocation.

use clap::{Args, Parser, Subcommand};
use docstore_core::{
    core_version, init_logging, load_sample_data, DocumentService, DynamicCodec, Filter,
    LogSettings, ObjectId, PageDescriptor, PartialUpdate, Profile, RecordCodec,
    SqliteDocumentRepository, StoreConfig, StoreHandle, TypedCodec,
};
use log::info;
use serde_json::{json, Value};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Document store maintenance and inspection tool.
///
/// The store is selected with DOCSTORE_URI, e.g. `sqlite:/var/lib/app.db?collection=profiles`.
#[derive(Parser, Debug)]
#[command(name = "docstore", version)]
struct Cli {
    /// Validate records against the `Profile` schema instead of accepting any shape
    #[arg(long, global = true)]
    typed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the store answers
    Ping,
    /// Replace the collection with records from a JSON array file
    LoadSample { data_file: PathBuf },
    /// Create one record from a JSON object
    Create { payload: String },
    /// Print one record by id
    Get { id: String },
    /// Print a page of records in creation order
    List(ListArgs),
    /// Change only the named fields of one record
    Update { id: String, changes: String },
    /// Delete one record by id
    Delete { id: String },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Maximum records to return (clamped to the store maximum)
    #[arg(long)]
    limit: Option<u32>,

    /// Records to skip; ignored when --after is given
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Continue after this id
    #[arg(long)]
    after: Option<String>,

    /// Equality filter `field=value`; value is parsed as JSON, falling back to a string
    #[arg(long = "where", value_name = "FIELD=VALUE")]
    filters: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    init_logging(&LogSettings::from_env()?)?;
    let config = StoreConfig::from_env()?;
    let handle = StoreHandle::connect(&config)?;
    info!(
        "event=cli_start module=cli status=ok version={} collection={} typed={}",
        core_version(),
        config.collection,
        cli.typed
    );

    let outcome = dispatch(&handle, &config.collection, cli.typed, cli.command);
    let closed = handle.close();
    outcome?;
    closed?;
    Ok(())
}

fn dispatch(handle: &StoreHandle, collection: &str, typed: bool, command: Command) -> CliResult<()> {
    let repo = SqliteDocumentRepository::new(handle);
    if typed {
        execute(
            &DocumentService::new(repo, TypedCodec::<Profile>::new(), collection),
            command,
        )
    } else {
        execute(
            &DocumentService::new(repo, DynamicCodec::new(), collection),
            command,
        )
    }
}

fn execute<C: RecordCodec>(
    service: &DocumentService<SqliteDocumentRepository<'_>, C>,
    command: Command,
) -> CliResult<()> {
    match command {
        Command::Ping => {
            service.ping()?;
            print_json(&json!({"ok": 1}))
        }
        Command::LoadSample { data_file } => {
            let count = load_sample_data(service, &data_file)?;
            print_json(&json!({"loaded": count, "collection": service.collection()}))
        }
        Command::Create { payload } => {
            let Value::Object(fields) = serde_json::from_str::<Value>(&payload)? else {
                return Err("payload must be a JSON object".into());
            };
            print_json(&service.create(fields)?)
        }
        Command::Get { id } => print_json(&service.get(&id)?),
        Command::List(args) => list(service, args),
        Command::Update { id, changes } => {
            let update = PartialUpdate::from_json(serde_json::from_str(&changes)?)
                .ok_or("changes must be a JSON object")?;
            print_json(&service.update(&id, &update)?)
        }
        Command::Delete { id } => {
            service.delete(&id)?;
            print_json(&json!({"deleted": id}))
        }
    }
}

fn list<C: RecordCodec>(
    service: &DocumentService<SqliteDocumentRepository<'_>, C>,
    args: ListArgs,
) -> CliResult<()> {
    let page = match args.after {
        Some(after) => PageDescriptor::Cursor {
            after: Some(ObjectId::parse_str(&after)?),
            limit: args.limit,
        },
        None => PageDescriptor::Offset {
            offset: args.offset,
            limit: args.limit,
        },
    };

    let mut filter = Filter::new();
    for raw in &args.filters {
        let (field, value) = raw
            .split_once('=')
            .ok_or_else(|| format!("filter `{raw}` must look like FIELD=VALUE"))?;
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        filter = filter.eq(field, value);
    }

    let mut cursor = service.list(page, filter)?;
    let items = cursor.by_ref().collect::<Result<Vec<_>, _>>()?;
    let next_after = cursor.last_id().map(|id| id.to_hex());
    print_json(&json!({"items": items, "next_after": next_after}))
}

fn print_json(value: &impl serde::Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
