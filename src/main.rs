use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vitrine::catalog::{Collection, Model, ModelName, Product};
use vitrine::config::{self, VitrineConfig};
use vitrine::db::Database;
use vitrine::filters::params::{self, DecodePolicy, DecodedQuery};
use vitrine::filters::{self as dsl, Filter, FilterKind, Join, Query, Schema};
use vitrine::import;
use vitrine::output::json::{self as json_out, FindOutput, RejectedToken};
use vitrine::output::table::{self, TableRow};

#[derive(Parser)]
#[command(
    name = "vitrine",
    version,
    about = "Browse a fashion catalog with URL-safe filter queries"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to database file (default: ~/.vitrine/vitrine.db)
    #[arg(long, global = true, env = "VITRINE_DB")]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List records matching a query string, e.g. "f=price%3Agt%3A100&j=OR"
    Find {
        /// Model to list
        #[arg(value_enum)]
        model: ModelName,

        /// Query string or URL carrying the filters (empty lists everything)
        query: Option<String>,

        /// Maximum results, overriding `take` in the query (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Records to skip, overriding `skip` in the query
        #[arg(long)]
        skip: Option<usize>,

        /// Fail on the first filter that does not decode
        #[arg(long)]
        strict: bool,
    },

    /// Show the predicate a query string compiles to
    Where {
        #[arg(value_enum)]
        model: ModelName,

        query: Option<String>,

        #[arg(long)]
        strict: bool,
    },

    /// Encode one filter as a URL token
    Encode {
        #[arg(value_enum)]
        model: ModelName,

        /// Field name, e.g. price
        field: String,

        /// Condition keyword, e.g. gt
        condition: String,

        /// Operand as JSON, e.g. 100 or '["RTW","COUTURE"]'
        value: String,
    },

    /// Build a link to a path with the given filter tokens applied
    Link {
        #[arg(value_enum)]
        model: ModelName,

        /// Path without a query string, e.g. /products
        path: String,

        /// Encoded filter tokens
        tokens: Vec<String>,
    },

    /// Edit the filters of a query string and print the new one
    Rewrite {
        #[arg(value_enum)]
        model: ModelName,

        /// Query string or URL to edit
        query: String,

        /// Append an encoded filter token
        #[arg(long = "add")]
        add: Vec<String>,

        /// Replace the filter at this 1-based position: POSITION=TOKEN
        #[arg(long = "set")]
        set: Vec<String>,

        /// Remove the filter at this 1-based position
        #[arg(long = "remove")]
        remove: Vec<usize>,

        /// Remove every filter
        #[arg(long)]
        clear: bool,

        /// Set the join (AND, OR, NOT)
        #[arg(long)]
        join: Option<Join>,

        /// Move the join to the next keyword
        #[arg(long)]
        cycle_join: bool,
    },

    /// Import catalog records from JSON or YAML files
    Import {
        /// Files, directories or glob patterns
        paths: Vec<String>,

        /// Validate without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// List the filterable fields of a model
    Fields {
        #[arg(value_enum)]
        model: ModelName,
    },

    /// Show database statistics
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create ~/.vitrine/config.toml from the default template
    Init,
    /// Print the config file path
    Path,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;
    let config = VitrineConfig::load()?;

    match cli.command {
        Commands::Find {
            model,
            query,
            limit,
            skip,
            strict,
        } => {
            let db = open_db(cli.db)?;
            let ctx = FindContext {
                db: &db,
                config: &config,
                query_string: query.as_deref().map(query_part).unwrap_or_default(),
                limit,
                skip,
                policy: policy(&config, strict),
                json_output,
            };
            match model {
                ModelName::Product => find::<Product>(&ctx)?,
                ModelName::Collection => find::<Collection>(&ctx)?,
            }
        }

        Commands::Where { model, query, strict } => {
            let qs = query.as_deref().map(query_part).unwrap_or_default();
            let policy = policy(&config, strict);
            match model {
                ModelName::Product => show_where::<Product>(qs, &config, policy, json_output)?,
                ModelName::Collection => {
                    show_where::<Collection>(qs, &config, policy, json_output)?
                }
            }
        }

        Commands::Encode {
            model,
            field,
            condition,
            value,
        } => {
            let token = match model {
                ModelName::Product => encode_one::<Product>(&field, &condition, &value)?,
                ModelName::Collection => encode_one::<Collection>(&field, &condition, &value)?,
            };
            if json_output {
                json_out::print_json(&serde_json::json!({ "token": token }))?;
            } else {
                println!("{token}");
            }
        }

        Commands::Link { model, path, tokens } => {
            if path.contains('?') {
                bail!("Path must not carry a query string: {path}");
            }
            let href = match model {
                ModelName::Product => link::<Product>(&path, &tokens, &config)?,
                ModelName::Collection => link::<Collection>(&path, &tokens, &config)?,
            };
            if json_output {
                json_out::print_json(&serde_json::json!({ "href": href }))?;
            } else {
                println!("{href}");
            }
        }

        Commands::Rewrite {
            model,
            query,
            add,
            set,
            remove,
            clear,
            join,
            cycle_join,
        } => {
            let edits = Edits {
                add,
                set,
                remove,
                clear,
                join,
                cycle_join,
            };
            let qs = query_part(&query);
            let rewritten = match model {
                ModelName::Product => rewrite::<Product>(qs, &edits, &config)?,
                ModelName::Collection => rewrite::<Collection>(qs, &edits, &config)?,
            };
            if json_output {
                json_out::print_json(&serde_json::json!({ "query": rewritten }))?;
            } else {
                println!("{rewritten}");
            }
        }

        Commands::Import { paths, dry_run } => {
            if paths.is_empty() {
                bail!("No paths provided.");
            }
            let db = if dry_run {
                Database::open_in_memory()?
            } else {
                open_db(cli.db)?
            };
            let summary = import::import_paths(&db, &paths, dry_run)?;
            if json_output {
                json_out::print_json(&summary)?;
            } else {
                table::print_import_summary(&summary, dry_run);
            }
        }

        Commands::Fields { model } => {
            let fields = match model {
                ModelName::Product => field_listing::<Product>(),
                ModelName::Collection => field_listing::<Collection>(),
            };
            if json_output {
                json_out::print_json(&fields)?;
            } else {
                match model {
                    ModelName::Product => table::print_fields::<Product>(),
                    ModelName::Collection => table::print_fields::<Collection>(),
                }
            }
        }

        Commands::Stats => {
            let db = open_db(cli.db)?;
            let stats = db.stats()?;
            if json_output {
                json_out::print_json(&stats)?;
            } else {
                table::print_stats(&stats);
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    json_out::print_json(&config)?;
                } else {
                    println!("{}", config.display()?);
                }
            }
            ConfigAction::Init => {
                let path = config::config_path()?;
                if config::init_config()? {
                    println!("Created {}", path.display());
                } else {
                    println!("Config already exists: {}", path.display());
                }
            }
            ConfigAction::Path => {
                println!("{}", config::config_path()?.display());
            }
        },
    }

    Ok(())
}

fn open_db(path: Option<PathBuf>) -> Result<Database> {
    let path = match path {
        Some(p) => p,
        None => Database::default_db_path()?,
    };
    Database::open(&path)
}

fn policy(config: &VitrineConfig, strict: bool) -> DecodePolicy {
    if strict {
        DecodePolicy::Strict
    } else {
        config.query.decode_policy
    }
}

/// Accept either a bare query string or a whole URL.
fn query_part(input: &str) -> &str {
    let input = input.split_once('#').map_or(input, |(before, _)| before);
    input.split_once('?').map_or(input, |(_, qs)| qs)
}

fn decode_query<S: Schema>(
    qs: &str,
    config: &VitrineConfig,
    policy: DecodePolicy,
) -> Result<DecodedQuery<S>> {
    let decoded = params::parse_query_string::<S>(qs, &config.params, policy)?;
    table::print_rejected(&decoded.rejected);
    Ok(decoded)
}

struct FindContext<'a> {
    db: &'a Database,
    config: &'a VitrineConfig,
    query_string: &'a str,
    limit: Option<usize>,
    skip: Option<usize>,
    policy: DecodePolicy,
    json_output: bool,
}

fn find<M>(ctx: &FindContext<'_>) -> Result<()>
where
    M: Model,
    M::Row: TableRow,
{
    let decoded = decode_query::<M>(ctx.query_string, ctx.config, ctx.policy)?;
    let predicate = decoded.query.compile();
    let take = ctx
        .limit
        .or(decoded.page.take)
        .unwrap_or(ctx.config.query.default_limit);
    let skip = ctx.skip.unwrap_or(decoded.page.skip);
    let result = ctx
        .db
        .find_many::<M>(&predicate, decoded.search.as_deref(), take, skip)
        .with_context(|| format!("Failed to list {} records", M::MODEL))?;

    let labels: Vec<_> = decoded.query.filters().iter().map(Filter::labels).collect();

    if ctx.json_output {
        json_out::print_json(&FindOutput {
            model: M::MODEL,
            query: params::to_query_string(&decoded.query, &ctx.config.params),
            join: decoded.query.join(),
            filters: labels,
            predicate: predicate.to_json(),
            rejected: decoded.rejected.iter().map(RejectedToken::from).collect(),
            search: decoded.search.clone(),
            skip,
            take,
            result: &result,
        })?;
    } else {
        table::print_labels(&labels, decoded.query.join());
        table::print_records(&result, skip, M::MODEL, &decoded.query.to_string());
    }
    Ok(())
}

fn show_where<S: Schema>(
    qs: &str,
    config: &VitrineConfig,
    policy: DecodePolicy,
    json_output: bool,
) -> Result<()> {
    let decoded = decode_query::<S>(qs, config, policy)?;
    let predicate = decoded.query.compile();
    if json_output {
        json_out::print_json(&serde_json::json!({
            "where": predicate,
            "display": decoded.query.to_string(),
        }))?;
    } else {
        println!("{}", serde_json::to_string_pretty(&predicate)?);
        if !decoded.query.is_empty() {
            println!("\n{}", decoded.query);
        }
    }
    Ok(())
}

fn encode_one<S: Schema>(field: &str, condition: &str, value: &str) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(value).with_context(|| format!("Value is not JSON: {value}"))?;
    let kind = FilterKind::<S>::from_parts(field, condition, value)?;
    Ok(dsl::encode(&Filter::new(kind)))
}

fn link<S: Schema>(path: &str, tokens: &[String], config: &VitrineConfig) -> Result<String> {
    let filters = dsl::decode_all::<S, _, _>(tokens)?;
    Ok(params::filter_href(path, &filters, &config.params))
}

struct Edits {
    add: Vec<String>,
    set: Vec<String>,
    remove: Vec<usize>,
    clear: bool,
    join: Option<Join>,
    cycle_join: bool,
}

/// Apply edits in a fixed order: clear, set, remove, add, then join changes.
fn rewrite<S: Schema>(qs: &str, edits: &Edits, config: &VitrineConfig) -> Result<String> {
    let decoded = decode_query::<S>(qs, config, DecodePolicy::Strict)?;
    let original: Vec<Filter<S>> = decoded.query.filters().to_vec();
    let mut query: Query<S> = decoded.query;

    if edits.clear {
        query = query.cleared();
    }

    for edit in &edits.set {
        let (position, token) = edit
            .split_once('=')
            .with_context(|| format!("Expected POSITION=TOKEN, got {edit}"))?;
        let position: usize = position
            .parse()
            .with_context(|| format!("Invalid position: {position}"))?;
        let target = nth(&original, position)?;
        let filter = dsl::decode::<S>(token)?.with_id(target.id.as_str());
        query = query.with_filter(filter);
    }

    for &position in &edits.remove {
        let target = nth(&original, position)?;
        query = query.without_filter(&target.id);
    }

    for token in &edits.add {
        query = query.with_filter(dsl::decode::<S>(token)?);
    }

    if let Some(join) = edits.join {
        query = query.with_join(join);
    }
    if edits.cycle_join {
        query = query.cycle_join();
    }

    Ok(params::rewrite_query_string(qs, &query, &config.params))
}

fn nth<S: Schema>(filters: &[Filter<S>], position: usize) -> Result<&Filter<S>> {
    position
        .checked_sub(1)
        .and_then(|i| filters.get(i))
        .with_context(|| format!("No filter at position {position} (query has {})", filters.len()))
}

#[derive(serde::Serialize)]
struct FieldInfo {
    name: &'static str,
    kind: dsl::FieldKind,
    conditions: &'static [&'static str],
}

fn field_listing<S: Schema>() -> Vec<FieldInfo> {
    S::fields()
        .into_iter()
        .map(|(name, kind)| FieldInfo {
            name,
            kind,
            conditions: kind.conditions(),
        })
        .collect()
}
