//! Surface Bind CLI
//!
//! Command-line interface for inspecting surface documents and building requests.

#[cfg(feature = "remote")]
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use surface_bind::{
    build_api, load_document_auto, ApiRoot, Attribute, BoundOperation, CallArgs, Member,
    ResourceNode,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "remote")]
use surface_bind::{
    discover, DiscoveryEndpoints, DocumentCache, DISCOVERY_ROOT, V2_DISCOVERY_TEMPLATE,
};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SURFACE_BIND_LOG";

#[derive(Parser)]
#[command(name = "surface-bind")]
#[command(about = "Bind API surface documents and build HTTP requests from them")]
#[command(version)]
struct Cli {
    /// Log binding progress at debug level (overrides SURFACE_BIND_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resources and operations of a surface document
    Inspect {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// API name (default: the document's "name" field)
        #[arg(long)]
        name: Option<String>,

        /// Output the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the request an operation call describes
    Request {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// Dotted operation path, e.g. files.revisions.get
        operation: String,

        /// Positional arguments (parsed as JSON when possible)
        args: Vec<String>,

        /// Keyword argument as NAME=VALUE (repeatable)
        #[arg(long = "param", short = 'p', value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Fetch a surface document from the discovery service
    #[cfg(feature = "remote")]
    Discover {
        /// API name, e.g. drive
        name: String,

        /// API version (default: the preferred version)
        #[arg(long)]
        version: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Cache fetched documents in this directory
        #[arg(long, env = "SURFACE_BIND_CACHE_DIR")]
        cache_dir: Option<PathBuf>,

        /// Discovery service root
        #[arg(long, env = "SURFACE_BIND_DIRECTORY", default_value = DISCOVERY_ROOT)]
        directory: String,

        /// Per-API fallback URL; {name} and {version} are substituted
        #[arg(long, env = "SURFACE_BIND_V2_TEMPLATE", default_value = V2_DISCOVERY_TEMPLATE)]
        v2_template: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Inspect {
            document,
            name,
            json,
        } => run_inspect(&document, name, json),

        Commands::Request {
            document,
            operation,
            args,
            params,
            pretty,
        } => run_request(&document, &operation, &args, &params, pretty),

        #[cfg(feature = "remote")]
        Commands::Discover {
            name,
            version,
            output,
            cache_dir,
            directory,
            v2_template,
            pretty,
        } => run_discover(DiscoverArgs {
            name,
            version,
            output,
            cache_dir,
            endpoints: DiscoveryEndpoints::new(directory).with_v2_template(v2_template),
            pretty,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

/// Load and bind a document, reporting failures on stderr.
fn load_api(source: &str, name: Option<String>) -> Result<ApiRoot, u8> {
    let document = load_document_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let name = name
        .or_else(|| document.get("name").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| "api".to_string());

    build_api(&name, &document).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_inspect(source: &str, name: Option<String>, json_output: bool) -> Result<(), u8> {
    let api = load_api(source, name)?;

    if json_output {
        let tree = json!({
            "name": api.name(),
            "baseUrl": api.base_url(),
            "resources": api.resources().map(resource_json).collect::<Vec<_>>(),
        });
        println!("{}", to_json(&tree, true)?);
        return Ok(());
    }

    println!("{} ({})", api.name(), api.base_url());
    if let Some(doc) = api.doc() {
        println!("  {}", doc);
    }
    for resource in api.resources() {
        print_resource(resource, 1);
    }
    Ok(())
}

fn print_resource(resource: &ResourceNode, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}{}", indent, resource.name());
    for (_, member) in resource.members() {
        match member {
            Member::Method(op) => println!(
                "{}  {} {} {}",
                indent,
                op.http_method(),
                op.url_template(),
                op.signature_string()
            ),
            Member::Resource(child) => print_resource(child, depth + 1),
        }
    }
}

fn resource_json(resource: &ResourceNode) -> Value {
    json!({
        "name": resource.name(),
        "methods": resource.methods().map(operation_json).collect::<Vec<_>>(),
        "resources": resource.resources().map(resource_json).collect::<Vec<_>>(),
    })
}

fn operation_json(op: &BoundOperation) -> Value {
    json!({
        "name": op.name(),
        "httpMethod": op.http_method(),
        "url": op.url_template(),
        "parameters": op.signature(),
    })
}

fn run_request(
    source: &str,
    operation: &str,
    args: &[String],
    params: &[String],
    pretty: bool,
) -> Result<(), u8> {
    let api = load_api(source, None)?;

    let op = match api.lookup(operation) {
        Some(Attribute::Method(op)) => op,
        _ => {
            eprintln!("Error: no operation named {}", operation);
            return Err(2);
        }
    };

    let mut call = CallArgs::new();
    for arg in args {
        call.push_arg(parse_value(arg));
    }
    for param in params {
        let Some((name, value)) = param.split_once('=') else {
            eprintln!("Error: expected NAME=VALUE, got {}", param);
            return Err(2);
        };
        call.push_kwarg(name.to_string(), parse_value(value));
    }

    let request = op.call(&call).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let value = serde_json::to_value(&request).map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", to_json(&value, pretty)?);
    Ok(())
}

/// Parse a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn to_json(value: &Value, pretty: bool) -> Result<String, u8> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })
}

#[cfg(feature = "remote")]
struct DiscoverArgs {
    name: String,
    version: Option<String>,
    output: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    endpoints: DiscoveryEndpoints,
    pretty: bool,
}

#[cfg(feature = "remote")]
fn run_discover(args: DiscoverArgs) -> Result<(), u8> {
    let DiscoverArgs {
        name,
        version,
        output,
        cache_dir,
        endpoints,
        pretty,
    } = args;

    let cache = cache_dir.map(DocumentCache::new);
    let document = discover(&endpoints, &name, version.as_deref(), cache.as_ref()).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let text = to_json(&document, pretty)?;
    match output {
        Some(path) => {
            std::fs::write(&path, &text).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", text);
        }
    }

    Ok(())
}
