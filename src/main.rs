use clap::{Parser, Subcommand};
use simple_iiif::content::ContentStore;
use simple_iiif::dimensions::{DimensionResolver, HttpProbe, ImageInfoProbe, ProbeError};
use simple_iiif::imaging::{Dimensions, RustBackend};
use simple_iiif::manifest::{self, ManifestRequest, Sources};
use simple_iiif::{config, output};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "simple-iiif")]
#[command(about = "IIIF Presentation 3 manifests from content-store result rows")]
#[command(long_about = "\
IIIF Presentation 3 manifests from content-store result rows

Every attachment in the configured tile fields of each result row becomes a
canvas. Canvas sizes come from the image server's info.json, then from the
stored file dimensions, then from the TIFF header on disk.

Content store (JSON):

  {
    \"base_url\": \"https://x\",
    \"entities\": [
      { \"id\": \"1\", \"path\": \"/node/1\", \"title\": \"Book\",
        \"fields\": { \"field_images\": [{ \"uri\": \"public://p1.jpg\", \"mime\": \"image/jpeg\" }] } }
    ],
    \"media\": [{ \"kind\": \"extracted_text\", \"media_of\": \"1\", \"text\": \"...\" }],
    \"rows\": [\"1\"]
  }

Logging goes to stderr and follows RUST_LOG (default simple_iiif=info).

Run 'simple-iiif gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a manifest and write its JSON
    Manifest(ManifestArgs),
    /// Validate config and content store without building
    Check {
        /// Content store JSON file
        #[arg(long)]
        store: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ManifestArgs {
    /// Content store JSON file
    #[arg(long)]
    store: PathBuf,

    /// Request URL the manifest is served at; becomes its id
    #[arg(long)]
    url: String,

    /// Listing title, preferred over the entity title
    #[arg(long)]
    view_title: Option<String>,

    /// Result rows as `type/id` or bare node ids, overriding the store's rows
    #[arg(long, value_delimiter = ',')]
    rows: Option<Vec<String>>,

    /// Image server base URL, overriding config
    #[arg(long)]
    image_server: Option<String>,

    /// Write JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_iiif=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Manifest(args) => run_manifest(&cli.config, args)?,
        Command::Check { store } => {
            let config = config::load_config(&cli.config, None)?;
            let store = ContentStore::load(&store)?;
            output::print_store(&store);
            match config.image_server() {
                Some(server) => eprintln!("==> Image server: {server}"),
                None => eprintln!("==> No image server configured, manifests will be empty"),
            }
            eprintln!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_manifest(
    config_path: &std::path::Path,
    args: ManifestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(config_path, cli_overrides(&args))?;
    let store = ContentStore::load(&args.store)?;
    let rows = store.rows(args.rows.as_deref());

    let probe: Box<dyn ImageInfoProbe> = match config.image_server() {
        Some(server) => Box::new(HttpProbe::new(server, config.probe_timeout())?),
        None => Box::new(Unconfigured),
    };
    let backend = RustBackend::new();
    let sources = Sources {
        resolver: &store,
        transcripts: &store,
        dimensions: DimensionResolver::new(probe.as_ref(), &backend, &store),
    };

    let request = ManifestRequest {
        url: &args.url,
        view_title: args.view_title.as_deref(),
    };
    let doc = manifest::assemble(request, &rows, &config, &sources);
    let json = doc.to_json(args.pretty)?;

    match &args.output {
        Some(path) => std::fs::write(path, format!("{json}\n"))?,
        None => println!("{json}"),
    }
    output::print_manifest(&doc, &config.language);
    Ok(())
}

/// CLI flags as a TOML overlay on top of the config file.
fn cli_overrides(args: &ManifestArgs) -> Option<toml::Value> {
    let server = args.image_server.as_ref()?;
    let mut table = toml::map::Map::new();
    table.insert(
        "image_server_url".to_string(),
        toml::Value::String(server.clone()),
    );
    Some(toml::Value::Table(table))
}

/// Stand-in probe when no image server is set; assembly never calls it.
struct Unconfigured;

impl ImageInfoProbe for Unconfigured {
    fn probe(&self, _file_url: &str) -> Result<Dimensions, ProbeError> {
        Err(ProbeError::MissingDimensions)
    }
}
