use clap::{Parser, Subcommand};
use facecrop::catalog::{CatalogSource, FileCatalogSource};
use facecrop::embed::RasterStore;
use facecrop::imaging::FilterSelection;
use facecrop::request::{Dimensions, ImageQuery};
use facecrop::service::{Mode, Service};
use facecrop::{config, output, server, verify};
use std::path::PathBuf;

/// Flags shared by `render` that mirror the HTTP query parameters.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Output width (defaults to height, then to the image's natural width)
    #[arg(long)]
    width: Option<String>,

    /// Output height (defaults to width, then to the image's natural height)
    #[arg(long)]
    height: Option<String>,

    /// Comma-separated effects: greyscale, blur
    #[arg(long)]
    filter: Option<String>,

    /// Skip the face crop and rely on xMidYMid slice alone (like `GET /`)
    #[arg(long)]
    slice: bool,
}

#[derive(Parser)]
#[command(name = "facecrop")]
#[command(about = "Random face-centered portraits as SVG")]
#[command(long_about = "\
Random face-centered portraits as SVG

Picks a random image from a catalog, crops it to the requested aspect ratio
around a precomputed face box, and returns an SVG with the raster inlined.

Catalog (meta.json):

  [
    {
      \"data\": \"/images/001.jpg\",     # path under catalog.static_root
      \"source\": \"https://…\",          # attribution, not interpreted
      \"width\": 1000,
      \"height\": 500,
      \"face\": { \"x\": 450, \"y\": 200, \"w\": 100, \"h\": 100 }   # optional
    }
  ]

Routes served by 'facecrop serve':

  GET /image?w=&h=&filter=    face-centered crop
  GET /?w=&h=&filter=         no crop, xMidYMid slice only
  GET /health                 {\"ok\":true}

Run 'facecrop gen-config' to generate a documented facecrop.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = "facecrop.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Listen address, overriding server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Render one SVG to stdout
    Render(RenderArgs),
    /// Validate the catalog and compare it against the image files
    Check,
    /// Print a stock facecrop.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind } => {
            let mut service_config = config::load_config(&cli.config)?;
            if let Some(bind) = bind {
                service_config.server.bind = bind;
                service_config.validate()?;
            }
            server::run(&service_config)?;
        }
        Command::Render(args) => {
            let service_config = config::load_config(&cli.config)?;
            let service = Service::from_config(&service_config);
            let query = ImageQuery {
                dimensions: Dimensions::parse(args.width.as_deref(), args.height.as_deref()),
                filters: args
                    .filter
                    .as_deref()
                    .map(FilterSelection::parse)
                    .unwrap_or_default(),
            };
            let mode = if args.slice { Mode::Slice } else { Mode::FaceAware };
            let svg = service.render(mode, &query, &mut rand::thread_rng())?;
            log::info!("Rendered {} ({})", svg.image, svg.source);
            print!("{}", svg.body);
        }
        Command::Check => {
            let service_config = config::load_config(&cli.config)?;
            let source = FileCatalogSource::new(&service_config.catalog.path);
            let catalog = source.load()?;
            let store = RasterStore::new(&service_config.catalog.static_root, false);
            let checks = verify::verify_catalog(&catalog, &store);
            output::print_check_output(&source.describe(), &catalog, &checks);
            let problems = checks.iter().filter(|c| c.is_problem()).count();
            if problems > 0 {
                return Err(format!("{problems} catalog entries need attention").into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
