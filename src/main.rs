use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brand_docs::apply::{ApplyOptions, NodeFilter};
use brand_docs::fetch::{self, HttpTransport};
use brand_docs::index::StyleDataMap;
use brand_docs::server::{self, PreviewConfig, PreviewServer};

#[derive(Parser)]
#[command(name = "brandoc", version)]
#[command(about = "Apply a brand style guide to HTML pages through data attributes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the style guide comes from.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct GuideArgs {
    /// Style guide endpoint (GET, JSON)
    #[arg(long)]
    url: Option<String>,

    /// Local style guide JSON file
    #[arg(long)]
    guide: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Style an HTML page and write the result
    Apply {
        /// Input HTML file
        page: PathBuf,

        #[command(flatten)]
        source: GuideArgs,

        /// Only style the subtree of the element with this id
        #[arg(long)]
        root: Option<String>,

        /// Only style elements with these tag names (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,
    },

    /// Print the indexed lookup tables as JSON
    Index {
        #[command(flatten)]
        source: GuideArgs,
    },

    /// Serve a directory of pages with the style guide applied
    Serve {
        /// Directory containing .html pages
        dir: PathBuf,

        #[command(flatten)]
        source: GuideArgs,

        /// Server port
        #[arg(long, default_value_t = 4545)]
        port: u16,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BRANDOC_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Apply {
            page,
            source,
            root,
            tags,
            o,
        } => {
            let html = fs::read_to_string(&page)
                .with_context(|| format!("cannot read '{}'", page.display()))?;
            let data = load_style_data(&source)?;
            let options = ApplyOptions {
                filter: if tags.is_empty() {
                    NodeFilter::Elements
                } else {
                    NodeFilter::Tags(tags.iter().map(|t| t.to_ascii_lowercase()).collect())
                },
            };

            let (output, stats) =
                brand_docs::style_html_with(&html, &data, root.as_deref(), &options)
                    .with_context(|| format!("cannot style '{}'", page.display()))?;
            eprintln!(
                "{}: styled {} element(s), {} unresolved reference(s)",
                page.display(),
                stats.styled,
                stats.unresolved
            );

            match o {
                Some(out_path) => {
                    fs::write(&out_path, &output)
                        .with_context(|| format!("cannot write '{}'", out_path.display()))?;
                    eprintln!("wrote {} ({} bytes)", out_path.display(), output.len());
                }
                None => print!("{output}"),
            }
        }

        Commands::Index { source } => {
            let data = load_style_data(&source)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }

        Commands::Serve { dir, source, port } => {
            if !dir.is_dir() {
                bail!("'{}' is not a directory", dir.display());
            }
            let data = load_style_data(&source)?;
            let config = PreviewConfig {
                pages: dir.clone(),
                guide_file: source.guide.clone(),
                port,
                apply: ApplyOptions::default(),
            };
            let server = PreviewServer::bind(config, data)?;
            let port = server.addr().map(|a| a.port()).unwrap_or(port);

            eprintln!("brandoc preview server");
            eprintln!("  pages:      {}", dir.display());
            eprintln!("  index:      http://localhost:{port}/");
            eprintln!("  style data: http://localhost:{port}/style-data.json");
            if let Some(guide) = &source.guide {
                eprintln!("  watching {} for changes...", guide.display());
            }
            server.run();
        }
    }
    Ok(())
}

fn load_style_data(source: &GuideArgs) -> anyhow::Result<StyleDataMap> {
    match (&source.url, &source.guide) {
        (Some(url), _) => fetch_style_data(url),
        (None, Some(path)) => read_style_data(path),
        (None, None) => bail!("either --url or --guide is required"),
    }
}

fn fetch_style_data(url: &str) -> anyhow::Result<StyleDataMap> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let guide = rt
        .block_on(fetch::fetch_guide(&HttpTransport::new(), url))
        .with_context(|| format!("cannot load style guide from {url}"))?;
    Ok(StyleDataMap::from_guide(&guide.unwrap_or_default()))
}

fn read_style_data(path: &Path) -> anyhow::Result<StyleDataMap> {
    server::load_guide_file(path).with_context(|| format!("cannot load style guide '{}'", path.display()))
}
