use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use prettytable::{Table, row};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use supaimg_core::config::Config;
use supaimg_core::display::{ImageView, ImageViewProps, Render};
use supaimg_core::models::{ImageTransformations, ResponsiveBreakpoint};
use supaimg_core::storage;
use supaimg_core::transform::{BuilderMode, UrlBuilder};
use supaimg_core::{builder_from_config, srcset};

mod logging;

#[derive(Parser)]
#[command(name = "supaimg", version)]
#[command(about = "Build transformed and responsive image URLs for Supabase-hosted images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print current configuration.
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Build the display URL for an image
    Url(UrlArgs),
    /// Build a responsive srcset descriptor
    Srcset(SrcsetArgs),
    /// Simulate the image display lifecycle and print the final render
    Render(RenderArgs),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show effective config
    Doctor,
    /// Write the effective config to the config file
    Save,
}

#[derive(Args)]
struct TransformArgs {
    /// Transformation request as JSON
    #[arg(long, conflicts_with = "transform_file")]
    transform: Option<String>,
    /// Transformation request file (JSON, or TOML for `.toml`)
    #[arg(long)]
    transform_file: Option<PathBuf>,
    /// Override the configured builder mode
    #[arg(long, value_enum)]
    mode: Option<ModeOpt>,
}

#[derive(Args)]
struct UrlArgs {
    source: String,
    /// Treat SOURCE as a storage object path
    #[arg(long)]
    object: bool,
    #[command(flatten)]
    transform: TransformArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Args)]
struct SrcsetArgs {
    source: String,
    #[arg(long)]
    object: bool,
    #[arg(long, value_delimiter = ',', required = true)]
    widths: Vec<u32>,
    #[command(flatten)]
    transform: TransformArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Args)]
struct RenderArgs {
    source: String,
    #[arg(long)]
    object: bool,
    #[arg(long)]
    fallback: Option<String>,
    #[arg(long, value_delimiter = ',')]
    widths: Vec<u32>,
    #[arg(long)]
    alt: Option<String>,
    /// Load immediately instead of waiting for visibility
    #[arg(long)]
    eager: bool,
    /// Simulate a failed image load
    #[arg(long)]
    fail: bool,
    #[command(flatten)]
    transform: TransformArgs,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeOpt {
    Passthrough,
    Proxy,
}

impl ModeOpt {
    fn into_mode(self) -> BuilderMode {
        match self {
            ModeOpt::Passthrough => BuilderMode::Passthrough,
            ModeOpt::Proxy => BuilderMode::Proxy,
        }
    }
}

#[derive(Serialize)]
struct UrlOutput {
    source: String,
    mode: BuilderMode,
    url: String,
}

#[derive(Serialize)]
struct SrcsetOutput {
    source: String,
    mode: BuilderMode,
    srcset: String,
    sizes: &'static str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    logging::init(&config)?;

    match cli.command {
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Doctor => {
                let report = config.doctor();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).expect("serializable doctor report")
                );
            }
            ConfigCommands::Save => {
                config.save()?;
                tracing::info!("config saved");
            }
        },
        Commands::Url(args) => {
            let source = resolve_source(&config, &args.source, args.object)?;
            let transformations = load_transformations(&args.transform)?;
            let builder = select_builder(&mut config, args.transform.mode);
            let url = builder.build(&source, transformations.as_ref());
            let out = UrlOutput {
                source,
                mode: builder.mode(),
                url: url.to_string(),
            };
            emit_json_or_table(args.format, &out, |o| {
                let mut table = Table::new();
                table.add_row(row!["source", o.source]);
                table.add_row(row!["mode", o.mode]);
                table.add_row(row!["url", o.url]);
                table
            });
        }
        Commands::Srcset(args) => {
            let source = resolve_source(&config, &args.source, args.object)?;
            let base = load_transformations(&args.transform)?.unwrap_or_default();
            let breakpoints = breakpoints_for(&args.widths, &base);
            let builder = select_builder(&mut config, args.transform.mode);
            let out = SrcsetOutput {
                srcset: srcset::generate(builder.as_ref(), &source, &breakpoints),
                source,
                mode: builder.mode(),
                sizes: srcset::DEFAULT_SIZES,
            };
            emit_json_or_table(args.format, &out, |o| {
                let mut table = Table::new();
                table.add_row(row!["source", o.source]);
                table.add_row(row!["mode", o.mode]);
                for candidate in o.srcset.split(", ").filter(|c| !c.is_empty()) {
                    table.add_row(row!["candidate", candidate]);
                }
                table.add_row(row!["sizes", o.sizes]);
                table
            });
        }
        Commands::Render(args) => {
            let source = resolve_source(&config, &args.source, args.object)?;
            let transformations = load_transformations(&args.transform)?;
            let builder = select_builder(&mut config, args.transform.mode);

            let mut props = ImageViewProps::new(source);
            props.lazy = !args.eager;
            props.fallback_image = args.fallback.clone();
            if let Some(alt) = &args.alt {
                props.alt = alt.clone();
            }
            if !args.widths.is_empty() {
                let base = transformations.clone().unwrap_or_default();
                props.responsive = Some(breakpoints_for(&args.widths, &base));
            }
            props.transformations = transformations;

            let mut view = ImageView::new(props, builder);
            // No viewport here: the view loads as soon as it mounts.
            view.mount(None);
            if args.fail {
                view.on_error();
            } else {
                view.on_load();
            }
            let render = view.render();
            view.unmount();

            emit_json_or_table(args.format, &render, render_table);
        }
    }

    Ok(())
}

fn select_builder(config: &mut Config, mode: Option<ModeOpt>) -> Arc<dyn UrlBuilder> {
    if let Some(mode) = mode {
        config.builder_mode = mode.into_mode();
    }
    builder_from_config(config)
}

fn resolve_source(config: &Config, source: &str, object: bool) -> Result<String> {
    if !object {
        return Ok(source.to_string());
    }
    let locator = storage::require_locator(config)?;
    Ok(locator.public_url(source))
}

fn load_transformations(args: &TransformArgs) -> Result<Option<ImageTransformations>> {
    if let Some(raw) = &args.transform {
        let parsed = serde_json::from_str(raw)
            .map_err(|err| anyhow!("--transform must be valid JSON: {err}"))?;
        return Ok(Some(parsed));
    }
    match &args.transform_file {
        Some(path) => read_transform_file(path).map(Some),
        None => Ok(None),
    }
}

fn read_transform_file(path: &Path) -> Result<ImageTransformations> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read transform file {}", path.display()))?;
    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    if is_toml {
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
    } else {
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
    }
}

fn breakpoints_for(widths: &[u32], base: &ImageTransformations) -> Vec<ResponsiveBreakpoint> {
    widths
        .iter()
        .map(|&width| ResponsiveBreakpoint::new(width, base.with_width(width)))
        .collect()
}

fn emit_json_or_table<T: Serialize>(
    format: OutputFormat,
    value: &T,
    table_builder: impl FnOnce(&T) -> Table,
) {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).expect("serializable output");
            println!("{json}");
        }
        OutputFormat::Table => {
            let table = table_builder(value);
            table.printstd();
        }
    }
}

fn render_table(render: &Render) -> Table {
    let mut table = Table::new();
    match render {
        Render::EmptyPlaceholder => {
            table.add_row(row!["render", "empty placeholder"]);
        }
        Render::Frame { spinner, image } => {
            table.add_row(row!["spinner", spinner]);
            match image {
                Some(img) => {
                    table.add_row(row!["src", img.src]);
                    if let Some(srcset) = &img.srcset {
                        table.add_row(row!["srcset", srcset]);
                    }
                    if let Some(sizes) = &img.sizes {
                        table.add_row(row!["sizes", sizes]);
                    }
                    table.add_row(row!["alt", img.alt]);
                    table.add_row(row!["visible", img.visible]);
                }
                None => {
                    table.add_row(row!["image", "awaiting visibility"]);
                }
            }
        }
    }
    table
}
