use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tategaki::api::ApiDoc;
use tategaki::assets::AssetLoader;
use tategaki::models::{AppConfig, PoolSettings, RenderRequest};
use tategaki::rendering::ResvgBackend;
use tategaki::server;
use tategaki::services::{FontCatalog, RenderContext, RenderPipeline, TextRenderer};

#[derive(Parser)]
#[command(name = "tategaki")]
#[command(about = "Tategaki - vertical Japanese text rendering service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Render text directly to a PNG file
    Render {
        /// Text to render; `\n` in the argument is kept as a paragraph break
        #[arg(short, long)]
        text: String,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Logical font name (antique, gothic, mincho)
        #[arg(short, long)]
        font: Option<String>,

        #[arg(long, default_value_t = 20)]
        font_size: u32,

        #[arg(long, default_value_t = 1.6)]
        line_height: f64,

        #[arg(long, default_value_t = 0.05)]
        letter_spacing: f64,

        #[arg(long, default_value_t = 20)]
        padding: u32,

        /// Characters per column (derived from the text length if omitted)
        #[arg(short, long)]
        max_chars_per_line: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Render {
            text,
            output,
            font,
            font_size,
            line_height,
            letter_spacing,
            padding,
            max_chars_per_line,
        }) => {
            let request = RenderRequest {
                text: text.replace("\\n", "\n"),
                font,
                font_size,
                line_height,
                letter_spacing,
                padding,
                max_chars_per_line,
            };
            run_render_command(request, &output).await
        }
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Asset loader with optional external paths from env vars
fn asset_loader_from_env() -> AssetLoader {
    let fonts_dir = std::env::var("FONTS_DIR").ok().map(PathBuf::from);
    let config_file = std::env::var("CONFIG_FILE").ok().map(PathBuf::from);
    AssetLoader::new(fonts_dir, config_file)
}

fn load_config(loader: &AssetLoader) -> AppConfig {
    let mut config = AppConfig::load_from_assets(loader);
    config.apply_env_overrides(|name| std::env::var(name).ok());
    config
}

/// Render one request to a PNG file (no server needed)
async fn run_render_command(request: RenderRequest, output: &Path) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tategaki=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if let Err(errors) = request.validate() {
        for error in &errors {
            eprintln!("  {}: {}", error.loc, error.msg);
        }
        anyhow::bail!("invalid render parameters");
    }

    let loader = asset_loader_from_env();
    let config = load_config(&loader);

    let mut fontdb = fontdb::Database::new();
    let fonts = FontCatalog::load(&config.fonts, &loader, &mut fontdb);
    let settings = PoolSettings {
        pool_size: 1,
        max_concurrency: 1,
        precreate: false,
        ..config.render.pool_settings()
    };
    let context = RenderContext::start(settings, ResvgBackend::new(Arc::new(fontdb))).await;
    let pipeline = RenderPipeline::new(context, Arc::new(fonts))?;

    let result = pipeline.render(&request).await;
    pipeline.shutdown().await;
    let artifact = result?;

    std::fs::write(output, &artifact.png)?;
    println!(
        "Rendered {}x{} ({} font{}) in {:.1} ms to {}",
        artifact.width,
        artifact.height,
        artifact.font,
        if artifact.trimmed { ", trimmed" } else { "" },
        artifact.processing_time_ms,
        output.display()
    );

    Ok(())
}

/// Print version, environment and configuration summary
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("Tategaki v{VERSION}");
    println!("Vertical Japanese text rendering service\n");

    println!("Environment Variables:");
    for name in [
        "BIND_ADDR",
        "CONFIG_FILE",
        "FONTS_DIR",
        "API_TOKEN",
        "MAX_CONCURRENCY",
        "PAGE_POOL_SIZE",
        "MAX_BATCH_ITEMS",
        "RENDER_TIMEOUT_SECS",
        "PRECREATE_PAGES",
        "WARMUP_RENDER_ON_STARTUP",
    ] {
        let value = match std::env::var(name) {
            Ok(_) if name == "API_TOKEN" => "(set)".to_string(),
            Ok(value) => value,
            Err(_) => "(not set)".to_string(),
        };
        println!("  {name:<24} = {value}");
    }

    let loader = asset_loader_from_env();
    let config = load_config(&loader);
    let settings = config.render.pool_settings();

    println!("\nEffective Configuration:");
    println!("  bind address     {}", config.server.bind_addr);
    println!(
        "  api token        {}",
        if config.server.api_token.is_some() { "configured" } else { "MISSING (all render requests rejected)" }
    );
    println!("  max concurrency  {}", settings.max_concurrency);
    println!("  pool size        {}", settings.pool_size);
    println!("  max batch items  {}", config.render.max_batch_items);
    println!("  render timeout   {}s", settings.render_timeout.as_secs());
    println!("  precreate        {}", settings.precreate);
    println!("  warm-up render   {}", config.render.warmup);

    println!("\nFonts ({}):", loader.fonts_dir().display());
    for (name, file) in &config.fonts.faces {
        let path = loader.font_path(file);
        let marker = if name == &config.fonts.default { " (default)" } else { "" };
        let state = if path.exists() { "ok" } else { "missing" };
        println!("  {name:<8} {state:<8} {}{marker}", path.display());
    }

    println!("\nCommands:");
    println!("  tategaki serve            Start the HTTP server");
    println!("  tategaki render -t ... -o out.png");
    println!("                            Render text to a PNG file");
}

async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tategaki=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let loader = asset_loader_from_env();
    let config = load_config(&loader);
    tracing::info!(
        fonts_dir = %loader.fonts_dir().display(),
        config = ?std::env::var("CONFIG_FILE").unwrap_or_else(|_| "embedded".to_string()),
        "Asset sources configured"
    );

    let bind_addr = config.server.bind_addr.clone();
    let warmup = config.render.warmup;
    let state = server::create_app_state(config, &loader).await?;

    if warmup {
        if let Err(e) = state.renderer.warmup().await {
            tracing::warn!(error = %e, "Warm-up render failed");
        }
    }

    let app = server::build_router(state.clone())
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Tategaki server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down render context");
    state.renderer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
