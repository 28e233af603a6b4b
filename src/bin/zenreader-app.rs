use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::response::Html;
use clap::Parser;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use zenreader::app::routes::api_router;
use zenreader::app::state::{AppState, progress_path_from_env};
use zenreader::library::open_source;
use zenreader::progress::{JsonFileStore, KeyValueStore, ProgressStore};
use zenreader::reader::PreferenceStore;
use zenreader::session::SystemClock;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Compiled library directory, served under `/assets/subtitles`.
    #[arg(long, default_value = "public/assets/subtitles")]
    library: PathBuf,

    /// Progress store file (overridden by `ZENREADER_PROGRESS`).
    #[arg(long, default_value = "zenreader-progress.json")]
    progress: String,

    /// Fail requests instead of serving the built-in demo library.
    #[arg(long)]
    strict: bool,

    /// Static web assets directory (serve if exists).
    #[arg(long, default_value = "web/dist")]
    web_dir: PathBuf,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    zenreader::logging::init(zenreader::logging::APP_DEFAULT_FILTER)?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting zenreader-app");

    let progress_path = progress_path_from_env(&args.progress);
    tracing::info!(progress = %progress_path, "using progress store");

    let library = open_source(&args.library.to_string_lossy(), args.strict)?;
    let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(progress_path));
    let state = AppState::new(
        library,
        ProgressStore::new(kv.clone()),
        PreferenceStore::new(kv),
        Arc::new(SystemClock),
    );

    let mut app = api_router(state)
        .nest_service("/assets/subtitles", ServeDir::new(&args.library))
        .layer(TraceLayer::new_for_http());

    let web_index = args.web_dir.join("index.html");
    if web_index.exists() {
        let static_files =
            ServeDir::new(&args.web_dir).not_found_service(ServeFile::new(web_index));
        app = app.fallback_service(static_files);
    } else {
        app = app.fallback(|| async {
            Html(
                r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>zenreader</title></head>
  <body>
    <h1>zenreader</h1>
    <p>web assets not found. Build the reader UI into <code>web/dist</code>; the JSON API is under <code>/api</code>.</p>
  </body>
</html>
"#,
            )
        });
    }

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
