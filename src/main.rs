use clap::Parser;
use sdxl_faceswap::app::server::{self, AppState};
use sdxl_faceswap::utils::{logger, validation::Validate};
use sdxl_faceswap::{build_orchestrator, AdmissionQueue, CliArgs, Settings};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sdxl-faceswap")]
#[command(about = "Chains a text-to-image space and a face-swap space behind a small web UI")]
struct Args {
    #[command(flatten)]
    common: CliArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init(args.common.verbose, args.common.log_json);

    tracing::info!("🚀 Starting sdxl-faceswap server");

    let settings = match Settings::load(&args.common) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    if args.common.verbose {
        tracing::debug!("Settings: {}", serde_json::to_string(&settings)?);
    }

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let orchestrator = build_orchestrator(&settings)?;
    let queue = AdmissionQueue::new(settings.concurrency, settings.max_queue_size);
    let state = Arc::new(AppState::new(orchestrator, queue));

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    tracing::info!(
        "🌐 Listening on http://{} (queue size {}, concurrency {})",
        listener.local_addr()?,
        settings.max_queue_size,
        settings.concurrency
    );

    server::serve(listener, state).await?;
    Ok(())
}
