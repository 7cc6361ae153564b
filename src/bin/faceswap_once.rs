use clap::Parser;
use sdxl_faceswap::app::reporter::ConsoleReporter;
use sdxl_faceswap::utils::validation::{validate_non_empty_string, Validate};
use sdxl_faceswap::utils::{error::ErrorSeverity, logger};
use sdxl_faceswap::{build_orchestrator, CliArgs, Settings};

#[derive(Parser)]
#[command(name = "faceswap-once")]
#[command(about = "Run a single generate-then-swap request without starting the server")]
struct Args {
    /// Source portrait (local path or URL)
    #[arg(long)]
    portrait: String,

    /// Prompt for the generated image
    #[arg(long, default_value = "")]
    prompt: String,

    #[command(flatten)]
    common: CliArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.common.verbose, args.common.log_json);

    let settings = Settings::load(&args.common)?;
    settings.validate()?;
    validate_non_empty_string("portrait", &args.portrait)?;

    let orchestrator = build_orchestrator(&settings)?;

    match orchestrator
        .infer(&args.portrait, &args.prompt, &ConsoleReporter)
        .await
    {
        Ok(result) => {
            println!("✅ Face swap completed!");
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 2,
                ErrorSeverity::Medium => 3,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 4,
            };
            std::process::exit(exit_code);
        }
    }
}
