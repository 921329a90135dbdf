use clap::Parser;
use wearsearch_edge::utils::error::{EdgeError, ErrorSeverity};
use wearsearch_edge::utils::{logger, validation::Validate};
use wearsearch_edge::CliConfig;

fn report_failure(stage: &str, e: &EdgeError) -> i32 {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting wearsearch-edge");
    if cli.verbose {
        tracing::debug!("CLI arguments: {:?}", cli);
    }

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => std::process::exit(report_failure("Configuration loading", &e).max(1)),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        std::process::exit(report_failure("Configuration validation", &e).max(1));
    }

    if let Err(e) = wearsearch_edge::serve(&config).await {
        let exit_code = report_failure("Server", &e);
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}
