use std::sync::Arc;

use anyhow::Context;

use course_advisor::channels::CliChannel;
use course_advisor::chat::HttpChatService;
use course_advisor::config::AdvisorConfig;
use course_advisor::dialogue::PredictionController;
use course_advisor::recommend::HttpRecommendationService;
use course_advisor::session::run_session;
use course_advisor::transcript::Transcript;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();

    let config = AdvisorConfig::from_env().context("invalid COURSE_ADVISOR_* configuration")?;

    eprintln!("🎓 Course Advisor v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.base_url);
    eprintln!("   Predict: {}", config.predict_path);
    eprintln!(
        "   Chat: {}",
        if config.chat_enabled {
            format!("{} (history: {})", config.chat_path, config.history_path)
        } else {
            "disabled".to_string()
        }
    );
    eprintln!("   Timeout: {}s", config.request_timeout.as_secs());
    eprintln!("   Ask for a course recommendation to start. /reset to clear, /quit to exit.\n");

    let service = Arc::new(
        HttpRecommendationService::from_config(&config)
            .context("failed to set up recommendation client")?,
    );
    let channel = Arc::new(CliChannel::new());

    let mut controller = PredictionController::new(
        service,
        channel.clone(),
        Transcript::with_greeting(&config.greeting),
        config.request_timeout,
    );
    if config.chat_enabled {
        let chat = HttpChatService::from_config(&config).context("failed to set up chat client")?;
        controller = controller.with_chat_service(Arc::new(chat));
    }
    let controller = Arc::new(controller);

    println!("{}\n", config.greeting);
    if config.chat_enabled {
        // Failure is already logged; start with just the greeting.
        let _ = controller.load_history().await;
    }

    run_session(channel, controller).await?;
    Ok(())
}

/// Log to stderr, or to a daily rolling file under `COURSE_ADVISOR_LOG_DIR`
/// so log lines don't interleave with the REPL.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match std::env::var("COURSE_ADVISOR_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "course-advisor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
