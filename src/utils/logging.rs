use crate::config::LoggingSettings;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};
use std::env;
use std::fs;
use std::io;

/// Build the filter used when RUST_LOG is not set
pub fn default_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::new(level);

    // Our own crate is always chatty enough to follow the selection flow
    if let Ok(directive) = "actor_picker=debug".parse() {
        filter = filter.add_directive(directive);
    }
    // reqwest/hyper connection noise
    for quiet in ["hyper=warn", "hyper_util=warn", "reqwest=info", "rustls=warn"] {
        if let Ok(directive) = quiet.parse() {
            filter = filter.add_directive(directive);
        }
    }

    filter
}

/// Initialize logging: console output plus an optional session log file
pub fn init_logging(settings: &LoggingSettings) {
    let enable_backtrace = env::var("RUST_BACKTRACE").unwrap_or_else(|_| "0".to_string()) == "1";

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&settings.level));

    // Session-based file log, cleaned on startup
    let file_layer = settings.file.as_ref().and_then(|path| {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                eprintln!("Warning: Failed to remove existing {}: {}", path.display(), e);
            }
        }
        match fs::File::create(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false) // No ANSI codes in file
                    .boxed(),
            ),
            Err(e) => {
                eprintln!("Warning: Failed to create log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer()
            .with_target(true)
            .with_ansi(true)
        )
        .with(file_layer);

    // A second init (tests, embedding) is not fatal
    if subscriber.try_init().is_err() {
        return;
    }

    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("Panic occurred: {}", panic_info);

        if let Some(location) = panic_info.location() {
            tracing::error!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }

        if enable_backtrace {
            tracing::error!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
        }
    }));

    tracing::info!("Logging initialized with level: {}", settings.level);
    match &settings.file {
        Some(path) => tracing::info!("File logging enabled: {} (session-based, cleaned on startup)", path.display()),
        None => tracing::info!("File logging disabled"),
    }
    tracing::info!("Backtrace enabled: {}", enable_backtrace);
}

/// Log basic runtime information for bug reports
pub fn log_system_info() {
    tracing::info!("=== System Information ===");
    tracing::info!("OS: {}", std::env::consts::OS);
    tracing::info!("Architecture: {}", std::env::consts::ARCH);
    tracing::info!("{} version: {}", crate::APP_NAME, crate::VERSION);
    tracing::info!("========================");
}
