use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CRATE_TARGET: &str = "rubric_reports";

/// Initialize structured logging from the CLI flags.
///
/// `RUBRIC_REPORTS_LOG` (or `RUST_LOG`) overrides the level chosen on the command line.
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = match (verbose, log_level) {
        (_, Some(level)) => level.to_string(),
        (true, None) => format!("{CRATE_TARGET}=debug"),
        (false, None) => format!("{CRATE_TARGET}=info"),
    };

    let filter = EnvFilter::try_from_env("RUBRIC_REPORTS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(qualify(&level)));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

// A bare level like `debug` only applies to this crate.
fn qualify(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("{CRATE_TARGET}={level}")
    }
}
