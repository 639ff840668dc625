use anyhow::Result;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::{prelude::*, Registry};

/// Output flavour of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Compact,
    Pretty,
    Json,
}

impl LogMode {
    pub fn parse(mode: &str) -> Self {
        match mode.to_ascii_lowercase().as_str() {
            "json" => LogMode::Json,
            "pretty" => LogMode::Pretty,
            _ => LogMode::Compact,
        }
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Logs go to stderr; stdout is kept for
/// command output such as issued tokens.
pub fn init(level: &str, mode: &str) -> Result<()> {
    let filter = build_filter(level);

    // Logging modes (boxed trait objects so types unify)
    let fmt_layer: Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync> = {
        match LogMode::parse(mode) {
            LogMode::Json => Box::new(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            ),
            LogMode::Pretty => Box::new(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            ),
            LogMode::Compact => Box::new(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            ),
        }
    };

    let subscriber = Registry::default().with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mode_parsing() {
        assert_eq!(LogMode::parse("json"), LogMode::Json);
        assert_eq!(LogMode::parse("PRETTY"), LogMode::Pretty);
        assert_eq!(LogMode::parse("debug"), LogMode::Compact);
    }

    #[test]
    fn invalid_filter_falls_back() {
        let filter = build_filter("edgeproxy=notalevel");
        assert_eq!(filter.to_string(), "info");
    }
}
