use std::path::Path;

use crate::config::Settings;
use crate::error::BootstrapError;

/// Everything the entry points need once initialization has succeeded.
/// Nothing can be ingested or rendered without one.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub settings: Settings,
}

/// One-time initialization: load and validate settings, then install the
/// logger. Any failure is fatal for the session.
pub fn initialize(config: Option<&Path>) -> Result<Runtime, BootstrapError> {
    let settings = Settings::load(config)?;
    setup_logging(&settings.log_level)?;

    log::info!("CBM viewer v{} starting", env!("CARGO_PKG_VERSION"));
    match config {
        Some(path) => log::info!("Using configuration from {}", path.display()),
        None => log::debug!("Using default configuration"),
    }
    log::debug!("Chart candidates: {:?}", settings.candidate_fields);

    Ok(Runtime { settings })
}

/// Install `env_logger` with `level` as the default filter. `RUST_LOG`
/// overrides it.
fn setup_logging(level: &str) -> Result<(), BootstrapError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn bad_config_stops_initialization() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "candidate_fields": [] }}"#).unwrap();
        let err = initialize(Some(file.path())).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidConfig(_)));
    }

    #[test]
    fn second_logger_install_is_an_error() {
        // The first call may or may not win depending on test order; the
        // second one in this process never can.
        let _ = setup_logging("warn");
        assert!(matches!(setup_logging("warn"), Err(BootstrapError::Logger(_))));
    }
}
