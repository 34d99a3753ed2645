pub mod build_info;
pub mod dates;

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Once,
};

use dirs::home_dir;
use uuid::Uuid;

const DEFAULT_DIR_NAME: &str = ".customs_core";
const RECORDS_DIR: &str = "records";
const CONFIG_DIR: &str = "config";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("customs_core=info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Returns the application data directory, defaulting to `~/.customs_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("CUSTOMS_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding saved calculation and simulation records.
pub fn records_dir_in(base: &Path) -> PathBuf {
    base.join(RECORDS_DIR)
}

pub fn config_dir_in(base: &Path) -> PathBuf {
    base.join(CONFIG_DIR)
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Short uppercase identifier used for saved records and cost items.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}
