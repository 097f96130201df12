use crate::cli::args::{Cli, Command};
use raire_core::config::ServiceConfig;
use raire_core::errors::ServiceError;
use raire_core::storage::Store;
use std::path::{Path, PathBuf};

pub mod export;
pub mod generate;
pub mod progress;
pub mod summary;

pub mod exit_codes {
    pub const OK: i32 = 0;
    /// A service error was reported as `{"error_code", "message"}` on stdout.
    pub const SERVICE_ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli, config: ServiceConfig) -> anyhow::Result<i32> {
    let db = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    match cli.cmd {
        Command::Generate(args) => generate::run(args, db).await,
        Command::Export(args) => export::run(args, db, &config).await,
        Command::Summary(args) => summary::run(args, db).await,
        Command::Progress(args) => progress::run(args, db).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Run `f` against the store on a blocking worker; store calls are
/// synchronous sqlite work.
pub(crate) async fn with_store<T, F>(db: PathBuf, f: F) -> anyhow::Result<T>
where
    F: FnOnce(&Store) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        ensure_parent(&db)?;
        let store = Store::open(&db)?;
        store.init_schema()?;
        Ok(f(&store))
    })
    .await?
}

/// Print the error body and map to the service-error exit code.
pub(crate) fn report_service_error(err: &ServiceError) -> anyhow::Result<i32> {
    if err.code.is_user_actionable() {
        tracing::warn!(
            event = "raire.cli.service_error",
            code = %err.code,
            message = %err.message,
        );
    } else {
        tracing::error!(
            event = "raire.cli.service_error",
            code = %err.code,
            message = %err.message,
        );
    }
    println!("{}", serde_json::to_string(&err.to_response())?);
    Ok(exit_codes::SERVICE_ERROR)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
