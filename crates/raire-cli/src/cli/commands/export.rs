use super::{exit_codes, report_service_error, with_store};
use crate::cli::args::{ExportArgs, ExportFormat};
use raire_core::config::ServiceConfig;
use raire_core::errors::ServiceError;
use raire_core::export::{export_csv, export_json};
use raire_core::model::ExportRequest;
use std::path::PathBuf;

pub async fn run(args: ExportArgs, db: PathBuf, config: &ServiceConfig) -> anyhow::Result<i32> {
    let request = ExportRequest {
        contest_name: args.contest,
        risk_limit: args.risk_limit.unwrap_or(config.default_risk_limit),
        candidates: args.candidates,
    };
    let format = args.format;

    let rendered = with_store(db, move |store| match format {
        ExportFormat::Csv => export_csv(store, &request),
        ExportFormat::Json => export_json(store, &request).and_then(|export| {
            serde_json::to_string_pretty(&export)
                .map(|body| body + "\n")
                .map_err(|e| ServiceError::internal(format!("failed to encode export: {e}")))
        }),
    })
    .await?;

    let body = match rendered {
        Ok(body) => body,
        Err(e) => return report_service_error(&e),
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, body)?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{}", body),
    }
    Ok(exit_codes::OK)
}
