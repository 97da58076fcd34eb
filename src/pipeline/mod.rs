pub mod clean;
pub mod sheets;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::db::{self, SqlClient};
use crate::export::excel;
use crate::mappings;
use crate::models::Table;

use self::sheets::{SheetDef, SheetSource, OMITTED_COLUMNS, SHEETS};

/// Help-site requests get one attempt with a short deadline; a slow or
/// dead page only costs the notes, never the export.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-visible progress seam; the UI implements this over its update
/// channel.
pub trait Reporter: Send + Sync {
    fn log(&self, message: String, level: LogLevel);
    fn status(&self, message: String);
}

#[derive(Debug, Clone)]
pub struct ExportParams {
    pub server: String,
    pub database: String,
    pub output_folder: PathBuf,
}

/// Runs the whole export: one connection, then every sheet in order
/// (fetch, clean, post-process, scrape definitions, write, annotate).
/// The first failure aborts the remaining sheets; files already written
/// stay on disk.
pub async fn run_export(params: &ExportParams, reporter: &dyn Reporter) -> Result<()> {
    reporter.status("Connecting to target database…".to_string());
    let mut client = db::connect(&params.server, &params.database).await?;

    std::fs::create_dir_all(&params.output_folder).with_context(|| {
        format!(
            "could not create output folder {}",
            params.output_folder.display()
        )
    })?;

    let http = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("could not build HTTP client")?;

    for def in SHEETS {
        reporter.status(format!("Exporting {}…", def.label));

        let table = build_sheet_table(&mut client, def)
            .await
            .with_context(|| format!("query failed for {}", def.label))?;
        let defs = mappings::fetch_field_definitions(&http, def.mapping_url).await;

        let path = params.output_folder.join(format!("{}.xlsx", def.label));
        excel::write_sheet(def.label, &table, &defs, &path)?;

        tracing::info!(
            sheet = def.label,
            rows = table.row_count(),
            notes = defs.len(),
            "sheet written"
        );
        reporter.log(format!("✓ {}", def.label), LogLevel::Success);
    }

    Ok(())
}

async fn build_sheet_table(client: &mut SqlClient, def: &SheetDef) -> Result<Table> {
    let cleaned = match &def.source {
        SheetSource::Query(sql) => {
            clean::clean(&db::fetch_table(client, sql).await?, OMITTED_COLUMNS)
        }
        SheetSource::PropertiesInsurance => {
            let properties = db::fetch_table(client, sheets::PROPERTIES_QUERY).await?;
            let insurance = db::fetch_table(client, sheets::INSURANCE_QUERY).await?;
            sheets::merge_properties_insurance(&properties, &insurance)?
        }
    };

    Ok(match def.post {
        Some(post) => post(cleaned),
        None => cleaned,
    })
}
