use anyhow::Result;

/// The company directory lives in a fixed database, separate from the
/// per-client servicing databases the export targets.
pub const DIRECTORY_SERVER: &str = "10.1.7.5";
pub const DIRECTORY_DATABASE: &str = "AbsWebSys";

const SEARCH_QUERY: &str = "SELECT Description, DatabaseName, Server \
     FROM AbsWebSys.dbo.CompanyDatabase \
     WHERE DatabaseName LIKE @P1 \
     ORDER BY Description";

#[derive(Debug, Clone)]
pub struct DatabaseEntry {
    pub description: String,
    pub database_name: String,
    pub server: String,
}

/// Looks up servicing databases whose name contains `term`, for the form's
/// search helper.
pub async fn search_databases(term: &str) -> Result<Vec<DatabaseEntry>> {
    let mut client = super::connect(DIRECTORY_SERVER, DIRECTORY_DATABASE).await?;

    let pattern = format!("%{term}%");
    let stream = client.query(SEARCH_QUERY, &[&pattern]).await?;
    let rows = stream.into_first_result().await?;

    tracing::info!(term, hits = rows.len(), "directory search");

    rows.into_iter()
        .map(|row| {
            Ok(DatabaseEntry {
                description: row.try_get::<&str, _>(0)?.unwrap_or_default().to_string(),
                database_name: row.try_get::<&str, _>(1)?.unwrap_or_default().to_string(),
                server: row.try_get::<&str, _>(2)?.unwrap_or_default().to_string(),
            })
        })
        .collect()
}
