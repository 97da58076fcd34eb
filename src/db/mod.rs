pub mod directory;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tiberius::{Client, ColumnData, Config, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::models::{Table, Value};

pub type SqlClient = Client<Compat<TcpStream>>;

/// Connection parameters are fixed by the servicing environment: directory
/// interactive authentication over an encrypted channel with the server
/// certificate trusted. Only server and database vary.
pub fn connection_config(server: &str, database: &str) -> Result<Config> {
    let conn_str = format!(
        "Server={server};Database={database};\
         Authentication=ActiveDirectoryInteractive;\
         Encrypt=true;TrustServerCertificate=true;"
    );
    Config::from_ado_string(&conn_str).context("invalid connection parameters")
}

pub async fn connect(server: &str, database: &str) -> Result<SqlClient> {
    let config = connection_config(server, database)?;
    let addr = config.get_addr();
    tracing::info!(%addr, database, "connecting");

    let tcp = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("could not reach {addr}"))?;
    tcp.set_nodelay(true)?;

    Client::connect(config, tcp.compat_write())
        .await
        .with_context(|| format!("connection to {addr} failed"))
}

/// Runs one query and materializes its first result set. Column order and
/// row order come straight from the server.
pub async fn fetch_table(client: &mut SqlClient, sql: &str) -> Result<Table> {
    tracing::debug!(sql, "running query");

    let mut stream = client.simple_query(sql).await?;
    let columns: Vec<String> = stream
        .columns()
        .await?
        .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();
    let rows = stream.into_first_result().await?;

    let mut table = Table::new(columns);
    table.rows.reserve(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(table.columns.len());
        for data in row.into_iter() {
            values.push(value_from_sql(&data)?);
        }
        table.rows.push(values);
    }
    Ok(table)
}

fn value_from_sql(data: &ColumnData<'static>) -> Result<Value> {
    let value = match data {
        ColumnData::Bit(b) => b.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::U8(v) => v.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::Int).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|v| Value::Float(v as f64)).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(Value::Float).unwrap_or(Value::Null),
        ColumnData::Numeric(n) => match n {
            Some(n) => Value::Float(n.value() as f64 / 10f64.powi(n.scale() as i32)),
            None => Value::Null,
        },
        ColumnData::String(s) => s
            .as_ref()
            .map(|s| Value::Text(s.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Guid(g) => g
            .map(|g| Value::Text(g.to_string()))
            .unwrap_or(Value::Null),
        ColumnData::Date(_) => NaiveDate::from_sql(data)?
            .map(Value::Date)
            .unwrap_or(Value::Null),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?
                .map(Value::DateTime)
                .unwrap_or(Value::Null)
        }
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(data)?
            .map(|dt| Value::DateTime(dt.naive_utc()))
            .unwrap_or(Value::Null),
        ColumnData::Time(_) => NaiveTime::from_sql(data)?
            .map(|t| Value::Text(t.to_string()))
            .unwrap_or(Value::Null),
        // binary/xml payloads carry nothing the sheets use
        _ => Value::Null,
    };
    Ok(value)
}
