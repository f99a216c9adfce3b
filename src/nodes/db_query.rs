use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sqlx::{
    Column, Row, TypeInfo,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    Result,
    common::Vars,
    console::Console,
    node::{Difficulty, FieldKind, FieldSpec, NodeConfig, NodeContract, PortKind, PortSpec, PortValue, RunOutput, params},
    server::ServerContext,
};

const POSTGRES_URL: &str = "POSTGRES_URL";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs one SQL query against the workflow's Postgres database.
///
/// The connection string comes exclusively from the per-workflow
/// environment map; when it is absent the node short-circuits before any
/// connection attempt. Defines no tool.
pub struct DbQueryNode {
    config: NodeConfig,
}

impl DbQueryNode {
    pub fn new() -> Self {
        Self {
            config: NodeConfig {
                title: "Postgres Query".to_string(),
                category: "database".to_string(),
                node_type: "db_query".to_string(),
                description: "Run a SQL query and return the rows as JSON.".to_string(),
                credit: 1.0,
                inputs: vec![PortSpec::new("In", PortKind::Flow, "Trigger"), PortSpec::new("Query", PortKind::Text, "SQL query to run")],
                outputs: vec![
                    PortSpec::new("Out", PortKind::Flow, "Next node"),
                    PortSpec::new("rows", PortKind::Json, "Result rows"),
                    PortSpec::new("rowCount", PortKind::Number, "Number of rows returned"),
                ],
                fields: vec![FieldSpec::new("Query", FieldKind::TextArea, "SQL query to run", json!(""))],
                difficulty: Difficulty::Medium,
                tags: vec!["database".to_string(), "postgres".to_string()],
            },
        }
    }

    /// Uniform failure shape: `rows` null, `rowCount` 0, credit 0.
    fn declined(&self) -> RunOutput {
        let mut output = RunOutput::declined(&self.config);
        output.values.set("rowCount", 0);
        output
    }
}

impl Default for DbQueryNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeContract for DbQueryNode {
    fn config(&self) -> &NodeConfig {
        &self.config
    }

    async fn run(
        &self,
        inputs: &[PortValue],
        contents: &[PortValue],
        console: &dyn Console,
        server: &ServerContext,
    ) -> Option<RunOutput> {
        let Some(query) = params::resolve_text("Query", inputs, contents) else {
            console.error("Postgres Query: no query provided");
            return Some(self.declined());
        };

        let Some(database_url) = server.env(POSTGRES_URL) else {
            console.error(&format!("Postgres Query: {POSTGRES_URL} not configured for this workflow"));
            return Some(self.declined());
        };

        match fetch_rows(database_url, &query).await {
            Ok(rows) => {
                let row_count = rows.len();
                console.success(&format!("Postgres Query: {row_count} row(s)"));

                let mut values = Vars::new();
                values.set("rows", Value::Array(rows));
                values.set("rowCount", row_count);
                Some(RunOutput::success(values, self.config.credit).with_stat("row_count", row_count))
            }
            Err(error) => {
                console.error(&format!("Postgres Query: {error}"));
                Some(self.declined())
            }
        }
    }
}

async fn fetch_rows(
    database_url: &str,
    query: &str,
) -> Result<Vec<Value>> {
    let pool = PgPoolOptions::new().max_connections(1).acquire_timeout(CONNECT_TIMEOUT).connect(database_url).await?;

    let result = sqlx::query(query).fetch_all(&pool).await;
    pool.close().await;

    let rows = result?;
    Ok(rows.iter().map(row_to_json).collect())
}

/// Convert one row to a JSON object by column type. Types without a
/// JSON mapping surface as null rather than failing the whole query.
fn row_to_json(row: &PgRow) -> Value {
    let mut object = Map::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "INT2" => row.try_get::<Option<i16>, _>(idx).ok().flatten().map(|v| json!(v)),
            "INT4" => row.try_get::<Option<i32>, _>(idx).ok().flatten().map(|v| json!(v)),
            "INT8" => row.try_get::<Option<i64>, _>(idx).ok().flatten().map(|v| json!(v)),
            "FLOAT4" => row.try_get::<Option<f32>, _>(idx).ok().flatten().map(|v| json!(v)),
            "FLOAT8" => row.try_get::<Option<f64>, _>(idx).ok().flatten().map(|v| json!(v)),
            "BOOL" => row.try_get::<Option<bool>, _>(idx).ok().flatten().map(|v| json!(v)),
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row.try_get::<Option<String>, _>(idx).ok().flatten().map(|v| json!(v)),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx).ok().flatten(),
            "TIMESTAMPTZ" => row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx).ok().flatten().map(|v| json!(v.to_rfc3339())),
            "TIMESTAMP" => row.try_get::<Option<chrono::NaiveDateTime>, _>(idx).ok().flatten().map(|v| json!(v.to_string())),
            "DATE" => row.try_get::<Option<chrono::NaiveDate>, _>(idx).ok().flatten().map(|v| json!(v.to_string())),
            _ => None,
        };

        object.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::RecordingConsole;

    #[tokio::test]
    async fn test_missing_connection_string_short_circuits() {
        let node = DbQueryNode::new();
        let console = RecordingConsole::new();
        // No POSTGRES_URL; the node must decline before any connection
        // attempt, so this test needs no database.
        let server = ServerContext::builder().build();
        let contents = vec![PortValue::new("Query", "select 1")];

        let output = node.run(&[], &contents, &console, &server).await.unwrap();

        assert_eq!(output.values.get("rows"), Some(&json!(null)));
        assert_eq!(output.values.get("rowCount"), Some(&json!(0)));
        assert_eq!(output.credit, 0.0);
        assert!(output.tool.is_none());
        assert_eq!(console.messages("error").len(), 1);
    }

    #[tokio::test]
    async fn test_missing_query_short_circuits_first() {
        let node = DbQueryNode::new();
        let console = RecordingConsole::new();
        let server = ServerContext::builder().env(POSTGRES_URL, "postgresql://localhost:1/none").build();

        let output = node.run(&[], &[], &console, &server).await.unwrap();

        assert_eq!(output.values.get("rows"), Some(&json!(null)));
        assert_eq!(output.values.get("rowCount"), Some(&json!(0)));
        assert_eq!(output.credit, 0.0);
    }

    #[test]
    fn test_estimate_is_the_configured_credit() {
        let node = DbQueryNode::new();
        let server = ServerContext::builder().build();
        assert_eq!(node.estimate_usage(&[], &[], &server), 1.0);
    }
}
