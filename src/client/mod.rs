//! Nebula Client
//!
//! The public surface over a [`Channel`]:
//!
//! - **list_tables / table_state**: inspect the cluster
//! - **load_table / unload_table**: manage loaded tables
//! - **query**: translate a [`QueryDescription`] and run it
//!
//! Every call is one independent exchange on the shared channel. Calls may
//! be issued concurrently from a cloned client; nothing is queued,
//! deduplicated or retried here.
//!
//! # Example
//!
//! ```rust,no_run
//! use nebula_client::client::NebulaClient;
//! use nebula_client::config::ServiceConfig;
//! use nebula_client::query::QueryDescription;
//! use nebula_client::wire::Rollup;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NebulaClient::connect(&ServiceConfig::default())?;
//!
//!     let query = QueryDescription::builder("nebula.test")
//!         .last_days(7)
//!         .key("country")
//!         .metric("age", Rollup::Avg)
//!         .limit(10)
//!         .build();
//!
//!     let response = client.query("someone@example.com", &query).await?;
//!     println!("{} rows in {} ms", response.rows_returned, response.duration_ms);
//!     Ok(())
//! }
//! ```

mod channel;
mod error;
mod http;
mod response;

pub use channel::{codes, Channel, Identity, ServiceError, AUTH_KEY, USER_KEY};
pub use error::{ClientError, ClientResult};
pub use http::HttpChannel;
pub use response::{reshape, SimplifiedResponse, TableState};

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::log::{Logger, TracingLogger};
use crate::query::{translate, QueryDescription, TimeValue};
use crate::wire::{ListTables, LoadError, LoadRequest, LoadResponse, TableStateRequest};
use response::NULL_RESPONSE;

/// Maximum number of tables requested by [`NebulaClient::list_tables`]
const LIST_TABLES_LIMIT: u32 = 100;

/// Client for the Nebula query service
#[derive(Clone)]
pub struct NebulaClient {
    channel: Arc<dyn Channel>,
    logger: Arc<dyn Logger>,
}

impl NebulaClient {
    /// Create a client over `channel`, logging through `tracing`
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self {
            channel,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Create a client over an [`HttpChannel`] for the configured service
    pub fn connect(config: &ServiceConfig) -> ClientResult<Self> {
        Ok(Self::new(Arc::new(HttpChannel::new(config)?)))
    }

    /// Replace the logger
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// List all tables visible to `user`
    pub async fn list_tables(&self, user: &str) -> ClientResult<Vec<String>> {
        let request = ListTables {
            limit: LIST_TABLES_LIMIT,
        };

        let reply = self
            .channel
            .tables(request, &Identity::user(user))
            .await?
            .ok_or_else(null_response)?;

        Ok(reply.table)
    }

    /// Unload `table`, returning whether the service reported success
    pub async fn unload_table(&self, user: &str, table: &str) -> ClientResult<bool> {
        let reply = self
            .channel
            .load(LoadRequest::unload(table), &Identity::user(user))
            .await?
            .ok_or_else(null_response)?;

        self.logger
            .info(&format!("Table {} unloaded successfully.", table));

        Ok(reply.error == LoadError::Success)
    }

    /// Fetch the loaded state of `table`
    pub async fn table_state(&self, user: &str, table: &str) -> ClientResult<TableState> {
        let request = TableStateRequest {
            table: table.to_string(),
        };

        let reply = self
            .channel
            .state(request, &Identity::user(user))
            .await?
            .ok_or_else(null_response)?;

        Ok(TableState::from_reply(table, reply))
    }

    /// Send a load request as-is and return the service's reply
    pub async fn load_table(&self, user: &str, request: LoadRequest) -> ClientResult<LoadResponse> {
        self.channel
            .load(request, &Identity::user(user))
            .await?
            .ok_or_else(null_response)
    }

    /// Translate and run a query
    pub async fn query(
        &self,
        user: &str,
        query: &QueryDescription,
    ) -> ClientResult<SimplifiedResponse> {
        if query.table.is_empty() {
            self.logger.error("Table name is needed.");
        }
        let request = translate(query)?;

        self.logger.info(&format!(
            "Query nebula: table={}, start={}, end={}.",
            query.table,
            raw_time(query.start.as_ref()),
            raw_time(query.end.as_ref()),
        ));

        let reply = self.channel.query(request, &Identity::user(user)).await?;
        reshape(reply)
    }
}

fn null_response() -> ClientError {
    ClientError::Protocol(NULL_RESPONSE.to_string())
}

fn raw_time(value: Option<&TimeValue>) -> String {
    value.map(TimeValue::raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterNode, QueryError};
    use crate::wire::{
        Operation, QueryRequest, QueryResponse, Rollup, Statistics, TableList,
        TableStateResponse,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory channel that records calls and replies from canned values
    #[derive(Default)]
    struct MockChannel {
        calls: Mutex<Vec<(&'static str, Identity)>>,
        queries: Mutex<Vec<QueryRequest>>,
        loads: Mutex<Vec<LoadRequest>>,
        error: Option<ServiceError>,
        tables: Option<TableList>,
        state: Option<TableStateResponse>,
        load: Option<LoadResponse>,
        query: Option<QueryResponse>,
    }

    impl MockChannel {
        fn record(&self, method: &'static str, identity: &Identity) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push((method, identity.clone()));
            match &self.error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Channel for MockChannel {
        async fn tables(
            &self,
            _request: ListTables,
            identity: &Identity,
        ) -> Result<Option<TableList>, ServiceError> {
            self.record("tables", identity)?;
            Ok(self.tables.clone())
        }

        async fn state(
            &self,
            _request: TableStateRequest,
            identity: &Identity,
        ) -> Result<Option<TableStateResponse>, ServiceError> {
            self.record("state", identity)?;
            Ok(self.state.clone())
        }

        async fn load(
            &self,
            request: LoadRequest,
            identity: &Identity,
        ) -> Result<Option<LoadResponse>, ServiceError> {
            self.record("load", identity)?;
            self.loads.lock().unwrap().push(request);
            Ok(self.load.clone())
        }

        async fn query(
            &self,
            request: QueryRequest,
            identity: &Identity,
        ) -> Result<Option<QueryResponse>, ServiceError> {
            self.record("query", identity)?;
            self.queries.lock().unwrap().push(request);
            Ok(self.query.clone())
        }
    }

    /// Logger that keeps every message
    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingLogger {
        fn lines(&self) -> Vec<(&'static str, String)> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Logger for RecordingLogger {
        fn info(&self, message: &str) {
            self.lines.lock().unwrap().push(("info", message.to_string()));
        }

        fn warn(&self, message: &str) {
            self.lines.lock().unwrap().push(("warn", message.to_string()));
        }

        fn error(&self, message: &str) {
            self.lines.lock().unwrap().push(("error", message.to_string()));
        }
    }

    fn echo_reply() -> QueryResponse {
        QueryResponse {
            stats: Some(Statistics::default()),
            data: Vec::new(),
        }
    }

    fn client_with(channel: Arc<MockChannel>) -> (NebulaClient, Arc<RecordingLogger>) {
        let logger = Arc::new(RecordingLogger::default());
        let client = NebulaClient::new(channel).with_logger(logger.clone());
        (client, logger)
    }

    fn sample_query() -> QueryDescription {
        QueryDescription::builder("nebula.test")
            .start("-7d")
            .end("now")
            .key("country")
            .metric("age", Rollup::Avg)
            .filter(FilterNode::and(vec![FilterNode::leaf(
                "gender",
                Operation::Eq,
                vec!["F".into()],
            )]))
            .limit(10)
            .build()
    }

    #[tokio::test]
    async fn test_query_round_trip() {
        let channel = Arc::new(MockChannel {
            query: Some(echo_reply()),
            ..Default::default()
        });
        let (client, logger) = client_with(channel.clone());

        let response = client.query("someone@example.com", &sample_query()).await.unwrap();
        assert_eq!(response.error, 0);
        assert!(response.data.is_empty());

        let queries = channel.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].table, "nebula.test");
        assert_eq!(queries[0].top, 10);
        assert_eq!(queries[0].filter_a.as_ref().map(|f| f.expression.len()), Some(1));

        assert_eq!(
            logger.lines(),
            vec![("info", "Query nebula: table=nebula.test, start=-7d, end=now.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_query_passes_identity() {
        let channel = Arc::new(MockChannel {
            query: Some(echo_reply()),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel.clone());

        client.query("someone@example.com", &sample_query()).await.unwrap();
        client.query("", &sample_query()).await.unwrap();

        let calls = channel.calls.lock().unwrap();
        assert_eq!(calls[0].1, Identity::user("someone@example.com"));
        assert_eq!(calls[1].1, Identity::anonymous());
    }

    #[tokio::test]
    async fn test_query_without_table_is_rejected_before_sending() {
        let channel = Arc::new(MockChannel {
            query: Some(echo_reply()),
            ..Default::default()
        });
        let (client, logger) = client_with(channel.clone());

        let query = QueryDescription::builder("").metric("age", Rollup::Avg).build();
        let err = client.query("someone@example.com", &query).await.unwrap_err();

        assert_eq!(err, ClientError::Validation(QueryError::MissingTable));
        assert_eq!(err.to_string(), "Table is missing.");
        assert_eq!(channel.call_count(), 0);
        assert_eq!(logger.lines(), vec![("error", "Table name is needed.".to_string())]);
    }

    #[tokio::test]
    async fn test_query_missing_reply() {
        let channel = Arc::new(MockChannel::default());
        let (client, _logger) = client_with(channel);

        let err = client.query("", &sample_query()).await.unwrap_err();
        assert_eq!(err, ClientError::Protocol("[nebula]: null/undefined response".to_string()));
    }

    #[tokio::test]
    async fn test_query_missing_stats() {
        let channel = Arc::new(MockChannel {
            query: Some(QueryResponse {
                stats: None,
                data: vec![1],
            }),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel);

        let err = client.query("", &sample_query()).await.unwrap_err();
        assert_eq!(err, ClientError::Protocol("[nebula]: invalid query result stats".to_string()));
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let channel = Arc::new(MockChannel {
            error: Some(ServiceError::new(codes::UNAVAILABLE, "connection refused")),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel.clone());

        let err = client.query("", &sample_query()).await.unwrap_err();
        assert_eq!(err.to_string(), "[14]: connection refused");
        assert_eq!(channel.call_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_queries_are_independent() {
        let channel = Arc::new(MockChannel {
            query: Some(echo_reply()),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel.clone());
        let query = sample_query();

        let first = client.clone();
        let second = client.clone();
        let (a, b) = tokio::join!(first.query("a", &query), second.query("a", &query));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(channel.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_from_spawned_tasks() {
        let channel = Arc::new(MockChannel {
            query: Some(echo_reply()),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel.clone());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move {
                    let query = QueryDescription::builder(format!("t{}", i)).build();
                    client.query("", &query).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(channel.call_count(), 4);
    }

    #[tokio::test]
    async fn test_list_tables() {
        let channel = Arc::new(MockChannel {
            tables: Some(TableList {
                table: vec!["nebula.test".to_string(), "k.pinterest-code".to_string()],
            }),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel.clone());

        let tables = client.list_tables("someone@example.com").await.unwrap();
        assert_eq!(tables, vec!["nebula.test", "k.pinterest-code"]);
        assert_eq!(channel.calls.lock().unwrap()[0].0, "tables");
    }

    #[tokio::test]
    async fn test_list_tables_missing_reply() {
        let (client, _logger) = client_with(Arc::new(MockChannel::default()));
        let err = client.list_tables("").await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_unload_table() {
        let channel = Arc::new(MockChannel {
            load: Some(LoadResponse::default()),
            ..Default::default()
        });
        let (client, logger) = client_with(channel.clone());

        assert!(client.unload_table("", "nebula.test").await.unwrap());

        let loads = channel.loads.lock().unwrap();
        assert_eq!(loads[0], LoadRequest::unload("nebula.test"));
        assert_eq!(
            logger.lines(),
            vec![("info", "Table nebula.test unloaded successfully.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unload_table_reports_failure() {
        let channel = Arc::new(MockChannel {
            load: Some(LoadResponse {
                error: LoadError::NotSupported,
                ..Default::default()
            }),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel);

        assert!(!client.unload_table("", "nebula.test").await.unwrap());
    }

    #[tokio::test]
    async fn test_table_state() {
        let channel = Arc::new(MockChannel {
            state: Some(TableStateResponse {
                block_count: 1,
                row_count: 9,
                mem_size: 171,
                dimension: vec!["gender".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel);

        let state = client.table_state("", "nebula.test").await.unwrap();
        assert_eq!(state.table_name, "nebula.test");
        assert_eq!(state.row_count, 9);
        assert_eq!(state.column_keys, vec!["gender"]);
    }

    #[tokio::test]
    async fn test_load_table_returns_reply() {
        let channel = Arc::new(MockChannel {
            load: Some(LoadResponse {
                error: LoadError::Success,
                table: "demand.sales".to_string(),
                load_time_ms: 42,
            }),
            ..Default::default()
        });
        let (client, _logger) = client_with(channel.clone());

        let request = LoadRequest {
            load_type: crate::wire::LoadType::Demand,
            table: "sales".to_string(),
            json: r#"{"csv": "s3://bucket/sales.csv"}"#.to_string(),
            ttl: 3600,
        };
        let reply = client.load_table("", request.clone()).await.unwrap();

        assert_eq!(reply.table, "demand.sales");
        assert_eq!(reply.load_time_ms, 42);
        assert_eq!(channel.loads.lock().unwrap()[0], request);
    }
}
