//! MCP server implementation for timewarp-mcp
//!
//! This module provides the MCP server that exposes history generation and
//! reset as tool calls. Every result carries the JSON body of the matching
//! HTTP-style response, and failures also carry its status code.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, Utc};
use rust_mcp_sdk::McpServer;
use rust_mcp_sdk::mcp_server::ServerHandler;
use rust_mcp_sdk::schema::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams, RpcError,
    TextContent, Tool, ToolInputSchema, schema_utils::CallToolError,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use timewarp_git::HistoryDriver;
use tokio::sync::Mutex;
use tracing::debug;

use crate::handlers::{HandlerError, handle_generate_history, handle_reset_history};

/// Tool name for history generation
pub const GENERATE_TOOL: &str = "generate_history";

/// Tool name for history reset
pub const RESET_TOOL: &str = "reset_history";

/// Convert a JSON object into the properties format expected by ToolInputSchema.
///
/// ToolInputSchema expects `HashMap<String, Map<String, Value>>` for properties,
/// where each key maps to a JSON object describing that property's schema.
fn make_properties(json_obj: Value) -> HashMap<String, Map<String, Value>> {
    let mut properties = HashMap::new();
    if let Value::Object(obj) = json_obj {
        for (key, value) in obj {
            if let Value::Object(inner) = value {
                properties.insert(key, inner);
            }
        }
    }
    properties
}

/// Serialize a handler response into its JSON body
fn to_body<T: Serialize>(result: Result<T, HandlerError>) -> Result<Value, HandlerError> {
    result.and_then(|response| serde_json::to_value(response).map_err(HandlerError::from))
}

/// Wrap a JSON body as a tool result
///
/// Errors become `isError` results whose body is `{error, status}`.
fn tool_result(result: Result<Value, HandlerError>) -> CallToolResult {
    let (body, is_error) = match result {
        Ok(body) => (body, false),
        Err(err) => {
            let mut body = err.body();
            body["status"] = json!(err.status_code());
            (body, true)
        }
    };

    let mut tool_result =
        CallToolResult::text_content(vec![TextContent::new(body.to_string(), None, None)]);
    if let Value::Object(map) = body {
        tool_result.structured_content = Some(map);
    }
    if is_error {
        tool_result.is_error = Some(true);
    }
    tool_result
}

/// The main timewarp MCP server handler
///
/// The driver is wrapped in a Mutex, so tool calls against the repository
/// run one at a time.
pub struct TimewarpServer<D> {
    /// Repository driver shared by all tool calls
    driver: Arc<Mutex<D>>,
    /// Generate in UTC rather than the local zone
    utc: bool,
}

impl<D: HistoryDriver> TimewarpServer<D> {
    /// Create a new server over the given driver
    ///
    /// # Arguments
    ///
    /// * `driver` - Repository driver for the workspace
    /// * `utc` - Pick event times in UTC instead of the local zone
    #[must_use]
    pub fn new(driver: D, utc: bool) -> Self {
        Self {
            driver: Arc::new(Mutex::new(driver)),
            utc,
        }
    }

    /// Get access to the driver (async, requires await)
    pub async fn driver(&self) -> tokio::sync::MutexGuard<'_, D> {
        self.driver.lock().await
    }

    /// Whether event times are picked in UTC
    #[must_use]
    pub fn is_utc(&self) -> bool {
        self.utc
    }

    /// Run a tool by name
    ///
    /// # Errors
    ///
    /// Returns an unknown-tool error for names other than the two tools.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, CallToolError> {
        let mut driver = self.driver.lock().await;
        let body = match name {
            GENERATE_TOOL => self.generate(&mut *driver, arguments),
            RESET_TOOL => to_body(handle_reset_history(&mut *driver)),
            _ => return Err(CallToolError::unknown_tool(name)),
        };
        Ok(tool_result(body))
    }

    fn generate(
        &self,
        driver: &mut D,
        arguments: Option<Map<String, Value>>,
    ) -> Result<Value, HandlerError> {
        let rng = rand::rng();
        if self.utc {
            to_body(handle_generate_history(driver, rng, &Utc, arguments))
        } else {
            to_body(handle_generate_history(driver, rng, &Local, arguments))
        }
    }

    /// Build the list of available tools
    fn build_tools() -> Vec<Tool> {
        vec![Self::generate_tool(), Self::reset_tool()]
    }

    fn generate_tool() -> Tool {
        Tool {
            name: GENERATE_TOOL.into(),
            description: Some(
                "Fill the workspace repository with backdated commits spread across a date \
                 range. Weekdays fire with probability `intensity`, weekends far less often."
                    .into(),
            ),
            input_schema: ToolInputSchema::new(
                vec!["startDate".into(), "endDate".into()],
                Some(make_properties(json!({
                    "startDate": {
                        "type": "string",
                        "description": "First day of the range (ISO 8601, e.g. 2024-01-01)"
                    },
                    "endDate": {
                        "type": "string",
                        "description": "Last day of the range, inclusive"
                    },
                    "intensity": {
                        "type": ["number", "string"],
                        "default": 0.5,
                        "description": "Probability of activity on a weekday, between 0 and 1"
                    }
                }))),
                None,
            ),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Generate History".into()),
        }
    }

    fn reset_tool() -> Tool {
        Tool {
            name: RESET_TOOL.into(),
            description: Some(
                "Hard-reset the workspace repository to its initial commit and remove the \
                 activity marker file."
                    .into(),
            ),
            input_schema: ToolInputSchema::new(vec![], Some(make_properties(json!({}))), None),
            annotations: None,
            execution: None,
            icons: vec![],
            meta: None,
            output_schema: None,
            title: Some("Reset History".into()),
        }
    }
}

/// ServerHandler implementation for the MCP protocol
#[async_trait]
impl<D> ServerHandler for TimewarpServer<D>
where
    D: HistoryDriver + Send + 'static,
{
    /// Handle requests to list available tools
    async fn handle_list_tools_request(
        &self,
        _params: Option<PaginatedRequestParams>,
        _runtime: Arc<dyn McpServer>,
    ) -> Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            tools: Self::build_tools(),
            meta: None,
            next_cursor: None,
        })
    }

    /// Handle requests to call a specific tool
    async fn handle_call_tool_request(
        &self,
        params: CallToolRequestParams,
        _runtime: Arc<dyn McpServer>,
    ) -> Result<CallToolResult, CallToolError> {
        debug!(tool = %params.name, "Calling tool");
        self.dispatch(&params.name, params.arguments).await
    }
}
