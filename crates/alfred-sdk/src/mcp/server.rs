//! MCP JSON-RPC server.

use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use tracing::debug;

use crate::Client;
use crate::query::{
    CreateTaskArgs, GetNextTaskArgs, MarkSubtaskCompleteArgs, RequestRevisionArgs, SubmitWorkArgs,
    TaskIdArgs,
};

use super::tools::{
    TASK_TOOLS, handle_approve_and_advance, handle_approve_review, handle_create_task,
    handle_get_next_task, handle_mark_subtask_complete, handle_request_revision,
    handle_submit_work, handle_task_tool,
};

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

pub struct AlfredServer {
    client: Client,
}

impl AlfredServer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Convert serde deserialization error to MCP-compliant JSON-RPC error
    fn parse_validation_error(tool_name: &str, error: serde_json::Error) -> JsonRpcError {
        let error_msg = error.to_string();

        // Check if it's a "missing field" error
        if error_msg.contains("missing field") {
            if let Some(field_start) = error_msg.find('`') {
                if let Some(field_end) = error_msg[field_start + 1..].find('`') {
                    let field_name = &error_msg[field_start + 1..field_start + 1 + field_end];
                    return JsonRpcError {
                        code: -32602,
                        message: format!(
                            "Invalid params: missing required field \"{}\"",
                            field_name
                        ),
                        data: Some(json!({
                            "missing": [field_name],
                            "tool": tool_name,
                        })),
                    };
                }
            }
        }

        // Fallback for other validation errors
        JsonRpcError {
            code: -32602,
            message: format!("Invalid params: {}", error),
            data: Some(json!({
                "tool": tool_name,
                "detail": error_msg,
            })),
        }
    }

    fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        // MCP requires all requests to have an id, use a default if missing
        let id = request
            .id
            .clone()
            .unwrap_or_else(|| Value::Number(serde_json::Number::from(0)));

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params),
            _ => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(JsonRpcError {
                    code: -32601,
                    message: format!("Method not found: {}", request.method),
                    data: None,
                }),
            },
        }
    }

    fn handle_initialize(&self, id: Value, _params: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "alfred",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": "Alfred MCP Server - workflow orchestration for AI coding agents. \
                    Use work_on_task to find the tool owning a task, submit_work to submit the \
                    current state's artifact, and approve_review / request_revision to drive reviews. \
                    Every response carries a next_prompt describing what to do next."
            })),
            error: None,
        }
    }

    fn handle_list_tools(&self, id: Value) -> JsonRpcResponse {
        // Generate JSON Schemas from Rust types - single source of truth!
        let task_id_schema = serde_json::to_value(schema_for!(TaskIdArgs)).unwrap_or_default();
        let mut tools: Vec<Value> = TASK_TOOLS
            .iter()
            .map(|(name, description)| {
                json!({
                    "name": name,
                    "description": description,
                    "inputSchema": task_id_schema.clone(),
                })
            })
            .collect();

        tools.push(json!({
            "name": "get_next_task",
            "description": "Ranked recommendation over all non-done tasks: in-flight work first, then ready work, then the oldest task id.",
            "inputSchema": serde_json::to_value(schema_for!(GetNextTaskArgs)).unwrap_or_default(),
        }));
        tools.push(json!({
            "name": "create_task",
            "description": "Create a task definition file from markdown content (first line '# TASK: {id}').",
            "inputSchema": serde_json::to_value(schema_for!(CreateTaskArgs)).unwrap_or_default(),
        }));
        tools.push(json!({
            "name": "submit_work",
            "description": "Submit the current work state's artifact. Validated against the state's schema; on success a turn is recorded and the review cycle begins.",
            "inputSchema": serde_json::to_value(schema_for!(SubmitWorkArgs)).unwrap_or_default(),
        }));
        tools.push(json!({
            "name": "approve_review",
            "description": "Approve the pending AI or human review and advance the workflow.",
            "inputSchema": task_id_schema.clone(),
        }));
        tools.push(json!({
            "name": "request_revision",
            "description": "Reject the pending review with required feedback; the workflow returns to its work state.",
            "inputSchema": serde_json::to_value(schema_for!(RequestRevisionArgs)).unwrap_or_default(),
        }));
        tools.push(json!({
            "name": "approve_and_advance",
            "description": "After a phase reaches its terminal state, confirm and move to the next phase's tool.",
            "inputSchema": task_id_schema,
        }));
        tools.push(json!({
            "name": "mark_subtask_complete",
            "description": "Record one implementation subtask as done. Progress only; no state transition.",
            "inputSchema": serde_json::to_value(schema_for!(MarkSubtaskCompleteArgs)).unwrap_or_default(),
        }));

        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(json!({"tools": tools})),
            error: None,
        }
    }

    fn handle_call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = match params {
            Some(p) => p,
            None => {
                return JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32602,
                        message: "Missing params".to_string(),
                        data: None,
                    }),
                };
            }
        };

        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id,
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32602,
                        message: "Missing tool name".to_string(),
                        data: None,
                    }),
                };
            }
        };

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
        debug!(tool = tool_name, "tools/call");

        macro_rules! parse_args {
            ($ty:ty) => {
                match serde_json::from_value::<$ty>(arguments) {
                    Ok(args) => args,
                    Err(e) => {
                        return JsonRpcResponse {
                            jsonrpc: "2.0".to_string(),
                            id,
                            result: None,
                            error: Some(Self::parse_validation_error(tool_name, e)),
                        };
                    }
                }
            };
        }

        let result = if TASK_TOOLS.iter().any(|(name, _)| *name == tool_name) {
            let args = parse_args!(TaskIdArgs);
            handle_task_tool(&self.client, tool_name, args)
        } else {
            match tool_name {
                "get_next_task" => handle_get_next_task(&self.client),
                "create_task" => {
                    let args = parse_args!(CreateTaskArgs);
                    handle_create_task(&self.client, args)
                }
                "submit_work" => {
                    let args = parse_args!(SubmitWorkArgs);
                    handle_submit_work(&self.client, args)
                }
                "approve_review" => {
                    let args = parse_args!(TaskIdArgs);
                    handle_approve_review(&self.client, args)
                }
                "request_revision" => {
                    let args = parse_args!(RequestRevisionArgs);
                    handle_request_revision(&self.client, args)
                }
                "approve_and_advance" => {
                    let args = parse_args!(TaskIdArgs);
                    handle_approve_and_advance(&self.client, args)
                }
                "mark_subtask_complete" => {
                    let args = parse_args!(MarkSubtaskCompleteArgs);
                    handle_mark_subtask_complete(&self.client, args)
                }
                _ => Err(format!("Unknown tool: {}", tool_name)),
            }
        };

        match result {
            Ok(content) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(json!({
                    "content": [
                        {
                            "type": "text",
                            "text": serde_json::to_string(&content).unwrap_or_else(|_| content.to_string())
                        }
                    ]
                })),
                error: None,
            },
            Err(e) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(JsonRpcError {
                    code: -32603,
                    message: e,
                    data: None,
                }),
            },
        }
    }
}

/// Run the MCP server over stdio until stdin closes.
pub fn run_server(client: Client) -> anyhow::Result<()> {
    let server = AlfredServer::new(client);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin);

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(req) => req,
            Err(e) => {
                // For parse errors, we can't get a valid id, so we use a sentinel value
                let error_response = JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id: Value::Number(serde_json::Number::from(-1)),
                    result: None,
                    error: Some(JsonRpcError {
                        code: -32700,
                        message: format!("Parse error: {}", e),
                        data: None,
                    }),
                };
                let response_json = serde_json::to_string(&error_response)?;
                writeln!(stdout, "{}", response_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let response = server.handle_request(request);
        let response_json = serde_json::to_string(&response)?;
        writeln!(stdout, "{}", response_json)?;
        stdout.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_errors_name_the_field() {
        let err = serde_json::from_value::<TaskIdArgs>(json!({})).unwrap_err();
        let rpc = AlfredServer::parse_validation_error("plan_task", err);
        assert_eq!(rpc.code, -32602);
        assert!(rpc.message.contains("task_id"), "{}", rpc.message);
        assert_eq!(rpc.data.unwrap()["missing"][0], "task_id");
    }
}
