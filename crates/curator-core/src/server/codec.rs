//! JSON conversion for server descriptors.
//!
//! Parsing is deliberately lenient: a field of the wrong JSON type falls back
//! to its zero value instead of rejecting the whole server. Serialization
//! omits empty strings, empty collections and a zero timeout.

use serde_json::{Map, Value};

use super::{McpServer, ServerMap, ServerType};
use crate::error::{CuratorError, Result};

/// Key holding server maps in every document this crate reads.
pub const MCP_SERVERS_KEY: &str = "mcpServers";

/// Parse one server entry. Returns `None` when the entry is not an object.
pub fn parse_server(value: &Value) -> Option<McpServer> {
    let entry = value.as_object()?;

    let mut server = McpServer {
        server_type: entry
            .get("type")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(ServerType::from),
        command: string_field(entry, "command"),
        url: string_field(entry, "url"),
        timeout: entry.get("timeout").map(parse_timeout).unwrap_or(0),
        ..McpServer::default()
    };

    if let Some(args) = entry.get("args").and_then(Value::as_array) {
        server.args = args
            .iter()
            .filter_map(|arg| arg.as_str().map(str::to_string))
            .collect();
    }
    if let Some(headers) = entry.get("headers").and_then(Value::as_object) {
        server.headers = string_pairs(headers);
    }
    if let Some(env) = entry.get("env").and_then(Value::as_object) {
        server.env = string_pairs(env);
    }

    Some(server)
}

/// Parse an `mcpServers` object, skipping entries that are not objects.
pub fn parse_server_map(value: &Value) -> ServerMap {
    let mut servers = ServerMap::new();
    let Some(entries) = value.as_object() else {
        if !value.is_null() {
            tracing::warn!("Ignoring mcpServers value that is not a JSON object");
        }
        return servers;
    };

    for (name, entry) in entries {
        match parse_server(entry) {
            Some(server) => {
                servers.insert(name.clone(), server.with_name(name.clone()));
            }
            None => tracing::warn!(server = %name, "Skipping malformed server entry"),
        }
    }
    servers
}

/// Serialize one server, omitting empty and zero fields.
pub fn server_to_value(server: &McpServer) -> Value {
    let mut entry = Map::new();

    if let Some(server_type) = &server.server_type
        && !server_type.as_str().is_empty()
    {
        entry.insert("type".into(), Value::String(server_type.as_str().into()));
    }
    if !server.command.is_empty() {
        entry.insert("command".into(), Value::String(server.command.clone()));
    }
    if !server.url.is_empty() {
        entry.insert("url".into(), Value::String(server.url.clone()));
    }
    if server.timeout > 0 {
        entry.insert("timeout".into(), Value::from(server.timeout));
    }
    if !server.args.is_empty() {
        entry.insert(
            "args".into(),
            Value::Array(server.args.iter().cloned().map(Value::String).collect()),
        );
    }
    if !server.headers.is_empty() {
        entry.insert("headers".into(), pairs_to_value(&server.headers));
    }
    if !server.env.is_empty() {
        entry.insert("env".into(), pairs_to_value(&server.env));
    }

    Value::Object(entry)
}

/// Serialize a server map as an `mcpServers` object.
pub fn servers_to_value(servers: &ServerMap) -> Value {
    Value::Object(
        servers
            .iter()
            .map(|(name, server)| (name.clone(), server_to_value(server)))
            .collect(),
    )
}

/// Parse a pasted server definition.
///
/// Accepts `{"<name>": {...}}` or `{"mcpServers": {"<name>": {...}}}`
/// describing exactly one server.
pub fn parse_server_snippet(text: &str) -> Result<(String, McpServer)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CuratorError::InvalidServerJson("input is empty".into()));
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| CuratorError::InvalidServerJson(e.to_string()))?;
    let Value::Object(mut root) = value else {
        return Err(CuratorError::InvalidServerJson(
            "expected a JSON object".into(),
        ));
    };

    if root.len() == 1
        && let Some(Value::Object(inner)) = root.remove(MCP_SERVERS_KEY)
    {
        root = inner;
    }

    if root.len() != 1 {
        return Err(CuratorError::InvalidServerJson(format!(
            "expected exactly one server, found {}",
            root.len()
        )));
    }

    let (name, entry) = root
        .into_iter()
        .next()
        .ok_or_else(|| CuratorError::InvalidServerJson("no server found".into()))?;
    if name.trim().is_empty() {
        return Err(CuratorError::InvalidServerJson(
            "server name is empty".into(),
        ));
    }
    let server = parse_server(&entry).ok_or_else(|| {
        CuratorError::InvalidServerJson(format!("server '{name}' is not a JSON object"))
    })?;
    if !server.is_stdio() && !server.is_http() {
        return Err(CuratorError::InvalidServerJson(format!(
            "server '{name}' needs a command or a url"
        )));
    }

    Ok((name.clone(), server.with_name(name)))
}

fn string_field(entry: &Map<String, Value>, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_timeout(value: &Value) -> u64 {
    if let Some(millis) = value.as_u64() {
        return millis;
    }
    match value.as_f64() {
        Some(millis) if millis.is_finite() && millis > 0.0 => millis as u64,
        _ => 0,
    }
}

fn string_pairs(map: &Map<String, Value>) -> std::collections::BTreeMap<String, String> {
    map.iter()
        .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
        .collect()
}

fn pairs_to_value(pairs: &std::collections::BTreeMap<String, String>) -> Value {
    Value::Object(
        pairs
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrong_field_types_fall_back_to_zero_values() {
        let server = parse_server(&json!({
            "type": 42,
            "command": ["not", "a", "string"],
            "url": "http://x",
            "timeout": "soon",
            "args": ["ok", 1, null, "also-ok"],
            "headers": {"A": "1", "B": 2},
            "env": "nope"
        }))
        .unwrap();

        assert_eq!(server.server_type, None);
        assert_eq!(server.command, "");
        assert_eq!(server.url, "http://x");
        assert_eq!(server.timeout, 0);
        assert_eq!(server.args, vec!["ok", "also-ok"]);
        assert_eq!(server.headers.len(), 1);
        assert!(server.env.is_empty());
    }

    #[test]
    fn timeout_accepts_float_and_rejects_negative() {
        let server = parse_server(&json!({"timeout": 1500.7})).unwrap();
        assert_eq!(server.timeout, 1500);

        let server = parse_server(&json!({"timeout": -3})).unwrap();
        assert_eq!(server.timeout, 0);
    }

    #[test]
    fn non_object_entry_is_rejected() {
        assert!(parse_server(&json!("npx")).is_none());
        assert!(parse_server(&json!(null)).is_none());
    }

    #[test]
    fn server_map_skips_malformed_and_sets_names() {
        let servers = parse_server_map(&json!({
            "good": {"command": "npx"},
            "bad": [1, 2, 3]
        }));

        assert_eq!(servers.len(), 1);
        assert_eq!(servers["good"].name, "good");
    }

    #[test]
    fn serialization_omits_empty_fields() {
        let server = McpServer {
            name: "ignored".to_string(),
            command: "npx".to_string(),
            ..McpServer::default()
        };

        assert_eq!(server_to_value(&server), json!({"command": "npx"}));
    }

    #[test]
    fn serialization_writes_every_populated_field() {
        let mut server = McpServer::remote(ServerType::Http, "https://api.example.com/mcp");
        server.timeout = 30000;
        server
            .headers
            .insert("Authorization".to_string(), "Bearer t".to_string());
        server.env.insert("DEBUG".to_string(), "1".to_string());
        server.args = vec!["--verbose".to_string()];

        assert_eq!(
            server_to_value(&server),
            json!({
                "type": "http",
                "url": "https://api.example.com/mcp",
                "timeout": 30000,
                "args": ["--verbose"],
                "headers": {"Authorization": "Bearer t"},
                "env": {"DEBUG": "1"}
            })
        );
    }

    #[test]
    fn snippet_accepts_bare_and_wrapped_forms() {
        let (name, server) =
            parse_server_snippet(r#"{"github": {"command": "npx", "args": ["-y", "gh"]}}"#)
                .unwrap();
        assert_eq!(name, "github");
        assert_eq!(server.name, "github");
        assert_eq!(server.args, vec!["-y", "gh"]);

        let (name, server) = parse_server_snippet(
            r#"{"mcpServers": {"docs": {"type": "sse", "url": "http://docs"}}}"#,
        )
        .unwrap();
        assert_eq!(name, "docs");
        assert_eq!(server.server_type, Some(ServerType::Sse));
    }

    #[test]
    fn snippet_rejects_ambiguous_or_empty_input() {
        assert!(parse_server_snippet("").is_err());
        assert!(parse_server_snippet("[]").is_err());
        assert!(parse_server_snippet(r#"{"a": {"command": "x"}, "b": {"command": "y"}}"#).is_err());
        assert!(parse_server_snippet(r#"{"a": {"env": {"K": "V"}}}"#).is_err());
        assert!(parse_server_snippet(r#"{"a": "npx"}"#).is_err());
    }
}
