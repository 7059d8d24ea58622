//! MCP Curator - inspect and edit MCP server configuration
//!
//! Usage:
//!   mcp-curator tree                          # Global and per-project servers
//!   mcp-curator effective .                   # What a project actually gets
//!   mcp-curator add fs -- npx -y @mcp/fs      # Add a global stdio server
//!   mcp-curator move fs --to-project ~/api    # Move a global server into a project

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator_core::config::{Configuration, EffectiveServer};
use curator_core::context::AppContext;
use curator_core::server::{McpServer, ServerType, parse_server_snippet, server_to_value};
use curator_core::service::{CloneReport, McpService};
use curator_core::settings::Settings;
use curator_core::tree::{NodeId, TreeNode, build_tree, find_server};
use curator_core::types::{Scope, ServerRef};

#[derive(Parser)]
#[command(name = "mcp-curator")]
#[command(about = "Curate MCP servers across ~/.claude.json and project files", long_about = None)]
struct Cli {
    /// Settings file (defaults to <config dir>/mcp-curator/curator.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// User document to edit instead of ~/.claude.json
    #[arg(long, global = true, value_name = "FILE")]
    document: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show global servers and every project with its servers
    Tree,

    /// Show one server definition
    Show {
        /// Server name
        name: String,
        /// Look the server up in this project (all layers) instead of global
        #[arg(long, short)]
        project: Option<String>,
    },

    /// Show the servers a project resolves to after layering
    Effective {
        /// Project directory
        project: String,
        /// Show the winning layer and the layers it shadows
        #[arg(long)]
        origins: bool,
    },

    /// Add a server to the global scope or a project
    Add(Box<AddArgs>),

    /// Change fields of an existing server
    Update(Box<UpdateArgs>),

    /// Remove a server
    #[command(alias = "rm")]
    Remove {
        /// Server name
        name: String,
        /// Remove from this project instead of global
        #[arg(long, short)]
        project: Option<String>,
    },

    /// Move a server between the global scope and a project
    #[command(alias = "mv")]
    Move {
        /// Server name
        name: String,
        /// Move a global server into this project
        #[arg(long, conflicts_with = "from_project", required_unless_present = "from_project")]
        to_project: Option<String>,
        /// Move a server out of this project into the global scope
        #[arg(long)]
        from_project: Option<String>,
    },

    /// Copy a server into other scopes
    #[command(alias = "cp")]
    Clone {
        /// Server name
        name: String,
        /// Source project (defaults to global)
        #[arg(long, short)]
        project: Option<String>,
        /// Copy into the global scope
        #[arg(long)]
        to_global: bool,
        /// Copy into this project (repeatable)
        #[arg(long = "to-project", value_name = "PROJECT")]
        to_projects: Vec<String>,
    },

    /// Show the files this tool reads and writes
    Paths,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

/// Fields shared by `add` and `update`.
#[derive(Args)]
struct ServerArgs {
    /// Transport type (stdio, http, sse)
    #[arg(long = "type", short = 't')]
    server_type: Option<String>,
    /// URL for http/sse servers
    #[arg(long)]
    url: Option<String>,
    /// HTTP header (KEY=VALUE)
    #[arg(long = "header", value_name = "KEY=VALUE")]
    headers: Vec<String>,
    /// Environment variable (KEY=VALUE)
    #[arg(long, value_name = "KEY=VALUE")]
    env: Vec<String>,
    /// Timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,
    /// Stdio command and arguments (after --)
    #[arg(last = true)]
    command: Vec<String>,
}

#[derive(Args)]
struct AddArgs {
    /// Server name (optional with --json, which carries its own)
    name: Option<String>,
    /// Add to this project instead of global
    #[arg(long, short)]
    project: Option<String>,
    /// Server definition as JSON, or "-" to read it from stdin
    #[arg(long, value_name = "SNIPPET")]
    json: Option<String>,
    #[command(flatten)]
    server: ServerArgs,
}

#[derive(Args)]
struct UpdateArgs {
    /// Server name
    name: String,
    /// Update in this project instead of global
    #[arg(long, short)]
    project: Option<String>,
    #[command(flatten)]
    server: ServerArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "mcp_curator=debug,curator_core=debug,info"
    } else {
        "mcp_curator=info,curator_core=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = build_context(&cli)?;
    run(cli.command, cli.format, &ctx)
}

fn build_context(cli: &Cli) -> Result<AppContext> {
    let settings_path = cli.config.clone().or_else(Settings::default_path);
    let settings = match &settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut ctx = AppContext::from_home(settings)?;
    if let Some(path) = &settings_path {
        ctx = ctx.with_settings_path(path.clone());
    }
    if let Some(document) = &cli.document {
        ctx = ctx.with_document_path(document.clone());
    }
    tracing::debug!(
        settings = ?settings_path,
        document = %ctx.document_path().display(),
        "Resolved paths"
    );
    Ok(ctx)
}

fn run(command: Commands, format: OutputFormat, ctx: &AppContext) -> Result<()> {
    if let Commands::Paths = command {
        return run_paths(ctx, format);
    }

    let mut service = ctx.service();
    service
        .load()
        .with_context(|| format!("Failed to load {}", ctx.document_path().display()))?;

    match command {
        Commands::Tree => run_tree(&service, format),
        Commands::Show { name, project } => run_show(&service, &name, project, format),
        Commands::Effective { project, origins } => {
            run_effective(&service, &project, origins, format)
        }
        Commands::Add(args) => run_add(&mut service, *args, format),
        Commands::Update(args) => run_update(&mut service, *args, format),
        Commands::Remove { name, project } => {
            let scope = scope_arg(project)?;
            match &scope {
                Scope::Global => service.remove_global_server(&name)?,
                Scope::Project(path) => service.remove_project_server(path, &name)?,
            }
            print_change(format, "removed", &name, &scope)
        }
        Commands::Move {
            name,
            to_project,
            from_project,
        } => run_move(&mut service, &name, to_project, from_project, format),
        Commands::Clone {
            name,
            project,
            to_global,
            to_projects,
        } => run_clone(&mut service, &name, project, to_global, to_projects, format),
        Commands::Paths => run_paths(ctx, format),
    }
}

fn run_tree(service: &McpService, format: OutputFormat) -> Result<()> {
    let config = service.configuration()?;
    let tree = build_tree(config);

    match format {
        OutputFormat::Table => {
            for root in &tree {
                println!("{} ({})", root.label, root.child_count());
                for child in &root.children {
                    print_tree_node(config, child, 1);
                }
            }
        }
        OutputFormat::Json => {
            let output: Vec<Value> = tree.iter().map(|node| node_to_json(config, node)).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_tree_node(config: &Configuration, node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.id.is_branch() {
        println!("{indent}{} ({})", node.label, node.child_count());
        for child in &node.children {
            print_tree_node(config, child, depth + 1);
        }
        return;
    }

    let layer = match &node.id {
        NodeId::ProjectServer { layer, .. } => format!("[{layer}] "),
        _ => String::new(),
    };
    match find_server(config, &node.id) {
        Some(server) => println!(
            "{indent}{layer}{:<20} {:<6} {}",
            truncate(&node.label, 20),
            server.transport_label(),
            server.endpoint()
        ),
        None => println!("{indent}{layer}{}", node.label),
    }
}

fn node_to_json(config: &Configuration, node: &TreeNode) -> Value {
    let mut value = json!({
        "id": node.id.to_string(),
        "label": node.label,
    });
    if node.id.is_branch() {
        value["children"] = node
            .children
            .iter()
            .map(|child| node_to_json(config, child))
            .collect();
    } else if let Some(server) = find_server(config, &node.id) {
        value["server"] = server_to_value(&server);
    }
    value
}

fn run_show(
    service: &McpService,
    name: &str,
    project: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let (server, origin) = match project_arg(project)? {
        None => (service.global_server(name)?, "global".to_string()),
        Some(path) => {
            let entry = service
                .resolve_layers(&path)?
                .into_iter()
                .find(|entry| entry.server.name == name)
                .with_context(|| format!("Server '{name}' is not visible in project '{path}'"))?;
            (entry.server, entry.origin.to_string())
        }
    };

    match format {
        OutputFormat::Table => {
            println!("{} ({origin})", server.name);
            println!("  Type:     {}", server.transport_label());
            if !server.command.is_empty() {
                println!("  Command:  {}", server.endpoint());
            }
            if !server.url.is_empty() {
                println!("  URL:      {}", server.url);
            }
            if server.timeout > 0 {
                println!("  Timeout:  {} ms", server.timeout);
            }
            for (key, value) in &server.headers {
                println!("  Header:   {key}={value}");
            }
            for (key, value) in &server.env {
                println!("  Env:      {key}={value}");
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "name": server.name,
                "origin": origin,
                "server": server_to_value(&server),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn run_effective(
    service: &McpService,
    project: &str,
    origins: bool,
    format: OutputFormat,
) -> Result<()> {
    let path = absolute_project(project)?;
    let resolved = service.resolve_layers(&path)?;

    match format {
        OutputFormat::Table => {
            println!("Project: {path}");
            if resolved.is_empty() {
                println!("No MCP servers configured.");
                return Ok(());
            }
            println!();
            if origins {
                print_origins_table(&resolved);
            } else {
                println!("  {:<20} {:<6} Endpoint", "Name", "Type");
                println!("  {}", "-".repeat(60));
                for entry in &resolved {
                    println!(
                        "  {:<20} {:<6} {}",
                        truncate(&entry.server.name, 20),
                        entry.server.transport_label(),
                        entry.server.endpoint()
                    );
                }
            }
        }
        OutputFormat::Json => {
            let output: Vec<Value> = resolved
                .iter()
                .map(|entry| {
                    let mut value = json!({
                        "name": entry.server.name,
                        "server": server_to_value(&entry.server),
                    });
                    if origins {
                        value["origin"] = json!(entry.origin.as_str());
                        value["shadowed"] = entry
                            .shadowed
                            .iter()
                            .map(|layer| json!(layer.as_str()))
                            .collect();
                    }
                    value
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_origins_table(resolved: &[EffectiveServer]) {
    println!("  {:<20} {:<18} Shadows", "Name", "From");
    println!("  {}", "-".repeat(60));
    for entry in resolved {
        let shadowed: Vec<&str> = entry.shadowed.iter().map(|layer| layer.as_str()).collect();
        println!(
            "  {:<20} {:<18} {}",
            truncate(&entry.server.name, 20),
            entry.origin.as_str(),
            if shadowed.is_empty() {
                "-".to_string()
            } else {
                shadowed.join(", ")
            }
        );
    }
}

fn run_add(service: &mut McpService, args: AddArgs, format: OutputFormat) -> Result<()> {
    let (name, server) = match &args.json {
        Some(snippet) => {
            let text = if snippet == "-" {
                std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
            } else {
                snippet.clone()
            };
            let (snippet_name, mut server) = parse_server_snippet(&text)?;
            args.server.apply(&mut server)?;
            (args.name.clone().unwrap_or(snippet_name), server)
        }
        None => {
            let name = args
                .name
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Missing required argument: name"))?;
            (name, new_server(&args.server)?)
        }
    };

    let scope = scope_arg(args.project)?;
    match &scope {
        Scope::Global => service.add_global_server(&name, server)?,
        Scope::Project(path) => service.add_project_server(path, &name, server)?,
    }
    print_change(format, "added", &name, &scope)
}

fn run_update(service: &mut McpService, args: UpdateArgs, format: OutputFormat) -> Result<()> {
    if args.server.is_empty() {
        anyhow::bail!("Nothing to update; pass at least one server option");
    }

    let scope = scope_arg(args.project)?;
    let server_ref = ServerRef {
        scope: scope.clone(),
        name: args.name.clone(),
    };
    let mut server = service.server(&server_ref)?;
    args.server.apply(&mut server)?;

    match &scope {
        Scope::Global => service.update_global_server(&args.name, server)?,
        Scope::Project(path) => service.update_project_server(path, &args.name, server)?,
    }
    print_change(format, "updated", &args.name, &scope)
}

fn run_move(
    service: &mut McpService,
    name: &str,
    to_project: Option<String>,
    from_project: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let (from, to) = match (project_arg(to_project)?, project_arg(from_project)?) {
        (Some(path), None) => {
            service.move_server_to_project(name, &path)?;
            (Scope::Global, Scope::Project(path))
        }
        (None, Some(path)) => {
            service.move_server_to_global(&path, name)?;
            (Scope::Project(path), Scope::Global)
        }
        _ => anyhow::bail!("Pass exactly one of --to-project or --from-project"),
    };

    match format {
        OutputFormat::Table => println!("✓ Moved '{name}' from {from} to {to}"),
        OutputFormat::Json => {
            let output = json!({
                "name": name,
                "action": "moved",
                "from": from,
                "to": to,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn run_clone(
    service: &mut McpService,
    name: &str,
    project: Option<String>,
    to_global: bool,
    to_projects: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let source = ServerRef {
        scope: scope_arg(project)?,
        name: name.to_string(),
    };
    let mut destinations = Vec::new();
    if to_global {
        destinations.push(Scope::Global);
    }
    for path in &to_projects {
        destinations.push(Scope::Project(absolute_project(path)?));
    }
    if destinations.is_empty() {
        anyhow::bail!("Pass --to-global or at least one --to-project");
    }

    let report = service.clone_server(&source, &destinations)?;
    print_clone_report(&report, format)
}

fn print_clone_report(report: &CloneReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            for scope in &report.cloned {
                println!("✓ Cloned '{}' to {scope}", report.name);
            }
            for (_, error) in &report.failed {
                println!("  ⚠ {error}");
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "name": report.name,
                "cloned": report.cloned,
                "failed": report
                    .failed
                    .iter()
                    .map(|(scope, error)| json!({"scope": scope, "error": error.to_string()}))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn run_paths(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let store = ctx.config_store();
    let backups = store.backups();
    let timestamped = backups.timestamped_backups()?;
    let settings = ctx.settings();

    match format {
        OutputFormat::Table => {
            println!("Document:  {}", ctx.document_path().display());
            match ctx.settings_path() {
                Some(path) if path.is_file() => println!("Settings:  {}", path.display()),
                Some(path) => println!("Settings:  {} (not present, using defaults)", path.display()),
                None => println!("Settings:  (no config directory, using defaults)"),
            }
            if let Some(document) = &settings.document_path {
                println!("           document_path = {}", document.display());
            }
            println!("Backup:    {}", backups.latest_backup_path().display());
            println!(
                "Retention: {} timestamped backups ({} present)",
                settings.backup_retention,
                timestamped.len()
            );
            for path in &timestamped {
                println!("  {}", path.display());
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "document": ctx.document_path(),
                "settings": ctx.settings_path(),
                "settings_document_path": settings.document_path,
                "latest_backup": backups.latest_backup_path(),
                "retention": settings.backup_retention,
                "backups": timestamped,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_change(format: OutputFormat, action: &str, name: &str, scope: &Scope) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut verb = action.to_string();
            if let Some(first) = verb.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            let preposition = match action {
                "added" => "to",
                "removed" => "from",
                _ => "in",
            };
            println!("✓ {verb} '{name}' {preposition} {scope}");
        }
        OutputFormat::Json => {
            let output = json!({
                "name": name,
                "action": action,
                "scope": scope,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

impl ServerArgs {
    fn is_empty(&self) -> bool {
        self.server_type.is_none()
            && self.url.is_none()
            && self.headers.is_empty()
            && self.env.is_empty()
            && self.timeout.is_none()
            && self.command.is_empty()
    }

    /// Overwrite the fields that were given on the command line.
    fn apply(&self, server: &mut McpServer) -> Result<()> {
        if let Some(server_type) = &self.server_type {
            server.server_type = Some(ServerType::from(server_type.as_str()));
        }
        if let Some((command, args)) = self.command.split_first() {
            server.command = command.clone();
            server.args = args.to_vec();
        }
        if let Some(url) = &self.url {
            server.url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            server.timeout = timeout;
        }
        for pair in &self.headers {
            let (key, value) = parse_key_value(pair)?;
            server.headers.insert(key, value);
        }
        for pair in &self.env {
            let (key, value) = parse_key_value(pair)?;
            server.env.insert(key, value);
        }
        Ok(())
    }
}

fn new_server(args: &ServerArgs) -> Result<McpServer> {
    if args.command.is_empty() && args.url.is_none() {
        anyhow::bail!("Provide a command after -- or a --url");
    }

    let mut server = McpServer::default();
    args.apply(&mut server)?;
    if server.server_type.is_none() {
        server.server_type = Some(if server.command.is_empty() {
            ServerType::Http
        } else {
            ServerType::Stdio
        });
    }
    Ok(server)
}

fn parse_key_value(pair: &str) -> Result<(String, String)> {
    let (key, value) = pair
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{pair}'"))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Empty key in '{pair}'");
    }
    Ok((key.to_string(), value.to_string()))
}

fn scope_arg(project: Option<String>) -> Result<Scope> {
    Ok(match project_arg(project)? {
        Some(path) => Scope::Project(path),
        None => Scope::Global,
    })
}

fn project_arg(project: Option<String>) -> Result<Option<String>> {
    project.as_deref().map(absolute_project).transpose()
}

/// Project keys in the user document are absolute paths.
fn absolute_project(path: &str) -> Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve project path '{path}'"))?;
    Ok(absolute.to_string_lossy().into_owned())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
