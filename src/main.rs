use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use project_autoselect::mcp_server::AutoselectMcpServer;
use project_autoselect::{AutoselectClient, Config, ExtractSymbolsRequest, SelectionRequest};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

/// Pick the files an LLM needs for a coding task
#[derive(Parser)]
#[command(name = "project-autoselect")]
#[command(version, about)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "AUTOSELECT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdio (default)
    Serve,
    /// Print codemaps for files as JSON
    Extract {
        /// Project root
        base_dir: String,
        /// Project-relative file paths
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Select the files for a task and print the result as JSON
    Select {
        /// Project root
        base_dir: String,
        /// Task description
        #[arg(short, long)]
        instructions: String,
        /// Candidate paths; read from stdin, one per line, when omitted
        paths: Vec<String>,
        /// Extensions to favour, e.g. `--bias py --bias ts`
        #[arg(long)]
        bias: Vec<String>,
        /// Include the decoded upstream reply
        #[arg(long)]
        debug: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout carries the MCP protocol
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Some(path) = cli.config {
                let client = AutoselectClient::with_config(load_config(path)?).await?;
                let server = AutoselectMcpServer::with_client(std::sync::Arc::new(client))?;
                serve(server).await?;
            } else {
                AutoselectMcpServer::serve_stdio().await?;
            }
        }
        Commands::Extract { base_dir, paths } => {
            let client = client(cli.config).await?;
            let response = client
                .extract_symbols(ExtractSymbolsRequest {
                    base_dir,
                    relative_paths: paths,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Select {
            base_dir,
            instructions,
            paths,
            bias,
            debug,
        } => {
            let paths = if paths.is_empty() {
                std::io::stdin()
                    .lines()
                    .collect::<std::io::Result<Vec<_>>>()
                    .context("Failed to read paths from stdin")?
                    .into_iter()
                    .filter(|line| !line.trim().is_empty())
                    .collect()
            } else {
                paths
            };

            let mut request = SelectionRequest::new(base_dir, paths, instructions);
            request.language_bias = (!bias.is_empty()).then_some(bias);
            request.debug = debug;

            let client = client(cli.config).await?;
            let result = client.select_files(request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn load_config(path: PathBuf) -> Result<Config> {
    let mut config = Config::from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

async fn client(config_path: Option<PathBuf>) -> Result<AutoselectClient> {
    let client = match config_path {
        Some(path) => AutoselectClient::with_config(load_config(path)?).await?,
        None => AutoselectClient::new().await?,
    };
    Ok(client)
}

async fn serve(server: AutoselectMcpServer) -> Result<()> {
    use rmcp::ServiceExt;

    let transport = rmcp::transport::io::stdio();
    server.serve(transport).await?.waiting().await?;
    Ok(())
}
