use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trivy_issue::{
    config::{parse_list, Config},
    execute,
    fetch::EXECUTABLE_NAME,
    output::{print_scan_output, write_action_outputs},
    Outcome, Run,
};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const VULNERABILITIES: u8 = 2;
}

#[derive(Parser)]
#[command(name = "trivy-issue")]
#[command(
    author,
    version,
    about = "Scan a container image with Trivy and report findings as a GitHub issue"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TRIVY_ISSUE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an image and report or file an issue
    Scan(ScanArgs),

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Remove the downloaded trivy executable
    ClearCache,
}

#[derive(Args, Default)]
struct ScanArgs {
    /// Image reference to scan, e.g. alpine:3.10
    #[arg(long, env = "INPUT_IMAGE")]
    image: String,

    /// Trivy version (e.g. 0.18.3) or "latest"
    #[arg(long, env = "INPUT_TRIVY_VERSION")]
    trivy_version: Option<String>,

    /// Comma-separated severities (UNKNOWN,LOW,MEDIUM,HIGH,CRITICAL)
    #[arg(long, env = "INPUT_SEVERITY")]
    severity: Option<String>,

    /// Comma-separated vulnerability types (os,library)
    #[arg(long, env = "INPUT_VULN_TYPE")]
    vuln_type: Option<String>,

    /// Ignore vulnerabilities without a fixed version (true/false)
    #[arg(long, env = "INPUT_IGNORE_UNFIXED")]
    ignore_unfixed: Option<String>,

    /// Trivy output template file
    #[arg(long, env = "INPUT_TEMPLATE")]
    template: Option<PathBuf>,

    /// Create or update a GitHub issue; false prints a report instead
    #[arg(long, env = "INPUT_ISSUE")]
    issue: Option<String>,

    /// Title for new issues
    #[arg(long, env = "INPUT_ISSUE_TITLE")]
    issue_title: Option<String>,

    /// Comma-separated issue labels
    #[arg(long, env = "INPUT_ISSUE_LABEL")]
    issue_label: Option<String>,

    /// Comma-separated issue assignees
    #[arg(long, env = "INPUT_ISSUE_ASSIGNEE")]
    issue_assignee: Option<String>,

    /// Exit with code 2 when vulnerabilities are reported (true/false)
    #[arg(long, env = "INPUT_FAIL_ON_VULNERABILITIES")]
    fail_on_vulnerabilities: Option<String>,

    /// GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository for issues, as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// File receiving step outputs (issue_number, html_url)
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,

    /// Directory the trivy executable is cached in
    #[arg(long, env = "TRIVY_ISSUE_BIN_DIR")]
    bin_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config_path = cli.config.unwrap_or_else(Config::config_path);

    match cli.command {
        Commands::Scan(args) => {
            let config = Config::load_from(&config_path)
                .with_context(|| format!("Failed to load {}", config_path.display()))?;
            run_scan(args, config).await
        }
        Commands::Config { init, path } => {
            handle_config(&config_path, init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let config = Config::load_from(&config_path)?;
            clear_cache(&config.bin_dir())?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(mut args: ScanArgs, mut config: Config) -> Result<u8> {
    apply_overrides(&mut config, &args)?;

    let token = non_empty(args.token.take()).or_else(|| non_empty(std::env::var("GITHUB_TOKEN").ok()));
    let github_output = args.github_output.take().filter(|p| !p.as_os_str().is_empty());

    let run = Run {
        image: args.image,
        repository: non_empty(args.repository),
        token,
        config,
    };

    let outcome = execute(&run).await?;

    match &outcome {
        Outcome::Clean => {
            println!("No vulnerabilities found in {}", run.image);
        }
        Outcome::Reported(output) => {
            print_scan_output(output)?;
        }
        Outcome::Issue { response, findings } => {
            println!(
                "Reported {} vulnerabilities in issue #{}: {}",
                findings, response.issue_number, response.html_url
            );
            if let Some(path) = github_output {
                write_action_outputs(
                    &path,
                    &[
                        ("issue_number", response.issue_number.to_string()),
                        ("html_url", response.html_url.clone()),
                    ],
                )
                .context("Failed to write step outputs")?;
            }
        }
    }

    if run.config.fail_on_vulnerabilities && outcome.has_findings() {
        return Ok(exit_codes::VULNERABILITIES);
    }
    Ok(exit_codes::SUCCESS)
}

/// Layers command-line (and `INPUT_*`) values over the file config.
/// Blank values, which Actions passes for unset inputs, are ignored.
fn apply_overrides(config: &mut Config, args: &ScanArgs) -> Result<()> {
    if let Some(version) = non_empty(args.trivy_version.clone()) {
        config.trivy_version = version;
    }
    if let Some(severity) = non_empty(args.severity.clone()) {
        config.severity = severity;
    }
    if let Some(vuln_type) = non_empty(args.vuln_type.clone()) {
        config.vuln_type = vuln_type;
    }
    if let Some(ignore_unfixed) = parse_flag("ignore-unfixed", &args.ignore_unfixed)? {
        config.ignore_unfixed = ignore_unfixed;
    }
    if let Some(template) = args.template.as_ref().filter(|p| !p.as_os_str().is_empty()) {
        config.template = Some(template.clone());
    }
    if let Some(bin_dir) = args.bin_dir.as_ref().filter(|p| !p.as_os_str().is_empty()) {
        config.bin_dir = Some(bin_dir.clone());
    }
    if let Some(api_url) = non_empty(args.api_url.clone()) {
        config.api_url = api_url;
    }
    if let Some(fail) = parse_flag("fail-on-vulnerabilities", &args.fail_on_vulnerabilities)? {
        config.fail_on_vulnerabilities = fail;
    }
    if let Some(enabled) = parse_flag("issue", &args.issue)? {
        config.issue.enabled = enabled;
    }
    if let Some(title) = non_empty(args.issue_title.clone()) {
        config.issue.title = title;
    }
    if let Some(labels) = non_empty(args.issue_label.clone()) {
        config.issue.labels = parse_list(&labels);
    }
    if let Some(assignees) = non_empty(args.issue_assignee.clone()) {
        config.issue.assignees = parse_list(&assignees);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Boolean inputs arrive as text; blank means unset.
fn parse_flag(name: &str, value: &Option<String>) -> Result<Option<bool>> {
    let Some(raw) = non_empty(value.clone()) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => anyhow::bail!("invalid value '{}' for --{}: expected true or false", raw, name),
    }
}

fn handle_config(config_path: &Path, init: bool, show_path: bool) -> Result<()> {
    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save_to(config_path)?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'trivy-issue config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

fn clear_cache(bin_dir: &Path) -> Result<()> {
    let executable = bin_dir.join(EXECUTABLE_NAME);
    if executable.exists() {
        std::fs::remove_file(&executable)
            .with_context(|| format!("Failed to remove {}", executable.display()))?;
        println!("Removed {}", executable.display());
    } else {
        println!("Cache is empty.");
    }
    Ok(())
}
