mod bootstrap;
mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use surveyor_domain::config::CliOverrides;
use surveyor_domain::errors::{ConfigError, EngineError};

use bootstrap::logging::LoggingOverrides;

/// Attack-surface mapping and subdomain enumeration engine.
#[derive(Parser)]
#[command(name = "surveyor", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Root domains to enumerate, comma-separated or repeated (-d).
    #[arg(short = 'd', long = "domain", global = true, value_delimiter = ',')]
    domains: Vec<String>,

    /// File of newline-separated root domains (-df).
    #[arg(long = "df", global = true)]
    domain_file: Option<PathBuf>,

    /// Path to the config file (-config).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Working directory for config/output/graph resolution (-dir).
    #[arg(long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    /// Output file (-o).
    #[arg(short = 'o', long = "output", global = true)]
    output: Option<PathBuf>,

    /// Emit JSON instead of human-readable text (-json).
    #[arg(long = "json", global = true)]
    json: bool,

    /// Log level override (-log).
    #[arg(long = "log", global = true)]
    log: Option<String>,

    /// Disable ANSI color (-nocolor).
    #[arg(long = "nocolor", global = true)]
    no_color: bool,

    /// Suppress all logging (-silent).
    #[arg(long = "silent", global = true)]
    silent: bool,

    /// Increase verbosity; repeatable (-v).
    #[arg(short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Wall-clock deadline in minutes, overriding the config file
    /// (-timeout).
    #[arg(long = "timeout", global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an enumeration (passive + active discovery, alterations,
    /// recursive brute force).
    Enum {
        #[arg(long = "active")]
        active: bool,
        #[arg(long = "passive")]
        passive: bool,
        #[arg(long = "brute")]
        brute: bool,
        #[arg(short = 'w', long = "wordlist")]
        wordlist: Option<PathBuf>,
        #[arg(long = "noalts")]
        no_alterations: bool,
        #[arg(long = "aw", long = "alt-wordlist")]
        alt_wordlist: Option<PathBuf>,
        #[arg(long = "norecursive")]
        no_recursive: bool,
        #[arg(long = "min-for-recursive")]
        min_for_recursive: Option<usize>,
        #[arg(long = "max-dns-queries")]
        max_dns_queries: Option<usize>,
        #[arg(short = 'r', long = "resolvers", value_delimiter = ',')]
        resolvers: Vec<String>,
        #[arg(long = "src")]
        include_unresolvable: bool,
        #[arg(long = "bl", value_delimiter = ',')]
        blacklist: Vec<String>,
        #[arg(long = "include", value_delimiter = ',')]
        include_sources: Vec<String>,
        #[arg(long = "exclude", value_delimiter = ',')]
        exclude_sources: Vec<String>,
        #[arg(long = "include-unresolvable")]
        include_unresolvable_flag: bool,
        #[arg(long = "public-dns")]
        public_dns: bool,
    },
    /// Diff successive enumeration events for tracked domains.
    Track {
        #[arg(long = "history")]
        history: bool,
        #[arg(long = "asninfo")]
        asn_info: bool,
    },
    /// Inspect the on-disk graph store.
    Db,
    /// List confirmed subdomains from the most recent event.
    Subs,
    /// List confirmed email addresses discovered during enumeration.
    Emails,
    /// Query the graph for raw DNS records.
    Dns,
    /// Export a visualization of the finding graph.
    Viz,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if e.downcast_ref::<ConfigError>().is_some()
                || matches!(e.downcast_ref::<EngineError>(), Some(EngineError::Config(_)))
            {
                eprintln!("configuration error: {e}");
                ExitCode::from(2)
            } else {
                eprintln!("error: {e}");
                ExitCode::from(1)
            }
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let overrides = build_overrides(&cli);
    let mut config = bootstrap::load_config(cli.config.as_deref(), &cli.dir, overrides)?;
    if let Some(minutes) = cli.timeout {
        config.options.timeout_minutes = minutes;
    }

    bootstrap::init_logging(
        &config.logging,
        &LoggingOverrides {
            level: cli.log.clone(),
            json: cli.json,
            no_color: cli.no_color,
            silent: cli.silent,
            verbosity: cli.verbose,
        },
    );

    match cli.command {
        Command::Enum {
            wordlist,
            alt_wordlist,
            ..
        } => {
            let names = domain_names(&cli.domains, cli.domain_file.as_deref())?;
            let wordlist = load_wordlist(wordlist.as_deref())?;
            let alt_wordlist = load_wordlist(alt_wordlist.as_deref())?;
            commands::enum_cmd::run(
                config,
                commands::EnumArgs {
                    names,
                    wordlist,
                    alt_wordlist,
                },
            )
            .await
        }
        Command::Track { history, asn_info } => {
            let graph = std::sync::Arc::new(surveyor_infrastructure::graph::GraphStore::new());
            commands::track_cmd::run(
                graph,
                commands::TrackArgs {
                    domains: config.scope.domains.clone(),
                    want_asn_info: asn_info,
                    history,
                },
            )
            .await
        }
        Command::Db | Command::Subs | Command::Emails | Command::Dns | Command::Viz => {
            anyhow::bail!("this subcommand is not yet implemented")
        }
    }
}

fn build_overrides(cli: &Cli) -> CliOverrides {
    let domains = if cli.domains.is_empty() {
        None
    } else {
        Some(cli.domains.clone())
    };

    let (active, passive, brute_force, alterations, recursive, min_for_recursive, max_dns_queries, resolvers, include_unresolvable, public_dns, blacklist) =
        match &cli.command {
            Command::Enum {
                active,
                passive,
                brute,
                no_alterations,
                no_recursive,
                min_for_recursive,
                max_dns_queries,
                resolvers,
                include_unresolvable,
                include_unresolvable_flag,
                public_dns,
                blacklist,
                ..
            } => (
                Some(*active).filter(|v| *v),
                Some(*passive).filter(|v| *v),
                Some(*brute).filter(|v| *v),
                Some(!*no_alterations),
                Some(!*no_recursive),
                *min_for_recursive,
                *max_dns_queries,
                if resolvers.is_empty() {
                    None
                } else {
                    Some(resolvers.clone())
                },
                Some(*include_unresolvable || *include_unresolvable_flag).filter(|v| *v),
                Some(*public_dns).filter(|v| *v),
                if blacklist.is_empty() {
                    None
                } else {
                    Some(blacklist.clone())
                },
            ),
            _ => (None, None, None, None, None, None, None, None, None, None, None),
        };

    CliOverrides {
        domains,
        blacklist,
        active,
        passive,
        brute_force,
        alterations,
        recursive,
        min_for_recursive,
        max_dns_queries,
        include_unresolvable,
        public_dns,
        resolvers,
        wordlists: None,
        silent: Some(cli.silent),
        log_level: cli.log.clone(),
    }
}

fn domain_names(domains: &[String], domain_file: Option<&std::path::Path>) -> anyhow::Result<Vec<String>> {
    let mut names = domains.to_vec();
    if let Some(path) = domain_file {
        let contents = std::fs::read_to_string(path)?;
        names.extend(contents.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from));
    }
    Ok(names)
}

fn load_wordlist(path: Option<&std::path::Path>) -> anyhow::Result<Vec<String>> {
    match path {
        None => Ok(Vec::new()),
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            Ok(contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from)
                .collect())
        }
    }
}
