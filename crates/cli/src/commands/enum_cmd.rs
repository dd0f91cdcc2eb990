use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use surveyor_application::ports::data_source::DataSource;
use surveyor_domain::config::Config;
use surveyor_domain::nodes::{Source, SourceTag};

use surveyor_infrastructure::asn::AsnCacheImpl;
use surveyor_infrastructure::datasource::{DataSourceRuntime, Registry, StaticListSource};
use surveyor_infrastructure::eventbus::Bus;
use surveyor_infrastructure::graph::GraphStore;
use surveyor_infrastructure::namegen::{AlterationConfig, NameGenerator};
use surveyor_infrastructure::resolver::Pool;
use surveyor_infrastructure::scheduler::{seed_brute_force, Candidate, Scheduler};

const DEFAULT_RESOLVER_PORT: u16 = 53;
const MARKOV_NGRAM: usize = 3;
const MIN_FLIP_LEN: usize = 3;
const FUZZY_EDIT_DISTANCE: u32 = 1;
const DEFAULT_QPS_PER_RESOLVER: u32 = 20;

/// Everything `surveyor enum` needs beyond the parsed `Config` (§6
/// `enum`-specific flags this pass wires end to end).
pub struct EnumArgs {
    pub names: Vec<String>,
    pub wordlist: Vec<String>,
    pub alt_wordlist: Vec<String>,
}

pub async fn run(config: Config, args: EnumArgs) -> anyhow::Result<()> {
    let resolver_addrs = resolve_addrs(&config.options.resolvers)?;
    let resolver = Arc::new(Pool::new(resolver_addrs, DEFAULT_QPS_PER_RESOLVER)?);
    let graph = Arc::new(GraphStore::new());
    let event_bus = Arc::new(Bus::new());
    let asn_cache = Arc::new(AsnCacheImpl::empty());

    let name_generator = Arc::new(NameGenerator::new(
        AlterationConfig {
            wordlist: args.alt_wordlist,
            min_flip_len: MIN_FLIP_LEN,
            edit_distance: FUZZY_EDIT_DISTANCE,
        },
        MARKOV_NGRAM,
    ));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("received interrupt, cancelling run");
                cancel.cancel();
            }
        });
    }

    let scheduler = Scheduler::new(
        graph,
        resolver,
        event_bus,
        name_generator,
        args.wordlist.clone(),
        cancel.clone(),
    );

    let cli_source = Source {
        name: "cli".to_string(),
        tag: SourceTag::Api,
    };
    let mut initial: Vec<Candidate> = args
        .names
        .iter()
        .map(|n| Candidate::new(n.clone(), cli_source.clone()))
        .collect();

    if config.options.brute_force {
        let brute_source = Source {
            name: "bruteforce".to_string(),
            tag: SourceTag::Dns,
        };
        initial.extend(seed_brute_force(&config.scope, &args.wordlist, brute_source));
    }

    if config.options.passive {
        initial.extend(run_data_sources(&config).await);
    }

    info!(candidates = initial.len(), "starting enumeration run");
    let event_id = scheduler.run(&config, initial).await?;
    info!(event = %event_id, "enumeration run finished");

    Ok(())
}

/// Runs every passive data source to completion up front and returns the
/// names they found as candidates. A production run would feed these into
/// the pipeline as they stream in rather than buffering; buffering here
/// keeps the CLI wiring in this pass straightforward (see DESIGN.md).
async fn run_data_sources(config: &Config) -> Vec<Candidate> {
    let sources: Vec<Arc<dyn DataSource>> = vec![Arc::new(StaticListSource::new(
        "demo-fixtures",
        Vec::new(),
        10,
    ))];
    let registry = Registry::new(sources);
    let resolved = registry.resolve(&config.options.source_filter);
    let runtime = DataSourceRuntime::new(resolved);

    let (tx, mut rx) = mpsc::channel(256);
    let cancel = CancellationToken::new();
    for domain in config.scope.domains_in_scope() {
        runtime.run(domain, tx.clone(), cancel.clone()).await;
    }
    drop(tx);

    let mut candidates = Vec::new();
    while let Some(found) = rx.recv().await {
        candidates.push(Candidate::new(
            found.name,
            Source {
                name: found.source_name,
                tag: found.tag,
            },
        ));
    }
    candidates
}

fn resolve_addrs(resolvers: &[String]) -> anyhow::Result<Vec<SocketAddr>> {
    if resolvers.is_empty() {
        return Ok(vec![
            SocketAddr::from(([8, 8, 8, 8], DEFAULT_RESOLVER_PORT)),
            SocketAddr::from(([1, 1, 1, 1], DEFAULT_RESOLVER_PORT)),
        ]);
    }
    resolvers
        .iter()
        .map(|r| parse_resolver_addr(r))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

fn parse_resolver_addr(raw: &str) -> Result<SocketAddr, std::net::AddrParseError> {
    if raw.contains(':') {
        raw.parse()
    } else {
        format!("{raw}:{DEFAULT_RESOLVER_PORT}").parse()
    }
}
