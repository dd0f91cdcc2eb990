use std::sync::Arc;

use surveyor_application::use_cases::TrackingUseCase;
use surveyor_infrastructure::asn::AsnCacheImpl;
use surveyor_infrastructure::graph::GraphStore;

/// `surveyor track` (§4.8, §6): diffs successive enumeration events for the
/// given scope domains and prints the result as JSON lines.
pub struct TrackArgs {
    pub domains: Vec<String>,
    pub want_asn_info: bool,
    pub history: bool,
}

pub async fn run(graph: Arc<GraphStore>, args: TrackArgs) -> anyhow::Result<()> {
    let asn_cache = Arc::new(AsnCacheImpl::empty());
    let tracking = TrackingUseCase::new(graph, asn_cache);

    let domains = if args.domains.is_empty() {
        None
    } else {
        Some(args.domains.as_slice())
    };
    let events = tracking.list_events(domains).await?;
    if events.is_empty() {
        println!("[]");
        return Ok(());
    }

    if args.history {
        let diffs = tracking.history(&events, args.want_asn_info).await?;
        println!("{}", serde_json::to_string_pretty(&diffs_to_json(&diffs))?);
        return Ok(());
    }

    let target = events[0];
    let prior = &events[1..];
    let diffs = tracking
        .cumulative(prior, target, args.want_asn_info)
        .await?;
    println!("{}", serde_json::to_string_pretty(&diff_entries_to_json(&diffs))?);
    Ok(())
}

fn diffs_to_json(
    diffs: &[Vec<surveyor_application::use_cases::DiffEntry>],
) -> Vec<serde_json::Value> {
    diffs.iter().map(|d| diff_entries_to_json(d)).collect()
}

fn diff_entries_to_json(
    entries: &[surveyor_application::use_cases::DiffEntry],
) -> serde_json::Value {
    use surveyor_application::use_cases::DiffEntry;
    use serde_json::json;

    let items: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| match entry {
            DiffEntry::Found { name, new_addrs } => json!({
                "kind": "found",
                "name": name,
                "addresses": new_addrs.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
            DiffEntry::Moved {
                name,
                old_addrs,
                new_addrs,
            } => json!({
                "kind": "moved",
                "name": name,
                "old_addresses": old_addrs.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "new_addresses": new_addrs.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
            DiffEntry::Removed { name, old_addrs } => json!({
                "kind": "removed",
                "name": name,
                "addresses": old_addrs.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
        })
        .collect();
    serde_json::Value::Array(items)
}
