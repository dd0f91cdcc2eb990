use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use surveyor_application::ports::data_source::{DataSource, FoundName};

/// Drives every active data source for one domain, enforcing each source's
/// declared rate limit and forwarding discoveries into the scheduler's
/// ingress channel with provenance attached (§4.5).
pub struct DataSourceRuntime {
    sources: Vec<Arc<dyn DataSource>>,
}

impl DataSourceRuntime {
    pub fn new(sources: Vec<Arc<dyn DataSource>>) -> Self {
        Self { sources }
    }

    pub async fn run(
        &self,
        domain: &str,
        out: mpsc::Sender<FoundName>,
        cancel: CancellationToken,
    ) {
        let mut handles = Vec::new();
        for source in &self.sources {
            let source = Arc::clone(source);
            let out = out.clone();
            let cancel = cancel.clone();
            let domain = domain.to_string();
            handles.push(tokio::spawn(async move {
                run_one(source, domain, out, cancel).await;
            }));
        }
        for h in handles {
            let _ = h.await;
        }
    }
}

async fn run_one(
    source: Arc<dyn DataSource>,
    domain: String,
    out: mpsc::Sender<FoundName>,
    cancel: CancellationToken,
) {
    let interval = Duration::from_secs_f64(1.0 / source.rate_limit().max(1) as f64);
    let mut stream = source.query(&domain, cancel.clone()).await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            item = stream.next() => {
                match item {
                    None => break,
                    Some(Ok(found)) => {
                        if out.send(found).await.is_err() {
                            break;
                        }
                        tokio::time::sleep(interval).await;
                    }
                    Some(Err(e)) => {
                        warn!(source = source.name(), error = %e, "data source error");
                    }
                }
            }
        }
    }
}
