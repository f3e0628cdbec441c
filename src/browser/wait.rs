use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::browser::surface::{BrowserError, BrowserPage, NodeRef};
use crate::selectors::resolver::SelectorResolver;
use crate::selectors::table::Namespace;

/// Polls until the resolver yields a node for (ns, field) under `scope`, or
/// the bound elapses. Bounded by construction; the only unbounded wait in
/// the crate is the login suspension, which lives elsewhere.
pub async fn wait_for_field(
    resolver: &SelectorResolver,
    scope: NodeRef,
    ns: Namespace,
    field: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<Option<NodeRef>, BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(node) = resolver.node(scope, ns, field).await? {
            return Ok(Some(node));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(poll).await;
    }
}

/// Polls until no candidate for (ns, field) matches any longer. Returns
/// `true` once gone, `false` if it is still present when the bound elapses.
pub async fn wait_for_field_gone(
    resolver: &SelectorResolver,
    scope: NodeRef,
    ns: Namespace,
    field: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<bool, BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        if resolver.node(scope, ns, field).await?.is_none() {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(poll).await;
    }
}

/// Raw-selector variant for callers that hold a single selector rather than
/// a configured field.
pub async fn wait_for_selector(
    page: &Arc<dyn BrowserPage>,
    scope: NodeRef,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<Option<NodeRef>, BrowserError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(node) = page.query(scope, selector).await? {
            return Ok(Some(node));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(poll).await;
    }
}
