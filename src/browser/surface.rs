use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Opaque handle to a live DOM node, minted by the transport. Handles go
/// stale whenever the SPA re-renders the subtree they point into; stale
/// handles must be re-acquired by identity, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub u64);

impl NodeRef {
    /// The document root. Queries against it are page-global.
    pub const DOCUMENT: NodeRef = NodeRef(0);

    pub fn is_document(&self) -> bool {
        *self == Self::DOCUMENT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Synthetic activation used when the standard click is swallowed by the
/// page's own event delegation. Transports run it against a single element.
pub const FORCE_CLICK_SCRIPT: &str = "(el) => el.click()";

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("stale node reference {0:?}")]
    StaleNode(NodeRef),

    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("browser transport failure: {0}")]
    Transport(String),
}

/// Capability surface of the browser transport. One implementor drives one
/// page; callers never issue concurrent operations against the same page.
/// Everything the extraction engine knows about the DOM flows through here,
/// which is also what makes the engine testable without a real browser.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    /// First match of `selector` strictly inside `root`'s subtree.
    async fn query(&self, root: NodeRef, selector: &str)
        -> Result<Option<NodeRef>, BrowserError>;

    /// All matches of `selector` strictly inside `root`'s subtree, in
    /// document order.
    async fn query_all(&self, root: NodeRef, selector: &str)
        -> Result<Vec<NodeRef>, BrowserError>;

    /// Whether `node` lives inside `ancestor`'s subtree. Used as the hard
    /// containment check on every resolved candidate.
    async fn contains(&self, ancestor: NodeRef, node: NodeRef) -> Result<bool, BrowserError>;

    async fn text(&self, node: NodeRef) -> Result<String, BrowserError>;

    async fn attribute(&self, node: NodeRef, name: &str)
        -> Result<Option<String>, BrowserError>;

    async fn is_visible(&self, node: NodeRef) -> Result<bool, BrowserError>;

    async fn click(&self, node: NodeRef) -> Result<(), BrowserError>;

    /// Evaluates a script, optionally against a target element.
    async fn evaluate(&self, script: &str, target: Option<NodeRef>)
        -> Result<Value, BrowserError>;

    async fn dispatch_key(&self, key: &str) -> Result<(), BrowserError>;

    async fn scroll_into_view(&self, node: NodeRef) -> Result<(), BrowserError>;

    async fn scroll_by(&self, delta_y: i64) -> Result<(), BrowserError>;

    async fn read_cookies(&self, url: &str) -> Result<Vec<Cookie>, BrowserError>;
}
