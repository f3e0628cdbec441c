use std::sync::Arc;

use crate::browser::surface::{BrowserError, BrowserPage, NodeRef};
use crate::config::SessionConfig;
use crate::domain::SessionState;
use crate::selectors::resolver::SelectorResolver;
use crate::selectors::table::Namespace;

/// Determines login state from page signals, negative signal first.
///
/// The ordering is an invariant, not a style choice: positive signals
/// (avatar, profile fragments) can survive in cached DOM after a logout,
/// but a visible login prompt cannot be produced for an authenticated
/// session. The prompt is therefore checked first and trusted
/// unconditionally; reordering these checks reintroduces false positives.
pub struct SessionStateDetector {
    page: Arc<dyn BrowserPage>,
    resolver: Arc<SelectorResolver>,
    config: SessionConfig,
    home_url: String,
}

const PROMPT_FIELDS: [&str; 2] = ["login_prompt", "qr_code"];

impl SessionStateDetector {
    pub fn new(
        page: Arc<dyn BrowserPage>,
        resolver: Arc<SelectorResolver>,
        config: SessionConfig,
        home_url: String,
    ) -> Self {
        Self {
            page,
            resolver,
            config,
            home_url,
        }
    }

    /// Synchronous-on-demand evaluation. Callers re-run this on every
    /// navigation and after any overlay open, since both can independently
    /// raise a login prompt.
    pub async fn check(&self) -> Result<SessionState, BrowserError> {
        if self.login_prompt_visible().await? {
            tracing::debug!(target: "session", "login prompt visible, session is logged out");
            return Ok(SessionState::LoggedOut);
        }

        let cookies = self.page.read_cookies(&self.home_url).await?;
        let authenticated = cookies.iter().any(|cookie| {
            !cookie.value.is_empty()
                && self
                    .config
                    .auth_cookie_names
                    .iter()
                    .any(|name| name == &cookie.name)
        });
        if authenticated {
            return Ok(SessionState::LoggedIn);
        }

        Ok(SessionState::Unknown)
    }

    async fn login_prompt_visible(&self) -> Result<bool, BrowserError> {
        for field in PROMPT_FIELDS {
            if self
                .resolver
                .visible_node(NodeRef::DOCUMENT, Namespace::Login, field)
                .await?
                .is_some()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
