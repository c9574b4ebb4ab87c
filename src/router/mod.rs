//! Client-side router.
//!
//! Maps a URL path to a [`PageState`] and keeps the session history in
//! step with in-app navigation. Link clicks and back/forward traversal
//! both end up in [`Router::navigate`].

pub mod history;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};
use url::Url;

pub use history::SessionHistory;

use crate::consts::{WORKER_SCOPE, WORKER_SCRIPT};
use crate::pages::{MainController, PageView};
use crate::worker::container::WorkerRegistry;

/// Which page template and controller are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    Index,
    Details,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageState::Index => write!(f, "index"),
            PageState::Details => write!(f, "details"),
        }
    }
}

impl FromStr for PageState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(PageState::Index),
            "details" => Ok(PageState::Details),
            other => Err(format!("unknown page state: {other}")),
        }
    }
}

/// Exact path to page state.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, PageState>,
}

impl RouteTable {
    pub fn new(routes: &[(&str, PageState)]) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|(path, state)| (path.to_string(), *state))
                .collect(),
        }
    }

    pub fn lookup(&self, path: &str) -> Option<PageState> {
        self.routes.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(&[("/", PageState::Index), ("/restaurant/", PageState::Details)])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// What a call to [`Router::navigate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// New history entry pushed, page state changed.
    Pushed,
    /// Target was the current location: state changed, history untouched.
    Current,
    /// Target is on another origin. Nothing happened.
    CrossOrigin,
}

/// What happened to a link click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not intercepted; the default link behavior applies.
    Default,
    /// Default suppressed and routed internally.
    Routed(Navigation),
}

pub struct Router<V: PageView> {
    routes: RouteTable,
    history: SessionHistory,
    controller: MainController<V>,
}

impl<V: PageView> Router<V> {
    /// A router for a document loaded at `location`, with the default routes.
    pub fn new(location: Url, view: V) -> Self {
        Self::with_routes(RouteTable::default(), location, view)
    }

    pub fn with_routes(routes: RouteTable, location: Url, view: V) -> Self {
        Self {
            routes,
            history: SessionHistory::new(location),
            controller: MainController::new(view),
        }
    }

    /// Render the current location, then register the offline worker if
    /// the host offers registration. Registration failures are logged only.
    pub async fn init(
        &mut self,
        workers: Option<&dyn WorkerRegistry>,
    ) -> Result<Navigation, RouteError> {
        let location = self.location().to_string();
        let navigation = self.navigate(&location).await?;

        match workers {
            Some(registry) => {
                if let Err(e) = registry.register(WORKER_SCRIPT, WORKER_SCOPE).await {
                    warn!(error = %e, "offline worker registration failed");
                }
            }
            None => debug!("worker registration unavailable, skipping"),
        }

        Ok(navigation)
    }

    /// Navigate to an absolute or relative URL. Same-origin targets push a
    /// history entry (unless already current) and change the page state.
    pub async fn navigate(&mut self, url: &str) -> Result<Navigation, RouteError> {
        let target = self.resolve(url)?;

        if target.origin() != self.location().origin() {
            debug!(url = %target, "cross-origin navigation ignored");
            return Ok(Navigation::CrossOrigin);
        }

        let navigation = if &target != self.location() {
            self.history.push_state(target.clone());
            Navigation::Pushed
        } else {
            Navigation::Current
        };

        self.change_state(&target).await;
        Ok(navigation)
    }

    /// Look up the path and hand the resulting state to the main controller.
    /// Unknown paths leave no page state.
    pub async fn change_state(&mut self, url: &Url) -> Option<PageState> {
        let state = self.routes.lookup(url.path());
        match state {
            Some(state) => info!(path = url.path(), %state, "page state changed"),
            None => warn!(path = url.path(), "no route for path"),
        }
        self.controller.set_state(state, url).await;
        state
    }

    /// Handle a click on a link with the given `href` attribute.
    pub async fn click(&mut self, href: &str) -> Result<ClickOutcome, RouteError> {
        if href.starts_with('#') {
            return Ok(ClickOutcome::Default);
        }

        let target = self.resolve(href)?;
        if target.origin() != self.location().origin() {
            return Ok(ClickOutcome::Default);
        }

        let navigation = self.navigate(target.as_str()).await?;
        Ok(ClickOutcome::Routed(navigation))
    }

    /// History already moved; re-render whatever is current now.
    pub async fn popstate(&mut self) -> Result<Navigation, RouteError> {
        let location = self.location().to_string();
        self.navigate(&location).await
    }

    /// Traverse one entry back. `None` at the start of history.
    pub async fn back(&mut self) -> Result<Option<Navigation>, RouteError> {
        if !self.history.back() {
            return Ok(None);
        }
        self.popstate().await.map(Some)
    }

    /// Traverse one entry forward. `None` at the end of history.
    pub async fn forward(&mut self) -> Result<Option<Navigation>, RouteError> {
        if !self.history.forward() {
            return Ok(None);
        }
        self.popstate().await.map(Some)
    }

    /// Re-render the current location without touching history.
    pub async fn reload(&mut self) -> Option<PageState> {
        let location = self.location().clone();
        self.change_state(&location).await
    }

    fn resolve(&self, url: &str) -> Result<Url, RouteError> {
        self.location()
            .join(url)
            .map_err(|source| RouteError::InvalidUrl {
                url: url.to_string(),
                source,
            })
    }

    pub fn location(&self) -> &Url {
        self.history.location()
    }

    pub fn state(&self) -> Option<PageState> {
        self.controller.state()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn view(&self) -> &V {
        self.controller.view()
    }

    pub fn view_mut(&mut self) -> &mut V {
        self.controller.view_mut()
    }
}
