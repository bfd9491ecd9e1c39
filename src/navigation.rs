//! Navigation between screens and the top-level error handler.
//!
//! [ErrorHandler] is the only place that reacts to [Error::Unauthorized]: it
//! ends the session, drops everything cached for it and sends the user to
//! [Route::Auth].

use tokio::sync::watch;

use crate::{Alert, Error, QueryCache, Session};

/// A screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Log in or register.
    Auth,
    /// The overview of the current month.
    Dashboard,
    /// Search, add and delete transactions.
    Transactions,
    /// Import transactions from a CSV file.
    Upload,
    /// Set and review monthly budgets.
    Budgets,
    /// AI spending insights.
    Insights,
    /// Month by month spending summaries.
    History,
    /// Account settings.
    Settings,
}

impl Route {
    /// The routes shown in the navigation bar, in order.
    pub const NAV_ROUTES: [Route; 7] = [
        Route::Dashboard,
        Route::Transactions,
        Route::Upload,
        Route::Budgets,
        Route::Insights,
        Route::History,
        Route::Settings,
    ];

    /// The URL path of the route, e.g. "/budgets".
    pub fn path(self) -> &'static str {
        match self {
            Route::Auth => "/auth",
            Route::Dashboard => "/dashboard",
            Route::Transactions => "/transactions",
            Route::Upload => "/upload",
            Route::Budgets => "/budgets",
            Route::Insights => "/insights",
            Route::History => "/history",
            Route::Settings => "/settings",
        }
    }

    /// The name shown in the navigation bar.
    pub fn title(self) -> &'static str {
        match self {
            Route::Auth => "Log in",
            Route::Dashboard => "Dashboard",
            Route::Transactions => "Transactions",
            Route::Upload => "Upload",
            Route::Budgets => "Budgets",
            Route::Insights => "AI Insights",
            Route::History => "History",
            Route::Settings => "Settings",
        }
    }

    /// Whether the route can only be shown to a logged in user.
    pub fn requires_session(self) -> bool {
        self != Route::Auth
    }
}

/// A link in the navigation bar.
///
/// Only one link should be current at any one time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    /// The route the link goes to.
    pub route: Route,
    /// The text of the link.
    pub title: &'static str,
    /// Whether this link is for the route being shown.
    pub is_current: bool,
}

/// The navigation bar links with the link for `current` marked as current.
pub fn nav_links(current: Route) -> Vec<NavLink> {
    Route::NAV_ROUTES
        .into_iter()
        .map(|route| NavLink {
            route,
            title: route.title(),
            is_current: route == current,
        })
        .collect()
}

/// Tracks the current route. Cloning gives another handle to the same navigator.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: watch::Sender<Route>,
}

impl Navigator {
    /// Create a navigator showing `start`.
    pub fn new(start: Route) -> Self {
        let (current, _) = watch::channel(start);
        Self { current }
    }

    /// Start on the dashboard if `session` is logged in, otherwise on the log in screen.
    pub fn for_session(session: &Session) -> Self {
        Self::new(if session.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Auth
        })
    }

    /// The route being shown.
    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    /// Show `route`. Watchers are notified even if it is already shown.
    pub fn navigate(&self, route: Route) {
        tracing::debug!("navigating to {}", route.path());
        self.current.send_replace(route);
    }

    /// Observe route changes.
    pub fn watch(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

/// Turns errors into alerts for the user, and ends the session when the
/// Finance Service no longer accepts it.
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    session: Session,
    cache: QueryCache,
    navigator: Navigator,
}

impl ErrorHandler {
    /// Create a handler that tears down `session` and `cache` on a 401.
    pub fn new(session: Session, cache: QueryCache, navigator: Navigator) -> Self {
        Self {
            session,
            cache,
            navigator,
        }
    }

    /// The navigator that [ErrorHandler::handle] sends to [Route::Auth].
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Handle an error that reached the top level and return the alert to show.
    ///
    /// On [Error::Unauthorized] the session and its stored credentials are
    /// cleared, the cache is emptied and the navigator is sent to [Route::Auth].
    pub fn handle(&self, error: Error) -> Alert {
        if error == Error::Unauthorized {
            tracing::info!("session rejected by the Finance Service, logging out");
            self.cache.clear();

            if let Err(clear_error) = self.session.clear() {
                tracing::error!("could not delete stored credentials: {clear_error}");
            }

            self.navigator.navigate(Route::Auth);
        }

        error.into_alert()
    }
}
