//! Session redirect coordination.
//!
//! A single application-scoped gate between the networking stack and the
//! frontend. Concurrent authentication failures all funnel through here; the
//! guard flag lets only the first one dispatch a navigation and a
//! notification, and a reset timer reopens the gate after a cool-down whether
//! or not the navigation actually happened.
//!
//! The coordinator is constructed once at startup and handed to the API
//! client by injection (`Arc`), so deeply nested networking code can reach
//! the frontend without threading callbacks through every call site.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use crate::auth::policy::{SESSION_EXPIRED_ROUTE, SIGN_IN_ROUTE};

/// Delay between the notification and the navigation dispatch.
const SESSION_EXPIRED_DEBOUNCE: Duration = Duration::from_millis(500);

/// Cool-down after which the guard reopens, whether or not navigation ran.
const SESSION_EXPIRED_RESET: Duration = Duration::from_millis(2000);

/// Debounce before the login navigation fires.
const LOGIN_DEBOUNCE: Duration = Duration::from_millis(100);

/// Cool-down for the login redirect guard.
const LOGIN_RESET: Duration = Duration::from_millis(1000);

/// How long the session-expired notification stays visible.
const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Message shown when the session cannot be refreshed.
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Notification severity, forwarded to whatever frontend is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Navigation callback: target route and whether to replace the current
/// history entry.
pub type NavigateFn = Arc<dyn Fn(&str, bool) + Send + Sync>;

/// Notification callback: message, severity, display duration.
pub type NotifyFn = Arc<dyn Fn(&str, Severity, Duration) + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    navigate: Option<NavigateFn>,
    notify: Option<NotifyFn>,
}

pub struct RedirectCoordinator {
    redirecting: Mutex<bool>,
    callbacks: Mutex<Callbacks>,
    // Handle to self for the timer tasks; weak, so pending timers never keep
    // a torn-down coordinator alive.
    weak_self: Weak<Self>,
}

impl RedirectCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            redirecting: Mutex::new(false),
            callbacks: Mutex::new(Callbacks::default()),
            weak_self: weak.clone(),
        })
    }

    /// Register the frontend's navigation handler. Called at startup.
    pub fn register_navigation(&self, navigate: NavigateFn) {
        self.callbacks.lock().unwrap().navigate = Some(navigate);
    }

    /// Register the frontend's notification handler. Called at startup.
    pub fn register_notifier(&self, notify: NotifyFn) {
        self.callbacks.lock().unwrap().notify = Some(notify);
    }

    /// Reset both callbacks, e.g. on frontend teardown. Redirects requested
    /// afterwards degrade to log lines.
    pub fn unregister(&self) {
        let mut callbacks = self.callbacks.lock().unwrap();
        callbacks.navigate = None;
        callbacks.notify = None;
    }

    /// Dispatch the session-expired flow: one toast, one navigation to the
    /// session-expired route. Repeated calls inside the guard window are
    /// dropped.
    pub fn redirect_to_session_expired(&self) {
        self.dispatch(
            SESSION_EXPIRED_ROUTE,
            Some(SESSION_EXPIRED_MESSAGE),
            SESSION_EXPIRED_DEBOUNCE,
            SESSION_EXPIRED_RESET,
        );
    }

    /// Dispatch a redirect to the sign-in route, without a toast.
    pub fn redirect_to_login(&self) {
        self.dispatch(SIGN_IN_ROUTE, None, LOGIN_DEBOUNCE, LOGIN_RESET);
    }

    fn dispatch(
        &self,
        route: &'static str,
        toast: Option<&'static str>,
        debounce: Duration,
        reset: Duration,
    ) {
        {
            let mut redirecting = self.redirecting.lock().unwrap();
            if *redirecting {
                debug!(route, "redirect already in flight, dropping duplicate");
                return;
            }
            *redirecting = true;
        }

        if let Some(message) = toast {
            let notify = self.callbacks.lock().unwrap().notify.clone();
            match notify {
                Some(notify) => notify(message, Severity::Warning, TOAST_DURATION),
                None => debug!(toast = message, "no notifier registered, dropping toast"),
            }
        }

        // Both timers hold only a weak handle: dropping the coordinator
        // cancels whatever is still pending.
        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(coordinator) = weak.upgrade() {
                coordinator.navigate(route);
            }
        });

        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(reset).await;
            if let Some(coordinator) = weak.upgrade() {
                *coordinator.redirecting.lock().unwrap() = false;
                debug!(route, "redirect guard reset");
            }
        });
    }

    fn navigate(&self, route: &str) {
        let navigate = self.callbacks.lock().unwrap().navigate.clone();
        match navigate {
            Some(navigate) => navigate(route, true),
            // No frontend registered: surface the intent in the log so the
            // session teardown is still visible.
            None => warn!(route, "session redirect requested with no navigation handler"),
        }
    }
}
