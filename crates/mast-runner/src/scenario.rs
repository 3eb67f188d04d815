//! Scenario lifecycle
//!
//! One scenario is one independent test run against one fetched
//! resource. It moves through a small terminal state machine:
//!
//! ```text
//! Created --(wait)--> Waiting
//! Created --(open)--> Ready
//! Waiting | Ready --(execute)--> Executing --(pipeline settles)--> Done
//! ```
//!
//! `execute` is idempotent once the scenario has left the configurable
//! states, and the Executing to Done edge fires the completion signal
//! exactly once. Assertion callbacks registered with `then` run against
//! the built response before that edge.

use crate::fetch::{HttpRequest, ResourceFetcher};
use crate::suite::resolve_url;
use mast_core::{LogLine, LogType, MastError, ResponseKind, Result, SuiteConfig};
use mast_query::{AssertionSink, Navigable, Response, ResponseMeta};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;
use tracing::debug;
use url::Url;

/// Where a scenario is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    /// Nothing configured yet
    Created,
    /// Held back until the suite is told to execute
    Waiting,
    /// URL opened, ready to execute
    Ready,
    /// Fetch-and-assert pipeline in flight
    Executing,
    /// Terminal; the log is immutable from here on
    Done,
}

type AssertionCallback = Box<dyn Fn(&Response) + Send + Sync>;

/// One independent test run producing an ordered log of outcomes
pub struct Scenario {
    title: String,
    state: Mutex<ScenarioState>,
    kind: Mutex<ResponseKind>,
    url: Mutex<Option<String>>,
    method: Mutex<String>,
    form: Mutex<Option<Vec<(String, String)>>>,
    verify_ssl: Mutex<bool>,
    callbacks: Mutex<Vec<AssertionCallback>>,
    sink: AssertionSink,
    /// Live base shared with the owning suite; read at execute time so a
    /// base configured after scenario creation still applies
    base: Arc<RwLock<Option<Url>>>,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl Scenario {
    pub(crate) fn new(
        title: impl Into<String>,
        config: &SuiteConfig,
        base: Arc<RwLock<Option<Url>>>,
    ) -> Self {
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            title: title.into(),
            state: Mutex::new(ScenarioState::Created),
            kind: Mutex::new(ResponseKind::default()),
            url: Mutex::new(None),
            method: Mutex::new("get".to_string()),
            form: Mutex::new(None),
            verify_ssl: Mutex::new(config.verify_ssl),
            callbacks: Mutex::new(Vec::new()),
            sink: AssertionSink::new(),
            base,
            done_tx,
            done_rx,
        }
    }

    /// Standalone scenario with no owning suite, mostly for tests
    pub fn detached(title: impl Into<String>) -> Self {
        Self::new(title, &SuiteConfig::default(), Arc::new(RwLock::new(None)))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> ScenarioState {
        *self.state.lock().expect("state lock poisoned")
    }

    pub fn url(&self) -> Option<String> {
        self.url.lock().expect("url lock poisoned").clone()
    }

    /// Snapshot of the accumulated log
    pub fn log(&self) -> Vec<LogLine> {
        self.sink.lines()
    }

    pub fn sink(&self) -> &AssertionSink {
        &self.sink
    }

    // Configuration. Each setter returns the scenario for chaining.

    /// Point the scenario at a URL, resolved against the suite base at
    /// execute time
    pub fn open(&self, path: &str) -> &Self {
        *self.url.lock().expect("url lock poisoned") = Some(path.to_string());
        let mut state = self.state.lock().expect("state lock poisoned");
        if *state == ScenarioState::Created {
            *state = ScenarioState::Ready;
        }
        self
    }

    /// Hold this scenario in Waiting until explicitly executed
    pub fn wait(&self) -> &Self {
        let mut state = self.state.lock().expect("state lock poisoned");
        if matches!(*state, ScenarioState::Created | ScenarioState::Ready) {
            *state = ScenarioState::Waiting;
        }
        self
    }

    pub fn method(&self, method: &str) -> &Self {
        *self.method.lock().expect("method lock poisoned") = method.to_lowercase();
        self
    }

    pub fn form(&self, fields: Vec<(String, String)>) -> &Self {
        *self.form.lock().expect("form lock poisoned") = Some(fields);
        self
    }

    pub fn verify_ssl_cert(&self, verify: bool) -> &Self {
        *self.verify_ssl.lock().expect("verify_ssl lock poisoned") = verify;
        self
    }

    fn set_kind(&self, kind: ResponseKind) -> &Self {
        *self.kind.lock().expect("kind lock poisoned") = kind;
        self
    }

    pub fn kind(&self) -> ResponseKind {
        *self.kind.lock().expect("kind lock poisoned")
    }

    pub fn html(&self) -> &Self {
        self.set_kind(ResponseKind::Html)
    }

    pub fn json(&self) -> &Self {
        self.set_kind(ResponseKind::Json)
    }

    pub fn image(&self) -> &Self {
        self.set_kind(ResponseKind::Image)
    }

    pub fn stylesheet(&self) -> &Self {
        self.set_kind(ResponseKind::Stylesheet)
    }

    pub fn script(&self) -> &Self {
        self.set_kind(ResponseKind::Script)
    }

    pub fn video(&self) -> &Self {
        self.set_kind(ResponseKind::Video)
    }

    pub fn resource(&self) -> &Self {
        self.set_kind(ResponseKind::Resource)
    }

    pub fn browser(&self) -> &Self {
        self.set_kind(ResponseKind::Browser)
    }

    /// Register an assertion callback to run against the response once
    /// the fetch settles
    pub fn then(&self, callback: impl Fn(&Response) + Send + Sync + 'static) -> &Self {
        self.callbacks
            .lock()
            .expect("callbacks lock poisoned")
            .push(Box::new(callback));
        self
    }

    // Direct log lines, discarded once the scenario is Done

    pub fn pass(&self, message: &str) -> &Self {
        self.sink.pass(message);
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.sink.fail(message);
        self
    }

    pub fn comment(&self, message: &str) -> &Self {
        self.sink.comment(message);
        self
    }

    // Predicates, stable once Done

    pub fn is_done(&self) -> bool {
        self.state() == ScenarioState::Done
    }

    pub fn passed(&self) -> bool {
        !self.sink.has_failures()
    }

    pub fn failed(&self) -> bool {
        self.sink.has_failures()
    }

    /// Completion signal, resolved exactly once on the Executing to Done
    /// edge
    pub fn completion(&self) -> watch::Receiver<bool> {
        self.done_rx.clone()
    }

    /// Run the fetch-then-assert pipeline
    ///
    /// A no-op once the scenario has left its configurable states. Fetch
    /// failures become Fail log lines and the scenario still completes;
    /// usage errors (no URL, malformed body) additionally surface as
    /// `Err`.
    pub async fn execute(&self, fetcher: &dyn ResourceFetcher) -> Result<()> {
        {
            let mut state = self.state.lock().expect("state lock poisoned");
            match *state {
                ScenarioState::Executing | ScenarioState::Done => return Ok(()),
                _ => *state = ScenarioState::Executing,
            }
        }

        let path = match self.url() {
            Some(path) => path,
            None => {
                self.sink.fail("No URL opened");
                self.finish();
                return Err(MastError::ScenarioNotReady(format!(
                    "'{}' has no URL opened",
                    self.title
                )));
            }
        };
        let target = {
            let base = self.base.read().expect("base lock poisoned");
            resolve_url(base.as_ref(), &path)
        };
        let request = HttpRequest {
            url: target.clone(),
            method: self.method.lock().expect("method lock poisoned").clone(),
            headers: Vec::new(),
            form: self.form.lock().expect("form lock poisoned").clone(),
            verify_ssl: *self.verify_ssl.lock().expect("verify_ssl lock poisoned"),
        };
        debug!(title = %self.title, url = %target, "executing scenario");

        let resource = match fetcher.fetch(&request).await {
            Ok(resource) => resource,
            Err(err) => {
                self.sink.fail(format!("Failed to fetch {}: {}", target, err));
                self.finish();
                return Ok(());
            }
        };

        let meta = ResponseMeta {
            url: target,
            status: resource.status,
            headers: resource.headers,
            load_time_ms: resource.load_time_ms,
        };
        let response = match Response::new(self.kind(), resource.document, meta, self.sink.clone())
        {
            Ok(response) => response,
            Err(err) => {
                self.sink.fail(err.to_string());
                self.finish();
                return Err(err);
            }
        };

        let callbacks =
            std::mem::take(&mut *self.callbacks.lock().expect("callbacks lock poisoned"));
        for callback in &callbacks {
            callback(&response);
        }
        self.finish();
        Ok(())
    }

    fn finish(&self) {
        {
            let mut state = self.state.lock().expect("state lock poisoned");
            if *state == ScenarioState::Done {
                return;
            }
            *state = ScenarioState::Done;
        }
        // Log is immutable from here on; predicates stay stable
        self.sink.freeze();
        debug!(title = %self.title, passed = self.passed(), "scenario done");
        self.done_tx.send_replace(true);
    }

    /// Serializable summary for the suite report
    pub fn report(&self) -> ScenarioReport {
        let log = self.log();
        ScenarioReport {
            title: self.title.clone(),
            done: self.is_done(),
            pass_count: log.iter().filter(|l| l.log_type == LogType::Pass).count(),
            fail_count: log.iter().filter(|l| l.log_type == LogType::Fail).count(),
            log,
        }
    }
}

/// Simulated navigation hook for node-level click and submit
impl Navigable for Scenario {
    fn is_done(&self) -> bool {
        Scenario::is_done(self)
    }

    fn open(&self, url: &str) {
        Scenario::open(self, url);
    }

    fn set_method(&self, method: &str) {
        Scenario::method(self, method);
    }

    fn set_form(&self, fields: Vec<(String, String)>) {
        Scenario::form(self, fields);
    }
}

/// One scenario's slice of a suite report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub title: String,
    pub done: bool,
    pub pass_count: usize,
    pub fail_count: usize,
    pub log: Vec<LogLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_moves_created_to_ready() {
        let scenario = Scenario::detached("states");
        assert_eq!(scenario.state(), ScenarioState::Created);
        scenario.open("/path");
        assert_eq!(scenario.state(), ScenarioState::Ready);
        assert_eq!(scenario.url().as_deref(), Some("/path"));
    }

    #[test]
    fn test_wait_holds_scenario() {
        let scenario = Scenario::detached("deferred");
        scenario.wait();
        assert_eq!(scenario.state(), ScenarioState::Waiting);
        scenario.open("/path");
        assert_eq!(scenario.state(), ScenarioState::Waiting);
    }

    #[test]
    fn test_direct_log_lines_and_predicates() {
        let scenario = Scenario::detached("logging");
        scenario
            .comment("starting")
            .pass("looks good")
            .fail("but not here");
        let log = scenario.log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].log_type, LogType::Comment);
        assert!(scenario.failed());
        assert!(!scenario.passed());
        assert!(!scenario.is_done());
    }

    #[test]
    fn test_kind_selectors() {
        let scenario = Scenario::detached("kinds");
        assert_eq!(scenario.kind(), ResponseKind::Html);
        scenario.json();
        assert_eq!(scenario.kind(), ResponseKind::Json);
        scenario.stylesheet();
        assert_eq!(scenario.kind(), ResponseKind::Stylesheet);
    }

    #[test]
    fn test_navigable_configures_scenario() {
        let scenario = Scenario::detached("navigable");
        let nav: &dyn Navigable = &scenario;
        nav.set_method("post");
        nav.set_form(vec![("q".to_string(), "x".to_string())]);
        nav.open("/search");
        assert_eq!(scenario.url().as_deref(), Some("/search"));
        assert_eq!(scenario.state(), ScenarioState::Ready);
        assert!(!nav.is_done());
    }
}
