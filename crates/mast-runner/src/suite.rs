//! Suite aggregation
//!
//! A suite owns an ordered list of scenarios, shares one live base URL
//! with all of them, and aggregates their outcomes. Completion is a
//! join over each scenario's completion signal; the on-done callback
//! fires exactly once when every owned scenario is Done.

use crate::fetch::ResourceFetcher;
use crate::scenario::{Scenario, ScenarioReport};
use mast_core::{MastError, ResponseKind, Result, SuiteConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

/// Base URL configuration: a literal, or an ordered environment-keyed
/// mapping
pub enum BaseUrl {
    Literal(String),
    PerEnvironment(Vec<(String, String)>),
}

impl From<&str> for BaseUrl {
    fn from(url: &str) -> Self {
        Self::Literal(url.to_string())
    }
}

impl From<String> for BaseUrl {
    fn from(url: String) -> Self {
        Self::Literal(url)
    }
}

impl From<Vec<(String, String)>> for BaseUrl {
    fn from(mapping: Vec<(String, String)>) -> Self {
        Self::PerEnvironment(mapping)
    }
}

impl From<Vec<(&str, &str)>> for BaseUrl {
    fn from(mapping: Vec<(&str, &str)>) -> Self {
        Self::PerEnvironment(
            mapping
                .into_iter()
                .map(|(env, url)| (env.to_string(), url.to_string()))
                .collect(),
        )
    }
}

type DoneCallback = Box<dyn Fn() + Send + Sync>;

/// A named collection of scenarios with shared base-URL resolution
pub struct Suite {
    title: String,
    config: SuiteConfig,
    base: Arc<RwLock<Option<Url>>>,
    scenarios: Mutex<Vec<Arc<Scenario>>>,
    on_done: Mutex<Option<DoneCallback>>,
    done_fired: AtomicBool,
    started: Instant,
    duration_ms: Mutex<Option<u64>>,
}

impl Suite {
    /// New suite with defaults read from the environment
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_config(title, SuiteConfig::from_env())
    }

    pub fn with_config(title: impl Into<String>, config: SuiteConfig) -> Self {
        Self {
            title: title.into(),
            config,
            base: Arc::new(RwLock::new(None)),
            scenarios: Mutex::new(Vec::new()),
            on_done: Mutex::new(None),
            done_fired: AtomicBool::new(false),
            started: Instant::now(),
            duration_ms: Mutex::new(None),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Configure the base URL all relative scenario URLs resolve against
    ///
    /// An environment-keyed mapping picks the entry for the active
    /// environment, falling back to the first entry; an empty resolved
    /// URL is a configuration error.
    pub fn base(&self, base: impl Into<BaseUrl>) -> Result<&Self> {
        let resolved = match base.into() {
            BaseUrl::Literal(url) => url,
            BaseUrl::PerEnvironment(mapping) => mapping
                .iter()
                .find(|(env, _)| env == &self.config.environment)
                .or_else(|| mapping.first())
                .map(|(_, url)| url.clone())
                .unwrap_or_default(),
        };
        if resolved.is_empty() {
            return Err(MastError::InvalidBaseUrl(
                "no base url for active environment".to_string(),
            ));
        }
        let url = Url::parse(&resolved)?;
        *self.base.write().expect("base lock poisoned") = Some(url);
        Ok(self)
    }

    pub fn base_url(&self) -> Option<String> {
        self.base
            .read()
            .expect("base lock poisoned")
            .as_ref()
            .map(Url::to_string)
    }

    /// Resolve a scenario path against the configured base
    pub fn build_url(&self, path: &str) -> String {
        let base = self.base.read().expect("base lock poisoned");
        resolve_url(base.as_ref(), path)
    }

    /// New scenario owned by this suite, inheriting its defaults and
    /// sharing its live base
    pub fn scenario(&self, title: impl Into<String>) -> Arc<Scenario> {
        let scenario = Arc::new(Scenario::new(title, &self.config, self.base.clone()));
        if self.config.defer_execution {
            scenario.wait();
        }
        self.scenarios
            .lock()
            .expect("scenarios lock poisoned")
            .push(scenario.clone());
        scenario
    }

    fn kinded_scenario(&self, title: impl Into<String>, kind: ResponseKind) -> Arc<Scenario> {
        let scenario = self.scenario(title);
        match kind {
            ResponseKind::Html => scenario.html(),
            ResponseKind::Json => scenario.json(),
            ResponseKind::Image => scenario.image(),
            ResponseKind::Stylesheet => scenario.stylesheet(),
            ResponseKind::Script => scenario.script(),
            ResponseKind::Video => scenario.video(),
            ResponseKind::Resource => scenario.resource(),
            ResponseKind::Browser => scenario.browser(),
        };
        scenario
    }

    pub fn html(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Html)
    }

    pub fn json(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Json)
    }

    pub fn image(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Image)
    }

    pub fn stylesheet(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Stylesheet)
    }

    pub fn script(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Script)
    }

    pub fn video(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Video)
    }

    pub fn resource(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Resource)
    }

    pub fn browser(&self, title: impl Into<String>) -> Arc<Scenario> {
        self.kinded_scenario(title, ResponseKind::Browser)
    }

    fn snapshot(&self) -> Vec<Arc<Scenario>> {
        self.scenarios
            .lock()
            .expect("scenarios lock poisoned")
            .clone()
    }

    /// Register the callback fired exactly once when every owned
    /// scenario is Done
    pub fn on_done(&self, callback: impl Fn() + Send + Sync + 'static) -> &Self {
        *self.on_done.lock().expect("on_done lock poisoned") = Some(Box::new(callback));
        self
    }

    /// Execute every owned scenario concurrently, then finalize
    ///
    /// One scenario's usage error never stops its siblings; errors are
    /// logged and the suite keeps aggregating.
    pub async fn execute(&self, fetcher: &dyn ResourceFetcher) {
        let scenarios = self.snapshot();
        debug!(title = %self.title, count = scenarios.len(), "executing suite");
        let results =
            futures::future::join_all(scenarios.iter().map(|s| s.execute(fetcher))).await;
        for (scenario, result) in scenarios.iter().zip(results) {
            if let Err(err) = result {
                warn!(scenario = %scenario.title(), %err, "scenario error");
            }
        }
        self.finalize();
    }

    /// Await every scenario's completion signal, then finalize
    pub async fn join(&self) {
        for scenario in self.snapshot() {
            let mut rx = scenario.completion();
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        self.finalize();
    }

    fn finalize(&self) {
        if !self.is_done() {
            return;
        }
        {
            let mut duration = self.duration_ms.lock().expect("duration lock poisoned");
            if duration.is_none() {
                *duration = Some(self.started.elapsed().as_millis() as u64);
            }
        }
        if self.done_fired.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(callback) = self.on_done.lock().expect("on_done lock poisoned").as_ref() {
            callback();
        }
    }

    // Aggregate predicates; a suite with no scenarios is vacuously done
    // and passed

    pub fn is_done(&self) -> bool {
        self.snapshot().iter().all(|s| s.is_done())
    }

    pub fn passed(&self) -> bool {
        self.snapshot().iter().all(|s| s.passed())
    }

    pub fn failed(&self) -> bool {
        self.snapshot().iter().any(|s| s.failed())
    }

    /// Serializable summary for the external reporter
    pub fn report(&self) -> SuiteReport {
        SuiteReport {
            title: self.title.clone(),
            base_url: self.base_url(),
            duration_ms: self
                .duration_ms
                .lock()
                .expect("duration lock poisoned")
                .unwrap_or_else(|| self.started.elapsed().as_millis() as u64),
            scenarios: self.snapshot().iter().map(|s| s.report()).collect(),
        }
    }
}

/// Suite summary in the shape the external reporter reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub title: String,
    pub base_url: Option<String>,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioReport>,
}

/// Resolve a scenario path against an optional base URL
///
/// Absolute and `data:` URLs pass through unchanged, as does everything
/// when no base is configured. Root-relative paths replace the base's
/// path; anything else resolves relative to the full base URL.
pub fn resolve_url(base: Option<&Url>, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("data:") {
        return path.to_string();
    }
    match base {
        Some(base) => base
            .join(path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| path.to_string()),
        None => path.to_string(),
    }
}
