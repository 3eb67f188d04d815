//! # mast-runner
//!
//! The execution layer of Mast. A [`Suite`] owns [`Scenario`]s; each
//! scenario resolves its URL against the suite's live base, asks the
//! external [`ResourceFetcher`] collaborator for an already-parsed
//! document, wraps it in a response, and runs the registered assertion
//! callbacks. Completion is signalled per scenario and joined at the
//! suite level; [`SuiteReport`] is the serializable summary an external
//! reporter reads.

mod fetch;
mod scenario;
mod suite;

pub use fetch::{FetchedResource, HttpRequest, ResourceFetcher};
pub use scenario::{Scenario, ScenarioReport, ScenarioState};
pub use suite::{resolve_url, BaseUrl, Suite, SuiteReport};
