//! Given/When/Then scenario engine for signed HTTP APIs.
//!
//! Scenarios are loaded from `.feature` files, each step line is resolved
//! against a [`StepRegistry`] and executed in order against a fresh per-scenario
//! world. The bundled [`api_steps`] library drives a signing
//! [`RequestExecutor`] and checks the stored response with the
//! [`validator`] functions.
//!
//! ```
//! use apibdd::{StepKeyword, StepRegistry};
//!
//! let mut registry: StepRegistry<u32> = StepRegistry::new();
//! registry
//!     .register(StepKeyword::Given, "a counter at {value:u32}", |world, args| {
//!         *world = args.parse(0)?;
//!         Ok(())
//!     })
//!     .expect("pattern is valid");
//! let step = registry
//!     .resolve(StepKeyword::Given, "a counter at 7")
//!     .expect("step is defined");
//! let mut world = 0;
//! step.invoke(&mut world).expect("handler succeeds");
//! assert_eq!(world, 7);
//! ```

pub mod api_steps;
pub mod execution;
pub mod failure;
pub mod model;
pub mod registry;
pub mod reporting;
pub mod request;
pub mod response;
pub mod result;
pub mod runner;
pub mod settings;
pub mod signing;
pub mod source;
pub mod tags;
pub mod transport;
pub mod validator;

pub use apibdd_patterns::{StepKeyword, StepPattern};
pub use execution::{Hooks, ScenarioExecutor, ScenarioState, panic_message};
pub use failure::{ResolveError, StepFailure};
pub use model::{Feature, Scenario, Step};
pub use registry::{RegistryError, ResolvedStep, StepArgs, StepBinding, StepRegistry};
pub use request::{Credentials, PendingRequest, RequestExecutor};
pub use response::{JsonView, StoredResponse};
pub use result::{
    FeatureResult, RunSummary, ScenarioResult, ScenarioStatus, SkippedScenario,
    StepFailureRecord, StepOutcome, StepReport,
};
pub use runner::{FeatureRunner, LogSink, ResultSink};
pub use settings::{ConfigError, RunnerOptions, Settings};
pub use signing::{Clock, FixedClock, SignedHash, SystemClock, sign};
pub use source::{FeatureSource, GherkinFiles, SourceError};
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError, TransportOptions};
pub use validator::{EntityKind, ValidationError};
