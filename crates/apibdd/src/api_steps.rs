//! Step bindings for signed API scenarios.
//!
//! Each scenario gets its own [`ApiWorld`]. The invalid-credentials step
//! replaces the private key on that world only, so later scenarios start
//! from the configured credentials again.

use apibdd_patterns::StepKeyword;
use tracing::{debug, info};

use crate::execution::Hooks;
use crate::failure::StepFailure;
use crate::registry::{RegistryError, StepArgs, StepRegistry};
use crate::request::{Credentials, RequestExecutor};
use crate::response::StoredResponse;
use crate::validator::{self, EntityKind};

/// Private key substituted by the invalid-credentials step.
pub const INVALID_PRIVATE_KEY: &str = "invalid-private-key";

/// Per-scenario state for the API steps.
#[derive(Debug, Clone)]
pub struct ApiWorld {
    /// Credentials used to sign requests in this scenario.
    pub credentials: Credentials,
    /// Signs and sends requests.
    pub executor: RequestExecutor,
    /// Last response received, if any.
    pub response: Option<StoredResponse>,
}

impl ApiWorld {
    /// Fresh world with no stored response.
    #[must_use]
    pub fn new(credentials: Credentials, executor: RequestExecutor) -> Self {
        Self {
            credentials,
            executor,
            response: None,
        }
    }

    fn ensure_keys(&self) -> Result<(), StepFailure> {
        if self.credentials.public_key.is_empty() {
            return Err(StepFailure::assertion("public key must not be empty"));
        }
        if self.credentials.private_key.is_empty() {
            return Err(StepFailure::assertion("private key must not be empty"));
        }
        Ok(())
    }
}

fn valid_credentials(world: &mut ApiWorld, args: &StepArgs) -> Result<(), StepFailure> {
    debug!(api = args.get(0)?, "using configured credentials");
    world.ensure_keys()
}

fn invalid_credentials(world: &mut ApiWorld, args: &StepArgs) -> Result<(), StepFailure> {
    debug!(api = args.get(0)?, "substituting private key");
    INVALID_PRIVATE_KEY.clone_into(&mut world.credentials.private_key);
    world.ensure_keys()
}

fn send_get(world: &mut ApiWorld, args: &StepArgs) -> Result<(), StepFailure> {
    let endpoint = args.get(0)?;
    world.response = None;
    let response = world.executor.get(&world.credentials, endpoint)?;
    world.response = Some(response);
    Ok(())
}

fn status_code(world: &mut ApiWorld, args: &StepArgs) -> Result<(), StepFailure> {
    let expected: u16 = args.parse(0)?;
    validator::expect_status(world.response.as_ref(), expected)?;
    Ok(())
}

fn contains_data(world: &mut ApiWorld, args: &StepArgs) -> Result<(), StepFailure> {
    let endpoint = args.get(0)?;
    let response = world.response.as_ref();
    validator::expect_body_contains(response, endpoint)?;
    let results = validator::expect_results_envelope(response)?;
    let kind = EntityKind::from_endpoint(endpoint)?;
    let first = validator::first_result_field(response, kind.field_name())?;
    info!(
        endpoint,
        results = results.len(),
        field = kind.field_name(),
        value = %first,
        "response contains data"
    );
    Ok(())
}

fn first_title(world: &mut ApiWorld, args: &StepArgs) -> Result<(), StepFailure> {
    let field = EntityKind::Comics.field_name();
    validator::expect_first_result_field(world.response.as_ref(), field, args.get(0)?)?;
    Ok(())
}

fn first_name(world: &mut ApiWorld, args: &StepArgs) -> Result<(), StepFailure> {
    let field = EntityKind::Characters.field_name();
    validator::expect_first_result_field(world.response.as_ref(), field, args.get(0)?)?;
    Ok(())
}

/// Register the API step bindings.
///
/// # Errors
/// Returns [`RegistryError`] when a binding collides with one already
/// present in `registry`.
///
/// # Examples
/// ```
/// use apibdd::{StepKeyword, StepRegistry, api_steps};
///
/// let mut registry = StepRegistry::new();
/// api_steps::register(&mut registry).expect("bindings are unique");
/// assert!(registry.resolve(StepKeyword::Then, "I receive a 401 status code").is_ok());
/// ```
pub fn register(registry: &mut StepRegistry<ApiWorld>) -> Result<(), RegistryError> {
    registry.register(
        StepKeyword::Given,
        "I have valid {api} API credentials",
        valid_credentials,
    )?;
    registry.register(
        StepKeyword::Given,
        "I have invalid {api} API credentials",
        invalid_credentials,
    )?;
    registry.register(
        StepKeyword::When,
        "I send a GET request to \"{endpoint}\" endpoint",
        send_get,
    )?;
    registry.register(
        StepKeyword::Then,
        "I receive a {status:u16} status code",
        status_code,
    )?;
    registry.register(
        StepKeyword::Then,
        "the response contains \"{endpoint}\" data",
        contains_data,
    )?;
    registry.register(
        StepKeyword::Then,
        "the first comic book has a title of \"{title}\"",
        first_title,
    )?;
    registry.register(
        StepKeyword::Then,
        "the first character has a name of \"{name}\"",
        first_name,
    )?;
    Ok(())
}

/// Hooks that drop the stored response when a scenario ends.
#[must_use]
pub fn hooks() -> Hooks<ApiWorld> {
    Hooks::new().after_scenario(|world: &mut ApiWorld, _, _| world.response = None)
}
