//! In-process stand-in for the signed comics API.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use apibdd::api_steps::{self, ApiWorld};
use apibdd::{
    Credentials, RawResponse, RequestExecutor, StepRegistry, Transport, TransportError, sign,
};
use url::Url;

pub const PUBLIC_KEY: &str = "public-key";
pub const PRIVATE_KEY: &str = "private-key";

const COMICS: &str = r#"{"code":200,"attributionText":"Data provided by comics",
"data":{"results":[{"id":82967,"title":"Marvel Previews (2017)"}]}}"#;
const CHARACTERS: &str = r#"{"code":200,"attributionText":"characters",
"data":{"results":[{"id":1011334,"name":"3-D Man"}]}}"#;
const UNAUTHORIZED: &str = r#"{"code":"InvalidCredentials","message":"That hash, timestamp and key combination is invalid."}"#;

/// Verifies the signature the way the real API does and serves canned
/// bodies for the two known collections.
#[derive(Debug, Default)]
pub struct FakeApi {
    requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for FakeApi {
    fn get(&self, url: &Url, query: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.path().to_string());
        let param = |name: &str| {
            query
                .iter()
                .find(|(key, _)| *key == name)
                .map_or("", |(_, value)| *value)
        };
        let ts: u64 = param("ts").parse().unwrap_or_default();
        let expected = sign(ts, PUBLIC_KEY, PRIVATE_KEY);
        if param("apikey") != PUBLIC_KEY || param("hash") != expected.as_str() {
            return Ok(RawResponse {
                status: 401,
                body: UNAUTHORIZED.into(),
            });
        }
        let (status, body) = match url.path().rsplit('/').next() {
            Some("comics") => (200, COMICS),
            Some("characters") => (200, CHARACTERS),
            _ => (404, r#"{"code":404,"status":"not found"}"#),
        };
        Ok(RawResponse {
            status,
            body: body.into(),
        })
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        base_url: Url::parse("https://gateway.example/v1/public")
            .unwrap_or_else(|e| panic!("base URL must parse: {e}")),
        public_key: PUBLIC_KEY.into(),
        private_key: PRIVATE_KEY.into(),
    }
}

pub fn registry() -> StepRegistry<ApiWorld> {
    let mut registry = StepRegistry::new();
    api_steps::register(&mut registry).unwrap_or_else(|e| panic!("bindings register: {e}"));
    registry
}

pub fn world_factory(api: Arc<FakeApi>) -> impl Fn() -> ApiWorld + Send + Sync {
    let executor = RequestExecutor::new(api);
    move || ApiWorld::new(credentials(), executor.clone())
}

pub fn reference_feature() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../features/api_authentication.feature")
}
