//! Shared test doubles for the fetch state machine.

use crate::environment::{ContextError, ExecutionContext, HostEnvironment};
use crate::error::TransportError;
use crate::transport::{ClientFactory, ClientSettings, HttpClient, TransportResponse};
use crate::types::{ContextToken, FetchRequest};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reaction to a dispatch.
#[derive(Clone, Debug)]
pub(crate) enum Step {
    /// Answer with a response; `body: None` means the transport delivered no body
    Respond {
        status: u16,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    },
    /// Answer with a response whose body fails after the first chunk
    BrokenBody { status: u16 },
    /// Fail the dispatch
    Fail(TransportError),
}

impl Step {
    pub(crate) fn ok(body: &str) -> Self {
        Step::Respond {
            status: 200,
            headers: HeaderMap::new(),
            body: Some(body.as_bytes().to_vec()),
        }
    }

    pub(crate) fn with_header(self, name: &'static str, value: &'static str) -> Self {
        match self {
            Step::Respond {
                status,
                mut headers,
                body,
            } => {
                headers.insert(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                );
                Step::Respond {
                    status,
                    headers,
                    body,
                }
            }
            other => other,
        }
    }

    pub(crate) fn no_body(status: u16) -> Self {
        Step::Respond {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub(crate) fn fail(message: &str) -> Self {
        Step::Fail(TransportError::Dispatch(message.to_string()))
    }
}

#[derive(Default)]
struct ScriptState {
    steps: VecDeque<Step>,
    requests: Vec<FetchRequest>,
    settings: Vec<ClientSettings>,
}

/// Client factory and client in one, replaying scripted steps and recording
/// every request it sees.
#[derive(Clone)]
pub(crate) struct ScriptedClient {
    name: &'static str,
    state: Arc<Mutex<ScriptState>>,
    build_error: Option<TransportError>,
}

impl ScriptedClient {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self::named("scripted", steps)
    }

    pub(crate) fn named(name: &'static str, steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(ScriptState {
                steps: steps.into_iter().collect(),
                ..Default::default()
            })),
            build_error: None,
        }
    }

    pub(crate) fn failing_build(message: &str) -> Self {
        Self {
            build_error: Some(TransportError::Build(message.to_string())),
            ..Self::new([])
        }
    }

    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub(crate) fn dispatch_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub(crate) fn settings(&self) -> Vec<ClientSettings> {
        self.state.lock().unwrap().settings.clone()
    }
}

impl ClientFactory for ScriptedClient {
    fn name(&self) -> &str {
        self.name
    }

    fn build(&self, settings: &ClientSettings) -> Result<Arc<dyn HttpClient>, TransportError> {
        if let Some(err) = &self.build_error {
            return Err(err.clone());
        }
        self.state.lock().unwrap().settings.push(*settings);
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, request: &FetchRequest) -> Result<TransportResponse, TransportError> {
        let step = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.steps.pop_front()
        };

        match step {
            Some(Step::Respond {
                status,
                headers,
                body,
            }) => Ok(TransportResponse {
                status,
                headers,
                body: body.map(|bytes| futures::stream::iter([Ok(bytes)]).boxed()),
            }),
            Some(Step::BrokenBody { status }) => Ok(TransportResponse {
                status,
                headers: HeaderMap::new(),
                body: Some(
                    futures::stream::iter([
                        Ok(b"partial".to_vec()),
                        Err(std::io::Error::other("connection reset by peer")),
                    ])
                    .boxed(),
                ),
            }),
            Some(Step::Fail(err)) => Err(err),
            None => Err(TransportError::Dispatch("script exhausted".to_string())),
        }
    }
}

/// How a [`ScriptedEnvironment`] reacts to context derivation.
#[derive(Clone, Debug)]
pub(crate) enum Derivation {
    Succeed,
    Fail,
    Panic,
}

/// Hosting runtime double handing out its own scripted client.
pub(crate) struct ScriptedEnvironment {
    pub(crate) derivation: Derivation,
    pub(crate) dev: bool,
    pub(crate) client: ScriptedClient,
}

impl HostEnvironment for ScriptedEnvironment {
    fn derive_context(&self, token: &ContextToken) -> Result<ExecutionContext, ContextError> {
        match self.derivation {
            Derivation::Succeed => Ok(ExecutionContext {
                token: token.clone(),
                runtime: "test runtime".to_string(),
            }),
            Derivation::Fail => Err(ContextError::Failed("token expired".to_string())),
            Derivation::Panic => panic!("context outside of request"),
        }
    }

    fn is_dev_environment(&self) -> bool {
        self.dev
    }

    fn client_factory(&self, _context: &ExecutionContext) -> Arc<dyn ClientFactory> {
        Arc::new(self.client.clone())
    }
}
