#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use tokentrack_api_client::ApiError;
use tokentrack_api_types::{
    AggregateStats, AuthResponse, Envelope, LoginRequest, MeResponse, ProcessPromptRequest,
    RegisterRequest, UsageLog,
};
use tokentrack_core::{UserProfile, testing};
use tokentrack_session::UsageBackend;

pub const PASSWORD: &str = "correct horse";
pub const TOKEN: &str = "tok-ada";

/// How a fake data endpoint answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok,
    /// HTTP error with optional server message.
    Status(u16, Option<String>),
    /// 200 with `success: false`.
    Unsuccessful(Option<String>),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub health: usize,
    pub login: usize,
    pub register: usize,
    pub me: usize,
    pub logs: usize,
    pub stats: usize,
    pub process: usize,
}

impl Calls {
    pub fn fetches(&self) -> usize {
        self.logs + self.stats
    }
}

pub struct FakeState {
    pub healthy: bool,
    pub accounts: HashMap<String, (String, UserProfile)>,
    pub tokens: HashMap<String, UserProfile>,
    pub logs: Vec<UsageLog>,
    /// Stats reported instead of the ones matching `logs`.
    pub stats_override: Option<AggregateStats>,
    pub logs_reply: Reply,
    pub stats_reply: Reply,
    pub process_reply: Reply,
    /// Delay applied to successive logs fetches.
    pub logs_delays: VecDeque<Duration>,
    /// Per-probe `(delay, healthy)` answers; `healthy` applies once drained.
    pub health_script: VecDeque<(Duration, bool)>,
    pub next_log: u64,
}

/// In-memory server. Clones share state, so a test can keep a handle after
/// giving the backend to a controller.
#[derive(Clone)]
pub struct FakeBackend {
    pub state: Arc<Mutex<FakeState>>,
    pub calls: Arc<Mutex<Calls>>,
}

impl FakeBackend {
    /// Healthy server with one account and two logs totalling 150 tokens.
    pub fn new() -> Self {
        let user = testing::user();
        let mut accounts = HashMap::new();
        accounts.insert(user.email.clone(), (PASSWORD.to_string(), user.clone()));
        let mut tokens = HashMap::new();
        tokens.insert(TOKEN.to_string(), user);
        Self {
            state: Arc::new(Mutex::new(FakeState {
                healthy: true,
                accounts,
                tokens,
                logs: vec![
                    testing::log("a", 2, 100, 0.0002, 50),
                    testing::log("b", 1, 50, 0.0001, 30),
                ],
                stats_override: None,
                logs_reply: Reply::Ok,
                stats_reply: Reply::Ok,
                process_reply: Reply::Ok,
                logs_delays: VecDeque::new(),
                health_script: VecDeque::new(),
                next_log: 100,
            })),
            calls: Arc::new(Mutex::new(Calls::default())),
        }
    }

    pub fn with(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn set(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    fn count(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut self.calls.lock().unwrap());
    }

    fn authorized(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.state
            .lock()
            .unwrap()
            .tokens
            .get(token)
            .cloned()
            .ok_or(ApiError::Status {
                status: 401,
                message: Some("Token is not valid".to_string()),
            })
    }
}

fn envelope<T: serde::de::DeserializeOwned>(
    reply: &Reply,
    data: serde_json::Value,
) -> Result<Envelope<T>, ApiError> {
    let body = match reply {
        Reply::Ok => json!({ "success": true, "data": data }),
        Reply::Status(status, message) => {
            return Err(ApiError::Status {
                status: *status,
                message: message.clone(),
            });
        }
        Reply::Unsuccessful(Some(message)) => json!({ "success": false, "message": message }),
        Reply::Unsuccessful(None) => json!({ "success": false }),
    };
    Envelope::from_value(body).map_err(ApiError::from)
}

impl UsageBackend for FakeBackend {
    async fn health(&self) -> Result<(), ApiError> {
        self.count(|c| c.health += 1);
        let scripted = self.state.lock().unwrap().health_script.pop_front();
        let healthy = match scripted {
            Some((delay, healthy)) => {
                tokio::time::sleep(delay).await;
                healthy
            }
            None => self.state.lock().unwrap().healthy,
        };
        if healthy {
            Ok(())
        } else {
            Err(ApiError::Status {
                status: 503,
                message: None,
            })
        }
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.count(|c| c.login += 1);
        let state = self.state.lock().unwrap();
        match state.accounts.get(&req.email) {
            Some((password, user)) if *password == req.password => Ok(AuthResponse {
                token: TOKEN.to_string(),
                user: user.clone(),
            }),
            _ => Err(ApiError::Status {
                status: 400,
                message: Some("Invalid credentials".to_string()),
            }),
        }
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.count(|c| c.register += 1);
        let mut state = self.state.lock().unwrap();
        if state.accounts.contains_key(&req.email) {
            return Err(ApiError::Status {
                status: 400,
                message: Some("User already exists".to_string()),
            });
        }
        let user = UserProfile {
            id: format!("user-{}", state.accounts.len() + 1),
            email: req.email.clone(),
            name: req.name.clone(),
        };
        let token = format!("tok-{}", user.id);
        state
            .accounts
            .insert(req.email.clone(), (req.password.clone(), user.clone()));
        state.tokens.insert(token.clone(), user.clone());
        Ok(AuthResponse { token, user })
    }

    async fn me(&self, token: &str) -> Result<MeResponse, ApiError> {
        self.count(|c| c.me += 1);
        Ok(MeResponse {
            user: self.authorized(token)?,
        })
    }

    async fn logs(&self, token: &str) -> Result<Envelope<Vec<UsageLog>>, ApiError> {
        self.count(|c| c.logs += 1);
        let delay = self.state.lock().unwrap().logs_delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.authorized(token)?;
        let state = self.state.lock().unwrap();
        envelope(&state.logs_reply, serde_json::to_value(&state.logs)?)
    }

    async fn stats(&self, token: &str) -> Result<Envelope<AggregateStats>, ApiError> {
        self.count(|c| c.stats += 1);
        self.authorized(token)?;
        let state = self.state.lock().unwrap();
        let stats = state
            .stats_override
            .clone()
            .unwrap_or_else(|| testing::stats_for(&state.logs));
        envelope(&state.stats_reply, serde_json::to_value(&stats)?)
    }

    async fn process_prompt(
        &self,
        _token: Option<&str>,
        req: &ProcessPromptRequest,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.count(|c| c.process += 1);
        let mut state = self.state.lock().unwrap();
        let reply = state.process_reply.clone();
        if matches!(reply, Reply::Ok) {
            state.next_log += 1;
            let mut log = testing::log(&format!("p{}", state.next_log), 60, 75, 0.00015, 40);
            log.model_used = req.model.clone();
            log.prompt_text = req.prompt.clone();
            state.logs.insert(0, log);
        }
        envelope(&reply, json!({ "response": "ok" }))
    }
}
