// 集成测试公共模块
//
// 提供测试用的翻译后端、结果记录器和本地语言模型服务

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use autotranslate::translation::{
    Debouncer, Dispatcher, DispatcherConfig, LanguageRole, Provider, ProviderInfo,
    ProviderRegistry, RequestSettings, ResultSink, SessionEvent, SharedSelection,
    TranslationOutcome, TranslationResult, TranslationSession,
};

/// 结果接收端收到的调用
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Pending(u64),
    Result(TranslationOutcome),
}

/// 记录所有调用的结果接收端
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn pending(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Pending(sequence) => Some(*sequence),
                SinkEvent::Result(_) => None,
            })
            .collect()
    }

    pub fn results(&self) -> Vec<TranslationOutcome> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Result(outcome) => Some(outcome.clone()),
                SinkEvent::Pending(_) => None,
            })
            .collect()
    }

    pub fn result_sequences(&self) -> Vec<u64> {
        self.results().iter().map(|outcome| outcome.sequence).collect()
    }

    pub fn result_texts(&self) -> Vec<String> {
        self.results().iter().map(|outcome| outcome.display_text()).collect()
    }
}

impl ResultSink for RecordingSink {
    fn show_pending(&mut self, sequence: u64) {
        self.events.push(SinkEvent::Pending(sequence));
    }

    fn show_result(&mut self, outcome: &TranslationOutcome) {
        self.events.push(SinkEvent::Result(outcome.clone()));
    }
}

/// 脚本化后端
///
/// 文本形如 `word@300` 时延迟300毫秒，输出 `<id>:<word>`。
/// 同时记录收到的每一次调用。
pub struct ScriptedProvider {
    id: &'static str,
    role: LanguageRole,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
}

/// 后端收到的一次调用
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

impl ScriptedProvider {
    pub fn new(id: &'static str, role: LanguageRole) -> Self {
        Self {
            id,
            role,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<ProviderCall>>> {
        Arc::clone(&self.calls)
    }
}

pub fn split_delay(text: &str) -> (&str, Duration) {
    match text.rsplit_once('@') {
        Some((word, ms)) => match ms.parse() {
            Ok(ms) => (word, Duration::from_millis(ms)),
            Err(_) => (text, Duration::ZERO),
        },
        None => (text, Duration::ZERO),
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.id,
            builds_prompt: false,
            language_role: self.role,
        }
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: Option<&str>,
        _endpoint: &str,
    ) -> TranslationResult<String> {
        self.calls.lock().unwrap().push(ProviderCall {
            text: text.to_string(),
            source_lang: source_lang.map(str::to_string),
            target_lang: target_lang.map(str::to_string),
        });

        let (word, delay) = split_delay(text);
        tokio::time::sleep(delay).await;
        Ok(format!("{}:{}", self.id, word))
    }
}

/// 原样返回输入文本的后端
pub struct EchoProvider;

#[async_trait]
impl Provider for EchoProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Echo",
            builds_prompt: false,
            language_role: LanguageRole::Target,
        }
    }

    async fn translate(
        &self,
        text: &str,
        _source_lang: Option<&str>,
        _target_lang: Option<&str>,
        _endpoint: &str,
    ) -> TranslationResult<String> {
        Ok(text.to_string())
    }
}

/// 测试环境
pub struct TestEnvironment {
    pub registry: Arc<ProviderRegistry>,
    pub alpha_calls: Arc<Mutex<Vec<ProviderCall>>>,
    pub beta_calls: Arc<Mutex<Vec<ProviderCall>>>,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        let alpha = ScriptedProvider::new("Alpha", LanguageRole::Target);
        let beta = ScriptedProvider::new("Beta", LanguageRole::Source);
        let alpha_calls = alpha.calls();
        let beta_calls = beta.calls();

        let mut registry = ProviderRegistry::new();
        registry.register("Alpha", Arc::new(alpha));
        registry.register("Beta", Arc::new(beta));
        registry.register("Echo", Arc::new(EchoProvider));

        Self {
            registry: Arc::new(registry),
            alpha_calls,
            beta_calls,
        }
    }
}

impl TestEnvironment {
    pub fn dispatcher(&self, config: DispatcherConfig) -> Dispatcher<RecordingSink> {
        Dispatcher::new(
            Arc::clone(&self.registry),
            RequestSettings::new("Alpha", "http://unused.invalid"),
            config,
            RecordingSink::default(),
        )
    }

    pub fn session(
        &self,
        config: DispatcherConfig,
    ) -> (SharedSelection, TranslationSession<SharedSelection, RecordingSink>) {
        let selection = SharedSelection::new();
        let session = TranslationSession::new(
            selection.clone(),
            Debouncer::new(Duration::from_millis(1000)),
            self.dispatcher(config),
        );
        (selection, session)
    }
}

/// 不中止过期请求的调度配置
pub fn keep_superseded() -> DispatcherConfig {
    DispatcherConfig {
        cancel_superseded: false,
        ..Default::default()
    }
}

/// 按时间脚本向会话发送事件
pub enum Step {
    Select(&'static str),
    Wait(u64),
    Send(SessionEvent),
}

pub fn play_script(selection: SharedSelection, steps: Vec<Step>) -> mpsc::UnboundedReceiver<SessionEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for step in steps {
            match step {
                Step::Select(text) => {
                    selection.set(text);
                    if tx.send(SessionEvent::SelectionChanged).is_err() {
                        return;
                    }
                }
                Step::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
                Step::Send(event) => {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}

/// 本地语言模型服务的响应方式
#[derive(Debug, Clone)]
pub enum LlmBehavior {
    Reply(String),
    Malformed,
    Status(u16),
    Slow(Duration),
}

/// 本地语言模型服务
#[derive(Clone)]
pub struct FakeLlm {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct FakeLlmState {
    behavior: LlmBehavior,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeLlm {
    pub async fn start(behavior: LlmBehavior) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = FakeLlmState {
            behavior,
            requests: Arc::clone(&requests),
        };

        let app = Router::new()
            .route("/api/v1/generate", post(generate))
            .route("/translate_a/single", get(hosted_translate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn generate_url(&self) -> String {
        format!("http://{}/api/v1/generate", self.addr)
    }

    pub fn received(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn generate(
    State(state): State<FakeLlmState>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(body);

    match state.behavior {
        LlmBehavior::Reply(text) => (
            StatusCode::OK,
            json!({ "results": [{ "text": text }] }).to_string(),
        ),
        LlmBehavior::Malformed => (StatusCode::OK, json!({ "results": [] }).to_string()),
        LlmBehavior::Status(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "backend failure".to_string(),
        ),
        LlmBehavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            (
                StatusCode::OK,
                json!({ "results": [{ "text": "late" }] }).to_string(),
            )
        }
    }
}

async fn hosted_translate(
    State(state): State<FakeLlmState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(json!(params));

    match state.behavior {
        LlmBehavior::Reply(text) => {
            let original = params.get("q").cloned().unwrap_or_default();
            (StatusCode::OK, json!([[[text, original, null, null]], null, "auto"]).to_string())
        }
        LlmBehavior::Malformed => (StatusCode::OK, json!({ "error": "quota" }).to_string()),
        LlmBehavior::Status(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            String::new(),
        ),
        LlmBehavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, json!([[["late", "", null, null]]]).to_string())
        }
    }
}
