//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use souschef_chat::{ChatTransport, Dispatcher, DispatcherConfig, SessionManager};
use souschef_core::error::{Result, SousChefError};
use souschef_core::traits::{NluGateway, RecipeSource, RecipeStore};
use souschef_core::types::{
    ConversationContext, Equipment, NluEntity, NluRequest, NluResponse, RecipeInfo, RecipeRecord,
    RecipeStep, RecipeSummary, SearchKind, SearchRecord, UserRecord,
};
use souschef_storage::{Database, SqliteRecipeStore};

// =============================================================================
// NLU gateway
// =============================================================================

const FLAGS: [&str; 4] = ["is_favorites", "is_ingredients", "is_selection", "selection"];

/// One scripted gateway answer.
pub enum Script {
    Reply {
        context: Value,
        entities: Vec<(&'static str, &'static str)>,
        output: Vec<&'static str>,
    },
    Fail,
}

impl Script {
    pub fn greet() -> Self {
        Script::Reply {
            context: json!({}),
            entities: vec![],
            output: vec!["Hi! I'm SousChef.", "What are you in the mood for?"],
        }
    }

    pub fn flags(context: Value) -> Self {
        Script::Reply {
            context,
            entities: vec![],
            output: vec![],
        }
    }

    pub fn cuisine(value: &'static str) -> Self {
        Script::Reply {
            context: json!({}),
            entities: vec![("cuisine", value)],
            output: vec![],
        }
    }

    pub fn selection(n: Value) -> Self {
        Script::flags(json!({"is_selection": true, "selection": n}))
    }
}

/// Gateway that echoes the incoming context with the scripted flags merged
/// in. Flags from earlier turns are dropped, as a dialog service does.
#[derive(Default)]
pub struct FakeGateway {
    scripts: Mutex<VecDeque<Script>>,
    pub requests: Mutex<Vec<NluRequest>>,
}

impl FakeGateway {
    pub fn push(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<NluRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NluGateway for FakeGateway {
    async fn message(&self, request: NluRequest) -> Result<NluResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Script::greet);

        match script {
            Script::Fail => Err(SousChefError::Gateway("dialog service unavailable".into())),
            Script::Reply {
                context,
                entities,
                output,
            } => {
                let mut merged: ConversationContext = request.context.unwrap_or_default();
                for flag in FLAGS {
                    merged.remove(flag);
                }
                if let Value::Object(extra) = context {
                    merged.extend(extra);
                }
                Ok(NluResponse {
                    context: merged,
                    entities: entities
                        .into_iter()
                        .map(|(entity, value)| NluEntity {
                            entity: entity.to_string(),
                            value: value.to_string(),
                        })
                        .collect(),
                    output: output.into_iter().map(String::from).collect(),
                })
            }
        }
    }
}

// =============================================================================
// Recipe source
// =============================================================================

/// Recipe API stand-in that records every call as `"<op>:<arg>"`.
#[derive(Default)]
pub struct FakeSource {
    pub by_ingredients: Mutex<HashMap<String, Vec<RecipeSummary>>>,
    pub by_cuisine: Mutex<HashMap<String, Vec<RecipeSummary>>>,
    pub info: Mutex<HashMap<String, RecipeInfo>>,
    pub steps: Mutex<HashMap<String, Vec<RecipeStep>>>,
    pub calls: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

impl FakeSource {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(&format!("{}:", op)))
            .count()
    }

    pub fn add_ingredients(&self, key: &str, recipes: Vec<RecipeSummary>) {
        self.by_ingredients
            .lock()
            .unwrap()
            .insert(key.to_string(), recipes);
    }

    pub fn add_cuisine(&self, key: &str, recipes: Vec<RecipeSummary>) {
        self.by_cuisine.lock().unwrap().insert(key.to_string(), recipes);
    }

    pub fn add_recipe(&self, id: &str, title: &str, steps: Vec<RecipeStep>) {
        self.info.lock().unwrap().insert(
            id.to_string(),
            RecipeInfo {
                title: title.to_string(),
                ready_in_minutes: 25,
                servings: 4,
            },
        );
        self.steps.lock().unwrap().insert(id.to_string(), steps);
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn record(&self, op: &str, arg: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{}:{}", op, arg));
        if *self.fail.lock().unwrap() {
            return Err(SousChefError::RecipeSource("upstream returned 503".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeSource for FakeSource {
    async fn find_by_ingredients(&self, ingredients: &str) -> Result<Vec<RecipeSummary>> {
        self.record("ingredients", ingredients)?;
        Ok(self
            .by_ingredients
            .lock()
            .unwrap()
            .get(ingredients)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_cuisine(&self, cuisine: &str) -> Result<Vec<RecipeSummary>> {
        self.record("cuisine", cuisine)?;
        Ok(self
            .by_cuisine
            .lock()
            .unwrap()
            .get(cuisine)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_info_by_id(&self, recipe_id: &str) -> Result<RecipeInfo> {
        self.record("info", recipe_id)?;
        self.info
            .lock()
            .unwrap()
            .get(recipe_id)
            .cloned()
            .ok_or_else(|| SousChefError::RecipeSource(format!("no recipe {}", recipe_id)))
    }

    async fn get_steps_by_id(&self, recipe_id: &str) -> Result<Vec<RecipeStep>> {
        self.record("steps", recipe_id)?;
        Ok(self
            .steps
            .lock()
            .unwrap()
            .get(recipe_id)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Store
// =============================================================================

/// SQLite store whose named operations can be switched to fail.
pub struct FaultyStore {
    pub inner: Arc<SqliteRecipeStore>,
    failing: Mutex<Vec<&'static str>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteRecipeStore>) -> Self {
        Self {
            inner,
            failing: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().push(op);
    }

    fn check(&self, op: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(SousChefError::Storage(format!("{} failed: disk I/O error", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for FaultyStore {
    async fn init(&self) -> Result<()> {
        self.check("init")?;
        self.inner.init().await
    }

    async fn add_user(&self, user_id: &str) -> Result<UserRecord> {
        self.check("add_user")?;
        self.inner.add_user(user_id).await
    }

    async fn find_search(&self, kind: SearchKind, key: &str) -> Result<Option<SearchRecord>> {
        self.check("find_search")?;
        self.inner.find_search(kind, key).await
    }

    async fn add_search(
        &self,
        kind: SearchKind,
        key: &str,
        recipes: &[RecipeSummary],
        user: &UserRecord,
    ) -> Result<SearchRecord> {
        self.check("add_search")?;
        self.inner.add_search(kind, key, recipes, user).await
    }

    async fn record_search_request_for_user(
        &self,
        search: &SearchRecord,
        user: &UserRecord,
    ) -> Result<()> {
        self.check("record_search_request_for_user")?;
        self.inner.record_search_request_for_user(search, user).await
    }

    async fn find_recipe(&self, recipe_id: &str) -> Result<Option<RecipeRecord>> {
        self.check("find_recipe")?;
        self.inner.find_recipe(recipe_id).await
    }

    async fn add_recipe(
        &self,
        recipe_id: &str,
        title: &str,
        instructions: &str,
        search: Option<&SearchRecord>,
        user: &UserRecord,
    ) -> Result<RecipeRecord> {
        self.check("add_recipe")?;
        self.inner
            .add_recipe(recipe_id, title, instructions, search, user)
            .await
    }

    async fn record_recipe_request_for_user(
        &self,
        recipe: &RecipeRecord,
        search: Option<&SearchRecord>,
        user: &UserRecord,
    ) -> Result<()> {
        self.check("record_recipe_request_for_user")?;
        self.inner
            .record_recipe_request_for_user(recipe, search, user)
            .await
    }

    async fn find_favorite_recipes_for_user(
        &self,
        user: &UserRecord,
        limit: usize,
    ) -> Result<Vec<RecipeSummary>> {
        self.check("find_favorite_recipes_for_user")?;
        self.inner.find_favorite_recipes_for_user(user, limit).await
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Transport that keeps every delivered reply.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(String, String)>>,
    pub notify: Notify,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `n` replies were delivered.
    pub async fn wait_for(&self, n: usize) -> Vec<(String, String)> {
        loop {
            let notified = self.notify.notified();
            let sent = self.sent();
            if sent.len() >= n {
                return sent;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), text.to_string()));
        self.notify.notify_waiters();
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<SessionManager>,
    pub store: Arc<SqliteRecipeStore>,
    /// What the dispatcher talks to; wraps `store`.
    pub faults: Arc<FaultyStore>,
    pub gateway: Arc<FakeGateway>,
    pub source: Arc<FakeSource>,
}

pub fn harness() -> Harness {
    let db = Arc::new(Database::in_memory().unwrap());
    let store = Arc::new(SqliteRecipeStore::new(db));
    let faults = Arc::new(FaultyStore::new(store.clone()));
    let gateway = Arc::new(FakeGateway::default());
    let source = Arc::new(FakeSource::default());
    let sessions = Arc::new(SessionManager::new());
    let dispatcher = Arc::new(Dispatcher::new(
        gateway.clone(),
        faults.clone(),
        source.clone(),
        sessions.clone(),
        DispatcherConfig {
            workspace_id: "ws-test".to_string(),
            favorites_limit: 5,
        },
    ));
    Harness {
        dispatcher,
        sessions,
        store,
        faults,
        gateway,
        source,
    }
}

pub fn summaries(items: &[(&str, &str)]) -> Vec<RecipeSummary> {
    items
        .iter()
        .map(|(id, title)| RecipeSummary::new(*id, *title))
        .collect()
}

pub fn step(text: &str, equipment: &[&str]) -> RecipeStep {
    RecipeStep {
        step: text.to_string(),
        equipment: equipment
            .iter()
            .map(|name| Equipment {
                name: name.to_string(),
            })
            .collect(),
    }
}
