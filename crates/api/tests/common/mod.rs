//! Common test utilities for integration tests.
//!
//! The router is built over in-memory directories that record every call,
//! so tests can assert on what a handler asked for as well as on what it
//! returned.

// Helpers are shared by several test binaries; not every binary uses all of them.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use domain::models::{
    NewInvitedUser, Page, PageGrant, PageRange, User, UserListFilter, UserListOptions,
    UserStatus,
};
use domain::services::{ConfigLookup, DirectoryError, PageDirectory, UserDirectory};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::Value;
use shared::jwt::SessionTokens;
use shared::pagination::Paginated;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;
use wiki_admin_api::app::{build_router, AppState};
use wiki_admin_api::config::Config;
use wiki_admin_api::services::{MailError, MailMessage, Mailer};

fn injected_failure(what: &str) -> DirectoryError {
    DirectoryError::Database(format!("{} unavailable", what))
}

// =============================================================================
// In-memory directories
// =============================================================================

#[derive(Default)]
pub struct MemoryUsers {
    pub users: Mutex<Vec<User>>,
    pub paginate_calls: Mutex<Vec<(UserListFilter, UserListOptions)>>,
    pub find_by_id_calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl MemoryUsers {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(injected_failure("user directory"))
        } else {
            Ok(())
        }
    }

    fn update(&self, id: Uuid, apply: impl FnOnce(&mut User)) -> Result<Option<User>, DirectoryError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            apply(user);
            user.clone()
        }))
    }
}

#[async_trait]
impl UserDirectory for MemoryUsers {
    async fn paginate(
        &self,
        filter: &UserListFilter,
        options: &UserListOptions,
    ) -> Result<Paginated<User>, DirectoryError> {
        self.paginate_calls
            .lock()
            .unwrap()
            .push((filter.clone(), options.clone()));
        self.check()?;

        let mut matching: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        matching.sort_by_key(|u| u.id);
        if options.sort_order.direction() < 0 {
            matching.reverse();
        }

        let total = matching.len() as u64;
        let docs = matching
            .into_iter()
            .skip(options.offset() as usize)
            .take(options.limit as usize)
            .collect();
        Ok(Paginated::new(docs, total, options.page, options.limit))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.get(id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn create_invited_users(
        &self,
        users: &[NewInvitedUser],
    ) -> Result<Vec<User>, DirectoryError> {
        self.check()?;
        let mut stored = self.users.lock().unwrap();
        let mut created = Vec::new();
        for new_user in users {
            if stored.iter().any(|u| u.email == new_user.email) {
                continue;
            }
            let user = User {
                id: Uuid::new_v4(),
                name: String::new(),
                username: None,
                email: new_user.email.clone(),
                status: UserStatus::Invited,
                admin: false,
                password_hash: Some(new_user.password_hash.clone()),
                image_url: None,
                created_at: Utc::now(),
                last_login_at: None,
            };
            stored.push(user.clone());
            created.push(user);
        }
        Ok(created)
    }

    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<Option<User>, DirectoryError> {
        self.update(id, |u| u.admin = admin)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Option<User>, DirectoryError> {
        self.update(id, |u| u.status = status)
    }

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, DirectoryError> {
        let hash = password_hash.to_string();
        self.update(id, |u| u.password_hash = Some(hash))
    }
}

/// One recorded `find_list_by_creator` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageListCall {
    pub creator: Uuid,
    pub viewer: Option<Uuid>,
    pub range: PageRange,
}

#[derive(Default)]
pub struct MemoryPages {
    pub pages: Mutex<Vec<Page>>,
    pub calls: Mutex<Vec<PageListCall>>,
    pub fail: AtomicBool,
}

impl MemoryPages {
    pub fn insert(&self, page: Page) {
        self.pages.lock().unwrap().push(page);
    }

    pub fn calls(&self) -> Vec<PageListCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageDirectory for MemoryPages {
    async fn find_list_by_creator(
        &self,
        creator: &User,
        viewer: Option<Uuid>,
        range: PageRange,
    ) -> Result<Vec<Page>, DirectoryError> {
        self.calls.lock().unwrap().push(PageListCall {
            creator: creator.id,
            viewer,
            range,
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected_failure("page directory"));
        }

        let mut pages: Vec<Page> = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.creator_id == creator.id && !p.is_trashed() && p.is_visible_to(viewer))
            .cloned()
            .collect();
        pages.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(pages
            .into_iter()
            .skip(range.offset as usize)
            .take(range.limit as usize)
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryConfig {
    pub values: Mutex<HashMap<String, Value>>,
    pub reads: AtomicUsize,
    pub fail: AtomicBool,
}

impl MemoryConfig {
    pub fn set(&self, key: &str, value: Value) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigLookup for MemoryConfig {
    async fn get_config(&self, key: &str) -> Result<Option<Value>, DirectoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected_failure("config store"));
        }
        Ok(self.value(key))
    }

    async fn update_configs(&self, entries: Vec<(String, Value)>) -> Result<(), DirectoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected_failure("config store"));
        }
        let mut values = self.values.lock().unwrap();
        for (key, value) in entries {
            values.insert(key, value);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::SendFailed("mail relay down".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

// =============================================================================
// Test application
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUsers>,
    pub pages: Arc<MemoryPages>,
    pub settings: Arc<MemoryConfig>,
    pub mailer: Arc<RecordingMailer>,
    pub tokens: SessionTokens,
}

impl TestApp {
    /// Token for a logged-in administrator.
    pub fn admin_token(&self) -> String {
        self.tokens.issue(Uuid::new_v4(), true).unwrap()
    }

    /// Token for a logged-in non-admin user.
    pub fn user_token(&self, user_id: Uuid) -> String {
        self.tokens.issue(user_id, false).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Test application with default configuration.
pub fn test_app() -> TestApp {
    test_app_with(&[])
}

/// Test application with configuration overrides.
pub fn test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let mut all = vec![("database.url", "postgres://unused/for-tests")];
    all.extend_from_slice(overrides);
    let config = Config::load_for_test(&all).expect("Failed to load test config");

    let tokens = SessionTokens::new(
        &config.auth.session_secret,
        config.auth.session_expiry_secs,
        config.auth.leeway_secs,
    )
    .unwrap();

    let users = Arc::new(MemoryUsers::default());
    let pages = Arc::new(MemoryPages::default());
    let settings = Arc::new(MemoryConfig::default());
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState::new(
        config,
        users.clone(),
        pages.clone(),
        settings.clone(),
        mailer.clone(),
    )
    .expect("Failed to build app state");

    TestApp {
        router: build_router(state),
        users,
        pages,
        settings,
        mailer,
        tokens,
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn sample_user(status: UserStatus) -> User {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    User {
        id: Uuid::new_v4(),
        username: Some(format!("user-{}", &Uuid::new_v4().simple().to_string()[..8])),
        name,
        email,
        status,
        admin: false,
        password_hash: None,
        image_url: None,
        created_at: Utc::now() - Duration::days(30),
        last_login_at: None,
    }
}

pub fn sample_page(creator: &User, path: &str, grant: PageGrant, age_minutes: i64) -> Page {
    let updated_at = Utc::now() - Duration::minutes(age_minutes);
    Page {
        id: Uuid::new_v4(),
        path: path.to_string(),
        creator_id: creator.id,
        grant,
        last_update_user: Some(creator.clone()),
        created_at: updated_at - Duration::days(1),
        updated_at,
    }
}

// =============================================================================
// Requests
// =============================================================================

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!(
            "Failed to parse response body: {:?}",
            String::from_utf8_lossy(&body)
        )
    })
}

/// The single `validation_failed` message in a 400 body.
pub fn validation_messages(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .expect("validation errors are a list")
        .iter()
        .map(|e| {
            assert_eq!(e["code"], "validation_failed");
            e["message"].as_str().unwrap().to_string()
        })
        .collect()
}
