//! Client for the remote skill-catalog REST API.
//!
//! Every request carries `Authorization: Bearer <token>` when a token is stored.
//! A 401 from any endpoint clears the stored credentials and broadcasts
//! `SessionEvent::Expired`; there is no refresh and no retry.
//!
//! Calls are instrumented with method, path, status and latency. Tokens and
//! passwords are never logged.

use std::time::{Duration, Instant};

use reqwest::{header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT}, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
  AnswerOption, AnswerVerdict, Category, Credentials, Difficulty, LoginResponse, NewAssociation,
  Question, QuestionDraft, Skill, SkillDraft, SkillLevel, SkillPage, SortDirection, UserSkill,
};
use crate::error::ApiError;
use crate::navigation::SessionEvent;
use crate::storage::{CredentialStore, LOGIN_KEY, TOKEN_KEY};
use crate::util::trunc_for_log;

const CLIENT_UA: &str = "skillshelf/0.1";

/// Parameters of `GET /skill/search`.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillSearch {
  pub category_id: Option<i64>,
  pub title: String,
  pub page: u32,
  pub size: u32,
  pub sort: SortDirection,
}

impl SkillSearch {
  /// Query pairs; empty title and missing category are left out.
  pub fn to_query(&self) -> Vec<(&'static str, String)> {
    let mut q = Vec::with_capacity(5);
    if let Some(c) = self.category_id {
      q.push(("categoryId", c.to_string()));
    }
    let title = self.title.trim();
    if !title.is_empty() {
      q.push(("title", title.to_string()));
    }
    q.push(("page", self.page.to_string()));
    q.push(("size", self.size.to_string()));
    q.push(("sortDirection", self.sort.as_param().to_string()));
    q
  }
}

#[derive(Clone)]
pub struct Backend {
  client: reqwest::Client,
  pub base_url: String,
  store: CredentialStore,
  events: broadcast::Sender<SessionEvent>,
}

impl Backend {
  pub fn new(base_url: &str, timeout: Duration, store: CredentialStore) -> Result<Self, ApiError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let (events, _) = broadcast::channel(16);
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      store,
      events,
    })
  }

  pub fn store(&self) -> &CredentialStore {
    &self.store
  }

  pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
    self.events.subscribe()
  }

  pub fn notify(&self, ev: SessionEvent) {
    // No subscribers is fine.
    let _ = self.events.send(ev);
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let url = format!("{}{}", self.base_url, path);
    self.client.request(method, url)
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
  }

  /// Attach the token, send, and classify the status.
  async fn dispatch(&self, method: &Method, path: &str, req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let req = match self.store.token().await {
      Some(token) => req.header(AUTHORIZATION, format!("Bearer {}", token)),
      None => req,
    };

    let start = Instant::now();
    let res = req.send().await?;
    let status = res.status();
    debug!(target: "skillshelf", %method, %path, status = status.as_u16(), elapsed = ?start.elapsed(), "Backend call");

    if status.as_u16() == 401 {
      warn!(target: "session", %method, %path, "Backend answered 401; clearing credentials");
      self.store.clear().await;
      self.notify(SessionEvent::Expired);
      return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      debug!(target: "skillshelf", %path, status = status.as_u16(), body = %trunc_for_log(&body, 300), "Backend error body");
      let message = extract_backend_error(&body).unwrap_or(body);
      return Err(ApiError::Status { status: status.as_u16(), message });
    }
    Ok(res)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    let res = self.dispatch(&Method::GET, path, self.request(Method::GET, path)).await?;
    Ok(res.json::<T>().await?)
  }

  async fn send_json<B: Serialize, T: DeserializeOwned>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError> {
    let req = self.request(method.clone(), path).json(body);
    let res = self.dispatch(&method, path, req).await?;
    Ok(res.json::<T>().await?)
  }

  async fn send_unit<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ApiError> {
    let mut req = self.request(method.clone(), path);
    if let Some(b) = body {
      req = req.json(b);
    }
    self.dispatch(&method, path, req).await?;
    Ok(())
  }

  // --- Auth ---

  #[instrument(level = "info", skip(self, creds), fields(login = %creds.login))]
  pub async fn login(&self, creds: &Credentials) -> Result<LoginResponse, ApiError> {
    let res: LoginResponse = self.send_json(Method::POST, "/auth/login", creds).await?;
    self.remember(&res).await?;
    Ok(res)
  }

  #[instrument(level = "info", skip(self, creds), fields(login = %creds.login))]
  pub async fn register(&self, creds: &Credentials) -> Result<LoginResponse, ApiError> {
    let res: LoginResponse = self.send_json(Method::POST, "/auth/register", creds).await?;
    self.remember(&res).await?;
    Ok(res)
  }

  /// A response without a token is not a session; nothing is stored for it.
  async fn remember(&self, res: &LoginResponse) -> Result<(), ApiError> {
    let Some(token) = &res.token else {
      warn!(target: "session", "Auth response carried no token");
      return Err(ApiError::Decode("auth response carried no token".into()));
    };
    self.store.set(TOKEN_KEY, token).await;
    if let Some(login) = &res.login {
      self.store.set(LOGIN_KEY, login).await;
    }
    let login = res.login.clone().unwrap_or_default();
    info!(target: "session", %login, "Signed in");
    self.notify(SessionEvent::SignedIn { login });
    Ok(())
  }

  pub async fn logout(&self) {
    self.store.clear().await;
    self.notify(SessionEvent::SignedOut);
  }

  // --- Skills ---

  #[instrument(level = "info", skip(self))]
  pub async fn list_skills(&self) -> Result<Vec<Skill>, ApiError> {
    self.get_json("/skill").await
  }

  #[instrument(level = "info", skip(self, q), fields(page = q.page, category = ?q.category_id, title_len = q.title.len()))]
  pub async fn search_skills(&self, q: &SkillSearch) -> Result<SkillPage, ApiError> {
    let path = "/skill/search";
    let req = self.request(Method::GET, path).query(&q.to_query());
    let res = self.dispatch(&Method::GET, path, req).await?;
    Ok(res.json::<SkillPage>().await?)
  }

  #[instrument(level = "info", skip(self))]
  pub async fn get_skill(&self, id: i64) -> Result<Skill, ApiError> {
    self.get_json(&format!("/skill/{id}")).await
  }

  #[instrument(level = "info", skip(self, draft), fields(title = %draft.title))]
  pub async fn create_skill(&self, draft: &SkillDraft) -> Result<(), ApiError> {
    self.send_unit(Method::POST, "/skill", Some(draft)).await
  }

  #[instrument(level = "info", skip(self, draft))]
  pub async fn update_skill(&self, id: i64, draft: &SkillDraft) -> Result<(), ApiError> {
    self.send_unit(Method::PUT, &format!("/skill/{id}"), Some(draft)).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn delete_skill(&self, id: i64) -> Result<(), ApiError> {
    self.send_unit::<()>(Method::DELETE, &format!("/skill/{id}"), None).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
    self.get_json("/category").await
  }

  // --- Questions ---

  #[instrument(level = "info", skip(self))]
  pub async fn list_questions(&self) -> Result<Vec<Question>, ApiError> {
    self.get_json("/questions").await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn get_question(&self, id: i64) -> Result<Question, ApiError> {
    self.get_json(&format!("/questions/{id}")).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn questions_for_skill(&self, skill_id: i64) -> Result<Vec<Question>, ApiError> {
    self.get_json(&format!("/questions/skill/{skill_id}")).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn validate_answer(&self, question_id: i64, answer: AnswerOption) -> Result<AnswerVerdict, ApiError> {
    #[derive(Serialize)]
    struct Body<'a> { answer: &'a str }
    let v: AnswerVerdict = self
      .send_json(Method::POST, &format!("/questions/{question_id}/validate"), &Body { answer: answer.as_str() })
      .await?;
    info!(target: "quiz", %question_id, correct = v.correct, score = v.score, level = v.level, "Answer validated");
    Ok(v)
  }

  #[instrument(level = "info", skip(self, draft), fields(skill_id = draft.skill_id))]
  pub async fn create_question(&self, draft: &QuestionDraft) -> Result<(), ApiError> {
    self.send_unit(Method::POST, "/questions", Some(draft)).await
  }

  #[instrument(level = "info", skip(self, draft))]
  pub async fn update_question(&self, id: i64, draft: &QuestionDraft) -> Result<(), ApiError> {
    self.send_unit(Method::PUT, &format!("/questions/{id}"), Some(draft)).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn delete_question(&self, id: i64) -> Result<(), ApiError> {
    self.send_unit::<()>(Method::DELETE, &format!("/questions/{id}"), None).await
  }

  // --- User skills ---

  #[instrument(level = "info", skip(self))]
  pub async fn list_associations(&self) -> Result<Vec<UserSkill>, ApiError> {
    self.get_json("/user_skills").await
  }

  #[instrument(level = "info", skip(self), fields(skill_id = assoc.skill_id))]
  pub async fn create_association(&self, assoc: &NewAssociation) -> Result<(), ApiError> {
    self.send_unit(Method::POST, "/user_skills", Some(assoc)).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn delete_association(&self, id: i64) -> Result<(), ApiError> {
    self.send_unit::<()>(Method::DELETE, &format!("/user_skills/{id}"), None).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn toggle_favorite(&self, id: i64) -> Result<UserSkill, ApiError> {
    let path = format!("/user_skills/{id}/favorite");
    let res = self.dispatch(&Method::PATCH, &path, self.request(Method::PATCH, &path)).await?;
    Ok(res.json::<UserSkill>().await?)
  }

  #[instrument(level = "info", skip(self))]
  pub async fn update_difficulty(&self, skill_id: i64, rating: Difficulty) -> Result<UserSkill, ApiError> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Body { difficulty_rating: Difficulty }
    self
      .send_json(Method::PUT, &format!("/user_skills/skill/{skill_id}/difficulty"), &Body { difficulty_rating: rating })
      .await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn skill_level(&self, skill_id: i64) -> Result<SkillLevel, ApiError> {
    self.get_json(&format!("/user_skills/skill/{skill_id}/level")).await
  }
}

/// Pull a readable message out of a JSON error body (`{"message": ...}` or `{"error": ...}`).
fn extract_backend_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EBody {
    #[serde(default)] message: Option<String>,
    #[serde(default)] error: Option<String>,
  }
  let b = serde_json::from_str::<EBody>(body).ok()?;
  b.message.or(b.error).filter(|m| !m.is_empty())
}
