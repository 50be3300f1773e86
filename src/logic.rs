//! Screen behaviors driven by client messages.
//!
//! Each operation updates the tab's `Screen`, calls the backend when needed and
//! returns the messages to send back. Backend failures stop here: they become
//! an error toast (and an empty list where a list failed to load). A 401 has
//! already ended the session inside `Backend`; the resulting `SessionEvent`
//! moves every tab to the sign-in screen.

use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::Backend;
use crate::catalog::Debouncer;
use crate::domain::{AnswerOption, Difficulty, SortDirection};
use crate::error::ApiError;
use crate::navigation::{Route, SessionEvent};
use crate::protocol::{catalog_out, quiz_out, ClientWsMessage, ServerWsMessage, ToastLevel};
use crate::quiz::{QuizPhase, QuizSession, SubmitRejected};
use crate::state::{AppState, Screen};
use crate::validation::{
  AssociationForm, CycleForm, FieldError, FormErrors, QuestionForm, SignInForm, SignUpForm, SkillForm,
};

/// One connected tab: its screens, its outbound queue and its search debouncer.
pub struct Tab {
  pub screen: Arc<Mutex<Screen>>,
  pub outbound: mpsc::UnboundedSender<ServerWsMessage>,
  debouncer: Debouncer,
}

impl Tab {
  pub fn new(state: &AppState, outbound: mpsc::UnboundedSender<ServerWsMessage>) -> Self {
    Self {
      screen: Arc::new(Mutex::new(state.new_screen())),
      outbound,
      debouncer: Debouncer::new(Duration::from_millis(state.config.catalog.debounce_ms)),
    }
  }
}

/// Turn a backend failure into the toast the user sees.
fn api_failure(err: &ApiError, what: &str) -> ServerWsMessage {
  if err.is_unauthorized() {
    return ServerWsMessage::failure("Your session has expired. Please sign in again.");
  }
  error!(target: "skillshelf", error = %err, "{}", what);
  ServerWsMessage::failure(what)
}

fn form_errors(form: &'static str, errors: FormErrors) -> ServerWsMessage {
  ServerWsMessage::FormErrors { form, errors }
}

fn navigate(route: Route) -> ServerWsMessage {
  ServerWsMessage::Navigate { path: route.path() }
}

/// Messages a tab receives when the shared session changes.
pub fn session_event_messages(ev: &SessionEvent) -> Vec<ServerWsMessage> {
  match ev {
    SessionEvent::SignedIn { login } => vec![ServerWsMessage::Session { signed_in: true, login: Some(login.clone()) }],
    SessionEvent::Expired | SessionEvent::SignedOut => vec![
      ServerWsMessage::Session { signed_in: false, login: None },
      navigate(Route::SignIn),
    ],
  }
}

#[instrument(level = "info", skip_all)]
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, tab: &mut Tab) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],
    ClientWsMessage::Navigate { path } => navigate_to(state, &path).await,
    ClientWsMessage::Session => vec![session_status(state).await],
    ClientWsMessage::SignIn { form } => sign_in(state, &form).await,
    ClientWsMessage::SignUp { form } => sign_up(state, &form).await,
    ClientWsMessage::SignOut => {
      state.backend.logout().await;
      info!(target: "session", "Signed out");
      vec![ServerWsMessage::Toast { level: ToastLevel::Info, message: "Signed out.".into() }]
    }

    ClientWsMessage::LoadCategories => load_categories(state).await,
    ClientWsMessage::SearchTitle { title } => {
      search_title(state, tab, &title).await;
      vec![]
    }
    ClientWsMessage::ToggleCategory { category_id } => toggle_category(state, tab, category_id).await,
    ClientWsMessage::SetSort { direction } => set_sort(state, tab, direction).await,
    ClientWsMessage::SetPage { page } => set_page(state, tab, page).await,
    ClientWsMessage::RefreshCatalog => {
      tab.debouncer.cancel();
      fetch_catalog(&state.backend, &tab.screen).await.into_iter().collect()
    }
    ClientWsMessage::LoadSkill { skill_id } => load_skill(state, skill_id).await,

    ClientWsMessage::ListSkills => list_skills(state, tab).await,
    ClientWsMessage::CreateSkill { form } => save_skill(state, None, &form).await,
    ClientWsMessage::UpdateSkill { skill_id, form } => save_skill(state, Some(skill_id), &form).await,
    ClientWsMessage::DeleteSkill { skill_id } => delete_skill(state, tab, skill_id).await,

    ClientWsMessage::ListQuestions => list_questions(state, tab).await,
    ClientWsMessage::LoadQuestion { question_id } => load_question(state, question_id).await,
    ClientWsMessage::CreateQuestion { form } => save_question(state, None, &form).await,
    ClientWsMessage::UpdateQuestion { question_id, form } => save_question(state, Some(question_id), &form).await,
    ClientWsMessage::DeleteQuestion { question_id } => delete_question(state, tab, question_id).await,

    ClientWsMessage::StartQuiz { skill_id } => start_quiz(state, tab, skill_id).await,
    ClientWsMessage::SelectOption { option } => select_option(tab, option).await,
    ClientWsMessage::SubmitAnswer => submit_answer(state, tab).await,

    ClientWsMessage::LoadLibrary => load_library(state, tab).await,
    ClientWsMessage::CreateAssociation { form } => create_association(state, tab, &form).await,
    ClientWsMessage::ToggleFavorite { id } => toggle_favorite(state, tab, id).await,
    ClientWsMessage::SetDifficulty { skill_id, rating } => set_difficulty(state, tab, skill_id, &rating).await,
    ClientWsMessage::DeleteAssociation { id } => delete_association(state, tab, id).await,

    ClientWsMessage::StartCycle { form } => start_cycle(tab, &form).await,
    ClientWsMessage::InterruptCycle => interrupt_cycle(tab).await,
    ClientWsMessage::CycleStatus => cycle_status(tab).await,
  }
}

// -------- Session --------

pub async fn session_status(state: &AppState) -> ServerWsMessage {
  let store = state.store();
  let signed_in = store.is_signed_in().await;
  let login = if signed_in { store.remembered_login().await } else { None };
  ServerWsMessage::Session { signed_in, login }
}

pub async fn navigate_to(state: &AppState, path: &str) -> Vec<ServerWsMessage> {
  match Route::parse(path) {
    Some(route) => {
      let resolved = route.resolve(state.store().is_signed_in().await);
      if resolved != route {
        debug!(target: "session", requested = %route, "No session; redirecting to sign-in");
      }
      vec![navigate(resolved)]
    }
    None => vec![ServerWsMessage::Error { message: format!("Unknown path: {}", path) }],
  }
}

#[instrument(level = "info", skip_all, fields(email = %form.email))]
pub async fn sign_in(state: &AppState, form: &SignInForm) -> Vec<ServerWsMessage> {
  let creds = match form.validate() {
    Ok(c) => c,
    Err(errs) => return vec![form_errors("sign_in", errs)],
  };
  match state.backend.login(&creds).await {
    Ok(_) => vec![ServerWsMessage::success("Welcome back!"), navigate(Route::Home)],
    Err(e) => {
      warn!(target: "session", error = %e, "Sign-in failed");
      vec![ServerWsMessage::failure("Sign-in failed. Check your email and password.")]
    }
  }
}

#[instrument(level = "info", skip_all, fields(email = %form.email))]
pub async fn sign_up(state: &AppState, form: &SignUpForm) -> Vec<ServerWsMessage> {
  let creds = match form.validate() {
    Ok(c) => c,
    Err(errs) => return vec![form_errors("sign_up", errs)],
  };
  match state.backend.register(&creds).await {
    Ok(_) => vec![ServerWsMessage::success("Account created!"), navigate(Route::Home)],
    Err(e) => {
      warn!(target: "session", error = %e, "Sign-up failed");
      vec![ServerWsMessage::failure("Sign-up failed. Try again.")]
    }
  }
}

// -------- Catalog --------

pub async fn load_categories(state: &AppState) -> Vec<ServerWsMessage> {
  match state.backend.list_categories().await {
    Ok(categories) => vec![ServerWsMessage::Categories { categories }],
    Err(e) => vec![api_failure(&e, "Could not load categories."), ServerWsMessage::Categories { categories: vec![] }],
  }
}

/// Issue a search for the tab's current query. `None` when the response was stale.
#[instrument(level = "info", skip_all)]
pub async fn fetch_catalog(backend: &Backend, screen: &Mutex<Screen>) -> Option<ServerWsMessage> {
  let (generation, query) = screen.lock().await.catalog.begin();
  let outcome = backend.search_skills(&query).await.map_err(|e| {
    if !e.is_unauthorized() {
      error!(target: "catalog", error = %e, "Skill search failed");
    }
    "Could not load skills.".to_string()
  });

  let mut s = screen.lock().await;
  if s.catalog.finish(generation, outcome) {
    info!(target: "catalog", generation, results = s.catalog.results().len(), page = s.catalog.page(), "Catalog updated");
    Some(ServerWsMessage::Catalog(catalog_out(&s.catalog)))
  } else {
    debug!(target: "catalog", generation, "Dropped stale search response");
    None
  }
}

/// Record the title and schedule a debounced search; the result is pushed later.
pub async fn search_title(state: &AppState, tab: &mut Tab, title: &str) {
  tab.screen.lock().await.catalog.set_title(title);

  let backend = state.backend.clone();
  let screen = tab.screen.clone();
  let out = tab.outbound.clone();
  tab.debouncer.call(async move {
    if let Some(msg) = fetch_catalog(&backend, &screen).await {
      let _ = out.send(msg);
    }
  });
}

async fn refetch_now(state: &AppState, tab: &mut Tab) -> Vec<ServerWsMessage> {
  // A pending title search would only repeat this query.
  tab.debouncer.cancel();
  fetch_catalog(&state.backend, &tab.screen).await.into_iter().collect()
}

pub async fn toggle_category(state: &AppState, tab: &mut Tab, category_id: i64) -> Vec<ServerWsMessage> {
  tab.screen.lock().await.catalog.toggle_category(category_id);
  refetch_now(state, tab).await
}

pub async fn set_sort(state: &AppState, tab: &mut Tab, direction: SortDirection) -> Vec<ServerWsMessage> {
  tab.screen.lock().await.catalog.set_sort(direction);
  refetch_now(state, tab).await
}

pub async fn set_page(state: &AppState, tab: &mut Tab, page: u32) -> Vec<ServerWsMessage> {
  tab.screen.lock().await.catalog.set_page(page);
  refetch_now(state, tab).await
}

pub async fn load_skill(state: &AppState, skill_id: i64) -> Vec<ServerWsMessage> {
  match state.backend.get_skill(skill_id).await {
    Ok(skill) => vec![ServerWsMessage::Skill { skill }],
    Err(e) if e.is_not_found() => vec![ServerWsMessage::failure("Skill not found.")],
    Err(e) => vec![api_failure(&e, "Could not load the skill.")],
  }
}

// -------- Skill management --------

pub async fn list_skills(state: &AppState, tab: &mut Tab) -> Vec<ServerWsMessage> {
  let (skills, mut out) = match state.backend.list_skills().await {
    Ok(s) => (s, vec![]),
    Err(e) => (vec![], vec![api_failure(&e, "Could not load skills.")]),
  };
  tab.screen.lock().await.managed_skills = skills.clone();
  out.push(ServerWsMessage::Skills { skills });
  out
}

#[instrument(level = "info", skip(state, form))]
pub async fn save_skill(state: &AppState, skill_id: Option<i64>, form: &SkillForm) -> Vec<ServerWsMessage> {
  let draft = match form.validate() {
    Ok(d) => d,
    Err(errs) => return vec![form_errors("skill", errs)],
  };
  let result = match skill_id {
    Some(id) => state.backend.update_skill(id, &draft).await,
    None => state.backend.create_skill(&draft).await,
  };
  match (result, skill_id) {
    (Ok(()), Some(_)) => vec![ServerWsMessage::success("Skill updated."), navigate(Route::SkillManagement)],
    (Ok(()), None) => vec![ServerWsMessage::success("Skill created."), navigate(Route::SkillManagement)],
    (Err(e), Some(_)) => vec![api_failure(&e, "Could not update the skill.")],
    (Err(e), None) => vec![api_failure(&e, "Could not create the skill.")],
  }
}

pub async fn delete_skill(state: &AppState, tab: &mut Tab, skill_id: i64) -> Vec<ServerWsMessage> {
  if let Err(e) = state.backend.delete_skill(skill_id).await {
    return vec![api_failure(&e, "Could not delete the skill.")];
  }
  let mut s = tab.screen.lock().await;
  s.managed_skills.retain(|sk| sk.id != skill_id);
  vec![ServerWsMessage::success("Skill deleted."), ServerWsMessage::Skills { skills: s.managed_skills.clone() }]
}

// -------- Question management --------

pub async fn list_questions(state: &AppState, tab: &mut Tab) -> Vec<ServerWsMessage> {
  let (questions, mut out) = match state.backend.list_questions().await {
    Ok(q) => (q, vec![]),
    Err(e) => (vec![], vec![api_failure(&e, "Could not load questions.")]),
  };
  tab.screen.lock().await.managed_questions = questions.clone();
  out.push(ServerWsMessage::Questions { questions });
  out
}

pub async fn load_question(state: &AppState, question_id: i64) -> Vec<ServerWsMessage> {
  match state.backend.get_question(question_id).await {
    Ok(question) => vec![ServerWsMessage::Question { question }],
    Err(e) if e.is_not_found() => vec![ServerWsMessage::failure("Question not found.")],
    Err(e) => vec![api_failure(&e, "Could not load the question.")],
  }
}

#[instrument(level = "info", skip(state, form))]
pub async fn save_question(state: &AppState, question_id: Option<i64>, form: &QuestionForm) -> Vec<ServerWsMessage> {
  let draft = match form.validate() {
    Ok(d) => d,
    Err(errs) => return vec![form_errors("question", errs)],
  };
  let result = match question_id {
    Some(id) => state.backend.update_question(id, &draft).await,
    None => state.backend.create_question(&draft).await,
  };
  match (result, question_id) {
    (Ok(()), Some(_)) => vec![ServerWsMessage::success("Question updated."), navigate(Route::QuestionManagement)],
    (Ok(()), None) => vec![ServerWsMessage::success("Question created."), navigate(Route::QuestionManagement)],
    (Err(e), Some(_)) => vec![api_failure(&e, "Could not update the question.")],
    (Err(e), None) => vec![api_failure(&e, "Could not create the question.")],
  }
}

pub async fn delete_question(state: &AppState, tab: &mut Tab, question_id: i64) -> Vec<ServerWsMessage> {
  if let Err(e) = state.backend.delete_question(question_id).await {
    return vec![api_failure(&e, "Could not delete the question.")];
  }
  let mut s = tab.screen.lock().await;
  s.managed_questions.retain(|q| q.id != question_id);
  vec![ServerWsMessage::success("Question deleted."), ServerWsMessage::Questions { questions: s.managed_questions.clone() }]
}

// -------- Quiz --------

#[instrument(level = "info", skip(state, tab))]
pub async fn start_quiz(state: &AppState, tab: &mut Tab, skill_id: i64) -> Vec<ServerWsMessage> {
  let questions = match state.backend.questions_for_skill(skill_id).await {
    Ok(q) => q,
    Err(e) => {
      tab.screen.lock().await.quiz = None;
      return vec![api_failure(&e, "Could not load questions.")];
    }
  };
  info!(target: "quiz", skill_id, questions = questions.len(), "Quiz started");
  let quiz = QuizSession::new(skill_id, questions, state.config.quiz.advance);
  let completed = quiz.phase() == QuizPhase::Completed;
  tab.screen.lock().await.quiz = Some(quiz);

  if completed {
    finish_quiz(state, tab).await
  } else {
    current_quiz(tab).await.into_iter().collect()
  }
}

async fn current_quiz(tab: &Tab) -> Option<ServerWsMessage> {
  tab.screen.lock().await.quiz.as_ref().map(quiz_out)
}

pub async fn select_option(tab: &mut Tab, option: AnswerOption) -> Vec<ServerWsMessage> {
  let mut s = tab.screen.lock().await;
  match s.quiz.as_mut() {
    Some(quiz) => {
      quiz.select(option);
      vec![quiz_out(quiz)]
    }
    None => vec![ServerWsMessage::Error { message: "No quiz in progress.".into() }],
  }
}

#[instrument(level = "info", skip_all)]
pub async fn submit_answer(state: &AppState, tab: &mut Tab) -> Vec<ServerWsMessage> {
  let ticket = {
    let s = tab.screen.lock().await;
    let Some(quiz) = s.quiz.as_ref() else {
      return vec![ServerWsMessage::Error { message: "No quiz in progress.".into() }];
    };
    match quiz.submit() {
      Ok(t) => t,
      Err(SubmitRejected::NothingSelected) => return vec![ServerWsMessage::failure("Select an answer.")],
      Err(SubmitRejected::AlreadyCompleted) => return vec![ServerWsMessage::failure("The quiz is already complete.")],
    }
  };

  let verdict = match state.backend.validate_answer(ticket.question_id, ticket.answer).await {
    Ok(v) => v,
    Err(e) => return vec![api_failure(&e, "Could not validate the answer.")],
  };

  let (feedback, completed) = {
    let mut s = tab.screen.lock().await;
    let Some(quiz) = s.quiz.as_mut() else { return vec![] };
    let fb = quiz.apply_verdict(&verdict);
    (fb, quiz.phase() == QuizPhase::Completed)
  };

  let mut out = vec![ServerWsMessage::QuizFeedback { feedback }];
  if completed {
    out.extend(finish_quiz(state, tab).await);
  } else {
    out.extend(current_quiz(tab).await);
  }
  out
}

/// Fetch the aggregate level for the completion screen.
async fn finish_quiz(state: &AppState, tab: &mut Tab) -> Vec<ServerWsMessage> {
  let Some(skill_id) = tab.screen.lock().await.quiz.as_ref().map(|q| q.skill_id()) else {
    return vec![];
  };
  let mut out = vec![];
  match state.backend.skill_level(skill_id).await {
    Ok(level) => {
      if let Some(quiz) = tab.screen.lock().await.quiz.as_mut() {
        quiz.complete_with(level);
      }
      info!(target: "quiz", skill_id, level = level.level, score = level.score, "Quiz completed");
    }
    Err(e) => out.push(api_failure(&e, "Could not load your level for this skill.")),
  }
  out.extend(current_quiz(tab).await);
  out
}

// -------- Library --------

fn library_view(s: &Screen) -> ServerWsMessage {
  ServerWsMessage::Library { cards: s.library.view() }
}

pub async fn load_library(state: &AppState, tab: &mut Tab) -> Vec<ServerWsMessage> {
  let (entries, mut out) = match state.backend.list_associations().await {
    Ok(e) => (e, vec![]),
    Err(e) => (vec![], vec![api_failure(&e, "Could not load your skills.")]),
  };
  let mut s = tab.screen.lock().await;
  s.library.replace(entries);
  out.push(library_view(&s));
  out
}

pub async fn create_association(state: &AppState, tab: &mut Tab, form: &AssociationForm) -> Vec<ServerWsMessage> {
  let assoc = match form.validate() {
    Ok(a) => a,
    Err(errs) => return vec![form_errors("association", errs)],
  };
  if let Err(e) = state.backend.create_association(&assoc).await {
    return vec![api_failure(&e, "Could not create the association.")];
  }
  let mut out = vec![ServerWsMessage::success("Association created!")];
  out.extend(load_library(state, tab).await);
  out
}

pub async fn toggle_favorite(state: &AppState, tab: &mut Tab, id: i64) -> Vec<ServerWsMessage> {
  let updated = match state.backend.toggle_favorite(id).await {
    Ok(u) => u,
    Err(e) => return vec![api_failure(&e, "Could not change the favorite.")],
  };
  let mut s = tab.screen.lock().await;
  s.library.apply_favorite(id, &updated);
  let action = if updated.favorite { "added to" } else { "removed from" };
  vec![ServerWsMessage::success(format!("Skill {} favorites!", action)), library_view(&s)]
}

pub async fn set_difficulty(state: &AppState, tab: &mut Tab, skill_id: i64, rating: &str) -> Vec<ServerWsMessage> {
  let Some(rating) = Difficulty::parse(rating) else {
    let errs = FormErrors(vec![FieldError { field: "difficultyRating", message: "Select a difficulty".into() }]);
    return vec![form_errors("difficulty", errs)];
  };

  // Show the pick before the round-trip.
  {
    let mut s = tab.screen.lock().await;
    s.library.mark_pending(skill_id, rating);
    let _ = tab.outbound.send(library_view(&s));
  }

  match state.backend.update_difficulty(skill_id, rating).await {
    Ok(updated) => {
      let mut s = tab.screen.lock().await;
      s.library.apply_difficulty(skill_id, &updated);
      vec![ServerWsMessage::success("Difficulty updated!"), library_view(&s)]
    }
    Err(e) => {
      let mut s = tab.screen.lock().await;
      s.library.clear_pending(skill_id);
      vec![api_failure(&e, "Could not update the difficulty."), library_view(&s)]
    }
  }
}

pub async fn delete_association(state: &AppState, tab: &mut Tab, id: i64) -> Vec<ServerWsMessage> {
  if let Err(e) = state.backend.delete_association(id).await {
    return vec![api_failure(&e, "Could not delete the skill.")];
  }
  let mut s = tab.screen.lock().await;
  s.library.remove(id);
  vec![ServerWsMessage::success("Skill removed from your library."), library_view(&s)]
}

// -------- Pomodoro --------

fn cycle_view(s: &Screen, now: Instant) -> ServerWsMessage {
  ServerWsMessage::Cycle { active: s.cycles.view(now), history: s.cycles.summaries() }
}

pub async fn start_cycle(tab: &mut Tab, form: &CycleForm) -> Vec<ServerWsMessage> {
  let now = Instant::now();
  let mut s = tab.screen.lock().await;
  if let Err(errs) = s.cycles.start(form, now) {
    return vec![form_errors("cycle", errs)];
  }
  info!(target: "skillshelf", minutes = form.minutes_amount, "Pomodoro cycle started");
  vec![cycle_view(&s, now)]
}

pub async fn interrupt_cycle(tab: &mut Tab) -> Vec<ServerWsMessage> {
  let now = Instant::now();
  let mut s = tab.screen.lock().await;
  if s.cycles.interrupt(now) {
    vec![ServerWsMessage::Toast { level: ToastLevel::Info, message: "Cycle interrupted.".into() }, cycle_view(&s, now)]
  } else {
    vec![cycle_view(&s, now)]
  }
}

/// Advance the clock; announces the cycle that just ran out.
pub async fn cycle_status(tab: &mut Tab) -> Vec<ServerWsMessage> {
  let now = Instant::now();
  let mut s = tab.screen.lock().await;
  let was_active = s.cycles.active().is_some();
  s.cycles.tick(now);
  if was_active && s.cycles.active().is_none() {
    vec![ServerWsMessage::success("Cycle finished!"), cycle_view(&s, now)]
  } else {
    vec![cycle_view(&s, now)]
  }
}
