//! Route table: URL paths the front end can show, and which of them need a session.

use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", content = "id", rename_all = "snake_case")]
pub enum Route {
  Home,
  Library,
  SkillDetail(i64),
  SkillQuestions(i64),
  SkillManagement,
  CreateSkill,
  EditSkill(i64),
  QuestionManagement,
  /// New question for the given skill.
  CreateQuestion(i64),
  EditQuestion(i64),
  Pomodoro,
  SignIn,
  SignUp,
}

impl Route {
  /// Parse a URL path. Query strings and trailing slashes are ignored.
  pub fn parse(path: &str) -> Option<Route> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let id = |s: &str| s.parse::<i64>().ok();

    match segs.as_slice() {
      [] => Some(Route::Home),
      // The router registers the misspelled path while the header links the correct one.
      ["biblioteca"] | ["bibliteca"] => Some(Route::Library),
      ["habilidade", "criar"] => Some(Route::CreateSkill),
      ["habilidade", "editar", n] => id(n).map(Route::EditSkill),
      ["habilidade", n] => id(n).map(Route::SkillDetail),
      ["questoes", "habilidade", n] => id(n).map(Route::SkillQuestions),
      ["questoes", "criar", n] => id(n).map(Route::CreateQuestion),
      ["questoes", "editar", n] => id(n).map(Route::EditQuestion),
      ["gerenciar", "conhecimento"] => Some(Route::SkillManagement),
      ["gerenciar", "questoes"] => Some(Route::QuestionManagement),
      ["pomodoro"] => Some(Route::Pomodoro),
      ["sign-in"] => Some(Route::SignIn),
      ["sign-up"] => Some(Route::SignUp),
      _ => None,
    }
  }

  pub fn path(&self) -> String {
    match self {
      Route::Home => "/".into(),
      Route::Library => "/biblioteca".into(),
      Route::SkillDetail(id) => format!("/habilidade/{id}"),
      Route::SkillQuestions(id) => format!("/questoes/habilidade/{id}"),
      Route::SkillManagement => "/gerenciar/conhecimento".into(),
      Route::CreateSkill => "/habilidade/criar".into(),
      Route::EditSkill(id) => format!("/habilidade/editar/{id}"),
      Route::QuestionManagement => "/gerenciar/questoes".into(),
      Route::CreateQuestion(skill_id) => format!("/questoes/criar/{skill_id}"),
      Route::EditQuestion(id) => format!("/questoes/editar/{id}"),
      Route::Pomodoro => "/pomodoro".into(),
      Route::SignIn => "/sign-in".into(),
      Route::SignUp => "/sign-up".into(),
    }
  }

  pub fn requires_session(&self) -> bool {
    !matches!(self, Route::SignIn | Route::SignUp)
  }

  /// Where a request for `self` actually lands given the session state.
  pub fn resolve(self, signed_in: bool) -> Route {
    if self.requires_session() && !signed_in { Route::SignIn } else { self }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path())
  }
}

/// Broadcast to every connected tab when the session changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
  SignedIn { login: String },
  /// The backend rejected the token; credentials are gone.
  Expired,
  SignedOut,
}
