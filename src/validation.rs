//! Client-side form validation. A form that fails here never reaches the backend.
//!
//! Each `validate` returns every field error at once so the front end can show
//! them inline next to their fields.

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::domain::{AnswerOption, Credentials, Difficulty, NewAssociation, QuestionDraft, SkillDraft};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field: &'static str,
  pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
  fn push(&mut self, field: &'static str, message: impl Into<String>) {
    self.0.push(FieldError { field, message: message.into() });
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn has(&self, field: &str) -> bool {
    self.0.iter().any(|e| e.field == field)
  }

  fn into_result<T>(self, ok: T) -> Result<T, FormErrors> {
    if self.0.is_empty() { Ok(ok) } else { Err(self) }
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionForm {
  pub skill_id: i64,
  #[serde(default)] pub question_text: String,
  #[serde(default)] pub option_a: String,
  #[serde(default)] pub option_b: String,
  #[serde(default)] pub option_c: String,
  #[serde(default)] pub option_d: String,
  #[serde(default)] pub correct_option: String,
}

impl QuestionForm {
  pub fn validate(&self) -> Result<QuestionDraft, FormErrors> {
    let mut errs = FormErrors::default();
    if self.skill_id < 1 {
      errs.push("skillId", "Select a skill");
    }
    if self.question_text.trim().chars().count() < 5 {
      errs.push("questionText", "Question text must have at least 5 characters");
    }
    for (field, value, name) in [
      ("optionA", &self.option_a, "A"),
      ("optionB", &self.option_b, "B"),
      ("optionC", &self.option_c, "C"),
      ("optionD", &self.option_d, "D"),
    ] {
      if value.trim().is_empty() {
        errs.push(field, format!("Option {name} is required"));
      }
    }
    let correct = AnswerOption::parse(&self.correct_option);
    if correct.is_none() {
      errs.push("correctOption", "Correct option must be one of A, B, C or D");
    }

    errs.into_result(()).map(|_| QuestionDraft {
      skill_id: self.skill_id,
      question_text: self.question_text.trim().to_string(),
      option_a: self.option_a.trim().to_string(),
      option_b: self.option_b.trim().to_string(),
      option_c: self.option_c.trim().to_string(),
      option_d: self.option_d.trim().to_string(),
      correct_option: correct.map(|c| c.as_str().to_string()).unwrap_or_default(),
    })
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SkillForm {
  #[serde(default)] pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub image: String,
  #[serde(default)] pub category: Vec<i64>,
}

impl SkillForm {
  pub fn validate(&self) -> Result<SkillDraft, FormErrors> {
    let mut errs = FormErrors::default();
    if self.title.trim().is_empty() {
      errs.push("title", "Title is required");
    }
    if self.description.trim().is_empty() {
      errs.push("description", "Description is required");
    }
    if !is_web_url(&self.image) {
      errs.push("image", "Image URL must be valid");
    }
    if self.category.is_empty() {
      errs.push("category", "Select at least one category");
    }
    errs.into_result(SkillDraft {
      title: self.title.trim().to_string(),
      description: self.description.clone(),
      image: self.image.trim().to_string(),
      category: self.category.clone(),
    })
  }
}

#[derive(Clone, Default, Deserialize)]
pub struct SignInForm {
  #[serde(default)] pub email: String,
  #[serde(default)] pub password: String,
}

impl SignInForm {
  pub fn validate(&self) -> Result<Credentials, FormErrors> {
    let mut errs = FormErrors::default();
    check_email(&mut errs, &self.email);
    check_password(&mut errs, &self.password);
    errs.into_result(Credentials { login: self.email.trim().to_string(), password: self.password.clone() })
  }
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
  #[serde(default)] pub email: String,
  #[serde(default)] pub password: String,
  #[serde(default)] pub confirm_password: String,
}

impl SignUpForm {
  pub fn validate(&self) -> Result<Credentials, FormErrors> {
    let mut errs = FormErrors::default();
    check_email(&mut errs, &self.email);
    check_password(&mut errs, &self.password);
    if self.confirm_password.chars().count() < 6 {
      errs.push("confirmPassword", "Password confirmation is required");
    } else if self.confirm_password != self.password {
      errs.push("confirmPassword", "Passwords do not match");
    }
    errs.into_result(Credentials { login: self.email.trim().to_string(), password: self.password.clone() })
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationForm {
  #[serde(default)] pub skill_id: i64,
  #[serde(default)] pub difficulty_rating: String,
}

impl AssociationForm {
  pub fn validate(&self) -> Result<NewAssociation, FormErrors> {
    let mut errs = FormErrors::default();
    if self.skill_id < 1 {
      errs.push("skillId", "Select a skill");
    }
    let rating = Difficulty::parse(&self.difficulty_rating);
    if rating.is_none() {
      errs.push("difficultyRating", "Select a difficulty");
    }
    match rating {
      Some(difficulty_rating) if errs.is_empty() => Ok(NewAssociation { skill_id: self.skill_id, level: 1, difficulty_rating }),
      _ => Err(errs),
    }
  }
}

pub const MIN_CYCLE_MINUTES: u32 = 5;
pub const MAX_CYCLE_MINUTES: u32 = 60;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleForm {
  #[serde(default)] pub task: String,
  #[serde(default)] pub minutes_amount: u32,
}

impl CycleForm {
  pub fn validate(&self) -> Result<(String, u32), FormErrors> {
    let mut errs = FormErrors::default();
    if self.task.trim().is_empty() {
      errs.push("task", "Name the task");
    }
    if self.minutes_amount < MIN_CYCLE_MINUTES {
      errs.push("minutesAmount", format!("A cycle must last at least {MIN_CYCLE_MINUTES} minutes"));
    } else if self.minutes_amount > MAX_CYCLE_MINUTES {
      errs.push("minutesAmount", format!("A cycle must last at most {MAX_CYCLE_MINUTES} minutes"));
    }
    errs.into_result((self.task.trim().to_string(), self.minutes_amount))
  }
}

impl fmt::Debug for SignInForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SignInForm").field("email", &self.email).finish_non_exhaustive()
  }
}

impl fmt::Debug for SignUpForm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SignUpForm").field("email", &self.email).finish_non_exhaustive()
  }
}

fn check_email(errs: &mut FormErrors, email: &str) {
  if !is_email(email.trim()) {
    errs.push("email", "Enter a valid email address");
  }
}

fn check_password(errs: &mut FormErrors, pw: &str) {
  if pw.chars().count() < 6 {
    errs.push("password", "Password must have at least 6 characters");
  }
  if !pw.chars().any(|c| c.is_uppercase()) {
    errs.push("password", "Password must contain an uppercase letter");
  }
  if !pw.chars().any(|c| c.is_lowercase()) {
    errs.push("password", "Password must contain a lowercase letter");
  }
  if !pw.chars().any(|c| c.is_ascii_digit()) {
    errs.push("password", "Password must contain a digit");
  }
}

fn is_email(s: &str) -> bool {
  let Some((local, domain)) = s.split_once('@') else { return false };
  !local.is_empty()
    && !s.chars().any(char::is_whitespace)
    && !domain.contains('@')
    && domain.split('.').count() >= 2
    && domain.split('.').all(|part| !part.is_empty())
}

fn is_web_url(s: &str) -> bool {
  match Url::parse(s.trim()) {
    Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
    Err(_) => false,
  }
}
