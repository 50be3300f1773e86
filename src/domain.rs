//! Records exchanged with the remote backend: skills, categories, questions,
//! user-skill associations, and the auth payloads.
//!
//! Field names follow the backend's camelCase JSON. The backend owns every
//! invariant; these types only carry the data.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id: i64,
  pub name: String,
}

/// A catalogued knowledge topic. `description` is markdown and carried verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skill {
  pub id: i64,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub image: String,
  #[serde(default)] pub category: Vec<Category>,
}

/// Body of `POST /skill` and `PUT /skill/:id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillDraft {
  pub title: String,
  pub description: String,
  pub image: String,
  /// Category ids.
  pub category: Vec<i64>,
}

impl From<&Skill> for SkillDraft {
  fn from(s: &Skill) -> Self {
    Self {
      title: s.title.clone(),
      description: s.description.clone(),
      image: s.image.clone(),
      category: s.category.iter().map(|c| c.id).collect(),
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillPage {
  #[serde(alias = "content")]
  pub skills: Vec<Skill>,
  #[serde(default)] pub total_elements: u64,
  #[serde(default = "one")] pub total_pages: u32,
}

fn one() -> u32 { 1 }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  pub fn as_param(&self) -> &'static str {
    match self {
      SortDirection::Asc => "ASC",
      SortDirection::Desc => "DESC",
    }
  }
}

/// One of the four options of a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOption { A, B, C, D }

impl AnswerOption {
  pub const ALL: [AnswerOption; 4] = [AnswerOption::A, AnswerOption::B, AnswerOption::C, AnswerOption::D];

  pub fn as_str(&self) -> &'static str {
    match self {
      AnswerOption::A => "A",
      AnswerOption::B => "B",
      AnswerOption::C => "C",
      AnswerOption::D => "D",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim() {
      "A" | "a" => Some(AnswerOption::A),
      "B" | "b" => Some(AnswerOption::B),
      "C" | "c" => Some(AnswerOption::C),
      "D" | "d" => Some(AnswerOption::D),
      _ => None,
    }
  }
}

impl fmt::Display for AnswerOption {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: i64,
  #[serde(default)] pub skill: Option<Skill>,
  pub question_text: String,
  pub option_a: String,
  pub option_b: String,
  pub option_c: String,
  pub option_d: String,
  /// Absent when the backend hides the answer from quiz takers.
  #[serde(default)] pub correct_option: Option<AnswerOption>,
}

impl Question {
  pub fn option_text(&self, opt: AnswerOption) -> &str {
    match opt {
      AnswerOption::A => &self.option_a,
      AnswerOption::B => &self.option_b,
      AnswerOption::C => &self.option_c,
      AnswerOption::D => &self.option_d,
    }
  }
}

/// Body of `POST /questions` and `PUT /questions/:id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
  pub skill_id: i64,
  pub question_text: String,
  pub option_a: String,
  pub option_b: String,
  pub option_c: String,
  pub option_d: String,
  pub correct_option: String,
}

/// Result of `POST /questions/:id/validate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerVerdict {
  #[serde(alias = "isCorrect")]
  pub correct: bool,
  #[serde(default)] pub score: f64,
  #[serde(default)] pub level: f64,
}

/// Aggregate level/score of the current user for one skill.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillLevel {
  #[serde(default)] pub level: f64,
  #[serde(default)] pub score: f64,
}

/// Self-assessed proficiency. The backend speaks Portuguese labels; English
/// spellings are accepted on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
  #[serde(rename = "dominado", alias = "mastered")]
  Mastered,
  #[serde(rename = "fácil", alias = "easy")]
  Easy,
  #[serde(rename = "médio", alias = "medium")]
  Medium,
  #[serde(rename = "difícil", alias = "hard")]
  Hard,
}

impl Difficulty {
  pub const ALL: [Difficulty; 4] = [Difficulty::Mastered, Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  pub fn wire_value(&self) -> &'static str {
    match self {
      Difficulty::Mastered => "dominado",
      Difficulty::Easy => "fácil",
      Difficulty::Medium => "médio",
      Difficulty::Hard => "difícil",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Difficulty::Mastered => "mastered",
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }

  /// Accepts either the wire value or the English label.
  pub fn parse(s: &str) -> Option<Self> {
    Difficulty::ALL
      .into_iter()
      .find(|d| d.wire_value() == s || d.label().eq_ignore_ascii_case(s))
  }
}

/// A user's relationship to a skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSkill {
  pub id: i64,
  pub skill_id: i64,
  #[serde(default)] pub skill_name: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub image: String,
  #[serde(default)] pub level: f64,
  #[serde(default)] pub favorite: bool,
  #[serde(default)] pub difficulty_rating: Option<Difficulty>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssociation {
  pub skill_id: i64,
  pub level: u32,
  pub difficulty_rating: Difficulty,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
  pub login: String,
  pub password: String,
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials").field("login", &self.login).field("password", &"***").finish()
  }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
  #[serde(default)] pub login: Option<String>,
  #[serde(default)] pub token: Option<String>,
}

impl fmt::Debug for LoginResponse {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoginResponse")
      .field("login", &self.login)
      .field("token", &self.token.as_ref().map(|_| "***"))
      .finish()
  }
}
