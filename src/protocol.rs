//! Public protocol structs for the WebSocket and HTTP endpoints (serde ready).
//! One WebSocket connection carries one tab's screens; every client message is
//! answered with zero or more server messages, and session changes are pushed.

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogState, Pagination};
use crate::domain::{AnswerOption, Category, Question, Skill, SortDirection};
use crate::library::LibraryCard;
use crate::pomodoro::{CycleSummary, CycleView};
use crate::quiz::{Feedback, QuizSession};
use crate::validation::{
    AssociationForm, CycleForm, FormErrors, QuestionForm, SignInForm, SignUpForm, SkillForm,
};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Navigate {
        path: String,
    },
    Session,
    SignIn {
        #[serde(flatten)]
        form: SignInForm,
    },
    SignUp {
        #[serde(flatten)]
        form: SignUpForm,
    },
    SignOut,

    // Catalog
    LoadCategories,
    SearchTitle {
        title: String,
    },
    ToggleCategory {
        #[serde(rename = "categoryId")]
        category_id: i64,
    },
    SetSort {
        direction: SortDirection,
    },
    SetPage {
        page: u32,
    },
    RefreshCatalog,
    LoadSkill {
        #[serde(rename = "skillId")]
        skill_id: i64,
    },

    // Skill management
    ListSkills,
    CreateSkill {
        form: SkillForm,
    },
    UpdateSkill {
        #[serde(rename = "skillId")]
        skill_id: i64,
        form: SkillForm,
    },
    DeleteSkill {
        #[serde(rename = "skillId")]
        skill_id: i64,
    },

    // Question management
    ListQuestions,
    LoadQuestion {
        #[serde(rename = "questionId")]
        question_id: i64,
    },
    CreateQuestion {
        form: QuestionForm,
    },
    UpdateQuestion {
        #[serde(rename = "questionId")]
        question_id: i64,
        form: QuestionForm,
    },
    DeleteQuestion {
        #[serde(rename = "questionId")]
        question_id: i64,
    },

    // Quiz
    StartQuiz {
        #[serde(rename = "skillId")]
        skill_id: i64,
    },
    SelectOption {
        option: AnswerOption,
    },
    SubmitAnswer,

    // Library
    LoadLibrary,
    CreateAssociation {
        form: AssociationForm,
    },
    ToggleFavorite {
        id: i64,
    },
    SetDifficulty {
        #[serde(rename = "skillId")]
        skill_id: i64,
        rating: String,
    },
    DeleteAssociation {
        id: i64,
    },

    // Pomodoro
    StartCycle {
        #[serde(flatten)]
        form: CycleForm,
    },
    InterruptCycle,
    CycleStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

/// Messages the server sends back over WebSocket.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Navigate {
        path: String,
    },
    Session {
        #[serde(rename = "signedIn")]
        signed_in: bool,
        login: Option<String>,
    },
    Toast {
        level: ToastLevel,
        message: String,
    },
    FormErrors {
        form: &'static str,
        errors: FormErrors,
    },
    Categories {
        categories: Vec<Category>,
    },
    Catalog(CatalogOut),
    Skill {
        skill: Skill,
    },
    Skills {
        skills: Vec<Skill>,
    },
    Questions {
        questions: Vec<Question>,
    },
    Question {
        question: Question,
    },
    QuizQuestion(QuizQuestionOut),
    QuizFeedback {
        feedback: Feedback,
    },
    QuizCompleted {
        #[serde(rename = "skillId")]
        skill_id: i64,
        level: Option<f64>,
        score: Option<f64>,
    },
    Library {
        cards: Vec<LibraryCard>,
    },
    Cycle {
        active: Option<CycleView>,
        history: Vec<CycleSummary>,
    },
    Error {
        message: String,
    },
}

impl ServerWsMessage {
    pub fn success(message: impl Into<String>) -> Self {
        ServerWsMessage::Toast { level: ToastLevel::Success, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ServerWsMessage::Toast { level: ToastLevel::Error, message: message.into() }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOut {
    pub loading: bool,
    pub title: String,
    pub category_id: Option<i64>,
    pub sort_direction: SortDirection,
    pub skills: Vec<Skill>,
    pub pagination: Pagination,
    pub error: Option<String>,
}

pub fn catalog_out(c: &CatalogState) -> CatalogOut {
    CatalogOut {
        loading: c.is_loading(),
        title: c.title().to_string(),
        category_id: c.category(),
        sort_direction: c.sort(),
        skills: c.results().to_vec(),
        pagination: c.pagination(),
        error: c.error().map(str::to_string),
    }
}

/// The current quiz question, without the correct option.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestionOut {
    pub skill_id: i64,
    pub index: usize,
    pub total: usize,
    pub progress: u8,
    pub question_id: i64,
    pub question_text: String,
    pub options: Vec<(AnswerOption, String)>,
    pub selected: Option<AnswerOption>,
    pub can_submit: bool,
}

pub fn quiz_out(quiz: &QuizSession) -> ServerWsMessage {
    match quiz.current() {
        Some(q) => ServerWsMessage::QuizQuestion(QuizQuestionOut {
            skill_id: quiz.skill_id(),
            index: quiz.index(),
            total: quiz.len(),
            progress: quiz.progress_percent(),
            question_id: q.id,
            question_text: q.question_text.clone(),
            options: AnswerOption::ALL.iter().map(|o| (*o, q.option_text(*o).to_string())).collect(),
            selected: quiz.selected(),
            can_submit: quiz.selected().is_some(),
        }),
        None => ServerWsMessage::QuizCompleted {
            skill_id: quiz.skill_id(),
            level: quiz.level(),
            score: quiz.score(),
        },
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub path: String,
}

#[derive(Serialize)]
pub struct RouteOut {
    pub requested: String,
    pub path: String,
    pub redirected: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub signed_in: bool,
    pub login: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
