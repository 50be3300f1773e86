//! Quiz progression over a skill's questions.
//!
//! The question list is fetched once up front. The user selects one of four
//! options and submits; the backend judges the answer and the index moves
//! forward. When the index reaches the end the quiz is completed and the
//! aggregate level for the skill is fetched for the completion screen.
//!
//! Two phases, one forward-only transition. Nothing is retried or persisted.

use serde::Serialize;

use crate::config::AdvancePolicy;
use crate::domain::{AnswerOption, AnswerVerdict, Question, SkillLevel};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    Answering,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitRejected {
    NothingSelected,
    AlreadyCompleted,
}

/// What to send to `POST /questions/:id/validate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnswerTicket {
    pub question_id: i64,
    pub answer: AnswerOption,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Feedback {
    Correct(String),
    Incorrect(String),
}

#[derive(Clone, Debug)]
pub struct QuizSession {
    skill_id: i64,
    questions: Vec<Question>,
    index: usize,
    selected: Option<AnswerOption>,
    policy: AdvancePolicy,
    score: Option<f64>,
    level: Option<f64>,
}

impl QuizSession {
    pub fn new(skill_id: i64, questions: Vec<Question>, policy: AdvancePolicy) -> Self {
        Self { skill_id, questions, index: 0, selected: None, policy, score: None, level: None }
    }

    pub fn skill_id(&self) -> i64 {
        self.skill_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn phase(&self) -> QuizPhase {
        if self.index >= self.questions.len() { QuizPhase::Completed } else { QuizPhase::Answering }
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn selected(&self) -> Option<AnswerOption> {
        self.selected
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Whole-percent progress, 100 when there is nothing to answer.
    pub fn progress_percent(&self) -> u8 {
        if self.questions.is_empty() {
            return 100;
        }
        let pct = (self.index as f64 / self.questions.len() as f64) * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }

    pub fn select(&mut self, option: AnswerOption) {
        if self.phase() == QuizPhase::Answering {
            self.selected = Some(option);
        }
    }

    /// Check the submit guard. Nothing is sent when this fails.
    pub fn submit(&self) -> Result<AnswerTicket, SubmitRejected> {
        let q = self.current().ok_or(SubmitRejected::AlreadyCompleted)?;
        let answer = self.selected.ok_or(SubmitRejected::NothingSelected)?;
        Ok(AnswerTicket { question_id: q.id, answer })
    }

    /// Apply the backend's judgement of the current question.
    pub fn apply_verdict(&mut self, verdict: &AnswerVerdict) -> Feedback {
        let advance = verdict.correct || self.policy == AdvancePolicy::Always;
        let feedback = if verdict.correct {
            self.score = Some(verdict.score);
            self.level = Some(verdict.level);
            Feedback::Correct("Correct! Moving on to the next question.".into())
        } else {
            Feedback::Incorrect("Incorrect answer.".into())
        };
        if advance && self.phase() == QuizPhase::Answering {
            self.index += 1;
            self.selected = None;
        }
        feedback
    }

    /// Aggregate figures shown on the completion screen replace the running ones.
    pub fn complete_with(&mut self, level: SkillLevel) {
        self.level = Some(level.level);
        self.score = Some(level.score);
    }
}
