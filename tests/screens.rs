//! Catalog, quiz, library and management screens driven end to end.

mod common;

use std::time::Duration;

use common::{harness, navigations, next_pushed, toasts};
use serde_json::json;
use skillshelf::domain::{AnswerOption, SortDirection};
use skillshelf::logic;
use skillshelf::pomodoro::CycleStatus;
use skillshelf::protocol::{ServerWsMessage, ToastLevel};
use skillshelf::quiz::Feedback;
use skillshelf::storage::TOKEN_KEY;
use skillshelf::validation::{AssociationForm, CycleForm, QuestionForm};

#[tokio::test]
async fn category_filter_searches_immediately_from_first_page() {
    let mut h = harness().await;
    logic::set_page(&h.state, &mut h.tab, 2).await;
    let out = logic::toggle_category(&h.state, &mut h.tab, 2).await;

    let calls = h.mock.calls_to("GET", "/skill/search");
    let query = calls.last().and_then(|c| c.query.clone()).unwrap();
    assert!(query.contains("categoryId=2"));
    assert!(query.contains("page=0"));
    assert!(query.contains("size=10"));
    assert!(query.contains("sortDirection=ASC"));
    assert!(!query.contains("title="));

    match &out[..] {
        [ServerWsMessage::Catalog(c)] => {
            assert_eq!(c.skills.len(), 1);
            assert_eq!(c.pagination.pages, 3);
            assert_eq!(c.pagination.page_index, 0);
            assert!(c.pagination.can_next);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn sort_direction_is_sent_uppercase() {
    let mut h = harness().await;
    logic::set_sort(&h.state, &mut h.tab, SortDirection::Desc).await;
    let calls = h.mock.calls_to("GET", "/skill/search");
    assert!(calls[0].query.as_deref().unwrap().contains("sortDirection=DESC"));
}

#[tokio::test]
async fn typing_sends_one_search_for_the_last_title() {
    let mut h = harness().await;
    logic::search_title(&h.state, &mut h.tab, "ru").await;
    logic::search_title(&h.state, &mut h.tab, "rust").await;
    assert!(h.mock.calls_to("GET", "/skill/search").is_empty());

    let pushed = next_pushed(&mut h.outbound).await;
    assert!(matches!(pushed, ServerWsMessage::Catalog(ref c) if c.title == "rust"));

    tokio::time::sleep(Duration::from_millis(120)).await;
    let calls = h.mock.calls_to("GET", "/skill/search");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].query.as_deref().unwrap().contains("title=rust"));
}

#[tokio::test]
async fn quiz_runs_to_completion() {
    let mut h = harness().await;
    h.state.store().set(TOKEN_KEY, "tok-1").await;

    let out = logic::start_quiz(&h.state, &mut h.tab, 4).await;
    match &out[..] {
        [ServerWsMessage::QuizQuestion(q)] => {
            assert_eq!(q.question_id, 11);
            assert_eq!(q.total, 2);
            assert_eq!(q.progress, 0);
            assert!(!q.can_submit);
        }
        other => panic!("unexpected {:?}", other),
    }

    // Nothing selected: no request goes out.
    let out = logic::submit_answer(&h.state, &mut h.tab).await;
    assert_eq!(toasts(&out), vec!["Select an answer."]);
    assert!(h.mock.calls_to("POST", "/questions/11/validate").is_empty());

    logic::select_option(&mut h.tab, AnswerOption::B).await;
    let out = logic::submit_answer(&h.state, &mut h.tab).await;
    assert!(matches!(&out[0], ServerWsMessage::QuizFeedback { feedback: Feedback::Correct(_) }));
    assert!(matches!(&out[1], ServerWsMessage::QuizQuestion(q) if q.question_id == 12 && q.progress == 50));
    let sent = h.mock.calls_to("POST", "/questions/11/validate");
    assert_eq!(sent[0].body, Some(json!({ "answer": "B" })));

    // A wrong answer still advances by default, which ends the quiz.
    logic::select_option(&mut h.tab, AnswerOption::A).await;
    let out = logic::submit_answer(&h.state, &mut h.tab).await;
    assert!(matches!(&out[0], ServerWsMessage::QuizFeedback { feedback: Feedback::Incorrect(_) }));
    match out.last() {
        Some(ServerWsMessage::QuizCompleted { skill_id, level, score }) => {
            assert_eq!(*skill_id, 4);
            assert_eq!(*level, Some(3.0));
            assert_eq!(*score, Some(2.0));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(h.mock.calls_to("GET", "/user_skills/skill/4/level").len(), 1);

    let out = logic::submit_answer(&h.state, &mut h.tab).await;
    assert_eq!(toasts(&out), vec!["The quiz is already complete."]);
}

#[tokio::test]
async fn failed_validation_keeps_the_question() {
    let mut h = harness().await;
    logic::start_quiz(&h.state, &mut h.tab, 6).await;
    logic::select_option(&mut h.tab, AnswerOption::A).await;

    let out = logic::submit_answer(&h.state, &mut h.tab).await;
    match &out[..] {
        [ServerWsMessage::Toast { level: ToastLevel::Error, message }] => {
            assert_eq!(message, "Could not validate the answer.");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(h.mock.calls_to("POST", "/questions/13/validate").len(), 1);

    let s = h.tab.screen.lock().await;
    let quiz = s.quiz.as_ref().unwrap();
    assert_eq!(quiz.index(), 0);
    assert_eq!(quiz.selected(), Some(AnswerOption::A));
    assert_eq!(quiz.progress_percent(), 0);
}

#[tokio::test]
async fn skill_without_questions_completes_at_once() {
    let mut h = harness().await;
    let out = logic::start_quiz(&h.state, &mut h.tab, 9).await;
    assert!(matches!(out.last(), Some(ServerWsMessage::QuizCompleted { skill_id: 9, .. })));
}

#[tokio::test]
async fn library_delete_removes_only_that_entry() {
    let mut h = harness().await;
    let out = logic::load_library(&h.state, &mut h.tab).await;
    assert!(matches!(&out[..], [ServerWsMessage::Library { cards }] if cards.len() == 2));

    let out = logic::delete_association(&h.state, &mut h.tab, 1).await;
    assert_eq!(h.mock.calls_to("DELETE", "/user_skills/1").len(), 1);
    match out.last() {
        Some(ServerWsMessage::Library { cards }) => {
            assert_eq!(cards.len(), 1);
            assert_eq!(cards[0].id, 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn favorite_and_difficulty_follow_the_backend() {
    let mut h = harness().await;
    logic::load_library(&h.state, &mut h.tab).await;

    let out = logic::toggle_favorite(&h.state, &mut h.tab, 1).await;
    assert_eq!(toasts(&out), vec!["Skill added to favorites!"]);
    assert!(matches!(out.last(), Some(ServerWsMessage::Library { cards }) if cards[0].favorite));

    let out = logic::set_difficulty(&h.state, &mut h.tab, 4, "hard").await;
    let pending = next_pushed(&mut h.outbound).await;
    assert!(matches!(pending, ServerWsMessage::Library { ref cards } if cards[0].difficulty == Some("hard")));
    assert_eq!(toasts(&out), vec!["Difficulty updated!"]);
    assert!(matches!(out.last(), Some(ServerWsMessage::Library { cards }) if cards[0].difficulty == Some("hard")));

    let sent = h.mock.calls_to("PUT", "/user_skills/skill/4/difficulty");
    assert_eq!(sent[0].body, Some(json!({ "difficultyRating": "difícil" })));
}

#[tokio::test]
async fn reloading_the_library_shows_the_server_difficulty() {
    let mut h = harness().await;
    logic::load_library(&h.state, &mut h.tab).await;
    logic::set_difficulty(&h.state, &mut h.tab, 4, "hard").await;

    // The backend still reports "médio" for skill 4 on the next listing.
    let out = logic::load_library(&h.state, &mut h.tab).await;
    match &out[..] {
        [ServerWsMessage::Library { cards }] => {
            assert_eq!(cards[0].skill_id, 4);
            assert_eq!(cards[0].difficulty, Some("medium"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn new_association_starts_at_level_one() {
    let mut h = harness().await;
    let form: AssociationForm =
        serde_json::from_value(json!({ "skillId": 5, "difficultyRating": "fácil" })).unwrap();
    let out = logic::create_association(&h.state, &mut h.tab, &form).await;
    assert_eq!(toasts(&out), vec!["Association created!"]);

    let sent = h.mock.calls_to("POST", "/user_skills");
    assert_eq!(sent[0].body, Some(json!({ "skillId": 5, "level": 1, "difficultyRating": "fácil" })));
}

#[tokio::test]
async fn deleting_a_managed_skill_filters_the_table() {
    let mut h = harness().await;
    let out = logic::list_skills(&h.state, &mut h.tab).await;
    assert!(matches!(&out[..], [ServerWsMessage::Skills { skills }] if skills.len() == 2));

    let out = logic::delete_skill(&h.state, &mut h.tab, 4).await;
    assert_eq!(toasts(&out), vec!["Skill deleted."]);
    match out.last() {
        Some(ServerWsMessage::Skills { skills }) => {
            assert_eq!(skills.len(), 1);
            assert_eq!(skills[0].id, 5);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn invalid_question_form_is_not_sent() {
    let h = harness().await;
    let form: QuestionForm = serde_json::from_value(json!({
        "skillId": 4,
        "questionText": "Hm?",
        "optionA": "a",
        "optionB": "",
        "optionC": "c",
        "optionD": "d",
        "correctOption": "E"
    }))
    .unwrap();
    let out = logic::save_question(&h.state, None, &form).await;
    match &out[..] {
        [ServerWsMessage::FormErrors { errors, .. }] => {
            assert!(errors.has("questionText"));
            assert!(errors.has("optionB"));
            assert!(errors.has("correctOption"));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(h.mock.calls().is_empty());
}

#[tokio::test]
async fn valid_question_form_creates_and_returns_to_the_table() {
    let h = harness().await;
    let form: QuestionForm = serde_json::from_value(json!({
        "skillId": 4,
        "questionText": "Which keyword moves a value?",
        "optionA": "move",
        "optionB": "ref",
        "optionC": "mut",
        "optionD": "dyn",
        "correctOption": "A"
    }))
    .unwrap();
    let out = logic::save_question(&h.state, None, &form).await;
    assert_eq!(toasts(&out), vec!["Question created."]);
    assert_eq!(navigations(&out), vec!["/gerenciar/questoes"]);
    assert_eq!(h.mock.calls_to("POST", "/questions").len(), 1);
}

#[tokio::test]
async fn missing_skill_shows_not_found() {
    let h = harness().await;
    let out = logic::load_skill(&h.state, 99).await;
    assert_eq!(toasts(&out), vec!["Skill not found."]);
}

#[tokio::test]
async fn pomodoro_cycle_can_be_interrupted() {
    let mut h = harness().await;
    let bad: CycleForm = serde_json::from_value(json!({ "task": "", "minutesAmount": 90 })).unwrap();
    let out = logic::start_cycle(&mut h.tab, &bad).await;
    assert!(matches!(&out[..], [ServerWsMessage::FormErrors { form: "cycle", .. }]));

    let form: CycleForm = serde_json::from_value(json!({ "task": "Read the book", "minutesAmount": 25 })).unwrap();
    let out = logic::start_cycle(&mut h.tab, &form).await;
    match &out[..] {
        [ServerWsMessage::Cycle { active: Some(c), history }] => {
            assert_eq!(c.countdown, "25:00");
            assert_eq!(history.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }

    let out = logic::interrupt_cycle(&mut h.tab).await;
    match out.last() {
        Some(ServerWsMessage::Cycle { active: None, history }) => {
            assert_eq!(history[0].status, CycleStatus::Interrupted);
        }
        other => panic!("unexpected {:?}", other),
    }
}
