//! Pomodoro work cycles: at most one active cycle, counted down in whole seconds.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::validation::{CycleForm, FormErrors};

#[derive(Clone, Debug)]
pub struct Cycle {
  pub id: String,
  pub task: String,
  pub minutes: u32,
  pub started: Instant,
  pub interrupted: Option<Instant>,
  pub finished: Option<Instant>,
}

impl Cycle {
  pub fn total_secs(&self) -> u64 {
    self.minutes as u64 * 60
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
  Running,
  Interrupted,
  Finished,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleView {
  pub id: String,
  pub task: String,
  pub minutes: u32,
  pub status: CycleStatus,
  /// `MM:SS` left on the clock.
  pub countdown: String,
}

/// One row of the history table.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
  pub id: String,
  pub task: String,
  pub minutes: u32,
  pub status: CycleStatus,
}

#[derive(Debug, Default)]
pub struct Cycles {
  history: Vec<Cycle>,
  active: Option<String>,
}

impl Cycles {
  /// Start a new cycle, replacing whatever was running.
  pub fn start(&mut self, form: &CycleForm, now: Instant) -> Result<&Cycle, FormErrors> {
    let (task, minutes) = form.validate()?;
    if self.active.is_some() {
      self.interrupt(now);
    }
    let id = Uuid::new_v4().to_string();
    self.history.push(Cycle { id: id.clone(), task, minutes, started: now, interrupted: None, finished: None });
    self.active = Some(id);
    Ok(&self.history[self.history.len() - 1])
  }

  pub fn active(&self) -> Option<&Cycle> {
    let id = self.active.as_ref()?;
    self.history.iter().find(|c| &c.id == id)
  }

  fn active_mut(&mut self) -> Option<&mut Cycle> {
    let id = self.active.clone()?;
    self.history.iter_mut().find(|c| c.id == id)
  }

  pub fn interrupt(&mut self, now: Instant) -> bool {
    match self.active_mut() {
      Some(c) => {
        c.interrupted = Some(now);
        self.active = None;
        true
      }
      None => false,
    }
  }

  /// Seconds elapsed on the active cycle. Marks it finished once time is up.
  pub fn tick(&mut self, now: Instant) -> Option<u64> {
    let c = self.active_mut()?;
    let elapsed = now.saturating_duration_since(c.started).as_secs();
    if elapsed >= c.total_secs() {
      c.finished = Some(c.started + Duration::from_secs(c.total_secs()));
      let total = c.total_secs();
      self.active = None;
      return Some(total);
    }
    Some(elapsed)
  }

  pub fn history(&self) -> &[Cycle] {
    &self.history
  }

  /// History, newest first.
  pub fn summaries(&self) -> Vec<CycleSummary> {
    self.history.iter().rev().map(|c| CycleSummary {
      id: c.id.clone(),
      task: c.task.clone(),
      minutes: c.minutes,
      status: Cycles::status(c),
    }).collect()
  }

  pub fn view(&self, now: Instant) -> Option<CycleView> {
    let c = self.active()?;
    let elapsed = now.saturating_duration_since(c.started).as_secs();
    Some(CycleView {
      id: c.id.clone(),
      task: c.task.clone(),
      minutes: c.minutes,
      status: CycleStatus::Running,
      countdown: countdown(c.total_secs().saturating_sub(elapsed)),
    })
  }

  pub fn status(c: &Cycle) -> CycleStatus {
    if c.finished.is_some() {
      CycleStatus::Finished
    } else if c.interrupted.is_some() {
      CycleStatus::Interrupted
    } else {
      CycleStatus::Running
    }
  }
}

pub fn countdown(remaining_secs: u64) -> String {
  format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(minutes: u32) -> CycleForm {
    CycleForm { task: "Review PRs".into(), minutes_amount: minutes }
  }

  #[test]
  fn countdown_format() {
    assert_eq!(countdown(25 * 60), "25:00");
    assert_eq!(countdown(61), "01:01");
    assert_eq!(countdown(0), "00:00");
  }

  #[tokio::test(start_paused = true)]
  async fn cycle_finishes_after_its_minutes() {
    let mut cycles = Cycles::default();
    let t0 = Instant::now();
    cycles.start(&form(5), t0).unwrap();

    tokio::time::advance(Duration::from_secs(90)).await;
    assert_eq!(cycles.tick(Instant::now()), Some(90));
    assert_eq!(cycles.view(Instant::now()).unwrap().countdown, "03:30");

    tokio::time::advance(Duration::from_secs(300)).await;
    assert_eq!(cycles.tick(Instant::now()), Some(300));
    assert!(cycles.active().is_none());
    assert_eq!(Cycles::status(&cycles.history()[0]), CycleStatus::Finished);
    assert_eq!(cycles.tick(Instant::now()), None);
  }

  #[test]
  fn interrupt_clears_active() {
    let mut cycles = Cycles::default();
    let now = Instant::now();
    cycles.start(&form(25), now).unwrap();
    assert!(cycles.interrupt(now));
    assert!(cycles.active().is_none());
    assert_eq!(Cycles::status(&cycles.history()[0]), CycleStatus::Interrupted);
    assert!(!cycles.interrupt(now));
  }

  #[test]
  fn new_cycle_interrupts_running_one() {
    let mut cycles = Cycles::default();
    let now = Instant::now();
    cycles.start(&form(25), now).unwrap();
    let second = cycles.start(&form(10), now).unwrap().id.clone();
    assert_eq!(cycles.active().unwrap().id, second);
    assert_eq!(Cycles::status(&cycles.history()[0]), CycleStatus::Interrupted);

    let rows = cycles.summaries();
    assert_eq!(rows[0].id, second);
    assert_eq!(rows[0].status, CycleStatus::Running);
    assert_eq!(rows[1].status, CycleStatus::Interrupted);
  }

  #[test]
  fn invalid_form_starts_nothing() {
    let mut cycles = Cycles::default();
    assert!(cycles.start(&form(2), Instant::now()).is_err());
    assert!(cycles.history().is_empty());
  }
}
