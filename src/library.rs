//! The user's library: skill associations with favorite, difficulty and level.
//!
//! Mutations are never optimistic. The backend call completes first, then the
//! returned record is reconciled into the list. Difficulty picks are also kept
//! in a pending map so the selection shows before the round-trip finishes.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{Difficulty, UserSkill};

pub const MAX_STARS: u8 = 5;

#[derive(Clone, Debug, Default)]
pub struct Library {
  entries: Vec<UserSkill>,
  pending: HashMap<i64, Difficulty>,
}

impl Library {
  pub fn entries(&self) -> &[UserSkill] {
    &self.entries
  }

  /// Fresh records from the backend supersede any pick still shown as pending.
  pub fn replace(&mut self, entries: Vec<UserSkill>) {
    self.entries = entries;
    self.pending.clear();
  }

  /// Copy the favorite flag of `updated` onto the entry with `id`.
  pub fn apply_favorite(&mut self, id: i64, updated: &UserSkill) -> bool {
    match self.entries.iter_mut().find(|e| e.id == id) {
      Some(e) => {
        e.favorite = updated.favorite;
        true
      }
      None => false,
    }
  }

  pub fn mark_pending(&mut self, skill_id: i64, rating: Difficulty) {
    self.pending.insert(skill_id, rating);
  }

  pub fn clear_pending(&mut self, skill_id: i64) {
    self.pending.remove(&skill_id);
  }

  pub fn pending(&self, skill_id: i64) -> Option<Difficulty> {
    self.pending.get(&skill_id).copied()
  }

  /// Difficulty the front end should display: pending pick first, then the record.
  pub fn shown_difficulty(&self, skill_id: i64) -> Option<Difficulty> {
    self.pending(skill_id).or_else(|| {
      self.entries.iter().find(|e| e.skill_id == skill_id).and_then(|e| e.difficulty_rating)
    })
  }

  /// Patch every entry for `skill_id` with the confirmed rating and drop the
  /// pending pick. Returns how many changed.
  pub fn apply_difficulty(&mut self, skill_id: i64, updated: &UserSkill) -> usize {
    let mut n = 0;
    for e in self.entries.iter_mut().filter(|e| e.skill_id == skill_id) {
      e.difficulty_rating = updated.difficulty_rating;
      n += 1;
    }
    self.pending.remove(&skill_id);
    n
  }

  /// Remove exactly the entry with `id`.
  pub fn remove(&mut self, id: i64) -> bool {
    let before = self.entries.len();
    self.entries.retain(|e| e.id != id);
    self.entries.len() != before
  }

  pub fn view(&self) -> Vec<LibraryCard> {
    self.entries.iter().map(|e| LibraryCard {
      id: e.id,
      skill_id: e.skill_id,
      name: e.skill_name.clone(),
      description: e.description.clone(),
      image: e.image.clone(),
      stars: Stars::from_level(e.level),
      favorite: e.favorite,
      difficulty: self.shown_difficulty(e.skill_id).map(|d| d.label()),
    }).collect()
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Stars {
  pub full: u8,
  pub empty: u8,
}

impl Stars {
  pub fn from_level(level: f64) -> Self {
    let full = if level.is_finite() { level.floor().clamp(0.0, MAX_STARS as f64) as u8 } else { 0 };
    Self { full, empty: MAX_STARS - full }
  }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryCard {
  pub id: i64,
  pub skill_id: i64,
  pub name: String,
  pub description: String,
  pub image: String,
  pub stars: Stars,
  pub favorite: bool,
  pub difficulty: Option<&'static str>,
}
