//! Catalog browsing: title search, category filter, sort direction and paging
//! combined into one `GET /skill/search` request.
//!
//! Any change to title, category or sort resets to the first page. Title edits
//! are debounced. Each issued request is stamped with a generation; results
//! from anything but the latest generation are dropped, so a slow response for
//! an old query cannot overwrite a newer one.

use std::{future::Future, time::Duration};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::backend::SkillSearch;
use crate::domain::{Skill, SkillPage, SortDirection};

#[derive(Clone, Debug)]
pub struct CatalogState {
  title: String,
  category: Option<i64>,
  sort: SortDirection,
  page: u32,
  page_size: u32,
  generation: u64,
  results: Vec<Skill>,
  total_count: u64,
  total_pages: u32,
  loading: bool,
  error: Option<String>,
}

impl CatalogState {
  pub fn new(page_size: u32) -> Self {
    Self {
      title: String::new(),
      category: None,
      sort: SortDirection::Asc,
      page: 0,
      page_size: page_size.max(1),
      generation: 0,
      results: Vec::new(),
      total_count: 0,
      total_pages: 1,
      loading: false,
      error: None,
    }
  }

  pub fn title(&self) -> &str { &self.title }
  pub fn category(&self) -> Option<i64> { self.category }
  pub fn sort(&self) -> SortDirection { self.sort }
  pub fn page(&self) -> u32 { self.page }
  pub fn results(&self) -> &[Skill] { &self.results }
  pub fn is_loading(&self) -> bool { self.loading }
  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  fn changed(&mut self) {
    self.page = 0;
    self.generation += 1;
  }

  pub fn set_title(&mut self, title: &str) {
    if self.title != title {
      self.title = title.to_string();
      self.changed();
    }
  }

  /// Selecting the active category clears the filter.
  pub fn toggle_category(&mut self, id: i64) {
    self.category = if self.category == Some(id) { None } else { Some(id) };
    self.changed();
  }

  pub fn set_sort(&mut self, sort: SortDirection) {
    if self.sort != sort {
      self.sort = sort;
      self.changed();
    }
  }

  /// Jump to a page, clamped to the known page range.
  pub fn set_page(&mut self, page: u32) {
    let last = self.total_pages.max(1) - 1;
    let page = page.min(last);
    if page != self.page {
      self.page = page;
      self.generation += 1;
    }
  }

  /// Stamp a new request for the current query.
  pub fn begin(&mut self) -> (u64, SkillSearch) {
    self.generation += 1;
    self.loading = true;
    self.error = None;
    let q = SkillSearch {
      category_id: self.category,
      title: self.title.clone(),
      page: self.page,
      size: self.page_size,
      sort: self.sort,
    };
    (self.generation, q)
  }

  /// Apply a response. Returns false (and changes nothing) when it is stale.
  pub fn finish(&mut self, generation: u64, outcome: Result<SkillPage, String>) -> bool {
    if generation != self.generation {
      return false;
    }
    self.loading = false;
    match outcome {
      Ok(page) => {
        self.results = page.skills;
        self.total_count = page.total_elements;
        self.total_pages = page.total_pages.max(1);
        self.error = None;
      }
      Err(message) => {
        self.results.clear();
        self.total_count = 0;
        self.total_pages = 1;
        self.error = Some(message);
      }
    }
    true
  }

  pub fn pagination(&self) -> Pagination {
    Pagination::new(self.page, self.page_size, self.total_count)
  }
}

/// Page controls derived from the total count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page_index: u32,
  pub per_page: u32,
  pub total_count: u64,
  pub pages: u32,
  pub can_previous: bool,
  pub can_next: bool,
}

impl Pagination {
  pub fn new(page_index: u32, per_page: u32, total_count: u64) -> Self {
    let per_page = per_page.max(1);
    let pages = (total_count.div_ceil(per_page as u64) as u32).max(1);
    Self {
      page_index,
      per_page,
      total_count,
      pages,
      can_previous: page_index > 0,
      can_next: page_index + 1 < pages,
    }
  }

  pub fn last(&self) -> u32 {
    self.pages - 1
  }
}

/// Runs the latest submitted job once `delay` has passed without another call.
///
/// Only the waiting period is cancelable: once the delay elapses the job runs
/// detached and is not aborted by later calls.
pub struct Debouncer {
  delay: Duration,
  pending: Option<JoinHandle<()>>,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self { delay, pending: None }
  }

  pub fn call<F>(&mut self, job: F)
  where
    F: Future<Output = ()> + Send + 'static,
  {
    self.cancel();
    let delay = self.delay;
    self.pending = Some(tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      tokio::spawn(job);
    }));
  }

  pub fn cancel(&mut self) {
    if let Some(h) = self.pending.take() {
      h.abort();
    }
  }
}

impl Drop for Debouncer {
  fn drop(&mut self) {
    self.cancel();
  }
}
