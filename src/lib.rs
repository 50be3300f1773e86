//! Skillshelf: local companion server for the skill-catalog front end.
//!
//! Talks to the remote catalog REST API on behalf of the browser, keeps the
//! session token, and drives the screens (catalog, quiz, library, pomodoro)
//! over one WebSocket per tab.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod library;
pub mod logic;
pub mod navigation;
pub mod pomodoro;
pub mod protocol;
pub mod quiz;
pub mod routes;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod util;
pub mod validation;
