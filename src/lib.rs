//! Course Advisor: chat widget with a course recommendation survey.

pub mod channels;
pub mod chat;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod recommend;
pub mod session;
pub mod transcript;
