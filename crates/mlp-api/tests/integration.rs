//! Router-level tests. Modules that need PostgreSQL skip themselves unless
//! `TEST_DATABASE_URL` is set.

#[macro_use]
mod common;

mod auth_tests;
mod comment_tests;
mod health_tests;
mod lesson_tests;
mod progress_tests;
