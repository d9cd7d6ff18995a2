//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the full router
//! (guard middleware included) in-process with a manual clock.

#![cfg(test)]

mod helpers;

mod test_expiry;
mod test_guard_allow_list;
mod test_guard_prefixes;
mod test_login;
mod test_logout;
mod test_pages;
