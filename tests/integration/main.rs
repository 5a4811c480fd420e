//! Integration tests for the crawler
//!
//! The crawl tests drive the coordinator against an in-memory web; the HTTP
//! tests use wiremock to run the full crawl cycle end-to-end.

mod support;

mod http_tests;
mod shutdown_tests;
