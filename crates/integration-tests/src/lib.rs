//! Integration tests for Dalil.
//!
//! # Running Tests
//!
//! ```bash
//! # Start a PostgreSQL instance and export its URL
//! export DATABASE_URL=postgres://localhost/dalil_test
//!
//! # Run the ignored live-database tests
//! cargo test -p dalil-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `import_postgres` - End-to-end import pipeline runs against a live
//!   `PostgreSQL` database, mirroring the in-memory pipeline tests in
//!   `dalil-importer`.
//!
//! Each test run uses uniquely suffixed entity names so repeated runs
//! against the same database do not interfere with each other.
