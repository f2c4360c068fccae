//! Reconciliation test suite.

mod fetchers;
