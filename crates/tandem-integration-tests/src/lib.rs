//! Integration tests for the tandem workflow runtime live in `tests/`.
