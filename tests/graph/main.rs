//! Integration tests for Layer 2: Graph
//!
//! Tests for alias indices, the relation registry, connectors, and finalize.

mod finalize;
