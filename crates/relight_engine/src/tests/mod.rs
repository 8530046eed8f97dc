//! Cross-module tests: bake sessions against the runtime collector
