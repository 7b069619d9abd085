// ABOUTME: Version and REPL banner constants

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "ava-lang v1.0.0";
pub const WELCOME_SUBTITLE: &str = "a small tree-walking interpreter with a structured execution trace";
