use std::collections::BTreeMap;

/// Per-run settings handed to [`Command::run`](super::Command::run)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    /// Append diagnostic detail (debug renderings of failures) to `error`
    /// and record it as the command's backtrace
    pub debug: bool,
    pub variables: BTreeMap<String, String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}
