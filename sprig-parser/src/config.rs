/// Runtime settings of a [`Parser`](crate::Parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// How deep error recovery may nest for a single offending token (synthetic tokens that fail
    /// themselves, repeated reraises). Exceeding it stops the parse.
    pub max_recovery_depth: usize,
    /// Logs every shift and fold at trace level.
    pub log_actions: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_recovery_depth: 16,
            log_actions: false,
        }
    }
}
