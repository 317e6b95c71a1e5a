use serde::{Deserialize, Serialize};

/// Log output settings. `filters` takes a full `EnvFilter` directive
/// string and wins over the plain `level`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub filters: Option<String>,
}

impl LoggingConfig {
    pub fn directive(&self) -> String {
        self.filters
            .clone()
            .or_else(|| self.level.clone())
            .unwrap_or_else(|| "info".to_string())
    }
}
