use super::HealthChecker;

/// How much of a health-check run the log shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Status line only.
    #[default]
    Summary,
    /// Adds per-tag marker counts.
    Counts,
    /// Adds every diagnostic message.
    Messages,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Verbosity::Summary,
            1 => Verbosity::Counts,
            _ => Verbosity::Messages,
        }
    }
}

impl HealthChecker {
    /// Renders the last run as log lines. `file_name` labels the status
    /// line in batch runs.
    pub fn render_log(&self, file_name: Option<&str>, verbosity: Verbosity) -> Vec<String> {
        let mut log = vec![match file_name {
            Some(name) => format!("[{}] {name}", self.status()),
            None => format!("[{}]", self.status()),
        }];

        if verbosity >= Verbosity::Counts {
            log.extend(
                self.tag_count()
                    .iter()
                    .map(|(tag, count)| format!("  - {tag}: {count}")),
            );
        }

        if verbosity >= Verbosity::Messages {
            log.extend(self.error_messages().iter().map(|m| format!("  {m}")));
        }

        log
    }
}
