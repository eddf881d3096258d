use log::{debug, info, warn};

const RULE: &str = "........................";

/// Narrates workflow progress through the `log` facade.
pub struct LogManager {
    target: &'static str,
}

impl LogManager {
    pub fn new() -> Self {
        Self::with_target("tcu")
    }

    pub fn with_target(target: &'static str) -> Self {
        Self { target }
    }

    /// Marks the start of a workflow phase.
    pub fn step(&self, title: &str) {
        debug!(target: self.target, "{}", RULE);
        info!(target: self.target, "{}...", title.to_uppercase());
        debug!(target: self.target, "{}", RULE);
    }

    pub fn record(&self, message: &str) {
        info!(target: self.target, "{}", message);
    }

    pub fn detail(&self, message: &str) {
        debug!(target: self.target, "{}", message);
    }

    pub fn caution(&self, message: &str) {
        warn!(target: self.target, "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_manager_accepts_messages_without_a_logger() {
        let logger = LogManager::with_target("tcu_test");
        logger.step("parsing headerfile");
        logger.record("header parsing complete");
        logger.detail("num_pulses <= x\"0002\"");
        logger.caution("existing .bof found");
    }
}
