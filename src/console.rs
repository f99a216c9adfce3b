//! The console collaborator injected into every node execution.
//!
//! Nodes never print or log directly; everything user-visible goes
//! through the [`Console`] handed to `run`. Calls are fire-and-forget
//! and no return value is relied upon.

/// Fire-and-forget logger contract the external engine injects per run.
pub trait Console: Send + Sync {
    /// Progress and diagnostic messages.
    fn info(
        &self,
        message: &str,
    );

    /// Completion messages for operations that succeeded.
    fn success(
        &self,
        message: &str,
    );

    /// Failure messages. Reporting an error here never aborts the run;
    /// the node reflects the failure in its returned output instead.
    fn error(
        &self,
        message: &str,
    );
}

/// [`Console`] implementation that forwards to `tracing`.
///
/// Success messages land at info level with a `status` field, since
/// tracing has no dedicated success level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn info(
        &self,
        message: &str,
    ) {
        tracing::info!(target: "flowkit::node", "{message}");
    }

    fn success(
        &self,
        message: &str,
    ) {
        tracing::info!(target: "flowkit::node", status = "success", "{message}");
    }

    fn error(
        &self,
        message: &str,
    ) {
        tracing::error!(target: "flowkit::node", "{message}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::Console;

    /// Records every message for assertions in node tests.
    #[derive(Default)]
    pub struct RecordingConsole {
        pub lines: Mutex<Vec<(String, String)>>,
    }

    impl RecordingConsole {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn messages(
            &self,
            level: &str,
        ) -> Vec<String> {
            self.lines.lock().unwrap().iter().filter(|(l, _)| l == level).map(|(_, m)| m.clone()).collect()
        }
    }

    impl Console for RecordingConsole {
        fn info(
            &self,
            message: &str,
        ) {
            self.lines.lock().unwrap().push(("info".to_string(), message.to_string()));
        }

        fn success(
            &self,
            message: &str,
        ) {
            self.lines.lock().unwrap().push(("success".to_string(), message.to_string()));
        }

        fn error(
            &self,
            message: &str,
        ) {
            self.lines.lock().unwrap().push(("error".to_string(), message.to_string()));
        }
    }
}
