use std::time::Duration;

use sealexec::deliver::ExecRequest;

/// Builder for `ExecRequest` to simplify test setup.
///
/// Starts pristine with a minimal `PATH` and a 10s pipe timeout, so a test
/// that never reads its FIFO fails instead of hanging.
pub struct ExecRequestBuilder {
    request: ExecRequest,
}

impl ExecRequestBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            request: ExecRequest {
                command: command.to_string(),
                pristine: true,
                extra_env: vec!["PATH=/usr/bin:/bin".to_string()],
                pipe_timeout: Some(Duration::from_secs(10)),
                ..ExecRequest::default()
            },
        }
    }

    pub fn plaintext(mut self, bytes: &[u8]) -> Self {
        self.request.plaintext = bytes.to_vec();
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.request.user = Some(user.to_string());
        self
    }

    pub fn background(mut self, val: bool) -> Self {
        self.request.background = val;
        self
    }

    pub fn same_process(mut self, val: bool) -> Self {
        self.request.same_process = val;
        self
    }

    pub fn filename(mut self, name: &str) -> Self {
        self.request.filename = Some(name.to_string());
        self
    }

    pub fn env(mut self, pair: &str) -> Self {
        self.request.extra_env.push(pair.to_string());
        self
    }

    pub fn build(self) -> ExecRequest {
        self.request
    }
}
