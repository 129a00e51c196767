use serde::Serialize;
use serde_json::Value;

use super::error::HestiaError;
use super::reply::Reply;

/// A named HestiaCP command with ordered positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HestiaCommand {
    pub cmd: String,
    pub args: Vec<String>,
    /// Ask the API for a bare integer reply (`returncode=yes`)
    pub returncode: bool,
}

impl HestiaCommand {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args: Vec::new(),
            returncode: false,
        }
    }

    /// Mutating command that answers with a return code only
    pub fn action(cmd: impl Into<String>) -> Self {
        Self::new(cmd).returncode()
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn returncode(mut self) -> Self {
        self.returncode = true;
        self
    }

    /// Command fields in wire order: `cmd`, `arg1..argN`, optional `returncode`.
    /// Credentials are added by the client under their own names.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(self.args.len() + 2);
        fields.push(("cmd".to_string(), self.cmd.clone()));
        for (i, value) in self.args.iter().enumerate() {
            fields.push((format!("arg{}", i + 1), value.clone()));
        }
        if self.returncode {
            fields.push(("returncode".to_string(), "yes".to_string()));
        }
        fields
    }
}

/// Uniform result shape for one command invocation
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Reply, HestiaError>> for CommandOutcome {
    fn from(result: Result<Reply, HestiaError>) -> Self {
        match result {
            Ok(reply) => CommandOutcome {
                success: true,
                returncode: match reply {
                    Reply::ReturnCode(code) => Some(code),
                    _ => None,
                },
                data: reply.to_data(),
                error: None,
            },
            Err(err) => CommandOutcome {
                success: false,
                returncode: err.return_code(),
                data: None,
                error: Some(err.to_string()),
            },
        }
    }
}
