//! Confirmation gates for interactive steps.
//!
//! Before an interactive step is applied (or reverted) the executor asks a
//! [`ConfirmationGate`] whether to go ahead. The run is suspended until the
//! gate answers; nothing else executes in the meantime.

use std::collections::HashMap;

use console::Term;

use crate::error::Result;
use crate::steps::Direction;
use crate::ui::non_interactive::parse_answer;
use crate::ui::{confirm_on, Prompt};

const CONFIRM_ENV_PREFIX: &str = "PROVISION_CONFIRM_";

/// Answer from a confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancel,
}

/// What the executor is asking permission for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub step_id: String,
    pub title: String,
    pub prompt: String,
    pub direction: Direction,
}

/// Decides whether an interactive step may proceed.
pub trait ConfirmationGate {
    fn confirm(&mut self, request: &ConfirmationRequest) -> Result<Decision>;
}

/// Gate with pre-programmed answers.
///
/// Answers come from a per-step table, falling back to a default. Every
/// request is recorded so tests can assert on what was asked and when.
#[derive(Debug, Clone)]
pub struct ScriptedGate {
    responses: HashMap<String, Decision>,
    default: Decision,
    requests: Vec<ConfirmationRequest>,
}

impl ScriptedGate {
    /// A gate that answers `default` to everything.
    pub fn new(default: Decision) -> Self {
        Self {
            responses: HashMap::new(),
            default,
            requests: Vec::new(),
        }
    }

    /// A gate that always proceeds.
    pub fn proceed() -> Self {
        Self::new(Decision::Proceed)
    }

    /// A gate that always cancels.
    pub fn cancel() -> Self {
        Self::new(Decision::Cancel)
    }

    /// Answer `decision` for `step_id`.
    pub fn with_response(mut self, step_id: impl Into<String>, decision: Decision) -> Self {
        self.responses.insert(step_id.into(), decision);
        self
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> &[ConfirmationRequest] {
        &self.requests
    }

    /// Step ids asked about so far, in order.
    pub fn asked(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.step_id.as_str()).collect()
    }
}

impl ConfirmationGate for ScriptedGate {
    fn confirm(&mut self, request: &ConfirmationRequest) -> Result<Decision> {
        self.requests.push(request.clone());
        Ok(self
            .responses
            .get(&request.step_id)
            .copied()
            .unwrap_or(self.default))
    }
}

/// Gate that asks a human on the terminal.
pub struct PromptGate {
    term: Term,
}

impl PromptGate {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for PromptGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate for PromptGate {
    fn confirm(&mut self, request: &ConfirmationRequest) -> Result<Decision> {
        let prompt = Prompt::new(&request.step_id, &request.prompt);
        if confirm_on(&prompt, &self.term)? {
            Ok(Decision::Proceed)
        } else {
            Ok(Decision::Cancel)
        }
    }
}

/// Gate answered by `PROVISION_CONFIRM_<STEP_ID>` environment variables.
///
/// The step id is upper-cased and every non-alphanumeric character becomes
/// `_`. Steps with no variable are cancelled.
#[derive(Debug, Clone, Default)]
pub struct EnvGate {
    answers: HashMap<String, String>,
}

impl EnvGate {
    /// Read answers from the process environment.
    pub fn from_env() -> Self {
        Self::with_vars(std::env::vars())
    }

    /// Read answers from explicit variables.
    pub fn with_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            answers: vars
                .into_iter()
                .filter(|(k, _)| k.starts_with(CONFIRM_ENV_PREFIX))
                .collect(),
        }
    }

    /// Environment variable consulted for `step_id`.
    pub fn var_name(step_id: &str) -> String {
        let key: String = step_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", CONFIRM_ENV_PREFIX, key)
    }
}

impl ConfirmationGate for EnvGate {
    fn confirm(&mut self, request: &ConfirmationRequest) -> Result<Decision> {
        let var = Self::var_name(&request.step_id);
        let decision = match self.answers.get(&var).and_then(|v| parse_answer(v)) {
            Some(true) => Decision::Proceed,
            _ => Decision::Cancel,
        };
        tracing::debug!(step = %request.step_id, var = %var, ?decision, "env gate answered");
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(step_id: &str) -> ConfirmationRequest {
        ConfirmationRequest {
            step_id: step_id.to_string(),
            title: step_id.to_string(),
            prompt: format!("Continue with '{}'?", step_id),
            direction: Direction::Forward,
        }
    }

    #[test]
    fn scripted_gate_uses_table_then_default() {
        let mut gate = ScriptedGate::proceed().with_response("ssh", Decision::Cancel);

        assert_eq!(gate.confirm(&request("ssh")).unwrap(), Decision::Cancel);
        assert_eq!(gate.confirm(&request("git")).unwrap(), Decision::Proceed);
        assert_eq!(gate.asked(), vec!["ssh", "git"]);
    }

    #[test]
    fn env_gate_var_name() {
        assert_eq!(EnvGate::var_name("ssh-key"), "PROVISION_CONFIRM_SSH_KEY");
        assert_eq!(EnvGate::var_name("brew.casks"), "PROVISION_CONFIRM_BREW_CASKS");
    }

    #[test]
    fn env_gate_reads_answers() {
        let mut gate = EnvGate::with_vars([
            ("PROVISION_CONFIRM_SSH_KEY".to_string(), "yes".to_string()),
            ("PROVISION_CONFIRM_GPG".to_string(), "no".to_string()),
            ("UNRELATED".to_string(), "yes".to_string()),
        ]);

        assert_eq!(gate.confirm(&request("ssh-key")).unwrap(), Decision::Proceed);
        assert_eq!(gate.confirm(&request("gpg")).unwrap(), Decision::Cancel);
    }

    #[test]
    fn env_gate_defaults_to_cancel() {
        let mut gate = EnvGate::with_vars(Vec::new());
        assert_eq!(gate.confirm(&request("ssh")).unwrap(), Decision::Cancel);
    }
}
