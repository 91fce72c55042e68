// ABOUTME: User prompts with auto-yes, accept-defaults, and non-interactive policies.
// ABOUTME: The terminal backend uses dialoguer; tests plug in scripted backends.

use dialoguer::{Confirm, Input, Password};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("failed to read prompt input: {0}")]
    Input(#[from] dialoguer::Error),

    #[error("input required for '{0}' but prompting is disabled")]
    Disabled(String),
}

/// Raw prompt backend.
pub trait Prompter: Send + Sync {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError>;
    fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError>;
    fn secret(&self, prompt: &str) -> Result<String, PromptError>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError> {
        Ok(Input::<String>::new()
            .with_prompt(prompt)
            .default(default.to_string())
            .allow_empty(true)
            .interact_text()?)
    }

    fn secret(&self, prompt: &str) -> Result<String, PromptError> {
        Ok(Password::new().with_prompt(prompt).interact()?)
    }
}

/// Backend that refuses to prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompter;

impl Prompter for NoPrompter {
    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool, PromptError> {
        Err(PromptError::Disabled(prompt.to_string()))
    }

    fn input(&self, prompt: &str, _default: &str) -> Result<String, PromptError> {
        Err(PromptError::Disabled(prompt.to_string()))
    }

    fn secret(&self, prompt: &str) -> Result<String, PromptError> {
        Err(PromptError::Disabled(prompt.to_string()))
    }
}

/// A prompt backend plus the global flags that short-circuit it.
#[derive(Clone)]
pub struct Interaction {
    /// Answer yes to every confirmation.
    pub auto_yes: bool,
    /// Take the default for every input.
    pub accept_defaults: bool,
    /// Never prompt: confirmations pass and inputs take defaults.
    pub non_interactive: bool,
    prompter: Arc<dyn Prompter>,
}

impl Interaction {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self {
            auto_yes: false,
            accept_defaults: false,
            non_interactive: false,
            prompter,
        }
    }

    pub fn terminal() -> Self {
        Self::new(Arc::new(TerminalPrompter))
    }

    pub fn non_interactive() -> Self {
        Self {
            non_interactive: true,
            ..Self::new(Arc::new(NoPrompter))
        }
    }

    /// True when confirmations are answered without asking.
    pub fn skips_confirmations(&self) -> bool {
        self.auto_yes || self.non_interactive
    }

    /// True when inputs take their defaults without asking.
    pub fn uses_defaults(&self) -> bool {
        self.accept_defaults || self.non_interactive
    }

    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        if self.skips_confirmations() {
            return Ok(true);
        }
        self.prompter.confirm(prompt, default)
    }

    /// Ask for a value; blank answers fall back to `default`.
    pub fn input(&self, prompt: &str, default: &str) -> Result<String, PromptError> {
        if self.uses_defaults() {
            return Ok(default.to_string());
        }
        let answer = self.prompter.input(prompt, default)?;
        let answer = answer.trim();
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer.to_string()
        })
    }

    /// Ask for a secret. There is no default, so this fails when prompting is off.
    pub fn secret(&self, prompt: &str) -> Result<String, PromptError> {
        if self.non_interactive {
            return Err(PromptError::Disabled(prompt.to_string()));
        }
        self.prompter.secret(prompt)
    }
}

impl std::fmt::Debug for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interaction")
            .field("auto_yes", &self.auto_yes)
            .field("accept_defaults", &self.accept_defaults)
            .field("non_interactive", &self.non_interactive)
            .finish_non_exhaustive()
    }
}
