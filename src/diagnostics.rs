// ABOUTME: Diagnostics accumulator for non-fatal warnings during build and deploy.
// ABOUTME: Collects warnings that shouldn't fail a command but should be shown to users.

/// Collects non-fatal warnings during build and deploy operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of a single kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A required toolchain binary could not be found.
    pub fn missing_tool(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::MissingTool,
            message: message.into(),
        }
    }

    /// An installed toolchain does not satisfy the configured constraint.
    pub fn toolchain_constraint(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ToolchainConstraint,
            message: message.into(),
        }
    }

    /// The service could not be confirmed available after activation.
    pub fn availability(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Availability,
            message: message.into(),
        }
    }

    /// A rollback step failed.
    pub fn undo_failure(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UndoFailure,
            message: message.into(),
        }
    }

    /// A resource must be configured by hand.
    pub fn manual_setup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ManualSetup,
            message: message.into(),
        }
    }
}

/// Categories of non-fatal warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A toolchain binary is not on PATH; the build script may still work.
    MissingTool,
    /// Installed toolchain version falls outside the configured range.
    ToolchainConstraint,
    /// Availability check timed out or failed after activation.
    Availability,
    /// A compensating action failed during rollback.
    UndoFailure,
    /// Log endpoints and similar resources that are never auto-created.
    ManualSetup,
}
