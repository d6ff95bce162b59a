use crate::session::SessionSnapshot;

/// Rendering capabilities the orchestration layer publishes into.
///
/// The controller and tracker never touch a UI directly; callers hand them
/// whatever surface they have at construction time. A host without a display
/// passes [`NullSurface`] instead of sprinkling presence checks through the
/// orchestration code.
pub trait StatusSurface: Send + Sync {
    /// Publish a one-line status message; `ok` distinguishes progress/success
    /// from error styling.
    fn show_status(&self, message: &str, ok: bool);

    /// Publish execution output. `rich` marks preformatted content (verifier
    /// reports) as opposed to plain text.
    fn show_output(&self, output: &str, rich: bool);

    /// Publish the current session view; `None` means no active session.
    fn show_session(&self, session: Option<&SessionSnapshot>);
}

/// The "no UI attached" configuration.
pub struct NullSurface;

impl StatusSurface for NullSurface {
    fn show_status(&self, _message: &str, _ok: bool) {}

    fn show_output(&self, _output: &str, _rich: bool) {}

    fn show_session(&self, _session: Option<&SessionSnapshot>) {}
}
