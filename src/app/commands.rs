//! Inbound commands to the application service.
//!
//! These are the effects the two front-panel buttons trigger.  The
//! [`AppService`](super::service::AppService) ignores both while the
//! settings lock is set.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Flip the indicator light on or off.
    ToggleLight,

    /// Show the settings view for a few seconds.
    ShowSettings,
}
