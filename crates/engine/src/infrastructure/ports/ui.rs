//! UI port: the confirmation dialog and notification banners.

use async_trait::async_trait;

/// Host UI surface used by the migration pass.
///
/// The dialog is the only human-in-the-loop gate: `confirm` resolves to
/// `true` on explicit confirmation, `false` on dismissal. Banners are
/// fire-and-forget.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UiPort: Send + Sync {
    /// Present a blocking modal with a single confirm action.
    async fn confirm(&self, title: &str, body: &str) -> bool;

    /// Non-fatal informational banner.
    fn notify_info(&self, message: &str);

    /// Non-fatal warning banner.
    fn notify_warn(&self, message: &str);
}
