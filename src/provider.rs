//! Outbound seam to the conversational AI service.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Turn;

/// A conversational AI backend: history in, reply text out.
///
/// Implementations must not retain state between calls; the caller owns the
/// history and sends it in full every time.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, history: &[Turn]) -> Result<String>;

    /// Human-readable backend name for logs and the health command.
    fn name(&self) -> &str;
}
