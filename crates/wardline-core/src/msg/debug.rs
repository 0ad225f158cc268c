//! Message debug hooks.

/// Observer of message headers, for diagnostics only.
///
/// Hooks must not fail or block; they never influence message construction.
pub trait MessageDebugContext: Send + Sync {
    /// A header was sent.
    fn sent_header(&self, header: &[u8]);

    /// A header was received.
    fn received_header(&self, header: &[u8]);
}
