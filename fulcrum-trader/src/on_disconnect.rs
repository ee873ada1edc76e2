//! Hook fired when a StrategyRun's bound `BrokerLink` session drops
//! mid-run. Supplementary feature, not named by spec.md's distillation but
//! needed by any complete Strategy Runner — grounded in the teacher's
//! `OnDisconnectStrategy` hook-trait shape, simplified to this workspace's
//! concrete broker-link identity.

use fulcrum_markets::BrokerLinkId;

pub trait OnDisconnectStrategy: Sized {
    type OnDisconnect;

    /// Invoked once the Orchestrator observes a dispatch failure it
    /// attributes to a dropped session (`BrokerError::SessionExpired`
    /// surviving a retry) rather than an adapter-level rejection.
    fn on_disconnect(&self, link: BrokerLinkId) -> Self::OnDisconnect;
}
