//! Resolves which `BrokerLink` backs an `Account` — the one piece of
//! account metadata the Orchestrator needs but does not own (that's a
//! persistence concern, spec.md §6's relational store). Callers plug in a
//! real implementation backed by `DATABASE_URL`; [`InMemoryAccountDirectory`]
//! is the in-process default used by tests and the `PaperTrading` path.

use dashmap::DashMap;
use fulcrum_markets::{AccountId, BrokerLinkId};

pub trait AccountDirectory: Send + Sync {
    fn broker_link_of(&self, account: AccountId) -> Option<BrokerLinkId>;
}

#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    links: DashMap<AccountId, BrokerLinkId>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, account: AccountId, link: BrokerLinkId) {
        self.links.insert(account, link);
    }
}

impl AccountDirectory for InMemoryAccountDirectory {
    fn broker_link_of(&self, account: AccountId) -> Option<BrokerLinkId> {
        self.links.get(&account).map(|entry| *entry)
    }
}
