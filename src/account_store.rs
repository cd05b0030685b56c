//! Where recovered accounts end up, keyed by xpub

use parking_lot::RwLock;
use tracing::debug;

use crate::account::AccountRecord;

/// Account storage owned by the host app
#[uniffi::export(with_foreign)]
pub trait AccountStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert the account, replacing any account with the same xpub
    fn upsert(&self, account: AccountRecord);

    /// Remove the account with this xpub, returns whether one was removed
    fn delete(&self, xpub: String) -> bool;

    fn clear(&self);

    fn accounts(&self) -> Vec<AccountRecord>;
}

/// In-memory [`AccountStore`], most recently upserted accounts last
#[derive(Debug, Default, uniffi::Object)]
pub struct MemoryAccountStore {
    accounts: RwLock<Vec<AccountRecord>>,
}

#[uniffi::export]
impl MemoryAccountStore {
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.accounts.read().len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[uniffi::export]
impl AccountStore for MemoryAccountStore {
    fn upsert(&self, account: AccountRecord) {
        let mut accounts = self.accounts.write();
        accounts.retain(|existing| existing.xpub() != account.xpub());

        debug!("upserting account {} ({})", account.id, account.coin_type);
        accounts.push(account);
    }

    fn delete(&self, xpub: String) -> bool {
        let mut accounts = self.accounts.write();
        let before = accounts.len();
        accounts.retain(|existing| existing.xpub() != xpub);

        accounts.len() != before
    }

    fn clear(&self) {
        self.accounts.write().clear();
    }

    fn accounts(&self) -> Vec<AccountRecord> {
        self.accounts.read().clone()
    }
}
