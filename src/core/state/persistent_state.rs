// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Persistent ledger state using sled.
//!
//! Four trees back the ledger:
//! - `pools`: `PoolId -> Pool`
//! - `pool_names`: `name -> PoolId` (uniqueness index)
//! - `positions`: `PositionId -> StakePosition`
//! - `tx_index`: `TxId -> TxUse` (every external transaction id is single-use)
//!
//! Mutations go through [`LedgerStore::transact`], a single multi-tree sled
//! transaction: either every record of an operation is written or none is.
//! Aggregate scans go through [`LedgerStore::snapshot`], which excludes
//! in-flight commits so a scan never sees half of an operation.

use crate::core::economics::pool::Pool;
use crate::core::economics::stake::StakePosition;
use crate::core::error::StakingError;
use crate::core::types::{
    decode_canonical_limited, encode_canonical, PoolId, PositionId, TxId, MAX_RECORD_BYTES,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
    TransactionalTree,
};
use sled::Transactional;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::error;

/// State errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// Database could not be opened.
    #[error("db open")]
    DbOpen,
    /// Read or write failed.
    #[error("db io")]
    DbIo,
    /// Stored bytes did not decode.
    #[error("corrupt record")]
    Corrupt,
    /// A holder of the snapshot gate panicked.
    #[error("snapshot gate poisoned")]
    Poisoned,
    /// Blocking store task panicked or was cancelled.
    #[error("store task failed")]
    TaskFailed,
}

/// Result type used inside ledger transactions.
pub type TxResult<T> = ConflictableTransactionResult<T, StakingError>;

/// What an external transaction id was spent on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    /// Funded a position.
    Deposit,
    /// Closed (fully or partially) a position.
    Withdrawal,
    /// Paid out rewards.
    Claim,
}

/// Entry of the transaction index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxUse {
    /// Position the transaction was applied to.
    pub position: PositionId,
    /// Kind of use.
    pub kind: TxKind,
}

/// Abort the surrounding transaction with a domain error.
pub fn abort<T>(e: StakingError) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(e))
}

/// Lift a domain result into a transaction result.
pub trait OrAbort<T> {
    /// `Err(e)` becomes an abort carrying `e`.
    fn or_abort(self) -> TxResult<T>;
}

impl<T> OrAbort<T> for Result<T, StakingError> {
    fn or_abort(self) -> TxResult<T> {
        self.map_err(ConflictableTransactionError::Abort)
    }
}

fn decode_in_tx<T: DeserializeOwned>(bytes: &[u8]) -> TxResult<T> {
    decode_canonical_limited(bytes, MAX_RECORD_BYTES).or_else(|_| {
        error!("undecodable ledger record inside transaction");
        abort(StakingError::Internal)
    })
}

fn encode_in_tx<T: Serialize>(v: &T) -> TxResult<Vec<u8>> {
    encode_canonical(v).or_else(|_| abort(StakingError::Internal))
}

/// Transactional view over the ledger trees.
pub struct LedgerTx<'a> {
    pools: &'a TransactionalTree,
    pool_names: &'a TransactionalTree,
    positions: &'a TransactionalTree,
    tx_index: &'a TransactionalTree,
}

impl LedgerTx<'_> {
    /// Read a pool.
    pub fn pool(&self, id: &PoolId) -> TxResult<Option<Pool>> {
        match self.pools.get(id.as_str().as_bytes())? {
            Some(iv) => decode_in_tx(&iv).map(Some),
            None => Ok(None),
        }
    }

    /// Write a pool.
    pub fn put_pool(&self, pool: &Pool) -> TxResult<()> {
        let bytes = encode_in_tx(pool)?;
        self.pools.insert(pool.id.as_str().as_bytes(), bytes)?;
        Ok(())
    }

    /// Write a pool that must not exist yet.
    pub fn insert_pool(&self, pool: &Pool) -> TxResult<()> {
        if self.pools.get(pool.id.as_str().as_bytes())?.is_some() {
            error!(pool = %pool.id, "pool id already allocated");
            return abort(StakingError::Internal);
        }
        self.put_pool(pool)
    }

    /// Read a position.
    pub fn position(&self, id: &PositionId) -> TxResult<Option<StakePosition>> {
        match self.positions.get(id.as_str().as_bytes())? {
            Some(iv) => decode_in_tx(&iv).map(Some),
            None => Ok(None),
        }
    }

    /// Write a position.
    pub fn put_position(&self, pos: &StakePosition) -> TxResult<()> {
        let bytes = encode_in_tx(pos)?;
        self.positions.insert(pos.id.as_str().as_bytes(), bytes)?;
        Ok(())
    }

    /// Write a position that must not exist yet.
    pub fn insert_position(&self, pos: &StakePosition) -> TxResult<()> {
        if self.positions.get(pos.id.as_str().as_bytes())?.is_some() {
            error!(position = %pos.id, "position id already allocated");
            return abort(StakingError::Internal);
        }
        self.put_position(pos)
    }

    /// Bind a unique pool name to `id`; aborts if another pool holds it.
    pub fn bind_pool_name(&self, name: &str, id: &PoolId) -> TxResult<()> {
        if let Some(iv) = self.pool_names.get(name.as_bytes())? {
            if iv.as_ref() != id.as_str().as_bytes() {
                return abort(StakingError::Validation(format!(
                    "pool name '{name}' already exists"
                )));
            }
        }
        self.pool_names
            .insert(name.as_bytes(), id.as_str().as_bytes())?;
        Ok(())
    }

    /// Drop a name binding.
    pub fn unbind_pool_name(&self, name: &str) -> TxResult<()> {
        self.pool_names.remove(name.as_bytes())?;
        Ok(())
    }

    /// Mark `tx` as spent; aborts with `DuplicateTransaction` if already spent.
    pub fn record_tx(&self, tx: &TxId, position: &PositionId, kind: TxKind) -> TxResult<()> {
        if self.tx_index.get(tx.as_str().as_bytes())?.is_some() {
            return abort(StakingError::DuplicateTransaction);
        }
        let entry = TxUse {
            position: position.clone(),
            kind,
        };
        let bytes = encode_in_tx(&entry)?;
        self.tx_index.insert(tx.as_str().as_bytes(), bytes)?;
        Ok(())
    }
}

/// Persistent ledger wrapper.
#[derive(Clone)]
pub struct LedgerStore {
    db: sled::Db,
    pools: sled::Tree,
    pool_names: sled::Tree,
    positions: sled::Tree,
    tx_index: sled::Tree,
    gate: Arc<RwLock<()>>,
}

impl LedgerStore {
    /// Open sled DB at path (directory).
    pub fn open(path: &str) -> Result<Self, StateError> {
        let db = sled::open(path).map_err(|_| StateError::DbOpen)?;
        Self::from_db(db)
    }

    /// Open a throwaway in-memory DB (removed on drop).
    pub fn open_temporary() -> Result<Self, StateError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|_| StateError::DbOpen)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StateError> {
        let tree = |name: &str| db.open_tree(name).map_err(|_| StateError::DbOpen);
        Ok(Self {
            pools: tree("pools")?,
            pool_names: tree("pool_names")?,
            positions: tree("positions")?,
            tx_index: tree("tx_index")?,
            db,
            gate: Arc::new(RwLock::new(())),
        })
    }

    fn get_decoded<T: DeserializeOwned>(
        tree: &sled::Tree,
        key: &[u8],
    ) -> Result<Option<T>, StateError> {
        let v = tree.get(key).map_err(|_| StateError::DbIo)?;
        v.map(|iv| decode_canonical_limited(&iv, MAX_RECORD_BYTES).map_err(|_| StateError::Corrupt))
            .transpose()
    }

    fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, StateError> {
        let mut out = Vec::new();
        for item in tree.iter() {
            let (_k, v) = item.map_err(|_| StateError::DbIo)?;
            out.push(decode_canonical_limited(&v, MAX_RECORD_BYTES).map_err(|_| StateError::Corrupt)?);
        }
        Ok(out)
    }

    /// Get a pool.
    pub fn pool(&self, id: &PoolId) -> Result<Option<Pool>, StateError> {
        Self::get_decoded(&self.pools, id.as_str().as_bytes())
    }

    /// Get a position.
    pub fn position(&self, id: &PositionId) -> Result<Option<StakePosition>, StateError> {
        Self::get_decoded(&self.positions, id.as_str().as_bytes())
    }

    /// Look up what a transaction id was spent on.
    pub fn tx_use(&self, tx: &TxId) -> Result<Option<TxUse>, StateError> {
        Self::get_decoded(&self.tx_index, tx.as_str().as_bytes())
    }

    /// True if the transaction id has already been applied.
    pub fn tx_used(&self, tx: &TxId) -> Result<bool, StateError> {
        self.tx_index
            .contains_key(tx.as_str().as_bytes())
            .map_err(|_| StateError::DbIo)
    }

    /// All pools. Call inside [`LedgerStore::snapshot`] for a consistent view.
    pub fn scan_pools(&self) -> Result<Vec<Pool>, StateError> {
        Self::scan(&self.pools)
    }

    /// All positions. Call inside [`LedgerStore::snapshot`] for a consistent view.
    pub fn scan_positions(&self) -> Result<Vec<StakePosition>, StateError> {
        Self::scan(&self.positions)
    }

    /// Run `f` while no commit is in flight.
    pub fn snapshot<R>(
        &self,
        f: impl FnOnce(&Self) -> Result<R, StakingError>,
    ) -> Result<R, StakingError> {
        let _guard = self.gate.write().map_err(|_| StateError::Poisoned)?;
        f(self)
    }

    /// Atomic multi-tree commit. `f` may be re-run by sled on conflict, so it must
    /// only derive its writes from what it reads through the [`LedgerTx`].
    pub fn transact<R, F>(&self, f: F) -> Result<R, StakingError>
    where
        F: Fn(&LedgerTx<'_>) -> TxResult<R>,
    {
        let _guard = self.gate.read().map_err(|_| StateError::Poisoned)?;
        let res = (&self.pools, &self.pool_names, &self.positions, &self.tx_index).transaction(
            |(pools, pool_names, positions, tx_index)| {
                let tx = LedgerTx {
                    pools,
                    pool_names,
                    positions,
                    tx_index,
                };
                f(&tx)
            },
        );

        match res {
            Ok(v) => Ok(v),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => {
                error!(?e, "ledger transaction storage failure");
                Err(StakingError::Internal)
            }
        }
    }

    /// Run blocking store work on tokio's blocking pool.
    ///
    /// Commits and scans wait on sled I/O and the snapshot gate, so async
    /// callers go through here instead of calling the store directly.
    pub async fn run_blocking<R, F>(&self, f: F) -> Result<R, StakingError>
    where
        R: Send + 'static,
        F: FnOnce(&LedgerStore) -> Result<R, StakingError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| {
                error!(?e, "blocking ledger task failed");
                StateError::TaskFailed
            })?
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> Result<(), StateError> {
        self.db.flush().map(|_| ()).map_err(|_| StateError::DbIo)
    }
}
