use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::connectors::GateVault;
use crate::error::CoreError;
use crate::types::{FileHandle, Gate};

/// Per-gate presentation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateStatus {
    pub gate: Gate,
    pub locked: bool,
    pub in_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GateEvaluation {
    pub locked: bool,
    pub gates: Vec<GateStatus>,
}

/// Decides unlock eligibility for a release's gated files and guards unlock
/// progress per gate.
///
/// Different gates of the same release may be unlocked concurrently; the same
/// gate may not have two unlock operations in flight. A failed unlock leaves
/// that gate's state unchanged and never affects other gates.
pub struct AccessGateEvaluator {
    vault: Arc<dyn GateVault>,
    in_progress: Mutex<HashSet<String>>,
}

impl AccessGateEvaluator {
    pub fn new(vault: Arc<dyn GateVault>) -> Self {
        Self {
            vault,
            in_progress: Mutex::new(HashSet::new()),
        }
    }

    /// Evaluate unlock eligibility: holding zero tokens locks every gate.
    pub async fn evaluate_gates(&self, gates: &[Gate], amount_held: u64) -> GateEvaluation {
        let in_progress = self.in_progress.lock().await;
        let locked = amount_held == 0;
        GateEvaluation {
            locked,
            gates: gates
                .iter()
                .map(|gate| GateStatus {
                    gate: gate.clone(),
                    locked,
                    in_progress: in_progress.contains(&gate.unlock_key),
                })
                .collect(),
        }
    }

    /// Unlock a single gate for `account`.
    ///
    /// Callers are expected not to attempt this with `amount_held == 0`; the
    /// guard here fails fast without touching the vault if they do.
    pub async fn unlock(
        &self,
        gate: &Gate,
        amount_held: u64,
        account: &str,
    ) -> Result<FileHandle, CoreError> {
        if amount_held == 0 {
            return Err(CoreError::gate_unlock(&gate.file_name, "release not held"));
        }

        {
            let mut in_progress = self.in_progress.lock().await;
            if !in_progress.insert(gate.unlock_key.clone()) {
                return Err(CoreError::gate_unlock(
                    &gate.file_name,
                    "unlock already in progress",
                ));
            }
        }

        debug!(file_name = %gate.file_name, account, "unlocking gate");
        let result = self.vault.fetch_file(gate, account).await.map_err(|err| {
            warn!(file_name = %gate.file_name, %err, "gate unlock failed");
            match err {
                already @ CoreError::GateUnlockFailed { .. } => already,
                other => CoreError::gate_unlock(&gate.file_name, other.to_string()),
            }
        });
        self.in_progress.lock().await.remove(&gate.unlock_key);
        result
    }
}

/// File size rendered the way the gate list displays it.
pub fn file_size_label(gate: &Gate) -> String {
    format!("{:.2} mb", gate.file_size as f64 / (1024.0 * 1024.0))
}
