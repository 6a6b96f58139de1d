use crate::errors::StoreAccessError;
use crate::model::{GhostdagStoreReader, HeaderStoreReader};
use duskdag_hashes::Hash;
use duskdag_math::Uint256;
use std::time::Duration;

/// The only way retargeting can fail: a store access against a hash the
/// caller never inserted. There is no insufficient-window error — §4.4 rule
/// 1 handles that case by emitting the genesis bits unchanged.
pub type DifficultyManagerError = StoreAccessError;
pub type DifficultyManagerResult<T> = std::result::Result<T, DifficultyManagerError>;

/// Retargets difficulty over a fixed blue-score window along the
/// selected-parent chain (§4.7/C7), in the style of Bitcoin's classic
/// full-window retarget rather than KIP-4's sampled variant: every block in
/// the window contributes its timestamp and bits.
#[derive(Debug, Clone)]
pub struct DifficultyManager {
    window_size: u64,
    target_time_per_block_ms: i64,
    max_target: Uint256,
    genesis_bits: u32,
}

impl DifficultyManager {
    pub fn new(window_size: u64, target_time_per_block: Duration, max_target: Uint256, genesis_bits: u32) -> Self {
        Self { window_size, target_time_per_block_ms: target_time_per_block.as_millis() as i64, max_target, genesis_bits }
    }

    /// The compact `bits` for the block selecting `selected_parent`, derived
    /// from the actual vs. target timespan across the window. Red blocks
    /// never enter the selected-parent chain, so they cannot perturb this
    /// computation (§8's difficulty-stability invariant).
    ///
    /// Rule 1 (§4.4): while the selected parent's blue score is still below
    /// the window size, the window can't be filled yet, so this emits the
    /// network's genesis bits unchanged rather than erroring.
    pub fn calculate_next_bits(
        &self,
        headers: &dyn HeaderStoreReader,
        ghostdag: &dyn GhostdagStoreReader,
        selected_parent: Hash,
    ) -> DifficultyManagerResult<u32> {
        if ghostdag.get(selected_parent)?.blue_score < self.window_size {
            return Ok(self.genesis_bits);
        }

        let mut chain = Vec::with_capacity(self.window_size as usize);
        let mut current = selected_parent;
        loop {
            chain.push(current);
            if chain.len() as u64 >= self.window_size {
                break;
            }
            let data = ghostdag.get(current)?;
            if data.selected_parent == current {
                break;
            }
            current = data.selected_parent;
        }

        let newest = *chain.first().expect("window checked non-empty above");
        let oldest = *chain.last().expect("window checked non-empty above");

        let target_timespan = self.target_time_per_block_ms * (self.window_size as i64 - 1);
        let actual_timespan = headers.timestamp(newest)? - headers.timestamp(oldest)?;
        let clamped_timespan = actual_timespan.clamp(target_timespan / 4, target_timespan * 4).max(1);

        let old_target = Uint256::from_compact(headers.bits(newest)?);
        let new_target = old_target.saturating_mul_u64(clamped_timespan as u64).div_u64(target_timespan as u64);
        let new_target = new_target.min(self.max_target);

        Ok(new_target.to_compact())
    }
}
