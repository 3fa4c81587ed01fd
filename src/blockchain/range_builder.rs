use alloy::primitives::U256;

/// Block numbers to inspect, newest first.
///
/// Walks back from `latest` one block at a time and stops at genesis, so the
/// result has `min(max_blocks, latest + 1)` entries and is never negative.
/// `max_blocks` is expected to be pre-clamped to `[1, MAX_BLOCKS]`.
pub fn build_block_range(latest: U256, max_blocks: u32) -> Vec<U256> {
    let mut range = Vec::with_capacity(max_blocks as usize);
    let mut current = Some(latest);

    while let Some(number) = current {
        if range.len() >= max_blocks as usize {
            break;
        }
        range.push(number);
        current = number.checked_sub(U256::from(1));
    }

    range
}
