//! The fork-gated difficulty controller.
//!
//! Branch selection by the child block number, newest fork first:
//! the ETC+step rules, the ETC rules with quantized gap drop, the
//! post-fork linear rule with configurable clamps and gap drop, and the
//! legacy linear rule. Every branch clamps to the minimum difficulty.

use crate::params::{
    minimum_difficulty, LEGACY_MAX_DECREASE_DIVISOR, LEGACY_MAX_INCREASE_FACTOR,
};
use olivetum_params::{DifficultyTunables, RuntimeParams};
use olivetum_types::{U256, U512};
use tracing::info;

/// What the controller did, for metrics and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DifficultyOutcome {
    /// The upper clamp limited the candidate.
    pub upper_clamped: bool,
    /// A gap drop replaced the candidate.
    pub gap_dropped: bool,
}

fn mul_div(value: U256, numerator: u64, denominator: u64) -> U256 {
    let product = value.full_mul(U256::from(numerator));
    let quotient = product / U512::from(denominator.max(1));
    U256::try_from(quotient).unwrap_or(U256::MAX)
}

/// Ethash/EIP-100 style adjustment:
/// `new = parent + parent/2048 * max(1 - Δ/period, -99)`, floored at 1.
fn etc_style(parent_diff: U256, period: u64, delta: u64) -> U256 {
    let target = period.max(1);
    let factor = (1i64 - (delta as i64) / (target as i64)).max(-99);
    let quot = parent_diff / U256::from(2048u64);
    if factor >= 0 {
        parent_diff.saturating_add(quot * U256::from(factor as u64))
    } else {
        let adjustment = quot * U256::from((-factor) as u64);
        if adjustment >= parent_diff {
            U256::one()
        } else {
            parent_diff - adjustment
        }
    }
}

fn floor_one(value: U256) -> U256 {
    if value.is_zero() {
        U256::one()
    } else {
        value
    }
}

fn clamp_minimum(value: U256) -> U256 {
    value.max(minimum_difficulty())
}

/// Computes the difficulty required of a child sealed at `time` on top of
/// `parent`, reporting clamp/gap events alongside.
pub fn calc_difficulty_with_outcome(
    runtime: &RuntimeParams,
    time: u64,
    parent_difficulty: U256,
    parent_time: u64,
    parent_number: u64,
    block_period: u64,
) -> (U256, DifficultyOutcome) {
    let mut outcome = DifficultyOutcome::default();

    let parent_diff = if parent_difficulty.is_zero() {
        minimum_difficulty()
    } else {
        parent_difficulty
    };
    let time_diff = time.saturating_sub(parent_time).max(1);
    let period = block_period.max(1);
    let next_number = parent_number + 1;
    let tunables = runtime.difficulty_tunables();

    // ETC-style difficulty after the step fork: base formula plus step drop.
    if runtime.is_after_etc_step_fork(next_number) {
        let mut candidate = etc_style(parent_diff, period, time_diff);
        let DifficultyTunables {
            step_start_seconds: start,
            step_interval_seconds: interval,
            step_drop_bps: drop_bps,
            step_max_drop_bps: max_drop_bps,
            ..
        } = tunables;
        if start > 0 && interval > 0 && drop_bps > 0 && time_diff >= start {
            let steps = (time_diff - start) / interval + 1;
            let mut total_bps = steps.saturating_mul(drop_bps);
            if max_drop_bps > 0 && total_bps > max_drop_bps {
                total_bps = max_drop_bps;
            }
            let factor_bp = 10_000u64.saturating_sub(total_bps).max(1);
            candidate = mul_div(candidate, factor_bp, 10_000);
            outcome.gap_dropped = true;
        }
        return (clamp_minimum(floor_one(candidate)), outcome);
    }

    // ETC-style difficulty with quantized gap drop.
    if runtime.is_after_etc_fork(next_number) {
        let gap = tunables.gap_drop_seconds;
        let mut quantized = time_diff;
        if gap > 0 && time_diff >= gap {
            quantized = time_diff.div_ceil(gap).max(1) * gap;
        }
        let mut candidate = etc_style(parent_diff, period, quantized);
        if gap > 0 && quantized >= gap {
            let mut ratio = quantized.div_ceil(gap).max(1);
            if tunables.gap_drop_max_divisor > 0 && ratio > tunables.gap_drop_max_divisor {
                ratio = tunables.gap_drop_max_divisor;
            }
            candidate = candidate / U256::from(ratio);
            outcome.gap_dropped = true;
        }
        return (clamp_minimum(floor_one(candidate)), outcome);
    }

    // Linear rule: parent * period / Δ, with fork-dependent clamps.
    let mut candidate = floor_one(mul_div(parent_diff, period, time_diff));

    let (inc_num, inc_den, dec_div, gap_seconds, gap_max_div) =
        if runtime.is_after_difficulty_fork(next_number) {
            (
                tunables.inc_num.max(1),
                tunables.inc_den.max(1),
                tunables.dec_div.max(1),
                tunables.gap_drop_seconds,
                tunables.gap_drop_max_divisor,
            )
        } else {
            (
                LEGACY_MAX_INCREASE_FACTOR,
                1,
                LEGACY_MAX_DECREASE_DIVISOR,
                0,
                0,
            )
        };

    if gap_seconds > 0 && time_diff >= gap_seconds {
        let mut ratio = if runtime.is_after_live_drop_fork(next_number) {
            time_diff.div_ceil(gap_seconds)
        } else {
            time_diff / gap_seconds
        }
        .max(1);
        if gap_max_div > 0 && ratio > gap_max_div {
            ratio = gap_max_div;
        }
        candidate = floor_one(parent_diff / U256::from(ratio));
        outcome.gap_dropped = true;
        info!(
            block = next_number,
            delay = time_diff,
            ratio,
            new_diff = %candidate,
            "difficulty gap drop applied"
        );
    }

    let upper = floor_one(mul_div(parent_diff, inc_num, inc_den));
    if candidate > upper {
        outcome.upper_clamped = true;
        candidate = upper;
    }

    let lower = floor_one(parent_diff / U256::from(dec_div));
    if candidate < lower {
        candidate = lower;
    }

    (clamp_minimum(candidate), outcome)
}

/// The difficulty required of a child sealed at `time` on top of `parent`.
pub fn calc_difficulty(
    runtime: &RuntimeParams,
    time: u64,
    parent_difficulty: U256,
    parent_time: u64,
    parent_number: u64,
    block_period: u64,
) -> U256 {
    calc_difficulty_with_outcome(
        runtime,
        time,
        parent_difficulty,
        parent_time,
        parent_number,
        block_period,
    )
    .0
}

/// Minimum timestamp increment the verifier enforces between parent and
/// child: a configured fraction of the target period post-fork, a sixth of
/// it before, never below one second.
pub fn min_timestamp_increment(runtime: &RuntimeParams, period: u64, post_fork: bool) -> u64 {
    if post_fork {
        let tunables = runtime.difficulty_tunables();
        let den = tunables.min_timestamp_den.max(1);
        let min = (period.saturating_mul(tunables.min_timestamp_num) + den - 1) / den;
        min.max(1)
    } else {
        ((period + 5) / 6).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olivetum_params::ForkSchedule;

    fn pre_fork_runtime() -> RuntimeParams {
        let runtime = RuntimeParams::new();
        runtime.set_block_period(15);
        runtime
    }

    fn diff(value: u64) -> U256 {
        U256::from(value)
    }

    #[test]
    fn test_legacy_at_target_period() {
        let runtime = pre_fork_runtime();
        let next = calc_difficulty(&runtime, 1_015, diff(10_000_000_000), 1_000, 1, 15);
        assert_eq!(next, diff(10_000_000_000));
    }

    #[test]
    fn test_legacy_fast_and_slow_blocks() {
        let runtime = pre_fork_runtime();
        let parent = diff(8_000_000);

        let fast = calc_difficulty(&runtime, 105, parent, 100, 1, 15);
        assert_eq!(fast, diff(24_000_000));

        let slow = calc_difficulty(&runtime, 160, parent, 100, 1, 15);
        assert_eq!(slow, diff(2_000_000));

        // Very slow blocks clamp at parent / 8.
        let very_slow = calc_difficulty(&runtime, 700, parent, 100, 1, 15);
        assert_eq!(very_slow, diff(1_000_000));
    }

    #[test]
    fn test_legacy_respects_runtime_period() {
        let runtime = pre_fork_runtime();
        let parent = diff(8_000_000);

        let fast = calc_difficulty(&runtime, 215, parent, 200, 1, 30);
        assert_eq!(fast, diff(16_000_000));

        let slow = calc_difficulty(&runtime, 220, parent, 200, 1, 10);
        assert_eq!(slow, diff(4_000_000));
    }

    #[test]
    fn test_minimum_difficulty_floor() {
        let runtime = pre_fork_runtime();
        let next = calc_difficulty(&runtime, 700, minimum_difficulty(), 100, 1, 15);
        assert_eq!(next, minimum_difficulty());
    }

    #[test]
    fn test_etc_fork_at_target_unchanged() {
        let runtime = RuntimeParams::new();
        let fork = runtime.forks().etc.unwrap();
        let parent = diff(10_000_000_000);
        let next = calc_difficulty(&runtime, 1_015, parent, 1_000, fork, 15);
        assert_eq!(next, parent);
    }

    #[test]
    fn test_etc_fork_gap_drop_halves_at_two_minutes() {
        let runtime = RuntimeParams::new();
        let fork = runtime.forks().etc.unwrap();
        let parent = diff(10_000_000_000);

        let next = calc_difficulty(&runtime, 1_120, parent, 1_000, fork, 15);
        let pct = next * U256::from(100u64) / parent;
        assert!(pct >= U256::from(45u64) && pct <= U256::from(55u64), "got {pct}%");
    }

    #[test]
    fn test_step_fork_drop_schedule() {
        let runtime = RuntimeParams::new();
        let fork = runtime.forks().etc_step.unwrap();
        let parent = diff(10_000_000_000);

        let at_target = calc_difficulty(&runtime, 1_015, parent, 1_000, fork, 15);
        assert_eq!(at_target, parent);

        let bp = |next: U256| next * U256::from(10_000u64) / parent;

        let two_min = calc_difficulty(&runtime, 1_120, parent, 1_000, fork, 15);
        let bp2 = bp(two_min);
        assert!(bp2 >= U256::from(9_600u64) && bp2 <= U256::from(9_900u64), "got {bp2} bp");

        let three_min = calc_difficulty(&runtime, 1_180, parent, 1_000, fork, 15);
        let bp3 = bp(three_min);
        assert!(bp3 >= U256::from(9_300u64) && bp3 <= U256::from(9_700u64), "got {bp3} bp");
        assert!(bp3 < bp2, "expected further drop at 180s");
    }

    #[test]
    fn test_step_drop_capped() {
        let runtime = RuntimeParams::new();
        let fork = runtime.forks().etc_step.unwrap();
        let parent = diff(10_000_000_000);

        // An hour-long gap exhausts the 50% cap but goes no further.
        let next = calc_difficulty(&runtime, 4_600, parent, 1_000, fork, 15);
        let floor = etc_style(parent, 15, 3_600) / U256::from(2u64);
        assert_eq!(next, floor);
    }

    #[test]
    fn test_post_fork_clamps() {
        let runtime = RuntimeParams::new();
        let fork = runtime.forks().difficulty.unwrap();
        let parent = diff(8_000_000);

        // 8M * 15 / 1 would be 120M; clamped to 1.5x.
        let (next, outcome) = calc_difficulty_with_outcome(&runtime, 101, parent, 100, fork, 15);
        assert_eq!(next, diff(12_000_000));
        assert!(outcome.upper_clamped);
    }

    #[test]
    fn test_post_fork_gap_drop_floor_ratio() {
        let runtime = RuntimeParams::new();
        let fork = runtime.forks().difficulty.unwrap();
        let parent = diff(8_000_000);

        // 130 s with a 60 s gap: floor ratio 2 (live-drop fork disabled).
        let (next, outcome) = calc_difficulty_with_outcome(&runtime, 230, parent, 100, fork, 15);
        assert_eq!(next, diff(4_000_000));
        assert!(outcome.gap_dropped);

        // With live drop enabled the ratio rounds up to 3.
        let mut forks = runtime.forks();
        forks.live_drop = Some(0);
        runtime.set_forks(forks);
        let next = calc_difficulty(&runtime, 230, parent, 100, fork, 15);
        assert_eq!(next, diff(8_000_000) / U256::from(3u64));
    }

    #[test]
    fn test_branchless_for_disabled_forks() {
        let runtime = RuntimeParams::new();
        runtime.set_forks(ForkSchedule {
            difficulty: None,
            live_drop: None,
            etc: None,
            etc_step: None,
            ..ForkSchedule::default()
        });
        // With every fork disabled, even huge numbers take the legacy path.
        let next = calc_difficulty(&runtime, 1_015, diff(8_000_000), 1_000, 1_000_000, 15);
        assert_eq!(next, diff(8_000_000));
    }

    #[test]
    fn test_min_timestamp_increment() {
        let runtime = RuntimeParams::new();
        assert_eq!(min_timestamp_increment(&runtime, 15, false), 3);
        assert_eq!(min_timestamp_increment(&runtime, 15, true), 3);
        assert_eq!(min_timestamp_increment(&runtime, 1, false), 1);
        assert_eq!(min_timestamp_increment(&runtime, 1, true), 1);
        assert_eq!(min_timestamp_increment(&runtime, 20, false), 4);
        assert_eq!(min_timestamp_increment(&runtime, 60, true), 10);
    }
}
