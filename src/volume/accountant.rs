use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VolumeState {
    pub cumulative_volume: Decimal,
    pub iteration_count: u64,
}

/// Running volume total. Every credited iteration adds exactly two order sides.
#[derive(Debug, Default)]
pub struct VolumeAccountant {
    state: VolumeState,
}

impl VolumeAccountant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }

    pub fn record_iteration(&mut self, per_side_notional: Decimal) -> VolumeState {
        self.state.cumulative_volume += per_side_notional * Decimal::TWO;
        self.state.iteration_count += 1;
        self.state
    }

    pub fn has_reached_target(&self, target: Decimal) -> bool {
        self.state.cumulative_volume >= target
    }
}

/// Number of full iterations needed to reach `target` from zero.
pub fn iterations_to_target(target: Decimal, per_side_notional: Decimal) -> u64 {
    if per_side_notional <= Decimal::ZERO || target <= Decimal::ZERO {
        return 0;
    }
    let iterations = (target / (per_side_notional * Decimal::TWO)).ceil();
    u64::try_from(iterations).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn starts_at_zero() {
        let accountant = VolumeAccountant::new();
        assert_eq!(accountant.state(), VolumeState::default());
        assert!(!accountant.has_reached_target(dec!(1)));
    }

    #[test]
    fn credits_two_sides_per_iteration() {
        let mut accountant = VolumeAccountant::new();
        let mut previous = accountant.state().cumulative_volume;
        for n in 1..=5u64 {
            let state = accountant.record_iteration(dec!(1000));
            assert_eq!(state.cumulative_volume - previous, dec!(2000));
            assert_eq!(state.iteration_count, n);
            assert_eq!(
                state.cumulative_volume,
                dec!(2000) * Decimal::from(state.iteration_count)
            );
            previous = state.cumulative_volume;
        }
    }

    #[test]
    fn target_reached_at_or_above() {
        let mut accountant = VolumeAccountant::new();
        accountant.record_iteration(dec!(1000));
        assert!(!accountant.has_reached_target(dec!(3000)));
        accountant.record_iteration(dec!(1000));
        assert!(accountant.has_reached_target(dec!(3000)));
        assert!(accountant.has_reached_target(dec!(4000)));
    }

    #[test]
    fn iteration_estimate_rounds_up() {
        assert_eq!(iterations_to_target(dec!(3000), dec!(1000)), 2);
        assert_eq!(iterations_to_target(dec!(4000), dec!(1000)), 2);
        assert_eq!(iterations_to_target(dec!(466667), dec!(1000)), 234);
        assert_eq!(iterations_to_target(dec!(1), dec!(0)), 0);
    }
}
