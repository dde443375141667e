//! Oscillator profiles
//!
//! A profile is everything one cyclic move needs: a wave per joint, a shared
//! period, and a (fractional) cycle count.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::hardware::{Joint, NUM_JOINTS};

/// Wave parameters for a single joint (degrees, radians for phase)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JointWave {
    pub amplitude: f64,
    /// Shift from the neutral angle
    pub offset: f64,
    pub phase: f64,
}

/// Per-joint waves sharing one time base
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorProfile {
    pub waves: [JointWave; NUM_JOINTS],
    pub period_ms: u32,
    pub cycles: f64,
}

impl OscillatorProfile {
    /// Build from degree-valued tables (FL/FR/RL/RR)
    pub fn from_degrees(
        amplitude: [f64; NUM_JOINTS],
        offset: [f64; NUM_JOINTS],
        phase_deg: [f64; NUM_JOINTS],
        period_ms: u32,
        cycles: f64,
    ) -> Self {
        let waves = std::array::from_fn(|i| JointWave {
            amplitude: amplitude[i],
            offset: offset[i],
            phase: phase_deg[i].to_radians(),
        });
        Self {
            waves,
            period_ms,
            cycles: cycles.max(0.0),
        }
    }

    pub fn wave(&self, joint: Joint) -> &JointWave {
        &self.waves[joint.index()]
    }

    /// Phase of every joint in radians
    pub fn phases(&self) -> [f64; NUM_JOINTS] {
        self.waves.map(|w| w.phase)
    }

    /// Copy with every phase negated: the same gait run backward
    pub fn reversed(mut self) -> Self {
        for wave in &mut self.waves {
            wave.phase = -wave.phase;
        }
        self
    }

    /// Displacement from neutral of `joint` at `t_ms` into the wave
    pub fn displacement(&self, joint: Joint, t_ms: f64) -> f64 {
        let w = self.wave(joint);
        w.offset + w.amplitude * (TAU * t_ms / self.period_ms as f64 + w.phase).sin()
    }

    /// Total duration of all cycles in ms
    pub fn duration_ms(&self) -> f64 {
        self.period_ms as f64 * self.cycles
    }
}

/// Split a cycle count into whole-cycle runs plus a trailing fraction.
///
/// `2.5` becomes `[1.0, 1.0, 0.5]`; a zero remainder is dropped.
/// Yielded lazily, so huge counts cost nothing until they run.
pub fn split_cycles(total: f64) -> impl Iterator<Item = f64> {
    let total = total.max(0.0);
    let whole = total.floor();
    let remainder = total - whole;
    std::iter::repeat(1.0)
        .take(whole as usize)
        .chain((remainder > f64::EPSILON).then_some(remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_degrees_converts_phase() {
        let p = OscillatorProfile::from_degrees([1.0; 4], [0.0; 4], [0.0, 90.0, 180.0, 270.0], 600, 2.0);
        assert_relative_eq!(p.phases()[1], std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(p.phases()[2], std::f64::consts::PI);
    }

    #[test]
    fn test_reversed_negates_phase_only() {
        let p = OscillatorProfile::from_degrees(
            [20.0, 21.0, 22.0, 23.0],
            [1.0, 2.0, 3.0, 4.0],
            [0.0, 180.0, 270.0, 90.0],
            800,
            4.0,
        );
        let r = p.reversed();
        for joint in Joint::ALL {
            assert_eq!(r.wave(joint).phase, -p.wave(joint).phase);
            assert_eq!(r.wave(joint).amplitude, p.wave(joint).amplitude);
            assert_eq!(r.wave(joint).offset, p.wave(joint).offset);
        }
        assert_eq!(r.period_ms, p.period_ms);
    }

    #[test]
    fn test_displacement() {
        let p = OscillatorProfile::from_degrees([25.0; 4], [0.0, 0.0, 5.0, 0.0], [0.0; 4], 600, 1.0);
        assert_relative_eq!(p.displacement(Joint::FrontLeft, 150.0), 25.0, epsilon = 1e-9);
        assert_relative_eq!(p.displacement(Joint::RearLeft, 0.0), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_split_cycles_is_lazy_for_huge_counts() {
        let mut parts = split_cycles(u32::MAX as f64 + 0.5);
        assert_eq!(parts.next(), Some(1.0));
        assert_eq!(parts.size_hint().0, u32::MAX as usize);
    }

    #[test]
    fn test_split_cycles() {
        let split = |total: f64| split_cycles(total).collect::<Vec<_>>();
        assert_eq!(split(2.5), vec![1.0, 1.0, 0.5]);
        assert_eq!(split(3.0), vec![1.0, 1.0, 1.0]);
        assert_eq!(split(0.25), vec![0.25]);
        assert!(split(0.0).is_empty());
        assert!(split(-1.0).is_empty());
    }
}
