//! Tick-driven spin that always stops on a pre-selected slot.
//!
//! The engine owns no timers. Whoever drives it calls [`SpinEngine::tick`] and waits for the
//! returned delay before calling it again; all progress lives in [`SpinState`].

use crate::sphere::SPIN_Y_RATIO;
use crate::sphere::layout::SphereRotation;
use crate::sphere::profile::SpinTuning;
use std::time::Duration;
use strum::Display as StrumDisplay;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, StrumDisplay)]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning,
    Settling,
    Done,
}

impl SpinPhase {
    pub fn is_busy(&self) -> bool {
        matches!(self, SpinPhase::Spinning | SpinPhase::Settling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpinState {
    pub phase: SpinPhase,
    pub target: usize,
    pub pool_length: usize,
    pub current_index: usize,
    pub speed_ms: u64,
    pub completed_rounds: u32,
    pub rotation_step: f64,
    pub ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinStep {
    /// Highlight `index`, turn the sphere by `rotation`, call `tick` again after `delay`.
    Tick {
        index: usize,
        rotation: SphereRotation,
        delay: Duration,
    },
    /// The spin is over and rests on `index`.
    Settled { index: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpinError {
    #[error("Target slot {target} is outside a pool of {pool_length}")]
    InvalidTarget { target: usize, pool_length: usize },
    #[error("A spin is already running ({0})")]
    Busy(SpinPhase),
}

#[derive(Debug, Clone)]
pub struct SpinEngine {
    tuning: SpinTuning,
    state: SpinState,
}

impl SpinEngine {
    pub fn new(tuning: SpinTuning) -> Self {
        Self {
            tuning,
            state: SpinState::default(),
        }
    }

    pub fn state(&self) -> &SpinState {
        &self.state
    }

    pub fn phase(&self) -> SpinPhase {
        self.state.phase
    }

    pub fn is_busy(&self) -> bool {
        self.state.phase.is_busy()
    }

    /// Begins a spin towards `target`. Leaves the engine untouched on error.
    pub fn start(&mut self, target: usize, pool_length: usize) -> Result<(), SpinError> {
        if self.is_busy() {
            return Err(SpinError::Busy(self.state.phase));
        }
        if target >= pool_length {
            return Err(SpinError::InvalidTarget {
                target,
                pool_length,
            });
        }

        self.state = SpinState {
            phase: SpinPhase::Spinning,
            target,
            pool_length,
            current_index: 0,
            speed_ms: self.tuning.initial_speed_ms,
            completed_rounds: 0,
            rotation_step: self.tuning.rotation_step,
            ticks: 0,
        };
        log::debug!("Spin started towards slot {} of {}", target, pool_length);
        Ok(())
    }

    /// Abandons whatever spin is running.
    pub fn reset(&mut self) {
        self.state = SpinState::default();
    }

    pub fn tick(&mut self) -> Option<SpinStep> {
        match self.state.phase {
            SpinPhase::Idle | SpinPhase::Done => None,
            SpinPhase::Spinning => Some(self.advance()),
            SpinPhase::Settling => {
                self.state.phase = SpinPhase::Done;
                log::debug!("Spin settled on slot {}", self.state.target);
                Some(SpinStep::Settled {
                    index: self.state.target,
                })
            }
        }
    }

    fn stop_gate_open(&self) -> bool {
        self.state.completed_rounds >= self.tuning.min_rounds_before_stop
            && self.state.speed_ms > self.tuning.stop_speed_threshold_ms
    }

    fn advance(&mut self) -> SpinStep {
        let gate_open = self.stop_gate_open();
        let tuning = self.tuning;
        let state = &mut self.state;

        let index = state.current_index;
        let rotation = SphereRotation::new(
            state.rotation_step,
            state.rotation_step * SPIN_Y_RATIO,
        );
        state.ticks += 1;

        if gate_open && index == state.target {
            state.phase = SpinPhase::Settling;
            log::debug!(
                "Landed on slot {} after {} rounds ({} ticks)",
                index,
                state.completed_rounds,
                state.ticks
            );
            return SpinStep::Tick {
                index,
                rotation,
                delay: tuning.settle_delay,
            };
        }

        state.current_index = (index + 1) % state.pool_length;
        if state.current_index == 0 {
            state.completed_rounds += 1;
        }

        if state.completed_rounds >= tuning.rounds_before_slowdown {
            state.speed_ms = state.speed_ms.saturating_add(tuning.speed_increment_ms);
            state.rotation_step *= tuning.rotation_decay;
        }

        log::trace!("Tick {} on slot {}, next in {} ms", state.ticks, index, state.speed_ms);
        SpinStep::Tick {
            index,
            rotation,
            delay: Duration::from_millis(state.speed_ms),
        }
    }
}
