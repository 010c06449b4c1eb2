use std::f64::consts::PI;

pub mod layout;
pub mod pool;
pub mod profile;
pub mod resolver;
pub mod spin;

pub use layout::{CardPlacement, SpherePosition, SphereRotation, place_cards, positions};
pub use pool::{DisplayId, ExpandError, PoolEntry, PrizeColor, PrizeId, PrizeName, PrizeSpec, expand};
pub use profile::{DeviceProfile, DisplayMode, ProfileError, ProfileOverrides, SpinTuning};
pub use resolver::{DrawOutcome, Resolution, ResolveError, resolve};
pub use spin::{SpinEngine, SpinError, SpinPhase, SpinState, SpinStep};

pub const GOLDEN_ANGLE: f64 = PI * 0.763_932_022_500_210_3; // π(3 − √5)
pub const DEGREES_PER_TURN: f64 = 360.0;
pub const SPIN_Y_RATIO: f64 = 0.8; // y-axis turn per tick relative to x
