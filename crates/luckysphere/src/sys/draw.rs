use crate::sphere::{DrawOutcome, PrizeName, PrizeSpec};
use drawctl::DrawCode;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("Please enter a code")]
    EmptyCode,
    #[error("Invalid code or error occurred: {0}")]
    Failed(String),
    #[error("Code '{0}' has already been used")]
    AlreadyUsed(DrawCode),
    #[error("Invalid or unused code")]
    UnknownCode,
}

/// What the draw service remembers about a redeemed code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeVerification {
    pub is_winner: bool,
    #[serde(default)]
    pub prize_name: Option<PrizeName>,
    #[serde(default)]
    pub prize_description: Option<String>,
    #[serde(default)]
    pub prize_image: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Whoever decides the result of a code. Failures are reported, never retried here.
pub trait DrawService: Send + Sync + 'static {
    fn request_draw(
        &self,
        code: DrawCode,
    ) -> impl Future<Output = Result<DrawOutcome, DrawError>> + Send;

    /// Looks up a code that was already redeemed.
    fn verify_code(
        &self,
        code: DrawCode,
    ) -> impl Future<Output = Result<CodeVerification, DrawError>> + Send;

    fn catalog_changed(&self, _catalog: &[PrizeSpec]) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawSettings {
    pub latency_ms: u64,
    pub win_probability: f64,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            latency_ms: 500,
            win_probability: 1.0,
        }
    }
}

impl DrawSettings {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    fn clamped_probability(&self) -> f64 {
        if self.win_probability.is_nan() {
            0.0
        } else {
            self.win_probability.clamp(0.0, 1.0)
        }
    }
}

/// Offline stand-in for a real draw backend: waits a moment, then picks a random prize.
/// Each code can be redeemed once and verified afterwards.
pub struct SimulatedDraw {
    settings: DrawSettings,
    prizes: RwLock<Vec<PrizeSpec>>,
    redeemed: Mutex<HashMap<DrawCode, DrawOutcome>>,
    rng: Mutex<StdRng>,
}

impl SimulatedDraw {
    pub fn new(catalog: &[PrizeSpec], settings: DrawSettings) -> Self {
        Self::with_rng(catalog, settings, StdRng::from_entropy())
    }

    pub fn with_rng(catalog: &[PrizeSpec], settings: DrawSettings, rng: StdRng) -> Self {
        Self {
            settings,
            prizes: RwLock::new(catalog.to_vec()),
            redeemed: Mutex::new(HashMap::new()),
            rng: Mutex::new(rng),
        }
    }

    fn roll(&self) -> DrawOutcome {
        let prizes = self.prizes.read();
        let mut rng = self.rng.lock();

        let wins = !prizes.is_empty() && rng.gen_bool(self.settings.clamped_probability());
        if wins {
            let prize_id = prizes[rng.gen_range(0..prizes.len())].id.clone();
            DrawOutcome {
                message: Some("Congratulations! You've won a prize!".to_string()),
                ..DrawOutcome::winner(prize_id)
            }
        } else {
            DrawOutcome {
                message: Some("Better luck next time!".to_string()),
                ..DrawOutcome::no_win()
            }
        }
    }

    fn describe(&self, outcome: &DrawOutcome) -> CodeVerification {
        let prizes = self.prizes.read();
        let prize = outcome
            .prize_id
            .as_ref()
            .filter(|_| outcome.is_winner)
            .and_then(|id| prizes.iter().find(|p| p.id.matches(id)));

        let message = if outcome.is_winner {
            "Valid prize code"
        } else {
            "This code did not win a prize"
        };

        CodeVerification {
            is_winner: outcome.is_winner,
            prize_name: prize.map(|p| p.name.clone()),
            prize_description: prize
                .map(|p| p.description.clone())
                .filter(|d| !d.is_empty()),
            prize_image: prize.and_then(|p| p.image.clone()),
            message: Some(message.to_string()),
        }
    }
}

impl DrawService for SimulatedDraw {
    async fn request_draw(&self, code: DrawCode) -> Result<DrawOutcome, DrawError> {
        if code.is_blank() {
            return Err(DrawError::EmptyCode);
        }

        tokio::time::sleep(self.settings.latency()).await;

        let mut redeemed = self.redeemed.lock();
        if redeemed.contains_key(&code) {
            return Err(DrawError::AlreadyUsed(code));
        }

        let outcome = self.roll();
        log::debug!("Simulated draw for '{}': {:?}", code, outcome);
        redeemed.insert(code, outcome.clone());
        Ok(outcome)
    }

    async fn verify_code(&self, code: DrawCode) -> Result<CodeVerification, DrawError> {
        if code.is_blank() {
            return Err(DrawError::EmptyCode);
        }

        tokio::time::sleep(self.settings.latency()).await;

        let outcome = self.redeemed.lock().get(&code).cloned();
        outcome
            .map(|outcome| self.describe(&outcome))
            .ok_or(DrawError::UnknownCode)
    }

    fn catalog_changed(&self, catalog: &[PrizeSpec]) {
        *self.prizes.write() = catalog.to_vec();
    }
}
