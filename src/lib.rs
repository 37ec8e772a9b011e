// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine

pub mod types;
pub mod error;
pub mod config;
pub mod random;
pub mod crash_point;
pub mod clock;
pub mod ledger;
pub mod auto_cashout;
pub mod history;
pub mod display;
pub mod engine;

pub use types::*;
pub use error::{CashoutRejection, ConfigError, EngineError, StakeRejection, WalletError};
pub use config::EngineConfig;
pub use random::{ChaChaSource, RandomSource, ScriptedSource};
pub use clock::MultiplierClock;
pub use ledger::{LocalWallet, SessionStats, Wallet};
pub use auto_cashout::AutoCashoutConfig;
pub use history::{HistoryEntry, HistoryLog};
pub use display::{DisplayParams, DisplaySmoother};
pub use engine::CrashEngine;

use serde::Serialize;
use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser-facing table: a [`CrashEngine`] with a seeded ChaCha source and an
/// in-memory wallet. Call `tick(performance.now())` once per animation frame.
#[wasm_bindgen]
pub struct CrashTable {
    engine: CrashEngine<ChaChaSource, LocalWallet>,
}

/// Reply shape for actions that can be rejected.
#[derive(Serialize)]
struct Reply<T: Serialize> {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<EngineError>,
}

impl<T: Serialize> From<Result<T, EngineError>> for Reply<T> {
    fn from(result: Result<T, EngineError>) -> Self {
        match result {
            Ok(value) => Self { accepted: true, value: Some(value), reason: None },
            Err(reason) => Self { accepted: false, value: None, reason: Some(reason) },
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

/// Largest integer a JS number holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A JS number as a whole, non-negative count of units.
fn whole_units(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > MAX_SAFE_INTEGER {
        return None;
    }
    Some(value as u64)
}

fn units_arg(name: &str, value: f64) -> Result<u64, JsValue> {
    whole_units(value).ok_or_else(|| {
        JsValue::from_str(&format!("{} must be a whole number in [0, 2^53), got {}", name, value))
    })
}

#[wasm_bindgen]
impl CrashTable {
    /// `seed` and `balance` are plain JS numbers holding whole values.
    /// `config` may be `undefined` or a partial `EngineConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64, balance: f64, config: JsValue) -> Result<CrashTable, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let seed = units_arg("seed", seed)?;
        let balance = units_arg("balance", balance)?;

        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let engine = CrashEngine::new(config, ChaChaSource::seeded(seed), LocalWallet::new(balance))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { engine })
    }

    pub fn place_bet(&mut self, stake: f64) -> JsValue {
        to_js(&Reply::from(self.engine.place_bet_f64(stake)))
    }

    pub fn configure_auto_cashout(&mut self, target: f64) -> bool {
        self.engine.configure_auto_cashout(target).is_ok()
    }

    pub fn enable_auto_cashout(&mut self) -> bool {
        self.engine.enable_auto_cashout().is_ok()
    }

    pub fn disable_auto_cashout(&mut self) -> bool {
        self.engine.disable_auto_cashout().is_ok()
    }

    pub fn cash_out(&mut self) -> JsValue {
        to_js(&Reply::from(self.engine.cash_out()))
    }

    pub fn cash_out_at(&mut self, now_ms: f64) -> JsValue {
        to_js(&Reply::from(self.engine.cash_out_at(now_ms)))
    }

    /// Returns the round outcome on the frame the round ends, else `null`.
    pub fn tick(&mut self, now_ms: f64) -> JsValue {
        match self.engine.tick(now_ms) {
            Some(outcome) => to_js(&outcome),
            None => JsValue::NULL,
        }
    }

    pub fn force_end(&mut self) -> JsValue {
        match self.engine.force_end() {
            Some(outcome) => to_js(&outcome),
            None => JsValue::NULL,
        }
    }

    pub fn reset_round(&mut self) {
        self.engine.reset_round();
    }

    pub fn get_state(&self) -> JsValue {
        to_js(&self.engine.snapshot())
    }

    pub fn get_history(&self) -> JsValue {
        to_js(&self.engine.history().to_vec())
    }

    pub fn get_stats(&self) -> JsValue {
        to_js(self.engine.stats())
    }

    pub fn balance(&self) -> f64 {
        self.engine.wallet().balance() as f64
    }

    /// Returns false, leaving the balance unchanged, unless `amount` is a
    /// whole non-negative number.
    pub fn deposit(&mut self, amount: f64) -> bool {
        match whole_units(amount) {
            Some(units) => {
                self.engine.wallet_mut().deposit(units);
                true
            }
            None => false,
        }
    }
}

/// Presentation-only multiplier for drawing; fed from `get_state()`.
#[wasm_bindgen]
pub struct MultiplierDisplay {
    inner: DisplaySmoother<ChaChaSource>,
}

#[wasm_bindgen]
impl MultiplierDisplay {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64) -> Result<MultiplierDisplay, JsValue> {
        let seed = units_arg("seed", seed)?;
        Ok(Self { inner: DisplaySmoother::new(DisplayParams::default(), ChaChaSource::seeded(seed)) })
    }

    pub fn update(&mut self, true_multiplier: f64, dt_secs: f64) -> f64 {
        self.inner.update(true_multiplier, dt_secs)
    }

    pub fn settle(&mut self, final_multiplier: f64) -> f64 {
        self.inner.settle(final_multiplier)
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}
