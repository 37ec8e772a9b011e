// Scenario Definitions — cashout strategies across house edges
// Each scenario plays full rounds through the engine tick loop

use crash_engine::crash_point;

// ─── Strategy ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Standing auto-cashout target.
    Auto(f64),
    /// Call `cash_out()` on the first frame at or above the threshold.
    Manual(f64),
    /// Auto-cashout with a target drawn uniformly from `[lo, hi)` each round.
    RandomAuto { lo: f64, hi: f64 },
    /// Never cash out.
    Hold,
}

impl Strategy {
    /// Expected RTP when the strategy settles at a fixed target.
    pub fn theoretical_rtp(&self, house_edge: f64) -> Option<f64> {
        match *self {
            Strategy::Auto(target) => Some(crash_point::theoretical_rtp(house_edge, target)),
            Strategy::Hold => Some(0.0),
            Strategy::Manual(_) | Strategy::RandomAuto { .. } => None,
        }
    }
}

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub house_edge: f64,
    pub rounds: u64,
    pub stake: u64,
    pub frame_ms: f64,
    pub max_round_duration_ms: f64,
    pub strategy: Strategy,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    /// Largest |empirical - theoretical| RTP, in standard errors.
    pub max_rtp_z: f64,
    /// Largest |empirical - theoretical| survival probability, in standard errors.
    pub max_tail_z: f64,
    pub require_conservation: bool,
    /// Upper bound on rounds that crash at exactly 1.00x.
    pub max_instant_crashes: Option<u64>,
    /// At least one round must hit the safety cap.
    pub expect_timeouts: bool,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            max_rtp_z: 4.0,
            max_tail_z: 4.5,
            require_conservation: true,
            max_instant_crashes: None,
            expect_timeouts: false,
        }
    }
}

const DEFAULT_ROUNDS: u64 = 5_000;
const FRAME_MS: f64 = 50.0;
const MAX_ROUND_MS: f64 = 6_000_000.0;

fn base(
    name: &'static str,
    label: &'static str,
    category: &'static str,
    house_edge: f64,
    strategy: Strategy,
) -> Scenario {
    Scenario {
        name,
        label,
        category,
        house_edge,
        rounds: DEFAULT_ROUNDS,
        stake: 100,
        frame_ms: FRAME_MS,
        max_round_duration_ms: MAX_ROUND_MS,
        strategy,
        criteria: PassCriteria::default(),
    }
}

// ─── Scenario List ──────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    let mut list = vec![
        base("AUTO_1_5X_EDGE_1", "Auto 1.50x / edge 1%", "auto", 1.0, Strategy::Auto(1.5)),
        base("AUTO_2X_EDGE_1", "Auto 2.00x / edge 1%", "auto", 1.0, Strategy::Auto(2.0)),
        base("AUTO_10X_EDGE_1", "Auto 10.00x / edge 1%", "auto", 1.0, Strategy::Auto(10.0)),
        base("AUTO_2X_EDGE_5", "Auto 2.00x / edge 5%", "auto", 5.0, Strategy::Auto(2.0)),
        base("AUTO_MIN_EDGE_5", "Auto 1.01x / edge 5%", "auto", 5.0, Strategy::Auto(1.01)),
        base("MANUAL_2X_EDGE_1", "Manual 2.00x / edge 1%", "manual", 1.0, Strategy::Manual(2.0)),
        base(
            "RANDOM_AUTO_EDGE_3",
            "Random auto 1.1-5x / edge 3%",
            "auto",
            3.0,
            Strategy::RandomAuto { lo: 1.1, hi: 5.0 },
        ),
        base("HOLD_EDGE_1", "Hold to crash / edge 1%", "hold", 1.0, Strategy::Hold),
    ];

    // Coarse frames must not change settlement
    let mut coarse = base(
        "AUTO_2X_COARSE_FRAMES",
        "Auto 2.00x / 1s frames",
        "arbitration",
        1.0,
        Strategy::Auto(2.0),
    );
    coarse.frame_ms = 1_000.0;
    list.push(coarse);

    // Tight safety cap: long rounds end by timeout, never hang
    let mut capped = base(
        "HOLD_SAFETY_CAP",
        "Hold / 20s safety cap",
        "termination",
        1.0,
        Strategy::Hold,
    );
    capped.max_round_duration_ms = 20_000.0;
    capped.criteria.expect_timeouts = true;
    list.push(capped);

    let mut zero_edge = base(
        "AUTO_2X_EDGE_0",
        "Auto 2.00x / edge 0%",
        "auto",
        0.0,
        Strategy::Auto(2.0),
    );
    // No instant crashes without an edge
    zero_edge.criteria.max_instant_crashes = Some(0);
    list.push(zero_edge);

    list
}
