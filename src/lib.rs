pub mod cards;
pub mod cfr;
pub mod error;
pub mod estimation;
pub mod evaluation;
pub mod game;
pub mod portfolio;
pub mod response;
pub mod sampling;
pub mod save;
pub mod tree;

/// dimensional analysis types
pub type Chips = i32;
pub type Utility = f64;
pub type Probability = f64;

/// fold, call, raise
pub const NUM_ACTIONS: usize = 3;

/// the hand evaluator scores at most five cards
pub const MAX_EVALUATED_CARDS: usize = 5;

// cfr+ parameters
pub const WEIGHT_DELAY: usize = 700;

// data-biased response parameters
pub const DBR_CONFIDENCE_SAMPLES: u64 = 10;

// bandit parameters
pub const EXP3G_GAMMA: f64 = 0.02;
pub const EXP3G_ETA: f64 = 0.025;

// floating point tolerances
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;
pub const VALUE_TOLERANCE: f64 = 1e-9;

/// initialize terminal logging. safe to call more than once,
/// later calls are no-ops so tests can race on it.
pub fn init() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .ok();
}
