//! Provider arbitration: strategies, the retrying arbitrator and its factory.

mod arbitrator;
mod factory;
pub mod strategy;

pub use arbitrator::{ArbitrationPhase, Arbitrator};
pub use factory::ArbitratorFactory;
pub use strategy::StrategyFunction;
