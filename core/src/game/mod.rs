mod catalog;
mod config;
mod constants;
pub(crate) use constants::*;
mod eligibility;
mod error;
mod events;
mod ledger;
mod progress;
mod purchase;
mod save;
mod state;
mod time;

pub use catalog::{
    Catalog, EffectKind, RequirementTerm, ResourceCost, ResourceDefinition, ResourceEffect,
    Upgrade, UpgradeTree,
};
pub use config::{GameConfig, SessionConfig, TimeConfig};
pub use eligibility::{Availability, availability, blocking_requirements, is_available};
pub use error::GameError;
pub use events::{
    EventChoice, EventDeck, EventDefinition, EventTrigger, load_embedded_events,
    load_events_from_str,
};
pub use ledger::{ResourceLedger, ResourceOverview};
pub use progress::PlayerProgress;
pub use purchase::PurchaseReceipt;
pub use save::SaveData;
pub use state::{
    ExclusiveGroupInfo, ExclusiveOption, GameBuilder, GameState, GameStatistics, TreeProgress,
    UpgradeStatus,
};
pub use time::{ClockSettings, SimulationClock, TickChunk};
