mod game;

pub use game::{
    Availability, Catalog, ClockSettings, EffectKind, EventChoice, EventDeck, EventDefinition,
    EventTrigger, ExclusiveGroupInfo, ExclusiveOption, GameBuilder, GameConfig, GameError,
    GameState, GameStatistics, PlayerProgress, PurchaseReceipt, RequirementTerm, ResourceCost,
    ResourceDefinition, ResourceEffect, ResourceLedger, ResourceOverview, SaveData, SessionConfig,
    SimulationClock, TickChunk, TimeConfig, TreeProgress, Upgrade, UpgradeStatus, UpgradeTree,
    availability, blocking_requirements, is_available, load_embedded_events, load_events_from_str,
};
