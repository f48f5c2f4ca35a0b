mod loader;
mod model;

pub use model::{
    Catalog, EffectKind, RequirementTerm, ResourceCost, ResourceDefinition, ResourceEffect,
    Upgrade, UpgradeTree,
};
