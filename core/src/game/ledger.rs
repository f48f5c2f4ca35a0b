use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::STARTING_STOCK_SECONDS;
use super::catalog::{Catalog, EffectKind, ResourceCost, ResourceDefinition, ResourceEffect};
use super::error::GameError;

#[derive(Debug, Clone)]
struct ResourceEntry {
    definition: ResourceDefinition,
    current_value: f64,
    additive_bonus: f64,
    production_multiplier: f64,
}

impl ResourceEntry {
    fn new(definition: ResourceDefinition) -> Self {
        let seeded = (definition.base_production * STARTING_STOCK_SECONDS).max(definition.min_value);
        Self {
            definition,
            current_value: seeded,
            additive_bonus: 0.0,
            production_multiplier: 1.0,
        }
    }

    /// 固定の評価順: 加算ボーナスを合算してから倍率を掛ける。
    fn production_rate(&self) -> f64 {
        (self.definition.base_production + self.additive_bonus) * self.production_multiplier
    }

    fn advance(&mut self, elapsed: f64) {
        self.current_value += self.production_rate() * elapsed;
        self.clamp_to_floor();
    }

    fn clamp_to_floor(&mut self) {
        if self.current_value < self.definition.min_value {
            self.current_value = self.definition.min_value;
        }
    }

    fn reset_modifiers(&mut self) {
        self.additive_bonus = 0.0;
        self.production_multiplier = 1.0;
    }

    fn fold_effect(&mut self, effect: &ResourceEffect) {
        match effect.kind {
            EffectKind::Add => self.additive_bonus += effect.value,
            EffectKind::Mult => self.production_multiplier *= effect.value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceOverview {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub current_value: f64,
    pub production_rate: f64,
}

#[derive(Debug, Clone)]
pub struct ResourceLedger {
    entries: HashMap<String, ResourceEntry>,
}

impl ResourceLedger {
    pub(crate) fn from_catalog(catalog: &Catalog) -> Self {
        let mut entries = HashMap::new();
        for definition in catalog.resources() {
            entries.insert(definition.id.clone(), ResourceEntry::new(definition.clone()));
        }
        Self { entries }
    }

    fn entry(&self, id: &str) -> Result<&ResourceEntry, GameError> {
        self.entries
            .get(id)
            .ok_or_else(|| GameError::UnknownResource { id: id.to_string() })
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut ResourceEntry, GameError> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownResource { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn value(&self, id: &str) -> Result<f64, GameError> {
        Ok(self.entry(id)?.current_value)
    }

    pub fn production_rate(&self, id: &str) -> Result<f64, GameError> {
        Ok(self.entry(id)?.production_rate())
    }

    pub fn advance(&mut self, elapsed: f64) {
        for entry in self.entries.values_mut() {
            entry.advance(elapsed);
        }
    }

    /// 所有集合から毎回ゼロから畳み込む。差分更新は行わない。
    pub fn recompute_modifiers(
        &mut self,
        owned: &BTreeSet<String>,
        catalog: &Catalog,
    ) -> Result<(), GameError> {
        for entry in self.entries.values_mut() {
            entry.reset_modifiers();
        }
        for upgrade_id in owned {
            let upgrade = catalog.require_upgrade(upgrade_id)?;
            for effect in &upgrade.effects {
                self.entry_mut(&effect.resource)?.fold_effect(effect);
            }
        }
        Ok(())
    }

    pub fn spend(&mut self, id: &str, amount: f64) -> Result<(), GameError> {
        let entry = self.entry_mut(id)?;
        if entry.current_value < amount {
            return Err(GameError::InsufficientResource {
                resource: id.to_string(),
                required: amount,
                available: entry.current_value,
            });
        }
        entry.current_value -= amount;
        Ok(())
    }

    /// コスト列の先頭から見て最初に不足するものを返す。
    pub fn first_shortfall(&self, costs: &[ResourceCost]) -> Option<GameError> {
        for cost in costs {
            match self.entries.get(&cost.resource) {
                None => {
                    return Some(GameError::UnknownResource {
                        id: cost.resource.clone(),
                    });
                }
                Some(entry) if entry.current_value < cost.amount => {
                    return Some(GameError::InsufficientResource {
                        resource: cost.resource.clone(),
                        required: cost.amount,
                        available: entry.current_value,
                    });
                }
                Some(_) => {}
            }
        }
        None
    }

    pub fn can_afford(&self, costs: &[ResourceCost]) -> bool {
        self.first_shortfall(costs).is_none()
    }

    /// 全コストを検証してから一括で引き落とす。検証後の引き落としは再判定しない。
    pub fn pay(&mut self, costs: &[ResourceCost]) -> Result<(), GameError> {
        if let Some(error) = self.first_shortfall(costs) {
            return Err(error);
        }
        for cost in costs {
            if let Some(entry) = self.entries.get_mut(&cost.resource) {
                entry.current_value -= cost.amount;
            }
        }
        Ok(())
    }

    /// イベント選択などの一度きりの増減。生産モディファイアには一切触れない。
    pub fn apply_instant(&mut self, effect: &ResourceEffect) -> Result<(), GameError> {
        let entry = self.entry_mut(&effect.resource)?;
        match effect.kind {
            EffectKind::Add => entry.current_value += effect.value,
            EffectKind::Mult => entry.current_value *= effect.value,
        }
        entry.clamp_to_floor();
        Ok(())
    }

    pub(crate) fn set_value(&mut self, id: &str, value: f64) -> Result<(), GameError> {
        let entry = self.entry_mut(id)?;
        entry.current_value = value;
        entry.clamp_to_floor();
        Ok(())
    }

    pub(crate) fn stays_above_floor_after(&self, elapsed: f64) -> bool {
        self.entries.values().all(|entry| {
            entry.current_value + entry.production_rate() * elapsed >= entry.definition.min_value
        })
    }

    pub(crate) fn reset_to_start(&mut self) {
        for entry in self.entries.values_mut() {
            let definition = entry.definition.clone();
            *entry = ResourceEntry::new(definition);
        }
    }

    pub fn values(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.current_value))
            .collect()
    }

    pub fn overview(&self) -> Vec<ResourceOverview> {
        let mut rows: Vec<ResourceOverview> = self
            .entries
            .values()
            .map(|entry| ResourceOverview {
                id: entry.definition.id.clone(),
                name: entry.definition.name.clone(),
                icon: entry.definition.icon.clone(),
                current_value: entry.current_value,
                production_rate: entry.production_rate(),
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }
}
