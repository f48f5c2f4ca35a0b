use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::game::error::GameError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "ResourceDefinition::default_color")]
    pub color: [u8; 3],
    #[serde(default)]
    pub base_production: f64,
    #[serde(default)]
    pub min_value: f64,
}

impl ResourceDefinition {
    const fn default_color() -> [u8; 3] {
        [255, 255, 255]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceCost {
    pub resource: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Add,
    Mult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceEffect {
    pub resource: String,
    #[serde(rename = "effect")]
    pub kind: EffectKind,
    pub value: f64,
}

/// 前提条件の1項。並びは全体としてAND、`AnyOf` の内部のみOR。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequirementTerm {
    Id(String),
    AnyOf(Vec<String>),
}

impl RequirementTerm {
    pub fn is_satisfied(&self, owned: &BTreeSet<String>) -> bool {
        match self {
            RequirementTerm::Id(id) => owned.contains(id),
            RequirementTerm::AnyOf(alternatives) => {
                alternatives.iter().any(|id| owned.contains(id))
            }
        }
    }

    pub(crate) fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        match self {
            RequirementTerm::Id(id) => std::slice::from_ref(id).iter().map(String::as_str),
            RequirementTerm::AnyOf(alternatives) => {
                alternatives.as_slice().iter().map(String::as_str)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upgrade {
    pub id: String,
    pub tree: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tier: i32,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub cost: Vec<ResourceCost>,
    #[serde(default)]
    pub effects: Vec<ResourceEffect>,
    #[serde(default)]
    pub exclusive_group: Option<String>,
    #[serde(default)]
    pub requires: Vec<RequirementTerm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeTree {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(skip)]
    pub upgrade_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: HashMap<String, ResourceDefinition>,
    trees: HashMap<String, UpgradeTree>,
    upgrades: HashMap<String, Upgrade>,
}

impl Catalog {
    pub(crate) fn insert_resource(&mut self, definition: ResourceDefinition) -> Result<(), GameError> {
        if self.resources.contains_key(&definition.id) {
            return Err(GameError::MalformedCatalog {
                reason: format!("リソースIDが重複しています: {}", definition.id),
            });
        }
        self.resources.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub(crate) fn insert_tree(&mut self, tree: UpgradeTree) -> Result<(), GameError> {
        if self.trees.contains_key(&tree.id) {
            return Err(GameError::MalformedCatalog {
                reason: format!("ツリーIDが重複しています: {}", tree.id),
            });
        }
        self.trees.insert(tree.id.clone(), tree);
        Ok(())
    }

    pub(crate) fn insert_upgrade(&mut self, upgrade: Upgrade) -> Result<(), GameError> {
        if self.upgrades.contains_key(&upgrade.id) {
            return Err(GameError::MalformedCatalog {
                reason: format!("アップグレードIDが重複しています: {}", upgrade.id),
            });
        }
        if let Some(tree) = self.trees.get_mut(&upgrade.tree) {
            tree.upgrade_ids.push(upgrade.id.clone());
        }
        self.upgrades.insert(upgrade.id.clone(), upgrade);
        Ok(())
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceDefinition> {
        self.resources.get(id)
    }

    pub fn tree(&self, id: &str) -> Option<&UpgradeTree> {
        self.trees.get(id)
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.get(id)
    }

    pub fn require_upgrade(&self, id: &str) -> Result<&Upgrade, GameError> {
        self.upgrades.get(id).ok_or_else(|| GameError::UnknownUpgrade { id: id.to_string() })
    }

    pub fn require_resource(&self, id: &str) -> Result<&ResourceDefinition, GameError> {
        self.resources.get(id).ok_or_else(|| GameError::UnknownResource { id: id.to_string() })
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.resources.values()
    }

    pub fn trees(&self) -> impl Iterator<Item = &UpgradeTree> {
        self.trees.values()
    }

    pub fn upgrades(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.values()
    }

    pub fn upgrade_count(&self) -> usize {
        self.upgrades.len()
    }

    pub fn sorted_tree_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.trees.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn sorted_upgrade_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.upgrades.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn upgrades_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Upgrade> {
        self.upgrades
            .values()
            .filter(move |upgrade| upgrade.exclusive_group.as_deref() == Some(group))
    }

    pub(crate) fn validate_references(&self) -> Result<(), GameError> {
        for upgrade in self.upgrades.values() {
            if !self.trees.contains_key(&upgrade.tree) {
                return Err(GameError::MalformedCatalog {
                    reason: format!(
                        "アップグレード {} が未定義のツリーを参照しています: {}",
                        upgrade.id, upgrade.tree
                    ),
                });
            }
            if upgrade.tier < 0 {
                return Err(GameError::MalformedCatalog {
                    reason: format!("アップグレード {} のtierが負です: {}", upgrade.id, upgrade.tier),
                });
            }
            for cost in &upgrade.cost {
                if !self.resources.contains_key(&cost.resource) {
                    return Err(GameError::MalformedCatalog {
                        reason: format!(
                            "アップグレード {} のコストが未定義のリソースを参照しています: {}",
                            upgrade.id, cost.resource
                        ),
                    });
                }
                if !cost.amount.is_finite() || cost.amount < 0.0 {
                    return Err(GameError::MalformedCatalog {
                        reason: format!(
                            "アップグレード {} のコストが不正です: {} ({})",
                            upgrade.id, cost.resource, cost.amount
                        ),
                    });
                }
            }
            for effect in &upgrade.effects {
                if !self.resources.contains_key(&effect.resource) {
                    return Err(GameError::MalformedCatalog {
                        reason: format!(
                            "アップグレード {} の効果が未定義のリソースを参照しています: {}",
                            upgrade.id, effect.resource
                        ),
                    });
                }
                if !effect.value.is_finite() {
                    return Err(GameError::MalformedCatalog {
                        reason: format!(
                            "アップグレード {} の効果値が不正です: {}",
                            upgrade.id, effect.resource
                        ),
                    });
                }
            }
            for term in &upgrade.requires {
                if let RequirementTerm::AnyOf(alternatives) = term {
                    if alternatives.is_empty() {
                        return Err(GameError::MalformedCatalog {
                            reason: format!(
                                "アップグレード {} に空のOR条件があります",
                                upgrade.id
                            ),
                        });
                    }
                }
                for referenced in term.referenced_ids() {
                    if !self.upgrades.contains_key(referenced) {
                        return Err(GameError::MalformedCatalog {
                            reason: format!(
                                "アップグレード {} の前提が未定義のIDを参照しています: {}",
                                upgrade.id, referenced
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
