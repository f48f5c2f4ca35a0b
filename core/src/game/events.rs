use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, ResourceCost, ResourceEffect};
use super::error::GameError;
use super::ledger::ResourceLedger;
use super::progress::PlayerProgress;

const EMBEDDED_EVENTS: &str = include_str!("../../../config/events.yaml");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EventTrigger {
    Year(i32),
    Upgrades(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventChoice {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: Vec<ResourceCost>,
    #[serde(default)]
    pub effects: Vec<ResourceEffect>,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub trigger: EventTrigger,
    #[serde(default)]
    pub choices: Vec<EventChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventFile {
    #[serde(default)]
    events: Vec<EventDefinition>,
}

pub fn load_embedded_events() -> Result<Vec<EventDefinition>, GameError> {
    load_events_from_str(EMBEDDED_EVENTS)
}

pub fn load_events_from_str(content: &str) -> Result<Vec<EventDefinition>, GameError> {
    let file: EventFile =
        serde_yaml::from_str(content).map_err(|error| GameError::MalformedCatalog {
            reason: format!("events: {error}"),
        })?;
    Ok(file.events)
}

/// 意思決定イベントの山札。同時に処理待ちにできるのは1件、発火は各イベント1回限り。
#[derive(Debug, Clone, Default)]
pub struct EventDeck {
    events: Vec<EventDefinition>,
    triggered: BTreeSet<String>,
    pending: Option<usize>,
}

impl EventDeck {
    pub fn new(events: Vec<EventDefinition>) -> Self {
        Self {
            events,
            triggered: BTreeSet::new(),
            pending: None,
        }
    }

    pub(crate) fn validate(&self, catalog: &Catalog) -> Result<(), GameError> {
        let mut seen = BTreeSet::new();
        for event in &self.events {
            if !seen.insert(event.id.as_str()) {
                return Err(GameError::MalformedCatalog {
                    reason: format!("イベントIDが重複しています: {}", event.id),
                });
            }
            match &event.trigger {
                EventTrigger::Year(_) => {}
                EventTrigger::Upgrades(ids) => {
                    if ids.is_empty() {
                        return Err(GameError::MalformedCatalog {
                            reason: format!("イベント {} の発火条件が空です", event.id),
                        });
                    }
                    for id in ids {
                        catalog.require_upgrade(id).map_err(|_| {
                            GameError::MalformedCatalog {
                                reason: format!(
                                    "イベント {} の発火条件が未定義のアップグレードを参照しています: {id}",
                                    event.id
                                ),
                            }
                        })?;
                    }
                }
            }
            let mut choice_ids = BTreeSet::new();
            for choice in &event.choices {
                if !choice_ids.insert(choice.id.as_str()) {
                    return Err(GameError::MalformedCatalog {
                        reason: format!(
                            "イベント {} の選択肢IDが重複しています: {}",
                            event.id, choice.id
                        ),
                    });
                }
                for cost in &choice.cost {
                    catalog.require_resource(&cost.resource).map_err(|_| {
                        GameError::MalformedCatalog {
                            reason: format!(
                                "イベント {} のコストが未定義のリソースを参照しています: {}",
                                event.id, cost.resource
                            ),
                        }
                    })?;
                }
                for effect in &choice.effects {
                    catalog.require_resource(&effect.resource).map_err(|_| {
                        GameError::MalformedCatalog {
                            reason: format!(
                                "イベント {} の効果が未定義のリソースを参照しています: {}",
                                event.id, effect.resource
                            ),
                        }
                    })?;
                }
                for required in &choice.requires {
                    catalog.require_upgrade(required).map_err(|_| {
                        GameError::MalformedCatalog {
                            reason: format!(
                                "イベント {} の選択肢前提が未定義のアップグレードを参照しています: {required}",
                                event.id
                            ),
                        }
                    })?;
                }
            }
        }
        Ok(())
    }

    pub fn pending(&self) -> Option<&EventDefinition> {
        self.pending.and_then(|idx| self.events.get(idx))
    }

    /// 処理待ちがなければ未発火イベントを条件判定し、最初に合致した1件を保留にする。
    pub(crate) fn check_triggers(
        &mut self,
        current_year: i32,
        progress: &PlayerProgress,
    ) -> Option<&EventDefinition> {
        if self.pending.is_some() {
            return None;
        }
        let idx = self.events.iter().position(|event| {
            if self.triggered.contains(&event.id) {
                return false;
            }
            match &event.trigger {
                EventTrigger::Year(year) => current_year >= *year,
                EventTrigger::Upgrades(ids) => ids.iter().all(|id| progress.owns(id)),
            }
        })?;
        self.triggered.insert(self.events[idx].id.clone());
        self.pending = Some(idx);
        self.events.get(idx)
    }

    pub(crate) fn resolve_choice(
        &mut self,
        choice_id: &str,
        progress: &PlayerProgress,
        ledger: &mut ResourceLedger,
    ) -> Result<String, GameError> {
        let idx = self.pending.ok_or_else(|| GameError::NotEligible {
            id: choice_id.to_string(),
            reason: "処理待ちのイベントがありません".to_string(),
        })?;
        let event = &self.events[idx];
        let choice = event
            .choices
            .iter()
            .find(|choice| choice.id == choice_id)
            .ok_or_else(|| GameError::NotEligible {
                id: choice_id.to_string(),
                reason: format!("イベント {} にその選択肢はありません", event.id),
            })?;

        for required in &choice.requires {
            if !progress.owns(required) {
                return Err(GameError::NotEligible {
                    id: choice.id.clone(),
                    reason: format!("前提が未取得です: {required}"),
                });
            }
        }
        ledger.pay(&choice.cost)?;
        for effect in &choice.effects {
            ledger.apply_instant(effect)?;
        }
        let report = format!(
            "イベント「{}」: {} を選択しました。",
            event.title, choice.text
        );
        self.pending = None;
        Ok(report)
    }

    pub(crate) fn triggered_ids(&self) -> &BTreeSet<String> {
        &self.triggered
    }

    pub(crate) fn restore_triggered(&mut self, ids: BTreeSet<String>) {
        self.triggered = ids;
        self.pending = None;
    }

    pub(crate) fn reset(&mut self) {
        self.triggered.clear();
        self.pending = None;
    }
}
