use std::collections::{BTreeMap, BTreeSet};

use super::catalog::Upgrade;

/// 所有済みアップグレードと排他グループの選択状況。セッション内では増えるのみ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerProgress {
    owned: BTreeSet<String>,
    selected_exclusive: BTreeMap<String, String>,
}

impl PlayerProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owns(&self, upgrade_id: &str) -> bool {
        self.owned.contains(upgrade_id)
    }

    pub fn owned(&self) -> &BTreeSet<String> {
        &self.owned
    }

    pub fn owned_count(&self) -> usize {
        self.owned.len()
    }

    pub fn selected_exclusive(&self) -> &BTreeMap<String, String> {
        &self.selected_exclusive
    }

    pub fn chosen_in_group(&self, group: &str) -> Option<&str> {
        self.selected_exclusive.get(group).map(String::as_str)
    }

    pub(crate) fn record(&mut self, upgrade: &Upgrade) {
        self.owned.insert(upgrade.id.clone());
        if let Some(group) = &upgrade.exclusive_group {
            self.selected_exclusive
                .insert(group.clone(), upgrade.id.clone());
        }
    }

    pub(crate) fn restore(
        owned: BTreeSet<String>,
        selected_exclusive: BTreeMap<String, String>,
    ) -> Self {
        Self {
            owned,
            selected_exclusive,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.owned.clear();
        self.selected_exclusive.clear();
    }
}
