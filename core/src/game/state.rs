use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;

use super::SAVE_VERSION;
use super::catalog::Catalog;
use super::config::GameConfig;
use super::eligibility::{self, Availability};
use super::error::GameError;
use super::events::{self, EventDeck, EventDefinition};
use super::ledger::{ResourceLedger, ResourceOverview};
use super::progress::PlayerProgress;
use super::purchase::{self, PurchaseReceipt};
use super::save::SaveData;
use super::time::SimulationClock;

pub struct GameBuilder {
    catalog: Catalog,
    config: GameConfig,
    events: Vec<EventDefinition>,
}

impl GameBuilder {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            config: GameConfig::default(),
            events: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_events(mut self, events: Vec<EventDefinition>) -> Self {
        self.events = events;
        self
    }

    pub fn build(self) -> Result<GameState, GameError> {
        let deck = EventDeck::new(self.events);
        deck.validate(&self.catalog)?;
        let ledger = ResourceLedger::from_catalog(&self.catalog);
        let clock = SimulationClock::new(self.config.clock_settings());
        Ok(GameState {
            catalog: self.catalog,
            ledger,
            progress: PlayerProgress::new(),
            clock,
            events: deck,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeStatus {
    pub availability: Availability,
    pub affordable: bool,
}

#[derive(Debug, Clone)]
pub struct TreeProgress {
    pub tree_id: String,
    pub tree_name: String,
    pub total: usize,
    pub owned: usize,
}

impl TreeProgress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.owned as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameStatistics {
    pub current_year: i32,
    pub total_upgrades: usize,
    pub owned_upgrades: usize,
    pub available_upgrades: usize,
    pub completion_percentage: f64,
    pub trees: Vec<TreeProgress>,
    pub next_unlock_year: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct ExclusiveOption {
    pub id: String,
    pub name: String,
    pub owned: bool,
}

#[derive(Debug, Clone)]
pub struct ExclusiveGroupInfo {
    pub group: String,
    pub chosen: Option<String>,
    pub options: Vec<ExclusiveOption>,
}

/// セッション全体のオーケストレーター。1ティックは
/// 時間・生産の前進 → 年越え通知 → イベント判定の固定順で進み、
/// 購入はティック間にのみ発生する。
pub struct GameState {
    catalog: Catalog,
    ledger: ResourceLedger,
    progress: PlayerProgress,
    clock: SimulationClock,
    events: EventDeck,
}

impl GameState {
    pub fn builder(catalog: Catalog) -> GameBuilder {
        GameBuilder::new(catalog)
    }

    pub fn from_embedded() -> Result<Self> {
        let catalog = Catalog::from_embedded()?;
        let config = GameConfig::from_embedded()?;
        let events = events::load_embedded_events()?;
        let state = GameBuilder::new(catalog)
            .with_config(config)
            .with_events(events)
            .build()?;
        Ok(state)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn progress(&self) -> &PlayerProgress {
        &self.progress
    }

    pub fn current_year(&self) -> i32 {
        self.clock.current_year()
    }

    pub fn year_progress_percent(&self) -> f64 {
        self.clock.year_progress_percent()
    }

    pub fn time_multiplier(&self) -> f64 {
        self.clock.time_multiplier()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.clock.toggle_pause()
    }

    pub fn set_speed(&mut self, multiplier: f64) -> Result<f64, GameError> {
        self.clock.set_speed(multiplier)
    }

    pub fn resource_value(&self, id: &str) -> Result<f64, GameError> {
        self.ledger.value(id)
    }

    pub fn production_rate(&self, id: &str) -> Result<f64, GameError> {
        self.ledger.production_rate(id)
    }

    pub fn resource_overview(&self) -> Vec<ResourceOverview> {
        self.ledger.overview()
    }

    pub fn availability_of(&self, upgrade_id: &str) -> Result<Availability, GameError> {
        let upgrade = self.catalog.require_upgrade(upgrade_id)?;
        Ok(eligibility::availability(
            upgrade,
            &self.progress,
            self.clock.current_year(),
        ))
    }

    pub fn is_upgrade_available(&self, upgrade_id: &str) -> Result<bool, GameError> {
        Ok(self.availability_of(upgrade_id)?.is_available())
    }

    pub fn upgrade_status(&self, upgrade_id: &str) -> Result<UpgradeStatus, GameError> {
        let upgrade = self.catalog.require_upgrade(upgrade_id)?;
        Ok(UpgradeStatus {
            availability: eligibility::availability(
                upgrade,
                &self.progress,
                self.clock.current_year(),
            ),
            affordable: self.ledger.can_afford(&upgrade.cost),
        })
    }

    pub fn available_upgrade_ids(&self) -> Vec<String> {
        let current_year = self.clock.current_year();
        let mut ids: Vec<String> = self
            .catalog
            .upgrades()
            .filter(|upgrade| eligibility::is_available(upgrade, &self.progress, current_year))
            .map(|upgrade| upgrade.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn pending_event(&self) -> Option<&EventDefinition> {
        self.events.pending()
    }

    /// 1ティック: 時計をチャンクに割り、チャンクごとに台帳を前進させる。
    /// 年越えは解禁通知を添えて報告し、最後にイベント発火を判定する。
    pub fn tick_seconds(&mut self, seconds: f64) -> Result<Vec<String>, GameError> {
        let chunks = self.clock.advance(seconds)?;
        let mut reports = Vec::new();
        for chunk in &chunks {
            self.ledger.advance(chunk.seconds);
            for year in &chunk.crossed_years {
                reports.push(format!("{year}年になりました。"));
                let unlocked = self.unlock_names_for_year(*year);
                if !unlocked.is_empty() {
                    reports.push(format!("新たに解禁: {}", unlocked.join("、")));
                }
            }
        }
        if let Some(event) = self
            .events
            .check_triggers(self.clock.current_year(), &self.progress)
        {
            reports.push(format!("イベント発生: {}", event.title));
        }
        Ok(reports)
    }

    pub fn purchase(&mut self, upgrade_id: &str) -> Result<PurchaseReceipt, GameError> {
        purchase::execute(
            upgrade_id,
            &self.catalog,
            &mut self.progress,
            &mut self.ledger,
            self.clock.current_year(),
        )
    }

    pub fn resolve_event_choice(&mut self, choice_id: &str) -> Result<String, GameError> {
        self.events
            .resolve_choice(choice_id, &self.progress, &mut self.ledger)
    }

    pub fn can_skip_to_year(&self, target_year: i32) -> bool {
        if target_year <= self.clock.current_year() {
            return false;
        }
        let years = (target_year - self.clock.current_year()) as f64;
        self.ledger
            .stays_above_floor_after(years * self.clock.seconds_per_year())
    }

    /// 現在の生産率のまま目標年まで一括前進する。どこかのリソースが
    /// 下限を割る見込みなら何もしない。
    pub fn skip_to_year(&mut self, target_year: i32) -> Result<Vec<String>, GameError> {
        if !self.can_skip_to_year(target_year) {
            return Err(GameError::SkipUnavailable { year: target_year });
        }
        let from_year = self.clock.current_year();
        let years = (target_year - from_year) as f64;
        self.ledger.advance(years * self.clock.seconds_per_year());
        self.clock.set_year(target_year);

        let mut reports = vec![format!("{target_year}年まで時間を進めました。")];
        for year in (from_year + 1)..=target_year {
            let unlocked = self.unlock_names_for_year(year);
            if !unlocked.is_empty() {
                reports.push(format!("{year}年の解禁: {}", unlocked.join("、")));
            }
        }
        if let Some(event) = self
            .events
            .check_triggers(self.clock.current_year(), &self.progress)
        {
            reports.push(format!("イベント発生: {}", event.title));
        }
        Ok(reports)
    }

    pub fn reset(&mut self) {
        self.progress.clear();
        self.ledger.reset_to_start();
        self.clock.reset();
        self.events.reset();
    }

    pub fn statistics(&self) -> GameStatistics {
        let total_upgrades = self.catalog.upgrade_count();
        let owned_upgrades = self.progress.owned_count();
        let available_upgrades = self.available_upgrade_ids().len();
        let completion_percentage = if total_upgrades == 0 {
            0.0
        } else {
            owned_upgrades as f64 / total_upgrades as f64 * 100.0
        };
        let mut trees = Vec::new();
        for tree_id in self.catalog.sorted_tree_ids() {
            if let Some(tree) = self.catalog.tree(&tree_id) {
                let owned = tree
                    .upgrade_ids
                    .iter()
                    .filter(|id| self.progress.owns(id))
                    .count();
                trees.push(TreeProgress {
                    tree_id: tree.id.clone(),
                    tree_name: tree.name.clone(),
                    total: tree.upgrade_ids.len(),
                    owned,
                });
            }
        }
        GameStatistics {
            current_year: self.clock.current_year(),
            total_upgrades,
            owned_upgrades,
            available_upgrades,
            completion_percentage,
            trees,
            next_unlock_year: self.next_unlock_year(),
        }
    }

    pub fn next_unlock_year(&self) -> Option<i32> {
        let current_year = self.clock.current_year();
        self.catalog
            .upgrades()
            .filter(|upgrade| upgrade.year > current_year && !self.progress.owns(&upgrade.id))
            .map(|upgrade| upgrade.year)
            .min()
    }

    pub fn exclusive_group_info(&self, group: &str) -> ExclusiveGroupInfo {
        let mut options: Vec<ExclusiveOption> = self
            .catalog
            .upgrades_in_group(group)
            .map(|upgrade| ExclusiveOption {
                id: upgrade.id.clone(),
                name: upgrade.name.clone(),
                owned: self.progress.owns(&upgrade.id),
            })
            .collect();
        options.sort_by(|a, b| a.id.cmp(&b.id));
        ExclusiveGroupInfo {
            group: group.to_string(),
            chosen: self.progress.chosen_in_group(group).map(str::to_string),
            options,
        }
    }

    pub fn to_save_data(&self) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            resources: self.ledger.values(),
            owned_upgrades: self.progress.owned().iter().cloned().collect(),
            selected_exclusive: self.progress.selected_exclusive().clone(),
            current_year: self.clock.current_year(),
            resolved_events: self.events.triggered_ids().iter().cloned().collect(),
        }
    }

    /// 検証をすべて済ませてから状態を入れ替え、最後にモディファイアを再計算する。
    /// 保存されたモディファイアは存在しない。導出値は常にここで作り直す。
    pub fn apply_save_data(&mut self, data: SaveData) -> Result<(), GameError> {
        if data.version == 0 || data.version > SAVE_VERSION {
            return Err(GameError::UnsupportedSaveVersion {
                version: data.version,
            });
        }
        for id in &data.owned_upgrades {
            self.catalog.require_upgrade(id)?;
        }
        let owned: BTreeSet<String> = data.owned_upgrades.iter().cloned().collect();
        for (group, chosen) in &data.selected_exclusive {
            if !owned.contains(chosen) {
                return Err(GameError::MalformedSave {
                    reason: format!("排他グループ {group} の選択 {chosen} が所有一覧にありません"),
                });
            }
        }

        self.progress = PlayerProgress::restore(owned, data.selected_exclusive);
        self.ledger.reset_to_start();
        for (id, value) in &data.resources {
            if self.ledger.contains(id) {
                self.ledger.set_value(id, *value)?;
            }
        }
        self.clock.set_year(data.current_year);
        self.events
            .restore_triggered(data.resolved_events.into_iter().collect());
        self.ledger
            .recompute_modifiers(self.progress.owned(), &self.catalog)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_save_data().write_to(path)
    }

    pub fn load_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let data = SaveData::read_from(path)?;
        self.apply_save_data(data)?;
        Ok(())
    }

    fn unlock_names_for_year(&self, year: i32) -> Vec<String> {
        let mut names: Vec<String> = self
            .catalog
            .upgrades()
            .filter(|upgrade| upgrade.year == year && !self.progress.owns(&upgrade.id))
            .map(|upgrade| upgrade.name.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::load_events_from_str;

    const RESOURCES: &str = r#"
resources:
  - id: capital
    name: 資本
    base_production: 1.0
  - id: labor
    name: 労働力
    base_production: 0.5
"#;

    const TREE: &str = r#"
tree:
  id: industry
  name: 工業
upgrades:
  - id: spinning_jenny
    name: 紡績機
    cost: [{resource: capital, amount: 8}]
    effects: [{resource: capital, effect: add, value: 1.0}]
  - id: steam_engine
    name: 蒸気機関
    year: 1801
    exclusive_group: power
    cost: [{resource: capital, amount: 5}]
    effects: [{resource: capital, effect: mult, value: 2.0}]
  - id: water_wheel
    name: 大型水車
    year: 1801
    exclusive_group: power
    cost: [{resource: capital, amount: 4}]
"#;

    const EVENTS: &str = r#"
events:
  - id: boiler_explosion
    title: ボイラー爆発
    trigger: {year: 1801}
    choices:
      - id: rebuild
        text: 再建する
        cost: [{resource: capital, amount: 3}]
      - id: ignore
        text: 放置する
"#;

    fn session() -> GameState {
        let catalog = Catalog::from_sources(RESOURCES, &[("industry", TREE)]).expect("catalog");
        GameBuilder::new(catalog)
            .with_events(load_events_from_str(EVENTS).expect("events"))
            .build()
            .expect("session")
    }

    #[test]
    fn tick_accrues_production_and_reports_year_change() {
        let mut game = session();
        let reports = game.tick_seconds(10.5).expect("tick");
        assert!((game.resource_value("capital").expect("capital") - 20.5).abs() < 1e-9);
        assert_eq!(game.current_year(), 1801);
        assert!(reports.iter().any(|r| r.contains("1801年になりました")));
        assert!(
            reports
                .iter()
                .any(|r| r.contains("新たに解禁") && r.contains("蒸気機関") && r.contains("大型水車"))
        );
        assert!(reports.iter().any(|r| r.contains("ボイラー爆発")));
        assert!(game.pending_event().is_some());
    }

    #[test]
    fn available_ids_respect_year_gate() {
        let game = session();
        assert_eq!(game.available_upgrade_ids(), vec!["spinning_jenny".to_string()]);
        assert_eq!(game.next_unlock_year(), Some(1801));
    }

    #[test]
    fn purchase_updates_rates_through_full_recompute() {
        let mut game = session();
        game.tick_seconds(10.5).expect("tick");
        let receipt = game.purchase("steam_engine").expect("purchase");
        assert_eq!(receipt.upgrade_name, "蒸気機関");
        let rate = game.production_rate("capital").expect("rate");
        assert!((rate - 2.0).abs() < 1e-9);
        let status = game.upgrade_status("water_wheel").expect("status");
        assert!(matches!(
            status.availability,
            Availability::ExclusiveBlocked { .. }
        ));
    }

    #[test]
    fn save_round_trip_restores_state_and_recomputes() {
        let mut game = session();
        game.tick_seconds(10.5).expect("tick");
        game.purchase("steam_engine").expect("purchase");
        game.resolve_event_choice("rebuild").expect("choice");
        let data = game.to_save_data();
        assert_eq!(data.version, 1);

        let mut restored = session();
        restored.apply_save_data(data.clone()).expect("apply");
        assert_eq!(
            restored.resource_value("capital").expect("capital"),
            game.resource_value("capital").expect("capital")
        );
        assert!((restored.production_rate("capital").expect("rate") - 2.0).abs() < 1e-9);
        assert!(restored.progress().owns("steam_engine"));
        assert_eq!(
            restored.progress().chosen_in_group("power"),
            Some("steam_engine")
        );
        assert_eq!(restored.current_year(), 1801);

        let reports = restored.tick_seconds(0.5).expect("tick");
        assert!(!reports.iter().any(|r| r.contains("ボイラー爆発")));
    }

    #[test]
    fn apply_save_rejects_unknown_owned_upgrade() {
        let mut game = session();
        let mut data = game.to_save_data();
        data.owned_upgrades.push("ghost".to_string());
        let error = game.apply_save_data(data).expect_err("unknown id");
        assert_eq!(error, GameError::UnknownUpgrade { id: "ghost".into() });
    }

    #[test]
    fn apply_save_rejects_unsupported_version() {
        let mut game = session();
        let mut data = game.to_save_data();
        data.version = 99;
        assert!(matches!(
            game.apply_save_data(data),
            Err(GameError::UnsupportedSaveVersion { version: 99 })
        ));
    }

    #[test]
    fn apply_save_rejects_exclusive_choice_outside_owned() {
        let mut game = session();
        let mut data = game.to_save_data();
        data.selected_exclusive
            .insert("power".to_string(), "water_wheel".to_string());
        assert!(matches!(
            game.apply_save_data(data),
            Err(GameError::MalformedSave { .. })
        ));
    }

    #[test]
    fn skip_to_year_applies_production_and_reports_unlocks() {
        let mut game = session();
        assert!(game.can_skip_to_year(1805));
        let reports = game.skip_to_year(1805).expect("skip");
        assert_eq!(game.current_year(), 1805);
        assert!((game.resource_value("capital").expect("capital") - 60.0).abs() < 1e-9);
        assert!(reports.iter().any(|r| r.contains("1801年の解禁")));
        assert!(reports.iter().any(|r| r.contains("ボイラー爆発")));
    }

    #[test]
    fn skip_backwards_is_refused() {
        let mut game = session();
        assert!(!game.can_skip_to_year(1800));
        assert!(matches!(
            game.skip_to_year(1800),
            Err(GameError::SkipUnavailable { year: 1800 })
        ));
    }

    #[test]
    fn skip_is_refused_when_a_resource_would_sink_below_floor() {
        let resources = r#"
resources:
  - id: capital
    name: 資本
    base_production: 1.0
  - id: morale
    name: 士気
    base_production: -0.2
"#;
        let tree = r#"
tree:
  id: industry
  name: 工業
upgrades: []
"#;
        let catalog = Catalog::from_sources(resources, &[("industry", tree)]).expect("catalog");
        let mut game = GameBuilder::new(catalog).build().expect("session");
        assert!(!game.can_skip_to_year(1801));
        assert!(matches!(
            game.skip_to_year(1801),
            Err(GameError::SkipUnavailable { year: 1801 })
        ));
        assert_eq!(game.current_year(), 1800);
    }

    #[test]
    fn statistics_track_ownership_and_availability() {
        let mut game = session();
        game.tick_seconds(8.5).expect("tick");
        game.purchase("spinning_jenny").expect("purchase");
        let stats = game.statistics();
        assert_eq!(stats.total_upgrades, 3);
        assert_eq!(stats.owned_upgrades, 1);
        assert_eq!(stats.available_upgrades, 0);
        assert_eq!(stats.trees.len(), 1);
        assert_eq!(stats.trees[0].owned, 1);
        assert!((stats.trees[0].percentage() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.next_unlock_year, Some(1801));
    }

    #[test]
    fn exclusive_group_info_lists_members() {
        let mut game = session();
        game.tick_seconds(10.5).expect("tick");
        game.purchase("water_wheel").expect("purchase");
        let info = game.exclusive_group_info("power");
        assert_eq!(info.chosen.as_deref(), Some("water_wheel"));
        assert_eq!(info.options.len(), 2);
        assert!(info.options.iter().any(|o| o.id == "water_wheel" && o.owned));
        assert!(info.options.iter().any(|o| o.id == "steam_engine" && !o.owned));
    }

    #[test]
    fn reset_restores_initial_session_state() {
        let mut game = session();
        game.tick_seconds(10.5).expect("tick");
        game.purchase("steam_engine").expect("purchase");
        game.reset();
        assert_eq!(game.current_year(), 1800);
        assert!(game.progress().owned().is_empty());
        assert_eq!(game.resource_value("capital").expect("capital"), 10.0);
        assert!((game.production_rate("capital").expect("rate") - 1.0).abs() < 1e-9);
        assert!(game.pending_event().is_none());
        let reports = game.tick_seconds(10.5).expect("tick");
        assert!(reports.iter().any(|r| r.contains("ボイラー爆発")));
    }

    #[test]
    fn embedded_session_builds_and_plays() {
        let mut game = GameState::from_embedded().expect("session");
        assert_eq!(game.current_year(), 1800);
        assert!(!game.available_upgrade_ids().is_empty());
        game.tick_seconds(30.0).expect("tick");
        game.purchase("spinning_jenny").expect("purchase");
        assert!(game.progress().owns("spinning_jenny"));
    }
}
