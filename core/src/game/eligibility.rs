use super::catalog::{RequirementTerm, Upgrade};
use super::progress::PlayerProgress;

/// 購入可否の判定結果。`Available` 以外は拒否理由を保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    AlreadyOwned,
    LockedUntilYear(i32),
    MissingRequirements(Vec<String>),
    ExclusiveBlocked { group: String, chosen: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn describe(&self) -> String {
        match self {
            Availability::Available => "購入可能です".to_string(),
            Availability::AlreadyOwned => "取得済みです".to_string(),
            Availability::LockedUntilYear(year) => format!("{year}年まで解禁されません"),
            Availability::MissingRequirements(ids) => {
                format!("前提が未取得です: {}", ids.join(", "))
            }
            Availability::ExclusiveBlocked { group, chosen } => {
                format!("排他グループ {group} では {chosen} を選択済みです")
            }
        }
    }
}

/// 安い順・却下されやすい順に判定する: 所有済み → 年代 → 前提 → 排他グループ。
pub fn availability(upgrade: &Upgrade, progress: &PlayerProgress, current_year: i32) -> Availability {
    if progress.owns(&upgrade.id) {
        return Availability::AlreadyOwned;
    }
    if upgrade.year > current_year {
        return Availability::LockedUntilYear(upgrade.year);
    }
    if upgrade
        .requires
        .iter()
        .any(|term| !term.is_satisfied(progress.owned()))
    {
        return Availability::MissingRequirements(blocking_requirements(upgrade, progress));
    }
    if let Some(group) = &upgrade.exclusive_group {
        if let Some(chosen) = progress.chosen_in_group(group) {
            if chosen != upgrade.id {
                return Availability::ExclusiveBlocked {
                    group: group.clone(),
                    chosen: chosen.to_string(),
                };
            }
        }
    }
    Availability::Available
}

pub fn is_available(upgrade: &Upgrade, progress: &PlayerProgress, current_year: i32) -> bool {
    availability(upgrade, progress, current_year).is_available()
}

/// 未充足の前提IDを列挙する。OR項は1つも所有していない場合に全候補を返す。
pub fn blocking_requirements(upgrade: &Upgrade, progress: &PlayerProgress) -> Vec<String> {
    let mut blocking = Vec::new();
    for term in &upgrade.requires {
        match term {
            RequirementTerm::Id(id) => {
                if !progress.owns(id) {
                    blocking.push(id.clone());
                }
            }
            RequirementTerm::AnyOf(alternatives) => {
                if !alternatives.iter().any(|id| progress.owns(id)) {
                    blocking.extend(alternatives.iter().cloned());
                }
            }
        }
    }
    blocking
}
