use super::catalog::{Catalog, ResourceCost};
use super::eligibility;
use super::error::GameError;
use super::ledger::ResourceLedger;
use super::progress::PlayerProgress;

#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub upgrade_id: String,
    pub upgrade_name: String,
    pub paid: Vec<ResourceCost>,
}

/// 購入を1トランザクションとして実行する。引き落とし前の失敗は状態を一切変えない。
pub(crate) fn execute(
    upgrade_id: &str,
    catalog: &Catalog,
    progress: &mut PlayerProgress,
    ledger: &mut ResourceLedger,
    current_year: i32,
) -> Result<PurchaseReceipt, GameError> {
    let upgrade = catalog.require_upgrade(upgrade_id)?;

    let verdict = eligibility::availability(upgrade, progress, current_year);
    if !verdict.is_available() {
        return Err(GameError::NotEligible {
            id: upgrade.id.clone(),
            reason: verdict.describe(),
        });
    }

    ledger.pay(&upgrade.cost)?;
    progress.record(upgrade);
    ledger.recompute_modifiers(progress.owned(), catalog)?;

    Ok(PurchaseReceipt {
        upgrade_id: upgrade.id.clone(),
        upgrade_name: upgrade.name.clone(),
        paid: upgrade.cost.clone(),
    })
}
