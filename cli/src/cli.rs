use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow, bail};
use industria_core::{
    Availability, EffectKind, EventDefinition, GameConfig, GameState, RequirementTerm,
    ResourceCost, ResourceEffect, Upgrade,
};

const DEFAULT_SAVE_PATH: &str = "save.json";
const AUTOSAVE_PATH: &str = "autosave.json";

struct AutoSave {
    interval: f64,
    elapsed: f64,
}

impl AutoSave {
    fn new(interval: f64) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    fn record(&mut self, game: &GameState, seconds: f64) {
        if self.interval <= 0.0 {
            return;
        }
        self.elapsed += seconds;
        if self.elapsed < self.interval {
            return;
        }
        self.elapsed = 0.0;
        match game.save_to(AUTOSAVE_PATH) {
            Ok(()) => println!("自動セーブしました: {AUTOSAVE_PATH}"),
            Err(error) => println!("自動セーブに失敗しました: {error}"),
        }
    }
}

pub fn run(game: &mut GameState, config: &GameConfig) -> Result<()> {
    let mut autosave = AutoSave::new(config.game.autosave_interval_seconds);
    print_intro(game);
    let stdin = io::stdin();

    loop {
        print!("{}年> ", game.current_year());
        io::stdout()
            .flush()
            .context("プロンプトのフラッシュに失敗しました")?;

        let mut line = String::new();
        let bytes = stdin
            .lock()
            .read_line(&mut line)
            .context("入力の読み込みに失敗しました")?;

        if bytes == 0 {
            println!("入力が終了したためゲームを終了します。");
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Err(error) = dispatch_command(game, &mut autosave, trimmed) {
            println!("エラー: {error}");
        }
    }
}

fn dispatch_command(game: &mut GameState, autosave: &mut AutoSave, input: &str) -> Result<()> {
    let mut parts = input.split_whitespace();
    let command = parts
        .next()
        .ok_or_else(|| anyhow!("コマンドが指定されていません。"))?
        .to_ascii_lowercase();

    match command.as_str() {
        "help" | "?" => {
            print_help();
            Ok(())
        }
        "resources" | "res" => {
            print_resources(game);
            Ok(())
        }
        "trees" => {
            print_trees(game);
            Ok(())
        }
        "tree" => {
            let tree_id = parts
                .next()
                .ok_or_else(|| anyhow!("ツリーIDを指定してください。"))?;
            print_tree(game, tree_id)
        }
        "show" => {
            let upgrade_id = parts
                .next()
                .ok_or_else(|| anyhow!("アップグレードIDを指定してください。"))?;
            print_upgrade(game, upgrade_id)
        }
        "buy" => {
            let upgrade_id = parts
                .next()
                .ok_or_else(|| anyhow!("購入するアップグレードIDを指定してください。"))?;
            let receipt = game.purchase(upgrade_id)?;
            println!(
                "{} を購入しました。支払い: {}",
                receipt.upgrade_name,
                format_costs(&receipt.paid)
            );
            Ok(())
        }
        "tick" | "wait" => {
            let seconds = match parts.next() {
                Some(token) => token
                    .parse::<f64>()
                    .map_err(|_| anyhow!("秒数を数値で指定してください: {token}"))?,
                None => 1.0,
            };
            let reports = game.tick_seconds(seconds)?;
            for report in reports {
                println!("- {report}");
            }
            autosave.record(game, seconds);
            Ok(())
        }
        "speed" => {
            let token = parts
                .next()
                .ok_or_else(|| anyhow!("速度倍率を指定してください。"))?;
            let multiplier = token
                .parse::<f64>()
                .map_err(|_| anyhow!("速度倍率を数値で指定してください: {token}"))?;
            let applied = game.set_speed(multiplier)?;
            println!("時間倍率を {applied:.2}x にしました。");
            Ok(())
        }
        "pause" => {
            if game.toggle_pause() {
                println!("時間を停止しました。");
            } else {
                println!("時間を再開しました。");
            }
            Ok(())
        }
        "skip" => {
            let token = parts
                .next()
                .ok_or_else(|| anyhow!("目標の年を指定してください。"))?;
            let year = token
                .parse::<i32>()
                .map_err(|_| anyhow!("年を整数で指定してください: {token}"))?;
            let reports = game.skip_to_year(year)?;
            for report in reports {
                println!("- {report}");
            }
            Ok(())
        }
        "event" => {
            match game.pending_event() {
                Some(event) => print_event(event),
                None => println!("処理待ちのイベントはありません。"),
            }
            Ok(())
        }
        "choose" => {
            let choice_id = parts
                .next()
                .ok_or_else(|| anyhow!("選択肢IDを指定してください。"))?;
            let report = game.resolve_event_choice(choice_id)?;
            println!("- {report}");
            Ok(())
        }
        "stats" => {
            print_stats(game);
            Ok(())
        }
        "save" => {
            let path = parts.next().unwrap_or(DEFAULT_SAVE_PATH);
            game.save_to(path)?;
            println!("セーブしました: {path}");
            Ok(())
        }
        "load" => {
            let path = parts.next().unwrap_or(DEFAULT_SAVE_PATH);
            game.load_from(path)?;
            println!("ロードしました: {path}");
            Ok(())
        }
        "reset" => {
            game.reset();
            println!("最初からやり直します。");
            Ok(())
        }
        "quit" | "exit" => {
            println!("ゲームを終了します。");
            std::process::exit(0);
        }
        other => {
            bail!("未知のコマンドです: {other}. help で一覧を確認してください。");
        }
    }
}

fn print_intro(game: &GameState) {
    println!("インダストリア: 産業の時代へようこそ。");
    println!(
        "{}年から始まり、{} 件のアップグレードが待っています。",
        game.current_year(),
        game.catalog().upgrade_count()
    );
    println!("コマンド例: resources / trees / tree industry / buy spinning_jenny / tick 10");
    println!("help で利用可能なコマンド一覧を表示します。");
}

fn print_help() {
    println!("利用可能なコマンド:");
    println!("  resources             リソースの保有量と毎秒生産を表示");
    println!("  trees                 ツリー一覧と進捗を表示");
    println!("  tree <ID>             ツリー内のアップグレードを表示");
    println!("  show <ID>             アップグレードの詳細を表示");
    println!("  buy <ID>              アップグレードを購入");
    println!("  tick [秒]             時間を進める (既定は1秒)");
    println!("  speed <倍率>          時間倍率を変更");
    println!("  pause                 時間の停止/再開を切り替え");
    println!("  skip <年>             指定の年まで一括で進める");
    println!("  event                 処理待ちイベントを表示");
    println!("  choose <ID>           イベントの選択肢を選ぶ");
    println!("  stats                 進捗統計を表示");
    println!("  save [パス]           セーブ (既定: save.json)");
    println!("  load [パス]           ロード (既定: save.json)");
    println!("  reset                 最初からやり直す");
    println!("  quit                  ゲームを終了");
}

fn print_resources(game: &GameState) {
    println!("{:<12} | {:<10} | {:>12} | {:>10}", "ID", "名称", "保有量", "毎秒");
    for row in game.resource_overview() {
        println!(
            "{:<12} | {:<10} | {:>12.1} | {:>+10.2}",
            row.id, row.name, row.current_value, row.production_rate
        );
    }
}

fn print_trees(game: &GameState) {
    let stats = game.statistics();
    for tree in stats.trees {
        println!(
            "{:<10} {:<8} {}/{} ({:.0}%)",
            tree.tree_id,
            tree.tree_name,
            tree.owned,
            tree.total,
            tree.percentage()
        );
    }
}

fn print_tree(game: &GameState, tree_id: &str) -> Result<()> {
    let tree = game
        .catalog()
        .tree(tree_id)
        .ok_or_else(|| anyhow!("ツリーが見つかりません: {tree_id}"))?;
    println!("{} {} - {}", tree.icon, tree.name, tree.description);
    for upgrade_id in &tree.upgrade_ids {
        let status = game.upgrade_status(upgrade_id)?;
        let upgrade = game
            .catalog()
            .upgrade(upgrade_id)
            .ok_or_else(|| anyhow!("アップグレードが見つかりません: {upgrade_id}"))?;
        let marker = match &status.availability {
            Availability::AlreadyOwned => "✓",
            Availability::Available if status.affordable => "○",
            Availability::Available => "△",
            _ => "×",
        };
        println!(
            "  {marker} {:<16} {:<12} {}年 | {} | {}",
            upgrade.id,
            upgrade.name,
            upgrade.year,
            format_costs(&upgrade.cost),
            status.availability.describe()
        );
    }
    Ok(())
}

fn print_upgrade(game: &GameState, upgrade_id: &str) -> Result<()> {
    let upgrade = game
        .catalog()
        .upgrade(upgrade_id)
        .ok_or_else(|| anyhow!("アップグレードが見つかりません: {upgrade_id}"))?;
    let status = game.upgrade_status(upgrade_id)?;
    println!("{} ({})", upgrade.name, upgrade.id);
    println!("  {}", upgrade.description);
    println!("  ツリー: {} / tier {} / {}年解禁", upgrade.tree, upgrade.tier, upgrade.year);
    println!("  コスト: {}", format_costs(&upgrade.cost));
    println!("  効果: {}", format_effects(&upgrade.effects));
    if !upgrade.requires.is_empty() {
        println!("  前提: {}", format_requirements(upgrade));
    }
    if let Some(group) = &upgrade.exclusive_group {
        let info = game.exclusive_group_info(group);
        let members: Vec<String> = info.options.iter().map(|option| option.id.clone()).collect();
        println!("  排他グループ: {} ({})", group, members.join(" / "));
    }
    println!("  状態: {}", status.availability.describe());
    if status.availability.is_available() && !status.affordable {
        println!("  ※ リソースが不足しています。");
    }
    Ok(())
}

fn print_event(event: &EventDefinition) {
    println!("{} {}", event.icon, event.title);
    println!("  {}", event.description);
    for choice in &event.choices {
        println!("  [{}] {}", choice.id, choice.text);
        if !choice.description.is_empty() {
            println!("      {}", choice.description);
        }
        if !choice.cost.is_empty() {
            println!("      コスト: {}", format_costs(&choice.cost));
        }
        if !choice.effects.is_empty() {
            println!("      効果: {}", format_effects(&choice.effects));
        }
        if !choice.requires.is_empty() {
            println!("      前提: {}", choice.requires.join(", "));
        }
    }
    println!("choose <ID> で選択してください。");
}

fn print_stats(game: &GameState) {
    let stats = game.statistics();
    println!("現在: {}年 (進行 {:.0}%)", stats.current_year, game.year_progress_percent());
    println!(
        "取得済み: {}/{} ({:.1}%) / 購入可能: {}",
        stats.owned_upgrades,
        stats.total_upgrades,
        stats.completion_percentage,
        stats.available_upgrades
    );
    for tree in &stats.trees {
        println!(
            "  {:<10} {}/{} ({:.0}%)",
            tree.tree_name,
            tree.owned,
            tree.total,
            tree.percentage()
        );
    }
    match stats.next_unlock_year {
        Some(year) => println!("次の解禁: {}年", year),
        None => println!("次の解禁: なし"),
    }
    println!(
        "時間倍率: {:.2}x{}",
        game.time_multiplier(),
        if game.is_paused() { " (停止中)" } else { "" }
    );
}

fn format_costs(costs: &[ResourceCost]) -> String {
    if costs.is_empty() {
        return "なし".to_string();
    }
    costs
        .iter()
        .map(|cost| format!("{} {:.0}", cost.resource, cost.amount))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_effects(effects: &[ResourceEffect]) -> String {
    if effects.is_empty() {
        return "なし".to_string();
    }
    effects
        .iter()
        .map(|effect| match effect.kind {
            EffectKind::Add => format!("{} {:+.2}/秒", effect.resource, effect.value),
            EffectKind::Mult => format!("{} ×{:.2}", effect.resource, effect.value),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_requirements(upgrade: &Upgrade) -> String {
    upgrade
        .requires
        .iter()
        .map(|term| match term {
            RequirementTerm::Id(id) => id.clone(),
            RequirementTerm::AnyOf(alternatives) => {
                format!("({})", alternatives.join(" または "))
            }
        })
        .collect::<Vec<_>>()
        .join(" かつ ")
}
