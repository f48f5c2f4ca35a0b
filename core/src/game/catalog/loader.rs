use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use super::model::{
    Catalog, RequirementTerm, ResourceCost, ResourceDefinition, ResourceEffect, Upgrade,
    UpgradeTree,
};
use crate::game::error::GameError;

const EMBEDDED_RESOURCES: &str = include_str!("../../../../config/resources.yaml");
const EMBEDDED_INDUSTRY: &str = include_str!("../../../../config/trees/industry.yaml");
const EMBEDDED_SCIENCE: &str = include_str!("../../../../config/trees/science.yaml");
const EMBEDDED_SOCIETY: &str = include_str!("../../../../config/trees/society.yaml");

impl Catalog {
    pub fn from_embedded() -> Result<Self, GameError> {
        Self::from_sources(
            EMBEDDED_RESOURCES,
            &[
                ("industry", EMBEDDED_INDUSTRY),
                ("science", EMBEDDED_SCIENCE),
                ("society", EMBEDDED_SOCIETY),
            ],
        )
    }

    pub fn from_sources(
        resources_yaml: &str,
        tree_sources: &[(&str, &str)],
    ) -> Result<Self, GameError> {
        let resource_file: ResourceFile = parse_yaml(resources_yaml, "resources")?;
        let mut catalog = Catalog::default();
        for definition in resource_file.resources {
            catalog.insert_resource(definition)?;
        }
        for (label, content) in tree_sources {
            let file: TreeFile = parse_yaml(content, label)?;
            let tree_id = file.tree.id.clone();
            catalog.insert_tree(file.tree)?;
            for entry in file.upgrades {
                catalog.insert_upgrade(entry.into_upgrade(&tree_id))?;
            }
        }
        catalog.validate_references()?;
        Ok(catalog)
    }

    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let resources_path = dir.join("resources.yaml");
        let resources_yaml = fs::read_to_string(&resources_path).with_context(|| {
            format!("リソース定義の読み込みに失敗しました: {}", resources_path.display())
        })?;

        let trees_dir = dir.join("trees");
        if !trees_dir.exists() {
            return Err(anyhow!(
                "ツリー定義ディレクトリが存在しません: {}",
                trees_dir.display()
            ));
        }
        let mut sources = Vec::new();
        for entry in
            fs::read_dir(&trees_dir).context("ツリー定義ディレクトリの読み込みに失敗しました")?
        {
            let entry = entry?;
            let path = entry.path();
            if !is_yaml_file(&path) {
                continue;
            }
            let content = fs::read_to_string(&path)
                .with_context(|| format!("ファイルの読み込みに失敗しました: {}", path.display()))?;
            sources.push((path.display().to_string(), content));
        }
        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let refs: Vec<(&str, &str)> = sources
            .iter()
            .map(|(label, content)| (label.as_str(), content.as_str()))
            .collect();
        let catalog = Self::from_sources(&resources_yaml, &refs)?;
        Ok(catalog)
    }
}

fn parse_yaml<T: DeserializeOwned>(content: &str, label: &str) -> Result<T, GameError> {
    serde_yaml::from_str(content).map_err(|error| GameError::MalformedCatalog {
        reason: format!("{label}: {error}"),
    })
}

fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResourceFile {
    #[serde(default)]
    resources: Vec<ResourceDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeFile {
    tree: UpgradeTree,
    #[serde(default)]
    upgrades: Vec<UpgradeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UpgradeEntry {
    id: String,
    #[serde(default)]
    tree: Option<String>,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tier: i32,
    #[serde(default)]
    year: i32,
    #[serde(default)]
    cost: Vec<ResourceCost>,
    #[serde(default)]
    effects: Vec<ResourceEffect>,
    #[serde(default)]
    exclusive_group: Option<String>,
    #[serde(default)]
    requires: Vec<RequirementTerm>,
}

impl UpgradeEntry {
    fn into_upgrade(self, fallback_tree: &str) -> Upgrade {
        Upgrade {
            id: self.id,
            tree: self.tree.unwrap_or_else(|| fallback_tree.to_string()),
            name: self.name,
            description: self.description,
            tier: self.tier,
            year: self.year,
            cost: self.cost,
            effects: self.effects,
            exclusive_group: self.exclusive_group,
            requires: self.requires,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCES: &str = r#"
resources:
  - id: capital
    name: 資本
    base_production: 1.0
  - id: labor
    name: 労働力
    base_production: 0.5
"#;

    fn tree_yaml(upgrades: &str) -> String {
        format!(
            r#"
tree:
  id: industry
  name: 工業
upgrades:
{upgrades}
"#
        )
    }

    #[test]
    fn embedded_catalog_loads_and_validates() {
        let catalog = Catalog::from_embedded().expect("embedded catalog");
        assert!(catalog.upgrade_count() > 0);
        assert!(catalog.resource("capital").is_some());
        let steam = catalog.upgrade("steam_engine").expect("steam_engine");
        assert_eq!(steam.tree, "industry");
        assert_eq!(steam.exclusive_group.as_deref(), Some("power"));
        let tree = catalog.tree("industry").expect("industry tree");
        assert!(tree.upgrade_ids.contains(&"steam_engine".to_string()));
    }

    #[test]
    fn upgrade_without_tree_field_joins_file_tree() {
        let yaml = tree_yaml(
            r#"
  - id: spinning_jenny
    name: 紡績機
    cost:
      - resource: capital
        amount: 30
"#,
        );
        let catalog = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]).expect("catalog");
        assert_eq!(catalog.upgrade("spinning_jenny").expect("upgrade").tree, "industry");
    }

    #[test]
    fn duplicate_upgrade_id_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: spinning_jenny
    name: 紡績機
  - id: spinning_jenny
    name: 紡績機その2
"#,
        );
        let result = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]);
        assert!(matches!(result, Err(GameError::MalformedCatalog { .. })));
    }

    #[test]
    fn cost_referencing_unknown_resource_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: spinning_jenny
    name: 紡績機
    cost:
      - resource: coal
        amount: 10
"#,
        );
        let error = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]).expect_err("rejects");
        assert!(error.to_string().contains("coal"));
    }

    #[test]
    fn effect_referencing_unknown_resource_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: spinning_jenny
    name: 紡績機
    effects:
      - resource: coal
        effect: add
        value: 1.0
"#,
        );
        let result = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]);
        assert!(matches!(result, Err(GameError::MalformedCatalog { .. })));
    }

    #[test]
    fn negative_cost_amount_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: spinning_jenny
    name: 紡績機
    cost:
      - resource: capital
        amount: -5
"#,
        );
        let result = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]);
        assert!(matches!(result, Err(GameError::MalformedCatalog { .. })));
    }

    #[test]
    fn upgrade_referencing_unknown_tree_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: spinning_jenny
    tree: agriculture
    name: 紡績機
"#,
        );
        let result = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]);
        assert!(matches!(result, Err(GameError::MalformedCatalog { .. })));
    }

    #[test]
    fn dangling_bare_requirement_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: factory_system
    name: 工場制度
    requires: [steam_engine]
"#,
        );
        let error = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]).expect_err("rejects");
        assert!(error.to_string().contains("steam_engine"));
    }

    #[test]
    fn dangling_reference_inside_or_term_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: steam_engine
    name: 蒸気機関
  - id: factory_system
    name: 工場制度
    requires: [[steam_engine, water_wheel]]
"#,
        );
        let error = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]).expect_err("rejects");
        assert!(error.to_string().contains("water_wheel"));
    }

    #[test]
    fn empty_or_term_is_rejected() {
        let yaml = tree_yaml(
            r#"
  - id: factory_system
    name: 工場制度
    requires: [[]]
"#,
        );
        let result = Catalog::from_sources(RESOURCES, &[("industry", &yaml)]);
        assert!(matches!(result, Err(GameError::MalformedCatalog { .. })));
    }

    #[test]
    fn broken_yaml_reports_malformed_catalog() {
        let result = Catalog::from_sources("resources: [", &[]);
        assert!(matches!(result, Err(GameError::MalformedCatalog { .. })));
    }
}
