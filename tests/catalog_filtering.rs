//! 示例目录过滤集成测试
//! 四谓词合取与展示名到slug的映射

mod common;

use std::collections::HashMap;

use mintcore::service::catalog_service::CatalogFilter;

#[tokio::test]
async fn display_name_filter_matches_slug_items_only() {
    let catalog = common::test_catalog(vec![
        common::example_item(
            "carbon-forward",
            "alternative-assets/carbon-credits",
            "primary",
            "ERC-3525",
        ),
        common::example_item("usdx", "stablecoins/fiat-backed", "primary", "ERC-20"),
    ]);
    catalog.refresh().await.unwrap();

    let results = catalog
        .filtered(&CatalogFilter {
            asset_type: Some("Alternative Assets / Carbon Credits".to_string()),
            ..CatalogFilter::default()
        })
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].asset_type, "alternative-assets/carbon-credits");
}

#[tokio::test]
async fn category_plus_standard_is_an_intersection() {
    let catalog = common::test_catalog(vec![
        common::example_item("a", "bonds/corporate", "primary", "ERC-3525"),
        common::example_item("b", "bonds/corporate", "primary", "ERC-1400"),
        common::example_item("c", "bonds/corporate", "secondary", "ERC-3525"),
        common::example_item("d", "equity/private-company", "primary", "ERC-3525"),
    ]);
    catalog.refresh().await.unwrap();

    let results = catalog
        .filtered(&CatalogFilter {
            category: Some("primary".to_string()),
            standard: Some("ERC-3525".to_string()),
            ..CatalogFilter::default()
        })
        .await;

    let names: Vec<&str> = results.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["a", "d"]);
}

#[tokio::test]
async fn all_four_predicates_combine() {
    let catalog = common::test_catalog(vec![
        common::example_item(
            "carbon-2027",
            "alternative-assets/carbon-credits",
            "primary",
            "ERC-3525",
        ),
        common::example_item(
            "carbon-legacy",
            "alternative-assets/carbon-credits",
            "secondary",
            "ERC-3525",
        ),
        common::example_item(
            "carbon-coin",
            "alternative-assets/carbon-credits",
            "primary",
            "ERC-20",
        ),
    ]);
    catalog.refresh().await.unwrap();

    let results = catalog
        .filtered(&CatalogFilter {
            search: Some("carbon".to_string()),
            asset_type: Some("Alternative Assets / Carbon Credits".to_string()),
            category: Some("primary".to_string()),
            standard: Some("erc3525".to_string()),
        })
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "carbon-2027");
}

#[tokio::test]
async fn empty_filter_returns_everything() {
    let catalog = common::test_catalog(vec![
        common::example_item("a", "bonds/corporate", "primary", "ERC-20"),
        common::example_item("b", "funds/money-market", "secondary", "ERC-4626"),
    ]);
    catalog.refresh().await.unwrap();

    let results = catalog.filtered(&CatalogFilter::default()).await;
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn load_failure_leaves_previous_list_untouched() {
    let mut contents = HashMap::new();
    contents.insert(
        "/examples/good.json".to_string(),
        r#"{"name":"Good","standard":"erc20","configMode":"min"}"#.to_string(),
    );
    let catalog = common::test_catalog_with_contents(
        vec![common::example_item(
            "good",
            "bonds/corporate",
            "primary",
            "ERC-20",
        )],
        contents,
    );
    catalog.refresh().await.unwrap();

    assert!(catalog.load("/examples/missing.json").await.is_err());

    // 加载失败后清单和可加载内容不受影响
    assert_eq!(catalog.filtered(&CatalogFilter::default()).await.len(), 1);
    let loaded = catalog.load("/examples/good.json").await.unwrap();
    assert!(loaded.content.contains("Good"));
}
