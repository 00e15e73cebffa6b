use folio_base::{
    ATTR_DESCRIPTION, ATTR_ROLE, ATTR_TITLE, ATTR_TOOLS, Error, FolioConfig, HexColor,
    ItemAttributes, Portfolio, PortfolioItem, Result,
};

#[test]
fn item_reads_all_four_attributes() {
    let attributes = ItemAttributes::new()
        .with(ATTR_TITLE, "Harbour")
        .with(ATTR_ROLE, "Modeller")
        .with(ATTR_TOOLS, "Blender, Krita")
        .with(ATTR_DESCRIPTION, "Night scene.");

    let item = PortfolioItem::from_attributes(&attributes);
    assert_eq!(item, PortfolioItem::new("Harbour", "Modeller", "Blender, Krita", "Night scene."));
}

#[test]
fn missing_attributes_read_as_empty_text() {
    let attributes = ItemAttributes::new().with(ATTR_TITLE, "Only a title");
    let item = PortfolioItem::from_attributes(&attributes);
    assert_eq!(item.title, "Only a title");
    assert!(item.role.is_empty());
    assert!(item.tools.is_empty());
    assert!(item.description.is_empty());
}

#[test]
fn attributes_are_copied_verbatim() {
    let padded = "  spaced <b>markup</b>  ";
    let item = PortfolioItem::from_attributes(&ItemAttributes::new().with(ATTR_DESCRIPTION, padded));
    assert_eq!(item.description, padded);
    assert_eq!(item.to_attributes().get(ATTR_DESCRIPTION), Some(padded));
}

#[test]
fn sample_portfolio_parses() -> Result<()> {
    let portfolio = Portfolio::sample()?;
    let items = portfolio.items();
    assert!(!items.is_empty());
    assert!(items.iter().all(|item| !item.title.is_empty()));
    Ok(())
}

#[test]
fn portfolio_keeps_unknown_attributes() -> Result<()> {
    let portfolio = Portfolio::from_json(
        r#"{ "items": [ { "data-title": "A", "data-year": "2024" } ] }"#,
    )?;
    assert_eq!(portfolio.items[0].get("data-year"), Some("2024"));
    assert_eq!(portfolio.items()[0].title, "A");
    assert!(portfolio.owner.is_empty());
    Ok(())
}

#[test]
fn config_defaults_match_viewer_setup() {
    let config = FolioConfig::default();
    assert_eq!(config.scene.background, HexColor(0x1f1f1f));
    assert_eq!(config.camera.fov_deg, 75.0);
    assert_eq!(config.camera.position, [0.0, 1.0, 3.0]);
    assert_eq!(config.lights.directional.position, [5.0, 10.0, 7.5]);
    assert!(config.controls.enable_damping);
    assert_eq!(config.controls.target, [0.0, 0.5, 0.0]);
    assert!(config.validate().is_ok());
}

#[test]
fn config_partial_json_keeps_defaults() -> Result<()> {
    let config = FolioConfig::from_json(
        r##"{ "scene": { "background": "#000000" }, "camera": { "fov_deg": 50.0 } }"##,
    )?;
    assert_eq!(config.scene.background, HexColor(0));
    assert_eq!(config.camera.fov_deg, 50.0);
    assert_eq!(config.camera.near, 0.1);
    assert_eq!(config.controls.max_distance, 10.0);
    Ok(())
}

#[test]
fn config_rejects_inverted_distance_bounds() {
    let result = FolioConfig::from_json(
        r#"{ "controls": { "min_distance": 5.0, "max_distance": 2.0 } }"#,
    );
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn config_rejects_bad_colour() {
    let result = FolioConfig::from_json(r#"{ "scene": { "background": "teal" } }"#);
    assert!(matches!(result, Err(Error::Json(_))));
}
