use folio_base::PortfolioItem;
use tracing::debug;

/// Where a click landed relative to the detail modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    /// The dimmed backdrop around the modal content.
    Overlay,
    Content,
    Outside,
}

/// The single project-detail modal: a visibility flag plus the four fields it shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModalController {
    visible: bool,
    item: PortfolioItem,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the item's fields verbatim and shows the modal. Opening while
    /// already visible just replaces the fields.
    pub fn open(&mut self, item: &PortfolioItem) {
        debug!(title = %item.title, "opening project modal");
        self.item = item.clone();
        self.visible = true;
    }

    pub fn close(&mut self) {
        if self.visible {
            debug!(title = %self.item.title, "closing project modal");
        }
        self.visible = false;
    }

    pub fn handle_click(&mut self, target: ClickTarget) {
        match target {
            ClickTarget::Overlay => self.close(),
            ClickTarget::Content | ClickTarget::Outside => {}
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn title(&self) -> &str {
        &self.item.title
    }

    pub fn role(&self) -> &str {
        &self.item.role
    }

    pub fn tools(&self) -> &str {
        &self.item.tools
    }

    pub fn description(&self) -> &str {
        &self.item.description
    }

    pub fn item(&self) -> &PortfolioItem {
        &self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_base::{ATTR_ROLE, ATTR_TITLE, ItemAttributes};

    fn sample_item() -> PortfolioItem {
        PortfolioItem::new("Harbour", "Modeller", "Blender", "Night scene.")
    }

    #[test]
    fn open_copies_fields_and_shows() {
        let mut modal = ModalController::new();
        assert!(!modal.is_visible());

        modal.open(&sample_item());
        assert!(modal.is_visible());
        assert_eq!(modal.title(), "Harbour");
        assert_eq!(modal.role(), "Modeller");
        assert_eq!(modal.tools(), "Blender");
        assert_eq!(modal.description(), "Night scene.");
    }

    #[test]
    fn close_always_hides() {
        let mut modal = ModalController::new();
        modal.close();
        assert!(!modal.is_visible());

        modal.open(&sample_item());
        modal.close();
        assert!(!modal.is_visible());
        modal.close();
        assert!(!modal.is_visible());
    }

    #[test]
    fn overlay_click_hides_but_content_click_does_not() {
        let mut modal = ModalController::new();
        modal.open(&sample_item());

        modal.handle_click(ClickTarget::Content);
        assert!(modal.is_visible());
        modal.handle_click(ClickTarget::Outside);
        assert!(modal.is_visible());

        modal.handle_click(ClickTarget::Overlay);
        assert!(!modal.is_visible());
    }

    #[test]
    fn opening_while_visible_replaces_fields() {
        let mut modal = ModalController::new();
        modal.open(&sample_item());

        let sparse = ItemAttributes::new()
            .with(ATTR_TITLE, "Second")
            .with(ATTR_ROLE, "Lead");
        modal.open(&PortfolioItem::from_attributes(&sparse));
        assert!(modal.is_visible());
        assert_eq!(modal.title(), "Second");
        assert_eq!(modal.tools(), "");
        assert_eq!(modal.description(), "");
    }
}
