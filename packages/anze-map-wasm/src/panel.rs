/// Open/closed state of the filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelState {
    open: bool,
}

impl PanelState {
    /// Closed, unless the page was loaded with a precision pointer (a
    /// desktop-like device), in which case it starts open.
    pub fn new(precision_pointer: bool) -> Self {
        Self {
            open: precision_pointer,
        }
    }

    /// Flip the panel, or force it to `state`. Returns the new state.
    pub fn toggle(&mut self, state: Option<bool>) -> bool {
        self.open = state.unwrap_or(!self.open);
        self.open
    }

    /// A click on the map closes an open panel. Returns the new state when
    /// something changed.
    pub fn on_map_click(&mut self) -> Option<bool> {
        if self.open {
            Some(self.toggle(Some(false)))
        } else {
            None
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Value for the panel's `aria-hidden` attribute.
    pub fn aria_hidden(&self) -> &'static str {
        if self.open {
            "false"
        } else {
            "true"
        }
    }

    /// Value for the button's `aria-expanded` attribute.
    pub fn aria_expanded(&self) -> &'static str {
        if self.open {
            "true"
        } else {
            "false"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_open_only_for_precision_pointer() {
        assert!(!PanelState::new(false).is_open());
        assert!(PanelState::new(true).is_open());
    }

    #[test]
    fn toggle_flips_or_forces() {
        let mut panel = PanelState::new(false);
        assert!(panel.toggle(None));
        assert!(panel.toggle(Some(true)));
        assert!(!panel.toggle(None));
        assert_eq!(panel.aria_hidden(), "true");
        assert_eq!(panel.aria_expanded(), "false");
    }

    #[test]
    fn map_click_closes_only_when_open() {
        let mut panel = PanelState::new(false);
        assert_eq!(panel.on_map_click(), None);
        panel.toggle(Some(true));
        assert_eq!(panel.on_map_click(), Some(false));
        assert!(!panel.is_open());
    }
}
