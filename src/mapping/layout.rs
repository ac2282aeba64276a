const MULTI_PANEL_FALLBACK: &str = "comic page, multiple views";

pub fn panel_tags(panels: u32) -> &'static str {
    match panels {
        1 => "solo, single view, movie still",
        2 => "2koma, 2 panels, split view, top and bottom",
        3 => "3koma, 3 panels, comic page",
        4 => "4koma, 4 panels, comic strip",
        _ => MULTI_PANEL_FALLBACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_counts_have_dedicated_layouts() {
        assert_eq!(panel_tags(1), "solo, single view, movie still");
        assert_eq!(panel_tags(4), "4koma, 4 panels, comic strip");
    }

    #[test]
    fn other_counts_use_generic_layout() {
        assert_eq!(panel_tags(0), MULTI_PANEL_FALLBACK);
        assert_eq!(panel_tags(6), MULTI_PANEL_FALLBACK);
    }
}
