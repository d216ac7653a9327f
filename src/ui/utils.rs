use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// A `width` x `height` rectangle centred in `area`, shrunk to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    popup
}

/// Centred popup taking `percent_x` of the width, at least `min_width` columns
pub fn popup_rect(percent_x: u16, min_width: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    centered_rect(width.max(min_width), height, area)
}

/// The area inside a one-cell border
pub fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centred_and_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(40, 10, area);
        assert_eq!(popup, Rect::new(30, 15, 40, 10));

        let small = Rect::new(0, 0, 20, 5);
        let clamped = centered_rect(40, 10, small);
        assert_eq!((clamped.width, clamped.height), (20, 5));
    }

    #[test]
    fn popup_rect_respects_minimum_width() {
        let popup = popup_rect(10, 30, 5, Rect::new(0, 0, 100, 20));
        assert_eq!(popup.width, 30);
    }
}
