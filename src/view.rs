//! Per-window view state: reading position, zoom factor and fit mode.
//!
//! Zoom and fit are linked by one rule only: an explicit zoom (`zoom_in`, `zoom_out`,
//! `set_zoom`) switches to [`FitMode::Custom`], and a fit action resets the factor to
//! 1.0. Navigation clamps silently; it never fails.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;
pub const ZOOM_RATIO: f32 = 1.2;
/// Zoom change per mouse-wheel step in [`WheelMode::Zoom`].
pub const WHEEL_ZOOM_STEP: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Page,
    Width,
    Custom,
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FitMode::Page => "page",
            FitMode::Width => "width",
            FitMode::Custom => "custom",
        })
    }
}

/// What a mouse-wheel step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WheelMode {
    #[default]
    Pages,
    Zoom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    current_page: usize,
    page_count: usize,
    zoom: f32,
    fit_mode: FitMode,
    wheel_mode: WheelMode,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(FitMode::Page)
    }
}

impl ViewState {
    pub fn new(fit_mode: FitMode) -> Self {
        Self {
            current_page: 1,
            page_count: 0,
            zoom: 1.0,
            fit_mode,
            wheel_mode: WheelMode::Pages,
        }
    }

    /// Points the view at a freshly opened document. Zoom settings carry over.
    pub fn reset_for(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.current_page = 1;
    }

    /// Forgets the document; navigation becomes a no-op until the next `reset_for`.
    pub fn clear(&mut self) {
        self.page_count = 0;
        self.current_page = 1;
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn wheel_mode(&self) -> WheelMode {
        self.wheel_mode
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page <= 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.page_count
    }

    // Navigation. Each returns whether the page changed.

    pub fn next_page(&mut self) -> bool {
        if self.current_page < self.page_count {
            self.current_page += 1;
            return true;
        }
        false
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page_count > 0 && self.current_page > 1 {
            self.current_page -= 1;
            return true;
        }
        false
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to_page(self.page_count)
    }

    /// Jumps to `page` when it lies in `1..=page_count`; anything else is ignored.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.page_count || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    // Zoom and fit.

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_RATIO);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / ZOOM_RATIO);
    }

    /// Sets an explicit zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, level: f32) {
        self.zoom = if level.is_nan() {
            1.0
        } else {
            level.clamp(MIN_ZOOM, MAX_ZOOM)
        };
        self.fit_mode = FitMode::Custom;
    }

    pub fn fit_to_page(&mut self) {
        self.zoom = 1.0;
        self.fit_mode = FitMode::Page;
    }

    pub fn fit_to_width(&mut self) {
        self.zoom = 1.0;
        self.fit_mode = FitMode::Width;
    }

    /// Flips between fit-to-page and actual size.
    pub fn toggle_zoom(&mut self) {
        if self.fit_mode == FitMode::Page {
            self.set_zoom(1.0);
        } else {
            self.fit_to_page();
        }
    }

    pub fn toggle_wheel_mode(&mut self) {
        self.wheel_mode = match self.wheel_mode {
            WheelMode::Pages => WheelMode::Zoom,
            WheelMode::Zoom => WheelMode::Pages,
        };
    }

    /// Applies one wheel step; positive `steps` scroll forward / zoom in.
    /// Returns whether the page changed.
    pub fn wheel(&mut self, steps: i32) -> bool {
        match self.wheel_mode {
            WheelMode::Pages if steps > 0 => self.next_page(),
            WheelMode::Pages if steps < 0 => self.prev_page(),
            WheelMode::Pages => false,
            WheelMode::Zoom => {
                if steps != 0 {
                    self.set_zoom(self.zoom + WHEEL_ZOOM_STEP * steps as f32);
                }
                false
            }
        }
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0) as u32
    }

    pub fn status_label(&self) -> String {
        format!("Zoom: {}% ({})", self.zoom_percent(), self.fit_mode)
    }

    /// On-screen size of a page image with intrinsic size `image` inside `viewport`.
    ///
    /// `Page` scales uniformly to fit the whole page, `Width` scales uniformly to the
    /// viewport width, `Custom` applies the zoom factor to the intrinsic size.
    pub fn display_size(&self, image: (u32, u32), viewport: (u32, u32)) -> (u32, u32) {
        let (iw, ih) = (image.0.max(1) as f32, image.1.max(1) as f32);
        let (vw, vh) = (viewport.0.max(1) as f32, viewport.1.max(1) as f32);
        let scale = match self.fit_mode {
            FitMode::Page => (vw / iw).min(vh / ih),
            FitMode::Width => vw / iw,
            FitMode::Custom => self.zoom,
        };
        (
            ((iw * scale).round() as u32).max(1),
            ((ih * scale).round() as u32).max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(page_count: usize) -> ViewState {
        let mut view = ViewState::default();
        view.reset_for(page_count);
        view
    }

    #[test]
    fn set_zoom_clamps_and_forces_custom() {
        let mut view = ViewState::default();
        view.set_zoom(10.0);
        assert_eq!(view.zoom(), 5.0);
        assert_eq!(view.fit_mode(), FitMode::Custom);
        view.set_zoom(0.01);
        assert_eq!(view.zoom(), 0.1);
        view.set_zoom(f32::NAN);
        assert_eq!(view.zoom(), 1.0);
    }

    #[test]
    fn zoom_in_after_fit_goes_custom_and_fit_resets() {
        let mut view = ViewState::default();
        view.fit_to_page();
        view.zoom_in();
        assert_eq!(view.fit_mode(), FitMode::Custom);
        assert!((view.zoom() - 1.2).abs() < 1e-6);

        view.fit_to_width();
        assert_eq!(view.zoom(), 1.0);
        assert_eq!(view.fit_mode(), FitMode::Width);
    }

    #[test]
    fn repeated_zoom_stays_in_bounds() {
        let mut view = ViewState::default();
        for _ in 0..50 {
            view.zoom_in();
        }
        assert_eq!(view.zoom(), MAX_ZOOM);
        for _ in 0..100 {
            view.zoom_out();
        }
        assert_eq!(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn toggle_zoom_flips_between_page_and_actual_size() {
        let mut view = ViewState::default();
        view.toggle_zoom();
        assert_eq!((view.fit_mode(), view.zoom()), (FitMode::Custom, 1.0));
        view.toggle_zoom();
        assert_eq!(view.fit_mode(), FitMode::Page);
        view.fit_to_width();
        view.toggle_zoom();
        assert_eq!(view.fit_mode(), FitMode::Page);
    }

    #[test]
    fn navigation_is_noop_at_bounds() {
        let mut view = at(3);
        assert!(!view.prev_page());
        assert_eq!(view.current_page(), 1);
        assert!(view.next_page());
        assert!(view.next_page());
        assert!(!view.next_page());
        assert_eq!(view.current_page(), 3);
        assert!(view.is_last_page());
        assert!(view.first_page());
        assert!(view.is_first_page());
        assert!(view.last_page());
        assert_eq!(view.current_page(), 3);
    }

    #[test]
    fn go_to_page_rejects_out_of_range() {
        let mut view = at(5);
        assert!(!view.go_to_page(0));
        assert!(!view.go_to_page(6));
        assert!(view.go_to_page(4));
        assert_eq!(view.current_page(), 4);
    }

    #[test]
    fn navigation_without_document_does_nothing() {
        let mut view = ViewState::default();
        assert!(!view.next_page());
        assert!(!view.prev_page());
        assert!(!view.last_page());
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn wheel_follows_mode() {
        let mut view = at(2);
        assert!(view.wheel(1));
        assert_eq!(view.current_page(), 2);

        view.toggle_wheel_mode();
        assert_eq!(view.wheel_mode(), WheelMode::Zoom);
        assert!(!view.wheel(1));
        assert!((view.zoom() - 1.2).abs() < 1e-6);
        assert_eq!(view.fit_mode(), FitMode::Custom);
        assert_eq!(view.current_page(), 2);
    }

    #[test]
    fn status_label_reports_percent_and_mode() {
        let mut view = ViewState::default();
        assert_eq!(view.status_label(), "Zoom: 100% (page)");
        view.set_zoom(2.5);
        assert_eq!(view.status_label(), "Zoom: 250% (custom)");
    }

    #[test]
    fn display_size_per_fit_mode() {
        let mut view = ViewState::default();
        assert_eq!(view.display_size((1000, 2000), (500, 500)), (250, 500));

        view.fit_to_width();
        assert_eq!(view.display_size((1000, 2000), (500, 500)), (500, 1000));

        view.set_zoom(0.5);
        assert_eq!(view.display_size((1000, 2000), (500, 500)), (500, 1000));
        view.set_zoom(2.0);
        assert_eq!(view.display_size((100, 50), (10, 10)), (200, 100));
    }
}
