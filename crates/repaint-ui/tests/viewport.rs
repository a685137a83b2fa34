use std::sync::Arc;

use repaint_core::*;
use repaint_ui::*;

/// Every pixel encodes its own view coordinates.
struct Coords;

fn coord_color(x: i32, y: i32) -> Color {
    Color::from_rgb(x as u8, y as u8, 7)
}

impl Widget for Coords {
    fn paint(&self, cx: &mut PaintCx<'_, '_>) {
        let clip = cx.clip();
        let g = cx.graphics();
        for y in clip.y..clip.y + clip.h {
            for x in clip.x..clip.x + clip.w {
                g.fill_rect(Rect::new(x, y, 1, 1), coord_color(x, y));
            }
        }
    }
}

const VIEWPORT: Rect = Rect::new(10, 10, 40, 30);

struct Fixture {
    queue: EventQueue,
    rm: Arc<RepaintManager>,
    window: ComponentId,
    viewport: Viewport,
}

fn fixture() -> Fixture {
    let tree = ComponentTree::new().into_shared();
    let window = tree
        .write()
        .insert_window(Rect::new(0, 0, 100, 100), Arc::new(Panel::new(Color::WHITE)));
    let queue = EventQueue::new();
    let rm = RepaintManager::new(tree, queue.clone(), RepaintConfig::default());
    let viewport = Viewport::new(&rm, window, VIEWPORT, Color::BLACK).unwrap();
    viewport
        .set_view(Arc::new(Coords), Size::new(200, 200))
        .unwrap();
    viewport.set_backing_store_enabled(true);
    queue.run_pending();
    Fixture {
        queue,
        rm,
        window,
        viewport,
    }
}

impl Fixture {
    fn scroll_to(&self, x: i32, y: i32) -> Option<ViewportPaint> {
        self.viewport.set_view_position(Point::new(x, y)).unwrap();
        self.queue.run_pending();
        self.viewport.last_paint()
    }

    /// Asserts that the window shows the view from `pos` inside the viewport.
    fn assert_shows(&self, pos: Point) {
        self.rm
            .with_window_surface(self.window, |img| {
                for y in 0..VIEWPORT.h {
                    for x in 0..VIEWPORT.w {
                        assert_eq!(
                            img.pixel(VIEWPORT.x + x, VIEWPORT.y + y),
                            Some(coord_color(pos.x + x, pos.y + y)),
                            "pixel ({x}, {y}) at view position {pos:?}"
                        );
                    }
                }
            })
            .unwrap();
    }
}

#[test]
fn first_backed_paint_is_full() {
    let f = fixture();
    assert_eq!(f.viewport.last_paint(), Some(ViewportPaint::Full));
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Backed);
    f.assert_shows(Point::ORIGIN);
}

#[test]
fn scroll_just_under_the_extent_blits() {
    let f = fixture();
    let h = VIEWPORT.h;

    f.viewport.set_view_position(Point::new(0, h - 1)).unwrap();
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Scrolling);
    f.queue.run_pending();

    assert_eq!(
        f.viewport.last_paint(),
        Some(ViewportPaint::Blit(Blit {
            from: Point::new(0, h - 1),
            to: Point::ORIGIN,
            size: Size::new(VIEWPORT.w, 1),
            paint: Rect::new(0, 1, VIEWPORT.w, h - 1),
        }))
    );
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Backed);
    f.assert_shows(Point::new(0, h - 1));

    // Back up again by a few rows: still a blit, exposing the top strip.
    let paint = f.scroll_to(0, h - 4);
    assert!(matches!(paint, Some(ViewportPaint::Blit(b)) if b.paint == Rect::new(0, 0, VIEWPORT.w, 3)));
    f.assert_shows(Point::new(0, h - 4));
}

#[test]
fn horizontal_blit_keeps_pixels_correct() {
    let f = fixture();
    assert!(matches!(f.scroll_to(VIEWPORT.w - 1, 0), Some(ViewportPaint::Blit(_))));
    f.assert_shows(Point::new(VIEWPORT.w - 1, 0));
    assert!(matches!(f.scroll_to(12, 0), Some(ViewportPaint::Blit(_))));
    f.assert_shows(Point::new(12, 0));
}

#[test]
fn scroll_by_a_whole_extent_repaints_fully() {
    let f = fixture();
    assert_eq!(f.scroll_to(VIEWPORT.w, 0), Some(ViewportPaint::Full));
    f.assert_shows(Point::new(VIEWPORT.w, 0));
    assert_eq!(f.scroll_to(VIEWPORT.w, VIEWPORT.h), Some(ViewportPaint::Full));
    f.assert_shows(Point::new(VIEWPORT.w, VIEWPORT.h));
}

#[test]
fn diagonal_scroll_repaints_fully() {
    let f = fixture();
    assert_eq!(f.scroll_to(5, 5), Some(ViewportPaint::Full));
    f.assert_shows(Point::new(5, 5));
}

#[test]
fn without_backing_store_paints_directly() {
    let f = fixture();
    f.viewport.set_backing_store_enabled(false);
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Normal);
    assert_eq!(f.scroll_to(0, 3), Some(ViewportPaint::Direct));
    f.assert_shows(Point::new(0, 3));
}

#[test]
fn view_position_clamps_negative_coordinates() {
    let f = fixture();
    f.scroll_to(20, 20);
    f.viewport.set_view_position(Point::new(-5, 7)).unwrap();
    assert_eq!(f.viewport.view_position(), Point::new(0, 7));
    assert_eq!(f.viewport.view_rect(), Rect::new(0, 7, 40, 30));
    assert_eq!(f.viewport.extent_size(), Size::new(40, 30));
    assert_eq!(f.viewport.view_size(), Size::new(200, 200));
}

#[test]
fn unchanged_position_schedules_nothing() {
    let f = fixture();
    f.viewport.set_view_position(Point::ORIGIN).unwrap();
    assert!(f.queue.is_empty());
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Backed);
}

#[test]
fn scroll_rect_to_visible_moves_minimally() {
    let f = fixture();
    f.viewport
        .scroll_rect_to_visible(Rect::new(0, 100, 10, 10))
        .unwrap();
    assert_eq!(f.viewport.view_position(), Point::new(0, 80));
    // Explicit scrolls repaint through the backing store in full.
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Backed);
    f.queue.run_pending();
    assert_eq!(f.viewport.last_paint(), Some(ViewportPaint::Full));
    f.assert_shows(Point::new(0, 80));

    // Already visible: no move.
    f.viewport
        .scroll_rect_to_visible(Rect::new(5, 85, 10, 10))
        .unwrap();
    assert_eq!(f.viewport.view_position(), Point::new(0, 80));

    // Above the visible area.
    f.viewport
        .scroll_rect_to_visible(Rect::new(0, 60, 10, 10))
        .unwrap();
    assert_eq!(f.viewport.view_position(), Point::new(0, 60));
}

#[test]
fn resize_drops_backing_image() {
    let f = fixture();
    f.viewport.reshape(Rect::new(10, 10, 60, 30)).unwrap();
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Normal);
    f.queue.run_pending();
    assert_eq!(f.viewport.last_paint(), Some(ViewportPaint::Full));
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Backed);
}

#[test]
fn set_view_replaces_the_previous_view() {
    let f = fixture();
    let first = f.viewport.view().unwrap();
    let second = f
        .viewport
        .set_view(Arc::new(NoopWidget), Size::new(10, 10))
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(f.viewport.view(), Some(second));
    assert_eq!(f.rm.tree().read().children(f.viewport.id()), &[second]);
    assert!(!f.rm.tree().read().contains(first));
}

#[test]
fn failed_set_view_keeps_the_current_view() {
    let f = fixture();
    let view = f.viewport.view();
    assert!(matches!(
        f.viewport.set_view(Arc::new(NoopWidget), Size::new(-1, 10)),
        Err(Error::NegativeSize(_))
    ));
    assert_eq!(f.viewport.view(), view);
    assert_eq!(f.viewport.view_size(), Size::new(200, 200));
}

#[test]
fn view_resize_after_a_scroll_repaints_fully() {
    let f = fixture();
    let h = VIEWPORT.h;
    f.viewport.set_view_position(Point::new(0, h - 1)).unwrap();
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Scrolling);

    f.viewport.set_view_size(Size::new(200, 300)).unwrap();
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Backed);
    f.queue.run_pending();

    assert_eq!(f.viewport.last_paint(), Some(ViewportPaint::Full));
    assert_eq!(f.viewport.view_size(), Size::new(200, 300));
    assert_eq!(f.viewport.view_position(), Point::new(0, h - 1));
    f.assert_shows(Point::new(0, h - 1));

    assert!(matches!(
        f.viewport.set_view_size(Size::new(10, -1)),
        Err(Error::NegativeSize(_))
    ));
}

#[test]
fn extent_resize_keeps_location_and_drops_backing_image() {
    let f = fixture();
    f.viewport.set_extent_size(Size::new(30, 20)).unwrap();
    assert_eq!(f.viewport.extent_size(), Size::new(30, 20));
    assert_eq!(
        f.rm.tree().read().bounds(f.viewport.id()),
        Some(Rect::new(VIEWPORT.x, VIEWPORT.y, 30, 20))
    );
    assert_eq!(f.viewport.scroll_mode(), ScrollMode::Normal);
    f.queue.run_pending();
    assert_eq!(f.viewport.last_paint(), Some(ViewportPaint::Full));
}

