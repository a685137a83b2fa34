use std::sync::Arc;

use repaint_core::prelude::*;
use repaint_devtools::Inspector;
use repaint_platform::{UiContext, init_logging};
use repaint_ui::{Panel, Viewport, ViewportPaint};

const ROW_HEIGHT: i32 = 18;

/// A long list of alternating rows.
struct Rows;

impl Widget for Rows {
    fn paint(&self, cx: &mut PaintCx<'_, '_>) {
        let clip = cx.clip();
        let width = cx.size().width;
        let g = cx.graphics();
        let first = clip.y.div_euclid(ROW_HEIGHT);
        let last = (clip.y + clip.h).div_euclid(ROW_HEIGHT);
        for row in first..=last {
            let color = if row % 2 == 0 {
                Color::from_hex("#2A2F3A")
            } else {
                Color::from_hex("#323846")
            };
            g.fill_rect(Rect::new(0, row * ROW_HEIGHT, width, ROW_HEIGHT), color);
            // Row marker
            g.fill_rect(
                Rect::new(4, row * ROW_HEIGHT + 4, (row % 40) * 4 + 8, ROW_HEIGHT - 8),
                Color::from_hex("#44AAFF"),
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let cx = UiContext::from_env();
    let rm = cx.repaint_manager().clone();
    let inspector = Inspector::attach(&rm);

    let window = cx.tree().write().insert_window(
        Rect::new(0, 0, 320, 240),
        Arc::new(Panel::new(Color::from_hex("#221628"))),
    );
    let viewport = Viewport::new(&rm, window, Rect::new(20, 20, 280, 200), Color::BLACK)?;
    viewport.set_view(Arc::new(Rows), Size::new(280, ROW_HEIGHT * 500))?;
    viewport.set_backing_store_enabled(true);

    cx.spawn_dispatch_thread()?;
    cx.invoke_and_wait(|| ())?;

    let (mut blits, mut full) = (0, 0);
    let steps = [6, 6, 6, 12, 24, 199, 200, 480, -30, -6];
    for dy in steps.iter().cycle().take(200) {
        let pos = viewport.view_position();
        viewport.set_view_position(Point::new(pos.x, pos.y + dy))?;
        cx.invoke_and_wait(|| ())?;
        match viewport.last_paint() {
            Some(ViewportPaint::Blit(_)) => blits += 1,
            Some(_) => full += 1,
            None => {}
        }
    }

    log::info!("{}", inspector.summary());
    println!(
        "scrolled to {:?}: {blits} blits, {full} full repaints; {}",
        viewport.view_position(),
        inspector.summary()
    );

    cx.shutdown();
    Ok(())
}
