use repaint_core::{Color, PaintCx, Rect, Widget};

/// Plain container that fills itself with a background colour and paints its
/// children on top. Mark it opaque in the tree when the colour is opaque.
#[derive(Clone, Copy, Debug)]
pub struct Panel {
    pub background: Color,
}

impl Panel {
    pub fn new(background: Color) -> Self {
        Self { background }
    }
}

impl Widget for Panel {
    fn paint(&self, cx: &mut PaintCx<'_, '_>) {
        let size = cx.size();
        cx.graphics().fill_rect(Rect::from_size(size), self.background);
        cx.paint_children();
    }
}
