#[cfg(test)]
mod tests {
    use crate::Color;
    use crate::ComponentFlags;
    use crate::ComponentTree;
    use crate::Error;
    use crate::Image;
    use crate::NoopWidget;
    use crate::PaintCx;
    use crate::Point;
    use crate::Rect;
    use crate::Widget;
    use std::sync::Arc;

    struct Fill(Color);

    impl Widget for Fill {
        fn paint(&self, cx: &mut PaintCx<'_, '_>) {
            let size = cx.size();
            cx.graphics().fill_rect(Rect::from_size(size), self.0);
            cx.paint_children();
        }
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF5733");
        assert_eq!(c, Color(255, 87, 51, 255));

        let c_alpha = Color::from_hex("#FF5733AA");
        assert_eq!(c_alpha, Color(255, 87, 51, 170));
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10, 10, 100, 50);

        assert!(rect.contains(Point::new(50, 30)));
        assert!(!rect.contains(Point::new(5, 30)));
        assert!(!rect.contains(Point::new(50, 70)));
    }

    #[test]
    fn test_children_inherit_realization() {
        let mut tree = ComponentTree::new();
        let win = tree.insert_window(Rect::new(0, 0, 100, 100), Arc::new(NoopWidget));
        let a = tree
            .insert_child(win, Rect::new(0, 0, 50, 50), Arc::new(NoopWidget))
            .unwrap();
        assert!(tree.flags(a).contains(ComponentFlags::REALIZED));

        tree.set_realized(win, false).unwrap();
        assert!(!tree.flags(a).contains(ComponentFlags::REALIZED));
        assert!(!tree.is_showing(a));
    }

    #[test]
    fn test_iconified_window_is_not_showing() {
        let mut tree = ComponentTree::new();
        let win = tree.insert_window(Rect::new(0, 0, 100, 100), Arc::new(NoopWidget));
        let a = tree
            .insert_child(win, Rect::new(0, 0, 50, 50), Arc::new(NoopWidget))
            .unwrap();
        assert!(tree.is_showing(a));
        tree.set_iconified(win, true).unwrap();
        assert!(!tree.is_showing(a));
    }

    #[test]
    fn test_remove_takes_subtree() {
        let mut tree = ComponentTree::new();
        let win = tree.insert_window(Rect::new(0, 0, 100, 100), Arc::new(NoopWidget));
        let a = tree
            .insert_child(win, Rect::new(0, 0, 50, 50), Arc::new(NoopWidget))
            .unwrap();
        let b = tree
            .insert_child(a, Rect::new(0, 0, 5, 5), Arc::new(NoopWidget))
            .unwrap();
        let removed = tree.remove(a).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(b));
        assert!(tree.children(win).is_empty());
        assert!(matches!(
            tree.set_bounds(b, Rect::ZERO),
            Err(Error::UnknownComponent(_))
        ));
    }

    #[test]
    fn test_negative_bounds_are_rejected() {
        let mut tree = ComponentTree::new();
        let win = tree.insert_window(Rect::new(0, 0, 100, 100), Arc::new(NoopWidget));
        let err = tree
            .insert_child(win, Rect::new(0, 0, -1, 5), Arc::new(NoopWidget))
            .unwrap_err();
        assert!(matches!(err, Error::NegativeSize(_)));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut tree = ComponentTree::new();
        let win = tree.insert_window(Rect::new(0, 0, 100, 100), Arc::new(NoopWidget));
        let a = tree
            .insert_child(win, Rect::new(0, 0, 50, 50), Arc::new(NoopWidget))
            .unwrap();
        let b = tree
            .insert_child(a, Rect::new(0, 0, 5, 5), Arc::new(NoopWidget))
            .unwrap();
        assert!(matches!(tree.reparent(a, b), Err(Error::NotAChild(_))));
        tree.reparent(b, win).unwrap();
        assert_eq!(tree.parent(b), Some(win));
    }

    #[test]
    fn test_snapshot_paints_children_in_local_space() {
        let red = Color::from_rgb(255, 0, 0);
        let blue = Color::from_rgb(0, 0, 255);
        let mut tree = ComponentTree::new();
        let win = tree.insert_window(Rect::new(0, 0, 10, 10), Arc::new(Fill(red)));
        let child = tree
            .insert_child(win, Rect::new(4, 4, 2, 2), Arc::new(Fill(blue)))
            .unwrap();
        let hidden = tree
            .insert_child(win, Rect::new(0, 0, 2, 2), Arc::new(Fill(blue)))
            .unwrap();
        tree.set_visible(hidden, false).unwrap();

        let snap = tree.snapshot(win).unwrap();
        assert_eq!(snap.children.len(), 1);
        assert_eq!(snap.children[0].id, child);

        let mut img = Image::new(10, 10);
        snap.paint(&mut img.graphics());
        assert_eq!(img.pixel(0, 0), Some(red));
        assert_eq!(img.pixel(4, 4), Some(blue));
        assert_eq!(img.pixel(5, 5), Some(blue));
        assert_eq!(img.pixel(6, 6), Some(red));
    }
}
