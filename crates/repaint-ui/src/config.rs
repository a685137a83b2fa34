use repaint_core::Size;

/// Settings a [`RepaintManager`](crate::RepaintManager) starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepaintConfig {
    /// Paint through the shared offscreen buffer. Off when the platform
    /// already double buffers natively.
    pub double_buffering: bool,
    /// Explicit ceiling for the offscreen buffer; `None` means the screen size.
    pub max_double_buffer_size: Option<Size>,
    pub screen_size: Size,
}

impl Default for RepaintConfig {
    fn default() -> Self {
        Self {
            double_buffering: true,
            max_double_buffer_size: None,
            screen_size: Size::new(1280, 800),
        }
    }
}

impl RepaintConfig {
    pub const NATIVE_DOUBLE_BUFFERING_VAR: &'static str = "REPAINT_NATIVE_DOUBLE_BUFFERING";
    pub const SCREEN_SIZE_VAR: &'static str = "REPAINT_SCREEN_SIZE";

    /// Defaults overridden by `REPAINT_NATIVE_DOUBLE_BUFFERING=true` and
    /// `REPAINT_SCREEN_SIZE=WxH`. Malformed values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = lookup(Self::NATIVE_DOUBLE_BUFFERING_VAR) {
            match v.trim().parse::<bool>() {
                Ok(native) => cfg.double_buffering = !native,
                Err(_) => log::warn!(
                    "ignoring {}={v:?}: expected true or false",
                    Self::NATIVE_DOUBLE_BUFFERING_VAR
                ),
            }
        }
        if let Some(v) = lookup(Self::SCREEN_SIZE_VAR) {
            match parse_size(&v) {
                Some(size) => cfg.screen_size = size,
                None => log::warn!("ignoring {}={v:?}: expected WxH", Self::SCREEN_SIZE_VAR),
            }
        }
        cfg
    }

    pub fn effective_max_size(&self) -> Size {
        self.max_double_buffer_size.unwrap_or(self.screen_size)
    }
}

fn parse_size(s: &str) -> Option<Size> {
    let (w, h) = s.trim().split_once(['x', 'X'])?;
    let w: i32 = w.trim().parse().ok()?;
    let h: i32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some(Size::new(w, h))
}
