/// A free rectangle in the guillotine packer.
#[derive(Debug, Clone)]
struct FreeRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

/// Stateful 2D rectangle packer.
///
/// Guillotine strategy with Best Short Side Fit placement: each `insert`
/// picks the free rectangle whose leftover short side is minimal, then
/// splits the remainder into right and bottom free rectangles. Placements
/// never overlap and are final once returned.
#[derive(Debug)]
pub struct RectangularBin {
    width: u32,
    height: u32,
    free_rects: Vec<FreeRect>,
}

impl RectangularBin {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            free_rects: vec![FreeRect {
                x: 0,
                y: 0,
                w: width,
                h: height,
            }],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Place a `w` x `h` rectangle; returns its top-left corner, or
    /// `None` when no free rectangle can hold it.
    pub fn insert(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 {
            return None;
        }

        let best = self.find_bssf(w, h)?;
        let rect = self.free_rects.swap_remove(best);
        let position = (rect.x, rect.y);

        self.split(&rect, w, h);

        Some(position)
    }

    /// Best Short Side Fit: free rectangle minimizing the smaller leftover
    /// dimension.
    fn find_bssf(&self, w: u32, h: u32) -> Option<usize> {
        let mut best_idx = None;
        let mut best_short_side = u32::MAX;

        for (i, rect) in self.free_rects.iter().enumerate() {
            if rect.w >= w && rect.h >= h {
                let short_side = (rect.w - w).min(rect.h - h);
                if short_side < best_short_side {
                    best_short_side = short_side;
                    best_idx = Some(i);
                }
            }
        }

        best_idx
    }

    /// Guillotine split of the leftover area into right and bottom strips.
    fn split(&mut self, rect: &FreeRect, w: u32, h: u32) {
        let right_w = rect.w - w;
        let below_h = rect.h - h;

        if right_w > 0 {
            self.free_rects.push(FreeRect {
                x: rect.x + w,
                y: rect.y,
                w: right_w,
                h,
            });
        }

        if below_h > 0 {
            self.free_rects.push(FreeRect {
                x: rect.x,
                y: rect.y + h,
                w: rect.w,
                h: below_h,
            });
        }
    }
}
