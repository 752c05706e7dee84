/// A page rectangle given by two corners, in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageGeometry {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// A rectangle anchored at the origin
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    /// Lower-left corner, whichever order the corners were given in
    pub fn origin(&self) -> (f64, f64) {
        (self.x0.min(self.x1), self.y0.min(self.y1))
    }

    pub fn center(&self) -> (f64, f64) {
        let (x, y) = self.origin();
        (x + self.width() / 2.0, y + self.height() / 2.0)
    }

    pub fn is_portrait(&self) -> bool {
        self.height() > self.width()
    }
}
