/// Center-based axis-aligned rectangle in the normalized [-1, 1] world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub cx: f32,
    pub cy: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Rect {
    pub fn new(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            cx,
            cy,
            half_w: width * 0.5,
            half_h: height * 0.5,
        }
    }

    pub fn width(&self) -> f32 {
        self.half_w * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_h * 2.0
    }

    /// Separating-axis test on both axes; touching edges count as overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        (self.cx - other.cx).abs() <= self.half_w + other.half_w
            && (self.cy - other.cy).abs() <= self.half_h + other.half_h
    }
}

pub fn grid_index(coord: f32, cell: f32) -> i32 {
    ((coord + 1.0) / cell).floor() as i32
}

pub fn cell_center(index: i32, cell: f32) -> f32 {
    -1.0 + (index as f32 + 0.5) * cell
}

pub fn snap_to_cell(coord: f32, cell: f32) -> f32 {
    cell_center(grid_index(coord, cell), cell)
}

pub fn squared_distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn overlap_counts_touching_edges() {
        let a = Rect::new(0.0, 0.0, 0.2, 0.2);
        let touching = Rect::new(0.2, 0.0, 0.2, 0.2);
        let separated = Rect::new(0.21, 0.0, 0.2, 0.2);
        assert!(a.overlaps(&touching));
        assert!(!a.overlaps(&separated));
    }

    #[test]
    fn overlap_requires_both_axes() {
        let a = Rect::new(0.0, 0.0, 0.2, 0.2);
        let diagonal = Rect::new(0.3, 0.3, 0.2, 0.2);
        let same_column = Rect::new(0.0, 0.1, 0.2, 0.2);
        assert!(!a.overlaps(&diagonal));
        assert!(a.overlaps(&same_column));
    }

    #[test]
    fn grid_index_and_center_round_trip() {
        let cell = 2.0 / 19.0;
        for index in 0..19 {
            let center = cell_center(index, cell);
            assert_eq!(grid_index(center, cell), index);
        }
    }

    #[test]
    fn snap_recenters_drifted_coordinate() {
        let cell = 2.0 / 17.0;
        let center = cell_center(8, cell);
        assert!(approx_eq(snap_to_cell(center + cell * 0.3, cell), center, 1e-6));
        assert!(approx_eq(snap_to_cell(center - cell * 0.3, cell), center, 1e-6));
    }

    #[test]
    fn squared_distance_is_symmetric() {
        assert!(approx_eq(
            squared_distance(0.0, 0.0, 0.3, 0.4),
            squared_distance(0.3, 0.4, 0.0, 0.0),
            1e-6,
        ));
        assert!(approx_eq(squared_distance(0.0, 0.0, 0.3, 0.4), 0.25, 1e-6));
    }
}
