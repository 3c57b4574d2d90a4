//! Plane classification from image orientation direction cosines

use crate::domain::PlaneLabel;

/// Minimum magnitude for a cosine component to count as dominant
const DOMINANCE_THRESHOLD: f64 = 0.25;

/// Patient-relative anatomical direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Anterior,
    Posterior,
    Head,
    Foot,
}

impl Direction {
    pub fn letter(&self) -> &'static str {
        match self {
            Direction::Right => "R",
            Direction::Left => "L",
            Direction::Anterior => "A",
            Direction::Posterior => "P",
            Direction::Head => "H",
            Direction::Foot => "F",
        }
    }

    fn family(&self) -> AxisFamily {
        match self {
            Direction::Right | Direction::Left => AxisFamily::RightLeft,
            Direction::Anterior | Direction::Posterior => AxisFamily::AnteriorPosterior,
            Direction::Head | Direction::Foot => AxisFamily::HeadFoot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisFamily {
    RightLeft,
    AnteriorPosterior,
    HeadFoot,
}

/// Dominant anatomical direction of a direction cosine
///
/// The winning component must exceed 0.25 in magnitude and strictly exceed
/// both others; ties and all-small vectors give `None`.
pub fn major_axis(x: f64, y: f64, z: f64) -> Option<Direction> {
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());

    if ax > DOMINANCE_THRESHOLD && ax > ay && ax > az {
        Some(if x < 0.0 { Direction::Right } else { Direction::Left })
    } else if ay > DOMINANCE_THRESHOLD && ay > ax && ay > az {
        Some(if y < 0.0 { Direction::Anterior } else { Direction::Posterior })
    } else if az > DOMINANCE_THRESHOLD && az > ax && az > ay {
        Some(if z < 0.0 { Direction::Foot } else { Direction::Head })
    } else {
        None
    }
}

/// Letter for a classified axis, empty when no axis dominates
pub fn axis_letter(direction: Option<Direction>) -> &'static str {
    direction.map_or("", |d| d.letter())
}

/// Plane label from the row and column direction cosines
///
/// Pairings other than R/L+A/P, R/L+H/F and A/P+H/F are oblique.
pub fn classify_plane(row: [f64; 3], col: [f64; 3]) -> PlaneLabel {
    let (Some(row_axis), Some(col_axis)) = (
        major_axis(row[0], row[1], row[2]),
        major_axis(col[0], col[1], col[2]),
    ) else {
        return PlaneLabel::Oblique;
    };

    use AxisFamily::*;
    match (row_axis.family(), col_axis.family()) {
        (RightLeft, AnteriorPosterior) | (AnteriorPosterior, RightLeft) => PlaneLabel::Axial,
        (RightLeft, HeadFoot) => PlaneLabel::Coronal,
        (AnteriorPosterior, HeadFoot) => PlaneLabel::Sagittal,
        _ => PlaneLabel::Oblique,
    }
}
