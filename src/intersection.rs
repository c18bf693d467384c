use geo::{CoordNum, Rect};

use crate::errors::{GreenbandsError, Result};

pub trait Intersection {
    type Output;
    fn intersection(&self, rhs: &Self) -> Result<Self::Output>;
}

impl<T: CoordNum> Intersection for Rect<T> {
    type Output = Rect<T>;
    fn intersection(&self, rhs: &Self) -> Result<Rect<T>> {
        let lhs_max = self.max();
        let rhs_min = rhs.min();
        if (lhs_max.x <= rhs_min.x) | (lhs_max.y <= rhs_min.y) {
            return Err(GreenbandsError::NoIntersection);
        }

        let lhs_min = self.min();
        let rhs_max = rhs.max();
        if (lhs_min.x >= rhs_max.x) | (lhs_min.y >= rhs_max.y) {
            return Err(GreenbandsError::NoIntersection);
        }

        let pick = |x: T, y: T, larger: bool| if (x > y) == larger { x } else { y };
        let min = (pick(lhs_min.x, rhs_min.x, true), pick(lhs_min.y, rhs_min.y, true));
        let max = (pick(lhs_max.x, rhs_max.x, false), pick(lhs_max.y, rhs_max.y, false));

        Ok(Self::new(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn overlapping_rects_intersect() {
        let lhs = Rect::new((0., 0.), (4., 4.));
        let rhs = Rect::new((2., 1.), (6., 3.));
        assert_eq!(
            lhs.intersection(&rhs).unwrap(),
            Rect::new((2., 1.), (4., 3.))
        );
    }

    #[rstest]
    #[case(Rect::new((4, 0), (6, 4)))]
    #[case(Rect::new((5, 5), (6, 6)))]
    #[case(Rect::new((-3, -3), (-1, -1)))]
    fn touching_or_disjoint_rects_do_not_intersect(#[case] rhs: Rect<i64>) {
        let lhs = Rect::new((0, 0), (4, 4));
        assert!(matches!(
            lhs.intersection(&rhs),
            Err(GreenbandsError::NoIntersection)
        ));
    }
}
