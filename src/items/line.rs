use crate::graph::{Graph, ItemId, PointId};

use super::{ItemKind, Outline, Resolve};

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: PointId,
    pub end: PointId,
}

impl Resolve for Line {
    fn parameters(&self) -> Vec<PointId> {
        vec![self.start, self.end]
    }

    fn resolve(&self, graph: &Graph) -> Option<Outline> {
        let a = graph.position(self.start)?;
        let b = graph.position(self.end)?;
        Some(Outline::Segment(kurbo::Line::new(a, b)))
    }
}

impl Graph {
    pub fn add_line(&mut self, start: PointId, end: PointId) -> ItemId {
        self.add_item(ItemKind::Line(Line { start, end }))
    }

    /// Euclidean distance between the end points of a line item.
    pub fn line_length(&self, id: ItemId) -> Option<f64> {
        match &self.item(id)?.kind {
            ItemKind::Line(line) => {
                Some(self.position(line.start)?.distance(self.position(line.end)?))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_tracks_end_points() {
        let mut g = Graph::new();
        let a = g.add_point(0.0, 0.0);
        let b = g.add_point(3.0, 4.0);
        let line = g.add_line(a, b);
        assert_eq!(g.line_length(line), Some(5.0));
        g.set(b, 0.0, 2.0).unwrap();
        assert_eq!(g.line_length(line), Some(2.0));
    }
}
