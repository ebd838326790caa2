//! Hero slide ordering
//!
//! Moving a slide one step up or down is planned against the full slide list
//! and produces the final order of every slide, which is sent to the backend
//! in a single batched reorder request.

use std::str::FromStr;

use serde::Deserialize;

use crate::models::{HeroSlide, SlideOrder};

/// Direction of a one-step move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

impl FromStr for MoveDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(MoveDirection::Up),
            "down" => Ok(MoveDirection::Down),
            _ => Err(anyhow::anyhow!("Invalid direction: {}", s)),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Hero slide not found: {0}")]
    NotFound(String),

    #[error("Hero slide {0} is already at the edge")]
    AtEdge(String),
}

/// Plan moving slide `id` one step in `direction`.
///
/// Slides are ranked by `(order, id)`, the two neighbours swap places and the
/// whole list is renumbered from 1, so duplicate or sparse order values from
/// the backend come out consistent.
pub fn plan_move(
    slides: &[HeroSlide],
    id: &str,
    direction: MoveDirection,
) -> Result<Vec<SlideOrder>, ReorderError> {
    let mut ranked: Vec<&HeroSlide> = slides.iter().collect();
    ranked.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.as_str().cmp(b.id.as_str())));

    let index = ranked
        .iter()
        .position(|s| s.id.as_str() == id)
        .ok_or_else(|| ReorderError::NotFound(id.to_string()))?;

    let neighbour = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => Some(index + 1).filter(|&i| i < ranked.len()),
    }
    .ok_or_else(|| ReorderError::AtEdge(id.to_string()))?;

    ranked.swap(index, neighbour);

    Ok(ranked
        .into_iter()
        .enumerate()
        .map(|(position, slide)| SlideOrder {
            id: slide.id.clone(),
            order: position as i32 + 1,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(id: &str, order: i32) -> HeroSlide {
        serde_json::from_value(serde_json::json!({"id": id, "title": id, "order": order})).unwrap()
    }

    fn ids(orders: &[SlideOrder]) -> Vec<(&str, i32)> {
        orders.iter().map(|o| (o.id.as_str(), o.order)).collect()
    }

    #[test]
    fn test_move_up_swaps_with_previous() {
        let slides = vec![slide("c", 3), slide("a", 1), slide("b", 2)];
        let plan = plan_move(&slides, "b", MoveDirection::Up).unwrap();
        assert_eq!(ids(&plan), vec![("b", 1), ("a", 2), ("c", 3)]);
    }

    #[test]
    fn test_move_down_swaps_with_next() {
        let slides = vec![slide("a", 1), slide("b", 2), slide("c", 3)];
        let plan = plan_move(&slides, "a", MoveDirection::Down).unwrap();
        assert_eq!(ids(&plan), vec![("b", 1), ("a", 2), ("c", 3)]);
    }

    #[test]
    fn test_duplicate_orders_are_renumbered() {
        let slides = vec![slide("a", 5), slide("b", 5), slide("c", 9)];
        let plan = plan_move(&slides, "c", MoveDirection::Up).unwrap();
        assert_eq!(ids(&plan), vec![("a", 1), ("c", 2), ("b", 3)]);
    }

    #[test]
    fn test_edges_rejected() {
        let slides = vec![slide("a", 1), slide("b", 2)];
        assert_eq!(
            plan_move(&slides, "a", MoveDirection::Up),
            Err(ReorderError::AtEdge("a".to_string()))
        );
        assert_eq!(
            plan_move(&slides, "b", MoveDirection::Down),
            Err(ReorderError::AtEdge("b".to_string()))
        );
        assert_eq!(
            plan_move(&slides, "z", MoveDirection::Down),
            Err(ReorderError::NotFound("z".to_string()))
        );
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("UP".parse::<MoveDirection>().unwrap(), MoveDirection::Up);
        assert!("left".parse::<MoveDirection>().is_err());
        let d: MoveDirection = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(d, MoveDirection::Down);
    }
}
