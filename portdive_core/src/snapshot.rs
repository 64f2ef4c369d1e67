//! Read-only views of a game for front-ends and exporters.

use crate::game::{Game, GameStatus};
use crate::matrix::{Fragment, RowStatus};
use crate::pwner::ElementStatus;
use serde::{Deserialize, Serialize};

/// One matrix row as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowView {
    pub fragments: Vec<Fragment>,
    pub selectable: bool,
    pub status: RowStatus,
}

/// One pwner element as shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementView {
    pub fragment: Fragment,
    pub selectable: bool,
    pub status: ElementStatus,
}

/// Everything a renderer may show. The key is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub tick: u64,
    pub rows: Vec<RowView>,
    pub pwner: Vec<ElementView>,
}

impl GameSnapshot {
    pub(crate) fn capture(game: &Game) -> Self {
        Self {
            status: game.status(),
            tick: game.tick_count(),
            rows: game
                .matrix()
                .rows()
                .iter()
                .map(|r| RowView {
                    fragments: r.fragments().to_vec(),
                    selectable: r.selectable(),
                    status: r.status(),
                })
                .collect(),
            pwner: game
                .pwner()
                .elements()
                .iter()
                .map(|e| ElementView {
                    fragment: e.fragment(),
                    selectable: e.selectable(),
                    status: e.status(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reference_rows;

    #[test]
    fn test_snapshot_mirrors_game() {
        let game = Game::new(reference_rows(), 4).unwrap();
        let snapshot = game.snapshot();

        assert_eq!(snapshot.status, GameStatus::InProgress);
        assert_eq!(snapshot.rows.len(), 8);
        assert_eq!(snapshot.pwner.len(), 4);
        for (view, row) in snapshot.rows.iter().zip(game.matrix().rows()) {
            assert_eq!(view.fragments, row.fragments());
            assert_eq!(view.status == RowStatus::Active, view.selectable);
        }
    }

    #[test]
    fn test_snapshot_serializes_without_key() {
        let game = Game::new(reference_rows(), 4).unwrap();
        let json = serde_json::to_value(game.snapshot()).unwrap();

        assert_eq!(json["status"], "InProgress");
        assert!(json.get("key").is_none());
        let back: GameSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, game.snapshot());
    }
}
