//! Scripted playback: one spawned task per sequence, superseded through the
//! board's generation counter.

use std::sync::{Mutex, Weak};
use std::time::Duration;

use board_core::MoveInput;
use tokio::time;
use tracing::{debug, warn};

use crate::controller::BoardInner;
use crate::events::BoardEvent;

/// Play `moves` against the shared board, one validated step per
/// `step_delay` tick (step 0 fires immediately). The task holds only a weak
/// reference and re-checks the generation before every mutation, so a
/// superseded or dropped board is never touched.
pub(crate) fn spawn(
    board: Weak<Mutex<BoardInner>>,
    moves: Vec<MoveInput>,
    step_delay: Duration,
    generation: u64,
) {
    tokio::spawn(run(board, moves, step_delay, generation));
}

async fn run(
    board: Weak<Mutex<BoardInner>>,
    moves: Vec<MoveInput>,
    step_delay: Duration,
    generation: u64,
) {
    let mut completed = 0usize;
    for (index, input) in moves.iter().enumerate() {
        let delay = if index == 0 { Duration::ZERO } else { step_delay };
        time::sleep(delay).await;

        let inner = match board.upgrade() {
            Some(inner) => inner,
            None => return,
        };
        let mut guard = match inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.generation != generation {
            debug!(step = index, "sequence superseded, stopping");
            return;
        }
        match guard.position.apply_move(input) {
            Ok(mv) => {
                let fen = guard.position.fen().to_string();
                guard.emit(BoardEvent::MoveApplied { mv, fen });
                completed += 1;
            }
            Err(err) => {
                warn!(step = index, error = %err, "scripted move not playable, aborting sequence");
                guard.emit(BoardEvent::SequenceFinished {
                    completed,
                    failed_at: Some(index),
                });
                return;
            }
        }
    }

    let inner = match board.upgrade() {
        Some(inner) => inner,
        None => return,
    };
    let mut guard = match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if guard.generation == generation {
        guard.emit(BoardEvent::SequenceFinished {
            completed,
            failed_at: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::BoardController;
    use board_core::STARTING_FEN;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_land_on_the_delay_grid() {
        let board = BoardController::new();
        board.play_move_sequence(
            vec![
                MoveInput::from("e4"),
                MoveInput::from("e5"),
                MoveInput::from("Nf3"),
            ],
            Duration::from_millis(500),
        );

        settle().await;
        assert_eq!(board.history().len(), 1);

        time::advance(Duration::from_millis(499)).await;
        settle().await;
        assert_eq!(board.history().len(), 1);

        time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(board.history().len(), 2);

        time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(board.history().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_reports_completion() {
        let board = BoardController::new();
        let mut events = board.subscribe();
        board.play_move_sequence(vec![MoveInput::from("e4")], Duration::from_millis(200));
        settle().await;

        match events.try_recv().unwrap() {
            BoardEvent::MoveApplied { mv, .. } => assert_eq!(mv.san, "e4"),
            other => panic!("unexpected event: {other:?}"),
        }
        match events.try_recv().unwrap() {
            BoardEvent::SequenceFinished {
                completed,
                failed_at,
            } => {
                assert_eq!(completed, 1);
                assert_eq!(failed_at, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_aborts_on_unplayable_step() {
        let board = BoardController::new();
        let mut events = board.subscribe();
        // Black cannot answer 1. e4 with e4 again.
        board.play_move_sequence(
            vec![
                MoveInput::from("e4"),
                MoveInput::from("e4"),
                MoveInput::from("Nf3"),
            ],
            Duration::ZERO,
        );
        settle().await;

        assert_eq!(board.history().len(), 1);
        let mut finished = None;
        while let Ok(event) = events.try_recv() {
            if let BoardEvent::SequenceFinished {
                completed,
                failed_at,
            } = event
            {
                finished = Some((completed, failed_at));
            }
        }
        assert_eq!(finished, Some((1, Some(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_position_supersedes_the_running_sequence() {
        let board = BoardController::new();
        board.play_move_sequence(
            vec![MoveInput::from("e4"), MoveInput::from("e5")],
            Duration::from_millis(500),
        );
        settle().await;
        assert_eq!(board.history().len(), 1);

        board.set_fen(STARTING_FEN).unwrap();
        time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert!(board.history().is_empty());
        assert_eq!(board.fen(), STARTING_FEN);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_sequence_wins() {
        let board = BoardController::new();
        board.play_move_sequence(
            vec![MoveInput::from("e4"), MoveInput::from("e5")],
            Duration::from_millis(500),
        );
        settle().await;

        board.reset();
        board.play_move_sequence(
            vec![MoveInput::from("d4"), MoveInput::from("d5")],
            Duration::from_millis(500),
        );
        settle().await;
        time::advance(Duration::from_millis(500)).await;
        settle().await;

        let sans: Vec<String> = board.history().into_iter().map(|m| m.san).collect();
        assert_eq!(sans, vec!["d4", "d5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_board_stops_playback() {
        let board = BoardController::new();
        let mut events = board.subscribe();
        board.play_move_sequence(
            vec![MoveInput::from("e4"), MoveInput::from("e5")],
            Duration::from_millis(500),
        );
        settle().await;
        drop(board);

        time::advance(Duration::from_millis(500)).await;
        settle().await;

        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, BoardEvent::MoveApplied { .. }) {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
    }
}
