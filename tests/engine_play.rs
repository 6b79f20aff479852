use std::time::Duration;

use chinook::movegen::GameState;
use chinook::search::is_mate_score;
use chinook::uci::UciHandler;
use chinook::{Clock, Engine, Game, Position, SearchConfig};

fn small_config() -> SearchConfig {
    SearchConfig::default().with_hash_mb(2).with_max_depth(3)
}

#[test]
fn test_self_play_stays_legal() {
    let mut game = Game::new();
    let mut engine = Engine::new(small_config());
    let clock = Clock::new(Duration::from_millis(500), Duration::ZERO);

    for _ in 0..12 {
        if game.status() != GameState::Ongoing {
            break;
        }
        let before = game.board().to_fen();
        let mv = engine.think(&mut game, &clock).expect("ongoing game has a move");
        assert_eq!(game.board().to_fen(), before, "search left the game modified");
        assert!(game.legal_moves(false).contains(&mv));
        game.make_move(mv);
    }
}

#[test]
fn test_mates_from_a_real_game() {
    // Scholar's mate is on the board: Qxf7#.
    let mut game = Game::from_fen(
        "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    )
    .unwrap();
    let mut engine = Engine::new(small_config());

    let result = engine.search_depth(&mut game, 3);
    let best = result.best_move.expect("white has moves");
    assert_eq!(best.to_uci(), "h5f7");
    assert!(is_mate_score(result.score));

    game.make_move(best);
    assert_eq!(game.status(), GameState::Checkmate(chinook::board::Color::White));
}

#[test]
fn test_uci_session() {
    let mut uci = UciHandler::with_config(small_config());

    let hello = uci.handle_command("uci").unwrap();
    assert!(hello.contains("uciok"));
    assert_eq!(uci.handle_command("isready").unwrap(), "readyok\n");
    uci.handle_command("setoption name Hash value 1").unwrap();
    uci.handle_command("ucinewgame").unwrap();

    let mut played: Vec<String> = Vec::new();
    for _ in 0..4 {
        let position = if played.is_empty() {
            "position startpos".to_string()
        } else {
            format!("position startpos moves {}", played.join(" "))
        };
        uci.handle_command(&position).unwrap();

        let response = uci
            .handle_command("go wtime 2000 btime 2000 winc 0 binc 0")
            .unwrap();
        let best = response
            .lines()
            .find_map(|line| line.strip_prefix("bestmove "))
            .expect("bestmove line")
            .to_string();
        assert!(uci.game().find_move(&best).is_some(), "illegal {}", best);
        played.push(best);
    }

    assert_eq!(uci.game().ply_count(), 3);
}
