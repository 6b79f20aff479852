use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};

use crate::board::Color;
use crate::config::SearchConfig;
use crate::error::UciError;
use crate::game::Game;
use crate::movegen::Move;
use crate::position::Position;
use crate::search::{is_mate_score, Engine, SearchLimits, MATE};
use crate::time::Clock;

/// Used when `go` arrives with neither a clock nor a depth.
const DEFAULT_MOVE_TIME: Duration = Duration::from_secs(5);
const MAX_HASH_MB: usize = 4096;

/// Arguments of a `go` command, in milliseconds where they are times.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct GoParams {
    wtime: Option<u64>,
    btime: Option<u64>,
    winc: Option<u64>,
    binc: Option<u64>,
    movetime: Option<u64>,
    depth: Option<i32>,
}

impl GoParams {
    fn parse(parts: &[&str]) -> Result<Self, UciError> {
        let mut params = Self::default();
        let mut tokens = parts.iter().copied();

        while let Some(token) = tokens.next() {
            match token {
                "wtime" => params.wtime = Some(parse_value("wtime", tokens.next())?),
                "btime" => params.btime = Some(parse_value("btime", tokens.next())?),
                "winc" => params.winc = Some(parse_value("winc", tokens.next())?),
                "binc" => params.binc = Some(parse_value("binc", tokens.next())?),
                "movetime" => params.movetime = Some(parse_value("movetime", tokens.next())?),
                "depth" => params.depth = Some(parse_value("depth", tokens.next())?),
                other => debug!("ignoring go parameter {:?}", other),
            }
        }
        Ok(params)
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: Option<&str>) -> Result<T, UciError> {
    let value = value.ok_or(UciError::MissingValue(name))?;
    value.parse().map_err(|_| UciError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// UCI score field. A mate found with `d` plies of depth left in a search of
/// `depth` lies `depth - d` plies from the root.
fn score_text(score: i32, depth: i32) -> String {
    if !is_mate_score(score) {
        return format!("cp {}", score);
    }
    let plies = (depth - (score.abs() - MATE)).max(1);
    let moves = (plies + 1) / 2;
    format!("mate {}", if score > 0 { moves } else { -moves })
}

pub struct UciHandler {
    game: Game,
    engine: Engine<Move>,
}

impl Default for UciHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl UciHandler {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        UciHandler {
            game: Game::new(),
            engine: Engine::new(config),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn engine(&self) -> &Engine<Move> {
        &self.engine
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => {
                    stdout.write_all(response.as_bytes())?;
                    stdout.flush()?;
                }
                Err(err) => warn!("ignoring {:?}: {}", command, err),
            }
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Ok(String::new());
        };

        match name {
            "uci" => Ok(self.handle_uci()),
            "isready" => Ok("readyok\n".to_string()),
            "ucinewgame" => {
                self.game = Game::new();
                self.engine.clear_table();
                Ok(String::new())
            }
            "position" => {
                self.handle_position(args)?;
                Ok(String::new())
            }
            "go" => self.handle_go(args),
            "setoption" => {
                self.handle_setoption(args)?;
                Ok(String::new())
            }
            "d" => Ok(format!("{}\nFen: {}\n", self.game.board(), self.game.board().to_fen())),
            "quit" => Ok(String::new()),
            other => {
                debug!("unknown command {:?}", other);
                Ok(String::new())
            }
        }
    }

    fn handle_uci(&self) -> String {
        format!(
            "id name Chinook\nid author the Chinook developers\n\
             option name Hash type spin default {} min 1 max {}\nuciok\n",
            SearchConfig::default().hash_mb,
            MAX_HASH_MB
        )
    }

    /// `position (startpos | fen <fields>) [moves <m1> <m2> ...]`. The current
    /// game is only replaced once the whole command has been applied.
    fn handle_position(&mut self, parts: &[&str]) -> Result<(), UciError> {
        let (setup, moves) = match parts.iter().position(|part| *part == "moves") {
            Some(at) => (&parts[..at], &parts[at + 1..]),
            None => (parts, &[][..]),
        };

        let mut game = match setup.split_first() {
            Some((&"startpos", _)) => Game::new(),
            Some((&"fen", fields)) => Game::from_fen(&fields.join(" "))?,
            _ => return Err(UciError::MissingValue("position")),
        };

        for &text in moves {
            let mv = game
                .find_move(text)
                .ok_or_else(|| UciError::IllegalMove(text.to_string()))?;
            game.make_move(mv);
        }

        self.game = game;
        Ok(())
    }

    fn handle_go(&mut self, parts: &[&str]) -> Result<String> {
        let params = GoParams::parse(parts)?;
        let limits = self.limits(&params);
        let result = self.engine.iterate(&mut self.game, limits);

        info!(
            "go: depth {} score {} nodes {} in {:?}",
            result.depth, result.score, result.nodes, result.elapsed
        );

        let mut response = format!(
            "info depth {} score {} nodes {} time {}\n",
            result.depth,
            score_text(result.score, result.depth),
            result.nodes,
            result.elapsed.as_millis()
        );
        match result.best_move {
            Some(mv) => response.push_str(&format!("bestmove {}\n", mv.to_uci())),
            None => response.push_str("bestmove 0000\n"),
        }
        Ok(response)
    }

    fn limits(&self, params: &GoParams) -> SearchLimits {
        let max_depth = params.depth.unwrap_or(self.engine.config().max_depth);

        if let Some(ms) = params.movetime {
            return SearchLimits::timed(max_depth, Duration::from_millis(ms));
        }

        let (remaining, increment) = match self.game.side_to_move() {
            Color::White => (params.wtime, params.winc),
            Color::Black => (params.btime, params.binc),
        };
        match remaining {
            Some(ms) => {
                let clock = Clock::new(
                    Duration::from_millis(ms),
                    Duration::from_millis(increment.unwrap_or(0)),
                );
                SearchLimits {
                    max_depth,
                    ..self.engine.limits_for(&clock, self.game.ply_count())
                }
            }
            None if params.depth.is_some() => SearchLimits::depth(max_depth),
            None => SearchLimits::timed(max_depth, DEFAULT_MOVE_TIME),
        }
    }

    /// `setoption name <name> value <value>`. Only `Hash` is recognised.
    fn handle_setoption(&mut self, parts: &[&str]) -> Result<()> {
        let value_at = parts.iter().position(|part| *part == "value");
        let name = match (parts.first(), value_at) {
            (Some(&"name"), Some(at)) => parts[1..at].join(" "),
            (Some(&"name"), None) => parts[1..].join(" "),
            _ => return Err(UciError::MissingValue("name").into()),
        };
        let value = value_at.map(|at| parts[at + 1..].join(" "));

        if name.eq_ignore_ascii_case("hash") {
            let hash_mb: usize = parse_value("Hash", value.as_deref())?;
            if !(1..=MAX_HASH_MB).contains(&hash_mb) {
                return Err(UciError::InvalidValue {
                    name: "Hash",
                    value: hash_mb.to_string(),
                }
                .into());
            }
            self.engine.resize_table(hash_mb);
            info!("hash table resized to {} MB", hash_mb);
        } else {
            warn!("unknown option {:?}", name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> UciHandler {
        UciHandler::with_config(SearchConfig::default().with_hash_mb(1))
    }

    #[test]
    fn test_uci_handshake() {
        let mut uci = handler();
        let response = uci.handle_command("uci").unwrap();
        assert!(response.starts_with("id name Chinook"));
        assert!(response.contains("option name Hash"));
        assert!(response.ends_with("uciok\n"));
        assert_eq!(uci.handle_command("isready").unwrap(), "readyok\n");
        assert_eq!(uci.handle_command("").unwrap(), "");
    }

    #[test]
    fn test_position_with_moves() {
        let mut uci = handler();
        uci.handle_command("position startpos moves e2e4 e7e5 g1f3")
            .unwrap();
        assert_eq!(
            uci.game().board().to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );

        uci.handle_command("position fen 4k3/8/8/8/8/8/4P3/4K3 w - - 0 1 moves e2e4")
            .unwrap();
        assert_eq!(uci.game().board().to_fen(), "4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1");
    }

    #[test]
    fn test_illegal_move_keeps_previous_position() {
        let mut uci = handler();
        uci.handle_command("position startpos moves e2e4").unwrap();
        let before = uci.game().board().to_fen();

        assert!(uci
            .handle_command("position startpos moves e2e5")
            .is_err());
        assert!(uci.handle_command("position fen not a fen").is_err());
        let overlong = format!("position fen {}/8/8/8/8/8/8/8 w - - 0 1", "9".repeat(29));
        assert!(uci.handle_command(&overlong).is_err());
        assert_eq!(uci.game().board().to_fen(), before);
    }

    #[test]
    fn test_go_depth_returns_legal_move() {
        let mut uci = handler();
        uci.handle_command("position startpos moves e2e4").unwrap();
        let response = uci.handle_command("go depth 1").unwrap();

        let best = response
            .lines()
            .find_map(|line| line.strip_prefix("bestmove "))
            .expect("bestmove line");
        assert!(uci.game().find_move(best).is_some(), "{}", best);
    }

    #[test]
    fn test_mate_reported_in_moves() {
        let mut uci = handler();
        uci.handle_command("position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1")
            .unwrap();
        let response = uci.handle_command("go depth 3").unwrap();
        assert!(response.contains(" score mate 1 "), "{}", response);
        assert!(response.ends_with("bestmove a1a8\n"));
    }

    #[test]
    fn test_score_text() {
        assert_eq!(score_text(35, 4), "cp 35");
        assert_eq!(score_text(-120, 4), "cp -120");
        assert_eq!(score_text(MATE + 2, 3), "mate 1");
        assert_eq!(score_text(MATE + 2, 5), "mate 2");
        assert_eq!(score_text(-MATE, 2), "mate -1");
    }

    #[test]
    fn test_go_without_moves() {
        let mut uci = handler();
        uci.handle_command("position fen 7k/5Q2/6K1/8/8/8/8/8 b - - 0 1")
            .unwrap();
        let response = uci.handle_command("go depth 2").unwrap();
        assert!(response.ends_with("bestmove 0000\n"));
    }

    #[test]
    fn test_go_params() {
        let params = GoParams::parse(&["wtime", "1000", "btime", "2000", "winc", "10", "infinite"])
            .unwrap();
        assert_eq!(params.wtime, Some(1000));
        assert_eq!(params.btime, Some(2000));
        assert_eq!(params.winc, Some(10));
        assert_eq!(params.depth, None);

        assert!(matches!(
            GoParams::parse(&["depth"]),
            Err(UciError::MissingValue("depth"))
        ));
        assert!(matches!(
            GoParams::parse(&["movetime", "soon"]),
            Err(UciError::InvalidValue { name: "movetime", .. })
        ));
    }

    #[test]
    fn test_limits_follow_side_to_move() {
        let mut uci = handler();
        let params = GoParams {
            wtime: Some(100_000),
            btime: Some(1_000),
            ..GoParams::default()
        };
        let white = uci.limits(&params);
        assert_eq!(white.think_time, Some(Duration::from_secs(2)));

        uci.handle_command("position startpos moves e2e4").unwrap();
        let black = uci.limits(&params);
        assert_eq!(black.think_time, Some(Duration::from_millis(20)));

        let fixed = uci.limits(&GoParams {
            movetime: Some(300),
            depth: Some(7),
            ..GoParams::default()
        });
        assert_eq!(fixed, SearchLimits::timed(7, Duration::from_millis(300)));
    }

    #[test]
    fn test_setoption_hash() {
        let mut uci = handler();
        uci.handle_command("setoption name Hash value 2").unwrap();
        assert_eq!(uci.engine().table().size_mb(), 2);
        assert_eq!(uci.engine().config().hash_mb, 2);

        assert!(uci.handle_command("setoption name Hash value lots").is_err());
        assert!(uci.handle_command("setoption name Hash value 0").is_err());
        uci.handle_command("setoption name Ponder value true").unwrap();
        assert_eq!(uci.engine().table().size_mb(), 2);
    }

    #[test]
    fn test_new_game_clears_table() {
        let mut uci = handler();
        uci.handle_command("go depth 2").unwrap();
        let root = uci.game().key();
        assert!(uci.engine().table().get_best_move(root).is_some());

        uci.handle_command("ucinewgame").unwrap();
        assert!(uci.engine().table().get_best_move(root).is_none());
        assert_eq!(uci.engine().table().hashfull(), 0);
        assert_eq!(*uci.game().board(), crate::board::Board::new());
    }
}
