//! Game loop tests: event reconciliation against a scripted server and oracle.

mod common;

use chess::{Board, Color};
use std::str::FromStr;

use chess_oracle_bot::config::NegotiationConfig;
use chess_oracle_bot::error::BotError;
use chess_oracle_bot::game::{parse_event, Flow, GameLoop};
use chess_oracle_bot::models::GameSession;
use chess_oracle_bot::negotiation::NegotiationEngine;
use chess_oracle_bot::oracle::OracleRole;

use common::{game_full, game_state, ScriptedChannel, ScriptedOracle};

type TestLoop = GameLoop<ScriptedChannel, ScriptedOracle>;

fn new_game(channel: ScriptedChannel, oracle: ScriptedOracle, color: Color) -> TestLoop {
    let engine = NegotiationEngine::new(oracle, NegotiationConfig::default());
    GameLoop::new(channel, engine, GameSession::new("test-game", color))
}

fn accepting(proposals: &[&str]) -> ScriptedOracle {
    let critiques = vec!["STATUS: SUCCESS"; proposals.len()];
    ScriptedOracle::new(proposals, &critiques)
}

async fn feed(game: &mut TestLoop, line: &str) -> Flow {
    game.on_event(parse_event(line).unwrap()).await.unwrap()
}

// =============================================================================
// Turn handling
// =============================================================================

/// Playing white, the bot opens as soon as the game is ready.
#[actix_rt::test]
async fn test_white_moves_first_on_game_full() {
    let channel = ScriptedChannel::with_events(&[&game_full("")]);
    let mut game = new_game(channel, accepting(&["UCI: e2e4"]), Color::White);

    game.play().await.unwrap();

    assert_eq!(game.channel().sent(), vec!["e2e4"]);
    assert_eq!(game.board().ply_count(), 1);
    assert_eq!(game.session().cursor, 1);
}

/// The server echoes the bot's own move back; nothing happens.
#[actix_rt::test]
async fn test_own_move_echo_is_ignored() {
    let mut game = new_game(ScriptedChannel::new(), accepting(&["UCI: e2e4"]), Color::White);
    feed(&mut game, &game_full("")).await;
    let before = game.board().clone();

    let flow = feed(&mut game, &game_state("e2e4")).await;

    assert_eq!(flow, Flow::Continue);
    assert_eq!(game.channel().sent(), vec!["e2e4"]);
    assert_eq!(game.engine().oracle().calls(OracleRole::Proposer), 1);
    assert_eq!(game.board(), &before);
}

/// Playing black, the opponent's move is applied once and answered once,
/// even when the server repeats it.
#[actix_rt::test]
async fn test_black_answers_each_opponent_move_once() {
    let channel = ScriptedChannel::with_events(&[
        &game_full(""),
        &game_state("e2e4"),
        &game_state("e2e4"),
        &game_state("e2e4 e7e5"),
    ]);
    let mut game = new_game(channel, accepting(&["UCI: e7e5"]), Color::Black);

    game.play().await.unwrap();

    assert_eq!(game.channel().sent(), vec!["e7e5"]);
    assert_eq!(game.board().ply_count(), 2);
    assert_eq!(game.session().cursor, 2);
    assert_eq!(game.engine().oracle().calls(OracleRole::Proposer), 1);
}

/// A move that captured one of the bot's pieces is reported to the proposer.
#[actix_rt::test]
async fn test_capture_is_reported_in_prompt() {
    let channel =
        ScriptedChannel::with_events(&[&game_state("e2e4"), &game_state("e2e4 d7d5 e4d5")]);
    let mut game = new_game(channel, accepting(&["UCI: d7d5", "UCI: d8d5"]), Color::Black);

    game.play().await.unwrap();

    assert_eq!(game.channel().sent(), vec!["d7d5", "d8d5"]);
    let prompts = game.engine().oracle().prompts(OracleRole::Proposer);
    assert!(!prompts[0].contains("captured"));
    assert!(prompts[1].contains("Your opponent's last move was e4d5."));
    assert!(prompts[1].contains("That move captured your Pawn."));
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Joining mid-game applies every missed half-move before answering.
#[actix_rt::test]
async fn test_missed_moves_are_caught_up() {
    let channel = ScriptedChannel::with_events(&[&game_full("e2e4 e7e5 g1f3")]);
    let mut game = new_game(channel, accepting(&["UCI: b8c6"]), Color::Black);

    game.play().await.unwrap();

    let history: Vec<String> = game.board().history().iter().map(|m| m.to_string()).collect();
    assert_eq!(history, vec!["e2e4", "e7e5", "g1f3", "b8c6"]);
    assert_eq!(game.session().cursor, 4);
}

/// A local history that disagrees with the server is rebuilt from the server's.
#[actix_rt::test]
async fn test_diverged_history_is_rebuilt() {
    let oracle = accepting(&["UCI: e7e5", "UCI: b8c6"]);
    let mut game = new_game(ScriptedChannel::new(), oracle, Color::Black);
    feed(&mut game, &game_state("e2e4")).await;
    assert_eq!(game.board().ply_count(), 2);

    feed(&mut game, &game_state("e2e4 c7c5 g1f3")).await;

    let history: Vec<String> = game.board().history().iter().map(|m| m.to_string()).collect();
    assert_eq!(history, vec!["e2e4", "c7c5", "g1f3", "b8c6"]);
    assert_eq!(game.channel().sent(), vec!["e7e5", "b8c6"]);
}

/// A custom starting position from gameFull replaces the standard one.
#[actix_rt::test]
async fn test_game_full_with_initial_fen() {
    let fen = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";
    let line = format!(
        r#"{{"type":"gameFull","id":"test-game","initialFen":"{}","state":{}}}"#,
        fen,
        game_state("")
    );
    let mut game = new_game(ScriptedChannel::new(), accepting(&["UCI: e2e4"]), Color::White);

    feed(&mut game, &line).await;

    assert_eq!(game.board().initial(), &Board::from_str(fen).unwrap());
    assert_eq!(game.channel().sent(), vec!["e2e4"]);
    assert_eq!(game.board().ply_count(), 1);
}

/// When the start position has Black to move, White waits for Black's move.
#[actix_rt::test]
async fn test_black_to_move_initial_fen_shifts_turns() {
    let line = format!(
        r#"{{"type":"gameFull","id":"test-game","initialFen":"{}","state":{}}}"#,
        "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1",
        game_state("")
    );
    let mut game = new_game(ScriptedChannel::new(), accepting(&["UCI: e2e4"]), Color::White);

    feed(&mut game, &line).await;

    assert!(game.channel().sent().is_empty());
    assert_eq!(game.engine().oracle().calls(OracleRole::Proposer), 0);
    assert_eq!(game.board().side_to_move(), Color::Black);

    feed(&mut game, &game_state("e8f8")).await;

    assert_eq!(game.channel().sent(), vec!["e2e4"]);
    let history: Vec<String> = game.board().history().iter().map(|m| m.to_string()).collect();
    assert_eq!(history, vec!["e8f8", "e2e4"]);
}

/// Playing black from a Black-to-move start position, the bot moves first.
#[actix_rt::test]
async fn test_black_moves_first_from_initial_fen() {
    let line = format!(
        r#"{{"type":"gameFull","id":"test-game","initialFen":"{}","state":{}}}"#,
        "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1",
        game_state("")
    );
    let mut game = new_game(ScriptedChannel::new(), accepting(&["UCI: e8d8"]), Color::Black);

    feed(&mut game, &line).await;

    assert_eq!(game.channel().sent(), vec!["e8d8"]);
    assert_eq!(game.board().side_to_move(), Color::White);
}

// =============================================================================
// Stream handling and game end
// =============================================================================

/// Blank, malformed and unknown lines are skipped without stopping the game.
#[actix_rt::test]
async fn test_bad_lines_are_skipped() {
    let channel = ScriptedChannel::with_events(&[
        "",
        "not json",
        r#"{"type":"gameState","#,
        r#"{"type":"somethingNew","x":1}"#,
        &game_state("d2d4"),
    ]);
    let mut game = new_game(channel, accepting(&["UCI: d7d5"]), Color::Black);

    game.play().await.unwrap();

    assert_eq!(game.channel().sent(), vec!["d7d5"]);
}

/// A finished game stops the loop and later events are ignored.
#[actix_rt::test]
async fn test_terminal_status_ends_game() {
    let channel = ScriptedChannel::with_events(&[
        r#"{"type":"gameState","moves":"","status":"aborted"}"#,
        &game_state("e2e4"),
    ]);
    let mut game = new_game(channel, accepting(&["UCI: e7e5"]), Color::Black);

    game.play().await.unwrap();

    assert!(game.is_over());
    assert!(game.channel().sent().is_empty());
    assert_eq!(feed(&mut game, &game_state("e2e4")).await, Flow::GameOver);
    assert!(game.channel().sent().is_empty());
    assert_eq!(game.engine().oracle().calls(OracleRole::Proposer), 0);
}

#[actix_rt::test]
async fn test_opponent_gone_ends_game() {
    let mut game = new_game(ScriptedChannel::new(), accepting(&[]), Color::Black);

    let back = r#"{"type":"opponentGone","gone":false}"#;
    assert_eq!(feed(&mut game, back).await, Flow::Continue);

    let gone = r#"{"type":"opponentGone","gone":true,"claimWinInSeconds":10}"#;
    assert_eq!(feed(&mut game, gone).await, Flow::GameOver);
    assert!(game.is_over());
}

#[actix_rt::test]
async fn test_chat_lines_do_not_affect_the_board() {
    let mut game = new_game(ScriptedChannel::new(), accepting(&[]), Color::Black);
    let line = r#"{"type":"chatLine","username":"lichess","text":"Good luck","room":"player"}"#;

    assert_eq!(feed(&mut game, line).await, Flow::Continue);
    assert_eq!(game.board().ply_count(), 0);
}

// =============================================================================
// Failures
// =============================================================================

/// The server rejecting the bot's move is fatal and the move is not applied.
#[actix_rt::test]
async fn test_rejected_move_propagates() {
    let channel = ScriptedChannel::rejecting_moves();
    let mut game = new_game(channel, accepting(&["UCI: e2e4"]), Color::White);

    let err = game.on_event(parse_event(&game_full("")).unwrap()).await.unwrap_err();

    assert!(matches!(err, BotError::Status { status: 400, .. }));
    assert_eq!(game.board().ply_count(), 0);
}

#[actix_rt::test]
async fn test_illegal_server_move_is_an_error() {
    let channel = ScriptedChannel::with_events(&[&game_state("e2e5")]);
    let mut game = new_game(channel, accepting(&[]), Color::Black);

    let err = game.play().await.unwrap_err();

    assert!(matches!(err, BotError::InvalidServerMove { ref token } if token == "e2e5"));
}

// =============================================================================
// Chat
// =============================================================================

#[actix_rt::test]
async fn test_chat_summary_posted_when_enabled() {
    let mut game =
        new_game(ScriptedChannel::new(), accepting(&["UCI: e2e4"]), Color::White).with_chat(true);

    feed(&mut game, &game_full("")).await;

    assert_eq!(game.channel().chats(), vec!["Played e2e4, approved after 1 round(s)."]);
}

#[actix_rt::test]
async fn test_chat_failure_is_not_fatal() {
    let channel = ScriptedChannel::rejecting_chat();
    let mut game = new_game(channel, accepting(&["UCI: e2e4"]), Color::White).with_chat(true);

    let flow = feed(&mut game, &game_full("")).await;

    assert_eq!(flow, Flow::Continue);
    assert_eq!(game.channel().sent(), vec!["e2e4"]);
    assert!(game.channel().chats().is_empty());
}

#[actix_rt::test]
async fn test_no_chat_by_default() {
    let mut game = new_game(ScriptedChannel::new(), accepting(&["UCI: e2e4"]), Color::White);

    feed(&mut game, &game_full("")).await;

    assert!(game.channel().chats().is_empty());
}
