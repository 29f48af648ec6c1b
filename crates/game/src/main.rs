mod app;
mod content;

use std::io::{self, BufRead, Write};

use engine::Verb;
use tracing::error;

use app::bootstrap;
use app::Game;

const TICK_SECONDS: f32 = 1.0 / 60.0;
const MAX_TICKS_PER_TURN: u32 = 60 * 60; // one simulated minute

fn main() {
    let game = match bootstrap::build_game() {
        Ok(game) => game,
        Err(err) => {
            error!(%err, "startup failed");
            eprintln!("startup failed: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(game) {
        error!(%err, "shell error");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(mut game: Game) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("LoveLingo — type commands like \"go to tree\". \"quit\" exits.");
    for suggestion in game.hud().suggestions() {
        println!("Try: {suggestion}");
    }
    settle(&mut game);

    loop {
        prompt(&game, &mut stdout)?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "quit" | "exit" => break,
            _ if game.is_paywall_open() => match line {
                "subscribe" => {
                    if let Err(err) = game.subscribe() {
                        eprintln!("could not save subscription: {err}");
                    }
                }
                _ => game.dismiss_paywall(),
            },
            "" => {
                if game.is_dialogue_open() {
                    game.advance_dialogue();
                }
            }
            "c" | "chat" if game.is_dialogue_open() => game.begin_chat(),
            "mic" => {
                if let Some(text) = game.hud_mut().toggle_mic() {
                    game.submit_command(&text);
                }
            }
            "send" => game.submit_draft(),
            _ => {
                // "click tree" / "verb talk" mimic the pointer; anything
                // else is typed straight into the command box.
                if let Some(name) = line.strip_prefix("click ") {
                    game.click_object(name.trim());
                } else if let Some(verb) = line
                    .strip_prefix("verb ")
                    .and_then(|token| Verb::from_token(token.trim()))
                {
                    game.click_verb(verb);
                } else {
                    game.submit_command(line);
                }
            }
        }

        settle(&mut game);
        if game.is_finished() {
            break;
        }
    }

    Ok(())
}

/// Runs fixed ticks until the game has nothing left to do on its own,
/// printing whatever surfaced along the way.
fn settle(game: &mut Game) {
    for _ in 0..MAX_TICKS_PER_TURN {
        game.tick(TICK_SECONDS);
        for line in game.drain_output() {
            println!("{line}");
        }
        if game.is_settled() {
            break;
        }
    }
}

fn prompt(game: &Game, stdout: &mut io::Stdout) -> io::Result<()> {
    let marker = if game.is_paywall_open() {
        "[paywall]"
    } else if game.is_dialogue_open() {
        "[dialogue]"
    } else {
        ">"
    };
    let level = game.active_level().as_str();
    let draft = game.hud().draft();
    if draft.is_empty() {
        print!("{level} {marker} ");
    } else {
        print!("{level} {marker} [{draft}] ");
    }
    stdout.flush()
}
