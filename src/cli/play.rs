//! Terminal player mode
//!
//! Plays a content directory in the terminal: dialogue advances on Enter,
//! choices are number-keyed, puzzles get a small command prompt, and saves
//! go to an optional save directory.

use crate::content::ContentSet;
use crate::engine::{Game, GameStep};
use crate::storage::DirSaveStore;
use crate::types::event::{PlayerEvent, PuzzleAction};
use crate::types::signal::{NarrativeSignal, PuzzleSignal};
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

/// Run the player over loaded content.
pub fn run_play(content: ContentSet, save_dir: Option<&Path>) -> anyhow::Result<()> {
    let mut game = Game::new(content)?;
    if let Some(dir) = save_dir {
        game.attach_saves(Box::new(DirSaveStore::new(dir)?));
    }
    subscribe_printers(&mut game);

    println!("=== aludel player ===");
    println!();
    println!("Controls:");
    println!("  Enter:      next");
    println!("  1-9:        select choice");
    println!("  s <slot>:   save (1-10)");
    println!("  l <slot>:   load");
    println!("  q:          quit");
    println!();

    let clock = Instant::now();

    let mut step = game.start(now(&clock));
    loop {
        step = match step {
            GameStep::WaitAdvance => {
                match prompt_line(&mut game, &clock)? {
                    Some(next) => next,
                    None => break,
                }
            }
            GameStep::WaitChoice => {
                let input = get_input("Select:")?;
                if input == "q" {
                    break;
                }
                match input.parse::<usize>() {
                    Ok(n) if n >= 1 => {
                        game.handle(PlayerEvent::Choose { index: n - 1 }, now(&clock))
                    }
                    _ => {
                        println!("Enter a choice number.");
                        GameStep::WaitChoice
                    }
                }
            }
            GameStep::WaitActor => game.handle(PlayerEvent::ActorDone, now(&clock)),
            GameStep::WaitTimer { ms } => {
                std::thread::sleep(std::time::Duration::from_millis(ms));
                game.handle(PlayerEvent::TimerElapsed, now(&clock))
            }
            GameStep::WaitPuzzle => {
                match puzzle_prompt(&mut game, &clock)? {
                    Some(next) => next,
                    None => break,
                }
            }
            GameStep::Complete => {
                println!();
                println!("== THE END ==");
                break;
            }
        };
    }

    Ok(())
}

fn now(clock: &Instant) -> u64 {
    clock.elapsed().as_millis() as u64
}

/// Enter/save/load/quit handling while a line is on screen. None = quit.
fn prompt_line(game: &mut Game, clock: &Instant) -> anyhow::Result<Option<GameStep>> {
    loop {
        let input = get_input("")?;
        if input == "q" {
            println!("Goodbye!");
            return Ok(None);
        }
        if input.is_empty() {
            return Ok(Some(game.handle(PlayerEvent::Advance, now(clock))));
        }
        if let Some(slot) = parse_slot(&input, 's') {
            match game.save(slot) {
                Ok(()) => println!("[Saved to slot {slot}]"),
                Err(err) => println!("[Save failed: {err}]"),
            }
            continue;
        }
        if let Some(slot) = parse_slot(&input, 'l') {
            match game.load(slot, now(clock)) {
                Ok(step) => {
                    println!("[Loaded slot {slot}]");
                    return Ok(Some(step));
                }
                Err(err) => println!("[Load failed: {err}]"),
            }
            continue;
        }
        println!("Press Enter to continue, 's <slot>' to save, 'l <slot>' to load, 'q' to quit.");
    }
}

/// The puzzle command prompt; runs until the puzzle settles. None = quit.
fn puzzle_prompt(game: &mut Game, clock: &Instant) -> anyhow::Result<Option<GameStep>> {
    println!("Puzzle commands: submit | reset | hint | place <part> <slot> | craft <id>");
    println!("                 tool <t> | look <h> | diag <d> | go | pad <n> | dial <d> <v> | lock");
    loop {
        let input = get_input("puzzle>")?;
        if input == "q" {
            println!("Goodbye!");
            return Ok(None);
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let action = match parts.as_slice() {
            ["submit"] => PuzzleAction::Submit,
            ["reset"] => PuzzleAction::Reset,
            ["hint"] => PuzzleAction::Hint,
            ["place", part, slot] => PuzzleAction::PlacePart {
                part: part.to_string(),
                slot: slot.to_string(),
            },
            ["craft", id] => PuzzleAction::ToggleIngredient { id: id.to_string() },
            ["tool", tool] => PuzzleAction::SetTool { tool: tool.to_string() },
            ["look", hotspot] => PuzzleAction::Examine { hotspot: hotspot.to_string() },
            ["diag", id] => PuzzleAction::SelectDiagnosis { id: id.to_string() },
            ["go"] => PuzzleAction::BeginInput,
            ["pad", n] => match n.parse() {
                Ok(pad) => PuzzleAction::InputStep { pad },
                Err(_) => {
                    println!("Pads are numbers.");
                    continue;
                }
            },
            ["dial", dial, value] => match value.parse() {
                Ok(value) => PuzzleAction::SetDial { dial: dial.to_string(), value },
                Err(_) => {
                    println!("Dial values are numbers.");
                    continue;
                }
            },
            ["lock"] => PuzzleAction::LockNote,
            _ => {
                println!("Unknown puzzle command.");
                continue;
            }
        };

        let step = game.handle(PlayerEvent::Puzzle(action), now(clock));
        if step != GameStep::WaitPuzzle {
            return Ok(Some(step));
        }
    }
}

fn parse_slot(input: &str, command: char) -> Option<u8> {
    let rest = input.strip_prefix(command)?.trim();
    rest.parse().ok().filter(|slot| *slot >= 1 && *slot <= 10)
}

fn subscribe_printers(game: &mut Game) {
    game.hub_mut().on_narrative(|signal| {
        match signal {
            NarrativeSignal::ChapterStart { number, title } => {
                println!();
                println!("==== Chapter {number}: {title} ====");
                println!();
            }
            NarrativeSignal::ChapterEnd { .. } => {}
            NarrativeSignal::SceneStart { id, .. } => {
                println!("[Scene: {id}]");
                println!();
            }
            NarrativeSignal::Dialogue { speaker, text } => {
                println!("{speaker}:");
                println!("{text}");
                println!();
            }
            NarrativeSignal::Narration { text } => {
                println!("{text}");
                println!();
            }
            NarrativeSignal::ChoiceShow { prompt, options } => {
                if !prompt.is_empty() {
                    println!("{prompt}");
                }
                println!("--- Choice ---");
                for (i, option) in options.iter().enumerate() {
                    println!("{}. {option}", i + 1);
                }
                println!();
            }
            NarrativeSignal::ChoiceMade { .. } => {}
            NarrativeSignal::Action { actor, action } => {
                println!("({actor} {action})");
            }
            NarrativeSignal::Wait { .. } => {}
            NarrativeSignal::GameComplete => {}
        }
        Ok(())
    });

    game.hub_mut().on_puzzle(|signal| {
        match signal {
            PuzzleSignal::Started { title, .. } => {
                println!();
                println!("--- Puzzle: {title} ---");
            }
            PuzzleSignal::Updated { .. } => {}
            PuzzleSignal::Feedback { message, .. } | PuzzleSignal::Notice { message, .. } => {
                println!("{message}");
            }
            PuzzleSignal::Hint { text, remaining, .. } => {
                println!("Hint: {text} ({remaining} left)");
            }
            PuzzleSignal::ShowSequence { steps, .. } => {
                let shown: Vec<String> = steps.iter().map(|s| (s + 1).to_string()).collect();
                println!("Watch: {}", shown.join(" "));
            }
            PuzzleSignal::Completed { score, .. } => {
                println!("Solved! Score: {score}");
                println!();
            }
            PuzzleSignal::Failed { reason, .. } => {
                println!("Failed: {reason}");
                println!();
            }
            PuzzleSignal::Reset { .. } => {
                println!("[Puzzle reset]");
            }
        }
        Ok(())
    });
}

/// Get user input with an optional prompt
fn get_input(prompt: &str) -> io::Result<String> {
    if !prompt.is_empty() {
        print!("{prompt} ");
        io::stdout().flush()?;
    }

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
