use emoji_connections::calendar::puzzle_id_at;
use emoji_connections::*;
use itertools::Itertools;
use rand::prelude::IndexedRandom;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn main() -> anyhow::Result<()> {
    // --- 1. Initialization ---
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    let puzzle = fallback_puzzle(&puzzle_id_at(now))?;
    let mut game = Game::new(
        puzzle,
        ManualScheduler::new(),
        Persistence::new(MemoryStore::new()),
    );
    let mut rng = rand::rng();

    println!("--- Autonomous Emoji Connections Bot ---");
    println!("Strategy: keep three tiles after a near miss, guess randomly otherwise.");
    println!("Puzzle #{} ({})", game.puzzle().number(), game.puzzle().id());
    print_board(&game);
    thread::sleep(Duration::from_secs(1));

    // --- 2. Game Loop ---
    let mut move_count = 0;
    let mut near_miss: Option<Vec<Item>> = None;
    while !game.is_over() {
        move_count += 1;
        println!("\n--- Guess #{} ({} attempts left) ---", move_count, game.remaining_attempts());

        // --- 3. Bot's Decision Logic ---
        let free: Vec<Item> = game
            .tiles()
            .iter()
            .map(|t| t.item.clone())
            .filter(|item| game.solved_groups().iter().all(|g| !g.contains(item)))
            .collect();

        let mut guess = None;
        for _ in 0..100 {
            let candidate: Vec<Item> = match &near_miss {
                Some(previous) => {
                    let mut kept: Vec<Item> = previous.choose_multiple(&mut rng, 3).cloned().collect();
                    let outsiders: Vec<&Item> = free.iter().filter(|i| !previous.contains(i)).collect();
                    if let Some(&extra) = outsiders.choose(&mut rng) {
                        kept.push(extra.clone());
                    }
                    kept
                }
                None => free.choose_multiple(&mut rng, 4).cloned().collect(),
            };
            if candidate.len() == 4 && !game.session().rejected_guesses.contains(&guess_key(&candidate)) {
                guess = Some(candidate);
                break;
            }
        }
        let Some(guess) = guess else {
            println!("No untried combination found; shuffling instead.");
            game.shuffle();
            settle(&mut game);
            continue;
        };

        // --- 4. Submit the Chosen Tiles ---
        println!("Bot guesses {}", guess.iter().join(" "));
        for item in &guess {
            game.toggle_select(item);
        }
        let verdict = game.submit();
        if let Some(notice) = game.notice() {
            println!("  {notice}");
        }
        match verdict {
            Verdict::Correct(difficulty) => {
                println!("Correct! (difficulty {difficulty})");
                near_miss = None;
            }
            Verdict::Incorrect { one_away: true } => {
                println!("Wrong.");
                near_miss = Some(guess);
            }
            Verdict::Incorrect { one_away: false } => {
                println!("Wrong.");
                near_miss = None;
            }
            other => println!("Guess not judged: {other:?}"),
        }

        settle(&mut game);
        print_board(&game);

        if move_count % 3 == 0 && !game.is_over() {
            println!("Shuffling the board...");
            game.shuffle();
            settle(&mut game);
        }
    }

    // Let the loss reveal (if any) play out.
    settle(&mut game);

    // --- 5. Final Result ---
    println!("\n--- Game Over ---");
    match game.outcome() {
        Some(Outcome::Won) => println!("Result: The bot found every connection!"),
        Some(Outcome::Lost { groups_found }) => {
            println!("Result: The bot found {groups_found} of 4 connections.")
        }
        None => println!("Result: The game ended unexpectedly."),
    }
    print_board(&game);
    for group in game.solved_groups().iter().sorted_by_key(|g| g.difficulty) {
        println!("{} {}: {}", group.difficulty.marker(), group.name, group.items.join(" "));
    }
    println!("\n{}", game.share_text());
    Ok(())
}

/// Fires queued animation steps, pausing for a fraction of each delay.
fn settle(game: &mut Game<ManualScheduler, MemoryStore>) {
    while let Some((delay, timer)) = game.scheduler_mut().pop() {
        thread::sleep(delay / 4);
        game.on_timer(timer);
        if let Some(band) = game.band().filter(|_| timer == Timer::Settle) {
            println!("  revealed row {}: {}", band.row, band.group.name);
        }
    }
}

fn print_board(game: &Game<ManualScheduler, MemoryStore>) {
    let rows = game.tiles().iter().map(|t| t.row).max().map_or(0, |r| r + 1);

    // Print header
    print!("   ");
    for x in 0..GRID_WIDTH {
        print!("{:^4}", x);
    }
    println!("\n  +{}", "----".repeat(GRID_WIDTH));

    // Print rows
    for y in 0..rows {
        print!("{:^2}|", y);
        for x in 0..GRID_WIDTH {
            let display = match game.tiles().iter().find(|t| t.row == y && t.col == x) {
                Some(tile) if tile.is_selected => format!("[{}]", tile.item),
                Some(tile) => format!(" {} ", tile.item),
                None => "    ".to_string(),
            };
            print!("{}", display);
        }
        if let Some(group) = game.solved_groups().get(y) {
            print!("  {} {}", group.difficulty.marker(), group.name);
        }
        println!();
    }
    println!();
}
