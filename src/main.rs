/// Entry point and cabinet shell.
///
/// One frame loop drives everything: drain input devices, build the
/// logical input snapshot, advance the active scene or game session,
/// compose the frame, present the diff. Games never see devices and the
/// shell never sees game internals beyond the `Minigame` seam.

mod config;
mod domain;
mod games;
mod scores;
mod ui;

use std::io;
use std::time::Duration;

use crossterm::event::{
    KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use config::CabinetConfig;
use domain::clock::FrameClock;
use domain::grid::Dir;
use domain::input::FrameInput;
use games::duel::DuelSession;
use games::hopper::HopperSession;
use games::mason::MasonSession;
use games::mazer::MazerSession;
use games::serpent::SerpentSession;
use games::swarm::SwarmSession;
use games::{EndResult, GameEvent, GameId, Minigame, Viewport};
use scores::ScoreStore;
use ui::canvas::Screen;
use ui::gamepad::GamepadState;
use ui::input::Keyboard;
use ui::menu::{
    HighscoreScene, InitialsAction, InitialsScene, MenuChoice, MenuScene, ScoreScene,
};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const COMPETITION_BOARD: &str = "Competition";

fn main() {
    let config = CabinetConfig::load();
    let store = ScoreStore::locate(&config);

    let mut screen = Screen::new();
    if let Err(e) = screen.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = push_keyboard_enhancement();

    let result = shell_loop(&mut screen, &config, &store, enhanced);

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = screen.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Cabinet error: {e}");
    }
}

/// Ask the terminal for key release reporting. Not every terminal
/// supports it; the keyboard tracker falls back to hold timeouts.
fn push_keyboard_enhancement() -> bool {
    if !terminal::supports_keyboard_enhancement().unwrap_or(false) {
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

// ── Shell state machine ──

/// What the initials entry leads into.
enum Target {
    Single(GameId),
    Competition,
}

struct CompetitionRun {
    index: usize,
    total: u64,
}

enum Phase {
    Menu,
    Highscores,
    Initials(Target),
    Playing {
        id: GameId,
        session: Box<dyn Minigame>,
        competition: Option<CompetitionRun>,
    },
    Score(ScoreScene),
}

fn make_session(id: GameId, config: &CabinetConfig, view: Viewport) -> Box<dyn Minigame> {
    match id {
        GameId::Hopper => Box::new(HopperSession::new()),
        GameId::Serpent => Box::new(SerpentSession::new(view, config.serpent.clone())),
        GameId::Mazer => Box::new(MazerSession::new()),
        GameId::Mason => Box::new(MasonSession::new()),
        GameId::Swarm => Box::new(SwarmSession::new(config.swarm.clone())),
        GameId::Duel => Box::new(DuelSession::new()),
    }
}

fn shell_loop(
    screen: &mut Screen,
    config: &CabinetConfig,
    store: &ScoreStore,
    enhanced: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = Keyboard::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let sound = SoundEngine::new();
    let mut clock = FrameClock::new();

    let mut menu = MenuScene::new();
    let mut highs = HighscoreScene::new();
    let mut phase = Phase::Menu;
    let mut initials = String::from("AAA");
    let mut initials_ui: Option<InitialsScene> = None;
    let mut events: Vec<GameEvent> = Vec::new();

    loop {
        kb.drain_events();
        gp.update();
        if kb.ctrl_c_pressed() {
            break;
        }

        let dt = clock.tick();
        let input = collect_input(&kb, &gp);
        let view = screen.viewport();

        let mut next_phase: Option<Phase> = None;

        match &mut phase {
            Phase::Menu => {
                if let Some(choice) = menu.handle(&input) {
                    match choice {
                        MenuChoice::Exit => break,
                        MenuChoice::Highscores => next_phase = Some(Phase::Highscores),
                        MenuChoice::Game(id) => {
                            initials_ui = Some(InitialsScene::new(id.name()));
                            next_phase = Some(Phase::Initials(Target::Single(id)));
                        }
                        MenuChoice::Competition => {
                            initials_ui = Some(InitialsScene::new(COMPETITION_BOARD));
                            next_phase = Some(Phase::Initials(Target::Competition));
                        }
                    }
                }
            }

            Phase::Highscores => {
                if highs.handle(&input) {
                    next_phase = Some(Phase::Menu);
                }
            }

            Phase::Initials(target) => {
                let ui = initials_ui.get_or_insert_with(|| InitialsScene::new("Cabinet"));
                if let Some(ch) = kb.pressed_letter() {
                    ui.type_letter(ch);
                }
                match ui.handle(&input) {
                    Some(InitialsAction::Cancel) => {
                        initials_ui = None;
                        next_phase = Some(Phase::Menu);
                    }
                    Some(InitialsAction::Done(ini)) => {
                        initials = ini;
                        initials_ui = None;
                        let (id, competition) = match target {
                            Target::Single(id) => (*id, None),
                            Target::Competition => {
                                (GameId::ALL[0], Some(CompetitionRun { index: 0, total: 1 }))
                            }
                        };
                        next_phase = Some(Phase::Playing {
                            id,
                            session: make_session(id, config, view),
                            competition,
                        });
                    }
                    None => {}
                }
            }

            Phase::Playing { id, session, competition } => {
                events.clear();
                let outcome = session.frame(dt, &input, view, &mut events);
                process_sound_events(sound.as_ref(), &events);

                if let Some(outcome) = outcome {
                    next_phase = Some(match outcome.result {
                        // A quit discards the score, and aborts a
                        // competition run outright.
                        EndResult::Quit => Phase::Menu,
                        EndResult::GameOver | EndResult::Done => match competition {
                            None => {
                                let score = outcome.score as u64;
                                if score > 0 {
                                    let _ = store.add(id.name(), &initials, score);
                                }
                                Phase::Score(ScoreScene::new(id.name(), &initials, score))
                            }
                            Some(run) => {
                                // Floor each factor at 1 so a zero-score
                                // game (Duel always is) stays neutral in
                                // the product.
                                run.total =
                                    run.total.saturating_mul((outcome.score as u64).max(1));
                                run.index += 1;
                                if run.index < GameId::ALL.len() {
                                    let next_id = GameId::ALL[run.index];
                                    Phase::Playing {
                                        id: next_id,
                                        session: make_session(next_id, config, view),
                                        competition: Some(CompetitionRun {
                                            index: run.index,
                                            total: run.total,
                                        }),
                                    }
                                } else {
                                    if run.total > 0 {
                                        let _ =
                                            store.add(COMPETITION_BOARD, &initials, run.total);
                                    }
                                    Phase::Score(ScoreScene::new(
                                        COMPETITION_BOARD,
                                        &initials,
                                        run.total,
                                    ))
                                }
                            }
                        },
                    });
                }
            }

            Phase::Score(scene) => {
                if scene.handle(&input) {
                    next_phase = Some(Phase::Menu);
                }
            }
        }

        if let Some(p) = next_phase {
            phase = p;
            screen.invalidate()?;
        }

        screen.begin_frame()?;
        {
            let mut canvas = screen.canvas();
            match &phase {
                Phase::Menu => {
                    let leader = store.leader(COMPETITION_BOARD);
                    menu.render(&mut canvas, leader.as_ref());
                }
                Phase::Highscores => highs.render(&mut canvas, store),
                Phase::Initials(_) => {
                    if let Some(ui) = &initials_ui {
                        ui.render(&mut canvas);
                    }
                }
                Phase::Playing { session, .. } => session.render(&mut canvas),
                Phase::Score(scene) => scene.render(&mut canvas),
            }
        }
        screen.present()?;

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key bindings ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down];
/// Second vertical axis, the left paddle in Duel.
const KEYS_ALT_UP: &[KeyCode] = &[KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_ALT_DOWN: &[KeyCode] = &[KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_FIRE: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_CANCEL: &[KeyCode] = &[KeyCode::Esc];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];

/// Build the logical per-frame snapshot from both devices.
fn collect_input(kb: &Keyboard, gp: &GamepadState) -> FrameInput {
    let turn = if kb.any_pressed(KEYS_UP) || gp.up_pressed() {
        Some(Dir::Up)
    } else if kb.any_pressed(KEYS_DOWN) || gp.down_pressed() {
        Some(Dir::Down)
    } else if kb.any_pressed(KEYS_LEFT) || gp.left_pressed() {
        Some(Dir::Left)
    } else if kb.any_pressed(KEYS_RIGHT) || gp.right_pressed() {
        Some(Dir::Right)
    } else {
        None
    };

    FrameInput {
        left: kb.any_held(KEYS_LEFT) || gp.left_held(),
        right: kb.any_held(KEYS_RIGHT) || gp.right_held(),
        up: kb.any_held(KEYS_UP) || gp.up_held(),
        down: kb.any_held(KEYS_DOWN) || gp.down_held(),
        alt_up: kb.any_held(KEYS_ALT_UP),
        alt_down: kb.any_held(KEYS_ALT_DOWN),
        fire_held: kb.any_held(KEYS_FIRE) || gp.fire_held(),

        turn,
        confirm: kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed(),
        cancel: kb.any_pressed(KEYS_CANCEL) || gp.cancel_pressed(),
        // Rotate and hard drop ride the shared bindings: Up rotates,
        // Space drops. Games that use neither just ignore them.
        rotate: kb.any_pressed(KEYS_UP) || gp.up_pressed(),
        hard_drop: kb.any_pressed(KEYS_FIRE) || gp.fire_pressed(),
        fire: kb.any_pressed(KEYS_FIRE) || gp.fire_pressed(),
        pause: kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed(),
        restart: kb.any_pressed(KEYS_RESTART),
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Pickup => sfx.play_pickup(),
            GameEvent::Flap => sfx.play_flap(),
            GameEvent::LineClear(n) => sfx.play_lines(*n),
            GameEvent::Death => sfx.play_death(),
            GameEvent::WaveClear => sfx.play_wave_clear(),
            GameEvent::Point => sfx.play_point(),
            GameEvent::Powerup => sfx.play_powerup(),
        }
    }
}
