/// The cabinet's non-game scenes: the main menu grid, the three-letter
/// initials entry, the post-game score card, and the high-score browser.
///
/// Scenes are passive state machines over the per-frame input snapshot.
/// They never touch the terminal directly; the shell calls `handle` once
/// per frame and `render` into the shared canvas.

use crossterm::style::Color;

use crate::domain::grid::Dir;
use crate::domain::input::FrameInput;
use crate::games::GameId;
use crate::scores::{ScoreEntry, ScoreStore};
use crate::ui::canvas::{Canvas, MAP_ROW};

const GRID_COLS: usize = 3;

const TITLE_FG: Color = Color::Rgb { r: 235, g: 235, b: 255 };
const DIM_FG: Color = Color::Rgb { r: 170, g: 170, b: 190 };
const SELECT_FG: Color = Color::Rgb { r: 120, g: 180, b: 255 };
const ACCENT_FG: Color = Color::Rgb { r: 255, g: 230, b: 140 };

// ── Main menu ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuChoice {
    Competition,
    Game(GameId),
    Highscores,
    Exit,
}

/// Competition first, the six games, the score browser last.
const MENU_ENTRIES: [MenuChoice; 7] = [
    MenuChoice::Competition,
    MenuChoice::Game(GameId::Hopper),
    MenuChoice::Game(GameId::Serpent),
    MenuChoice::Game(GameId::Mazer),
    MenuChoice::Game(GameId::Mason),
    MenuChoice::Game(GameId::Swarm),
    MenuChoice::Game(GameId::Duel),
];

const MENU_LEN: usize = MENU_ENTRIES.len() + 1; // + Highscores

fn entry_at(i: usize) -> MenuChoice {
    if i < MENU_ENTRIES.len() {
        MENU_ENTRIES[i]
    } else {
        MenuChoice::Highscores
    }
}

fn entry_label(choice: MenuChoice) -> &'static str {
    match choice {
        MenuChoice::Competition => "Competition",
        MenuChoice::Game(id) => id.name(),
        MenuChoice::Highscores => "Highscore",
        MenuChoice::Exit => "Exit",
    }
}

pub struct MenuScene {
    selected: usize,
}

impl MenuScene {
    pub fn new() -> Self {
        MenuScene { selected: 0 }
    }

    pub fn handle(&mut self, input: &FrameInput) -> Option<MenuChoice> {
        if input.cancel {
            return Some(MenuChoice::Exit);
        }
        let n = MENU_LEN;
        match input.turn {
            Some(Dir::Left) => self.selected = (self.selected + n - 1) % n,
            Some(Dir::Right) => self.selected = (self.selected + 1) % n,
            Some(Dir::Up) => self.selected = (self.selected + n - GRID_COLS) % n,
            Some(Dir::Down) => self.selected = (self.selected + GRID_COLS) % n,
            None => {}
        }
        if input.any_confirm() {
            return Some(entry_at(self.selected));
        }
        None
    }

    pub fn render(&self, canvas: &mut Canvas, leader: Option<&ScoreEntry>) {
        canvas.hud(" ARCADE CABINET");
        canvas.put_str_centered(MAP_ROW + 1, "A R C A D E", TITLE_FG, Color::Reset);
        canvas.put_str_centered(
            MAP_ROW + 2,
            "arrows navigate   Enter/Space start   Esc exit",
            DIM_FG,
            Color::Reset,
        );

        let grid_top = MAP_ROW + 4;
        let cell_w = canvas.width() / GRID_COLS.max(1);
        for i in 0..MENU_LEN {
            let label = entry_label(entry_at(i));
            let col = i % GRID_COLS;
            let row = i / GRID_COLS;
            let y = grid_top + row * 2;
            let x = col * cell_w + cell_w.saturating_sub(label.len() + 4) / 2;
            if i == self.selected {
                canvas.put_str(x, y, &format!("> {label} <"), SELECT_FG, Color::Reset);
            } else {
                canvas.put_str(x + 2, y, label, DIM_FG, Color::Reset);
            }
        }

        let ribbon = match leader {
            Some(e) => format!("LEADER  {}  SCORE  {}", e.initials, e.score),
            None => "LEADER  ---  SCORE  0".to_string(),
        };
        let y = grid_top + (MENU_LEN / GRID_COLS + 2) * 2;
        canvas.put_str_centered(y, &ribbon, ACCENT_FG, Color::Reset);
    }
}

// ── Initials entry ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitialsAction {
    Done(String),
    Cancel,
}

/// Three A-Z slots: left/right picks the slot, up/down cycles the letter,
/// typing a letter fills the slot and advances.
pub struct InitialsScene {
    title: String,
    slots: [u8; 3],
    pos: usize,
}

impl InitialsScene {
    pub fn new(title: &str) -> Self {
        InitialsScene {
            title: title.to_string(),
            slots: [0; 3],
            pos: 0,
        }
    }

    pub fn initials(&self) -> String {
        self.slots.iter().map(|&i| (b'A' + i) as char).collect()
    }

    /// Direct keyboard entry: set the current slot and move on.
    pub fn type_letter(&mut self, ch: char) {
        if ch.is_ascii_uppercase() {
            self.slots[self.pos] = ch as u8 - b'A';
            if self.pos < 2 {
                self.pos += 1;
            }
        }
    }

    pub fn handle(&mut self, input: &FrameInput) -> Option<InitialsAction> {
        if input.cancel {
            return Some(InitialsAction::Cancel);
        }
        match input.turn {
            Some(Dir::Left) => self.pos = self.pos.saturating_sub(1),
            Some(Dir::Right) => self.pos = (self.pos + 1).min(2),
            Some(Dir::Up) => self.slots[self.pos] = (self.slots[self.pos] + 25) % 26,
            Some(Dir::Down) => self.slots[self.pos] = (self.slots[self.pos] + 1) % 26,
            None => {}
        }
        if input.any_confirm() {
            return Some(InitialsAction::Done(self.initials()));
        }
        None
    }

    pub fn render(&self, canvas: &mut Canvas) {
        canvas.hud(" ENTER INITIALS");
        canvas.put_str_centered(MAP_ROW + 2, &self.title, TITLE_FG, Color::Reset);

        let mid = canvas.width() / 2;
        let y = MAP_ROW + 5;
        for (i, &slot) in self.slots.iter().enumerate() {
            let x = mid - 4 + i * 4;
            let letter = ((b'A' + slot) as char).to_string();
            if i == self.pos {
                canvas.put_str(x, y - 1, "^", SELECT_FG, Color::Reset);
                canvas.put_str(x, y, &letter, SELECT_FG, Color::Reset);
                canvas.put_str(x, y + 1, "v", SELECT_FG, Color::Reset);
            } else {
                canvas.put_str(x, y, &letter, TITLE_FG, Color::Reset);
            }
        }

        canvas.put_str_centered(
            y + 4,
            "type or cycle letters   Enter start   Esc back",
            DIM_FG,
            Color::Reset,
        );
    }
}

// ── Score card ──

pub struct ScoreScene {
    title: String,
    initials: String,
    score: u64,
}

impl ScoreScene {
    pub fn new(title: &str, initials: &str, score: u64) -> Self {
        ScoreScene {
            title: title.to_string(),
            initials: initials.to_string(),
            score,
        }
    }

    /// True when the player dismissed the card.
    pub fn handle(&mut self, input: &FrameInput) -> bool {
        input.any_confirm() || input.cancel
    }

    pub fn render(&self, canvas: &mut Canvas) {
        canvas.hud(" RESULT");
        canvas.put_str_centered(MAP_ROW + 2, &self.title, TITLE_FG, Color::Reset);
        canvas.put_str_centered(MAP_ROW + 4, "S C O R E", ACCENT_FG, Color::Reset);
        canvas.put_str_centered(MAP_ROW + 6, &self.score.to_string(), TITLE_FG, Color::Reset);
        canvas.put_str_centered(
            MAP_ROW + 8,
            &self.initials,
            Color::Rgb { r: 140, g: 200, b: 255 },
            Color::Reset,
        );
        canvas.put_str_centered(MAP_ROW + 11, "Enter/Space back", DIM_FG, Color::Reset);
    }
}

// ── High-score browser ──

pub struct HighscoreScene {
    idx: usize,
}

impl HighscoreScene {
    /// Competition first, then the per-game boards.
    pub fn boards() -> Vec<&'static str> {
        let mut boards = vec!["Competition"];
        boards.extend(GameId::ALL.iter().map(|g| g.name()));
        boards
    }

    pub fn new() -> Self {
        HighscoreScene { idx: 0 }
    }

    pub fn board(&self) -> &'static str {
        Self::boards()[self.idx]
    }

    /// True when the player backed out.
    pub fn handle(&mut self, input: &FrameInput) -> bool {
        if input.cancel || input.any_confirm() {
            return true;
        }
        let n = Self::boards().len();
        match input.turn {
            Some(Dir::Left) => self.idx = (self.idx + n - 1) % n,
            Some(Dir::Right) => self.idx = (self.idx + 1) % n,
            _ => {}
        }
        false
    }

    pub fn render(&self, canvas: &mut Canvas, store: &ScoreStore) {
        canvas.hud(" HIGHSCORE");
        canvas.put_str_centered(
            MAP_ROW + 1,
            &format!("< {} >", self.board()),
            TITLE_FG,
            Color::Reset,
        );

        let entries = store.read(self.board());
        if entries.is_empty() {
            canvas.put_str_centered(MAP_ROW + 4, "---  no scores yet  ---", DIM_FG, Color::Reset);
        }
        for (i, e) in entries.iter().enumerate() {
            let date = if e.date.is_empty() { "---- -- --" } else { e.date.as_str() };
            let line = format!("{:>2}.  {}   {:>10}   {}", i + 1, e.initials, e.score, date);
            canvas.put_str_centered(MAP_ROW + 3 + i, &line, TITLE_FG, Color::Reset);
        }

        let y = MAP_ROW + 15;
        canvas.put_str_centered(y, "left/right switch board   Esc back", DIM_FG, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(dir: Dir) -> FrameInput {
        FrameInput { turn: Some(dir), ..Default::default() }
    }

    #[test]
    fn menu_navigation_wraps_the_grid() {
        let mut m = MenuScene::new();
        assert_eq!(m.handle(&turn(Dir::Left)), None);
        assert_eq!(m.selected, MENU_LEN - 1);
        m.handle(&turn(Dir::Right));
        assert_eq!(m.selected, 0);
        m.handle(&turn(Dir::Down));
        assert_eq!(m.selected, GRID_COLS);
        m.handle(&turn(Dir::Up));
        assert_eq!(m.selected, 0);
    }

    #[test]
    fn menu_confirm_activates_the_selected_entry() {
        let mut m = MenuScene::new();
        let confirm = FrameInput { confirm: true, ..Default::default() };
        assert_eq!(m.handle(&confirm), Some(MenuChoice::Competition));
        m.selected = 1;
        assert_eq!(m.handle(&confirm), Some(MenuChoice::Game(GameId::Hopper)));
        m.selected = MENU_LEN - 1;
        assert_eq!(m.handle(&confirm), Some(MenuChoice::Highscores));
    }

    #[test]
    fn menu_cancel_exits_the_cabinet() {
        let mut m = MenuScene::new();
        let cancel = FrameInput { cancel: true, ..Default::default() };
        assert_eq!(m.handle(&cancel), Some(MenuChoice::Exit));
    }

    #[test]
    fn initials_cycle_and_wrap() {
        let mut s = InitialsScene::new("Hopper");
        s.handle(&turn(Dir::Up));
        assert_eq!(s.initials(), "ZAA");
        s.handle(&turn(Dir::Down));
        s.handle(&turn(Dir::Down));
        assert_eq!(s.initials(), "BAA");
        s.handle(&turn(Dir::Right));
        s.handle(&turn(Dir::Down));
        assert_eq!(s.initials(), "BBA");
    }

    #[test]
    fn typed_letters_fill_and_advance() {
        let mut s = InitialsScene::new("Serpent");
        s.type_letter('K');
        s.type_letter('J');
        s.type_letter('R');
        assert_eq!(s.initials(), "KJR");
        // The last slot absorbs further typing.
        s.type_letter('X');
        assert_eq!(s.initials(), "KJX");
    }

    #[test]
    fn initials_confirm_and_cancel() {
        let mut s = InitialsScene::new("Mazer");
        let confirm = FrameInput { confirm: true, ..Default::default() };
        assert_eq!(s.handle(&confirm), Some(InitialsAction::Done("AAA".into())));
        let cancel = FrameInput { cancel: true, ..Default::default() };
        assert_eq!(s.handle(&cancel), Some(InitialsAction::Cancel));
    }

    #[test]
    fn highscore_browser_cycles_all_boards() {
        let mut h = HighscoreScene::new();
        assert_eq!(h.board(), "Competition");
        let n = HighscoreScene::boards().len();
        for _ in 0..n {
            h.handle(&turn(Dir::Right));
        }
        assert_eq!(h.board(), "Competition", "full cycle returns home");
        h.handle(&turn(Dir::Left));
        assert_eq!(h.board(), "Duel");
    }

    #[test]
    fn score_card_dismisses_on_any_confirm() {
        let mut s = ScoreScene::new("Mason", "KJR", 120);
        assert!(!s.handle(&FrameInput::default()));
        assert!(s.handle(&FrameInput { fire: true, ..Default::default() }));
    }
}
