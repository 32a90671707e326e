//! Terminal key events to game actions
//!
//! Terminals that report key releases drive held controls directly.
//! Others only send presses and auto-repeats, so movement is treated as
//! a tap per event and soft drop is released after a quiet period.

use blockfall::input::{Action, Intents, KeyState};
use blockfall::settings::{Control, KeyBindings};
use blockfall::{GamePhase, MAX_LEVEL};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Time after which soft drop counts as released if no repeat arrived
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What the main loop should do after a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Which page of the menu is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Levels,
    /// Binding list. `selected` may point one past the last control,
    /// at the restore-defaults row.
    Controls { selected: usize, rebinding: bool },
}

/// Maps key events onto [`Intents`] using the configured bindings
pub struct KeyMapper {
    keys: KeyBindings,
    bindings: Vec<(Control, Vec<KeyCode>)>,
    /// Whether the terminal sends release events
    reports_release: bool,
    soft_drop_seen: Option<Instant>,
    /// Level highlighted in the menu
    menu_level: u32,
    screen: MenuScreen,
}

/// Parse a key string into KeyCode
fn parse_key(s: &str) -> Option<KeyCode> {
    let code = match s.to_lowercase().as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "space" => KeyCode::Char(' '),
        "enter" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "esc" | "escape" => KeyCode::Esc,
        "shift" => KeyCode::Modifier(ModifierKeyCode::LeftShift),
        "ctrl" | "control" => KeyCode::Modifier(ModifierKeyCode::LeftControl),
        "alt" => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
        s if s.chars().count() == 1 => KeyCode::Char(s.chars().next()?),
        s => {
            let n = s.strip_prefix('f')?.parse().ok()?;
            KeyCode::F(n)
        }
    };
    Some(code)
}

/// Lowercase letters and fold right-hand modifiers onto the left ones
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        KeyCode::Modifier(ModifierKeyCode::RightShift) => KeyCode::Modifier(ModifierKeyCode::LeftShift),
        KeyCode::Modifier(ModifierKeyCode::RightControl) => {
            KeyCode::Modifier(ModifierKeyCode::LeftControl)
        }
        KeyCode::Modifier(ModifierKeyCode::RightAlt) => KeyCode::Modifier(ModifierKeyCode::LeftAlt),
        other => other,
    }
}

fn parse_bindings(keys: &KeyBindings) -> Vec<(Control, Vec<KeyCode>)> {
    Control::all()
        .into_iter()
        .map(|control| {
            let codes = keys
                .keys(control)
                .iter()
                .filter_map(|s| {
                    let code = parse_key(s);
                    if code.is_none() {
                        warn!("Unknown key {:?} bound to {}", s, control.label());
                    }
                    code
                })
                .collect();
            (control, codes)
        })
        .collect()
}

impl KeyMapper {
    pub fn new(keys: &KeyBindings, reports_release: bool, menu_level: u32) -> Self {
        Self {
            keys: keys.clone(),
            bindings: parse_bindings(keys),
            reports_release,
            soft_drop_seen: None,
            menu_level: menu_level.min(MAX_LEVEL - 1),
            screen: MenuScreen::Levels,
        }
    }

    /// Current bindings, including changes made on the controls screen
    pub fn bindings(&self) -> &KeyBindings {
        &self.keys
    }

    pub fn screen(&self) -> MenuScreen {
        self.screen
    }

    pub fn menu_level(&self) -> u32 {
        self.menu_level
    }

    /// Control bound to `code`, earliest control first
    pub fn control_for(&self, code: KeyCode) -> Option<Control> {
        let code = normalize_key(code);
        self.bindings
            .iter()
            .find(|(_, codes)| codes.contains(&code))
            .map(|(control, _)| *control)
    }

    /// Keys bound to `control`, formatted for display
    pub fn describe(&self, control: Control) -> String {
        self.bindings
            .iter()
            .find(|(c, _)| *c == control)
            .map(|(_, codes)| codes.iter().map(|&code| key_to_string(code)).collect::<Vec<_>>().join("/"))
            .unwrap_or_default()
    }

    pub fn handle(&mut self, key: KeyEvent, phase: GamePhase, intents: &mut Intents) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        let control = self.control_for(key.code);
        if key.kind == KeyEventKind::Release {
            if let Some(control) = control {
                self.release(control, intents);
            }
            return KeyOutcome::Continue;
        }
        let repeat = key.kind == KeyEventKind::Repeat;

        if phase == GamePhase::Menu {
            if let MenuScreen::Controls { selected, rebinding } = self.screen {
                if !repeat {
                    self.handle_controls(key.code, selected, rebinding);
                }
                return KeyOutcome::Continue;
            }
        }
        if control == Some(Control::Quit) {
            return KeyOutcome::Quit;
        }
        if phase == GamePhase::Menu {
            self.handle_menu(key.code, control, repeat, intents);
            return KeyOutcome::Continue;
        }
        let Some(control) = control else {
            return KeyOutcome::Continue;
        };

        match control {
            Control::MoveLeft => self.hold(Action::MoveLeft, intents),
            Control::MoveRight => self.hold(Action::MoveRight, intents),
            Control::SoftDrop => {
                self.soft_drop_seen = Some(Instant::now());
                intents.apply(Action::SoftDrop(KeyState::Down));
            }
            // Repeats of one-shot keys would stack up rotations and pauses
            _ if repeat => {}
            Control::HardDrop => intents.apply(Action::HardDrop),
            Control::RotateCw => intents.apply(Action::RotateCW),
            Control::RotateCcw => intents.apply(Action::RotateCCW),
            Control::Pause => intents.apply(Action::Pause),
            Control::Restart => intents.apply(Action::Restart),
            Control::Menu => intents.apply(Action::ReturnToMenu),
            Control::Quit => {}
        }
        KeyOutcome::Continue
    }

    fn hold(&mut self, action: fn(KeyState) -> Action, intents: &mut Intents) {
        intents.apply(action(KeyState::Down));
        if !self.reports_release {
            intents.apply(action(KeyState::Up));
        }
    }

    fn release(&mut self, control: Control, intents: &mut Intents) {
        match control {
            Control::MoveLeft => intents.apply(Action::MoveLeft(KeyState::Up)),
            Control::MoveRight => intents.apply(Action::MoveRight(KeyState::Up)),
            Control::SoftDrop => {
                self.soft_drop_seen = None;
                intents.apply(Action::SoftDrop(KeyState::Up));
            }
            _ => {}
        }
    }

    fn handle_menu(&mut self, code: KeyCode, control: Option<Control>, repeat: bool, intents: &mut Intents) {
        match (code, control) {
            (KeyCode::Up, _) | (_, Some(Control::MoveRight)) => {
                self.menu_level = (self.menu_level + 1).min(MAX_LEVEL - 1);
            }
            (KeyCode::Down, _) | (_, Some(Control::MoveLeft)) => {
                self.menu_level = self.menu_level.saturating_sub(1);
            }
            (KeyCode::Char(c), _) if c.is_ascii_digit() => {
                self.menu_level = c.to_digit(10).unwrap_or(0);
            }
            _ if repeat => {}
            (KeyCode::Enter, _) | (_, Some(Control::HardDrop)) => {
                intents.apply(Action::SelectLevel(self.menu_level));
            }
            (KeyCode::Tab, _) => {
                self.screen = MenuScreen::Controls {
                    selected: 0,
                    rebinding: false,
                };
            }
            _ => {}
        }
    }

    /// Navigate the binding list, or capture the next key while rebinding
    fn handle_controls(&mut self, code: KeyCode, selected: usize, rebinding: bool) {
        let controls = Control::all();

        if rebinding {
            let key = key_to_string(normalize_key(code));
            if code != KeyCode::Esc && key != "?" {
                let control = controls[selected];
                self.keys.rebind(control, &key);
                self.bindings = parse_bindings(&self.keys);
                info!("Bound {} to {}", key, control.label());
            }
            self.screen = MenuScreen::Controls {
                selected,
                rebinding: false,
            };
            return;
        }

        let selected = match code {
            KeyCode::Up => selected.saturating_sub(1),
            KeyCode::Down => (selected + 1).min(controls.len()),
            KeyCode::Enter if selected == controls.len() => {
                self.keys.restore_defaults();
                self.bindings = parse_bindings(&self.keys);
                info!("Key bindings restored to defaults");
                selected
            }
            KeyCode::Enter => {
                self.screen = MenuScreen::Controls {
                    selected,
                    rebinding: true,
                };
                return;
            }
            KeyCode::Esc | KeyCode::Tab => {
                self.screen = MenuScreen::Levels;
                return;
            }
            _ => selected,
        };
        self.screen = MenuScreen::Controls {
            selected,
            rebinding: false,
        };
    }

    /// Release soft drop when the terminal went quiet. Call once per frame.
    pub fn release_stale(&mut self, now: Instant, intents: &mut Intents) {
        if self.reports_release {
            return;
        }
        if let Some(seen) = self.soft_drop_seen {
            if now.duration_since(seen) > KEY_TIMEOUT {
                self.soft_drop_seen = None;
                intents.apply(Action::SoftDrop(KeyState::Up));
            }
        }
    }
}

/// Convert a KeyCode to its binding string
pub fn key_to_string(code: KeyCode) -> String {
    match code {
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Modifier(ModifierKeyCode::LeftShift) => "Shift".to_string(),
        KeyCode::Modifier(ModifierKeyCode::LeftControl) => "Ctrl".to_string(),
        KeyCode::Modifier(ModifierKeyCode::LeftAlt) => "Alt".to_string(),
        _ => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn event(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        event(code, KeyEventKind::Press)
    }

    fn mapper(reports_release: bool) -> KeyMapper {
        KeyMapper::new(&KeyBindings::default(), reports_release, 0)
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("Space"), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key("ESC"), Some(KeyCode::Esc));
        assert_eq!(parse_key("a"), Some(KeyCode::Char('a')));
        assert_eq!(parse_key("F5"), Some(KeyCode::F(5)));
        assert_eq!(parse_key("Hyper"), None);
    }

    #[test]
    fn test_key_to_string_parses_back() {
        for code in [KeyCode::Left, KeyCode::Char(' '), KeyCode::Char('x'), KeyCode::F(2), KeyCode::Esc] {
            assert_eq!(parse_key(&key_to_string(code)), Some(code));
        }
    }

    #[test]
    fn test_default_bindings() {
        let keys = mapper(true);
        assert_eq!(keys.control_for(KeyCode::Left), Some(Control::MoveLeft));
        assert_eq!(keys.control_for(KeyCode::Char('S')), Some(Control::RotateCw));
        assert_eq!(keys.control_for(KeyCode::Up), Some(Control::RotateCw));
        assert_eq!(keys.control_for(KeyCode::Esc), Some(Control::Pause));
        assert_eq!(keys.control_for(KeyCode::Char('z')), None);
        assert_eq!(keys.describe(Control::Pause), "p/Esc");
    }

    #[test]
    fn test_held_move_with_release_events() {
        let mut keys = mapper(true);
        let mut intents = Intents::new();
        keys.handle(press(KeyCode::Left), GamePhase::Playing, &mut intents);
        assert!(intents.is_held(blockfall::input::Direction::Left));
        keys.handle(event(KeyCode::Left, KeyEventKind::Release), GamePhase::Playing, &mut intents);
        assert!(!intents.is_held(blockfall::input::Direction::Left));
        assert!(intents.take_pressed(blockfall::input::Direction::Left));
    }

    #[test]
    fn test_move_is_a_tap_without_release_events() {
        let mut keys = mapper(false);
        let mut intents = Intents::new();
        keys.handle(press(KeyCode::Right), GamePhase::Playing, &mut intents);
        assert!(!intents.is_held(blockfall::input::Direction::Right));
        assert!(intents.take_pressed(blockfall::input::Direction::Right));
    }

    #[test]
    fn test_soft_drop_times_out_without_release_events() {
        let mut keys = mapper(false);
        let mut intents = Intents::new();
        keys.handle(press(KeyCode::Down), GamePhase::Playing, &mut intents);
        assert!(intents.is_soft_dropping());
        let seen = keys.soft_drop_seen.unwrap();
        keys.release_stale(seen + Duration::from_millis(50), &mut intents);
        assert!(intents.is_soft_dropping());
        keys.release_stale(seen + Duration::from_millis(150), &mut intents);
        assert!(!intents.is_soft_dropping());
    }

    #[test]
    fn test_repeat_does_not_rotate_again() {
        let mut keys = mapper(true);
        let mut intents = Intents::new();
        keys.handle(press(KeyCode::Char('s')), GamePhase::Playing, &mut intents);
        keys.handle(event(KeyCode::Char('s'), KeyEventKind::Repeat), GamePhase::Playing, &mut intents);
        assert_eq!(intents.next_command(), Some(Action::RotateCW));
        assert_eq!(intents.next_command(), None);
    }

    #[test]
    fn test_menu_selects_level() {
        let mut keys = mapper(true);
        let mut intents = Intents::new();
        keys.handle(press(KeyCode::Up), GamePhase::Menu, &mut intents);
        keys.handle(press(KeyCode::Up), GamePhase::Menu, &mut intents);
        keys.handle(press(KeyCode::Down), GamePhase::Menu, &mut intents);
        assert_eq!(keys.menu_level(), 1);
        keys.handle(press(KeyCode::Char('7')), GamePhase::Menu, &mut intents);
        keys.handle(press(KeyCode::Enter), GamePhase::Menu, &mut intents);
        assert_eq!(intents.next_command(), Some(Action::SelectLevel(7)));
    }

    #[test]
    fn test_menu_level_stays_in_range() {
        let mut keys = KeyMapper::new(&KeyBindings::default(), true, 40);
        assert_eq!(keys.menu_level(), MAX_LEVEL - 1);
        let mut intents = Intents::new();
        keys.handle(press(KeyCode::Up), GamePhase::Menu, &mut intents);
        assert_eq!(keys.menu_level(), MAX_LEVEL - 1);
    }

    #[test]
    fn test_quit_and_ctrl_c() {
        let mut keys = mapper(true);
        let mut intents = Intents::new();
        assert_eq!(keys.handle(press(KeyCode::Char('q')), GamePhase::Playing, &mut intents), KeyOutcome::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(keys.handle(ctrl_c, GamePhase::Menu, &mut intents), KeyOutcome::Quit);
    }

    fn open_controls(keys: &mut KeyMapper, intents: &mut Intents) {
        keys.handle(press(KeyCode::Tab), GamePhase::Menu, intents);
        assert_eq!(
            keys.screen(),
            MenuScreen::Controls {
                selected: 0,
                rebinding: false
            }
        );
    }

    #[test]
    fn test_controls_screen_rebinds_a_key() {
        let mut keys = mapper(true);
        let mut intents = Intents::new();
        open_controls(&mut keys, &mut intents);

        // Hard drop is the fourth control
        for _ in 0..3 {
            keys.handle(press(KeyCode::Down), GamePhase::Menu, &mut intents);
        }
        keys.handle(press(KeyCode::Enter), GamePhase::Menu, &mut intents);
        assert_eq!(
            keys.screen(),
            MenuScreen::Controls {
                selected: 3,
                rebinding: true
            }
        );
        // A key that is normally bound elsewhere is captured, not acted on
        let outcome = keys.handle(press(KeyCode::Char('Q')), GamePhase::Menu, &mut intents);
        assert_eq!(outcome, KeyOutcome::Continue);

        assert_eq!(keys.bindings().hard_drop, vec!["q"]);
        assert!(keys.bindings().quit.is_empty());
        assert_eq!(keys.control_for(KeyCode::Char('q')), Some(Control::HardDrop));
        assert_eq!(keys.control_for(KeyCode::Char(' ')), None);
        assert_eq!(intents.next_command(), None);
    }

    #[test]
    fn test_controls_screen_escape_cancels_rebind() {
        let mut keys = mapper(true);
        let mut intents = Intents::new();
        open_controls(&mut keys, &mut intents);
        keys.handle(press(KeyCode::Enter), GamePhase::Menu, &mut intents);
        keys.handle(press(KeyCode::Esc), GamePhase::Menu, &mut intents);
        assert_eq!(keys.bindings(), &KeyBindings::default());

        keys.handle(press(KeyCode::Esc), GamePhase::Menu, &mut intents);
        assert_eq!(keys.screen(), MenuScreen::Levels);
    }

    #[test]
    fn test_controls_screen_restores_defaults() {
        let mut bindings = KeyBindings::default();
        bindings.rebind(Control::Pause, "x");
        let mut keys = KeyMapper::new(&bindings, true, 0);
        let mut intents = Intents::new();
        open_controls(&mut keys, &mut intents);

        // Past the last control sits the restore row
        for _ in 0..Control::all().len() + 3 {
            keys.handle(press(KeyCode::Down), GamePhase::Menu, &mut intents);
        }
        assert_eq!(
            keys.screen(),
            MenuScreen::Controls {
                selected: Control::all().len(),
                rebinding: false
            }
        );
        keys.handle(press(KeyCode::Enter), GamePhase::Menu, &mut intents);
        assert_eq!(keys.bindings(), &KeyBindings::default());
        assert_eq!(keys.control_for(KeyCode::Char('p')), Some(Control::Pause));
        assert_eq!(keys.control_for(KeyCode::Char('x')), None);
    }
}
