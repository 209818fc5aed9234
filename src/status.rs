//! Runtime state shared between the poller and the tray, and how it is shown.

use image::{Rgba, RgbaImage};

pub const APP_NAME: &str = "KeepAwake";

/// Side length of the square tray glyph in pixels.
pub const GLYPH_SIZE: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Follow the working-hours schedule.
    Active,
    /// Stay awake regardless of the schedule.
    Forced,
    /// Never intervene.
    Stopped,
}

impl Mode {
    /// Only Active counts as running; Forced bypasses the schedule.
    pub fn is_running(self) -> bool {
        matches!(self, Mode::Active)
    }
}

/// Power state the evaluator asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Awake,
    Normal,
}

impl PowerState {
    pub fn label(self) -> &'static str {
        match self {
            PowerState::Awake => "Awake",
            PowerState::Normal => "Normal",
        }
    }
}

/// Last power state successfully pushed to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppliedState {
    #[default]
    Unset,
    Awake,
    Normal,
}

impl AppliedState {
    pub fn matches(self, state: PowerState) -> bool {
        self == AppliedState::from(state)
    }

    pub fn power_state(self) -> Option<PowerState> {
        match self {
            AppliedState::Unset => None,
            AppliedState::Awake => Some(PowerState::Awake),
            AppliedState::Normal => Some(PowerState::Normal),
        }
    }
}

impl From<PowerState> for AppliedState {
    fn from(state: PowerState) -> Self {
        match state {
            PowerState::Awake => AppliedState::Awake,
            PowerState::Normal => AppliedState::Normal,
        }
    }
}

/// Tray icon variants, compared by value rather than by bitmap identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    Forced,
    WorkTime,
    Inactive,
    Active,
}

impl Glyph {
    pub fn for_status(mode: Mode, applied: AppliedState) -> Self {
        match (mode, applied) {
            (Mode::Stopped, _) => Glyph::Inactive,
            (Mode::Forced, _) => Glyph::Forced,
            (Mode::Active, AppliedState::Awake) => Glyph::WorkTime,
            (Mode::Active, _) => Glyph::Active,
        }
    }

    pub fn color(self) -> [u8; 3] {
        match self {
            Glyph::Forced => [0, 0, 200],
            Glyph::WorkTime => [0, 200, 0],
            Glyph::Inactive => [200, 0, 0],
            Glyph::Active => [255, 165, 0],
        }
    }

    /// White square with a filled circle inset by 8px on every side.
    pub fn render(self) -> RgbaImage {
        const INSET: f32 = 8.0;
        let center = GLYPH_SIZE as f32 / 2.0;
        let radius = center - INSET;
        let [r, g, b] = self.color();
        RgbaImage::from_fn(GLYPH_SIZE, GLYPH_SIZE, |x, y| {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            if dx * dx + dy * dy <= radius * radius {
                Rgba([r, g, b, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }
}

/// Everything the tray needs to draw itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayStatus {
    pub mode: Mode,
    pub applied: AppliedState,
    pub glyph: Glyph,
    pub title: String,
}

impl TrayStatus {
    pub fn new(mode: Mode, applied: AppliedState) -> Self {
        Self {
            mode,
            applied,
            glyph: Glyph::for_status(mode, applied),
            title: title(mode, applied),
        }
    }
}

/// `KeepAwake - Running - Awake`; the state suffix is left off until something was applied.
pub fn title(mode: Mode, applied: AppliedState) -> String {
    let running = if mode.is_running() {
        "Running"
    } else {
        "Stopped"
    };
    match applied.power_state() {
        Some(state) => format!("{APP_NAME} - {running} - {}", state.label()),
        None => format!("{APP_NAME} - {running}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_reflects_mode_and_applied_state() {
        assert_eq!(
            title(Mode::Active, AppliedState::Awake),
            "KeepAwake - Running - Awake"
        );
        assert_eq!(
            title(Mode::Forced, AppliedState::Awake),
            "KeepAwake - Stopped - Awake"
        );
        assert_eq!(
            title(Mode::Stopped, AppliedState::Normal),
            "KeepAwake - Stopped - Normal"
        );
        assert_eq!(title(Mode::Active, AppliedState::Unset), "KeepAwake - Running");
    }

    #[test]
    fn glyph_follows_mode_then_applied_state() {
        assert_eq!(
            Glyph::for_status(Mode::Stopped, AppliedState::Awake),
            Glyph::Inactive
        );
        assert_eq!(
            Glyph::for_status(Mode::Forced, AppliedState::Normal),
            Glyph::Forced
        );
        assert_eq!(
            Glyph::for_status(Mode::Active, AppliedState::Awake),
            Glyph::WorkTime
        );
        assert_eq!(
            Glyph::for_status(Mode::Active, AppliedState::Normal),
            Glyph::Active
        );
        assert_eq!(
            Glyph::for_status(Mode::Active, AppliedState::Unset),
            Glyph::Active
        );
    }

    #[test]
    fn rendered_glyph_is_a_colored_disc_on_white() {
        let image = Glyph::WorkTime.render();
        assert_eq!(image.dimensions(), (GLYPH_SIZE, GLYPH_SIZE));
        assert_eq!(image.get_pixel(32, 32), &Rgba([0, 200, 0, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(4, 32), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(10, 32), &Rgba([0, 200, 0, 255]));
    }

    #[test]
    fn applied_state_matches_only_its_power_state() {
        assert!(AppliedState::Awake.matches(PowerState::Awake));
        assert!(!AppliedState::Awake.matches(PowerState::Normal));
        assert!(!AppliedState::Unset.matches(PowerState::Normal));
    }
}
