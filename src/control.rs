//! Live parameter control. Inputs are applied as pure state transitions; the next tick picks
//! up whatever state is current.

use crate::{
    foundation::core::{AffineParams, BackendKind, FilterKind, FilterParams, MIN_SCALE},
    render::backend::FrameSettings,
};

pub const TRANSLATE_STEP: f64 = 5.0;
pub const ROTATE_STEP_DEG: f64 = 0.6;
pub const SCALE_STEP: f64 = 0.02;
pub const MIN_BLOCK: i32 = 2;
pub const MAX_BLOCK: i32 = 100;

pub const CONTROLS_HELP: &str = "\
controls (type a key and press enter):
  g          toggle CPU / GPU
  1 / 2 / 3  filter None / Pixelate / KeepColor
  t          toggle transform
  left right up down   translate by 5 px
  q / e      rotate -0.6 / +0.6 degrees
  - / =      scale -0.02 / +0.02
  z / x      pixel block -1 / +1 (2..100)
  c / v      keep-color threshold -1 / +1 (0..255)
  esc        quit";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlInput {
    ToggleBackend,
    SelectFilter(FilterKind),
    ToggleTransform,
    Translate { dx: f64, dy: f64 },
    Rotate(f64),
    Scale(f64),
    Block(i32),
    Threshold(i32),
    Quit,
}

impl ControlInput {
    /// Map a key name (`g`, `1`, `left`, `-`, `esc`, ...) to its input.
    pub fn from_key(key: &str) -> Option<Self> {
        let input = match key.trim().to_ascii_lowercase().as_str() {
            "g" => Self::ToggleBackend,
            "1" => Self::SelectFilter(FilterKind::None),
            "2" => Self::SelectFilter(FilterKind::Pixelate),
            "3" => Self::SelectFilter(FilterKind::KeepColor),
            "t" => Self::ToggleTransform,
            "left" => Self::Translate {
                dx: -TRANSLATE_STEP,
                dy: 0.0,
            },
            "right" => Self::Translate {
                dx: TRANSLATE_STEP,
                dy: 0.0,
            },
            "up" => Self::Translate {
                dx: 0.0,
                dy: -TRANSLATE_STEP,
            },
            "down" => Self::Translate {
                dx: 0.0,
                dy: TRANSLATE_STEP,
            },
            "q" => Self::Rotate(-ROTATE_STEP_DEG),
            "e" => Self::Rotate(ROTATE_STEP_DEG),
            "-" => Self::Scale(-SCALE_STEP),
            "=" => Self::Scale(SCALE_STEP),
            "z" => Self::Block(-1),
            "x" => Self::Block(1),
            "c" => Self::Threshold(-1),
            "v" => Self::Threshold(1),
            "esc" | "escape" => Self::Quit,
            _ => return None,
        };
        Some(input)
    }
}

/// Everything the operator can change while a live session runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlState {
    pub backend: BackendKind,
    pub filter: FilterKind,
    pub transform_enabled: bool,
    pub filter_params: FilterParams,
    pub affine_params: AffineParams,
    pub quit: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            backend: if cfg!(feature = "gpu") {
                BackendKind::Gpu
            } else {
                BackendKind::Cpu
            },
            filter: FilterKind::Pixelate,
            transform_enabled: true,
            filter_params: FilterParams::default(),
            affine_params: AffineParams::IDENTITY,
            quit: false,
        }
    }
}

impl ControlState {
    #[must_use]
    pub fn apply(self, input: ControlInput) -> Self {
        let mut next = self;
        match input {
            ControlInput::ToggleBackend => next.backend = self.backend.toggled(),
            ControlInput::SelectFilter(f) => next.filter = f,
            ControlInput::ToggleTransform => next.transform_enabled = !self.transform_enabled,
            ControlInput::Translate { dx, dy } => {
                next.affine_params.translate_x += dx;
                next.affine_params.translate_y += dy;
            }
            ControlInput::Rotate(d) => next.affine_params.rotation_deg += d,
            ControlInput::Scale(d) => {
                next.affine_params.scale = (self.affine_params.scale + d).max(MIN_SCALE);
            }
            ControlInput::Block(d) => {
                next.filter_params.block_size =
                    (self.filter_params.block_size + d).clamp(MIN_BLOCK, MAX_BLOCK);
            }
            ControlInput::Threshold(d) => {
                next.filter_params.threshold = (self.filter_params.threshold + d).clamp(0, 255);
            }
            ControlInput::Quit => next.quit = true,
        }
        next
    }

    pub fn settings(&self) -> FrameSettings {
        FrameSettings {
            filter: self.filter,
            filter_params: self.filter_params,
            affine_params: self.affine_params,
            transform_enabled: self.transform_enabled,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/control/control.rs"]
mod tests;
