/// Terminal front end: drawing, panels, keyboard, gamepad and sound.

pub mod gamepad;
pub mod hud;
pub mod input;
pub mod markup;
pub mod palette;
pub mod renderer;
pub mod screen;
pub mod sound;
pub mod surface;
