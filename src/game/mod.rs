pub mod formatter;
pub mod game_loop;
pub mod utils;

pub use formatter::{classify_phase, render_position, Phase};
pub use game_loop::{parse_event, Flow, GameLoop};
