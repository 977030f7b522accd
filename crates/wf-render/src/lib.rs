pub mod frame;
pub mod hit;
pub mod path;
pub mod svg;

pub use frame::{GesturePreview, Highlight, RenderFrame, StateView, TransitionView, build_frame};
pub use hit::{HitConfig, HitTarget, hit_test, state_at};
pub use path::{distance_to, insertion_index, to_bez_path};
pub use svg::render_svg;
