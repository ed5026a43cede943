pub mod platforms;
pub mod setup;
pub mod sync;

pub use platforms::move_platforms;
pub use setup::setup;
pub use sync::{sync_global_gravity, sync_vsync_settings};
