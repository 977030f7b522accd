pub mod backend;
pub mod commands;
pub mod config;
pub mod gesture;
pub mod input;
pub mod menu;
pub mod session;
pub mod shortcuts;
pub mod sync;

pub use backend::{
    LogNotifier, MemoryStore, Notifier, PersistError, RecordingNotifier, Severity, WorkflowStore,
};
pub use commands::CommandStack;
pub use config::EditorConfig;
pub use gesture::{Gesture, GestureMachine, PointerContext};
pub use input::{InputEvent, Modifiers};
pub use menu::{ContextMenu, EditRequest, MenuAction, MenuCommand, MenuItem, MenuTarget};
pub use session::{EditorSession, Selection};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use sync::{Applied, GraphMutation, SyncEngine};
