pub mod attachments;
pub mod clipboard;
pub mod wake_lock;

pub use clipboard::ClipboardService;
pub use wake_lock::WakeLockManager;
