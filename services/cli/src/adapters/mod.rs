pub mod file_store;
pub mod toast;
pub mod vision;

pub use file_store::FileStore;
pub use toast::TerminalToastAdapter;
pub use vision::OpenAiVisionAdapter;
