pub mod completion_llm;
pub mod db;
pub mod memory;

pub use completion_llm::OpenAiCompletionAdapter;
pub use db::DbAdapter;
pub use memory::InMemoryAdapter;
