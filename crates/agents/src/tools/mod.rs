pub mod sandbox;
pub mod search;

pub use sandbox::{
    extract_code_block, CodeSandbox, PythonSandbox, PythonSandboxFactory, SandboxFactory,
};
pub use search::{SearchHit, SearchProvider, TavilySearch};
