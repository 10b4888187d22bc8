pub mod error;
pub mod gemini;
pub mod traits;

pub use error::GenError;
pub use gemini::GeminiClient;
pub use traits::GenerateText;
