pub mod skin;
pub mod symptoms;

pub use skin::{LesionModel, OnnxLesionModel, SkinAnalyzer};
pub use symptoms::{CompletionBackend, GeminiBackend, SymptomAnalyzer};
