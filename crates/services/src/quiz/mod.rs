mod session;
mod workflow;

pub use session::{AnswerOutcome, QuizPhase, QuizSession};
pub use workflow::{DEFAULT_QUIZ_LENGTH, QuizService};
