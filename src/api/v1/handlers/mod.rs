pub mod health;
pub mod notices;
pub mod quizzes;
pub mod users;
