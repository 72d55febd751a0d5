//! Demo Seeder (C11) handlers.

mod seeder;

pub use seeder::{DemoIds, DemoSeeder};
