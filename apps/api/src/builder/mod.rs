// CV builder: the five-step wizard, its in-memory sessions, the strength
// meter and AI-assisted rewriting.

pub mod handlers;
pub mod improve;
pub mod session;
pub mod strength;
pub mod wizard;
