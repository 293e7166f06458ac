pub mod history;

pub use history::BoundedHistory;
